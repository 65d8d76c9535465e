//! Configuration loading via `ortho-config`.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

/// Default number of seconds to wait for a provisioning request.
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 600;

/// Default number of seconds between provisioning status checks.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;

/// Connection settings for the vRealize Automation appliance, derived from
/// environment variables, configuration files, and CLI flags.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "VRA",
    discovery(
        app_name = "vra-guest",
        env_var = "VRA_GUEST_CONFIG_PATH",
        config_file_name = "vra-guest.toml",
        dotfile_name = ".vra-guest.toml",
        project_file_name = "vra-guest.toml"
    )
)]
pub struct VraConfig {
    /// Hostname of the vRA appliance. A full `scheme://host[:port]` base URL
    /// is accepted as well; bare hostnames are reached over HTTPS.
    #[ortho_config(default = String::new())]
    pub hostname: String,
    /// User interacting with the API.
    #[ortho_config(default = String::new())]
    pub username: String,
    /// Password for [`Self::username`]. Never accepted on the command line.
    #[ortho_config(default = String::new())]
    pub password: String,
    /// Tenant the user authenticates against (for example `vsphere.local`).
    #[ortho_config(default = String::new())]
    pub tenant: String,
    /// Seconds to wait for a provisioning request before giving up.
    #[ortho_config(default = DEFAULT_WAIT_TIMEOUT_SECS)]
    pub wait_timeout_secs: u64,
    /// Seconds between provisioning status checks.
    #[ortho_config(default = DEFAULT_POLL_INTERVAL_SECS)]
    pub poll_interval_secs: u64,
    /// Disables TLS certificate validation. Off by default; enabling it is
    /// logged every time a client is built.
    #[ortho_config(default = false)]
    pub insecure_skip_tls_verify: bool,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl VraConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to vra-guest.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    /// Loads configuration using the `ortho-config` derive. Values merge
    /// defaults, configuration files, environment variables, and CLI flags in
    /// that order of precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the loader fails to merge sources.
    pub fn load_from_sources() -> Result<Self, ConfigError> {
        Self::load().map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("vra-guest")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Base URL every API path is appended to.
    #[must_use]
    pub fn base_url(&self) -> String {
        let host = self.hostname.trim().trim_end_matches('/');
        if host.contains("://") {
            host.to_owned()
        } else {
            format!("https://{host}")
        }
    }

    /// Total time to wait for a provisioning request.
    #[must_use]
    pub const fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    /// Delay between provisioning status checks.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Performs semantic validation on required fields. Error messages include
    /// guidance on how to provide missing values via environment variables or
    /// configuration files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty and
    /// [`ConfigError::Invalid`] when the poll interval is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.hostname,
            &FieldMetadata::new("vRA hostname", "VRA_HOSTNAME", "hostname"),
        )?;
        Self::require_field(
            &self.username,
            &FieldMetadata::new("vRA username", "VRA_USERNAME", "username"),
        )?;
        Self::require_field(
            &self.password,
            &FieldMetadata::new("vRA password", "VRA_PASSWORD", "password"),
        )?;
        Self::require_field(
            &self.tenant,
            &FieldMetadata::new("vRA tenant", "VRA_TENANT", "tenant"),
        )?;
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(String::from(
                "poll_interval_secs must be at least 1 (VRA_POLL_INTERVAL_SECS)",
            )));
        }
        Ok(())
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a field holds a value outside its accepted range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
