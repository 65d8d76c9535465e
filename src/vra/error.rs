//! Error types for the vRA client.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised by the vRA REST client. Every variant is terminal for the
/// run; nothing is retried.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum VraError {
    /// Raised when the connection settings are incomplete.
    #[error("configuration error: {0}")]
    Config(String),
    /// Raised when the HTTP client cannot be constructed.
    #[error("failed to build HTTP client: {message}")]
    Client {
        /// Error reported by the HTTP stack.
        message: String,
    },
    /// Raised when a bearer token cannot be obtained.
    #[error("failed to get bearer token: {message}")]
    Auth {
        /// Transport error, HTTP status, or decoding failure.
        message: String,
    },
    /// Raised when the blueprint is not an entitled catalog item, or the
    /// catalog listing itself fails.
    #[error("failed to get catalog ID for blueprint {blueprint_name}: {message}")]
    CatalogLookup {
        /// Catalog item name that was looked up.
        blueprint_name: String,
        /// Reason the lookup failed.
        message: String,
    },
    /// Raised when the request template cannot be fetched or does not have
    /// the expected shape.
    #[error("failed to get template JSON for catalog item {catalog_id}: {message}")]
    TemplateFetch {
        /// Catalog item whose template was requested.
        catalog_id: String,
        /// Reason the fetch failed.
        message: String,
    },
    /// Raised when the provisioning request cannot be submitted.
    #[error("failed to create VM from template: {message}")]
    Provision {
        /// Reason the submission failed.
        message: String,
    },
    /// Raised when the status of a provisioning request cannot be read.
    #[error("failed to get VM create status for request {request_id}: {message}")]
    RequestStatus {
        /// Request being polled.
        request_id: String,
        /// Reason the status call failed.
        message: String,
    },
    /// Raised when inventory details for a guest cannot be resolved.
    #[error("failed to get VM details for '{subject}': {message}")]
    InventoryLookup {
        /// Hostname or resource identifier being resolved.
        subject: String,
        /// Reason the lookup failed.
        message: String,
    },
    /// Raised when more than one guest carries the requested hostname.
    #[error("duplicate VMs with hostname {hostname}: {count} matches")]
    DuplicateHostname {
        /// Hostname shared by several guests.
        hostname: String,
        /// Number of matching guests.
        count: usize,
    },
}

impl From<ConfigError> for VraError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}

/// Failure of a single REST round trip, before it is attributed to a
/// workflow stage.
#[derive(Debug, Error)]
pub(crate) enum CallError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}
