//! Command-line interface definitions for the `vra-guest` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `vra-guest` binary.
#[derive(Debug, Parser)]
#[command(
    name = "vra-guest",
    about = "Provision a vRealize Automation guest from a catalog blueprint",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Ensure a guest with the requested hostname exists.
    #[command(
        name = "provision",
        about = "Ensure a guest exists, provisioning it from a blueprint when absent"
    )]
    Provision(ProvisionCommand),
}

/// Arguments for the `vra-guest provision` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct ProvisionCommand {
    /// Component identifier inside the blueprint (for example
    /// `vSphere__vCenter__Machine_1`). The blueprint must contain exactly one
    /// machine component for the customisation to apply.
    #[arg(long, value_name = "ID")]
    pub(crate) blueprint_instance_id: String,
    /// Display name of the entitled catalog item to request.
    #[arg(long, value_name = "NAME")]
    pub(crate) blueprint_name: String,
    /// Number of virtual CPUs.
    #[arg(long)]
    pub(crate) cpu: u32,
    /// Memory size passed through to the blueprint's `memory` field.
    #[arg(long)]
    pub(crate) memory: u64,
    /// Guest hostname. The blueprint needs a custom `Hostname` property.
    #[arg(long)]
    pub(crate) hostname: String,
    /// Network adapter (network name) the guest attaches to.
    #[arg(long, value_name = "NETWORK")]
    pub(crate) network_adapter: String,
    /// Additional disk as `SIZE_GB:MOUNT_POINT`; repeat for more disks.
    ///
    /// Disks are appended after the base disk (Disk0), which is never
    /// modified. The mount point is a path on Linux or a drive letter on
    /// Windows.
    #[arg(long = "extra-disk", value_name = "SIZE_GB:MOUNT_POINT")]
    pub(crate) extra_disks: Vec<String>,
    /// Seconds to wait for the provisioning request to complete.
    #[arg(long, value_name = "SECONDS")]
    pub(crate) wait_timeout: Option<u64>,
    /// Seconds between provisioning status checks.
    #[arg(long, value_name = "SECONDS")]
    pub(crate) poll_interval: Option<u64>,
    /// Report whether a change would occur without creating anything.
    #[arg(long)]
    pub(crate) check: bool,
    /// Override the vRA appliance hostname from configuration.
    #[arg(long, value_name = "HOST")]
    pub(crate) vra_hostname: Option<String>,
    /// Override the vRA username from configuration.
    #[arg(long, value_name = "USER")]
    pub(crate) vra_username: Option<String>,
    /// Override the vRA tenant from configuration.
    #[arg(long, value_name = "TENANT")]
    pub(crate) vra_tenant: Option<String>,
    /// Skip TLS certificate validation for the vRA endpoint.
    #[arg(long)]
    pub(crate) insecure_skip_tls_verify: bool,
}
