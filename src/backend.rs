//! Backend abstraction over the vRA catalog and inventory calls the guest
//! workflow depends on.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::types::{CatalogId, DestroyId, RequestId};

/// Additional disk appended after the blueprint's base disk.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExtraDisk {
    /// Capacity in gigabytes.
    pub size_gb: u64,
    /// Mount point (Linux) or drive letter (Windows).
    pub mount_point: String,
}

impl FromStr for ExtraDisk {
    type Err = BackendError;

    /// Parses `SIZE_GB:MOUNT_POINT`. Only the first colon separates the two
    /// halves so Windows drive letters such as `80:E:` survive.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (size, mount_point) = value
            .split_once(':')
            .ok_or_else(|| BackendError::InvalidDisk(value.to_owned()))?;
        let size_gb = size
            .trim()
            .parse::<u64>()
            .map_err(|_| BackendError::InvalidDisk(value.to_owned()))?;
        let mount = mount_point.trim();
        if size_gb == 0 || mount.is_empty() {
            return Err(BackendError::InvalidDisk(value.to_owned()));
        }
        Ok(Self {
            size_gb,
            mount_point: mount.to_owned(),
        })
    }
}

/// Parameters describing the guest to ensure.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GuestRequest {
    /// Component identifier inside the blueprint template.
    pub blueprint_instance_id: String,
    /// Display name of the catalog item to request.
    pub blueprint_name: String,
    /// Number of virtual CPUs.
    pub cpu: u32,
    /// Memory size as understood by the blueprint.
    pub memory: u64,
    /// Hostname; also the key used to find an existing guest.
    pub hostname: String,
    /// Network the guest's first adapter attaches to.
    pub network_adapter: String,
    /// Disks appended after the base disk, in order.
    pub extra_disks: Vec<ExtraDisk>,
}

impl GuestRequest {
    /// Starts a builder for a [`GuestRequest`].
    #[must_use]
    pub fn builder() -> GuestRequestBuilder {
        GuestRequestBuilder::new()
    }

    /// Validates the request, returning a descriptive error when a required
    /// field is missing.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Validation`] when any string field is empty or
    /// a sizing field is zero.
    pub fn validate(&self) -> Result<(), BackendError> {
        if self.blueprint_instance_id.is_empty() {
            return Err(BackendError::Validation("blueprint_instance_id".to_owned()));
        }
        if self.blueprint_name.is_empty() {
            return Err(BackendError::Validation("blueprint_name".to_owned()));
        }
        if self.hostname.trim().is_empty() {
            return Err(BackendError::Validation("hostname".to_owned()));
        }
        if self.network_adapter.is_empty() {
            return Err(BackendError::Validation("network_adapter".to_owned()));
        }
        if self.cpu == 0 {
            return Err(BackendError::Validation("cpu".to_owned()));
        }
        if self.memory == 0 {
            return Err(BackendError::Validation("memory".to_owned()));
        }
        Ok(())
    }
}

/// Builder for [`GuestRequest`] that defers trimming and validation to
/// construction.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GuestRequestBuilder {
    blueprint_instance_id: String,
    blueprint_name: String,
    cpu: u32,
    memory: u64,
    hostname: String,
    network_adapter: String,
    extra_disks: Vec<ExtraDisk>,
}

impl GuestRequestBuilder {
    /// Creates an empty builder; fields must be populated before build.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the blueprint component identifier.
    #[must_use]
    pub fn blueprint_instance_id(mut self, value: impl Into<String>) -> Self {
        self.blueprint_instance_id = value.into();
        self
    }

    /// Sets the catalog item name.
    #[must_use]
    pub fn blueprint_name(mut self, value: impl Into<String>) -> Self {
        self.blueprint_name = value.into();
        self
    }

    /// Sets the CPU count.
    #[must_use]
    pub const fn cpu(mut self, value: u32) -> Self {
        self.cpu = value;
        self
    }

    /// Sets the memory size.
    #[must_use]
    pub const fn memory(mut self, value: u64) -> Self {
        self.memory = value;
        self
    }

    /// Sets the hostname.
    #[must_use]
    pub fn hostname(mut self, value: impl Into<String>) -> Self {
        self.hostname = value.into();
        self
    }

    /// Sets the network adapter name.
    #[must_use]
    pub fn network_adapter(mut self, value: impl Into<String>) -> Self {
        self.network_adapter = value.into();
        self
    }

    /// Appends an extra disk.
    #[must_use]
    pub fn extra_disk(mut self, disk: ExtraDisk) -> Self {
        self.extra_disks.push(disk);
        self
    }

    /// Replaces the extra disk list.
    #[must_use]
    pub fn extra_disks(mut self, disks: Vec<ExtraDisk>) -> Self {
        self.extra_disks = disks;
        self
    }

    /// Builds and validates the [`GuestRequest`], trimming string inputs
    /// other than the hostname. The hostname is kept verbatim because the
    /// inventory search matches it exactly.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Validation`] when any required field is empty.
    pub fn build(self) -> Result<GuestRequest, BackendError> {
        let request = GuestRequest {
            blueprint_instance_id: self.blueprint_instance_id.trim().to_owned(),
            blueprint_name: self.blueprint_name.trim().to_owned(),
            cpu: self.cpu,
            memory: self.memory,
            hostname: self.hostname,
            network_adapter: self.network_adapter.trim().to_owned(),
            extra_disks: self.extra_disks,
        };
        request.validate()?;
        Ok(request)
    }
}

/// Existing guest located in the infrastructure inventory.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GuestRecord {
    /// Hostname the guest was found under.
    pub hostname: String,
    /// Request that provisioned the guest.
    pub request_id: RequestId,
    /// Identifier of the infrastructure resource, used for teardown.
    pub destroy_id: DestroyId,
    /// IP address, absent until guest customisation has reported one.
    pub ip_address: Option<String>,
}

/// Power state reported in a machine's `MachineStatus` resource-data entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PowerState {
    /// Powered on.
    On,
    /// Powering on.
    TurningOn,
    /// Powering off.
    TurningOff,
    /// Powered off.
    Off,
    /// Restarting.
    Rebooting,
    /// Any other status text, preserved verbatim.
    Other(String),
}

impl PowerState {
    /// Status text as reported by vRA.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::On => "On",
            Self::TurningOn => "TurningOn",
            Self::TurningOff => "TurningOff",
            Self::Off => "Off",
            Self::Rebooting => "Rebooting",
            Self::Other(value) => value.as_str(),
        }
    }
}

impl From<&str> for PowerState {
    fn from(value: &str) -> Self {
        match value {
            "On" => Self::On,
            "TurningOn" => Self::TurningOn,
            "TurningOff" => Self::TurningOff,
            "Off" => Self::Off,
            "Rebooting" => Self::Rebooting,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PowerState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Lifecycle phase of a provisioning request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RequestState {
    /// Any non-terminal phase; the raw `stateName` is kept for logging.
    InProgress(String),
    /// The request completed and the guest exists.
    Successful,
    /// The request was rejected or failed.
    Failed,
}

impl From<&str> for RequestState {
    fn from(value: &str) -> Self {
        match value {
            "Successful" => Self::Successful,
            "Failed" => Self::Failed,
            other => Self::InProgress(other.to_owned()),
        }
    }
}

/// Snapshot of a provisioning request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RequestStatus {
    /// Current phase.
    pub state: RequestState,
    /// Server-provided completion details; empty until the request finishes.
    pub explanation: String,
}

/// Errors raised while building backend inputs.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum BackendError {
    /// Raised when a request is missing a required field.
    #[error("missing or empty field: {0}")]
    Validation(String),
    /// Raised when an extra disk argument is not `SIZE_GB:MOUNT_POINT`.
    #[error("invalid extra disk '{0}': expected SIZE_GB:MOUNT_POINT with a non-zero size")]
    InvalidDisk(String),
}

/// Future returned by backend operations.
pub type BackendFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Calls the guest workflow makes against vRA. Every call is a single REST
/// round trip (or a fixed short sequence of them) and is never retried.
pub trait Backend {
    /// Provider specific error type returned by the backend.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Finds the unique guest registered under `hostname`, if any.
    fn find_guest<'a>(
        &'a self,
        hostname: &'a str,
    ) -> BackendFuture<'a, Option<GuestRecord>, Self::Error>;

    /// Reads the power state of the resource identified by `destroy_id`.
    fn machine_status<'a>(
        &'a self,
        destroy_id: &'a DestroyId,
    ) -> BackendFuture<'a, PowerState, Self::Error>;

    /// Resolves a catalog item name to its identifier.
    fn resolve_catalog_id<'a>(
        &'a self,
        blueprint_name: &'a str,
    ) -> BackendFuture<'a, CatalogId, Self::Error>;

    /// Fetches the request template for a catalog item.
    fn request_template<'a>(
        &'a self,
        catalog_id: &'a CatalogId,
    ) -> BackendFuture<'a, Value, Self::Error>;

    /// Submits a provisioning request. This is the only mutating call.
    fn submit_request<'a>(
        &'a self,
        catalog_id: &'a CatalogId,
        template: &'a Value,
    ) -> BackendFuture<'a, RequestId, Self::Error>;

    /// Reads the current status of a provisioning request.
    fn request_status<'a>(
        &'a self,
        request_id: &'a RequestId,
    ) -> BackendFuture<'a, RequestStatus, Self::Error>;
}
