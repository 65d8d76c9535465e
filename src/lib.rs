//! Core library for the `vra-guest` provisioning tool.
//!
//! The crate exposes a backend abstraction over the vRealize Automation
//! catalog and inventory APIs, a REST client implementing it, and the
//! workflow that ensures a guest exists (look up → customise template →
//! submit → poll → report).

pub mod backend;
pub mod config;
pub mod guest;
pub mod template;
pub mod test_support;
pub mod types;
pub mod vra;

pub use backend::{
    Backend, BackendError, ExtraDisk, GuestRecord, GuestRequest, GuestRequestBuilder, PowerState,
    RequestState, RequestStatus,
};
pub use config::{ConfigError, VraConfig};
pub use guest::{ExecutionMode, GuestError, GuestOrchestrator, GuestReport};
pub use template::TemplateError;
pub use types::{CatalogId, DestroyId, RequestId};
pub use vra::{VraClient, VraError};
