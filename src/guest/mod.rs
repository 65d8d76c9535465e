//! Orchestrates the ensure-guest workflow.
//!
//! The workflow looks the hostname up in the inventory and, when no guest
//! exists, resolves the catalog item, customises its request template,
//! submits it, and polls the request at a fixed interval until it succeeds,
//! fails, or runs out of time. The guest is then looked up again and its
//! power state read so the caller receives the IP address and destroy id.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::backend::{Backend, GuestRecord, GuestRequest, PowerState, RequestState};
use crate::config::{DEFAULT_POLL_INTERVAL_SECS, DEFAULT_WAIT_TIMEOUT_SECS};
use crate::template::{self, TemplateError};
use crate::types::RequestId;

/// Whether the workflow may create resources.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExecutionMode {
    /// Provision the guest when it is absent.
    Apply,
    /// Only report whether provisioning would happen.
    Check,
}

/// Outcome reported to the caller, serialised as the tool's JSON output.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct GuestReport {
    /// Whether a guest was (or in check mode, would be) created.
    pub changed: bool,
    /// Always `false`; failures are reported as errors instead.
    pub failed: bool,
    /// Power state, empty when the guest does not exist yet.
    pub state: String,
    /// Destroy id, empty when the guest does not exist yet.
    pub destroy_id: String,
    /// IP address, empty until guest customisation reports one.
    pub ip: String,
    /// Hostname the report refers to.
    pub hostname: String,
}

impl GuestReport {
    fn pending(hostname: &str) -> Self {
        Self {
            changed: true,
            hostname: hostname.to_owned(),
            ..Self::default()
        }
    }

    fn from_record(record: GuestRecord, state: &PowerState, changed: bool) -> Self {
        Self {
            changed,
            failed: false,
            state: state.to_string(),
            destroy_id: record.destroy_id.to_string(),
            ip: record.ip_address.unwrap_or_default(),
            hostname: record.hostname,
        }
    }
}

/// Errors surfaced while ensuring a guest.
#[derive(Debug, Error)]
pub enum GuestError<BackendError>
where
    BackendError: std::error::Error + 'static,
{
    /// Raised when the inventory cannot be searched or is inconsistent.
    #[error("inventory lookup failed: {0}")]
    Lookup(#[source] BackendError),
    /// Raised when catalog resolution, template fetch, or submission fails.
    #[error("provisioning failed: {0}")]
    Provision(#[source] BackendError),
    /// Raised when the template lacks the fields to customise.
    #[error("failed to customise template: {0}")]
    Template(#[from] TemplateError),
    /// Raised when a status request fails while polling.
    #[error("failed to poll provisioning request: {0}")]
    Poll(#[source] BackendError),
    /// Raised when the request is still running once the timeout elapses.
    #[error("failed to create VM {hostname} in {timeout_secs} seconds (request {request_id})")]
    PollTimeout {
        /// Hostname being provisioned.
        hostname: String,
        /// Request that did not finish.
        request_id: String,
        /// Configured timeout.
        timeout_secs: u64,
    },
    /// Raised when vRA reports the request as failed.
    #[error("failed to create VM {hostname}: {explanation}")]
    Rejected {
        /// Hostname being provisioned.
        hostname: String,
        /// Completion details reported by the server.
        explanation: String,
    },
    /// Raised when a successful request leaves no guest under the hostname.
    #[error("request {request_id} succeeded but no VM named {hostname} was found")]
    MissingAfterProvision {
        /// Hostname that was provisioned.
        hostname: String,
        /// Request that reported success.
        request_id: String,
    },
    /// Raised when the power state cannot be read.
    #[error("failed to get VM state information: {0}")]
    State(#[source] BackendError),
}

/// Drives the ensure-guest workflow against a [`Backend`].
#[derive(Debug)]
pub struct GuestOrchestrator<B> {
    backend: B,
    poll_interval: Duration,
    wait_timeout: Duration,
}

impl<B> GuestOrchestrator<B>
where
    B: Backend,
{
    /// Creates an orchestrator polling every 15 seconds for up to 600.
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self {
            backend,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            wait_timeout: Duration::from_secs(DEFAULT_WAIT_TIMEOUT_SECS),
        }
    }

    /// Overrides the delay between status checks.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Overrides how long a provisioning request may run.
    #[must_use]
    pub const fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Borrows the backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Ensures a guest named `request.hostname` exists.
    ///
    /// An existing guest is reported as is, with `changed = false`. In
    /// [`ExecutionMode::Check`] an absent guest is reported with
    /// `changed = true` and nothing is submitted.
    ///
    /// # Errors
    ///
    /// Returns [`GuestError`] when any backend call fails, the template cannot
    /// be customised, or the provisioning request fails or times out.
    pub async fn ensure(
        &self,
        request: &GuestRequest,
        mode: ExecutionMode,
    ) -> Result<GuestReport, GuestError<B::Error>> {
        let existing = self
            .backend
            .find_guest(&request.hostname)
            .await
            .map_err(GuestError::Lookup)?;

        let (record, changed) = match existing {
            Some(record) => (record, false),
            None if mode == ExecutionMode::Check => {
                info!(hostname = %request.hostname, "guest absent; check mode skips provisioning");
                return Ok(GuestReport::pending(&request.hostname));
            }
            None => (self.provision(request).await?, true),
        };

        let state = self
            .backend
            .machine_status(&record.destroy_id)
            .await
            .map_err(GuestError::State)?;
        Ok(GuestReport::from_record(record, &state, changed))
    }

    async fn provision(&self, request: &GuestRequest) -> Result<GuestRecord, GuestError<B::Error>> {
        let catalog_id = self
            .backend
            .resolve_catalog_id(&request.blueprint_name)
            .await
            .map_err(GuestError::Provision)?;
        let mut document = self
            .backend
            .request_template(&catalog_id)
            .await
            .map_err(GuestError::Provision)?;
        template::customize(&mut document, request)?;
        let request_id = self
            .backend
            .submit_request(&catalog_id, &document)
            .await
            .map_err(GuestError::Provision)?;

        self.wait_for_request(&request_id, &request.hostname).await?;

        self.backend
            .find_guest(&request.hostname)
            .await
            .map_err(GuestError::Lookup)?
            .ok_or_else(|| GuestError::MissingAfterProvision {
                hostname: request.hostname.clone(),
                request_id: request_id.to_string(),
            })
    }

    /// Polls until the request succeeds.
    ///
    /// Elapsed time is counted in poll intervals. The timeout is checked
    /// after each status call and before its result is acted on, so a
    /// success observed once the timeout is reached still times out.
    async fn wait_for_request(
        &self,
        request_id: &RequestId,
        hostname: &str,
    ) -> Result<(), GuestError<B::Error>> {
        let mut elapsed = Duration::ZERO;
        loop {
            let status = self
                .backend
                .request_status(request_id)
                .await
                .map_err(GuestError::Poll)?;

            if elapsed >= self.wait_timeout {
                return Err(GuestError::PollTimeout {
                    hostname: hostname.to_owned(),
                    request_id: request_id.to_string(),
                    timeout_secs: self.wait_timeout.as_secs(),
                });
            }

            match status.state {
                RequestState::Successful => {
                    info!(%request_id, elapsed_secs = elapsed.as_secs(), "provisioning request succeeded");
                    return Ok(());
                }
                RequestState::Failed => {
                    return Err(GuestError::Rejected {
                        hostname: hostname.to_owned(),
                        explanation: status.explanation,
                    });
                }
                RequestState::InProgress(phase) => {
                    debug!(%request_id, phase = %phase, elapsed_secs = elapsed.as_secs(), "waiting for request");
                }
            }

            sleep(self.poll_interval).await;
            elapsed = elapsed.saturating_add(self.poll_interval);
        }
    }
}
