//! Test support utilities shared across unit and integration tests.

use std::collections::{BTreeSet, VecDeque};
use std::env;
use std::ffi::OsString;
use std::sync::{Arc, Mutex, MutexGuard as StdMutexGuard, PoisonError};

use serde_json::{Value, json};
use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};

use crate::backend::{Backend, BackendFuture, GuestRecord, PowerState, RequestState, RequestStatus};
use crate::types::{CatalogId, DestroyId, RequestId};

/// Component identifier used by [`sample_template`].
pub const SAMPLE_COMPONENT: &str = "vSphere__vCenter__Machine_1";

/// Id carried by the base disk of [`sample_template`].
pub const SAMPLE_BASE_DISK_ID: u64 = 1_541_000_000;

/// Minimal request template with one machine component and one base disk.
#[must_use]
pub fn sample_template() -> Value {
    json!({
        "type": "com.vmware.vcac.catalog.domain.request.CatalogItemProvisioningRequest",
        "data": {
            SAMPLE_COMPONENT: {
                "data": {
                    "cpu": 1,
                    "memory": 1024,
                    "Hostname": "",
                    "VirtualMachine.Network0.Name": "default",
                    "disks": [{
                        "classId": "Infrastructure.Compute.Machine.MachineDisk",
                        "data": {
                            "capacity": 40,
                            "id": SAMPLE_BASE_DISK_ID,
                            "label": "Hard disk 1",
                            "volumeId": 0,
                            "initial_location": ""
                        }
                    }]
                }
            }
        }
    })
}

/// Records a single call made through [`ScriptedBackend`].
#[derive(Clone, Debug, PartialEq)]
pub enum BackendCall {
    /// Inventory search for a hostname.
    FindGuest(String),
    /// Power state read for a destroy id.
    MachineStatus(DestroyId),
    /// Catalog item resolution by name.
    ResolveCatalog(String),
    /// Template fetch for a catalog item.
    RequestTemplate(CatalogId),
    /// Provisioning request submission with the submitted template.
    SubmitRequest(CatalogId, Value),
    /// Status read for a provisioning request.
    RequestStatus(RequestId),
}

impl BackendCall {
    /// Returns `true` for calls that create resources.
    #[must_use]
    pub const fn is_mutating(&self) -> bool {
        matches!(self, Self::SubmitRequest(..))
    }
}

/// Errors produced by [`ScriptedBackend`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ScriptedBackendError {
    /// Scripted duplicate hostname in the inventory.
    #[error("duplicate VMs with hostname {0}")]
    DuplicateHostname(String),
    /// Scripted catalog lookup failure.
    #[error("no entitled catalog item named {0}")]
    CatalogLookup(String),
    /// Scripted submission failure.
    #[error("submission rejected")]
    Submit,
}

#[derive(Debug)]
struct State {
    guests: VecDeque<Option<GuestRecord>>,
    statuses: VecDeque<RequestStatus>,
    template: Value,
    power_state: PowerState,
    duplicate_hostname: bool,
    fail_catalog: bool,
    fail_submit: bool,
    calls: Vec<BackendCall>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            guests: VecDeque::new(),
            statuses: VecDeque::new(),
            template: sample_template(),
            power_state: PowerState::On,
            duplicate_hostname: false,
            fail_catalog: false,
            fail_submit: false,
            calls: Vec::new(),
        }
    }
}

/// Scripted backend that replays queued inventory and status responses and
/// records every call.
///
/// Inventory lookups pop queued answers in FIFO order and report no guest
/// once the queue is empty. Status reads likewise report `In Progress` once
/// their queue is empty.
#[derive(Clone, Debug, Default)]
pub struct ScriptedBackend {
    state: Arc<Mutex<State>>,
}

impl ScriptedBackend {
    /// Creates a backend with an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StdMutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues the answer for the next inventory lookup.
    pub fn push_guest(&self, guest: Option<GuestRecord>) {
        self.lock().guests.push_back(guest);
    }

    /// Queues the next provisioning request status.
    pub fn push_status(&self, state: RequestState, explanation: &str) {
        self.lock().statuses.push_back(RequestStatus {
            state,
            explanation: explanation.to_owned(),
        });
    }

    /// Replaces the template returned for every catalog item.
    pub fn set_template(&self, template: Value) {
        self.lock().template = template;
    }

    /// Sets the power state reported for every guest.
    pub fn set_power_state(&self, state: PowerState) {
        self.lock().power_state = state;
    }

    /// Makes inventory lookups report a duplicate hostname.
    pub fn fail_with_duplicate_hostname(&self) {
        self.lock().duplicate_hostname = true;
    }

    /// Makes catalog resolution fail.
    pub fn fail_catalog_lookup(&self) {
        self.lock().fail_catalog = true;
    }

    /// Makes request submission fail.
    pub fn fail_submit(&self) {
        self.lock().fail_submit = true;
    }

    /// Returns a snapshot of all calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    /// Counts recorded calls that create resources.
    #[must_use]
    pub fn mutating_calls(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.is_mutating())
            .count()
    }

    /// Counts recorded status reads.
    #[must_use]
    pub fn status_calls(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| matches!(call, BackendCall::RequestStatus(_)))
            .count()
    }

    /// Returns the template of the most recent submission, if any.
    #[must_use]
    pub fn last_submitted_template(&self) -> Option<Value> {
        self.lock().calls.iter().rev().find_map(|call| match call {
            BackendCall::SubmitRequest(_, template) => Some(template.clone()),
            _ => None,
        })
    }

    fn record(&self, call: BackendCall) -> StdMutexGuard<'_, State> {
        let mut state = self.lock();
        state.calls.push(call);
        state
    }
}

/// Builds a guest record the way a successful inventory lookup reports it.
#[must_use]
pub fn guest_record(hostname: &str, destroy_id: &str, ip: Option<&str>) -> GuestRecord {
    GuestRecord {
        hostname: hostname.to_owned(),
        request_id: RequestId::from(format!("req-{hostname}")),
        destroy_id: DestroyId::from(destroy_id),
        ip_address: ip.map(str::to_owned),
    }
}

impl Backend for ScriptedBackend {
    type Error = ScriptedBackendError;

    fn find_guest<'a>(
        &'a self,
        hostname: &'a str,
    ) -> BackendFuture<'a, Option<GuestRecord>, Self::Error> {
        let mut state = self.record(BackendCall::FindGuest(hostname.to_owned()));
        let result = if state.duplicate_hostname {
            Err(ScriptedBackendError::DuplicateHostname(hostname.to_owned()))
        } else {
            Ok(state.guests.pop_front().flatten())
        };
        Box::pin(async move { result })
    }

    fn machine_status<'a>(
        &'a self,
        destroy_id: &'a DestroyId,
    ) -> BackendFuture<'a, PowerState, Self::Error> {
        let state = self.record(BackendCall::MachineStatus(destroy_id.clone()));
        let power_state = state.power_state.clone();
        Box::pin(async move { Ok(power_state) })
    }

    fn resolve_catalog_id<'a>(
        &'a self,
        blueprint_name: &'a str,
    ) -> BackendFuture<'a, CatalogId, Self::Error> {
        let state = self.record(BackendCall::ResolveCatalog(blueprint_name.to_owned()));
        let result = if state.fail_catalog {
            Err(ScriptedBackendError::CatalogLookup(blueprint_name.to_owned()))
        } else {
            Ok(CatalogId::from(format!("catalog-{blueprint_name}")))
        };
        Box::pin(async move { result })
    }

    fn request_template<'a>(
        &'a self,
        catalog_id: &'a CatalogId,
    ) -> BackendFuture<'a, Value, Self::Error> {
        let state = self.record(BackendCall::RequestTemplate(catalog_id.clone()));
        let template = state.template.clone();
        Box::pin(async move { Ok(template) })
    }

    fn submit_request<'a>(
        &'a self,
        catalog_id: &'a CatalogId,
        template: &'a Value,
    ) -> BackendFuture<'a, RequestId, Self::Error> {
        let state = self.record(BackendCall::SubmitRequest(
            catalog_id.clone(),
            template.clone(),
        ));
        let result = if state.fail_submit {
            Err(ScriptedBackendError::Submit)
        } else {
            Ok(RequestId::from("scripted-request"))
        };
        Box::pin(async move { result })
    }

    fn request_status<'a>(
        &'a self,
        request_id: &'a RequestId,
    ) -> BackendFuture<'a, RequestStatus, Self::Error> {
        let mut state = self.record(BackendCall::RequestStatus(request_id.clone()));
        let status = state.statuses.pop_front().unwrap_or_else(|| RequestStatus {
            state: RequestState::InProgress(String::from("In Progress")),
            explanation: String::new(),
        });
        Box::pin(async move { Ok(status) })
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: AsyncMutex<()> = AsyncMutex::const_new(());

/// Holds [`ENV_LOCK`] and restores every touched variable on drop.
pub struct EnvGuard {
    saved: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets each `(key, value)` pair for the lifetime of the guard.
    pub async fn set_vars(pairs: &[(&str, &str)]) -> Self {
        let changes: Vec<(&str, Option<&str>)> =
            pairs.iter().map(|(key, value)| (*key, Some(*value))).collect();
        Self::apply(&changes).await
    }

    /// Sets (`Some`) or unsets (`None`) each variable for the lifetime of the
    /// guard.
    pub async fn apply(changes: &[(&str, Option<&str>)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                changes.iter().all(|(key, _)| seen.insert(*key))
            },
            "EnvGuard::apply received the same key twice"
        );

        let guard = ENV_LOCK.lock().await;
        let saved = changes
            .iter()
            .map(|(key, value)| {
                let previous = env::var_os(key);
                // SAFETY: `ENV_LOCK` is held, so no other test mutates the environment.
                unsafe {
                    match value {
                        Some(value) => env::set_var(key, value),
                        None => env::remove_var(key),
                    }
                }
                ((*key).to_owned(), previous)
            })
            .collect();

        Self {
            saved,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, previous) in self.saved.drain(..) {
            // SAFETY: `_guard` still holds `ENV_LOCK`.
            unsafe {
                match previous {
                    Some(value) => env::set_var(&key, value),
                    None => env::remove_var(&key),
                }
            }
        }
    }
}
