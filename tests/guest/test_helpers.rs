//! Shared fixtures for ensure-guest BDD scenarios.
//!
//! The context only carries the script and what the run observed. The
//! scripted backend is assembled from it when the workflow runs.

use std::time::Duration;

use rstest::fixture;
use serde_json::Value;
use vra_guest::test_support::{SAMPLE_COMPONENT, ScriptedBackend};
use vra_guest::{
    ExtraDisk, GuestOrchestrator, GuestRecord, GuestReport, GuestRequest, RequestState,
};

pub const POLL_INTERVAL: Duration = Duration::from_millis(1);
pub const DEFAULT_WAIT_INTERVALS: u32 = 1_000;

#[derive(Clone, Debug)]
pub enum GuestOutcome {
    Success(GuestReport),
    Failure(String),
}

/// What the scripted backend saw during the run.
#[derive(Clone, Debug, Default)]
pub struct Observed {
    pub submissions: usize,
    pub submitted_disks: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct GuestContext {
    pub lookups: Vec<Option<GuestRecord>>,
    pub statuses: Vec<(RequestState, String)>,
    pub duplicate_hostname: bool,
    pub extra_disks: Vec<ExtraDisk>,
    pub wait_intervals: u32,
    pub outcome: Option<GuestOutcome>,
    pub observed: Observed,
}

#[fixture]
pub fn guest_context() -> GuestContext {
    GuestContext {
        lookups: Vec::new(),
        statuses: Vec::new(),
        duplicate_hostname: false,
        extra_disks: Vec::new(),
        wait_intervals: DEFAULT_WAIT_INTERVALS,
        outcome: None,
        observed: Observed::default(),
    }
}

impl GuestContext {
    pub fn scripted_backend(&self) -> ScriptedBackend {
        let backend = ScriptedBackend::new();
        for lookup in &self.lookups {
            backend.push_guest(lookup.clone());
        }
        for (state, explanation) in &self.statuses {
            backend.push_status(state.clone(), explanation);
        }
        if self.duplicate_hostname {
            backend.fail_with_duplicate_hostname();
        }
        backend
    }
}

pub fn observe(backend: &ScriptedBackend) -> Observed {
    let submitted_disks = backend.last_submitted_template().map(|template| {
        template
            .pointer(&format!("/data/{SAMPLE_COMPONENT}/data/disks"))
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    });
    Observed {
        submissions: backend.mutating_calls(),
        submitted_disks,
    }
}

pub fn request(hostname: &str, extra_disks: Vec<ExtraDisk>) -> GuestRequest {
    GuestRequest::builder()
        .blueprint_instance_id(SAMPLE_COMPONENT)
        .blueprint_name("Linux")
        .cpu(2)
        .memory(4096)
        .hostname(hostname)
        .network_adapter("network-adapter-name")
        .extra_disks(extra_disks)
        .build()
        .unwrap_or_else(|err| panic!("request fixture should be valid: {err}"))
}

pub fn orchestrator(
    backend: ScriptedBackend,
    wait_intervals: u32,
) -> GuestOrchestrator<ScriptedBackend> {
    GuestOrchestrator::new(backend)
        .with_poll_interval(POLL_INTERVAL)
        .with_wait_timeout(POLL_INTERVAL * wait_intervals)
}

pub fn parse_disk(raw: &str) -> ExtraDisk {
    raw.trim()
        .parse()
        .unwrap_or_else(|err| panic!("disk fixture {raw} should parse: {err}"))
}
