//! BDD step definitions for the ensure-guest workflow.

use rstest_bdd_macros::{given, then, when};
use tokio::runtime::Runtime;
use vra_guest::test_support::guest_record;
use vra_guest::{ExecutionMode, GuestReport, RequestState};

use super::test_helpers::{
    GuestContext, GuestOutcome, observe, orchestrator, parse_disk, request,
};

const PROVISIONED_HOSTNAME: &str = "Test-VM";

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("no guest named \"{hostname}\" exists")]
fn no_guest(mut guest_context: GuestContext, hostname: String) -> GuestContext {
    let _ = hostname;
    guest_context.lookups.push(None);
    guest_context
}

#[given("a guest named \"{hostname}\" exists with address \"{ip}\"")]
fn existing_guest(mut guest_context: GuestContext, hostname: String, ip: String) -> GuestContext {
    guest_context.lookups.push(Some(guest_record(
        hostname.trim(),
        "machine-1",
        Some(ip.trim()),
    )));
    guest_context
}

#[given("the inventory holds duplicate guests")]
fn duplicate_guests(mut guest_context: GuestContext) -> GuestContext {
    guest_context.duplicate_hostname = true;
    guest_context
}

#[given("the guest appears with address \"{ip}\" once provisioned")]
fn guest_appears(mut guest_context: GuestContext, ip: String) -> GuestContext {
    guest_context.lookups.push(Some(guest_record(
        PROVISIONED_HOSTNAME,
        "machine-2",
        Some(ip.trim()),
    )));
    guest_context
}

#[given("the request succeeds after {checks:u32} status checks")]
fn request_succeeds(mut guest_context: GuestContext, checks: u32) -> GuestContext {
    for _ in 1..checks {
        guest_context.statuses.push((
            RequestState::InProgress(String::from("In Progress")),
            String::new(),
        ));
    }
    guest_context.statuses.push((
        RequestState::Successful,
        String::from("Request succeeded."),
    ));
    guest_context
}

#[given("the request fails with \"{explanation}\"")]
fn request_fails(mut guest_context: GuestContext, explanation: String) -> GuestContext {
    guest_context
        .statuses
        .push((RequestState::Failed, explanation.trim().to_owned()));
    guest_context
}

#[given("extra disks \"{first}\" and \"{second}\" are requested")]
fn extra_disks(mut guest_context: GuestContext, first: String, second: String) -> GuestContext {
    guest_context.extra_disks = vec![parse_disk(&first), parse_disk(&second)];
    guest_context
}

#[given("the wait timeout is {intervals:u32} poll intervals")]
fn wait_timeout(mut guest_context: GuestContext, intervals: u32) -> GuestContext {
    guest_context.wait_intervals = intervals;
    guest_context
}

fn ensure(
    guest_context: GuestContext,
    hostname: &str,
    mode: ExecutionMode,
) -> Result<GuestContext, StepError> {
    let runtime = Runtime::new().map_err(|err| StepError::Assertion(err.to_string()))?;
    let backend = guest_context.scripted_backend();
    let orchestrator = orchestrator(backend.clone(), guest_context.wait_intervals);
    let request = request(hostname.trim(), guest_context.extra_disks.clone());
    let result = runtime.block_on(async move { orchestrator.ensure(&request, mode).await });

    let outcome = match result {
        Ok(report) => GuestOutcome::Success(report),
        Err(err) => GuestOutcome::Failure(err.to_string()),
    };
    Ok(GuestContext {
        outcome: Some(outcome),
        observed: observe(&backend),
        ..guest_context
    })
}

#[when("I preview the guest \"{hostname}\" in check mode")]
fn ensure_in_check_mode(
    guest_context: GuestContext,
    hostname: String,
) -> Result<GuestContext, StepError> {
    ensure(guest_context, &hostname, ExecutionMode::Check)
}

#[when("I ensure the guest \"{hostname}\"")]
fn ensure_guest(guest_context: GuestContext, hostname: String) -> Result<GuestContext, StepError> {
    ensure(guest_context, &hostname, ExecutionMode::Apply)
}

fn report(guest_context: &GuestContext) -> Result<&GuestReport, StepError> {
    match guest_context.outcome.as_ref() {
        Some(GuestOutcome::Success(report)) => Ok(report),
        Some(GuestOutcome::Failure(message)) => Err(StepError::Assertion(format!(
            "workflow failed unexpectedly: {message}"
        ))),
        None => Err(StepError::Assertion(String::from("missing outcome"))),
    }
}

#[then("the report marks the guest as changed")]
fn report_changed(guest_context: &GuestContext) -> Result<(), StepError> {
    if report(guest_context)?.changed {
        Ok(())
    } else {
        Err(StepError::Assertion(String::from("expected changed=true")))
    }
}

#[then("the report marks the guest as unchanged")]
fn report_unchanged(guest_context: &GuestContext) -> Result<(), StepError> {
    if report(guest_context)?.changed {
        Err(StepError::Assertion(String::from("expected changed=false")))
    } else {
        Ok(())
    }
}

#[then("the report address is \"{ip}\"")]
fn report_address(guest_context: &GuestContext, ip: String) -> Result<(), StepError> {
    let actual = &report(guest_context)?.ip;
    if actual == ip.trim() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("expected ip {ip}, got {actual}")))
    }
}

#[then("no provisioning request is submitted")]
fn nothing_submitted(guest_context: &GuestContext) -> Result<(), StepError> {
    match guest_context.observed.submissions {
        0 => Ok(()),
        count => Err(StepError::Assertion(format!(
            "expected no submissions, got {count}"
        ))),
    }
}

#[then("the submitted template carries {disks:u32} disks")]
fn submitted_disks(guest_context: &GuestContext, disks: u32) -> Result<(), StepError> {
    let count = guest_context
        .observed
        .submitted_disks
        .ok_or_else(|| StepError::Assertion(String::from("no template was submitted")))?;
    if count == disks as usize {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {disks} disks, got {count}"
        )))
    }
}

#[then("the workflow fails with \"{message}\"")]
fn workflow_fails(guest_context: &GuestContext, message: String) -> Result<(), StepError> {
    match guest_context.outcome.as_ref() {
        Some(GuestOutcome::Failure(actual)) if actual.contains(message.trim()) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected failure containing {message}, got {other:?}"
        ))),
    }
}
