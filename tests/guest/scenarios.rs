//! BDD scenarios for the ensure-guest workflow.

use rstest_bdd_macros::scenario;

use super::test_helpers::{GuestContext, guest_context};

#[scenario(
    path = "tests/features/guest.feature",
    name = "Check mode reports a change without submitting a request"
)]
fn scenario_check_mode(guest_context: GuestContext) {
    let _ = guest_context;
}

#[scenario(
    path = "tests/features/guest.feature",
    name = "Existing guest is reported unchanged"
)]
fn scenario_existing_guest(guest_context: GuestContext) {
    let _ = guest_context;
}

#[scenario(
    path = "tests/features/guest.feature",
    name = "Duplicate hostnames stop the workflow"
)]
fn scenario_duplicate_hostnames(guest_context: GuestContext) {
    let _ = guest_context;
}

#[scenario(
    path = "tests/features/guest.feature",
    name = "Absent guest is provisioned with extra disks"
)]
fn scenario_provision_with_disks(guest_context: GuestContext) {
    let _ = guest_context;
}

#[scenario(
    path = "tests/features/guest.feature",
    name = "Provisioning gives up when the request never finishes"
)]
fn scenario_poll_timeout(guest_context: GuestContext) {
    let _ = guest_context;
}

#[scenario(
    path = "tests/features/guest.feature",
    name = "Failed request surfaces the explanation"
)]
fn scenario_failed_request(guest_context: GuestContext) {
    let _ = guest_context;
}
