use crate::assignment::{ExecVnodeAssignment, parse_exec_vnode};
use crate::common::error::VnodeError;
use crate::release::{HostReleaseStatus, ReleaseContext, ReleaseRequest, ReleaseResult, release};
use crate::resources::ResourceVector;
use crate::tests::utils::{
    ContextBuilder, JOB1_EXEC_VNODE, job1_context, job1_hosts, resources, sorted_vec,
};

fn job1() -> ExecVnodeAssignment {
    parse_exec_vnode(JOB1_EXEC_VNODE).unwrap()
}

fn explicit(vnodes: &[&str]) -> ReleaseRequest {
    ReleaseRequest::Explicit(vnodes.iter().map(|v| v.to_string()).collect())
}

fn release_ok(
    assignment: &ExecVnodeAssignment,
    request: &ReleaseRequest,
    ctx: &ReleaseContext,
) -> ReleaseResult {
    let result = release(assignment, request, ctx).unwrap();
    check_conservation(assignment, &result);
    result
}

/// `old == new + delta` for every consumable resource.
fn check_conservation(old: &ExecVnodeAssignment, result: &ReleaseResult) {
    let restored = result
        .assignment
        .total_resources()
        .checked_add(&result.resource_delta)
        .unwrap();
    assert_eq!(restored.consumables(), old.total_resources().consumables());
}

fn removed_sum(old: &ExecVnodeAssignment, result: &ReleaseResult) -> ResourceVector {
    let removed = old
        .vnodes()
        .filter(|vnode| result.released_vnodes.iter().any(|name| name == vnode.name()));
    ResourceVector::sum(removed.map(|vnode| vnode.resources())).unwrap()
}

#[test]
fn test_release_whole_sister_chunks() {
    let old = job1();
    let result = release_ok(&old, &explicit(&["nB", "nB2", "nB3", "nC"]), &job1_context());

    assert_eq!(
        result.assignment.to_string(),
        "(nA:mem=1048576kb:ncpus=1+nA2:mem=1048576kb:ncpus=1+nA3:ncpus=1)"
    );
    assert_eq!(old.nodect(), 3);
    assert_eq!(result.assignment.nodect(), 1);
    assert_eq!(old.total_resources().ncpus(), 8);
    assert_eq!(result.assignment.total_resources().ncpus(), 3);
    assert_eq!(result.assignment.total_resources().mem_kb(), 2 * 1024 * 1024);
    assert_eq!(result.status_of("nA"), Some(HostReleaseStatus::Unchanged));
    assert_eq!(result.status_of("nB"), Some(HostReleaseStatus::FullyReleased));
    assert_eq!(result.status_of("nC"), Some(HostReleaseStatus::FullyReleased));
    assert_eq!(result.resource_delta, resources("mem=4gb:ncpus=5"));
    assert_eq!(result.resource_delta, removed_sum(&old, &result));
    assert_eq!(
        sorted_vec(result.fully_released_hosts().collect()),
        vec!["nB", "nC"]
    );
}

#[test]
fn test_release_one_vnode_of_super_chunk() {
    let old = job1();
    let result = release_ok(&old, &explicit(&["nB"]), &job1_context());

    assert_eq!(
        result.assignment.to_string(),
        "(nA:mem=1048576kb:ncpus=1+nA2:mem=1048576kb:ncpus=1+nA3:ncpus=1)+(nB2:mem=1048576kb:ncpus=1+nB3:ncpus=1)+(nC:ncpus=2:mem=2097152kb)"
    );
    assert_eq!(result.assignment.nodect(), 3);
    assert_eq!(result.status_of("nB"), Some(HostReleaseStatus::PartiallyReleased));
    assert_eq!(result.status_of("nC"), Some(HostReleaseStatus::Unchanged));
    assert_eq!(result.fully_released_hosts().count(), 0);
    assert_eq!(result.released_vnodes, vec!["nB".to_string()]);
    assert_eq!(result.resource_delta, resources("mem=1gb:ncpus=1"));
}

#[test]
fn test_release_in_sequence() {
    let old = job1();
    let ctx = job1_context();
    let first = release_ok(&old, &explicit(&["nB3"]), &ctx);
    let second = release_ok(&first.assignment, &explicit(&["nB", "nB2"]), &ctx);

    assert_eq!(second.assignment.nodect(), 2);
    assert_eq!(second.status_of("nB"), Some(HostReleaseStatus::FullyReleased));
    assert_eq!(
        second.assignment.exec_host(&job1_hosts()),
        "nA/0*3+nC/0*2"
    );

    // The same vnode cannot be released twice.
    assert_eq!(
        release(&second.assignment, &explicit(&["nB3"]), &ctx),
        Err(VnodeError::ExplicitVnodeNotAssigned("nB3".to_string()))
    );
}

#[test]
fn test_chunk_is_dropped_only_when_empty() {
    let old = job1();
    let ctx = job1_context();
    for (targets, nodect) in [
        (&["nB"][..], 3),
        (&["nB", "nB2"][..], 3),
        (&["nB", "nB2", "nB3"][..], 2),
        (&["nC"][..], 2),
        (&["nB2", "nC"][..], 2),
    ] {
        let result = release_ok(&old, &explicit(targets), &ctx);
        assert_eq!(result.assignment.nodect(), nodect, "{targets:?}");
    }
}

#[test]
fn test_primary_vnode_rejects_whole_request() {
    let old = job1();
    let before = old.to_string();
    let result = release(&old, &explicit(&["nB", "nA", "nC"]), &job1_context());
    assert_eq!(result, Err(VnodeError::PrimaryHostProtected("nA".to_string())));
    assert_eq!(
        result.unwrap_err().to_string(),
        "Can't free 'nA' since it's on a primary execution host"
    );
    assert_eq!(old.to_string(), before);
}

#[test]
fn test_release_all() {
    let old = job1();
    let result = release_ok(&old, &ReleaseRequest::All, &job1_context());
    assert_eq!(
        result.assignment.to_string(),
        "(nA:mem=1048576kb:ncpus=1+nA2:mem=1048576kb:ncpus=1+nA3:ncpus=1)"
    );
    assert_eq!(result.status_of("nB"), Some(HostReleaseStatus::FullyReleased));
    assert_eq!(result.status_of("nC"), Some(HostReleaseStatus::FullyReleased));
}

#[test]
fn test_release_all_keeps_primary_host_in_other_chunks() {
    let old = parse_exec_vnode("(nA[0]:ncpus=1)+(nB:ncpus=1)+(nA[1]:ncpus=1)").unwrap();
    let result = release_ok(&old, &ReleaseRequest::All, &ReleaseContext::default());
    assert_eq!(result.assignment.to_string(), "(nA[0]:ncpus=1)+(nA[1]:ncpus=1)");
    assert_eq!(result.status_of("nA"), Some(HostReleaseStatus::Unchanged));
    assert_eq!(result.status_of("nB"), Some(HostReleaseStatus::FullyReleased));
}

#[test]
fn test_host_with_vnodes_in_several_chunks() {
    let old =
        parse_exec_vnode("(nA:ncpus=1)+(nB[0]:ncpus=1)+(nC:ncpus=1)+(nB[1]:ncpus=1)").unwrap();
    let ctx = ReleaseContext::default();
    let result = release_ok(&old, &explicit(&["nB[0]"]), &ctx);
    assert_eq!(result.assignment.nodect(), 3);
    assert_eq!(result.status_of("nB"), Some(HostReleaseStatus::PartiallyReleased));

    let result = release_ok(&result.assignment, &explicit(&["nB[1]"]), &ctx);
    assert_eq!(result.status_of("nB"), Some(HostReleaseStatus::FullyReleased));
    assert_eq!(result.assignment.to_string(), "(nA:ncpus=1)+(nC:ncpus=1)");
}

#[test]
fn test_state_rejections_do_not_touch_assignment() {
    let old = job1();
    let ctx = ContextBuilder::default()
        .state(crate::release::JobState::Held)
        .finish();
    assert_eq!(
        release(&old, &explicit(&["nC"]), &ctx),
        Err(VnodeError::JobNotRunning)
    );
    let ctx = ContextBuilder::default().array_parent(true).finish();
    assert_eq!(
        release(&old, &ReleaseRequest::All, &ctx),
        Err(VnodeError::NotSupportedForArrayParent)
    );
    let ctx = ContextBuilder::default().cray_hosts(["nC"]).finish();
    assert_eq!(
        release(&old, &explicit(&["nB", "nC"]), &ctx),
        Err(VnodeError::UnsupportedPlatform("nC".to_string()))
    );
    assert_eq!(old, job1());
}

#[test]
fn test_string_resources_are_not_released() {
    let old = parse_exec_vnode("(nA:ncpus=1:arch=linux)+(nB:ncpus=2:arch=linux)").unwrap();
    let result = release_ok(&old, &explicit(&["nB"]), &ReleaseContext::default());
    assert_eq!(result.resource_delta, resources("ncpus=2"));
    assert_eq!(result.assignment.to_string(), "(nA:ncpus=1:arch=linux)");
}
