use crate::assignment::{ExecVnodeAssignment, parse_exec_vnode};
use crate::common::error::VnodeError;
use crate::release::{HostReleaseStatus, ReleaseOrigin, ReleaseRequest, release};
use crate::select::parse_select_spec;
use crate::tests::utils::{ContextBuilder, enable_test_logging, resources};

/// Job submitted with three chunks and two spare ones to tolerate node failures.
const OVERPROVISIONED: &str = "(nA:ncpus=3:mem=2097152kb)+(nB:ncpus=3:mem=2097152kb)+(nC:ncpus=3:mem=2097152kb)+(nD:ncpus=2:mem=2097152kb)+(nE:ncpus=2:mem=2097152kb)";
const SELECT: &str = "ncpus=3:mem=2gb+ncpus=3:mem=2gb+ncpus=2:mem=2gb";

fn keep_select(select: &str) -> ReleaseRequest {
    ReleaseRequest::KeepSelect(parse_select_spec(select).unwrap())
}

fn overprovisioned() -> ExecVnodeAssignment {
    parse_exec_vnode(OVERPROVISIONED).unwrap()
}

#[test]
fn test_prune_skips_failed_hosts() {
    enable_test_logging();
    let old = overprovisioned();
    let ctx = ContextBuilder::default()
        .node_resolution()
        .failed_hosts(["nB", "nD"])
        .finish();
    let result = release(&old, &keep_select(SELECT), &ctx).unwrap();

    assert_eq!(
        result.assignment.to_string(),
        "(nA:ncpus=3:mem=2097152kb)+(nC:ncpus=3:mem=2097152kb)+(nE:ncpus=2:mem=2097152kb)"
    );
    assert_eq!(result.assignment.nodect(), 3);
    for (host, status) in [
        ("nA", HostReleaseStatus::Unchanged),
        ("nB", HostReleaseStatus::FullyReleased),
        ("nC", HostReleaseStatus::Unchanged),
        ("nD", HostReleaseStatus::FullyReleased),
        ("nE", HostReleaseStatus::Unchanged),
    ] {
        assert_eq!(result.status_of(host), Some(status), "{host}");
    }
    assert_eq!(result.resource_delta, resources("ncpus=5:mem=4gb"));
}

#[test]
fn test_prune_without_failures_takes_leftmost() {
    let old = overprovisioned();
    let ctx = ContextBuilder::default().node_resolution().finish();
    let result = release(&old, &keep_select(SELECT), &ctx).unwrap();
    // The first unused chunk that can hold a select chunk wins, even if it is bigger.
    assert_eq!(
        result.assignment.to_string(),
        "(nA:ncpus=3:mem=2097152kb)+(nB:ncpus=3:mem=2097152kb)+(nC:ncpus=2:mem=2097152kb)"
    );
    assert_eq!(result.released_vnodes, vec!["nD".to_string(), "nE".to_string()]);
    assert_eq!(result.status_of("nC"), Some(HostReleaseStatus::PartiallyReleased));
}

#[test]
fn test_prune_by_failed_vnode() {
    let old = overprovisioned();
    let ctx = ContextBuilder::default()
        .node_resolution()
        .failed_vnodes(["nC"])
        .finish();
    let result = release(&old, &keep_select(SELECT), &ctx).unwrap();
    assert_eq!(
        result.assignment.to_string(),
        "(nA:ncpus=3:mem=2097152kb)+(nB:ncpus=3:mem=2097152kb)+(nD:ncpus=2:mem=2097152kb)"
    );
}

#[test]
fn test_not_enough_healthy_hosts() {
    let old = overprovisioned();
    let ctx = ContextBuilder::default()
        .node_resolution()
        .failed_hosts(["nB", "nC"])
        .finish();
    let error = release(&old, &keep_select(SELECT), &ctx).unwrap_err();
    assert_eq!(
        error,
        VnodeError::InsufficientHealthyResources {
            chunk: 1,
            select: "1:ncpus=3:mem=2097152kb".to_string()
        }
    );
}

#[test]
fn test_not_enough_cpus() {
    let old = overprovisioned();
    let ctx = ContextBuilder::default().node_resolution().finish();
    let result = release(&old, &keep_select("ncpus=3+ncpus=4"), &ctx);
    assert!(matches!(
        result,
        Err(VnodeError::InsufficientHealthyResources { chunk: 1, .. })
    ));
}

#[test]
fn test_prune_super_chunks() {
    let old = parse_exec_vnode(
        "(nA:ncpus=1:mem=1gb+nA2:ncpus=1:mem=1gb)+(nB:ncpus=1:mem=1gb+nB2:ncpus=1:mem=1gb)+(nC:ncpus=1:mem=1gb+nC2:ncpus=1:mem=1gb)",
    )
    .unwrap();
    let ctx = ContextBuilder::default()
        .node_resolution()
        .failed_vnodes(["nB2"])
        .finish();
    let result = release(&old, &keep_select("ncpus=2:mem=2gb+ncpus=2:mem=2gb"), &ctx).unwrap();
    assert_eq!(
        result.assignment.to_string(),
        "(nA:ncpus=1:mem=1048576kb+nA2:ncpus=1:mem=1048576kb)+(nC:ncpus=1:mem=1048576kb+nC2:ncpus=1:mem=1048576kb)"
    );
}

#[test]
fn test_client_keep_select_on_running_job() {
    let old = overprovisioned();
    let ctx = ContextBuilder::default().finish();
    let result = release(&old, &keep_select("ncpus=2:mem=1gb+ncpus=1"), &ctx).unwrap();
    assert_eq!(
        result.assignment.to_string(),
        "(nA:ncpus=2:mem=1048576kb)+(nB:ncpus=1)"
    );
    assert_eq!(result.status_of("nA"), Some(HostReleaseStatus::PartiallyReleased));
    assert_eq!(result.status_of("nB"), Some(HostReleaseStatus::PartiallyReleased));
    assert_eq!(result.status_of("nC"), Some(HostReleaseStatus::FullyReleased));
}

#[test]
fn test_client_keep_select_during_prerun() {
    let old = overprovisioned();
    let ctx = ContextBuilder::default()
        .node_resolution()
        .origin(ReleaseOrigin::Client)
        .finish();
    let error = release(&old, &keep_select(SELECT), &ctx).unwrap_err();
    assert_eq!(error, VnodeError::ExclusiveNonPrimaryNotReady);
    assert_eq!(error.to_string(), "Request invalid for state of job");
}

#[test]
fn test_earlier_select_chunk_moves_to_make_room() {
    enable_test_logging();
    let old = parse_exec_vnode("(nA:ncpus=1)+(nB:ncpus=4)+(nC:ncpus=1)").unwrap();
    let ctx = ContextBuilder::default().finish();
    let result = release(&old, &keep_select("ncpus=1+ncpus=1+ncpus=4"), &ctx).unwrap();
    assert_eq!(
        result.assignment.to_string(),
        "(nA:ncpus=1)+(nC:ncpus=1)+(nB:ncpus=4)"
    );
    assert!(result.released_vnodes.is_empty());
}

#[test]
fn test_no_combination_fits() {
    let old = parse_exec_vnode("(nA:ncpus=1)+(nB:ncpus=4)+(nC:ncpus=1)").unwrap();
    let ctx = ContextBuilder::default().finish();
    let error = release(&old, &keep_select("ncpus=1+ncpus=4+ncpus=4"), &ctx).unwrap_err();
    assert_eq!(
        error,
        VnodeError::InsufficientHealthyResources {
            chunk: 2,
            select: "1:ncpus=4".to_string()
        }
    );
}

#[test]
fn test_huge_chunk_count() {
    let old = overprovisioned();
    let ctx = ContextBuilder::default().finish();
    let error = release(&old, &keep_select("4000000000:ncpus=1"), &ctx).unwrap_err();
    assert_eq!(
        error,
        VnodeError::InsufficientHealthyResources {
            chunk: 5,
            select: "4000000000:ncpus=1".to_string()
        }
    );
}

#[test]
fn test_chunk_count_sum_beyond_u32() {
    let old = overprovisioned();
    let ctx = ContextBuilder::default().finish();
    let error = release(&old, &keep_select("4294967295:ncpus=1+1:ncpus=1"), &ctx).unwrap_err();
    assert_eq!(
        error,
        VnodeError::InsufficientHealthyResources {
            chunk: 5,
            select: "4294967295:ncpus=1".to_string()
        }
    );
}

#[test]
fn test_more_chunks_than_healthy_candidates() {
    let old = overprovisioned();
    let ctx = ContextBuilder::default()
        .node_resolution()
        .failed_hosts(["nB", "nC", "nD"])
        .finish();
    let error = release(&old, &keep_select("ncpus=1+2:ncpus=1"), &ctx).unwrap_err();
    assert_eq!(
        error,
        VnodeError::InsufficientHealthyResources {
            chunk: 2,
            select: "2:ncpus=1".to_string()
        }
    );
}
