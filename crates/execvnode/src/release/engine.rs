use crate::assignment::ExecVnodeAssignment;
use crate::release::outcome::ReleaseResult;
use crate::release::prune::keep_select;
use crate::release::request::{ReleaseContext, ReleaseRequest};
use crate::release::validate::{all_targets, check_job, explicit_targets};

/// Computes the assignment a job continues with after `request`.
///
/// The input assignment is never modified. On error nothing has to be rolled back,
/// the caller simply keeps the old assignment.
pub fn release(
    assignment: &ExecVnodeAssignment,
    request: &ReleaseRequest,
    ctx: &ReleaseContext,
) -> crate::Result<ReleaseResult> {
    check_job(request, ctx)?;

    let new_assignment = match request {
        ReleaseRequest::Explicit(vnodes) => {
            let targets = explicit_targets(assignment, vnodes, ctx)?;
            remove_vnodes(assignment, &targets)?
        }
        ReleaseRequest::All => {
            let targets = all_targets(assignment, ctx)?;
            if targets.is_empty() {
                log::debug!("All vnodes are on the primary execution host, nothing to release");
                assignment.clone()
            } else {
                remove_vnodes(assignment, &targets)?
            }
        }
        ReleaseRequest::KeepSelect(select) => keep_select(assignment, select, ctx)?,
    };

    let result = ReleaseResult::compute(assignment, new_assignment, &ctx.hosts)?;
    log::debug!(
        "{} release of {}: nodect {} -> {}, released vnodes: {:?}",
        request.mode_name(),
        assignment,
        assignment.nodect(),
        result.assignment.nodect(),
        result.released_vnodes
    );
    Ok(result)
}

/// Removes every occurrence of the given vnodes, dropping chunks that become empty.
pub fn remove_vnodes(
    assignment: &ExecVnodeAssignment,
    targets: &[&str],
) -> crate::Result<ExecVnodeAssignment> {
    let mut chunks = Vec::with_capacity(assignment.nodect());
    for chunk in assignment.chunks() {
        let mut current = Some(chunk.clone());
        for target in targets {
            current = match current {
                Some(chunk) => chunk.remove_vnode(target)?,
                None => break,
            };
        }
        if let Some(chunk) = current {
            chunks.push(chunk);
        }
    }
    ExecVnodeAssignment::from_chunks(chunks)
}
