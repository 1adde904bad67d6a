use crate::assignment::ExecVnodeAssignment;
use crate::common::Set;
use crate::common::error::VnodeError;
use crate::release::request::{JobState, JobSubstate, ReleaseContext, ReleaseOrigin, ReleaseRequest};

/// Rejects requests that are not allowed for the current state of the job.
pub(crate) fn check_job(request: &ReleaseRequest, ctx: &ReleaseContext) -> crate::Result<()> {
    if ctx.array_parent {
        return Err(VnodeError::NotSupportedForArrayParent);
    }
    if ctx.state != JobState::Running {
        log::debug!(
            "Rejecting {} release, job is in state {}",
            request.mode_name(),
            ctx.state
        );
        return Err(VnodeError::JobNotRunning);
    }
    if ctx.substate == JobSubstate::Prerun {
        return match (request, ctx.origin) {
            (ReleaseRequest::KeepSelect(_), ReleaseOrigin::NodeResolution) => Ok(()),
            (ReleaseRequest::KeepSelect(_), ReleaseOrigin::Client) => {
                Err(VnodeError::ExclusiveNonPrimaryNotReady)
            }
            _ => Err(VnodeError::JobNotRunning),
        };
    }
    Ok(())
}

fn check_platform(vnode: &str, ctx: &ReleaseContext) -> crate::Result<()> {
    if ctx.cray_hosts.contains(ctx.hosts.host_of(vnode)) {
        return Err(VnodeError::UnsupportedPlatform(vnode.to_string()));
    }
    Ok(())
}

/// Checks an explicit vnode list and returns it without duplicates.
pub(crate) fn explicit_targets<'a>(
    assignment: &ExecVnodeAssignment,
    vnodes: &'a [String],
    ctx: &ReleaseContext,
) -> crate::Result<Vec<&'a str>> {
    if vnodes.is_empty() {
        return Err(VnodeError::EmptyRequest);
    }

    let mut seen = Set::default();
    let targets: Vec<&str> = vnodes
        .iter()
        .map(|name| name.as_str())
        .filter(|name| seen.insert(*name))
        .collect();

    let missing: Vec<&str> = targets
        .iter()
        .copied()
        .filter(|name| !assignment.contains_vnode(name))
        .collect();
    if !missing.is_empty() {
        return Err(VnodeError::ExplicitVnodeNotAssigned(missing.join(" ")));
    }

    let primary_host = assignment.primary_host(&ctx.hosts);
    for target in &targets {
        if ctx.hosts.host_of(target) == primary_host {
            return Err(VnodeError::PrimaryHostProtected(target.to_string()));
        }
        check_platform(target, ctx)?;
    }
    Ok(targets)
}

/// Every vnode that does not live on the primary execution host.
pub(crate) fn all_targets<'a>(
    assignment: &'a ExecVnodeAssignment,
    ctx: &ReleaseContext,
) -> crate::Result<Vec<&'a str>> {
    let primary_host = assignment.primary_host(&ctx.hosts);
    let targets: Vec<&str> = assignment
        .vnode_names()
        .into_iter()
        .filter(|name| ctx.hosts.host_of(name) != primary_host)
        .collect();
    for target in &targets {
        check_platform(target, ctx)?;
    }
    Ok(targets)
}
