use std::fmt;

use serde::{Deserialize, Serialize};

use crate::assignment::{ExecVnodeAssignment, HostMap, VnodeRef};
use crate::resources::ResourceVector;

/// What happened to a mom host of the job.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostReleaseStatus {
    /// No vnode of the host is assigned anymore, the host may tear the job down.
    FullyReleased,
    /// Some vnodes (or resources) were released but the host still serves the job.
    PartiallyReleased,
    Unchanged,
}

impl fmt::Display for HostReleaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            HostReleaseStatus::FullyReleased => "fully released",
            HostReleaseStatus::PartiallyReleased => "partially released",
            HostReleaseStatus::Unchanged => "unchanged",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostStatus {
    pub host: String,
    pub status: HostReleaseStatus,
}

/// Result of a committed release: the new assignment plus the diff against the old one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReleaseResult {
    pub assignment: ExecVnodeAssignment,
    /// One entry per host of the old assignment, in order of first appearance.
    pub hosts: Vec<HostStatus>,
    /// Consumable resources taken away from the job, zero amounts are left out.
    /// `old total == new total + delta` holds for every consumable resource.
    pub resource_delta: ResourceVector,
    /// Vnodes that are no longer part of the assignment.
    pub released_vnodes: Vec<String>,
}

impl ReleaseResult {
    pub(crate) fn compute(
        old: &ExecVnodeAssignment,
        new: ExecVnodeAssignment,
        hosts: &HostMap,
    ) -> crate::Result<ReleaseResult> {
        let resource_delta: ResourceVector = old
            .total_resources()
            .consumables()
            .checked_sub(new.total_resources())?
            .iter()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|(name, amount)| (name.to_string(), amount.clone()))
            .collect();
        let released_vnodes = old
            .vnode_names()
            .into_iter()
            .filter(|name| !new.contains_vnode(name))
            .map(|name| name.to_string())
            .collect();

        let host_status = old
            .hosts(hosts)
            .into_iter()
            .map(|host| {
                let on_host = |assignment: &ExecVnodeAssignment| -> Vec<VnodeRef> {
                    assignment
                        .vnodes()
                        .filter(|vnode| hosts.host_of(vnode.name()) == host)
                        .cloned()
                        .collect()
                };
                let before = on_host(old);
                let after = on_host(&new);
                let status = if after.is_empty() {
                    HostReleaseStatus::FullyReleased
                } else if before != after {
                    HostReleaseStatus::PartiallyReleased
                } else {
                    HostReleaseStatus::Unchanged
                };
                HostStatus {
                    host: host.to_string(),
                    status,
                }
            })
            .collect();

        Ok(ReleaseResult {
            assignment: new,
            hosts: host_status,
            resource_delta,
            released_vnodes,
        })
    }

    pub fn status_of(&self, host: &str) -> Option<HostReleaseStatus> {
        self.hosts
            .iter()
            .find(|status| status.host == host)
            .map(|status| status.status)
    }

    /// Hosts that should receive a teardown notification.
    pub fn fully_released_hosts(&self) -> impl Iterator<Item = &str> {
        self.hosts
            .iter()
            .filter(|status| status.status == HostReleaseStatus::FullyReleased)
            .map(|status| status.host.as_str())
    }

    /// True if the request did not change the assignment at all.
    pub fn is_noop(&self) -> bool {
        self.hosts
            .iter()
            .all(|status| status.status == HostReleaseStatus::Unchanged)
    }
}
