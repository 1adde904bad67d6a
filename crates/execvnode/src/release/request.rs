use std::fmt;

use serde::{Deserialize, Serialize};

use crate::assignment::HostMap;
use crate::common::Set;
use crate::select::SelectSpec;

/// What a caller asks the release engine to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReleaseRequest {
    /// Release exactly the named vnodes.
    Explicit(Vec<String>),
    /// Release every vnode that is not on the primary execution host.
    All,
    /// Shrink the assignment so that it satisfies the given select specification.
    KeepSelect(SelectSpec),
}

impl ReleaseRequest {
    pub fn mode_name(&self) -> &'static str {
        match self {
            ReleaseRequest::Explicit(_) => "explicit",
            ReleaseRequest::All => "all",
            ReleaseRequest::KeepSelect(_) => "keep_select",
        }
    }
}

/// PBS job states.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    #[serde(rename = "Q")]
    Queued,
    #[serde(rename = "H")]
    Held,
    #[serde(rename = "W")]
    Waiting,
    #[serde(rename = "T")]
    Transit,
    #[serde(rename = "R")]
    #[default]
    Running,
    #[serde(rename = "S")]
    Suspended,
    #[serde(rename = "E")]
    Exiting,
    #[serde(rename = "B")]
    Begun,
    #[serde(rename = "F")]
    Finished,
}

impl JobState {
    pub fn letter(&self) -> char {
        match self {
            JobState::Queued => 'Q',
            JobState::Held => 'H',
            JobState::Waiting => 'W',
            JobState::Transit => 'T',
            JobState::Running => 'R',
            JobState::Suspended => 'S',
            JobState::Exiting => 'E',
            JobState::Begun => 'B',
            JobState::Finished => 'F',
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Sub-state of a running job that matters for node release.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobSubstate {
    /// Sister hosts are still joining, healthy nodes are not known yet.
    Prerun,
    #[default]
    Running,
    Other,
}

/// Who issued the request.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReleaseOrigin {
    /// A user or administrator (`pbs_release_nodes`).
    #[default]
    Client,
    /// The primary execution host pruning a job after healthy-node resolution.
    NodeResolution,
}

/// Order in which healthy vnodes of a candidate chunk are consumed by keep_select.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VnodeOrder {
    /// Leftmost (first assigned) vnodes first.
    #[default]
    Assigned,
    /// Vnodes holding most cpus first, ties keep the assigned order.
    MostCpusFirst,
}

/// Everything about the job and cluster the engine needs besides the assignment itself.
#[derive(Clone, Debug, Default)]
pub struct ReleaseContext {
    pub state: JobState,
    pub substate: JobSubstate,
    pub array_parent: bool,
    pub origin: ReleaseOrigin,
    pub hosts: HostMap,
    pub cray_hosts: Set<String>,
    /// Vnodes found unhealthy during node resolution.
    pub failed_vnodes: Set<String>,
    /// Hosts found unhealthy during node resolution (all of their vnodes are excluded).
    pub failed_hosts: Set<String>,
    pub vnode_order: VnodeOrder,
}

impl ReleaseContext {
    pub fn is_healthy(&self, vnode: &str) -> bool {
        !self.failed_vnodes.contains(vnode)
            && !self.failed_hosts.contains(self.hosts.host_of(vnode))
    }
}
