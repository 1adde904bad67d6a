//! Job attributes and accounting records derived from exec_vnode assignments.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::assignment::{ExecVnodeAssignment, HostMap};
use crate::release::{HostReleaseStatus, HostStatus};
use crate::resources::ResourceVector;

/// Accounting record types related to job start and node release.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    /// Resources the job held before a release.
    #[serde(rename = "u")]
    Update,
    /// Resources the job continues with after a release.
    #[serde(rename = "c")]
    Continue,
    /// Last phase of a job that released nodes.
    #[serde(rename = "e")]
    PhasedEnd,
    /// Job end, always with the original assignment.
    #[serde(rename = "E")]
    End,
    #[serde(rename = "S")]
    Start,
    /// Start with the pruned assignment of a job that tolerated node failures.
    #[serde(rename = "s")]
    SecondaryStart,
}

impl RecordKind {
    pub fn letter(&self) -> char {
        match self {
            RecordKind::Update => 'u',
            RecordKind::Continue => 'c',
            RecordKind::PhasedEnd => 'e',
            RecordKind::End => 'E',
            RecordKind::Start => 'S',
            RecordKind::SecondaryStart => 's',
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Job attributes that follow from an assignment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProjection {
    pub exec_host: String,
    pub exec_vnode: String,
    pub schedselect: String,
    pub nodect: usize,
    /// Summed `Resource_List` entries.
    pub resources: ResourceVector,
}

impl JobProjection {
    pub fn of(assignment: &ExecVnodeAssignment, hosts: &HostMap) -> Self {
        JobProjection {
            exec_host: assignment.exec_host(hosts),
            exec_vnode: assignment.to_string(),
            schedselect: assignment.schedselect(),
            nodect: assignment.nodect(),
            resources: assignment.total_resources().clone(),
        }
    }

    /// `Resource_List` entries sorted by name, including `nodect` and `select`.
    pub fn resource_list(&self) -> Vec<(String, String)> {
        let mut list: Vec<(String, String)> = self
            .resources
            .iter()
            .map(|(name, amount)| (name.to_string(), amount.to_string()))
            .collect();
        list.push(("nodect".to_string(), self.nodect.to_string()));
        list.push(("select".to_string(), self.schedselect.clone()));
        list.sort_by(|a, b| a.0.cmp(&b.0));
        list
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingRecord {
    pub kind: RecordKind,
    pub projection: JobProjection,
    /// Hosts that left the job, only filled for [`RecordKind::Update`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub released_hosts: Vec<String>,
    /// Job level `Resource_List` entries that do not come from the assignment
    /// (e.g. `walltime` or `place`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_resources: Vec<(String, String)>,
}

impl AccountingRecord {
    pub fn new(kind: RecordKind, assignment: &ExecVnodeAssignment, hosts: &HostMap) -> Self {
        AccountingRecord {
            kind,
            projection: JobProjection::of(assignment, hosts),
            released_hosts: Vec::new(),
            extra_resources: Vec::new(),
        }
    }

    pub fn with_extra_resources(mut self, resources: &[(String, String)]) -> Self {
        self.extra_resources = resources.to_vec();
        self
    }

    /// Attribute list in the order in which it is written to the accounting log.
    pub fn attributes(&self) -> Vec<(String, String)> {
        let mut attributes = vec![
            ("exec_host".to_string(), self.projection.exec_host.clone()),
            ("exec_vnode".to_string(), self.projection.exec_vnode.clone()),
        ];
        let mut resources = self.projection.resource_list();
        resources.extend(self.extra_resources.iter().cloned());
        resources.sort_by(|a, b| a.0.cmp(&b.0));
        attributes.extend(
            resources
                .into_iter()
                .map(|(name, value)| (format!("Resource_List.{name}"), value)),
        );
        if !self.released_hosts.is_empty() {
            attributes.push(("released_hosts".to_string(), self.released_hosts.join("+")));
        }
        attributes
    }
}

/// Renders the attribute part of an accounting line, `key=value` pairs separated by spaces.
impl fmt::Display for AccountingRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (index, (name, value)) in self.attributes().into_iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

/// Point of the job life cycle at which records are projected.
#[derive(Copy, Clone, Debug)]
pub enum AccountingPhase<'a> {
    /// Regular start, `old` and `new` are the same assignment.
    Start,
    /// Start of a job that tolerates node failures: `old` is the over-provisioned
    /// assignment, `new` the pruned one.
    TolerantStart,
    /// A committed release from `old` to `new`.
    Release,
    /// Job termination, `new` is the last assignment.
    End { original: &'a ExecVnodeAssignment },
}

/// Orders the accounting records emitted for a transition of a job assignment.
///
/// A release yields `u` (old state) followed by `c` (new state), a release that changed
/// nothing yields no record. `E` always carries the original assignment.
pub fn project_accounting(
    old: &ExecVnodeAssignment,
    new: &ExecVnodeAssignment,
    per_host_status: &[HostStatus],
    phase: AccountingPhase,
    hosts: &HostMap,
) -> Vec<AccountingRecord> {
    match phase {
        AccountingPhase::Start => vec![AccountingRecord::new(RecordKind::Start, new, hosts)],
        AccountingPhase::TolerantStart => vec![
            AccountingRecord::new(RecordKind::Start, old, hosts),
            AccountingRecord::new(RecordKind::SecondaryStart, new, hosts),
        ],
        AccountingPhase::Release => {
            if per_host_status
                .iter()
                .all(|status| status.status == HostReleaseStatus::Unchanged)
            {
                return Vec::new();
            }
            let mut update = AccountingRecord::new(RecordKind::Update, old, hosts);
            update.released_hosts = per_host_status
                .iter()
                .filter(|status| status.status == HostReleaseStatus::FullyReleased)
                .map(|status| status.host.clone())
                .collect();
            vec![
                update,
                AccountingRecord::new(RecordKind::Continue, new, hosts),
            ]
        }
        AccountingPhase::End { original } => {
            let mut records = Vec::with_capacity(2);
            if new != original {
                records.push(AccountingRecord::new(RecordKind::PhasedEnd, new, hosts));
            }
            records.push(AccountingRecord::new(RecordKind::End, original, hosts));
            records
        }
    }
}
