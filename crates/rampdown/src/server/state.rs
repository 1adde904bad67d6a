use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use execvnode::HostMap;
use execvnode::resources::ResourceVector;

use crate::common::error::error;
use crate::common::fsutils::write_atomically;
use crate::server::job::Job;

pub type JobId = String;

/// Vnode table entry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Vnode {
    /// Mom host that manages the vnode.
    pub host: String,
    #[serde(default)]
    pub cray: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Queue {
    #[serde(default)]
    pub resources_assigned: ResourceVector,
}

/// Everything the server remembers between two invocations.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct State {
    #[serde(default)]
    pub resources_assigned: ResourceVector,
    #[serde(default)]
    pub queues: BTreeMap<String, Queue>,
    #[serde(default)]
    pub vnodes: BTreeMap<String, Vnode>,
    #[serde(default)]
    pub jobs: BTreeMap<JobId, Job>,
}

impl State {
    /// Loads the state, a missing file is an empty server.
    pub fn load(path: &Path) -> crate::Result<State> {
        match std::fs::read(path) {
            Ok(data) => Ok(serde_json::from_slice(&data)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("State file {} does not exist yet", path.display());
                Ok(State::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let data = serde_json::to_vec_pretty(self)?;
        write_atomically(path, &data)
    }

    pub fn get_job(&self, job_id: &str) -> crate::Result<&Job> {
        match self.jobs.get(job_id) {
            Some(job) => Ok(job),
            None => error(format!("Unknown Job Id {job_id}")),
        }
    }

    pub fn get_job_mut(&mut self, job_id: &str) -> crate::Result<&mut Job> {
        match self.jobs.get_mut(job_id) {
            Some(job) => Ok(job),
            None => error(format!("Unknown Job Id {job_id}")),
        }
    }

    pub fn host_map(&self) -> HostMap {
        self.vnodes
            .iter()
            .map(|(name, vnode)| (name.as_str(), vnode.host.as_str()))
            .collect()
    }

    pub fn cray_hosts(&self) -> impl Iterator<Item = &str> {
        self.vnodes
            .values()
            .filter(|vnode| vnode.cray)
            .map(|vnode| vnode.host.as_str())
    }

    /// Adds resources of a starting job to the server and queue counters.
    pub fn assign_resources(&mut self, queue: &str, resources: &ResourceVector) -> crate::Result<()> {
        let consumables = resources.consumables();
        let server = self.resources_assigned.checked_add(&consumables)?;
        let queue = self.queues.entry(queue.to_string()).or_default();
        queue.resources_assigned = queue.resources_assigned.checked_add(&consumables)?;
        self.resources_assigned = server;
        Ok(())
    }

    /// Gives `delta` back to the server and queue counters.
    ///
    /// Both counters are computed first so that a failure leaves both untouched.
    pub fn return_resources(&mut self, queue: &str, delta: &ResourceVector) -> crate::Result<()> {
        let server = self.resources_assigned.checked_sub(delta)?;
        let queue = self.queues.entry(queue.to_string()).or_default();
        queue.resources_assigned = queue.resources_assigned.checked_sub(delta)?;
        self.resources_assigned = server;
        Ok(())
    }
}
