use serde::{Deserialize, Serialize};

use execvnode::release::{JobState, JobSubstate, ReleaseOrigin};
use execvnode::{
    AccountingPhase, AccountingRecord, ExecVnodeAssignment, HostMap, JobProjection,
    ReleaseContext, ReleaseRequest, ReleaseResult, SelectSpec, Set, project_accounting, release,
};

use crate::common::config::Config;
use crate::common::error::error;
use crate::server::state::State;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub queue: String,
    pub state: JobState,
    #[serde(default)]
    pub substate: JobSubstate,
    #[serde(default)]
    pub array_parent: bool,
    #[serde(default)]
    pub tolerate_node_failures: bool,
    pub exec_vnode: ExecVnodeAssignment,
    /// Assignment reported by the final `E` record.
    pub original_exec_vnode: ExecVnodeAssignment,
    /// Select the job is pruned to after node resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<SelectSpec>,
    /// `Resource_List` entries that are not derived from the assignment.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_resources: Vec<(String, String)>,
}

impl Job {
    pub fn projection(&self, hosts: &HostMap) -> JobProjection {
        JobProjection::of(&self.exec_vnode, hosts)
    }

    pub fn has_released_nodes(&self) -> bool {
        self.exec_vnode != self.original_exec_vnode
    }

    fn annotate(&self, records: Vec<AccountingRecord>) -> Vec<AccountingRecord> {
        records
            .into_iter()
            .map(|record| record.with_extra_resources(&self.extra_resources))
            .collect()
    }
}

/// Description of a job handed to the server when it starts running.
pub struct JobStart {
    pub queue: String,
    pub exec_vnode: ExecVnodeAssignment,
    pub select: Option<SelectSpec>,
    pub tolerate_node_failures: bool,
    pub array_parent: bool,
    pub extra_resources: Vec<(String, String)>,
}

/// A committed release together with the accounting records it produced.
pub struct Released {
    pub result: ReleaseResult,
    pub records: Vec<AccountingRecord>,
}

impl State {
    pub fn release_context(&self, job: &Job, config: &Config, origin: ReleaseOrigin) -> ReleaseContext {
        let cray_hosts: Set<String> = self
            .cray_hosts()
            .map(|host| host.to_string())
            .chain(config.platform.cray_hosts.iter().cloned())
            .collect();
        ReleaseContext {
            state: job.state,
            substate: job.substate,
            array_parent: job.array_parent,
            origin,
            hosts: self.host_map(),
            cray_hosts,
            failed_vnodes: Set::default(),
            failed_hosts: Set::default(),
            vnode_order: config.prune.vnode_order,
        }
    }

    /// Moves a new job to the running state and charges its resources.
    ///
    /// A job that tolerates node failures waits in the prerun substate and gets its
    /// start records only once it is pruned.
    pub fn start_job(&mut self, job_id: &str, start: JobStart) -> crate::Result<Vec<AccountingRecord>> {
        if self.jobs.contains_key(job_id) {
            return error(format!("Job {job_id} already exists"));
        }
        if start.tolerate_node_failures && start.select.is_none() {
            return error(format!(
                "Job {job_id} tolerates node failures but has no select to keep"
            ));
        }
        self.assign_resources(&start.queue, start.exec_vnode.total_resources())?;

        let job = Job {
            queue: start.queue,
            state: JobState::Running,
            substate: if start.tolerate_node_failures {
                JobSubstate::Prerun
            } else {
                JobSubstate::Running
            },
            array_parent: start.array_parent,
            tolerate_node_failures: start.tolerate_node_failures,
            original_exec_vnode: start.exec_vnode.clone(),
            exec_vnode: start.exec_vnode,
            select: start.select,
            extra_resources: start.extra_resources,
        };
        let records = if job.tolerate_node_failures {
            Vec::new()
        } else {
            let records = project_accounting(
                &job.exec_vnode,
                &job.exec_vnode,
                &[],
                AccountingPhase::Start,
                &self.host_map(),
            );
            job.annotate(records)
        };
        log::info!(
            "Job {job_id} started on {} vnode(s) in queue {}",
            job.exec_vnode.vnode_names().len(),
            job.queue
        );
        self.jobs.insert(job_id.to_string(), job);
        Ok(records)
    }

    /// Keeps only healthy vnodes that satisfy the job's select and starts it for real.
    pub fn prune_job(
        &mut self,
        job_id: &str,
        failed_vnodes: &[String],
        failed_hosts: &[String],
        config: &Config,
    ) -> crate::Result<Released> {
        let job = self.get_job(job_id)?;
        if !job.tolerate_node_failures || job.substate != JobSubstate::Prerun {
            return error(format!("Job {job_id} is not waiting for node resolution"));
        }
        let Some(select) = job.select.clone() else {
            return error(format!("Job {job_id} has no select to keep"));
        };

        let mut ctx = self.release_context(job, config, ReleaseOrigin::NodeResolution);
        ctx.failed_vnodes = failed_vnodes.iter().cloned().collect();
        ctx.failed_hosts = failed_hosts.iter().cloned().collect();
        let result = release(&job.exec_vnode, &ReleaseRequest::KeepSelect(select), &ctx)?;
        let records = job.annotate(project_accounting(
            &job.exec_vnode,
            &result.assignment,
            &result.hosts,
            AccountingPhase::TolerantStart,
            &ctx.hosts,
        ));
        let queue = job.queue.clone();

        self.return_resources(&queue, &result.resource_delta)?;
        let job = self.get_job_mut(job_id)?;
        job.exec_vnode = result.assignment.clone();
        job.original_exec_vnode = result.assignment.clone();
        job.substate = JobSubstate::Running;
        log_teardown(job_id, &result);
        Ok(Released { result, records })
    }

    /// Client release of vnodes of a running job.
    pub fn release_job(
        &mut self,
        job_id: &str,
        request: &ReleaseRequest,
        config: &Config,
    ) -> crate::Result<Released> {
        let job = self.get_job(job_id)?;
        let ctx = self.release_context(job, config, ReleaseOrigin::Client);
        let result = match release(&job.exec_vnode, request, &ctx) {
            Ok(result) => result,
            Err(e) => {
                log::warn!("Release ({}) of job {job_id} rejected: {e}", request.mode_name());
                return Err(e.into());
            }
        };
        let records = job.annotate(project_accounting(
            &job.exec_vnode,
            &result.assignment,
            &result.hosts,
            AccountingPhase::Release,
            &ctx.hosts,
        ));
        let queue = job.queue.clone();

        self.return_resources(&queue, &result.resource_delta)?;
        let job = self.get_job_mut(job_id)?;
        job.exec_vnode = result.assignment.clone();
        if !result.is_noop() {
            log::info!(
                "Job {job_id} released {} ({})",
                result.released_vnodes.join(", "),
                result.resource_delta
            );
        }
        log_teardown(job_id, &result);
        Ok(Released { result, records })
    }

    /// Finishes a job and gives all of its remaining resources back.
    pub fn end_job(&mut self, job_id: &str) -> crate::Result<Vec<AccountingRecord>> {
        let job = self.get_job(job_id)?;
        if job.state != JobState::Running {
            return error(format!("Job {job_id} is not running (state {})", job.state));
        }
        // No `S` record exists before the job is pruned.
        if job.substate == JobSubstate::Prerun {
            return error(format!("Job {job_id} is waiting for node resolution"));
        }
        let records = job.annotate(project_accounting(
            &job.exec_vnode,
            &job.exec_vnode,
            &[],
            AccountingPhase::End {
                original: &job.original_exec_vnode,
            },
            &self.host_map(),
        ));
        let queue = job.queue.clone();
        let remaining = job.exec_vnode.total_resources().consumables();

        self.return_resources(&queue, &remaining)?;
        let job = self.get_job_mut(job_id)?;
        job.state = JobState::Finished;
        job.substate = JobSubstate::Other;
        log::info!("Job {job_id} finished");
        Ok(records)
    }
}

fn log_teardown(job_id: &str, result: &ReleaseResult) {
    for host in result.fully_released_hosts() {
        log::info!("Sending teardown of job {job_id} to host {host}");
    }
}
