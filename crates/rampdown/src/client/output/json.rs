use std::path::Path;

use execvnode::{AccountingRecord, ExecVnodeAssignment, HostMap, JobProjection, SelectSpec};

use crate::client::output::outputs::Output;
use crate::server::job::{Job, Released};
use crate::server::state::State;

#[derive(Default)]
pub struct JsonOutput;

impl JsonOutput {
    fn print(&self, data: serde_json::Value) {
        println!("{data}");
    }
}

impl Output for JsonOutput {
    fn print_assignment(&self, assignment: &ExecVnodeAssignment, hosts: &HostMap) {
        self.print(serde_json::json!(JobProjection::of(assignment, hosts)));
    }

    fn print_select(&self, select: &SelectSpec) {
        let chunks: Vec<_> = select
            .chunks()
            .iter()
            .map(|chunk| {
                serde_json::json!({
                    "count": chunk.count(),
                    "resources": chunk.resources(),
                })
            })
            .collect();
        self.print(serde_json::json!({
            "select": select,
            "chunks": chunks,
        }));
    }

    fn print_job_list(&self, jobs: Vec<(&str, &Job)>) {
        let jobs: Vec<_> = jobs
            .into_iter()
            .map(|(id, job)| {
                serde_json::json!({
                    "id": id,
                    "queue": job.queue,
                    "state": job.state,
                    "substate": job.substate,
                    "exec_vnode": job.exec_vnode,
                })
            })
            .collect();
        self.print(serde_json::json!(jobs));
    }

    fn print_job_detail(&self, job_id: &str, job: &Job, hosts: &HostMap) {
        self.print(serde_json::json!({
            "id": job_id,
            "job": job,
            "projection": job.projection(hosts),
        }));
    }

    fn print_release(&self, job_id: &str, released: &Released) {
        self.print(serde_json::json!({
            "id": job_id,
            "result": released.result,
            "records": released.records,
        }));
    }

    fn print_records(&self, job_id: &str, records: &[AccountingRecord]) {
        self.print(serde_json::json!({
            "id": job_id,
            "records": records,
        }));
    }

    fn print_vnode_list(&self, state: &State) {
        self.print(serde_json::json!(state.vnodes));
    }

    fn print_server_info(&self, state_path: &Path, state: &State) {
        self.print(serde_json::json!({
            "state_file": state_path,
            "resources_assigned": state.resources_assigned,
            "queues": state.queues,
            "vnodes": state.vnodes.len(),
            "jobs": state.jobs.len(),
        }));
    }

    fn print_error(&self, error: anyhow::Error) {
        self.print(serde_json::json!({
            "error": format!("{error:?}"),
        }));
    }
}
