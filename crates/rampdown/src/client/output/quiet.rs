use std::path::Path;

use execvnode::{AccountingRecord, ExecVnodeAssignment, HostMap, SelectSpec};

use crate::client::output::outputs::Output;
use crate::server::job::{Job, Released};
use crate::server::state::State;

/// Prints only the essential value of every command, suitable for scripts.
#[derive(Default)]
pub struct Quiet;

impl Output for Quiet {
    fn print_assignment(&self, assignment: &ExecVnodeAssignment, _hosts: &HostMap) {
        println!("{assignment}");
    }

    fn print_select(&self, select: &SelectSpec) {
        println!("{select}");
    }

    fn print_job_list(&self, jobs: Vec<(&str, &Job)>) {
        for (id, job) in jobs {
            println!("{id} {}", job.state);
        }
    }

    fn print_job_detail(&self, _job_id: &str, job: &Job, _hosts: &HostMap) {
        println!("{}", job.exec_vnode);
    }

    fn print_release(&self, _job_id: &str, released: &Released) {
        for vnode in &released.result.released_vnodes {
            println!("{vnode}");
        }
    }

    fn print_records(&self, _job_id: &str, _records: &[AccountingRecord]) {}

    fn print_vnode_list(&self, state: &State) {
        for name in state.vnodes.keys() {
            println!("{name}");
        }
    }

    fn print_server_info(&self, _state_path: &Path, state: &State) {
        println!("{}", state.resources_assigned);
    }

    fn print_error(&self, error: anyhow::Error) {
        eprintln!("{error:?}");
    }
}
