use std::path::Path;

use execvnode::{AccountingRecord, ExecVnodeAssignment, HostMap, SelectSpec};

use crate::server::job::{Job, Released};
use crate::server::state::State;

#[derive(clap::ValueEnum, Clone)]
pub enum Outputs {
    CLI,
    JSON,
    Quiet,
}

pub trait Output {
    // Parsing
    fn print_assignment(&self, assignment: &ExecVnodeAssignment, hosts: &HostMap);
    fn print_select(&self, select: &SelectSpec);

    // Jobs
    fn print_job_list(&self, jobs: Vec<(&str, &Job)>);
    fn print_job_detail(&self, job_id: &str, job: &Job, hosts: &HostMap);
    fn print_release(&self, job_id: &str, released: &Released);
    fn print_records(&self, job_id: &str, records: &[AccountingRecord]);

    // Server
    fn print_vnode_list(&self, state: &State);
    fn print_server_info(&self, state_path: &Path, state: &State);

    fn print_error(&self, error: anyhow::Error);
}
