use clap::Parser;

use execvnode::release::JobState;
use execvnode::{ExecVnodeAssignment, SelectSpec};

use crate::client::globalsettings::GlobalSettings;
use crate::server::job::JobStart;
use crate::server::state::State;

#[derive(Parser)]
pub struct JobOpts {
    #[clap(subcommand)]
    subcmd: JobCommand,
}

#[derive(Parser)]
enum JobCommand {
    /// Start a job on the given exec_vnode and charge its resources
    Start(JobStartOpts),
    /// Prune a job that tolerates node failures to its healthy vnodes
    Prune(JobPruneOpts),
    /// End a running job and give its resources back
    End(JobIdOpts),
    /// Display detailed information of a job
    Info(JobIdOpts),
    /// Display information about jobs
    ///
    /// By default, finished jobs are not displayed.
    List(JobListOpts),
}

#[derive(Parser)]
struct JobStartOpts {
    /// Job id, e.g. `12.server`
    job_id: String,

    /// Assignment of the job
    #[arg(long)]
    exec_vnode: ExecVnodeAssignment,

    /// Queue that is charged for the job
    #[arg(long, default_value = "workq")]
    queue: String,

    /// Select specification the job is pruned to
    #[arg(long)]
    select: Option<SelectSpec>,

    /// Start the job in the prerun substate and wait for `job prune`
    #[arg(long, requires("select"))]
    tolerate_node_failures: bool,

    /// Mark the job as an array parent
    #[arg(long, hide(true))]
    array_parent: bool,

    /// Additional `Resource_List` entry reported in accounting records
    ///
    /// Can be used multiple times, e.g. `--resource walltime=01:00:00`.
    #[arg(long = "resource", value_parser = parse_resource_entry)]
    resources: Vec<(String, String)>,
}

#[derive(Parser)]
struct JobPruneOpts {
    /// Job id
    job_id: String,

    /// Vnodes that failed to join the job
    #[arg(long, value_delimiter(','))]
    failed_vnode: Vec<String>,

    /// Hosts that failed to join the job
    #[arg(long, value_delimiter(','))]
    failed_host: Vec<String>,
}

#[derive(Parser)]
struct JobIdOpts {
    /// Job id
    job_id: String,
}

#[derive(Parser)]
struct JobListOpts {
    /// Display also finished jobs
    #[arg(long)]
    all: bool,
}

fn parse_resource_entry(value: &str) -> anyhow::Result<(String, String)> {
    match value.split_once('=') {
        Some((name, value)) if !name.is_empty() && !value.is_empty() => {
            Ok((name.to_string(), value.to_string()))
        }
        _ => anyhow::bail!("Expected a `name=value` pair, got `{value}`"),
    }
}

pub fn command_job(gsettings: &GlobalSettings, opts: JobOpts) -> anyhow::Result<()> {
    match opts.subcmd {
        JobCommand::Start(opts) => start_job(gsettings, opts),
        JobCommand::Prune(opts) => prune_job(gsettings, opts),
        JobCommand::End(opts) => end_job(gsettings, opts),
        JobCommand::Info(opts) => job_info(gsettings, opts),
        JobCommand::List(opts) => job_list(gsettings, opts),
    }
}

fn start_job(gsettings: &GlobalSettings, opts: JobStartOpts) -> anyhow::Result<()> {
    let mut session = gsettings.open_session()?;
    let records = session.state_mut().start_job(
        &opts.job_id,
        JobStart {
            queue: opts.queue,
            exec_vnode: opts.exec_vnode,
            select: opts.select,
            tolerate_node_failures: opts.tolerate_node_failures,
            array_parent: opts.array_parent,
            extra_resources: opts.resources,
        },
    )?;
    let job = session.state().get_job(&opts.job_id)?.clone();
    let hosts = session.state().host_map();
    session.commit(Some(&opts.job_id), &records)?;
    gsettings
        .printer()
        .print_job_detail(&opts.job_id, &job, &hosts);
    Ok(())
}

fn prune_job(gsettings: &GlobalSettings, opts: JobPruneOpts) -> anyhow::Result<()> {
    let mut session = gsettings.open_session()?;
    let released = session.state_mut().prune_job(
        &opts.job_id,
        &opts.failed_vnode,
        &opts.failed_host,
        gsettings.config(),
    )?;
    session.commit(Some(&opts.job_id), &released.records)?;
    gsettings.printer().print_release(&opts.job_id, &released);
    Ok(())
}

fn end_job(gsettings: &GlobalSettings, opts: JobIdOpts) -> anyhow::Result<()> {
    let mut session = gsettings.open_session()?;
    let records = session.state_mut().end_job(&opts.job_id)?;
    session.commit(Some(&opts.job_id), &records)?;
    gsettings.printer().print_records(&opts.job_id, &records);
    Ok(())
}

fn job_info(gsettings: &GlobalSettings, opts: JobIdOpts) -> anyhow::Result<()> {
    let state = State::load(gsettings.state_path())?;
    let job = state.get_job(&opts.job_id)?;
    gsettings
        .printer()
        .print_job_detail(&opts.job_id, job, &state.host_map());
    Ok(())
}

fn job_list(gsettings: &GlobalSettings, opts: JobListOpts) -> anyhow::Result<()> {
    let state = State::load(gsettings.state_path())?;
    let jobs = state
        .jobs
        .iter()
        .filter(|(_, job)| opts.all || job.state != JobState::Finished)
        .map(|(id, job)| (id.as_str(), job))
        .collect();
    gsettings.printer().print_job_list(jobs);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resource_entry() {
        assert_eq!(
            parse_resource_entry("walltime=01:00:00").unwrap(),
            ("walltime".to_string(), "01:00:00".to_string())
        );
        assert!(parse_resource_entry("walltime").is_err());
        assert!(parse_resource_entry("=1").is_err());
    }

    #[test]
    fn test_tolerant_start_needs_select() {
        let opts = JobOpts::try_parse_from([
            "job",
            "start",
            "1.server",
            "--exec-vnode",
            "(nA:ncpus=1)",
            "--tolerate-node-failures",
        ]);
        assert!(opts.is_err());
    }

    #[test]
    fn test_prune_failed_lists() {
        let opts = JobOpts::try_parse_from([
            "job",
            "prune",
            "1.server",
            "--failed-host",
            "nB,nC",
            "--failed-vnode",
            "nD[0]",
        ])
        .unwrap();
        let JobCommand::Prune(opts) = opts.subcmd else {
            panic!("expected prune");
        };
        assert_eq!(opts.failed_host, vec!["nB", "nC"]);
        assert_eq!(opts.failed_vnode, vec!["nD[0]"]);
    }
}
