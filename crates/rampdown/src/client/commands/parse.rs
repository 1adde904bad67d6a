use clap::Parser;

use execvnode::{parse_exec_vnode, parse_select_spec};

use crate::client::globalsettings::GlobalSettings;
use crate::server::state::State;

#[derive(Parser)]
pub struct ParseOpts {
    #[clap(subcommand)]
    subcmd: ParseCommand,
}

#[derive(Parser)]
enum ParseCommand {
    /// Parse an exec_vnode string and show the job attributes derived from it
    ExecVnode(ParseExecVnodeOpts),
    /// Parse a select specification
    Select(ParseSelectOpts),
}

#[derive(Parser)]
struct ParseExecVnodeOpts {
    /// Assignment, e.g. `(nA:ncpus=1:mem=1gb+nA2:ncpus=1)+(nB:ncpus=2)`
    exec_vnode: String,

    /// Resolve hosts with the vnode table of the state file
    #[arg(long)]
    use_state: bool,
}

#[derive(Parser)]
struct ParseSelectOpts {
    /// Select specification, e.g. `2:ncpus=2:mem=1gb+ncpus=1`
    select: String,
}

pub fn command_parse(gsettings: &GlobalSettings, opts: ParseOpts) -> anyhow::Result<()> {
    match opts.subcmd {
        ParseCommand::ExecVnode(opts) => {
            let assignment = parse_exec_vnode(&opts.exec_vnode)?;
            let hosts = if opts.use_state {
                State::load(gsettings.state_path())?.host_map()
            } else {
                Default::default()
            };
            gsettings.printer().print_assignment(&assignment, &hosts);
        }
        ParseCommand::Select(opts) => {
            let select = parse_select_spec(&opts.select)?;
            gsettings.printer().print_select(&select);
        }
    }
    Ok(())
}
