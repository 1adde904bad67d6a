use clap::Parser;

use crate::client::globalsettings::GlobalSettings;
use crate::server::state::{State, Vnode};

#[derive(Parser)]
pub struct VnodeOpts {
    #[clap(subcommand)]
    subcmd: VnodeCommand,
}

#[derive(Parser)]
enum VnodeCommand {
    /// Add a vnode to the table or update its host
    Add(VnodeAddOpts),
    /// Remove a vnode from the table
    Remove(VnodeRemoveOpts),
    /// Display the vnode table
    List,
}

#[derive(Parser)]
struct VnodeAddOpts {
    /// Name of the vnode, e.g. `nodeA[2]`
    name: String,

    /// Mom host managing the vnode, defaults to the natural host of the name
    #[arg(long)]
    host: Option<String>,

    /// The host is a Cray X-series system
    #[arg(long)]
    cray: bool,
}

#[derive(Parser)]
struct VnodeRemoveOpts {
    /// Name of the vnode
    name: String,
}

pub fn command_vnode(gsettings: &GlobalSettings, opts: VnodeOpts) -> anyhow::Result<()> {
    match opts.subcmd {
        VnodeCommand::Add(opts) => {
            let mut session = gsettings.open_session()?;
            let host = opts
                .host
                .unwrap_or_else(|| execvnode::assignment::natural_host(&opts.name).to_string());
            log::debug!("Vnode {} is managed by {host}", opts.name);
            session.state_mut().vnodes.insert(
                opts.name,
                Vnode {
                    host,
                    cray: opts.cray,
                },
            );
            session.commit(None, &[])?;
        }
        VnodeCommand::Remove(opts) => {
            let mut session = gsettings.open_session()?;
            if session.state_mut().vnodes.remove(&opts.name).is_none() {
                anyhow::bail!("Unknown vnode {}", opts.name);
            }
            session.commit(None, &[])?;
        }
        VnodeCommand::List => {
            let state = State::load(gsettings.state_path())?;
            gsettings.printer().print_vnode_list(&state);
        }
    }
    Ok(())
}
