use clap::Parser;

use crate::client::globalsettings::GlobalSettings;
use crate::server::state::State;

#[derive(Parser)]
pub struct ServerOpts {
    #[clap(subcommand)]
    subcmd: ServerCommand,
}

#[derive(Parser)]
enum ServerCommand {
    /// Show the resources assigned on the server and in its queues
    Info,
}

pub fn command_server(gsettings: &GlobalSettings, opts: ServerOpts) -> anyhow::Result<()> {
    match opts.subcmd {
        ServerCommand::Info => {
            let state = State::load(gsettings.state_path())?;
            gsettings
                .printer()
                .print_server_info(gsettings.state_path(), &state);
        }
    }
    Ok(())
}
