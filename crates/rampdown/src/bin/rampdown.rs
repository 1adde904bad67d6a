use std::io;
use std::io::IsTerminal;

use clap::{CommandFactory, FromArgMatches};
use clap_complete::generate;
use cli_table::ColorChoice;

use rampdown::client::commands::job::command_job;
use rampdown::client::commands::parse::command_parse;
use rampdown::client::commands::release::command_release;
use rampdown::client::commands::server::command_server;
use rampdown::client::commands::vnode::command_vnode;
use rampdown::client::globalsettings::GlobalSettings;
use rampdown::client::output::cli::CliOutput;
use rampdown::client::output::json::JsonOutput;
use rampdown::client::output::outputs::{Output, Outputs};
use rampdown::client::output::quiet::Quiet;
use rampdown::common::cli::{
    ColorPolicy, CommonOpts, GenerateCompletionOpts, RootOptions, SubCommand,
};
use rampdown::common::config::Config;
use rampdown::common::fsutils::absolute_path;
use rampdown::common::setup::setup_logging;

fn make_global_settings(opts: CommonOpts) -> anyhow::Result<GlobalSettings> {
    let config = match &opts.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let state_path = absolute_path(opts.state.unwrap_or_else(|| config.state_file()));

    let color_policy = match opts.colors {
        ColorPolicy::Always => ColorChoice::AlwaysAnsi,
        ColorPolicy::Auto => {
            if io::stdout().is_terminal() {
                ColorChoice::Auto
            } else {
                ColorChoice::Never
            }
        }
        ColorPolicy::Never => ColorChoice::Never,
    };

    // Create Printer
    let printer: Box<dyn Output> = match opts.output_mode {
        Outputs::CLI => {
            // Set colored public for CLI
            match color_policy {
                ColorChoice::Always | ColorChoice::AlwaysAnsi => {
                    colored::control::set_override(true)
                }
                ColorChoice::Never => colored::control::set_override(false),
                _ => {}
            }

            Box::new(CliOutput::new(color_policy))
        }
        Outputs::JSON => Box::<JsonOutput>::default(),
        Outputs::Quiet => Box::<Quiet>::default(),
    };

    Ok(GlobalSettings::new(config, state_path, printer))
}

fn generate_completion(opts: GenerateCompletionOpts) -> anyhow::Result<()> {
    let generator = opts.shell;

    let mut app = RootOptions::command();
    eprintln!("Generating completion file for {generator}...");
    generate(generator, &mut app, "rampdown".to_string(), &mut io::stdout());
    Ok(())
}

fn main() -> rampdown::Result<()> {
    let matches = RootOptions::command().get_matches();
    let top_opts = match RootOptions::from_arg_matches(&matches) {
        Ok(opts) => opts,
        Err(error) => error.exit(),
    };

    setup_logging(top_opts.common.debug);

    let gsettings = match make_global_settings(top_opts.common) {
        Ok(gsettings) => gsettings,
        Err(e) => {
            eprintln!("{e:?}");
            std::process::exit(1);
        }
    };

    let result = match top_opts.subcmd {
        SubCommand::Release(opts) => command_release(&gsettings, opts),
        SubCommand::Job(opts) => command_job(&gsettings, opts),
        SubCommand::Vnode(opts) => command_vnode(&gsettings, opts),
        SubCommand::Server(opts) => command_server(&gsettings, opts),
        SubCommand::Parse(opts) => command_parse(&gsettings, opts),
        SubCommand::GenerateCompletion(opts) => generate_completion(opts),
    };

    if let Err(e) = result {
        gsettings.printer().print_error(e);
        std::process::exit(1);
    }

    Ok(())
}
