use std::path::PathBuf;

use clap::Parser;
use clap_complete::Shell;

use crate::client::commands::job::JobOpts;
use crate::client::commands::parse::ParseOpts;
use crate::client::commands::release::ReleaseOpts;
use crate::client::commands::server::ServerOpts;
use crate::client::commands::vnode::VnodeOpts;
use crate::client::output::outputs::Outputs;

#[derive(clap::ValueEnum, Clone)]
pub enum ColorPolicy {
    /// Use colors if the stdout is detected to be a terminal.
    Auto,
    /// Always use colors.
    Always,
    /// Never use colors.
    Never,
}

// Common CLI options
#[derive(Parser)]
pub struct CommonOpts {
    /// Path to a TOML configuration file
    #[arg(
        long,
        value_hint = clap::ValueHint::FilePath,
        global = true,
        env = "RAMPDOWN_CONFIG",
        help_heading("GLOBAL OPTIONS"),
        hide_short_help(true)
    )]
    pub config: Option<PathBuf>,

    /// Path to the state file, overrides `state_file` of the configuration
    #[arg(
        long,
        value_hint = clap::ValueHint::FilePath,
        global = true,
        env = "RAMPDOWN_STATE",
        help_heading("GLOBAL OPTIONS"),
        hide_short_help(true)
    )]
    pub state: Option<PathBuf>,

    /// Sets console color policy
    #[arg(
        long,
        default_value_t = ColorPolicy::Auto,
        value_enum,
        global = true,
        help_heading("GLOBAL OPTIONS"),
        hide_short_help(true)
    )]
    pub colors: ColorPolicy,

    /// Sets output formatting
    #[arg(
        long,
        env = "RAMPDOWN_OUTPUT_MODE",
        default_value_t = Outputs::CLI,
        value_enum,
        global = true,
        help_heading("GLOBAL OPTIONS"),
        hide_short_help(true)
    )]
    pub output_mode: Outputs,

    /// Enables more detailed log output
    #[arg(
        long,
        env = "RAMPDOWN_DEBUG",
        global = true,
        help_heading("GLOBAL OPTIONS"),
        hide_short_help(true)
    )]
    pub debug: bool,
}

// Root CLI options
#[derive(Parser)]
#[command(
    author,
    about,
    version,
    disable_help_subcommand(true),
    help_expected(true)
)]
pub struct RootOptions {
    #[clap(flatten)]
    pub common: CommonOpts,

    #[clap(subcommand)]
    pub subcmd: SubCommand,
}

#[derive(Parser)]
pub enum SubCommand {
    /// Release vnodes of a running job
    ///
    /// Either the listed vnodes, all sister vnodes (`-a`) or everything that is not
    /// needed to satisfy a smaller select specification (`-k`).
    Release(ReleaseOpts),
    /// Commands for jobs
    Job(JobOpts),
    /// Commands for the vnode table
    Vnode(VnodeOpts),
    /// Commands for the server counters
    Server(ServerOpts),
    /// Parse an exec_vnode or select string and display what it describes
    Parse(ParseOpts),
    /// Generate shell completion script
    GenerateCompletion(GenerateCompletionOpts),
}

#[derive(Parser)]
pub struct GenerateCompletionOpts {
    /// Shell flavour for which the completion script should be generated
    #[arg(value_enum)]
    pub shell: Shell,
}
