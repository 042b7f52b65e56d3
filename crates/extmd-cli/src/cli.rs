use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "extmd contributors",
    version,
    about = "extmd - Drive GROMACS as an external MD engine and follow the frames it writes.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Prepare, launch and follow one simulation segment.
    Run(RunArgs),
    /// Report the frames present in a TRR trajectory file.
    Inspect(InspectArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the run configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Number of the segment to produce (1 to 9999999).
    #[arg(short = 'n', long, default_value_t = 1, value_name = "INT")]
    pub segment: usize,

    /// Use frame 0 of this TRR file as the initial condition.
    /// Fails if the engine's initial frame already exists.
    #[arg(short, long, value_name = "PATH")]
    pub initial_frame: Option<PathBuf>,

    // --- Engine Overrides ---
    /// Override `engine.name` from the config file.
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Override `engine.base-dir` from the config file.
    #[arg(long, value_name = "PATH")]
    pub base_dir: Option<PathBuf>,

    /// Override `engine.gmx-executable` from the config file.
    #[arg(long = "gmx", value_name = "COMMAND")]
    pub gmx_executable: Option<String>,

    /// Override `engine.mdrun-args` from the config file.
    #[arg(long, value_name = "ARGS", allow_hyphen_values = true)]
    pub mdrun_args: Option<String>,

    // --- Polling Overrides ---
    /// Override the sleep between polls of an incomplete frame, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Stop after this many frames.
    #[arg(long, value_name = "INT")]
    pub max_frames: Option<usize>,

    /// Give up after this many consecutive polls without a new frame.
    #[arg(long, value_name = "INT")]
    pub max_transient_polls: Option<usize>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S polling.max-frames=10
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to the TRR file.
    #[arg(required = true, value_name = "PATH")]
    pub path: PathBuf,

    /// Print the contents of this frame.
    #[arg(short, long, value_name = "INDEX")]
    pub frame: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_accepts_overrides_and_repeated_set_values() {
        let cli = Cli::try_parse_from([
            "extmd", "-vv", "run", "-c", "run.toml", "-n", "3", "--mdrun-args", "-nt 4",
            "-S", "polling.max-frames=2", "-S", "engine.name=tps",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Run(args) = cli.command else {
            panic!("expected the run subcommand");
        };
        assert_eq!(args.segment, 3);
        assert_eq!(args.mdrun_args.as_deref(), Some("-nt 4"));
        assert_eq!(args.set_values.len(), 2);
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["extmd", "-q", "-v", "inspect", "a.trr"]).is_err());
    }
}
