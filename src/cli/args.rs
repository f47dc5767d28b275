//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

/// Bootstrap launcher: find Python, prepare a virtual environment, install requirements, run the script
#[derive(Parser, Debug)]
#[command(name = "pylaunch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Base directory (default: directory of the pylaunch executable)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub base_dir: Option<PathBuf>,

    /// Without a subcommand, `run` with configured defaults
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Prepare the environment and run the target script
    Run(RunArgs),

    /// Show resolved layout and interpreter without changing anything
    Info,

    /// Show or clear the launch history
    History {
        /// Remove all records
        #[arg(long)]
        clear: bool,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Options for a launch
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Target script, relative to the base directory
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub target: Option<PathBuf>,

    /// Requirements file, relative to the base directory
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub manifest: Option<PathBuf>,

    /// Virtual environment directory, relative to the base directory
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub env_dir: Option<PathBuf>,

    /// Interpreter command to try (repeatable; replaces the configured list)
    #[arg(long = "python", value_name = "CMD")]
    pub python: Vec<String>,

    /// Do not wait for Enter before exiting
    #[arg(long)]
    pub no_pause: bool,

    /// Keep going after environment, install or launch failures
    #[arg(long)]
    pub lenient: bool,

    /// Arguments passed to the target script
    #[arg(last = true)]
    pub args: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config instead of one in the base directory
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}
