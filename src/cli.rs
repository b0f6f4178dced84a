use crate::config::EngineKind;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pyreview")]
#[command(about = "Review Python code: syntax, runtime, formatting, complexity and lint", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Defaults to the interactive UI
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file (skips the .pyreview.toml search)
    #[arg(long, global = true, env = "PYREVIEW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Append log lines to this file (the only log output of the UI)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Whether the selected command takes over the terminal.
    pub fn is_interactive(&self) -> bool {
        matches!(self.command, None | Some(Commands::Tui { .. }))
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the interactive review UI
    Tui {
        /// Python file to load on start
        file: Option<PathBuf>,
    },

    /// Run the syntax and runtime checks
    Check {
        /// Python file, or - for stdin
        input: PathBuf,

        /// Also run format, complexity and lint
        #[arg(long)]
        all: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,
    },

    /// Reformat the code with the configured formatter
    Format {
        /// Python file, or - for stdin
        input: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,
    },

    /// Report cyclomatic complexity per function, method and class
    Complexity {
        /// Python file, or - for stdin
        input: PathBuf,

        /// Override the configured engine
        #[arg(long, value_enum)]
        engine: Option<EngineKind>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,
    },

    /// Run the configured linter
    Lint {
        /// Python file, or - for stdin
        input: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,
    },

    /// Write a default .pyreview.toml to the current directory
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Terminal,
    Json,
}
