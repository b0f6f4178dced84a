use anyhow::{Context, Result};
use clap::Parser;
use pyreview::cli::{Cli, Commands};
use pyreview::config::{load_config, ReviewConfig};
use pyreview::observability::{init_logging, install_panic_hook, LogTarget};
use pyreview::session::{Action, Reviewer};
use pyreview::tui::ReviewExplorer;
use std::io::IsTerminal;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    install_panic_hook();
    let cli = Cli::parse();

    init_logging(
        cli.verbose,
        LogTarget::select(cli.log_file.as_deref(), cli.is_interactive()),
    )?;
    colored::control::set_override(color_enabled());

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        None => run_tui(&config, None),
        Some(Commands::Tui { file }) => run_tui(&config, file),
        Some(Commands::Check { input, all, format }) => {
            pyreview::commands::run_check(&build_reviewer(&config)?, &input, all, format)
        }
        Some(Commands::Format { input, format }) => pyreview::commands::run_action(
            &build_reviewer(&config)?,
            Action::Format,
            &input,
            format,
        ),
        Some(Commands::Complexity {
            input,
            engine,
            format,
        }) => {
            if let Some(engine) = engine {
                config.complexity.engine = engine;
            }
            pyreview::commands::run_action(
                &build_reviewer(&config)?,
                Action::Complexity,
                &input,
                format,
            )
        }
        Some(Commands::Lint { input, format }) => pyreview::commands::run_action(
            &build_reviewer(&config)?,
            Action::Lint,
            &input,
            format,
        ),
        Some(Commands::Init { force }) => {
            pyreview::commands::init_config(force)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn build_reviewer(config: &ReviewConfig) -> Result<Reviewer> {
    Reviewer::new(config).context("Failed to start the process sandbox")
}

fn run_tui(config: &ReviewConfig, file: Option<std::path::PathBuf>) -> Result<ExitCode> {
    let reviewer = build_reviewer(config)?;
    let mut explorer = ReviewExplorer::new(reviewer)?;
    if let Some(path) = file {
        explorer.open(path);
    }
    explorer.run()?;
    Ok(ExitCode::SUCCESS)
}

fn color_enabled() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var("TERM").is_ok_and(|term| term == "dumb") {
        return false;
    }
    std::io::stdout().is_terminal()
}
