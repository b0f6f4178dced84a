use crate::cli::OutputFormat;
use crate::core::{AnalysisResult, SourceText};
use crate::output::create_writer;
use crate::session::{Action, Reviewer, Session};
use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::process::ExitCode;

/// Read a Python file, or stdin when `input` is `-`.
///
/// Files count as uploads (named after the file), stdin as manual entry.
/// Invalid UTF-8 is replaced rather than rejected; the sanitizer and the
/// syntax check report what is left.
pub fn read_input(input: &Path) -> Result<SourceText> {
    if input == Path::new("-") {
        let mut bytes = Vec::new();
        io::stdin()
            .read_to_end(&mut bytes)
            .context("Failed to read code from stdin")?;
        return Ok(SourceText::manual(String::from_utf8_lossy(&bytes)));
    }

    let bytes =
        fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    Ok(SourceText::uploaded(
        name,
        String::from_utf8_lossy(&bytes).into_owned(),
    ))
}

/// `pyreview check`: the automatic checks, plus every action with `--all`.
pub fn run_check(
    reviewer: &Reviewer,
    input: &Path,
    all: bool,
    format: OutputFormat,
) -> Result<ExitCode> {
    let source = read_input(input)?;
    let mut session = Session::new();
    reviewer.submit(&mut session, source);

    if all {
        for action in Action::ALL {
            reviewer.perform(&mut session, action)?;
        }
    }

    create_writer(format, io::stdout().lock()).write_session(&session)?;
    Ok(exit_code(session_failed(&session)))
}

/// `pyreview format|complexity|lint`: one action, no checks.
pub fn run_action(
    reviewer: &Reviewer,
    action: Action,
    input: &Path,
    format: OutputFormat,
) -> Result<ExitCode> {
    let source = read_input(input)?;
    let result = reviewer.analyze(action, source.as_str());
    create_writer(format, io::stdout().lock()).write_action(action, &result)?;
    Ok(exit_code(result.is_error()))
}

/// A failed check or an action that could not produce its result.
pub fn session_failed(session: &Session) -> bool {
    session.state().is_failure()
        || Action::ALL
            .iter()
            .filter_map(|action| session.action_result(*action))
            .any(AnalysisResult::is_error)
}

fn exit_code(failed: bool) -> ExitCode {
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
