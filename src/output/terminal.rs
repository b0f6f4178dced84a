use super::OutputWriter;
use crate::core::{AnalysisResult, ComplexityReport};
use crate::session::{Action, CheckState, Session};
use colored::*;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use std::io::Write;

pub struct TerminalWriter<W: Write> {
    writer: W,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_verdict(&mut self, session: &Session) -> anyhow::Result<()> {
        match session.state() {
            CheckState::Clean => writeln!(self.writer, "{}", "No errors found.".green().bold())?,
            CheckState::AwaitingInput | CheckState::InputReceived => {
                writeln!(self.writer, "{}", "Checks did not run.".yellow())?
            }
            CheckState::SyntaxFailed | CheckState::RuntimeFailed => {
                if let Some(result) = session.check_result() {
                    writeln!(self.writer, "{}", error_text(result).red().bold())?;
                }
                if let Some(tip) = session.suggestion() {
                    writeln!(self.writer, "{} {}", "Suggestion:".yellow().bold(), tip)?;
                }
            }
        }
        Ok(())
    }

    fn write_result(&mut self, result: &AnalysisResult) -> anyhow::Result<()> {
        match result {
            // Unadorned so the output can be redirected into a .py file.
            AnalysisResult::Formatted(code) => write!(self.writer, "{}", code.text)?,
            AnalysisResult::Complexity(report) => self.write_complexity(report)?,
            AnalysisResult::Lint(report) if !report.has_findings() => {
                writeln!(self.writer, "{}", "No lint findings.".green())?
            }
            AnalysisResult::Lint(report) => writeln!(self.writer, "{}", report.text.trim_end())?,
            other => writeln!(self.writer, "{}", error_text(other).red())?,
        }
        Ok(())
    }

    fn write_complexity(&mut self, report: &ComplexityReport) -> anyhow::Result<()> {
        if report.records.is_empty() {
            writeln!(self.writer, "{}", "No functions or classes to score.".dimmed())?;
            return Ok(());
        }

        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Line", "Kind", "Name", "Score", "Rank"]);
        if colored::control::SHOULD_COLORIZE.should_colorize() {
            table.enforce_styling();
        } else {
            table.force_no_tty();
        }

        for record in &report.records {
            let rank = record.rank();
            table.add_row(vec![
                Cell::new(record.line),
                Cell::new(record.kind),
                Cell::new(&record.name),
                Cell::new(record.score),
                Cell::new(rank).fg(rank_color(rank)),
            ]);
        }
        writeln!(self.writer, "{table}")?;

        if let Some(average) = report.average_score() {
            writeln!(
                self.writer,
                "{}",
                format!(
                    "{} blocks, average complexity {:.1}",
                    report.records.len(),
                    average
                )
                .dimmed()
            )?;
        }
        Ok(())
    }
}

impl<W: Write> OutputWriter for TerminalWriter<W> {
    fn write_session(&mut self, session: &Session) -> anyhow::Result<()> {
        if let Some(source) = session.source() {
            writeln!(self.writer, "{}", source.label().bold())?;
        }
        self.write_verdict(session)?;

        for action in Action::ALL {
            if let Some(result) = session.action_result(action) {
                writeln!(self.writer)?;
                writeln!(self.writer, "{}", format!("── {} ──", action.label()).cyan())?;
                self.write_result(result)?;
            }
        }
        Ok(())
    }

    fn write_action(&mut self, _action: Action, result: &AnalysisResult) -> anyhow::Result<()> {
        self.write_result(result)
    }
}

fn error_text(result: &AnalysisResult) -> String {
    match result {
        AnalysisResult::SyntaxError(error) => error.to_string(),
        AnalysisResult::RuntimeError { message, .. } => message.clone(),
        AnalysisResult::ToolError(error) => format!("Tool error: {error}"),
        _ => String::new(),
    }
}

fn rank_color(rank: char) -> Color {
    match rank {
        'A' => Color::Green,
        'B' => Color::DarkGreen,
        'C' => Color::Yellow,
        'D' => Color::DarkYellow,
        _ => Color::Red,
    }
}
