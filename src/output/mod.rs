//! Batch-mode report writers.
//!
//! Terminal output is meant for people (colours follow the `colored`
//! override set in `main`); JSON output is the serde form of the session or
//! action result, for scripts.

pub mod json;
pub mod terminal;

pub use json::JsonWriter;
pub use terminal::TerminalWriter;

use crate::cli::OutputFormat;
use crate::core::AnalysisResult;
use crate::session::{Action, Session};
use std::io::Write;

pub trait OutputWriter {
    /// Check verdict, suggestion and any action results of a session.
    fn write_session(&mut self, session: &Session) -> anyhow::Result<()>;

    /// Result of a single action run outside a session.
    fn write_action(&mut self, action: Action, result: &AnalysisResult) -> anyhow::Result<()>;
}

pub fn create_writer<'a, W: Write + 'a>(
    format: OutputFormat,
    writer: W,
) -> Box<dyn OutputWriter + 'a> {
    match format {
        OutputFormat::Terminal => Box::new(TerminalWriter::new(writer)),
        OutputFormat::Json => Box::new(JsonWriter::new(writer)),
    }
}
