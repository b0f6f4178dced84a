//! Adapters for the external analysis engines.
//!
//! Every adapter resolves its program with `which`, runs it through the
//! shared [`ProcessSandbox`](crate::sandbox::ProcessSandbox) and converts
//! failures into [`ToolError`](crate::errors::ToolError) values.

pub mod complexity;
pub mod formatter;
pub mod lint;
pub mod transient;

pub use complexity::{ComplexityAnalyzer, ComplexityEngine};
pub use formatter::Formatter;
pub use lint::LintAnalyzer;
pub use transient::TransientSource;

use std::path::Path;

/// Short name of a configured program for messages ("/usr/bin/black" -> "black").
pub fn tool_name(program: &str) -> String {
    Path::new(program)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.to_string())
}

/// Prefer stderr for failure messages, fall back to stdout.
fn failure_message(stderr: &str, stdout: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        stdout.trim().to_string()
    } else {
        stderr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_name() {
        assert_eq!(tool_name("black"), "black");
        assert_eq!(tool_name("/opt/venv/bin/pylint"), "pylint");
    }

    #[test]
    fn test_failure_message_prefers_stderr() {
        assert_eq!(failure_message(" boom \n", "out"), "boom");
        assert_eq!(failure_message("", "out\n"), "out");
    }
}
