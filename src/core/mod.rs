//! Request-scoped data model shared by the checkers, analyzers and the session.
//!
//! Nothing here outlives a single review cycle: a [`SourceText`] comes in,
//! one [`AnalysisResult`] per component goes out.

pub mod ast;

use crate::errors::ToolError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a piece of source text came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputOrigin {
    /// Loaded from a file chosen by the user
    Upload { name: String },
    /// Typed or pasted into the editor
    Manual,
}

/// User-supplied Python source. Never mutated once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceText {
    text: String,
    origin: InputOrigin,
}

impl SourceText {
    pub fn new(text: impl Into<String>, origin: InputOrigin) -> Self {
        Self {
            text: text.into(),
            origin,
        }
    }

    pub fn manual(text: impl Into<String>) -> Self {
        Self::new(text, InputOrigin::Manual)
    }

    pub fn uploaded(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(text, InputOrigin::Upload { name: name.into() })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn origin(&self) -> &InputOrigin {
        &self.origin
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Display label for headers ("Uploaded: foo.py" / "Manual entry").
    pub fn label(&self) -> String {
        match &self.origin {
            InputOrigin::Upload { name } => format!("Uploaded: {name}"),
            InputOrigin::Manual => "Manual entry".to_string(),
        }
    }
}

/// Coarse classification used to pick a remediation hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    UnexpectedEof,
    InvalidSyntax,
    Indentation,
    UndefinedName,
    DivisionByZero,
    TypeMismatch,
    MissingKey,
    MissingModule,
    Timeout,
    Unknown,
}

/// First syntax error found in a source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxError {
    pub message: String,
    /// 1-based line
    pub line: usize,
    /// 1-based column, counted in characters
    pub column: usize,
    pub category: ErrorCategory,
}

impl SyntaxError {
    pub fn new(
        message: impl Into<String>,
        line: usize,
        column: usize,
        category: ErrorCategory,
    ) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            category,
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Syntax Error: {} at line {}, column {}",
            self.message, self.line, self.column
        )
    }
}

/// Failure observed while executing submitted code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeFault {
    DivisionByZero { message: String },
    Generic { kind: String, message: String },
    TimedOut { limit_ms: u64 },
}

impl RuntimeFault {
    /// Exception type name as Python reports it.
    pub fn kind(&self) -> &str {
        match self {
            Self::DivisionByZero { .. } => "ZeroDivisionError",
            Self::Generic { kind, .. } => kind,
            Self::TimedOut { .. } => "TimeoutError",
        }
    }
}

impl fmt::Display for RuntimeFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DivisionByZero { .. } => {
                write!(f, "ZeroDivisionError: You attempted to divide by zero.")
            }
            Self::Generic { kind, message } if message.is_empty() => {
                write!(f, "Runtime Error: {kind}")
            }
            Self::Generic { kind, message } => write!(f, "Runtime Error: {kind}: {message}"),
            Self::TimedOut { limit_ms } => write!(
                f,
                "Runtime Error: execution did not finish within {limit_ms} ms"
            ),
        }
    }
}

/// Kind of construct a complexity record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructKind {
    Function,
    Method,
    Class,
    Closure,
}

impl ConstructKind {
    /// Single-letter tag in the style of radon's listings.
    pub fn letter(&self) -> char {
        match self {
            Self::Function | Self::Closure => 'F',
            Self::Method => 'M',
            Self::Class => 'C',
        }
    }
}

impl fmt::Display for ConstructKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Function => "function",
            Self::Method => "method",
            Self::Class => "class",
            Self::Closure => "closure",
        };
        f.write_str(name)
    }
}

/// Cyclomatic complexity of one function, method, class or closure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityRecord {
    pub name: String,
    pub kind: ConstructKind,
    pub line: usize,
    pub end_line: usize,
    pub score: u32,
}

impl ComplexityRecord {
    pub fn rank(&self) -> char {
        rank_for_score(self.score)
    }
}

/// Letter grade for a cyclomatic score (A best, F worst).
pub fn rank_for_score(score: u32) -> char {
    match score {
        0..=5 => 'A',
        6..=10 => 'B',
        11..=20 => 'C',
        21..=30 => 'D',
        31..=40 => 'E',
        _ => 'F',
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityReport {
    pub records: Vec<ComplexityRecord>,
}

impl ComplexityReport {
    pub fn new(mut records: Vec<ComplexityRecord>) -> Self {
        records.sort_by(|a, b| a.line.cmp(&b.line).then_with(|| a.name.cmp(&b.name)));
        Self { records }
    }

    pub fn max_score(&self) -> Option<u32> {
        self.records.iter().map(|r| r.score).max()
    }

    pub fn average_score(&self) -> Option<f64> {
        if self.records.is_empty() {
            return None;
        }
        let total: u32 = self.records.iter().map(|r| r.score).sum();
        Some(total as f64 / self.records.len() as f64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintReport {
    pub text: String,
}

impl LintReport {
    pub fn has_findings(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedCode {
    pub text: String,
}

/// Outcome of any single component, ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AnalysisResult {
    SyntaxError(SyntaxError),
    RuntimeError { kind: String, message: String },
    Complexity(ComplexityReport),
    Lint(LintReport),
    Formatted(FormattedCode),
    ToolError(ToolError),
}

impl AnalysisResult {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::SyntaxError(_) | Self::RuntimeError { .. } | Self::ToolError(_)
        )
    }
}

impl From<SyntaxError> for AnalysisResult {
    fn from(error: SyntaxError) -> Self {
        Self::SyntaxError(error)
    }
}

impl From<RuntimeFault> for AnalysisResult {
    fn from(fault: RuntimeFault) -> Self {
        Self::RuntimeError {
            kind: fault.kind().to_string(),
            message: fault.to_string(),
        }
    }
}

impl From<ToolError> for AnalysisResult {
    fn from(error: ToolError) -> Self {
        Self::ToolError(error)
    }
}

impl<T: Into<AnalysisResult>> From<Result<T, ToolError>> for AnalysisResult {
    fn from(result: Result<T, ToolError>) -> Self {
        match result {
            Ok(value) => value.into(),
            Err(error) => Self::ToolError(error),
        }
    }
}

impl From<ComplexityReport> for AnalysisResult {
    fn from(report: ComplexityReport) -> Self {
        Self::Complexity(report)
    }
}

impl From<LintReport> for AnalysisResult {
    fn from(report: LintReport) -> Self {
        Self::Lint(report)
    }
}

impl From<FormattedCode> for AnalysisResult {
    fn from(code: FormattedCode) -> Self {
        Self::Formatted(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_bands() {
        assert_eq!(rank_for_score(1), 'A');
        assert_eq!(rank_for_score(5), 'A');
        assert_eq!(rank_for_score(6), 'B');
        assert_eq!(rank_for_score(20), 'C');
        assert_eq!(rank_for_score(30), 'D');
        assert_eq!(rank_for_score(40), 'E');
        assert_eq!(rank_for_score(41), 'F');
    }

    #[test]
    fn test_report_sorted_by_line() {
        let report = ComplexityReport::new(vec![
            ComplexityRecord {
                name: "b".into(),
                kind: ConstructKind::Function,
                line: 10,
                end_line: 12,
                score: 3,
            },
            ComplexityRecord {
                name: "a".into(),
                kind: ConstructKind::Function,
                line: 1,
                end_line: 2,
                score: 1,
            },
        ]);
        assert_eq!(report.records[0].name, "a");
        assert_eq!(report.max_score(), Some(3));
        assert_eq!(report.average_score(), Some(2.0));
    }

    #[test]
    fn test_runtime_fault_display() {
        let fault = RuntimeFault::DivisionByZero {
            message: "division by zero".into(),
        };
        assert_eq!(
            fault.to_string(),
            "ZeroDivisionError: You attempted to divide by zero."
        );
        let fault = RuntimeFault::Generic {
            kind: "NameError".into(),
            message: "name 'x' is not defined".into(),
        };
        assert_eq!(
            fault.to_string(),
            "Runtime Error: NameError: name 'x' is not defined"
        );
        assert_eq!(fault.kind(), "NameError");
    }

    #[test]
    fn test_syntax_error_display() {
        let error = SyntaxError::new("invalid syntax", 3, 7, ErrorCategory::InvalidSyntax);
        assert_eq!(
            error.to_string(),
            "Syntax Error: invalid syntax at line 3, column 7"
        );
    }

    #[test]
    fn test_source_label() {
        assert_eq!(SourceText::manual("x").label(), "Manual entry");
        assert_eq!(
            SourceText::uploaded("a.py", "x").label(),
            "Uploaded: a.py"
        );
    }
}
