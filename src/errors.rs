//! Error types for the review pipeline.
//!
//! External-tool failures are captured as [`ToolError`] values instead of
//! being propagated as panics or opaque strings, so the session can render
//! them and callers can still match on what went wrong.
//!
//! # Categories
//!
//! - `NotInstalled`: the tool binary could not be found
//! - `Launch`: the process could not be started
//! - `TimedOut`: the wall-clock limit expired and the process was killed
//! - `Failed`: the tool ran but reported a failure
//! - `InvalidOutput`: the tool output could not be understood
//! - `Syntax`: the input could not be analysed because it does not parse
//! - `Io`: transient file or pipe handling failed

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolError {
    #[error("{tool} is not installed or not on PATH")]
    NotInstalled { tool: String },

    #[error("failed to launch {tool}: {message}")]
    Launch { tool: String, message: String },

    #[error("{tool} did not finish within {limit_ms} ms")]
    TimedOut { tool: String, limit_ms: u64 },

    #[error("{tool} failed{}: {message}", status_suffix(.status))]
    Failed {
        tool: String,
        status: Option<i32>,
        message: String,
    },

    #[error("unexpected output from {tool}: {message}")]
    InvalidOutput { tool: String, message: String },

    #[error("Syntax error detected: {message}")]
    Syntax { message: String },

    #[error("{context}: {message}")]
    Io { context: String, message: String },
}

impl ToolError {
    pub fn not_installed(tool: impl Into<String>) -> Self {
        Self::NotInstalled { tool: tool.into() }
    }

    pub fn launch(tool: impl Into<String>, error: &io::Error) -> Self {
        Self::Launch {
            tool: tool.into(),
            message: error.to_string(),
        }
    }

    pub fn failed(tool: impl Into<String>, status: Option<i32>, message: impl Into<String>) -> Self {
        Self::Failed {
            tool: tool.into(),
            status,
            message: message.into(),
        }
    }

    pub fn invalid_output(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOutput {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn io(context: impl Into<String>, error: &io::Error) -> Self {
        Self::Io {
            context: context.into(),
            message: error.to_string(),
        }
    }

    /// Whether installing or configuring the tool would fix this.
    pub fn is_missing_tool(&self) -> bool {
        matches!(self, Self::NotInstalled { .. })
    }
}

fn status_suffix(status: &Option<i32>) -> String {
    status
        .map(|code| format!(" (exit status {code})"))
        .unwrap_or_default()
}

/// Errors from driving a review session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no source code has been supplied yet")]
    NoInput,
}

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    Parse {
        path: std::path::PathBuf,
        message: String,
    },
}
