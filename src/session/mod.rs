//! Review session state.
//!
//! A [`Session`] is plain data: the current source, where the automatic
//! checks ended up ([`CheckState`]) and the latest result of each user
//! action. Every transition is a method that only touches the value, so a
//! session can be serialized, restored and driven by any front end. The
//! [`Reviewer`] runs the components and feeds their results in.
//!
//! ```text
//! AwaitingInput --receive--> InputReceived --syntax error--> SyntaxFailed
//!                                  |
//!                              syntax ok --runtime fault--> RuntimeFailed
//!                                  |
//!                                  +------- clean --------> Clean
//! ```

pub mod reviewer;

pub use reviewer::Reviewer;

use crate::core::{AnalysisResult, SourceText, SyntaxError};
use crate::errors::{SessionError, ToolError};
use crate::runtime::RuntimeOutcome;
use crate::suggestions;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    #[default]
    AwaitingInput,
    InputReceived,
    SyntaxFailed,
    RuntimeFailed,
    Clean,
}

impl CheckState {
    /// Whether the automatic checks ran to a verdict.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::SyntaxFailed | Self::RuntimeFailed | Self::Clean)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::SyntaxFailed | Self::RuntimeFailed)
    }
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::AwaitingInput => "awaiting input",
            Self::InputReceived => "checking",
            Self::SyntaxFailed => "syntax error",
            Self::RuntimeFailed => "runtime error",
            Self::Clean => "no errors",
        };
        f.write_str(label)
    }
}

/// User-triggered analyses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Format,
    Complexity,
    Lint,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::Format, Action::Complexity, Action::Lint];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Format => "Format",
            Self::Complexity => "Complexity",
            Self::Lint => "Lint",
        }
    }
}

/// Latest result of each action; `None` until the action runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionResults {
    pub format: Option<AnalysisResult>,
    pub complexity: Option<AnalysisResult>,
    pub lint: Option<AnalysisResult>,
}

impl ActionResults {
    pub fn get(&self, action: Action) -> Option<&AnalysisResult> {
        match action {
            Action::Format => self.format.as_ref(),
            Action::Complexity => self.complexity.as_ref(),
            Action::Lint => self.lint.as_ref(),
        }
    }

    fn slot(&mut self, action: Action) -> &mut Option<AnalysisResult> {
        match action {
            Action::Format => &mut self.format,
            Action::Complexity => &mut self.complexity,
            Action::Lint => &mut self.lint,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    state: CheckState,
    source: Option<SourceText>,
    /// Failing check result shown in the error callout
    check_result: Option<AnalysisResult>,
    suggestion: Option<String>,
    actions: ActionResults,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CheckState {
        self.state
    }

    pub fn source(&self) -> Option<&SourceText> {
        self.source.as_ref()
    }

    pub fn check_result(&self) -> Option<&AnalysisResult> {
        self.check_result.as_ref()
    }

    pub fn suggestion(&self) -> Option<&str> {
        self.suggestion.as_deref()
    }

    pub fn actions(&self) -> &ActionResults {
        &self.actions
    }

    pub fn action_result(&self, action: Action) -> Option<&AnalysisResult> {
        self.actions.get(action)
    }

    /// New input replaces the old one and discards every earlier result.
    pub fn receive(&mut self, source: SourceText) {
        *self = Self {
            state: CheckState::InputReceived,
            source: Some(source),
            ..Self::default()
        };
    }

    /// Record the syntax check. Ignored unless a check is in progress.
    pub fn apply_syntax(&mut self, result: Result<(), SyntaxError>) {
        if self.state != CheckState::InputReceived {
            return;
        }
        if let Err(error) = result {
            self.suggestion = Some(suggestions::for_syntax_error(&error).to_string());
            self.check_result = Some(error.into());
            self.state = CheckState::SyntaxFailed;
        }
    }

    /// Record the runtime check. Only valid after a passing syntax check.
    pub fn apply_runtime(&mut self, result: Result<RuntimeOutcome, ToolError>) {
        if self.state != CheckState::InputReceived {
            return;
        }
        match result {
            Ok(RuntimeOutcome::Clean) => self.state = CheckState::Clean,
            Ok(RuntimeOutcome::Fault(fault)) => {
                self.suggestion = Some(suggestions::for_runtime_fault(&fault).to_string());
                self.check_result = Some(fault.into());
                self.state = CheckState::RuntimeFailed;
            }
            Err(error) => {
                // The code could not be executed; there is no code-level hint.
                self.check_result = Some(error.into());
                self.state = CheckState::RuntimeFailed;
            }
        }
    }

    /// Store an action result. Actions never change the check state.
    pub fn record_action(
        &mut self,
        action: Action,
        result: AnalysisResult,
    ) -> Result<&AnalysisResult, SessionError> {
        if self.source.is_none() {
            return Err(SessionError::NoInput);
        }
        Ok(self.actions.slot(action).insert(result))
    }
}
