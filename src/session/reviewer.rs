use super::{Action, CheckState, Session};
use crate::config::ReviewConfig;
use crate::core::{AnalysisResult, SourceText};
use crate::errors::{SessionError, ToolError};
use crate::runtime::{CodeRunner, ExecutionOutcome, RuntimeChecker, SandboxedPython};
use crate::sandbox::ProcessSandbox;
use crate::syntax::check_syntax;
use crate::tools::{ComplexityAnalyzer, Formatter, LintAnalyzer};
use std::io;
use std::sync::Arc;

impl CodeRunner for Box<dyn CodeRunner> {
    fn execute(&self, source: &str) -> Result<ExecutionOutcome, ToolError> {
        (**self).execute(source)
    }
}

/// Runs the checkers and analyzers against a [`Session`].
pub struct Reviewer {
    runtime: RuntimeChecker<Box<dyn CodeRunner>>,
    formatter: Formatter,
    complexity: ComplexityAnalyzer,
    lint: LintAnalyzer,
}

impl Reviewer {
    pub fn new(config: &ReviewConfig) -> io::Result<Self> {
        let sandbox = Arc::new(ProcessSandbox::new()?);
        let runner: Box<dyn CodeRunner> = Box::new(SandboxedPython::new(
            Arc::clone(&sandbox),
            config.runtime.clone(),
        ));
        Ok(Self {
            runtime: RuntimeChecker::new(runner),
            formatter: Formatter::new(Arc::clone(&sandbox), config.formatter.clone()),
            complexity: ComplexityAnalyzer::from_config(Arc::clone(&sandbox), &config.complexity),
            lint: LintAnalyzer::new(sandbox, config.lint.clone()),
        })
    }

    /// Replace the code runner used by the runtime check.
    pub fn with_runner(mut self, runner: impl CodeRunner + 'static) -> Self {
        self.runtime = RuntimeChecker::new(Box::new(runner));
        self
    }

    pub fn complexity_engine(&self) -> &str {
        self.complexity.engine_name()
    }

    /// Accept new input and run the automatic checks.
    pub fn submit(&self, session: &mut Session, source: SourceText) -> CheckState {
        tracing::info!(origin = %source.label(), bytes = source.as_str().len(), "new input");
        session.receive(source);
        self.run_checks(session)
    }

    /// Syntax check, then the runtime check when the syntax is valid.
    pub fn run_checks(&self, session: &mut Session) -> CheckState {
        let Some(text) = session.source().map(|s| s.as_str().to_owned()) else {
            return session.state();
        };

        session.apply_syntax(check_syntax(&text));
        if session.state() == CheckState::InputReceived {
            session.apply_runtime(self.runtime.check(&text));
        }
        tracing::info!(state = %session.state(), "checks finished");
        session.state()
    }

    /// Run one user action on the current input and store its result.
    pub fn perform<'s>(
        &self,
        session: &'s mut Session,
        action: Action,
    ) -> Result<&'s AnalysisResult, SessionError> {
        let text = session
            .source()
            .map(|s| s.as_str().to_owned())
            .ok_or(SessionError::NoInput)?;
        let result = self.analyze(action, &text);
        if let AnalysisResult::ToolError(error) = &result {
            tracing::warn!(action = action.label(), "{}", error);
        }
        session.record_action(action, result)
    }

    /// Run an action without a session.
    pub fn analyze(&self, action: Action, source: &str) -> AnalysisResult {
        tracing::debug!(action = action.label(), "running action");
        match action {
            Action::Format => self.formatter.format(source).into(),
            Action::Complexity => self.complexity.analyze(source).into(),
            Action::Lint => self.lint.lint(source).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ComplexityConfig, EngineKind, FormatterConfig, LintConfig};
    use crate::core::RuntimeFault;
    use crate::runtime::RaisedError;
    use pretty_assertions::assert_eq;

    struct Raises(Option<&'static str>);

    impl CodeRunner for Raises {
        fn execute(&self, _source: &str) -> Result<ExecutionOutcome, ToolError> {
            Ok(ExecutionOutcome {
                raised: self.0.map(|kind| RaisedError {
                    kind: kind.to_string(),
                    message: "boom".to_string(),
                }),
                status: Some(0),
                ..ExecutionOutcome::default()
            })
        }
    }

    fn reviewer(raises: Option<&'static str>) -> Reviewer {
        let config = ReviewConfig {
            formatter: FormatterConfig {
                program: "pyreview-no-such-formatter".into(),
                ..FormatterConfig::default()
            },
            complexity: ComplexityConfig {
                engine: EngineKind::Builtin,
                ..ComplexityConfig::default()
            },
            lint: LintConfig {
                program: "pyreview-no-such-linter".into(),
                ..LintConfig::default()
            },
            ..ReviewConfig::default()
        };
        Reviewer::new(&config).unwrap().with_runner(Raises(raises))
    }

    #[test]
    fn test_submit_clean() {
        let reviewer = reviewer(None);
        let mut session = Session::new();
        let state = reviewer.submit(&mut session, SourceText::manual("x = 1\n"));
        assert_eq!(state, CheckState::Clean);
    }

    #[test]
    fn test_submit_runtime_failure() {
        let reviewer = reviewer(Some("ZeroDivisionError"));
        let mut session = Session::new();
        let state = reviewer.submit(&mut session, SourceText::manual("1/0\n"));
        assert_eq!(state, CheckState::RuntimeFailed);
        assert_eq!(
            session.check_result(),
            Some(&AnalysisResult::from(RuntimeFault::DivisionByZero {
                message: "boom".into()
            }))
        );
    }

    #[test]
    fn test_syntax_failure_skips_runtime() {
        let reviewer = reviewer(Some("NameError"));
        let mut session = Session::new();
        let state = reviewer.submit(&mut session, SourceText::manual("def f(x) return x\n"));
        assert_eq!(state, CheckState::SyntaxFailed);
        assert!(matches!(
            session.check_result(),
            Some(AnalysisResult::SyntaxError(_))
        ));
    }

    #[test]
    fn test_actions_report_missing_tools_without_changing_state() {
        let reviewer = reviewer(None);
        let mut session = Session::new();
        reviewer.submit(&mut session, SourceText::manual("def f():\n    return 1\n"));

        let lint = reviewer.perform(&mut session, Action::Lint).unwrap().clone();
        assert_eq!(
            lint,
            AnalysisResult::ToolError(ToolError::not_installed("pyreview-no-such-linter"))
        );
        let complexity = reviewer.perform(&mut session, Action::Complexity).unwrap();
        assert!(matches!(complexity, AnalysisResult::Complexity(r) if r.max_score() == Some(1)));
        assert_eq!(session.state(), CheckState::Clean);
    }

    #[test]
    fn test_perform_without_input() {
        let reviewer = reviewer(None);
        let mut session = Session::new();
        assert_eq!(
            reviewer.perform(&mut session, Action::Format),
            Err(SessionError::NoInput)
        );
    }
}
