//! Cyclomatic complexity of the functions, methods and classes in a snippet.
//!
//! The analyzer sanitizes the input, refuses code that does not parse,
//! stages it in a [`TransientSource`] and hands the path to a
//! [`ComplexityEngine`]. Two engines exist: radon as an external process and
//! a builtin tree-sitter scorer that follows radon's counting rules.

pub mod builtin;
pub mod radon;

pub use builtin::BuiltinEngine;
pub use radon::RadonEngine;

use super::TransientSource;
use crate::config::{ComplexityConfig, EngineKind};
use crate::core::{ComplexityRecord, ComplexityReport};
use crate::errors::ToolError;
use crate::sandbox::ProcessSandbox;
use crate::sanitize::sanitize;
use crate::syntax::check_syntax;
use std::path::Path;
use std::sync::Arc;

/// Scores every construct in a Python file.
pub trait ComplexityEngine {
    fn name(&self) -> &str;
    fn analyze(&self, path: &Path) -> Result<Vec<ComplexityRecord>, ToolError>;
}

pub struct ComplexityAnalyzer {
    engine: Box<dyn ComplexityEngine>,
}

impl ComplexityAnalyzer {
    pub fn new(engine: Box<dyn ComplexityEngine>) -> Self {
        Self { engine }
    }

    /// Pick the engine named in the config; `auto` prefers radon when installed.
    pub fn from_config(sandbox: Arc<ProcessSandbox>, config: &ComplexityConfig) -> Self {
        let engine: Box<dyn ComplexityEngine> = match config.engine {
            EngineKind::Builtin => Box::new(BuiltinEngine),
            EngineKind::Radon => Box::new(RadonEngine::new(sandbox, config.clone())),
            EngineKind::Auto if which::which(&config.program).is_ok() => {
                Box::new(RadonEngine::new(sandbox, config.clone()))
            }
            EngineKind::Auto => {
                tracing::debug!("{} not found, using builtin complexity engine", config.program);
                Box::new(BuiltinEngine)
            }
        };
        Self::new(engine)
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub fn analyze(&self, source: &str) -> Result<ComplexityReport, ToolError> {
        let sanitized = sanitize(source);
        check_syntax(&sanitized).map_err(|e| ToolError::Syntax {
            message: format!("{} at line {}, column {}", e.message, e.line, e.column),
        })?;

        let staged = TransientSource::create(&sanitized)?;
        let records = self.engine.analyze(staged.path())?;
        tracing::debug!(
            engine = self.engine.name(),
            records = records.len(),
            "complexity analysis finished"
        );
        Ok(ComplexityReport::new(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ConstructKind;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recording {
        seen: Rc<RefCell<Vec<(PathBuf, String)>>>,
    }

    impl ComplexityEngine for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        fn analyze(&self, path: &Path) -> Result<Vec<ComplexityRecord>, ToolError> {
            let contents = std::fs::read_to_string(path).unwrap();
            self.seen.borrow_mut().push((path.to_path_buf(), contents));
            Ok(vec![ComplexityRecord {
                name: "f".into(),
                kind: ConstructKind::Function,
                line: 1,
                end_line: 1,
                score: 1,
            }])
        }
    }

    #[test]
    fn test_engine_sees_sanitized_file_removed_afterwards() {
        let recording = Recording::default();
        let seen = Rc::clone(&recording.seen);
        let analyzer = ComplexityAnalyzer::new(Box::new(recording));
        let report = analyzer.analyze("def f():\r\n    return 1\n").unwrap();
        assert_eq!(report.records.len(), 1);

        let seen = seen.borrow();
        let (path, contents) = &seen[0];
        assert_eq!(contents, "def f():\n    return 1\n");
        assert!(!path.exists());
    }

    #[test]
    fn test_unparseable_input_is_syntax_error() {
        let analyzer = ComplexityAnalyzer::new(Box::new(BuiltinEngine));
        let err = analyzer.analyze("def f(x) return x").unwrap_err();
        match err {
            ToolError::Syntax { message } => assert!(message.contains("line 1")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_builtin_config() {
        let sandbox = Arc::new(ProcessSandbox::new().unwrap());
        let config = ComplexityConfig {
            engine: EngineKind::Builtin,
            ..ComplexityConfig::default()
        };
        let analyzer = ComplexityAnalyzer::from_config(sandbox, &config);
        assert_eq!(analyzer.engine_name(), "builtin");
    }

    #[test]
    fn test_auto_falls_back_to_builtin() {
        let sandbox = Arc::new(ProcessSandbox::new().unwrap());
        let config = ComplexityConfig {
            engine: EngineKind::Auto,
            program: "pyreview-no-such-radon".into(),
            ..ComplexityConfig::default()
        };
        let analyzer = ComplexityAnalyzer::from_config(sandbox, &config);
        assert_eq!(analyzer.engine_name(), "builtin");
    }
}
