use super::{failure_message, tool_name, TransientSource};
use crate::config::LintConfig;
use crate::core::LintReport;
use crate::errors::ToolError;
use crate::sandbox::{resolve_program, Invocation, ProcessSandbox};
use crate::sanitize::sanitize;
use std::sync::Arc;

/// Runs the configured linter against a transient copy of the sanitized source.
pub struct LintAnalyzer {
    sandbox: Arc<ProcessSandbox>,
    config: LintConfig,
}

impl LintAnalyzer {
    pub fn new(sandbox: Arc<ProcessSandbox>, config: LintConfig) -> Self {
        Self { sandbox, config }
    }

    pub fn lint(&self, source: &str) -> Result<LintReport, ToolError> {
        let tool = tool_name(&self.config.program);
        let program = resolve_program(&tool, &self.config.program)?;

        let staged = TransientSource::create(&sanitize(source))?;
        let invocation = Invocation::new(&tool, program, self.config.timeout())
            .args(&self.config.args)
            .arg(staged.path());
        let report = self.sandbox.run(&invocation)?;

        match report.status {
            None => Err(ToolError::failed(
                tool,
                None,
                format!("terminated by signal {}", report.signal.unwrap_or_default()),
            )),
            Some(code) if code & self.config.fatal_exit_mask != 0 => Err(ToolError::failed(
                tool,
                Some(code),
                failure_message(&report.stderr, &report.stdout),
            )),
            Some(code) => {
                tracing::debug!("{} exited with {}", tool, code);
                Ok(LintReport {
                    text: report.stdout,
                })
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn fake_tool(dir: &TempDir, script: &str) -> String {
        let path = dir.path().join("pylint");
        fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.display().to_string()
    }

    fn analyzer(program: String) -> LintAnalyzer {
        let config = LintConfig {
            program,
            ..LintConfig::default()
        };
        LintAnalyzer::new(Arc::new(ProcessSandbox::new().unwrap()), config)
    }

    #[test]
    fn test_findings_exit_is_a_report() {
        let dir = TempDir::new().unwrap();
        let program = fake_tool(&dir, "echo \"C0114: missing-module-docstring\"; exit 16");
        let report = analyzer(program).lint("x = 1\n").unwrap();
        assert!(report.has_findings());
        assert_eq!(report.text, "C0114: missing-module-docstring\n");
    }

    #[test]
    fn test_empty_report_is_no_findings() {
        let dir = TempDir::new().unwrap();
        let program = fake_tool(&dir, "exit 0");
        let report = analyzer(program).lint("x = 1\n").unwrap();
        assert!(!report.has_findings());
    }

    #[test]
    fn test_fatal_exit_is_failure() {
        let dir = TempDir::new().unwrap();
        let program = fake_tool(&dir, "echo 'usage: pylint' >&2; exit 32");
        let err = analyzer(program).lint("x = 1\n").unwrap_err();
        assert_eq!(err, ToolError::failed("pylint", Some(32), "usage: pylint"));
    }

    #[test]
    fn test_linter_sees_sanitized_file_which_is_removed_after() {
        let dir = TempDir::new().unwrap();
        let program = fake_tool(&dir, "echo \"$1\"; cat \"$1\"");
        let report = analyzer(program).lint("x = 1\u{200b}\n").unwrap();
        let mut lines = report.text.lines();
        let staged = PathBuf::from(lines.next().unwrap());
        assert_eq!(lines.next(), Some("x = 1"));
        assert!(!staged.exists());
    }

    #[test]
    fn test_missing_linter() {
        let err = analyzer("pyreview-no-such-linter".into())
            .lint("x = 1\n")
            .unwrap_err();
        assert_eq!(err, ToolError::not_installed("pyreview-no-such-linter"));
    }
}
