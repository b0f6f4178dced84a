use super::{failure_message, tool_name};
use crate::config::FormatterConfig;
use crate::core::FormattedCode;
use crate::errors::ToolError;
use crate::sandbox::{resolve_program, Invocation, ProcessSandbox};
use std::sync::Arc;

/// Pipes source through the configured formatter (`black --quiet -`).
pub struct Formatter {
    sandbox: Arc<ProcessSandbox>,
    config: FormatterConfig,
}

impl Formatter {
    pub fn new(sandbox: Arc<ProcessSandbox>, config: FormatterConfig) -> Self {
        Self { sandbox, config }
    }

    pub fn format(&self, source: &str) -> Result<FormattedCode, ToolError> {
        let tool = tool_name(&self.config.program);
        let program = resolve_program(&tool, &self.config.program)?;
        let invocation = Invocation::new(&tool, program, self.config.timeout())
            .args(&self.config.args)
            .stdin(source);

        let report = self.sandbox.run(&invocation)?;
        if !report.success() {
            return Err(ToolError::failed(
                tool,
                report.status,
                failure_message(&report.stderr, &report.stdout),
            ));
        }
        Ok(FormattedCode {
            text: report.stdout,
        })
    }
}
