//! Best-effort runtime check: execute submitted code and report what it raised.
//!
//! Code never runs in this process. [`SandboxedPython`] starts an isolated
//! interpreter (`python -I`) through the [`ProcessSandbox`], feeds the code on
//! stdin and reads back a single marker line describing the raised exception.
//! The marker carries a random token sent ahead of the code, so lines the code
//! itself prints are never taken for it. [`RuntimeChecker`] turns that into a
//! [`RuntimeOutcome`].

use crate::config::RuntimeConfig;
use crate::core::RuntimeFault;
use crate::errors::ToolError;
use crate::sandbox::{
    resolve_program, Invocation, ProcessSandbox, SandboxLimits, DEFAULT_OUTPUT_BYTES,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Prefix of the stderr line the runner writes for a raised exception. The
/// run token and a space follow it, then the JSON payload.
pub const RAISED_MARKER: &str = "__pyreview_raised__:";

/// Reads the run token from the first stdin line and the code from the rest.
/// Reports go to `sys.__stderr__` so rebinding `sys.stderr` cannot hide them.
const RUNNER_SCRIPT: &str = r#"
import json
import sys

def run():
    token = sys.stdin.readline().strip()
    source = sys.stdin.read()
    channel = sys.__stderr__
    namespace = {"__name__": "__main__", "__builtins__": __builtins__}

    def describe(value):
        try:
            return str(value)
        except BaseException:
            return "<unprintable>"

    def report(kind, message):
        for stream in (sys.stdout, sys.__stdout__):
            try:
                stream.flush()
            except BaseException:
                pass
        payload = json.dumps({"type": kind, "message": message})
        channel.write("\n__pyreview_raised__:" + token + " " + payload + "\n")
        channel.flush()

    try:
        exec(compile(source, "<submitted>", "exec"), namespace)
    except SystemExit as e:
        if e.code not in (None, 0):
            report("SystemExit", describe(e.code))
    except BaseException as e:
        report(type(e).__name__, describe(e))

run()
"#;

/// Exception reported by the runner script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaisedError {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

/// Everything that crosses the sandbox boundary for one execution.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionOutcome {
    pub stdout: String,
    pub stderr: String,
    pub raised: Option<RaisedError>,
    pub wall_time: Duration,
    pub timed_out: bool,
    /// Exit status; `None` for signals and timeouts
    pub status: Option<i32>,
    /// Output went past the sandbox limit and the interpreter was killed
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RuntimeOutcome {
    Clean,
    Fault(RuntimeFault),
}

/// Executes code somewhere and reports what happened.
pub trait CodeRunner {
    fn execute(&self, source: &str) -> Result<ExecutionOutcome, ToolError>;
}

/// Runs code in a separate, resource-limited Python interpreter.
pub struct SandboxedPython {
    sandbox: Arc<ProcessSandbox>,
    config: RuntimeConfig,
}

impl SandboxedPython {
    pub fn new(sandbox: Arc<ProcessSandbox>, config: RuntimeConfig) -> Self {
        Self { sandbox, config }
    }

    fn limits(&self) -> SandboxLimits {
        const MIB: u64 = 1024 * 1024;
        SandboxLimits {
            wall_time: self.config.timeout(),
            cpu_secs: Some(self.config.cpu_limit_secs),
            memory_bytes: (self.config.memory_limit_mb > 0)
                .then(|| self.config.memory_limit_mb * MIB),
            file_size_bytes: Some(16 * MIB),
            output_bytes: DEFAULT_OUTPUT_BYTES,
        }
    }
}

impl CodeRunner for SandboxedPython {
    fn execute(&self, source: &str) -> Result<ExecutionOutcome, ToolError> {
        let program = resolve_program("python", &self.config.python)?;
        let token = run_token();
        let invocation = Invocation::new("python", program, self.config.timeout())
            .args(["-I", "-c", RUNNER_SCRIPT])
            .stdin(format!("{token}\n{source}"))
            .env("PYTHONIOENCODING", "utf-8")
            .env("PYTHONDONTWRITEBYTECODE", "1")
            .limits(self.limits())
            .isolated();

        match self.sandbox.run(&invocation) {
            Ok(report) => Ok(ExecutionOutcome {
                raised: parse_raised(&report.stderr, &token),
                stdout: report.stdout,
                stderr: report.stderr,
                wall_time: report.wall_time,
                timed_out: false,
                status: report.status,
                truncated: report.truncated,
            }),
            Err(ToolError::TimedOut { limit_ms, .. }) => Ok(ExecutionOutcome {
                wall_time: Duration::from_millis(limit_ms),
                timed_out: true,
                ..ExecutionOutcome::default()
            }),
            Err(e) => Err(e),
        }
    }
}

/// Random hex token identifying one run's marker line.
fn run_token() -> String {
    format!("{:032x}", rand::thread_rng().gen::<u128>())
}

/// Find the last marker line in `stderr` that carries `token`.
pub fn parse_raised(stderr: &str, token: &str) -> Option<RaisedError> {
    if token.is_empty() {
        return None;
    }
    let prefix = format!("{RAISED_MARKER}{token} ");
    stderr
        .lines()
        .rev()
        .filter_map(|line| line.strip_prefix(prefix.as_str()))
        .find_map(|json| serde_json::from_str(json).ok())
}

/// Map an execution outcome to the runtime-check result.
pub fn classify(outcome: &ExecutionOutcome) -> RuntimeOutcome {
    if outcome.timed_out {
        return RuntimeOutcome::Fault(RuntimeFault::TimedOut {
            limit_ms: outcome.wall_time.as_millis() as u64,
        });
    }

    match &outcome.raised {
        Some(raised) if raised.kind == "ZeroDivisionError" => {
            RuntimeOutcome::Fault(RuntimeFault::DivisionByZero {
                message: raised.message.clone(),
            })
        }
        Some(raised) => RuntimeOutcome::Fault(RuntimeFault::Generic {
            kind: raised.kind.clone(),
            message: raised.message.clone(),
        }),
        None if outcome.truncated => RuntimeOutcome::Fault(RuntimeFault::Generic {
            kind: "OutputLimitExceeded".to_string(),
            message: "output limit exceeded; the interpreter was stopped".to_string(),
        }),
        None if outcome.status == Some(0) => RuntimeOutcome::Clean,
        None => RuntimeOutcome::Fault(RuntimeFault::Generic {
            kind: "ProcessError".to_string(),
            message: abnormal_exit_message(outcome),
        }),
    }
}

fn abnormal_exit_message(outcome: &ExecutionOutcome) -> String {
    let last_line = outcome
        .stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty());
    match (outcome.status, last_line) {
        (_, Some(line)) => line.to_string(),
        (Some(code), None) => format!("interpreter exited with status {code}"),
        (None, None) => "interpreter was terminated (resource limit exceeded?)".to_string(),
    }
}

pub struct RuntimeChecker<R = SandboxedPython> {
    runner: R,
}

impl<R: CodeRunner> RuntimeChecker<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Execute `source` and classify the result.
    pub fn check(&self, source: &str) -> Result<RuntimeOutcome, ToolError> {
        let outcome = self.runner.execute(source)?;
        let result = classify(&outcome);
        tracing::debug!(
            elapsed_ms = outcome.wall_time.as_millis() as u64,
            clean = matches!(result, RuntimeOutcome::Clean),
            "runtime check finished"
        );
        Ok(result)
    }
}

impl RuntimeChecker<SandboxedPython> {
    pub fn sandboxed(sandbox: Arc<ProcessSandbox>, config: RuntimeConfig) -> Self {
        Self::new(SandboxedPython::new(sandbox, config))
    }
}
