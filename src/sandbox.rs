//! Process sandbox for every external program pyreview runs.
//!
//! Each [`Invocation`] runs as a child process with piped stdio and a
//! wall-clock limit. On expiry the whole process group is killed. Isolated
//! invocations additionally get a fresh scoped working directory and a cleared
//! environment, and on Unix CPU, memory and file-size rlimits.
//!
//! Only `{stdout, stderr, exit status, wall time}` cross the boundary. Each
//! pipe is read up to [`SandboxLimits::output_bytes`]; a process that writes
//! more is killed and its report marked truncated.

use crate::errors::ToolError;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

/// Environment variables passed through to isolated processes.
const PRESERVED_ENV: &[&str] = &["PATH", "LANG", "LC_ALL", "SYSTEMROOT", "TMPDIR"];

/// Per-pipe capture limit.
pub const DEFAULT_OUTPUT_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxLimits {
    pub wall_time: Duration,
    pub cpu_secs: Option<u64>,
    pub memory_bytes: Option<u64>,
    pub file_size_bytes: Option<u64>,
    /// Bytes kept from each of stdout and stderr
    pub output_bytes: u64,
}

impl SandboxLimits {
    pub fn wall_time(wall_time: Duration) -> Self {
        Self {
            wall_time,
            cpu_secs: None,
            memory_bytes: None,
            file_size_bytes: None,
            output_bytes: DEFAULT_OUTPUT_BYTES,
        }
    }
}

/// One program run.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Name used in error messages
    pub tool: String,
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub stdin: Option<Vec<u8>>,
    pub env: Vec<(String, String)>,
    pub limits: SandboxLimits,
    pub isolated: bool,
}

impl Invocation {
    pub fn new(tool: impl Into<String>, program: impl Into<PathBuf>, wall_time: Duration) -> Self {
        Self {
            tool: tool.into(),
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            env: Vec::new(),
            limits: SandboxLimits::wall_time(wall_time),
            isolated: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn limits(mut self, limits: SandboxLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn isolated(mut self) -> Self {
        self.isolated = true;
        self
    }
}

/// What came back from a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub stdout: String,
    pub stderr: String,
    /// Exit code; `None` when the process was terminated by a signal
    pub status: Option<i32>,
    pub signal: Option<i32>,
    pub wall_time: Duration,
    /// A pipe went past the output limit and the process was killed
    pub truncated: bool,
}

impl ExecutionReport {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Locate `program` on `PATH` (or check an explicit path).
pub fn resolve_program(tool: &str, program: &str) -> Result<PathBuf, ToolError> {
    which::which(program).map_err(|e| {
        tracing::debug!("{} ({}) not found: {}", tool, program, e);
        ToolError::not_installed(tool)
    })
}

/// Runs invocations on a private current-thread runtime.
pub struct ProcessSandbox {
    runtime: tokio::runtime::Runtime,
}

impl ProcessSandbox {
    pub fn new() -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { runtime })
    }

    /// Run to completion or until the wall-clock limit expires.
    pub fn run(&self, invocation: &Invocation) -> Result<ExecutionReport, ToolError> {
        let workdir = if invocation.isolated {
            Some(
                TempDir::with_prefix("pyreview-sandbox-")
                    .map_err(|e| ToolError::io("creating sandbox directory", &e))?,
            )
        } else {
            None
        };

        tracing::debug!(
            tool = %invocation.tool,
            program = %invocation.program.display(),
            isolated = invocation.isolated,
            "spawning"
        );
        let report = self
            .runtime
            .block_on(execute(invocation, workdir.as_ref().map(TempDir::path)));
        if let Ok(report) = &report {
            tracing::debug!(
                tool = %invocation.tool,
                status = ?report.status,
                elapsed_ms = report.wall_time.as_millis() as u64,
                "finished"
            );
        }
        report
    }
}

async fn execute(
    invocation: &Invocation,
    workdir: Option<&Path>,
) -> Result<ExecutionReport, ToolError> {
    let mut cmd = Command::new(&invocation.program);
    cmd.args(&invocation.args)
        .stdin(if invocation.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = workdir {
        cmd.current_dir(dir);
        cmd.env_clear();
        for key in PRESERVED_ENV {
            if let Ok(value) = std::env::var(key) {
                cmd.env(key, value);
            }
        }
        cmd.env("HOME", dir);
    }
    for (key, value) in &invocation.env {
        cmd.env(key, value);
    }

    #[cfg(unix)]
    apply_unix_limits(&mut cmd, &invocation.limits, invocation.isolated);

    let started = Instant::now();
    let mut child = cmd
        .spawn()
        .map_err(|e| ToolError::launch(&invocation.tool, &e))?;
    let pid = child.id();

    let pipe = child.stdin.take();
    let input = invocation.stdin.clone();
    let feed = async move {
        if let (Some(mut pipe), Some(bytes)) = (pipe, input) {
            // The child may exit without reading everything.
            let _ = pipe.write_all(&bytes).await;
            let _ = pipe.shutdown().await;
        }
    };
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let cap = invocation.limits.output_bytes;
    let run = async move {
        let ((), stdout, stderr) = tokio::join!(
            feed,
            capture(stdout, cap, pid),
            capture(stderr, cap, pid)
        );
        let status = child.wait().await?;
        Ok::<_, io::Error>((status, stdout?, stderr?))
    };

    match tokio::time::timeout(invocation.limits.wall_time, run).await {
        Ok(Ok((status, stdout, stderr))) => {
            let truncated = stdout.truncated || stderr.truncated;
            if truncated {
                tracing::warn!(
                    tool = %invocation.tool,
                    limit_bytes = cap,
                    "output limit exceeded"
                );
            }
            Ok(ExecutionReport {
                stdout: String::from_utf8_lossy(&stdout.bytes).into_owned(),
                stderr: String::from_utf8_lossy(&stderr.bytes).into_owned(),
                status: status.code(),
                signal: exit_signal(&status),
                wall_time: started.elapsed(),
                truncated,
            })
        }
        Ok(Err(e)) => Err(ToolError::io(
            format!("waiting for {}", invocation.tool),
            &e,
        )),
        Err(_) => {
            kill_process_group(pid);
            tracing::warn!(
                tool = %invocation.tool,
                limit_ms = invocation.limits.wall_time.as_millis() as u64,
                "timed out"
            );
            Err(ToolError::TimedOut {
                tool: invocation.tool.clone(),
                limit_ms: invocation.limits.wall_time.as_millis() as u64,
            })
        }
    }
}

/// Bytes kept from one pipe.
#[derive(Debug, Default)]
struct Captured {
    bytes: Vec<u8>,
    truncated: bool,
}

/// Read up to `cap` bytes. Past the cap the process group is killed and the
/// rest of the pipe discarded until it closes.
async fn capture<R>(pipe: Option<R>, cap: u64, pid: Option<u32>) -> io::Result<Captured>
where
    R: AsyncRead + Unpin,
{
    let Some(mut pipe) = pipe else {
        return Ok(Captured::default());
    };
    let mut bytes = Vec::new();
    (&mut pipe).take(cap).read_to_end(&mut bytes).await?;

    let mut next = [0u8; 1];
    if pipe.read(&mut next).await? == 0 {
        return Ok(Captured {
            bytes,
            truncated: false,
        });
    }
    kill_process_group(pid);
    tokio::io::copy(&mut pipe, &mut tokio::io::sink()).await?;
    Ok(Captured {
        bytes,
        truncated: true,
    })
}

#[cfg(unix)]
macro_rules! lower_soft_limit {
    ($resource:expr, $value:expr) => {{
        let mut current = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        if libc::getrlimit($resource, &mut current) != 0 {
            return Err(io::Error::last_os_error());
        }
        let wanted = $value as libc::rlim_t;
        let capped = if current.rlim_max == libc::RLIM_INFINITY {
            wanted
        } else {
            wanted.min(current.rlim_max)
        };
        let limit = libc::rlimit {
            rlim_cur: capped,
            rlim_max: current.rlim_max,
        };
        if libc::setrlimit($resource, &limit) != 0 {
            return Err(io::Error::last_os_error());
        }
    }};
}

#[cfg(unix)]
fn apply_unix_limits(cmd: &mut Command, limits: &SandboxLimits, isolated: bool) {
    let cpu = limits.cpu_secs.filter(|_| isolated);
    let memory = limits.memory_bytes.filter(|_| isolated);
    let file_size = limits.file_size_bytes.filter(|_| isolated);

    // SAFETY: the closure runs between fork and exec and only calls
    // async-signal-safe libc functions.
    unsafe {
        cmd.pre_exec(move || {
            if libc::setsid() == -1 {
                return Err(io::Error::last_os_error());
            }
            if let Some(secs) = cpu {
                lower_soft_limit!(libc::RLIMIT_CPU, secs);
            }
            if let Some(bytes) = memory {
                lower_soft_limit!(libc::RLIMIT_AS, bytes);
            }
            if let Some(bytes) = file_size {
                lower_soft_limit!(libc::RLIMIT_FSIZE, bytes);
            }
            Ok(())
        });
    }
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    if let Some(pid) = pid {
        // SAFETY: the child called setsid, so its pid is its process group id.
        unsafe {
            libc::killpg(pid as libc::pid_t, libc::SIGKILL);
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

#[cfg(unix)]
fn exit_signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Invocation {
        Invocation::new("sh", "/bin/sh", Duration::from_secs(5)).args(["-c", script])
    }

    #[test]
    fn test_captures_stdout_stderr_and_status() {
        let sandbox = ProcessSandbox::new().unwrap();
        let report = sandbox.run(&sh("echo out; echo err >&2; exit 3")).unwrap();
        assert_eq!(report.stdout, "out\n");
        assert_eq!(report.stderr, "err\n");
        assert_eq!(report.status, Some(3));
        assert!(!report.success());
        assert!(!report.truncated);
    }

    #[test]
    fn test_output_past_limit_is_truncated_and_stopped() {
        let sandbox = ProcessSandbox::new().unwrap();
        let limits = SandboxLimits {
            output_bytes: 64 * 1024,
            ..SandboxLimits::wall_time(Duration::from_secs(30))
        };
        let invocation = sh("while :; do echo xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx; done").limits(limits);
        let started = Instant::now();
        let report = sandbox.run(&invocation).unwrap();
        assert!(report.truncated);
        assert_eq!(report.stdout.len(), 64 * 1024);
        assert_eq!(report.status, None);
        assert_eq!(report.signal, Some(libc::SIGKILL));
        assert!(started.elapsed() < Duration::from_secs(20));
    }

    #[test]
    fn test_output_at_limit_is_kept_whole() {
        let sandbox = ProcessSandbox::new().unwrap();
        let limits = SandboxLimits {
            output_bytes: 4,
            ..SandboxLimits::wall_time(Duration::from_secs(5))
        };
        let report = sandbox.run(&sh("printf abcd").limits(limits)).unwrap();
        assert_eq!(report.stdout, "abcd");
        assert!(!report.truncated);
        assert!(report.success());
    }

    #[test]
    fn test_feeds_stdin() {
        let sandbox = ProcessSandbox::new().unwrap();
        let report = sandbox.run(&sh("cat").stdin("x = 1\n")).unwrap();
        assert_eq!(report.stdout, "x = 1\n");
        assert!(report.success());
    }

    #[test]
    fn test_wall_time_limit_kills_process() {
        let sandbox = ProcessSandbox::new().unwrap();
        let invocation = sh("sleep 30").limits(SandboxLimits::wall_time(Duration::from_millis(200)));
        let started = Instant::now();
        let result = sandbox.run(&invocation);
        assert!(matches!(result, Err(ToolError::TimedOut { limit_ms: 200, .. })));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_missing_program_is_launch_error() {
        let sandbox = ProcessSandbox::new().unwrap();
        let invocation = Invocation::new(
            "ghost",
            "/nonexistent/bin/ghost-tool",
            Duration::from_secs(1),
        );
        assert!(matches!(
            sandbox.run(&invocation),
            Err(ToolError::Launch { .. })
        ));
    }

    #[test]
    fn test_resolve_program_reports_not_installed() {
        let result = resolve_program("ghost", "pyreview-ghost-tool-that-does-not-exist");
        assert_eq!(result, Err(ToolError::not_installed("ghost")));
    }

    #[test]
    fn test_isolated_runs_in_scoped_directory() {
        let sandbox = ProcessSandbox::new().unwrap();
        let invocation = sh("pwd; echo \"$HOME\"; echo \"${PYREVIEW_EXTRA:-unset}\"")
            .env("PYREVIEW_EXTRA", "set")
            .isolated();
        let report = sandbox.run(&invocation).unwrap();
        let lines: Vec<&str> = report.stdout.lines().collect();
        let workdir = PathBuf::from(lines[0]);
        assert_ne!(workdir, std::env::current_dir().unwrap());
        assert!(!workdir.exists(), "sandbox directory should be removed");
        assert_eq!(lines[2], "set");
    }
}
