//! `.pyreview.toml` configuration: which interpreter and tools to run and
//! how long each may take.
//!
//! Lookup order: an explicit path (`--config` / `PYREVIEW_CONFIG`), then
//! `.pyreview.toml` in the current directory and its ancestors, then
//! `<config dir>/pyreview/config.toml`. Missing or broken implicit files fall
//! back to defaults with a warning; a broken explicit file is an error.

use crate::errors::ConfigError;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = ".pyreview.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewConfig {
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub formatter: FormatterConfig,
    #[serde(default)]
    pub complexity: ComplexityConfig,
    #[serde(default)]
    pub lint: LintConfig,
}

/// Sandbox settings for executing submitted code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Interpreter used for the runtime check
    #[serde(default = "default_python")]
    pub python: String,
    /// Wall-clock limit
    #[serde(default = "default_runtime_timeout")]
    pub timeout_secs: u64,
    /// CPU-time rlimit (Unix only)
    #[serde(default = "default_runtime_timeout")]
    pub cpu_limit_secs: u64,
    /// Address-space rlimit in MiB (Unix only, 0 disables)
    #[serde(default = "default_memory_limit")]
    pub memory_limit_mb: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            python: default_python(),
            timeout_secs: default_runtime_timeout(),
            cpu_limit_secs: default_runtime_timeout(),
            memory_limit_mb: default_memory_limit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatterConfig {
    #[serde(default = "default_formatter_program")]
    pub program: String,
    /// Arguments; the code is written to stdin and read back from stdout
    #[serde(default = "default_formatter_args")]
    pub args: Vec<String>,
    #[serde(default = "default_formatter_timeout")]
    pub timeout_secs: u64,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            program: default_formatter_program(),
            args: default_formatter_args(),
            timeout_secs: default_formatter_timeout(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// radon when installed, otherwise builtin
    #[default]
    Auto,
    /// In-process tree-sitter scorer
    Builtin,
    /// `radon cc --json`
    Radon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityConfig {
    #[serde(default)]
    pub engine: EngineKind,
    #[serde(default = "default_radon_program")]
    pub program: String,
    #[serde(default = "default_complexity_timeout")]
    pub timeout_secs: u64,
}

impl Default for ComplexityConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            program: default_radon_program(),
            timeout_secs: default_complexity_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LintConfig {
    #[serde(default = "default_lint_program")]
    pub program: String,
    /// Arguments placed before the file path
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_lint_timeout")]
    pub timeout_secs: u64,
    /// Exit status bits that mean the linter itself failed (pylint: fatal
    /// and usage error). Other non-zero statuses only report findings.
    #[serde(default = "default_fatal_exit_mask")]
    pub fatal_exit_mask: i32,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            program: default_lint_program(),
            args: Vec::new(),
            timeout_secs: default_lint_timeout(),
            fatal_exit_mask: default_fatal_exit_mask(),
        }
    }
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_runtime_timeout() -> u64 {
    10
}

fn default_memory_limit() -> u64 {
    512
}

fn default_formatter_program() -> String {
    "black".to_string()
}

fn default_formatter_args() -> Vec<String> {
    vec!["--quiet".to_string(), "-".to_string()]
}

fn default_formatter_timeout() -> u64 {
    30
}

fn default_radon_program() -> String {
    "radon".to_string()
}

fn default_complexity_timeout() -> u64 {
    30
}

fn default_lint_program() -> String {
    "pylint".to_string()
}

fn default_lint_timeout() -> u64 {
    60
}

fn default_fatal_exit_mask() -> i32 {
    1 | 32
}

impl RuntimeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl FormatterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ComplexityConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl LintConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ReviewConfig {
    /// Replace zero limits with defaults, returning a warning per fix.
    pub fn normalize(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();
        let mut fix = |value: &mut u64, default: u64, name: &str| {
            if *value == 0 {
                warnings.push(format!("{name} must be greater than zero, using {default}"));
                *value = default;
            }
        };
        fix(
            &mut self.runtime.timeout_secs,
            default_runtime_timeout(),
            "runtime.timeout_secs",
        );
        fix(
            &mut self.runtime.cpu_limit_secs,
            default_runtime_timeout(),
            "runtime.cpu_limit_secs",
        );
        fix(
            &mut self.formatter.timeout_secs,
            default_formatter_timeout(),
            "formatter.timeout_secs",
        );
        fix(
            &mut self.complexity.timeout_secs,
            default_complexity_timeout(),
            "complexity.timeout_secs",
        );
        fix(
            &mut self.lint.timeout_secs,
            default_lint_timeout(),
            "lint.timeout_secs",
        );
        warnings
    }

    /// Default configuration rendered as TOML, for `pyreview init`.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Parse and normalize configuration from a TOML string.
pub fn parse_config(contents: &str, path: &Path) -> Result<ReviewConfig, ConfigError> {
    let mut config =
        toml::from_str::<ReviewConfig>(contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    for warning in config.normalize() {
        tracing::warn!("{}: {}", path.display(), warning);
    }
    Ok(config)
}

/// Read and parse a specific config file.
pub fn load_config_file(path: &Path) -> Result<ReviewConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&contents, path)
}

fn try_load_config_from_path(path: &Path) -> Option<ReviewConfig> {
    match load_config_file(path) {
        Ok(config) => {
            tracing::debug!("Loaded config from {}", path.display());
            Some(config)
        }
        Err(ConfigError::Read { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            None
        }
        Err(e) => {
            tracing::warn!("{}. Using defaults.", e);
            None
        }
    }
}

fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Candidate locations searched when no explicit path is given.
pub fn candidate_paths(start: PathBuf) -> Vec<PathBuf> {
    const MAX_TRAVERSAL_DEPTH: usize = 10;

    let mut paths: Vec<PathBuf> = directory_ancestors(start, MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .collect();
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("pyreview").join("config.toml"));
    }
    paths
}

/// Resolve the effective configuration.
pub fn load_config(explicit: Option<&Path>) -> Result<ReviewConfig, ConfigError> {
    if let Some(path) = explicit {
        return load_config_file(path);
    }

    let current = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            tracing::warn!("Failed to get current directory: {}. Using default config.", e);
            return Ok(ReviewConfig::default());
        }
    };

    Ok(candidate_paths(current)
        .iter()
        .find_map(|path| try_load_config_from_path(path))
        .unwrap_or_else(|| {
            tracing::debug!("No config file found. Using default config.");
            ReviewConfig::default()
        }))
}
