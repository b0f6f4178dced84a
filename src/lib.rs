// Export modules for library usage
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod errors;
pub mod observability;
pub mod output;
pub mod runtime;
pub mod sandbox;
pub mod sanitize;
pub mod session;
pub mod suggestions;
pub mod syntax;
pub mod tools;
pub mod tui;

// Re-export commonly used types
pub use crate::config::{load_config, ReviewConfig};
pub use crate::core::{
    AnalysisResult, ComplexityRecord, ComplexityReport, ErrorCategory, InputOrigin, RuntimeFault,
    SourceText, SyntaxError,
};
pub use crate::errors::{ConfigError, SessionError, ToolError};
pub use crate::runtime::{CodeRunner, RuntimeChecker, RuntimeOutcome};
pub use crate::sanitize::sanitize;
pub use crate::session::{Action, CheckState, Reviewer, Session};
pub use crate::suggestions::suggestion;
pub use crate::syntax::check_syntax;
