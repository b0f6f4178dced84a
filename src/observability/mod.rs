//! Logging setup and crash reporting.
//!
//! Install both at the top of `main`:
//!
//! ```ignore
//! use pyreview::observability::{init_logging, install_panic_hook, LogTarget};
//!
//! install_panic_hook();
//! init_logging(cli.verbose, LogTarget::select(cli.log_file.as_deref(), false))?;
//! ```

pub mod logging;
pub mod panic_hook;

pub use logging::{init_logging, LogTarget, LOG_ENV};
pub use panic_hook::{install_panic_hook, is_tui_active, set_tui_active};
