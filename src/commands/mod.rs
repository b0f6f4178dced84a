//! Batch command implementations.
//!
//! - **check**: syntax and runtime checks, optionally every action
//! - **format**, **complexity**, **lint**: one action on a file or stdin
//! - **init**: write a default `.pyreview.toml`
//!
//! The interactive UI lives in [`crate::tui`].

pub mod init;
pub mod review;

pub use init::init_config;
pub use review::{read_input, run_action, run_check};
