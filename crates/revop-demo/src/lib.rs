#![forbid(unsafe_code)]

//! Demo receivers for `revop`.
//!
//! - [`file_system`] - in-memory file store with create/rename/delete
//! - [`text_editor`] - text buffer with typed text and memento checkpoints
//! - [`scenario`] - scripted walkthroughs producing a transcript
//!
//! The `revop-demo` binary runs the scenarios:
//!
//! ```text
//! RUST_LOG=revop=debug revop-demo [CONFIG.toml] [--scenario files|editor|all]
//! ```

pub mod cli;
pub mod error;
pub mod file_system;
pub mod scenario;
pub mod text_editor;

pub use cli::{Cli, ScenarioChoice, run, run_from_env};
pub use error::{DemoError, Result};

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,revop=debug";

/// Install a stderr `fmt` subscriber filtered by `RUST_LOG`.
///
/// A second call is a no-op.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
