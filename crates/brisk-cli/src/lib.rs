//! Brisk CLI - a development loop for TypeScript/JavaScript source trees.
//!
//! Watches a source root, recompiles entries through [`brisk_bundler`],
//! commits the artifacts to a [`brisk_store`] backend, serves them over HTTP
//! and tells connected browsers to reload once a rebuild has been committed.
//!
//! # Architecture
//!
//! - [`cli`] - clap argument definitions
//! - [`config`] - `brisk.config.json`, `BRISK_*` variables and flag layering
//! - [`commands`] - `dev` and `build`
//! - [`dev`] - watcher, controller, build cycle, server and broadcaster
//! - [`error`] - error types with actionable messages
//! - [`logger`] - structured logging with tracing
//! - [`ui`] - operator-facing status lines
//!
//! # Example
//!
//! ```rust
//! use brisk_cli::{error::Result, logger};
//!
//! fn main() -> Result<()> {
//!     logger::init_logger(false, false, false);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod dev;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, ConfigError, Result, ResultExt};
