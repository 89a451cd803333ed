//! Command implementations for the Brisk CLI.
//!
//! - [`build`] - one production build cycle written to disk
//! - [`dev`] - development server with watch and live reload
//!
//! Each command provides an `execute` function that takes the parsed
//! arguments and returns a Result.

pub mod build;
pub mod dev;

pub use build::execute as build_execute;
pub use dev::execute as dev_execute;
