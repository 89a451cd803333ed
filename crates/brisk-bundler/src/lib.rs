//! # brisk-bundler
//!
//! The compilation half of the Brisk dev orchestrator.
//!
//! This crate knows how to find compilable entries in a source tree and how to
//! turn them into artifacts. It never decides *when* to build and never writes
//! to disk; the orchestrator in `brisk-cli` owns sequencing and commits.
//!
//! - [`discover_entries`] scans a source root for entry files.
//! - [`Compiler`] is the opaque compile capability; [`OxcCompiler`] is the
//!   default implementation backed by the OXC toolchain. It resolves each
//!   entry's relative and package imports and links them into one ES module
//!   per entry. An import that cannot be resolved fails the compile.
//! - [`StylePlugin`] is the hook through which stylesheet preprocessors plug
//!   into a compiler.
//!
//! ## Example
//!
//! ```no_run
//! use brisk_bundler::{discover_entries, CompileOptions, Compiler, DiscoveryOptions, OxcCompiler};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let entries = discover_entries(Path::new("src"), &DiscoveryOptions::default())?;
//! let compiler = OxcCompiler::new("es2020")?;
//! let entries: Vec<_> = entries.into_iter().collect();
//! let output = compiler.compile(&entries, &CompileOptions::default())?;
//! for artifact in &output.artifacts {
//!     println!("{} ({} bytes)", artifact.file_name(), artifact.bytes.len());
//! }
//! # Ok(()) }
//! ```

pub mod artifact;
pub mod compiler;
pub mod discovery;
pub mod error;
pub mod options;
pub mod plugin;

pub use artifact::{Artifact, ArtifactKind};
pub use compiler::{CompileOutput, Compiler, Diagnostic, OxcCompiler, Severity};
pub use discovery::{
    discover_entries, discover_files, logical_name, DiscoveryOptions, SourceEntry,
    MARKUP_EXTENSIONS, SCRIPT_EXTENSIONS, STYLE_EXTENSIONS,
};
pub use error::{CompileError, DiscoveryError, PluginError};
pub use options::{CompileOptions, StylesheetHandling};
pub use plugin::StylePlugin;
