//! Compiler adapter.
//!
//! The orchestrator treats compilation as an opaque capability: given an
//! entry set and options, produce artifacts or fail with diagnostics. The
//! call is synchronous and CPU-bound; async callers run it on a blocking
//! thread.

mod edits;
mod linker;
mod oxc;
mod style_imports;

pub use oxc::OxcCompiler;

use crate::artifact::{Artifact, ArtifactKind};
use crate::discovery::SourceEntry;
use crate::error::CompileError;
use crate::options::CompileOptions;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A message tied to the source file that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub path: PathBuf,
    pub message: String,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// Result of a successful compile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOutput {
    /// Artifacts sorted by (name, kind)
    pub artifacts: Vec<Artifact>,
    /// Non-fatal diagnostics (warnings)
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileOutput {
    /// Logical names and the artifact kinds produced for each.
    pub fn known_artifacts(&self) -> BTreeMap<String, BTreeSet<ArtifactKind>> {
        let mut known: BTreeMap<String, BTreeSet<ArtifactKind>> = BTreeMap::new();
        for artifact in &self.artifacts {
            known
                .entry(artifact.name.clone())
                .or_default()
                .insert(artifact.kind);
        }
        known
    }
}

/// Opaque compile capability.
///
/// Implementations must be deterministic: identical entries and source bytes
/// yield byte-identical artifacts. They must not write to the destination;
/// the caller stages and commits the returned artifacts.
pub trait Compiler: Send + Sync + fmt::Debug {
    /// Compiler name used in log output
    fn name(&self) -> &str;

    /// Compile every entry.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Failed`] carrying every error diagnostic if
    /// any entry fails. No partial output is returned.
    fn compile(
        &self,
        entries: &[SourceEntry],
        options: &CompileOptions,
    ) -> Result<CompileOutput, CompileError>;
}
