//! Error types for discovery and compilation.

use crate::compiler::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Entry discovery failures.
///
/// Fatal when raised at startup, recoverable during a watch cycle (the
/// orchestrator keeps the previous entry set).
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The configured source root does not exist
    #[error("Source root not found: {}\n\nHint: Create the directory or pass --source-root <dir>", .0.display())]
    MissingRoot(PathBuf),

    /// The source root exists but is a file
    #[error("Source root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Walking the source tree failed
    #[error("Failed to scan {}: {message}", .path.display())]
    Io {
        /// Directory or file that could not be read
        path: PathBuf,
        /// Underlying error message
        message: String,
    },
}

/// Compilation failures.
///
/// A failed compile never reaches the artifact store; the previous good
/// artifacts stay live.
#[derive(Debug, Error)]
pub enum CompileError {
    /// One or more entries failed to compile
    #[error("Compilation failed with {} error(s):\n{}", .diagnostics.len(), format_diagnostics(.diagnostics))]
    Failed {
        /// Every error-level diagnostic collected during the build
        diagnostics: Vec<Diagnostic>,
    },

    /// The compiler did not finish within the configured timeout
    #[error("Compilation timed out after {timeout_ms}ms")]
    TimedOut {
        /// Configured timeout in milliseconds
        timeout_ms: u64,
    },

    /// The compiler could not be constructed from its options
    #[error("Failed to initialize compiler: {0}")]
    Init(String),
}

impl CompileError {
    /// Diagnostics carried by this error, empty for timeouts and init failures.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CompileError::Failed { diagnostics } => diagnostics,
            _ => &[],
        }
    }
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| format!("  {}", d))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Errors raised by a [`StylePlugin`](crate::StylePlugin).
#[derive(Debug, Error)]
#[error("[{plugin}] {message}")]
pub struct PluginError {
    /// Name of the plugin that failed
    pub plugin: String,
    /// What went wrong
    pub message: String,
}

impl PluginError {
    pub fn new(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Severity;

    #[test]
    fn test_missing_root_message() {
        let err = DiscoveryError::MissingRoot(PathBuf::from("./src"));
        let msg = err.to_string();
        assert!(msg.contains("Source root not found"));
        assert!(msg.contains("./src"));
        assert!(msg.contains("Hint:"));
    }

    #[test]
    fn test_compile_error_lists_diagnostics() {
        let err = CompileError::Failed {
            diagnostics: vec![
                Diagnostic {
                    path: PathBuf::from("src/index.ts"),
                    message: "Unexpected token".to_string(),
                    severity: Severity::Error,
                },
                Diagnostic {
                    path: PathBuf::from("src/other.ts"),
                    message: "Missing semicolon".to_string(),
                    severity: Severity::Error,
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("2 error(s)"));
        assert!(msg.contains("src/index.ts: Unexpected token"));
        assert!(msg.contains("src/other.ts: Missing semicolon"));
        assert_eq!(err.diagnostics().len(), 2);
    }

    #[test]
    fn test_timeout_has_no_diagnostics() {
        let err = CompileError::TimedOut { timeout_ms: 500 };
        assert!(err.to_string().contains("500ms"));
        assert!(err.diagnostics().is_empty());
    }

    #[test]
    fn test_plugin_error_display() {
        let err = PluginError::new("brisk-css", "unexpected '}'");
        assert_eq!(err.to_string(), "[brisk-css] unexpected '}'");
    }
}
