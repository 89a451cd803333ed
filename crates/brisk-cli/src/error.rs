//! Error handling for the Brisk CLI.
//!
//! `CliError` is the top-level error returned by commands. Domain errors from
//! the library crates convert into it through `#[from]`, and `ResultExt`
//! attaches paths, hints and context on the way up.
//!
//! Only infrastructural failures surface here: a missing source root at
//! startup, a port that cannot be bound, a compiler that cannot be built, or
//! an invalid configuration. Errors raised inside a watch cycle are logged by
//! the dev loop and never propagate.
//!
//! # Example
//!
//! ```rust,no_run
//! use brisk_cli::error::{Result, ResultExt};
//! use std::path::Path;
//!
//! fn read_config(path: &Path) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .with_path(path)
//!         .with_hint("Pass --config <path> to point at a different file")
//! }
//! ```

mod report;

pub use report::cli_error_to_miette;

use crate::dev::CycleFailure;
use brisk_bundler::{CompileError, DiscoveryError};
use brisk_store::StoreError;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration-related errors (invalid file, bad values)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Source root missing or unreadable
    #[error("{0}")]
    Discovery(#[from] DiscoveryError),

    /// Compiler construction or a production build failed
    #[error("{0}")]
    Compile(#[from] CompileError),

    /// Artifact store failure outside a watch cycle
    #[error("Artifact store error: {0}")]
    Store(#[from] StoreError),

    /// The serving port could not be bound
    #[error("Failed to bind {addr}: {message}\n\nHint: Another process may be using the port; pass --port <port>")]
    ServerBind {
        /// Address that could not be bound
        addr: SocketAddr,
        /// Underlying error message
        message: String,
    },

    /// Invalid command-line arguments or options
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// File or directory not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Development server errors after startup
    #[error("Server error: {0}")]
    Server(String),

    /// File watching errors
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// Generic errors with custom messages
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file passed with --config doesn't exist
    #[error("Config file not found: {}\n\nHint: Create a brisk.config.json file or fix the --config path", .0.display())]
    NotFound(PathBuf),

    /// Merged configuration could not be deserialized
    #[error("Invalid configuration: {0}\n\nHint: Check brisk.config.json syntax, BRISK_* variables and field types")]
    Invalid(String),

    /// Invalid value for a configuration option
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The invalid value
        value: String,
        /// Helpful hint for correct values
        hint: String,
    },

    /// Mutually exclusive options were specified
    #[error("Conflicting options: {0}")]
    ConflictingOptions(String),
}

impl ConfigError {
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl std::fmt::Display,
        hint: impl Into<String>,
    ) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            value: value.to_string(),
            hint: hint.into(),
        }
    }
}

impl From<CycleFailure> for CliError {
    fn from(failure: CycleFailure) -> Self {
        match failure {
            CycleFailure::Discovery(e) => CliError::Discovery(e),
            CycleFailure::Compile(e) => CliError::Compile(e),
            CycleFailure::Store(e) => CliError::Store(e),
        }
    }
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Extension trait for adding context to `Result` types.
pub trait ResultExt<T> {
    /// Turn a not-found I/O error into [`CliError::FileNotFound`] for `path`.
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T>;

    /// Append a hint to the error message.
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T>;

    /// Prefix the error message.
    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            match err {
                CliError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                    CliError::FileNotFound(path.as_ref().to_path_buf())
                }
                other => other,
            }
        })
    }

    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}\n\nHint: {}", err, hint))
        })
    }

    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}: {}", msg, err))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_not_found() {
        let err = ConfigError::NotFound(PathBuf::from("brisk.config.json"));
        let msg = err.to_string();
        assert!(msg.contains("Config file not found"));
        assert!(msg.contains("brisk.config.json"));
        assert!(msg.contains("Hint:"));
    }

    #[test]
    fn test_config_error_invalid_value() {
        let err = ConfigError::invalid_value("port", 0, "Use a port between 1 and 65535");
        let msg = err.to_string();
        assert!(msg.contains("Invalid value for 'port'"));
        assert!(msg.contains("between 1 and 65535"));
    }

    #[test]
    fn test_server_bind_message() {
        let err = CliError::ServerBind {
            addr: "127.0.0.1:8080".parse().unwrap(),
            message: "Address already in use".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("127.0.0.1:8080"));
        assert!(msg.contains("--port"));
    }

    #[test]
    fn test_cli_error_from_discovery_error() {
        let err: CliError = DiscoveryError::MissingRoot(PathBuf::from("./src")).into();
        assert!(matches!(err, CliError::Discovery(_)));
        assert!(err.to_string().contains("./src"));
    }

    #[test]
    fn test_cli_error_from_compile_error() {
        let err: CliError = CompileError::Init("bad target".to_string()).into();
        assert!(matches!(err, CliError::Compile(_)));
    }

    #[test]
    fn test_cli_error_from_cycle_failure_keeps_kind() {
        let failure = CycleFailure::Discovery(DiscoveryError::MissingRoot(PathBuf::from("src")));
        assert!(matches!(CliError::from(failure), CliError::Discovery(_)));

        let failure = CycleFailure::Compile(CompileError::TimedOut { timeout_ms: 10 });
        assert!(matches!(CliError::from(failure), CliError::Compile(_)));
    }

    #[test]
    fn test_result_ext_with_path() {
        let result: std::io::Result<()> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));

        let err = result.with_path("/test/path.txt").unwrap_err();
        assert!(matches!(err, CliError::FileNotFound(_)));
    }

    #[test]
    fn test_result_ext_with_hint() {
        let result: std::result::Result<(), ConfigError> =
            Err(ConfigError::NotFound(PathBuf::from("test.json")));

        let err = result.with_hint("Try creating the file").unwrap_err();
        assert!(err.to_string().contains("Hint: Try creating the file"));
    }

    #[test]
    fn test_result_ext_context() {
        let result: std::result::Result<(), ConfigError> =
            Err(ConfigError::NotFound(PathBuf::from("test.json")));

        let err = result.context("Failed to initialize").unwrap_err();
        assert!(err.to_string().starts_with("Failed to initialize"));
    }
}
