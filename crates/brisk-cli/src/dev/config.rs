//! Development server configuration.
//!
//! Resolves a loaded [`BriskConfig`] into absolute paths and a socket
//! address for the dev loop.

use crate::cli::DevArgs;
use crate::config::{BriskConfig, ConfigOverrides, Mode};
use crate::error::{ConfigError, Result};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};

/// Development server configuration.
#[derive(Debug, Clone)]
pub struct DevConfig {
    /// Merged and validated configuration
    pub base: BriskConfig,

    /// Working directory all relative paths were resolved against
    pub cwd: PathBuf,

    /// Absolute source root
    pub source_root: PathBuf,

    /// Absolute destination, `None` for the memory store
    pub destination: Option<PathBuf>,

    /// Server socket address
    pub addr: SocketAddr,

    /// Open browser automatically on start
    pub open: bool,

    /// Directories whose changes are never relevant
    pub watch_ignore: Vec<PathBuf>,
}

impl DevConfig {
    /// Load configuration for `brisk dev` and resolve it against `cwd`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the host does not
    /// resolve.
    pub fn from_args(args: &DevArgs, cwd: &Path) -> Result<Self> {
        let overrides = ConfigOverrides::from(args);
        let base = BriskConfig::load(Mode::Dev, &overrides, args.config.as_deref(), cwd)?;
        Self::from_config(base, cwd, args.open)
    }

    /// Resolve an already-loaded configuration.
    pub fn from_config(base: BriskConfig, cwd: &Path, open: bool) -> Result<Self> {
        base.validate(cwd)?;

        let addr = resolve_addr(&base.host, base.port)?;
        let source_root = base.source_root_dir(cwd);
        let destination = base.destination_dir(cwd);
        let watch_ignore = destination.iter().cloned().collect();

        Ok(Self {
            cwd: cwd.to_path_buf(),
            source_root,
            destination,
            addr,
            open,
            watch_ignore,
            base,
        })
    }

    /// URL printed on startup and opened with `--open`.
    pub fn server_url(&self) -> String {
        let host = if self.addr.ip().is_unspecified() {
            "localhost".to_string()
        } else if self.addr.is_ipv6() {
            format!("[{}]", self.addr.ip())
        } else {
            self.addr.ip().to_string()
        };
        format!("http://{}:{}", host, self.addr.port())
    }
}

fn resolve_addr(host: &str, port: u16) -> Result<SocketAddr> {
    let invalid = |reason: String| {
        ConfigError::invalid_value(
            "host",
            host,
            format!("{}. Use an address such as 127.0.0.1, ::1 or localhost", reason),
        )
    };

    (host, port)
        .to_socket_addrs()
        .map_err(|e| invalid(e.to_string()))?
        .next()
        .ok_or_else(|| invalid("no address found".to_string()).into())
}
