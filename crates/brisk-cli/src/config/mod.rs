//! Configuration system for Brisk with multi-source loading.
//!
//! Merges settings from CLI args, environment variables, and config files.
//! Priority: CLI > Environment (`BRISK_*`) > `brisk.config.json` > Defaults

mod conversions;
mod defaults;
mod loading;
mod types;
mod validation;

use brisk_bundler::{CompileOptions, DiscoveryOptions, StylesheetHandling};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use conversions::ConfigOverrides;
pub use defaults::*;
pub use types::*;
pub use validation::resolve_path;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "brisk.config.json";

/// Brisk configuration - loaded from brisk.config.json, `BRISK_*` or CLI args.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BriskConfig {
    /// Directory scanned for entries and markup documents
    #[serde(default = "default_source_root")]
    pub source_root: PathBuf,

    /// Output directory, or `"memory"`
    #[serde(default)]
    pub destination: Destination,

    /// Rebuild on file changes
    #[serde(default = "default_watch")]
    pub watch: bool,

    /// Port for the development server
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host address for the development server
    #[serde(default = "default_host")]
    pub host: String,

    /// Minify scripts and stylesheets
    #[serde(default)]
    pub minify: bool,

    /// Emit a source map per script
    #[serde(default = "default_source_maps")]
    pub source_maps: bool,

    /// How stylesheet imports inside entries are compiled
    #[serde(default)]
    pub stylesheet_handling: StylesheetHandling,

    /// Descend into subdirectories of the source root
    #[serde(default)]
    pub recursive: bool,

    /// Quiet period after the last change before a rebuild starts
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Upper bound for one compile, 0 disables the bound
    #[serde(default = "default_compile_timeout_ms")]
    pub compile_timeout_ms: u64,

    /// Logical name of the markup document served at `/`
    #[serde(default = "default_root_document")]
    pub root_document: String,

    /// ECMAScript target for transpiled output (e.g. es2020, esnext)
    #[serde(default = "default_target")]
    pub target: String,
}

impl BriskConfig {
    /// Defaults for the given mode.
    ///
    /// Dev watches, skips minification and emits source maps; production does
    /// the opposite.
    pub fn defaults_for(mode: Mode) -> Self {
        let dev = mode == Mode::Dev;
        Self {
            source_root: default_source_root(),
            destination: Destination::default(),
            watch: dev,
            port: default_port(),
            host: default_host(),
            minify: !dev,
            source_maps: dev,
            stylesheet_handling: StylesheetHandling::default(),
            recursive: false,
            debounce_ms: default_debounce_ms(),
            compile_timeout_ms: default_compile_timeout_ms(),
            root_document: default_root_document(),
            target: default_target(),
        }
    }

    /// Compiler options, with a disk destination resolved against `cwd`.
    pub fn compile_options(&self, cwd: &Path) -> CompileOptions {
        CompileOptions {
            destination: self.destination_dir(cwd),
            source_maps: self.source_maps,
            stylesheet_handling: self.stylesheet_handling,
            minify: self.minify,
        }
    }

    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions::default().recursive(self.recursive)
    }

    /// Absolute source root.
    pub fn source_root_dir(&self, cwd: &Path) -> PathBuf {
        resolve_path(cwd, &self.source_root)
    }

    /// Absolute destination directory, `None` when artifacts stay in memory.
    pub fn destination_dir(&self, cwd: &Path) -> Option<PathBuf> {
        match &self.destination {
            Destination::Disk(path) => Some(resolve_path(cwd, path)),
            Destination::Memory => None,
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn compile_timeout(&self) -> Option<Duration> {
        (self.compile_timeout_ms > 0).then(|| Duration::from_millis(self.compile_timeout_ms))
    }
}

impl Default for BriskConfig {
    fn default() -> Self {
        Self::defaults_for(Mode::Dev)
    }
}
