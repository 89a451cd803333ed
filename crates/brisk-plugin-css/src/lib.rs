//! Stylesheet plugins backed by lightningcss.
//!
//! Two plugins live here, split by file type:
//!
//! ```text
//! .css  → CssPlugin  → parse → [minify] → print → CSS
//! .scss → SassPlugin → grass (Sass → CSS) → CssPlugin pipeline
//! ```
//!
//! Register both on a compiler; their accepted extensions do not overlap.
//!
//! ## Example
//!
//! ```rust,no_run
//! use brisk_bundler::OxcCompiler;
//! use brisk_plugin_css::{CssPlugin, CssPluginOptions, SassPlugin};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = CssPluginOptions::new().with_minify(true);
//! let compiler = OxcCompiler::new("es2020")?
//!     .with_plugin(SassPlugin::with_options(options.clone()))
//!     .with_plugin(CssPlugin::with_options(options));
//! # Ok(())
//! # }
//! ```

use brisk_bundler::{PluginError, StylePlugin};
use lightningcss::{
    printer::PrinterOptions,
    stylesheet::{MinifyOptions, ParserOptions, StyleSheet},
};
use std::path::Path;

mod config;
mod sass;

pub use config::CssPluginOptions;
pub use sass::SassPlugin;

const PLUGIN_NAME: &str = "brisk-css";

/// Stylesheet plugin that processes CSS through lightningcss.
#[derive(Debug, Clone, Default)]
pub struct CssPlugin {
    options: CssPluginOptions,
}

impl CssPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CssPluginOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CssPluginOptions {
        &self.options
    }

    /// Parse, optionally minify, and print plain CSS.
    ///
    /// `plugin` names the caller in error messages.
    pub(crate) fn process_css(
        plugin: &str,
        path: &Path,
        source: &str,
        minify: bool,
    ) -> Result<String, PluginError> {
        let mut stylesheet = StyleSheet::parse(
            source,
            ParserOptions {
                filename: path.to_string_lossy().to_string(),
                ..Default::default()
            },
        )
        .map_err(|e| {
            PluginError::new(
                plugin,
                format!("Failed to parse CSS from {}: {}", path.display(), e),
            )
        })?;

        if minify {
            stylesheet.minify(MinifyOptions::default()).map_err(|e| {
                PluginError::new(
                    plugin,
                    format!("Failed to minify CSS from {}: {}", path.display(), e),
                )
            })?;
        }

        let result = stylesheet
            .to_css(PrinterOptions {
                minify,
                ..Default::default()
            })
            .map_err(|e| {
                PluginError::new(
                    plugin,
                    format!("Failed to print CSS from {}: {}", path.display(), e),
                )
            })?;

        Ok(result.code)
    }
}

impl StylePlugin for CssPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn accepts(&self, path: &Path) -> bool {
        has_extension(path, "css")
    }

    fn transform(&self, path: &Path, source: &str, minify: bool) -> Result<String, PluginError> {
        let minify = self.options.minify_for(minify);
        let processed = Self::process_css(PLUGIN_NAME, path, source, minify)?;

        tracing::debug!(
            "[{}] Processed {} ({} -> {} bytes, minify: {})",
            PLUGIN_NAME,
            path.display(),
            source.len(),
            processed.len(),
            minify
        );

        Ok(processed)
    }
}

pub(crate) fn has_extension(path: &Path, wanted: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
}
