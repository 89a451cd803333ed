//! SCSS support.
//!
//! `grass` compiles the Sass syntax down to plain CSS, then the result goes
//! through the same lightningcss pipeline as [`CssPlugin`]. `@use` and
//! `@import` resolve relative to the stylesheet's own directory.

use crate::{has_extension, CssPlugin, CssPluginOptions};
use brisk_bundler::{PluginError, StylePlugin};
use std::path::Path;

const PLUGIN_NAME: &str = "brisk-sass";

/// Stylesheet plugin for `.scss` files.
#[derive(Debug, Clone, Default)]
pub struct SassPlugin {
    options: CssPluginOptions,
}

impl SassPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CssPluginOptions) -> Self {
        Self { options }
    }

    fn compile_sass(&self, path: &Path, source: &str) -> Result<String, PluginError> {
        let mut options = grass::Options::default().input_syntax(grass::InputSyntax::Scss);
        if let Some(dir) = path.parent() {
            options = options.load_path(dir);
        }

        grass::from_string(source.to_owned(), &options).map_err(|e| {
            PluginError::new(
                PLUGIN_NAME,
                format!("Failed to compile Sass from {}: {}", path.display(), e),
            )
        })
    }
}

impl StylePlugin for SassPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn accepts(&self, path: &Path) -> bool {
        has_extension(path, "scss")
    }

    fn transform(&self, path: &Path, source: &str, minify: bool) -> Result<String, PluginError> {
        let css = self.compile_sass(path, source)?;
        let minify = self.options.minify_for(minify);
        let processed = CssPlugin::process_css(PLUGIN_NAME, path, &css, minify)?;

        tracing::debug!(
            "[{}] Compiled {} ({} -> {} bytes, minify: {})",
            PLUGIN_NAME,
            path.display(),
            source.len(),
            processed.len(),
            minify
        );

        Ok(processed)
    }
}
