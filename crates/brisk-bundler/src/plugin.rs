//! Stylesheet plugin hook.
//!
//! A compiler hands every stylesheet an entry imports to the first plugin
//! that accepts it. Plugins are swappable at configuration time; the compiler
//! only depends on this trait.

use crate::error::PluginError;
use std::path::Path;

/// Transforms one stylesheet source into CSS.
///
/// # Example
///
/// ```
/// use brisk_bundler::{PluginError, StylePlugin};
/// use std::path::Path;
///
/// #[derive(Debug)]
/// struct Uppercase;
///
/// impl StylePlugin for Uppercase {
///     fn name(&self) -> &str {
///         "uppercase"
///     }
///
///     fn accepts(&self, path: &Path) -> bool {
///         path.extension().is_some_and(|e| e == "css")
///     }
///
///     fn transform(&self, _path: &Path, source: &str, _minify: bool) -> Result<String, PluginError> {
///         Ok(source.to_uppercase())
///     }
/// }
/// ```
pub trait StylePlugin: Send + Sync + std::fmt::Debug {
    /// Plugin name used in diagnostics
    fn name(&self) -> &str;

    /// Whether this plugin handles the stylesheet at `path`
    fn accepts(&self, path: &Path) -> bool;

    /// Transform `source` (read from `path`) into CSS text
    fn transform(&self, path: &Path, source: &str, minify: bool) -> Result<String, PluginError>;
}
