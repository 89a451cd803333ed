//! Compiler options.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How stylesheet imports inside script entries are compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StylesheetHandling {
    /// Replace the import with a string constant holding the stylesheet text
    InlineAsText,
    /// Strip the import and emit a `.css` artifact next to the script
    #[default]
    EmitCss,
}

/// Options for a single [`Compiler::compile`](crate::Compiler::compile) call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Where the orchestrator will commit the artifacts, `None` for memory.
    ///
    /// The compiler itself never writes; this only informs output metadata.
    pub destination: Option<PathBuf>,
    /// Emit a source map artifact per script
    pub source_maps: bool,
    pub stylesheet_handling: StylesheetHandling,
    pub minify: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            destination: None,
            source_maps: true,
            stylesheet_handling: StylesheetHandling::default(),
            minify: false,
        }
    }
}
