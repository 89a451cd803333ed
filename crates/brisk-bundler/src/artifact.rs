//! Compiled output units.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What an artifact contains, which also fixes its file extension and MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    /// Compiled JavaScript module
    Script,
    /// Stylesheet extracted from an entry's stylesheet imports
    Stylesheet,
    /// Source map for a script artifact
    SourceMap,
    /// Markup document with injected references
    Markup,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::Script,
        ArtifactKind::Stylesheet,
        ArtifactKind::SourceMap,
        ArtifactKind::Markup,
    ];

    /// Kinds produced by the compiler (everything except markup).
    pub const COMPILED: [ArtifactKind; 3] = [
        ArtifactKind::Script,
        ArtifactKind::Stylesheet,
        ArtifactKind::SourceMap,
    ];

    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Script => "js",
            ArtifactKind::Stylesheet => "css",
            ArtifactKind::SourceMap => "js.map",
            ArtifactKind::Markup => "html",
        }
    }

    /// MIME type used when serving this kind.
    pub fn content_type(self) -> &'static str {
        match self {
            ArtifactKind::Script => "application/javascript",
            ArtifactKind::Stylesheet => "text/css",
            ArtifactKind::SourceMap => "application/json",
            ArtifactKind::Markup => "text/html; charset=utf-8",
        }
    }

    /// Split a file name such as `index.js.map` into its logical name and kind.
    ///
    /// Returns `None` when the extension does not map to any artifact kind.
    ///
    /// ```
    /// use brisk_bundler::ArtifactKind;
    ///
    /// assert_eq!(ArtifactKind::split_file_name("index.js"), Some(("index", ArtifactKind::Script)));
    /// assert_eq!(ArtifactKind::split_file_name("app.js.map"), Some(("app", ArtifactKind::SourceMap)));
    /// assert_eq!(ArtifactKind::split_file_name("logo.png"), None);
    /// ```
    pub fn split_file_name(file_name: &str) -> Option<(&str, ArtifactKind)> {
        if let Some(name) = file_name.strip_suffix(".js.map") {
            return (!name.is_empty()).then_some((name, ArtifactKind::SourceMap));
        }

        let (name, ext) = file_name.rsplit_once('.')?;
        if name.is_empty() {
            return None;
        }

        let kind = match ext {
            "js" | "mjs" => ArtifactKind::Script,
            "css" => ArtifactKind::Stylesheet,
            "html" | "htm" => ArtifactKind::Markup,
            _ => return None,
        };
        Some((name, kind))
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ArtifactKind::Script => "script",
            ArtifactKind::Stylesheet => "stylesheet",
            ArtifactKind::SourceMap => "source-map",
            ArtifactKind::Markup => "markup",
        };
        f.write_str(label)
    }
}

/// Bytes produced for one logical name and kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Logical name (the entry's file stem, `/`-separated when nested)
    pub name: String,
    pub kind: ArtifactKind,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(name: impl Into<String>, kind: ArtifactKind, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            kind,
            bytes: bytes.into(),
        }
    }

    /// File name relative to the destination root, e.g. `index.js`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.kind.extension())
    }
}
