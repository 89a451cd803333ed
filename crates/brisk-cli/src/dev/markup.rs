//! Markup transformer.
//!
//! Re-derives every served markup document from its pristine source. A
//! document whose logical name matches a compiled entry gets a module script
//! reference (and a stylesheet link when the entry emitted CSS) plus the
//! live-reload listener. Anything else is copied byte for byte.
//!
//! The transform is text-only and never fails a cycle: unreadable or
//! non-UTF-8 documents are reported as [`TransformError`] and passed through.

use brisk_bundler::{
    discover_files, logical_name, Artifact, ArtifactKind, DiscoveryError, MARKUP_EXTENSIONS,
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Comment placed in front of the reload listener; its presence means the
/// listener is already there.
pub const LIVE_RELOAD_MARKER: &str = "<!-- brisk:live-reload -->";

/// Push-channel path the reload listener connects to.
pub const RELOAD_ENDPOINT: &str = "/__brisk_reload__";

/// The only message ever sent on the push channel.
pub const RELOAD_TOKEN: &str = "reload";

/// Logical names and the artifact kinds the last good compile produced.
pub type KnownArtifacts = BTreeMap<String, BTreeSet<ArtifactKind>>;

/// Non-fatal markup failures.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Failed to read {}: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    #[error("{} is not valid UTF-8; copied unmodified", .0.display())]
    NotUtf8(PathBuf),
}

/// A markup document found under the source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupSource {
    pub name: String,
    pub path: PathBuf,
}

impl MarkupSource {
    /// Read the pristine document bytes.
    pub async fn read(&self) -> Result<Vec<u8>, TransformError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| TransformError::Read {
                path: self.path.clone(),
                message: e.to_string(),
            })
    }
}

/// Find markup documents under `root`.
///
/// When `index.html` and `index.htm` both exist, `.html` wins.
pub fn find_markup(root: &Path, recursive: bool) -> Result<Vec<MarkupSource>, DiscoveryError> {
    let files = discover_files(root, recursive, MARKUP_EXTENSIONS)?;

    let mut by_name: BTreeMap<String, (usize, PathBuf)> = BTreeMap::new();
    for path in files {
        let Some(name) = logical_name(root, &path, recursive) else {
            continue;
        };
        let precedence = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| MARKUP_EXTENSIONS.iter().position(|m| *m == ext))
            .unwrap_or(usize::MAX);

        match by_name.get(&name) {
            Some((existing, _)) if *existing <= precedence => {}
            _ => {
                by_name.insert(name, (precedence, path));
            }
        }
    }

    Ok(by_name
        .into_iter()
        .map(|(name, (_, path))| MarkupSource { name, path })
        .collect())
}

/// Transform one document's bytes into its served form.
///
/// Non-UTF-8 input is returned unchanged along with a [`TransformError`].
pub fn transform_bytes(
    source: &[u8],
    path: &Path,
    name: &str,
    known: &KnownArtifacts,
) -> (Vec<u8>, Option<TransformError>) {
    match std::str::from_utf8(source) {
        Ok(text) => (transform_document(text, name, known).into_bytes(), None),
        Err(_) => (
            source.to_vec(),
            Some(TransformError::NotUtf8(path.to_path_buf())),
        ),
    }
}

/// Transform a batch of `(source, bytes)` pairs into markup artifacts.
///
/// Errors are logged and the affected document is passed through.
pub fn transform_markup(documents: &[(MarkupSource, Vec<u8>)], known: &KnownArtifacts) -> Vec<Artifact> {
    documents
        .iter()
        .map(|(source, bytes)| {
            let (out, error) = transform_bytes(bytes, &source.path, &source.name, known);
            if let Some(error) = error {
                tracing::warn!("{}", error);
            }
            Artifact::new(source.name.clone(), ArtifactKind::Markup, out)
        })
        .collect()
}

/// Inject references and the reload listener into `source`.
///
/// Pure and idempotent: the output depends only on `source`, `name` and
/// `known`, and re-running it on its own output changes nothing.
pub fn transform_document(source: &str, name: &str, known: &KnownArtifacts) -> String {
    let Some(kinds) = known.get(name) else {
        return source.to_string();
    };
    if !kinds.contains(&ArtifactKind::Script) {
        return source.to_string();
    }

    let mut head_tags = String::new();
    let stylesheet_href = format!("/{}.{}", name, ArtifactKind::Stylesheet.extension());
    if kinds.contains(&ArtifactKind::Stylesheet) && !source.contains(&stylesheet_href) {
        head_tags.push_str(&format!(
            "<link rel=\"stylesheet\" href=\"{}\">\n",
            stylesheet_href
        ));
    }
    let script_src = format!("/{}.{}", name, ArtifactKind::Script.extension());
    if !source.contains(&script_src) {
        head_tags.push_str(&format!(
            "<script type=\"module\" src=\"{}\"></script>\n",
            script_src
        ));
    }

    let mut output = if head_tags.is_empty() {
        source.to_string()
    } else if let Some(pos) = rfind_tag(source, "</head>") {
        insert_at(source, pos, &head_tags)
    } else if let Some(pos) = rfind_tag(source, "</body>") {
        insert_at(source, pos, &head_tags)
    } else {
        format!("{}\n{}", source, head_tags)
    };

    if !output.contains(LIVE_RELOAD_MARKER) {
        let snippet = reload_snippet();
        output = match rfind_tag(&output, "</body>") {
            Some(pos) => insert_at(&output, pos, &snippet),
            None => format!("{}\n{}", output, snippet),
        };
    }

    output
}

/// The reload listener: opens the push channel and refreshes on the token.
pub fn reload_snippet() -> String {
    format!(
        r#"{marker}
<script>
(() => {{
  const source = new EventSource("{endpoint}");
  source.onmessage = (event) => {{
    if (event.data === "{token}") {{
      source.close();
      location.reload();
    }}
  }};
}})();
</script>
"#,
        marker = LIVE_RELOAD_MARKER,
        endpoint = RELOAD_ENDPOINT,
        token = RELOAD_TOKEN
    )
}

/// Last occurrence of `tag`, ignoring ASCII case.
fn rfind_tag(haystack: &str, tag: &str) -> Option<usize> {
    // ASCII lowercasing keeps byte offsets intact
    haystack.to_ascii_lowercase().rfind(tag)
}

fn insert_at(source: &str, pos: usize, text: &str) -> String {
    let mut result = String::with_capacity(source.len() + text.len());
    result.push_str(&source[..pos]);
    result.push_str(text);
    result.push_str(&source[pos..]);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PAGE: &str = "<!doctype html>\n<html>\n<head>\n<title>t</title>\n</head>\n<body>\n<h1>Hi</h1>\n</body>\n</html>\n";

    fn known(entries: &[(&str, &[ArtifactKind])]) -> KnownArtifacts {
        entries
            .iter()
            .map(|(name, kinds)| (name.to_string(), kinds.iter().copied().collect()))
            .collect()
    }

    #[test]
    fn test_matched_document_gets_script_and_listener() {
        let known = known(&[("index", &[ArtifactKind::Script])]);
        let out = transform_document(PAGE, "index", &known);

        let script = out.find(r#"<script type="module" src="/index.js"></script>"#).unwrap();
        let head_end = out.find("</head>").unwrap();
        assert!(script < head_end);

        let marker = out.find(LIVE_RELOAD_MARKER).unwrap();
        let body_end = out.find("</body>").unwrap();
        assert!(marker < body_end);
        assert!(out.contains(RELOAD_ENDPOINT));
        assert!(!out.contains(".css"));
    }

    #[test]
    fn test_stylesheet_link_injected_when_emitted() {
        let known = known(&[("index", &[ArtifactKind::Script, ArtifactKind::Stylesheet])]);
        let out = transform_document(PAGE, "index", &known);
        assert!(out.contains(r#"<link rel="stylesheet" href="/index.css">"#));
    }

    #[test]
    fn test_unmatched_document_is_unmodified() {
        let known = known(&[("index", &[ArtifactKind::Script])]);
        assert_eq!(transform_document(PAGE, "about", &known), PAGE);
    }

    #[test]
    fn test_transform_is_idempotent() {
        let known = known(&[("index", &[ArtifactKind::Script, ArtifactKind::Stylesheet])]);
        let once = transform_document(PAGE, "index", &known);
        assert_eq!(transform_document(PAGE, "index", &known), once);
        // Feeding the output back in does not double-inject
        assert_eq!(transform_document(&once, "index", &known), once);
        assert_eq!(once.matches(LIVE_RELOAD_MARKER).count(), 1);
    }

    #[test]
    fn test_existing_reference_not_duplicated() {
        let page = "<html><head><script type=\"module\" src=\"/index.js\"></script></head><body></body></html>";
        let known = known(&[("index", &[ArtifactKind::Script])]);
        let out = transform_document(page, "index", &known);
        assert_eq!(out.matches("/index.js").count(), 1);
        assert!(out.contains(LIVE_RELOAD_MARKER));
    }

    #[test]
    fn test_fragment_without_head_or_body() {
        let known = known(&[("index", &[ArtifactKind::Script])]);
        let out = transform_document("<p>fragment</p>", "index", &known);
        assert!(out.starts_with("<p>fragment</p>"));
        assert!(out.contains("/index.js"));
        assert!(out.contains(LIVE_RELOAD_MARKER));
    }

    #[test]
    fn test_uppercase_tags() {
        let page = "<HTML><HEAD></HEAD><BODY></BODY></HTML>";
        let known = known(&[("index", &[ArtifactKind::Script])]);
        let out = transform_document(page, "index", &known);
        assert!(out.find("/index.js").unwrap() < out.find("</HEAD>").unwrap());
        assert!(out.find(LIVE_RELOAD_MARKER).unwrap() < out.find("</BODY>").unwrap());
    }

    #[test]
    fn test_nested_name_references() {
        let known = known(&[("pages/about", &[ArtifactKind::Script])]);
        let out = transform_document(PAGE, "pages/about", &known);
        assert!(out.contains(r#"src="/pages/about.js""#));
    }

    #[test]
    fn test_non_utf8_passes_through() {
        let bytes = vec![0xff, 0xfe, b'<', b'p', b'>'];
        let known = known(&[("index", &[ArtifactKind::Script])]);
        let (out, error) = transform_bytes(&bytes, Path::new("index.html"), "index", &known);
        assert_eq!(out, bytes);
        assert!(matches!(error, Some(TransformError::NotUtf8(_))));
    }

    #[test]
    fn test_find_markup_prefers_html() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("index.html"), "a").unwrap();
        std::fs::write(temp.path().join("index.htm"), "b").unwrap();
        std::fs::write(temp.path().join("about.htm"), "c").unwrap();
        std::fs::write(temp.path().join("index.ts"), "d").unwrap();

        let found = find_markup(temp.path(), false).unwrap();
        let names: Vec<_> = found.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["about", "index"]);
        assert!(found[1].path.ends_with("index.html"));
    }

    #[tokio::test]
    async fn test_transform_markup_batch() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("index.html"), PAGE).unwrap();
        let sources = find_markup(temp.path(), false).unwrap();

        let mut documents = Vec::new();
        for source in sources {
            let bytes = source.read().await.unwrap();
            documents.push((source, bytes));
        }

        let artifacts = transform_markup(&documents, &known(&[("index", &[ArtifactKind::Script])]));
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].kind, ArtifactKind::Markup);
        assert_eq!(artifacts[0].file_name(), "index.html");
    }
}
