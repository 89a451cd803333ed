//! Entry discovery.
//!
//! Scans a source root for files the compiler can turn into artifacts. Each
//! entry's logical name is derived from its path so the same source always
//! produces the same artifact name.

use crate::error::DiscoveryError;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions of files that become script entries, in precedence order.
pub const SCRIPT_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "js", "jsx", "mjs"];

/// Extensions of stylesheets that entries may import.
pub const STYLE_EXTENSIONS: &[&str] = &["css", "scss"];

/// Extensions of markup documents handled by the markup transformer.
pub const MARKUP_EXTENSIONS: &[&str] = &["html", "htm"];

/// A compilable unit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceEntry {
    /// Logical name shared by every artifact this entry produces
    pub name: String,
    /// Absolute or root-relative path to the source file
    pub path: PathBuf,
}

impl SourceEntry {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Options controlling an entry scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Descend into subdirectories of the source root
    pub recursive: bool,
    /// Extensions treated as entries, highest precedence first
    pub extensions: Vec<String>,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            extensions: SCRIPT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl DiscoveryOptions {
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }
}

/// Scan `root` for entry files.
///
/// When two files share a logical name (`index.ts` and `index.js`), the one
/// whose extension comes first in [`DiscoveryOptions::extensions`] wins.
/// TypeScript declaration files (`*.d.ts`) are never entries.
///
/// # Errors
///
/// Returns [`DiscoveryError::MissingRoot`] if `root` does not exist.
pub fn discover_entries(
    root: &Path,
    options: &DiscoveryOptions,
) -> Result<BTreeSet<SourceEntry>, DiscoveryError> {
    let extensions: Vec<&str> = options.extensions.iter().map(String::as_str).collect();
    let files = discover_files(root, options.recursive, &extensions)?;

    // name -> (precedence, path)
    let mut by_name: BTreeMap<String, (usize, PathBuf)> = BTreeMap::new();

    for path in files {
        if is_declaration_file(&path) {
            continue;
        }

        let Some(name) = logical_name(root, &path, options.recursive) else {
            continue;
        };
        let precedence = extension_of(&path)
            .and_then(|ext| extensions.iter().position(|e| *e == ext))
            .unwrap_or(usize::MAX);

        match by_name.get(&name) {
            Some((existing, existing_path)) if *existing <= precedence => {
                tracing::warn!(
                    "Ignoring {} because {} already provides entry '{}'",
                    path.display(),
                    existing_path.display(),
                    name
                );
            }
            _ => {
                by_name.insert(name, (precedence, path));
            }
        }
    }

    let entries: BTreeSet<SourceEntry> = by_name
        .into_iter()
        .map(|(name, (_, path))| SourceEntry { name, path })
        .collect();

    tracing::debug!("Discovered {} entries in {}", entries.len(), root.display());
    Ok(entries)
}

/// List files under `root` whose extension is in `extensions`.
///
/// Hidden files and directories are skipped. Results are sorted by path.
pub fn discover_files(
    root: &Path,
    recursive: bool,
    extensions: &[&str],
) -> Result<Vec<PathBuf>, DiscoveryError> {
    if !root.exists() {
        return Err(DiscoveryError::MissingRoot(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(DiscoveryError::NotADirectory(root.to_path_buf()));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e.file_name()));

    for entry in walker {
        let entry = entry.map_err(|e| DiscoveryError::Io {
            path: e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf()),
            message: e.to_string(),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let matches = extension_of(entry.path())
            .map(|ext| extensions.contains(&ext))
            .unwrap_or(false);
        if matches {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Derive the logical name of `path` relative to `root`.
///
/// Non-recursive scans use the bare file stem; recursive scans keep the
/// directory components so nested files with the same stem stay distinct
/// (`pages/about.ts` becomes `pages/about`).
pub fn logical_name(root: &Path, path: &Path, recursive: bool) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    if stem.is_empty() {
        return None;
    }

    if !recursive {
        return Some(stem.to_string());
    }

    let relative = path.strip_prefix(root).ok()?;
    let mut parts: Vec<&str> = Vec::new();
    if let Some(parent) = relative.parent() {
        for component in parent.components() {
            parts.push(component.as_os_str().to_str()?);
        }
    }
    parts.push(stem);
    Some(parts.join("/"))
}

fn extension_of(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

fn is_declaration_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with(".d.ts"))
        .unwrap_or(false)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().map(|n| n.starts_with('.')).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, rel: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "export {};").unwrap();
    }

    #[test]
    fn test_discovers_top_level_entries() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "index.ts");
        touch(temp.path(), "about.tsx");
        touch(temp.path(), "index.html");
        touch(temp.path(), "styles.scss");

        let entries = discover_entries(temp.path(), &DiscoveryOptions::default()).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["about", "index"]);
    }

    #[test]
    fn test_non_recursive_ignores_subdirectories() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "index.ts");
        touch(temp.path(), "lib/util.ts");

        let entries = discover_entries(temp.path(), &DiscoveryOptions::default()).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_recursive_keeps_directory_in_name() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "index.ts");
        touch(temp.path(), "pages/index.ts");

        let options = DiscoveryOptions::default().recursive(true);
        let entries = discover_entries(temp.path(), &options).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["index", "pages/index"]);
    }

    #[test]
    fn test_declaration_and_hidden_files_skipped() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "types.d.ts");
        touch(temp.path(), ".scratch.ts");
        touch(temp.path(), "main.ts");

        let entries = discover_entries(temp.path(), &DiscoveryOptions::default()).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["main"]);
    }

    #[test]
    fn test_extension_precedence_on_name_collision() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "index.js");
        touch(temp.path(), "index.ts");

        let entries = discover_entries(temp.path(), &DiscoveryOptions::default()).unwrap();
        assert_eq!(entries.len(), 1);
        let entry = entries.iter().next().unwrap();
        assert!(entry.path.ends_with("index.ts"));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        let err = discover_entries(&missing, &DiscoveryOptions::default()).unwrap_err();
        assert!(matches!(err, DiscoveryError::MissingRoot(_)));
    }

    #[test]
    fn test_root_must_be_directory() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "file.ts");
        let err =
            discover_entries(&temp.path().join("file.ts"), &DiscoveryOptions::default()).unwrap_err();
        assert!(matches!(err, DiscoveryError::NotADirectory(_)));
    }

    #[test]
    fn test_logical_name_variants() {
        let root = Path::new("/project/src");
        assert_eq!(
            logical_name(root, Path::new("/project/src/app.ts"), false),
            Some("app".to_string())
        );
        assert_eq!(
            logical_name(root, Path::new("/project/src/blog/post.ts"), true),
            Some("blog/post".to_string())
        );
    }
}
