//! Build cycle execution.
//!
//! A cycle stages everything it produces and hands it to the artifact store
//! in one commit. Nothing is written before compilation has succeeded, so a
//! failed cycle leaves the last good artifacts in place.

use crate::config::BriskConfig;
use crate::dev::controller::CycleKind;
use crate::dev::markup::{find_markup, transform_markup, KnownArtifacts, MarkupSource};
use brisk_bundler::{
    discover_entries, Artifact, ArtifactKind, CompileError, CompileOptions, CompileOutput,
    Compiler, Diagnostic, DiscoveryError, DiscoveryOptions, OxcCompiler, SourceEntry,
};
use brisk_plugin_css::{CssPlugin, CssPluginOptions, SassPlugin};
use brisk_store::{ArtifactStore, CommitBatch, CommitSummary, StoreError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Why a cycle did not commit. None of these are fatal to the dev loop.
#[derive(Debug, Error)]
pub enum CycleFailure {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a committed cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub kind: CycleKind,
    pub entries: usize,
    pub commit: CommitSummary,
    /// `(file name, size)` of every artifact in the commit
    pub outputs: Vec<(String, u64)>,
    pub warnings: Vec<Diagnostic>,
    pub duration: Duration,
}

impl CycleReport {
    pub fn duration_ms(&self) -> u64 {
        self.duration.as_millis() as u64
    }
}

/// Inputs to every cycle, resolved once from the configuration.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub source_root: PathBuf,
    pub discovery: DiscoveryOptions,
    pub compile: CompileOptions,
    pub compile_timeout: Option<Duration>,
}

impl BuildSettings {
    pub fn from_config(config: &BriskConfig, cwd: &Path) -> Self {
        Self {
            source_root: config.source_root_dir(cwd),
            discovery: config.discovery_options(),
            compile: config.compile_options(cwd),
            compile_timeout: config.compile_timeout(),
        }
    }
}

/// Build the default compiler: OXC with the Sass and CSS stylesheet plugins.
pub fn create_compiler(config: &BriskConfig) -> Result<Arc<dyn Compiler>, CompileError> {
    let styles = CssPluginOptions::new().with_minify(config.minify);
    let compiler = OxcCompiler::new(&config.target)?
        .with_plugin(SassPlugin::with_options(styles.clone()))
        .with_plugin(CssPlugin::with_options(styles));
    Ok(Arc::new(compiler))
}

/// Runs build cycles and remembers the last good entry set and artifact kinds.
#[derive(Debug)]
pub struct DevBuilder {
    compiler: Arc<dyn Compiler>,
    store: Arc<dyn ArtifactStore>,
    settings: BuildSettings,
    entries: Option<Vec<SourceEntry>>,
    known: KnownArtifacts,
}

impl DevBuilder {
    pub fn new(
        compiler: Arc<dyn Compiler>,
        store: Arc<dyn ArtifactStore>,
        settings: BuildSettings,
    ) -> Self {
        Self {
            compiler,
            store,
            settings,
            entries: None,
            known: KnownArtifacts::new(),
        }
    }

    pub fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    /// Artifact kinds produced per logical name by the last committed compile.
    pub fn known_artifacts(&self) -> &KnownArtifacts {
        &self.known
    }

    /// Run one cycle and commit its output.
    ///
    /// # Errors
    ///
    /// Any error means nothing was committed.
    pub async fn run_cycle(&mut self, kind: CycleKind) -> Result<CycleReport, CycleFailure> {
        let start = Instant::now();
        tracing::debug!("Starting {} build cycle", kind);

        let (batch, entries, known, warnings) = match kind {
            CycleKind::Full => {
                let entries = self.discover()?;
                let output = self.compile(entries.clone()).await?;
                let known = output.known_artifacts();

                let batch = match self.derive_markup(&known).await {
                    Ok(mut markup) => {
                        let mut artifacts = output.artifacts;
                        artifacts.append(&mut markup);
                        CommitBatch::full(artifacts)
                    }
                    Err(e) => {
                        // Keep whatever markup is live rather than pruning it
                        tracing::warn!("Markup scan failed, keeping current documents: {}", e);
                        CommitBatch::new(output.artifacts, ArtifactKind::COMPILED)
                    }
                };
                (batch, Some(entries), Some(known), output.diagnostics)
            }
            CycleKind::MarkupOnly => {
                let markup = self.derive_markup(&self.known).await?;
                (CommitBatch::markup(markup), None, None, Vec::new())
            }
        };

        let outputs: Vec<(String, u64)> = batch
            .artifacts
            .iter()
            .map(|a| (a.file_name(), a.bytes.len() as u64))
            .collect();

        let commit = self.store.commit(batch).await?;

        if let Some(entries) = entries {
            self.entries = Some(entries);
        }
        if let Some(known) = known {
            self.known = known;
        }

        Ok(CycleReport {
            kind,
            entries: self.entries.as_ref().map_or(0, Vec::len),
            commit,
            outputs,
            warnings,
            duration: start.elapsed(),
        })
    }

    /// Scan for entries, falling back to the previous set during watch.
    fn discover(&self) -> Result<Vec<SourceEntry>, DiscoveryError> {
        match discover_entries(&self.settings.source_root, &self.settings.discovery) {
            Ok(entries) => Ok(entries.into_iter().collect()),
            Err(e) => match &self.entries {
                Some(previous) => {
                    tracing::warn!("{}; keeping the previous {} entries", e, previous.len());
                    Ok(previous.clone())
                }
                None => Err(e),
            },
        }
    }

    /// Compile on the blocking pool, bounded by the configured timeout.
    ///
    /// A compile that times out keeps running in the background; its result is
    /// dropped.
    async fn compile(&self, entries: Vec<SourceEntry>) -> Result<CompileOutput, CompileError> {
        let compiler = Arc::clone(&self.compiler);
        let options = self.settings.compile.clone();
        let task = tokio::task::spawn_blocking(move || compiler.compile(&entries, &options));

        let joined = match self.settings.compile_timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    return Err(CompileError::TimedOut {
                        timeout_ms: limit.as_millis() as u64,
                    })
                }
            },
            None => task.await,
        };

        match joined {
            Ok(result) => result,
            Err(e) => Err(CompileError::Failed {
                diagnostics: vec![Diagnostic::error(
                    &self.settings.source_root,
                    format!("compiler task failed: {}", e),
                )],
            }),
        }
    }

    /// Re-derive every markup document from its pristine source.
    ///
    /// A document that cannot be read keeps its currently served bytes.
    async fn derive_markup(&self, known: &KnownArtifacts) -> Result<Vec<Artifact>, DiscoveryError> {
        let sources = find_markup(&self.settings.source_root, self.settings.discovery.recursive)?;

        let mut documents: Vec<(MarkupSource, Vec<u8>)> = Vec::with_capacity(sources.len());
        let mut retained = Vec::new();
        for source in sources {
            match source.read().await {
                Ok(bytes) => documents.push((source, bytes)),
                Err(e) => {
                    tracing::warn!("{}", e);
                    if let Ok(bytes) = self.store.get(&source.name, ArtifactKind::Markup).await {
                        retained.push(Artifact::new(source.name, ArtifactKind::Markup, bytes));
                    }
                }
            }
        }

        let mut artifacts = transform_markup(&documents, known);
        artifacts.append(&mut retained);
        Ok(artifacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dev::markup::LIVE_RELOAD_MARKER;
    use brisk_store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Emits `<name>.js` holding the entry's source text, or fails on `FAIL`.
    #[derive(Debug, Default)]
    struct EchoCompiler {
        calls: AtomicUsize,
    }

    impl Compiler for EchoCompiler {
        fn name(&self) -> &str {
            "echo"
        }

        fn compile(
            &self,
            entries: &[SourceEntry],
            _options: &CompileOptions,
        ) -> Result<CompileOutput, CompileError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut artifacts = Vec::new();
            for entry in entries {
                let text = std::fs::read_to_string(&entry.path).unwrap_or_default();
                if text.contains("FAIL") {
                    return Err(CompileError::Failed {
                        diagnostics: vec![Diagnostic::error(&entry.path, "Unexpected token")],
                    });
                }
                artifacts.push(Artifact::new(entry.name.clone(), ArtifactKind::Script, text));
            }
            Ok(CompileOutput {
                artifacts,
                diagnostics: Vec::new(),
            })
        }
    }

    #[derive(Debug)]
    struct SlowCompiler;

    impl Compiler for SlowCompiler {
        fn name(&self) -> &str {
            "slow"
        }

        fn compile(
            &self,
            _entries: &[SourceEntry],
            _options: &CompileOptions,
        ) -> Result<CompileOutput, CompileError> {
            std::thread::sleep(Duration::from_millis(500));
            Ok(CompileOutput::default())
        }
    }

    fn settings(root: &Path) -> BuildSettings {
        BuildSettings {
            source_root: root.to_path_buf(),
            discovery: DiscoveryOptions::default(),
            compile: CompileOptions::default(),
            compile_timeout: None,
        }
    }

    fn builder(root: &Path, compiler: Arc<dyn Compiler>) -> (DevBuilder, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let builder = DevBuilder::new(compiler, store.clone(), settings(root));
        (builder, store)
    }

    #[tokio::test]
    async fn test_full_cycle_commits_scripts_and_markup() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("index.ts"), "one").unwrap();
        std::fs::write(temp.path().join("index.html"), "<body></body>").unwrap();
        let (mut builder, store) = builder(temp.path(), Arc::new(EchoCompiler::default()));

        let report = builder.run_cycle(CycleKind::Full).await.unwrap();
        assert_eq!(report.entries, 1);
        assert_eq!(report.commit.written, 2);

        assert_eq!(store.get("index", ArtifactKind::Script).await.unwrap(), b"one");
        let html = store.get("index", ArtifactKind::Markup).await.unwrap();
        let html = String::from_utf8(html).unwrap();
        assert!(html.contains("/index.js"));
        assert!(html.contains(LIVE_RELOAD_MARKER));
    }

    #[tokio::test]
    async fn test_failed_compile_commits_nothing() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("index.ts"), "good").unwrap();
        let (mut builder, store) = builder(temp.path(), Arc::new(EchoCompiler::default()));
        builder.run_cycle(CycleKind::Full).await.unwrap();

        std::fs::write(temp.path().join("index.ts"), "FAIL").unwrap();
        std::fs::write(temp.path().join("extra.ts"), "new").unwrap();
        let err = builder.run_cycle(CycleKind::Full).await.unwrap_err();

        assert!(matches!(err, CycleFailure::Compile(_)));
        assert_eq!(store.get("index", ArtifactKind::Script).await.unwrap(), b"good");
        assert!(store.get("extra", ArtifactKind::Script).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_root_fails_first_cycle() {
        let temp = TempDir::new().unwrap();
        let (mut builder, store) =
            builder(&temp.path().join("missing"), Arc::new(EchoCompiler::default()));

        let err = builder.run_cycle(CycleKind::Full).await.unwrap_err();
        assert!(matches!(err, CycleFailure::Discovery(DiscoveryError::MissingRoot(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_removed_root_keeps_previous_entries() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("src");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(root.join("index.ts"), "one").unwrap();
        std::fs::write(root.join("index.html"), "<p>").unwrap();
        let (mut builder, store) = builder(&root, Arc::new(EchoCompiler::default()));
        builder.run_cycle(CycleKind::Full).await.unwrap();

        std::fs::remove_dir_all(&root).unwrap();
        // Entries are reused; the compile itself then reads nothing
        let report = builder.run_cycle(CycleKind::Full).await.unwrap();
        assert_eq!(report.entries, 1);
        // Markup could not be scanned, so it is left alone
        assert!(store.get("index", ArtifactKind::Markup).await.is_ok());
    }

    #[tokio::test]
    async fn test_removed_entry_is_pruned() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.ts"), "a").unwrap();
        std::fs::write(temp.path().join("b.ts"), "b").unwrap();
        let (mut builder, store) = builder(temp.path(), Arc::new(EchoCompiler::default()));
        builder.run_cycle(CycleKind::Full).await.unwrap();

        std::fs::remove_file(temp.path().join("b.ts")).unwrap();
        let report = builder.run_cycle(CycleKind::Full).await.unwrap();

        assert_eq!(report.commit.removed, 1);
        assert!(store.get("b", ArtifactKind::Script).await.is_err());
    }

    #[tokio::test]
    async fn test_markup_only_cycle_skips_compiler() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("index.ts"), "x").unwrap();
        std::fs::write(temp.path().join("index.html"), "<body>v1</body>").unwrap();
        let compiler = Arc::new(EchoCompiler::default());
        let (mut builder, store) = builder(temp.path(), compiler.clone());
        builder.run_cycle(CycleKind::Full).await.unwrap();

        std::fs::write(temp.path().join("index.html"), "<body>v2</body>").unwrap();
        builder.run_cycle(CycleKind::MarkupOnly).await.unwrap();

        assert_eq!(compiler.calls.load(Ordering::SeqCst), 1);
        let html = String::from_utf8(store.get("index", ArtifactKind::Markup).await.unwrap()).unwrap();
        assert!(html.contains("v2"));
        assert!(html.contains("/index.js"));
        assert_eq!(store.get("index", ArtifactKind::Script).await.unwrap(), b"x");
    }

    #[tokio::test]
    async fn test_compile_timeout() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("index.ts"), "x").unwrap();
        let store = Arc::new(MemoryStore::new());
        let mut settings = settings(temp.path());
        settings.compile_timeout = Some(Duration::from_millis(20));
        let mut builder = DevBuilder::new(Arc::new(SlowCompiler), store.clone(), settings);

        let err = builder.run_cycle(CycleKind::Full).await.unwrap_err();
        assert!(matches!(
            err,
            CycleFailure::Compile(CompileError::TimedOut { timeout_ms: 20 })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_create_compiler_rejects_bad_target() {
        let config = BriskConfig {
            target: "not-a-browser-99".to_string(),
            ..BriskConfig::default()
        };
        assert!(create_compiler(&config).is_err());
        assert!(create_compiler(&BriskConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_default_compiler_compiles_scss_imports() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("theme.scss"),
            "$primary: red; .a { .b { color: $primary; } }",
        )
        .unwrap();
        std::fs::write(
            temp.path().join("index.ts"),
            "import './theme.scss';\nexport const ready: boolean = true;\n",
        )
        .unwrap();
        let compiler = create_compiler(&BriskConfig::default()).unwrap();
        let (mut builder, store) = builder(temp.path(), compiler);

        builder.run_cycle(CycleKind::Full).await.unwrap();

        let css = store.get("index", ArtifactKind::Stylesheet).await.unwrap();
        let css = String::from_utf8(css).unwrap();
        assert!(css.contains(".a .b"));
        assert!(css.contains("color: red"));
    }
}
