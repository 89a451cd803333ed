//! Integration tests for the development loop.
//!
//! Drive the real compiler, both store backends, the dev loop and the asset
//! server with synthesized watch events instead of a filesystem watcher.

use brisk_bundler::ArtifactKind;
use brisk_cli::config::{BriskConfig, Destination};
use brisk_cli::dev::{
    create_compiler, resolve, BuildSettings, DevBuilder, DevLoop, DevServer, DevServerState,
    LoopStats, SharedState, WatchEvent, WatchEventKind, LIVE_RELOAD_MARKER, RELOAD_ENDPOINT,
};
use brisk_store::{ArtifactStore, DiskStore, MemoryStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration, Instant};

const DEBOUNCE_MS: u64 = 40;

struct Project {
    temp: TempDir,
    root: PathBuf,
}

impl Project {
    fn new(files: &[(&str, &str)]) -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("src");
        std::fs::create_dir(&root).unwrap();
        for (name, contents) in files {
            std::fs::write(root.join(name), contents).unwrap();
        }
        Self { temp, root }
    }

    /// Output directory next to the source root.
    fn dist(&self) -> PathBuf {
        self.temp.path().join("dist")
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.root.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }
}

struct Running {
    state: SharedState,
    events: mpsc::Sender<WatchEvent>,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<LoopStats>,
}

impl Running {
    async fn touch(&self, path: &Path) {
        self.events.send(WatchEvent::modified(path)).await.unwrap();
    }

    async fn stop(self) -> LoopStats {
        let _ = self.shutdown.send(());
        self.task.await.unwrap()
    }
}

/// Run the initial build, then hand the loop to a background task.
async fn start(root: &Path) -> Running {
    launch(root, Destination::Memory).await
}

async fn launch(root: &Path, destination: Destination) -> Running {
    let store: Arc<dyn ArtifactStore> = match &destination {
        Destination::Disk(dir) => Arc::new(DiskStore::new(dir)),
        Destination::Memory => Arc::new(MemoryStore::new()),
    };
    let config = BriskConfig {
        source_root: root.to_path_buf(),
        destination,
        debounce_ms: DEBOUNCE_MS,
        ..BriskConfig::default()
    };
    config.validate(root).unwrap();
    let state = Arc::new(DevServerState::new(store.clone(), "index"));
    let builder = DevBuilder::new(
        create_compiler(&config).unwrap(),
        store,
        BuildSettings::from_config(&config, root),
    );

    let mut dev_loop = DevLoop::new(builder, state.clone(), config.debounce());
    dev_loop.initial_build().await.unwrap();

    let (events, rx) = mpsc::channel(64);
    let (shutdown, shutdown_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(dev_loop.run(rx, async {
        let _ = shutdown_rx.await;
    }));

    Running {
        state,
        events,
        shutdown,
        task,
    }
}

async fn wait_until(what: &str, condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        sleep(Duration::from_millis(10)).await;
    }
}

async fn get(state: &SharedState, path: &str) -> (u16, String) {
    let response = resolve(state.store.as_ref(), &state.root_document, path).await;
    (
        response.status.as_u16(),
        String::from_utf8(response.body).unwrap(),
    )
}

#[tokio::test]
async fn test_initial_build_serves_markup_and_script() {
    let project = Project::new(&[
        ("index.ts", "const message: string = 'hello';\nconsole.log(message);\n"),
        ("index.html", "<html><head></head><body><h1>Hi</h1></body></html>"),
    ]);
    let running = start(&project.root).await;

    let (status, html) = get(&running.state, "/").await;
    assert_eq!(status, 200);
    assert!(html.contains("index.js"));
    assert!(html.contains(LIVE_RELOAD_MARKER));
    assert!(html.contains(RELOAD_ENDPOINT));
    assert!(html.contains("<h1>Hi</h1>"));

    let (status, js) = get(&running.state, "/index.js").await;
    assert_eq!(status, 200);
    assert!(js.contains("hello"));
    assert!(!js.contains(": string"));

    running.stop().await;
}

#[tokio::test]
async fn test_syntax_error_keeps_last_good_build_then_fix_reloads_once() {
    let project = Project::new(&[
        ("index.ts", "console.log('v1');\n"),
        ("index.html", "<html><body></body></html>"),
    ]);
    let running = start(&project.root).await;
    let (_client, mut reloads) = running.state.broadcaster.connect();
    let (_, good) = get(&running.state, "/index.js").await;

    // Broken save: compile fails, nothing changes, nobody reloads
    let index = project.write("index.ts", "console.log('v2'\nconst = ;\n");
    running.touch(&index).await;
    let state = running.state.clone();
    wait_until("failed build", || state.get_status().error().is_some()).await;

    let (status, served) = get(&running.state, "/index.js").await;
    assert_eq!(status, 200);
    assert_eq!(served, good);
    assert!(reloads.try_recv().is_err());

    // Fixed save: one reload, fresh bytes
    project.write("index.ts", "console.log('v3');\n");
    running.touch(&index).await;
    wait_until("second commit", || state.completed_cycles() == 2).await;

    assert_eq!(reloads.recv().await.as_deref(), Some("reload"));
    assert!(reloads.try_recv().is_err());

    let (_, fresh) = get(&running.state, "/index.js").await;
    assert!(fresh.contains("v3"));

    // Counts include the initial build
    let stats = running.stop().await;
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.committed, 2);
}

#[tokio::test]
async fn test_two_saves_in_one_window_run_one_cycle() {
    let project = Project::new(&[
        ("a.ts", "export const a = 'a1';\n"),
        ("b.ts", "export const b = 'b1';\n"),
    ]);
    let running = start(&project.root).await;

    let a = project.write("a.ts", "export const a = 'a2';\n");
    let b = project.write("b.ts", "export const b = 'b2';\n");
    running.touch(&a).await;
    running.touch(&b).await;

    let state = running.state.clone();
    wait_until("rebuild", || state.completed_cycles() == 2).await;
    // Give a stray second cycle the chance to show up
    sleep(Duration::from_millis(DEBOUNCE_MS * 5)).await;

    assert!(get(&running.state, "/a.js").await.1.contains("a2"));
    assert!(get(&running.state, "/b.js").await.1.contains("b2"));
    assert_eq!(running.state.broadcaster.broadcast_count(), 2);

    let stats = running.stop().await;
    assert_eq!(stats.cycles_started, 2);
}

#[tokio::test]
async fn test_markup_edit_rederives_from_pristine_source() {
    let project = Project::new(&[
        ("index.ts", "console.log(1);\n"),
        ("index.html", "<html><body><p>v1</p></body></html>"),
    ]);
    let running = start(&project.root).await;

    let html = project.write("index.html", "<html><body><p>v2</p></body></html>");
    running.touch(&html).await;
    let state = running.state.clone();
    wait_until("markup cycle", || state.completed_cycles() == 2).await;

    let (_, served) = get(&running.state, "/").await;
    assert!(served.contains("v2"));
    assert_eq!(served.matches(LIVE_RELOAD_MARKER).count(), 1);
    assert_eq!(served.matches("/index.js").count(), 1);

    running.stop().await;
}

#[tokio::test]
async fn test_http_missing_artifact_is_404() {
    let project = Project::new(&[("index.ts", "console.log(1);\n")]);
    let running = start(&project.root).await;

    let server = DevServer::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
    let addr = server.local_addr();
    let serve = tokio::spawn(server.serve(running.state.clone()));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /missing.js HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert!(response.starts_with("HTTP/1.1 404"));
    assert!(response.ends_with("Not Found"));

    serve.abort();
    running.stop().await;
}

#[tokio::test]
async fn test_status_and_source_map_after_initial_build() {
    let project = Project::new(&[("index.ts", "console.log(1);\n")]);
    let running = start(&project.root).await;

    let report = running.state.status_report();
    assert_eq!(report.status, "success");
    assert_eq!(report.completed_cycles, 1);
    assert_eq!(report.backend, "memory");
    assert!(running
        .state
        .store
        .get("index", ArtifactKind::SourceMap)
        .await
        .is_ok());

    running.stop().await;
}

#[tokio::test]
async fn test_failed_cycle_on_disk_keeps_last_good_files() {
    let project = Project::new(&[
        ("index.ts", "console.log('v1');\n"),
        ("index.html", "<html><body></body></html>"),
    ]);
    let dist = project.dist();
    let running = launch(&project.root, Destination::Disk(dist.clone())).await;
    let good = std::fs::read(dist.join("index.js")).unwrap();
    let good_html = std::fs::read(dist.join("index.html")).unwrap();

    let index = project.write("index.ts", "console.log('v2'\nconst = ;\n");
    running.touch(&index).await;
    let state = running.state.clone();
    wait_until("failed build", || state.get_status().error().is_some()).await;

    assert_eq!(std::fs::read(dist.join("index.js")).unwrap(), good);
    assert_eq!(std::fs::read(dist.join("index.html")).unwrap(), good_html);
    let (_, served) = get(&running.state, "/index.js").await;
    assert_eq!(served.as_bytes(), good.as_slice());

    // No staging leftovers next to the live files
    let leftovers: Vec<String> = std::fs::read_dir(&dist)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .filter(|name| name.ends_with(".tmp") || name.ends_with(".bak"))
        .collect();
    assert!(leftovers.is_empty(), "leftover files: {:?}", leftovers);

    project.write("index.ts", "console.log('v3');\n");
    running.touch(&index).await;
    wait_until("second commit", || state.completed_cycles() == 2).await;
    let fresh = std::fs::read_to_string(dist.join("index.js")).unwrap();
    assert!(fresh.contains("v3"));

    let stats = running.stop().await;
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.committed, 2);
}

#[tokio::test]
async fn test_removed_entry_is_pruned_on_disk_next_to_user_files() {
    let project = Project::new(&[
        ("a.ts", "export const a = 1;\n"),
        ("b.ts", "export const b = 2;\n"),
    ]);
    let dist = project.dist();
    std::fs::create_dir_all(dist.join("vendor")).unwrap();
    std::fs::write(dist.join("legacy.js"), "user file").unwrap();
    std::fs::write(dist.join("vendor/lib.js"), "user file").unwrap();
    std::fs::write(dist.join("robots.txt"), "user file").unwrap();

    let running = launch(&project.root, Destination::Disk(dist.clone())).await;
    assert!(dist.join("b.js").is_file());

    let b = project.root.join("b.ts");
    std::fs::remove_file(&b).unwrap();
    running
        .events
        .send(WatchEvent::new(&b, WatchEventKind::Removed))
        .await
        .unwrap();
    let state = running.state.clone();
    wait_until("prune cycle", || state.completed_cycles() == 2).await;

    assert!(!dist.join("b.js").exists());
    assert!(!dist.join("b.js.map").exists());
    assert!(dist.join("a.js").is_file());
    assert_eq!(std::fs::read_to_string(dist.join("legacy.js")).unwrap(), "user file");
    assert!(dist.join("vendor/lib.js").is_file());
    assert!(dist.join("robots.txt").is_file());

    running.stop().await;
}

#[tokio::test]
async fn test_disk_destination_containing_sources_is_rejected() {
    let project = Project::new(&[
        ("index.ts", "console.log(1);\n"),
        ("index.html", "<html></html>"),
        ("legacy.js", "keep me"),
    ]);
    let config = BriskConfig {
        source_root: project.root.clone(),
        destination: Destination::Disk(project.temp.path().to_path_buf()),
        ..BriskConfig::default()
    };

    assert!(config.validate(project.temp.path()).is_err());
    assert!(project.root.join("legacy.js").is_file());
}
