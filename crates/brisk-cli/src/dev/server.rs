//! Asset server with live reload over Server-Sent Events.
//!
//! Every request reads the current value from the artifact store; there is
//! no response cache that could outlive a rebuild.

use crate::dev::markup::RELOAD_ENDPOINT;
use crate::dev::SharedState;
use crate::error::{CliError, Result};
use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{
        sse::{Event, KeepAlive},
        IntoResponse, Response, Sse,
    },
    routing::get,
    Json, Router,
};
use brisk_bundler::ArtifactKind;
use brisk_store::{validate_name, ArtifactStore, StoreError};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_stream::Stream;
use tower_http::cors::{Any, CorsLayer};

/// Read-only build status for operators.
pub const STATUS_ENDPOINT: &str = "/__brisk_status__";

const NOT_FOUND_BODY: &str = "Not Found";

/// A bound development server.
///
/// Binding is separate from serving so a taken port fails startup before any
/// build work happens.
#[derive(Debug)]
pub struct DevServer {
    listener: TcpListener,
    addr: SocketAddr,
}

impl DevServer {
    /// Bind the listening socket.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::ServerBind`] if the address is taken or invalid.
    /// There is no fallback to another port.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let bind_error = |e: std::io::Error| CliError::ServerBind {
            addr,
            message: e.to_string(),
        };
        let listener = TcpListener::bind(addr).await.map_err(bind_error)?;
        let addr = listener.local_addr().map_err(bind_error)?;
        Ok(Self { listener, addr })
    }

    /// The actual bound address (differs from the requested one for port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serve until the task is dropped or the listener fails.
    pub async fn serve(self, state: SharedState) -> Result<()> {
        axum::serve(self.listener, router(state))
            .await
            .map_err(|e| CliError::Server(e.to_string()))
    }
}

/// Build the router: push channel, status endpoint, artifact fallback.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route(RELOAD_ENDPOINT, get(handle_reload))
        .route(STATUS_ENDPOINT, get(handle_status))
        .fallback(handle_request)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Push channel: one `reload` message per committed build cycle.
async fn handle_reload(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let (guard, mut rx) = state.broadcaster.connect();

    let stream = async_stream::stream! {
        // Dropping the stream (client gone) drops the guard and unregisters
        let _guard = guard;
        while let Some(token) = rx.recv().await {
            yield Ok::<Event, Infallible>(Event::default().data(token));
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

async fn handle_status(State(state): State<SharedState>) -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "no-cache")],
        Json(state.status_report()),
    )
}

async fn handle_request(State(state): State<SharedState>, uri: Uri) -> Response {
    let asset = resolve(state.store.as_ref(), &state.root_document, uri.path()).await;
    (
        asset.status,
        [
            (header::CONTENT_TYPE, asset.content_type),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        asset.body,
    )
        .into_response()
}

/// Outcome of resolving a request path against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResponse {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl AssetResponse {
    fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            content_type: "text/plain; charset=utf-8",
            body: NOT_FOUND_BODY.as_bytes().to_vec(),
        }
    }

    fn internal_error() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            content_type: "text/plain; charset=utf-8",
            body: b"Internal Server Error".to_vec(),
        }
    }
}

/// Map a request path to an artifact.
///
/// `/` is the root markup document; `/<name>.<ext>` is looked up by logical
/// name and the kind its extension implies. Anything else is a 404.
pub async fn resolve(store: &dyn ArtifactStore, root_document: &str, path: &str) -> AssetResponse {
    let path = path.strip_prefix('/').unwrap_or(path);

    let (name, kind) = if path.is_empty() {
        (root_document, ArtifactKind::Markup)
    } else {
        match ArtifactKind::split_file_name(path) {
            Some(split) => split,
            None => return AssetResponse::not_found(),
        }
    };

    if validate_name(name).is_err() {
        return AssetResponse::not_found();
    }

    match store.get(name, kind).await {
        Ok(body) => AssetResponse {
            status: StatusCode::OK,
            content_type: kind.content_type(),
            body,
        },
        Err(StoreError::NotFound(_)) => AssetResponse::not_found(),
        Err(e) => {
            tracing::error!("Failed to read {}: {}", path, e);
            AssetResponse::internal_error()
        }
    }
}
