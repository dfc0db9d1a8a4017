//! Bounded multipart upload server.
//!
//! `BoundedFileServer` accepts exactly `expected` uploads on one POST route,
//! stores upload `k` as `storage_root/<k>`, and shuts itself down once the
//! last one has been written.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::routing::post;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::time::MissedTickBehavior;

use crate::domain::config::TransferConfig;
use crate::domain::error::ClusterError;
use crate::domain::transfer::{UploadSlot, normalize_endpoint};

/// Server settings for one bounded receive.
#[derive(Debug, Clone)]
pub struct UploadServerConfig {
    pub endpoint: String,
    pub form_field: String,
    pub storage_root: PathBuf,
    /// Number of uploads to accept before shutting down.
    pub expected: usize,
    pub monitor_interval: Duration,
    pub shutdown_grace: Duration,
    pub max_body_bytes: usize,
}

impl UploadServerConfig {
    /// Build from the `transfer` config section.
    #[must_use]
    pub fn from_transfer(cfg: &TransferConfig, expected: usize) -> Self {
        Self {
            endpoint: cfg.endpoint.clone(),
            form_field: cfg.form_field.clone(),
            storage_root: cfg.storage_root.clone(),
            expected,
            monitor_interval: cfg.monitor_interval(),
            shutdown_grace: cfg.shutdown_grace(),
            max_body_bytes: cfg.max_body_bytes,
        }
    }
}

/// Outcome of a completed `serve`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeReport {
    /// Stored files, ordered by ordinal.
    pub stored: Vec<PathBuf>,
    /// Whether in-flight requests were cut off after the grace period.
    pub forced_close: bool,
}

// ── Ordinal queue ─────────────────────────────────────────────────────────────

/// Channel pre-loaded with every ordinal in `0..n`.
///
/// Receiving through the mutex makes each hand-out exclusive. A slot goes
/// back into the channel only when its upload could not be stored, so the
/// channel never holds more than `n` items.
struct OrdinalQueue {
    tx: mpsc::Sender<UploadSlot>,
    rx: Mutex<mpsc::Receiver<UploadSlot>>,
}

impl OrdinalQueue {
    fn preloaded(n: usize) -> Result<Self> {
        let (tx, rx) = mpsc::channel(n);
        for ordinal in 0..n {
            tx.try_send(UploadSlot::new(ordinal))
                .map_err(|_| anyhow::anyhow!("ordinal queue rejected slot {ordinal}"))?;
        }
        Ok(Self {
            tx,
            rx: Mutex::new(rx),
        })
    }

    /// Next free ordinal, waiting while every slot is in flight.
    async fn acquire(&self) -> Option<UploadSlot> {
        self.rx.lock().await.recv().await
    }

    fn release(&self, slot: UploadSlot) {
        if self.tx.try_send(slot).is_err() {
            tracing::error!(ordinal = slot.ordinal(), "could not return ordinal to queue");
        }
    }
}

// ── Shared handler state ──────────────────────────────────────────────────────

struct ServerState {
    form_field: String,
    storage_root: PathBuf,
    expected: usize,
    queue: OrdinalQueue,
    completed: AtomicUsize,
    stored: StdMutex<Vec<(UploadSlot, PathBuf)>>,
}

impl ServerState {
    fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    fn finish(&self, slot: UploadSlot, path: PathBuf) {
        if let Ok(mut stored) = self.stored.lock() {
            stored.push((slot, path));
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn stored_paths(&self) -> Vec<PathBuf> {
        let mut stored = self
            .stored
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default();
        stored.sort_by_key(|(slot, _)| *slot);
        stored.into_iter().map(|(_, path)| path).collect()
    }
}

type Reply = (StatusCode, String);

async fn read_field(multipart: &mut Multipart, name: &str) -> Result<Bytes, Reply> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (e.status(), e.body_text()))?
    {
        if field.name() == Some(name) {
            return field.bytes().await.map_err(|e| (e.status(), e.body_text()));
        }
    }
    Err((
        StatusCode::BAD_REQUEST,
        format!("missing form field '{name}'"),
    ))
}

async fn upload(
    State(state): State<Arc<ServerState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Reply {
    let mut multipart = match multipart {
        Ok(m) => m,
        Err(rejection) => {
            tracing::warn!(%rejection, "rejected upload");
            return (rejection.status(), rejection.body_text());
        }
    };
    let bytes = match read_field(&mut multipart, &state.form_field).await {
        Ok(bytes) => bytes,
        Err((status, message)) => {
            tracing::warn!(%status, %message, "rejected upload");
            return (status, message);
        }
    };

    if state.completed() >= state.expected {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            "all uploads already received".to_string(),
        );
    }
    let Some(slot) = state.queue.acquire().await else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            "no upload slots left".to_string(),
        );
    };

    let path = slot.path_in(&state.storage_root);
    if let Err(source) = tokio::fs::write(&path, &bytes).await {
        let err = ClusterError::Storage {
            path: path.clone(),
            source,
        };
        tracing::error!(ordinal = slot.ordinal(), error = %err, "storing upload failed");
        state.queue.release(slot);
        return (StatusCode::INTERNAL_SERVER_ERROR, err.to_string());
    }

    tracing::info!(
        ordinal = slot.ordinal(),
        bytes = bytes.len(),
        path = %path.display(),
        "upload stored"
    );
    state.finish(slot, path);
    (StatusCode::OK, String::new())
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

fn router(endpoint: &str, max_body_bytes: usize, state: Arc<ServerState>) -> Router {
    Router::new()
        .route(&normalize_endpoint(endpoint), post(upload))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

// ── Server ────────────────────────────────────────────────────────────────────

/// HTTP listener that accepts a fixed number of uploads.
pub struct BoundedFileServer {
    listener: TcpListener,
    router: Router,
    state: Arc<ServerState>,
    monitor_interval: Duration,
    shutdown_grace: Duration,
}

impl BoundedFileServer {
    /// Create the storage directory and bind `addr`.
    ///
    /// # Errors
    ///
    /// Returns `ClusterError::InvalidCount` when `config.expected` is zero,
    /// `ClusterError::Storage` when the storage directory cannot be created,
    /// or an I/O error when the address cannot be bound.
    pub async fn bind(addr: SocketAddr, config: UploadServerConfig) -> Result<Self> {
        if config.expected == 0 {
            return Err(ClusterError::InvalidCount.into());
        }
        tokio::fs::create_dir_all(&config.storage_root)
            .await
            .map_err(|source| ClusterError::Storage {
                path: config.storage_root.clone(),
                source,
            })?;

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;

        let state = Arc::new(ServerState {
            form_field: config.form_field,
            storage_root: config.storage_root,
            expected: config.expected,
            queue: OrdinalQueue::preloaded(config.expected)?,
            completed: AtomicUsize::new(0),
            stored: StdMutex::new(Vec::new()),
        });
        let router = router(&config.endpoint, config.max_body_bytes, Arc::clone(&state));

        tracing::info!(
            addr = %listener.local_addr().unwrap_or(addr),
            endpoint = %normalize_endpoint(&config.endpoint),
            expected = config.expected,
            "upload server listening"
        );
        Ok(Self {
            listener,
            router,
            state,
            monitor_interval: config.monitor_interval.max(Duration::from_millis(1)),
            shutdown_grace: config.shutdown_grace,
        })
    }

    /// The bound address, useful after binding port 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot report its address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().context("reading listener address")
    }

    /// Serve until every expected upload has been stored, then shut down.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP server stops on its own before all
    /// uploads arrived.
    pub async fn serve(self) -> Result<ServeReport> {
        let Self {
            listener,
            router,
            state,
            monitor_interval,
            shutdown_grace,
        } = self;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let mut server = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        let mut ticker = tokio::time::interval(monitor_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let completed = state.completed();
                    tracing::debug!(completed, expected = state.expected, "upload progress");
                    if completed >= state.expected {
                        break;
                    }
                }
                joined = &mut server => {
                    joined
                        .context("upload server task failed")?
                        .context("upload server error")?;
                    anyhow::bail!("upload server stopped before all uploads arrived");
                }
            }
        }

        tracing::info!(grace = ?shutdown_grace, "all uploads stored, shutting down");
        let _ = shutdown_tx.send(());
        let forced_close = match tokio::time::timeout(shutdown_grace, &mut server).await {
            Ok(joined) => {
                joined
                    .context("upload server task failed")?
                    .context("upload server error")?;
                false
            }
            Err(_) => {
                tracing::warn!("grace period expired, closing listener");
                server.abort();
                let _ = server.await;
                true
            }
        };

        Ok(ServeReport {
            stored: state.stored_paths(),
            forced_close,
        })
    }
}

/// Bind `0.0.0.0:port` and serve until `config.expected` uploads are stored.
///
/// # Errors
///
/// See [`BoundedFileServer::bind`] and [`BoundedFileServer::serve`].
pub async fn receive_files(port: u16, config: UploadServerConfig) -> Result<ServeReport> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    BoundedFileServer::bind(addr, config).await?.serve().await
}
