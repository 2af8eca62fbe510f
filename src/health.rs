use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use log::{info, warn};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::store::{SnapshotStore, StoreError};

const PING_TIMEOUT: Duration = Duration::from_secs(3);

/// State shared across axum handlers.
struct AppState {
    store: Arc<dyn SnapshotStore>,
    /// Outcome of the previous check, so only transitions are logged.
    healthy: AtomicBool,
}

fn router(store: Arc<dyn SnapshotStore>) -> Router {
    let state = Arc::new(AppState {
        store,
        healthy: AtomicBool::new(true),
    });

    Router::new()
        .route("/health", get(health))
        .with_state(state)
}

/// Serves `/health` on all interfaces until `cancel` fires.
pub async fn start_health_service(
    port: u16,
    store: Arc<dyn SnapshotStore>,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting health service on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    serve(listener, store, cancel).await
}

async fn serve(
    listener: TcpListener,
    store: Arc<dyn SnapshotStore>,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    axum::serve(listener, router(store))
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
}

/// Up while the store answers a ping.
async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let res = match tokio::time::timeout(PING_TIMEOUT, state.store.ping()).await {
        Ok(res) => res,
        Err(_) => Err(StoreError::Timeout(PING_TIMEOUT)),
    };
    let was_healthy = state.healthy.swap(res.is_ok(), Ordering::Relaxed);

    match res {
        Ok(()) => {
            if !was_healthy {
                info!("Health check recovered");
            }
            (StatusCode::OK, Json(json!({ "status": "up" })))
        }
        Err(e) => {
            if was_healthy {
                warn!("Health check failed: {e}");
            }
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "down", "error": e.to_string() })),
            )
        }
    }
}
