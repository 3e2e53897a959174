//! HTTP listener
//!
//! Request handling beyond the health check is mounted by the login and
//! forwarding handlers; this module owns the listener and its shutdown.

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use authgate_core::AppContext;

pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/healthcheck", get(healthcheck))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Reports ok once bootstrap has produced a ready context
async fn healthcheck(State(ctx): State<AppContext>) -> Json<Value> {
    Json(json!({ "ok": ctx.is_ready() }))
}

pub async fn serve(ctx: AppContext) -> anyhow::Result<()> {
    let http_address = ctx.config().http_address();
    let listener = TcpListener::bind(&http_address)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind HTTP address {http_address}: {e}"))?;

    info!("HTTP server listening on {}", http_address);

    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server shut down gracefully");
    Ok(())
}

/// Wait for a shutdown signal (SIGTERM or SIGINT/Ctrl+C)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("Received Ctrl+C"); }
        () = terminate => { info!("Received SIGTERM"); }
    }
}
