//! HTTP Server and Process Wiring
//!
//! This module implements the Prometheus exporter HTTP server and ties it to
//! the extraction loop.
//!
//! # Architecture
//!
//! - **HTTP Server**: Axum-based server exposing `/metrics`, `/health`, and `/` endpoints
//! - **Extraction Loop**: Background task that periodically samples casadm and updates metrics
//! - **Shared State**: The `MetricsCollector` is the only state both tasks touch
//! - **Shutdown**: One `CancellationToken` fans out to both tasks
//!
//! # Endpoints
//!
//! - `GET /` - HTML landing page with links to metrics and health
//! - `GET /metrics` - Prometheus metrics in text format
//! - `GET /health` - Last cycle outcome (200 if it succeeded, 503 otherwise)
//!
//! # Backpressure
//!
//! At most `max_requests_in_flight` renders run at once. Requests beyond that
//! are answered with 503 right away instead of queueing.
//!
//! # Shutdown
//!
//! On cancellation the server stops accepting connections and gives in-flight
//! requests `shutdown_timeout_seconds` to finish before it is dropped.

use crate::casadm::{CacheSource, CasadmClient};
use crate::config::Config;
use crate::error::ExporterError;
use crate::extraction::Extractor;
use crate::metrics::MetricsCollector;
use anyhow::Context;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const CONTENT_TYPE_TEXT: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Clone)]
struct AppState {
    metrics: MetricsCollector,
    scrape_permits: Arc<Semaphore>,
}

/// Build the exporter's router
///
/// `scrape_permits` bounds concurrent `/metrics` renders.
pub fn router(metrics: MetricsCollector, scrape_permits: Arc<Semaphore>) -> Router {
    let state = AppState {
        metrics,
        scrape_permits,
    };

    Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Serve `app` until `token` is cancelled, then drain for at most `drain_timeout`
pub async fn serve(
    listener: TcpListener,
    app: Router,
    token: CancellationToken,
    drain_timeout: Duration,
) -> Result<(), ExporterError> {
    let shutdown = token.clone();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            return result.map_err(|e| ExporterError::Server(e.to_string()));
        }
        _ = token.cancelled() => {}
    }

    info!(
        "Draining HTTP connections (timeout: {}s)",
        drain_timeout.as_secs_f64()
    );
    match tokio::time::timeout(drain_timeout, server).await {
        Ok(result) => result.map_err(|e| ExporterError::Server(e.to_string()))?,
        Err(_) => warn!("HTTP drain timed out, forcing shutdown"),
    }

    info!("HTTP server stopped");
    Ok(())
}

/// Check casadm output shape once before serving
///
/// Missing required columns are fatal. Anything else (casadm not yet loaded,
/// no caches configured) is logged and left to the extraction loop.
pub async fn probe(source: &dyn CacheSource, token: &CancellationToken) -> Result<(), ExporterError> {
    let caches = match source.list_caches(token).await {
        Ok(caches) => caches,
        Err(e) if e.is_structural() => return Err(e),
        Err(e) => {
            warn!("Startup probe could not list caches: {}", e);
            return Ok(());
        }
    };

    let Some(cache) = caches.iter().find(|c| c.is_active()) else {
        info!("Startup probe found no active caches");
        return Ok(());
    };

    match source.cache_stats(token, cache.id).await {
        Ok(_) => {
            info!("Startup probe succeeded ({} caches listed)", caches.len());
            Ok(())
        }
        Err(e) if e.is_structural() => Err(e),
        Err(e) => {
            warn!("Startup probe could not read stats for cache {}: {}", cache.id, e);
            Ok(())
        }
    }
}

/// Run the exporter until a shutdown signal arrives
pub async fn start(config: Config) -> anyhow::Result<()> {
    let source: Arc<dyn CacheSource> = Arc::new(CasadmClient::new(config.casadm.clone()));
    run(config, source, shutdown_signal()).await
}

/// Run the exporter against `source` until `shutdown` completes
///
/// Teardown order is cancel → wait for both tasks → return. If the HTTP
/// server dies on its own the extraction loop is cancelled and the error is
/// returned.
pub async fn run(
    config: Config,
    source: Arc<dyn CacheSource>,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<()> {
    config.validate()?;

    let token = CancellationToken::new();
    if config.casadm.probe_on_startup {
        probe(source.as_ref(), &token)
            .await
            .context("casadm output is not usable")?;
    }

    let metrics = MetricsCollector::new()?;

    let addr = config.server.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind metrics endpoint on {}", addr))?;

    info!("Metrics server listening on {}", addr);
    info!("Metrics available at http://{}/metrics", addr);

    let extractor = Extractor::new(source, metrics.clone(), config.metrics.clone());
    let extraction_token = token.child_token();
    let extraction = tokio::spawn(async move { extractor.run(extraction_token).await });

    let app = router(
        metrics,
        Arc::new(Semaphore::new(config.server.max_requests_in_flight)),
    );
    let mut http = tokio::spawn(serve(
        listener,
        app,
        token.child_token(),
        config.server.shutdown_timeout(),
    ));

    let server_result = tokio::select! {
        _ = shutdown => {
            info!("Stopping service");
            token.cancel();
            (&mut http).await
        }
        result = &mut http => {
            error!("HTTP server exited unexpectedly");
            token.cancel();
            result
        }
    };

    if let Err(e) = extraction.await {
        error!("Extraction task failed: {}", e);
    }

    match server_result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.into()),
        Err(e) => Err(anyhow::anyhow!("HTTP server task failed: {}", e)),
    }
}

/// Wait for SIGINT or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

async fn root_handler() -> impl IntoResponse {
    axum::response::Html(
        r#"<html>
<head><title>Open CAS Exporter</title></head>
<body>
<h1>Open CAS Prometheus Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
<p><a href="/health">Health</a></p>
</body>
</html>"#,
    )
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    let Ok(_permit) = state.scrape_permits.try_acquire() else {
        warn!("Rejecting scrape: too many requests in flight");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            "Too many concurrent scrapes, try again later",
        )
            .into_response();
    };

    let start = Instant::now();
    match state.metrics.render() {
        Ok(metrics) => {
            debug!("Stats served in {:?}", start.elapsed());
            ([(header::CONTENT_TYPE, CONTENT_TYPE_TEXT)], metrics).into_response()
        }
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error rendering metrics: {}", e),
            )
                .into_response()
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let outcome = state.metrics.last_cycle();
    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        axum::Json(serde_json::json!({
            "last_cycle_success": outcome.success,
            "last_cycle_duration_seconds": outcome.duration_seconds,
        })),
    )
}
