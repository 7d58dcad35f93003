//! HTTP ops server: Prometheus scrape and health endpoints.
//!
//! Routes:
//! - `GET {scrape_path}` - Prometheus metrics endpoint (when enabled)
//! - `GET /health` - overall liveness and readiness
//! - `GET /alive` - liveness only

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use prometheus::{Encoder, IntGauge, Registry, TextEncoder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use crate::config::ExporterConfig;
use crate::health::HealthRegistry;
use crate::observability::metrics::uptime_seconds;
use crate::observability::tracing::TracePathFilter;

/// Ops server state shared across handlers.
#[derive(Clone)]
pub struct OpsState {
    registry: Arc<Registry>,
    uptime: IntGauge,
    health: Arc<HealthRegistry>,
}

impl OpsState {
    /// Create the ops state with a fresh Prometheus registry.
    ///
    /// The registry carries the process collector (Linux) and the uptime
    /// gauge; everything else is pushed over OTLP, not scraped.
    pub fn new(health: Arc<HealthRegistry>) -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        let uptime = IntGauge::new("application_uptime_seconds", "Seconds since process start")?;
        registry.register(Box::new(uptime.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            uptime,
            health,
        })
    }
}

/// Create the ops HTTP router.
///
/// Health routes are always mounted; the scrape route only when Prometheus
/// export is enabled, at the configured path.
pub fn create_router(state: OpsState, config: &ExporterConfig) -> Router {
    let filter = TracePathFilter::from_config(config);

    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route("/alive", get(alive_handler));

    if config.prometheus_enabled {
        router = router.route(&config.scrape_path, get(metrics_handler));
    }

    router
        .layer(
            TraceLayer::new_for_http().make_span_with(move |request: &axum::http::Request<_>| {
                filter.request_span(request.method().as_str(), request.uri().path())
            }),
        )
        .with_state(state)
}

/// Handle GET {scrape_path} - Prometheus metrics endpoint.
async fn metrics_handler(State(state): State<OpsState>) -> impl IntoResponse {
    // Recomputed on every scrape; the scraper owns the collection cadence.
    state.uptime.set(uptime_seconds() as i64);

    let encoder = TextEncoder::new();
    let metric_families = state.registry.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain; charset=utf-8")],
                format!("Failed to encode metrics: {e}").into_bytes(),
            )
        }
    }
}

/// Handle GET /health - overall liveness and readiness.
async fn health_handler(State(state): State<OpsState>) -> impl IntoResponse {
    let report = state.health.check_all();
    let status = if report.healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

/// Handle GET /alive - liveness only.
async fn alive_handler(State(state): State<OpsState>) -> impl IntoResponse {
    let report = state.health.check_live();
    let status = if report.healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

/// Run the ops HTTP server.
///
/// # Arguments
///
/// * `addr` - Address to bind to
/// * `config` - Telemetry configuration snapshot
/// * `health` - Health-check registry backing the health endpoints
/// * `shutdown_rx` - Receiver for shutdown signal
pub async fn run_ops_server(
    addr: SocketAddr,
    config: ExporterConfig,
    health: Arc<HealthRegistry>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let state = OpsState::new(health)?;
    let app = create_router(state, &config);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        address = %addr,
        scrape = config.prometheus_enabled,
        "Starting ops HTTP server"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
            tracing::info!("Ops server shutting down");
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn snapshot(prometheus_enabled: bool, scrape_path: &str) -> ExporterConfig {
        ExporterConfig {
            otlp_endpoint: None,
            prometheus_enabled,
            scrape_path: scrape_path.into(),
            environment: Environment::Production,
        }
    }

    fn test_state() -> OpsState {
        OpsState::new(Arc::new(HealthRegistry::new())).expect("ops state")
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_router(test_state(), &snapshot(false, "/metrics"));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_alive_endpoint() {
        let app = create_router(test_state(), &snapshot(false, "/metrics"));

        let response = app
            .oneshot(Request::builder().uri("/alive").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_failing_readiness_check_returns_503_on_health_only() {
        let mut health = HealthRegistry::new();
        health.register("process", true, || true);
        health.register("database", false, || false);
        let state = OpsState::new(Arc::new(health)).expect("ops state");
        let app = create_router(state, &snapshot(false, "/metrics"));

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = app
            .oneshot(Request::builder().uri("/alive").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_endpoint_at_custom_path_only() {
        let app = create_router(test_state(), &snapshot(true, "/custom-metrics"));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/custom-metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // The default path must not exist when a custom one is configured
        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_metrics_endpoint_absent_when_disabled() {
        let app = create_router(test_state(), &snapshot(false, "/metrics"));

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_scrape_body_reports_uptime_gauge() {
        let app = create_router(test_state(), &snapshot(true, "/metrics"));

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(
            text.contains("application_uptime_seconds"),
            "scrape output should carry the uptime gauge: {text}"
        );
    }
}
