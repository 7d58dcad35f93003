//! gRPC server setup and lifecycle.
//!
//! Configures the tonic server with:
//! - The consolidated Greeter handler
//! - Inbound span creation filtered for health and scrape paths
//! - Graceful shutdown support
//! - The ops HTTP sidecar (health checks, metrics scrape)

use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::health::HealthRegistry;
use crate::observability::ops;
use crate::observability::tracing::TracePathFilter;
use crate::proto::hail::v1::greeter_server::GreeterServer;
use crate::service::GreeterService;

/// Startup and lifecycle failures.
///
/// Bind-class errors abort startup; the process exits non-zero with the
/// fatal message logged by `main`.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid listen address {addr}: {source}")]
    InvalidAddress {
        addr: String,
        source: std::net::AddrParseError,
    },
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("gRPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
    #[error("ops server error: {0}")]
    Ops(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Run the Hail gRPC server and its ops HTTP sidecar.
///
/// # Arguments
///
/// * `config` - Server configuration
/// * `shutdown_rx` - Receiver for shutdown signal
///
/// # Returns
///
/// Returns when both servers have shut down.
pub async fn run_server(
    config: Config,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<(), ServerError> {
    let exporter_config = config.exporter_config();

    let grpc_addr = parse_addr(&config.host, config.port)?;
    let ops_addr = parse_addr(&config.host, config.http_port)?;

    // Bind up front so port conflicts abort startup with a clear error.
    let grpc_listener = tokio::net::TcpListener::bind(grpc_addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: grpc_addr,
            source,
        })?;

    let mut health = HealthRegistry::new();
    health.register("process", true, || true);
    let health = Arc::new(health);

    // Ops sidecar: health endpoints always, scrape route when enabled.
    let ops_handle = tokio::spawn(ops::run_ops_server(
        ops_addr,
        exporter_config.clone(),
        Arc::clone(&health),
        shutdown_rx.clone(),
    ));

    let span_filter = TracePathFilter::from_config(&exporter_config);
    let trace_layer = TraceLayer::new_for_grpc().make_span_with(
        move |request: &tonic::codegen::http::Request<_>| {
            span_filter.request_span(request.method().as_str(), request.uri().path())
        },
    );

    tracing::info!(address = %grpc_addr, "Starting Hail gRPC server");

    Server::builder()
        .layer(trace_layer)
        .add_service(GreeterServer::new(GreeterService))
        .serve_with_incoming_shutdown(TcpListenerStream::new(grpc_listener), async move {
            let _ = shutdown_rx.changed().await;
            tracing::info!("Shutdown signal received, stopping server");
        })
        .await?;

    match ops_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(ServerError::Ops(e)),
        Err(e) => tracing::warn!(error = %e, "Ops server task failed"),
    }

    tracing::info!("Server stopped");
    Ok(())
}

fn parse_addr(host: &str, port: u16) -> Result<SocketAddr, ServerError> {
    let addr = format!("{host}:{port}");
    addr.parse()
        .map_err(|source| ServerError::InvalidAddress { addr, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_addr_accepts_valid_host_port() {
        let addr = parse_addr("127.0.0.1", 50051).expect("valid address");
        assert_eq!(addr.port(), 50051);
    }

    #[test]
    fn test_parse_addr_rejects_garbage_host() {
        let result = parse_addr("not a host", 50051);
        assert!(matches!(
            result,
            Err(ServerError::InvalidAddress { .. })
        ));
    }
}
