//! Hail: a gRPC greeter service scaffold with batteries-included observability.
//!
//! # Usage
//!
//! ```bash
//! hail --port 50051 --http-port 50052 --log-level info
//! ```
//!
//! Environment variables can also be used:
//! - `HAIL_PORT`: gRPC port to listen on
//! - `HAIL_HTTP_PORT`: HTTP ops port (health checks, metrics scrape)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: enable OTLP push export
//! - `HAIL_PROMETHEUS_ENABLED`: expose the Prometheus scrape endpoint
//! - `HAIL_ENVIRONMENT`: development, staging or production
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)

use hail::config::Config;
use hail::observability;
use hail::server::run_server;
use tokio::sync::watch;

/// Print startup banner with version and configuration.
fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");
    let otlp = config
        .otel_endpoint
        .as_deref()
        .filter(|endpoint| !endpoint.is_empty())
        .unwrap_or("disabled");
    let prometheus = if config.prometheus_enabled {
        config.metrics_path.as_str()
    } else {
        "disabled"
    };
    eprintln!(
        r#"
    _   _       _ _
   | | | | __ _(_) |
   | |_| |/ _` | | |
   |  _  | (_| | | |
   |_| |_|\__,_|_|_|

  Hail v{} - gRPC Greeter Scaffold

  Configuration:
    gRPC:        {}:{}
    HTTP ops:    {}:{}
    Environment: {}
    Log Level:   {}
    OTLP:        {}
    Prometheus:  {}

  Press Ctrl+C to shutdown gracefully.
"#,
        version,
        config.host,
        config.port,
        config.host,
        config.http_port,
        config.environment,
        config.log_level,
        otlp,
        prometheus,
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from CLI arguments and environment
    let config = Config::parse_args();

    // One snapshot drives every exporter decision; nothing re-reads the
    // environment after this point.
    let exporter_config = config.exporter_config();

    // Initialize logging, metrics and tracing. The guard stays alive until
    // in-flight requests have drained so buffered telemetry is flushed.
    let _telemetry =
        observability::init(&exporter_config, &config.log_level, &config.log_format)?;

    // Print startup banner
    print_banner(&config);

    // Create shutdown signal channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Spawn signal handler task
    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        // Wait for SIGTERM or SIGINT (Ctrl+C)
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

            tokio::select! {
                _ = ctrl_c => {
                    tracing::info!("Received SIGINT (Ctrl+C), initiating shutdown...");
                }
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating shutdown...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            ctrl_c.await.expect("failed to listen for ctrl+c");
            tracing::info!("Received Ctrl+C, initiating shutdown...");
        }

        // Signal shutdown
        let _ = shutdown_tx_clone.send(true);
    });

    // Run the servers; the telemetry guard drops after they drain
    run_server(config, shutdown_rx).await?;

    tracing::info!("Hail shutdown complete");
    Ok(())
}
