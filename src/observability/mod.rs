//! OpenTelemetry observability infrastructure.
//!
//! Provides:
//! - Structured logging with optional OTLP export
//! - OTLP push and Prometheus pull metrics
//! - Distributed tracing with environment-dependent sampling and span-path
//!   filtering for health-check and scrape noise
//!
//! [`init`] is the single bootstrap entry point. It runs once, before the
//! server accepts connections; every exporter decision is a pure function of
//! the [`ExporterConfig`](crate::config::ExporterConfig) snapshot.

pub mod metrics;
pub mod ops;
pub mod tracing;

use std::sync::OnceLock;

use anyhow::Result;
use opentelemetry::KeyValue;
use opentelemetry_sdk::logs::LoggerProvider;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::TracerProvider;
use opentelemetry_sdk::Resource;

use crate::config::ExporterConfig;

static BOOTSTRAPPED: OnceLock<()> = OnceLock::new();

/// Guard that owns the telemetry providers for the life of the process.
///
/// Keep it alive until the servers stop accepting work and in-flight
/// requests have drained; dropping it shuts the providers down so buffered
/// telemetry is flushed rather than lost.
pub struct TelemetryGuard {
    tracer_provider: Option<TracerProvider>,
    meter_provider: Option<SdkMeterProvider>,
    logger_provider: Option<LoggerProvider>,
    otlp: bool,
}

impl TelemetryGuard {
    fn inert() -> Self {
        Self {
            tracer_provider: None,
            meter_provider: None,
            logger_provider: None,
            otlp: false,
        }
    }

    /// True when this bootstrap attached OTLP push exporters.
    pub fn exports_otlp(&self) -> bool {
        self.otlp
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.meter_provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("Failed to shutdown meter provider: {e:?}");
            }
        }
        if let Some(provider) = self.tracer_provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("Failed to shutdown tracer provider: {e:?}");
            }
        }
        if let Some(provider) = self.logger_provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("Failed to shutdown logger provider: {e:?}");
            }
        }
    }
}

/// Initialize logging, tracing and metrics from the configuration snapshot.
///
/// Called exactly once during startup, before the server begins accepting
/// connections. Repeated calls are idempotent: they log a warning and return
/// an inert guard without touching the already-installed pipelines.
pub fn init(config: &ExporterConfig, log_level: &str, log_format: &str) -> Result<TelemetryGuard> {
    if BOOTSTRAPPED.set(()).is_err() {
        ::tracing::warn!("Telemetry already initialized, ignoring repeated bootstrap");
        return Ok(TelemetryGuard::inert());
    }

    let resource = Resource::new([
        KeyValue::new("service.name", "hail"),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
    ]);

    // Logging comes up before the first log line; the subscriber install also
    // carries the optional OTLP span and log layers.
    let (tracer_provider, logger_provider) =
        tracing::init_pipelines(config, log_level, log_format, resource.clone())?;

    let meter_provider = metrics::init(config, resource);

    Ok(TelemetryGuard {
        otlp: config.otlp_enabled(),
        tracer_provider,
        meter_provider: Some(meter_provider),
        logger_provider,
    })
}
