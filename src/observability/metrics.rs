//! OTLP/Prometheus metrics implementation.
//!
//! Key metrics:
//! - hail_rpc_requests_total: Counter for inbound RPCs
//! - hail_rpc_latency_seconds: Histogram for RPC handling latency
//! - application.uptime: Observable gauge, seconds since process start

use opentelemetry::metrics::{Counter, Histogram, Meter, ObservableGauge};
use opentelemetry::{global, KeyValue};
use opentelemetry_sdk::metrics::{ManualReader, SdkMeterProvider};
use opentelemetry_sdk::Resource;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use crate::config::ExporterConfig;

/// Global metrics instance.
static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Process start mark for the uptime gauge. Set once, never moved.
static PROCESS_START: OnceLock<Instant> = OnceLock::new();

/// Hail metrics registry.
#[derive(Debug)]
pub struct Metrics {
    /// Total number of inbound RPC requests.
    pub rpc_requests_total: Counter<u64>,
    /// Histogram of RPC handling latency in seconds.
    pub rpc_latency_seconds: Histogram<f64>,
    /// Seconds since process start, recomputed on every collection tick.
    _uptime: ObservableGauge<u64>,
}

impl Metrics {
    /// Create a new metrics registry from a meter.
    fn new(meter: &Meter) -> Self {
        Self {
            rpc_requests_total: meter
                .u64_counter("hail_rpc_requests_total")
                .with_description("Total number of inbound RPC requests")
                .with_unit("1")
                .init(),
            rpc_latency_seconds: meter
                .f64_histogram("hail_rpc_latency_seconds")
                .with_description("RPC handling latency from receive to reply")
                .with_unit("s")
                .init(),
            _uptime: meter
                .u64_observable_gauge("application.uptime")
                .with_description("Seconds since process start")
                .with_unit("s")
                .with_callback(|observer| observer.observe(uptime_seconds(), &[]))
                .init(),
        }
    }
}

/// Whole seconds since the process start mark.
///
/// Monotonic non-decreasing for the life of the process; resets only on
/// process restart. Returns 0 before metrics initialization.
pub fn uptime_seconds() -> u64 {
    PROCESS_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Initialize the metrics pipeline.
///
/// With an OTLP endpoint the meter provider pushes on a periodic reader;
/// without one a manual reader is installed so instruments record but
/// nothing is exported (the Prometheus registry covers pull export).
/// Instrument creation is idempotent across repeated calls.
pub(crate) fn init(config: &ExporterConfig, resource: Resource) -> SdkMeterProvider {
    PROCESS_START.get_or_init(Instant::now);

    let provider = match config.otlp_endpoint.as_deref() {
        Some(endpoint) => {
            use opentelemetry_otlp::{Protocol, WithExportConfig};

            let exporter = opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint)
                .with_protocol(Protocol::Grpc);

            match opentelemetry_otlp::new_pipeline()
                .metrics(opentelemetry_sdk::runtime::Tokio)
                .with_exporter(exporter)
                .with_resource(resource.clone())
                .with_period(Duration::from_secs(10))
                .build()
            {
                Ok(provider) => {
                    tracing::info!(endpoint, "OTLP metrics exporter configured");
                    provider
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to create OTLP exporter, using no-op metrics");
                    manual_reader_provider(resource)
                }
            }
        }
        None => manual_reader_provider(resource),
    };

    global::set_meter_provider(provider.clone());

    let meter = global::meter("hail");
    METRICS.get_or_init(|| Metrics::new(&meter));

    provider
}

fn manual_reader_provider(resource: Resource) -> SdkMeterProvider {
    let reader = ManualReader::builder().build();
    SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(resource)
        .build()
}

/// Record a handled RPC.
pub fn record_rpc(method: &str, status: &'static str, latency_seconds: f64) {
    if let Some(m) = METRICS.get() {
        let attrs = [
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status),
        ];
        m.rpc_requests_total.add(1, &attrs);
        m.rpc_latency_seconds.record(latency_seconds, &attrs);
    }
}
