//! Tracing and logging pipeline setup.
//!
//! Configures:
//! - Console logging with structured format (text or JSON)
//! - W3C Trace Context propagation
//! - Optional OTLP span export with environment-dependent sampling
//! - Optional OTLP log export bridged from the tracing registry
//! - Span-path exclusion for health and scrape endpoints

use anyhow::Result;
use opentelemetry::global;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{Protocol, WithExportConfig};
use opentelemetry_sdk::logs::LoggerProvider;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{self as sdktrace, Sampler};
use opentelemetry_sdk::{runtime, Resource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Environment, ExporterConfig};

/// Install the tracing subscriber and, when an OTLP endpoint is configured,
/// the span and log export pipelines.
///
/// Returns the providers whose shutdown flushes buffered telemetry. Both are
/// `None` when push export is disabled; logging still works either way.
pub(super) fn init_pipelines(
    config: &ExporterConfig,
    log_level: &str,
    log_format: &str,
    resource: Resource,
) -> Result<(Option<sdktrace::TracerProvider>, Option<LoggerProvider>)> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    global::set_text_map_propagator(TraceContextPropagator::new());

    let mut tracer_provider = None;
    let mut logger_provider = None;
    let mut otel_span_layer = None;
    let mut otel_log_layer = None;

    if let Some(endpoint) = config.otlp_endpoint.as_deref() {
        let span_exporter = opentelemetry_otlp::new_exporter()
            .tonic()
            .with_endpoint(endpoint)
            .with_protocol(Protocol::Grpc)
            .build_span_exporter()?;

        let mut trace_config = sdktrace::Config::default().with_resource(resource.clone());
        if let Some(sampler) = sampler_override(config.environment) {
            trace_config = trace_config.with_sampler(sampler);
        }

        let provider = sdktrace::TracerProvider::builder()
            .with_batch_exporter(span_exporter, runtime::Tokio)
            .with_config(trace_config)
            .build();
        let tracer = provider.tracer("hail");
        global::set_tracer_provider(provider.clone());
        otel_span_layer = Some(tracing_opentelemetry::layer().with_tracer(tracer));
        tracer_provider = Some(provider);

        let log_exporter = opentelemetry_otlp::new_exporter()
            .tonic()
            .with_endpoint(endpoint)
            .with_protocol(Protocol::Grpc)
            .build_log_exporter()?;

        let provider = LoggerProvider::builder()
            .with_resource(resource)
            .with_batch_exporter(log_exporter, runtime::Tokio)
            .build();
        otel_log_layer = Some(OpenTelemetryTracingBridge::new(&provider));
        logger_provider = Some(provider);
    }

    match log_format {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(otel_span_layer)
                .with(otel_log_layer)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true);

            tracing_subscriber::registry()
                .with(filter)
                .with(otel_span_layer)
                .with(otel_log_layer)
                .with(fmt_layer)
                .init();
        }
    }

    tracing::info!(
        environment = %config.environment,
        otlp = config.otlp_enabled(),
        "Tracing initialized"
    );

    Ok((tracer_provider, logger_provider))
}

/// Sampling override for the trace pipeline.
///
/// Development samples everything; other environments keep the SDK default
/// sampler, which stays parent-based and ratio-configurable through the
/// standard OTEL environment variables.
pub fn sampler_override(environment: Environment) -> Option<Sampler> {
    match environment {
        Environment::Development => Some(Sampler::AlwaysOn),
        Environment::Staging | Environment::Production => None,
    }
}

/// Span-creation filter for inbound request paths.
///
/// Outside production, liveness probes and metric scrapers poll continuously;
/// spans for those paths are suppressed so traces carry only real traffic.
/// Prefix matching is case-insensitive.
#[derive(Debug, Clone)]
pub struct TracePathFilter {
    excluded_prefixes: Vec<String>,
}

impl TracePathFilter {
    /// Build the filter from the configuration snapshot.
    pub fn from_config(config: &ExporterConfig) -> Self {
        let excluded_prefixes = if config.environment == Environment::Production {
            Vec::new()
        } else {
            vec![
                "/health".to_string(),
                "/alive".to_string(),
                config.scrape_path.to_ascii_lowercase(),
            ]
        };
        Self { excluded_prefixes }
    }

    /// Whether a span should be created for the given request path.
    pub fn should_trace(&self, path: &str) -> bool {
        let path = path.to_ascii_lowercase();
        !self
            .excluded_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Span for an inbound request, disabled for excluded paths.
    pub fn request_span(&self, method: &str, path: &str) -> tracing::Span {
        if self.should_trace(path) {
            tracing::info_span!("request", %method, %path)
        } else {
            tracing::Span::none()
        }
    }
}

/// Initialize tracing for tests (only logs errors).
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("error")
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(environment: Environment) -> ExporterConfig {
        ExporterConfig {
            otlp_endpoint: None,
            prometheus_enabled: true,
            scrape_path: "/metrics".into(),
            environment,
        }
    }

    #[test]
    fn test_development_sampler_is_always_on() {
        assert!(matches!(
            sampler_override(Environment::Development),
            Some(Sampler::AlwaysOn)
        ));
    }

    #[test]
    fn test_other_environments_keep_default_sampler() {
        assert!(sampler_override(Environment::Staging).is_none());
        assert!(sampler_override(Environment::Production).is_none());
    }

    #[test]
    fn test_staging_excludes_probe_paths() {
        let filter = TracePathFilter::from_config(&snapshot(Environment::Staging));
        assert!(!filter.should_trace("/alive"));
        assert!(!filter.should_trace("/health"));
        assert!(!filter.should_trace("/health/ready"));
        assert!(!filter.should_trace("/metrics"));
        assert!(filter.should_trace("/sayhello"));
        assert!(filter.should_trace("/hail.v1.Greeter/SayHello"));
    }

    #[test]
    fn test_exclusion_is_case_insensitive() {
        let filter = TracePathFilter::from_config(&snapshot(Environment::Development));
        assert!(!filter.should_trace("/HEALTH"));
        assert!(!filter.should_trace("/Alive"));
        assert!(!filter.should_trace("/Metrics"));
    }

    #[test]
    fn test_production_traces_everything() {
        let filter = TracePathFilter::from_config(&snapshot(Environment::Production));
        assert!(filter.should_trace("/health"));
        assert!(filter.should_trace("/alive"));
        assert!(filter.should_trace("/metrics"));
        assert!(filter.should_trace("/sayhello"));
    }

    #[test]
    fn test_custom_scrape_path_is_excluded() {
        let config = ExporterConfig {
            scrape_path: "/custom-metrics".into(),
            ..snapshot(Environment::Staging)
        };
        let filter = TracePathFilter::from_config(&config);
        assert!(!filter.should_trace("/custom-metrics"));
        assert!(filter.should_trace("/metrics"));
    }

    #[test]
    fn test_excluded_paths_get_disabled_spans() {
        let filter = TracePathFilter::from_config(&snapshot(Environment::Staging));
        assert!(filter.request_span("GET", "/alive").is_disabled());
        assert!(filter.request_span("GET", "/health").is_disabled());
    }
}
