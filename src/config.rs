//! Configuration parsing for the Hail server.
//!
//! Supports:
//! - CLI arguments via clap
//! - Environment variable overrides
//! - Sensible defaults for quick start
//!
//! Telemetry-related inputs are folded into an [`ExporterConfig`] snapshot
//! once at startup; everything downstream branches on that snapshot instead
//! of re-reading ambient environment state.

use clap::Parser;

/// Hail: a gRPC greeter service scaffold with batteries-included observability.
#[derive(Parser, Debug, Clone)]
#[command(name = "hail")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Host address to bind to
    #[arg(long, env = "HAIL_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port for the gRPC server
    #[arg(short, long, env = "HAIL_PORT", default_value_t = 50051)]
    pub port: u16,

    /// Port for the HTTP ops server (health checks, metrics scrape)
    #[arg(long, env = "HAIL_HTTP_PORT", default_value_t = 50052)]
    pub http_port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log output format (text, json); anything else falls back to text
    #[arg(long, env = "HAIL_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// OpenTelemetry collector endpoint for push export (optional)
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otel_endpoint: Option<String>,

    /// Enable the Prometheus scrape endpoint on the ops server
    #[arg(long, env = "HAIL_PROMETHEUS_ENABLED", value_parser = parse_flag)]
    pub prometheus_enabled: bool,

    /// Path of the Prometheus scrape endpoint
    #[arg(long, env = "HAIL_METRICS_PATH", default_value = "/metrics")]
    pub metrics_path: String,

    /// Deployment environment (development, staging, production)
    #[arg(long, env = "HAIL_ENVIRONMENT", value_parser = parse_environment, default_value = "production")]
    pub environment: Environment,
}

/// Deployment environment, as reported by the hosting platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse an environment name, case-insensitively.
    ///
    /// Unrecognized values degrade to `Production`, the branch set with no
    /// always-on sampling and no span-path exclusions.
    pub fn parse_lenient(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Self::Development,
            "staging" => Self::Staging,
            _ => Self::Production,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Staging => write!(f, "staging"),
            Self::Production => write!(f, "production"),
        }
    }
}

fn parse_environment(s: &str) -> Result<Environment, std::convert::Infallible> {
    Ok(Environment::parse_lenient(s))
}

/// Parse a boolean flag leniently: `1`/`true`/`yes`/`on` (any case) enable,
/// anything else disables. Malformed input never aborts startup.
fn parse_flag(s: &str) -> Result<bool, std::convert::Infallible> {
    Ok(matches!(
        s.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    ))
}

/// Read-only telemetry configuration snapshot, derived once at startup.
///
/// Exporter attachment decisions are pure functions of these four fields;
/// the snapshot is never mutated for the life of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterConfig {
    /// OTLP collector endpoint; present means push export for logs, metrics
    /// and traces is enabled, all targeting this endpoint.
    pub otlp_endpoint: Option<String>,
    /// Whether the pull-based Prometheus scrape endpoint is exposed.
    pub prometheus_enabled: bool,
    /// Path of the scrape endpoint, normalized to a leading `/`.
    pub scrape_path: String,
    /// Deployment environment driving sampling and span-path filtering.
    pub environment: Environment,
}

impl ExporterConfig {
    /// True when OTLP push exporters (logs, metrics, traces) are attached.
    pub fn otlp_enabled(&self) -> bool {
        self.otlp_endpoint.is_some()
    }

    /// True when the metrics pipeline carries at least one export path.
    pub fn metrics_enabled(&self) -> bool {
        self.otlp_enabled() || self.prometheus_enabled
    }
}

impl Config {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Build the telemetry snapshot from the parsed configuration.
    pub fn exporter_config(&self) -> ExporterConfig {
        ExporterConfig {
            otlp_endpoint: self
                .otel_endpoint
                .clone()
                .filter(|endpoint| !endpoint.is_empty()),
            prometheus_enabled: self.prometheus_enabled,
            scrape_path: normalize_scrape_path(&self.metrics_path),
            environment: self.environment,
        }
    }

}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 50051,
            http_port: 50052,
            log_level: "info".into(),
            log_format: "text".into(),
            otel_endpoint: None,
            prometheus_enabled: false,
            metrics_path: "/metrics".into(),
            environment: Environment::Production,
        }
    }
}

/// Normalize the scrape path: leading `/`, empty falls back to `/metrics`.
fn normalize_scrape_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return "/metrics".to_string();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
