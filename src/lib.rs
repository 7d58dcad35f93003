//! Hail: a gRPC greeter service scaffold with batteries-included observability.
//!
//! Hail wires configuration, structured logging, OpenTelemetry export and
//! health checks around a deliberately tiny demonstration RPC, so a new
//! service can start from working plumbing instead of rebuilding it.
//!
//! # Architecture
//!
//! - **gRPC-Native**: the Greeter contract is tonic/prost generated code
//! - **Observable**: OTLP push and Prometheus pull export, span-path filtering
//! - **Snapshot-Driven**: exporter decisions are pure functions of a read-only
//!   [`config::ExporterConfig`] built once at startup
//!
//! # Modules
//!
//! - [`config`]: CLI and environment configuration
//! - [`health`]: health-check registry for the ops endpoints
//! - [`observability`]: logging, metrics and tracing bootstrap
//! - [`proto`]: re-exported protobuf code
//! - [`server`]: gRPC server setup
//! - [`service`]: RPC handlers (the Greeter)

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions, // service::GreeterService is fine
    clippy::must_use_candidate,      // Not all functions need #[must_use]
    clippy::missing_errors_doc,      // Error docs can be verbose
    clippy::missing_panics_doc       // Panic docs can be verbose
)]

pub mod config;
pub mod health;
pub mod observability;
pub mod proto;
pub mod server;
pub mod service;

use uuid::Uuid;

/// Generate a new UUIDv7 (time-sortable) request ID.
///
/// Request IDs correlate log lines and span fields for a single RPC; the
/// time-sortable layout keeps them naturally ordered in log aggregators.
///
/// # Example
///
/// ```
/// let id = hail::generate_request_id();
/// assert_eq!(id.len(), 36); // UUID string format
/// ```
#[must_use]
pub fn generate_request_id() -> String {
    Uuid::now_v7().to_string()
}
