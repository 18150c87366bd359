//! Metric instrument factories for capstone.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! Without an OTLP endpoint the global provider is a no-op.

use opentelemetry::metrics::{Counter, Histogram, Meter};

fn meter() -> Meter {
    opentelemetry::global::meter("capstone")
}

/// Histogram: duration of each startup step in milliseconds.
/// Labels: `process`, `step`, `result` ("ok" | "error").
pub fn startup_step_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("capstone.startup.step_duration_ms")
        .with_description("Startup step duration in milliseconds")
        .with_unit("ms")
        .build()
}

/// Counter: database connection attempts.
/// Labels: `result` ("ok" | "error").
pub fn db_connections() -> Counter<u64> {
    meter()
        .u64_counter("capstone.db.connections")
        .with_description("Number of database connection attempts")
        .build()
}

/// Counter: schema migrations applied.
pub fn migrations_applied() -> Counter<u64> {
    meter()
        .u64_counter("capstone.db.migrations_applied")
        .with_description("Number of schema migrations applied")
        .build()
}
