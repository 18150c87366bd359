//! # capstone
//!
//! Shared foundation for the capstone API server and worker processes.
//!
//! Provides environment-driven configuration, a Postgres connector with a
//! liveness check, a file-based migration runner, the fail-fast startup
//! sequence, and tracing/OpenTelemetry setup.

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod error;
pub mod telemetry;
pub mod worker;
