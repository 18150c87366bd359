//! Typed configuration from environment variables.
//!
//! Every process loads its config once at startup and fails fast if a value
//! is present but malformed. Unset variables fall back to their declared
//! defaults, so a loaded config is always fully populated.
//!
//! Process configs embed [`CommonConfig`] by value next to their own field
//! set (see `api::ApiConfig`, `worker::WorkerConfig`).

use crate::error::Result;
use crate::telemetry::TelemetryConfig;
use envconfig::Envconfig;
use std::collections::HashMap;

/// Settings shared by every process. Only truly shared values belong here.
#[derive(Debug, Clone, PartialEq, Eq, Envconfig)]
pub struct CommonConfig {
    /// Deployment stage label ("development", "staging", "production", ...).
    #[envconfig(from = "ENVIRONMENT", default = "development")]
    pub environment: String,

    /// Default tracing filter when `RUST_LOG` is unset.
    #[envconfig(from = "LOG_LEVEL", default = "info")]
    pub log_level: String,

    /// OTLP collector endpoint. Telemetry stays local when unset.
    #[envconfig(from = "OTEL_ENDPOINT")]
    pub otel_endpoint: Option<String>,
}

impl CommonConfig {
    /// Telemetry settings for a process reporting as `service_name`.
    pub fn telemetry(&self, service_name: &str) -> TelemetryConfig {
        TelemetryConfig {
            endpoint: self.otel_endpoint.clone(),
            service_name: service_name.to_string(),
            log_level: self.log_level.clone(),
        }
    }
}

/// Load one envconfig field set from the process environment, or from
/// `vars` when given.
pub(crate) fn load_section<T: Envconfig>(vars: Option<&HashMap<String, String>>) -> Result<T> {
    let section = match vars {
        Some(vars) => T::init_from_hashmap(vars)?,
        None => T::init_from_env()?,
    };
    Ok(section)
}
