//! Worker process: configuration and startup.
//!
//! The worker has no settings of its own yet and no task loop; it loads
//! the shared config, reports its environment, and exits.

use crate::bootstrap::{Bootstrap, Stage};
use crate::config::{CommonConfig, load_section};
use crate::error::Result;
use std::collections::HashMap;
use tracing::info;

/// Service name reported in logs and telemetry.
pub const SERVICE_NAME: &str = "capstone-worker";

#[derive(Debug)]
pub struct WorkerConfig {
    pub common: CommonConfig,
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            common: load_section(None)?,
        })
    }

    /// Load configuration from an explicit variable map.
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self> {
        Ok(Self {
            common: load_section(Some(vars))?,
        })
    }
}

/// Load the worker configuration from the process environment.
pub fn load_config() -> Result<WorkerConfig> {
    WorkerConfig::from_env()
}

/// Run the worker startup sequence.
pub fn run(config: &WorkerConfig) {
    let mut bootstrap = Bootstrap::configured(SERVICE_NAME);
    info!(
        environment = %config.common.environment,
        "starting worker in {} environment",
        config.common.environment
    );
    bootstrap.advance(Stage::Terminated);
}
