//! capstone-api — API server entrypoint.

use capstone::api::{self, SERVICE_NAME};
use capstone::bootstrap::{StartupError, Step};
use capstone::telemetry::init_telemetry;
use std::process::ExitCode;
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let config = match api::load_config() {
        Ok(config) => config,
        Err(e) => return StartupError::new(Step::LoadConfig, e).report(),
    };

    let _guard = match init_telemetry(config.common.telemetry(SERVICE_NAME)) {
        Ok(guard) => guard,
        Err(e) => return StartupError::new(Step::InitTelemetry, e).report(),
    };

    info!(
        environment = %config.common.environment,
        "starting API server in {} environment",
        config.common.environment
    );

    match api::run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => e.report(),
    }
}
