//! capstone-worker — background worker entrypoint.

use capstone::bootstrap::{StartupError, Step};
use capstone::telemetry::init_telemetry;
use capstone::worker::{self, SERVICE_NAME};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let config = match worker::load_config() {
        Ok(config) => config,
        Err(e) => return StartupError::new(Step::LoadConfig, e).report(),
    };

    let _guard = match init_telemetry(config.common.telemetry(SERVICE_NAME)) {
        Ok(guard) => guard,
        Err(e) => return StartupError::new(Step::InitTelemetry, e).report(),
    };

    worker::run(&config);
    ExitCode::SUCCESS
}
