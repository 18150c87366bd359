//! Startup sequencing shared by the process entrypoints.
//!
//! A process moves `Init → Configured → (api: DbConnected → Migrated →
//! Serving) → Terminated`. Every step either succeeds or yields a
//! [`StartupError`] naming it. Only the binary's top-level handler turns
//! that error into a log line and a failing exit status.

use crate::error::Error;
use crate::telemetry::bootstrap::{record_stage_transition, start_bootstrap_span};
use crate::telemetry::metrics;
use opentelemetry::KeyValue;
use std::fmt;
use std::future::Future;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{Span, error};

/// Lifecycle state of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Configured,
    DbConnected,
    Migrated,
    Serving,
    Terminated,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::Configured => "configured",
            Stage::DbConnected => "db_connected",
            Stage::Migrated => "migrated",
            Stage::Serving => "serving",
            Stage::Terminated => "terminated",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of startup work that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    LoadConfig,
    InitTelemetry,
    ConnectDatabase,
    ResolveMigrationsPath,
    RunMigrations,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::LoadConfig => "load_config",
            Step::InitTelemetry => "init_telemetry",
            Step::ConnectDatabase => "connect_database",
            Step::ResolveMigrationsPath => "resolve_migrations_path",
            Step::RunMigrations => "run_migrations",
        }
    }

    /// Operator-facing description of what failed.
    pub fn failure(&self) -> &'static str {
        match self {
            Step::LoadConfig => "failed to load config",
            Step::InitTelemetry => "failed to initialize telemetry",
            Step::ConnectDatabase => "database connection failed",
            Step::ResolveMigrationsPath => "failed to get absolute path for migrations",
            Step::RunMigrations => "failed to run migrations",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal startup failure: the step that failed and why.
#[derive(Debug, thiserror::Error)]
#[error("{}: {source}", .step.failure())]
pub struct StartupError {
    pub step: Step,
    #[source]
    pub source: Error,
}

impl StartupError {
    pub fn new(step: Step, source: Error) -> Self {
        Self { step, source }
    }

    /// Adapter for `map_err`.
    pub fn at(step: Step) -> impl FnOnce(Error) -> Self {
        move |source| Self::new(step, source)
    }

    /// Log the failure and produce the process exit status.
    ///
    /// Before a subscriber is installed (config or telemetry failures) the
    /// message goes straight to stderr.
    pub fn report(&self) -> ExitCode {
        if tracing::dispatcher::has_been_set() {
            error!(step = %self.step, error = %self.source, "{}", self.step.failure());
        } else {
            eprintln!("{self}");
        }
        ExitCode::FAILURE
    }
}

/// Tracks a process through its stages inside one bootstrap span.
pub struct Bootstrap {
    process: &'static str,
    stage: Stage,
    span: Span,
}

impl Bootstrap {
    /// Begin tracking `process`, already past config loading.
    pub fn configured(process: &'static str) -> Self {
        let span = start_bootstrap_span(process);
        record_stage_transition(&span, Stage::Init.as_str(), Stage::Configured.as_str());
        Self {
            process,
            stage: Stage::Configured,
            span,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Move to `next`, recording the transition.
    pub fn advance(&mut self, next: Stage) {
        record_stage_transition(&self.span, self.stage.as_str(), next.as_str());
        self.stage = next;
    }

    /// Run one step, timing it and tagging any failure with `step`.
    pub async fn step<T, F>(&self, step: Step, fut: F) -> Result<T, StartupError>
    where
        F: Future<Output = crate::error::Result<T>>,
    {
        let start = Instant::now();
        let result = fut.await;
        metrics::startup_step_duration_ms().record(
            start.elapsed().as_secs_f64() * 1000.0,
            &[
                KeyValue::new("process", self.process),
                KeyValue::new("step", step.as_str()),
                KeyValue::new("result", if result.is_ok() { "ok" } else { "error" }),
            ],
        );
        result.map_err(StartupError::at(step))
    }
}
