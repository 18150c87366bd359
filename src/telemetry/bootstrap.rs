//! Bootstrap span helpers.
//!
//! One span covers a process's startup sequence; stage transitions are
//! recorded as events inside it.

use tracing::Span;

/// Start the span covering `process` startup.
///
/// The `bootstrap.stage` field is declared empty and updated by
/// [`record_stage_transition`].
pub fn start_bootstrap_span(process: &str) -> Span {
    tracing::info_span!(
        "bootstrap",
        "bootstrap.process" = process,
        "bootstrap.stage" = tracing::field::Empty,
    )
}

/// Record a stage transition on `span` and update its current stage.
pub fn record_stage_transition(span: &Span, from: &str, to: &str) {
    span.record("bootstrap.stage", to);
    span.in_scope(|| {
        tracing::info!(from = from, to = to, "stage_transition");
    });
}
