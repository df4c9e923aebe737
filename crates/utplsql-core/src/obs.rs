//! Structured observability hooks for the run lifecycle.
//!
//! This module provides:
//! - A run-scoped tracing span via [`run_span`]
//! - Emission functions for key lifecycle events: start, state change,
//!   reporter drain, session release, finish
//!
//! Events are emitted at `info!` level unless they describe a failure.

use std::path::Path;

use tracing::{error, info, warn};

use crate::coordinator::RunState;

/// Span tagging every event of one run with its run_id.
///
/// Attach it to the run future with `tracing::Instrument` so the span is
/// entered on every poll instead of being held across await points.
///
/// # Example
///
/// ```ignore
/// drive(session).instrument(run_span("5b0c...")).await;
/// ```
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("utplsql.run", run_id = %run_id)
}

/// Emit event: run started with the number of requested reporters.
pub fn emit_run_started(run_id: &str, reporters: usize) {
    info!(event = "run.started", run_id = %run_id, reporters = reporters);
}

/// Emit event: coordinator moved between lifecycle states.
pub fn emit_state_changed(from: RunState, to: RunState) {
    info!(event = "run.state", from = %from, to = %to);
}

/// Emit event: run finished.
pub fn emit_run_finished(run_id: &str, duration_ms: u64, outcome: &str, drain_errors: usize) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        outcome = %outcome,
        drain_errors = drain_errors,
    );
}

/// Emit event: report content started flowing to a file.
pub fn emit_file_sink_opened(reporter: &str, path: &Path) {
    info!("Writing report {} to {}.", reporter, path.display());
}

/// Emit event: report content started flowing to the console.
pub fn emit_console_sink_opened(reporter: &str) {
    info!("Writing report {} to Console.", reporter);
}

/// Emit event: one reporter fully drained.
pub fn emit_reporter_drained(reporter: &str, lines: usize, sinks: usize) {
    info!(event = "reporter.drained", reporter = %reporter, lines = lines, sinks = sinks);
}

/// Emit event: one reporter failed to drain (error level, run continues).
pub fn emit_reporter_drain_failed(reporter: &str, error: &dyn std::fmt::Display) {
    error!(event = "reporter.drain_failed", reporter = %reporter, error = %error);
}

/// Emit event: releasing the session failed (warning level).
pub fn emit_session_close_failed(error: &dyn std::fmt::Display) {
    warn!(event = "session.close_failed", error = %error);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_span_create() {
        let span = run_span("test-run-id");
        let _entered = span.enter();
        emit_state_changed(RunState::Idle, RunState::Connected);
    }
}
