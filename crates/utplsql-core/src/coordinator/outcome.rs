use chrono::{DateTime, Utc};
use utplsql_session::{FrameworkVersion, SessionError};

use super::RunState;
use crate::error::{DrainError, RunError, RunFailure};
use crate::reporter::DrainSummary;

/// Primary result of a run, before failure tolerance is applied.
#[derive(Debug)]
pub enum RunOutcome {
    Passed,
    /// The suite ran and some tests failed
    TestsFailed { message: String },
    /// Connection, mapping, initialization or execution failure
    Failed(RunError),
}

impl RunOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Passed => "passed",
            RunOutcome::TestsFailed { .. } => "tests_failed",
            RunOutcome::Failed(_) => "failed",
        }
    }
}

/// Everything a finished run recorded.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: String,
    pub outcome: RunOutcome,
    pub ignore_failure: bool,
    pub version: Option<FrameworkVersion>,
    /// In reporter order
    pub drained: Vec<DrainSummary>,
    pub drain_errors: Vec<DrainError>,
    pub close_error: Option<SessionError>,
    pub states: Vec<RunState>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn final_state(&self) -> RunState {
        self.states.last().copied().unwrap_or(RunState::Idle)
    }

    /// Whether the caller should treat the run as successful.
    pub fn is_success(&self) -> bool {
        match self.outcome {
            RunOutcome::Passed => true,
            RunOutcome::TestsFailed { .. } => self.ignore_failure,
            RunOutcome::Failed(_) => false,
        }
    }

    /// Apply failure tolerance. A tolerated soft failure and a passing run
    /// are `Ok`; drain and close errors ride along as secondary information.
    pub fn into_result(self) -> Result<RunReport, RunFailure> {
        match self.outcome {
            RunOutcome::Failed(primary) => Err(RunFailure {
                primary,
                drain_errors: self.drain_errors,
                close_error: self.close_error,
            }),
            RunOutcome::TestsFailed { message } if !self.ignore_failure => Err(RunFailure {
                primary: RunError::TestsFailed { message },
                drain_errors: self.drain_errors,
                close_error: self.close_error,
            }),
            outcome => Ok(RunReport { outcome, ..self }),
        }
    }
}
