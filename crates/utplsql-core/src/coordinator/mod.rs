//! Run coordination: one session, one suite execution, every reporter drained.
//!
//! The coordinator owns the session for the whole run and releases it exactly
//! once on every path that acquired it. Failures are recorded into the
//! [`RunReport`] instead of returned early, so the drain and close steps
//! always get their chance.

mod outcome;
mod state;

use std::future::Future;

use chrono::Utc;
use tracing::{debug, info, warn, Instrument};
use utplsql_session::{
    DatabaseSession, FrameworkVersion, SessionConnector, SessionError, SessionResult,
    SuiteRequest, SuiteVerdict,
};
use uuid::Uuid;

pub use outcome::{RunOutcome, RunReport};
pub use state::RunState;

use crate::config::RunConfig;
use crate::error::{DrainError, RunError};
use crate::mapping::RoleMappings;
use crate::obs;
use crate::reporter::{Console, DrainSummary, ReportRegistry, ReporterHandle, SinkWriter};

/// Drives a single run from connection to release.
#[derive(Debug, Clone)]
pub struct RunCoordinator {
    config: RunConfig,
    console: Console,
}

impl RunCoordinator {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            console: Console::Stdout,
        }
    }

    /// Console used for reporters with console output.
    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    /// Acquire one session from `connector` and run with it.
    pub async fn run(&self, connector: &dyn SessionConnector) -> RunReport {
        self.execute(connector.connect()).await
    }

    /// Run with a session the caller already opened. The session is closed
    /// before this returns.
    pub async fn run_with_session(&self, session: Box<dyn DatabaseSession>) -> RunReport {
        self.execute(async { Ok(session) }).await
    }

    async fn execute<F>(&self, acquire: F) -> RunReport
    where
        F: Future<Output = SessionResult<Box<dyn DatabaseSession>>>,
    {
        let run_id = Uuid::new_v4().to_string();
        let span = obs::run_span(&run_id);

        async move {
            let mut run = ActiveRun::begin(run_id, self.config.ignore_failure);
            obs::emit_run_started(&run.run_id, self.config.reporters.len().max(1));

            match acquire.await {
                Ok(session) => {
                    run.advance(RunState::Connected);
                    self.drive(&mut run, session.as_ref()).await;
                    if let Err(e) = session.close().await {
                        obs::emit_session_close_failed(&e);
                        run.close_error = Some(e);
                    }
                }
                Err(e) => run.fail(RunError::Session(e)),
            }

            run.finish()
        }
        .instrument(span)
        .await
    }

    async fn drive(&self, run: &mut ActiveRun, session: &dyn DatabaseSession) {
        match session.framework_version().await {
            Ok(version) => {
                info!("utPLSQL Version = {}", version);
                run.version = Some(version);
            }
            Err(e) => return run.fail(e.into()),
        }

        let mappings = match RoleMappings::resolve(
            &self.config.project_root,
            &self.config.sources,
            &self.config.tests,
        ) {
            Ok(mappings) => mappings,
            Err(e) => return run.fail(e),
        };
        run.advance(RunState::Mapped);

        let handles = match ReportRegistry::initialize(session, &self.config.reporters).await {
            Ok(handles) => handles,
            Err(e) => return run.fail(e),
        };
        run.advance(RunState::Reporting);

        let request = self.suite_request(&handles, mappings);
        log_parameters(&request);

        run.advance(RunState::Running);
        let mut connection_lost = false;
        match session.run_suite(&request).await {
            Ok(SuiteVerdict::Passed) => {}
            Ok(SuiteVerdict::SomeTestsFailed { message }) => {
                warn!(message = %message, "some tests failed");
                run.outcome = RunOutcome::TestsFailed { message };
            }
            Err(e) => {
                connection_lost = e.is_connection_loss();
                run.fail(RunError::Session(e));
            }
        }

        run.advance(RunState::Draining);
        if connection_lost || !session.is_open() {
            warn!("session lost during execution, reports cannot be drained");
            return;
        }
        let writer = SinkWriter::new(self.config.target_dir(), self.console.clone());
        for handle in &handles {
            match writer.write(session, handle).await {
                Ok(summary) => run.drained.push(summary),
                Err(e) => {
                    obs::emit_reporter_drain_failed(handle.name(), &e);
                    run.drain_errors.push(e);
                }
            }
        }
    }

    fn suite_request(&self, handles: &[ReporterHandle], mappings: RoleMappings) -> SuiteRequest {
        let config = &self.config;
        SuiteRequest {
            paths: config.paths.clone(),
            reporters: handles.iter().map(|h| h.reporter.clone()).collect(),
            source_mapping: mappings.source,
            test_mapping: mappings.test,
            tags: config.tag_filter(),
            include_object: non_blank(config.include_object.as_deref()),
            exclude_object: non_blank(config.exclude_object.as_deref()),
            random_test_order: config.random_test_order,
            random_test_order_seed: config.random_test_order_seed,
            skip_compatibility_check: config.skip_compatibility_check,
            color_console: config.color_console,
            fail_on_errors: !config.ignore_failure,
        }
    }
}

fn log_parameters(request: &SuiteRequest) {
    let reporters: Vec<&str> = request.reporters.iter().map(|r| r.type_name.as_str()).collect();
    debug!(reporters = ?reporters, "Invoking suite execution");
    debug!(files = ?request.source_mapping.file_paths, "Sources");
    debug!(files = ?request.test_mapping.file_paths, "Tests");
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}

/// Mutable record of a run in progress.
struct ActiveRun {
    run_id: String,
    ignore_failure: bool,
    state: RunState,
    states: Vec<RunState>,
    outcome: RunOutcome,
    version: Option<FrameworkVersion>,
    drained: Vec<DrainSummary>,
    drain_errors: Vec<DrainError>,
    close_error: Option<SessionError>,
    started_at: chrono::DateTime<Utc>,
}

impl ActiveRun {
    fn begin(run_id: String, ignore_failure: bool) -> Self {
        Self {
            run_id,
            ignore_failure,
            state: RunState::Idle,
            states: vec![RunState::Idle],
            outcome: RunOutcome::Passed,
            version: None,
            drained: Vec::new(),
            drain_errors: Vec::new(),
            close_error: None,
            started_at: Utc::now(),
        }
    }

    fn advance(&mut self, next: RunState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        obs::emit_state_changed(self.state, next);
        self.state = next;
        self.states.push(next);
    }

    /// Record a fatal error. The first one wins.
    fn fail(&mut self, error: RunError) {
        warn!(error = %error, state = %self.state, "run failed");
        if !matches!(self.outcome, RunOutcome::Failed(_)) {
            self.outcome = RunOutcome::Failed(error);
        }
    }

    fn finish(mut self) -> RunReport {
        let terminal = match self.outcome {
            RunOutcome::Failed(_) => RunState::Failed,
            _ => RunState::Closed,
        };
        self.advance(terminal);

        let finished_at = Utc::now();
        let duration_ms = (finished_at - self.started_at).num_milliseconds().max(0) as u64;
        obs::emit_run_finished(
            &self.run_id,
            duration_ms,
            self.outcome.label(),
            self.drain_errors.len(),
        );

        RunReport {
            run_id: self.run_id,
            outcome: self.outcome,
            ignore_failure: self.ignore_failure,
            version: self.version,
            drained: self.drained,
            drain_errors: self.drain_errors,
            close_error: self.close_error,
            states: self.states,
            started_at: self.started_at,
            finished_at,
        }
    }
}
