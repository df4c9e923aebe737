//! In-memory fakes for session traits (testing only)
//!
//! Provides `MemorySession` and `MemoryConnector`, which satisfy the trait
//! contracts without a database. Behaviour is scripted up front and every
//! call is recorded in a `SessionJournal` that stays readable after the
//! session has been handed to the code under test.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use crate::error::SessionError;
use crate::session_traits::*;

// ---------------------------------------------------------------------------
// Scripting
// ---------------------------------------------------------------------------

/// What `run_suite` does when called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedRun {
    Pass,
    SomeTestsFailed(String),
    /// Remote call fails, session stays open
    Error(String),
    /// Remote call fails and the session is lost
    ConnectionLost(String),
    /// Remote call reports a dropped connection but `is_open` still holds
    ConnectionDropped(String),
}

/// Every call observed by a `MemorySession`.
#[derive(Debug, Clone, Default)]
pub struct SessionJournal {
    pub version_queries: usize,
    pub created_reporters: Vec<String>,
    pub bound_reporters: Vec<String>,
    pub suite_requests: Vec<SuiteRequest>,
    pub fetches: Vec<(String, OutputChannel)>,
    pub close_calls: usize,
}

#[derive(Debug)]
struct SessionState {
    version: FrameworkVersion,
    known_reporters: Option<HashSet<String>>,
    outputs: HashMap<String, Vec<String>>,
    failing_binds: HashSet<String>,
    failing_fetches: HashSet<String>,
    run: ScriptedRun,
    fail_close: bool,
}

#[derive(Debug)]
struct Inner {
    state: Mutex<SessionState>,
    journal: Mutex<SessionJournal>,
    open: AtomicBool,
}

// ---------------------------------------------------------------------------
// MemorySession
// ---------------------------------------------------------------------------

/// In-memory session. Clones share state, so a test can keep one clone for
/// inspection while another is boxed into the runner.
#[derive(Debug, Clone)]
pub struct MemorySession {
    inner: Arc<Inner>,
}

impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySession {
    /// Open session on framework 3.1.10 that accepts any reporter type and
    /// reports a passing suite.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(SessionState {
                    version: FrameworkVersion::new(3, 1, 10),
                    known_reporters: None,
                    outputs: HashMap::new(),
                    failing_binds: HashSet::new(),
                    failing_fetches: HashSet::new(),
                    run: ScriptedRun::Pass,
                    fail_close: false,
                }),
                journal: Mutex::new(SessionJournal::default()),
                open: AtomicBool::new(true),
            }),
        }
    }

    pub fn with_version(self, version: FrameworkVersion) -> Self {
        self.state().version = version;
        self
    }

    /// Restrict the factory to the given reporter types.
    pub fn with_known_reporters<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state().known_reporters = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Lines every reporter of `type_name` produces.
    pub fn with_output<I, S>(self, type_name: &str, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state().outputs.insert(
            type_name.to_string(),
            lines.into_iter().map(Into::into).collect(),
        );
        self
    }

    pub fn with_run(self, run: ScriptedRun) -> Self {
        self.state().run = run;
        self
    }

    pub fn failing_bind(self, type_name: &str) -> Self {
        self.state().failing_binds.insert(type_name.to_string());
        self
    }

    pub fn failing_fetch(self, type_name: &str) -> Self {
        self.state().failing_fetches.insert(type_name.to_string());
        self
    }

    pub fn failing_close(self) -> Self {
        self.state().fail_close = true;
        self
    }

    /// Snapshot of all calls seen so far.
    pub fn journal(&self) -> SessionJournal {
        self.journal_mut().clone()
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner.state.lock().unwrap()
    }

    fn journal_mut(&self) -> MutexGuard<'_, SessionJournal> {
        self.inner.journal.lock().unwrap()
    }

    fn ensure_open(&self) -> SessionResult<()> {
        if self.inner.open.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SessionError::Closed)
        }
    }
}

#[async_trait]
impl DatabaseSession for MemorySession {
    async fn framework_version(&self) -> SessionResult<FrameworkVersion> {
        self.ensure_open()?;
        self.journal_mut().version_queries += 1;
        Ok(self.state().version)
    }

    async fn create_reporter(&self, type_name: &str) -> SessionResult<Reporter> {
        self.ensure_open()?;
        let known = match &self.state().known_reporters {
            Some(known) => known.contains(type_name),
            None => true,
        };
        if !known {
            return Err(SessionError::UnknownReporter(type_name.to_string()));
        }
        self.journal_mut()
            .created_reporters
            .push(type_name.to_string());
        Ok(Reporter::new(type_name))
    }

    async fn init_reporter(&self, reporter: &mut Reporter) -> SessionResult<()> {
        self.ensure_open()?;
        if self.state().failing_binds.contains(&reporter.type_name) {
            return Err(SessionError::Bind {
                type_name: reporter.type_name.clone(),
                reason: "scripted bind failure".to_string(),
            });
        }
        reporter.id = Some(ReporterId::new());
        self.journal_mut()
            .bound_reporters
            .push(reporter.type_name.clone());
        Ok(())
    }

    async fn run_suite(&self, request: &SuiteRequest) -> SessionResult<SuiteVerdict> {
        self.ensure_open()?;
        self.journal_mut().suite_requests.push(request.clone());
        let run = self.state().run.clone();
        debug!(?run, "fake suite execution");
        match run {
            ScriptedRun::Pass => Ok(SuiteVerdict::Passed),
            ScriptedRun::SomeTestsFailed(message) => Ok(SuiteVerdict::SomeTestsFailed { message }),
            ScriptedRun::Error(reason) => Err(SessionError::Query(reason)),
            ScriptedRun::ConnectionLost(reason) => {
                self.inner.open.store(false, Ordering::SeqCst);
                Err(SessionError::Connection(reason))
            }
            ScriptedRun::ConnectionDropped(reason) => Err(SessionError::Connection(reason)),
        }
    }

    async fn fetch_output(
        &self,
        reporter: &Reporter,
        channel: OutputChannel,
    ) -> SessionResult<Vec<String>> {
        self.ensure_open()?;
        if !reporter.is_bound() {
            return Err(SessionError::Query(format!(
                "reporter {} is not bound",
                reporter.type_name
            )));
        }
        self.journal_mut()
            .fetches
            .push((reporter.type_name.clone(), channel));
        let state = self.state();
        if state.failing_fetches.contains(&reporter.type_name) {
            return Err(SessionError::Query(format!(
                "scripted fetch failure for {}",
                reporter.type_name
            )));
        }
        Ok(state
            .outputs
            .get(&reporter.type_name)
            .cloned()
            .unwrap_or_default())
    }

    fn is_open(&self) -> bool {
        self.inner.open.load(Ordering::SeqCst)
    }

    async fn close(&self) -> SessionResult<()> {
        self.journal_mut().close_calls += 1;
        // swap reports whether this call is the one that released it
        if !self.inner.open.swap(false, Ordering::SeqCst) {
            return Err(SessionError::Closed);
        }
        if self.state().fail_close {
            return Err(SessionError::Connection("scripted close failure".to_string()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryConnector
// ---------------------------------------------------------------------------

/// Connector that hands out clones of one `MemorySession`, or always fails.
#[derive(Debug)]
pub struct MemoryConnector {
    session: Option<MemorySession>,
    failure: Option<String>,
    connects: AtomicUsize,
}

impl MemoryConnector {
    pub fn new(session: MemorySession) -> Self {
        Self {
            session: Some(session),
            failure: None,
            connects: AtomicUsize::new(0),
        }
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            session: None,
            failure: Some(reason.into()),
            connects: AtomicUsize::new(0),
        }
    }

    /// Number of `connect` calls so far.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionConnector for MemoryConnector {
    async fn connect(&self) -> SessionResult<Box<dyn DatabaseSession>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match (&self.session, &self.failure) {
            (Some(session), None) => Ok(Box::new(session.clone())),
            (_, Some(reason)) => Err(SessionError::Connection(reason.clone())),
            (None, None) => Err(SessionError::Connection("no session configured".to_string())),
        }
    }
}
