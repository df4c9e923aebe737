//! Session trait definitions for the utPLSQL runner
//!
//! These traits define the remote collaborators the runner consumes:
//! - `DatabaseSession`: framework version, reporter factory, suite execution,
//!   reporter output retrieval, release
//! - `SessionConnector`: acquisition of a single session
//!
//! All traits are async and driver-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Result type for session operations
pub type SessionResult<T> = std::result::Result<T, SessionError>;

// ---------------------------------------------------------------------------
// FrameworkVersion
// ---------------------------------------------------------------------------

/// Version of the utPLSQL framework installed on the server.
///
/// Parsed from strings such as `v3.1.10.3349` or `3.0.4`. Missing minor and
/// patch components read as zero; the build number is optional. Ordering is
/// lexicographic over `(major, minor, patch, build)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FrameworkVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub build: Option<u32>,
}

impl FrameworkVersion {
    /// First release whose reporters expose their own output cursor.
    pub const V3_1_0: FrameworkVersion = FrameworkVersion::new(3, 1, 0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            build: None,
        }
    }

    pub const fn with_build(mut self, build: u32) -> Self {
        self.build = Some(build);
        self
    }

    /// Compare ignoring the build number.
    pub fn is_at_least(&self, other: &FrameworkVersion) -> bool {
        (self.major, self.minor, self.patch) >= (other.major, other.minor, other.patch)
    }
}

impl FromStr for FrameworkVersion {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SessionError::InvalidVersion(s.to_string());

        let trimmed = s.trim().trim_start_matches(['v', 'V']);
        let numeric: &str = trimmed
            .split(|c: char| !(c.is_ascii_digit() || c == '.'))
            .next()
            .unwrap_or_default();

        let mut parts = numeric.split('.');
        let mut next_part = |required: bool| -> Result<Option<u32>, SessionError> {
            match parts.next() {
                Some(p) if !p.is_empty() => p.parse().map(Some).map_err(|_| invalid()),
                Some(_) => Err(invalid()),
                None if required => Err(invalid()),
                None => Ok(None),
            }
        };

        let major = next_part(true)?.ok_or_else(invalid)?;
        let minor = next_part(false)?.unwrap_or(0);
        let patch = next_part(false)?.unwrap_or(0);
        let build = next_part(false)?;
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self {
            major,
            minor,
            patch,
            build,
        })
    }
}

impl fmt::Display for FrameworkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(build) = self.build {
            write!(f, ".{}", build)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Reporters
// ---------------------------------------------------------------------------

/// Server-side identifier of a bound reporter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReporterId(pub String);

impl ReporterId {
    /// Generate a new random id (upper-case hex, like the server's raw GUIDs)
    pub fn new() -> Self {
        ReporterId(uuid::Uuid::new_v4().simple().to_string().to_uppercase())
    }
}

impl Default for ReporterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReporterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A report generator produced by the remote factory.
///
/// Created unbound; `DatabaseSession::init_reporter` binds it to the session
/// and assigns its server-side id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reporter {
    pub type_name: String,
    pub id: Option<ReporterId>,
}

impl Reporter {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            id: None,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.id.is_some()
    }
}

/// How a reporter's buffered output is read back from the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputChannel {
    /// Reporter's own output cursor (framework 3.1.0 and later)
    ReporterCursor,
    /// Shared output-buffer table keyed by reporter id (pre-3.1.0)
    LegacyBuffer,
}

// ---------------------------------------------------------------------------
// Suite execution
// ---------------------------------------------------------------------------

/// One override entry: files matching `custom_mapping` get `object_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMapping {
    pub custom_mapping: String,
    pub object_type: String,
}

/// File-to-object mapping handed to suite execution for one role.
///
/// Absent fields stay `None`: the server applies its own defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingOptions {
    /// Project-root-relative paths, in scan order
    pub file_paths: Vec<String>,
    pub object_owner: Option<String>,
    pub regex_pattern: Option<String>,
    /// 1-based capture group indices
    pub owner_subexpression: Option<u32>,
    pub name_subexpression: Option<u32>,
    pub type_subexpression: Option<u32>,
    pub type_mappings: Vec<TypeMapping>,
}

impl MappingOptions {
    pub fn with_files(file_paths: Vec<String>) -> Self {
        Self {
            file_paths,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.file_paths.is_empty()
    }
}

/// Everything a single suite execution needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteRequest {
    /// Suite paths; empty means the server default (current schema)
    pub paths: Vec<String>,
    pub reporters: Vec<Reporter>,
    pub source_mapping: MappingOptions,
    pub test_mapping: MappingOptions,
    pub tags: Vec<String>,
    pub include_object: Option<String>,
    pub exclude_object: Option<String>,
    pub random_test_order: bool,
    pub random_test_order_seed: Option<u32>,
    pub skip_compatibility_check: bool,
    pub color_console: bool,
    pub fail_on_errors: bool,
}

/// Outcome of a suite execution that reached the end of the run.
///
/// Infrastructure failures are reported as `Err(SessionError)` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuiteVerdict {
    Passed,
    SomeTestsFailed { message: String },
}

// ---------------------------------------------------------------------------
// DatabaseSession
// ---------------------------------------------------------------------------

/// One open database session.
///
/// Guarantees:
/// - Every call after `close` fails with `SessionError::Closed`.
/// - `create_reporter` is the remote factory; it never binds.
/// - `run_suite` blocks until the suite finishes; individual test failures
///   surface as `SuiteVerdict::SomeTestsFailed`, not as an error.
#[async_trait]
pub trait DatabaseSession: Send + Sync {
    /// Version of the installed utPLSQL framework.
    async fn framework_version(&self) -> SessionResult<FrameworkVersion>;

    /// Create an unbound reporter of the given type.
    async fn create_reporter(&self, type_name: &str) -> SessionResult<Reporter>;

    /// Bind a reporter to this session.
    async fn init_reporter(&self, reporter: &mut Reporter) -> SessionResult<()>;

    /// Execute the suite once.
    async fn run_suite(&self, request: &SuiteRequest) -> SessionResult<SuiteVerdict>;

    /// Read every line the reporter has produced so far.
    async fn fetch_output(
        &self,
        reporter: &Reporter,
        channel: OutputChannel,
    ) -> SessionResult<Vec<String>>;

    /// Whether the session is still usable.
    fn is_open(&self) -> bool;

    /// Release the session.
    async fn close(&self) -> SessionResult<()>;
}

/// Acquires database sessions.
#[async_trait]
pub trait SessionConnector: Send + Sync {
    async fn connect(&self) -> SessionResult<Box<dyn DatabaseSession>>;
}
