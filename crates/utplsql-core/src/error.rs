//! Error taxonomy for the utPLSQL runner.

use std::fmt;
use std::path::PathBuf;

use utplsql_session::SessionError;

use crate::mapping::Role;

/// Errors produced while turning one role's mapping configuration into
/// `MappingOptions`.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("Invalid <directory> {directory} in resource")]
    InvalidDirectory { directory: String },

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("failed to scan {path}: {reason}")]
    Scan { path: String, reason: String },

    #[error("{field} is a 1-based capture group index and cannot be 0")]
    InvalidSubexpression { field: &'static str },

    #[error("custom type mapping #{index} has a blank {field}")]
    MalformedTypeMapping { index: usize, field: &'static str },
}

/// Run-level errors.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Configuration error in one mapping role.
    #[error("Invalid <{role}> mapping configuration: {source}")]
    Mapping {
        role: Role,
        #[source]
        source: MappingError,
    },

    /// Configuration file could not be read or parsed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A requested reporter could not be created or bound.
    #[error("Failed to initialize reporter {name}: {source}")]
    ReporterInit {
        name: String,
        #[source]
        source: SessionError,
    },

    /// The suite ran and one or more tests failed.
    #[error("{message}")]
    TestsFailed { message: String },

    /// Session acquisition, loss, or a failed remote call.
    #[error("Database session error: {0}")]
    Session(#[from] SessionError),
}

impl RunError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, RunError::Mapping { .. } | RunError::InvalidConfig(_))
    }

    pub fn is_soft_failure(&self) -> bool {
        matches!(self, RunError::TestsFailed { .. })
    }
}

/// Why a single sink write failed.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("reading reporter output failed: {0}")]
    Session(#[from] SessionError),

    #[error("cannot open report file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("writing to {target} failed: {source}")]
    Write {
        target: String,
        #[source]
        source: std::io::Error,
    },
}

/// One reporter failed to drain. Isolated: the other reporters still drain.
#[derive(Debug, thiserror::Error)]
#[error("Failed to write report {reporter}: {source}")]
pub struct DrainError {
    pub reporter: String,
    #[source]
    pub source: SinkError,
}

/// Caller-visible failure of a run.
///
/// `primary` is the first fatal error; drain and close errors that happened
/// on the way out are attached as secondary information.
#[derive(Debug)]
pub struct RunFailure {
    pub primary: RunError,
    pub drain_errors: Vec<DrainError>,
    pub close_error: Option<SessionError>,
}

impl RunFailure {
    pub fn new(primary: RunError) -> Self {
        Self {
            primary,
            drain_errors: Vec::new(),
            close_error: None,
        }
    }
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.primary)?;
        for err in &self.drain_errors {
            write!(f, "; also: {}", err)?;
        }
        if let Some(err) = &self.close_error {
            write!(f, "; also: failed to close session: {}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for RunFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.primary)
    }
}

impl From<RunError> for RunFailure {
    fn from(primary: RunError) -> Self {
        Self::new(primary)
    }
}

/// Result type for runner operations.
pub type Result<T> = std::result::Result<T, RunError>;
