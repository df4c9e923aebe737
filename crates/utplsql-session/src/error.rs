//! Error types for utplsql-session

use thiserror::Error;

/// Errors raised across the database session boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Session could not be acquired, or was lost mid-run
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// A remote call failed
    #[error("Database call failed: {0}")]
    Query(String),

    /// The remote reporter factory does not know this type
    #[error("Unknown reporter type: {0}")]
    UnknownReporter(String),

    /// Reporter could not be bound to the session
    #[error("Failed to bind reporter {type_name}: {reason}")]
    Bind { type_name: String, reason: String },

    /// Operation attempted on a session that was already released
    #[error("Session is closed")]
    Closed,

    /// Framework version string could not be parsed
    #[error("Invalid framework version: {0}")]
    InvalidVersion(String),
}

impl SessionError {
    /// Whether the error means the session itself is gone.
    pub fn is_connection_loss(&self) -> bool {
        matches!(self, SessionError::Connection(_) | SessionError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_display() {
        let err = SessionError::Bind {
            type_name: "UT_XUNIT_REPORTER".to_string(),
            reason: "ORA-06550".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("UT_XUNIT_REPORTER"));
        assert!(msg.contains("ORA-06550"));
    }

    #[test]
    fn test_connection_loss_classification() {
        assert!(SessionError::Closed.is_connection_loss());
        assert!(SessionError::Connection("reset".to_string()).is_connection_loss());
        assert!(!SessionError::Query("ORA-00942".to_string()).is_connection_loss());
    }
}
