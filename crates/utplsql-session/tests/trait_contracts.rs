//! Trait contract tests for DatabaseSession and SessionConnector.
//!
//! These tests verify the behavioral contracts of the session traits
//! using the in-memory fakes. Any conforming implementation must pass these.

use utplsql_session::fakes::{MemoryConnector, MemorySession, ScriptedRun};
use utplsql_session::session_traits::*;
use utplsql_session::SessionError;

// ===========================================================================
// Reporter factory contract tests
// ===========================================================================

#[tokio::test]
async fn test_factory_creates_unbound_reporter() {
    let session = MemorySession::new();
    let reporter = session
        .create_reporter("UT_DOCUMENTATION_REPORTER")
        .await
        .unwrap();

    assert_eq!(reporter.type_name, "UT_DOCUMENTATION_REPORTER");
    assert!(!reporter.is_bound());
}

#[tokio::test]
async fn test_factory_rejects_unknown_type() {
    let session = MemorySession::new().with_known_reporters(["UT_XUNIT_REPORTER"]);
    let err = session.create_reporter("UT_NOPE").await.unwrap_err();

    assert_eq!(err, SessionError::UnknownReporter("UT_NOPE".to_string()));
}

#[tokio::test]
async fn test_init_binds_reporter() {
    let session = MemorySession::new();
    let mut reporter = session.create_reporter("UT_XUNIT_REPORTER").await.unwrap();
    session.init_reporter(&mut reporter).await.unwrap();

    assert!(reporter.is_bound());
}

#[tokio::test]
async fn test_init_failure_is_bind_error() {
    let session = MemorySession::new().failing_bind("UT_XUNIT_REPORTER");
    let mut reporter = session.create_reporter("UT_XUNIT_REPORTER").await.unwrap();
    let err = session.init_reporter(&mut reporter).await.unwrap_err();

    assert!(matches!(err, SessionError::Bind { .. }));
    assert!(!reporter.is_bound());
}

// ===========================================================================
// Suite execution contract tests
// ===========================================================================

#[tokio::test]
async fn test_soft_failure_is_a_verdict_not_an_error() {
    let session = MemorySession::new().with_run(ScriptedRun::SomeTestsFailed("2 failed".into()));
    let verdict = session.run_suite(&SuiteRequest::default()).await.unwrap();

    assert_eq!(
        verdict,
        SuiteVerdict::SomeTestsFailed {
            message: "2 failed".to_string()
        }
    );
    assert!(session.is_open());
}

#[tokio::test]
async fn test_connection_loss_closes_session() {
    let session = MemorySession::new().with_run(ScriptedRun::ConnectionLost("ORA-03113".into()));
    let err = session.run_suite(&SuiteRequest::default()).await.unwrap_err();

    assert!(err.is_connection_loss());
    assert!(!session.is_open());
}

#[tokio::test]
async fn test_dropped_connection_leaves_handle_open() {
    let session =
        MemorySession::new().with_run(ScriptedRun::ConnectionDropped("ORA-03135".into()));
    let err = session.run_suite(&SuiteRequest::default()).await.unwrap_err();
    assert!(err.is_connection_loss());
    assert!(session.is_open());
}

#[tokio::test]
async fn test_suite_request_is_recorded() {
    let session = MemorySession::new();
    let request = SuiteRequest {
        paths: vec!["app".to_string()],
        tags: vec!["smoke".to_string()],
        ..SuiteRequest::default()
    };
    session.run_suite(&request).await.unwrap();

    assert_eq!(session.journal().suite_requests, vec![request]);
}

// ===========================================================================
// Output and close contract tests
// ===========================================================================

#[tokio::test]
async fn test_fetch_returns_scripted_lines() {
    let session = MemorySession::new().with_output("UT_XUNIT_REPORTER", ["<xml/>"]);
    let mut reporter = session.create_reporter("UT_XUNIT_REPORTER").await.unwrap();
    session.init_reporter(&mut reporter).await.unwrap();
    let lines = session
        .fetch_output(&reporter, OutputChannel::ReporterCursor)
        .await
        .unwrap();

    assert_eq!(lines, vec!["<xml/>".to_string()]);
}

#[tokio::test]
async fn test_fetch_requires_bound_reporter() {
    let session = MemorySession::new();
    let reporter = Reporter::new("UT_XUNIT_REPORTER");

    assert!(session
        .fetch_output(&reporter, OutputChannel::LegacyBuffer)
        .await
        .is_err());
}

#[tokio::test]
async fn test_calls_after_close_fail() {
    let session = MemorySession::new();
    session.close().await.unwrap();

    assert!(!session.is_open());
    assert_eq!(
        session.framework_version().await.unwrap_err(),
        SessionError::Closed
    );
}

#[tokio::test]
async fn test_second_close_fails() {
    let session = MemorySession::new();
    session.close().await.unwrap();

    assert_eq!(session.close().await.unwrap_err(), SessionError::Closed);
    assert_eq!(session.journal().close_calls, 2);
}

#[tokio::test]
async fn test_failing_close_still_releases() {
    let session = MemorySession::new().failing_close();

    assert!(session.close().await.is_err());
    assert!(!session.is_open());
}

// ===========================================================================
// Connector contract tests
// ===========================================================================

#[tokio::test]
async fn test_connector_hands_out_shared_session() {
    let session = MemorySession::new().with_version(FrameworkVersion::new(3, 0, 4));
    let connector = MemoryConnector::new(session.clone());
    let boxed = connector.connect().await.unwrap();

    assert_eq!(
        boxed.framework_version().await.unwrap(),
        FrameworkVersion::new(3, 0, 4)
    );
    assert_eq!(session.journal().version_queries, 1);
    assert_eq!(connector.connect_count(), 1);
}

#[tokio::test]
async fn test_failing_connector_reports_connection_error() {
    let connector = MemoryConnector::failing("listener refused");
    let err = connector.connect().await.err().unwrap();

    assert!(matches!(err, SessionError::Connection(_)));
}
