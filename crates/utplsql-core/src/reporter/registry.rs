use tracing::debug;
use utplsql_session::{DatabaseSession, Reporter};

use super::{CoreReporter, ReportRequest};
use crate::error::{Result, RunError};

/// A bound reporter together with the request it came from.
#[derive(Debug, Clone)]
pub struct ReporterHandle {
    pub reporter: Reporter,
    pub request: ReportRequest,
}

impl ReporterHandle {
    pub fn name(&self) -> &str {
        &self.request.name
    }
}

/// Creates and binds the reporters requested for a run.
pub struct ReportRegistry;

impl ReportRegistry {
    /// The requests a run actually uses: the configured list, or the
    /// documentation reporter on the console when nothing is configured.
    pub fn effective_requests(requests: &[ReportRequest]) -> Vec<ReportRequest> {
        if requests.is_empty() {
            vec![ReportRequest::default_reporter()]
        } else {
            requests.to_vec()
        }
    }

    /// Create and bind one reporter per request, in request order.
    ///
    /// Names outside the built-in catalogue are still handed to the factory.
    /// The first failure aborts initialization.
    pub async fn initialize(
        session: &dyn DatabaseSession,
        requests: &[ReportRequest],
    ) -> Result<Vec<ReporterHandle>> {
        let requests = Self::effective_requests(requests);
        let mut handles = Vec::with_capacity(requests.len());

        for request in requests {
            let init_err = |source| RunError::ReporterInit {
                name: request.name.clone(),
                source,
            };
            let mut reporter = session
                .create_reporter(&request.name)
                .await
                .map_err(init_err)?;
            session
                .init_reporter(&mut reporter)
                .await
                .map_err(init_err)?;

            debug!(
                reporter = %request.name,
                core = request.name.parse::<CoreReporter>().is_ok(),
                "reporter initialized"
            );
            handles.push(ReporterHandle { reporter, request });
        }

        Ok(handles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use utplsql_session::fakes::MemorySession;
    use utplsql_session::SessionError;

    #[tokio::test]
    async fn test_empty_request_list_yields_documentation_reporter() {
        let session = MemorySession::new();
        let handles = ReportRegistry::initialize(&session, &[]).await.unwrap();

        assert_eq!(handles.len(), 1);
        assert_eq!(handles[0].name(), "UT_DOCUMENTATION_REPORTER");
        assert_eq!(handles[0].request.console_output, Some(true));
        assert!(handles[0].reporter.is_bound());
    }

    #[tokio::test]
    async fn test_handles_keep_request_order() {
        let session = MemorySession::new();
        let requests = vec![
            ReportRequest::new("UT_XUNIT_REPORTER").with_file("xunit.xml"),
            ReportRequest::new("UT_COVERAGE_HTML_REPORTER"),
            ReportRequest::new("MY_CUSTOM_REPORTER"),
        ];

        let handles = ReportRegistry::initialize(&session, &requests).await.unwrap();
        let names: Vec<&str> = handles.iter().map(ReporterHandle::name).collect();

        assert_eq!(
            names,
            vec!["UT_XUNIT_REPORTER", "UT_COVERAGE_HTML_REPORTER", "MY_CUSTOM_REPORTER"]
        );
        assert_eq!(session.journal().bound_reporters.len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_reporter_fails_with_its_name() {
        let session = MemorySession::new().with_known_reporters(["UT_DOCUMENTATION_REPORTER"]);
        let requests = vec![
            ReportRequest::new("UT_DOCUMENTATION_REPORTER"),
            ReportRequest::new("UT_NOPE_REPORTER"),
        ];

        let err = ReportRegistry::initialize(&session, &requests).await.unwrap_err();
        match err {
            RunError::ReporterInit { name, source } => {
                assert_eq!(name, "UT_NOPE_REPORTER");
                assert_eq!(source, SessionError::UnknownReporter("UT_NOPE_REPORTER".to_string()));
            }
            other => panic!("expected ReporterInit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bind_failure_fails_initialization() {
        let session = MemorySession::new().failing_bind("UT_XUNIT_REPORTER");
        let requests = vec![ReportRequest::new("UT_XUNIT_REPORTER")];

        let err = ReportRegistry::initialize(&session, &requests).await.unwrap_err();
        assert!(matches!(err, RunError::ReporterInit { .. }));
    }
}
