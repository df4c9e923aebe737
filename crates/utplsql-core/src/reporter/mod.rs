//! Reporter requests, initialization and output distribution.

pub mod buffer;
pub mod registry;
pub mod sink;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use buffer::OutputBuffer;
pub use registry::{ReportRegistry, ReporterHandle};
pub use sink::{Console, DrainSummary, Sink, SinkWriter};

/// Report generators shipped with the utPLSQL framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoreReporter {
    Documentation,
    CoverageHtml,
    TeamCity,
    XUnit,
    JUnit,
    Coveralls,
    CoverageSonar,
    SonarTest,
    CoverageCobertura,
    TfsJUnit,
    Debug,
    Realtime,
}

impl CoreReporter {
    pub const ALL: [CoreReporter; 12] = [
        CoreReporter::Documentation,
        CoreReporter::CoverageHtml,
        CoreReporter::TeamCity,
        CoreReporter::XUnit,
        CoreReporter::JUnit,
        CoreReporter::Coveralls,
        CoreReporter::CoverageSonar,
        CoreReporter::SonarTest,
        CoreReporter::CoverageCobertura,
        CoreReporter::TfsJUnit,
        CoreReporter::Debug,
        CoreReporter::Realtime,
    ];

    /// Server-side type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            CoreReporter::Documentation => "UT_DOCUMENTATION_REPORTER",
            CoreReporter::CoverageHtml => "UT_COVERAGE_HTML_REPORTER",
            CoreReporter::TeamCity => "UT_TEAMCITY_REPORTER",
            CoreReporter::XUnit => "UT_XUNIT_REPORTER",
            CoreReporter::JUnit => "UT_JUNIT_REPORTER",
            CoreReporter::Coveralls => "UT_COVERALLS_REPORTER",
            CoreReporter::CoverageSonar => "UT_COVERAGE_SONAR_REPORTER",
            CoreReporter::SonarTest => "UT_SONAR_TEST_REPORTER",
            CoreReporter::CoverageCobertura => "UT_COVERAGE_COBERTURA_REPORTER",
            CoreReporter::TfsJUnit => "UT_TFS_JUNIT_REPORTER",
            CoreReporter::Debug => "UT_DEBUG_REPORTER",
            CoreReporter::Realtime => "UT_REALTIME_REPORTER",
        }
    }
}

impl fmt::Display for CoreReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Name that is not one of the built-in reporter types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a core reporter: {0}")]
pub struct NotCoreReporter(pub String);

impl FromStr for CoreReporter {
    type Err = NotCoreReporter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        CoreReporter::ALL
            .into_iter()
            .find(|r| r.type_name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| NotCoreReporter(s.to_string()))
    }
}

/// Where a reporter's drained output goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkTarget {
    Console,
    File { path: PathBuf },
}

impl fmt::Display for SinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkTarget::Console => f.write_str("console"),
            SinkTarget::File { path } => write!(f, "{}", path.display()),
        }
    }
}

/// A declared report: type name plus sink configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportRequest {
    pub name: String,
    /// Relative paths resolve against the run's target directory
    #[serde(default)]
    pub file_output: Option<String>,
    #[serde(default)]
    pub console_output: Option<bool>,
}

impl ReportRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_output: None,
            console_output: None,
        }
    }

    pub fn with_file(mut self, path: impl Into<String>) -> Self {
        self.file_output = Some(path.into());
        self
    }

    pub fn with_console(mut self, enabled: bool) -> Self {
        self.console_output = Some(enabled);
        self
    }

    /// The reporter used when none is configured: documentation, on the console.
    pub fn default_reporter() -> Self {
        Self::new(CoreReporter::Documentation.type_name()).with_console(true)
    }

    pub fn has_file_output(&self) -> bool {
        self.file_output
            .as_deref()
            .is_some_and(|f| !f.trim().is_empty())
    }

    /// Console is on when forced, and whenever there is no file sink.
    pub fn effective_console_output(&self) -> bool {
        self.console_output == Some(true) || !self.has_file_output()
    }

    /// Absolute file sink path, if a file sink is configured.
    pub fn output_path(&self, target_dir: &Path) -> Option<PathBuf> {
        if !self.has_file_output() {
            return None;
        }
        let file = Path::new(self.file_output.as_deref()?);
        if file.is_absolute() {
            Some(file.to_path_buf())
        } else {
            Some(target_dir.join(file))
        }
    }

    /// Resolved sinks, file first.
    pub fn sink_targets(&self, target_dir: &Path) -> Vec<SinkTarget> {
        let mut targets = Vec::new();
        if let Some(path) = self.output_path(target_dir) {
            targets.push(SinkTarget::File { path });
        }
        if self.effective_console_output() {
            targets.push(SinkTarget::Console);
        }
        targets
    }
}
