//! Offline view of what a run would do: mapped files and report sinks.

use std::path::PathBuf;

use serde::Serialize;
use utplsql_session::MappingOptions;

use crate::config::RunConfig;
use crate::error::Result;
use crate::mapping::RoleMappings;
use crate::reporter::{CoreReporter, ReportRegistry, SinkTarget};

/// One report as it would be drained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedReport {
    pub name: String,
    /// Whether the name is one of the built-in reporter types
    pub core: bool,
    pub sinks: Vec<SinkTarget>,
}

/// Resolved run inputs, computed without a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunPlan {
    pub project_root: PathBuf,
    pub target_dir: PathBuf,
    pub paths: Vec<String>,
    pub tags: Vec<String>,
    pub sources: MappingOptions,
    pub tests: MappingOptions,
    pub reporters: Vec<PlannedReport>,
}

impl RunPlan {
    /// Map both roles and resolve each report's sinks the way a run would.
    pub fn resolve(config: &RunConfig) -> Result<Self> {
        let mappings =
            RoleMappings::resolve(&config.project_root, &config.sources, &config.tests)?;
        let target_dir = config.target_dir();

        let reporters = ReportRegistry::effective_requests(&config.reporters)
            .into_iter()
            .map(|request| PlannedReport {
                core: request.name.parse::<CoreReporter>().is_ok(),
                sinks: request.sink_targets(&target_dir),
                name: request.name,
            })
            .collect();

        Ok(Self {
            project_root: config.project_root.clone(),
            target_dir,
            paths: config.paths.clone(),
            tags: config.tag_filter(),
            sources: mappings.source,
            tests: mappings.test,
            reporters,
        })
    }
}
