//! Run configuration, loadable from TOML.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RunError};
use crate::mapping::MappingConfig;
use crate::reporter::ReportRequest;

/// Default report directory below the project root.
pub const DEFAULT_TARGET_DIR: &str = "target";

/// Everything one run needs besides the session.
///
/// ```toml
/// project_root = "."
/// ignore_failure = false
/// tags = ["smoke"]
///
/// [tests]
/// owner = "APP"
///
/// [[tests.resources]]
/// directory = "src/test/plsql"
/// includes = ["**/*.pkg"]
///
/// [[reporters]]
/// name = "UT_XUNIT_REPORTER"
/// file_output = "utplsql/xunit.xml"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub project_root: PathBuf,
    /// Relative values resolve against `project_root`
    pub target_dir: Option<PathBuf>,
    /// Suite paths to run. Empty means the server default.
    pub paths: Vec<String>,
    pub sources: MappingConfig,
    pub tests: MappingConfig,
    pub reporters: Vec<ReportRequest>,
    pub tags: Vec<String>,
    pub include_object: Option<String>,
    pub exclude_object: Option<String>,
    pub random_test_order: bool,
    pub random_test_order_seed: Option<u32>,
    pub skip_compatibility_check: bool,
    pub color_console: bool,
    /// Tolerate failing tests: the run still succeeds
    pub ignore_failure: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            target_dir: None,
            paths: Vec::new(),
            sources: MappingConfig::default(),
            tests: MappingConfig::default(),
            reporters: Vec::new(),
            tags: Vec::new(),
            include_object: None,
            exclude_object: None,
            random_test_order: false,
            random_test_order_seed: None,
            skip_compatibility_check: false,
            color_console: false,
            ignore_failure: false,
        }
    }
}

impl RunConfig {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| RunError::InvalidConfig(e.to_string()))
    }

    /// Load a config file. A relative `project_root` is taken relative to
    /// the directory containing the file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            RunError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_toml_str(&raw)?;
        if config.project_root.is_relative() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                config.project_root = parent.join(&config.project_root);
            }
        }
        Ok(config)
    }

    pub fn with_project_root(mut self, project_root: impl Into<PathBuf>) -> Self {
        self.project_root = project_root.into();
        self
    }

    /// Directory relative report file paths resolve against.
    pub fn target_dir(&self) -> PathBuf {
        match &self.target_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => self.project_root.join(dir),
            None => self.project_root.join(DEFAULT_TARGET_DIR),
        }
    }

    /// Tag filter as an ordered set: first occurrence wins, blanks dropped.
    pub fn tag_filter(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in self.tags.iter().map(|t| t.trim()) {
            if !tag.is_empty() && !tags.iter().any(|seen| seen == tag) {
                tags.push(tag.to_string());
            }
        }
        tags
    }
}
