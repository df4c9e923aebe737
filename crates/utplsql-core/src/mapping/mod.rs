//! File mapping: from declared resource locations to `MappingOptions`.
//!
//! Two roles are mapped per run, `source` (the code under test) and `test`
//! (the test packages). Each role has its own default directory and pattern.

pub mod mapper;
pub mod resolver;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use utplsql_session::MappingOptions;

use crate::error::Result;

pub use mapper::ObjectMapper;
pub use resolver::PathResolver;

/// Default directory scanned for source scripts.
pub const SOURCE_DIRECTORY: &str = "src/main/plsql";

/// Default directory scanned for test scripts.
pub const TEST_DIRECTORY: &str = "src/test/plsql";

/// Default source file pattern.
pub const SOURCE_FILE_PATTERN: &str = "**/*.*";

/// Default test file pattern.
pub const TEST_FILE_PATTERN: &str = "**/*.pkg";

/// Which half of the run a mapping belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Source,
    Test,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Role::Source => "source",
            Role::Test => "test",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Directory and include pattern substituted when a role leaves them unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDefaults {
    pub directory: String,
    pub pattern: String,
}

impl RoleDefaults {
    pub fn for_role(role: Role) -> Self {
        let (directory, pattern) = match role {
            Role::Source => (SOURCE_DIRECTORY, SOURCE_FILE_PATTERN),
            Role::Test => (TEST_DIRECTORY, TEST_FILE_PATTERN),
        };
        Self {
            directory: directory.to_string(),
            pattern: pattern.to_string(),
        }
    }
}

/// A declared location: base directory plus include/exclude patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResourceSpec {
    /// Relative to the project root unless absolute
    pub directory: Option<String>,
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
}

impl ResourceSpec {
    pub fn new(directory: impl Into<String>) -> Self {
        Self {
            directory: Some(directory.into()),
            ..Self::default()
        }
    }

    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.includes.push(pattern.into());
        self
    }

    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.excludes.push(pattern.into());
        self
    }

    /// The spec a role gets when nothing was declared.
    pub fn from_defaults(defaults: &RoleDefaults) -> Self {
        Self::new(defaults.directory.clone()).include(defaults.pattern.clone())
    }

    /// Fill in an unset directory and an empty include list. Idempotent.
    pub fn apply_defaults(&mut self, defaults: &RoleDefaults) {
        if self.directory.is_none() {
            self.directory = Some(defaults.directory.clone());
        }
        if self.includes.is_empty() {
            self.includes.push(defaults.pattern.clone());
        }
    }
}

/// Override entry: files matching `custom_mapping` are objects of `object_type`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomTypeMapping {
    #[serde(rename = "type")]
    pub object_type: String,
    pub custom_mapping: String,
}

/// Mapping configuration for one role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MappingConfig {
    pub resources: Vec<ResourceSpec>,
    pub owner: Option<String>,
    pub regex_expression: Option<String>,
    pub owner_subexpression: Option<u32>,
    pub name_subexpression: Option<u32>,
    pub type_subexpression: Option<u32>,
    pub custom_type_mappings: Vec<CustomTypeMapping>,
    /// Overrides the role's default directory
    pub default_directory: Option<String>,
    /// Overrides the role's default include pattern
    pub default_pattern: Option<String>,
}

impl MappingConfig {
    pub fn defaults(&self, role: Role) -> RoleDefaults {
        let mut defaults = RoleDefaults::for_role(role);
        if let Some(directory) = &self.default_directory {
            defaults.directory = directory.clone();
        }
        if let Some(pattern) = &self.default_pattern {
            defaults.pattern = pattern.clone();
        }
        defaults
    }
}

/// Mapping options for both roles of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoleMappings {
    pub source: MappingOptions,
    pub test: MappingOptions,
}

impl RoleMappings {
    /// Map sources then tests. The configs are left untouched; defaults are
    /// applied to private copies.
    pub fn resolve(
        project_root: &Path,
        sources: &MappingConfig,
        tests: &MappingConfig,
    ) -> Result<Self> {
        let mapper = ObjectMapper::new(project_root);
        let source = mapper.map(Role::Source, &mut sources.clone())?;
        let test = mapper.map(Role::Test, &mut tests.clone())?;
        Ok(Self { source, test })
    }
}
