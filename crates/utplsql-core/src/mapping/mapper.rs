//! Assembles `MappingOptions` for one role.

use std::path::Path;

use tracing::debug;
use utplsql_session::{MappingOptions, TypeMapping};

use super::{CustomTypeMapping, MappingConfig, PathResolver, ResourceSpec, Role, RoleDefaults};
use crate::error::{MappingError, Result, RunError};

/// Builds mapping options from a role's configuration.
///
/// Pure data assembly: values are forwarded verbatim and absent values stay
/// absent. Defaulting owner, pattern and group indices is left to the server.
pub struct ObjectMapper<'a> {
    project_root: &'a Path,
}

impl<'a> ObjectMapper<'a> {
    pub fn new(project_root: &'a Path) -> Self {
        Self { project_root }
    }

    /// Map one role. The config's resource list is completed in place.
    ///
    /// A role with no declared resources falls back to its default directory
    /// when that directory exists, and to empty options otherwise.
    pub fn map(&self, role: Role, config: &mut MappingConfig) -> Result<MappingOptions> {
        let defaults = config.defaults(role);

        if config.resources.is_empty() {
            if !self.project_root.join(&defaults.directory).exists() {
                debug!(role = %role, directory = %defaults.directory, "default directory absent, mapping no files");
                return Ok(MappingOptions::default());
            }
            config.resources.push(ResourceSpec::from_defaults(&defaults));
        }

        self.assemble(config, &defaults)
            .map_err(|source| RunError::Mapping { role, source })
    }

    fn assemble(
        &self,
        config: &mut MappingConfig,
        defaults: &RoleDefaults,
    ) -> std::result::Result<MappingOptions, MappingError> {
        let file_paths = PathResolver::new(self.project_root).resolve(&mut config.resources, defaults)?;

        let mut options = MappingOptions::with_files(file_paths);
        options.object_owner = non_blank(config.owner.as_deref());
        options.regex_pattern = non_blank(config.regex_expression.as_deref());
        options.owner_subexpression =
            subexpression("owner_subexpression", config.owner_subexpression)?;
        options.name_subexpression =
            subexpression("name_subexpression", config.name_subexpression)?;
        options.type_subexpression =
            subexpression("type_subexpression", config.type_subexpression)?;
        options.type_mappings = type_mappings(&config.custom_type_mappings)?;
        Ok(options)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}

fn subexpression(
    field: &'static str,
    value: Option<u32>,
) -> std::result::Result<Option<u32>, MappingError> {
    match value {
        Some(0) => Err(MappingError::InvalidSubexpression { field }),
        other => Ok(other),
    }
}

fn type_mappings(
    entries: &[CustomTypeMapping],
) -> std::result::Result<Vec<TypeMapping>, MappingError> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            if entry.object_type.trim().is_empty() {
                return Err(MappingError::MalformedTypeMapping { index, field: "type" });
            }
            if entry.custom_mapping.trim().is_empty() {
                return Err(MappingError::MalformedTypeMapping {
                    index,
                    field: "custom_mapping",
                });
            }
            Ok(TypeMapping {
                custom_mapping: entry.custom_mapping.clone(),
                object_type: entry.object_type.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"-- plsql").unwrap();
    }

    #[test]
    fn test_absent_default_directory_maps_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = MappingConfig {
            owner: Some("APP".to_string()),
            ..MappingConfig::default()
        };

        let options = ObjectMapper::new(dir.path())
            .map(Role::Source, &mut config)
            .unwrap();

        assert_eq!(options, MappingOptions::default());
        assert!(config.resources.is_empty());
    }

    #[test]
    fn test_existing_default_directory_is_used() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/test/plsql/betwnstr.pkg");
        touch(dir.path(), "src/test/plsql/notes.txt");
        let mut config = MappingConfig::default();

        let options = ObjectMapper::new(dir.path())
            .map(Role::Test, &mut config)
            .unwrap();

        assert_eq!(options.file_paths, vec!["src/test/plsql/betwnstr.pkg".to_string()]);
        assert_eq!(config.resources, vec![ResourceSpec::from_defaults(&RoleDefaults::for_role(Role::Test))]);
    }

    #[test]
    fn test_blank_values_stay_unset() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/main/plsql/a.pkb");
        let mut config = MappingConfig {
            owner: Some("  ".to_string()),
            regex_expression: Some(String::new()),
            ..MappingConfig::default()
        };

        let options = ObjectMapper::new(dir.path())
            .map(Role::Source, &mut config)
            .unwrap();

        assert_eq!(options.object_owner, None);
        assert_eq!(options.regex_pattern, None);
        assert_eq!(options.owner_subexpression, None);
        assert!(options.type_mappings.is_empty());
    }

    #[test]
    fn test_custom_type_mappings_become_overrides_in_order() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/main/plsql/a.pkb");
        let mut config = MappingConfig {
            custom_type_mappings: vec![
                CustomTypeMapping {
                    object_type: "PACKAGE BODY".to_string(),
                    custom_mapping: "pkb".to_string(),
                },
                CustomTypeMapping {
                    object_type: "TRIGGER".to_string(),
                    custom_mapping: "trg".to_string(),
                },
            ],
            ..MappingConfig::default()
        };

        let options = ObjectMapper::new(dir.path())
            .map(Role::Source, &mut config)
            .unwrap();

        assert_eq!(
            options.type_mappings,
            vec![
                TypeMapping {
                    custom_mapping: "pkb".to_string(),
                    object_type: "PACKAGE BODY".to_string(),
                },
                TypeMapping {
                    custom_mapping: "trg".to_string(),
                    object_type: "TRIGGER".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_malformed_type_mapping_names_role() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/main/plsql/a.pkb");
        let mut config = MappingConfig {
            custom_type_mappings: vec![CustomTypeMapping {
                object_type: "PACKAGE BODY".to_string(),
                custom_mapping: " ".to_string(),
            }],
            ..MappingConfig::default()
        };

        let err = ObjectMapper::new(dir.path())
            .map(Role::Source, &mut config)
            .unwrap_err();

        assert!(matches!(
            err,
            RunError::Mapping {
                role: Role::Source,
                source: MappingError::MalformedTypeMapping { index: 0, .. }
            }
        ));
    }

    #[test]
    fn test_zero_subexpression_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/test/plsql/a.pkg");
        let mut config = MappingConfig {
            name_subexpression: Some(0),
            ..MappingConfig::default()
        };

        let err = ObjectMapper::new(dir.path())
            .map(Role::Test, &mut config)
            .unwrap_err();

        assert!(err.to_string().contains("name_subexpression"));
        assert!(err.to_string().contains("<test>"));
    }
}
