//! File resolution and mapping option assembly against real directory trees.

use std::fs;
use std::path::Path;

use utplsql_core::{
    MappingConfig, MappingError, ObjectMapper, PathResolver, ResourceSpec, Role, RoleDefaults,
    RoleMappings, RunError,
};

fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"--").unwrap();
}

#[test]
fn test_owner_and_groups_are_forwarded_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "plsql/tests/app/test_award_bonus.pkg");
    touch(dir.path(), "plsql/tests/app/test_betwnstr.pkg");
    touch(dir.path(), "plsql/tests/app/readme.md");

    let mut config = MappingConfig {
        resources: vec![ResourceSpec::new("plsql/tests")],
        owner: Some("APP".to_string()),
        regex_expression: Some(r"\w+/(\w+)/(\w+)\.\w{3}".to_string()),
        owner_subexpression: Some(1),
        name_subexpression: Some(2),
        ..MappingConfig::default()
    };

    let options = ObjectMapper::new(dir.path())
        .map(Role::Test, &mut config)
        .unwrap();

    assert_eq!(options.object_owner.as_deref(), Some("APP"));
    assert_eq!(
        options.file_paths,
        vec![
            "plsql/tests/app/test_award_bonus.pkg".to_string(),
            "plsql/tests/app/test_betwnstr.pkg".to_string(),
        ]
    );
    assert_eq!(options.regex_pattern.as_deref(), Some(r"\w+/(\w+)/(\w+)\.\w{3}"));
    assert_eq!(options.owner_subexpression, Some(1));
    assert_eq!(options.name_subexpression, Some(2));
    assert_eq!(options.type_subexpression, None);
    // the declared spec was completed with the test pattern
    assert_eq!(config.resources[0].includes, vec!["**/*.pkg".to_string()]);
}

#[test]
fn test_resolution_is_stable_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["zeta.pkb", "alpha.pks", "mid/beta.sql", "mid/deeper/gamma.trg"] {
        touch(dir.path(), &format!("src/main/plsql/{name}"));
    }
    let defaults = RoleDefaults::for_role(Role::Source);
    let resolver = PathResolver::new(dir.path());

    let mut first_specs = vec![ResourceSpec::default()];
    let first = resolver.resolve(&mut first_specs, &defaults).unwrap();
    // resolving the completed spec again changes nothing
    let second = resolver.resolve(&mut first_specs, &defaults).unwrap();

    assert_eq!(first.len(), 4);
    assert_eq!(first, second);
    assert_eq!(first_specs, vec![ResourceSpec::from_defaults(&defaults)]);
}

#[test]
fn test_duplicates_across_specs_are_kept_in_declaration_order() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "db/a.sql");
    touch(dir.path(), "db/b.sql");

    let mut specs = vec![
        ResourceSpec::new("db").include("b.sql"),
        ResourceSpec::new("db").include("*.sql"),
    ];
    let files = PathResolver::new(dir.path())
        .resolve(&mut specs, &RoleDefaults::for_role(Role::Source))
        .unwrap();

    assert_eq!(files, vec!["db/b.sql", "db/a.sql", "db/b.sql"]);
}

#[test]
fn test_explicit_missing_directory_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = MappingConfig {
        resources: vec![ResourceSpec::new("nowhere")],
        ..MappingConfig::default()
    };

    let err = ObjectMapper::new(dir.path())
        .map(Role::Source, &mut config)
        .unwrap_err();

    assert!(err.is_configuration());
    match err {
        RunError::Mapping {
            role: Role::Source,
            source: MappingError::InvalidDirectory { directory },
        } => assert_eq!(directory, "nowhere"),
        other => panic!("expected InvalidDirectory for source, got {other:?}"),
    }
}

#[test]
fn test_spec_without_directory_uses_role_default() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "src/test/plsql/t1.pkg");
    touch(dir.path(), "src/test/plsql/helpers/t2.pks");

    let mut specs = vec![ResourceSpec {
        excludes: vec!["helpers/".to_string()],
        ..ResourceSpec::default()
    }];
    let files = PathResolver::new(dir.path())
        .resolve(&mut specs, &RoleDefaults::for_role(Role::Test))
        .unwrap();

    assert_eq!(files, vec!["src/test/plsql/t1.pkg"]);
    assert_eq!(specs[0].directory.as_deref(), Some("src/test/plsql"));
}

#[test]
fn test_matching_is_case_sensitive() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "src/test/plsql/upper.PKG");
    touch(dir.path(), "src/test/plsql/lower.pkg");

    let mappings = RoleMappings::resolve(
        dir.path(),
        &MappingConfig::default(),
        &MappingConfig::default(),
    )
    .unwrap();

    assert_eq!(mappings.test.file_paths, vec!["src/test/plsql/lower.pkg"]);
    assert!(mappings.source.is_empty());
}

#[test]
fn test_roles_fail_independently() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "src/main/plsql/ok.sql");
    let tests = MappingConfig {
        custom_type_mappings: vec![utplsql_core::CustomTypeMapping {
            object_type: String::new(),
            custom_mapping: "tst".to_string(),
        }],
        ..MappingConfig::default()
    };
    // test role needs a directory for mapping to reach assembly
    touch(dir.path(), "src/test/plsql/x.pkg");

    let err = RoleMappings::resolve(dir.path(), &MappingConfig::default(), &tests).unwrap_err();
    assert!(err.to_string().starts_with("Invalid <test> mapping configuration"));
}
