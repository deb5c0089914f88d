//! Workspace-config error-message and defaulting integration tests.

use std::fs;

use assert_fs::prelude::*;
use predicates::prelude::predicate;

use foundry_core::{ConfigError, WorkspaceConfig};

#[test]
fn missing_workspace_error_names_the_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let path = dir.path().join("workspace.yaml");
    let err = WorkspaceConfig::load(&path, None).unwrap_err();
    assert!(matches!(err, ConfigError::WorkspaceNotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("workspace.yaml"));
}

#[test]
fn parse_error_keeps_serde_context() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("workspace.yaml");
    file.write_str("project_name: [unclosed\n").expect("write");

    let err = WorkspaceConfig::load(file.path(), None).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    let source_msg = match &err {
        ConfigError::Parse { source, .. } => source.to_string(),
        _ => unreachable!(),
    };
    assert!(!source_msg.is_empty(), "serde_yaml must provide error context");
}

#[test]
fn full_workspace_roundtrips_every_section() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let path = dir.path().join("workspace.yaml");
    fs::write(
        &path,
        r#"
version: 1
project_name: Acme Corp
description: demo workspace
private: false
observability:
  enabled: false
  tool: phoenix
templates_folder: tpl
naming:
  prefix: org
  suffix: llm
sync:
  exclude: [generated, .cache]
secret:
  name: PHOENIX_KEY
  env: PHOENIX_KEY_VALUE
"#,
    )
    .expect("write");

    let cfg = WorkspaceConfig::load(&path, None).expect("load");
    assert_eq!(cfg.project_name, "Acme Corp");
    assert!(!cfg.private);
    assert!(!cfg.observability.enabled);
    assert_eq!(cfg.templates_folder, "tpl");
    assert_eq!(cfg.naming.prefix, "org");
    assert_eq!(cfg.naming.suffix, "llm");
    assert_eq!(cfg.sync.exclude, vec!["generated", ".cache"]);
    assert_eq!(cfg.secret.name, "PHOENIX_KEY");
    assert_eq!(cfg.secret.env, "PHOENIX_KEY_VALUE");
}

#[test]
fn workspace_file_predicate_sanity() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("workspace.yaml");
    file.write_str("project_name: p\n").expect("write");
    file.assert(predicate::str::contains("project_name"));
}
