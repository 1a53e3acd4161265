//! Unit tests for workspace management and configuration

use crate::common::TestFixture;
use cfgdiff::{CfgdiffError, CfgdiffWorkspace, WorkspaceConfig};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_workspace_creation() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = CfgdiffWorkspace::create_new(temp_dir.path().to_path_buf()).unwrap();

    assert!(workspace.cfgdiff_dir.exists());
    assert!(workspace.reports_dir.exists());
    assert!(workspace.config_path().exists());
    assert_eq!(workspace.root, temp_dir.path());
}

#[test]
fn test_workspace_found_from_subdirectory() {
    let fixture = TestFixture::new().unwrap();
    let nested = fixture.root().join("exports").join("2024");
    fs::create_dir_all(&nested).unwrap();

    let found = CfgdiffWorkspace::find_existing(&nested).unwrap().unwrap();
    assert_eq!(found.root, fixture.root());
}

#[test]
fn test_find_existing_stops_at_git_root() {
    let temp_dir = TempDir::new().unwrap();
    let project = temp_dir.path().join("project");
    fs::create_dir_all(project.join(".git")).unwrap();
    CfgdiffWorkspace::create_new(temp_dir.path().to_path_buf()).unwrap();

    assert!(CfgdiffWorkspace::find_existing(&project).unwrap().is_none());
}

#[test]
fn test_gitignore_entry_added_once() {
    let fixture = TestFixture::new().unwrap();
    fixture.workspace.ensure_gitignore().unwrap();
    fixture.workspace.ensure_gitignore().unwrap();

    let content = fs::read_to_string(fixture.root().join(".gitignore")).unwrap();
    assert_eq!(content.matches(".cfgdiff/store.duckdb").count(), 1);
}

#[test]
fn test_gitignore_appends_to_existing_file() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join(".gitignore"), "target/").unwrap();
    CfgdiffWorkspace::create_new(temp_dir.path().to_path_buf()).unwrap();

    let content = fs::read_to_string(temp_dir.path().join(".gitignore")).unwrap();
    assert!(content.starts_with("target/\n"));
    assert!(content.contains(".cfgdiff/store.duckdb*"));
}

#[test]
fn test_report_path_is_sanitized() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture
        .workspace
        .report_path("a.csv@2024-03-01T10:00:00.000Z", "b/c.csv");

    assert_eq!(path.parent().unwrap(), fixture.workspace.reports_dir);
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.ends_with(".json"));
    assert!(!name.contains('/'));
    assert!(!name.contains('@'));
}

#[test]
fn test_open_store_requires_workspace() {
    let fixture = TestFixture::new_empty().unwrap();
    assert!(matches!(
        fixture.workspace.open_store(),
        Err(CfgdiffError::Workspace(_))
    ));
}

#[test]
fn test_default_config_written() {
    let fixture = TestFixture::new().unwrap();
    let config = fixture.workspace.load_config().unwrap();

    assert_eq!(config.version, cfgdiff::FORMAT_VERSION);
    assert_eq!(config.batch_size, cfgdiff::DEFAULT_BATCH_SIZE);
    assert_eq!(config.upload_time_tolerance_secs, cfgdiff::DEFAULT_UPLOAD_TOLERANCE_SECS);
    assert!(config.sort_by_key);
    assert!(!config.keep_raw_lines);
    assert!(config.created.is_some());
}

#[test]
fn test_partial_config_fills_defaults() {
    let fixture = TestFixture::new().unwrap();
    fs::write(fixture.workspace.config_path(), r#"{ "batch_size": 7 }"#).unwrap();

    let config = fixture.workspace.load_config().unwrap();
    assert_eq!(config.batch_size, 7);
    assert_eq!(config.default_owner, "anonymous");
}

#[test]
fn test_config_rejects_zero_batch_size() {
    let fixture = TestFixture::new().unwrap();
    fs::write(fixture.workspace.config_path(), r#"{ "batch_size": 0 }"#).unwrap();

    assert!(matches!(
        fixture.workspace.load_config(),
        Err(CfgdiffError::Config { .. })
    ));
}

#[test]
fn test_config_alias_must_target_known_table() {
    let mut config = WorkspaceConfig::default();
    config
        .table_aliases
        .insert("/SYCLO/CA000P_Z".into(), "/SYCLO/CA000P".into());
    let registry = config.registry().unwrap();
    assert_eq!(registry.canonical_of("/SYCLO/CA000P_Z"), Some("/SYCLO/CA000P"));

    config
        .table_aliases
        .insert("/CUSTOM/TABLE".into(), "/NOT/THERE".into());
    assert!(config.validate().is_err());
}

#[test]
fn test_workspace_stats_counts_reports() {
    let fixture = TestFixture::new().unwrap();
    fs::write(fixture.workspace.reports_dir.join("a.json"), "{}").unwrap();
    fs::write(fixture.workspace.reports_dir.join("b.json"), "{\"x\":1}").unwrap();

    let stats = fixture.workspace.stats().unwrap();
    assert_eq!(stats.report_count, 2);
    assert_eq!(stats.total_report_size, 9);
    assert_eq!(stats.store_size, 0);
}
