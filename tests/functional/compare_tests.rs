//! End-to-end comparison of ingested uploads

use crate::common::{assertions::*, sample_data::*, CliTestRunner, TestFixture};
use cfgdiff::output::format_timestamp;
use cfgdiff::{CfgdiffError, DiffKind, TableScope, UploadSelector};

#[test]
fn test_compare_reports_changed_added_and_removed() {
    let fixture = TestFixture::new().unwrap();
    let mut service = fixture.service().unwrap();
    let left = service.ingest(export(&baseline()).as_bytes(), "left.csv", None).unwrap();
    let right = service.ingest(export(&revised()).as_bytes(), "right.csv", None).unwrap();

    let report = service
        .compare(
            &UploadSelector::Id(left.upload_id),
            &UploadSelector::Id(right.upload_id),
            TableScope::All,
        )
        .unwrap();

    assert_eq!(report.tables.len(), 1);
    let table = &report.tables[0];
    assert_eq!(table.table, PARAM);
    assert_eq!(table.key_fields, vec!["param_name"]);
    assert_eq!(table.changed_count, 1);
    assert_eq!(table.added_left_count, 1);
    assert_eq!(table.added_right_count, 1);

    let changed = table
        .records
        .iter()
        .find(|r| r.kind == DiffKind::Changed)
        .unwrap();
    assert_eq!(changed.key.parts(), ["WCMCatalogProfileName"]);
    assert_eq!(changed.changed_fields, vec!["active"]);

    let only_left = table
        .records
        .iter()
        .find(|r| r.kind == DiffKind::AddedLeft)
        .unwrap();
    assert_eq!(only_left.key.parts(), ["SyncTimeout"]);
    assert!(only_left.right.is_none());

    let only_right = table
        .records
        .iter()
        .find(|r| r.kind == DiffKind::AddedRight)
        .unwrap();
    assert_eq!(only_right.key.parts(), ["OfflineMode"]);
    assert!(only_right.left.is_none());

    assert_eq!(report.summary.total_records, 3);
    assert_eq!(report.summary.differences, 1);
    assert_eq!(report.summary.added_left, 1);
    assert_eq!(report.summary.added_right, 1);
    assert_eq!(report.summary.tables_affected, 1);
    assert!(report.has_differences());
}

#[test]
fn test_compare_single_table_scope() {
    let fixture = TestFixture::new().unwrap();
    let mut service = fixture.service().unwrap();
    let left = service.ingest(export(&baseline()).as_bytes(), "left.csv", None).unwrap();
    let right = service.ingest(export(&revised()).as_bytes(), "right.csv", None).unwrap();

    let report = service
        .compare(
            &UploadSelector::Id(left.upload_id),
            &UploadSelector::Id(right.upload_id),
            TableScope::Table(STATUS.into()),
        )
        .unwrap();
    assert!(!report.has_differences());
    assert!(report.tables.is_empty());
}

#[test]
fn test_compare_unknown_table_fails() {
    let fixture = TestFixture::new().unwrap();
    let mut service = fixture.service().unwrap();
    let left = service.ingest(export(&baseline()).as_bytes(), "left.csv", None).unwrap();

    let err = service
        .compare(
            &UploadSelector::Id(left.upload_id),
            &UploadSelector::Id(left.upload_id),
            TableScope::Table("/SYCLO/NOPE".into()),
        )
        .unwrap_err();
    assert!(matches!(err, CfgdiffError::UnsupportedTable { .. }));
}

#[test]
fn test_compare_audit_only_change_is_not_a_difference() {
    let fixture = TestFixture::new().unwrap();
    let mut service = fixture.service().unwrap();
    let before = line(
        cfgdiff::schema::TableKind::Param,
        PARAM,
        &[("param_name", "K"), ("param_value", "1"), ("changed_by", "ALICE"), ("changed_ts", "20240101")],
    );
    let after = line(
        cfgdiff::schema::TableKind::Param,
        PARAM,
        &[("param_name", "K"), ("param_value", "1"), ("changed_by", "BOB"), ("changed_ts", "20240301")],
    );
    let left = service.ingest(export(&[before]).as_bytes(), "a.csv", None).unwrap();
    let right = service.ingest(export(&[after]).as_bytes(), "b.csv", None).unwrap();

    let report = service
        .compare(
            &UploadSelector::Id(left.upload_id),
            &UploadSelector::Id(right.upload_id),
            TableScope::All,
        )
        .unwrap();
    assert!(!report.has_differences());
}

#[test]
fn test_compare_keeps_alias_rows_apart() {
    let fixture = TestFixture::new().unwrap();
    let mut service = fixture.service().unwrap();
    let alias = format!("{}_C", PARAM);

    let left = service
        .ingest(
            export(&[param("K", "1", "X"), param_in(&alias, "K", "1", "X")]).as_bytes(),
            "a.csv",
            None,
        )
        .unwrap();
    let right = service
        .ingest(
            export(&[param("K", "1", "X"), param_in(&alias, "K", "2", "X")]).as_bytes(),
            "b.csv",
            None,
        )
        .unwrap();

    let report = service
        .compare(
            &UploadSelector::Id(left.upload_id),
            &UploadSelector::Id(right.upload_id),
            TableScope::All,
        )
        .unwrap();
    assert_eq!(report.tables.len(), 1);
    assert_eq!(report.tables[0].table, alias);
    assert_eq!(report.tables[0].changed_count, 1);
    assert_eq!(report.summary.total_records, 1);
}

#[test]
fn test_cli_compare_by_id_and_save_report() {
    let runner = CliTestRunner::new().unwrap();
    let left = runner.ingest_lines("left.csv", &baseline()).unwrap();
    let right = runner.ingest_lines("right.csv", &revised()).unwrap();

    let left_id = left.id.to_string();
    let right_id = right.id.to_string();
    runner.expect_success(&["compare", &left_id, &right_id, "--save"]);

    let reports_dir = &runner.fixture().workspace.reports_dir;
    let saved = runner.fixture().workspace.report_path(&left_id, &right_id);
    assert_dir_exists(reports_dir);
    assert_file_exists_and_not_empty(&saved);
    assert_json_contains_keys(&saved, &["left", "right", "scope", "generated_at", "tables", "summary"])
        .unwrap();

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&saved).unwrap()).unwrap();
    assert_eq!(report["scope"], "all");
    assert_eq!(report["summary"]["total_records"], 3);
    assert_eq!(report["tables"][0]["table"], PARAM);
    assert_eq!(report["tables"][0]["records"].as_array().unwrap().len(), 3);
}

#[test]
fn test_cli_compare_by_file_name_and_time() {
    let runner = CliTestRunner::new().unwrap();
    let left = runner.ingest_lines("left.csv", &baseline()).unwrap();
    let right = runner.ingest_lines("right.csv", &revised()).unwrap();

    let left_selector = format!("left.csv@{}", format_timestamp(&left.uploaded_at));
    let right_selector = format!("right.csv@{}", format_timestamp(&right.uploaded_at));
    let output = runner.fixture().root().join("out.json");

    runner.expect_success(&[
        "compare",
        &left_selector,
        &right_selector,
        "--table",
        PARAM,
        "--format",
        "json",
        "--output",
        output.to_str().unwrap(),
    ]);

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(report["scope"], PARAM);
    assert_eq!(report["left"]["id"], left.id.to_string());
    assert_eq!(report["right"]["id"], right.id.to_string());
}

#[test]
fn test_cli_compare_unknown_upload_fails() {
    let runner = CliTestRunner::new().unwrap();
    let left = runner.ingest_lines("left.csv", &baseline()).unwrap();

    let err = runner.expect_failure(&[
        "compare",
        &left.id.to_string(),
        &uuid::Uuid::new_v4().to_string(),
    ]);
    assert!(matches!(err, CfgdiffError::UploadNotFound { .. }));
}

#[test]
fn test_cli_compare_rejects_bad_format() {
    let runner = CliTestRunner::new().unwrap();
    let left = runner.ingest_lines("left.csv", &baseline()).unwrap();
    let id = left.id.to_string();

    let err = runner.expect_failure(&["compare", &id, &id, "--format", "xml"]);
    assert!(matches!(err, CfgdiffError::InvalidInput { .. }));
}

#[test]
fn test_cli_show_list_tables_stats() {
    let runner = CliTestRunner::new().unwrap();
    let upload = runner.ingest_lines("export.csv", &baseline()).unwrap();

    runner.expect_success(&["show", &upload.id.to_string()]);
    runner.expect_success(&["show", &upload.id.to_string(), "--format", "json"]);
    runner.expect_success(&["list"]);
    runner.expect_success(&["list", "--format", "json"]);
    runner.expect_success(&["tables"]);
    runner.expect_success(&["tables", "--format", "json"]);
    runner.expect_success(&["stats"]);
}
