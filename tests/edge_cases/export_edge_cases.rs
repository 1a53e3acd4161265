//! Edge cases in export content

use crate::common::{sample_data::*, TestFixture};
use cfgdiff::schema::TableKind;
use cfgdiff::{CfgdiffError, SnapshotService, SnapshotStore, TableScope, UploadSelector, WorkspaceConfig};
use cfgdiff::{MemoryStore, TypedRecord};
use std::fs;

fn memory_service() -> SnapshotService<MemoryStore> {
    SnapshotService::new(MemoryStore::new(), WorkspaceConfig::default()).unwrap()
}

fn params_of<S: SnapshotStore>(service: &SnapshotService<S>, upload_id: uuid::Uuid) -> Vec<TypedRecord> {
    let schema = service.registry().resolve(PARAM).unwrap();
    service.store().find_records(schema, PARAM, upload_id).unwrap()
}

#[test]
fn test_bom_and_crlf_are_ignored() {
    let mut service = memory_service();
    let plain = export(&[param("K1", "V", "X")]);
    let windows = format!("\u{feff}{}", plain.replace('\n', "\r\n"));

    let a = service.ingest(plain.as_bytes(), "plain.csv", None).unwrap();
    let b = service.ingest(windows.as_bytes(), "windows.csv", None).unwrap();

    let records = params_of(&service, b.upload_id);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("company"), Some(COMPANY));
    assert_eq!(records[0].get("active"), Some("X"));
    assert_eq!(b.duplicate_of, Some(a.upload_id));
}

#[test]
fn test_quoted_fields_keep_delimiters() {
    let mut service = memory_service();
    let line = line(
        TableKind::Param,
        PARAM,
        &[("param_name", "Query"), ("param_value", "\"a;b;c\""), ("active", "X")],
    );
    let summary = service.ingest(export(&[line]).as_bytes(), "quoted.csv", None).unwrap();

    let records = params_of(&service, summary.upload_id);
    assert_eq!(records[0].get("param_value"), Some("a;b;c"));
    assert_eq!(records[0].get("active"), Some("X"));
}

#[test]
fn test_comma_delimited_export() {
    let mut service = memory_service();
    let content = format!(
        "COMPANY,PRODUCT,VERSION,TABLE,MANDT\n{}\n",
        param("K1", "V", "X").replace(';', ",")
    );
    let summary = service.ingest(content.as_bytes(), "comma.csv", None).unwrap();

    let records = params_of(&service, summary.upload_id);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("param_name"), Some("K1"));
}

#[test]
fn test_fields_are_trimmed() {
    let mut service = memory_service();
    let padded = param("K1", "V", "X").replace(";K1;", ";  K1  ;");
    let summary = service.ingest(export(&[padded]).as_bytes(), "padded.csv", None).unwrap();

    let records = params_of(&service, summary.upload_id);
    assert_eq!(records[0].get("param_name"), Some("K1"));
}

#[test]
fn test_empty_content_is_no_data() {
    let mut service = memory_service();
    assert!(matches!(service.ingest(b"", "empty.csv", None), Err(CfgdiffError::NoData)));
    assert!(matches!(
        service.ingest(b"\n\n  \n", "blank.csv", None),
        Err(CfgdiffError::NoData)
    ));
    assert!(service.list().unwrap().is_empty());
}

#[test]
fn test_only_unsupported_tables_completes_empty() {
    let mut service = memory_service();
    let content = export(&[format!("{};{};{};/ZZ/CUSTOM;100;A", COMPANY, PRODUCT, VERSION)]);
    let summary = service.ingest(content.as_bytes(), "custom.csv", None).unwrap();

    assert_eq!(summary.records_processed, 0);
    assert!(summary.tables_processed.is_empty());
    assert_eq!(summary.skipped_tables, vec!["/ZZ/CUSTOM"]);
}

#[test]
fn test_rows_without_identity_are_skipped() {
    let mut service = memory_service();
    let anonymous = param("Orphan", "V", "X").replacen(COMPANY, "", 1);
    let summary = service
        .ingest(export(&[anonymous, param("K1", "V", "X")]).as_bytes(), "mixed.csv", None)
        .unwrap();

    let records = params_of(&service, summary.upload_id);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("param_name"), Some("K1"));
}

#[test]
fn test_duplicate_keys_last_row_wins() {
    let mut service = memory_service();
    let left = service
        .ingest(export(&[param("K1", "OLD", "X"), param("K1", "NEW", "X")]).as_bytes(), "a.csv", None)
        .unwrap();
    let right = service
        .ingest(export(&[param("K1", "NEW", "X")]).as_bytes(), "b.csv", None)
        .unwrap();

    // Both rows are kept in storage
    assert_eq!(params_of(&service, left.upload_id).len(), 2);

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
fn test_blank_keys_do_not_match() {
    let mut service = memory_service();
    let left = service
        .ingest(export(&[param("", "A", "X"), param("K1", "V", "X")]).as_bytes(), "a.csv", None)
        .unwrap();
    let right = service
        .ingest(export(&[param("", "B", "X"), param("K1", "V", "X")]).as_bytes(), "b.csv", None)
        .unwrap();

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
fn test_configured_alias_is_ingested_and_compared() {
    let fixture = TestFixture::new().unwrap();
    let mut config = WorkspaceConfig::default();
    config
        .table_aliases
        .insert("/ZZ/CA000P".into(), PARAM.into());
    fs::write(
        fixture.workspace.config_path(),
        serde_json::to_string_pretty(&config).unwrap(),
    )
    .unwrap();

    let mut service = fixture.service().unwrap();
    let left = service
        .ingest(export(&[param_in("/ZZ/CA000P", "K", "1", "X")]).as_bytes(), "a.csv", None)
        .unwrap();
    let right = service
        .ingest(export(&[param_in("/ZZ/CA000P", "K", "2", "X")]).as_bytes(), "b.csv", None)
        .unwrap();
    assert_eq!(left.tables_processed, vec!["/ZZ/CA000P"]);

    let report = service
        .compare(
            &UploadSelector::Id(left.upload_id),
            &UploadSelector::Id(right.upload_id),
            TableScope::Table("/ZZ/CA000P".into()),
        )
        .unwrap();
    assert_eq!(report.summary.differences, 1);
}

#[test]
fn test_large_group_maps_in_order() {
    let mut service = memory_service();
    let lines: Vec<String> = (0..1500)
        .map(|i| param(&format!("P{:05}", i), "V", "X"))
        .collect();
    let summary = service.ingest(export(&lines).as_bytes(), "large.csv", None).unwrap();

    assert_eq!(summary.records_processed, 1500);
    let records = params_of(&service, summary.upload_id);
    assert_eq!(records[0].get("param_name"), Some("P00000"));
    assert_eq!(records[1499].get("param_name"), Some("P01499"));
}

#[test]
fn test_invalid_utf8_is_replaced() {
    let mut service = memory_service();
    let mut content = export(&[param("K1", "V", "X")]).into_bytes();
    let at = content.len() - 1;
    content.insert(at, 0xff);

    let summary = service.ingest(&content, "latin.csv", None).unwrap();
    assert_eq!(summary.records_processed, 1);
}
