//! Record-level diff of one table between two uploads
//!
//! Records on each side are keyed by the schema's key fields. A key present
//! on one side only is an addition on that side; a key present on both sides
//! is reported only when at least one comparable field differs.

use crate::error::{CfgdiffError, Result};
use crate::record::{RecordKey, TypedRecord};
use crate::schema::{SchemaRegistry, TableSchema};
use crate::store::SnapshotStore;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Classification of one difference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffKind {
    Changed,
    AddedLeft,
    AddedRight,
}

impl DiffKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Changed => "changed",
            Self::AddedLeft => "added-left",
            Self::AddedRight => "added-right",
        }
    }
}

/// One reported difference with both sides for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffRecord {
    pub table: String,
    pub kind: DiffKind,
    pub key: RecordKey,
    /// Empty unless `kind` is `Changed`
    pub changed_fields: Vec<String>,
    pub left: Option<TypedRecord>,
    pub right: Option<TypedRecord>,
}

/// Diff of one discriminator between two uploads
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDiffResult {
    pub table: String,
    pub key_fields: Vec<String>,
    /// Comparable fields, for column headers
    pub fields: Vec<String>,
    pub total_diff_records: usize,
    pub changed_count: usize,
    pub added_left_count: usize,
    pub added_right_count: usize,
    pub records: Vec<DiffRecord>,
}

impl TableDiffResult {
    pub fn has_differences(&self) -> bool {
        self.total_diff_records > 0
    }
}

/// Key every record, skipping blank keys. Duplicates keep the position of the
/// first occurrence and the value of the last.
fn keyed<'r>(
    schema: &TableSchema,
    records: &'r [TypedRecord],
) -> IndexMap<RecordKey, &'r TypedRecord> {
    let mut map = IndexMap::with_capacity(records.len());
    for record in records {
        let key = schema.key_of(record);
        if key.is_blank() {
            log::debug!("Skipping {} record with empty key", schema.discriminator);
            continue;
        }
        if map.insert(key.clone(), record).is_some() {
            log::debug!("Duplicate key {} in {}; keeping the later record", key, schema.discriminator);
        }
    }
    map
}

/// Comparable fields whose values differ, absent values counting as empty
fn changed_fields(schema: &TableSchema, left: &TypedRecord, right: &TypedRecord) -> Vec<String> {
    schema
        .comparable_fields
        .iter()
        .filter(|field| {
            left.get(field).unwrap_or_default() != right.get(field).unwrap_or_default()
        })
        .map(|field| field.to_string())
        .collect()
}

/// Diff two already loaded record sets of `table`
pub fn diff_records(
    schema: &TableSchema,
    table: &str,
    left: &[TypedRecord],
    right: &[TypedRecord],
    sort_by_key: bool,
) -> TableDiffResult {
    let left_map = keyed(schema, left);
    let mut right_map = keyed(schema, right);
    let mut records = Vec::new();

    for (key, left_record) in left_map {
        match right_map.shift_remove(&key) {
            None => records.push(DiffRecord {
                table: table.to_string(),
                kind: DiffKind::AddedLeft,
                key,
                changed_fields: Vec::new(),
                left: Some(left_record.clone()),
                right: None,
            }),
            Some(right_record) => {
                let changed = changed_fields(schema, left_record, right_record);
                if !changed.is_empty() {
                    records.push(DiffRecord {
                        table: table.to_string(),
                        kind: DiffKind::Changed,
                        key,
                        changed_fields: changed,
                        left: Some(left_record.clone()),
                        right: Some(right_record.clone()),
                    });
                }
            }
        }
    }

    for (key, right_record) in right_map {
        records.push(DiffRecord {
            table: table.to_string(),
            kind: DiffKind::AddedRight,
            key,
            changed_fields: Vec::new(),
            left: None,
            right: Some(right_record.clone()),
        });
    }

    if sort_by_key {
        records.sort_by(|a, b| a.key.cmp(&b.key));
    }

    let count = |kind: DiffKind| records.iter().filter(|r| r.kind == kind).count();
    let changed_count = count(DiffKind::Changed);
    let added_left_count = count(DiffKind::AddedLeft);
    let added_right_count = count(DiffKind::AddedRight);

    TableDiffResult {
        table: table.to_string(),
        key_fields: schema.key_fields.iter().map(|f| f.to_string()).collect(),
        fields: schema.comparable_fields.iter().map(|f| f.to_string()).collect(),
        total_diff_records: records.len(),
        changed_count,
        added_left_count,
        added_right_count,
        records,
    }
}

/// Loads both sides of a table from a store and diffs them
pub struct DiffEngine<'a, S: SnapshotStore> {
    store: &'a S,
    registry: &'a SchemaRegistry,
    sort_by_key: bool,
}

impl<'a, S: SnapshotStore> DiffEngine<'a, S> {
    pub fn new(store: &'a S, registry: &'a SchemaRegistry) -> Self {
        Self {
            store,
            registry,
            sort_by_key: true,
        }
    }

    pub fn with_sort_by_key(mut self, sort_by_key: bool) -> Self {
        self.sort_by_key = sort_by_key;
        self
    }

    pub fn registry(&self) -> &SchemaRegistry {
        self.registry
    }

    /// Diff `table` between `left` and `right`
    pub fn diff_table(&self, table: &str, left: Uuid, right: Uuid) -> Result<TableDiffResult> {
        let schema = self
            .registry
            .resolve(table)
            .ok_or_else(|| CfgdiffError::unsupported_table(table))?;

        let left_records = self.store.find_records(schema, table, left)?;
        let right_records = self.store.find_records(schema, table, right)?;
        log::debug!(
            "Comparing {}: {} left records, {} right records",
            table,
            left_records.len(),
            right_records.len()
        );

        Ok(diff_records(
            schema,
            table,
            &left_records,
            &right_records,
            self.sort_by_key,
        ))
    }
}
