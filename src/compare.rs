//! Comparison of two uploads across a table scope

use crate::diff::{DiffEngine, TableDiffResult};
use crate::error::{CfgdiffError, Result};
use crate::store::SnapshotStore;
use crate::upload::Upload;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Tables a comparison covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableScope {
    /// Every canonical discriminator and its aliases
    All,
    Table(String),
}

impl FromStr for TableScope {
    type Err = CfgdiffError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CfgdiffError::invalid_input("Table scope cannot be empty"));
        }
        if s.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            Ok(Self::Table(s.to_string()))
        }
    }
}

impl fmt::Display for TableScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Table(table) => f.write_str(table),
        }
    }
}

impl Serialize for TableScope {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Totals over every compared table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    /// Diff records across all tables
    pub total_records: usize,
    /// Records present on both sides with differing fields
    pub differences: usize,
    pub added_left: usize,
    pub added_right: usize,
    pub tables_affected: usize,
}

impl DiffSummary {
    fn add(&mut self, result: &TableDiffResult) {
        self.total_records += result.total_diff_records;
        self.differences += result.changed_count;
        self.added_left += result.added_left_count;
        self.added_right += result.added_right_count;
        self.tables_affected += 1;
    }
}

/// Full comparison output
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub left: Upload,
    pub right: Upload,
    pub scope: TableScope,
    pub generated_at: DateTime<Utc>,
    /// Only tables with at least one diff record
    pub tables: Vec<TableDiffResult>,
    pub summary: DiffSummary,
}

impl ComparisonReport {
    pub fn has_differences(&self) -> bool {
        self.summary.total_records > 0
    }
}

/// Runs the diff engine over a scope and aggregates the results
pub struct Comparator<'a, S: SnapshotStore> {
    engine: DiffEngine<'a, S>,
}

impl<'a, S: SnapshotStore> Comparator<'a, S> {
    pub fn new(engine: DiffEngine<'a, S>) -> Self {
        Self { engine }
    }

    /// Discriminators a scope expands to
    fn tables_for(&self, scope: &TableScope) -> Result<Vec<String>> {
        match scope {
            TableScope::All => Ok(self.engine.registry().discriminators()),
            TableScope::Table(table) => {
                if !self.engine.registry().is_supported(table) {
                    return Err(CfgdiffError::unsupported_table(table.as_str()));
                }
                Ok(vec![table.clone()])
            }
        }
    }

    pub fn compare(&self, left: Upload, right: Upload, scope: TableScope) -> Result<ComparisonReport> {
        log::info!(
            "Comparing {} ({}) with {} ({}), tables: {}",
            left.file_name,
            left.id,
            right.file_name,
            right.id,
            scope
        );

        let mut tables = Vec::new();
        let mut summary = DiffSummary::default();

        for table in self.tables_for(&scope)? {
            let result = match self.engine.diff_table(&table, left.id, right.id) {
                Ok(result) => result,
                Err(CfgdiffError::UnsupportedTable { table }) if scope == TableScope::All => {
                    log::warn!("Table {} is not supported, skipping", table);
                    continue;
                }
                Err(err) => return Err(err),
            };

            if result.has_differences() {
                log::info!(
                    "{}: {} changed, {} only left, {} only right",
                    result.table,
                    result.changed_count,
                    result.added_left_count,
                    result.added_right_count
                );
                summary.add(&result);
                tables.push(result);
            }
        }

        log::info!(
            "Comparison completed: {} tables with differences",
            summary.tables_affected
        );

        Ok(ComparisonReport {
            left,
            right,
            scope,
            generated_at: Utc::now(),
            tables,
            summary,
        })
    }
}
