//! High-level snapshot operations over any store

use crate::compare::{Comparator, ComparisonReport, TableScope};
use crate::config::WorkspaceConfig;
use crate::diff::DiffEngine;
use crate::error::Result;
use crate::pipeline::{IngestOptions, IngestSummary, Ingestor};
use crate::resolver::{UploadResolver, UploadSelector};
use crate::schema::SchemaRegistry;
use crate::store::SnapshotStore;
use crate::upload::Upload;
use serde::Serialize;

/// Result of deleting one upload
#[derive(Debug, Clone, Serialize)]
pub struct DeleteSummary {
    pub upload: Upload,
    pub deleted_records: u64,
    pub deleted_raw_lines: u64,
    /// Tables whose records could not be removed
    pub failed_tables: Vec<String>,
}

/// Ingest, compare and delete snapshots held in `S`
pub struct SnapshotService<S: SnapshotStore> {
    store: S,
    registry: SchemaRegistry,
    config: WorkspaceConfig,
}

impl<S: SnapshotStore> SnapshotService<S> {
    pub fn new(store: S, config: WorkspaceConfig) -> Result<Self> {
        let registry = config.registry()?;
        Ok(Self {
            store,
            registry,
            config,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    /// Ingestion options derived from the configuration
    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            batch_size: self.config.batch_size,
            keep_raw_lines: self.config.keep_raw_lines,
            show_progress: false,
        }
    }

    /// Ingest with configured defaults; the owner falls back to the configured one
    pub fn ingest(&mut self, content: &[u8], file_name: &str, owner: Option<&str>) -> Result<IngestSummary> {
        let options = self.ingest_options();
        self.ingest_with(content, file_name, owner, options)
    }

    pub fn ingest_with(
        &mut self,
        content: &[u8],
        file_name: &str,
        owner: Option<&str>,
        options: IngestOptions,
    ) -> Result<IngestSummary> {
        let owner = owner.or(Some(self.config.default_owner.as_str()));
        Ingestor::new(&mut self.store, &self.registry, options).ingest(content, file_name, owner)
    }

    pub fn resolve(&self, selector: &UploadSelector) -> Result<Upload> {
        UploadResolver::new(&self.store, self.config.tolerance()).resolve(selector)
    }

    /// Compare two uploads over `scope`; both selectors must resolve first
    pub fn compare(
        &self,
        left: &UploadSelector,
        right: &UploadSelector,
        scope: TableScope,
    ) -> Result<ComparisonReport> {
        let left = self.resolve(left)?;
        let right = self.resolve(right)?;

        let engine =
            DiffEngine::new(&self.store, &self.registry).with_sort_by_key(self.config.sort_by_key);
        Comparator::new(engine).compare(left, right, scope)
    }

    /// Remove an upload with its typed records and raw lines.
    ///
    /// A table that fails to delete is logged and skipped; the rest still go.
    /// An upload that never completed is swept across every known table, since
    /// a failed ingest may have saved batches of a table it never marked.
    pub fn delete(&mut self, selector: &UploadSelector) -> Result<DeleteSummary> {
        let upload = self.resolve(selector)?;
        let mut deleted_records = 0u64;
        let mut failed_tables = Vec::new();

        let mut tables = upload.tables_processed.clone();
        if !upload.is_completed() {
            for table in self.registry.discriminators() {
                if !tables.contains(&table) {
                    tables.push(table);
                }
            }
        }

        for table in &tables {
            let Some(schema) = self.registry.resolve(table) else {
                log::warn!("Table {} is not supported, skipping", table);
                continue;
            };

            match self.store.delete_records(schema, table, upload.id) {
                Ok(0) => log::info!("No records found in table {} for upload {}", table, upload.id),
                Ok(count) => {
                    log::info!("Deleted {} records from table {}", count, table);
                    deleted_records += count;
                }
                Err(err) => {
                    log::warn!("Error deleting from table {}: {}", table, err);
                    failed_tables.push(table.clone());
                }
            }
        }

        let deleted_raw_lines = self.store.delete_raw_lines(upload.id)?;
        self.store.delete_upload(upload.id)?;
        log::info!(
            "Deleted upload {} ({}): {} records from {} tables",
            upload.id,
            upload.file_name,
            deleted_records,
            tables.len()
        );

        Ok(DeleteSummary {
            upload,
            deleted_records,
            deleted_raw_lines,
            failed_tables,
        })
    }

    /// Upload history, newest first
    pub fn list(&self) -> Result<Vec<Upload>> {
        self.store.list_uploads()
    }

    pub fn show(&self, selector: &UploadSelector) -> Result<Upload> {
        self.resolve(selector)
    }
}
