//! Ingestion pipeline: raw file bytes to typed records in a snapshot store

use crate::error::{CfgdiffError, Result};
use crate::hash::fingerprint;
use crate::lines::{self, GenericRow, ParsedFile};
use crate::mapper::map_rows;
use crate::progress::ProgressReporter;
use crate::schema::SchemaRegistry;
use crate::store::SnapshotStore;
use crate::upload::{IntermediateRow, NewUpload, Upload, UploadStatus, ANONYMOUS_OWNER};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

/// Knobs for one ingestion run
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub batch_size: usize,
    pub keep_raw_lines: bool,
    pub show_progress: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            batch_size: crate::DEFAULT_BATCH_SIZE,
            keep_raw_lines: false,
            show_progress: false,
        }
    }
}

/// Outcome of a successful ingestion
#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub upload_id: Uuid,
    pub records_processed: u64,
    pub tables_processed: Vec<String>,
    /// Discriminators present in the file but not in the registry
    pub skipped_tables: Vec<String>,
    /// Earlier upload with identical content, if any
    pub duplicate_of: Option<Uuid>,
}

/// Drives line parsing, typed mapping and batched saves for one file at a time
pub struct Ingestor<'a, S: SnapshotStore> {
    store: &'a mut S,
    registry: &'a SchemaRegistry,
    options: IngestOptions,
}

impl<'a, S: SnapshotStore> Ingestor<'a, S> {
    pub fn new(store: &'a mut S, registry: &'a SchemaRegistry, options: IngestOptions) -> Self {
        Self {
            store,
            registry,
            options,
        }
    }

    /// Ingest one export. Failures after the upload exists mark it `error`
    /// and re-surface; tables already saved stay persisted.
    pub fn ingest(
        &mut self,
        content: &[u8],
        file_name: &str,
        owner: Option<&str>,
    ) -> Result<IngestSummary> {
        if self.options.batch_size == 0 {
            return Err(CfgdiffError::invalid_input("Batch size must be greater than 0"));
        }

        let mut progress = if self.options.show_progress {
            ProgressReporter::new_for_ingest()
        } else {
            ProgressReporter::new_minimal()
        };

        let text = decode(content);
        let parsed = lines::parse(&text)?;
        progress.finish_parse(&format!("Parsed {} rows", parsed.rows.len()));
        log::info!("Parsed {} rows from {}", parsed.rows.len(), file_name);

        let identity = parsed.identity().ok_or(CfgdiffError::MissingIdentity)?;
        log::info!(
            "Upload info: {}/{}/{}",
            identity.company,
            identity.product,
            identity.version
        );

        let digest = fingerprint(content);
        let duplicate_of = self
            .store
            .list_uploads()?
            .into_iter()
            .find(|u| u.fingerprint == digest)
            .map(|u| u.id);
        if let Some(previous) = duplicate_of {
            log::warn!(
                "{} has the same content as upload {}; ingesting again",
                file_name,
                previous
            );
        }

        let upload = self.store.create_upload(NewUpload {
            company: identity.company,
            product: identity.product,
            version: identity.version,
            file_name: file_name.to_string(),
            uploaded_by: owner
                .filter(|o| !o.is_empty())
                .unwrap_or(ANONYMOUS_OWNER)
                .to_string(),
            uploaded_at: Utc::now(),
            total_records: parsed.rows.len() as u64,
            fingerprint: digest,
        })?;
        log::debug!("Created upload {}", upload.id);

        match self.process(&upload, &parsed, &mut progress) {
            Ok((tables_processed, skipped_tables, records_processed)) => {
                self.store
                    .update_upload_status(upload.id, UploadStatus::Completed, None)?;
                log::info!(
                    "Upload completed: {} records across {} tables",
                    records_processed,
                    tables_processed.len()
                );
                Ok(IngestSummary {
                    upload_id: upload.id,
                    records_processed,
                    tables_processed,
                    skipped_tables,
                    duplicate_of,
                })
            }
            Err(err) => {
                log::error!("Ingestion of {} failed: {}", file_name, err);
                let message = err.to_string();
                if let Err(status_err) =
                    self.store
                        .update_upload_status(upload.id, UploadStatus::Error, Some(&message))
                {
                    log::error!("Could not record failure on upload {}: {}", upload.id, status_err);
                }
                Err(err)
            }
        }
    }

    fn process(
        &mut self,
        upload: &Upload,
        parsed: &ParsedFile,
        progress: &mut ProgressReporter,
    ) -> Result<(Vec<String>, Vec<String>, u64)> {
        let groups = parsed.group_by_discriminator();
        log::info!("Found {} different tables", groups.len());

        let mut tables_processed = Vec::new();
        let mut skipped_tables = Vec::new();
        let mut records_processed = 0u64;

        for (table, rows) in &groups {
            let Some(schema) = self.registry.resolve(table) else {
                log::warn!("Table {} is not supported, skipping {} rows", table, rows.len());
                skipped_tables.push(table.to_string());
                continue;
            };

            log::info!("Processing table {} with {} records", table, rows.len());
            let batch = map_rows(schema, parsed.delimiter, upload.id, rows);
            if let Some(first) = batch.errors.first() {
                for error in &batch.errors {
                    log::error!(
                        "Line {} of {}: expected at least {} fields, found {}",
                        error.line_number,
                        error.table,
                        error.expected,
                        error.found
                    );
                }
                return Err(first.clone().into());
            }

            if self.options.keep_raw_lines {
                let raw: Vec<IntermediateRow> =
                    rows.iter().map(|row| intermediate_row(upload, row)).collect();
                self.store.save_raw_lines(&raw)?;
            }

            progress.start_table(table, batch.records.len() as u64);
            let mut saved = 0usize;
            for chunk in batch.records.chunks(self.options.batch_size) {
                self.store.save_records(schema, chunk)?;
                saved += chunk.len();
                progress.advance_table(chunk.len() as u64);
                log::debug!("Saved batch: {}/{}", saved, batch.records.len());
            }
            progress.finish_table(&format!("{} saved", table));

            self.store
                .mark_table_processed(upload.id, table, batch.records.len() as u64)?;
            tables_processed.push(table.to_string());
            records_processed += batch.records.len() as u64;
        }

        Ok((tables_processed, skipped_tables, records_processed))
    }
}

fn intermediate_row(upload: &Upload, row: &GenericRow) -> IntermediateRow {
    IntermediateRow {
        upload_id: upload.id,
        company: row.get(lines::COMPANY_COLUMN).unwrap_or_default().to_string(),
        product: row.get(lines::PRODUCT_COLUMN).unwrap_or_default().to_string(),
        version: row.get(lines::VERSION_COLUMN).unwrap_or_default().to_string(),
        table: row.discriminator.clone(),
        line_number: row.line_number,
        raw_line: row.raw_line.clone(),
        file_name: upload.file_name.clone(),
        uploaded_by: upload.uploaded_by.clone(),
    }
}

/// UTF-8 text of a file, replacing undecodable bytes
fn decode(content: &[u8]) -> std::borrow::Cow<'_, str> {
    let text = String::from_utf8_lossy(content);
    if matches!(text, std::borrow::Cow::Owned(_)) {
        log::warn!("File is not valid UTF-8; undecodable bytes were replaced");
    }
    text
}
