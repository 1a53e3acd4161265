//! Snapshot storage abstraction and the in-memory implementation

use crate::error::{CfgdiffError, Result};
use crate::record::TypedRecord;
use crate::schema::TableSchema;
use crate::upload::{IntermediateRow, NewUpload, Upload, UploadStatus};
use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use std::collections::HashMap;
use uuid::Uuid;

/// Durable keyed storage for uploads and their typed records.
///
/// Records are partitioned by the storage table of their schema and carry the
/// discriminator actually seen in the file, so an alias and its canonical table
/// are stored together but read back separately.
pub trait SnapshotStore {
    /// Persist a new upload in `processing` state
    fn create_upload(&mut self, upload: NewUpload) -> Result<Upload>;

    /// Append `table` to the processed list and add `records` to the processed count
    fn mark_table_processed(&mut self, upload_id: Uuid, table: &str, records: u64) -> Result<()>;

    fn update_upload_status(
        &mut self,
        upload_id: Uuid,
        status: UploadStatus,
        error_message: Option<&str>,
    ) -> Result<()>;

    fn find_upload(&self, upload_id: Uuid) -> Result<Option<Upload>>;

    /// Every upload, newest first
    fn list_uploads(&self) -> Result<Vec<Upload>>;

    /// Uploads of `file_name` submitted within `tolerance` of `uploaded_at`
    fn find_uploads_near(
        &self,
        file_name: &str,
        uploaded_at: DateTime<Utc>,
        tolerance: Duration,
    ) -> Result<Vec<Upload>>;

    /// Remove the upload row only; returns whether it existed
    fn delete_upload(&mut self, upload_id: Uuid) -> Result<bool>;

    /// Append records; every record must belong to an existing upload
    fn save_records(&mut self, schema: &TableSchema, records: &[TypedRecord]) -> Result<()>;

    /// Records of one discriminator for one upload, in insertion order
    fn find_records(
        &self,
        schema: &TableSchema,
        table: &str,
        upload_id: Uuid,
    ) -> Result<Vec<TypedRecord>>;

    /// Remove records of one discriminator for one upload; returns how many went
    fn delete_records(&mut self, schema: &TableSchema, table: &str, upload_id: Uuid) -> Result<u64>;

    fn save_raw_lines(&mut self, rows: &[IntermediateRow]) -> Result<()>;

    fn delete_raw_lines(&mut self, upload_id: Uuid) -> Result<u64>;
}

/// Sort newest first, breaking ties on id for a stable listing
pub(crate) fn sort_newest_first(uploads: &mut [Upload]) {
    uploads.sort_by(|a, b| {
        b.uploaded_at
            .cmp(&a.uploaded_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Inclusive `[at - tolerance, at + tolerance]`, saturating at the representable range
pub(crate) fn time_window(at: DateTime<Utc>, tolerance: Duration) -> (DateTime<Utc>, DateTime<Utc>) {
    let tolerance = tolerance.abs();
    let start = at.checked_sub_signed(tolerance).unwrap_or(DateTime::<Utc>::MIN_UTC);
    let end = at.checked_add_signed(tolerance).unwrap_or(DateTime::<Utc>::MAX_UTC);
    (start, end)
}

/// Store keeping everything in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    uploads: IndexMap<Uuid, Upload>,
    /// storage table name -> records in insertion order
    records: HashMap<&'static str, Vec<TypedRecord>>,
    raw_lines: Vec<IntermediateRow>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw_lines(&self) -> &[IntermediateRow] {
        &self.raw_lines
    }

    fn upload_mut(&mut self, upload_id: Uuid) -> Result<&mut Upload> {
        self.uploads
            .get_mut(&upload_id)
            .ok_or_else(|| CfgdiffError::upload_not_found(upload_id.to_string()))
    }
}

impl SnapshotStore for MemoryStore {
    fn create_upload(&mut self, upload: NewUpload) -> Result<Upload> {
        let upload = upload.into_upload(Uuid::new_v4());
        self.uploads.insert(upload.id, upload.clone());
        Ok(upload)
    }

    fn mark_table_processed(&mut self, upload_id: Uuid, table: &str, records: u64) -> Result<()> {
        let upload = self.upload_mut(upload_id)?;
        upload.tables_processed.push(table.to_string());
        upload.records_processed += records;
        Ok(())
    }

    fn update_upload_status(
        &mut self,
        upload_id: Uuid,
        status: UploadStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        let upload = self.upload_mut(upload_id)?;
        upload.status = status;
        upload.error_message = error_message.map(str::to_string);
        Ok(())
    }

    fn find_upload(&self, upload_id: Uuid) -> Result<Option<Upload>> {
        Ok(self.uploads.get(&upload_id).cloned())
    }

    fn list_uploads(&self) -> Result<Vec<Upload>> {
        let mut uploads: Vec<Upload> = self.uploads.values().cloned().collect();
        sort_newest_first(&mut uploads);
        Ok(uploads)
    }

    fn find_uploads_near(
        &self,
        file_name: &str,
        uploaded_at: DateTime<Utc>,
        tolerance: Duration,
    ) -> Result<Vec<Upload>> {
        let (start, end) = time_window(uploaded_at, tolerance);
        let mut uploads: Vec<Upload> = self
            .uploads
            .values()
            .filter(|u| u.file_name == file_name && u.uploaded_at >= start && u.uploaded_at <= end)
            .cloned()
            .collect();
        sort_newest_first(&mut uploads);
        Ok(uploads)
    }

    fn delete_upload(&mut self, upload_id: Uuid) -> Result<bool> {
        Ok(self.uploads.shift_remove(&upload_id).is_some())
    }

    fn save_records(&mut self, schema: &TableSchema, records: &[TypedRecord]) -> Result<()> {
        for record in records {
            if record.kind() != schema.kind {
                return Err(CfgdiffError::store(format!(
                    "Record of kind {:?} cannot be saved under {}",
                    record.kind(),
                    schema.discriminator
                )));
            }
            if !self.uploads.contains_key(&record.upload_id()) {
                return Err(CfgdiffError::upload_not_found(record.upload_id().to_string()));
            }
        }

        self.records
            .entry(schema.storage_name())
            .or_default()
            .extend_from_slice(records);
        Ok(())
    }

    fn find_records(
        &self,
        schema: &TableSchema,
        table: &str,
        upload_id: Uuid,
    ) -> Result<Vec<TypedRecord>> {
        Ok(self
            .records
            .get(schema.storage_name())
            .map(|records| {
                records
                    .iter()
                    .filter(|r| r.upload_id() == upload_id && r.table() == table)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn delete_records(&mut self, schema: &TableSchema, table: &str, upload_id: Uuid) -> Result<u64> {
        let Some(records) = self.records.get_mut(schema.storage_name()) else {
            return Ok(0);
        };
        let before = records.len();
        records.retain(|r| !(r.upload_id() == upload_id && r.table() == table));
        Ok((before - records.len()) as u64)
    }

    fn save_raw_lines(&mut self, rows: &[IntermediateRow]) -> Result<()> {
        self.raw_lines.extend_from_slice(rows);
        Ok(())
    }

    fn delete_raw_lines(&mut self, upload_id: Uuid) -> Result<u64> {
        let before = self.raw_lines.len();
        self.raw_lines.retain(|r| r.upload_id != upload_id);
        Ok((before - self.raw_lines.len()) as u64)
    }
}
