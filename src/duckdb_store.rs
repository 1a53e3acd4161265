//! DuckDB-backed snapshot store used by the CLI workspace

use crate::error::{CfgdiffError, Result};
use crate::record::TypedRecord;
use crate::schema::{TableKind, TableSchema};
use crate::store::{sort_newest_first, time_window, SnapshotStore};
use crate::upload::{IntermediateRow, NewUpload, Upload, UploadStatus};
use chrono::{DateTime, Duration, TimeZone, Utc};
use duckdb::{params, params_from_iter, Connection};
use std::path::Path;
use uuid::Uuid;

const UPLOAD_COLUMNS: &str = "id, company, product, version, file_name, uploaded_by, uploaded_at, \
     total_records, records_processed, tables_processed, status, error_message, fingerprint";

/// Snapshot store persisted in a DuckDB database file
pub struct DuckDbStore {
    connection: Connection,
}

impl DuckDbStore {
    /// Open (or create) the database at `path` and make sure every table exists
    pub fn open(path: &Path) -> Result<Self> {
        let connection = Connection::open(path).map_err(|e| {
            CfgdiffError::store(format!("Failed to open store {}: {}", path.display(), e))
        })?;
        let store = Self { connection };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory()?;
        let store = Self { connection };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let mut ddl = String::from(
            "CREATE SEQUENCE IF NOT EXISTS record_row_seq;
             CREATE TABLE IF NOT EXISTS uploads (
                 id VARCHAR NOT NULL,
                 company VARCHAR,
                 product VARCHAR,
                 version VARCHAR,
                 file_name VARCHAR,
                 uploaded_by VARCHAR,
                 uploaded_at BIGINT,
                 total_records BIGINT,
                 records_processed BIGINT,
                 tables_processed VARCHAR,
                 status VARCHAR,
                 error_message VARCHAR,
                 fingerprint VARCHAR
             );
             CREATE TABLE IF NOT EXISTS intermediate_rows (
                 upload_id VARCHAR NOT NULL,
                 company VARCHAR,
                 product VARCHAR,
                 version VARCHAR,
                 \"table\" VARCHAR,
                 line_number BIGINT,
                 raw_line VARCHAR,
                 file_name VARCHAR,
                 uploaded_by VARCHAR
             );",
        );

        for kind in TableKind::ALL {
            let columns: Vec<String> = kind
                .fields()
                .iter()
                .map(|field| format!("\"{}\" VARCHAR", field))
                .collect();
            ddl.push_str(&format!(
                "CREATE TABLE IF NOT EXISTS {} (
                     row_no BIGINT DEFAULT nextval('record_row_seq'),
                     upload_id VARCHAR NOT NULL,
                     {}
                 );",
                kind.storage_name(),
                columns.join(",\n")
            ));
        }

        self.connection.execute_batch(&ddl)?;
        log::debug!("Store schema ready");
        Ok(())
    }

    fn write_upload(&self, upload: &Upload) -> Result<usize> {
        let tables = serde_json::to_string(&upload.tables_processed)?;
        let affected = self.connection.execute(
            "UPDATE uploads SET tables_processed = ?, records_processed = ?, status = ?, error_message = ?
             WHERE id = ?",
            params![
                tables,
                upload.records_processed as i64,
                upload.status.as_str(),
                upload.error_message,
                upload.id.to_string(),
            ],
        )?;
        Ok(affected)
    }

    fn existing_upload(&self, upload_id: Uuid) -> Result<Upload> {
        self.find_upload(upload_id)?
            .ok_or_else(|| CfgdiffError::upload_not_found(upload_id.to_string()))
    }

    fn query_uploads(&self, sql: &str, params: &[&dyn duckdb::ToSql]) -> Result<Vec<Upload>> {
        let mut stmt = self.connection.prepare(sql)?;
        let rows = stmt
            .query_map(params, UploadRow::read)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut uploads = rows
            .into_iter()
            .map(UploadRow::into_upload)
            .collect::<Result<Vec<_>>>()?;
        sort_newest_first(&mut uploads);
        Ok(uploads)
    }
}

/// Raw column values of one `uploads` row
struct UploadRow {
    id: String,
    company: Option<String>,
    product: Option<String>,
    version: Option<String>,
    file_name: Option<String>,
    uploaded_by: Option<String>,
    uploaded_at: i64,
    total_records: i64,
    records_processed: i64,
    tables_processed: Option<String>,
    status: String,
    error_message: Option<String>,
    fingerprint: Option<String>,
}

impl UploadRow {
    fn read(row: &duckdb::Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            company: row.get(1)?,
            product: row.get(2)?,
            version: row.get(3)?,
            file_name: row.get(4)?,
            uploaded_by: row.get(5)?,
            uploaded_at: row.get(6)?,
            total_records: row.get(7)?,
            records_processed: row.get(8)?,
            tables_processed: row.get(9)?,
            status: row.get(10)?,
            error_message: row.get(11)?,
            fingerprint: row.get(12)?,
        })
    }

    fn into_upload(self) -> Result<Upload> {
        let uploaded_at = Utc
            .timestamp_millis_opt(self.uploaded_at)
            .single()
            .ok_or_else(|| {
                CfgdiffError::store(format!("Invalid timestamp for upload {}", self.id))
            })?;
        let tables_processed = match self.tables_processed.as_deref() {
            Some(json) if !json.is_empty() => serde_json::from_str(json)?,
            _ => Vec::new(),
        };

        Ok(Upload {
            id: Uuid::parse_str(&self.id)?,
            company: self.company.unwrap_or_default(),
            product: self.product.unwrap_or_default(),
            version: self.version.unwrap_or_default(),
            file_name: self.file_name.unwrap_or_default(),
            uploaded_by: self.uploaded_by.unwrap_or_default(),
            uploaded_at,
            total_records: self.total_records.max(0) as u64,
            records_processed: self.records_processed.max(0) as u64,
            tables_processed,
            status: self.status.parse()?,
            error_message: self.error_message,
            fingerprint: self.fingerprint.unwrap_or_default(),
        })
    }
}

fn quoted_columns(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|f| format!("\"{}\"", f))
        .collect::<Vec<_>>()
        .join(", ")
}

impl SnapshotStore for DuckDbStore {
    fn create_upload(&mut self, upload: NewUpload) -> Result<Upload> {
        let upload = upload.into_upload(Uuid::new_v4());
        let tables = serde_json::to_string(&upload.tables_processed)?;

        self.connection.execute(
            &format!(
                "INSERT INTO uploads ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                UPLOAD_COLUMNS
            ),
            params![
                upload.id.to_string(),
                upload.company,
                upload.product,
                upload.version,
                upload.file_name,
                upload.uploaded_by,
                upload.uploaded_at.timestamp_millis(),
                upload.total_records as i64,
                upload.records_processed as i64,
                tables,
                upload.status.as_str(),
                upload.error_message,
                upload.fingerprint,
            ],
        )?;

        log::debug!("Created upload {} for {}", upload.id, upload.file_name);
        Ok(upload)
    }

    fn mark_table_processed(&mut self, upload_id: Uuid, table: &str, records: u64) -> Result<()> {
        let mut upload = self.existing_upload(upload_id)?;
        upload.tables_processed.push(table.to_string());
        upload.records_processed += records;
        self.write_upload(&upload)?;
        Ok(())
    }

    fn update_upload_status(
        &mut self,
        upload_id: Uuid,
        status: UploadStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        let mut upload = self.existing_upload(upload_id)?;
        upload.status = status;
        upload.error_message = error_message.map(str::to_string);
        self.write_upload(&upload)?;
        Ok(())
    }

    fn find_upload(&self, upload_id: Uuid) -> Result<Option<Upload>> {
        let sql = format!("SELECT {} FROM uploads WHERE id = ?", UPLOAD_COLUMNS);
        let id = upload_id.to_string();
        Ok(self.query_uploads(&sql, &[&id])?.into_iter().next())
    }

    fn list_uploads(&self) -> Result<Vec<Upload>> {
        let sql = format!("SELECT {} FROM uploads", UPLOAD_COLUMNS);
        self.query_uploads(&sql, &[])
    }

    fn find_uploads_near(
        &self,
        file_name: &str,
        uploaded_at: DateTime<Utc>,
        tolerance: Duration,
    ) -> Result<Vec<Upload>> {
        let sql = format!(
            "SELECT {} FROM uploads WHERE file_name = ? AND uploaded_at BETWEEN ? AND ?",
            UPLOAD_COLUMNS
        );
        let (start, end) = time_window(uploaded_at, tolerance);
        let (start, end) = (start.timestamp_millis(), end.timestamp_millis());
        self.query_uploads(&sql, &[&file_name, &start, &end])
    }

    fn delete_upload(&mut self, upload_id: Uuid) -> Result<bool> {
        let affected = self
            .connection
            .execute("DELETE FROM uploads WHERE id = ?", params![upload_id.to_string()])?;
        Ok(affected > 0)
    }

    fn save_records(&mut self, schema: &TableSchema, records: &[TypedRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut upload_ids: Vec<Uuid> = records.iter().map(|r| r.upload_id()).collect();
        upload_ids.sort();
        upload_ids.dedup();
        for upload_id in upload_ids {
            self.existing_upload(upload_id)?;
        }

        let fields = schema.fields();
        let placeholders = vec!["?"; fields.len() + 1].join(", ");
        let sql = format!(
            "INSERT INTO {} (upload_id, {}) VALUES ({})",
            schema.storage_name(),
            quoted_columns(fields),
            placeholders
        );

        let tx = self.connection.transaction()?;
        {
            let mut stmt = tx.prepare(&sql)?;
            for record in records {
                if record.kind() != schema.kind {
                    return Err(CfgdiffError::store(format!(
                        "Record of kind {:?} cannot be saved under {}",
                        record.kind(),
                        schema.discriminator
                    )));
                }
                let upload_id = record.upload_id().to_string();
                let values = std::iter::once(upload_id.as_str()).chain(record.values());
                stmt.execute(params_from_iter(values))?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn find_records(
        &self,
        schema: &TableSchema,
        table: &str,
        upload_id: Uuid,
    ) -> Result<Vec<TypedRecord>> {
        let fields = schema.fields();
        let sql = format!(
            "SELECT {} FROM {} WHERE upload_id = ? AND \"table\" = ? ORDER BY row_no",
            quoted_columns(fields),
            schema.storage_name()
        );

        let mut stmt = self.connection.prepare(&sql)?;
        let rows = stmt
            .query_map(params![upload_id.to_string(), table], |row| {
                (0..fields.len())
                    .map(|i| row.get::<_, Option<String>>(i).map(Option::unwrap_or_default))
                    .collect::<duckdb::Result<Vec<String>>>()
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows
            .iter()
            .map(|values| TypedRecord::from_values(schema.kind, upload_id, values))
            .collect())
    }

    fn delete_records(&mut self, schema: &TableSchema, table: &str, upload_id: Uuid) -> Result<u64> {
        let sql = format!(
            "DELETE FROM {} WHERE upload_id = ? AND \"table\" = ?",
            schema.storage_name()
        );
        let affected = self
            .connection
            .execute(&sql, params![upload_id.to_string(), table])?;
        Ok(affected as u64)
    }

    fn save_raw_lines(&mut self, rows: &[IntermediateRow]) -> Result<()> {
        let tx = self.connection.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO intermediate_rows
                 (upload_id, company, product, version, \"table\", line_number, raw_line, file_name, uploaded_by)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )?;
            for row in rows {
                stmt.execute(params![
                    row.upload_id.to_string(),
                    row.company,
                    row.product,
                    row.version,
                    row.table,
                    row.line_number as i64,
                    row.raw_line,
                    row.file_name,
                    row.uploaded_by,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn delete_raw_lines(&mut self, upload_id: Uuid) -> Result<u64> {
        let affected = self.connection.execute(
            "DELETE FROM intermediate_rows WHERE upload_id = ?",
            params![upload_id.to_string()],
        )?;
        Ok(affected as u64)
    }
}
