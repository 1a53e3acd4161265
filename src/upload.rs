//! Upload metadata and the transient intermediate row

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CfgdiffError;

/// Uploader recorded when none is supplied
pub const ANONYMOUS_OWNER: &str = "anonymous";

/// Lifecycle of an upload: `processing -> completed | error`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Processing,
    Completed,
    Error,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadStatus {
    type Err = CfgdiffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "error" => Ok(Self::Error),
            other => Err(CfgdiffError::store(format!("Unknown upload status '{}'", other))),
        }
    }
}

/// One ingested file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upload {
    pub id: Uuid,
    pub company: String,
    pub product: String,
    pub version: String,
    pub file_name: String,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
    /// Data rows parsed from the file, including unsupported tables
    pub total_records: u64,
    /// Typed rows saved so far
    pub records_processed: u64,
    pub tables_processed: Vec<String>,
    pub status: UploadStatus,
    pub error_message: Option<String>,
    /// BLAKE3 hex digest of the raw file bytes
    pub fingerprint: String,
}

impl Upload {
    pub fn is_completed(&self) -> bool {
        self.status == UploadStatus::Completed
    }
}

/// Fields supplied when an upload starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUpload {
    pub company: String,
    pub product: String,
    pub version: String,
    pub file_name: String,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
    pub total_records: u64,
    pub fingerprint: String,
}

impl NewUpload {
    /// Materialise as a fresh `processing` upload
    pub fn into_upload(self, id: Uuid) -> Upload {
        Upload {
            id,
            company: self.company,
            product: self.product,
            version: self.version,
            file_name: self.file_name,
            uploaded_by: self.uploaded_by,
            uploaded_at: self.uploaded_at,
            total_records: self.total_records,
            records_processed: 0,
            tables_processed: Vec::new(),
            status: UploadStatus::Processing,
            error_message: None,
            fingerprint: self.fingerprint,
        }
    }
}

/// Verbatim source line kept as an audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntermediateRow {
    pub upload_id: Uuid,
    pub company: String,
    pub product: String,
    pub version: String,
    pub table: String,
    pub line_number: usize,
    pub raw_line: String,
    pub file_name: String,
    pub uploaded_by: String,
}
