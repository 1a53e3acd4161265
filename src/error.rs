//! Error types for cfgdiff operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CfgdiffError>;

#[derive(Error, Debug)]
pub enum CfgdiffError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("Invalid upload id: {0}")]
    Uuid(#[from] uuid::Error),

    #[error("No data found in file")]
    NoData,

    #[error("Could not find valid COMPANY, PRODUCT and VERSION in any record")]
    MissingIdentity,

    #[error("Table {table} is not supported")]
    UnsupportedTable { table: String },

    #[error("Malformed line {line_number} for table {table}: expected at least {expected} fields, found {found}")]
    MalformedLine {
        table: String,
        line_number: usize,
        expected: usize,
        found: usize,
    },

    #[error("Upload not found: {selector}")]
    UploadNotFound { selector: String },

    #[error("Upload selector {selector} is ambiguous: {matches} uploads match")]
    AmbiguousUpload { selector: String, matches: usize },

    #[error("Store error: {message}")]
    Store { message: String },

    #[error("Workspace error: {0}")]
    Workspace(String),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),
}

impl CfgdiffError {
    pub fn workspace(msg: impl Into<String>) -> Self {
        Self::Workspace(msg.into())
    }

    pub fn unsupported_table(table: impl Into<String>) -> Self {
        Self::UnsupportedTable {
            table: table.into(),
        }
    }

    pub fn upload_not_found(selector: impl Into<String>) -> Self {
        Self::UploadNotFound {
            selector: selector.into(),
        }
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }
}
