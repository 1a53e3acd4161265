//! # cfgdiff
//!
//! Ingests delimited configuration exports as typed, per-table snapshots and
//! reports record-level differences between any two of them.

pub mod cli;
pub mod commands;
pub mod compare;
pub mod config;
pub mod diff;
pub mod duckdb_store;
pub mod error;
pub mod hash;
pub mod lines;
pub mod mapper;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod record;
pub mod resolver;
pub mod schema;
pub mod service;
pub mod store;
pub mod upload;
pub mod workspace;

pub use compare::{ComparisonReport, DiffSummary, TableScope};
pub use config::WorkspaceConfig;
pub use diff::{DiffKind, DiffRecord, TableDiffResult};
pub use duckdb_store::DuckDbStore;
pub use error::{CfgdiffError, Result};
pub use pipeline::{IngestOptions, IngestSummary};
pub use record::{RecordKey, TypedRecord};
pub use resolver::UploadSelector;
pub use schema::{SchemaRegistry, TableSchema};
pub use service::SnapshotService;
pub use store::{MemoryStore, SnapshotStore};
pub use upload::{Upload, UploadStatus};
pub use workspace::CfgdiffWorkspace;

/// Current format version for workspace files
pub const FORMAT_VERSION: &str = "1.0.0";

/// Default number of records per store write
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Default window for locating an upload by file name and time, in seconds
pub const DEFAULT_UPLOAD_TOLERANCE_SECS: i64 = 5;
