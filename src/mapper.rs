//! Positional mapping of raw lines onto typed records

use crate::error::CfgdiffError;
use crate::lines::{split_fields, Delimiter, GenericRow};
use crate::record::TypedRecord;
use crate::schema::TableSchema;
use rayon::prelude::*;
use serde::Serialize;
use uuid::Uuid;

/// Groups smaller than this are mapped on the calling thread
const PARALLEL_THRESHOLD: usize = 1000;

/// A line that could not be mapped onto its schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingError {
    pub table: String,
    pub line_number: usize,
    pub expected: usize,
    pub found: usize,
    pub line: String,
}

impl From<MappingError> for CfgdiffError {
    fn from(err: MappingError) -> Self {
        CfgdiffError::MalformedLine {
            table: err.table,
            line_number: err.line_number,
            expected: err.expected,
            found: err.found,
        }
    }
}

/// Outcome of mapping one discriminator group
#[derive(Debug, Clone, Default)]
pub struct MappedBatch {
    pub records: Vec<TypedRecord>,
    pub errors: Vec<MappingError>,
}

impl MappedBatch {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Map a single raw line under `schema`
pub fn map_line(
    schema: &TableSchema,
    delimiter: Delimiter,
    upload_id: Uuid,
    line_number: usize,
    raw_line: &str,
) -> Result<TypedRecord, MappingError> {
    let values = split_fields(raw_line, delimiter);

    if values.len() < schema.min_fields {
        return Err(MappingError {
            table: schema.discriminator.clone(),
            line_number,
            expected: schema.min_fields,
            found: values.len(),
            line: raw_line.to_string(),
        });
    }

    Ok(TypedRecord::from_values(schema.kind, upload_id, &values))
}

/// Map every row of one group, keeping input order in both outputs
pub fn map_rows(
    schema: &TableSchema,
    delimiter: Delimiter,
    upload_id: Uuid,
    rows: &[&GenericRow],
) -> MappedBatch {
    let map = |row: &&GenericRow| {
        map_line(schema, delimiter, upload_id, row.line_number, &row.raw_line)
    };

    let results: Vec<Result<TypedRecord, MappingError>> = if rows.len() >= PARALLEL_THRESHOLD {
        rows.par_iter().map(map).collect()
    } else {
        rows.iter().map(map).collect()
    };

    let mut batch = MappedBatch {
        records: Vec::with_capacity(results.len()),
        errors: Vec::new(),
    };
    for result in results {
        match result {
            Ok(record) => batch.records.push(record),
            Err(err) => batch.errors.push(err),
        }
    }
    batch
}
