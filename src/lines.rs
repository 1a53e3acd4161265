//! Line ingestion: delimiter detection and generic header-keyed rows
//!
//! Every parsed row keeps its verbatim source line so the typed mapper can
//! re-split it positionally later.

use crate::error::{CfgdiffError, Result};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Header column carrying the table discriminator
pub const TABLE_COLUMN: &str = "TABLE";
/// Header column identifying a data row
pub const COMPANY_COLUMN: &str = "COMPANY";
pub const PRODUCT_COLUMN: &str = "PRODUCT";
pub const VERSION_COLUMN: &str = "VERSION";

/// Position of the discriminator when the header does not name it
const TABLE_POSITION: usize = 3;

/// Field delimiter of an export file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Delimiter {
    Semicolon,
    Comma,
}

impl Delimiter {
    /// Pick `;` only when it strictly outnumbers `,` on the first line
    pub fn detect(first_line: &str) -> Self {
        let semicolons = first_line.matches(';').count();
        let commas = first_line.matches(',').count();
        if semicolons > commas {
            Self::Semicolon
        } else {
            Self::Comma
        }
    }

    pub fn as_byte(&self) -> u8 {
        match self {
            Self::Semicolon => b';',
            Self::Comma => b',',
        }
    }

    pub fn as_char(&self) -> char {
        self.as_byte() as char
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One data line keyed by header name
#[derive(Debug, Clone, Serialize)]
pub struct GenericRow {
    /// 1-based physical line number in the source file
    pub line_number: usize,
    pub discriminator: String,
    pub raw_line: String,
    pub values: IndexMap<String, String>,
}

impl GenericRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(|s| s.as_str())
    }
}

/// Company/product/version triple identifying an export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub company: String,
    pub product: String,
    pub version: String,
}

/// Result of splitting a file into header and generic rows
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub delimiter: Delimiter,
    pub header: Vec<String>,
    pub rows: Vec<GenericRow>,
}

impl ParsedFile {
    /// First row carrying a non-empty company, product and version
    pub fn identity(&self) -> Option<Identity> {
        self.rows.iter().find_map(|row| {
            let company = row.get(COMPANY_COLUMN).unwrap_or_default();
            let product = row.get(PRODUCT_COLUMN).unwrap_or_default();
            let version = row.get(VERSION_COLUMN).unwrap_or_default();
            if company.is_empty() || product.is_empty() || version.is_empty() {
                None
            } else {
                Some(Identity {
                    company: company.to_string(),
                    product: product.to_string(),
                    version: version.to_string(),
                })
            }
        })
    }

    /// Rows grouped by discriminator, in first-seen order
    pub fn group_by_discriminator(&self) -> IndexMap<&str, Vec<&GenericRow>> {
        let mut groups: IndexMap<&str, Vec<&GenericRow>> = IndexMap::new();
        for row in &self.rows {
            groups
                .entry(row.discriminator.as_str())
                .or_default()
                .push(row);
        }
        groups
    }
}

/// Split a whole export into generic rows
pub fn parse(content: &str) -> Result<ParsedFile> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header_line) = lines.next().ok_or(CfgdiffError::NoData)?;
    let delimiter = Delimiter::detect(header_line);
    log::debug!("Detected delimiter: \"{}\"", delimiter);

    let header = split_fields(header_line, delimiter);
    let identity_column = if header.iter().any(|h| h == COMPANY_COLUMN) {
        COMPANY_COLUMN.to_string()
    } else {
        header.first().cloned().unwrap_or_default()
    };
    let table_position = header
        .iter()
        .position(|h| h == TABLE_COLUMN)
        .unwrap_or(TABLE_POSITION);

    let mut rows = Vec::new();
    for (index, line) in lines {
        let line_number = index + 1;
        let fields = split_fields(line, delimiter);

        let mut values = IndexMap::with_capacity(header.len());
        for (pos, column) in header.iter().enumerate() {
            values.insert(column.clone(), fields.get(pos).cloned().unwrap_or_default());
        }

        let identity_value = values
            .get(&identity_column)
            .map(|s| s.as_str())
            .unwrap_or_default();
        if identity_value == identity_column {
            log::debug!("Line {}: repeated header row, skipping", line_number);
            continue;
        }
        if identity_value.is_empty() {
            log::debug!("Line {}: no {} value, skipping", line_number, identity_column);
            continue;
        }

        let discriminator = fields.get(table_position).cloned().unwrap_or_default();
        if discriminator.is_empty() {
            log::debug!("Line {}: no valid table name found, skipping", line_number);
            continue;
        }

        rows.push(GenericRow {
            line_number,
            discriminator,
            raw_line: line.to_string(),
            values,
        });
    }

    if rows.is_empty() {
        return Err(CfgdiffError::NoData);
    }

    log::debug!("Parsed {} data rows", rows.len());
    Ok(ParsedFile {
        delimiter,
        header,
        rows,
    })
}

/// Split one line on `delimiter`, honouring double-quoted fields.
///
/// Each field is trimmed. Quotes the csv reader already removed are not
/// stripped again, so `"""x"""` yields `"x"`.
pub fn split_fields(line: &str, delimiter: Delimiter) -> Vec<String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter.as_byte())
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    let mut record = csv::StringRecord::new();

    match reader.read_record(&mut record) {
        Ok(true) => record.iter().map(reader_field).collect(),
        Ok(false) => Vec::new(),
        // A &str source cannot fail UTF-8 decoding; fall back to a plain split
        Err(_) => line.split(delimiter.as_char()).map(clean_field).collect(),
    }
}

/// The reader only unquotes a field that opens with a quote, so padded
/// fields still carry theirs
fn reader_field(field: &str) -> String {
    if field.starts_with(char::is_whitespace) {
        clean_field(field)
    } else {
        field.trim().to_string()
    }
}

fn clean_field(field: &str) -> String {
    let trimmed = field.trim();
    let unquoted = if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };
    unquoted.to_string()
}
