//! Upload selector parsing and resolution

use crate::error::{CfgdiffError, Result};
use crate::store::SnapshotStore;
use crate::upload::Upload;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// How a caller names an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadSelector {
    /// Exact upload id
    Id(Uuid),
    /// File name plus an approximate submission time.
    ///
    /// Compatibility lookup for callers that only kept what they saw in an
    /// upload listing; matched within the configured tolerance window.
    NearTime {
        file_name: String,
        uploaded_at: DateTime<Utc>,
    },
}

impl UploadSelector {
    pub fn near(file_name: impl Into<String>, uploaded_at: DateTime<Utc>) -> Self {
        Self::NearTime {
            file_name: file_name.into(),
            uploaded_at,
        }
    }
}

impl FromStr for UploadSelector {
    type Err = CfgdiffError;

    /// A UUID, or `<file name>@<timestamp>`
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(id) = Uuid::parse_str(s) {
            return Ok(Self::Id(id));
        }

        match s.rsplit_once('@') {
            Some((file_name, timestamp)) if !file_name.is_empty() => Ok(Self::NearTime {
                file_name: file_name.to_string(),
                uploaded_at: parse_date_string(timestamp.trim())?,
            }),
            _ => Err(CfgdiffError::invalid_input(format!(
                "Invalid upload selector '{}'. Use an upload id or '<file name>@<timestamp>'",
                s
            ))),
        }
    }
}

impl fmt::Display for UploadSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id),
            Self::NearTime {
                file_name,
                uploaded_at,
            } => write!(
                f,
                "{}@{}",
                file_name,
                uploaded_at.to_rfc3339_opts(SecondsFormat::Millis, true)
            ),
        }
    }
}

/// Turns selectors into exactly one stored upload
pub struct UploadResolver<'a, S: SnapshotStore> {
    store: &'a S,
    tolerance: Duration,
}

impl<'a, S: SnapshotStore> UploadResolver<'a, S> {
    pub fn new(store: &'a S, tolerance: Duration) -> Self {
        Self { store, tolerance }
    }

    pub fn resolve(&self, selector: &UploadSelector) -> Result<Upload> {
        match selector {
            UploadSelector::Id(id) => self
                .store
                .find_upload(*id)?
                .ok_or_else(|| CfgdiffError::upload_not_found(selector.to_string())),
            UploadSelector::NearTime {
                file_name,
                uploaded_at,
            } => {
                let mut matches =
                    self.store
                        .find_uploads_near(file_name, *uploaded_at, self.tolerance)?;
                match matches.len() {
                    0 => Err(CfgdiffError::upload_not_found(selector.to_string())),
                    1 => Ok(matches.remove(0)),
                    n => Err(CfgdiffError::AmbiguousUpload {
                        selector: selector.to_string(),
                        matches: n,
                    }),
                }
            }
        }
    }
}

/// Parse a date string in various formats
pub fn parse_date_string(date_str: &str) -> Result<DateTime<Utc>> {
    // Format 1: ISO 8601 with timezone
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Format 2: "2025-01-01 15:00:00", optionally with fractional seconds or a 'T'
    for format in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
    ] {
        if let Ok(naive_dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Ok(Utc.from_utc_datetime(&naive_dt));
        }
    }

    // Format 3: "2025-01-01" (date only, start of day)
    if let Ok(naive_date) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
        if let Some(naive_dt) = naive_date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive_dt));
        }
    }

    Err(CfgdiffError::invalid_input(format!(
        "Invalid date format: '{}'. Supported formats: 'YYYY-MM-DD', 'YYYY-MM-DD HH:MM:SS[.fff]', or ISO 8601",
        date_str
    )))
}
