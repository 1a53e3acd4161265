//! Workspace configuration stored in `.cfgdiff/config.json`

use crate::error::{CfgdiffError, Result};
use crate::schema::SchemaRegistry;
use crate::upload::ANONYMOUS_OWNER;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Largest accepted upload lookup window, one day
pub const MAX_UPLOAD_TOLERANCE_SECS: i64 = 86_400;

/// Tunables persisted per workspace; CLI flags override them per invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub version: String,
    pub created: Option<DateTime<Utc>>,
    /// Records per store write
    pub batch_size: usize,
    /// Window for locating an upload by file name and approximate time
    pub upload_time_tolerance_secs: i64,
    /// Persist verbatim source lines next to the typed records
    pub keep_raw_lines: bool,
    /// Stable-sort diff records by key
    pub sort_by_key: bool,
    pub default_owner: String,
    /// Extra discriminators routed to a built-in table (alias -> canonical)
    pub table_aliases: IndexMap<String, String>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            version: crate::FORMAT_VERSION.to_string(),
            created: None,
            batch_size: crate::DEFAULT_BATCH_SIZE,
            upload_time_tolerance_secs: crate::DEFAULT_UPLOAD_TOLERANCE_SECS,
            keep_raw_lines: false,
            sort_by_key: true,
            default_owner: ANONYMOUS_OWNER.to_string(),
            table_aliases: IndexMap::new(),
        }
    }
}

impl WorkspaceConfig {
    /// Load from `path`; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            CfgdiffError::config(format!("Invalid config {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(CfgdiffError::config("batch_size must be greater than 0"));
        }
        if !(0..=MAX_UPLOAD_TOLERANCE_SECS).contains(&self.upload_time_tolerance_secs) {
            return Err(CfgdiffError::config(format!(
                "upload_time_tolerance_secs must be between 0 and {}",
                MAX_UPLOAD_TOLERANCE_SECS
            )));
        }
        // Aliases must point at a known table
        self.registry()?;
        Ok(())
    }

    /// Built-in registry extended with the configured aliases
    pub fn registry(&self) -> Result<SchemaRegistry> {
        let mut registry = SchemaRegistry::builtin();
        for (alias, canonical) in &self.table_aliases {
            registry.add_alias(alias, canonical)?;
        }
        Ok(registry)
    }

    /// Lookup window, clamped to the accepted range for unvalidated configs
    pub fn tolerance(&self) -> chrono::Duration {
        let secs = self
            .upload_time_tolerance_secs
            .clamp(0, MAX_UPLOAD_TOLERANCE_SECS);
        chrono::Duration::try_seconds(secs).unwrap_or_else(chrono::Duration::zero)
    }
}
