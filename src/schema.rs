//! Table schema registry
//!
//! Every supported table discriminator resolves to a [`TableSchema`] describing
//! how its lines are laid out, which fields identify a record across uploads and
//! which fields are compared. Custom variants of a table are registered as
//! aliases of the canonical discriminator and share its schema.

use crate::error::{CfgdiffError, Result};
use crate::record::{
    ParamRecord, RecordKey, RelationshipRecord, RuleDetailRecord, RuleRecord, StatusRecord,
    TypedRecord,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Suffix appended to a canonical discriminator to form its built-in custom alias
pub const CUSTOM_ALIAS_SUFFIX: &str = "_C";

/// The record shape a table maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Param,
    Status,
    Rule,
    RuleDetail,
    Relationship,
}

impl TableKind {
    pub const ALL: [TableKind; 5] = [
        TableKind::Param,
        TableKind::Status,
        TableKind::Rule,
        TableKind::RuleDetail,
        TableKind::Relationship,
    ];

    /// Field names in positional order
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Self::Param => ParamRecord::FIELDS,
            Self::Status => StatusRecord::FIELDS,
            Self::Rule => RuleRecord::FIELDS,
            Self::RuleDetail => RuleDetailRecord::FIELDS,
            Self::Relationship => RelationshipRecord::FIELDS,
        }
    }

    /// Name of the storage table holding records of this kind
    pub fn storage_name(&self) -> &'static str {
        match self {
            Self::Param => "syclo_ca000p",
            Self::Status => "syclo_ca000s",
            Self::Rule => "mfnd_c_odo03",
            Self::RuleDetail => "mfnd_c_odo03d",
            Self::Relationship => "syclo_ca000g",
        }
    }
}

/// Layout, key and comparison rules for one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    /// Canonical discriminator
    pub discriminator: String,
    pub kind: TableKind,
    pub key_fields: Vec<&'static str>,
    pub comparable_fields: Vec<&'static str>,
    /// Positional prefix a line must carry, up to and including the last key field
    pub min_fields: usize,
}

impl TableSchema {
    pub fn new(
        discriminator: impl Into<String>,
        kind: TableKind,
        key_fields: &[&'static str],
        comparable_fields: &[&'static str],
    ) -> Self {
        let fields = kind.fields();
        let min_fields = key_fields
            .iter()
            .filter_map(|key| fields.iter().position(|f| f == key))
            .max()
            .map(|pos| pos + 1)
            .unwrap_or(0);

        Self {
            discriminator: discriminator.into(),
            kind,
            key_fields: key_fields.to_vec(),
            comparable_fields: comparable_fields.to_vec(),
            min_fields,
        }
    }

    pub fn fields(&self) -> &'static [&'static str] {
        self.kind.fields()
    }

    pub fn storage_name(&self) -> &'static str {
        self.kind.storage_name()
    }

    /// Key of a record under this schema; absent values count as empty
    pub fn key_of(&self, record: &TypedRecord) -> RecordKey {
        RecordKey(
            self.key_fields
                .iter()
                .map(|field| record.get(field).unwrap_or_default().to_string())
                .collect(),
        )
    }
}

/// Catalogue of supported table discriminators
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: Vec<TableSchema>,
    index: HashMap<String, usize>,
    /// alias -> canonical discriminator, in registration order
    aliases: IndexMap<String, String>,
}

impl SchemaRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            schemas: Vec::new(),
            index: HashMap::new(),
            aliases: IndexMap::new(),
        }
    }

    /// Registry with every built-in table and its custom alias
    pub fn builtin() -> Self {
        let mut registry = Self::new();

        registry.register(TableSchema::new(
            "/SYCLO/CA000P",
            TableKind::Param,
            &["param_name"],
            &[
                "param_name", "param_value", "param_group", "dep_record_no",
                "param_type", "param_scope", "param_comment", "active", "flag_no_change",
                "enable_rule", "enable_langu_val", "rule_cat", "rule_id", "rule_input",
            ],
        ));
        registry.register(TableSchema::new(
            "/SYCLO/CA000S",
            TableKind::Status,
            &["object_type"],
            &[
                "object_type", "mobile_status", "mblstatus_label", "istat", "stsma",
                "estat", "status_attr1", "status_attr2", "flag_init_status",
                "flag_no_update", "flag_disabled",
            ],
        ));
        registry.register(TableSchema::new(
            "/MFND/C_ODO03",
            TableKind::Rule,
            &["rule_key"],
            &[
                "rule_key", "rule_no", "rule_type", "range_sign", "range_option",
                "rule_value", "rule_value1", "active", "owner_object",
            ],
        ));
        registry.register(TableSchema::new(
            "/MFND/C_ODO03D",
            TableKind::RuleDetail,
            &["rule_key"],
            &[
                "rule_key", "active", "mobile_app", "owner_object", "rule_type",
                "rule_value", "rule_value1", "rule_value2", "rule_value3",
            ],
        ));
        registry.register(TableSchema::new(
            "/SYCLO/CA000G",
            TableKind::Relationship,
            &["root_objkey"],
            &[
                "mobile_app", "assignment_no", "root_objtyp", "root_objkey",
                "child_objtyp", "child_objkey", "active", "in_scope", "rule_value3",
            ],
        ));

        let canonical: Vec<String> = registry
            .schemas
            .iter()
            .map(|s| s.discriminator.clone())
            .collect();
        for discriminator in canonical {
            let alias = format!("{}{}", discriminator, CUSTOM_ALIAS_SUFFIX);
            // Built-in aliases never collide with built-in tables
            let _ = registry.add_alias(&alias, &discriminator);
        }

        registry
    }

    /// Register a canonical schema, replacing any previous one with the same discriminator
    pub fn register(&mut self, schema: TableSchema) {
        if let Some(&pos) = self.index.get(&schema.discriminator) {
            self.schemas[pos] = schema;
        } else {
            self.index
                .insert(schema.discriminator.clone(), self.schemas.len());
            self.schemas.push(schema);
        }
    }

    /// Route `alias` to the schema of `canonical`
    pub fn add_alias(&mut self, alias: &str, canonical: &str) -> Result<()> {
        if self.index.contains_key(alias) {
            return Err(CfgdiffError::config(format!(
                "Alias '{}' collides with a canonical table",
                alias
            )));
        }
        let canonical = self
            .canonical_of(canonical)
            .ok_or_else(|| CfgdiffError::unsupported_table(canonical))?
            .to_string();
        self.aliases.insert(alias.to_string(), canonical);
        Ok(())
    }

    /// Resolve a discriminator (canonical or alias); `None` means unsupported
    pub fn resolve(&self, discriminator: &str) -> Option<&TableSchema> {
        let canonical = self.canonical_of(discriminator)?;
        self.index.get(canonical).map(|&pos| &self.schemas[pos])
    }

    /// Canonical discriminator a name maps to
    pub fn canonical_of<'a>(&'a self, discriminator: &'a str) -> Option<&'a str> {
        if self.index.contains_key(discriminator) {
            Some(discriminator)
        } else {
            self.aliases.get(discriminator).map(|s| s.as_str())
        }
    }

    pub fn is_supported(&self, discriminator: &str) -> bool {
        self.resolve(discriminator).is_some()
    }

    pub fn is_alias(&self, discriminator: &str) -> bool {
        self.aliases.contains_key(discriminator)
    }

    /// Every canonical discriminator followed by its aliases
    pub fn discriminators(&self) -> Vec<String> {
        let mut all = Vec::new();
        for schema in &self.schemas {
            all.push(schema.discriminator.clone());
            all.extend(
                self.aliases
                    .iter()
                    .filter(|(_, canonical)| **canonical == schema.discriminator)
                    .map(|(alias, _)| alias.clone()),
            );
        }
        all
    }

    /// Aliases registered for a canonical discriminator
    pub fn aliases_of(&self, canonical: &str) -> Vec<&str> {
        self.aliases
            .iter()
            .filter(|(_, c)| c.as_str() == canonical)
            .map(|(alias, _)| alias.as_str())
            .collect()
    }

    pub fn schemas(&self) -> &[TableSchema] {
        &self.schemas
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
