//! Typed records, one variant per supported table kind

use crate::schema::TableKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Declares a record struct whose fields are assigned positionally.
///
/// The field list doubles as the positional column layout of the export, so the
/// order written here is the order values are read from a line.
macro_rules! typed_record {
    (
        $(#[$meta:meta])*
        $name:ident { $($field:ident),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            pub upload_id: Uuid,
            $(pub $field: String,)+
        }

        impl $name {
            /// Field names in positional order
            pub const FIELDS: &'static [&'static str] = &[$(stringify!($field)),+];

            /// Build a record from positional values; missing trailing values are empty
            pub fn from_values(upload_id: Uuid, values: &[String]) -> Self {
                let mut values = values.iter();
                Self {
                    upload_id,
                    $($field: values.next().cloned().unwrap_or_default(),)+
                }
            }

            pub fn get(&self, field: &str) -> Option<&str> {
                match field {
                    $(stringify!($field) => Some(self.$field.as_str()),)+
                    _ => None,
                }
            }

            pub fn values(&self) -> Vec<&str> {
                vec![$(self.$field.as_str()),+]
            }
        }
    };
}

typed_record! {
    /// Mobile application parameter (`/SYCLO/CA000P`)
    ParamRecord {
        company, product, version, table, mandt,
        record_no, param_name, param_value, param_group, dep_record_no,
        param_type, param_scope, param_comment, active, flag_no_change,
        enable_rule, enable_langu_val, rule_cat, rule_id, rule_input,
        created_by, created_ts, changed_by, changed_ts,
    }
}

typed_record! {
    /// Mobile status mapping (`/SYCLO/CA000S`)
    StatusRecord {
        company, product, version, table, mandt,
        record_no, object_type, mobile_status, mblstatus_label, istat,
        stsma, estat, status_attr1, status_attr2, flag_init_status,
        flag_no_update, flag_disabled,
        created_by, created_ts, changed_by, changed_ts,
    }
}

typed_record! {
    /// Data filter rule (`/MFND/C_ODO03`)
    RuleRecord {
        company, product, version, table, mandt,
        rule_key, rule_no, rule_type, range_sign, range_option,
        rule_value, rule_value1, active, owner_object,
        created_by, created_ts, changed_by, changed_ts,
    }
}

typed_record! {
    /// Data filter rule detail (`/MFND/C_ODO03D`)
    RuleDetailRecord {
        company, product, version, table, mandt,
        rule_key, active, mobile_app, owner_object,
        created_by, created_ts, changed_by, changed_ts,
        rule_type, rule_value, rule_value1, rule_value2, rule_value3,
    }
}

typed_record! {
    /// Object relationship assignment (`/SYCLO/CA000G`)
    RelationshipRecord {
        company, product, version, table, mandt,
        mobile_app, assignment_no, root_objtyp, root_objkey, child_objtyp,
        child_objkey, active, in_scope,
        created_by, created_ts, changed_by, changed_ts,
        rule_value3,
    }
}

/// A fully parsed row belonging to one upload and one table discriminator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypedRecord {
    Param(ParamRecord),
    Status(StatusRecord),
    Rule(RuleRecord),
    RuleDetail(RuleDetailRecord),
    Relationship(RelationshipRecord),
}

impl TypedRecord {
    /// Build the variant for `kind` from positional values
    pub fn from_values(kind: TableKind, upload_id: Uuid, values: &[String]) -> Self {
        match kind {
            TableKind::Param => Self::Param(ParamRecord::from_values(upload_id, values)),
            TableKind::Status => Self::Status(StatusRecord::from_values(upload_id, values)),
            TableKind::Rule => Self::Rule(RuleRecord::from_values(upload_id, values)),
            TableKind::RuleDetail => {
                Self::RuleDetail(RuleDetailRecord::from_values(upload_id, values))
            }
            TableKind::Relationship => {
                Self::Relationship(RelationshipRecord::from_values(upload_id, values))
            }
        }
    }

    pub fn kind(&self) -> TableKind {
        match self {
            Self::Param(_) => TableKind::Param,
            Self::Status(_) => TableKind::Status,
            Self::Rule(_) => TableKind::Rule,
            Self::RuleDetail(_) => TableKind::RuleDetail,
            Self::Relationship(_) => TableKind::Relationship,
        }
    }

    pub fn upload_id(&self) -> Uuid {
        match self {
            Self::Param(r) => r.upload_id,
            Self::Status(r) => r.upload_id,
            Self::Rule(r) => r.upload_id,
            Self::RuleDetail(r) => r.upload_id,
            Self::Relationship(r) => r.upload_id,
        }
    }

    /// Discriminator string the row carried in the source file
    pub fn table(&self) -> &str {
        self.get("table").unwrap_or_default()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        match self {
            Self::Param(r) => r.get(field),
            Self::Status(r) => r.get(field),
            Self::Rule(r) => r.get(field),
            Self::RuleDetail(r) => r.get(field),
            Self::Relationship(r) => r.get(field),
        }
    }

    /// Field values in positional order
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Param(r) => r.values(),
            Self::Status(r) => r.values(),
            Self::Rule(r) => r.values(),
            Self::RuleDetail(r) => r.values(),
            Self::Relationship(r) => r.values(),
        }
    }
}

/// Key used to match records across two uploads.
///
/// Holds one value per key field, so composite keys never depend on a join separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordKey(pub Vec<String>);

impl RecordKey {
    /// True when every key component is empty
    pub fn is_blank(&self) -> bool {
        self.0.iter().all(|part| part.is_empty())
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" / "))
    }
}

impl From<&str> for RecordKey {
    fn from(value: &str) -> Self {
        Self(vec![value.to_string()])
    }
}
