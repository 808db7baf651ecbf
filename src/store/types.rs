//! Record, metadata and query types shared by the engine and store backends.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pointer to another record (logical name + id), optionally carrying the
/// display name the store returned alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityReference {
    pub entity: String,
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EntityReference {
    pub fn new(entity: impl Into<String>, id: Uuid) -> Self {
        Self {
            entity: entity.into(),
            id,
            name: None,
        }
    }

    pub fn named(entity: impl Into<String>, id: Uuid, name: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            id,
            name: Some(name.into()),
        }
    }
}

/// Typed value of a single record field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    /// Enumeration code, resolved to a label through entity metadata
    OptionSet(i32),
    Reference(EntityReference),
    Id(Uuid),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Equality as used by query conditions: a reference matches an id
    /// condition when it points at that id.
    pub fn matches(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (FieldValue::Reference(r), FieldValue::Id(id))
            | (FieldValue::Id(id), FieldValue::Reference(r)) => r.id == *id,
            (FieldValue::Reference(a), FieldValue::Reference(b)) => {
                a.id == b.id && a.entity == b.entity
            }
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Decimal(n) => write!(f, "{}", n),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            FieldValue::OptionSet(code) => write!(f, "{}", code),
            FieldValue::Reference(r) => write!(f, "{}", r.id),
            FieldValue::Id(id) => write!(f, "{}", id),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<EntityReference> for FieldValue {
    fn from(r: EntityReference) -> Self {
        FieldValue::Reference(r)
    }
}

/// A record owned by the external store. The engine only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub entity: String,
    pub id: Uuid,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new(entity: impl Into<String>, id: Uuid) -> Self {
        Self {
            entity: entity.into(),
            id,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Field value, treating an explicit `Null` the same as an absent field
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field).filter(|v| !v.is_null())
    }

    /// Populated reference stored in `field`, if any
    pub fn reference(&self, field: &str) -> Option<&EntityReference> {
        match self.get(field) {
            Some(FieldValue::Reference(r)) => Some(r),
            _ => None,
        }
    }

    /// Text stored in `field`, if any
    pub fn text(&self, field: &str) -> Option<&str> {
        match self.get(field) {
            Some(FieldValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn to_reference(&self) -> EntityReference {
        EntityReference::new(self.entity.clone(), self.id)
    }

    /// Copy of this record limited to the given column set
    pub fn project(&self, columns: &ColumnSet) -> Record {
        match columns {
            ColumnSet::All => self.clone(),
            ColumnSet::Columns(names) => Record {
                entity: self.entity.clone(),
                id: self.id,
                fields: self
                    .fields
                    .iter()
                    .filter(|(k, _)| names.iter().any(|n| n == *k))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            },
        }
    }
}

/// Columns requested from the store
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnSet {
    #[default]
    All,
    Columns(Vec<String>),
}

impl ColumnSet {
    pub fn of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ColumnSet::Columns(names.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equal,
    NotEqual,
    Null,
    NotNull,
}

/// Single filter condition of a [`Query`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: ConditionOperator,
    #[serde(default = "null_value")]
    pub value: FieldValue,
}

fn null_value() -> FieldValue {
    FieldValue::Null
}

impl Condition {
    pub fn equal(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            field: field.into(),
            operator: ConditionOperator::Equal,
            value: value.into(),
        }
    }

    pub fn is_satisfied_by(&self, record: &Record) -> bool {
        let current = record.get(&self.field);
        match self.operator {
            ConditionOperator::Equal => current.is_some_and(|v| v.matches(&self.value)),
            ConditionOperator::NotEqual => !current.is_some_and(|v| v.matches(&self.value)),
            ConditionOperator::Null => current.is_none(),
            ConditionOperator::NotNull => current.is_some(),
        }
    }
}

/// Filtered query over one entity; all conditions are AND-ed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub entity: String,
    #[serde(default)]
    pub columns: ColumnSet,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Query {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            columns: ColumnSet::All,
            conditions: Vec::new(),
        }
    }

    pub fn columns(mut self, columns: ColumnSet) -> Self {
        self.columns = columns;
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        record.entity == self.entity && self.conditions.iter().all(|c| c.is_satisfied_by(record))
    }
}

/// One (code, label) pair of an enumeration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionMetadata {
    pub value: i32,
    pub label: String,
}

/// Type descriptor of an entity attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttributeKind {
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
    DateTime,
    Picklist {
        #[serde(default)]
        options: Vec<OptionMetadata>,
    },
    Lookup,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeMetadata {
    pub name: String,
    #[serde(flatten)]
    pub kind: AttributeKind,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub entity: String,
    #[serde(default)]
    pub attributes: Vec<AttributeMetadata>,
}

impl EntityMetadata {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            attributes: Vec::new(),
        }
    }

    pub fn attribute(mut self, name: impl Into<String>, kind: AttributeKind) -> Self {
        self.attributes.push(AttributeMetadata {
            name: name.into(),
            kind,
        });
        self
    }

    /// Attribute lookup, case-insensitive like the CRM metadata service
    pub fn find(&self, name: &str) -> Option<&AttributeMetadata> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Options of a picklist attribute; `None` when the attribute is missing
    /// or is not a picklist
    pub fn options(&self, name: &str) -> Option<&[OptionMetadata]> {
        match self.find(name).map(|a| &a.kind) {
            Some(AttributeKind::Picklist { options }) => Some(options.as_slice()),
            _ => None,
        }
    }
}
