//! Database schema types: tables, columns, cardinalities and indexes.
//!
//! Only the parts of the protocol schema this layer consumes are modelled:
//! per-column value types with min/max cardinality and the per-table index
//! list. Column types deserialize from both the bare atomic-type string and
//! the object form (`{"key": .., "value": .., "min": .., "max": ..}`).

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::ProtoError;

/// The column holding a row's identity. Schemas do not declare it; the layer
/// treats it as a built-in uuid-typed column of every table.
pub const UUID_COLUMN: &str = "_uuid";

/// One of the protocol's five atomic value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AtomicType {
    Integer,
    Real,
    Boolean,
    String,
    Uuid,
}

impl AtomicType {
    pub fn as_str(self) -> &'static str {
        match self {
            AtomicType::Integer => "integer",
            AtomicType::Real => "real",
            AtomicType::Boolean => "boolean",
            AtomicType::String => "string",
            AtomicType::Uuid => "uuid",
        }
    }

    /// The native (model-side) representation of this atomic type. Uuids are
    /// carried as strings so caller-named placeholders stay expressible.
    pub fn native(self) -> NativeAtomKind {
        match self {
            AtomicType::Integer => NativeAtomKind::Integer,
            AtomicType::Real => NativeAtomKind::Real,
            AtomicType::Boolean => NativeAtomKind::Boolean,
            AtomicType::String | AtomicType::Uuid => NativeAtomKind::String,
        }
    }
}

impl fmt::Display for AtomicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AtomicType {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "integer" => Ok(AtomicType::Integer),
            "real" => Ok(AtomicType::Real),
            "boolean" => Ok(AtomicType::Boolean),
            "string" => Ok(AtomicType::String),
            "uuid" => Ok(AtomicType::Uuid),
            other => Err(ProtoError::UnknownAtomicType(other.to_string())),
        }
    }
}

/// The shape of a native value as the model side sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeAtomKind {
    String,
    Integer,
    Real,
    Boolean,
}

impl fmt::Display for NativeAtomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NativeAtomKind::String => "string",
            NativeAtomKind::Integer => "integer",
            NativeAtomKind::Real => "real",
            NativeAtomKind::Boolean => "boolean",
        };
        f.write_str(s)
    }
}

/// The native shape of a whole column: a required scalar, a set (covering
/// optional scalars declared `min 0 max 1`), or a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeKind {
    Scalar(NativeAtomKind),
    Set(NativeAtomKind),
    Map(NativeAtomKind, NativeAtomKind),
}

impl fmt::Display for NativeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeKind::Scalar(a) => write!(f, "{a}"),
            NativeKind::Set(a) => write!(f, "set of {a}"),
            NativeKind::Map(k, v) => write!(f, "map of {k} to {v}"),
        }
    }
}

/// Upper cardinality bound of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Max {
    Unlimited,
    At(u64),
}

/// A column's declared value type.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnType {
    pub key: AtomicType,
    pub value: Option<AtomicType>,
    pub min: u64,
    pub max: Max,
}

impl ColumnType {
    /// A required single-valued column of the given atomic type.
    pub fn scalar(key: AtomicType) -> ColumnType {
        ColumnType {
            key,
            value: None,
            min: 1,
            max: Max::At(1),
        }
    }

    pub fn native_kind(&self) -> NativeKind {
        if let Some(value) = self.value {
            NativeKind::Map(self.key.native(), value.native())
        } else if self.min == 1 && self.max == Max::At(1) {
            NativeKind::Scalar(self.key.native())
        } else {
            NativeKind::Set(self.key.native())
        }
    }

    fn from_json(v: &Value) -> Result<ColumnType, ProtoError> {
        match v {
            Value::String(s) => Ok(ColumnType::scalar(s.parse()?)),
            Value::Object(obj) => {
                let key = obj
                    .get("key")
                    .ok_or_else(|| ProtoError::Malformed {
                        kind: "column type",
                        reason: "missing key".to_string(),
                    })
                    .and_then(base_type)?;
                let value = obj.get("value").map(base_type).transpose()?;
                let min = match obj.get("min") {
                    None => 1,
                    Some(m) => m.as_u64().ok_or_else(|| ProtoError::Malformed {
                        kind: "column type",
                        reason: "min must be a non-negative integer".to_string(),
                    })?,
                };
                let max = match obj.get("max") {
                    None => Max::At(1),
                    Some(Value::String(s)) if s == "unlimited" => Max::Unlimited,
                    Some(m) => Max::At(m.as_u64().ok_or_else(|| ProtoError::Malformed {
                        kind: "column type",
                        reason: "max must be an integer or \"unlimited\"".to_string(),
                    })?),
                };
                Ok(ColumnType {
                    key,
                    value,
                    min,
                    max,
                })
            }
            other => Err(ProtoError::Malformed {
                kind: "column type",
                reason: format!("unexpected {other}"),
            }),
        }
    }
}

/// Parse a base type, which is either an atomic-type string or an object
/// whose `type` member names one (reference annotations are ignored).
fn base_type(v: &Value) -> Result<AtomicType, ProtoError> {
    match v {
        Value::String(s) => s.parse(),
        Value::Object(obj) => obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ProtoError::Malformed {
                kind: "base type",
                reason: "missing type member".to_string(),
            })?
            .parse(),
        other => Err(ProtoError::Malformed {
            kind: "base type",
            reason: format!("unexpected {other}"),
        }),
    }
}

impl Serialize for ColumnType {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        if self.value.is_none() && self.min == 1 && self.max == Max::At(1) {
            return self.key.serialize(s);
        }
        let mut m = s.serialize_map(None)?;
        m.serialize_entry("key", &self.key)?;
        if let Some(value) = &self.value {
            m.serialize_entry("value", value)?;
        }
        m.serialize_entry("min", &self.min)?;
        match self.max {
            Max::Unlimited => m.serialize_entry("max", "unlimited")?,
            Max::At(n) => m.serialize_entry("max", &n)?,
        }
        m.end()
    }
}

impl<'de> Deserialize<'de> for ColumnType {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let v = Value::deserialize(d)?;
        ColumnType::from_json(&v).map_err(serde::de::Error::custom)
    }
}

/// Schema of a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    #[serde(rename = "type")]
    pub ty: ColumnType,
}

impl ColumnSchema {
    pub fn new(ty: ColumnType) -> ColumnSchema {
        ColumnSchema { ty }
    }

    pub fn native_kind(&self) -> NativeKind {
        self.ty.native_kind()
    }
}

static UUID_SCHEMA: LazyLock<ColumnSchema> =
    LazyLock::new(|| ColumnSchema::new(ColumnType::scalar(AtomicType::Uuid)));

/// Schema of a single table: its columns plus the column groups whose
/// combined values must be unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub columns: BTreeMap<String, ColumnSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<Vec<String>>,
}

impl TableSchema {
    /// Look up a column, resolving `_uuid` to the built-in uuid column.
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        if name == UUID_COLUMN {
            Some(&UUID_SCHEMA)
        } else {
            self.columns.get(name)
        }
    }
}

/// Schema of a whole database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    pub tables: HashMap<String, TableSchema>,
}

impl DatabaseSchema {
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }
}
