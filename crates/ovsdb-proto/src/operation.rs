//! The tagged operation record submitted to the server.
//!
//! The full protocol tag set is modelled; this layer only produces `insert`,
//! `update`, `mutate` and `delete`, via the constructor helpers below.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::mutation::Mutation;
use crate::value::Datum;

/// A row fragment: column name to protocol value.
pub type Row = BTreeMap<String, Datum>;

/// Operation tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpType {
    Insert,
    Select,
    Update,
    Mutate,
    Delete,
    Wait,
    Commit,
    Abort,
    Comment,
    Assert,
}

/// One row-level action within a transact request. Fields that do not apply
/// to the tag are `None` and omitted from the JSON form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub op: OpType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<Row>,
    #[serde(
        rename = "uuid-name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub uuid_name: Option<String>,
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_: Option<Vec<Condition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutations: Option<Vec<Mutation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Row>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub durable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Operation {
    fn new(op: OpType, table: impl Into<String>) -> Operation {
        Operation {
            op,
            table: table.into(),
            row: None,
            uuid_name: None,
            where_: None,
            mutations: None,
            columns: None,
            timeout: None,
            until: None,
            rows: None,
            durable: None,
            comment: None,
        }
    }

    pub fn insert(table: impl Into<String>, row: Row, uuid_name: Option<String>) -> Operation {
        Operation {
            row: Some(row),
            uuid_name,
            ..Operation::new(OpType::Insert, table)
        }
    }

    pub fn update(table: impl Into<String>, row: Row, where_: Vec<Condition>) -> Operation {
        Operation {
            row: Some(row),
            where_: Some(where_),
            ..Operation::new(OpType::Update, table)
        }
    }

    pub fn mutate(
        table: impl Into<String>,
        where_: Vec<Condition>,
        mutations: Vec<Mutation>,
    ) -> Operation {
        Operation {
            where_: Some(where_),
            mutations: Some(mutations),
            ..Operation::new(OpType::Mutate, table)
        }
    }

    pub fn delete(table: impl Into<String>, where_: Vec<Condition>) -> Operation {
        Operation {
            where_: Some(where_),
            ..Operation::new(OpType::Delete, table)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ConditionFunction;
    use crate::value::Atom;
    use serde_json::json;

    #[test]
    fn test_insert_json_shape() {
        let mut row = Row::new();
        row.insert("name".to_string(), Datum::Atom(Atom::from("br0")));
        let op = Operation::insert("Bridge", row, Some("mybridge".to_string()));
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({
                "op": "insert",
                "table": "Bridge",
                "row": {"name": "br0"},
                "uuid-name": "mybridge"
            })
        );
    }

    #[test]
    fn test_insert_without_uuid_name_omits_field() {
        let op = Operation::insert("Bridge", Row::new(), None);
        let v = serde_json::to_value(&op).unwrap();
        assert!(v.get("uuid-name").is_none());
        assert_eq!(v["row"], json!({}));
    }

    #[test]
    fn test_delete_json_shape() {
        let op = Operation::delete(
            "Bridge",
            vec![Condition::new(
                "name",
                ConditionFunction::Equal,
                Datum::Atom(Atom::from("br0")),
            )],
        );
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({
                "op": "delete",
                "table": "Bridge",
                "where": [["name", "==", "br0"]]
            })
        );
    }

    #[test]
    fn test_operation_roundtrip() {
        let mut row = Row::new();
        row.insert("tag".to_string(), Datum::set([Atom::from(6)]));
        let op = Operation::update(
            "Port",
            row,
            vec![Condition::equal("name", Datum::Atom(Atom::from("p0")))],
        );
        let v = serde_json::to_value(&op).unwrap();
        assert_eq!(serde_json::from_value::<Operation>(v).unwrap(), op);
    }
}
