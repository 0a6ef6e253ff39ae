//! Wire mutations: `[column, mutator, value]` triples.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ProtoError;
use crate::value::Datum;

/// In-place change applied to a column by a mutate operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutator {
    #[serde(rename = "insert")]
    Insert,
    #[serde(rename = "delete")]
    Delete,
    #[serde(rename = "+=")]
    Add,
    #[serde(rename = "-=")]
    Subtract,
    #[serde(rename = "*=")]
    Multiply,
    #[serde(rename = "/=")]
    Divide,
    #[serde(rename = "%=")]
    Modulo,
}

impl Mutator {
    pub fn as_str(self) -> &'static str {
        match self {
            Mutator::Insert => "insert",
            Mutator::Delete => "delete",
            Mutator::Add => "+=",
            Mutator::Subtract => "-=",
            Mutator::Multiply => "*=",
            Mutator::Divide => "/=",
            Mutator::Modulo => "%=",
        }
    }
}

impl fmt::Display for Mutator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mutator {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "insert" => Ok(Mutator::Insert),
            "delete" => Ok(Mutator::Delete),
            "+=" => Ok(Mutator::Add),
            "-=" => Ok(Mutator::Subtract),
            "*=" => Ok(Mutator::Multiply),
            "/=" => Ok(Mutator::Divide),
            "%=" => Ok(Mutator::Modulo),
            other => Err(ProtoError::UnknownMutator(other.to_string())),
        }
    }
}

/// One entry of a mutate operation's mutation list.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub column: String,
    pub mutator: Mutator,
    pub value: Datum,
}

impl Mutation {
    pub fn new(column: impl Into<String>, mutator: Mutator, value: Datum) -> Mutation {
        Mutation {
            column: column.into(),
            mutator,
            value,
        }
    }
}

impl Serialize for Mutation {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        (&self.column, self.mutator, &self.value).serialize(s)
    }
}

impl<'de> Deserialize<'de> for Mutation {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let (column, mutator, value) = <(String, Mutator, Datum)>::deserialize(d)?;
        Ok(Mutation {
            column,
            mutator,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Atom;
    use serde_json::json;

    #[test]
    fn test_mutation_serializes_as_triple() {
        let m = Mutation::new("tag", Mutator::Insert, Datum::set([Atom::from(5)]));
        assert_eq!(
            serde_json::to_value(&m).unwrap(),
            json!(["tag", "insert", ["set", [5]]])
        );
    }

    #[test]
    fn test_mutation_roundtrip() {
        let m = Mutation::new("external_ids", Mutator::Delete, Datum::set([Atom::from("foo")]));
        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(serde_json::from_value::<Mutation>(v).unwrap(), m);
    }

    #[test]
    fn test_unknown_mutator_rejected() {
        let result: Result<Mutation, _> =
            serde_json::from_value(json!(["tag", "^=", 5]));
        assert!(result.is_err());
        assert!("^=".parse::<Mutator>().is_err());
    }

    #[test]
    fn test_wrong_arity_rejected() {
        let result: Result<Mutation, _> = serde_json::from_value(json!(["tag", "insert"]));
        assert!(result.is_err());
    }
}
