//! Wire conditions: `[column, function, value]` triples.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ProtoError;
use crate::value::Datum;

/// Comparison applied by a WHERE clause entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionFunction {
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = "includes")]
    Includes,
    #[serde(rename = "excludes")]
    Excludes,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessThanOrEqual,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
}

impl ConditionFunction {
    pub fn as_str(self) -> &'static str {
        match self {
            ConditionFunction::Equal => "==",
            ConditionFunction::NotEqual => "!=",
            ConditionFunction::Includes => "includes",
            ConditionFunction::Excludes => "excludes",
            ConditionFunction::LessThan => "<",
            ConditionFunction::LessThanOrEqual => "<=",
            ConditionFunction::GreaterThan => ">",
            ConditionFunction::GreaterThanOrEqual => ">=",
        }
    }
}

impl fmt::Display for ConditionFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionFunction {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(ConditionFunction::Equal),
            "!=" => Ok(ConditionFunction::NotEqual),
            "includes" => Ok(ConditionFunction::Includes),
            "excludes" => Ok(ConditionFunction::Excludes),
            "<" => Ok(ConditionFunction::LessThan),
            "<=" => Ok(ConditionFunction::LessThanOrEqual),
            ">" => Ok(ConditionFunction::GreaterThan),
            ">=" => Ok(ConditionFunction::GreaterThanOrEqual),
            other => Err(ProtoError::UnknownFunction(other.to_string())),
        }
    }
}

/// One WHERE clause entry of an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub function: ConditionFunction,
    pub value: Datum,
}

impl Condition {
    pub fn new(
        column: impl Into<String>,
        function: ConditionFunction,
        value: Datum,
    ) -> Condition {
        Condition {
            column: column.into(),
            function,
            value,
        }
    }

    pub fn equal(column: impl Into<String>, value: Datum) -> Condition {
        Condition::new(column, ConditionFunction::Equal, value)
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        (&self.column, self.function, &self.value).serialize(s)
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let (column, function, value) = <(String, ConditionFunction, Datum)>::deserialize(d)?;
        Ok(Condition {
            column,
            function,
            value,
        })
    }
}
