//! Error types for the typed client layer.

use ovsdb_proto::ProtoError;
use thiserror::Error;

/// Failures bridging a model type to its table schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapperError {
    #[error("column {column} does not exist in table {table}")]
    ColumnNotFound { table: String, column: String },

    #[error("column {column}: field {field} is {got}, column expects {expected}")]
    WrongNativeType {
        table: String,
        column: String,
        field: String,
        expected: String,
        got: String,
    },

    #[error("field reference does not correspond to a bound field of the model")]
    FieldNotBound,

    #[error("column {column}: value is not assignable to field {field}")]
    CannotAssign { column: String, field: String },

    #[error(transparent)]
    Codec(#[from] ProtoError),
}

/// Failures building or evaluating condition factories.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConditionError {
    #[error("no index matches the provided model")]
    NoIndex,

    #[error("explicit conditions cannot be evaluated locally")]
    ExplicitLocalMatch,
}

/// Top-level error surfaced by every public operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Mapper(#[from] MapperError),

    #[error(transparent)]
    Condition(#[from] ConditionError),

    #[error("object not found")]
    NotFound,

    #[error("table {0} is not part of the schema")]
    UnknownTable(String),
}

impl From<ProtoError> for Error {
    fn from(e: ProtoError) -> Error {
        Error::Mapper(MapperError::Codec(e))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
