//! # ovsdb-proto
//!
//! The OVSDB wire model: protocol values with their set/map/uuid encodings,
//! the schema types this layer consumes (columns, cardinalities, indexes),
//! the native-value bridge, and the condition/mutation/operation records
//! submitted to a server.
//!
//! ```
//! use ovsdb_proto::{Atom, Condition, ConditionFunction, Datum, Operation};
//!
//! let cond = Condition::new("name", ConditionFunction::Equal, Datum::Atom(Atom::from("br0")));
//! let op = Operation::delete("Bridge", vec![cond]);
//! assert_eq!(serde_json::to_value(&op).unwrap()["op"], "delete");
//! ```

pub mod condition;
pub mod error;
pub mod mutation;
pub mod native;
pub mod operation;
pub mod schema;
pub mod value;

pub use condition::{Condition, ConditionFunction};
pub use error::ProtoError;
pub use mutation::{Mutation, Mutator};
pub use native::{
    NativeScalar, NativeValue, atom_to_scalar, datum_to_native, native_to_datum,
    native_to_mutation_datum, scalar_to_atom,
};
pub use operation::{OpType, Operation, Row};
pub use schema::{
    AtomicType, ColumnSchema, ColumnType, DatabaseSchema, Max, NativeAtomKind, NativeKind,
    TableSchema, UUID_COLUMN,
};
pub use value::{Atom, Datum};
