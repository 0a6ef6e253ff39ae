//! Schema-aware mapping between model values and protocol rows.
//!
//! An [`Info`] is the bidirectional bridge for one model type against one
//! table schema. It is cheap to build, validated on construction, and scoped
//! to a single public call.

use std::marker::PhantomData;

use ovsdb_proto::{
    ColumnSchema, Condition, DatabaseSchema, Datum, NativeValue, Row, TableSchema, UUID_COLUMN,
    datum_to_native, native_to_datum, native_to_mutation_datum,
};

use crate::error::{ConditionError, Error, MapperError};
use crate::model::{FieldBinding, FieldRef, Model};

/// The mapping between a model type and its table schema.
#[derive(Debug)]
pub struct Info<'s, M: Model> {
    table: &'s TableSchema,
    _model: PhantomData<fn() -> M>,
}

impl<'s, M: Model> Info<'s, M> {
    /// Build and validate the mapping: every bound column must exist in the
    /// schema and declare the native shape the field carries.
    pub fn new(schema: &'s DatabaseSchema) -> Result<Info<'s, M>, Error> {
        let table_name = M::table_name();
        let table = schema
            .table(table_name)
            .ok_or_else(|| Error::UnknownTable(table_name.to_string()))?;

        for binding in M::bindings() {
            let column = table.column(binding.column).ok_or_else(|| {
                Error::Mapper(MapperError::ColumnNotFound {
                    table: table_name.to_string(),
                    column: binding.column.to_string(),
                })
            })?;
            let expected = column.native_kind();
            if binding.kind != expected {
                return Err(MapperError::WrongNativeType {
                    table: table_name.to_string(),
                    column: binding.column.to_string(),
                    field: binding.field.to_string(),
                    expected: expected.to_string(),
                    got: binding.kind.to_string(),
                }
                .into());
            }
        }

        Ok(Info {
            table,
            _model: PhantomData,
        })
    }

    pub fn table(&self) -> &TableSchema {
        self.table
    }

    fn binding(&self, column: &str) -> Result<&'static FieldBinding<M>, Error> {
        M::bindings()
            .iter()
            .find(|b| b.column == column)
            .ok_or_else(|| {
                Error::Mapper(MapperError::ColumnNotFound {
                    table: M::table_name().to_string(),
                    column: column.to_string(),
                })
            })
    }

    fn column_schema(&self, column: &str) -> Result<&ColumnSchema, Error> {
        self.table.column(column).ok_or_else(|| {
            Error::Mapper(MapperError::ColumnNotFound {
                table: M::table_name().to_string(),
                column: column.to_string(),
            })
        })
    }

    pub fn has_column(&self, column: &str) -> bool {
        M::bindings().iter().any(|b| b.column == column)
    }

    /// The native value of the field bound to `column`.
    pub fn field_by_column(&self, model: &M, column: &str) -> Result<NativeValue, Error> {
        Ok((self.binding(column)?.get)(model))
    }

    /// Assign `value` to the field bound to `column`.
    pub fn set_field(&self, model: &mut M, column: &str, value: NativeValue) -> Result<(), Error> {
        (self.binding(column)?.set)(model, value).map_err(Error::from)
    }

    /// Resolve a field reference taken from `model` to its column name.
    pub fn column_by_ref(&self, model: &M, field: FieldRef) -> Result<&'static str, Error> {
        M::bindings()
            .iter()
            .find(|b| (b.addr)(model) == field.addr())
            .map(|b| b.column)
            .ok_or(Error::Mapper(MapperError::FieldNotBound))
    }

    /// The schema indexes (with `_uuid` prepended) for which every column is
    /// bound and holds a non-default value on `model`, in candidate order.
    pub fn valid_indexes(&self, model: &M) -> Vec<Vec<String>> {
        let mut candidates: Vec<Vec<String>> = Vec::with_capacity(self.table.indexes.len() + 1);
        candidates.push(vec![UUID_COLUMN.to_string()]);
        candidates.extend(self.table.indexes.iter().cloned());
        candidates.retain(|index| {
            !index.is_empty()
                && index.iter().all(|column| {
                    M::bindings()
                        .iter()
                        .find(|b| b.column == column)
                        .is_some_and(|b| !(b.is_default)(model))
                })
        });
        candidates
    }

    /// The match group for an equality condition: the given fields verbatim,
    /// or the first valid index when none are given.
    pub fn index_columns(&self, model: &M, fields: &[FieldRef]) -> Result<Vec<String>, Error> {
        if fields.is_empty() {
            self.valid_indexes(model)
                .into_iter()
                .next()
                .ok_or(Error::Condition(ConditionError::NoIndex))
        } else {
            fields
                .iter()
                .map(|f| self.column_by_ref(model, *f).map(str::to_string))
                .collect()
        }
    }

    /// Encode the model's value for one column.
    pub fn encode_column(&self, model: &M, column: &str) -> Result<Datum, Error> {
        let value = self.field_by_column(model, column)?;
        Ok(native_to_datum(&self.column_schema(column)?.ty, &value)?)
    }

    /// Encode an arbitrary native value for a column, requiring the declared
    /// native type.
    pub fn encode_value(&self, column: &str, value: &NativeValue) -> Result<Datum, Error> {
        Ok(native_to_datum(&self.column_schema(column)?.ty, value)?)
    }

    /// Encode a mutation payload for a column (shape-mismatched payloads such
    /// as a set of keys deleted from a map are allowed).
    pub fn encode_mutation_value(&self, column: &str, value: &NativeValue) -> Result<Datum, Error> {
        Ok(native_to_mutation_datum(
            &self.column_schema(column)?.ty,
            value,
        )?)
    }

    /// One equality condition per column, in column-name order.
    pub fn equality_conditions(&self, model: &M, columns: &[String]) -> Result<Vec<Condition>, Error> {
        let mut columns: Vec<&String> = columns.iter().collect();
        columns.sort();
        columns.dedup();
        columns
            .into_iter()
            .map(|c| Ok(Condition::equal(c.clone(), self.encode_column(model, c)?)))
            .collect()
    }

    /// Protocol-encoding equality of two models on the given columns.
    pub fn equal_fields(&self, a: &M, b: &M, columns: &[String]) -> Result<bool, Error> {
        for column in columns {
            let da = self.encode_column(a, column)?;
            let db = self.encode_column(b, column)?;
            if !da.matches(&db) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// The operation row fragment for `model`: every non-default column
    /// except `_uuid`, encoded per the column schema.
    pub fn new_row(&self, model: &M) -> Result<Row, Error> {
        let mut row = Row::new();
        for binding in M::bindings() {
            if binding.column == UUID_COLUMN || (binding.is_default)(model) {
                continue;
            }
            let datum = native_to_datum(
                &self.column_schema(binding.column)?.ty,
                &(binding.get)(model),
            )?;
            row.insert(binding.column.to_string(), datum);
        }
        Ok(row)
    }

    /// A complete cache-shaped row for `model`: every bound column except
    /// `_uuid`, defaults included.
    pub fn full_row(&self, model: &M) -> Result<Row, Error> {
        let mut row = Row::new();
        for binding in M::bindings() {
            if binding.column == UUID_COLUMN {
                continue;
            }
            let datum = native_to_datum(
                &self.column_schema(binding.column)?.ty,
                &(binding.get)(model),
            )?;
            row.insert(binding.column.to_string(), datum);
        }
        Ok(row)
    }

    /// Decode a cached row (keyed by `uuid`) into a fresh model value.
    /// Columns the model does not bind are skipped.
    pub fn decode_row(&self, uuid: &str, row: &Row) -> Result<M, Error> {
        let mut model = M::default();
        if self.has_column(UUID_COLUMN) {
            self.set_field(&mut model, UUID_COLUMN, NativeValue::from(uuid))?;
        }
        for (column, datum) in row {
            if column == UUID_COLUMN {
                continue;
            }
            let Ok(binding) = self.binding(column) else {
                continue;
            };
            let value = datum_to_native(&self.column_schema(column)?.ty, datum)?;
            (binding.set)(&mut model, value).map_err(Error::from)?;
        }
        Ok(model)
    }
}
