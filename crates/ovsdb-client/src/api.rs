//! The caller surface: a stateless [`Api`] over the cache, plus the
//! [`ConditionalApi`] produced by [`Api::where_`].
//!
//! Read calls (`list`, `get`) answer from the cache; write calls (`create`,
//! `update`, `mutate`, `delete`) synthesize operations for a transport
//! component to submit. Nothing here performs I/O.

use tracing::debug;

use ovsdb_proto::{Mutation, Mutator, NativeValue, Operation, UUID_COLUMN};

use crate::cache::TableCache;
use crate::condition::{ConditionFactory, FieldCondition};
use crate::error::{Error, Result};
use crate::mapper::Info;
use crate::model::{FieldRef, Model};

/// Caller-side mutation entry: a field reference into a model value, a
/// mutator and a native value.
#[derive(Debug, Clone)]
pub struct FieldMutation {
    pub field: FieldRef,
    pub mutator: Mutator,
    pub value: NativeValue,
}

impl FieldMutation {
    pub fn new(field: FieldRef, mutator: Mutator, value: impl Into<NativeValue>) -> FieldMutation {
        FieldMutation {
            field,
            mutator,
            value: value.into(),
        }
    }
}

/// The typed API over a row cache.
#[derive(Clone, Copy)]
pub struct Api<'a> {
    cache: &'a TableCache,
}

impl<'a> Api<'a> {
    pub fn new(cache: &'a TableCache) -> Api<'a> {
        Api { cache }
    }

    /// Fill `out` with rows of the table implied by its element type, up to
    /// `out`'s pre-existing capacity. Zero capacity means unbounded.
    pub fn list<M: Model>(&self, out: &mut Vec<M>) -> Result<()> {
        let info = Info::<M>::new(self.cache.schema())?;
        let Some(snapshot) = self.cache.snapshot(M::table_name()) else {
            return Ok(());
        };
        let cap = out.capacity();
        for (uuid, row) in snapshot.iter() {
            if cap > 0 && out.len() >= cap {
                break;
            }
            out.push(info.decode_row(uuid, row)?);
        }
        Ok(())
    }

    /// Populate `model` from the cached row matching its first valid index.
    pub fn get<M: Model>(&self, model: &mut M) -> Result<()> {
        let info = Info::<M>::new(self.cache.schema())?;
        let columns = info.index_columns(model, &[])?;
        let Some(snapshot) = self.cache.snapshot(M::table_name()) else {
            return Err(Error::NotFound);
        };
        for (uuid, row) in snapshot.iter() {
            let candidate = info.decode_row(uuid, row)?;
            if info.equal_fields(model, &candidate, &columns)? {
                *model = candidate;
                return Ok(());
            }
        }
        Err(Error::NotFound)
    }

    /// One insert operation per model. The row carries the non-default
    /// columns; a non-default `_uuid` rides in the `uuid-name` slot. Any
    /// failing model fails the whole call with no operations.
    pub fn create<M: Model>(&self, models: &[M]) -> Result<Vec<Operation>> {
        let info = Info::<M>::new(self.cache.schema())?;
        let mut ops = Vec::with_capacity(models.len());
        for model in models {
            let row = info.new_row(model)?;
            let uuid_name = if info.has_column(UUID_COLUMN) {
                info.field_by_column(model, UUID_COLUMN)?
                    .as_string()
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            } else {
                None
            };
            ops.push(Operation::insert(M::table_name(), row, uuid_name));
        }
        debug!(
            table = M::table_name(),
            count = ops.len(),
            "generated insert operations"
        );
        Ok(ops)
    }

    /// Bind a condition factory, yielding the conditional API.
    pub fn where_<M: Model>(&self, factory: ConditionFactory<'a, M>) -> ConditionalApi<'a, M> {
        ConditionalApi {
            cache: self.cache,
            factory,
        }
    }

    /// Equality-on-first-valid-index factory, or an explicit factory when
    /// caller conditions are given. Construction defects are captured and
    /// surface at the first terminal call.
    pub fn condition_from_model<M: Model>(
        &self,
        model: &M,
        conditions: &[FieldCondition],
    ) -> ConditionFactory<'a, M> {
        if conditions.is_empty() {
            ConditionFactory::equality(self.cache, model, &[])
        } else {
            ConditionFactory::explicit(self.cache, model, conditions)
        }
    }

    /// Predicate factory over an arbitrary boolean function of a row.
    pub fn condition_from_fn<M, F>(&self, predicate: F) -> ConditionFactory<'a, M>
    where
        M: Model,
        F: Fn(&M) -> bool + Send + Sync + 'a,
    {
        ConditionFactory::predicate(self.cache, predicate)
    }
}

/// The API bound to one condition factory.
pub struct ConditionalApi<'a, M: Model> {
    cache: &'a TableCache,
    factory: ConditionFactory<'a, M>,
}

impl<'a, M: Model> ConditionalApi<'a, M> {
    pub fn factory(&self) -> &ConditionFactory<'a, M> {
        &self.factory
    }

    /// Fill `out` with the cached rows the factory matches, applying the
    /// same capacity rule as [`Api::list`].
    pub fn list(&self, out: &mut Vec<M>) -> Result<()> {
        let info = Info::<M>::new(self.cache.schema())?;
        let Some(snapshot) = self.cache.snapshot(M::table_name()) else {
            return Ok(());
        };
        let cap = out.capacity();
        for (uuid, row) in snapshot.iter() {
            if cap > 0 && out.len() >= cap {
                break;
            }
            let candidate = info.decode_row(uuid, row)?;
            if self.factory.matches(&candidate)? {
                out.push(candidate);
            }
        }
        Ok(())
    }

    /// One update operation per generated condition. The row carries
    /// `model`'s non-default columns; each operation carries exactly one
    /// condition, preserving the per-row mapping of matches to operations.
    pub fn update(&self, model: &M) -> Result<Vec<Operation>> {
        let conditions = self.factory.generate()?;
        if conditions.is_empty() {
            return Ok(Vec::new());
        }
        let info = Info::<M>::new(self.cache.schema())?;
        let row = info.new_row(model)?;
        let ops: Vec<Operation> = conditions
            .into_iter()
            .map(|condition| Operation::update(M::table_name(), row.clone(), vec![condition]))
            .collect();
        debug!(
            table = M::table_name(),
            count = ops.len(),
            "generated update operations"
        );
        Ok(ops)
    }

    /// One mutate operation per generated condition, each carrying the full
    /// resolved mutation list. Field references resolve against `model`.
    pub fn mutate(&self, model: &M, mutations: &[FieldMutation]) -> Result<Vec<Operation>> {
        let conditions = self.factory.generate()?;
        if conditions.is_empty() {
            return Ok(Vec::new());
        }
        let info = Info::<M>::new(self.cache.schema())?;
        let wire: Vec<Mutation> = mutations
            .iter()
            .map(|m| {
                let column = info.column_by_ref(model, m.field)?;
                let value = info.encode_mutation_value(column, &m.value)?;
                Ok(Mutation::new(column, m.mutator, value))
            })
            .collect::<Result<_>>()?;
        let ops: Vec<Operation> = conditions
            .into_iter()
            .map(|condition| Operation::mutate(M::table_name(), vec![condition], wire.clone()))
            .collect();
        debug!(
            table = M::table_name(),
            count = ops.len(),
            "generated mutate operations"
        );
        Ok(ops)
    }

    /// One delete operation per generated condition.
    pub fn delete(&self) -> Result<Vec<Operation>> {
        let conditions = self.factory.generate()?;
        if conditions.is_empty() {
            return Ok(Vec::new());
        }
        let ops: Vec<Operation> = conditions
            .into_iter()
            .map(|condition| Operation::delete(M::table_name(), vec![condition]))
            .collect();
        debug!(
            table = M::table_name(),
            count = ops.len(),
            "generated delete operations"
        );
        Ok(ops)
    }
}
