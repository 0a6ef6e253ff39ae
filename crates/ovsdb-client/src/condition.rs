//! Condition factories: the bridge from typed models to WHERE clauses.
//!
//! Every factory exposes one contract: `matches` tests a candidate row
//! locally, `generate` produces the wire conditions an operation will carry.
//! Construction defects are captured in the error variant and surface at the
//! first call, so a `where_(..)` chain is always well-formed.

use ovsdb_proto::{Atom, Condition, ConditionFunction, Datum, NativeValue, UUID_COLUMN};

use crate::cache::TableCache;
use crate::error::{ConditionError, Error, Result};
use crate::mapper::Info;
use crate::model::{FieldRef, Model};

/// Caller-side condition entry: a field reference into a model value, a
/// comparison function and a native value.
#[derive(Debug, Clone)]
pub struct FieldCondition {
    pub field: FieldRef,
    pub function: ConditionFunction,
    pub value: NativeValue,
}

impl FieldCondition {
    pub fn new(
        field: FieldRef,
        function: ConditionFunction,
        value: impl Into<NativeValue>,
    ) -> FieldCondition {
        FieldCondition {
            field,
            function,
            value: value.into(),
        }
    }
}

type Predicate<'a, M> = Box<dyn Fn(&M) -> bool + Send + Sync + 'a>;

/// A condition factory for rows of table `M::table_name()`.
pub struct ConditionFactory<'a, M: Model> {
    cache: &'a TableCache,
    kind: FactoryKind<'a, M>,
}

enum FactoryKind<'a, M: Model> {
    /// Equality on a chosen column group of the stored model.
    Equality { model: M, columns: Vec<String> },
    /// Caller-supplied conditions, resolved and encoded at construction.
    Explicit { conditions: Vec<Condition> },
    /// Arbitrary caller predicate evaluated against cached rows.
    Predicate { predicate: Predicate<'a, M> },
    /// Deferred construction error, surfaced at first use.
    Error { error: Error },
}

impl<'a, M: Model> ConditionFactory<'a, M> {
    /// Equality factory. With `fields` empty the first valid index of
    /// `model` is chosen; otherwise the given fields form the match group
    /// verbatim. A model with no valid index yields an error factory.
    pub fn equality(cache: &'a TableCache, model: &M, fields: &[FieldRef]) -> Self {
        let resolve = || -> Result<Vec<String>> {
            let info = Info::<M>::new(cache.schema())?;
            info.index_columns(model, fields)
        };
        let kind = match resolve() {
            Ok(columns) => FactoryKind::Equality {
                model: model.clone(),
                columns,
            },
            Err(error) => FactoryKind::Error { error },
        };
        ConditionFactory { cache, kind }
    }

    /// Explicit factory: field references resolve against `model`, values
    /// must carry the column's declared native type.
    pub fn explicit(cache: &'a TableCache, model: &M, conditions: &[FieldCondition]) -> Self {
        let resolve = || -> Result<Vec<Condition>> {
            let info = Info::<M>::new(cache.schema())?;
            conditions
                .iter()
                .map(|c| {
                    let column = info.column_by_ref(model, c.field)?;
                    let value = info.encode_value(column, &c.value)?;
                    Ok(Condition::new(column, c.function, value))
                })
                .collect()
        };
        let kind = match resolve() {
            Ok(conditions) => FactoryKind::Explicit { conditions },
            Err(error) => FactoryKind::Error { error },
        };
        ConditionFactory { cache, kind }
    }

    /// Predicate factory over an arbitrary boolean function of a row.
    pub fn predicate<F>(cache: &'a TableCache, predicate: F) -> Self
    where
        F: Fn(&M) -> bool + Send + Sync + 'a,
    {
        ConditionFactory {
            cache,
            kind: FactoryKind::Predicate {
                predicate: Box::new(predicate),
            },
        }
    }

    /// Factory that reports `error` on every use.
    pub fn error(cache: &'a TableCache, error: Error) -> Self {
        ConditionFactory {
            cache,
            kind: FactoryKind::Error { error },
        }
    }

    /// The table this factory is bound to.
    pub fn table(&self) -> &'static str {
        M::table_name()
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, FactoryKind::Error { .. })
    }

    /// Whether `model` matches this condition. Explicit factories cannot be
    /// evaluated locally and always fail.
    pub fn matches(&self, model: &M) -> Result<bool> {
        match &self.kind {
            FactoryKind::Equality {
                model: own,
                columns,
            } => {
                let info = Info::<M>::new(self.cache.schema())?;
                info.equal_fields(own, model, columns)
            }
            FactoryKind::Explicit { .. } => Err(ConditionError::ExplicitLocalMatch.into()),
            FactoryKind::Predicate { predicate } => Ok(predicate(model)),
            FactoryKind::Error { error } => Err(error.clone()),
        }
    }

    /// The wire conditions operations built from this factory will carry.
    /// A predicate factory scans the cache and emits one `_uuid` equality
    /// per matching row.
    pub fn generate(&self) -> Result<Vec<Condition>> {
        match &self.kind {
            FactoryKind::Equality { model, columns } => {
                let info = Info::<M>::new(self.cache.schema())?;
                info.equality_conditions(model, columns)
            }
            FactoryKind::Explicit { conditions } => Ok(conditions.clone()),
            FactoryKind::Predicate { predicate } => {
                let info = Info::<M>::new(self.cache.schema())?;
                let snapshot = self
                    .cache
                    .snapshot(M::table_name())
                    .ok_or(Error::NotFound)?;
                let mut conditions = Vec::new();
                for (uuid, row) in snapshot.iter() {
                    let candidate = info.decode_row(uuid, row)?;
                    if predicate(&candidate) {
                        conditions.push(Condition::equal(
                            UUID_COLUMN,
                            Datum::Atom(Atom::uuid_or_named(uuid)),
                        ));
                    }
                }
                Ok(conditions)
            }
            FactoryKind::Error { error } => Err(error.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::field_ref;
    use crate::testing::{A_UUID0, A_UUID1, A_UUID2, A_UUID3, LogicalSwitchPort, lsp_cache};
    use uuid::Uuid;

    fn sample_ports() -> Vec<LogicalSwitchPort> {
        vec![
            LogicalSwitchPort {
                uuid: A_UUID0.to_string(),
                name: "lsp0".to_string(),
                external_ids: [("foo".to_string(), "bar".to_string())].into(),
                enabled: vec![true],
                ..Default::default()
            },
            LogicalSwitchPort {
                uuid: A_UUID1.to_string(),
                name: "lsp1".to_string(),
                external_ids: [("foo".to_string(), "baz".to_string())].into(),
                enabled: vec![false],
                ..Default::default()
            },
            LogicalSwitchPort {
                uuid: A_UUID2.to_string(),
                name: "lsp2".to_string(),
                external_ids: [("unique".to_string(), "id".to_string())].into(),
                enabled: vec![false],
                ..Default::default()
            },
            LogicalSwitchPort {
                uuid: A_UUID3.to_string(),
                name: "lsp3".to_string(),
                external_ids: [("foo".to_string(), "baz".to_string())].into(),
                enabled: vec![true],
                ..Default::default()
            },
        ]
    }

    // -----------------------------------------------------------------------
    // Equality factory
    // -----------------------------------------------------------------------

    #[test]
    fn test_equality_by_uuid() {
        let cache = lsp_cache(&sample_ports());
        let model = LogicalSwitchPort {
            uuid: A_UUID0.to_string(),
            name: "different".to_string(),
            ..Default::default()
        };
        let factory = ConditionFactory::equality(&cache, &model, &[]);

        // _uuid wins over the name index, so only the uuid is compared.
        let same_uuid = LogicalSwitchPort {
            uuid: A_UUID0.to_string(),
            name: "foo".to_string(),
            ..Default::default()
        };
        assert!(factory.matches(&same_uuid).unwrap());
        let other_uuid = LogicalSwitchPort {
            uuid: A_UUID1.to_string(),
            ..Default::default()
        };
        assert!(!factory.matches(&other_uuid).unwrap());

        let conditions = factory.generate().unwrap();
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].column, "_uuid");
        assert_eq!(
            conditions[0].value,
            Datum::Atom(Atom::Uuid(Uuid::parse_str(A_UUID0).unwrap()))
        );
    }

    #[test]
    fn test_equality_by_schema_index() {
        let cache = lsp_cache(&sample_ports());
        let model = LogicalSwitchPort {
            name: "lsp1".to_string(),
            ..Default::default()
        };
        let factory = ConditionFactory::equality(&cache, &model, &[]);

        let named = LogicalSwitchPort {
            uuid: A_UUID0.to_string(),
            name: "lsp1".to_string(),
            ..Default::default()
        };
        assert!(factory.matches(&named).unwrap());
        assert!(!factory
            .matches(&LogicalSwitchPort {
                uuid: A_UUID1.to_string(),
                ..Default::default()
            })
            .unwrap());

        let conditions = factory.generate().unwrap();
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].column, "name");
        assert_eq!(conditions[0].value, Datum::Atom(Atom::from("lsp1")));
    }

    #[test]
    fn test_equality_without_index_defers_error() {
        let cache = lsp_cache(&sample_ports());
        let model = LogicalSwitchPort {
            external_ids: [("foo".to_string(), "baz".to_string())].into(),
            ..Default::default()
        };
        let factory = ConditionFactory::equality(&cache, &model, &[]);
        assert!(factory.is_error());
        assert_eq!(
            factory.matches(&LogicalSwitchPort::default()).unwrap_err(),
            Error::Condition(ConditionError::NoIndex)
        );
        assert_eq!(
            factory.generate().unwrap_err(),
            Error::Condition(ConditionError::NoIndex)
        );
    }

    #[test]
    fn test_equality_with_explicit_field_group() {
        let cache = lsp_cache(&sample_ports());
        let model = LogicalSwitchPort {
            ty: "router".to_string(),
            ..Default::default()
        };
        let factory =
            ConditionFactory::equality(&cache, &model, &[field_ref(&model.ty)]);
        let conditions = factory.generate().unwrap();
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].column, "type");
    }

    // -----------------------------------------------------------------------
    // Predicate factory
    // -----------------------------------------------------------------------

    #[test]
    fn test_predicate_generate_emits_uuid_per_match() {
        let cache = lsp_cache(&sample_ports());
        let factory = ConditionFactory::predicate(&cache, |lsp: &LogicalSwitchPort| {
            !lsp.enabled.is_empty() && lsp.enabled[0]
        });

        let mut conditions = factory.generate().unwrap();
        conditions.sort_by(|a, b| format!("{:?}", a.value).cmp(&format!("{:?}", b.value)));
        assert_eq!(conditions.len(), 2);
        for c in &conditions {
            assert_eq!(c.column, "_uuid");
            assert!(matches!(c.function, ConditionFunction::Equal));
        }
        let uuids: Vec<_> = conditions
            .iter()
            .map(|c| match &c.value {
                Datum::Atom(Atom::Uuid(u)) => u.to_string(),
                other => panic!("expected uuid atom, got {other:?}"),
            })
            .collect();
        assert!(uuids.contains(&A_UUID0.to_string()));
        assert!(uuids.contains(&A_UUID3.to_string()));
    }

    #[test]
    fn test_predicate_matches_none_yields_empty() {
        let cache = lsp_cache(&sample_ports());
        let factory = ConditionFactory::predicate(&cache, |_: &LogicalSwitchPort| false);
        assert!(factory.generate().unwrap().is_empty());
    }

    #[test]
    fn test_predicate_empty_table_yields_empty() {
        let cache = crate::testing::empty_cache();
        let factory = ConditionFactory::predicate(&cache, |_: &LogicalSwitchPort| true);
        assert!(factory.generate().unwrap().is_empty());
    }

    #[test]
    fn test_predicate_matches_invokes_function() {
        let cache = crate::testing::empty_cache();
        let factory = ConditionFactory::predicate(&cache, |lsp: &LogicalSwitchPort| {
            lsp.name.starts_with("magic")
        });
        let magic = LogicalSwitchPort {
            name: "magiclsp".to_string(),
            ..Default::default()
        };
        assert!(factory.matches(&magic).unwrap());
        assert!(!factory.matches(&LogicalSwitchPort::default()).unwrap());
    }

    // -----------------------------------------------------------------------
    // Explicit factory
    // -----------------------------------------------------------------------

    #[test]
    fn test_explicit_cannot_match_locally() {
        let cache = crate::testing::empty_cache();
        let model = LogicalSwitchPort::default();
        let factory = ConditionFactory::explicit(
            &cache,
            &model,
            &[FieldCondition::new(
                field_ref(&model.name),
                ConditionFunction::NotEqual,
                "lsp0",
            )],
        );
        assert_eq!(
            factory.matches(&LogicalSwitchPort::default()).unwrap_err(),
            Error::Condition(ConditionError::ExplicitLocalMatch)
        );

        let conditions = factory.generate().unwrap();
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].column, "name");
        assert!(matches!(conditions[0].function, ConditionFunction::NotEqual));
        assert_eq!(conditions[0].value, Datum::Atom(Atom::from("lsp0")));
    }

    #[test]
    fn test_explicit_preserves_caller_order() {
        let cache = crate::testing::empty_cache();
        let model = LogicalSwitchPort::default();
        let factory = ConditionFactory::explicit(
            &cache,
            &model,
            &[
                FieldCondition::new(field_ref(&model.ty), ConditionFunction::Equal, "x"),
                FieldCondition::new(field_ref(&model.name), ConditionFunction::Equal, "y"),
            ],
        );
        let conditions = factory.generate().unwrap();
        assert_eq!(conditions[0].column, "type");
        assert_eq!(conditions[1].column, "name");
    }

    #[test]
    fn test_explicit_bad_field_defers_error() {
        let cache = crate::testing::empty_cache();
        let model = LogicalSwitchPort::default();
        let stray = LogicalSwitchPort::default();
        let factory = ConditionFactory::explicit(
            &cache,
            &model,
            &[FieldCondition::new(
                field_ref(&stray.name),
                ConditionFunction::Equal,
                "x",
            )],
        );
        assert!(factory.is_error());
        assert_eq!(
            factory.generate().unwrap_err(),
            Error::Mapper(crate::error::MapperError::FieldNotBound)
        );
    }

    #[test]
    fn test_explicit_bad_value_type_defers_error() {
        let cache = crate::testing::empty_cache();
        let model = LogicalSwitchPort::default();
        let factory = ConditionFactory::explicit(
            &cache,
            &model,
            &[FieldCondition::new(
                field_ref(&model.name),
                ConditionFunction::Equal,
                7i64,
            )],
        );
        assert!(factory.is_error());
        assert!(factory.generate().is_err());
    }

    // -----------------------------------------------------------------------
    // Totality
    // -----------------------------------------------------------------------

    #[test]
    fn test_generate_match_agreement_for_equality() {
        let ports = sample_ports();
        let cache = lsp_cache(&ports);
        let model = LogicalSwitchPort {
            name: "lsp2".to_string(),
            ..Default::default()
        };
        let factory = ConditionFactory::equality(&cache, &model, &[]);
        let conditions = factory.generate().unwrap();
        assert!(!conditions.is_empty());
        for port in &ports {
            let matched = factory.matches(port).unwrap();
            assert_eq!(matched, port.name == "lsp2");
        }
    }
}
