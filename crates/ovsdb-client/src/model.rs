//! The `Model` trait and its per-type field-binding table.
//!
//! A model is a caller-defined struct whose fields correspond to columns of
//! one table. Instead of runtime reflection, each model type carries a static
//! table of bindings (column name, getter, setter, default test, address
//! projection), normally generated by the [`model!`](crate::model!) macro.
//! Fields left out of the binding table are invisible to this layer.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use ovsdb_proto::{NativeAtomKind, NativeKind, NativeScalar, NativeValue};

use crate::error::MapperError;

/// A row type bound to one table.
pub trait Model: Clone + Default + Send + Sync + 'static {
    /// Name of the table this model maps to.
    fn table_name() -> &'static str;

    /// The static binding table: one entry per mapped field.
    fn bindings() -> &'static [FieldBinding<Self>];
}

/// One entry of a model's binding table.
#[derive(Debug)]
pub struct FieldBinding<M> {
    /// Column this field maps to.
    pub column: &'static str,
    /// Field name, for diagnostics.
    pub field: &'static str,
    /// The field's native shape, checked against the schema at mapper
    /// construction.
    pub kind: NativeKind,
    pub get: fn(&M) -> NativeValue,
    pub set: fn(&mut M, NativeValue) -> Result<(), MapperError>,
    /// Address of the field within a live model value, the stable handle
    /// behind [`FieldRef`] resolution.
    pub addr: fn(&M) -> usize,
    pub is_default: fn(&M) -> bool,
}

/// Opaque handle to a field of a live model value.
///
/// Produced by [`field_ref`]; only valid for resolving against the same model
/// value the reference was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRef(usize);

impl FieldRef {
    pub(crate) fn addr(self) -> usize {
        self.0
    }
}

/// Take a field reference: `field_ref(&model.name)`.
pub fn field_ref<T>(field: &T) -> FieldRef {
    FieldRef(field as *const T as usize)
}

/// A native scalar type usable as a set element or map key/value.
pub trait ScalarValue: Clone + Default + PartialEq + Send + Sync + 'static {
    const ATOM: NativeAtomKind;
    fn to_scalar(&self) -> NativeScalar;
    fn from_scalar(scalar: NativeScalar) -> Option<Self>;
}

impl ScalarValue for String {
    const ATOM: NativeAtomKind = NativeAtomKind::String;

    fn to_scalar(&self) -> NativeScalar {
        NativeScalar::String(self.clone())
    }

    fn from_scalar(scalar: NativeScalar) -> Option<String> {
        match scalar {
            NativeScalar::String(s) => Some(s),
            _ => None,
        }
    }
}

impl ScalarValue for i64 {
    const ATOM: NativeAtomKind = NativeAtomKind::Integer;

    fn to_scalar(&self) -> NativeScalar {
        NativeScalar::Integer(*self)
    }

    fn from_scalar(scalar: NativeScalar) -> Option<i64> {
        match scalar {
            NativeScalar::Integer(i) => Some(i),
            _ => None,
        }
    }
}

impl ScalarValue for f64 {
    const ATOM: NativeAtomKind = NativeAtomKind::Real;

    fn to_scalar(&self) -> NativeScalar {
        NativeScalar::Real(*self)
    }

    fn from_scalar(scalar: NativeScalar) -> Option<f64> {
        match scalar {
            NativeScalar::Real(r) => Some(r),
            _ => None,
        }
    }
}

impl ScalarValue for bool {
    const ATOM: NativeAtomKind = NativeAtomKind::Boolean;

    fn to_scalar(&self) -> NativeScalar {
        NativeScalar::Boolean(*self)
    }

    fn from_scalar(scalar: NativeScalar) -> Option<bool> {
        match scalar {
            NativeScalar::Boolean(b) => Some(b),
            _ => None,
        }
    }
}

/// A type usable as a model field: scalars, sets of scalars, maps of scalars.
pub trait FieldValue: Clone + Default + Send + Sync + 'static {
    const KIND: NativeKind;
    fn to_native(&self) -> NativeValue;
    fn from_native(value: NativeValue) -> Option<Self>;
    fn is_default(&self) -> bool;
}

macro_rules! scalar_field_value {
    ($($ty:ty),+ $(,)?) => {$(
        impl FieldValue for $ty {
            const KIND: NativeKind = NativeKind::Scalar(<$ty as ScalarValue>::ATOM);

            fn to_native(&self) -> NativeValue {
                NativeValue::Scalar(self.to_scalar())
            }

            fn from_native(value: NativeValue) -> Option<Self> {
                match value {
                    NativeValue::Scalar(s) => <$ty as ScalarValue>::from_scalar(s),
                    _ => None,
                }
            }

            fn is_default(&self) -> bool {
                *self == <$ty as Default>::default()
            }
        }
    )+};
}

scalar_field_value!(String, i64, f64, bool);

impl<T: ScalarValue> FieldValue for Vec<T> {
    const KIND: NativeKind = NativeKind::Set(T::ATOM);

    fn to_native(&self) -> NativeValue {
        NativeValue::Set(self.iter().map(ScalarValue::to_scalar).collect())
    }

    fn from_native(value: NativeValue) -> Option<Vec<T>> {
        match value {
            NativeValue::Set(xs) => xs.into_iter().map(T::from_scalar).collect(),
            _ => None,
        }
    }

    fn is_default(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> FieldValue for HashMap<K, V>
where
    K: ScalarValue + Eq + Hash,
    V: ScalarValue,
{
    const KIND: NativeKind = NativeKind::Map(K::ATOM, V::ATOM);

    fn to_native(&self) -> NativeValue {
        let mut pairs: Vec<_> = self
            .iter()
            .map(|(k, v)| (k.to_scalar(), v.to_scalar()))
            .collect();
        pairs.sort_by(|a, b| a.0.sort_cmp(&b.0));
        NativeValue::Map(pairs)
    }

    fn from_native(value: NativeValue) -> Option<HashMap<K, V>> {
        match value {
            NativeValue::Map(pairs) => pairs
                .into_iter()
                .map(|(k, v)| Some((K::from_scalar(k)?, V::from_scalar(v)?)))
                .collect(),
            _ => None,
        }
    }

    fn is_default(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> FieldValue for BTreeMap<K, V>
where
    K: ScalarValue + Eq + Ord,
    V: ScalarValue,
{
    const KIND: NativeKind = NativeKind::Map(K::ATOM, V::ATOM);

    fn to_native(&self) -> NativeValue {
        NativeValue::Map(
            self.iter()
                .map(|(k, v)| (k.to_scalar(), v.to_scalar()))
                .collect(),
        )
    }

    fn from_native(value: NativeValue) -> Option<BTreeMap<K, V>> {
        match value {
            NativeValue::Map(pairs) => pairs
                .into_iter()
                .map(|(k, v)| Some((K::from_scalar(k)?, V::from_scalar(v)?)))
                .collect(),
            _ => None,
        }
    }

    fn is_default(&self) -> bool {
        self.is_empty()
    }
}

/// Define a model struct together with its binding table.
///
/// ```
/// ovsdb_client::model! {
///     pub struct Bridge : "Bridge" {
///         "_uuid" => uuid: String,
///         "name" => name: String,
///         "ports" => ports: Vec<String>,
///     }
/// }
/// ```
#[macro_export]
macro_rules! model {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : $table:literal {
            $( $col:literal => $field:ident : $ty:ty ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            $( pub $field: $ty, )+
        }

        impl $crate::model::Model for $name {
            fn table_name() -> &'static str {
                $table
            }

            fn bindings() -> &'static [$crate::model::FieldBinding<Self>] {
                static BINDINGS: &[$crate::model::FieldBinding<$name>] = &[
                    $(
                        $crate::model::FieldBinding {
                            column: $col,
                            field: stringify!($field),
                            kind: <$ty as $crate::model::FieldValue>::KIND,
                            get: |m| <$ty as $crate::model::FieldValue>::to_native(&m.$field),
                            set: |m, v| match <$ty as $crate::model::FieldValue>::from_native(v) {
                                Some(value) => {
                                    m.$field = value;
                                    Ok(())
                                }
                                None => Err($crate::error::MapperError::CannotAssign {
                                    column: $col.to_string(),
                                    field: stringify!($field).to_string(),
                                }),
                            },
                            addr: |m| &m.$field as *const _ as usize,
                            is_default: |m| <$ty as $crate::model::FieldValue>::is_default(&m.$field),
                        },
                    )+
                ];
                BINDINGS
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::model! {
        struct Port : "Port" {
            "_uuid" => uuid: String,
            "name" => name: String,
            "tag" => tag: Vec<i64>,
            "external_ids" => external_ids: HashMap<String, String>,
        }
    }

    #[test]
    fn test_bindings_cover_all_fields() {
        let columns: Vec<_> = Port::bindings().iter().map(|b| b.column).collect();
        assert_eq!(columns, vec!["_uuid", "name", "tag", "external_ids"]);
        assert_eq!(Port::table_name(), "Port");
    }

    #[test]
    fn test_get_and_default() {
        let mut port = Port::default();
        let name = Port::bindings().iter().find(|b| b.column == "name").unwrap();
        assert!((name.is_default)(&port));
        port.name = "p0".to_string();
        assert!(!(name.is_default)(&port));
        assert_eq!((name.get)(&port), NativeValue::from("p0"));
    }

    #[test]
    fn test_set_rejects_wrong_shape() {
        let mut port = Port::default();
        let tag = Port::bindings().iter().find(|b| b.column == "tag").unwrap();
        (tag.set)(&mut port, NativeValue::from(vec![5i64])).unwrap();
        assert_eq!(port.tag, vec![5]);

        let err = (tag.set)(&mut port, NativeValue::from("nope")).unwrap_err();
        assert!(matches!(err, MapperError::CannotAssign { .. }));
    }

    #[test]
    fn test_field_ref_resolves_by_address() {
        let port = Port::default();
        let wanted = field_ref(&port.tag);
        let hit = Port::bindings()
            .iter()
            .find(|b| (b.addr)(&port) == wanted.addr())
            .unwrap();
        assert_eq!(hit.column, "tag");
    }

    #[test]
    fn test_map_to_native_is_sorted() {
        let mut map = HashMap::new();
        map.insert("b".to_string(), "2".to_string());
        map.insert("a".to_string(), "1".to_string());
        let NativeValue::Map(pairs) = map.to_native() else {
            panic!("expected map");
        };
        assert_eq!(pairs[0].0, NativeScalar::String("a".to_string()));
        assert_eq!(pairs[1].0, NativeScalar::String("b".to_string()));
    }

    #[test]
    fn test_vec_roundtrip() {
        let v = vec![true, false];
        let native = v.to_native();
        assert_eq!(<Vec<bool>>::from_native(native), Some(v));
        assert_eq!(<Vec<bool>>::from_native(NativeValue::from(1i64)), None);
    }
}
