//! Bridge between native (model-side) values and protocol datums.
//!
//! Conversions are guided by the column schema: a uuid-typed position turns a
//! parseable string into `["uuid", ..]` and anything else into
//! `["named-uuid", ..]`, set columns always encode wrapped, and the decoder
//! accepts the bare single-element shorthand.

use std::cmp::Ordering;

use crate::error::ProtoError;
use crate::schema::{AtomicType, ColumnType, NativeAtomKind, NativeKind};
use crate::value::{Atom, Datum};

/// A scalar as a model field carries it.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeScalar {
    String(String),
    Integer(i64),
    Real(f64),
    Boolean(bool),
}

impl NativeScalar {
    pub fn kind(&self) -> NativeAtomKind {
        match self {
            NativeScalar::String(_) => NativeAtomKind::String,
            NativeScalar::Integer(_) => NativeAtomKind::Integer,
            NativeScalar::Real(_) => NativeAtomKind::Real,
            NativeScalar::Boolean(_) => NativeAtomKind::Boolean,
        }
    }

    /// Whether this is the zero value of its type.
    pub fn is_default(&self) -> bool {
        match self {
            NativeScalar::String(s) => s.is_empty(),
            NativeScalar::Integer(i) => *i == 0,
            NativeScalar::Real(r) => *r == 0.0,
            NativeScalar::Boolean(b) => !b,
        }
    }

    /// Total order used to keep generated collections deterministic.
    pub fn sort_cmp(&self, other: &NativeScalar) -> Ordering {
        fn rank(s: &NativeScalar) -> u8 {
            match s {
                NativeScalar::String(_) => 0,
                NativeScalar::Integer(_) => 1,
                NativeScalar::Real(_) => 2,
                NativeScalar::Boolean(_) => 3,
            }
        }
        match (self, other) {
            (NativeScalar::String(a), NativeScalar::String(b)) => a.cmp(b),
            (NativeScalar::Integer(a), NativeScalar::Integer(b)) => a.cmp(b),
            (NativeScalar::Real(a), NativeScalar::Real(b)) => a.total_cmp(b),
            (NativeScalar::Boolean(a), NativeScalar::Boolean(b)) => a.cmp(b),
            (a, b) => rank(a).cmp(&rank(b)),
        }
    }
}

/// A whole native column value.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Scalar(NativeScalar),
    Set(Vec<NativeScalar>),
    Map(Vec<(NativeScalar, NativeScalar)>),
}

impl NativeValue {
    /// Whether this is the zero value: empty string, zero number, false, or
    /// an empty collection.
    pub fn is_default(&self) -> bool {
        match self {
            NativeValue::Scalar(s) => s.is_default(),
            NativeValue::Set(xs) => xs.is_empty(),
            NativeValue::Map(pairs) => pairs.is_empty(),
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            NativeValue::Scalar(NativeScalar::String(s)) => Some(s),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            NativeValue::Scalar(s) => format!("{} scalar", s.kind()),
            NativeValue::Set(_) => "set".to_string(),
            NativeValue::Map(_) => "map".to_string(),
        }
    }
}

impl From<&str> for NativeValue {
    fn from(s: &str) -> NativeValue {
        NativeValue::Scalar(NativeScalar::String(s.to_string()))
    }
}

impl From<String> for NativeValue {
    fn from(s: String) -> NativeValue {
        NativeValue::Scalar(NativeScalar::String(s))
    }
}

impl From<i64> for NativeValue {
    fn from(i: i64) -> NativeValue {
        NativeValue::Scalar(NativeScalar::Integer(i))
    }
}

impl From<f64> for NativeValue {
    fn from(f: f64) -> NativeValue {
        NativeValue::Scalar(NativeScalar::Real(f))
    }
}

impl From<bool> for NativeValue {
    fn from(b: bool) -> NativeValue {
        NativeValue::Scalar(NativeScalar::Boolean(b))
    }
}

impl From<Vec<String>> for NativeValue {
    fn from(xs: Vec<String>) -> NativeValue {
        NativeValue::Set(xs.into_iter().map(NativeScalar::String).collect())
    }
}

impl From<Vec<&str>> for NativeValue {
    fn from(xs: Vec<&str>) -> NativeValue {
        NativeValue::Set(
            xs.into_iter()
                .map(|s| NativeScalar::String(s.to_string()))
                .collect(),
        )
    }
}

impl From<Vec<i64>> for NativeValue {
    fn from(xs: Vec<i64>) -> NativeValue {
        NativeValue::Set(xs.into_iter().map(NativeScalar::Integer).collect())
    }
}

impl From<Vec<f64>> for NativeValue {
    fn from(xs: Vec<f64>) -> NativeValue {
        NativeValue::Set(xs.into_iter().map(NativeScalar::Real).collect())
    }
}

impl From<Vec<bool>> for NativeValue {
    fn from(xs: Vec<bool>) -> NativeValue {
        NativeValue::Set(xs.into_iter().map(NativeScalar::Boolean).collect())
    }
}

impl From<std::collections::HashMap<String, String>> for NativeValue {
    fn from(map: std::collections::HashMap<String, String>) -> NativeValue {
        let mut pairs: Vec<_> = map
            .into_iter()
            .map(|(k, v)| (NativeScalar::String(k), NativeScalar::String(v)))
            .collect();
        pairs.sort_by(|a, b| a.0.sort_cmp(&b.0));
        NativeValue::Map(pairs)
    }
}

/// Encode a native scalar to an atom of the declared atomic type.
pub fn scalar_to_atom(ty: AtomicType, scalar: &NativeScalar) -> Result<Atom, ProtoError> {
    match (ty, scalar) {
        (AtomicType::String, NativeScalar::String(s)) => Ok(Atom::String(s.clone())),
        (AtomicType::Uuid, NativeScalar::String(s)) => Ok(Atom::uuid_or_named(s)),
        (AtomicType::Integer, NativeScalar::Integer(i)) => Ok(Atom::Integer(*i)),
        (AtomicType::Real, NativeScalar::Real(r)) => Ok(Atom::Real(*r)),
        (AtomicType::Real, NativeScalar::Integer(i)) => Ok(Atom::Real(*i as f64)),
        (AtomicType::Boolean, NativeScalar::Boolean(b)) => Ok(Atom::Boolean(*b)),
        _ => Err(ProtoError::ValueTypeMismatch {
            expected: ty.to_string(),
            got: scalar.kind().to_string(),
        }),
    }
}

/// Decode an atom of the declared atomic type back to a native scalar.
pub fn atom_to_scalar(ty: AtomicType, atom: &Atom) -> Result<NativeScalar, ProtoError> {
    match (ty, atom) {
        (AtomicType::String, Atom::String(s)) => Ok(NativeScalar::String(s.clone())),
        (AtomicType::Uuid, Atom::Uuid(u)) => Ok(NativeScalar::String(u.to_string())),
        (AtomicType::Uuid, Atom::NamedUuid(s)) => Ok(NativeScalar::String(s.clone())),
        (AtomicType::Integer, Atom::Integer(i)) => Ok(NativeScalar::Integer(*i)),
        (AtomicType::Real, Atom::Real(r)) => Ok(NativeScalar::Real(*r)),
        // JSON erases the integer/real distinction for whole numbers.
        (AtomicType::Real, Atom::Integer(i)) => Ok(NativeScalar::Real(*i as f64)),
        (AtomicType::Boolean, Atom::Boolean(b)) => Ok(NativeScalar::Boolean(*b)),
        _ => Err(ProtoError::ValueTypeMismatch {
            expected: ty.to_string(),
            got: format!("{atom:?}"),
        }),
    }
}

fn mismatch(ty: &ColumnType, value: &NativeValue) -> ProtoError {
    ProtoError::ValueTypeMismatch {
        expected: ty.native_kind().to_string(),
        got: value.describe(),
    }
}

/// Encode a native value for a column, requiring the shapes to agree.
pub fn native_to_datum(ty: &ColumnType, value: &NativeValue) -> Result<Datum, ProtoError> {
    match value {
        NativeValue::Scalar(s) if matches!(ty.native_kind(), NativeKind::Scalar(_)) => {
            Ok(Datum::Atom(scalar_to_atom(ty.key, s)?))
        }
        NativeValue::Set(xs) if matches!(ty.native_kind(), NativeKind::Set(_)) => {
            let atoms = xs
                .iter()
                .map(|s| scalar_to_atom(ty.key, s))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Datum::Set(atoms))
        }
        NativeValue::Map(pairs) => {
            let value_ty = ty.value.ok_or_else(|| mismatch(ty, value))?;
            let pairs = pairs
                .iter()
                .map(|(k, v)| Ok((scalar_to_atom(ty.key, k)?, scalar_to_atom(value_ty, v)?)))
                .collect::<Result<Vec<_>, ProtoError>>()?;
            Ok(Datum::Map(pairs))
        }
        _ => Err(mismatch(ty, value)),
    }
}

/// Encode a mutation value for a column. Mutation payloads may be shaped
/// differently from the column itself (a set of keys deleted from a map, a
/// scalar delta applied to a numeric set), so shape-mismatched values fall
/// back to structural encoding with atoms still guided by the key type.
pub fn native_to_mutation_datum(ty: &ColumnType, value: &NativeValue) -> Result<Datum, ProtoError> {
    if let Ok(datum) = native_to_datum(ty, value) {
        return Ok(datum);
    }
    match value {
        NativeValue::Scalar(s) => Ok(Datum::Atom(scalar_to_atom(ty.key, s)?)),
        NativeValue::Set(xs) => {
            let atoms = xs
                .iter()
                .map(|s| scalar_to_atom(ty.key, s))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Datum::Set(atoms))
        }
        NativeValue::Map(_) => Err(mismatch(ty, value)),
    }
}

/// Decode a column datum back to its native shape, accepting the bare-atom
/// set shorthand.
pub fn datum_to_native(ty: &ColumnType, datum: &Datum) -> Result<NativeValue, ProtoError> {
    let fail = || ProtoError::ValueTypeMismatch {
        expected: ty.native_kind().to_string(),
        got: format!("{datum:?}"),
    };
    match (ty.native_kind(), datum) {
        (NativeKind::Scalar(_), Datum::Atom(a)) => {
            Ok(NativeValue::Scalar(atom_to_scalar(ty.key, a)?))
        }
        (NativeKind::Scalar(_), Datum::Set(xs)) if xs.len() == 1 => {
            Ok(NativeValue::Scalar(atom_to_scalar(ty.key, &xs[0])?))
        }
        (NativeKind::Set(_), Datum::Set(xs)) => {
            let scalars = xs
                .iter()
                .map(|a| atom_to_scalar(ty.key, a))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(NativeValue::Set(scalars))
        }
        (NativeKind::Set(_), Datum::Atom(a)) => {
            Ok(NativeValue::Set(vec![atom_to_scalar(ty.key, a)?]))
        }
        (NativeKind::Map(..), Datum::Map(pairs)) => {
            let value_ty = ty.value.ok_or_else(fail)?;
            let pairs = pairs
                .iter()
                .map(|(k, v)| Ok((atom_to_scalar(ty.key, k)?, atom_to_scalar(value_ty, v)?)))
                .collect::<Result<Vec<_>, ProtoError>>()?;
            Ok(NativeValue::Map(pairs))
        }
        _ => Err(fail()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Max;

    fn set_of(key: AtomicType) -> ColumnType {
        ColumnType {
            key,
            value: None,
            min: 0,
            max: Max::Unlimited,
        }
    }

    fn map_of(key: AtomicType, value: AtomicType) -> ColumnType {
        ColumnType {
            key,
            value: Some(value),
            min: 0,
            max: Max::Unlimited,
        }
    }

    // -----------------------------------------------------------------------
    // Schema-guided encoding
    // -----------------------------------------------------------------------

    #[test]
    fn test_uuid_string_encodes_tagged() {
        let ty = ColumnType::scalar(AtomicType::Uuid);
        let real = native_to_datum(&ty, &NativeValue::from("2f77b348-9768-4866-b761-89d5177ecda0"))
            .unwrap();
        assert!(matches!(real, Datum::Atom(Atom::Uuid(_))));

        let named = native_to_datum(&ty, &NativeValue::from("foo")).unwrap();
        assert_eq!(named, Datum::Atom(Atom::NamedUuid("foo".to_string())));
    }

    #[test]
    fn test_optional_scalar_encodes_wrapped() {
        let ty = ColumnType {
            key: AtomicType::Integer,
            value: None,
            min: 0,
            max: Max::At(1),
        };
        let d = native_to_datum(&ty, &NativeValue::from(vec![6i64])).unwrap();
        assert_eq!(d, Datum::set([Atom::from(6)]));
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let ty = ColumnType::scalar(AtomicType::String);
        assert!(native_to_datum(&ty, &NativeValue::from(vec!["x"])).is_err());
        assert!(native_to_datum(&set_of(AtomicType::String), &NativeValue::from("x")).is_err());
    }

    #[test]
    fn test_atom_type_mismatch_rejected() {
        let ty = ColumnType::scalar(AtomicType::Integer);
        assert!(native_to_datum(&ty, &NativeValue::from("one")).is_err());
    }

    // -----------------------------------------------------------------------
    // Mutation fallback
    // -----------------------------------------------------------------------

    #[test]
    fn test_mutation_delete_keys_from_map() {
        let ty = map_of(AtomicType::String, AtomicType::String);
        let d = native_to_mutation_datum(&ty, &NativeValue::from(vec!["foo"])).unwrap();
        assert_eq!(d, Datum::set([Atom::from("foo")]));
    }

    #[test]
    fn test_mutation_scalar_delta_on_set() {
        let ty = set_of(AtomicType::Integer);
        let d = native_to_mutation_datum(&ty, &NativeValue::from(5i64)).unwrap();
        assert_eq!(d, Datum::Atom(Atom::from(5)));
    }

    // -----------------------------------------------------------------------
    // Round trips
    // -----------------------------------------------------------------------

    #[test]
    fn test_roundtrip_scalar() {
        let ty = ColumnType::scalar(AtomicType::String);
        let v = NativeValue::from("hello");
        let d = native_to_datum(&ty, &v).unwrap();
        assert_eq!(datum_to_native(&ty, &d).unwrap(), v);
    }

    #[test]
    fn test_roundtrip_uuid_set() {
        let ty = set_of(AtomicType::Uuid);
        let v = NativeValue::from(vec![
            "2f77b348-9768-4866-b761-89d5177ecda0".to_string(),
            "59650185-75de-4ccc-8552-1befe1dcf392".to_string(),
        ]);
        let d = native_to_datum(&ty, &v).unwrap();
        assert_eq!(datum_to_native(&ty, &d).unwrap(), v);
    }

    #[test]
    fn test_roundtrip_map() {
        let ty = map_of(AtomicType::String, AtomicType::String);
        let v = NativeValue::Map(vec![(
            NativeScalar::String("foo".to_string()),
            NativeScalar::String("bar".to_string()),
        )]);
        let d = native_to_datum(&ty, &v).unwrap();
        assert_eq!(datum_to_native(&ty, &d).unwrap(), v);
    }

    #[test]
    fn test_decode_bare_atom_into_set() {
        let ty = set_of(AtomicType::Boolean);
        let v = datum_to_native(&ty, &Datum::Atom(Atom::from(true))).unwrap();
        assert_eq!(v, NativeValue::from(vec![true]));
    }

    // -----------------------------------------------------------------------
    // Defaults
    // -----------------------------------------------------------------------

    #[test]
    fn test_is_default() {
        assert!(NativeValue::from("").is_default());
        assert!(NativeValue::from(0i64).is_default());
        assert!(NativeValue::from(false).is_default());
        assert!(NativeValue::Set(vec![]).is_default());
        assert!(NativeValue::Map(vec![]).is_default());
        assert!(!NativeValue::from("x").is_default());
        assert!(!NativeValue::from(vec![false]).is_default());
    }
}
