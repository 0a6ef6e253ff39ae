//! Protocol values: atoms and the tagged set/map/uuid wrappers.
//!
//! On the wire a column value is either a bare scalar, `["uuid", "<str>"]`,
//! `["named-uuid", "<str>"]`, `["set", [..]]` or `["map", [[k, v], ..]]`.
//! The encoder always emits the wrapped form for set- and map-typed columns;
//! the decoder additionally accepts a bare atom where a set is expected
//! (the single-element shorthand servers are allowed to send).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ProtoError;

/// A single protocol scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    String(String),
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Uuid(Uuid),
    /// Caller-chosen placeholder resolved by the server at commit time.
    NamedUuid(String),
}

impl Atom {
    /// Wrap a uuid-typed string: a parseable UUID becomes a real reference,
    /// anything else a named-uuid placeholder.
    pub fn uuid_or_named(s: &str) -> Atom {
        match Uuid::parse_str(s) {
            Ok(u) => Atom::Uuid(u),
            Err(_) => Atom::NamedUuid(s.to_string()),
        }
    }

    fn from_json(v: &Value) -> Result<Atom, ProtoError> {
        match v {
            Value::String(s) => Ok(Atom::String(s.clone())),
            Value::Bool(b) => Ok(Atom::Boolean(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Atom::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Atom::Real(f))
                } else {
                    Err(ProtoError::Malformed {
                        kind: "atom",
                        reason: format!("{n} is out of range"),
                    })
                }
            }
            Value::Array(parts) => {
                let (tag, body) = tagged_pair(parts, "atom")?;
                let s = body.as_str().ok_or_else(|| ProtoError::Malformed {
                    kind: "atom",
                    reason: format!("{tag} payload must be a string"),
                })?;
                match tag {
                    "uuid" => Uuid::parse_str(s).map(Atom::Uuid).map_err(|e| {
                        ProtoError::Malformed {
                            kind: "uuid",
                            reason: e.to_string(),
                        }
                    }),
                    "named-uuid" => Ok(Atom::NamedUuid(s.to_string())),
                    other => Err(ProtoError::Malformed {
                        kind: "atom",
                        reason: format!("unknown tag {other}"),
                    }),
                }
            }
            other => Err(ProtoError::Malformed {
                kind: "atom",
                reason: format!("unexpected {other}"),
            }),
        }
    }
}

impl From<&str> for Atom {
    fn from(s: &str) -> Atom {
        Atom::String(s.to_string())
    }
}

impl From<String> for Atom {
    fn from(s: String) -> Atom {
        Atom::String(s)
    }
}

impl From<i64> for Atom {
    fn from(i: i64) -> Atom {
        Atom::Integer(i)
    }
}

impl From<f64> for Atom {
    fn from(f: f64) -> Atom {
        Atom::Real(f)
    }
}

impl From<bool> for Atom {
    fn from(b: bool) -> Atom {
        Atom::Boolean(b)
    }
}

impl From<Uuid> for Atom {
    fn from(u: Uuid) -> Atom {
        Atom::Uuid(u)
    }
}

impl Serialize for Atom {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Atom::String(v) => s.serialize_str(v),
            Atom::Integer(v) => s.serialize_i64(*v),
            Atom::Real(v) => s.serialize_f64(*v),
            Atom::Boolean(v) => s.serialize_bool(*v),
            Atom::Uuid(v) => ("uuid", v.to_string()).serialize(s),
            Atom::NamedUuid(v) => ("named-uuid", v).serialize(s),
        }
    }
}

impl<'de> Deserialize<'de> for Atom {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let v = Value::deserialize(d)?;
        Atom::from_json(&v).map_err(serde::de::Error::custom)
    }
}

/// A full column value: a bare atom, a set of atoms or a map of atom pairs.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Atom(Atom),
    Set(Vec<Atom>),
    Map(Vec<(Atom, Atom)>),
}

impl Datum {
    pub fn set<I: IntoIterator<Item = Atom>>(atoms: I) -> Datum {
        Datum::Set(atoms.into_iter().collect())
    }

    pub fn map<I: IntoIterator<Item = (Atom, Atom)>>(pairs: I) -> Datum {
        Datum::Map(pairs.into_iter().collect())
    }

    /// Protocol-value equality with collection normalisation: sets compare as
    /// multisets, maps key-for-key, and a bare atom equals the singleton set
    /// of that atom.
    pub fn matches(&self, other: &Datum) -> bool {
        match (self, other) {
            (Datum::Atom(a), Datum::Atom(b)) => a == b,
            (Datum::Set(a), Datum::Set(b)) => multiset_eq(a, b),
            (Datum::Map(a), Datum::Map(b)) => map_eq(a, b),
            (Datum::Atom(a), Datum::Set(s)) | (Datum::Set(s), Datum::Atom(a)) => {
                s.len() == 1 && &s[0] == a
            }
            _ => false,
        }
    }

    fn from_json(v: &Value) -> Result<Datum, ProtoError> {
        match v {
            Value::Array(parts) => {
                let (tag, body) = tagged_pair(parts, "datum")?;
                match tag {
                    "set" => {
                        let elems = body.as_array().ok_or_else(|| ProtoError::Malformed {
                            kind: "set",
                            reason: "payload must be an array".to_string(),
                        })?;
                        let atoms = elems
                            .iter()
                            .map(Atom::from_json)
                            .collect::<Result<Vec<_>, _>>()?;
                        Ok(Datum::Set(atoms))
                    }
                    "map" => {
                        let pairs = body.as_array().ok_or_else(|| ProtoError::Malformed {
                            kind: "map",
                            reason: "payload must be an array".to_string(),
                        })?;
                        let pairs = pairs
                            .iter()
                            .map(|p| {
                                let kv = p.as_array().filter(|kv| kv.len() == 2).ok_or_else(
                                    || ProtoError::Malformed {
                                        kind: "map",
                                        reason: "entries must be [key, value] pairs".to_string(),
                                    },
                                )?;
                                Ok((Atom::from_json(&kv[0])?, Atom::from_json(&kv[1])?))
                            })
                            .collect::<Result<Vec<_>, ProtoError>>()?;
                        Ok(Datum::Map(pairs))
                    }
                    "uuid" | "named-uuid" => Atom::from_json(v).map(Datum::Atom),
                    other => Err(ProtoError::Malformed {
                        kind: "datum",
                        reason: format!("unknown tag {other}"),
                    }),
                }
            }
            scalar => Atom::from_json(scalar).map(Datum::Atom),
        }
    }
}

impl From<Atom> for Datum {
    fn from(a: Atom) -> Datum {
        Datum::Atom(a)
    }
}

impl Serialize for Datum {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Datum::Atom(a) => a.serialize(s),
            Datum::Set(atoms) => ("set", atoms).serialize(s),
            Datum::Map(pairs) => ("map", pairs).serialize(s),
        }
    }
}

impl<'de> Deserialize<'de> for Datum {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let v = Value::deserialize(d)?;
        Datum::from_json(&v).map_err(serde::de::Error::custom)
    }
}

/// Split a `["tag", payload]` array, rejecting anything else.
fn tagged_pair<'a>(
    parts: &'a [Value],
    kind: &'static str,
) -> Result<(&'a str, &'a Value), ProtoError> {
    if parts.len() != 2 {
        return Err(ProtoError::Malformed {
            kind,
            reason: format!("expected a 2 element array, there are {}", parts.len()),
        });
    }
    let tag = parts[0].as_str().ok_or_else(|| ProtoError::Malformed {
        kind,
        reason: "tag must be a string".to_string(),
    })?;
    Ok((tag, &parts[1]))
}

fn multiset_eq(a: &[Atom], b: &[Atom]) -> bool {
    let count = |xs: &[Atom], x: &Atom| xs.iter().filter(|y| *y == x).count();
    a.len() == b.len() && a.iter().all(|x| count(a, x) == count(b, x))
}

fn map_eq(a: &[(Atom, Atom)], b: &[(Atom, Atom)]) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(k, v)| b.iter().any(|(k2, v2)| k2 == k && v2 == v))
}
