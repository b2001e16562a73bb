//! Request/response mapping between external and storage representations.
//!
//! # Responsibility
//! - Tri-state field updates for partial-update requests.
//! - External id parsing and validation.
//! - Boolean <-> `0/1` storage encoding.
//! - Shared response envelopes.
//!
//! # Invariants
//! - An absent update field never touches storage; explicit `null` clears it.
//! - Ids accepted by services are strictly positive.

use crate::model::ValidationError;
use rusqlite::types::Value;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Tri-state value for one field of a partial-update request.
///
/// Deserialized with `#[serde(default)]`: a missing key yields `Unchanged`,
/// `null` yields `Clear`, anything else yields `Set`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    /// Keep the stored value.
    #[default]
    Unchanged,
    /// Store `NULL`.
    Clear,
    /// Store the given value.
    Set(T),
}

impl<T> FieldUpdate<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    /// Returns the new value when one is being set.
    pub fn as_set(&self) -> Option<&T> {
        match self {
            Self::Set(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> From<Option<T>> for FieldUpdate<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Set(value),
            None => Self::Clear,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for FieldUpdate<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Self::from)
    }
}

impl<T: Serialize> Serialize for FieldUpdate<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Unchanged | Self::Clear => serializer.serialize_none(),
            Self::Set(value) => serializer.serialize_some(value),
        }
    }
}

/// Response envelope for successful deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deleted {
    pub deleted: bool,
    pub id: i64,
}

impl Deleted {
    pub fn new(id: i64) -> Self {
        Self { deleted: true, id }
    }
}

/// Parses an externally supplied id (e.g. a path segment).
///
/// Non-numeric and non-positive values are both validation errors.
pub fn parse_id(field: &'static str, raw: &str) -> Result<i64, ValidationError> {
    let id = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::new(field, format!("`{raw}` is not a numeric id")))?;
    validate_id(field, id)
}

/// Rejects ids that can never be assigned by storage.
pub fn validate_id(field: &'static str, id: i64) -> Result<i64, ValidationError> {
    if id <= 0 {
        return Err(ValidationError::new(
            field,
            format!("id must be a positive integer, got {id}"),
        ));
    }
    Ok(id)
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64) -> Option<bool> {
    match value {
        0 => Some(false),
        1 => Some(true),
        _ => None,
    }
}

pub(crate) fn text_value(value: Option<String>) -> Value {
    value.map_or(Value::Null, Value::Text)
}

pub(crate) fn integer_value(value: Option<i64>) -> Value {
    value.map_or(Value::Null, Value::Integer)
}
