use crate::error::{Error, Result};

use aws_sdk_dynamodb::{primitives::Blob, types};
use indexmap::IndexMap;
use serde::Serialize;
use serde_dynamo::to_attribute_value;
use std::{cmp, collections, hash};

/// A DynamoDB number.
///
/// Numbers travel as decimal strings. Decoding keeps integral values as integers so
/// that a stored `5.0` reads back as `5`.
#[derive(Clone, Copy, Debug)]
pub enum Number {
    /// An integral number.
    Integer(i64),
    /// A non-integral (or out of `i64` range) number.
    Float(f64),
}

impl Number {
    /// The number as a float.
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Integer(integer) => integer as f64,
            Self::Float(float) => float,
        }
    }

    fn to_wire(self) -> Result<String> {
        match self {
            Self::Integer(integer) => Ok(integer.to_string()),
            Self::Float(float) if float.is_finite() => Ok(float.to_string()),
            Self::Float(float) => Err(Error::UnsupportedValue(format!(
                "{float} has no decimal representation"
            ))),
        }
    }

    fn from_wire(text: &str) -> Result<Self> {
        if let Ok(integer) = text.parse::<i64>() {
            return Ok(Self::Integer(integer));
        }
        let float = text
            .parse::<f64>()
            .ok()
            .filter(|float| float.is_finite())
            .ok_or_else(|| Error::UnsupportedValue(format!("{text:?} is not a number")))?;
        // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound
        if float.fract() == 0.0 && float >= i64::MIN as f64 && float < i64::MAX as f64 {
            Ok(Self::Integer(float as i64))
        } else {
            Ok(Self::Float(float))
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == cmp::Ordering::Equal
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        match (*self, *other) {
            (Self::Integer(left), Self::Integer(right)) => left.cmp(&right),
            (Self::Float(left), Self::Float(right)) => left
                .partial_cmp(&right)
                .unwrap_or_else(|| left.total_cmp(&right)),
            (Self::Integer(left), Self::Float(right)) => compare_exact(left, right),
            (Self::Float(left), Self::Integer(right)) => compare_exact(right, left).reverse(),
        }
    }
}

const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

/// Compare an integer against a float without rounding either side.
///
/// NaNs sort at the ends according to their sign, as `f64::total_cmp` places them.
fn compare_exact(integer: i64, float: f64) -> cmp::Ordering {
    if float.is_nan() {
        return if float.is_sign_negative() {
            cmp::Ordering::Greater
        } else {
            cmp::Ordering::Less
        };
    }
    let truncated = float.trunc();
    if truncated >= TWO_POW_63 {
        return cmp::Ordering::Less;
    }
    if truncated < -TWO_POW_63 {
        return cmp::Ordering::Greater;
    }
    let fraction = float - truncated;
    integer.cmp(&(truncated as i64)).then(if fraction > 0.0 {
        cmp::Ordering::Less
    } else if fraction < 0.0 {
        cmp::Ordering::Greater
    } else {
        cmp::Ordering::Equal
    })
}

/// A native value that can be written to or compared against a DynamoDB attribute.
///
/// ```rust
/// use dynamodb_model::common::value::{self, Value};
///
/// let rating = Value::from(5.5);
/// let wire = value::to_wire(&rating).unwrap();
/// assert_eq!(value::from_wire(wire).unwrap(), rating);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// The `NULL` attribute.
    Null,
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(Number),
    /// A string.
    String(String),
    /// Binary data.
    Bytes(Vec<u8>),
    /// An ordered list.
    List(Vec<Value>),
    /// A fixed-size sequence.
    ///
    /// Tuples are written as lists and read back as [`Value::List`].
    Tuple(Vec<Value>),
    /// A string set.
    StringSet(collections::BTreeSet<String>),
    /// A number set.
    NumberSet(collections::BTreeSet<Number>),
    /// A binary set.
    BinarySet(collections::BTreeSet<Vec<u8>>),
    /// A map with string keys.
    Map(IndexMap<String, Value>),
}

impl Value {
    /// Binary data.
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(bytes.into())
    }

    /// Convert any serializable value through its DynamoDB representation.
    pub fn from_serialize<T: Serialize>(value: T) -> Result<Self> {
        let attribute_value: types::AttributeValue = to_attribute_value(value)?;
        from_wire(attribute_value)
    }

    /// Coerce a list or tuple into the set type matching its elements.
    ///
    /// Sets and scalars are returned unchanged. Empty and mixed lists cannot be
    /// expressed as a DynamoDB set.
    pub fn into_set(self) -> Result<Self> {
        let items = match self {
            Self::List(items) | Self::Tuple(items) => items,
            other => return Ok(other),
        };
        match items.first() {
            Some(Self::String(_)) => items
                .into_iter()
                .map(|item| match item {
                    Self::String(string) => Ok(string),
                    other => Err(mixed_set(&other)),
                })
                .collect::<Result<_>>()
                .map(Self::StringSet),
            Some(Self::Number(_)) => items
                .into_iter()
                .map(|item| match item {
                    Self::Number(number) => Ok(number),
                    other => Err(mixed_set(&other)),
                })
                .collect::<Result<_>>()
                .map(Self::NumberSet),
            Some(Self::Bytes(_)) => items
                .into_iter()
                .map(|item| match item {
                    Self::Bytes(bytes) => Ok(bytes),
                    other => Err(mixed_set(&other)),
                })
                .collect::<Result<_>>()
                .map(Self::BinarySet),
            Some(other) => Err(Error::UnsupportedValue(format!(
                "{other:?} cannot be a set element"
            ))),
            None => Err(Error::UnsupportedValue("empty set".to_string())),
        }
    }
}

fn mixed_set(item: &Value) -> Error {
    Error::UnsupportedValue(format!("set elements must share one type, found {item:?}"))
}

fn non_empty<T>(set: &collections::BTreeSet<T>) -> Result<&collections::BTreeSet<T>> {
    if set.is_empty() {
        Err(Error::UnsupportedValue("empty set".to_string()))
    } else {
        Ok(set)
    }
}

/// Encode a native value as a DynamoDB attribute value.
pub fn to_wire(value: &Value) -> Result<types::AttributeValue> {
    let attribute_value = match value {
        Value::Null => types::AttributeValue::Null(true),
        Value::Bool(boolean) => types::AttributeValue::Bool(*boolean),
        Value::Number(number) => types::AttributeValue::N(number.to_wire()?),
        Value::String(string) => types::AttributeValue::S(string.clone()),
        Value::Bytes(bytes) => types::AttributeValue::B(Blob::new(bytes.clone())),
        Value::List(items) | Value::Tuple(items) => {
            types::AttributeValue::L(items.iter().map(to_wire).collect::<Result<_>>()?)
        }
        Value::StringSet(set) => types::AttributeValue::Ss(non_empty(set)?.iter().cloned().collect()),
        Value::NumberSet(set) => types::AttributeValue::Ns(
            non_empty(set)?
                .iter()
                .map(|number| number.to_wire())
                .collect::<Result<_>>()?,
        ),
        Value::BinarySet(set) => types::AttributeValue::Bs(
            non_empty(set)?
                .iter()
                .map(|bytes| Blob::new(bytes.clone()))
                .collect(),
        ),
        Value::Map(map) => types::AttributeValue::M(
            map.iter()
                .map(|(key, value)| Ok((key.clone(), to_wire(value)?)))
                .collect::<Result<_>>()?,
        ),
    };
    Ok(attribute_value)
}

/// Decode a DynamoDB attribute value into a native value.
pub fn from_wire(value: types::AttributeValue) -> Result<Value> {
    let value = match value {
        types::AttributeValue::Null(_) => Value::Null,
        types::AttributeValue::Bool(boolean) => Value::Bool(boolean),
        types::AttributeValue::N(number) => Value::Number(Number::from_wire(&number)?),
        types::AttributeValue::S(string) => Value::String(string),
        types::AttributeValue::B(blob) => Value::Bytes(blob.into_inner()),
        types::AttributeValue::L(items) => {
            Value::List(items.into_iter().map(from_wire).collect::<Result<_>>()?)
        }
        types::AttributeValue::Ss(strings) => Value::StringSet(strings.into_iter().collect()),
        types::AttributeValue::Ns(numbers) => Value::NumberSet(
            numbers
                .iter()
                .map(|number| Number::from_wire(number))
                .collect::<Result<_>>()?,
        ),
        types::AttributeValue::Bs(blobs) => {
            Value::BinarySet(blobs.into_iter().map(Blob::into_inner).collect())
        }
        types::AttributeValue::M(map) => Value::Map(
            map.into_iter()
                .map(|(key, value)| Ok((key, from_wire(value)?)))
                .collect::<Result<_>>()?,
        ),
        other => {
            return Err(Error::UnsupportedValue(format!(
                "unknown attribute value {other:?}"
            )));
        }
    };
    Ok(value)
}

macro_rules! integer_values {
    ($($integer:ty),*) => {
        $(
            impl From<$integer> for Value {
                fn from(value: $integer) -> Self {
                    Self::Number(Number::Integer(i64::from(value)))
                }
            }
        )*
    };
}

integer_values!(i8, i16, i32, i64, u8, u16, u32);

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(Number::Float(value))
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

impl<A: Into<Value>, B: Into<Value>> From<(A, B)> for Value {
    fn from((a, b): (A, B)) -> Self {
        Self::Tuple(vec![a.into(), b.into()])
    }
}

impl<A: Into<Value>, B: Into<Value>, C: Into<Value>> From<(A, B, C)> for Value {
    fn from((a, b, c): (A, B, C)) -> Self {
        Self::Tuple(vec![a.into(), b.into(), c.into()])
    }
}

impl From<collections::BTreeSet<String>> for Value {
    fn from(value: collections::BTreeSet<String>) -> Self {
        Self::StringSet(value)
    }
}

impl<S: hash::BuildHasher> From<collections::HashSet<String, S>> for Value {
    fn from(value: collections::HashSet<String, S>) -> Self {
        Self::StringSet(value.into_iter().collect())
    }
}

impl From<collections::BTreeSet<i64>> for Value {
    fn from(value: collections::BTreeSet<i64>) -> Self {
        Self::NumberSet(value.into_iter().map(Number::Integer).collect())
    }
}

impl<S: hash::BuildHasher> From<collections::HashSet<i64, S>> for Value {
    fn from(value: collections::HashSet<i64, S>) -> Self {
        Self::NumberSet(value.into_iter().map(Number::Integer).collect())
    }
}

impl<V: Into<Value>> From<IndexMap<String, V>> for Value {
    fn from(value: IndexMap<String, V>) -> Self {
        Self::Map(value.into_iter().map(|(key, value)| (key, value.into())).collect())
    }
}

impl<V: Into<Value>, S: hash::BuildHasher> From<collections::HashMap<String, V, S>> for Value {
    fn from(value: collections::HashMap<String, V, S>) -> Self {
        Self::Map(value.into_iter().map(|(key, value)| (key, value.into())).collect())
    }
}
