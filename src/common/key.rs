use crate::{
    common::value::{self, Value},
    error::{Error, Result},
    model::schema::Schema,
};

use aws_sdk_dynamodb::types;
use indexmap::IndexMap;
use std::collections;

/// Primary key of an item.
///
/// The shorthands resolve against the keys declared on the model: the first declared
/// key is the partition key, the second one the sort key. A model routed through an
/// index declares the index keys, so it only accepts explicit keys, and those are
/// passed through unchecked.
///
/// ```rust
/// use dynamodb_model::common::key::PrimaryKey;
///
/// let movie = PrimaryKey::composite(1992, "Reservoir Dogs");
/// let user = PrimaryKey::partition("alice");
/// let explicit = PrimaryKey::explicit([("id", "alice".into())]);
/// # let _ = (movie, user, explicit);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum PrimaryKey {
    /// The partition key value of a table without a sort key.
    Partition(Value),
    /// The partition and sort key values.
    Composite(Value, Value),
    /// Key values by wire name.
    Explicit(IndexMap<String, Value>),
}

impl PrimaryKey {
    /// A partition key value.
    pub fn partition(value: impl Into<Value>) -> Self {
        Self::Partition(value.into())
    }

    /// A partition and a sort key value.
    pub fn composite(partition: impl Into<Value>, sort: impl Into<Value>) -> Self {
        Self::Composite(partition.into(), sort.into())
    }

    /// Key values by wire name.
    pub fn explicit<I, N>(values: I) -> Self
    where
        I: IntoIterator<Item = (N, Value)>,
        N: Into<String>,
    {
        Self::Explicit(
            values
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        )
    }

    /// Resolve into the wire key of an item of `schema`.
    pub(crate) fn resolve(
        self,
        schema: &Schema,
    ) -> Result<collections::HashMap<String, types::AttributeValue>> {
        let key_names = schema.key_names();
        let pairs: Vec<(String, Value)> = match self {
            Self::Partition(_) | Self::Composite(..) if schema.index_name().is_some() => {
                return Err(Error::InvalidKey(format!(
                    "table {} is read through index {:?}, its primary key must be explicit",
                    schema.table_name(),
                    schema.index_name().unwrap_or_default()
                )));
            }
            Self::Explicit(values) if schema.index_name().is_some() => values.into_iter().collect(),
            Self::Partition(value) => match key_names.as_slice() {
                [partition] => vec![(partition.to_string(), value)],
                _ => return Err(shorthand_mismatch(schema, 1)),
            },
            Self::Composite(partition_value, sort_value) => match key_names.as_slice() {
                [partition, sort] => vec![
                    (partition.to_string(), partition_value),
                    (sort.to_string(), sort_value),
                ],
                _ => return Err(shorthand_mismatch(schema, 2)),
            },
            Self::Explicit(values) => {
                let matches_schema = key_names.is_empty()
                    || (values.len() == key_names.len()
                        && key_names.iter().all(|name| values.contains_key(*name)));
                if !matches_schema {
                    return Err(Error::InvalidKey(format!(
                        "expected the keys {key_names:?} of table {}, found {:?}",
                        schema.table_name(),
                        values.keys().collect::<Vec<_>>()
                    )));
                }
                values.into_iter().collect()
            }
        };
        let mut keys = collections::HashMap::with_capacity(pairs.len());
        for (name, value) in pairs {
            keys.insert(name, value::to_wire(&value)?);
        }
        Ok(keys)
    }
}

fn shorthand_mismatch(schema: &Schema, given: usize) -> Error {
    Error::InvalidKey(format!(
        "{given} key value(s) given but table {} declares the keys {:?}",
        schema.table_name(),
        schema.key_names()
    ))
}

impl From<IndexMap<String, Value>> for PrimaryKey {
    fn from(values: IndexMap<String, Value>) -> Self {
        Self::Explicit(values)
    }
}
