//! Typed models: schema declaration, the per-type registry and the unset sentinel.
//!
//! A model is a serde type plus an explicit schema:
//!
//! ```rust
//! use dynamodb_model::{
//!     common::attribute::{Attr, Key},
//!     model::{self, MaybeSet, Model, schema::SchemaBuilder},
//! };
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Deserialize, Serialize)]
//! struct Movie {
//!     year: i64,
//!     title: String,
//!     #[serde(default, skip_serializing_if = "MaybeSet::is_not_set")]
//!     rating: MaybeSet<f64>,
//! }
//!
//! impl Model for Movie {
//!     fn define() -> SchemaBuilder {
//!         SchemaBuilder::new("movies")
//!             .key("year", Key::new())
//!             .key("title", Key::new())
//!             .attr("rating", Attr::named("Rating"))
//!     }
//! }
//!
//! let rating = model::attr::<Movie>("rating").unwrap();
//! let query = model::key::<Movie>("year").unwrap().eq(1992) & rating.gt(8);
//! # let _ = query;
//! ```

/// Dynamic, schema-bound records.
pub mod record;

/// Schema declaration and item conversion.
pub mod schema;

use crate::{
    common::attribute::{Attr, Key},
    error,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de::DeserializeOwned};
use std::{any, collections, sync};

/// A value that may be absent from the stored item.
///
/// `NotSet` is distinct from a stored `NULL`: deserializing an item without the
/// attribute yields `NotSet`, and a `NotSet` field is never written. Pair it with
/// `#[serde(default, skip_serializing_if = "MaybeSet::is_not_set")]`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum MaybeSet<T> {
    /// The attribute is absent.
    #[default]
    NotSet,
    /// The attribute is present.
    Set(T),
}

impl<T> MaybeSet<T> {
    /// Whether the attribute is present.
    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }

    /// Whether the attribute is absent.
    pub fn is_not_set(&self) -> bool {
        matches!(self, Self::NotSet)
    }

    /// Borrow the value.
    pub fn as_ref(&self) -> MaybeSet<&T> {
        match self {
            Self::Set(value) => MaybeSet::Set(value),
            Self::NotSet => MaybeSet::NotSet,
        }
    }

    /// Convert into an `Option`, losing the distinction with a stored null.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Set(value) => Some(value),
            Self::NotSet => None,
        }
    }
}

impl<T> From<T> for MaybeSet<T> {
    fn from(value: T) -> Self {
        Self::Set(value)
    }
}

impl<T: Serialize> Serialize for MaybeSet<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Set(value) => value.serialize(serializer),
            Self::NotSet => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for MaybeSet<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Self::Set)
    }
}

/// A type stored in a DynamoDB table.
pub trait Model: Serialize + DeserializeOwned + 'static {
    /// Declare the table, the optional index and the attributes of the model.
    fn define() -> schema::SchemaBuilder;
}

type Registry = sync::RwLock<collections::HashMap<any::TypeId, sync::Arc<schema::Schema>>>;

static REGISTRY: sync::OnceLock<Registry> = sync::OnceLock::new();

/// The schema of `M`, built and validated on first use.
pub fn schema<M: Model>() -> error::Result<sync::Arc<schema::Schema>> {
    let registry = REGISTRY.get_or_init(Registry::default);
    let type_id = any::TypeId::of::<M>();
    if let Some(schema) = registry
        .read()
        .unwrap_or_else(sync::PoisonError::into_inner)
        .get(&type_id)
    {
        return Ok(schema.clone());
    }
    let schema = sync::Arc::new(M::define().build()?);
    #[cfg(feature = "tracing")]
    tracing::debug!(
        table_name = schema.table_name(),
        index_name = ?schema.index_name(),
        attributes = schema.attributes().len(),
        "registered model schema"
    );
    let mut registry = registry
        .write()
        .unwrap_or_else(sync::PoisonError::into_inner);
    Ok(registry.entry(type_id).or_insert(schema).clone())
}

/// The key attribute declared on the field `field_name` of `M`.
pub fn key<M: Model>(field_name: &str) -> error::Result<Key> {
    schema::<M>()?.key(field_name)
}

/// The non-key attribute declared on the field `field_name` of `M`.
pub fn attr<M: Model>(field_name: &str) -> error::Result<Attr> {
    schema::<M>()?.attr(field_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    use rstest::rstest;
    use serde_json::json;

    #[derive(Deserialize, Serialize)]
    struct Movie {
        year: i64,
        title: String,
    }

    impl Model for Movie {
        fn define() -> schema::SchemaBuilder {
            schema::SchemaBuilder::new("movies")
                .key("year", Key::new())
                .key("title", Key::named("Title"))
        }
    }

    #[derive(Deserialize, Serialize)]
    struct Broken {
        a: i64,
    }

    impl Model for Broken {
        fn define() -> schema::SchemaBuilder {
            schema::SchemaBuilder::new("broken")
                .attr("a", Attr::named("x"))
                .attr("b", Attr::named("x"))
        }
    }

    #[test]
    fn test_schema_is_registered_once() {
        let first = schema::<Movie>().unwrap();
        let second = schema::<Movie>().unwrap();
        assert!(sync::Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_key_lookup() {
        assert_eq!(key::<Movie>("title").unwrap().name(), Some("Title"));
    }

    #[test]
    fn test_definition_errors_surface_on_every_lookup() {
        for _ in 0..2 {
            assert!(matches!(schema::<Broken>(), Err(Error::Definition(_))));
        }
    }

    #[rstest]
    #[case::set(json!({"value": 0}), MaybeSet::Set(0))]
    #[case::not_set(json!({}), MaybeSet::NotSet)]
    fn test_maybe_set_deserialization(
        #[case] input: serde_json::Value,
        #[case] expected: MaybeSet<i64>,
    ) {
        #[derive(Deserialize)]
        struct Wrapper {
            #[serde(default)]
            value: MaybeSet<i64>,
        }
        let actual: Wrapper = serde_json::from_value(input).unwrap();
        assert_eq!(actual.value, expected);
    }

    #[test]
    fn test_maybe_set_is_skipped_when_not_set() {
        #[derive(Serialize)]
        struct Wrapper {
            #[serde(skip_serializing_if = "MaybeSet::is_not_set")]
            value: MaybeSet<bool>,
        }
        let actual = serde_json::to_value(Wrapper {
            value: MaybeSet::NotSet,
        })
        .unwrap();
        assert_eq!(actual, json!({}));
        let actual = serde_json::to_value(Wrapper {
            value: MaybeSet::Set(false),
        })
        .unwrap();
        assert_eq!(actual, json!({"value": false}));
    }
}
