use crate::{
    common::{
        attribute::{Attr, AttributeRef, Key},
        value,
    },
    error::{Error, Result},
};

use aws_sdk_dynamodb::{primitives::Blob, types};
use indexmap::IndexMap;
use serde::{Serialize, de::DeserializeOwned};
use serde_dynamo::{from_item, to_item};
use std::collections;

/// A declared attribute of a model.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeDefinition {
    field_name: String,
    reference: AttributeRef,
    is_key: bool,
    encoding: Encoding,
}

impl AttributeDefinition {
    /// The name of the model field.
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// The bound reference.
    pub fn reference(&self) -> &AttributeRef {
        &self.reference
    }

    /// Whether the attribute was declared as a [`Key`].
    pub fn is_key(&self) -> bool {
        self.is_key
    }

    /// How the field is stored on the wire.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
}

/// How the serde output of a field is stored on the wire.
///
/// Serde has no notion of sets or byte strings: a `HashSet<i64>` and a `Vec<u8>` both
/// serialize as a sequence, which would be stored as a list. Declaring the encoding
/// stores them as DynamoDB sets and binaries instead, and turns them back into
/// sequences on decode.
///
/// An empty set cannot be stored: the attribute is omitted, so the field needs
/// `#[serde(default)]` to read back.
///
/// ```rust
/// use dynamodb_model::{
///     common::attribute::{Attr, Key},
///     model::schema::{Encoding, SchemaBuilder},
/// };
/// use serde::Serialize;
/// use std::collections::HashSet;
///
/// #[derive(Serialize)]
/// struct Tagged {
///     id: String,
///     scores: HashSet<i64>,
///     avatar: Vec<u8>,
/// }
///
/// let schema = SchemaBuilder::new("tagged")
///     .key("id", Key::new())
///     .attr("scores", Attr::new())
///     .attr("avatar", Attr::new())
///     .encode("scores", Encoding::Set)
///     .encode("avatar", Encoding::Bytes)
///     .build()
///     .unwrap();
/// let item = schema
///     .to_item(&Tagged {
///         id: "a".to_string(),
///         scores: HashSet::from([1, 2]),
///         avatar: vec![0xff],
///     })
///     .unwrap();
/// assert!(item["scores"].is_ns());
/// assert!(item["avatar"].is_b());
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Encoding {
    /// The serde representation, as is.
    #[default]
    Native,
    /// A sequence of bytes stored as a binary (`B`).
    Bytes,
    /// A sequence of strings or numbers stored as a string or number set (`SS`, `NS`).
    Set,
    /// A sequence of byte sequences stored as a binary set (`BS`).
    BinarySet,
}

impl Encoding {
    fn is_set(self) -> bool {
        matches!(self, Self::Set | Self::BinarySet)
    }

    /// Store a serialized field, `None` for an empty set.
    pub(crate) fn encode(
        self,
        value: types::AttributeValue,
    ) -> Result<Option<types::AttributeValue>> {
        let items = match value {
            types::AttributeValue::L(items) if self != Self::Native => items,
            value => return Ok(Some(value)),
        };
        if self.is_set() && items.is_empty() {
            return Ok(None);
        }
        let value = match self {
            Self::Native => types::AttributeValue::L(items),
            Self::Bytes => types::AttributeValue::B(Blob::new(bytes(items)?)),
            Self::Set => {
                let set = value::from_wire(types::AttributeValue::L(items))?.into_set()?;
                value::to_wire(&set)?
            }
            Self::BinarySet => {
                let set = items
                    .into_iter()
                    .map(|item| match item {
                        types::AttributeValue::L(items) => bytes(items),
                        types::AttributeValue::B(blob) => Ok(blob.into_inner()),
                        other => Err(Error::UnsupportedValue(format!(
                            "{other:?} is not a byte sequence"
                        ))),
                    })
                    .collect::<Result<collections::BTreeSet<_>>>()?;
                types::AttributeValue::Bs(set.into_iter().map(Blob::new).collect())
            }
        };
        Ok(Some(value))
    }

    /// Turn a stored field back into the shape serde expects.
    pub(crate) fn decode(self, value: types::AttributeValue) -> types::AttributeValue {
        match value {
            types::AttributeValue::B(blob) if self == Self::Bytes => byte_list(blob),
            types::AttributeValue::Ss(strings) if self.is_set() => types::AttributeValue::L(
                strings.into_iter().map(types::AttributeValue::S).collect(),
            ),
            types::AttributeValue::Ns(numbers) if self.is_set() => types::AttributeValue::L(
                numbers.into_iter().map(types::AttributeValue::N).collect(),
            ),
            types::AttributeValue::Bs(blobs) if self.is_set() => {
                types::AttributeValue::L(blobs.into_iter().map(byte_list).collect())
            }
            value => value,
        }
    }
}

fn bytes(items: Vec<types::AttributeValue>) -> Result<Vec<u8>> {
    items
        .into_iter()
        .map(|item| {
            let byte = match &item {
                types::AttributeValue::N(number) => number.parse::<u8>().ok(),
                _ => None,
            };
            byte.ok_or_else(|| Error::UnsupportedValue(format!("{item:?} is not a byte")))
        })
        .collect()
}

fn byte_list(blob: Blob) -> types::AttributeValue {
    types::AttributeValue::L(
        blob.into_inner()
            .into_iter()
            .map(|byte| types::AttributeValue::N(byte.to_string()))
            .collect(),
    )
}

/// Collects attribute declarations for a model.
///
/// ```rust
/// use dynamodb_model::{
///     common::attribute::{Attr, Key},
///     model::schema::SchemaBuilder,
/// };
///
/// let schema = SchemaBuilder::new("movies")
///     .key("year", Key::new())
///     .key("title", Key::new())
///     .attr("rating", Attr::named("Rating"))
///     .build()
///     .unwrap();
/// assert_eq!(schema.key_names(), vec!["year", "title"]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct SchemaBuilder {
    table_name: String,
    index_name: Option<String>,
    attributes: Vec<(String, AttributeRef, bool)>,
    encodings: Vec<(String, Encoding)>,
}

impl SchemaBuilder {
    /// Start a schema for `table_name`.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Self::default()
        }
    }

    /// Route queries and scans of the model to the index `index_name`.
    pub fn index(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = Some(index_name.into());
        self
    }

    /// Declare a key attribute on the field `field_name`.
    pub fn key(mut self, field_name: impl Into<String>, key: Key) -> Self {
        self.attributes
            .push((field_name.into(), key.reference().clone(), true));
        self
    }

    /// Declare a non-key attribute on the field `field_name`.
    pub fn attr(mut self, field_name: impl Into<String>, attr: Attr) -> Self {
        self.attributes
            .push((field_name.into(), attr.reference().clone(), false));
        self
    }

    /// Store the field `field_name` with `encoding`.
    pub fn encode(mut self, field_name: impl Into<String>, encoding: Encoding) -> Self {
        self.encodings.push((field_name.into(), encoding));
        self
    }

    /// Bind every declaration to its field and validate the result.
    pub fn build(self) -> Result<Schema> {
        if self.table_name.is_empty() {
            return Err(Error::Definition("table name is empty".to_string()));
        }
        let mut attributes = IndexMap::with_capacity(self.attributes.len());
        let mut field_names = collections::HashSet::with_capacity(self.attributes.len());
        let mut key_count = 0;
        for (field_name, reference, is_key) in self.attributes {
            if field_name.is_empty() {
                return Err(Error::Definition(format!(
                    "empty field name on table {}",
                    self.table_name
                )));
            }
            if !reference.path().is_empty() {
                return Err(Error::Definition(format!(
                    "field {field_name} is declared with a nested path {reference}"
                )));
            }
            if !field_names.insert(field_name.clone()) {
                return Err(Error::Definition(format!(
                    "field {field_name} is declared twice"
                )));
            }
            let reference = reference.bind(&field_name);
            let wire_name = reference.name().unwrap_or_default().to_string();
            if wire_name.is_empty() {
                return Err(Error::Definition(format!(
                    "field {field_name} has an empty attribute name"
                )));
            }
            if attributes.contains_key(&wire_name) {
                return Err(Error::Definition(format!(
                    "attribute name {wire_name} is used by more than one field"
                )));
            }
            if is_key {
                key_count += 1;
            }
            attributes.insert(
                wire_name,
                AttributeDefinition {
                    field_name,
                    reference,
                    is_key,
                    encoding: Encoding::Native,
                },
            );
        }
        for (field_name, encoding) in self.encodings {
            let definition = attributes
                .values_mut()
                .find(|definition| definition.field_name == field_name)
                .ok_or_else(|| {
                    Error::Definition(format!(
                        "encoding given for undeclared field {field_name}"
                    ))
                })?;
            if definition.is_key && encoding.is_set() {
                return Err(Error::Definition(format!(
                    "key field {field_name} cannot be stored as a set"
                )));
            }
            definition.encoding = encoding;
        }
        if key_count > 2 {
            return Err(Error::Definition(format!(
                "table {} declares {key_count} keys, at most a partition and a sort key are allowed",
                self.table_name
            )));
        }
        Ok(Schema {
            table_name: self.table_name,
            index_name: self.index_name,
            attributes,
        })
    }
}

/// The static descriptor of a model: table, optional index and declared attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct Schema {
    table_name: String,
    index_name: Option<String>,
    attributes: IndexMap<String, AttributeDefinition>,
}

impl Schema {
    /// The table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The index queried and scanned instead of the table, if any.
    pub fn index_name(&self) -> Option<&str> {
        self.index_name.as_deref()
    }

    /// Declared attributes, by wire name, in declaration order.
    pub fn attributes(&self) -> &IndexMap<String, AttributeDefinition> {
        &self.attributes
    }

    /// Wire name mapped to field name, in declaration order.
    pub fn declared_attributes(&self) -> IndexMap<&str, &str> {
        self.attributes
            .iter()
            .map(|(wire_name, definition)| (wire_name.as_str(), definition.field_name.as_str()))
            .collect()
    }

    /// Wire names of the declared keys: the partition key first, then the sort key.
    pub fn key_names(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .filter(|(_, definition)| definition.is_key)
            .map(|(wire_name, _)| wire_name.as_str())
            .collect()
    }

    /// The declaration for the field `field_name`.
    pub fn field(&self, field_name: &str) -> Option<&AttributeDefinition> {
        self.attributes
            .values()
            .find(|definition| definition.field_name == field_name)
    }

    fn definition(&self, field_name: &str) -> Result<&AttributeDefinition> {
        self.field(field_name).ok_or_else(|| {
            Error::Definition(format!(
                "field {field_name} is not declared on table {}",
                self.table_name
            ))
        })
    }

    /// The key attribute declared on `field_name`.
    pub fn key(&self, field_name: &str) -> Result<Key> {
        let definition = self.definition(field_name)?;
        if !definition.is_key {
            return Err(Error::Definition(format!(
                "field {field_name} is not a key"
            )));
        }
        Ok(Key::from_reference(definition.reference.clone()))
    }

    /// The non-key attribute declared on `field_name`.
    pub fn attr(&self, field_name: &str) -> Result<Attr> {
        let definition = self.definition(field_name)?;
        if definition.is_key {
            return Err(Error::Definition(format!(
                "field {field_name} is a key"
            )));
        }
        Ok(Attr::from_reference(definition.reference.clone()))
    }

    /// Serialize a model into a wire item keyed by wire names.
    pub fn to_item<M: Serialize>(
        &self,
        model: &M,
    ) -> Result<collections::HashMap<String, types::AttributeValue>> {
        let fields: collections::HashMap<String, types::AttributeValue> = to_item(model)?;
        let mut item = collections::HashMap::with_capacity(fields.len());
        for (field_name, value) in fields {
            let (wire_name, definition) = self
                .attributes
                .iter()
                .find(|(_, definition)| definition.field_name == field_name)
                .ok_or_else(|| {
                    Error::Definition(format!(
                        "field {field_name} is not declared on table {}",
                        self.table_name
                    ))
                })?;
            if let Some(value) = definition.encoding.encode(value)? {
                item.insert(wire_name.clone(), value);
            }
        }
        Ok(item)
    }

    /// Deserialize a wire item, silently dropping undeclared attributes.
    pub fn from_item<M: DeserializeOwned>(
        &self,
        item: collections::HashMap<String, types::AttributeValue>,
    ) -> Result<M> {
        let fields: collections::HashMap<String, types::AttributeValue> = item
            .into_iter()
            .filter_map(|(wire_name, value)| {
                self.attributes
                    .get(&wire_name)
                    .map(|definition| {
                        (
                            definition.field_name.clone(),
                            definition.encoding.decode(value),
                        )
                    })
            })
            .collect();
        Ok(from_item(fields)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MaybeSet;

    use rstest::rstest;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq, Serialize)]
    struct Movie {
        year: i64,
        title: String,
        #[serde(default, skip_serializing_if = "MaybeSet::is_not_set")]
        rating: MaybeSet<f64>,
    }

    fn movies() -> Schema {
        SchemaBuilder::new("movies")
            .key("year", Key::new())
            .key("title", Key::new())
            .attr("rating", Attr::named("Rating"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_declared_attributes() {
        let schema = movies();
        let actual: Vec<_> = schema.declared_attributes().into_iter().collect();
        assert_eq!(
            actual,
            vec![("year", "year"), ("title", "title"), ("Rating", "rating")]
        );
        assert_eq!(schema.key_names(), vec!["year", "title"]);
    }

    #[rstest]
    #[case::duplicate_wire_name(
        SchemaBuilder::new("t")
            .key("id", Key::new())
            .attr("other", Attr::named("id"))
    )]
    #[case::duplicate_field_name(
        SchemaBuilder::new("t")
            .key("id", Key::new())
            .attr("id", Attr::named("other"))
    )]
    #[case::nested_declaration(SchemaBuilder::new("t").attr("a", Attr::named("a").field("b")))]
    #[case::empty_wire_name(SchemaBuilder::new("t").attr("a", Attr::named("")))]
    #[case::empty_table_name(SchemaBuilder::new("").key("id", Key::new()))]
    #[case::set_encoded_key(
        SchemaBuilder::new("t")
            .key("id", Key::new())
            .encode("id", Encoding::Set)
    )]
    #[case::encoding_for_undeclared_field(
        SchemaBuilder::new("t")
            .key("id", Key::new())
            .encode("other", Encoding::Bytes)
    )]
    #[case::too_many_keys(
        SchemaBuilder::new("t")
            .key("a", Key::new())
            .key("b", Key::new())
            .key("c", Key::new())
    )]
    fn test_invalid_definition(#[case] builder: SchemaBuilder) {
        assert!(matches!(builder.build(), Err(Error::Definition(_))));
    }

    #[rstest]
    #[case::key_as_attr("year", false)]
    #[case::attr_as_key("rating", true)]
    #[case::undeclared("unknown", true)]
    fn test_lookup_mismatch(#[case] field_name: &str, #[case] as_key: bool) {
        let schema = movies();
        let actual = if as_key {
            schema.key(field_name).map(|_| ())
        } else {
            schema.attr(field_name).map(|_| ())
        };
        assert!(matches!(actual, Err(Error::Definition(_))));
    }

    #[test]
    fn test_lookup_binds_wire_name() {
        let schema = movies();
        assert_eq!(schema.attr("rating").unwrap().name(), Some("Rating"));
        assert_eq!(schema.key("title").unwrap().name(), Some("title"));
    }

    #[test]
    fn test_to_item_uses_wire_names() {
        let movie = Movie {
            year: 1992,
            title: "Reservoir Dogs".to_string(),
            rating: MaybeSet::Set(8.5),
        };
        let actual = movies().to_item(&movie).unwrap();
        let expected = collections::HashMap::from([
            ("year".to_string(), types::AttributeValue::N("1992".to_string())),
            (
                "title".to_string(),
                types::AttributeValue::S("Reservoir Dogs".to_string()),
            ),
            ("Rating".to_string(), types::AttributeValue::N("8.5".to_string())),
        ]);
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_unset_attribute_round_trip() {
        let item = collections::HashMap::from([
            ("year".to_string(), types::AttributeValue::N("1992".to_string())),
            (
                "title".to_string(),
                types::AttributeValue::S("Reservoir Dogs".to_string()),
            ),
            (
                "unknown".to_string(),
                types::AttributeValue::S("dropped".to_string()),
            ),
        ]);
        let schema = movies();
        let movie: Movie = schema.from_item(item).unwrap();
        assert_eq!(movie.rating, MaybeSet::NotSet);
        let actual = schema.to_item(&movie).unwrap();
        assert!(!actual.contains_key("Rating"));
        assert!(!actual.contains_key("unknown"));
        assert_eq!(actual.len(), 2);
    }

    #[test]
    fn test_undeclared_field_is_rejected_on_write() {
        #[derive(Serialize)]
        struct Extra {
            year: i64,
            title: String,
            extra: bool,
        }
        let actual = movies().to_item(&Extra {
            year: 1,
            title: "a".to_string(),
            extra: true,
        });
        assert!(matches!(actual, Err(Error::Definition(_))));
    }

    #[derive(Debug, Deserialize, PartialEq, Serialize)]
    struct Tagged {
        id: String,
        #[serde(default)]
        scores: collections::HashSet<i64>,
        #[serde(default)]
        tags: collections::BTreeSet<String>,
        avatar: Vec<u8>,
        #[serde(default)]
        thumbnails: Vec<Vec<u8>>,
    }

    fn tagged() -> Schema {
        SchemaBuilder::new("tagged")
            .key("id", Key::new())
            .attr("scores", Attr::new())
            .attr("tags", Attr::named("Tags"))
            .attr("avatar", Attr::new())
            .attr("thumbnails", Attr::new())
            .encode("scores", Encoding::Set)
            .encode("tags", Encoding::Set)
            .encode("avatar", Encoding::Bytes)
            .encode("thumbnails", Encoding::BinarySet)
            .build()
            .unwrap()
    }

    #[test]
    fn test_sets_and_bytes_round_trip() {
        let schema = tagged();
        let item = schema
            .to_item(&Tagged {
                id: "a".to_string(),
                scores: collections::HashSet::from([2, 1]),
                tags: collections::BTreeSet::from(["x".to_string()]),
                avatar: vec![0, 255],
                thumbnails: vec![vec![2, 3], vec![1]],
            })
            .unwrap();
        assert_eq!(
            item["scores"],
            types::AttributeValue::Ns(vec!["1".to_string(), "2".to_string()])
        );
        assert_eq!(item["Tags"], types::AttributeValue::Ss(vec!["x".to_string()]));
        assert_eq!(item["avatar"], types::AttributeValue::B(Blob::new(vec![0, 255])));
        assert_eq!(
            item["thumbnails"],
            types::AttributeValue::Bs(vec![Blob::new(vec![1]), Blob::new(vec![2, 3])])
        );
        let actual: Tagged = schema.from_item(item).unwrap();
        let expected = Tagged {
            id: "a".to_string(),
            scores: collections::HashSet::from([1, 2]),
            tags: collections::BTreeSet::from(["x".to_string()]),
            avatar: vec![0, 255],
            thumbnails: vec![vec![1], vec![2, 3]],
        };
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_empty_sets_are_omitted() {
        let schema = tagged();
        let tagged = Tagged {
            id: "a".to_string(),
            scores: collections::HashSet::new(),
            tags: collections::BTreeSet::new(),
            avatar: Vec::new(),
            thumbnails: Vec::new(),
        };
        let item = schema.to_item(&tagged).unwrap();
        let mut keys: Vec<_> = item.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["avatar", "id"]);
        let actual: Tagged = schema.from_item(item).unwrap();
        assert_eq!(actual, tagged);
    }

    #[test]
    fn test_bytes_out_of_range_are_rejected() {
        #[derive(Serialize)]
        struct Wide {
            id: String,
            avatar: Vec<u16>,
        }
        let schema = SchemaBuilder::new("wide")
            .key("id", Key::new())
            .attr("avatar", Attr::new())
            .encode("avatar", Encoding::Bytes)
            .build()
            .unwrap();
        let actual = schema.to_item(&Wide {
            id: "a".to_string(),
            avatar: vec![1, 300],
        });
        assert!(matches!(actual, Err(Error::UnsupportedValue(_))));
    }
}
