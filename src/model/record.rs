use crate::{
    common::value::{self, Value},
    error::{Error, Result},
    model::{MaybeSet, schema::Schema},
};

use aws_sdk_dynamodb::types;
use indexmap::IndexMap;
use std::{collections, sync};

/// A schema-bound item without a Rust struct behind it.
///
/// Every declared field is always present in the record, either `Set` or `NotSet`.
///
/// ```rust
/// use dynamodb_model::{
///     common::attribute::{Attr, Key},
///     model::{MaybeSet, record::Record, schema::SchemaBuilder},
/// };
/// use std::sync::Arc;
///
/// let schema = Arc::new(
///     SchemaBuilder::new("movies")
///         .key("year", Key::new())
///         .attr("rating", Attr::named("Rating"))
///         .build()
///         .unwrap(),
/// );
/// let record = Record::new(schema, [("year", 1992.into())]).unwrap();
/// assert!(record.get("rating").unwrap().is_not_set());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    schema: sync::Arc<Schema>,
    values: IndexMap<String, MaybeSet<Value>>,
}

impl Record {
    /// A record with every declared field unset.
    pub fn empty(schema: sync::Arc<Schema>) -> Self {
        let values = schema
            .attributes()
            .values()
            .map(|definition| (definition.field_name().to_string(), MaybeSet::NotSet))
            .collect();
        Self { schema, values }
    }

    /// A record with the given fields set, rejecting undeclared fields.
    pub fn new<I, F>(schema: sync::Arc<Schema>, fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (F, Value)>,
        F: AsRef<str>,
    {
        let mut record = Self::empty(schema);
        for (field_name, value) in fields {
            record.set(field_name.as_ref(), value)?;
        }
        Ok(record)
    }

    /// The schema the record is bound to.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The value of a declared field.
    pub fn get(&self, field_name: &str) -> Option<&MaybeSet<Value>> {
        self.values.get(field_name)
    }

    /// Set a declared field.
    pub fn set(&mut self, field_name: &str, value: impl Into<Value>) -> Result<()> {
        *self.slot(field_name)? = MaybeSet::Set(value.into());
        Ok(())
    }

    /// Unset a declared field.
    pub fn unset(&mut self, field_name: &str) -> Result<()> {
        *self.slot(field_name)? = MaybeSet::NotSet;
        Ok(())
    }

    fn slot(&mut self, field_name: &str) -> Result<&mut MaybeSet<Value>> {
        let table_name = self.schema.table_name();
        self.values.get_mut(field_name).ok_or_else(|| {
            Error::Definition(format!(
                "field {field_name} is not declared on table {table_name}"
            ))
        })
    }

    /// Decode a wire item: undeclared attributes are dropped, missing ones are `NotSet`.
    pub fn from_item(
        schema: sync::Arc<Schema>,
        mut item: collections::HashMap<String, types::AttributeValue>,
    ) -> Result<Self> {
        let mut values = IndexMap::with_capacity(schema.attributes().len());
        for (wire_name, definition) in schema.attributes() {
            let value = match item.remove(wire_name) {
                Some(value) => MaybeSet::Set(value::from_wire(value)?),
                None => MaybeSet::NotSet,
            };
            values.insert(definition.field_name().to_string(), value);
        }
        Ok(Self { schema, values })
    }

    /// Encode as a wire item, omitting `NotSet` fields and empty sets.
    pub fn to_item(&self) -> Result<collections::HashMap<String, types::AttributeValue>> {
        let mut item = collections::HashMap::with_capacity(self.values.len());
        for (wire_name, definition) in self.schema.attributes() {
            if let Some(MaybeSet::Set(value)) = self.values.get(definition.field_name()) {
                if let Some(value) = definition.encoding().encode(value::to_wire(value)?)? {
                    item.insert(wire_name.clone(), value);
                }
            }
        }
        Ok(item)
    }
}
