use crate::{
    common::{self, condition::Condition, selection::Projection},
    error::Result,
    model::{record::Record, schema::Schema},
};

use aws_sdk_dynamodb::{error, types};
use serde::de::DeserializeOwned;
use std::{collections, sync};

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct SingleReadInput {
    pub(crate) consistent_read: Option<bool>,
    pub(crate) expression_attribute_names: Option<collections::HashMap<String, String>>,
    pub(crate) projection_expression: Option<String>,
    pub(crate) return_consumed_capacity: Option<types::ReturnConsumedCapacity>,
    pub(crate) table_name: String,
}

impl SingleReadInput {
    pub(crate) fn new(
        read_args: ReadArgs,
        schema: &Schema,
        placeholders: &common::Placeholders,
    ) -> Result<Self> {
        let mut operation = Self {
            consistent_read: read_args.consistent_read,
            return_consumed_capacity: read_args.return_consumed_capacity,
            table_name: schema.table_name().to_string(),
            ..Default::default()
        };
        let projection = Projection::of(schema);
        if !projection.is_empty() {
            let projection = projection.compile(placeholders)?;
            operation.projection_expression =
                Some(projection.merge_into(&mut operation.expression_attribute_names, &mut None));
        }
        Ok(operation)
    }
}

/// Arguments shared by read operations (GetItem, Query, Scan).
///
/// The table, the index and the projection always come from the model.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct ReadArgs {
    /// Whether to use a consistent read.
    ///
    /// `true` for strongly consistent reads, `false` or `None` for eventually consistent reads.
    /// Consistent reads consume more capacity units but guarantee you see the latest data.
    pub consistent_read: Option<bool>,
    /// Whether to return the consumed capacity information.
    pub return_consumed_capacity: Option<types::ReturnConsumedCapacity>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct MultipleReadInput {
    pub(crate) consistent_read: Option<bool>,
    pub(crate) expression_attribute_names: Option<collections::HashMap<String, String>>,
    pub(crate) expression_attribute_values:
        Option<collections::HashMap<String, types::AttributeValue>>,
    pub(crate) filter_expression: Option<String>,
    pub(crate) index_name: Option<String>,
    pub(crate) limit: Option<i32>,
    pub(crate) projection_expression: Option<String>,
    pub(crate) return_consumed_capacity: Option<types::ReturnConsumedCapacity>,
    pub(crate) table_name: String,
}

impl MultipleReadInput {
    /// Compile the projection, then the filter, against `placeholders`.
    pub(crate) fn new(
        read_args: ReadArgs,
        schema: &Schema,
        filter: Option<Condition>,
        page_size: Option<i32>,
        placeholders: &common::Placeholders,
    ) -> Result<Self> {
        let mut operation = Self {
            consistent_read: read_args.consistent_read,
            index_name: schema.index_name().map(str::to_string),
            limit: page_size,
            return_consumed_capacity: read_args.return_consumed_capacity,
            table_name: schema.table_name().to_string(),
            ..Default::default()
        };
        let projection = Projection::of(schema);
        if !projection.is_empty() {
            let projection = projection.compile(placeholders)?;
            operation.projection_expression = Some(operation.merge_expression(projection));
        }
        if let Some(filter) = filter {
            let filter = filter.compile(placeholders)?;
            operation.filter_expression = Some(operation.merge_expression(filter));
        }
        Ok(operation)
    }

    /// Merge an expression fragment into this read operation.
    pub(crate) fn merge_expression(&mut self, operation: common::Fragment) -> String {
        operation.merge_into(
            &mut self.expression_attribute_names,
            &mut self.expression_attribute_values,
        )
    }
}

/// Decode one page of items, keeping only the declared attributes.
pub(crate) fn decode_items<M: DeserializeOwned>(
    schema: &Schema,
    items: Option<Vec<collections::HashMap<String, types::AttributeValue>>>,
) -> std::result::Result<Vec<M>, error::BuildError> {
    items
        .unwrap_or_default()
        .into_iter()
        .map(|item| schema.from_item(item).map_err(error::BuildError::other))
        .collect()
}

/// Decode one page of items into records bound to `schema`.
pub(crate) fn decode_records(
    schema: &sync::Arc<Schema>,
    items: Option<Vec<collections::HashMap<String, types::AttributeValue>>>,
) -> std::result::Result<Vec<Record>, error::BuildError> {
    items
        .unwrap_or_default()
        .into_iter()
        .map(|item| Record::from_item(schema.clone(), item).map_err(error::BuildError::other))
        .collect()
}

/// collect and decode the items of every page
#[macro_export]
macro_rules! collect_items {
    ($paginator:expr, $decode:expr) => {{
        let decode = $decode;
        let mut items = Vec::new();
        while let Some(page) = $paginator.next().await {
            items.extend(decode(page?.items)?);
        }
        Ok(items)
    }};
}

/// apply common single read operation settings to a builder
#[macro_export]
macro_rules! apply_single_read_operation {
    ($builder:expr, $single_read_operation:expr) => {
        $builder
            .set_consistent_read($single_read_operation.consistent_read)
            .set_expression_attribute_names($single_read_operation.expression_attribute_names)
            .set_projection_expression($single_read_operation.projection_expression)
            .set_return_consumed_capacity($single_read_operation.return_consumed_capacity)
            .table_name($single_read_operation.table_name)
    };
}

/// apply common multiple read operation settings to a builder
#[macro_export]
macro_rules! apply_multiple_read_operation {
    ($builder:expr, $multiple_read_operation:expr) => {
        $builder
            .set_consistent_read($multiple_read_operation.consistent_read)
            .set_expression_attribute_names($multiple_read_operation.expression_attribute_names)
            .set_expression_attribute_values($multiple_read_operation.expression_attribute_values)
            .set_filter_expression($multiple_read_operation.filter_expression)
            .set_index_name($multiple_read_operation.index_name)
            .set_limit($multiple_read_operation.limit)
            .set_projection_expression($multiple_read_operation.projection_expression)
            .set_return_consumed_capacity($multiple_read_operation.return_consumed_capacity)
            .table_name($multiple_read_operation.table_name)
    };
}
