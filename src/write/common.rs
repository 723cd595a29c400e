use crate::{common, error::Result, model::schema::Schema};

use aws_sdk_dynamodb::{error, operation, types};
use std::collections;

/// Internal representation of write operation parameters.
///
/// Holds the compiled condition and the placeholder maps shared with the rest of
/// the request, ready for the DynamoDB API call.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct WriteInput {
    pub(crate) condition_expression: Option<String>,
    pub(crate) expression_attribute_names: Option<collections::HashMap<String, String>>,
    pub(crate) expression_attribute_values:
        Option<collections::HashMap<String, types::AttributeValue>>,
    pub(crate) return_consumed_capacity: Option<types::ReturnConsumedCapacity>,
    pub(crate) return_item_collection_metrics: Option<types::ReturnItemCollectionMetrics>,
    pub(crate) table_name: String,
}

impl WriteInput {
    pub(crate) fn new(
        write_args: WriteArgs,
        schema: &Schema,
        placeholders: &common::Placeholders,
    ) -> Result<Self> {
        let mut operation = Self {
            return_consumed_capacity: write_args.return_consumed_capacity,
            return_item_collection_metrics: write_args.return_item_collection_metrics,
            table_name: schema.table_name().to_string(),
            ..Default::default()
        };
        if let Some(condition) = write_args.condition {
            let condition = condition.into_condition()?.compile(placeholders)?;
            operation.condition_expression = Some(operation.merge_expression(condition));
        }
        Ok(operation)
    }

    /// Merge an expression fragment into this write operation.
    pub(crate) fn merge_expression(&mut self, operation: common::Fragment) -> String {
        operation.merge_into(
            &mut self.expression_attribute_names,
            &mut self.expression_attribute_values,
        )
    }
}

/// Arguments common to all write operations (Put, Update, Delete).
///
/// The table name always comes from the model.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WriteArgs {
    /// Condition that must hold for the write to be applied.
    ///
    /// Both halves of the query are AND-ed into the `ConditionExpression`. A failed
    /// condition resolves to [`WriteOutcome::NotApplied`].
    pub condition: Option<common::condition::Query>,
    /// Whether to return the consumed capacity information.
    pub return_consumed_capacity: Option<types::ReturnConsumedCapacity>,
    /// Whether to return item collection metrics.
    pub return_item_collection_metrics: Option<types::ReturnItemCollectionMetrics>,
}

/// Result of a conditional write.
#[derive(Clone, Debug, PartialEq)]
pub enum WriteOutcome<T> {
    /// The write was applied.
    Applied(T),
    /// The condition did not hold and nothing was written.
    NotApplied,
}

impl<T> WriteOutcome<T> {
    /// Whether the write was applied.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// The applied value, if any.
    pub fn applied(self) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            Self::NotApplied => None,
        }
    }

    /// Map the applied value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> WriteOutcome<U> {
        match self {
            Self::Applied(value) => WriteOutcome::Applied(f(value)),
            Self::NotApplied => WriteOutcome::NotApplied,
        }
    }
}

/// Service errors that can report a failed condition.
pub(crate) trait ConditionalCheck {
    fn is_conditional_check_failed(&self) -> bool;
}

impl ConditionalCheck for operation::put_item::PutItemError {
    fn is_conditional_check_failed(&self) -> bool {
        self.is_conditional_check_failed_exception()
    }
}

impl ConditionalCheck for operation::update_item::UpdateItemError {
    fn is_conditional_check_failed(&self) -> bool {
        self.is_conditional_check_failed_exception()
    }
}

impl ConditionalCheck for operation::delete_item::DeleteItemError {
    fn is_conditional_check_failed(&self) -> bool {
        self.is_conditional_check_failed_exception()
    }
}

/// Turn a failed condition into [`WriteOutcome::NotApplied`], leaving every other error as is.
pub(crate) fn outcome<T, E: ConditionalCheck, R>(
    result: std::result::Result<T, error::SdkError<E, R>>,
) -> std::result::Result<WriteOutcome<T>, error::SdkError<E, R>> {
    match result {
        Ok(output) => Ok(WriteOutcome::Applied(output)),
        Err(error)
            if error
                .as_service_error()
                .is_some_and(ConditionalCheck::is_conditional_check_failed) =>
        {
            #[cfg(feature = "tracing")]
            tracing::debug!("condition not met, write not applied");
            Ok(WriteOutcome::NotApplied)
        }
        Err(error) => Err(error),
    }
}

/// apply common write operation settings to a builder
#[macro_export]
macro_rules! apply_write_operation {
    ($builder:expr, $write_operation:expr) => {
        $builder
            .set_condition_expression($write_operation.condition_expression)
            .set_expression_attribute_names($write_operation.expression_attribute_names)
            .set_expression_attribute_values($write_operation.expression_attribute_values)
            .set_return_consumed_capacity($write_operation.return_consumed_capacity)
            .set_return_item_collection_metrics($write_operation.return_item_collection_metrics)
            .table_name($write_operation.table_name)
    };
}
