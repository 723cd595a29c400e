//! Common building blocks for DynamoDB expressions.
//!
//! This module holds the expression compiler: attribute references, literal values,
//! operands and conditions are reduced to a [`Fragment`], i.e. an expression string plus
//! its `ExpressionAttributeNames` and `ExpressionAttributeValues` placeholder maps.

/// Attribute references (`Key` and `Attr`) and nested path access.
pub mod attribute;

/// Condition expressions and the key/filter query algebra.
pub mod condition;

/// Primary key shorthands.
pub mod key;

/// Operands shared by conditions and update expressions.
pub mod operand;

/// Projection expressions for the declared attributes of a model.
pub mod selection;

/// Conversion between native values and DynamoDB attribute values.
pub mod value;

use aws_sdk_dynamodb::types;
use std::{collections, sync::atomic};

static GLOBAL_PLACEHOLDERS: Placeholders = Placeholders::new();

/// Source of fresh `#name` and `:value` placeholder tokens.
///
/// Every token drawn from the same source is unique, including across threads, so
/// fragments compiled against one source can always be merged by plain map union.
///
/// ```rust
/// use dynamodb_model::common::Placeholders;
///
/// let scoped = Placeholders::new();
/// let shared = Placeholders::global();
/// # let _ = (scoped, shared);
/// ```
#[derive(Debug, Default)]
pub struct Placeholders {
    next: atomic::AtomicUsize,
}

impl Placeholders {
    /// Create a scoped source starting at zero.
    pub const fn new() -> Self {
        Self {
            next: atomic::AtomicUsize::new(0),
        }
    }

    /// The process-wide source used by [`Fragment`]s compiled outside of an operation.
    pub fn global() -> &'static Self {
        &GLOBAL_PLACEHOLDERS
    }

    pub(crate) fn name(&self) -> String {
        format!("#n{}", self.next())
    }

    pub(crate) fn value(&self) -> String {
        format!(":v{}", self.next())
    }

    fn next(&self) -> usize {
        self.next.fetch_add(1, atomic::Ordering::Relaxed)
    }
}

fn get_expression(left: String, operator: &str, right: String) -> String {
    if left.is_empty() {
        right
    } else if right.is_empty() {
        left
    } else {
        format!("{left}{operator}{right}")
    }
}

/// A compiled piece of a DynamoDB expression.
///
/// Fragments are plain data: once compiled they can be reused for any number of
/// retries of the same request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fragment {
    /// The expression text, referencing only placeholders.
    pub expression: String,
    /// Name placeholders (`#...`) mapped to attribute names.
    pub expression_attribute_names: collections::HashMap<String, String>,
    /// Value placeholders (`:...`) mapped to attribute values.
    pub expression_attribute_values: collections::HashMap<String, types::AttributeValue>,
}

impl Fragment {
    pub(crate) fn merge(operator: &str, items: Vec<Self>) -> Self {
        let mut operation = Self::default();
        for item in items {
            operation
                .expression_attribute_names
                .extend(item.expression_attribute_names);
            operation
                .expression_attribute_values
                .extend(item.expression_attribute_values);
            operation.expression = get_expression(operation.expression, operator, item.expression);
        }
        operation
    }

    /// Move the placeholder maps of `other` into `self` and return its expression text.
    pub(crate) fn absorb(&mut self, other: Self) -> String {
        self.expression_attribute_names
            .extend(other.expression_attribute_names);
        self.expression_attribute_values
            .extend(other.expression_attribute_values);
        other.expression
    }

    /// Move the placeholder maps into request-level maps, leaving them `None` when empty.
    pub(crate) fn merge_into(
        self,
        names: &mut Option<collections::HashMap<String, String>>,
        values: &mut Option<collections::HashMap<String, types::AttributeValue>>,
    ) -> String {
        if !self.expression_attribute_names.is_empty() {
            names
                .get_or_insert_with(collections::HashMap::new)
                .extend(self.expression_attribute_names);
        }
        if !self.expression_attribute_values.is_empty() {
            values
                .get_or_insert_with(collections::HashMap::new)
                .extend(self.expression_attribute_values);
        }
        self.expression
    }

    /// The names map, or `None` if the fragment references no attribute names.
    pub fn names(&self) -> Option<&collections::HashMap<String, String>> {
        Some(&self.expression_attribute_names).filter(|names| !names.is_empty())
    }

    /// The values map, or `None` if the fragment references no literal values.
    pub fn values(&self) -> Option<&collections::HashMap<String, types::AttributeValue>> {
        Some(&self.expression_attribute_values).filter(|values| !values.is_empty())
    }
}
