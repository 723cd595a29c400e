use crate::{
    common::{self, attribute::AttributeRef, operand::Operand},
    error::{Error, Result},
};

use aws_sdk_dynamodb::types;
use std::{collections, ops};

/// Logical operator for combining conditions.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogicalOperator {
    /// Logical AND - all conditions must be true.
    And,
    /// Logical OR - at least one condition must be true.
    Or,
}

impl ops::Deref for LogicalOperator {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }
}

/// Comparison operator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Comparator {
    /// `=`
    Equal,
    /// `<>`
    NotEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,
}

impl ops::Deref for Comparator {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "<>",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
        }
    }
}

/// DynamoDB attribute type, as accepted by `attribute_type`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AttributeType {
    /// `S`
    String,
    /// `SS`
    StringSet,
    /// `N`
    Number,
    /// `NS`
    NumberSet,
    /// `B`
    Binary,
    /// `BS`
    BinarySet,
    /// `BOOL`
    Boolean,
    /// `NULL`
    Null,
    /// `L`
    List,
    /// `M`
    Map,
}

impl AttributeType {
    /// The wire type descriptor.
    pub fn code(self) -> &'static str {
        match self {
            Self::String => "S",
            Self::StringSet => "SS",
            Self::Number => "N",
            Self::NumberSet => "NS",
            Self::Binary => "B",
            Self::BinarySet => "BS",
            Self::Boolean => "BOOL",
            Self::Null => "NULL",
            Self::List => "L",
            Self::Map => "M",
        }
    }
}

/// A single condition, or a logical combination of conditions.
///
/// Conditions are usually built through [`Key`](crate::common::attribute::Key) and
/// [`Attr`](crate::common::attribute::Attr) and wrapped in a [`Query`].
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// `left <comparator> right`
    Compare(Operand, Comparator, Operand),
    /// `operand BETWEEN low AND high`
    Between(Operand, Operand, Operand),
    /// `begins_with(path, prefix)`
    BeginsWith(AttributeRef, Operand),
    /// `contains(path, operand)`
    Contains(AttributeRef, Operand),
    /// `attribute_exists(path)`
    Exists(AttributeRef),
    /// `attribute_not_exists(path)`
    NotExists(AttributeRef),
    /// `attribute_type(path, type)`
    AttributeType(AttributeRef, AttributeType),
    /// `operand IN (candidates...)`
    In(Operand, Vec<Operand>),
    /// Two conditions joined by a logical operator.
    Logical(LogicalOperator, Box<Condition>, Box<Condition>),
}

impl Condition {
    /// `self AND other`
    pub fn and(self, other: Self) -> Self {
        Self::Logical(LogicalOperator::And, Box::new(self), Box::new(other))
    }

    /// `self OR other`
    pub fn or(self, other: Self) -> Self {
        Self::Logical(LogicalOperator::Or, Box::new(self), Box::new(other))
    }

    /// Compile against a placeholder source.
    ///
    /// Nested logical combinations are parenthesized, the outermost one is not.
    pub fn compile(&self, placeholders: &common::Placeholders) -> Result<common::Fragment> {
        let mut operation = common::Fragment::default();
        let expression = match self {
            Self::Compare(left, comparator, right) => {
                let left = operation.absorb(left.compile(placeholders)?);
                let right = operation.absorb(right.compile(placeholders)?);
                format!("{left} {} {right}", &**comparator)
            }
            Self::Between(operand, low, high) => {
                let operand = operation.absorb(operand.compile(placeholders)?);
                let low = operation.absorb(low.compile(placeholders)?);
                let high = operation.absorb(high.compile(placeholders)?);
                format!("{operand} BETWEEN {low} AND {high}")
            }
            Self::BeginsWith(reference, prefix) => {
                let reference = operation.absorb(reference.compile(placeholders)?);
                let prefix = operation.absorb(prefix.compile(placeholders)?);
                format!("begins_with({reference}, {prefix})")
            }
            Self::Contains(reference, operand) => {
                let reference = operation.absorb(reference.compile(placeholders)?);
                let operand = operation.absorb(operand.compile(placeholders)?);
                format!("contains({reference}, {operand})")
            }
            Self::Exists(reference) => {
                let reference = operation.absorb(reference.compile(placeholders)?);
                format!("attribute_exists({reference})")
            }
            Self::NotExists(reference) => {
                let reference = operation.absorb(reference.compile(placeholders)?);
                format!("attribute_not_exists({reference})")
            }
            Self::AttributeType(reference, attribute_type) => {
                let reference = operation.absorb(reference.compile(placeholders)?);
                let placeholder = placeholders.value();
                operation.expression_attribute_values.insert(
                    placeholder.clone(),
                    types::AttributeValue::S(attribute_type.code().to_string()),
                );
                format!("attribute_type({reference}, {placeholder})")
            }
            Self::In(operand, candidates) => {
                if candidates.is_empty() {
                    return Err(Error::InvalidCondition(
                        "IN requires at least one candidate".to_string(),
                    ));
                }
                let operand = operation.absorb(operand.compile(placeholders)?);
                let mut items = Vec::with_capacity(candidates.len());
                for candidate in candidates {
                    items.push(operation.absorb(candidate.compile(placeholders)?));
                }
                format!("{operand} IN ({})", items.join(", "))
            }
            Self::Logical(operator, left, right) => {
                let left = operation.absorb(left.compile_nested(placeholders)?);
                let right = operation.absorb(right.compile_nested(placeholders)?);
                format!("{left}{}{right}", &**operator)
            }
        };
        operation.expression = expression;
        Ok(operation)
    }

    fn compile_nested(&self, placeholders: &common::Placeholders) -> Result<common::Fragment> {
        let mut operation = self.compile(placeholders)?;
        if matches!(self, Self::Logical(..)) {
            operation.expression = format!("({})", operation.expression);
        }
        Ok(operation)
    }
}

fn combine(
    operator: LogicalOperator,
    left: Option<Condition>,
    right: Option<Condition>,
) -> Option<Condition> {
    match (left, right) {
        (Some(left), Some(right)) => Some(Condition::Logical(
            operator,
            Box::new(left),
            Box::new(right),
        )),
        (left, None) => left,
        (None, right) => right,
    }
}

/// A pair of independent conditions: the key half and the filter half.
///
/// Combining two queries combines each half on its own, an absent half acting as
/// identity.
///
/// ```rust
/// use dynamodb_model::common::attribute::{Attr, Key};
///
/// let query = Key::named("year").eq(1992)
///     & Key::named("title").begins_with("T")
///     & (Attr::named("rating").gt(8) | Attr::named("genre").eq("drama"));
/// let compiled = query.compile().unwrap();
/// assert!(compiled.key.is_some());
/// assert!(compiled.filter.is_some());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    key: Option<Condition>,
    filter: Option<Condition>,
}

/// A [`Query`] reduced to its wire form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompiledQuery {
    /// The `KeyConditionExpression` fragment.
    pub key: Option<common::Fragment>,
    /// The `FilterExpression` fragment.
    pub filter: Option<common::Fragment>,
}

impl Query {
    /// A query with only a key half.
    pub fn key(condition: Condition) -> Self {
        Self {
            key: Some(condition),
            filter: None,
        }
    }

    /// A query with only a filter half.
    pub fn filter(condition: Condition) -> Self {
        Self {
            key: None,
            filter: Some(condition),
        }
    }

    /// The key half.
    pub fn key_condition(&self) -> Option<&Condition> {
        self.key.as_ref()
    }

    /// The filter half.
    pub fn filter_condition(&self) -> Option<&Condition> {
        self.filter.as_ref()
    }

    /// Whether neither half is present.
    pub fn is_empty(&self) -> bool {
        self.key.is_none() && self.filter.is_none()
    }

    /// Combine each half with AND.
    pub fn and(self, other: Self) -> Self {
        Self {
            key: combine(LogicalOperator::And, self.key, other.key),
            filter: combine(LogicalOperator::And, self.filter, other.filter),
        }
    }

    /// Combine each half with OR.
    pub fn or(self, other: Self) -> Self {
        Self {
            key: combine(LogicalOperator::Or, self.key, other.key),
            filter: combine(LogicalOperator::Or, self.filter, other.filter),
        }
    }

    /// Compile both halves against the process-wide placeholder source.
    pub fn compile(&self) -> Result<CompiledQuery> {
        self.compile_with(common::Placeholders::global())
    }

    /// Compile both halves against `placeholders`.
    pub fn compile_with(&self, placeholders: &common::Placeholders) -> Result<CompiledQuery> {
        Ok(CompiledQuery {
            key: self
                .key
                .as_ref()
                .map(|condition| condition.compile(placeholders))
                .transpose()?,
            filter: self
                .filter
                .as_ref()
                .map(|condition| condition.compile(placeholders))
                .transpose()?,
        })
    }

    /// Split into the key condition and the remaining filter, rejecting filter-only queries.
    pub(crate) fn into_key_condition(self) -> Result<(Condition, Option<Condition>)> {
        match self.key {
            Some(key) => Ok((key, self.filter)),
            None => Err(Error::InvalidCondition(
                "a key condition requires a comparison on a key attribute".to_string(),
            )),
        }
    }

    /// The filter half AND-ed with the key half, rejecting key-only queries.
    pub(crate) fn into_filter_condition(self) -> Result<Condition> {
        if self.filter.is_none() {
            return Err(Error::InvalidCondition(
                "a filter requires a condition on a non-key attribute".to_string(),
            ));
        }
        self.into_condition()
    }

    /// Both halves AND-ed into a single condition.
    pub(crate) fn into_condition(self) -> Result<Condition> {
        combine(LogicalOperator::And, self.key, self.filter)
            .ok_or_else(|| Error::InvalidCondition("the query is empty".to_string()))
    }
}

impl ops::BitAnd for Query {
    type Output = Self;

    fn bitand(self, other: Self) -> Self::Output {
        self.and(other)
    }
}

impl ops::BitOr for Query {
    type Output = Self;

    fn bitor(self, other: Self) -> Self::Output {
        self.or(other)
    }
}

impl From<Condition> for Query {
    fn from(condition: Condition) -> Self {
        Self::filter(condition)
    }
}

impl CompiledQuery {
    /// Every placeholder token used by either half.
    pub fn placeholders(&self) -> collections::HashSet<&str> {
        self.key
            .iter()
            .chain(self.filter.iter())
            .flat_map(|fragment| {
                fragment
                    .expression_attribute_names
                    .keys()
                    .chain(fragment.expression_attribute_values.keys())
                    .map(String::as_str)
            })
            .collect()
    }
}
