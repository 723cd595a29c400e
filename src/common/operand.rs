use crate::{
    common::{
        self,
        attribute::{Attribute, AttributeRef, Kind},
        value::{self, Number, Value},
    },
    error::Result,
};

use indexmap::IndexMap;
use std::{collections, ops};

/// Arithmetic operator usable in `SET` actions.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ArithmeticOperator {
    /// Addition.
    Plus,
    /// Subtraction.
    Minus,
}

impl ops::Deref for ArithmeticOperator {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Plus => " + ",
            Self::Minus => " - ",
        }
    }
}

/// A node of the expression tree.
///
/// ```rust
/// use dynamodb_model::common::{attribute::Attr, operand::{self, Operand}};
///
/// let rating = Attr::named("rating");
/// let bumped = rating.if_not_exists(0).plus(1);
/// let actors = operand::list_append(Attr::named("actors"), vec!["Moe"]);
/// let reversed = Operand::from(100).minus(&rating);
/// # let _ = (bumped, actors, reversed);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// An attribute path.
    Path(AttributeRef),
    /// A literal value.
    Literal(Value),
    /// `size(path)`
    Size(AttributeRef),
    /// `left + right` or `left - right`
    Arithmetic(Box<Operand>, ArithmeticOperator, Box<Operand>),
    /// `if_not_exists(path, default)`
    IfNotExists(AttributeRef, Box<Operand>),
    /// `list_append(left, right)`
    ListAppend(Box<Operand>, Box<Operand>),
}

/// `list_append(left, right)`: concatenate two lists.
pub fn list_append(left: impl Into<Operand>, right: impl Into<Operand>) -> Operand {
    Operand::ListAppend(Box::new(left.into()), Box::new(right.into()))
}

impl Operand {
    /// `self + other`
    pub fn plus(self, other: impl Into<Operand>) -> Self {
        Self::Arithmetic(
            Box::new(self),
            ArithmeticOperator::Plus,
            Box::new(other.into()),
        )
    }

    /// `self - other`
    pub fn minus(self, other: impl Into<Operand>) -> Self {
        Self::Arithmetic(
            Box::new(self),
            ArithmeticOperator::Minus,
            Box::new(other.into()),
        )
    }

    /// Compile against a placeholder source.
    pub fn compile(&self, placeholders: &common::Placeholders) -> Result<common::Fragment> {
        match self {
            Self::Path(reference) => reference.compile(placeholders),
            Self::Literal(value) => {
                let placeholder = placeholders.value();
                let value = value::to_wire(value)?;
                Ok(common::Fragment {
                    expression: placeholder.clone(),
                    expression_attribute_values: collections::HashMap::from([(
                        placeholder,
                        value,
                    )]),
                    ..Default::default()
                })
            }
            Self::Size(reference) => {
                let mut operation = reference.compile(placeholders)?;
                operation.expression = format!("size({})", operation.expression);
                Ok(operation)
            }
            Self::Arithmetic(left, operator, right) => Ok(common::Fragment::merge(
                operator,
                vec![left.compile(placeholders)?, right.compile(placeholders)?],
            )),
            Self::IfNotExists(reference, default) => {
                let mut operation = reference.compile(placeholders)?;
                let default = operation.absorb(default.compile(placeholders)?);
                operation.expression = format!("if_not_exists({}, {default})", operation.expression);
                Ok(operation)
            }
            Self::ListAppend(left, right) => {
                let mut operation = left.compile(placeholders)?;
                let right = operation.absorb(right.compile(placeholders)?);
                operation.expression = format!("list_append({}, {right})", operation.expression);
                Ok(operation)
            }
        }
    }
}

impl From<AttributeRef> for Operand {
    fn from(reference: AttributeRef) -> Self {
        Self::Path(reference)
    }
}

impl<K: Kind> From<Attribute<K>> for Operand {
    fn from(attribute: Attribute<K>) -> Self {
        Self::Path(attribute.reference().clone())
    }
}

impl<K: Kind> From<&Attribute<K>> for Operand {
    fn from(attribute: &Attribute<K>) -> Self {
        Self::Path(attribute.reference().clone())
    }
}

macro_rules! literal_operands {
    ($($literal:ty),*) => {
        $(
            impl From<$literal> for Operand {
                fn from(value: $literal) -> Self {
                    Self::Literal(Value::from(value))
                }
            }
        )*
    };
}

literal_operands!(
    Value,
    Number,
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f64,
    &str,
    String,
    collections::BTreeSet<String>,
    collections::HashSet<String>,
    collections::BTreeSet<i64>,
    collections::HashSet<i64>
);

impl<T: Into<Value>> From<Vec<T>> for Operand {
    fn from(value: Vec<T>) -> Self {
        Self::Literal(Value::from(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Operand {
    fn from(value: Option<T>) -> Self {
        Self::Literal(Value::from(value))
    }
}

impl<A: Into<Value>, B: Into<Value>> From<(A, B)> for Operand {
    fn from(value: (A, B)) -> Self {
        Self::Literal(Value::from(value))
    }
}

impl<V: Into<Value>> From<IndexMap<String, V>> for Operand {
    fn from(value: IndexMap<String, V>) -> Self {
        Self::Literal(Value::from(value))
    }
}
