use crate::{
    common::{
        self,
        condition::{AttributeType, Comparator, Condition, Query},
        operand::{ArithmeticOperator, Operand},
        value::Value,
    },
    error::{Error, Result},
    write::update_item::UpdateOperator,
};

use std::{collections, fmt, marker};

/// One step of a nested attribute path.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum PathSegment {
    /// Map member access, `.name`.
    Field(String),
    /// List element access, `[index]`.
    Index(usize),
}

/// An untyped reference to a model attribute, possibly followed by a nested path.
///
/// The effective name is the declared wire name if there is one, otherwise the name of
/// the model field the reference was bound to. Nested access never mutates a
/// reference; it returns a new one with a longer path.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct AttributeRef {
    declared_name: Option<String>,
    bound_field_name: Option<String>,
    path_suffix: Vec<PathSegment>,
}

impl AttributeRef {
    /// A reference whose name will come from the model field it is declared on.
    pub fn new() -> Self {
        Self::default()
    }

    /// A reference with an explicit wire name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            declared_name: Some(name.into()),
            ..Self::default()
        }
    }

    pub(crate) fn bind(mut self, field_name: &str) -> Self {
        self.bound_field_name = Some(field_name.to_string());
        self
    }

    /// The effective wire name of the top-level attribute.
    pub fn name(&self) -> Option<&str> {
        self.declared_name
            .as_deref()
            .or(self.bound_field_name.as_deref())
    }

    /// The nested path following the top-level attribute.
    pub fn path(&self) -> &[PathSegment] {
        &self.path_suffix
    }

    /// A new reference to the member `name` of this map attribute.
    pub fn field(&self, name: impl Into<String>) -> Self {
        self.with_segment(PathSegment::Field(name.into()))
    }

    /// A new reference to the element `index` of this list attribute.
    pub fn index(&self, index: usize) -> Self {
        self.with_segment(PathSegment::Index(index))
    }

    fn with_segment(&self, segment: PathSegment) -> Self {
        let mut reference = self.clone();
        reference.path_suffix.push(segment);
        reference
    }

    /// Compile the path: every field becomes a name placeholder, list indexes stay literal.
    pub(crate) fn compile(&self, placeholders: &common::Placeholders) -> Result<common::Fragment> {
        let name = self.name().ok_or_else(|| {
            Error::Definition("attribute reference is not bound to a model field".to_string())
        })?;
        let placeholder = placeholders.name();
        let mut expression = placeholder.clone();
        let mut expression_attribute_names =
            collections::HashMap::from([(placeholder, name.to_string())]);
        for segment in &self.path_suffix {
            match segment {
                PathSegment::Field(field) => {
                    let placeholder = placeholders.name();
                    expression.push('.');
                    expression.push_str(&placeholder);
                    expression_attribute_names.insert(placeholder, field.clone());
                }
                PathSegment::Index(index) => {
                    expression.push_str(&format!("[{index}]"));
                }
            }
        }
        Ok(common::Fragment {
            expression,
            expression_attribute_names,
            ..Default::default()
        })
    }
}

impl fmt::Display for AttributeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name().unwrap_or("<unbound>"))?;
        for segment in &self.path_suffix {
            match segment {
                PathSegment::Field(field) => write!(f, ".{field}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Decides which half of a [`Query`] the comparisons of an attribute populate.
pub trait Kind: sealed::Sealed + Clone + fmt::Debug {
    /// Wrap a comparison built on an attribute of this kind.
    fn query(condition: Condition) -> Query;
}

/// Marker for table and index key attributes.
#[derive(Clone, Debug)]
pub enum KeyKind {}

/// Marker for non-key attributes.
#[derive(Clone, Debug)]
pub enum AttrKind {}

impl sealed::Sealed for KeyKind {}

impl sealed::Sealed for AttrKind {}

impl Kind for KeyKind {
    fn query(condition: Condition) -> Query {
        Query::key(condition)
    }
}

impl Kind for AttrKind {
    fn query(condition: Condition) -> Query {
        Query::filter(condition)
    }
}

/// A typed attribute reference.
///
/// Use the [`Key`] and [`Attr`] aliases. Comparisons (`eq`, `lt`, `le`, `gt`, `ge`),
/// `begins_with` and `between` on a [`Key`] build key conditions; on an [`Attr`] they
/// build filter conditions. Every other predicate always builds a filter condition.
///
/// ```rust
/// use dynamodb_model::common::attribute::{Attr, Key};
///
/// let year = Key::named("year");
/// let rating = Attr::named("info").field("rating");
/// let query = year.eq(1992).and(rating.gt(5));
/// assert!(query.key_condition().is_some());
/// assert!(query.filter_condition().is_some());
/// ```
#[derive(Clone, Debug)]
pub struct Attribute<K: Kind> {
    reference: AttributeRef,
    kind: marker::PhantomData<K>,
}

/// A key attribute.
pub type Key = Attribute<KeyKind>;

/// A non-key attribute.
pub type Attr = Attribute<AttrKind>;

impl<K: Kind> Default for Attribute<K> {
    fn default() -> Self {
        Self::from_reference(AttributeRef::default())
    }
}

impl<K: Kind> Attribute<K> {
    /// An attribute whose name will come from the model field it is declared on.
    pub fn new() -> Self {
        Self::default()
    }

    /// An attribute with an explicit wire name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::from_reference(AttributeRef::named(name))
    }

    pub(crate) fn from_reference(reference: AttributeRef) -> Self {
        Self {
            reference,
            kind: marker::PhantomData,
        }
    }

    /// The untyped reference.
    pub fn reference(&self) -> &AttributeRef {
        &self.reference
    }

    /// The effective wire name of the top-level attribute.
    pub fn name(&self) -> Option<&str> {
        self.reference.name()
    }

    /// A new reference to the member `name` of this map attribute.
    pub fn field(&self, name: impl Into<String>) -> Self {
        Self::from_reference(self.reference.field(name))
    }

    /// A new reference to the element `index` of this list attribute.
    pub fn index(&self, index: usize) -> Self {
        Self::from_reference(self.reference.index(index))
    }

    fn operand(&self) -> Operand {
        Operand::Path(self.reference.clone())
    }

    fn compare(&self, comparator: Comparator, value: impl Into<Operand>) -> Query {
        K::query(Condition::Compare(self.operand(), comparator, value.into()))
    }

    /// `attribute = value`
    pub fn eq(&self, value: impl Into<Operand>) -> Query {
        self.compare(Comparator::Equal, value)
    }

    /// `attribute <> value`, always a filter condition.
    pub fn ne(&self, value: impl Into<Operand>) -> Query {
        Query::filter(Condition::Compare(
            self.operand(),
            Comparator::NotEqual,
            value.into(),
        ))
    }

    /// `attribute < value`
    pub fn lt(&self, value: impl Into<Operand>) -> Query {
        self.compare(Comparator::LessThan, value)
    }

    /// `attribute <= value`
    pub fn le(&self, value: impl Into<Operand>) -> Query {
        self.compare(Comparator::LessThanOrEqual, value)
    }

    /// `attribute > value`
    pub fn gt(&self, value: impl Into<Operand>) -> Query {
        self.compare(Comparator::GreaterThan, value)
    }

    /// `attribute >= value`
    pub fn ge(&self, value: impl Into<Operand>) -> Query {
        self.compare(Comparator::GreaterThanOrEqual, value)
    }

    /// `begins_with(attribute, prefix)`
    pub fn begins_with(&self, prefix: impl Into<Operand>) -> Query {
        K::query(Condition::BeginsWith(self.reference.clone(), prefix.into()))
    }

    /// `attribute BETWEEN low AND high`, inclusive on both ends.
    pub fn between(&self, low: impl Into<Operand>, high: impl Into<Operand>) -> Query {
        K::query(Condition::Between(self.operand(), low.into(), high.into()))
    }

    /// `contains(attribute, value)` for strings, sets and lists.
    pub fn contains(&self, value: impl Into<Operand>) -> Query {
        Query::filter(Condition::Contains(self.reference.clone(), value.into()))
    }

    /// `attribute_exists(attribute)`
    pub fn exists(&self) -> Query {
        Query::filter(Condition::Exists(self.reference.clone()))
    }

    /// `attribute_not_exists(attribute)`
    pub fn not_exists(&self) -> Query {
        Query::filter(Condition::NotExists(self.reference.clone()))
    }

    /// `attribute_type(attribute, type)`
    pub fn attribute_type(&self, attribute_type: AttributeType) -> Query {
        Query::filter(Condition::AttributeType(
            self.reference.clone(),
            attribute_type,
        ))
    }

    /// `attribute IN (values...)`
    pub fn is_in<I, V>(&self, values: I) -> Query
    where
        I: IntoIterator<Item = V>,
        V: Into<Operand>,
    {
        Query::filter(Condition::In(
            self.operand(),
            values.into_iter().map(Into::into).collect(),
        ))
    }

    /// `size(attribute)`, to be compared against a number.
    pub fn size(&self) -> Size {
        Size {
            reference: self.reference.clone(),
        }
    }

    /// `SET attribute = operand`
    pub fn set(&self, operand: impl Into<Operand>) -> UpdateOperator {
        UpdateOperator::Set(self.reference.clone(), operand.into())
    }

    /// `REMOVE attribute`
    pub fn remove(&self) -> UpdateOperator {
        UpdateOperator::Remove(self.reference.clone())
    }

    /// `ADD attribute value`: increments a number or adds elements to a set.
    ///
    /// A list value is sent as the set type matching its elements.
    pub fn add(&self, value: impl Into<Value>) -> UpdateOperator {
        UpdateOperator::Add(self.reference.clone(), value.into())
    }

    /// `DELETE attribute value`: removes elements from a set.
    pub fn delete(&self, value: impl Into<Value>) -> UpdateOperator {
        UpdateOperator::Delete(self.reference.clone(), value.into())
    }

    /// `if_not_exists(attribute, default)`
    pub fn if_not_exists(&self, default: impl Into<Operand>) -> Operand {
        Operand::IfNotExists(self.reference.clone(), Box::new(default.into()))
    }

    /// `attribute + other`
    pub fn plus(&self, other: impl Into<Operand>) -> Operand {
        Operand::Arithmetic(
            Box::new(self.operand()),
            ArithmeticOperator::Plus,
            Box::new(other.into()),
        )
    }

    /// `attribute - other`
    pub fn minus(&self, other: impl Into<Operand>) -> Operand {
        Operand::Arithmetic(
            Box::new(self.operand()),
            ArithmeticOperator::Minus,
            Box::new(other.into()),
        )
    }
}

impl<K: Kind> From<Attribute<K>> for AttributeRef {
    fn from(attribute: Attribute<K>) -> Self {
        attribute.reference
    }
}

impl<K: Kind> fmt::Display for Attribute<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.reference, f)
    }
}

/// The `size(...)` of an attribute.
///
/// DynamoDB does not accept `size` in key conditions, so every comparison on it is a
/// filter condition.
#[derive(Clone, Debug)]
pub struct Size {
    reference: AttributeRef,
}

impl Size {
    fn compare(&self, comparator: Comparator, value: impl Into<Operand>) -> Query {
        Query::filter(Condition::Compare(
            Operand::Size(self.reference.clone()),
            comparator,
            value.into(),
        ))
    }

    /// `size(attribute) = value`
    pub fn eq(&self, value: impl Into<Operand>) -> Query {
        self.compare(Comparator::Equal, value)
    }

    /// `size(attribute) <> value`
    pub fn ne(&self, value: impl Into<Operand>) -> Query {
        self.compare(Comparator::NotEqual, value)
    }

    /// `size(attribute) < value`
    pub fn lt(&self, value: impl Into<Operand>) -> Query {
        self.compare(Comparator::LessThan, value)
    }

    /// `size(attribute) <= value`
    pub fn le(&self, value: impl Into<Operand>) -> Query {
        self.compare(Comparator::LessThanOrEqual, value)
    }

    /// `size(attribute) > value`
    pub fn gt(&self, value: impl Into<Operand>) -> Query {
        self.compare(Comparator::GreaterThan, value)
    }

    /// `size(attribute) >= value`
    pub fn ge(&self, value: impl Into<Operand>) -> Query {
        self.compare(Comparator::GreaterThanOrEqual, value)
    }

    /// `size(attribute) BETWEEN low AND high`
    pub fn between(&self, low: impl Into<Operand>, high: impl Into<Operand>) -> Query {
        Query::filter(Condition::Between(
            Operand::Size(self.reference.clone()),
            low.into(),
            high.into(),
        ))
    }
}
