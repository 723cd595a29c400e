use crate::{
    common::{self, attribute::AttributeRef},
    error::Result,
    model::schema::Schema,
};

/// Attributes to retrieve, compiled into a `ProjectionExpression`.
///
/// ```rust
/// use dynamodb_model::common::{attribute::Attr, selection::Projection};
///
/// let projection = Projection::from_iter([Attr::named("year"), Attr::named("info").field("rating")]);
/// # let _ = projection;
/// ```
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Projection(Vec<AttributeRef>);

impl Projection {
    /// Every attribute declared on `schema`, in declaration order.
    pub fn of(schema: &Schema) -> Self {
        Self(
            schema
                .attributes()
                .values()
                .map(|definition| definition.reference().clone())
                .collect(),
        )
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compile into a projection expression; values are never referenced.
    pub fn compile(&self, placeholders: &common::Placeholders) -> Result<common::Fragment> {
        let mut operations = Vec::with_capacity(self.0.len());
        for reference in &self.0 {
            operations.push(reference.compile(placeholders)?);
        }
        Ok(common::Fragment::merge(", ", operations))
    }
}

impl<R: Into<AttributeRef>> FromIterator<R> for Projection {
    fn from_iter<I: IntoIterator<Item = R>>(references: I) -> Self {
        Self(references.into_iter().map(Into::into).collect())
    }
}
