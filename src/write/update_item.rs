use crate::{
    common::{self, attribute::AttributeRef, key::PrimaryKey, operand::Operand, value::Value},
    error::Result,
    model::{self, Model, record::Record, schema::Schema},
    write,
};

use aws_sdk_dynamodb::{Client, error, operation, types};
use std::{collections, ops, sync};

/// Keyword of an `UpdateExpression` clause, in output order.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
enum UpdateClause {
    Set,
    Add,
    Delete,
    Remove,
}

impl ops::Deref for UpdateClause {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Set => "SET",
            Self::Add => "ADD",
            Self::Delete => "DELETE",
            Self::Remove => "REMOVE",
        }
    }
}

/// Update operations, combined with `&`.
///
/// Compilation groups the actions by clause, always in the order `SET`, `ADD`,
/// `DELETE`, `REMOVE`, whatever the order they were combined in.
///
/// ```rust
/// use dynamodb_model::common::{attribute::Attr, operand};
///
/// let update = Attr::named("rating").set(Attr::named("rating").if_not_exists(0).plus(1))
///     & Attr::named("actors").set(operand::list_append(Attr::named("actors"), vec!["Moe"]))
///     & Attr::named("tags").add(vec!["classic"])
///     & Attr::named("draft").remove();
/// let compiled = update.compile().unwrap();
/// assert!(compiled.expression.starts_with("SET "));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum UpdateOperator {
    /// `SET path = operand`
    Set(AttributeRef, Operand),
    /// `REMOVE path`
    Remove(AttributeRef),
    /// `ADD path value`
    Add(AttributeRef, Value),
    /// `DELETE path value`
    Delete(AttributeRef, Value),
    /// Both operations.
    Combine(Box<UpdateOperator>, Box<UpdateOperator>),
}

impl UpdateOperator {
    /// Combine with another operation.
    pub fn and(self, other: Self) -> Self {
        Self::Combine(Box::new(self), Box::new(other))
    }

    /// Compile against the process-wide placeholder source.
    pub fn compile(&self) -> Result<common::Fragment> {
        self.compile_with(common::Placeholders::global())
    }

    /// Compile against `placeholders`.
    pub fn compile_with(&self, placeholders: &common::Placeholders) -> Result<common::Fragment> {
        let mut clauses = collections::BTreeMap::new();
        self.collect(placeholders, &mut clauses)?;
        let groups = clauses
            .into_iter()
            .map(|(clause, actions)| {
                let mut operation = common::Fragment::merge(", ", actions);
                operation.expression = format!("{} {}", &*clause, operation.expression);
                operation
            })
            .collect();
        Ok(common::Fragment::merge(" ", groups))
    }

    fn collect(
        &self,
        placeholders: &common::Placeholders,
        clauses: &mut collections::BTreeMap<UpdateClause, Vec<common::Fragment>>,
    ) -> Result<()> {
        let (clause, operation) = match self {
            Self::Set(reference, operand) => {
                let mut operation = reference.compile(placeholders)?;
                let operand = operation.absorb(operand.compile(placeholders)?);
                operation.expression = format!("{} = {operand}", operation.expression);
                (UpdateClause::Set, operation)
            }
            Self::Remove(reference) => (UpdateClause::Remove, reference.compile(placeholders)?),
            Self::Add(reference, value) => (
                UpdateClause::Add,
                Self::compile_set_action(reference, value, placeholders)?,
            ),
            Self::Delete(reference, value) => (
                UpdateClause::Delete,
                Self::compile_set_action(reference, value, placeholders)?,
            ),
            Self::Combine(left, right) => {
                left.collect(placeholders, clauses)?;
                return right.collect(placeholders, clauses);
            }
        };
        clauses.entry(clause).or_default().push(operation);
        Ok(())
    }

    fn compile_set_action(
        reference: &AttributeRef,
        value: &Value,
        placeholders: &common::Placeholders,
    ) -> Result<common::Fragment> {
        let mut operation = reference.compile(placeholders)?;
        let value = Operand::Literal(value.clone().into_set()?);
        let value = operation.absorb(value.compile(placeholders)?);
        operation.expression = format!("{} {value}", operation.expression);
        Ok(operation)
    }
}

impl ops::BitAnd for UpdateOperator {
    type Output = Self;

    fn bitand(self, other: Self) -> Self::Output {
        self.and(other)
    }
}

/// update item operation
#[derive(Clone, Debug, Default, PartialEq)]
struct UpdateItemInput {
    key: collections::HashMap<String, types::AttributeValue>,
    update_expression: String,
    write_operation: write::common::WriteInput,
}

/// Update item operation.
///
/// Returns the item as it is after the update, or
/// [`NotApplied`](write::common::WriteOutcome::NotApplied) if the condition failed.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_model::{common::key::PrimaryKey, model, write};
/// # use dynamodb_model::{common::attribute::{Attr, Key}, model::{Model, schema::SchemaBuilder}};
/// # #[derive(serde::Deserialize, serde::Serialize)]
/// # struct Movie { year: i64, title: String, rating: f64 }
/// # impl Model for Movie {
/// #     fn define() -> SchemaBuilder {
/// #         SchemaBuilder::new("movies")
/// #             .key("year", Key::new())
/// #             .key("title", Key::new())
/// #             .attr("rating", Attr::new())
/// #     }
/// # }
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let rating = model::attr::<Movie>("rating")?;
/// let update_item = write::update_item::UpdateItem {
///     key: PrimaryKey::composite(1992, "Reservoir Dogs"),
///     update: rating.set(rating.plus(1)),
///     write_args: write::common::WriteArgs {
///         condition: Some(rating.lt(10)),
///         ..Default::default()
///     },
/// };
/// let movie = update_item.send::<Movie>(client).await?.applied();
/// # let _ = movie;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateItem {
    /// The primary key of the item to update.
    pub key: PrimaryKey,
    /// The update actions.
    pub update: UpdateOperator,
    /// Additional write operation arguments (condition, return capacity, etc.).
    pub write_args: write::common::WriteArgs,
}

impl UpdateItem {
    fn into_input(self, schema: &Schema) -> Result<UpdateItemInput> {
        let placeholders = common::Placeholders::new();
        let key = self.key.resolve(schema)?;
        let update = self.update.compile_with(&placeholders)?;
        let mut write_operation =
            write::common::WriteInput::new(self.write_args, schema, &placeholders)?;
        let update_expression = write_operation.merge_expression(update);
        let operation = UpdateItemInput {
            key,
            update_expression,
            write_operation,
        };
        Ok(operation)
    }

    async fn execute(
        self,
        client: &Client,
        schema: &Schema,
    ) -> std::result::Result<
        write::common::WriteOutcome<collections::HashMap<String, types::AttributeValue>>,
        error::SdkError<operation::update_item::UpdateItemError>,
    > {
        let update_item = self.into_input(schema).map_err(error::BuildError::other)?;
        let builder = client
            .update_item()
            .set_key(Some(update_item.key))
            .update_expression(update_item.update_expression)
            .return_values(types::ReturnValue::AllNew);
        let result = crate::apply_write_operation!(builder, update_item.write_operation)
            .send()
            .await;
        Ok(write::common::outcome(result)?.map(|output| output.attributes.unwrap_or_default()))
    }

    /// Execute the update item operation.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_model.update_item", skip_all, err)
    )]
    pub async fn send<M: Model>(
        self,
        client: &Client,
    ) -> std::result::Result<
        write::common::WriteOutcome<M>,
        error::SdkError<operation::update_item::UpdateItemError>,
    > {
        let schema = model::schema::<M>().map_err(error::BuildError::other)?;
        match self.execute(client, &schema).await? {
            write::common::WriteOutcome::Applied(item) => {
                let item = schema.from_item(item).map_err(error::BuildError::other)?;
                Ok(write::common::WriteOutcome::Applied(item))
            }
            write::common::WriteOutcome::NotApplied => Ok(write::common::WriteOutcome::NotApplied),
        }
    }

    /// Execute the update item operation against `schema`, decoding the updated item
    /// into a record.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_model.update_item", skip_all, err)
    )]
    pub async fn send_record(
        self,
        client: &Client,
        schema: sync::Arc<Schema>,
    ) -> std::result::Result<
        write::common::WriteOutcome<Record>,
        error::SdkError<operation::update_item::UpdateItemError>,
    > {
        match self.execute(client, &schema).await? {
            write::common::WriteOutcome::Applied(item) => {
                let record = Record::from_item(schema, item).map_err(error::BuildError::other)?;
                Ok(write::common::WriteOutcome::Applied(record))
            }
            write::common::WriteOutcome::NotApplied => Ok(write::common::WriteOutcome::NotApplied),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::{
            attribute::{Attr, Key},
            operand,
        },
        error::Error,
        model::schema::SchemaBuilder,
    };

    use rstest::rstest;

    /// Substitute every placeholder with what it stands for.
    fn resolve(fragment: &common::Fragment) -> String {
        let mut substitutions: Vec<(&String, String)> = fragment
            .expression_attribute_names
            .iter()
            .map(|(placeholder, name)| (placeholder, name.clone()))
            .chain(
                fragment
                    .expression_attribute_values
                    .iter()
                    .map(|(placeholder, value)| (placeholder, format!("{value:?}"))),
            )
            .collect();
        substitutions.sort_by_key(|(placeholder, _)| std::cmp::Reverse(placeholder.len()));
        substitutions
            .into_iter()
            .fold(fragment.expression.clone(), |expression, (placeholder, text)| {
                expression.replace(placeholder.as_str(), &text)
            })
    }

    fn names(pairs: &[(&str, &str)]) -> collections::HashMap<String, String> {
        pairs
            .iter()
            .map(|(placeholder, name)| (placeholder.to_string(), name.to_string()))
            .collect()
    }

    fn values(
        pairs: Vec<(&str, types::AttributeValue)>,
    ) -> collections::HashMap<String, types::AttributeValue> {
        pairs
            .into_iter()
            .map(|(placeholder, value)| (placeholder.to_string(), value))
            .collect()
    }

    fn n(number: &str) -> types::AttributeValue {
        types::AttributeValue::N(number.to_string())
    }

    #[rstest]
    #[case::set_assign(
        Attr::named("attr").set("val"),
        common::Fragment {
            expression: "SET #n0 = :v1".to_string(),
            expression_attribute_names: names(&[("#n0", "attr")]),
            expression_attribute_values: values(vec![(
                ":v1",
                types::AttributeValue::S("val".to_string()),
            )]),
        }
    )]
    #[case::set_increment(
        Attr::named("count").set(Attr::named("count").plus(5)),
        common::Fragment {
            expression: "SET #n0 = #n1 + :v2".to_string(),
            expression_attribute_names: names(&[("#n0", "count"), ("#n1", "count")]),
            expression_attribute_values: values(vec![(":v2", n("5"))]),
        }
    )]
    #[case::set_if_not_exists(
        Attr::named("count").set(Attr::named("count").if_not_exists(0)),
        common::Fragment {
            expression: "SET #n0 = if_not_exists(#n1, :v2)".to_string(),
            expression_attribute_names: names(&[("#n0", "count"), ("#n1", "count")]),
            expression_attribute_values: values(vec![(":v2", n("0"))]),
        }
    )]
    #[case::set_list_prepend(
        Attr::named("list").set(operand::list_append(vec!["item"], Attr::named("list"))),
        common::Fragment {
            expression: "SET #n0 = list_append(:v1, #n2)".to_string(),
            expression_attribute_names: names(&[("#n0", "list"), ("#n2", "list")]),
            expression_attribute_values: values(vec![(
                ":v1",
                types::AttributeValue::L(vec![types::AttributeValue::S("item".to_string())]),
            )]),
        }
    )]
    #[case::remove_nested(
        Attr::named("a").field("b").index(0).remove(),
        common::Fragment {
            expression: "REMOVE #n0.#n1[0]".to_string(),
            expression_attribute_names: names(&[("#n0", "a"), ("#n1", "b")]),
            ..Default::default()
        }
    )]
    #[case::add_number(
        Attr::named("count").add(1),
        common::Fragment {
            expression: "ADD #n0 :v1".to_string(),
            expression_attribute_names: names(&[("#n0", "count")]),
            expression_attribute_values: values(vec![(":v1", n("1"))]),
        }
    )]
    #[case::add_list_as_string_set(
        Attr::named("tags").add(vec!["a", "b"]),
        common::Fragment {
            expression: "ADD #n0 :v1".to_string(),
            expression_attribute_names: names(&[("#n0", "tags")]),
            expression_attribute_values: values(vec![(
                ":v1",
                types::AttributeValue::Ss(vec!["a".to_string(), "b".to_string()]),
            )]),
        }
    )]
    #[case::delete_list_as_number_set(
        Attr::named("scores").delete(vec![3]),
        common::Fragment {
            expression: "DELETE #n0 :v1".to_string(),
            expression_attribute_names: names(&[("#n0", "scores")]),
            expression_attribute_values: values(vec![(
                ":v1",
                types::AttributeValue::Ns(vec!["3".to_string()]),
            )]),
        }
    )]
    #[case::combined(
        Attr::named("a").remove() & Attr::named("b").set(1) & Attr::named("c").set(2),
        common::Fragment {
            expression: "SET #n1 = :v2, #n3 = :v4 REMOVE #n0".to_string(),
            expression_attribute_names: names(&[("#n0", "a"), ("#n1", "b"), ("#n3", "c")]),
            expression_attribute_values: values(vec![(":v2", n("1")), (":v4", n("2"))]),
        }
    )]
    fn test_compile(#[case] update: UpdateOperator, #[case] expected: common::Fragment) {
        let actual = update.compile_with(&common::Placeholders::new()).unwrap();
        assert_eq!(actual, expected);
    }

    #[rstest]
    #[case::set_add_remove(
        Attr::named("a").set(1) & Attr::named("b").add(2) & Attr::named("c").remove()
    )]
    #[case::remove_set_add(
        Attr::named("c").remove() & Attr::named("a").set(1) & Attr::named("b").add(2)
    )]
    #[case::add_remove_set(
        Attr::named("b").add(2) & (Attr::named("c").remove() & Attr::named("a").set(1))
    )]
    fn test_grouping_is_order_independent(#[case] update: UpdateOperator) {
        let actual = resolve(&update.compile().unwrap());
        assert_eq!(actual, r#"SET a = N("1") ADD b N("2") REMOVE c"#);
    }

    #[rstest]
    #[case::empty_set(Attr::named("a").add(Vec::<String>::new()))]
    #[case::mixed_set(Attr::named("a").delete(vec![Value::from(1), Value::from("x")]))]
    fn test_invalid_set_action(#[case] update: UpdateOperator) {
        let actual = update.compile_with(&common::Placeholders::new());
        assert!(matches!(actual, Err(Error::UnsupportedValue(_))));
    }

    #[test]
    fn test_update_item_to_update_item_input() {
        let schema = SchemaBuilder::new("movies")
            .key("year", Key::new())
            .key("title", Key::new())
            .attr("rating", Attr::named("Rating"))
            .build()
            .unwrap();
        let rating = schema.attr("rating").unwrap();
        let update_item = UpdateItem {
            key: PrimaryKey::composite(1992, "A"),
            update: rating.set(9),
            write_args: write::common::WriteArgs {
                condition: Some(rating.lt(9)),
                ..Default::default()
            },
        };
        let actual = update_item.into_input(&schema).unwrap();
        let expected = UpdateItemInput {
            key: collections::HashMap::from([
                ("year".to_string(), n("1992")),
                ("title".to_string(), types::AttributeValue::S("A".to_string())),
            ]),
            update_expression: "SET #n0 = :v1".to_string(),
            write_operation: write::common::WriteInput {
                condition_expression: Some("#n2 < :v3".to_string()),
                expression_attribute_names: Some(names(&[("#n0", "Rating"), ("#n2", "Rating")])),
                expression_attribute_values: Some(values(vec![(":v1", n("9")), (":v3", n("9"))])),
                table_name: "movies".to_string(),
                ..Default::default()
            },
        };
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_key_mismatch_is_rejected() {
        let schema = SchemaBuilder::new("t")
            .key("id", Key::new())
            .build()
            .unwrap();
        let update_item = UpdateItem {
            key: PrimaryKey::composite(1, 2),
            update: Attr::named("a").remove(),
            write_args: Default::default(),
        };
        assert!(matches!(
            update_item.into_input(&schema),
            Err(Error::InvalidKey(_))
        ));
    }
}
