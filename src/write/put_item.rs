use crate::{
    common,
    error::Result,
    model::{self, Model, record::Record, schema::Schema},
    write,
};

use aws_sdk_dynamodb::{Client, error, operation, types};
use std::collections;

/// put item operation
#[derive(Debug, PartialEq)]
struct PutItemInput {
    item: collections::HashMap<String, types::AttributeValue>,
    write_operation: write::common::WriteInput,
}

/// Put item operation.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_model::{model, write};
/// # use dynamodb_model::{common::attribute::Key, model::{Model, schema::SchemaBuilder}};
/// # #[derive(serde::Deserialize, serde::Serialize)]
/// # struct User { id: String }
/// # impl Model for User {
/// #     fn define() -> SchemaBuilder {
/// #         SchemaBuilder::new("users").key("id", Key::new())
/// #     }
/// # }
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let put_item = write::put_item::PutItem {
///     item: User { id: "1".to_string() },
///     write_args: write::common::WriteArgs {
///         condition: Some(model::key::<User>("id")?.not_exists()),
///         ..Default::default()
///     },
/// };
/// let created = put_item.send(client).await?.is_applied();
/// # let _ = created;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, PartialEq)]
pub struct PutItem<M> {
    /// The item to put into the table.
    pub item: M,
    /// Additional write operation arguments (condition, return capacity, etc.).
    pub write_args: write::common::WriteArgs,
}

impl PutItemInput {
    fn new(
        item: collections::HashMap<String, types::AttributeValue>,
        write_args: write::common::WriteArgs,
        schema: &Schema,
    ) -> Result<Self> {
        let placeholders = common::Placeholders::new();
        let write_operation = write::common::WriteInput::new(write_args, schema, &placeholders)?;
        let operation = Self {
            item,
            write_operation,
        };
        Ok(operation)
    }

    async fn send(
        self,
        client: &Client,
    ) -> std::result::Result<
        write::common::WriteOutcome<operation::put_item::PutItemOutput>,
        error::SdkError<operation::put_item::PutItemError>,
    > {
        let builder = client.put_item().set_item(Some(self.item));
        let result = crate::apply_write_operation!(builder, self.write_operation)
            .send()
            .await;
        write::common::outcome(result)
    }
}

impl<M: Model> PutItem<M> {
    fn into_input(self, schema: &Schema) -> Result<PutItemInput> {
        let item = schema.to_item(&self.item)?;
        PutItemInput::new(item, self.write_args, schema)
    }

    /// Execute the put item operation.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_model.put_item", skip_all, err)
    )]
    pub async fn send(
        self,
        client: &Client,
    ) -> std::result::Result<
        write::common::WriteOutcome<operation::put_item::PutItemOutput>,
        error::SdkError<operation::put_item::PutItemError>,
    > {
        let schema = model::schema::<M>().map_err(error::BuildError::other)?;
        let put_item = self.into_input(&schema).map_err(error::BuildError::other)?;
        put_item.send(client).await
    }
}

impl PutItem<Record> {
    fn into_record_input(self) -> Result<PutItemInput> {
        let item = self.item.to_item()?;
        PutItemInput::new(item, self.write_args, self.item.schema())
    }

    /// Execute the put item operation against the table of the record's schema.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_model.put_item", skip_all, err)
    )]
    pub async fn send_record(
        self,
        client: &Client,
    ) -> std::result::Result<
        write::common::WriteOutcome<operation::put_item::PutItemOutput>,
        error::SdkError<operation::put_item::PutItemError>,
    > {
        let put_item = self.into_record_input().map_err(error::BuildError::other)?;
        put_item.send(client).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::attribute::{Attr, Key},
        common::value::Value,
        error::Error,
        model::{MaybeSet, schema::SchemaBuilder},
    };

    use rstest::rstest;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Deserialize, PartialEq, Serialize)]
    struct User {
        id: String,
        #[serde(default, skip_serializing_if = "MaybeSet::is_not_set")]
        nickname: MaybeSet<String>,
    }

    impl Model for User {
        fn define() -> SchemaBuilder {
            SchemaBuilder::new("users")
                .key("id", Key::new())
                .attr("nickname", Attr::named("nick"))
        }
    }

    #[rstest]
    #[case::empty(
        PutItem {
            item: User {
                id: "a".to_string(),
                nickname: MaybeSet::NotSet,
            },
            write_args: write::common::WriteArgs::default(),
        },
        PutItemInput {
            item: collections::HashMap::from(
                [(
                    "id".to_string(),
                    types::AttributeValue::S(
                        "a".to_string()
                    ),
                )]
            ),
            write_operation: write::common::WriteInput {
                table_name: "users".to_string(),
                ..Default::default()
            },
        }
    )]
    #[case::full(
        PutItem {
            item: User {
                id: "a".to_string(),
                nickname: MaybeSet::Set("b".to_string()),
            },
            write_args: write::common::WriteArgs {
                condition: Some(Key::named("id").not_exists()),
                return_consumed_capacity: Some(
                    types::ReturnConsumedCapacity::Total
                ),
                return_item_collection_metrics: Some(
                    types::ReturnItemCollectionMetrics::Size
                ),
            },
        },
        PutItemInput {
            item: collections::HashMap::from(
                [
                    (
                        "id".to_string(),
                        types::AttributeValue::S(
                            "a".to_string()
                        ),
                    ),
                    (
                        "nick".to_string(),
                        types::AttributeValue::S(
                            "b".to_string()
                        ),
                    ),
                ]
            ),
            write_operation: write::common::WriteInput {
                condition_expression: Some(
                    "attribute_not_exists(#n0)".to_string()
                ),
                expression_attribute_names: Some(
                    collections::HashMap::from(
                        [
                            ("#n0".to_string(), "id".to_string()),
                        ]
                    )
                ),
                return_consumed_capacity: Some(
                    types::ReturnConsumedCapacity::Total
                ),
                return_item_collection_metrics: Some(
                    types::ReturnItemCollectionMetrics::Size
                ),
                table_name: "users".to_string(),
                ..Default::default()
            },
        }
    )]
    fn test_put_item(#[case] args: PutItem<User>, #[case] expected: PutItemInput) {
        let schema = model::schema::<User>().unwrap();
        let actual = args.into_input(&schema).unwrap();
        assert_eq!(actual, expected);
    }

    #[rstest]
    #[case::with_nickname(
        vec![("id", Value::from("a")), ("nickname", Value::from("b"))],
        vec![("id", "a"), ("nick", "b")]
    )]
    #[case::without_nickname(vec![("id", Value::from("a"))], vec![("id", "a")])]
    fn test_put_record(
        #[case] fields: Vec<(&str, Value)>,
        #[case] expected_item: Vec<(&str, &str)>,
    ) {
        let schema = model::schema::<User>().unwrap();
        let put_item = PutItem {
            item: Record::new(schema, fields).unwrap(),
            write_args: write::common::WriteArgs {
                condition: Some(Key::named("id").not_exists()),
                ..Default::default()
            },
        };
        let actual = put_item.into_record_input().unwrap();
        let expected = PutItemInput {
            item: expected_item
                .into_iter()
                .map(|(name, value)| {
                    (
                        name.to_string(),
                        types::AttributeValue::S(value.to_string()),
                    )
                })
                .collect(),
            write_operation: write::common::WriteInput {
                condition_expression: Some("attribute_not_exists(#n0)".to_string()),
                expression_attribute_names: Some(collections::HashMap::from([(
                    "#n0".to_string(),
                    "id".to_string(),
                )])),
                table_name: "users".to_string(),
                ..Default::default()
            },
        };
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_key_only_condition_is_accepted() {
        let put_item = PutItem {
            item: User {
                id: "a".to_string(),
                nickname: MaybeSet::NotSet,
            },
            write_args: write::common::WriteArgs {
                condition: Some(Key::named("id").eq("a")),
                ..Default::default()
            },
        };
        let schema = model::schema::<User>().unwrap();
        let actual = put_item.into_input(&schema).unwrap();
        assert_eq!(
            actual.write_operation.condition_expression,
            Some("#n0 = :v1".to_string())
        );
    }

    #[test]
    fn test_unbound_condition_is_rejected() {
        let put_item = PutItem {
            item: User {
                id: "a".to_string(),
                nickname: MaybeSet::NotSet,
            },
            write_args: write::common::WriteArgs {
                condition: Some(Attr::new().exists()),
                ..Default::default()
            },
        };
        let schema = model::schema::<User>().unwrap();
        assert!(matches!(
            put_item.into_input(&schema),
            Err(Error::Definition(_))
        ));
    }
}
