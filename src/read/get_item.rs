use crate::{
    common::{self, key::PrimaryKey},
    error::Result,
    model::{self, Model, record::Record, schema::Schema},
    read,
};

use aws_sdk_dynamodb::{Client, error, operation, types};
use std::{collections, sync};

/// get item operation
#[derive(Clone, Debug, Default, PartialEq)]
struct GetItemInput {
    key: collections::HashMap<String, types::AttributeValue>,
    single_read_operation: read::common::SingleReadInput,
}

/// Get item operation.
///
/// Only the declared attributes of the model are requested.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_model::{common::key::PrimaryKey, read};
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
/// let get_item = read::get_item::GetItem {
///     key: PrimaryKey::partition("1"),
///     read_args: Default::default(),
/// };
/// let user: Option<User> = get_item.send(client).await?;
/// # let _ = user;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct GetItem {
    /// The primary key of the item to retrieve.
    pub key: PrimaryKey,
    /// Additional read operation arguments (consistent read, return capacity).
    pub read_args: read::common::ReadArgs,
}

impl GetItem {
    fn into_input(self, schema: &Schema) -> Result<GetItemInput> {
        let placeholders = common::Placeholders::new();
        let key = self.key.resolve(schema)?;
        let single_read_operation =
            read::common::SingleReadInput::new(self.read_args, schema, &placeholders)?;
        let operation = GetItemInput {
            key,
            single_read_operation,
        };
        Ok(operation)
    }

    async fn fetch(
        self,
        client: &Client,
        schema: &Schema,
    ) -> std::result::Result<
        Option<collections::HashMap<String, types::AttributeValue>>,
        error::SdkError<operation::get_item::GetItemError>,
    > {
        let get_item = self.into_input(schema).map_err(error::BuildError::other)?;
        let builder = client.get_item().set_key(Some(get_item.key));
        let output = crate::apply_single_read_operation!(builder, get_item.single_read_operation)
            .send()
            .await?;
        Ok(output.item)
    }

    /// Execute the get item operation, returning `None` if there is no such item.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_model.get_item", skip_all, err)
    )]
    pub async fn send<M: Model>(
        self,
        client: &Client,
    ) -> std::result::Result<Option<M>, error::SdkError<operation::get_item::GetItemError>> {
        let schema = model::schema::<M>().map_err(error::BuildError::other)?;
        let item = self
            .fetch(client, &schema)
            .await?
            .map(|item| schema.from_item(item))
            .transpose()
            .map_err(error::BuildError::other)?;
        Ok(item)
    }

    /// Execute the get item operation against `schema`, decoding the item into a record.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_model.get_item", skip_all, err)
    )]
    pub async fn send_record(
        self,
        client: &Client,
        schema: sync::Arc<Schema>,
    ) -> std::result::Result<Option<Record>, error::SdkError<operation::get_item::GetItemError>>
    {
        let item = self
            .fetch(client, &schema)
            .await?
            .map(|item| Record::from_item(schema.clone(), item))
            .transpose()
            .map_err(error::BuildError::other)?;
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::attribute::{Attr, Key},
        error::Error,
        model::schema::SchemaBuilder,
    };

    use rstest::rstest;

    fn schema() -> Schema {
        SchemaBuilder::new("c")
            .key("a", Key::new())
            .attr("d", Attr::named("D"))
            .build()
            .unwrap()
    }

    #[rstest]
    #[case::empty(
        GetItem {
            key: PrimaryKey::partition("b"),
            read_args: read::common::ReadArgs::default(),
        },
        GetItemInput {
            key: collections::HashMap::from(
                [(
                    "a".to_string(),
                    types::AttributeValue::S(
                        "b".to_string()
                    ),
                )]
            ),
            single_read_operation: read::common::SingleReadInput {
                expression_attribute_names: Some(
                    collections::HashMap::from(
                        [
                            ("#n0".to_string(), "a".to_string()),
                            ("#n1".to_string(), "D".to_string()),
                        ]
                    )
                ),
                projection_expression: Some(
                    "#n0, #n1".to_string()
                ),
                table_name: "c".to_string(),
                ..Default::default()
            },
        }
    )]
    #[case::full(
        GetItem {
            key: PrimaryKey::explicit([("a", "b".into())]),
            read_args: read::common::ReadArgs {
                consistent_read: Some(true),
                return_consumed_capacity: Some(
                    types::ReturnConsumedCapacity::Total
                ),
            },
        },
        GetItemInput {
            key: collections::HashMap::from(
                [(
                    "a".to_string(),
                    types::AttributeValue::S(
                        "b".to_string()
                    ),
                )]
            ),
            single_read_operation: read::common::SingleReadInput {
                consistent_read: Some(true),
                expression_attribute_names: Some(
                    collections::HashMap::from(
                        [
                            ("#n0".to_string(), "a".to_string()),
                            ("#n1".to_string(), "D".to_string()),
                        ]
                    )
                ),
                projection_expression: Some(
                    "#n0, #n1".to_string()
                ),
                return_consumed_capacity: Some(
                    types::ReturnConsumedCapacity::Total
                ),
                table_name: "c".to_string(),
            },
        }
    )]
    fn test_get_item(#[case] args: GetItem, #[case] expected: GetItemInput) {
        let actual = args.into_input(&schema()).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_wrong_key_shape_is_rejected() {
        let get_item = GetItem {
            key: PrimaryKey::composite("b", 1),
            read_args: Default::default(),
        };
        assert!(matches!(
            get_item.into_input(&schema()),
            Err(Error::InvalidKey(_))
        ));
    }
}
