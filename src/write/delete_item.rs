use crate::{
    common::{self, key::PrimaryKey},
    error::Result,
    model::{self, Model, schema::Schema},
    write,
};

use aws_sdk_dynamodb::{Client, error, operation, types};
use std::collections;

/// delete item operation
#[derive(Debug, PartialEq)]
struct DeleteItemInput {
    key: collections::HashMap<String, types::AttributeValue>,
    write_operation: write::common::WriteInput,
}

/// Delete item operation.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_model::{common::key::PrimaryKey, write};
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
/// let delete_item = write::delete_item::DeleteItem {
///     key: PrimaryKey::partition("1"),
///     write_args: Default::default(),
/// };
/// delete_item.send::<User>(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DeleteItem {
    /// The primary key of the item to delete.
    pub key: PrimaryKey,
    /// Additional write operation arguments (condition, return capacity, etc.).
    pub write_args: write::common::WriteArgs,
}

impl DeleteItem {
    fn into_input(self, schema: &Schema) -> Result<DeleteItemInput> {
        let placeholders = common::Placeholders::new();
        let key = self.key.resolve(schema)?;
        let write_operation =
            write::common::WriteInput::new(self.write_args, schema, &placeholders)?;
        let operation = DeleteItemInput {
            key,
            write_operation,
        };
        Ok(operation)
    }

    /// Execute the delete item operation against the table of `M`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_model.delete_item", skip_all, err)
    )]
    pub async fn send<M: Model>(
        self,
        client: &Client,
    ) -> std::result::Result<
        write::common::WriteOutcome<operation::delete_item::DeleteItemOutput>,
        error::SdkError<operation::delete_item::DeleteItemError>,
    > {
        let schema = model::schema::<M>().map_err(error::BuildError::other)?;
        self.send_with_schema(client, &schema).await
    }

    /// Execute the delete item operation against the table of `schema`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_model.delete_item", skip_all, err)
    )]
    pub async fn send_with_schema(
        self,
        client: &Client,
        schema: &Schema,
    ) -> std::result::Result<
        write::common::WriteOutcome<operation::delete_item::DeleteItemOutput>,
        error::SdkError<operation::delete_item::DeleteItemError>,
    > {
        let delete_item = self
            .into_input(schema)
            .map_err(error::BuildError::other)?;
        let builder = client.delete_item().set_key(Some(delete_item.key));
        let result = crate::apply_write_operation!(builder, delete_item.write_operation)
            .send()
            .await;
        write::common::outcome(result)
    }
}
