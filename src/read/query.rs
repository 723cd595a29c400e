use crate::{
    common::{
        self,
        condition::{Condition, Query},
    },
    error::Result,
    model::{self, Model, record::Record, schema::Schema},
    read,
};

use aws_sdk_dynamodb::{Client, error, operation};
use std::sync;

/// query operation
#[derive(Clone, Debug, Default, PartialEq)]
struct QueryInput {
    key_condition_expression: String,
    multiple_read_operation: read::common::MultipleReadInput,
    scan_index_forward: Option<bool>,
}

/// Query operation.
///
/// The key half of `query` becomes the `KeyConditionExpression`; its filter half,
/// AND-ed with `filter`, becomes the `FilterExpression`. Every page is fetched.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_model::{model, read};
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
/// let year = model::key::<Movie>("year")?;
/// let title = model::key::<Movie>("title")?;
/// let query = read::query::QueryItems {
///     query: year.eq(1992) & title.between("A", "L"),
///     filter: Some(model::attr::<Movie>("rating")?.gt(8)),
///     ..Default::default()
/// };
/// let movies: Vec<Movie> = query.send(client).await?;
/// # let _ = movies;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryItems {
    /// The key condition, possibly carrying a filter half.
    pub query: Query,
    /// An additional filter; a key-only query is rejected.
    pub filter: Option<Query>,
    /// Number of items evaluated per request.
    pub page_size: Option<i32>,
    /// Additional read operation arguments (consistent read, return capacity).
    pub read_args: read::common::ReadArgs,
    /// Whether to scan the index forward (ascending) or backward (descending).
    pub scan_index_forward: Option<bool>,
}

impl QueryItems {
    fn into_input(self, schema: &Schema) -> Result<QueryInput> {
        let placeholders = common::Placeholders::new();
        let (key_condition, remaining) = self.query.into_key_condition()?;
        let filter = self
            .filter
            .map(Query::into_filter_condition)
            .transpose()?;
        let filter = match (remaining, filter) {
            (Some(remaining), Some(filter)) => Some(Condition::and(remaining, filter)),
            (remaining, None) => remaining,
            (None, filter) => filter,
        };
        let mut multiple_read_operation = read::common::MultipleReadInput::new(
            self.read_args,
            schema,
            filter,
            self.page_size,
            &placeholders,
        )?;
        let key_condition = key_condition.compile(&placeholders)?;
        let key_condition_expression = multiple_read_operation.merge_expression(key_condition);
        let operation = QueryInput {
            key_condition_expression,
            multiple_read_operation,
            scan_index_forward: self.scan_index_forward,
        };
        Ok(operation)
    }

    fn request(
        self,
        client: &Client,
        schema: &Schema,
    ) -> Result<operation::query::builders::QueryFluentBuilder> {
        let query = self.into_input(schema)?;
        let builder = client
            .query()
            .key_condition_expression(query.key_condition_expression)
            .set_scan_index_forward(query.scan_index_forward);
        Ok(crate::apply_multiple_read_operation!(
            builder,
            query.multiple_read_operation
        ))
    }

    /// Execute the query operation, collecting the items of every page.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_model.query", skip_all, err)
    )]
    pub async fn send<M: Model>(
        self,
        client: &Client,
    ) -> std::result::Result<Vec<M>, error::SdkError<operation::query::QueryError>> {
        let schema = model::schema::<M>().map_err(error::BuildError::other)?;
        let mut paginator = self
            .request(client, &schema)
            .map_err(error::BuildError::other)?
            .into_paginator()
            .send();
        crate::collect_items!(paginator, |items| {
            read::common::decode_items::<M>(&schema, items)
        })
    }

    /// Execute the query operation against `schema`, collecting every page as records.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_model.query", skip_all, err)
    )]
    pub async fn send_records(
        self,
        client: &Client,
        schema: sync::Arc<Schema>,
    ) -> std::result::Result<Vec<Record>, error::SdkError<operation::query::QueryError>> {
        let mut paginator = self
            .request(client, &schema)
            .map_err(error::BuildError::other)?
            .into_paginator()
            .send();
        crate::collect_items!(paginator, |items| {
            read::common::decode_records(&schema, items)
        })
    }
}
