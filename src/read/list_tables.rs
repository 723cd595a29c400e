use aws_sdk_dynamodb::{Client, error, operation};

const DEFAULT_PAGE_SIZE: i32 = 100;

/// list tables operation
#[derive(Clone, Debug, Default, PartialEq)]
struct ListTablesInput {
    limit: i32,
}

/// List tables operation, following every page.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_model::read;
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let tables = read::list_tables::ListTables::default().send(client).await?;
/// # let _ = tables;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct ListTables {
    /// Number of table names requested per page, 100 when unset.
    pub page_size: Option<i32>,
}

impl From<ListTables> for ListTablesInput {
    fn from(list_tables: ListTables) -> Self {
        Self {
            limit: list_tables.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }
}

impl ListTables {
    /// Execute the list tables operation, returning every table name.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_model.list_tables", skip_all, err)
    )]
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<Vec<String>, error::SdkError<operation::list_tables::ListTablesError>> {
        let list_tables = ListTablesInput::from(self);
        let mut paginator = client
            .list_tables()
            .limit(list_tables.limit)
            .into_paginator()
            .send();
        let mut table_names = Vec::new();
        while let Some(page) = paginator.next().await {
            table_names.extend(page?.table_names.unwrap_or_default());
        }
        Ok(table_names)
    }
}
