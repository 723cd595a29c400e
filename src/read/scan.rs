use crate::{
    common::{self, condition::Query},
    error::Result,
    model::{self, Model, record::Record, schema::Schema},
    read,
};

use aws_sdk_dynamodb::{Client, error, operation};
use std::sync;

/// scan operation
#[derive(Clone, Debug, Default, PartialEq)]
struct ScanInput {
    multiple_read_operation: read::common::MultipleReadInput,
    segment: Option<i32>,
    total_segments: Option<i32>,
}

/// Scan operation.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_model::{model, read};
/// # use dynamodb_model::{common::attribute::{Attr, Key}, model::{Model, schema::SchemaBuilder}};
/// # #[derive(serde::Deserialize, serde::Serialize)]
/// # struct User { id: String, age: i64 }
/// # impl Model for User {
/// #     fn define() -> SchemaBuilder {
/// #         SchemaBuilder::new("users").key("id", Key::new()).attr("age", Attr::new())
/// #     }
/// # }
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let scan = read::scan::Scan {
///     filter: Some(model::attr::<User>("age")?.ge(18)),
///     ..Default::default()
/// };
/// let adults: Vec<User> = scan.send(client).await?;
/// # let _ = adults;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scan {
    /// Optional filter; a key-only query is rejected.
    pub filter: Option<Query>,
    /// Number of items evaluated per request.
    pub page_size: Option<i32>,
    /// Additional read operation arguments (consistent read, return capacity).
    pub read_args: read::common::ReadArgs,
    /// The segment number for parallel scans (0-indexed).
    pub segment: Option<i32>,
    /// The total number of segments for parallel scans.
    pub total_segments: Option<i32>,
}

impl Scan {
    fn into_input(self, schema: &Schema) -> Result<ScanInput> {
        let placeholders = common::Placeholders::new();
        let filter = self
            .filter
            .map(Query::into_filter_condition)
            .transpose()?;
        let multiple_read_operation = read::common::MultipleReadInput::new(
            self.read_args,
            schema,
            filter,
            self.page_size,
            &placeholders,
        )?;
        let operation = ScanInput {
            multiple_read_operation,
            segment: self.segment,
            total_segments: self.total_segments,
        };
        Ok(operation)
    }

    fn request(
        self,
        client: &Client,
        schema: &Schema,
    ) -> Result<operation::scan::builders::ScanFluentBuilder> {
        let scan = self.into_input(schema)?;
        let builder = client
            .scan()
            .set_segment(scan.segment)
            .set_total_segments(scan.total_segments);
        Ok(crate::apply_multiple_read_operation!(
            builder,
            scan.multiple_read_operation
        ))
    }

    /// Execute the scan operation, collecting the items of every page.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_model.scan", skip_all, err)
    )]
    pub async fn send<M: Model>(
        self,
        client: &Client,
    ) -> std::result::Result<Vec<M>, error::SdkError<operation::scan::ScanError>> {
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

    /// Execute the scan operation against `schema`, collecting every page as records.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_model.scan", skip_all, err)
    )]
    pub async fn send_records(
        self,
        client: &Client,
        schema: sync::Arc<Schema>,
    ) -> std::result::Result<Vec<Record>, error::SdkError<operation::scan::ScanError>> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::attribute::{Attr, Key},
        error::Error,
        model::schema::SchemaBuilder,
    };

    use aws_sdk_dynamodb::types;
    use rstest::rstest;
    use std::collections;

    fn schema() -> Schema {
        SchemaBuilder::new("a")
            .index("i")
            .key("b", Key::new())
            .attr("c", Attr::new())
            .build()
            .unwrap()
    }

    #[rstest]
    #[case::empty(
        Scan::default(),
        ScanInput {
            multiple_read_operation: read::common::MultipleReadInput {
                expression_attribute_names: Some(
                    collections::HashMap::from(
                        [
                            ("#n0".to_string(), "b".to_string()),
                            ("#n1".to_string(), "c".to_string()),
                        ]
                    )
                ),
                index_name: Some("i".to_string()),
                projection_expression: Some("#n0, #n1".to_string()),
                table_name: "a".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    )]
    #[case::full(
        Scan {
            filter: Some(Key::named("b").eq("x") & Attr::named("c").contains("y")),
            page_size: Some(25),
            read_args: read::common::ReadArgs {
                consistent_read: Some(true),
                return_consumed_capacity: Some(
                    types::ReturnConsumedCapacity::Indexes
                ),
            },
            segment: Some(1),
            total_segments: Some(4),
        },
        ScanInput {
            multiple_read_operation: read::common::MultipleReadInput {
                consistent_read: Some(true),
                expression_attribute_names: Some(
                    collections::HashMap::from(
                        [
                            ("#n0".to_string(), "b".to_string()),
                            ("#n1".to_string(), "c".to_string()),
                            ("#n2".to_string(), "b".to_string()),
                            ("#n4".to_string(), "c".to_string()),
                        ]
                    )
                ),
                expression_attribute_values: Some(
                    collections::HashMap::from(
                        [
                            (
                                ":v3".to_string(),
                                types::AttributeValue::S("x".to_string()),
                            ),
                            (
                                ":v5".to_string(),
                                types::AttributeValue::S("y".to_string()),
                            ),
                        ]
                    )
                ),
                filter_expression: Some(
                    "#n2 = :v3 AND contains(#n4, :v5)".to_string()
                ),
                index_name: Some("i".to_string()),
                limit: Some(25),
                projection_expression: Some("#n0, #n1".to_string()),
                return_consumed_capacity: Some(
                    types::ReturnConsumedCapacity::Indexes
                ),
                table_name: "a".to_string(),
            },
            segment: Some(1),
            total_segments: Some(4),
        }
    )]
    fn test_scan(#[case] args: Scan, #[case] expected: ScanInput) {
        let actual = args.into_input(&schema()).unwrap();
        assert_eq!(actual, expected);
    }

    #[rstest]
    #[case::begins_with_on_key_and_attribute(
        Key::named("hashkey").begins_with("abc") & Attr::named("another_attr").begins_with("def"),
        "begins_with(#n2, :v3) AND begins_with(#n4, :v5)",
        &[("#n2", "hashkey"), ("#n4", "another_attr")],
        &[(":v3", "abc"), (":v5", "def")]
    )]
    #[case::begins_with_on_two_attributes(
        Attr::named("hashkey").begins_with("abc") & Attr::named("another_attr").begins_with("def"),
        "begins_with(#n2, :v3) AND begins_with(#n4, :v5)",
        &[("#n2", "hashkey"), ("#n4", "another_attr")],
        &[(":v3", "abc"), (":v5", "def")]
    )]
    fn test_filter_compile(
        #[case] filter: Query,
        #[case] expected_expression: &str,
        #[case] expected_names: &[(&str, &str)],
        #[case] expected_values: &[(&str, &str)],
    ) {
        let scan = Scan {
            filter: Some(filter),
            ..Default::default()
        };
        let actual = scan.into_input(&schema()).unwrap().multiple_read_operation;
        assert_eq!(actual.filter_expression.as_deref(), Some(expected_expression));
        let names = actual.expression_attribute_names.unwrap_or_default();
        for (placeholder, name) in expected_names {
            assert_eq!(names.get(*placeholder).map(String::as_str), Some(*name));
        }
        let expected_values: collections::HashMap<String, types::AttributeValue> = expected_values
            .iter()
            .map(|(placeholder, value)| {
                (
                    placeholder.to_string(),
                    types::AttributeValue::S(value.to_string()),
                )
            })
            .collect();
        assert_eq!(actual.expression_attribute_values, Some(expected_values));
    }

    #[test]
    fn test_key_only_filter_is_rejected() {
        let scan = Scan {
            filter: Some(Key::named("b").eq("x")),
            ..Default::default()
        };
        assert!(matches!(
            scan.into_input(&schema()),
            Err(Error::InvalidCondition(_))
        ));
    }
}
