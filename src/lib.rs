#![deny(missing_docs)]

//! # DynamoDB Model
//!
//! Typed data models and composable condition and update expressions for Amazon DynamoDB.
//!
//! ## Overview
//!
//! This library sits on top of `aws-sdk-dynamodb` and:
//! - Maps serde structs to items through an explicit schema of `Key` and `Attr` declarations
//! - Builds condition, filter, key condition, projection and update expressions from
//!   operator-style code instead of strings
//! - Allocates every `#name` and `:value` placeholder, so expressions never collide
//! - Splits a query into its key half and its filter half automatically
//! - Follows pagination and decodes items back into the model
//!
//! ## Quick Example
//!
//! ```no_run
//! use aws_sdk_dynamodb::Client;
//! use dynamodb_model::{
//!     common::{
//!         attribute::{Attr, Key},
//!         key::PrimaryKey,
//!     },
//!     model::{self, Model, schema::SchemaBuilder},
//!     write,
//! };
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Deserialize, Serialize)]
//! struct User {
//!     id: String,
//!     visits: i64,
//!     tags: Vec<String>,
//! }
//!
//! impl Model for User {
//!     fn define() -> SchemaBuilder {
//!         SchemaBuilder::new("users")
//!             .key("id", Key::new())
//!             .attr("visits", Attr::new())
//!             .attr("tags", Attr::new())
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let client = Client::from_conf(aws_sdk_dynamodb::config::Config::builder().build());
//! let visits = model::attr::<User>("visits")?;
//! let tags = model::attr::<User>("tags")?;
//! let update_item = write::update_item::UpdateItem {
//!     key: PrimaryKey::partition("1"),
//!     update: visits.set(visits.if_not_exists(0).plus(1)) & tags.add(vec!["new"]),
//!     write_args: write::common::WriteArgs {
//!         condition: Some(model::key::<User>("id")?.exists()),
//!         ..Default::default()
//!     },
//! };
//! // SET #n0 = if_not_exists(#n1, :v2) + :v3 ADD #n4 :v5, conditioned on attribute_exists(#n6)
//! let updated = update_item.send::<User>(&client).await?;
//! # let _ = updated;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`mod@common`] - Expression building blocks: attributes, values, conditions, keys
//! - [`mod@model`] - Model schemas, the registry and dynamic records
//! - [`mod@read`] - Read operations (GetItem, Query, Scan, ListTables)
//! - [`mod@write`] - Write operations (PutItem, UpdateItem, DeleteItem)
//! - [`mod@error`] - The crate error type

/// Common utilities for attributes, values, conditions, keys and projections.
pub mod common;

/// Errors raised while defining models or building expressions.
pub mod error;

/// Typed models and their schemas.
pub mod model;

/// Read operations for retrieving data from DynamoDB tables.
pub mod read;

/// Write operations for modifying data in DynamoDB tables.
pub mod write;
