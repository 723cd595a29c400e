//! Read operations for retrieving typed models from DynamoDB tables.
//!
//! Every read requests only the attributes declared on the model and decodes
//! the returned items into it:
//! - Getting individual items by primary key
//! - Querying items with a key condition and an optional filter
//! - Scanning a table or index with an optional filter
//! - Listing table names

/// Common utilities and types for read operations.
pub mod common;

/// Get item operation for retrieving a single item by primary key.
pub mod get_item;

/// List tables operation.
pub mod list_tables;

/// Query operation for retrieving items with key conditions.
pub mod query;

/// Scan operation for retrieving every item of a table or index.
pub mod scan;
