//! Write operations for modifying data in DynamoDB tables.
//!
//! Each write accepts an optional condition; a failed condition resolves to
//! [`common::WriteOutcome::NotApplied`] instead of an error.

/// Common utilities and types for write operations.
pub mod common;

/// Delete item operation for removing items from tables.
pub mod delete_item;

/// Put item operation for creating or replacing items.
pub mod put_item;

/// Update item operation for modifying existing items.
pub mod update_item;
