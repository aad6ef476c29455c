//! Validation module for schema entities
//!
//! A [`SchemaValidator`] is compiled once, when the owning entity is
//! registered, and is then shared read-only by every resolution.
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

pub mod error;
pub mod schema;

pub use error::{ValidationError, ValidationResult, Violation};
pub use schema::{SchemaDraft, SchemaOptions, SchemaValidator};
