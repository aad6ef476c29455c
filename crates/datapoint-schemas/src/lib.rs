//! DataPoint Schemas - JSON Schema validation for schema entities
//!
//! This crate compiles JSON Schema documents with `jsonschema` and reports
//! every failure as a [`Violation`] so that callers can render them in their
//! own error format.
//!
//! ## Quick Start
//!
//! ```rust
//! use datapoint_schemas::{SchemaOptions, SchemaValidator};
//! use serde_json::json;
//!
//! let validator = SchemaValidator::compile(
//!     &json!({"type": "object", "required": ["name"]}),
//!     &SchemaOptions::default(),
//! )
//! .unwrap();
//!
//! assert!(validator.is_valid(&json!({"name": "Luke"})));
//! assert_eq!(validator.validate(&json!({})).len(), 1);
//! ```
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

pub mod validation;

pub use validation::{
    SchemaDraft, SchemaOptions, SchemaValidator, ValidationError, ValidationResult, Violation,
};
