//! Schema entities: JSON Schema validation of the resolved value
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use crate::accumulator::Accumulator;
use crate::error::{Error, Result};
use crate::source::Source;
use datapoint_schemas::{SchemaOptions, SchemaValidator};
use serde_json::{json, Value};

#[derive(Debug)]
pub struct SchemaSpec {
    pub validator: SchemaValidator,
}

/// Compile the schema once, at registration
pub(crate) fn create(entity_id: &str, schema: Option<Source>, options: Option<Source>) -> Result<SchemaSpec> {
    let schema = plain_value(entity_id, "schema", schema)?;
    let options = plain_value(entity_id, "options", options)?;

    let invalid = |err: datapoint_schemas::ValidationError| Error::InvalidSchema {
        entity_id: entity_id.to_string(),
        message: err.to_string(),
    };
    let options = SchemaOptions::from_value(&options).map_err(invalid)?;
    let validator = SchemaValidator::compile(&schema, &options).map_err(invalid)?;

    Ok(SchemaSpec { validator })
}

fn plain_value(entity_id: &str, key: &str, source: Option<Source>) -> Result<Value> {
    match source {
        None => Ok(json!({})),
        Some(source) => source.to_value().ok_or_else(|| Error::InvalidSchema {
            entity_id: entity_id.to_string(),
            message: format!("{} must be plain JSON, found {}", key, source.describe()),
        }),
    }
}

/// Validate the current value, passing it through unchanged
pub(crate) fn resolve(acc: &Accumulator, spec: &SchemaSpec) -> Result<Option<Value>> {
    let instance = acc.value().cloned().unwrap_or(Value::Null);
    let violations = spec.validator.validate(&instance);
    if violations.is_empty() {
        return Ok(acc.value().cloned());
    }

    tracing::debug!(
        entity_id = acc.entity_id().unwrap_or_default(),
        violations = violations.len(),
        "schema validation failed"
    );
    Err(Error::SchemaViolation { violations })
}
