//! Compiled JSON Schema validator
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use crate::validation::error::{ValidationError, ValidationResult, Violation};
use jsonschema::{Draft, Validator};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// JSON Schema draft used to interpret a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaDraft {
    Draft4,
    Draft6,
    Draft7,
    Draft201909,
    Draft202012,
}

impl SchemaDraft {
    /// Parse a draft name such as `7`, `"draft7"` or `"2020-12"`
    pub fn parse(value: &Value) -> Option<Self> {
        let name = match value {
            Value::Number(number) => number.to_string(),
            Value::String(text) => text.to_lowercase().trim_start_matches("draft").to_string(),
            _ => return None,
        };

        match name.trim_start_matches('-') {
            "4" | "04" => Some(Self::Draft4),
            "6" | "06" => Some(Self::Draft6),
            "7" | "07" => Some(Self::Draft7),
            "2019" | "2019-09" => Some(Self::Draft201909),
            "2020" | "2020-12" => Some(Self::Draft202012),
            _ => None,
        }
    }

    fn to_jsonschema(self) -> Draft {
        match self {
            Self::Draft4 => Draft::Draft4,
            Self::Draft6 => Draft::Draft6,
            Self::Draft7 => Draft::Draft7,
            Self::Draft201909 => Draft::Draft201909,
            Self::Draft202012 => Draft::Draft202012,
        }
    }
}

/// Options controlling schema compilation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaOptions {
    /// Force a draft instead of detecting it from `$schema`
    pub draft: Option<SchemaDraft>,
    /// Treat `format` keywords as assertions
    pub validate_formats: bool,
}

impl SchemaOptions {
    /// Read options from an entity's `options` object
    ///
    /// Recognized keys are `draft` and `validateFormats` (alias `format`).
    /// Unknown keys are ignored.
    pub fn from_value(options: &Value) -> ValidationResult<Self> {
        let mut parsed = Self::default();
        let Some(map) = options.as_object() else {
            if options.is_null() {
                return Ok(parsed);
            }
            return Err(ValidationError::new("", "schema options must be an object"));
        };

        if let Some(draft) = map.get("draft") {
            parsed.draft = Some(SchemaDraft::parse(draft).ok_or_else(|| {
                ValidationError::new("/draft", format!("unsupported draft {}", draft))
            })?);
        }

        if let Some(flag) = map.get("validateFormats").or_else(|| map.get("format")) {
            parsed.validate_formats = flag.as_bool().unwrap_or(false);
        }

        Ok(parsed)
    }
}

/// A compiled schema that can validate any number of documents
#[derive(Clone)]
pub struct SchemaValidator {
    schema: Arc<Value>,
    compiled: Arc<Validator>,
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("schema", &self.schema)
            .finish()
    }
}

impl SchemaValidator {
    /// Compile `schema`, failing when the schema document is itself invalid
    pub fn compile(schema: &Value, options: &SchemaOptions) -> ValidationResult<Self> {
        let mut builder = jsonschema::options().should_validate_formats(options.validate_formats);
        if let Some(draft) = options.draft {
            builder = builder.with_draft(draft.to_jsonschema());
        }

        let compiled = builder
            .build(schema)
            .map_err(|err| ValidationError::new(err.instance_path.to_string(), err.to_string()))?;

        Ok(Self {
            schema: Arc::new(schema.clone()),
            compiled: Arc::new(compiled),
        })
    }

    /// The schema document this validator was compiled from
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    pub fn is_valid(&self, instance: &Value) -> bool {
        self.compiled.is_valid(instance)
    }

    /// Collect every violation of the schema, in the order they are reported
    pub fn validate(&self, instance: &Value) -> Vec<Violation> {
        self.compiled
            .iter_errors(instance)
            .map(|err| {
                Violation::new(
                    err.instance_path.to_string(),
                    err.schema_path.to_string(),
                    err.to_string(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_draft_parsing() {
        assert_eq!(SchemaDraft::parse(&json!(7)), Some(SchemaDraft::Draft7));
        assert_eq!(SchemaDraft::parse(&json!("draft4")), Some(SchemaDraft::Draft4));
        assert_eq!(SchemaDraft::parse(&json!("2020-12")), Some(SchemaDraft::Draft202012));
        assert_eq!(SchemaDraft::parse(&json!(5)), None);
        assert_eq!(SchemaDraft::parse(&json!(true)), None);
    }

    #[test]
    fn test_options_from_value() {
        let options = SchemaOptions::from_value(&json!({"draft": 7, "validateFormats": true})).unwrap();
        assert_eq!(options.draft, Some(SchemaDraft::Draft7));
        assert!(options.validate_formats);

        assert_eq!(SchemaOptions::from_value(&json!(null)).unwrap(), SchemaOptions::default());
        assert!(SchemaOptions::from_value(&json!({"draft": 3})).is_err());
        assert!(SchemaOptions::from_value(&json!("draft7")).is_err());
    }

    #[test]
    fn test_compile_and_validate() {
        let validator = SchemaValidator::compile(
            &json!({
                "type": "object",
                "properties": {"age": {"type": "number"}},
                "required": ["name"]
            }),
            &SchemaOptions::default(),
        )
        .unwrap();

        assert!(validator.is_valid(&json!({"name": "Luke", "age": 19})));

        let violations = validator.validate(&json!({"age": "old"}));
        assert_eq!(violations.len(), 2);
        assert!(violations.iter().any(|v| v.instance_path == "/age"));
    }

    #[test]
    fn test_invalid_schema_is_rejected() {
        let result = SchemaValidator::compile(&json!({"type": 12}), &SchemaOptions::default());
        assert!(result.is_err());
    }
}
