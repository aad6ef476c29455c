//! Validation error types for schema entities
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A single schema violation found in a validated document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// JSON pointer to the offending part of the document ("" for the root)
    pub instance_path: String,
    /// JSON pointer to the schema keyword that failed
    pub schema_path: String,
    /// Human-readable description of the failure
    pub message: String,
}

impl Violation {
    pub fn new<I, S, M>(instance_path: I, schema_path: S, message: M) -> Self
    where
        I: Into<String>,
        S: Into<String>,
        M: Into<String>,
    {
        Self {
            instance_path: instance_path.into(),
            schema_path: schema_path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} {}", self.instance_path, self.message)
        }
    }
}

/// Error raised when a schema document itself cannot be compiled
#[derive(Debug, Error, Serialize, Deserialize)]
pub struct ValidationError {
    /// JSON pointer inside the schema where compilation failed
    pub path: String,
    /// Human-readable error message
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "Invalid schema: {}", self.message)
        } else {
            write!(f, "Invalid schema at '{}': {}", self.path, self.message)
        }
    }
}

impl ValidationError {
    pub fn new<P, M>(path: P, message: M) -> Self
    where
        P: Into<String>,
        M: Into<String>,
    {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_display() {
        let violation = Violation::new("/age", "/properties/age/type", "\"x\" is not of type \"number\"");
        assert_eq!(violation.to_string(), "/age \"x\" is not of type \"number\"");

        let root = Violation::new("", "/required", "\"name\" is a required property");
        assert_eq!(root.to_string(), "\"name\" is a required property");
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("/properties/a", "unknown type");
        assert_eq!(err.to_string(), "Invalid schema at '/properties/a': unknown type");
        assert_eq!(ValidationError::new("", "boom").to_string(), "Invalid schema: boom");
    }
}
