//! Error types for path expressions
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use thiserror::Error;

/// Path expression errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Parse errors during path parsing
    #[error("Parse error at position {position} in '{input}': {message}")]
    Parse {
        message: String,
        position: usize,
        input: String,
    },

    /// Syntax errors with detailed position information
    #[error("Syntax error at position {position} in '{input}': {message} (expected {}, found {found})", .expected.join(" or "))]
    Syntax {
        message: String,
        position: usize,
        input: String,
        expected: Vec<String>,
        found: String,
    },
}

impl PathError {
    pub fn parse(message: impl Into<String>, position: usize, input: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            position,
            input: input.into(),
        }
    }

    pub fn syntax(
        message: impl Into<String>,
        position: usize,
        input: impl Into<String>,
        expected: Vec<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::Syntax {
            message: message.into(),
            position,
            input: input.into(),
            expected,
            found: found.into(),
        }
    }

    pub fn position(&self) -> usize {
        match self {
            Self::Parse { position, .. } | Self::Syntax { position, .. } => *position,
        }
    }
}
