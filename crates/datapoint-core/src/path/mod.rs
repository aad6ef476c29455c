//! Path expressions
//!
//! A path is a string that starts with `$` and reads from the accumulator:
//!
//! - `$` / `$.`: the whole current value
//! - `$a.b[0]`: nested lookup in the current value, undefined when missing
//! - `$a.b[]`: the lookup mapped over every element of the current array
//! - `$..locals.a`: lookup in an accumulator scope (`value`, `locals`,
//!   `params`, `initialValue`, `values`, `url`, `options`, `euid`, `entityId`)
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

pub mod ast;
pub mod error;
pub mod parser;


pub use ast::{PathExpression, Scope, Segment};
pub use error::PathError;
pub use parser::Parser;

use crate::accumulator::Accumulator;
use serde_json::Value;

/// Parse a path expression
pub fn parse(input: &str) -> Result<PathExpression, PathError> {
    Parser::new(input)?.parse()
}

impl PathExpression {
    /// Evaluate the path against an accumulator
    ///
    /// Returns `None` (undefined) when any step of the lookup is missing.
    pub fn resolve(&self, acc: &Accumulator) -> Option<Value> {
        match self.scope {
            Scope::Value => self.select(acc.value()?, &self.segments),
            Scope::Accumulator => match self.segments.split_first() {
                None => self.select(&acc.to_value(), &[]),
                Some((Segment::Key(name), rest)) => {
                    let base = acc.scope(name)?;
                    self.select(&base, rest)
                }
                Some((Segment::Index(_), _)) => None,
            },
        }
    }

    fn select(&self, base: &Value, segments: &[Segment]) -> Option<Value> {
        if !self.is_collection {
            return ast::get(base, segments).cloned();
        }

        let items = base.as_array()?;
        Some(Value::Array(
            items
                .iter()
                .map(|item| ast::get(item, segments).cloned().unwrap_or(Value::Null))
                .collect(),
        ))
    }
}
