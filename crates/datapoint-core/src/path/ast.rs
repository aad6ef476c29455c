//! Path expression AST
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use serde_json::Value;
use std::fmt;

/// Where a path starts reading from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// `$...`: the accumulator's current value
    Value,
    /// `$..scope...`: the accumulator itself
    Accumulator,
}

/// One step of a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => write!(f, "{}", key),
            Segment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// Parsed path expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpression {
    pub scope: Scope,
    pub segments: Vec<Segment>,
    /// Trailing `[]`: map the accessor over an array
    pub is_collection: bool,
    raw: String,
}

impl PathExpression {
    pub fn new(scope: Scope, segments: Vec<Segment>, is_collection: bool, raw: impl Into<String>) -> Self {
        Self {
            scope,
            segments,
            is_collection,
            raw: raw.into(),
        }
    }

    /// The source text this expression was parsed from
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Lodash-style `get`: walk `segments` from `root`, `None` when any step is missing
pub fn get<'v>(root: &'v Value, segments: &[Segment]) -> Option<&'v Value> {
    segments.iter().try_fold(root, |current, segment| match (current, segment) {
        (Value::Object(map), Segment::Key(key)) => map.get(key),
        (Value::Object(map), Segment::Index(index)) => map.get(&index.to_string()),
        (Value::Array(items), Segment::Index(index)) => items.get(*index),
        (Value::Array(items), Segment::Key(key)) => {
            key.parse::<usize>().ok().and_then(|index| items.get(index))
        }
        _ => None,
    })
}
