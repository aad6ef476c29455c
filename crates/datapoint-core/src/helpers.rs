//! Reducer helper constructors
//!
//! Each function returns a [`Source`] stub that the node factory turns into
//! the matching helper node.
//!
//! ```
//! use datapoint_core::helpers::{filter, map, with_default};
//! use datapoint_core::Source;
//!
//! let names = Source::list(vec![
//!     filter("$active"),
//!     map(with_default("$name", serde_json::json!("anonymous"))),
//! ]);
//! # let _ = names;
//! ```
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use crate::source::{HelperSource, Source};
use serde_json::Value;

/// Resolve `reducer` once per element of an array value
pub fn map(reducer: impl Into<Source>) -> Source {
    HelperSource::Map(reducer.into()).into()
}

/// Keep the elements for which `reducer` is truthy
pub fn filter(reducer: impl Into<Source>) -> Source {
    HelperSource::Filter(reducer.into()).into()
}

/// First element for which `reducer` is truthy, undefined when none is
pub fn find(reducer: impl Into<Source>) -> Source {
    HelperSource::Find(reducer.into()).into()
}

/// Resolve every branch against the same input, collecting the results
pub fn parallel<I, S>(branches: I) -> Source
where
    I: IntoIterator<Item = S>,
    S: Into<Source>,
{
    HelperSource::Parallel(branches.into_iter().map(Into::into).collect()).into()
}

/// Shallow-merge the resolved object over the current value
pub fn assign(reducer: impl Into<Source>) -> Source {
    HelperSource::Assign(reducer.into()).into()
}

pub fn pick<I, S>(keys: I) -> Source
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    HelperSource::Pick(keys.into_iter().map(Into::into).collect()).into()
}

pub fn omit<I, S>(keys: I) -> Source
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    HelperSource::Omit(keys.into_iter().map(Into::into).collect()).into()
}

/// A literal value, never interpreted as a path or reference
pub fn constant(value: Value) -> Source {
    HelperSource::Constant(value).into()
}

/// Substitute `fallback` when `reducer` resolves to undefined
pub fn with_default(reducer: impl Into<Source>, fallback: Value) -> Source {
    HelperSource::WithDefault(reducer.into(), fallback).into()
}
