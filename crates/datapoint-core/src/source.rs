//! Raw pipeline descriptions
//!
//! A [`Source`] is what callers hand to the node factory: strings, lists,
//! object templates, closures, helper stubs or already-built reducers.
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use crate::accumulator::Accumulator;
use crate::reducer::Reducer;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Synchronous reducer body
pub type SyncFn = Arc<dyn Fn(&Accumulator) -> anyhow::Result<Value> + Send + Sync>;

/// Asynchronous reducer body
pub type AsyncFn =
    Arc<dyn Fn(Accumulator) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync>;

/// Body of a function reducer
#[derive(Clone)]
pub enum FunctionBody {
    Sync(SyncFn),
    Async(AsyncFn),
}

impl FunctionBody {
    pub fn is_async(&self) -> bool {
        matches!(self, FunctionBody::Async(_))
    }

    /// Identity comparison: two bodies are equal when they share a closure
    pub fn ptr_eq(&self, other: &FunctionBody) -> bool {
        match (self, other) {
            (FunctionBody::Sync(a), FunctionBody::Sync(b)) => Arc::ptr_eq(a, b),
            (FunctionBody::Async(a), FunctionBody::Async(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for FunctionBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionBody::Sync(_) => f.write_str("[Function]"),
            FunctionBody::Async(_) => f.write_str("[AsyncFunction]"),
        }
    }
}

/// Stubs produced by the helper constructors in [`crate::helpers`]
#[derive(Debug, Clone)]
pub enum HelperSource {
    Map(Source),
    Filter(Source),
    Find(Source),
    Parallel(Vec<Source>),
    Assign(Source),
    Pick(Vec<String>),
    Omit(Vec<String>),
    Constant(Value),
    WithDefault(Source, Value),
}

impl HelperSource {
    pub fn name(&self) -> &'static str {
        match self {
            HelperSource::Map(_) => "map",
            HelperSource::Filter(_) => "filter",
            HelperSource::Find(_) => "find",
            HelperSource::Parallel(_) => "parallel",
            HelperSource::Assign(_) => "assign",
            HelperSource::Pick(_) => "pick",
            HelperSource::Omit(_) => "omit",
            HelperSource::Constant(_) => "constant",
            HelperSource::WithDefault(..) => "withDefault",
        }
    }
}

/// Raw description of a reducer
#[derive(Debug, Clone)]
pub enum Source {
    /// JSON scalar; strings are parsed as paths, entity references or pipes
    Literal(Value),
    /// Explicit pipeline
    List(Vec<Source>),
    /// Object template (or entity spec), in declaration order
    Object(Vec<(String, Source)>),
    Function(FunctionBody),
    Helper(Box<HelperSource>),
    Node(Reducer),
}

impl Source {
    /// Synchronous function reducer
    pub fn function<F>(body: F) -> Self
    where
        F: Fn(&Accumulator) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Source::Function(FunctionBody::Sync(Arc::new(body)))
    }

    /// Asynchronous function reducer
    pub fn async_function<F, Fut>(body: F) -> Self
    where
        F: Fn(Accumulator) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        Source::Function(FunctionBody::Async(Arc::new(move |acc| body(acc).boxed())))
    }

    /// Object template from key/source pairs, keeping their order
    pub fn object<I, K, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<Source>,
    {
        Source::Object(
            entries
                .into_iter()
                .map(|(key, source)| (key.into(), source.into()))
                .collect(),
        )
    }

    /// Pipeline from a sequence of sources
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Source>,
    {
        Source::List(items.into_iter().map(Into::into).collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Source::Literal(Value::String(text)) => Some(text),
            _ => None,
        }
    }

    /// Entry of an object source
    pub fn get(&self, key: &str) -> Option<&Source> {
        match self {
            Source::Object(entries) => entries
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, source)| source),
            _ => None,
        }
    }

    /// Keys of an object source, in declaration order
    pub fn keys(&self) -> Vec<&str> {
        match self {
            Source::Object(entries) => entries.iter().map(|(key, _)| key.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    /// Plain JSON rendering, `None` when the source holds closures or nodes
    pub fn to_value(&self) -> Option<Value> {
        match self {
            Source::Literal(value) => Some(value.clone()),
            Source::List(items) => items
                .iter()
                .map(Source::to_value)
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
            Source::Object(entries) => entries
                .iter()
                .map(|(key, source)| source.to_value().map(|value| (key.clone(), value)))
                .collect::<Option<serde_json::Map<_, _>>>()
                .map(Value::Object),
            Source::Helper(helper) => match helper.as_ref() {
                HelperSource::Constant(value) => Some(value.clone()),
                _ => None,
            },
            Source::Function(_) | Source::Node(_) => None,
        }
    }

    /// Short human-readable rendering used in error messages
    pub fn describe(&self) -> String {
        match self {
            Source::Literal(value) => value.to_string(),
            Source::List(items) => format!(
                "[{}]",
                items.iter().map(Source::describe).collect::<Vec<_>>().join(", ")
            ),
            Source::Object(entries) => format!(
                "{{ {} }}",
                entries
                    .iter()
                    .map(|(key, source)| format!("{}: {}", key, source.describe()))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Source::Function(body) => format!("{:?}", body),
            Source::Helper(helper) => format!("{}(..)", helper.name()),
            Source::Node(node) => format!("[{}]", node.kind().name()),
        }
    }
}

impl From<Value> for Source {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Source::List(items.into_iter().map(Source::from).collect()),
            Value::Object(map) => Source::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Source::from(value)))
                    .collect(),
            ),
            scalar => Source::Literal(scalar),
        }
    }
}

impl From<&str> for Source {
    fn from(text: &str) -> Self {
        Source::Literal(Value::String(text.to_string()))
    }
}

impl From<String> for Source {
    fn from(text: String) -> Self {
        Source::Literal(Value::String(text))
    }
}

impl From<Reducer> for Source {
    fn from(node: Reducer) -> Self {
        Source::Node(node)
    }
}

impl From<HelperSource> for Source {
    fn from(helper: HelperSource) -> Self {
        Source::Helper(Box::new(helper))
    }
}

impl From<Vec<Source>> for Source {
    fn from(items: Vec<Source>) -> Self {
        Source::List(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_splits_containers() {
        let source = Source::from(json!({"a": "$a", "b": ["$b", "$c"]}));
        assert_eq!(source.keys(), vec!["a", "b"]);
        assert!(matches!(source.get("b"), Some(Source::List(items)) if items.len() == 2));
        assert_eq!(source.get("a").and_then(Source::as_str), Some("$a"));
    }

    #[test]
    fn test_to_value_round_trips_plain_json() {
        let value = json!({"select": [{"case": "$a"}], "n": 1});
        assert_eq!(Source::from(value.clone()).to_value(), Some(value));
        assert_eq!(Source::function(|_| Ok(json!(1))).to_value(), None);
    }

    #[test]
    fn test_describe() {
        let source = Source::list(vec![Source::from("$a"), Source::from(json!(12))]);
        assert_eq!(source.describe(), "[\"$a\", 12]");
        assert_eq!(Source::function(|_| Ok(json!(1))).describe(), "[Function]");
    }
}
