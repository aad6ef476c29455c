//! Property-based tests for reducer construction and resolution laws

use async_trait::async_trait;
use datapoint_core::helpers::{constant, with_default};
use datapoint_core::{
    Accumulator, EntityRegistry, MiddlewareStack, NodeFactory, RequestOptions, Resolver, Source, TraceLog,
    Transport, TransportError,
};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

struct NoTransport;

#[async_trait]
impl Transport for NoTransport {
    async fn request(&self, _options: &RequestOptions) -> Result<Value, TransportError> {
        Err(TransportError::new("no transport"))
    }
}

/// Strategy for `$a.b` style paths
fn path_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,8}(\\.[a-z]{1,8}){0,2}".prop_map(|path| format!("${}", path))
}

/// Strategy for scalar JSON values
fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[a-z ]{0,12}".prop_map(Value::String),
    ]
}

/// Strategy for small JSON documents
fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<String, Value>>())),
        ]
    })
}

fn build(source: impl Into<Source>) -> datapoint_core::Reducer {
    NodeFactory::new().build(source).unwrap()
}

fn resolve_sync(source: impl Into<Source>, input: Value) -> Option<Value> {
    let registry = EntityRegistry::new();
    let middleware = MiddlewareStack::new();
    let traces = TraceLog::new();
    let resolver = Resolver::new(&registry, &middleware, &NoTransport, &traces);
    resolver
        .resolve_sync(&Accumulator::from_value(input), &build(source))
        .unwrap()
}

proptest! {
    #[test]
    fn prop_single_element_lists_collapse(path in path_strategy()) {
        let direct = build(path.as_str());
        prop_assert_eq!(build(json!([path.clone()])), direct.clone());
        prop_assert_eq!(build(Source::list(vec![Source::list(vec![path.as_str()])])), direct);
    }

    #[test]
    fn prop_pipe_strings_match_lists(first in path_strategy(), second in path_strategy()) {
        let piped = build(format!("{} | {}", first, second));
        let listed = build(json!([first, second]));
        prop_assert_eq!(piped, listed);
    }

    #[test]
    fn prop_with_default_only_replaces_undefined(value in value_strategy(), fallback in scalar_strategy()) {
        let present = resolve_sync(with_default("$a", fallback.clone()), json!({"a": value.clone()}));
        prop_assert_eq!(present, Some(value));

        let missing = resolve_sync(with_default("$a", fallback.clone()), json!({}));
        prop_assert_eq!(missing, Some(fallback));
    }

    #[test]
    fn prop_constants_ignore_input(value in value_strategy(), input in value_strategy()) {
        prop_assert_eq!(resolve_sync(constant(value.clone()), input), Some(value));
    }

    #[test]
    fn prop_identity_path_returns_input(input in value_strategy()) {
        prop_assert_eq!(resolve_sync("$", input.clone()), Some(input));
    }
}
