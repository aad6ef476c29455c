//! Helper reducers: collection combinators, parallel branches, shallow merge,
//! key selection, constants and defaults
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use super::{NodeFactory, NodeId, Reducer, ReducerKind, Resolver};
use crate::accumulator::Accumulator;
use crate::error::{Error, Result};
use crate::path::ast::{get, Segment};
use crate::source::{HelperSource, Source};
use crate::value::{collect_positional, expect_array, is_truthy, set_path, type_name};
use futures::future::join_all;
use serde_json::{Map, Value};

pub(crate) fn is_type(source: &Source) -> bool {
    matches!(source, Source::Helper(_))
}

pub(crate) fn create(factory: &mut NodeFactory<'_>, source: Source, id: NodeId) -> Result<ReducerKind> {
    let Source::Helper(helper) = source else {
        return Err(Error::Internal {
            message: "helper reducer created from a non-helper source".to_string(),
        });
    };

    Ok(match *helper {
        HelperSource::Map(inner) => ReducerKind::Map(factory.create_child(inner, id, "map")?),
        HelperSource::Filter(inner) => ReducerKind::Filter(factory.create_child(inner, id, "filter")?),
        HelperSource::Find(inner) => ReducerKind::Find(factory.create_child(inner, id, "find")?),
        HelperSource::Assign(inner) => ReducerKind::Assign(factory.create_child(inner, id, "assign")?),
        HelperSource::Parallel(branches) => ReducerKind::Parallel(
            branches
                .into_iter()
                .enumerate()
                .map(|(index, branch)| factory.create_child(branch, id, &format!("[{}]", index)))
                .collect::<Result<Vec<_>>>()?,
        ),
        HelperSource::Pick(keys) => ReducerKind::Pick(keys),
        HelperSource::Omit(keys) => ReducerKind::Omit(keys),
        HelperSource::Constant(value) => ReducerKind::Constant(value),
        HelperSource::WithDefault(inner, fallback) => ReducerKind::WithDefault {
            inner: factory.create_child(inner, id, "withDefault")?,
            fallback,
        },
    })
}

pub(crate) fn map_sync(resolver: &Resolver<'_>, acc: &Accumulator, inner: &Reducer) -> Result<Option<Value>> {
    let items = expect_array(acc.value(), "map")?;
    let mapped = collect_positional(
        items
            .iter()
            .map(|item| resolver.resolve_sync(&acc.with_value(Some(item.clone())), inner)),
    )?;
    Ok(Some(Value::Array(mapped)))
}

pub(crate) async fn map_async(resolver: &Resolver<'_>, acc: &Accumulator, inner: &Reducer) -> Result<Option<Value>> {
    let items = expect_array(acc.value(), "map")?;
    let accumulators = per_item(acc, items);
    let results = join_all(accumulators.iter().map(|item_acc| resolver.resolve(item_acc, inner))).await;
    Ok(Some(Value::Array(collect_positional(results)?)))
}

pub(crate) fn filter_sync(resolver: &Resolver<'_>, acc: &Accumulator, inner: &Reducer) -> Result<Option<Value>> {
    let items = expect_array(acc.value(), "filter")?;
    let mut kept = Vec::new();
    for item in items {
        let verdict = resolver.resolve_sync(&acc.with_value(Some(item.clone())), inner)?;
        if is_truthy(verdict.as_ref()) {
            kept.push(item.clone());
        }
    }
    Ok(Some(Value::Array(kept)))
}

pub(crate) async fn filter_async(
    resolver: &Resolver<'_>,
    acc: &Accumulator,
    inner: &Reducer,
) -> Result<Option<Value>> {
    let items = expect_array(acc.value(), "filter")?;
    let accumulators = per_item(acc, items);
    let verdicts = join_all(accumulators.iter().map(|item_acc| resolver.resolve(item_acc, inner))).await;

    let mut kept = Vec::new();
    for (item, verdict) in items.iter().zip(verdicts) {
        if is_truthy(verdict?.as_ref()) {
            kept.push(item.clone());
        }
    }
    Ok(Some(Value::Array(kept)))
}

pub(crate) fn find_sync(resolver: &Resolver<'_>, acc: &Accumulator, inner: &Reducer) -> Result<Option<Value>> {
    let items = expect_array(acc.value(), "find")?;
    for item in items {
        let verdict = resolver.resolve_sync(&acc.with_value(Some(item.clone())), inner)?;
        if is_truthy(verdict.as_ref()) {
            return Ok(Some(item.clone()));
        }
    }
    Ok(None)
}

/// Sequential: stops testing at the first match
pub(crate) async fn find_async(resolver: &Resolver<'_>, acc: &Accumulator, inner: &Reducer) -> Result<Option<Value>> {
    let items = expect_array(acc.value(), "find")?;
    for item in items {
        let item_acc = acc.with_value(Some(item.clone()));
        if is_truthy(resolver.resolve(&item_acc, inner).await?.as_ref()) {
            return Ok(Some(item.clone()));
        }
    }
    Ok(None)
}

pub(crate) fn parallel_sync(
    resolver: &Resolver<'_>,
    acc: &Accumulator,
    branches: &[Reducer],
) -> Result<Option<Value>> {
    let results = collect_positional(branches.iter().map(|branch| resolver.resolve_sync(acc, branch)))?;
    Ok(Some(Value::Array(results)))
}

pub(crate) async fn parallel_async(
    resolver: &Resolver<'_>,
    acc: &Accumulator,
    branches: &[Reducer],
) -> Result<Option<Value>> {
    let results = join_all(branches.iter().map(|branch| resolver.resolve(acc, branch))).await;
    Ok(Some(Value::Array(collect_positional(results)?)))
}

/// Shallow merge of `resolved` over the current value
pub(crate) fn assign(acc: &Accumulator, resolved: Option<Value>) -> Result<Option<Value>> {
    let mut merged = match acc.value() {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };

    match resolved {
        None | Some(Value::Null) => {}
        Some(Value::Object(extra)) => merged.extend(extra),
        Some(other) => {
            return Err(Error::reducer(format!(
                "assign expected an object but received {}",
                type_name(Some(&other))
            )))
        }
    }
    Ok(Some(Value::Object(merged)))
}

fn key_path(key: &str) -> Vec<String> {
    key.split('.').map(str::to_string).collect()
}

/// Copy of the listed (possibly dotted) keys, `{}` for non-objects
pub(crate) fn pick(value: Option<&Value>, keys: &[String]) -> Value {
    let mut picked = Map::new();
    if let Some(source @ Value::Object(_)) = value {
        for key in keys {
            let path = key_path(key);
            let segments: Vec<Segment> = path.iter().cloned().map(Segment::Key).collect();
            if let Some(found) = get(source, &segments) {
                set_path(&mut picked, &path, found.clone());
            }
        }
    }
    Value::Object(picked)
}

/// Copy without the listed (possibly dotted) keys, `{}` for non-objects
pub(crate) fn omit(value: Option<&Value>, keys: &[String]) -> Value {
    let Some(Value::Object(map)) = value else {
        return Value::Object(Map::new());
    };

    let mut remaining = map.clone();
    for key in keys {
        remove_path(&mut remaining, &key_path(key));
    }
    Value::Object(remaining)
}

fn remove_path(target: &mut Map<String, Value>, path: &[String]) {
    match path {
        [] => {}
        [last] => {
            *target = std::mem::take(target)
                .into_iter()
                .filter(|(key, _)| key != last)
                .collect();
        }
        [first, rest @ ..] => {
            if let Some(Value::Object(nested)) = target.get_mut(first) {
                remove_path(nested, rest);
            }
        }
    }
}

fn per_item(acc: &Accumulator, items: &[Value]) -> Vec<Accumulator> {
    items.iter().map(|item| acc.with_value(Some(item.clone()))).collect()
}

#[cfg(test)]
mod tests {
    use crate::helpers::{assign, constant, filter, find, map, omit, parallel, pick, with_default};
    use crate::source::Source;
    use crate::test_support::{resolve, resolve_sync};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn add(n: i64) -> Source {
        Source::function(move |acc| Ok(json!(acc.value().and_then(Value::as_i64).unwrap_or(0) + n)))
    }

    fn is_even() -> Source {
        Source::function(|acc| Ok(json!(acc.value().and_then(Value::as_i64).unwrap_or(1) % 2 == 0)))
    }

    #[test]
    fn test_map_filter_find() {
        assert_eq!(resolve_sync(map(add(1)), json!([1, 2, 3])).unwrap(), Some(json!([2, 3, 4])));
        assert_eq!(resolve_sync(filter(is_even()), json!([1, 2, 3, 4])).unwrap(), Some(json!([2, 4])));
        assert_eq!(resolve_sync(find(is_even()), json!([1, 3, 4, 6])).unwrap(), Some(json!(4)));
        assert_eq!(resolve_sync(find(is_even()), json!([1, 3])).unwrap(), None);
        assert_eq!(resolve_sync(find(is_even()), json!([])).unwrap(), None);
    }

    #[test]
    fn test_combinators_require_arrays() {
        let err = resolve_sync(map(add(1)), json!({"a": 1})).unwrap_err();
        assert_eq!(err.to_string(), "map expected an array but received object");
        assert!(resolve_sync(filter(is_even()), json!(null)).is_err());
    }

    #[test]
    fn test_map_with_path_maps_missing_to_null() {
        let output = resolve_sync(map("$name"), json!([{"name": "a"}, {}])).unwrap();
        assert_eq!(output, Some(json!(["a", null])));
    }

    #[tokio::test]
    async fn test_async_map_keeps_positions() {
        let slow_double = Source::async_function(|acc| async move {
            let n = acc.value().and_then(Value::as_u64).unwrap_or(0);
            tokio::time::sleep(std::time::Duration::from_millis(30 - n * 10)).await;
            Ok(json!(n * 2))
        });
        assert_eq!(resolve(map(slow_double), json!([0, 1, 2])).await.unwrap(), Some(json!([0, 2, 4])));
    }

    #[tokio::test]
    async fn test_async_find_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let predicate = Source::async_function(move |acc| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(json!(acc.value() == Some(&json!("b"))))
            }
        });

        let found = resolve(find(predicate), json!(["a", "b", "c", "d"])).await.unwrap();
        assert_eq!(found, Some(json!("b")));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_find_on_empty_array_skips_predicate() {
        let calls = Arc::new(AtomicUsize::new(0));
        let sync_counter = Arc::clone(&calls);
        let sync_predicate = Source::function(move |_| {
            sync_counter.fetch_add(1, Ordering::SeqCst);
            Ok(json!(true))
        });
        let async_counter = Arc::clone(&calls);
        let async_predicate = Source::async_function(move |_| {
            let counter = Arc::clone(&async_counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(json!(true))
            }
        });

        assert_eq!(resolve_sync(find(sync_predicate), json!([])).unwrap(), None);
        assert_eq!(resolve(find(async_predicate), json!([])).await.unwrap(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_parallel_shares_input() {
        let output = resolve(
            parallel(vec![Source::from("$a"), add(1), Source::async_function(|_| async { Ok(json!("x")) })]),
            json!({"a": 5}),
        )
        .await
        .unwrap();
        assert_eq!(output, Some(json!([5, 1, "x"])));
    }

    #[test]
    fn test_assign_merges_shallowly() {
        let output = resolve_sync(assign(json!({"b": "$a", "c": {"d": "$a"}})), json!({"a": 1, "b": 0})).unwrap();
        assert_eq!(output, Some(json!({"a": 1, "b": 1, "c": {"d": 1}})));

        let err = resolve_sync(assign("$a"), json!({"a": 1})).unwrap_err();
        assert_eq!(err.to_string(), "assign expected an object but received number");
    }

    #[test]
    fn test_pick_and_omit() {
        let input = json!({"a": 1, "b": {"c": 2, "d": 3}, "e": 4});
        assert_eq!(resolve_sync(pick(["a", "b.c", "zz"]), input.clone()).unwrap(), Some(json!({"a": 1, "b": {"c": 2}})));
        assert_eq!(resolve_sync(omit(["e", "b.d"]), input).unwrap(), Some(json!({"a": 1, "b": {"c": 2}})));
        assert_eq!(resolve_sync(pick(["a"]), json!([1])).unwrap(), Some(json!({})));
        assert_eq!(resolve_sync(omit(["a"]), json!("text")).unwrap(), Some(json!({})));
    }

    #[test]
    fn test_constant_and_default() {
        assert_eq!(resolve_sync(constant(json!({"k": "$a"})), json!({"a": 1})).unwrap(), Some(json!({"k": "$a"})));
        assert_eq!(resolve_sync(with_default("$missing", json!("x")), json!({})).unwrap(), Some(json!("x")));
        assert_eq!(resolve_sync(with_default("$a", json!("x")), json!({"a": null})).unwrap(), Some(Value::Null));
        assert_eq!(resolve_sync(with_default("$a", json!("x")), json!({"a": false})).unwrap(), Some(json!(false)));
    }

    #[test]
    fn test_default_does_not_swallow_errors() {
        let failing = Source::function(|_| Err(anyhow::anyhow!("broken")));
        assert!(resolve_sync(with_default(failing, json!(1)), json!({})).is_err());
    }
}
