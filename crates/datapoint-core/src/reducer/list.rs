//! Pipelines: each step receives the previous step's output
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use super::{NodeFactory, NodeId, Reducer, ReducerKind, Resolver};
use crate::accumulator::Accumulator;
use crate::error::{Error, Result};
use crate::source::Source;
use serde_json::Value;

pub(crate) fn is_type(source: &Source) -> bool {
    matches!(source, Source::List(_))
}

pub(crate) fn create(factory: &mut NodeFactory<'_>, source: Source, id: NodeId) -> Result<ReducerKind> {
    let Source::List(items) = source else {
        return Err(Error::Internal {
            message: "pipeline created from a non-list source".to_string(),
        });
    };

    let steps = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| factory.create_child(item, id, &format!("[{}]", index)))
        .collect::<Result<Vec<_>>>()?;
    Ok(ReducerKind::Pipeline(steps))
}

pub(crate) fn resolve_sync(resolver: &Resolver<'_>, acc: &Accumulator, steps: &[Reducer]) -> Result<Option<Value>> {
    if steps.is_empty() {
        return Ok(None);
    }

    let mut current = acc.with_value(acc.value().cloned());
    for step in steps {
        let value = resolver.resolve_sync(&current, step)?;
        current = current.with_value(value);
    }
    Ok(current.into_value())
}

pub(crate) async fn resolve_async(
    resolver: &Resolver<'_>,
    acc: &Accumulator,
    steps: &[Reducer],
) -> Result<Option<Value>> {
    if steps.is_empty() {
        return Ok(None);
    }

    let mut current = acc.with_value(acc.value().cloned());
    for step in steps {
        let value = resolver.resolve(&current, step).await?;
        current = current.with_value(value);
    }
    Ok(current.into_value())
}
