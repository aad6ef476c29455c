//! Object template reducers
//!
//! Nested plain objects are walked recursively. Leaves built with
//! `constant(..)` and empty objects are folded into a constant sub-object
//! that is cloned for every resolution. Every other leaf becomes an
//! assignment of a computed value at its key path.
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use super::{Assignment, NodeFactory, NodeId, ObjectTemplate, ReducerKind, Resolver};
use crate::accumulator::Accumulator;
use crate::error::{Error, Result};
use crate::source::{HelperSource, Source};
use crate::value::set_path;
use futures::future::join_all;
use serde_json::{Map, Value};

pub(crate) fn is_type(source: &Source) -> bool {
    matches!(source, Source::Object(_))
}

pub(crate) fn create(factory: &mut NodeFactory<'_>, source: Source, id: NodeId) -> Result<ReducerKind> {
    let Source::Object(entries) = source else {
        return Err(Error::Internal {
            message: "object template created from a non-object source".to_string(),
        });
    };

    let mut template = ObjectTemplate::default();
    collect(factory, id, entries, &mut Vec::new(), &mut template)?;
    Ok(ReducerKind::Object(template))
}

fn collect(
    factory: &mut NodeFactory<'_>,
    id: NodeId,
    entries: Vec<(String, Source)>,
    stack: &mut Vec<String>,
    template: &mut ObjectTemplate,
) -> Result<()> {
    for (key, source) in entries {
        stack.push(key);
        match source {
            Source::Object(nested) if nested.is_empty() => {
                set_path(&mut template.constants, stack, Value::Object(Map::new()));
            }
            Source::Object(nested) => collect(factory, id, nested, stack, template)?,
            Source::Helper(helper) => match *helper {
                HelperSource::Constant(value) => set_path(&mut template.constants, stack, value),
                other => assign(factory, id, Source::Helper(Box::new(other)), stack, template)?,
            },
            other => assign(factory, id, other, stack, template)?,
        }
        stack.pop();
    }
    Ok(())
}

fn assign(
    factory: &mut NodeFactory<'_>,
    id: NodeId,
    source: Source,
    stack: &[String],
    template: &mut ObjectTemplate,
) -> Result<()> {
    let reducer = factory.create_child(source, id, &stack.join("."))?;
    match reducer.kind() {
        ReducerKind::Constant(value) => set_path(&mut template.constants, stack, value.clone()),
        _ => template.assignments.push(Assignment {
            path: stack.to_vec(),
            reducer,
        }),
    }
    Ok(())
}

pub(crate) fn resolve_sync(
    resolver: &Resolver<'_>,
    acc: &Accumulator,
    template: &ObjectTemplate,
) -> Result<Option<Value>> {
    let mut output = template.constants.clone();
    for assignment in &template.assignments {
        if let Some(value) = resolver.resolve_sync(acc, &assignment.reducer)? {
            set_path(&mut output, &assignment.path, value);
        }
    }
    Ok(Some(Value::Object(output)))
}

/// Resolve every assignment concurrently, then write them in declaration order
pub(crate) async fn resolve_async(
    resolver: &Resolver<'_>,
    acc: &Accumulator,
    template: &ObjectTemplate,
) -> Result<Option<Value>> {
    let results = join_all(
        template
            .assignments
            .iter()
            .map(|assignment| resolver.resolve(acc, &assignment.reducer)),
    )
    .await;

    let mut output = template.constants.clone();
    for (assignment, result) in template.assignments.iter().zip(results) {
        if let Some(value) = result? {
            set_path(&mut output, &assignment.path, value);
        }
    }
    Ok(Some(Value::Object(output)))
}
