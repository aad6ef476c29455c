//! Entity lifecycle resolution
//!
//! Every entity resolves through the same seven stages:
//!
//! 1. middleware `before`
//! 2. middleware `<type>:before`
//! 3. `inputType` check, then the entity's `before` pipeline
//! 4. the type-specific core
//! 5. the entity's `after` pipeline, then the `outputType` check
//! 6. middleware `<type>:after`
//! 7. middleware `after`
//!
//! A middleware returning [`Flow::Resolve`] ends the lifecycle early. Any
//! failure is annotated with the entity id and offered to the entity's
//! `error` pipeline before it propagates.
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use super::{collection, control, hash, request, schema, Entity, EntityKind};
use crate::accumulator::Accumulator;
use crate::error::{Error, Result};
use crate::middleware::Flow;
use crate::reducer::{EntityReference, Reducer, Resolver};
use crate::trace::TraceRecord;
use crate::value::{collect_positional, is_empty_conditional};
use futures::future::join_all;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Resolve an entity reference node against the current accumulator
pub(crate) async fn resolve_reference(
    resolver: &Resolver<'_>,
    acc: &Accumulator,
    reference: &EntityReference,
) -> Result<Option<Value>> {
    if reference.empty_conditional && is_empty_conditional(acc.value()) {
        return Ok(acc.value().cloned());
    }

    let entity = resolver
        .registry()
        .get(&reference.id)
        .ok_or_else(|| Error::EntityNotDefined {
            id: reference.id.clone(),
        })?;

    let items = match acc.value() {
        Some(Value::Array(items)) if reference.is_collection => items,
        _ => return resolve_entity(resolver, acc, entity).await,
    };

    let results = join_all(items.iter().map(|item| {
        let item_acc = acc.with_value(Some(item.clone()));
        async move {
            if reference.empty_conditional && is_empty_conditional(item_acc.value()) {
                return Ok(item_acc.into_value());
            }
            resolve_entity(resolver, &item_acc, entity).await
        }
    }))
    .await;

    collect_positional(results).map(|values| Some(Value::Array(values)))
}

/// Resolve one entity invocation, with tracing and error handling
pub(crate) async fn resolve_entity(
    resolver: &Resolver<'_>,
    acc: &Accumulator,
    entity: &Arc<Entity>,
) -> Result<Option<Value>> {
    let mut current = acc.clone().with_entity(&entity.id, Arc::clone(&entity.params));
    let trace = acc.trace() || entity.traces();
    let started = Instant::now();
    if trace {
        current = current.with_euid(Uuid::new_v4().to_string());
    }

    tracing::debug!(entity_id = %entity.id, euid = ?current.euid(), "resolving entity");

    let outcome = match run_lifecycle(resolver, current.clone(), entity).await {
        Ok(value) => Ok(value),
        Err(err) => {
            let err = err.annotate(&entity.id);
            match entity.error.as_ref() {
                Some(handler) if entity.handles_errors() => {
                    tracing::debug!(entity_id = %entity.id, error = %err, "resolving error pipeline");
                    resolver.resolve(&current.with_value(Some(err.to_value())), handler).await
                }
                _ => Err(err),
            }
        }
    };

    if trace {
        if let Some(euid) = current.euid() {
            resolver.traces().record(TraceRecord {
                entity_id: entity.id.clone(),
                euid: euid.to_string(),
                duration: started.elapsed(),
            });
        }
    }

    tracing::debug!(entity_id = %entity.id, ok = outcome.is_ok(), "resolved entity");
    outcome
}

async fn run_lifecycle(resolver: &Resolver<'_>, acc: Accumulator, entity: &Entity) -> Result<Option<Value>> {
    let entity_type = entity.entity_type.as_str();
    let mut acc = acc;

    for hook in ["before".to_string(), format!("{}:before", entity_type)] {
        match resolver.middleware().run(&hook, acc).await? {
            Flow::Continue(next) => acc = next,
            Flow::Resolve(value) => return Ok(Some(value)),
        }
    }

    check(resolver, &acc, entity.input_type.as_ref()).await?;
    let acc = step(resolver, acc, entity.before.as_ref()).await?;
    let value = resolve_core(resolver, &acc, entity).await?;
    let acc = step(resolver, acc.with_value(value), entity.after.as_ref()).await?;
    check(resolver, &acc, entity.output_type.as_ref()).await?;

    let mut acc = acc;
    for hook in [format!("{}:after", entity_type), "after".to_string()] {
        match resolver.middleware().run(&hook, acc).await? {
            Flow::Continue(next) => acc = next,
            Flow::Resolve(value) => return Ok(Some(value)),
        }
    }

    Ok(acc.into_value())
}

/// Resolve an optional lifecycle pipeline into the next accumulator
async fn step(resolver: &Resolver<'_>, acc: Accumulator, reducer: Option<&Reducer>) -> Result<Accumulator> {
    match reducer {
        Some(reducer) => {
            let value = resolver.resolve(&acc, reducer).await?;
            Ok(acc.with_value(value))
        }
        None => Ok(acc),
    }
}

/// Run a type check; its result is discarded
async fn check(resolver: &Resolver<'_>, acc: &Accumulator, reducer: Option<&Reducer>) -> Result<()> {
    if let Some(reducer) = reducer {
        resolver.resolve(acc, reducer).await?;
    }
    Ok(())
}

async fn resolve_core(resolver: &Resolver<'_>, acc: &Accumulator, entity: &Entity) -> Result<Option<Value>> {
    let input = match (&entity.kind, acc.value()) {
        (EntityKind::Entry, None | Some(Value::Null)) => acc.with_value(Some(json!({}))),
        _ => acc.clone(),
    };
    let value = resolver.resolve_optional(&input, entity.value.as_ref()).await?;

    match &entity.kind {
        EntityKind::Transform | EntityKind::Entry => Ok(value),
        EntityKind::Hash(modifiers) => hash::resolve(resolver, &acc.with_value(value), &entity.id, modifiers).await,
        EntityKind::Collection(compose) => {
            collection::resolve(resolver, &acc.with_value(value), &entity.id, compose.as_ref()).await
        }
        EntityKind::Request(spec) => {
            request::resolve(resolver, &acc.with_value(value), &entity.id, spec, entity.inspects()).await
        }
        EntityKind::Control(spec) => control::resolve(resolver, &acc.with_value(value), spec).await,
        EntityKind::Schema(spec) => schema::resolve(&acc.with_value(value), spec),
        EntityKind::Custom(core) => core.0.resolve(resolver, &acc.with_value(value)).await,
    }
}
