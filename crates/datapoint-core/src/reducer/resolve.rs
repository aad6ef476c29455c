//! Reducer evaluator
//!
//! [`Resolver::resolve_sync`] evaluates subtrees flagged as sync without
//! creating any futures. [`Resolver::resolve`] checks the flag first and only
//! falls back to the boxed async dispatch for subtrees that may suspend.
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use super::{entity, function, helpers, list, object, Reducer, ReducerKind};
use crate::accumulator::Accumulator;
use crate::error::{Error, Result};
use crate::middleware::MiddlewareStack;
use crate::registry::EntityRegistry;
use crate::source::FunctionBody;
use crate::trace::TraceLog;
use crate::transport::Transport;
use futures::future::{self, BoxFuture};
use futures::FutureExt;
use serde_json::Value;

/// Read-only view of everything a resolution needs
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    registry: &'a EntityRegistry,
    middleware: &'a MiddlewareStack,
    transport: &'a dyn Transport,
    traces: &'a TraceLog,
}

impl<'a> Resolver<'a> {
    pub fn new(
        registry: &'a EntityRegistry,
        middleware: &'a MiddlewareStack,
        transport: &'a dyn Transport,
        traces: &'a TraceLog,
    ) -> Self {
        Self {
            registry,
            middleware,
            transport,
            traces,
        }
    }

    pub fn registry(&self) -> &'a EntityRegistry {
        self.registry
    }

    pub fn middleware(&self) -> &'a MiddlewareStack {
        self.middleware
    }

    pub fn transport(&self) -> &'a dyn Transport {
        self.transport
    }

    pub fn traces(&self) -> &'a TraceLog {
        self.traces
    }

    /// Evaluate a sync subtree
    pub fn resolve_sync(&self, acc: &Accumulator, reducer: &Reducer) -> Result<Option<Value>> {
        match reducer.kind() {
            ReducerKind::Path(expression) => Ok(expression.resolve(acc)),
            ReducerKind::Constant(value) => Ok(Some(value.clone())),
            ReducerKind::Function(FunctionBody::Sync(body)) => function::call_sync(body, acc),
            ReducerKind::Pipeline(steps) => list::resolve_sync(self, acc, steps),
            ReducerKind::Object(template) => object::resolve_sync(self, acc, template),
            ReducerKind::Map(inner) => helpers::map_sync(self, acc, inner),
            ReducerKind::Filter(inner) => helpers::filter_sync(self, acc, inner),
            ReducerKind::Find(inner) => helpers::find_sync(self, acc, inner),
            ReducerKind::Parallel(branches) => helpers::parallel_sync(self, acc, branches),
            ReducerKind::Assign(inner) => helpers::assign(acc, self.resolve_sync(acc, inner)?),
            ReducerKind::Pick(keys) => Ok(Some(helpers::pick(acc.value(), keys))),
            ReducerKind::Omit(keys) => Ok(Some(helpers::omit(acc.value(), keys))),
            ReducerKind::WithDefault { inner, fallback } => Ok(self
                .resolve_sync(acc, inner)?
                .or_else(|| Some(fallback.clone()))),
            ReducerKind::Function(FunctionBody::Async(_)) | ReducerKind::Entity(_) => Err(Error::Internal {
                message: format!(
                    "{} {} cannot be resolved synchronously",
                    reducer.kind().name(),
                    reducer.id()
                ),
            }),
        }
    }

    /// Evaluate any subtree
    pub fn resolve<'r>(
        &'r self,
        acc: &'r Accumulator,
        reducer: &'r Reducer,
    ) -> BoxFuture<'r, Result<Option<Value>>> {
        if reducer.is_sync() {
            return future::ready(self.resolve_sync(acc, reducer)).boxed();
        }

        async move {
            match reducer.kind() {
                ReducerKind::Function(body) => function::call(body, acc).await,
                ReducerKind::Entity(reference) => entity::resolve(self, acc, reference).await,
                ReducerKind::Pipeline(steps) => list::resolve_async(self, acc, steps).await,
                ReducerKind::Object(template) => object::resolve_async(self, acc, template).await,
                ReducerKind::Map(inner) => helpers::map_async(self, acc, inner).await,
                ReducerKind::Filter(inner) => helpers::filter_async(self, acc, inner).await,
                ReducerKind::Find(inner) => helpers::find_async(self, acc, inner).await,
                ReducerKind::Parallel(branches) => helpers::parallel_async(self, acc, branches).await,
                ReducerKind::Assign(inner) => {
                    let resolved = self.resolve(acc, inner).await?;
                    helpers::assign(acc, resolved)
                }
                ReducerKind::WithDefault { inner, fallback } => Ok(self
                    .resolve(acc, inner)
                    .await?
                    .or_else(|| Some(fallback.clone()))),
                ReducerKind::Path(_)
                | ReducerKind::Constant(_)
                | ReducerKind::Pick(_)
                | ReducerKind::Omit(_) => self.resolve_sync(acc, reducer),
            }
        }
        .boxed()
    }

    /// Evaluate an optional slot; an absent slot passes the value through
    pub fn resolve_optional<'r>(
        &'r self,
        acc: &'r Accumulator,
        reducer: Option<&'r Reducer>,
    ) -> BoxFuture<'r, Result<Option<Value>>> {
        match reducer {
            Some(reducer) => self.resolve(acc, reducer),
            None => future::ready(Ok(acc.value().cloned())).boxed(),
        }
    }
}
