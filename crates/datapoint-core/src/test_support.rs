//! Shared helpers for unit tests
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use crate::accumulator::Accumulator;
use crate::error::Result;
use crate::middleware::MiddlewareStack;
use crate::reducer::{NodeFactory, Reducer, Resolver};
use crate::registry::EntityRegistry;
use crate::source::Source;
use crate::trace::TraceLog;
use crate::transport::{RequestOptions, Transport, TransportError};
use async_trait::async_trait;
use serde_json::Value;

/// Transport that refuses every request
pub(crate) struct OfflineTransport;

#[async_trait]
impl Transport for OfflineTransport {
    async fn request(&self, options: &RequestOptions) -> std::result::Result<Value, TransportError> {
        Err(TransportError::new(format!("offline: {}", options.url)))
    }
}

/// Resolve a sync reducer against `value` with empty scopes
pub(crate) fn resolve_sync_reducer(reducer: &Reducer, value: Value) -> Result<Option<Value>> {
    let registry = EntityRegistry::new();
    let middleware = MiddlewareStack::new();
    let traces = TraceLog::new();
    let resolver = Resolver::new(&registry, &middleware, &OfflineTransport, &traces);
    resolver.resolve_sync(&Accumulator::from_value(value), reducer)
}

/// Build `source` and resolve it on the sync path
pub(crate) fn resolve_sync(source: impl Into<Source>, value: Value) -> Result<Option<Value>> {
    let reducer = NodeFactory::new().build(source)?;
    resolve_sync_reducer(&reducer, value)
}

/// Build `source` and resolve it on the async path
pub(crate) async fn resolve(source: impl Into<Source>, value: Value) -> Result<Option<Value>> {
    let reducer = NodeFactory::new().build(source)?;
    let registry = EntityRegistry::new();
    let middleware = MiddlewareStack::new();
    let traces = TraceLog::new();
    let resolver = Resolver::new(&registry, &middleware, &OfflineTransport, &traces);
    let acc = Accumulator::from_value(value);
    resolver.resolve(&acc, &reducer).await
}
