//! The `DataPoint` context: registered entities, values, middleware and
//! transport, and the transform entry points
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use crate::accumulator::Accumulator;
use crate::config::DataPointConfig;
use crate::entity::EntityTypeFactory;
use crate::error::Result;
use crate::middleware::{Middleware, MiddlewareStack};
use crate::reducer::{DependencyTree, NodeFactory, Reducer, Resolver};
use crate::registry::EntityRegistry;
use crate::source::Source;
use crate::trace::{TraceLog, TraceRecord};
use crate::transport::{ReqwestTransport, Transport};
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::Arc;

/// Per-call options of a transform
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOptions {
    /// Available at `$..locals`
    pub locals: Value,
    /// Record a [`TraceRecord`] for every entity resolution
    pub trace: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            locals: json!({}),
            trace: false,
        }
    }
}

impl TransformOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locals(mut self, locals: Value) -> Self {
        self.locals = locals;
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}

/// Output of [`DataPoint::resolve`]
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// `None` when the pipeline resolved to undefined
    pub value: Option<Value>,
    pub traces: Vec<TraceRecord>,
}

/// Entry point for registering entities and running transforms
pub struct DataPoint {
    registry: EntityRegistry,
    middleware: MiddlewareStack,
    transport: Arc<dyn Transport>,
    values: Map<String, Value>,
    config: DataPointConfig,
}

impl fmt::Debug for DataPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataPoint")
            .field("entities", &self.registry.ids())
            .field("middleware", &self.middleware)
            .field("values", &self.values)
            .field("config", &self.config)
            .finish()
    }
}

impl DataPoint {
    /// Context with the default configuration and HTTP transport
    pub fn new() -> Result<Self> {
        Self::with_config(DataPointConfig::default())
    }

    pub fn with_config(config: DataPointConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.transport.clone())?;
        Ok(Self {
            registry: EntityRegistry::new(),
            middleware: MiddlewareStack::new(),
            transport: Arc::new(transport),
            values: config.values.clone(),
            config,
        })
    }

    /// Replace the transport used by request entities
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn config(&self) -> &DataPointConfig {
        &self.config
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Add a constant to the `$..values` scope
    pub fn add_value(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Register a batch of entities; the batch is rejected as a whole on error
    pub fn add_entities<I, K, S>(&mut self, entities: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<Source>,
    {
        self.registry.register_all(entities)
    }

    /// Add a custom entity type, usable by entities registered afterwards
    pub fn register_entity_type(&mut self, name: impl Into<String>, factory: Arc<dyn EntityTypeFactory>) -> Result<()> {
        self.registry.register_type(name, factory)
    }

    pub fn use_middleware(&mut self, name: impl Into<String>, middleware: Arc<dyn Middleware>) {
        self.middleware.use_middleware(name, middleware);
    }

    /// Build a reducer and check its entity references
    pub fn build(&self, source: impl Into<Source>) -> Result<Reducer> {
        let mut tree = DependencyTree::new();
        let reducer = NodeFactory::with_tree(&mut tree).build(source)?;
        self.registry.validate(&tree)?;
        Ok(reducer)
    }

    /// Resolve `source` against `input`, keeping trace records
    pub async fn resolve(
        &self,
        source: impl Into<Source>,
        input: Value,
        options: TransformOptions,
    ) -> Result<Resolution> {
        let reducer = self.build(source)?;
        let trace = options.trace || self.config.trace;
        let acc = Accumulator::new(Some(input), options.locals, Value::Object(self.values.clone()), trace);
        let traces = TraceLog::new();

        let value = {
            let resolver = Resolver::new(&self.registry, &self.middleware, &*self.transport, &traces);
            resolver.resolve(&acc, &reducer).await?
        };

        Ok(Resolution {
            value,
            traces: traces.into_records(),
        })
    }

    /// Resolve `source` against `input`; undefined becomes `null`
    pub async fn transform(
        &self,
        source: impl Into<Source>,
        input: Value,
        options: TransformOptions,
    ) -> Result<Value> {
        let resolution = self.resolve(source, input, options).await?;
        Ok(resolution.value.unwrap_or(Value::Null))
    }

    /// Blocking version of [`DataPoint::transform`]
    #[cfg(feature = "blocking")]
    pub fn transform_blocking(
        &self,
        source: impl Into<Source>,
        input: Value,
        options: TransformOptions,
    ) -> Result<Value> {
        // Creates a runtime per call; prefer the async API inside async code.
        let runtime = tokio::runtime::Runtime::new().map_err(|e| crate::error::Error::Configuration {
            message: format!("Failed to create runtime: {}", e),
            source: Some(e.into()),
        })?;

        runtime.block_on(self.transform(source, input, options))
    }
}
