//! DataPoint Core - reducer resolution engine for declarative data shaping
//!
//! Pipelines are described as strings, lists, object templates, closures or
//! helper stubs, compiled once into an immutable reducer tree and evaluated
//! against an input value.
//!
//! # Main Components
//!
//! - **Node factory**: normalizes and classifies pipeline sources into [`Reducer`] nodes
//! - **Resolver**: evaluates reducer trees, sync subtrees without futures
//! - **Entities**: named pipelines with a fixed lifecycle, middleware and error handling
//! - **Custom types**: user-defined entity types registered with `DataPoint::register_entity_type`
//! - **Registry**: batch registration with dangling-reference validation
//! - **Transport**: pluggable HTTP layer for request entities
//!
//! # Example
//!
//! ```no_run
//! use datapoint_core::{helpers, DataPoint, Result, TransformOptions};
//! use serde_json::json;
//!
//! async fn example() -> Result<()> {
//!     let mut dp = DataPoint::new()?;
//!     dp.add_entities([("model:person", json!({"value": {"name": "$name"}}))])?;
//!
//!     let names = dp
//!         .transform(
//!             helpers::map("model:person | $name"),
//!             json!([{"name": "Luke"}, {"name": "Yoda"}]),
//!             TransformOptions::default(),
//!         )
//!         .await?;
//!     assert_eq!(names, json!(["Luke", "Yoda"]));
//!     Ok(())
//! }
//! ```
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

pub mod accumulator;
pub mod config;
pub mod datapoint;
pub mod entity;
pub mod error;
pub mod helpers;
pub mod middleware;
pub mod path;
pub mod reducer;
pub mod registry;
pub mod source;
pub mod trace;
pub mod transport;
pub mod value;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main types for convenience
pub use accumulator::Accumulator;
pub use config::{DataPointConfig, TransportConfig};
pub use datapoint::{DataPoint, Resolution, TransformOptions};
pub use entity::{CustomSpec, Entity, EntityCore, EntityKind, EntityType, EntityTypeFactory, EntityTypes};
pub use error::{Error, Result};
pub use middleware::{Flow, Middleware, MiddlewareStack};
pub use reducer::{NodeFactory, Reducer, ReducerKind, ReducerNode, Resolver};
pub use registry::EntityRegistry;
pub use source::{FunctionBody, HelperSource, Source};
pub use trace::{TraceLog, TraceRecord};
pub use transport::{ReqwestTransport, RequestOptions, Transport, TransportError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
