//! Middleware hooks
//!
//! Hooks are registered under a name (`before`, `after`, `<type>:before`,
//! `<type>:after`) and run in registration order around every entity
//! resolution. A hook may replace the accumulator handed to the next stage or
//! resolve the entity outright with [`Flow::Resolve`].
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use crate::accumulator::Accumulator;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Outcome of a middleware hook
#[derive(Debug, Clone)]
pub enum Flow {
    /// Continue with this accumulator
    Continue(Accumulator),
    /// Stop the lifecycle; this value is the entity's output
    Resolve(Value),
}

#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, acc: Accumulator) -> anyhow::Result<Flow>;
}

/// Adapter turning a closure into a [`Middleware`]
pub struct FnMiddleware<F>(pub F);

#[async_trait]
impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(Accumulator) -> anyhow::Result<Flow> + Send + Sync,
{
    async fn handle(&self, acc: Accumulator) -> anyhow::Result<Flow> {
        (self.0)(acc)
    }
}

/// Wrap a closure as a shareable middleware
pub fn from_fn<F>(hook: F) -> Arc<dyn Middleware>
where
    F: Fn(Accumulator) -> anyhow::Result<Flow> + Send + Sync + 'static,
{
    Arc::new(FnMiddleware(hook))
}

/// Named middleware hooks
#[derive(Default, Clone)]
pub struct MiddlewareStack {
    hooks: HashMap<String, Vec<Arc<dyn Middleware>>>,
}

impl fmt::Debug for MiddlewareStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<&str, usize> = self
            .hooks
            .iter()
            .map(|(name, hooks)| (name.as_str(), hooks.len()))
            .collect();
        f.debug_struct("MiddlewareStack").field("hooks", &counts).finish()
    }
}

impl MiddlewareStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook under `name`
    pub fn use_middleware(&mut self, name: impl Into<String>, middleware: Arc<dyn Middleware>) {
        self.hooks.entry(name.into()).or_default().push(middleware);
    }

    pub fn clear(&mut self) {
        self.hooks.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every hook registered under `name`, stopping at the first
    /// [`Flow::Resolve`]
    pub async fn run(&self, name: &str, acc: Accumulator) -> Result<Flow> {
        let Some(hooks) = self.hooks.get(name) else {
            return Ok(Flow::Continue(acc));
        };

        let mut current = acc;
        for hook in hooks {
            match hook.handle(current).await {
                Ok(Flow::Continue(next)) => current = next,
                Ok(Flow::Resolve(value)) => {
                    tracing::debug!(hook = name, "middleware resolved the entity");
                    return Ok(Flow::Resolve(value));
                }
                Err(err) => {
                    return Err(match err.downcast::<Error>() {
                        Ok(inner) => inner,
                        Err(err) => Error::Middleware {
                            hook: name.to_string(),
                            message: err.to_string(),
                            source: err,
                        },
                    })
                }
            }
        }
        Ok(Flow::Continue(current))
    }
}
