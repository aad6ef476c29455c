//! Shared test support utilities for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use datapoint_core::{Accumulator, DataPoint, Flow, Middleware, RequestOptions, Transport, TransportError};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Transport answering from a fixed table keyed by URL
#[derive(Default)]
pub struct MockTransport {
    responses: HashMap<String, Result<Value, TransportError>>,
    requests: Mutex<Vec<RequestOptions>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, url: &str, body: Value) -> Self {
        self.responses.insert(url.to_string(), Ok(body));
        self
    }

    pub fn fail(mut self, url: &str, status_code: u16, message: &str) -> Self {
        self.responses.insert(
            url.to_string(),
            Err(TransportError {
                status_code: Some(status_code),
                message: message.to_string(),
                body: None,
            }),
        );
        self
    }

    /// Every request seen so far, in arrival order
    pub fn requests(&self) -> Vec<RequestOptions> {
        self.requests.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|request| request.url).collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, options: &RequestOptions) -> Result<Value, TransportError> {
        self.requests.lock().unwrap().push(options.clone());
        let url = options.resolved_url()?.to_string();
        match self.responses.get(&url) {
            Some(response) => response.clone(),
            None => Err(TransportError {
                status_code: Some(404),
                message: format!("404 - no mock for {}", url),
                body: None,
            }),
        }
    }
}

/// Middleware that records the hook name and entity id it ran for
pub struct RecordingMiddleware {
    pub hook: String,
    pub calls: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Middleware for RecordingMiddleware {
    async fn handle(&self, acc: Accumulator) -> anyhow::Result<Flow> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", self.hook, acc.entity_id().unwrap_or("-")));
        Ok(Flow::Continue(acc))
    }
}

/// Register a recording middleware on every given hook, sharing one log
pub fn record_hooks(dp: &mut DataPoint, hooks: &[&str]) -> Arc<Mutex<Vec<String>>> {
    let calls = Arc::new(Mutex::new(Vec::new()));
    for hook in hooks {
        dp.use_middleware(
            *hook,
            Arc::new(RecordingMiddleware {
                hook: hook.to_string(),
                calls: Arc::clone(&calls),
            }),
        );
    }
    calls
}

/// DataPoint wired to `transport`
pub fn datapoint_with(transport: Arc<MockTransport>) -> DataPoint {
    DataPoint::new().unwrap().with_transport(transport)
}

/// Star Wars API fixtures used by the request scenarios
pub fn swapi_transport() -> MockTransport {
    MockTransport::new()
        .respond(
            "https://swapi.test/api/people/1/",
            json!({"name": "Luke Skywalker", "birth_year": "19BBY", "height": "172"}),
        )
        .respond(
            "https://swapi.test/api/people/20/",
            json!({"name": "Yoda", "birth_year": "896BBY", "height": "66"}),
        )
}
