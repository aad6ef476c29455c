//! Accumulator: the per-step evaluation context
//!
//! An accumulator is never mutated once handed to a reducer. Every change
//! produces a derived copy that shares the read-only scopes through `Arc`.
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use serde_json::{json, Map, Value};
use std::borrow::Cow;
use std::sync::Arc;

/// Evaluation context passed to every reducer
#[derive(Debug, Clone)]
pub struct Accumulator {
    value: Option<Value>,
    locals: Arc<Value>,
    values: Arc<Value>,
    params: Arc<Value>,
    initial_value: Option<Arc<Value>>,
    trace: bool,
    url: Option<String>,
    options: Option<Arc<Value>>,
    euid: Option<String>,
    entity_id: Option<Arc<str>>,
}

impl Accumulator {
    /// Create the root accumulator for a transform
    pub fn new(value: Option<Value>, locals: Value, values: Value, trace: bool) -> Self {
        Self {
            initial_value: value.clone().map(Arc::new),
            value,
            locals: Arc::new(locals),
            values: Arc::new(values),
            params: Arc::new(Value::Object(Map::new())),
            trace,
            url: None,
            options: None,
            euid: None,
            entity_id: None,
        }
    }

    /// Accumulator holding `value` with empty scopes
    pub fn from_value(value: Value) -> Self {
        Self::new(Some(value), json!({}), json!({}), false)
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Option<Value> {
        self.value
    }

    pub fn locals(&self) -> &Value {
        &self.locals
    }

    pub fn values(&self) -> &Value {
        &self.values
    }

    /// Params of the entity currently being resolved, `{}` outside entities
    pub fn params(&self) -> &Value {
        &self.params
    }

    pub fn initial_value(&self) -> Option<&Value> {
        self.initial_value.as_deref()
    }

    pub fn trace(&self) -> bool {
        self.trace
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn options(&self) -> Option<&Value> {
        self.options.as_deref()
    }

    pub fn euid(&self) -> Option<&str> {
        self.euid.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Copy of this accumulator holding a different value
    pub fn with_value(&self, value: Option<Value>) -> Self {
        Self {
            value,
            locals: Arc::clone(&self.locals),
            values: Arc::clone(&self.values),
            params: Arc::clone(&self.params),
            initial_value: self.initial_value.clone(),
            trace: self.trace,
            url: self.url.clone(),
            options: self.options.clone(),
            euid: self.euid.clone(),
            entity_id: self.entity_id.clone(),
        }
    }

    pub fn with_locals(mut self, locals: Value) -> Self {
        self.locals = Arc::new(locals);
        self
    }

    pub(crate) fn with_entity(mut self, entity_id: &str, params: Arc<Value>) -> Self {
        self.entity_id = Some(Arc::from(entity_id));
        self.params = params;
        self.url = None;
        self.options = None;
        self
    }

    pub(crate) fn with_euid(mut self, euid: String) -> Self {
        self.euid = Some(euid);
        self
    }

    pub(crate) fn with_url(mut self, url: String) -> Self {
        self.url = Some(url);
        self
    }

    pub(crate) fn with_options(mut self, options: Value) -> Self {
        self.options = Some(Arc::new(options));
        self
    }

    /// Look up a named scope for `$..scope` paths
    pub fn scope(&self, name: &str) -> Option<Cow<'_, Value>> {
        match name {
            "value" => self.value.as_ref().map(Cow::Borrowed),
            "locals" => Some(Cow::Borrowed(&*self.locals)),
            "values" => Some(Cow::Borrowed(&*self.values)),
            "params" => Some(Cow::Borrowed(&*self.params)),
            "initialValue" => self.initial_value.as_deref().map(Cow::Borrowed),
            "options" => self.options.as_deref().map(Cow::Borrowed),
            "url" => self.url.clone().map(|url| Cow::Owned(Value::String(url))),
            "euid" => self.euid.clone().map(|euid| Cow::Owned(Value::String(euid))),
            "entityId" => self
                .entity_id
                .as_deref()
                .map(|id| Cow::Owned(Value::String(id.to_string()))),
            _ => None,
        }
    }

    /// Snapshot of every defined scope as a JSON object
    pub fn to_value(&self) -> Value {
        const SCOPES: [&str; 9] = [
            "value",
            "locals",
            "values",
            "params",
            "initialValue",
            "url",
            "options",
            "euid",
            "entityId",
        ];

        let mut snapshot = Map::new();
        for name in SCOPES {
            if let Some(scope) = self.scope(name) {
                snapshot.insert(name.to_string(), scope.into_owned());
            }
        }
        Value::Object(snapshot)
    }
}
