//! Entities
//!
//! An entity is a named, registered pipeline with a fixed lifecycle around a
//! type-specific core. Entities are parsed once from their spec by
//! [`factory::create_entity`] and shared read-only afterwards.
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

pub(crate) mod collection;
pub mod compose;
pub(crate) mod control;
pub mod custom;
pub mod factory;
pub(crate) mod hash;
pub(crate) mod request;
pub(crate) mod resolve;
pub(crate) mod schema;
pub(crate) mod type_check;

pub use control::{Case, ControlSpec};
pub use custom::{CustomCore, CustomSpec, EntityCore, EntityTypeFactory, EntityTypes};
pub use hash::HashModifier;
pub use request::RequestSpec;
pub use schema::SchemaSpec;

use crate::reducer::Reducer;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Keys every entity spec (other than transforms) accepts
pub const BASE_KEYS: [&str; 7] = ["before", "value", "after", "error", "params", "inputType", "outputType"];

/// Entity types, named by the prefix of their ids
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityType {
    Reducer,
    Transform,
    Entry,
    Model,
    Hash,
    Collection,
    Request,
    Source,
    Control,
    Schema,
    /// Registered through [`EntityTypes::register`]
    Custom(Arc<str>),
}

impl EntityType {
    /// Parse a built-in type name
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "reducer" => EntityType::Reducer,
            "transform" => EntityType::Transform,
            "entry" => EntityType::Entry,
            "model" => EntityType::Model,
            "hash" => EntityType::Hash,
            "collection" => EntityType::Collection,
            "request" => EntityType::Request,
            "source" => EntityType::Source,
            "control" => EntityType::Control,
            "schema" => EntityType::Schema,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            EntityType::Reducer => "reducer",
            EntityType::Transform => "transform",
            EntityType::Entry => "entry",
            EntityType::Model => "model",
            EntityType::Hash => "hash",
            EntityType::Collection => "collection",
            EntityType::Request => "request",
            EntityType::Source => "source",
            EntityType::Control => "control",
            EntityType::Schema => "schema",
            EntityType::Custom(name) => &**name,
        }
    }

    /// Spec keys accepted on top of [`BASE_KEYS`]
    ///
    /// Custom types validate their own keys.
    pub fn type_keys(&self) -> &'static [&'static str] {
        match self {
            EntityType::Reducer | EntityType::Transform | EntityType::Entry | EntityType::Model => &[],
            EntityType::Hash => &["omitKeys", "pickKeys", "mapKeys", "addValues", "addKeys", "compose"],
            EntityType::Collection => &["filter", "map", "find", "compose"],
            EntityType::Request | EntityType::Source => &["url", "options"],
            EntityType::Control => &["select"],
            EntityType::Schema => &["schema", "options"],
            EntityType::Custom(_) => &[],
        }
    }

    /// Whether the whole spec is the `value` pipeline
    pub fn is_transform(&self) -> bool {
        matches!(self, EntityType::Reducer | EntityType::Transform)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-specific data of an entity
#[derive(Debug)]
pub enum EntityKind {
    Transform,
    /// Defaults an undefined or null input to `{}`
    Entry,
    Hash(Vec<HashModifier>),
    /// Compose pipeline built from `filter`, `map` and `find`
    Collection(Option<Reducer>),
    Request(RequestSpec),
    Control(ControlSpec),
    Schema(SchemaSpec),
    Custom(CustomCore),
}

/// A registered entity
#[derive(Debug)]
pub struct Entity {
    /// `type:name`
    pub id: String,
    pub entity_type: EntityType,
    pub name: String,
    pub before: Option<Reducer>,
    pub value: Option<Reducer>,
    pub after: Option<Reducer>,
    pub error: Option<Reducer>,
    pub input_type: Option<Reducer>,
    pub output_type: Option<Reducer>,
    pub params: Arc<Value>,
    pub kind: EntityKind,
}

impl Entity {
    /// Whether a non-empty `error` pipeline is defined
    pub fn handles_errors(&self) -> bool {
        self.error.as_ref().is_some_and(|error| !error.is_empty_pipeline())
    }

    /// Whether `params.trace` asks for timing records
    pub fn traces(&self) -> bool {
        self.params.get("trace") == Some(&Value::Bool(true))
    }

    /// Whether `params.inspect` asks for request logging
    pub fn inspects(&self) -> bool {
        crate::value::is_truthy(self.params.get("inspect"))
    }
}
