//! User-defined entity types
//!
//! A custom type supplies an [`EntityTypeFactory`] that turns the spec keys
//! left over by the lifecycle slots into an [`EntityCore`]. Custom entities run
//! through the same lifecycle as built-in ones, including the
//! `<type>:before` and `<type>:after` middleware hooks.
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use super::compose::take;
use super::EntityType;
use crate::accumulator::Accumulator;
use crate::error::{Error, Result};
use crate::reducer::entity::parse_reference;
use crate::reducer::{NodeFactory, Parent, Reducer, Resolver};
use crate::source::Source;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Type-specific core stage of a custom entity
#[async_trait]
pub trait EntityCore: Send + Sync {
    /// Resolve the core stage; `acc` holds the output of the `value` stage
    async fn resolve(&self, resolver: &Resolver<'_>, acc: &Accumulator) -> Result<Option<Value>>;
}

/// Builds the core of a custom entity at registration time
pub trait EntityTypeFactory: Send + Sync {
    fn create(&self, spec: &mut CustomSpec<'_, '_>) -> Result<Arc<dyn EntityCore>>;
}

/// Spec keys of a custom entity that the lifecycle did not consume
pub struct CustomSpec<'a, 't> {
    factory: &'a mut NodeFactory<'t>,
    entity_id: &'a str,
    entries: Vec<(String, Source)>,
}

impl<'a, 't> CustomSpec<'a, 't> {
    pub(crate) fn new(factory: &'a mut NodeFactory<'t>, entity_id: &'a str, entries: Vec<(String, Source)>) -> Self {
        Self {
            factory,
            entity_id,
            entries,
        }
    }

    pub fn entity_id(&self) -> &str {
        self.entity_id
    }

    /// Remaining keys, in declaration order
    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|(key, _)| key.as_str()).collect()
    }

    /// Remove a key and return its raw source
    pub fn take(&mut self, key: &str) -> Option<Source> {
        take(&mut self.entries, key)
    }

    /// Remove a key and build it as a reducer slot of the entity
    pub fn reducer(&mut self, key: &str) -> Result<Option<Reducer>> {
        let Some(source) = take(&mut self.entries, key) else {
            return Ok(None);
        };
        self.factory
            .create(source, Parent::Entity(self.entity_id.to_string()), key)
            .map(Some)
    }

    /// Remove a key holding plain JSON
    pub fn value(&mut self, key: &str) -> Option<Value> {
        take(&mut self.entries, key).and_then(|source| source.to_value())
    }

    pub(crate) fn into_remaining(self) -> Vec<(String, Source)> {
        self.entries
    }
}

/// Core of a custom entity as stored on the entity
#[derive(Clone)]
pub struct CustomCore(pub Arc<dyn EntityCore>);

impl fmt::Debug for CustomCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomCore(..)")
    }
}

/// Custom entity types, keyed by the id prefix they claim
#[derive(Clone, Default)]
pub struct EntityTypes {
    factories: HashMap<String, Arc<dyn EntityTypeFactory>>,
}

impl fmt::Debug for EntityTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort_unstable();
        f.debug_struct("EntityTypes").field("custom", &names).finish()
    }
}

impl EntityTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a custom type; built-in and already registered names are rejected
    pub fn register(&mut self, name: impl Into<String>, factory: Arc<dyn EntityTypeFactory>) -> Result<()> {
        let name = name.into();
        let well_formed = parse_reference(&format!("{}:entity", name))
            .is_some_and(|reference| reference.entity_type == name && !reference.empty_conditional);
        if !well_formed {
            return Err(Error::Configuration {
                message: format!("'{}' is not a valid entity type name", name),
                source: None,
            });
        }

        if EntityType::parse(&name).is_some() || self.factories.contains_key(&name) {
            return Err(Error::DuplicateEntityType { name });
        }

        tracing::debug!(entity_type = %name, "registered entity type");
        self.factories.insert(name, factory);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn EntityTypeFactory>> {
        self.factories.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Resolve a type name against the built-in and custom types
    pub fn lookup(&self, name: &str) -> Option<EntityType> {
        EntityType::parse(name).or_else(|| {
            self.factories
                .contains_key(name)
                .then(|| EntityType::Custom(Arc::from(name)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Passthrough;

    #[async_trait]
    impl EntityCore for Passthrough {
        async fn resolve(&self, _resolver: &Resolver<'_>, acc: &Accumulator) -> Result<Option<Value>> {
            Ok(acc.value().cloned())
        }
    }

    struct PassthroughType;

    impl EntityTypeFactory for PassthroughType {
        fn create(&self, _spec: &mut CustomSpec<'_, '_>) -> Result<Arc<dyn EntityCore>> {
            Ok(Arc::new(Passthrough))
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut types = EntityTypes::new();
        types.register("widget", Arc::new(PassthroughType)).unwrap();

        assert_eq!(types.lookup("widget"), Some(EntityType::Custom(Arc::from("widget"))));
        assert_eq!(types.lookup("model"), Some(EntityType::Model));
        assert_eq!(types.lookup("gadget"), None);
    }

    #[test]
    fn test_rejected_names() {
        let mut types = EntityTypes::new();
        types.register("widget", Arc::new(PassthroughType)).unwrap();

        let err = types.register("widget", Arc::new(PassthroughType)).unwrap_err();
        assert_eq!(err.to_string(), "Entity type 'widget' already exists");
        assert!(matches!(
            types.register("hash", Arc::new(PassthroughType)),
            Err(Error::DuplicateEntityType { .. })
        ));
        assert!(types.register("not valid", Arc::new(PassthroughType)).is_err());
    }
}
