//! Entity registry and dependency validation
//!
//! Entities are registered in batches. A batch is parsed into staged copies
//! of the registry and its dependency side-table, every entity reference
//! recorded in the staged table is checked against the staged registry, and
//! only then is the batch committed. A failing batch leaves the registry as
//! it was, and references between entities of the same batch are allowed.
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use crate::entity::factory::create_entity;
use crate::entity::{Entity, EntityTypeFactory, EntityTypes};
use crate::error::{Error, Result};
use crate::reducer::{DependencyTree, NodeFactory};
use crate::source::Source;
use std::collections::HashMap;
use std::sync::Arc;

/// Registered entities, keyed by `type:name`
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: HashMap<String, Arc<Entity>>,
    tree: DependencyTree,
    types: EntityTypes,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Entity>> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Registered ids, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.entities.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Side-table of every node built for the registered entities
    pub fn tree(&self) -> &DependencyTree {
        &self.tree
    }

    /// Custom entity types known to this registry
    pub fn types(&self) -> &EntityTypes {
        &self.types
    }

    /// Add a custom entity type; entities of that type can be registered afterwards
    pub fn register_type(&mut self, name: impl Into<String>, factory: Arc<dyn EntityTypeFactory>) -> Result<()> {
        self.types.register(name, factory)
    }

    /// Register a single entity
    pub fn register(&mut self, id: impl Into<String>, spec: impl Into<Source>) -> Result<()> {
        self.register_all([(id.into(), spec.into())])
    }

    /// Register a batch of entities atomically
    pub fn register_all<I, K, S>(&mut self, batch: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<Source>,
    {
        let mut entities = self.entities.clone();
        let mut tree = self.tree.clone();

        {
            let mut factory = NodeFactory::with_tree(&mut tree);
            for (id, spec) in batch {
                let id = id.into();
                if entities.contains_key(&id) {
                    return Err(Error::DuplicateEntity { id });
                }
                let entity = create_entity(&mut factory, &self.types, &id, spec)?;
                tracing::debug!(entity_id = %id, "staged entity");
                entities.insert(id, Arc::new(entity));
            }
        }

        validate(&entities, &tree)?;
        self.entities = entities;
        self.tree = tree;
        Ok(())
    }

    /// Check that every entity reference in `tree` names a registered entity
    pub fn validate(&self, tree: &DependencyTree) -> Result<()> {
        validate(&self.entities, tree)
    }
}

fn validate(entities: &HashMap<String, Arc<Entity>>, tree: &DependencyTree) -> Result<()> {
    let mut dangling: Vec<String> = Vec::new();

    for (node, id) in tree.entity_references() {
        if entities.contains_key(id) {
            continue;
        }
        tracing::debug!(entity_id = id, location = %tree.location(node), "dangling entity reference");
        if !dangling.iter().any(|seen| seen == id) {
            dangling.push(id.to_string());
        }
    }

    if dangling.is_empty() {
        Ok(())
    } else {
        Err(Error::UnknownEntityReference { ids: dangling })
    }
}
