//! Dependency side-table
//!
//! Nodes never point at their parents. Instead, while a tree is built, the
//! factory records each node's parent and slot here. The registry uses the
//! table to find entity references and to describe where a node lives.
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use super::{NodeId, Reducer, ReducerKind};
use std::collections::BTreeMap;
use std::fmt;

/// Owner of a node in the side-table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parent {
    /// Built directly by a caller
    Root,
    /// Slot of a registered entity (`value`, `before`, `compose`, ...)
    Entity(String),
    Node(NodeId),
}

impl fmt::Display for Parent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parent::Root => f.write_str("<root>"),
            Parent::Entity(id) => f.write_str(id),
            Parent::Node(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMeta {
    pub parent: Parent,
    pub slot: String,
    pub kind: &'static str,
    /// Entity id, for entity reference nodes
    pub entity_ref: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DependencyTree {
    nodes: BTreeMap<NodeId, NodeMeta>,
}

impl DependencyTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeMeta> {
        self.nodes.get(&id)
    }

    /// Record a freshly built node
    pub fn record(&mut self, node: &Reducer, parent: Parent, slot: impl Into<String>) {
        let entity_ref = match node.kind() {
            ReducerKind::Entity(reference) => Some(reference.id.clone()),
            _ => None,
        };

        self.nodes.insert(
            node.id(),
            NodeMeta {
                parent,
                slot: slot.into(),
                kind: node.kind().name(),
                entity_ref,
            },
        );
    }

    /// Record an already-built subtree that was adopted into a new parent
    ///
    /// A node shared by several parents keeps the first one it was seen under.
    pub fn adopt(&mut self, node: &Reducer, parent: Parent, slot: impl Into<String>) {
        if self.nodes.contains_key(&node.id()) {
            return;
        }
        self.record(node, parent, slot);
        for (child_slot, child) in node.kind().children() {
            self.adopt(child, Parent::Node(node.id()), child_slot);
        }
    }

    /// Every recorded entity reference, in construction order
    pub fn entity_references(&self) -> impl Iterator<Item = (NodeId, &str)> + '_ {
        self.nodes
            .iter()
            .filter_map(|(id, meta)| meta.entity_ref.as_deref().map(|entity| (*id, entity)))
    }

    /// Human-readable location such as `model:person > value > [1] > name`
    pub fn location(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(id);

        while let Some(node_id) = current {
            let Some(meta) = self.nodes.get(&node_id) else {
                break;
            };
            parts.push(meta.slot.clone());
            current = match &meta.parent {
                Parent::Node(parent) => Some(*parent),
                owner => {
                    parts.push(owner.to_string());
                    None
                }
            };
        }

        parts.reverse();
        parts.join(" > ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::NodeFactory;

    #[test]
    fn test_shared_node_keeps_first_owner() {
        let shared = NodeFactory::new().build("$a | model:b").unwrap();
        let mut tree = DependencyTree::new();
        tree.adopt(&shared, Parent::Entity("model:first".to_string()), "value");
        tree.adopt(&shared, Parent::Entity("model:second".to_string()), "after");

        assert_eq!(tree.location(shared.id()), "model:first > value");
        let references: Vec<_> = tree.entity_references().map(|(_, id)| id).collect();
        assert_eq!(references, vec!["model:b"]);
        assert_eq!(tree.len(), 3);
    }
}
