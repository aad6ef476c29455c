//! Node factory
//!
//! Turns a [`Source`] into a [`Reducer`] tree. Strings and lists are first
//! normalized (pipe splitting, one level of flattening, single-element
//! collapse), then classified by trying each node kind's predicate in a fixed
//! order. The first kind that claims the source builds it.
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use super::tree::{DependencyTree, Parent};
use super::{entity, function, helpers, list, object, path, NodeId, Reducer, ReducerKind, ReducerNode};
use crate::error::{Error, Result};
use crate::source::Source;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

static PIPE_REGEX: OnceLock<Regex> = OnceLock::new();

/// Predicate and constructor pair owned by one node-kind module
struct NodeKindEntry {
    name: &'static str,
    is_type: fn(&Source) -> bool,
    create: fn(&mut NodeFactory<'_>, Source, NodeId) -> Result<ReducerKind>,
}

/// Classification order: the first matching kind wins
const NODE_KINDS: [NodeKindEntry; 6] = [
    NodeKindEntry {
        name: "ReducerObject",
        is_type: object::is_type,
        create: object::create,
    },
    NodeKindEntry {
        name: "ReducerEntity",
        is_type: entity::is_type,
        create: entity::create,
    },
    NodeKindEntry {
        name: "ReducerFunction",
        is_type: function::is_type,
        create: function::create,
    },
    NodeKindEntry {
        name: "ReducerHelper",
        is_type: helpers::is_type,
        create: helpers::create,
    },
    NodeKindEntry {
        name: "ReducerList",
        is_type: list::is_type,
        create: list::create,
    },
    NodeKindEntry {
        name: "ReducerPath",
        is_type: path::is_type,
        create: path::create,
    },
];

/// Builds reducer trees, optionally recording them in a [`DependencyTree`]
#[derive(Debug, Default)]
pub struct NodeFactory<'t> {
    tree: Option<&'t mut DependencyTree>,
}

impl<'t> NodeFactory<'t> {
    pub fn new() -> Self {
        Self { tree: None }
    }

    /// Factory that records every node it builds in `tree`
    pub fn with_tree(tree: &'t mut DependencyTree) -> Self {
        Self { tree: Some(tree) }
    }

    /// Build a root reducer
    pub fn build(&mut self, source: impl Into<Source>) -> Result<Reducer> {
        self.create(source.into(), Parent::Root, "root")
    }

    /// Build a reducer owned by `parent` at `slot`
    pub fn create(&mut self, source: Source, parent: Parent, slot: &str) -> Result<Reducer> {
        let source = normalize(source);

        if let Source::Node(node) = source {
            if let Some(tree) = self.tree.as_deref_mut() {
                tree.adopt(&node, parent, slot);
            }
            return Ok(node);
        }

        let Some(entry) = NODE_KINDS.iter().find(|entry| (entry.is_type)(&source)) else {
            tracing::debug!(slot, parent = %parent, "no reducer kind matches source");
            return Err(Error::InvalidReducerKind {
                source_repr: source.describe(),
            });
        };

        let id = NodeId::next();
        let kind = (entry.create)(self, source, id)?;
        let node = ReducerNode::new(id, kind);
        tracing::trace!(kind = entry.name, node = %id, slot, "built reducer node");

        if let Some(tree) = self.tree.as_deref_mut() {
            tree.record(&node, parent, slot);
        }
        Ok(node)
    }

    /// Build a child of the node being constructed
    pub(crate) fn create_child(&mut self, source: Source, parent: NodeId, slot: &str) -> Result<Reducer> {
        self.create(source, Parent::Node(parent), slot)
    }
}

fn pipe_regex() -> &'static Regex {
    PIPE_REGEX.get_or_init(|| Regex::new(r"\s+\|\s+").expect("valid pipe pattern"))
}

/// Split a string on the ` | ` pipe operator
pub fn split_pipes(text: &str) -> Vec<String> {
    pipe_regex()
        .split(text.trim())
        .map(str::to_string)
        .collect()
}

/// Apply pipe splitting, one level of list flattening and single-element collapse
fn normalize(source: Source) -> Source {
    match source {
        Source::Literal(Value::String(text)) => {
            let mut tokens = split_pipes(&text);
            if tokens.len() == 1 {
                Source::Literal(Value::String(text))
            } else {
                Source::List(tokens.drain(..).map(Source::from).collect())
            }
        }
        Source::Literal(value @ (Value::Array(_) | Value::Object(_))) => normalize(Source::from(value)),
        Source::List(items) => {
            let mut tokens = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Source::List(inner) => tokens.extend(inner),
                    Source::Literal(Value::String(text)) => {
                        tokens.extend(split_pipes(&text).into_iter().map(Source::from))
                    }
                    Source::Literal(value @ Value::Array(_)) => match Source::from(value) {
                        Source::List(inner) => tokens.extend(inner),
                        other => tokens.push(other),
                    },
                    other => tokens.push(other),
                }
            }

            if tokens.len() == 1 {
                match tokens.pop() {
                    Some(single) => normalize(single),
                    None => Source::List(tokens),
                }
            } else {
                Source::List(tokens)
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers;
    use serde_json::json;

    fn build(source: impl Into<Source>) -> Reducer {
        NodeFactory::new().build(source).unwrap()
    }

    #[test]
    fn test_split_pipes() {
        assert_eq!(split_pipes("$a | $b |  $c"), vec!["$a", "$b", "$c"]);
        assert_eq!(split_pipes("  $a  "), vec!["$a"]);
        assert_eq!(split_pipes("$a|$b"), vec!["$a|$b"]);
    }

    #[test]
    fn test_classification() {
        assert_eq!(build("$a").kind().name(), "ReducerPath");
        assert_eq!(build("model:person").kind().name(), "ReducerEntity");
        assert_eq!(build(json!({"a": "$a"})).kind().name(), "ReducerObject");
        assert_eq!(build(Source::function(|_| Ok(json!(1)))).kind().name(), "ReducerFunction");
        assert_eq!(build(helpers::map("$a")).kind().name(), "ReducerMap");
        assert_eq!(build(json!(["$a", "$b"])).kind().name(), "ReducerList");
    }

    #[test]
    fn test_pipe_string_becomes_pipeline() {
        let node = build("$a | model:b | $c");
        match node.kind() {
            ReducerKind::Pipeline(steps) => {
                let names: Vec<_> = steps.iter().map(|s| s.kind().name()).collect();
                assert_eq!(names, vec!["ReducerPath", "ReducerEntity", "ReducerPath"]);
            }
            other => panic!("expected pipeline, got {:?}", other),
        }
    }

    #[test]
    fn test_lists_flatten_one_level_and_collapse() {
        assert_eq!(build(json!(["$a"])), build("$a"));
        assert_eq!(build(json!([["$a"]])), build("$a"));
        assert_eq!(build(json!(["$a | $b"])), build("$a | $b"));

        let nested = build(json!([["$a", "$b"], "$c"]));
        assert!(matches!(nested.kind(), ReducerKind::Pipeline(steps) if steps.len() == 3));

        let empty = build(json!([]));
        assert!(empty.is_empty_pipeline());
        assert!(empty.is_sync());
    }

    #[test]
    fn test_invalid_reducer_kind() {
        for source in [json!(12), json!(true), json!(null), json!("plain text")] {
            let err = NodeFactory::new().build(source.clone()).unwrap_err();
            assert!(matches!(err, Error::InvalidReducerKind { .. }), "{} should be rejected", source);
            assert!(err.to_string().contains(&source.to_string()));
        }
    }

    #[test]
    fn test_sync_flag_propagates() {
        assert!(build(json!({"a": "$a", "b": ["$b", "$c"]})).is_sync());
        assert!(!build(json!({"a": "$a", "b": "model:b"})).is_sync());
        assert!(!build(Source::async_function(|_| async { Ok(json!(1)) })).is_sync());
        assert!(!build(helpers::map(Source::async_function(|_| async { Ok(json!(1)) }))).is_sync());
        assert!(build(helpers::pick(["a"])).is_sync());
    }

    #[test]
    fn test_tree_records_nodes_and_references() {
        let mut tree = DependencyTree::new();
        let root = NodeFactory::with_tree(&mut tree)
            .build(json!({"person": ["$id", "model:person"]}))
            .unwrap();

        let references: Vec<_> = tree.entity_references().collect();
        assert_eq!(references.len(), 1);
        assert_eq!(references[0].1, "model:person");
        assert_eq!(tree.location(references[0].0), "<root> > root > person > [1]");
        assert_eq!(tree.get(root.id()).map(|meta| meta.kind), Some("ReducerObject"));
    }

    #[test]
    fn test_prebuilt_nodes_are_adopted() {
        let inner = build("$a | model:b");
        let mut tree = DependencyTree::new();
        let outer = NodeFactory::with_tree(&mut tree)
            .build(Source::list(vec![Source::from(inner.clone()), Source::from("$c")]))
            .unwrap();

        assert!(matches!(outer.kind(), ReducerKind::Pipeline(steps) if steps[0] == inner));
        assert_eq!(tree.entity_references().count(), 1);
    }
}
