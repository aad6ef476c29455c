//! Reducer nodes
//!
//! A [`Reducer`] is an immutable, shareable node of a pipeline tree. Each node
//! knows at construction time whether its whole subtree can be evaluated
//! without suspending, see [`ReducerNode::is_sync`].
//!
//! Node kinds are owned by submodules, each providing the predicate and
//! constructor the [`NodeFactory`] dispatches to, plus the evaluation of that
//! kind.
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

pub mod entity;
pub mod factory;
pub mod function;
pub mod helpers;
pub mod list;
pub mod object;
pub mod path;
pub mod resolve;
pub mod tree;

pub use factory::NodeFactory;
pub use resolve::Resolver;
pub use tree::{DependencyTree, NodeMeta, Parent};

use crate::path::PathExpression;
use crate::source::FunctionBody;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared handle to an immutable reducer node
pub type Reducer = Arc<ReducerNode>;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a node, used as key of the dependency side-table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) fn next() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Reference to a registered entity, e.g. `?model:person[]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityReference {
    pub entity_type: String,
    pub name: String,
    /// `type:name`
    pub id: String,
    /// Trailing `[]`: resolve once per element of an array value
    pub is_collection: bool,
    /// Leading `?`: skip when the value is false, null or undefined
    pub empty_conditional: bool,
}

/// One computed key of an object template
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub path: Vec<String>,
    pub reducer: Reducer,
}

/// Object template split into folded constants and computed assignments
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectTemplate {
    pub constants: Map<String, Value>,
    pub assignments: Vec<Assignment>,
}

/// The closed set of node kinds
#[derive(Debug)]
pub enum ReducerKind {
    Path(PathExpression),
    Function(FunctionBody),
    Entity(EntityReference),
    Pipeline(Vec<Reducer>),
    Object(ObjectTemplate),
    Map(Reducer),
    Filter(Reducer),
    Find(Reducer),
    Parallel(Vec<Reducer>),
    Assign(Reducer),
    Pick(Vec<String>),
    Omit(Vec<String>),
    Constant(Value),
    WithDefault { inner: Reducer, fallback: Value },
}

impl ReducerKind {
    pub fn name(&self) -> &'static str {
        match self {
            ReducerKind::Path(_) => "ReducerPath",
            ReducerKind::Function(_) => "ReducerFunction",
            ReducerKind::Entity(_) => "ReducerEntity",
            ReducerKind::Pipeline(_) => "ReducerList",
            ReducerKind::Object(_) => "ReducerObject",
            ReducerKind::Map(_) => "ReducerMap",
            ReducerKind::Filter(_) => "ReducerFilter",
            ReducerKind::Find(_) => "ReducerFind",
            ReducerKind::Parallel(_) => "ReducerParallel",
            ReducerKind::Assign(_) => "ReducerAssign",
            ReducerKind::Pick(_) => "ReducerPick",
            ReducerKind::Omit(_) => "ReducerOmit",
            ReducerKind::Constant(_) => "ReducerConstant",
            ReducerKind::WithDefault { .. } => "ReducerDefault",
        }
    }

    /// Direct children with the slot name they occupy
    pub fn children(&self) -> Vec<(String, &Reducer)> {
        match self {
            ReducerKind::Pipeline(steps) | ReducerKind::Parallel(steps) => steps
                .iter()
                .enumerate()
                .map(|(index, step)| (format!("[{}]", index), step))
                .collect(),
            ReducerKind::Object(template) => template
                .assignments
                .iter()
                .map(|assignment| (assignment.path.join("."), &assignment.reducer))
                .collect(),
            ReducerKind::Map(inner) => vec![("map".to_string(), inner)],
            ReducerKind::Filter(inner) => vec![("filter".to_string(), inner)],
            ReducerKind::Find(inner) => vec![("find".to_string(), inner)],
            ReducerKind::Assign(inner) => vec![("assign".to_string(), inner)],
            ReducerKind::WithDefault { inner, .. } => vec![("withDefault".to_string(), inner)],
            ReducerKind::Path(_)
            | ReducerKind::Function(_)
            | ReducerKind::Entity(_)
            | ReducerKind::Pick(_)
            | ReducerKind::Omit(_)
            | ReducerKind::Constant(_) => Vec::new(),
        }
    }

    fn is_sync(&self) -> bool {
        match self {
            ReducerKind::Path(_)
            | ReducerKind::Constant(_)
            | ReducerKind::Pick(_)
            | ReducerKind::Omit(_) => true,
            ReducerKind::Function(body) => !body.is_async(),
            ReducerKind::Entity(_) => false,
            other => other.children().iter().all(|(_, child)| child.is_sync()),
        }
    }
}

impl PartialEq for ReducerKind {
    fn eq(&self, other: &Self) -> bool {
        use ReducerKind::*;
        match (self, other) {
            (Path(a), Path(b)) => a == b,
            (Function(a), Function(b)) => a.ptr_eq(b),
            (Entity(a), Entity(b)) => a == b,
            (Pipeline(a), Pipeline(b)) | (Parallel(a), Parallel(b)) => a == b,
            (Object(a), Object(b)) => a == b,
            (Map(a), Map(b)) | (Filter(a), Filter(b)) | (Find(a), Find(b)) | (Assign(a), Assign(b)) => {
                a == b
            }
            (Pick(a), Pick(b)) | (Omit(a), Omit(b)) => a == b,
            (Constant(a), Constant(b)) => a == b,
            (
                WithDefault { inner: a, fallback: fa },
                WithDefault { inner: b, fallback: fb },
            ) => a == b && fa == fb,
            _ => false,
        }
    }
}

/// Immutable pipeline node
#[derive(Debug)]
pub struct ReducerNode {
    id: NodeId,
    kind: ReducerKind,
    sync: bool,
}

impl ReducerNode {
    pub(crate) fn new(id: NodeId, kind: ReducerKind) -> Reducer {
        let sync = kind.is_sync();
        Arc::new(ReducerNode { id, kind, sync })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &ReducerKind {
        &self.kind
    }

    /// Whether the subtree can be resolved without suspending
    pub fn is_sync(&self) -> bool {
        self.sync
    }

    /// An empty pipeline, which resolves to undefined
    pub fn is_empty_pipeline(&self) -> bool {
        matches!(&self.kind, ReducerKind::Pipeline(steps) if steps.is_empty())
    }
}

/// Structural equality, ignoring node identity
impl PartialEq for ReducerNode {
    fn eq(&self, other: &Self) -> bool {
        self.sync == other.sync && self.kind == other.kind
    }
}
