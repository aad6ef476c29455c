//! Function reducers
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use super::{NodeFactory, NodeId, ReducerKind};
use crate::accumulator::Accumulator;
use crate::error::{Error, Result};
use crate::source::{FunctionBody, Source, SyncFn};
use serde_json::Value;

pub(crate) fn is_type(source: &Source) -> bool {
    matches!(source, Source::Function(_))
}

pub(crate) fn create(_factory: &mut NodeFactory<'_>, source: Source, _id: NodeId) -> Result<ReducerKind> {
    match source {
        Source::Function(body) => Ok(ReducerKind::Function(body)),
        other => Err(Error::InvalidReducerKind {
            source_repr: other.describe(),
        }),
    }
}

pub(crate) fn call_sync(body: &SyncFn, acc: &Accumulator) -> Result<Option<Value>> {
    body(acc).map(Some).map_err(Error::from_user)
}

pub(crate) async fn call(body: &FunctionBody, acc: &Accumulator) -> Result<Option<Value>> {
    match body {
        FunctionBody::Sync(body) => call_sync(body, acc),
        FunctionBody::Async(body) => body(acc.clone()).await.map(Some).map_err(Error::from_user),
    }
}
