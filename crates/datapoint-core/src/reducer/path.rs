//! Path reducers: strings starting with `$`
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use super::{NodeFactory, NodeId, ReducerKind};
use crate::error::{Error, Result};
use crate::path;
use crate::source::Source;

pub(crate) fn is_type(source: &Source) -> bool {
    source.as_str().is_some_and(|text| text.starts_with('$'))
}

pub(crate) fn create(_factory: &mut NodeFactory<'_>, source: Source, _id: NodeId) -> Result<ReducerKind> {
    let text = source.as_str().ok_or_else(|| Error::InvalidReducerKind {
        source_repr: source.describe(),
    })?;
    Ok(ReducerKind::Path(path::parse(text)?))
}
