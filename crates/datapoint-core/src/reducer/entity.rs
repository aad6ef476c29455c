//! Entity reference reducers: `type:name`, `?type:name`, `type:name[]`
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use super::{EntityReference, NodeFactory, NodeId, ReducerKind, Resolver};
use crate::accumulator::Accumulator;
use crate::error::{Error, Result};
use crate::source::Source;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

static ENTITY_REGEX: OnceLock<Regex> = OnceLock::new();

fn entity_regex() -> &'static Regex {
    ENTITY_REGEX.get_or_init(|| {
        Regex::new(r"^(\?)?([\w.]+):([\w.-]+)(\[\])?$").expect("valid entity reference pattern")
    })
}

/// Parse an entity reference, `None` when `text` is not one
pub fn parse_reference(text: &str) -> Option<EntityReference> {
    let captures = entity_regex().captures(text)?;
    let entity_type = captures.get(2)?.as_str().to_string();
    let name = captures.get(3)?.as_str().to_string();

    Some(EntityReference {
        id: format!("{}:{}", entity_type, name),
        entity_type,
        name,
        is_collection: captures.get(4).is_some(),
        empty_conditional: captures.get(1).is_some(),
    })
}

pub(crate) fn is_type(source: &Source) -> bool {
    source.as_str().is_some_and(|text| entity_regex().is_match(text))
}

pub(crate) fn create(_factory: &mut NodeFactory<'_>, source: Source, _id: NodeId) -> Result<ReducerKind> {
    source
        .as_str()
        .and_then(parse_reference)
        .map(ReducerKind::Entity)
        .ok_or_else(|| Error::InvalidReducerKind {
            source_repr: source.describe(),
        })
}

pub(crate) async fn resolve(
    resolver: &Resolver<'_>,
    acc: &Accumulator,
    reference: &EntityReference,
) -> Result<Option<Value>> {
    crate::entity::resolve::resolve_reference(resolver, acc, reference).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reference() {
        let reference = parse_reference("model:person").unwrap();
        assert_eq!(reference.id, "model:person");
        assert_eq!(reference.entity_type, "model");
        assert_eq!(reference.name, "person");
        assert!(!reference.is_collection);
        assert!(!reference.empty_conditional);

        let reference = parse_reference("?request:get.person-v2[]").unwrap();
        assert_eq!(reference.id, "request:get.person-v2");
        assert!(reference.is_collection);
        assert!(reference.empty_conditional);
    }

    #[test]
    fn test_non_references() {
        for text in ["$a", "model", "model:", ":name", "model:a b", "$a:b", "model:a[0]"] {
            assert!(parse_reference(text).is_none(), "{} is not a reference", text);
        }
    }
}
