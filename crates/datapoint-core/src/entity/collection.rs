//! Collection entities: `filter`, `map` and `find` over an array value
//!
//! The output is checked against `array` unless the entity declares its own
//! `outputType`, so a collection ending in `find` needs one.
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use super::compose::Modifier;
use crate::accumulator::Accumulator;
use crate::error::{Error, Result};
use crate::helpers;
use crate::reducer::{NodeFactory, Parent, Reducer, Resolver};
use crate::source::Source;
use crate::value::type_name;
use serde_json::Value;

/// Modifier keys in their inline resolution order
pub const MODIFIER_KEYS: [&str; 3] = ["filter", "map", "find"];

/// Build the compose pipeline, `None` when no modifier is given
pub(crate) fn create(
    factory: &mut NodeFactory<'_>,
    entity_id: &str,
    modifiers: Vec<Modifier>,
) -> Result<Option<Reducer>> {
    if modifiers.is_empty() {
        return Ok(None);
    }

    let steps = modifiers
        .into_iter()
        .map(|modifier| match modifier.name.as_str() {
            "filter" => Ok(helpers::filter(modifier.spec)),
            "map" => Ok(helpers::map(modifier.spec)),
            "find" => Ok(helpers::find(modifier.spec)),
            other => Err(Error::invalid_entity(
                entity_id,
                format!("'{}' is not a collection modifier", other),
            )),
        })
        .collect::<Result<Vec<Source>>>()?;

    factory
        .create(Source::List(steps), Parent::Entity(entity_id.to_string()), "compose")
        .map(Some)
}

pub(crate) async fn resolve(
    resolver: &Resolver<'_>,
    acc: &Accumulator,
    entity_id: &str,
    compose: Option<&Reducer>,
) -> Result<Option<Value>> {
    if !matches!(acc.value(), Some(Value::Array(_))) {
        return Err(Error::reducer(format!(
            "Entity {} resolved to {}, collection entities only process arrays",
            entity_id,
            type_name(acc.value())
        )));
    }

    resolver.resolve_optional(acc, compose).await
}
