//! Entity construction
//!
//! Parses an entity spec into an [`Entity`]: validates the id and the spec
//! keys, builds every lifecycle slot with the shared [`NodeFactory`] and then
//! hands the remaining keys to the entity type.
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use super::compose::{parse_modifiers, take};
use super::custom::{CustomCore, CustomSpec, EntityTypes};
use super::{collection, control, hash, request, schema, type_check, Entity, EntityKind, EntityType, BASE_KEYS};
use crate::error::{Error, Result};
use crate::reducer::entity::parse_reference;
use crate::reducer::{NodeFactory, Parent, Reducer};
use crate::source::Source;
use serde_json::{json, Value};
use std::sync::Arc;

/// Build an entity from its id and spec
pub fn create_entity(
    factory: &mut NodeFactory<'_>,
    types: &EntityTypes,
    id: &str,
    spec: impl Into<Source>,
) -> Result<Entity> {
    let spec = spec.into();
    let reference = parse_reference(id)
        .filter(|reference| !reference.is_collection && !reference.empty_conditional)
        .ok_or_else(|| Error::invalid_entity(id, "entity ids must have the form 'type:name'"))?;

    let entity_type = types.lookup(&reference.entity_type).ok_or_else(|| {
        Error::invalid_entity(
            id,
            format!("'{}' is not a registered entity type", reference.entity_type),
        )
    })?;

    if entity_type.is_transform() {
        let value = slot(factory, id, "value", Some(spec))?;
        return Ok(Entity {
            id: id.to_string(),
            entity_type,
            name: reference.name,
            before: None,
            value,
            after: None,
            error: None,
            input_type: None,
            output_type: None,
            params: Arc::new(json!({})),
            kind: EntityKind::Transform,
        });
    }

    let mut entries = match spec {
        Source::Object(entries) => entries,
        other => {
            return Err(Error::invalid_entity(
                id,
                format!("the spec must be an object, found {}", other.describe()),
            ))
        }
    };

    let unknown: Vec<_> = entries
        .iter()
        .map(|(key, _)| key.as_str())
        .filter(|key| !BASE_KEYS.contains(key) && !entity_type.type_keys().contains(key))
        .collect();
    if !unknown.is_empty() && !matches!(entity_type, EntityType::Custom(_)) {
        return Err(Error::invalid_entity(
            id,
            format!(
                "unknown key(s) '{}', {} entities accept: {}",
                unknown.join(", "),
                entity_type,
                BASE_KEYS
                    .iter()
                    .chain(entity_type.type_keys())
                    .copied()
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        ));
    }

    let params = match take(&mut entries, "params") {
        None => json!({}),
        Some(source) => match source.to_value() {
            Some(params @ Value::Object(_)) => params,
            _ => {
                return Err(Error::invalid_entity(
                    id,
                    format!("params must be a plain object, found {}", source.describe()),
                ))
            }
        },
    };

    let before = slot(factory, id, "before", take(&mut entries, "before"))?;
    let value = slot(factory, id, "value", take(&mut entries, "value"))?;
    let after = slot(factory, id, "after", take(&mut entries, "after"))?;
    let error = slot(factory, id, "error", take(&mut entries, "error"))?;
    let input_type = take(&mut entries, "inputType")
        .map(|source| type_check::create(factory, id, "inputType", source))
        .transpose()?;
    // collections check for an array unless told otherwise
    let output_type = match take(&mut entries, "outputType") {
        Some(source) => Some(type_check::create(factory, id, "outputType", source)?),
        None if entity_type == EntityType::Collection => {
            Some(type_check::create(factory, id, "outputType", Source::from("array"))?)
        }
        None => None,
    };

    let kind = match &entity_type {
        EntityType::Reducer | EntityType::Transform => EntityKind::Transform,
        EntityType::Entry | EntityType::Model => EntityKind::Entry,
        EntityType::Hash => {
            let modifiers = parse_modifiers(id, "Hash", &mut entries, &hash::MODIFIER_KEYS)?;
            EntityKind::Hash(hash::create(factory, id, modifiers)?)
        }
        EntityType::Collection => {
            let modifiers = parse_modifiers(id, "Collection", &mut entries, &collection::MODIFIER_KEYS)?;
            EntityKind::Collection(collection::create(factory, id, modifiers)?)
        }
        EntityType::Request | EntityType::Source => {
            let url = take(&mut entries, "url");
            let options = take(&mut entries, "options");
            EntityKind::Request(request::create(factory, id, url, options)?)
        }
        EntityType::Control => EntityKind::Control(control::create(factory, id, take(&mut entries, "select"))?),
        EntityType::Schema => {
            let schema_doc = take(&mut entries, "schema");
            let options = take(&mut entries, "options");
            EntityKind::Schema(schema::create(id, schema_doc, options)?)
        }
        EntityType::Custom(name) => {
            let type_factory = types
                .get(&**name)
                .ok_or_else(|| Error::invalid_entity(id, format!("'{}' is not a registered entity type", name)))?;
            let mut custom = CustomSpec::new(factory, id, std::mem::take(&mut entries));
            let core = type_factory.create(&mut custom)?;

            let remaining = custom.into_remaining();
            if !remaining.is_empty() {
                let keys: Vec<_> = remaining.iter().map(|(key, _)| key.as_str()).collect();
                return Err(Error::invalid_entity(
                    id,
                    format!("unknown key(s) '{}' for {} entities", keys.join(", "), name),
                ));
            }
            EntityKind::Custom(CustomCore(core))
        }
    };

    Ok(Entity {
        id: id.to_string(),
        entity_type,
        name: reference.name,
        before,
        value,
        after,
        error,
        input_type,
        output_type,
        params: Arc::new(params),
        kind,
    })
}

fn slot(factory: &mut NodeFactory<'_>, id: &str, name: &str, source: Option<Source>) -> Result<Option<Reducer>> {
    source
        .map(|source| factory.create(source, Parent::Entity(id.to_string()), name))
        .transpose()
}
