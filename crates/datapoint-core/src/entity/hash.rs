//! Hash entities: object reshaping modifiers
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use super::compose::Modifier;
use crate::accumulator::Accumulator;
use crate::error::{Error, Result};
use crate::reducer::{NodeFactory, Parent, Reducer, Resolver};
use crate::source::Source;
use crate::value::type_name;
use serde_json::{Map, Value};

/// Modifier keys in their inline resolution order
pub const MODIFIER_KEYS: [&str; 5] = ["omitKeys", "pickKeys", "mapKeys", "addValues", "addKeys"];

#[derive(Debug)]
pub enum HashModifier {
    OmitKeys(Vec<String>),
    PickKeys(Vec<String>),
    /// Replace the object with a template resolved against it
    MapKeys(Reducer),
    /// Shallow-merge frozen constants
    AddValues(Map<String, Value>),
    /// Shallow-merge a template resolved against the object
    AddKeys(Reducer),
}

pub(crate) fn create(
    factory: &mut NodeFactory<'_>,
    entity_id: &str,
    modifiers: Vec<Modifier>,
) -> Result<Vec<HashModifier>> {
    modifiers
        .into_iter()
        .enumerate()
        .map(|(index, modifier)| {
            let slot = format!("compose[{}].{}", index, modifier.name);
            match modifier.name.as_str() {
                "omitKeys" => key_list(entity_id, &modifier).map(HashModifier::OmitKeys),
                "pickKeys" => key_list(entity_id, &modifier).map(HashModifier::PickKeys),
                "addValues" => match modifier.spec.to_value() {
                    Some(Value::Object(values)) => Ok(HashModifier::AddValues(values)),
                    _ => Err(Error::invalid_entity(
                        entity_id,
                        format!("addValues must be a plain object, found {}", modifier.spec.describe()),
                    )),
                },
                "mapKeys" => object_template(factory, entity_id, modifier, &slot).map(HashModifier::MapKeys),
                "addKeys" => object_template(factory, entity_id, modifier, &slot).map(HashModifier::AddKeys),
                other => Err(Error::invalid_entity(
                    entity_id,
                    format!("'{}' is not a hash modifier", other),
                )),
            }
        })
        .collect()
}

fn object_template(factory: &mut NodeFactory<'_>, entity_id: &str, modifier: Modifier, slot: &str) -> Result<Reducer> {
    if !matches!(modifier.spec, Source::Object(_) | Source::Literal(Value::Object(_))) {
        return Err(Error::invalid_entity(
            entity_id,
            format!("{} must be an object template, found {}", modifier.name, modifier.spec.describe()),
        ));
    }
    factory.create(modifier.spec, Parent::Entity(entity_id.to_string()), slot)
}

fn key_list(entity_id: &str, modifier: &Modifier) -> Result<Vec<String>> {
    let keys = match &modifier.spec {
        Source::List(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>(),
        _ => None,
    };

    keys.ok_or_else(|| {
        Error::invalid_entity(
            entity_id,
            format!(
                "{} must be an array of strings, found {}",
                modifier.name,
                modifier.spec.describe()
            ),
        )
    })
}

/// Apply the modifiers to the resolved `value` of a hash entity
pub(crate) async fn resolve(
    resolver: &Resolver<'_>,
    acc: &Accumulator,
    entity_id: &str,
    modifiers: &[HashModifier],
) -> Result<Option<Value>> {
    let mut current = match acc.value() {
        Some(Value::Object(map)) => map.clone(),
        other => {
            return Err(Error::reducer(format!(
                "Entity {} resolved to {}, hash entities only process objects",
                entity_id,
                type_name(other)
            )))
        }
    };

    for modifier in modifiers {
        current = match modifier {
            HashModifier::OmitKeys(keys) => current
                .into_iter()
                .filter(|(key, _)| !keys.contains(key))
                .collect(),
            HashModifier::PickKeys(keys) => current
                .into_iter()
                .filter(|(key, _)| keys.contains(key))
                .collect(),
            HashModifier::AddValues(values) => {
                current.extend(values.clone());
                current
            }
            HashModifier::MapKeys(template) => {
                let scoped = acc.with_value(Some(Value::Object(current)));
                expect_object(entity_id, "mapKeys", resolver.resolve(&scoped, template).await?)?
            }
            HashModifier::AddKeys(template) => {
                let scoped = acc.with_value(Some(Value::Object(current.clone())));
                let added = expect_object(entity_id, "addKeys", resolver.resolve(&scoped, template).await?)?;
                current.extend(added);
                current
            }
        };
    }

    Ok(Some(Value::Object(current)))
}

fn expect_object(entity_id: &str, modifier: &str, value: Option<Value>) -> Result<Map<String, Value>> {
    match value {
        Some(Value::Object(map)) => Ok(map),
        other => Err(Error::reducer(format!(
            "Entity {} {} expected an object but received {}",
            entity_id,
            modifier,
            type_name(other.as_ref())
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::compose::parse_modifiers;
    use serde_json::json;

    fn build(spec: Value) -> Result<Vec<HashModifier>> {
        let Source::Object(mut entries) = Source::from(spec) else {
            panic!("hash spec must be an object");
        };
        let modifiers = parse_modifiers("hash:test", "Hash", &mut entries, &MODIFIER_KEYS)?;
        create(&mut NodeFactory::new(), "hash:test", modifiers)
    }

    #[test]
    fn test_templates_must_be_objects() {
        let err = build(json!({"mapKeys": "$name"})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Entity 'hash:test' is invalid: mapKeys must be an object template, found \"$name\""
        );
        assert!(build(json!({"addKeys": ["$a"]})).is_err());

        let modifiers = build(json!({"addKeys": {"b": "$a"}, "omitKeys": ["a"]})).unwrap();
        assert!(matches!(modifiers[0], HashModifier::OmitKeys(_)));
        assert!(matches!(modifiers[1], HashModifier::AddKeys(_)));
    }

    #[test]
    fn test_key_lists_must_hold_strings() {
        let err = build(json!({"pickKeys": ["a", 1]})).unwrap_err();
        assert!(err.to_string().contains("pickKeys must be an array of strings"));
    }
}
