//! Modifier parsing for hash and collection entities
//!
//! Modifiers are either given inline (`{"pickKeys": [..], "addKeys": {..}}`),
//! in which case they run in the entity type's fixed modifier order, or as an
//! explicit `compose` array of single-key objects that keeps its own order.
//! Mixing both forms is rejected.
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::source::Source;

/// A modifier stub: its key and the raw spec it holds
#[derive(Debug, Clone)]
pub struct Modifier {
    pub name: String,
    pub spec: Source,
}

/// Remove `key` from spec entries, returning its source
pub(crate) fn take(entries: &mut Vec<(String, Source)>, key: &str) -> Option<Source> {
    let index = entries.iter().position(|(name, _)| name == key)?;
    Some(entries.remove(index).1)
}

/// Pull the modifiers out of `entries`, in resolution order
///
/// `label` names the entity kind in messages, e.g. `Hash`.
pub fn parse_modifiers(
    entity_id: &str,
    label: &str,
    entries: &mut Vec<(String, Source)>,
    modifier_keys: &[&str],
) -> Result<Vec<Modifier>> {
    let compose = take(entries, "compose");

    let mut inline = Vec::new();
    for key in modifier_keys {
        if let Some(spec) = take(entries, key) {
            inline.push(Modifier {
                name: key.to_string(),
                spec,
            });
        }
    }

    let Some(compose) = compose else {
        return Ok(inline);
    };

    if !inline.is_empty() {
        let keys: Vec<_> = inline.iter().map(|modifier| modifier.name.as_str()).collect();
        return Err(Error::invalid_entity(
            entity_id,
            format!(
                "when 'compose' is defined the key(s): '{}' should be inside compose.",
                keys.join(", ")
            ),
        ));
    }

    let Source::List(items) = compose else {
        return Err(Error::invalid_entity(
            entity_id,
            format!(
                "{}.compose property is expected to be of instance of Array and found {}",
                label,
                compose.describe()
            ),
        ));
    };

    items
        .into_iter()
        .map(|item| parse_compose_item(entity_id, item, modifier_keys))
        .collect()
}

fn parse_compose_item(entity_id: &str, item: Source, modifier_keys: &[&str]) -> Result<Modifier> {
    let described = item.describe();
    let mut entries = match item {
        Source::Object(entries) if entries.len() == 1 => entries,
        _ => {
            return Err(Error::invalid_entity(
                entity_id,
                format!("compose items must be objects with a single key, found {}", described),
            ))
        }
    };

    let Some((name, spec)) = entries.pop() else {
        return Err(Error::invalid_entity(entity_id, "empty compose item"));
    };

    if !modifier_keys.contains(&name.as_str()) {
        return Err(Error::invalid_entity(
            entity_id,
            format!(
                "Modifier '{}' in {} does not match any of the registered Modifiers: {}",
                name,
                entity_id,
                modifier_keys.join(", ")
            ),
        ));
    }

    Ok(Modifier { name, spec })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const KEYS: [&str; 3] = ["filter", "map", "find"];

    fn entries(value: serde_json::Value) -> Vec<(String, Source)> {
        match Source::from(value) {
            Source::Object(entries) => entries,
            other => panic!("expected object, got {:?}", other),
        }
    }

    fn names(modifiers: &[Modifier]) -> Vec<&str> {
        modifiers.iter().map(|modifier| modifier.name.as_str()).collect()
    }

    #[test]
    fn test_inline_modifiers_follow_key_order() {
        let mut spec = entries(json!({"find": "$a", "value": "$", "map": "$b", "filter": "$c"}));
        let modifiers = parse_modifiers("collection:a", "Collection", &mut spec, &KEYS).unwrap();
        assert_eq!(names(&modifiers), vec!["filter", "map", "find"]);
        assert_eq!(spec.len(), 1);
        assert_eq!(spec[0].0, "value");
    }

    #[test]
    fn test_compose_keeps_its_order() {
        let mut spec = entries(json!({"compose": [{"map": "$a"}, {"filter": "$b"}, {"map": "$c"}]}));
        let modifiers = parse_modifiers("collection:a", "Collection", &mut spec, &KEYS).unwrap();
        assert_eq!(names(&modifiers), vec!["map", "filter", "map"]);
        assert!(spec.is_empty());
    }

    #[test]
    fn test_compose_cannot_mix_with_inline() {
        let mut spec = entries(json!({"compose": [{"map": "$a"}], "filter": "$b", "find": "$c"}));
        let err = parse_modifiers("collection:a", "Collection", &mut spec, &KEYS).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Entity 'collection:a' is invalid: when 'compose' is defined the key(s): 'filter, find' should be inside compose."
        );
    }

    #[test]
    fn test_compose_must_be_an_array() {
        let mut spec = entries(json!({"compose": {"map": "$a"}}));
        let err = parse_modifiers("hash:a", "Hash", &mut spec, &KEYS).unwrap_err();
        assert!(err
            .to_string()
            .contains("Hash.compose property is expected to be of instance of Array"));
    }

    #[test]
    fn test_unknown_modifier() {
        let mut spec = entries(json!({"compose": [{"reduce": "$a"}]}));
        let err = parse_modifiers("collection:a", "Collection", &mut spec, &KEYS).unwrap_err();
        assert!(err.to_string().contains(
            "Modifier 'reduce' in collection:a does not match any of the registered Modifiers: filter, map, find"
        ));

        let mut spec = entries(json!({"compose": [{"map": "$a", "find": "$b"}]}));
        assert!(parse_modifiers("collection:a", "Collection", &mut spec, &KEYS).is_err());
    }
}
