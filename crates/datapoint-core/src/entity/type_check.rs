//! `inputType` / `outputType` checks
//!
//! A check is either a shorthand such as `"string"` or `"string|number"`, or
//! any reducer. Shorthands become a sync function node that fails with
//! [`Error::TypeCheck`]. A custom reducer passes unless it raises an error.
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::reducer::{entity::parse_reference, NodeFactory, Parent, Reducer};
use crate::source::Source;
use crate::value::type_name;
use serde_json::Value;

const SHORTHANDS: [&str; 6] = ["string", "number", "boolean", "array", "object", "error"];

/// Build the check reducer for an entity slot
pub(crate) fn create(factory: &mut NodeFactory<'_>, entity_id: &str, slot: &str, source: Source) -> Result<Reducer> {
    let Some(text) = source.as_str().filter(|text| is_shorthand(text)) else {
        return factory.create(source, Parent::Entity(entity_id.to_string()), slot);
    };

    let expected: Vec<String> = text.split('|').map(|name| name.trim().to_string()).collect();
    if let Some(unknown) = expected.iter().find(|name| !SHORTHANDS.contains(&name.as_str())) {
        return Err(Error::invalid_entity(
            entity_id,
            format!(
                "{} '{}' is not a supported type check, use one of: {}",
                slot,
                unknown,
                SHORTHANDS.join(", ")
            ),
        ));
    }

    let check = Source::function(move |acc| {
        let value = acc.value();
        if expected.iter().any(|name| matches_type(name, value)) {
            return Ok(value.cloned().unwrap_or(Value::Null));
        }
        Err(anyhow::Error::new(Error::TypeCheck {
            expected: expected.join("|"),
            found: type_name(value).to_string(),
        }))
    });
    factory.create(check, Parent::Entity(entity_id.to_string()), slot)
}

/// Strings that are neither paths nor entity references name types
fn is_shorthand(text: &str) -> bool {
    !text.starts_with('$') && parse_reference(text).is_none()
}

fn matches_type(name: &str, value: Option<&Value>) -> bool {
    match (name, value) {
        ("string", Some(Value::String(_))) => true,
        ("number", Some(Value::Number(_))) => true,
        ("boolean", Some(Value::Bool(_))) => true,
        ("array", Some(Value::Array(_))) => true,
        ("object", Some(Value::Object(_))) => true,
        ("error", Some(Value::Object(map))) => matches!(map.get("message"), Some(Value::String(_))),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::resolve_sync_reducer;
    use serde_json::json;

    fn check(source: &str) -> Result<Reducer> {
        create(&mut NodeFactory::new(), "model:a", "inputType", Source::from(source))
    }

    #[test]
    fn test_shorthand_accepts_matching_values() {
        let reducer = check("string|number").unwrap();
        assert!(reducer.is_sync());
        assert!(resolve_sync_reducer(&reducer, json!("a")).is_ok());
        assert!(resolve_sync_reducer(&reducer, json!(1.5)).is_ok());
    }

    #[test]
    fn test_shorthand_rejects_other_values() {
        let reducer = check("object").unwrap();
        let err = resolve_sync_reducer(&reducer, json!([1])).unwrap_err();
        assert!(matches!(err, Error::TypeCheck { .. }));
        assert_eq!(
            err.to_string(),
            "Entity type check failed! Expected 'object' but received 'array'"
        );
    }

    #[test]
    fn test_error_shorthand() {
        let reducer = check("error").unwrap();
        assert!(resolve_sync_reducer(&reducer, json!({"name": "Error", "message": "boom"})).is_ok());
        assert!(resolve_sync_reducer(&reducer, json!({"message": 12})).is_err());
        assert!(resolve_sync_reducer(&reducer, json!("boom")).is_err());
    }

    #[test]
    fn test_function_and_unknown_names_are_rejected() {
        for name in ["function", "strin", "string|date"] {
            let err = check(name).unwrap_err();
            assert!(matches!(err, Error::InvalidEntity { .. }), "{} should be rejected", name);
        }
    }

    #[test]
    fn test_paths_build_regular_reducers() {
        let reducer = check("$a").unwrap();
        assert_eq!(reducer.kind().name(), "ReducerPath");
    }
}
