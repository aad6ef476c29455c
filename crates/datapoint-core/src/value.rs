//! Helpers for working with JSON values
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use serde_json::{Map, Value};

/// JavaScript truthiness, with `None` standing for undefined
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().map_or(true, |n| n != 0.0 && !n.is_nan()),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Values an empty-conditional reference (`?type:name`) passes through
pub fn is_empty_conditional(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null) | Some(Value::Bool(false)))
}

/// Type name used in diagnostics
pub fn type_name(value: Option<&Value>) -> &'static str {
    match value {
        None => "undefined",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}

/// Borrow the elements of an array value, failing for anything else
pub fn expect_array<'v>(value: Option<&'v Value>, operation: &str) -> Result<&'v Vec<Value>> {
    match value {
        Some(Value::Array(items)) => Ok(items),
        other => Err(Error::reducer(format!(
            "{} expected an array but received {}",
            operation,
            type_name(other)
        ))),
    }
}

/// Set `value` at a nested key path, creating intermediate objects
pub fn set_path(target: &mut Map<String, Value>, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut current = target;
    for key in parents {
        let slot = current
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = match slot {
            Value::Object(map) => map,
            _ => return,
        };
    }
    current.insert(last.clone(), value);
}

/// Collect positional results, reporting the first error by position
pub fn collect_positional<I>(results: I) -> Result<Vec<Value>>
where
    I: IntoIterator<Item = Result<Option<Value>>>,
{
    results
        .into_iter()
        .map(|result| result.map(|value| value.unwrap_or(Value::Null)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        for falsy in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
            assert!(!is_truthy(Some(&falsy)), "{} should be falsy", falsy);
        }
        for truthy in [json!(true), json!(1), json!(-0.5), json!("0"), json!([]), json!({})] {
            assert!(is_truthy(Some(&truthy)), "{} should be truthy", truthy);
        }
        assert!(!is_truthy(None));
    }

    #[test]
    fn test_empty_conditional_only_skips_false_null_undefined() {
        assert!(is_empty_conditional(None));
        assert!(is_empty_conditional(Some(&json!(null))));
        assert!(is_empty_conditional(Some(&json!(false))));
        assert!(!is_empty_conditional(Some(&json!(0))));
        assert!(!is_empty_conditional(Some(&json!(""))));
    }

    #[test]
    fn test_set_path_creates_parents() {
        let mut target = Map::new();
        set_path(&mut target, &["a".into(), "b".into()], json!(1));
        set_path(&mut target, &["a".into(), "c".into()], json!(2));
        set_path(&mut target, &["d".into()], json!(3));
        assert_eq!(Value::Object(target), json!({"a": {"b": 1, "c": 2}, "d": 3}));
    }

    #[test]
    fn test_collect_positional_reports_first_error() {
        let results = vec![
            Ok(Some(json!(1))),
            Err(Error::reducer("second")),
            Ok(None),
            Err(Error::reducer("fourth")),
        ];
        let err = collect_positional(results).unwrap_err();
        assert_eq!(err.to_string(), "second");

        let ok = collect_positional(vec![Ok(Some(json!(1))), Ok(None)]).unwrap();
        assert_eq!(ok, vec![json!(1), Value::Null]);
    }

    #[test]
    fn test_expect_array() {
        let err = expect_array(Some(&json!({})), "map").unwrap_err();
        assert_eq!(err.to_string(), "map expected an array but received object");
        assert!(expect_array(Some(&json!([1])), "map").is_ok());
    }
}
