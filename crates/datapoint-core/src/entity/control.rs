//! Control entities: `select` with ordered `case` / `do` pairs and a
//! mandatory `default`
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use crate::accumulator::Accumulator;
use crate::error::{Error, Result};
use crate::reducer::{NodeFactory, Parent, Reducer, Resolver};
use crate::source::Source;
use crate::value::is_truthy;
use serde_json::Value;

#[derive(Debug)]
pub struct Case {
    pub condition: Reducer,
    pub action: Reducer,
}

#[derive(Debug)]
pub struct ControlSpec {
    pub cases: Vec<Case>,
    pub default: Reducer,
}

pub(crate) fn create(factory: &mut NodeFactory<'_>, entity_id: &str, select: Option<Source>) -> Result<ControlSpec> {
    let statements = match select {
        Some(Source::List(statements)) => statements,
        Some(other) => {
            return Err(Error::invalid_entity(
                entity_id,
                format!("select must be an array, found {}", other.describe()),
            ))
        }
        None => Vec::new(),
    };

    let parent = Parent::Entity(entity_id.to_string());
    let mut cases = Vec::new();
    let mut default = None;

    for (index, statement) in statements.into_iter().enumerate() {
        let mut entries = match statement {
            Source::Object(entries) => entries,
            other => {
                return Err(Error::invalid_entity(
                    entity_id,
                    format!("select[{}] must be an object, found {}", index, other.describe()),
                ))
            }
        };

        if let Some(fallback) = super::compose::take(&mut entries, "default") {
            if default.is_none() {
                default = Some(factory.create(fallback, parent.clone(), "default")?);
            }
            continue;
        }

        let (Some(condition), Some(action)) = (
            super::compose::take(&mut entries, "case"),
            super::compose::take(&mut entries, "do"),
        ) else {
            return Err(Error::invalid_entity(
                entity_id,
                format!("select[{}] needs both 'case' and 'do'", index),
            ));
        };

        let slot = format!("case[{}]", cases.len());
        cases.push(Case {
            condition: factory.create(condition, parent.clone(), &format!("{}.case", slot))?,
            action: factory.create(action, parent.clone(), &format!("{}.do", slot))?,
        });
    }

    let Some(default) = default else {
        return Err(Error::MissingDefaultCase {
            entity_id: entity_id.to_string(),
        });
    };

    Ok(ControlSpec { cases, default })
}

/// Resolve the first case whose condition is truthy, or the default
pub(crate) async fn resolve(resolver: &Resolver<'_>, acc: &Accumulator, spec: &ControlSpec) -> Result<Option<Value>> {
    for case in &spec.cases {
        let matched = resolver.resolve(acc, &case.condition).await?;
        if is_truthy(matched.as_ref()) {
            return resolver.resolve(acc, &case.action).await;
        }
    }

    resolver.resolve(acc, &spec.default).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(select: serde_json::Value) -> Result<ControlSpec> {
        create(&mut NodeFactory::new(), "control:test", Some(Source::from(select)))
    }

    #[test]
    fn test_first_default_wins() {
        let spec = build(json!([
            {"case": "$a", "do": "$a"},
            {"default": "$b"},
            {"default": "$c"}
        ]))
        .unwrap();
        assert_eq!(spec.cases.len(), 1);
        assert_eq!(spec.default, NodeFactory::new().build("$b").unwrap());
    }

    #[test]
    fn test_invalid_statements() {
        let err = build(json!([{"case": "$a"}, {"default": "$b"}])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Entity 'control:test' is invalid: select[0] needs both 'case' and 'do'"
        );

        assert!(build(json!(["$a", {"default": "$b"}])).is_err());
        assert!(matches!(build(json!([])), Err(Error::MissingDefaultCase { .. })));
    }
}
