//! Request entities: URL templating, option resolution and the transport call
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use crate::accumulator::Accumulator;
use crate::error::{Error, Result};
use crate::path;
use crate::reducer::{NodeFactory, Parent, Reducer, Resolver};
use crate::source::Source;
use crate::transport::RequestOptions;
use crate::value::type_name;
use regex::{Captures, Regex};
use serde_json::{json, Map, Value};
use std::sync::OnceLock;

static URL_PLACEHOLDER: OnceLock<Regex> = OnceLock::new();

fn placeholder_regex() -> &'static Regex {
    URL_PLACEHOLDER.get_or_init(|| Regex::new(r"\{(.*?)\}").expect("valid placeholder pattern"))
}

#[derive(Debug)]
pub struct RequestSpec {
    /// URL template with `{scope.path}` placeholders
    pub url: String,
    pub options: Option<Reducer>,
}

pub(crate) fn create(
    factory: &mut NodeFactory<'_>,
    entity_id: &str,
    url: Option<Source>,
    options: Option<Source>,
) -> Result<RequestSpec> {
    let url = match url {
        None => String::new(),
        Some(source) => source.as_str().map(str::to_string).ok_or_else(|| {
            Error::invalid_entity(entity_id, format!("url must be a string, found {}", source.describe()))
        })?,
    };

    let options = options
        .map(|source| factory.create(source, Parent::Entity(entity_id.to_string()), "options"))
        .transpose()?;

    Ok(RequestSpec { url, options })
}

/// Replace every `{path}` placeholder with the value it names in `acc`
///
/// Placeholders are read like `$..` paths, so `{value.id}` and
/// `{locals.base}` both work. Missing values become empty strings.
pub fn inject_url(template: &str, acc: &Accumulator) -> Result<String> {
    let mut failure = None;
    let url = placeholder_regex().replace_all(template, |captures: &Captures<'_>| {
        let expression = format!("$..{}", &captures[1]);
        match path::parse(&expression) {
            Ok(parsed) => match parsed.resolve(acc) {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(text)) => text,
                Some(other) => other.to_string(),
            },
            Err(err) => {
                failure.get_or_insert(err);
                String::new()
            }
        }
    });

    match failure {
        Some(err) => Err(err.into()),
        None => Ok(url.into_owned()),
    }
}

/// Apply request defaults to resolved options
pub fn with_defaults(options: Option<Value>, url: &str) -> Result<Map<String, Value>> {
    let mut options = match options {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(Error::reducer(format!(
                "request options must resolve to an object but received {}",
                type_name(Some(&other))
            )))
        }
    };

    options.entry("method").or_insert_with(|| json!("GET"));
    options.entry("json").or_insert_with(|| json!(true));
    let missing_url = !matches!(options.get("url"), Some(Value::String(text)) if !text.is_empty());
    if missing_url {
        options.insert("url".to_string(), json!(url));
    }
    Ok(options)
}

/// Options as they may be shown in logs and errors
pub fn redact(options: &Map<String, Value>) -> Value {
    let mut redacted = options.clone();
    if redacted.contains_key("auth") {
        redacted.insert("auth".to_string(), json!("[omitted]"));
    }
    Value::Object(redacted)
}

pub(crate) async fn resolve(
    resolver: &Resolver<'_>,
    acc: &Accumulator,
    entity_id: &str,
    spec: &RequestSpec,
    inspect: bool,
) -> Result<Option<Value>> {
    let url = inject_url(&spec.url, acc)?;
    let acc = acc.clone().with_url(url);

    let resolved = match &spec.options {
        Some(options) => resolver.resolve(&acc, options).await?,
        None => None,
    };
    let options = with_defaults(resolved, acc.url().unwrap_or_default())?;
    let redacted = redact(&options);
    let acc = acc.with_options(Value::Object(options));

    if inspect {
        let shown = acc.value().cloned().unwrap_or(Value::Null);
        tracing::info!(entity_id, options = %redacted, value = %shown, "inspecting request");
    }

    let request = RequestOptions::from_value(acc.options().unwrap_or(&Value::Null))?;
    match resolver.transport().request(&request).await {
        Ok(body) => Ok(Some(body)),
        Err(err) => {
            tracing::warn!(entity_id, status_code = ?err.status_code, error = %err, "request failed");
            Err(Error::Request {
                message: format!(
                    "{}\n\nEntity info:\n  - Id: {}\n  - options: {}",
                    err.message, entity_id, redacted
                ),
                status_code: err.status_code,
            })
        }
    }
}
