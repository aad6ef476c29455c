//! HTTP transport for request entities
//!
//! Request entities describe *what* to fetch as [`RequestOptions`]; a
//! [`Transport`] performs the call. [`ReqwestTransport`] is the default
//! implementation; tests and embedders can supply their own.
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use crate::config::TransportConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Method};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Options of a single request, read from the entity's resolved `options`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestOptions {
    pub method: String,
    pub url: String,
    /// Joined with `url` when present
    pub base_url: Option<String>,
    #[serde(alias = "query")]
    pub qs: Option<Map<String, Value>>,
    pub headers: Option<Map<String, Value>>,
    pub body: Option<Value>,
    /// Send `body` as JSON and parse the response as JSON
    pub json: bool,
    /// Per-request timeout in milliseconds
    pub timeout: Option<u64>,
    pub auth: Option<RequestAuth>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            url: String::new(),
            base_url: None,
            qs: None,
            headers: None,
            body: None,
            json: true,
            timeout: None,
            auth: None,
        }
    }
}

/// Basic or bearer credentials
#[derive(Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestAuth {
    #[serde(alias = "username")]
    pub user: String,
    #[serde(alias = "password")]
    pub pass: Option<String>,
    pub bearer: Option<String>,
}

impl fmt::Debug for RequestAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RequestAuth([omitted])")
    }
}

impl RequestOptions {
    /// Read options from a JSON object
    ///
    /// A `json` key holding an object is treated as the JSON body.
    pub fn from_value(options: &Value) -> Result<Self> {
        let mut options = options.clone();
        if let Some(map) = options.as_object_mut() {
            if matches!(map.get("json"), Some(Value::Object(_)) | Some(Value::Array(_))) {
                if let Some(body) = map.insert("json".to_string(), Value::Bool(true)) {
                    map.insert("body".to_string(), body);
                }
            }
        }
        serde_json::from_value(options).map_err(Error::from)
    }

    /// The absolute URL to call
    pub fn resolved_url(&self) -> std::result::Result<Url, TransportError> {
        let parsed = match &self.base_url {
            Some(base) => Url::parse(base).and_then(|base| base.join(&self.url)),
            None => Url::parse(&self.url),
        };
        parsed.map_err(|err| TransportError::new(format!("Invalid URL '{}': {}", self.url, err)))
    }
}

/// Normalized transport failure
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub status_code: Option<u16>,
    pub message: String,
    /// Response body, parsed as JSON when possible
    pub body: Option<Value>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status_code: None,
            message: message.into(),
            body: None,
        }
    }
}

/// Performs the HTTP call of a request entity
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, options: &RequestOptions) -> std::result::Result<Value, TransportError>;
}

/// Default transport backed by `reqwest`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: ReqwestClient,
    config: TransportConfig,
}

impl ReqwestTransport {
    pub fn new(config: TransportConfig) -> Result<Self> {
        let mut builder = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.validate_tls);
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }

        let client = builder.build().map_err(|e| Error::Configuration {
            message: format!("Failed to create HTTP client: {}", e),
            source: Some(e.into()),
        })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn request(&self, options: &RequestOptions) -> std::result::Result<Value, TransportError> {
        let url = options.resolved_url()?;
        let method = Method::from_bytes(options.method.to_uppercase().as_bytes())
            .map_err(|_| TransportError::new(format!("Invalid HTTP method '{}'", options.method)))?;

        let mut request = self.client.request(method, url);
        if let Some(qs) = &options.qs {
            let pairs: Vec<(&str, String)> = qs.iter().map(|(k, v)| (k.as_str(), text_of(v))).collect();
            request = request.query(&pairs);
        }
        if let Some(headers) = &options.headers {
            for (name, value) in headers {
                request = request.header(name.as_str(), text_of(value));
            }
        }
        if let Some(auth) = &options.auth {
            request = match &auth.bearer {
                Some(token) => request.bearer_auth(token),
                None => request.basic_auth(&auth.user, auth.pass.as_ref()),
            };
        }
        if let Some(millis) = options.timeout {
            request = request.timeout(Duration::from_millis(millis));
        }
        if let Some(body) = &options.body {
            request = if options.json {
                request.json(body)
            } else {
                request.body(text_of(body))
            };
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::new(format!("Request failed: {}", e)))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::new(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
            return Err(TransportError {
                status_code: Some(status.as_u16()),
                message: format!("{} - {}", status.as_u16(), text_of(&body)),
                body: Some(body),
            });
        }

        if !options.json {
            return Ok(Value::String(text));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| TransportError::new(format!("Failed to parse response as JSON: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_options_defaults() {
        let options = RequestOptions::from_value(&json!({"url": "https://example.test"})).unwrap();
        assert_eq!(options.method, "GET");
        assert!(options.json);
        assert!(options.body.is_none());
    }

    #[test]
    fn test_options_aliases() {
        let options = RequestOptions::from_value(&json!({
            "url": "/people/1",
            "baseUrl": "https://example.test/api/",
            "query": {"page": 2},
            "json": {"name": "Luke"},
            "auth": {"username": "u", "password": "p"}
        }))
        .unwrap();

        assert_eq!(options.qs.as_ref().map(|qs| qs["page"].clone()), Some(json!(2)));
        assert_eq!(options.body, Some(json!({"name": "Luke"})));
        assert!(options.json);
        assert_eq!(options.auth.as_ref().map(|a| a.user.as_str()), Some("u"));
        assert_eq!(format!("{:?}", options.auth), "Some(RequestAuth([omitted]))");
        assert_eq!(options.resolved_url().unwrap().as_str(), "https://example.test/people/1");
    }

    #[test]
    fn test_invalid_url() {
        let options = RequestOptions::from_value(&json!({"url": "not a url"})).unwrap();
        assert!(options.resolved_url().is_err());
    }

    #[test]
    fn test_reqwest_transport_builds_from_config() {
        let transport = ReqwestTransport::new(TransportConfig {
            timeout_secs: 5,
            ..TransportConfig::default()
        })
        .unwrap();
        assert_eq!(transport.config().timeout_secs, 5);
    }
}
