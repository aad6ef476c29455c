//! Engine configuration
//!
//! Configuration can be deserialized from JSON and then overridden from the
//! environment:
//!
//! - `DATAPOINT_TRACE`: trace every entity resolution (`true`/`1`)
//! - `DATAPOINT_REQUEST_TIMEOUT_SECS`: default request timeout
//! - `DATAPOINT_VALIDATE_TLS`: verify TLS certificates (`true`/`1`)
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Configuration for the default HTTP transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Whether to validate TLS certificates
    pub validate_tls: bool,
    /// User agent sent with every request
    pub user_agent: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            validate_tls: true,
            user_agent: None,
        }
    }
}

/// Top-level configuration of a [`crate::DataPoint`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPointConfig {
    /// Trace every entity resolution
    pub trace: bool,
    /// Initial contents of the `$..values` scope
    pub values: Map<String, Value>,
    pub transport: TransportConfig,
}

impl DataPointConfig {
    /// Parse a configuration document
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|err| Error::Configuration {
            message: format!("Invalid configuration: {}", err),
            source: Some(err.into()),
        })
    }

    /// Apply `DATAPOINT_*` environment overrides
    pub fn merge_with_env(&mut self) {
        self.merge_from(|key| std::env::var(key).ok());
    }

    fn merge_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(trace) = lookup("DATAPOINT_TRACE") {
            self.trace = parse_flag(&trace);
        }

        if let Some(timeout) = lookup("DATAPOINT_REQUEST_TIMEOUT_SECS") {
            match timeout.trim().parse::<u64>() {
                Ok(secs) => self.transport.timeout_secs = secs,
                Err(_) => tracing::warn!("Invalid request timeout: {}, using {}", timeout, self.transport.timeout_secs),
            }
        }

        if let Some(validate) = lookup("DATAPOINT_VALIDATE_TLS") {
            self.transport.validate_tls = parse_flag(&validate);
        }
    }
}

fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = DataPointConfig::default();
        assert!(!config.trace);
        assert_eq!(config.transport.timeout_secs, 30);
        assert!(config.transport.validate_tls);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = DataPointConfig::from_json_str(r#"{"trace": true, "values": {"server": "x"}}"#).unwrap();
        assert!(config.trace);
        assert_eq!(config.values["server"], "x");
        assert_eq!(config.transport, TransportConfig::default());

        assert!(matches!(
            DataPointConfig::from_json_str("{"),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("DATAPOINT_TRACE", "1"),
            ("DATAPOINT_REQUEST_TIMEOUT_SECS", "5"),
            ("DATAPOINT_VALIDATE_TLS", "false"),
        ]
        .into_iter()
        .collect();

        let mut config = DataPointConfig::default();
        config.merge_from(|key| env.get(key).map(|v| v.to_string()));
        assert!(config.trace);
        assert_eq!(config.transport.timeout_secs, 5);
        assert!(!config.transport.validate_tls);
    }

    #[test]
    fn test_invalid_timeout_is_ignored() {
        let mut config = DataPointConfig::default();
        config.merge_from(|key| (key == "DATAPOINT_REQUEST_TIMEOUT_SECS").then(|| "soon".to_string()));
        assert_eq!(config.transport.timeout_secs, 30);
    }
}
