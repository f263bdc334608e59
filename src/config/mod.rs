//! Configuration loading and management

use crate::core::error::{ConfigError, CrudResult};
use crate::core::provider::Operation;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Client-facing messages the host may override
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    /// Sent for every server-error outcome in place of the real cause
    pub internal_error: String,

    /// Sent when a request body cannot be decoded
    pub malformed_body: String,

    /// Sent for disabled operations and unknown routes
    pub not_found: String,

    /// Sent on a successful delete
    pub deleted: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            internal_error: "An unexpected error occurred".to_string(),
            malformed_body: "Improperly formatted request body".to_string(),
            not_found: "Not Found".to_string(),
            deleted: "Success".to_string(),
        }
    }
}

/// Process-wide configuration, read once at startup
///
/// ```yaml
/// messages:
///   internal_error: "Something broke"
/// disabled:
///   fish: [delete]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub messages: MessagesConfig,

    /// Operations switched off per resource token, on top of the provider's flags
    pub disabled: HashMap<String, Vec<Operation>>,
}

impl ApiConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> CrudResult<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                file: Some(path.to_string()),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> CrudResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn is_disabled(&self, token: &str, operation: Operation) -> bool {
        self.disabled
            .get(token)
            .is_some_and(|ops| ops.contains(&operation))
    }

    pub(crate) fn disabled_operations(&self, token: &str) -> Vec<Operation> {
        self.disabled.get(token).cloned().unwrap_or_default()
    }
}
