//! Runtime configuration
//!
//! Pages pass a JSON configuration object to the runtime, e.g.
//!
//! ```json
//! { "framework": "vue", "debug": false, "expressionCacheSize": 256 }
//! ```

use accelade_types::{SubstrateId, UnknownSubstrate};
use serde::{Deserialize, Serialize};

/// Default capacity of the parsed-expression cache
pub const DEFAULT_EXPRESSION_CACHE_SIZE: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AcceladeConfig {
    /// Substrate requested by the page, bypassing detection
    pub framework: Option<String>,

    /// Log binding activity at debug level
    pub debug: bool,

    /// Capacity of the parsed-expression cache
    pub expression_cache_size: usize,

    /// Only allow plain dotted paths in binding expressions
    pub strict_expressions: bool,
}

impl Default for AcceladeConfig {
    fn default() -> Self {
        Self {
            framework: None,
            debug: false,
            expression_cache_size: DEFAULT_EXPRESSION_CACHE_SIZE,
            strict_expressions: false,
        }
    }
}

impl AcceladeConfig {
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.expression_cache_size == 0 {
            return Err(ConfigError::Invalid(
                "expressionCacheSize must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_framework(mut self, framework: impl Into<String>) -> Self {
        self.framework = Some(framework.into());
        self
    }

    /// The explicitly requested substrate, if any
    pub fn requested_substrate(&self) -> Option<Result<SubstrateId, UnknownSubstrate>> {
        self.framework
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| name.parse::<SubstrateId>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = AcceladeConfig::from_json_str(r#"{"framework": "react"}"#).unwrap();
        assert_eq!(config.framework.as_deref(), Some("react"));
        assert_eq!(config.expression_cache_size, DEFAULT_EXPRESSION_CACHE_SIZE);
        assert!(!config.strict_expressions);
        assert_eq!(config.requested_substrate(), Some(Ok(SubstrateId::React)));
    }

    #[test]
    fn test_camel_case_keys() {
        let config = AcceladeConfig::from_value(serde_json::json!({
            "debug": true,
            "expressionCacheSize": 8,
            "strictExpressions": true,
        }))
        .unwrap();
        assert!(config.debug);
        assert_eq!(config.expression_cache_size, 8);
        assert!(config.strict_expressions);
        assert_eq!(config.requested_substrate(), None);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            AcceladeConfig::from_json_str(r#"{"expressionCacheSize": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AcceladeConfig::from_json_str("{"),
            Err(ConfigError::Parse(_))
        ));

        let config = AcceladeConfig::default().with_framework("ember");
        assert!(matches!(config.requested_substrate(), Some(Err(_))));
    }
}
