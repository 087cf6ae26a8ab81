//! Plugin configuration.
//!
//! ```toml
//! [config]
//! environment = "6f2d6a5e-0c41-4c55-b9a4-1b0e3f6f0b3a"
//!
//! [store]
//! base_url = "http://localhost:8888"
//! ```

use std::path::Path;

use forms_core::{FormError, Result};
use forms_sdk::StoreClientConfig;
use serde::{Deserialize, Serialize};

/// Environment variable overriding `config.environment`.
pub const ENVIRONMENT_VAR: &str = "FORMS_ENVIRONMENT";

/// Environment variable overriding `store.base_url`.
pub const STORE_URL_VAR: &str = "FORMS_STORE_URL";

/// The `[config]` namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigSection {
    /// Environment all forms and records belong to.
    #[serde(default)]
    pub environment: Option<String>,
}

/// Configuration of the form plugin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginConfig {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub store: StoreClientConfig,
}

impl PluginConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| FormError::ConfigError(e.to_string()))
    }

    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| FormError::ConfigError(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Default configuration with overrides from the process environment.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `FORMS_ENVIRONMENT` and `FORMS_STORE_URL` if they are set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(environment) = std::env::var(ENVIRONMENT_VAR) {
            self.config.environment = Some(environment);
        }
        if let Ok(url) = std::env::var(STORE_URL_VAR) {
            self.store.base_url = url;
        }
        self
    }

    /// Set the environment.
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.config.environment = Some(environment.into());
        self
    }

    /// The configured environment, required by every store call.
    pub fn environment(&self) -> Result<&str> {
        self.config
            .environment
            .as_deref()
            .map(str::trim)
            .filter(|env| !env.is_empty())
            .ok_or(FormError::EnvironmentNotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = PluginConfig::from_toml_str(
            r#"
            [config]
            environment = "dev"

            [store]
            base_url = "http://store:9000"
            timeout_ms = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.environment().unwrap(), "dev");
        assert_eq!(config.store.base_url, "http://store:9000");
        assert_eq!(config.store.timeout_ms, 500);
    }

    #[test]
    fn test_missing_environment() {
        let config = PluginConfig::from_toml_str("[store]\nbase_url = \"http://x\"\n").unwrap();
        assert!(matches!(
            config.environment(),
            Err(FormError::EnvironmentNotConfigured)
        ));

        let blank = PluginConfig::default().with_environment("  ");
        assert!(blank.environment().is_err());
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            PluginConfig::from_toml_str("[config\nenvironment = 1"),
            Err(FormError::ConfigError(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = PluginConfig::load("/nonexistent/forms.toml").unwrap_err();
        assert!(matches!(err, FormError::ConfigError(_)));
    }
}
