use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Client configuration loaded from multiple sources.
///
/// Configuration is loaded in priority order (lowest to highest):
/// 1. Struct defaults
/// 2. YAML file (if it exists)
/// 3. Environment variables with `API_CLIENT_` prefix (always wins)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Prefix for relative request URLs.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Maximum pages visited by `for_each_page`. Unbounded when unset.
    #[serde(default)]
    pub max_pages: Option<usize>,

    /// `User-Agent` header added to requests that do not set one.
    #[serde(default)]
    pub user_agent: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

const ENV_PREFIX: &str = "API_CLIENT_";
const DEFAULT_FILE: &str = "api-client.yaml";

impl ClientConfig {
    /// Load configuration from defaults, `api-client.yaml` and the
    /// environment.
    ///
    /// # Errors
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_FILE)
    }

    /// Load configuration with a custom YAML file path.
    ///
    /// # Errors
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load_from(yaml_path: &str) -> Result<Self, ConfigError> {
        let config: Self = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Yaml::file(yaml_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(base_url) = &self.base_url {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err(ConfigError::Validation(format!(
                    "base_url '{base_url}' must start with http:// or https://"
                )));
            }
        }

        if self.max_pages == Some(0) {
            return Err(ConfigError::Validation("max_pages cannot be 0".into()));
        }

        if self.user_agent.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::Validation(
                "user_agent cannot be empty. Unset it to send no User-Agent.".into(),
            ));
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Validation("logging.level cannot be empty".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert!(config.base_url.is_none());
        assert!(config.max_pages.is_none());
        assert!(config.user_agent.is_none());
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_loads_yaml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "client.yaml",
                "base_url: https://dummyjson.com\nmax_pages: 20\nlogging:\n  level: debug\n",
            )?;

            let config = ClientConfig::load_from("client.yaml").map_err(|e| e.to_string())?;
            assert_eq!(config.base_url.as_deref(), Some("https://dummyjson.com"));
            assert_eq!(config.max_pages, Some(20));
            assert_eq!(config.logging.level, "debug");
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_yaml() {
        Jail::expect_with(|jail| {
            jail.create_file("client.yaml", "base_url: https://from-file.example.com")?;
            jail.set_env("API_CLIENT_BASE_URL", "https://from-env.example.com");
            jail.set_env("API_CLIENT_LOGGING__LEVEL", "warn");
            jail.set_env("API_CLIENT_USER_AGENT", "generic-api-client/test");

            let config = ClientConfig::load_from("client.yaml").map_err(|e| e.to_string())?;
            assert_eq!(
                config.base_url.as_deref(),
                Some("https://from-env.example.com")
            );
            assert_eq!(config.logging.level, "warn");
            assert_eq!(config.user_agent.as_deref(), Some("generic-api-client/test"));
            Ok(())
        });
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        Jail::expect_with(|_jail| {
            let config = ClientConfig::load().map_err(|e| e.to_string())?;
            assert!(config.base_url.is_none());
            assert_eq!(config.logging.level, "info");
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        Jail::expect_with(|jail| {
            jail.set_env("API_CLIENT_MAX_PAGES", "0");

            let err = ClientConfig::load().unwrap_err();
            assert!(err.to_string().contains("max_pages"));
            Ok(())
        });
    }

    // Table-driven boundary tests for validation rules

    #[test]
    fn base_url_boundaries() {
        let cases = [
            (None, true, "unset"),
            (Some("https://example.com"), true, "https"),
            (Some("http://localhost:8080/api"), true, "http with port and path"),
            (Some("ftp://files.com"), false, "ftp scheme"),
            (Some("example.com"), false, "no scheme"),
            (Some(""), false, "empty string"),
        ];

        for (base_url, should_pass, desc) in cases {
            let config = ClientConfig {
                base_url: base_url.map(String::from),
                ..ClientConfig::default()
            };
            let result = config.validate();
            assert_eq!(result.is_ok(), should_pass, "case '{}': {:?}", desc, result);
        }
    }

    #[test]
    fn max_pages_boundaries() {
        let cases = [
            (None, true, "unbounded"),
            (Some(0usize), false, "zero pages"),
            (Some(1), true, "minimum valid"),
            (Some(1000), true, "high value"),
        ];

        for (max_pages, should_pass, desc) in cases {
            let config = ClientConfig {
                max_pages,
                ..ClientConfig::default()
            };
            let result = config.validate();
            assert_eq!(result.is_ok(), should_pass, "case '{}': {:?}", desc, result);
        }
    }

    #[test]
    fn test_validation_rejects_empty_user_agent() {
        let config = ClientConfig {
            user_agent: Some(String::new()),
            ..ClientConfig::default()
        };
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("user_agent"));
    }
}
