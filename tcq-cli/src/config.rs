//! Configuration loading for the tcq CLI.
//!
//! Settings come from an optional TOML file (`--config` or `TCQ_CONFIG`),
//! after which API credentials may be overridden from the environment.
//! Validation runs once, after both layers are applied.

use secrecy::SecretString;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tcq_client::{ApiCredentials, DEFAULT_API_VERSION, DEFAULT_TIMEOUT_MS};
use tcq_core::{SearchKind, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

pub const CONFIG_PATH_ENV: &str = "TCQ_CONFIG";

/// Environment variables consulted for each credential, first match wins.
const ACCESS_ID_VARS: &[&str] = &["TC_ACCESS_ID", "tc_accessid"];
const SECRET_KEY_VARS: &[&str] = &["TC_SECRET_KEY", "tc_secretkey"];
const INSTANCE_VARS: &[&str] = &["TC_INSTANCE", "tc_company"];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TcqConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    #[serde(default)]
    pub access_id: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub instance: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            access_id: String::new(),
            secret_key: String::new(),
            instance: String::new(),
            api_version: default_api_version(),
            request_timeout_ms: default_timeout_ms(),
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("access_id", &self.access_id)
            .field("secret_key", &"[REDACTED]")
            .field("instance", &self.instance)
            .field("api_version", &self.api_version)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    #[serde(default = "default_kind")]
    pub default_kind: SearchKind,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub default_owner: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_kind: default_kind(),
            page_size: default_page_size(),
            default_owner: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive. `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            format: LogFormat::default(),
        }
    }
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_kind() -> SearchKind {
    SearchKind::Indicators
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_log_filter() -> String {
    "warn,tcq_client=info".to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl TcqConfig {
    /// Load from `explicit_path`, else `TCQ_CONFIG`, else defaults; then apply
    /// credential overrides from the process environment and validate.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = explicit_path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));
        let mut config = match path {
            Some(path) => Self::from_path(&path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Override credentials with the first non-empty value `lookup` finds.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| lookup(name))
                .find(|value| !value.trim().is_empty())
        };
        if let Some(value) = first(ACCESS_ID_VARS) {
            self.api.access_id = value;
        }
        if let Some(value) = first(SECRET_KEY_VARS) {
            self.api.secret_key = value;
        }
        if let Some(value) = first(INSTANCE_VARS) {
            self.api.instance = value;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.access_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api.access_id",
                reason: "must not be empty (set it in the config file or TC_ACCESS_ID)".to_string(),
            });
        }
        if self.api.secret_key.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api.secret_key",
                reason: "must not be empty (set it in the config file or TC_SECRET_KEY)".to_string(),
            });
        }
        if self.api.instance.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api.instance",
                reason: "must not be empty (set it in the config file or TC_INSTANCE)".to_string(),
            });
        }
        if !self
            .api
            .instance
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(ConfigError::InvalidValue {
                field: "api.instance",
                reason: "must be a bare host label such as 'mycompany'".to_string(),
            });
        }
        if self.api.api_version.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api.api_version",
                reason: "must not be empty".to_string(),
            });
        }
        if self.api.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "api.request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.search.page_size) {
            return Err(ConfigError::InvalidValue {
                field: "search.page_size",
                reason: format!("must be between 1 and {}", MAX_PAGE_SIZE),
            });
        }
        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "logging.filter",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn credentials(&self) -> ApiCredentials {
        let mut credentials = ApiCredentials::new(
            self.api.access_id.clone(),
            SecretString::from(self.api.secret_key.clone()),
            self.api.instance.clone(),
        );
        credentials.api_version = self.api.api_version.clone();
        credentials.request_timeout_ms = self.api.request_timeout_ms;
        credentials
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn valid_config() -> TcqConfig {
        TcqConfig::from_toml(
            r#"
            [api]
            access_id = "12345"
            secret_key = "s3cret"
            instance = "acme"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = valid_config();
        assert_eq!(config.api.api_version, "v3");
        assert_eq!(config.api.request_timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(config.search.default_kind, SearchKind::Indicators);
        assert_eq!(config.search.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_file() {
        let config = TcqConfig::from_toml(
            r#"
            [api]
            access_id = "12345"
            secret_key = "s3cret"
            instance = "acme"
            api_version = "v3"
            request_timeout_ms = 5000

            [search]
            default_kind = "both"
            page_size = 50
            default_owner = "Acme Corp"

            [logging]
            filter = "debug"
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.search.default_kind, SearchKind::Both);
        assert_eq!(config.search.default_owner.as_deref(), Some("Acme Corp"));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let err = TcqConfig::from_toml("[api]\ntoken = \"x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let err = TcqConfig::from_toml("[logging]\nformat = \"xml\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_empty_secret_rejected() {
        let mut config = valid_config();
        config.api.secret_key = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "api.secret_key",
                ..
            })
        ));
    }

    #[test]
    fn test_missing_credentials_rejected() {
        assert!(TcqConfig::default().validate().is_err());
    }

    #[test]
    fn test_bad_values_rejected() {
        let mut config = valid_config();
        config.api.request_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.search.page_size = MAX_PAGE_SIZE + 1;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.api.instance = "acme.threatconnect.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("tc_accessid", "legacy-id"),
            ("TC_SECRET_KEY", "from-env"),
            ("tc_secretkey", "ignored"),
            ("TC_INSTANCE", " "),
            ("tc_company", "globex"),
        ]
        .into_iter()
        .collect();

        let mut config = valid_config();
        config.apply_env_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.api.access_id, "legacy-id");
        assert_eq!(config.api.secret_key, "from-env");
        assert_eq!(config.api.instance, "globex");
    }

    #[test]
    fn test_env_overrides_keep_file_values_when_unset() {
        let mut config = valid_config();
        config.apply_env_overrides(|_| None);
        assert_eq!(config.api.access_id, "12345");
    }

    #[test]
    fn test_credentials() {
        let credentials = valid_config().credentials();
        assert_eq!(credentials.base_url(), "https://acme.threatconnect.com/api/v3");
    }

    #[test]
    fn test_debug_redacts_secret() {
        assert!(!format!("{:?}", valid_config()).contains("s3cret"));
    }
}
