use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf, time::Duration};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Base URL used when nothing else is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8081";

/// Path of the login endpoint relative to the API base URL.
pub const LOGIN_PATH: &str = "api/auth/login";

const ENV_API_URL: &str = "SIGNON_API_URL";
const ENV_REQUEST_TIMEOUT: &str = "SIGNON_REQUEST_TIMEOUT_SECS";
const ENV_STORAGE_PATH: &str = "SIGNON_STORAGE_PATH";
const ENV_LOG_LEVEL: &str = "SIGNON_LOG_LEVEL";

/// Errors raised while loading or rendering a [`ClientConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The file extension or requested format is not one we understand.
    #[error("unsupported configuration format '{0}'. Use 'yaml', 'json' or 'toml'.")]
    UnsupportedFormat(String),

    /// YAML content failed to parse.
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yml::Error),

    /// JSON content failed to parse.
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML content failed to parse.
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// An environment variable held an unusable value.
    #[error("invalid {name} value '{value}': {reason}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Raw value found in the environment.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The resolved configuration failed validation.
    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),

    /// The configuration could not be rendered.
    #[error("failed to serialize configuration: {0}")]
    Serialize(String),
}

/// Configuration for the login client.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the authentication API.
    pub api_base_url: Url,

    /// Upper bound on a single login request, in seconds.
    pub request_timeout_secs: u64,

    /// Delay between a successful login and navigation, in milliseconds.
    pub redirect_delay_ms: u64,

    /// Route navigated to after a successful login.
    pub home_route: String,

    /// Where session artifacts are stored. Falls back to the user config
    /// directory when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<PathBuf>,

    /// Logging level used when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ClientConfig {
    /// Generates a default configuration.
    ///
    /// # Panics
    /// Never in practice: the default base URL is a valid constant.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            api_base_url: Url::parse(DEFAULT_API_BASE_URL).expect("default API base URL is valid"),
            request_timeout_secs: 10,
            redirect_delay_ms: 1500,
            home_route: "/".to_string(),
            storage_path: None,
            log_level: "info".to_string(),
        }
    }

    /// Loads the configuration from a file, environment variables, or defaults.
    ///
    /// Environment variables only apply to values the file left at their
    /// defaults. `api_url_override` wins over both.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, an environment
    /// variable is malformed, or the result fails [`ClientConfig::validate`].
    pub fn load_config(
        config_path: Option<PathBuf>,
        api_url_override: Option<Url>,
    ) -> Result<Self, ConfigError> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => Self::with_defaults(),
        };

        config.apply_env_overrides()?;

        if let Some(url) = api_url_override {
            config.api_base_url = url;
        }

        config.validate().map_err(ConfigError::Invalid)?;
        debug!(api_base_url = %config.api_base_url, "resolved client configuration");
        Ok(config)
    }

    fn from_file(path: PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();

        match extension {
            "yaml" | "yml" => Ok(serde_yml::from_str(&content)?),
            "json" => Ok(serde_json::from_str(&content)?),
            "toml" => Ok(toml::from_str(&content)?),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let defaults = Self::with_defaults();

        if self.api_base_url == defaults.api_base_url {
            if let Ok(value) = env::var(ENV_API_URL) {
                self.api_base_url =
                    Url::parse(&value).map_err(|err| ConfigError::InvalidEnv {
                        name: ENV_API_URL,
                        value: value.clone(),
                        reason: err.to_string(),
                    })?;
            }
        }
        if self.request_timeout_secs == defaults.request_timeout_secs {
            if let Ok(value) = env::var(ENV_REQUEST_TIMEOUT) {
                self.request_timeout_secs =
                    value.parse().map_err(|_| ConfigError::InvalidEnv {
                        name: ENV_REQUEST_TIMEOUT,
                        value: value.clone(),
                        reason: "must be a whole number of seconds".to_string(),
                    })?;
            }
        }
        if self.storage_path.is_none() {
            if let Ok(value) = env::var(ENV_STORAGE_PATH) {
                self.storage_path = Some(PathBuf::from(value));
            }
        }
        if self.log_level == defaults.log_level {
            if let Ok(value) = env::var(ENV_LOG_LEVEL) {
                self.log_level = value;
            }
        }

        Ok(())
    }

    /// Validate the configuration, collecting every problem.
    ///
    /// # Errors
    /// Returns the list of problems found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !matches!(self.api_base_url.scheme(), "http" | "https") {
            errors.push(format!(
                "Invalid API base URL scheme '{}'. Use http or https.",
                self.api_base_url.scheme()
            ));
        }

        if self.request_timeout_secs == 0 {
            errors.push("Invalid request timeout. Must be greater than 0.".to_string());
        }

        if !self.home_route.starts_with('/') {
            errors.push(format!(
                "Invalid home route '{}'. Must start with '/'.",
                self.home_route
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Full URL of the login endpoint.
    ///
    /// Any path on the base URL is kept, so `https://host/auth` resolves to
    /// `https://host/auth/api/auth/login`.
    ///
    /// # Errors
    /// Returns an error if the joined URL does not parse.
    pub fn login_url(&self) -> Result<Url, url::ParseError> {
        let base = self.api_base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/{LOGIN_PATH}"))
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Post-login navigation delay as a [`Duration`].
    #[must_use]
    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }

    /// The configured storage path, or the per-user default.
    #[must_use]
    pub fn resolved_storage_path(&self) -> PathBuf {
        self.storage_path
            .clone()
            .unwrap_or_else(Self::default_storage_path)
    }

    /// Default location of the session store.
    #[must_use]
    pub fn default_storage_path() -> PathBuf {
        BaseDirs::new().map_or_else(
            || PathBuf::from("./signon-storage.json"),
            |dirs| dirs.config_dir().join("signon").join("storage.json"),
        )
    }

    /// Render the configuration in `format` (`yaml`, `json` or `toml`).
    ///
    /// # Errors
    /// Returns an error for an unknown format or a serializer failure.
    pub fn render(&self, format: &str) -> Result<String, ConfigError> {
        match format {
            "yaml" | "yml" => {
                serde_yml::to_string(self).map_err(|err| ConfigError::Serialize(err.to_string()))
            }
            "json" => serde_json::to_string_pretty(self)
                .map_err(|err| ConfigError::Serialize(err.to_string())),
            "toml" => {
                toml::to_string_pretty(self).map_err(|err| ConfigError::Serialize(err.to_string()))
            }
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }
}
