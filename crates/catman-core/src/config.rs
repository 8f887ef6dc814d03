use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Environment variable that overrides `oauth.client_id`
pub const CLIENT_ID_ENV: &str = "CATMAN_CLIENT_ID";

const DEFAULT_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com";
const GMAIL_MODIFY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.modify";
const CLIENT_ID_PLACEHOLDER: &str = "YOUR_GOOGLE_CLIENT_ID";

/// A rejected or suspicious setting, keyed by its dotted path in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingIssue {
    pub setting: &'static str,
    pub message: String,
}

impl std::fmt::Display for SettingIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.setting, self.message)
    }
}

/// Outcome of [`Config::validate`]. Only `errors` block startup.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<SettingIssue>,
    pub warnings: Vec<SettingIssue>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn reject(&mut self, setting: &'static str, message: impl Into<String>) {
        self.errors.push(SettingIssue {
            setting,
            message: message.into(),
        });
    }

    fn warn(&mut self, setting: &'static str, message: impl Into<String>) {
        self.warnings.push(SettingIssue {
            setting,
            message: message.into(),
        });
    }

    /// All errors on one line, `; ` separated
    pub fn summary(&self) -> String {
        let parts: Vec<String> = self.errors.iter().map(SettingIssue::to_string).collect();
        parts.join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// OAuth implicit-grant settings
    #[serde(default)]
    pub oauth: OAuthConfig,

    /// Gmail REST API settings
    #[serde(default)]
    pub gmail: GmailConfig,
}

/// Google OAuth client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    /// OAuth client ID registered in the Google Cloud console.
    /// The registered redirect URI must be `http://127.0.0.1:<redirect_port>/callback`.
    pub client_id: String,

    /// Authorization endpoint
    #[serde(default = "default_auth_url")]
    pub auth_url: String,

    /// Scopes to request, joined by spaces in the authorization URL
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    /// Local port the redirect catcher listens on
    #[serde(default = "default_redirect_port")]
    pub redirect_port: u16,

    /// Seconds to wait for the browser redirect before giving up
    #[serde(default = "default_auth_timeout_secs")]
    pub auth_timeout_secs: u64,
}

fn default_auth_url() -> String {
    DEFAULT_AUTH_URL.to_string()
}

fn default_scopes() -> Vec<String> {
    vec![GMAIL_MODIFY_SCOPE.to_string()]
}

fn default_redirect_port() -> u16 {
    8080
}

fn default_auth_timeout_secs() -> u64 {
    300
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: CLIENT_ID_PLACEHOLDER.to_string(),
            auth_url: default_auth_url(),
            scopes: default_scopes(),
            redirect_port: default_redirect_port(),
            auth_timeout_secs: default_auth_timeout_secs(),
        }
    }
}

impl OAuthConfig {
    /// Check if the client id is set (not empty, not a placeholder)
    pub fn is_configured(&self) -> bool {
        let id = self.client_id.trim();
        !id.is_empty() && !id.starts_with("YOUR_")
    }

    /// The configured client id.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingSetting` when the id is empty or still the placeholder.
    pub fn client_id(&self) -> Result<&str, ConfigError> {
        if self.is_configured() {
            Ok(self.client_id.trim())
        } else {
            Err(ConfigError::MissingSetting("oauth.client_id".to_string()))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GmailConfig {
    /// Base URL of the Gmail REST API (without `/gmail/v1`)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Default for GmailConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from `path`, writing defaults there if the file is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str::<Config>(&contents)
                .map_err(|e| ConfigError::ParseError(e.to_string()))
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            tracing::info!("No config at {}, writing defaults", path.display());
            let config = Self::default();
            config.save_to(path)?;
            config
        };

        Ok(config.with_env_overrides())
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated(path: Option<&Path>) -> Result<(Self, ValidationResult)> {
        let config = match path {
            Some(p) => Self::load_from(p)?,
            None => Self::load()?,
        };
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(ConfigError::Invalid(validation.summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(client_id) = std::env::var(CLIENT_ID_ENV) {
            if !client_id.trim().is_empty() {
                self.oauth.client_id = client_id;
            }
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        validate_url(&self.oauth.auth_url, "oauth.auth_url", &mut result);
        validate_url(&self.gmail.api_base_url, "gmail.api_base_url", &mut result);

        if self.oauth.redirect_port == 0 {
            result.reject("oauth.redirect_port", "Port cannot be 0");
        }

        if self.oauth.auth_timeout_secs == 0 {
            result.reject("oauth.auth_timeout_secs", "Sign-in timeout must be at least one second");
        }

        if self.oauth.scopes.iter().all(|s| s.trim().is_empty()) {
            result.reject("oauth.scopes", "At least one scope is required");
        }

        // Allowed for headless use with a pre-obtained token
        if !self.oauth.is_configured() {
            result.warn(
                "oauth.client_id",
                "OAuth client id not configured - interactive sign-in is unavailable",
            );
        }

        result
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the default configuration file
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("catman");

        Ok(config_dir.join("config.toml"))
    }
}

fn validate_url(url_str: &str, setting: &'static str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.reject(
                    setting,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }

            if url.host().is_none() {
                result.reject(setting, "URL must have a host");
            }
        }
        Err(e) => {
            result.reject(setting, format!("Invalid URL: {}", e));
        }
    }
}
