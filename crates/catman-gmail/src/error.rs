//! Gmail-specific error types.

use catman_auth::AuthError;
use catman_core::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GmailError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Label '{0}' not found")]
    LabelNotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl From<reqwest::Error> for GmailError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

impl GmailError {
    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(e) => e.user_message().to_string(),
            Self::Auth(e) => e.user_message().to_string(),
            Self::LabelNotFound(name) => format!("Label '{}' not found!", name),
            Self::Network(msg) => format!("Network error: {}", msg),
            Self::Api { message, .. } => format!("Gmail error: {}", message),
        }
    }
}
