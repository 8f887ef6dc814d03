//! Authorization error types.

use catman_core::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Authorization flow cancelled: {0}")]
    Cancelled(String),

    #[error("Authorization denied: {0}")]
    Denied(String),

    #[error("No redirect URL received")]
    NoRedirect,

    #[error("Access token not found in response")]
    MissingAccessToken,

    #[error("Invalid redirect URL: {0}")]
    InvalidRedirect(String),

    #[error("OAuth state mismatch")]
    StateMismatch,

    #[error("Port {0} already in use for OAuth redirect")]
    PortInUse(u16),

    #[error("Authorization flow failed: {0}")]
    FlowFailed(String),
}

impl AuthError {
    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Config(e) => e.user_message(),
            Self::PortInUse(_) => "Sign-in port is busy. Close other apps and try again.",
            Self::FlowFailed(_) => "Sign-in failed. Please try again.",
            _ => "Access denied. Please try again.",
        }
    }

    /// True when the user or the authorization server refused access.
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            Self::Cancelled(_)
                | Self::Denied(_)
                | Self::NoRedirect
                | Self::MissingAccessToken
                | Self::StateMismatch
        )
    }
}
