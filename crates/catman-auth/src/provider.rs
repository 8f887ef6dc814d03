use std::future::Future;
use std::time::Duration;

use oauth2::AccessToken;

use catman_core::ConfigError;

use crate::error::AuthError;
use crate::google::GoogleImplicitProvider;
use crate::loopback::LoopbackHost;

/// Source of short-lived bearer tokens.
///
/// Every top-level Gmail operation calls `acquire_token` once; tokens are
/// never cached or refreshed here.
pub trait TokenProvider: Send + Sync {
    fn acquire_token(&self) -> impl Future<Output = Result<AccessToken, AuthError>> + Send;
}

/// Host side of an interactive web authorization flow.
///
/// The host owns the redirect target and the user-facing browser step; the
/// provider only builds the authorization URL and parses what comes back.
pub trait AuthFlowHost: Send + Sync {
    /// Redirect URI registered for this client
    fn redirect_url(&self) -> String;

    /// Open `auth_url` and wait for exactly one redirect.
    ///
    /// Returns the full URL the browser was redirected to, or `None` when the
    /// flow ended without one.
    fn launch_web_auth_flow(
        &self,
        auth_url: &str,
    ) -> impl Future<Output = Result<Option<String>, AuthError>> + Send;
}

/// Provider for a token obtained outside this process.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl TokenProvider for StaticTokenProvider {
    async fn acquire_token(&self) -> Result<AccessToken, AuthError> {
        let token = self.token.trim();
        if token.is_empty() {
            return Err(ConfigError::MissingSetting("access token".to_string()).into());
        }
        Ok(AccessToken::new(token.to_string()))
    }
}

/// Token provider selected at startup.
pub enum TokenSource {
    Static(StaticTokenProvider),
    Interactive(GoogleImplicitProvider<LoopbackHost>),
}

impl TokenSource {
    /// Use `token` when given, otherwise the interactive Google flow.
    pub fn from_config(oauth: &catman_core::OAuthConfig, token: Option<String>) -> Self {
        match token {
            Some(token) => {
                tracing::debug!("Using pre-obtained access token");
                Self::Static(StaticTokenProvider::new(token))
            }
            None => Self::Interactive(GoogleImplicitProvider::new(
                oauth.clone(),
                LoopbackHost::new(oauth.redirect_port)
                    .with_timeout(Duration::from_secs(oauth.auth_timeout_secs)),
            )),
        }
    }
}

impl TokenProvider for TokenSource {
    async fn acquire_token(&self) -> Result<AccessToken, AuthError> {
        match self {
            Self::Static(p) => p.acquire_token().await,
            Self::Interactive(p) => p.acquire_token().await,
        }
    }
}
