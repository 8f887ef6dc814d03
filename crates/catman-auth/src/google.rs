//! Google OAuth2 implicit grant.
//!
//! The access token comes back in the redirect URL fragment, so there is no
//! code exchange and no client secret.

use std::collections::HashMap;

use oauth2::basic::BasicClient;
use oauth2::{AccessToken, AuthUrl, ClientId, CsrfToken, RedirectUrl, Scope};
use url::{form_urlencoded, Url};

use catman_core::{ConfigError, OAuthConfig};

use crate::error::AuthError;
use crate::provider::{AuthFlowHost, TokenProvider};

pub struct GoogleImplicitProvider<H> {
    config: OAuthConfig,
    host: H,
}

impl<H: AuthFlowHost> GoogleImplicitProvider<H> {
    pub fn new(config: OAuthConfig, host: H) -> Self {
        Self { config, host }
    }

    /// Build the authorization URL.
    /// Returns (url, state) where state must be echoed back in the redirect.
    ///
    /// # Errors
    ///
    /// Fails with a config error when no client id is set.
    pub fn authorization_url(&self) -> Result<(Url, CsrfToken), AuthError> {
        let client_id = self.config.client_id()?;

        let auth_url = AuthUrl::new(self.config.auth_url.clone())
            .map_err(|e| ConfigError::Invalid(format!("oauth.auth_url: {}", e)))?;
        let redirect_url = RedirectUrl::new(self.host.redirect_url())
            .map_err(|e| AuthError::InvalidRedirect(e.to_string()))?;

        let client = BasicClient::new(ClientId::new(client_id.to_string()), None, auth_url, None)
            .set_redirect_uri(redirect_url);

        let scopes = self
            .config
            .scopes
            .iter()
            .filter(|s| !s.trim().is_empty())
            .map(|s| Scope::new(s.trim().to_string()));

        let (url, state) = client
            .authorize_url(CsrfToken::new_random)
            .use_implicit_flow()
            .add_scopes(scopes)
            .url();

        Ok((url, state))
    }
}

impl<H: AuthFlowHost> TokenProvider for GoogleImplicitProvider<H> {
    #[tracing::instrument(skip(self), level = "info")]
    async fn acquire_token(&self) -> Result<AccessToken, AuthError> {
        let (auth_url, state) = self.authorization_url()?;
        tracing::debug!("Redirect URI: {}", self.host.redirect_url());

        let redirected = self
            .host
            .launch_web_auth_flow(auth_url.as_str())
            .await?
            .ok_or(AuthError::NoRedirect)?;

        let token = parse_redirect(&redirected, state.secret())?;
        tracing::info!("Access token acquired");
        Ok(token)
    }
}

/// Extract the access token from the fragment of an implicit-grant redirect.
///
/// # Errors
///
/// `Denied` when the fragment carries `error`, `StateMismatch` when `state`
/// differs from `expected_state`, `MissingAccessToken` when there is no token.
pub fn parse_redirect(redirected: &str, expected_state: &str) -> Result<AccessToken, AuthError> {
    let url = Url::parse(redirected).map_err(|e| AuthError::InvalidRedirect(e.to_string()))?;
    let fragment = url.fragment().unwrap_or_default();

    let params: HashMap<String, String> =
        form_urlencoded::parse(fragment.as_bytes()).into_owned().collect();

    if let Some(error) = params.get("error") {
        let detail = params
            .get("error_description")
            .map(|d| format!("{} ({})", error, d))
            .unwrap_or_else(|| error.clone());
        return Err(AuthError::Denied(detail));
    }

    if params.get("state").map(String::as_str) != Some(expected_state) {
        return Err(AuthError::StateMismatch);
    }

    params
        .get("access_token")
        .filter(|t| !t.is_empty())
        .map(|t| AccessToken::new(t.clone()))
        .ok_or(AuthError::MissingAccessToken)
}
