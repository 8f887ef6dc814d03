//! OAuth2 token acquisition for Gmail.
//!
//! Tokens are fetched per operation through the implicit grant; nothing is
//! stored between calls.

pub mod error;
pub mod google;
pub mod loopback;
pub mod provider;

pub use error::AuthError;
pub use google::{parse_redirect, GoogleImplicitProvider};
pub use loopback::LoopbackHost;
pub use oauth2::AccessToken;
pub use provider::{AuthFlowHost, StaticTokenProvider, TokenProvider, TokenSource};
