//! Loopback redirect catcher for the implicit grant.
//!
//! Browsers never send the URL fragment to a server, so `/callback` serves a
//! page that forwards `location.hash` to `/token` as a query string.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Mutex};
use warp::Filter;

use crate::error::AuthError;
use crate::provider::AuthFlowHost;

const CALLBACK_PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>catman</title></head><body>
<p>Completing sign-in...</p>
<script>
  var params = window.location.hash.substring(1) || window.location.search.substring(1);
  window.location.replace('/token?' + params);
</script>
</body></html>"#;

const DONE_PAGE: &str = "<html><body><h1>Authorization received</h1><p>You can close this window and return to catman.</p></body></html>";

type RedirectSender = Arc<Mutex<Option<oneshot::Sender<String>>>>;
type BrowserOpener = Box<dyn Fn(&str) -> std::io::Result<()> + Send + Sync>;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Runs a one-shot HTTP server on `127.0.0.1:<port>` and opens the system browser.
///
/// The wait ends with `AuthError::Cancelled` when no redirect arrives within
/// the timeout or the process receives Ctrl-C.
pub struct LoopbackHost {
    port: u16,
    timeout: Duration,
    opener: BrowserOpener,
}

impl LoopbackHost {
    pub fn new(port: u16) -> Self {
        Self::with_opener(port, |url| webbrowser::open(url))
    }

    /// Use `opener` instead of the system browser
    pub fn with_opener<F>(port: u16, opener: F) -> Self
    where
        F: Fn(&str) -> std::io::Result<()> + Send + Sync + 'static,
    {
        Self {
            port,
            timeout: DEFAULT_TIMEOUT,
            opener: Box::new(opener),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl AuthFlowHost for LoopbackHost {
    fn redirect_url(&self) -> String {
        format!("http://127.0.0.1:{}/callback", self.port)
    }

    async fn launch_web_auth_flow(&self, auth_url: &str) -> Result<Option<String>, AuthError> {
        let (tx, rx) = oneshot::channel::<String>();
        let tx: RedirectSender = Arc::new(Mutex::new(Some(tx)));
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let callback = warp::get()
            .and(warp::path("callback"))
            .and(warp::path::end())
            .map(|| warp::reply::html(CALLBACK_PAGE));

        let token = warp::get()
            .and(warp::path("token"))
            .and(warp::path::end())
            .and(warp::query::raw().or(warp::any().map(String::new)).unify())
            .and(warp::any().map(move || tx.clone()))
            .and_then(|params: String, tx: RedirectSender| async move {
                if let Some(sender) = tx.lock().await.take() {
                    let _ = sender.send(params);
                }
                Ok::<_, warp::Rejection>(warp::reply::html(DONE_PAGE))
            });

        let (addr, server) = warp::serve(callback.or(token))
            .try_bind_with_graceful_shutdown(([127, 0, 0, 1], self.port), async move {
                let _ = shutdown_rx.await;
            })
            .map_err(|e| {
                tracing::error!("Failed to bind OAuth redirect server: {}", e);
                AuthError::PortInUse(self.port)
            })?;
        tokio::spawn(server);

        tracing::info!("Opening browser for authorization, waiting on {}", addr);
        if let Err(e) = (self.opener)(auth_url) {
            let _ = shutdown_tx.send(());
            return Err(AuthError::FlowFailed(format!("Failed to open browser: {}", e)));
        }

        let received = tokio::select! {
            received = rx => Ok(received.ok()),
            _ = tokio::time::sleep(self.timeout) => Err(AuthError::Cancelled(format!(
                "no redirect received within {:?}",
                self.timeout
            ))),
            _ = tokio::signal::ctrl_c() => {
                Err(AuthError::Cancelled("interrupted while waiting for sign-in".to_string()))
            }
        };
        let _ = shutdown_tx.send(());

        if let Err(AuthError::Cancelled(reason)) = &received {
            tracing::warn!("Authorization abandoned: {}", reason);
        }
        Ok(received?.map(|params| format!("{}#{}", self.redirect_url(), params)))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn free_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[test]
    fn test_redirect_url() {
        let host = LoopbackHost::new(8080);
        assert_eq!(host.redirect_url(), "http://127.0.0.1:8080/callback");
    }

    #[test]
    fn test_callback_page_forwards_fragment() {
        assert!(CALLBACK_PAGE.contains("location.hash"));
        assert!(CALLBACK_PAGE.contains("/token?"));
    }

    #[tokio::test]
    async fn test_redirect_is_rebuilt_with_fragment() {
        let port = free_port();
        let host = LoopbackHost::with_opener(port, move |_auth_url| {
            tokio::spawn(async move {
                let base = format!("http://127.0.0.1:{}", port);
                let _ = reqwest::get(format!("{}/callback", base)).await;
                let _ = reqwest::get(format!("{}/token?access_token=abc&state=xyz", base)).await;
            });
            Ok(())
        });

        let redirected = host
            .launch_web_auth_flow("https://accounts.google.com/o/oauth2/v2/auth")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            redirected,
            format!("http://127.0.0.1:{}/callback#access_token=abc&state=xyz", port)
        );
    }

    #[tokio::test]
    async fn test_busy_port() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let host = LoopbackHost::with_opener(port, |_| Ok(()));

        let err = host.launch_web_auth_flow("https://example.com").await.unwrap_err();
        assert!(matches!(err, AuthError::PortInUse(p) if p == port));
    }

    #[tokio::test]
    async fn test_abandoned_flow_is_cancelled() {
        let port = free_port();
        let host = LoopbackHost::with_opener(port, |_| Ok(()))
            .with_timeout(Duration::from_millis(200));

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            host.launch_web_auth_flow("https://accounts.google.com/o/oauth2/v2/auth"),
        )
        .await
        .expect("flow should give up on its own");

        let err = result.unwrap_err();
        assert!(matches!(err, AuthError::Cancelled(ref m) if m.contains("200ms")));
        assert!(err.is_denial());

        // Server shuts down, so the port frees up again
        let mut rebound = false;
        for _ in 0..20 {
            if std::net::TcpListener::bind(("127.0.0.1", port)).is_ok() {
                rebound = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(rebound);
    }

    #[tokio::test]
    async fn test_browser_failure() {
        let host = LoopbackHost::with_opener(free_port(), |_| {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no browser"))
        });

        let err = host.launch_web_auth_flow("https://example.com").await.unwrap_err();
        assert!(matches!(err, AuthError::FlowFailed(ref m) if m.contains("no browser")));
    }
}
