//! Gmail label API client.
//!
//! Every public operation acquires its own token; nothing is retried.

use catman_auth::{AccessToken, TokenProvider};
use catman_core::ConfigError;
use tracing::instrument;

use crate::error::GmailError;
use crate::types::*;

const GMAIL_API_BASE: &str = "https://www.googleapis.com";

pub struct GmailLabelClient<P> {
    client: reqwest::Client,
    tokens: P,
    base_url: String,
}

impl<P: TokenProvider> GmailLabelClient<P> {
    pub fn new(tokens: P) -> Self {
        Self::with_base_url(tokens, GMAIL_API_BASE)
    }

    pub fn with_base_url(tokens: P, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            tokens,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn tokens(&self) -> &P {
        &self.tokens
    }

    pub(crate) async fn acquire_token(&self) -> Result<AccessToken, GmailError> {
        Ok(self.tokens.acquire_token().await?)
    }

    fn labels_url(&self) -> String {
        format!("{}/gmail/v1/users/me/labels", self.base_url)
    }

    /// List all labels.
    ///
    /// # Errors
    ///
    /// `Network` on transport failure or non-success status.
    #[instrument(skip(self), level = "info")]
    pub async fn list_labels(&self) -> Result<Vec<Label>, GmailError> {
        let token = self.acquire_token().await?;
        self.fetch_labels(&token).await
    }

    /// Look up a label by exact, case-sensitive name.
    #[instrument(skip(self), level = "info")]
    pub async fn find_label(&self, name: &str) -> Result<Option<Label>, GmailError> {
        let name = require_label_name(name)?;
        let labels = self.list_labels().await?;
        Ok(find_by_name(&labels, name).cloned())
    }

    /// Create a label with the default presentation.
    ///
    /// Gmail allows duplicate names through this call, so creating the same
    /// name twice yields two labels.
    #[instrument(skip(self), level = "info")]
    pub async fn create_label(&self, name: &str) -> Result<Label, GmailError> {
        let name = require_label_name(name)?;
        let token = self.acquire_token().await?;

        let response = self
            .client
            .post(self.labels_url())
            .header("Authorization", auth_header(&token))
            .json(&NewLabel::with_defaults(name))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let label: Label = response
            .json()
            .await
            .map_err(|e| GmailError::Network(format!("JSON parse error: {}", e)))?;
        tracing::info!("Label created: {} with ID: {}", label.name, label.id);
        Ok(label)
    }

    /// Delete the first label whose name matches exactly.
    ///
    /// Returns the deleted label. No DELETE is sent when the name is absent.
    #[instrument(skip(self), level = "info")]
    pub async fn delete_label(&self, name: &str) -> Result<Label, GmailError> {
        let name = require_label_name(name)?;
        let token = self.acquire_token().await?;

        let labels = self.fetch_labels(&token).await?;
        let label = find_by_name(&labels, name)
            .cloned()
            .ok_or_else(|| GmailError::LabelNotFound(name.to_string()))?;

        let url = format!("{}/{}", self.labels_url(), urlencoding::encode(&label.id));
        let response = self
            .client
            .delete(&url)
            .header("Authorization", auth_header(&token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        tracing::info!("Label '{}' deleted ({})", label.name, label.id);
        Ok(label)
    }

    /// Fetch the label list with an already acquired token.
    pub async fn fetch_labels(&self, token: &AccessToken) -> Result<Vec<Label>, GmailError> {
        let response = self
            .client
            .get(self.labels_url())
            .header("Authorization", auth_header(token))
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, message) = error_parts(response).await;
            tracing::warn!("Label listing failed with {}: {}", status, message);
            return Err(GmailError::Network(format!("Error fetching labels: {}", message)));
        }

        let list: LabelListResponse = response
            .json()
            .await
            .map_err(|e| GmailError::Network(format!("JSON parse error: {}", e)))?;
        tracing::debug!("Fetched {} labels", list.labels.len());
        Ok(list.labels)
    }

    /// Search messages. Only the first page of results is returned.
    #[instrument(skip(self, token), level = "info")]
    pub async fn search_messages(
        &self,
        token: &AccessToken,
        query: &str,
    ) -> Result<MessageListResponse, GmailError> {
        let url = format!(
            "{}/gmail/v1/users/me/messages?q={}",
            self.base_url,
            urlencoding::encode(query)
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", auth_header(token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| GmailError::Network(format!("JSON parse error: {}", e)))
    }

    /// Add `label_id` to a single message.
    #[instrument(skip(self, token), level = "debug")]
    pub async fn add_label_to_message(
        &self,
        token: &AccessToken,
        message_id: &str,
        label_id: &str,
    ) -> Result<(), GmailError> {
        let url = format!(
            "{}/gmail/v1/users/me/messages/{}/modify",
            self.base_url,
            urlencoding::encode(message_id)
        );

        let body = serde_json::json!({
            "addLabelIds": [label_id],
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", auth_header(token))
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(api_error(response).await)
        }
    }
}

fn auth_header(token: &AccessToken) -> String {
    format!("Bearer {}", token.secret())
}

pub(crate) fn require_label_name(name: &str) -> Result<&str, GmailError> {
    if name.trim().is_empty() {
        return Err(ConfigError::Invalid("Label name is empty!".to_string()).into());
    }
    Ok(name)
}

/// Status code and message of a failed response.
///
/// The message is `error.message` from a JSON body when present, otherwise
/// the status text.
async fn error_parts(response: reqwest::Response) -> (u16, String) {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    let message = serde_json::from_str::<ApiErrorBody>(&text)
        .map(|body| body.error.message)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string())
        });

    (status.as_u16(), message)
}

async fn api_error(response: reqwest::Response) -> GmailError {
    let (status, message) = error_parts(response).await;
    GmailError::Api { status, message }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use catman_auth::{AuthError, StaticTokenProvider};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GmailLabelClient<StaticTokenProvider> {
        GmailLabelClient::with_base_url(StaticTokenProvider::new("test_token"), &server.uri())
    }

    fn labels_body() -> serde_json::Value {
        serde_json::json!({
            "labels": [
                {"id": "INBOX", "name": "INBOX", "type": "system"},
                {"id": "Label_1", "name": "Work", "type": "user"},
                {"id": "Label_2", "name": "Receipts", "type": "user"}
            ]
        })
    }

    struct DenyingProvider;

    impl TokenProvider for DenyingProvider {
        async fn acquire_token(&self) -> Result<AccessToken, AuthError> {
            Err(AuthError::Denied("access_denied".into()))
        }
    }

    #[tokio::test]
    async fn test_list_labels() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me/labels"))
            .and(header("Authorization", "Bearer test_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(labels_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let labels = client(&mock_server).list_labels().await.unwrap();

        assert_eq!(labels.len(), 3);
        assert_eq!(labels[1].id, "Label_1");
        assert_eq!(labels[1].name, "Work");
    }

    #[tokio::test]
    async fn test_list_labels_error_uses_remote_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me/labels"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"code": 401, "message": "Request had invalid authentication credentials."}
            })))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server).list_labels().await.unwrap_err();
        assert!(
            matches!(err, GmailError::Network(ref m) if m.contains("invalid authentication credentials")),
            "unexpected error: {:?}",
            err
        );
    }

    #[tokio::test]
    async fn test_list_labels_error_falls_back_to_status_text() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me/labels"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server).list_labels().await.unwrap_err();
        assert!(matches!(err, GmailError::Network(ref m) if m.contains("Service Unavailable")));
    }

    #[tokio::test]
    async fn test_create_label() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/gmail/v1/users/me/labels"))
            .and(header("Authorization", "Bearer test_token"))
            .and(body_json(serde_json::json!({
                "name": "Work",
                "labelListVisibility": "labelShow",
                "messageListVisibility": "show",
                "color": {"backgroundColor": "#ffbc6b", "textColor": "#000000"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "Label_9",
                "name": "Work",
                "labelListVisibility": "labelShow",
                "messageListVisibility": "show",
                "color": {"backgroundColor": "#ffbc6b", "textColor": "#000000"}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let label = client(&mock_server).create_label("Work").await.unwrap();

        assert_eq!(label.name, "Work");
        assert_eq!(label.id, "Label_9");
        assert_eq!(label.color.unwrap().background_color, DEFAULT_BACKGROUND_COLOR);
    }

    #[tokio::test]
    async fn test_create_label_conflict() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/gmail/v1/users/me/labels"))
            .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
                "error": {"code": 409, "message": "Label name exists or conflicts"}
            })))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server).create_label("Work").await.unwrap_err();
        match err {
            GmailError::Api { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "Label name exists or conflicts");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_empty_name_sends_nothing() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let err = client(&mock_server).create_label("  ").await.unwrap_err();
        assert!(matches!(err, GmailError::Config(ConfigError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_delete_label_targets_matching_id() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me/labels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(labels_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/gmail/v1/users/me/labels/Label_2"))
            .and(header("Authorization", "Bearer test_token"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let deleted = client(&mock_server).delete_label("Receipts").await.unwrap();
        assert_eq!(deleted.id, "Label_2");

        let requests = mock_server.received_requests().await.unwrap();
        let deletes: Vec<_> = requests
            .iter()
            .filter(|r| r.method.as_str() == "DELETE")
            .collect();
        assert_eq!(deletes.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_label_sends_no_delete() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me/labels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(labels_body()))
            .mount(&mock_server)
            .await;

        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&mock_server)
            .await;

        let err = client(&mock_server).delete_label("work").await.unwrap_err();
        assert!(matches!(err, GmailError::LabelNotFound(ref n) if n == "work"));
    }

    #[tokio::test]
    async fn test_delete_failure_is_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me/labels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(labels_body()))
            .mount(&mock_server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/gmail/v1/users/me/labels/Label_1"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"code": 400, "message": "Invalid delete request"}
            })))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server).delete_label("Work").await.unwrap_err();
        assert!(matches!(err, GmailError::Api { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_find_label() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me/labels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(labels_body()))
            .mount(&mock_server)
            .await;

        let client = client(&mock_server);
        assert_eq!(client.find_label("Work").await.unwrap().unwrap().id, "Label_1");
        assert!(client.find_label("Personal").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_messages_encodes_query() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me/messages"))
            .and(query_param("q", "from:a@x.com OR from:b@y.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messages": [{"id": "msg1", "threadId": "t1"}],
                "resultSizeEstimate": 1
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client(&mock_server);
        let token = AccessToken::new("test_token".into());
        let result = client
            .search_messages(&token, "from:a@x.com OR from:b@y.com")
            .await
            .unwrap();

        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.messages[0].id, "msg1");
    }

    #[tokio::test]
    async fn test_add_label_to_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/gmail/v1/users/me/messages/msg123/modify"))
            .and(body_json(serde_json::json!({"addLabelIds": ["Label_1"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "msg123",
                "labelIds": ["INBOX", "Label_1"]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client(&mock_server);
        let token = AccessToken::new("test_token".into());
        client.add_label_to_message(&token, "msg123", "Label_1").await.unwrap();
    }

    #[tokio::test]
    async fn test_denied_token_sends_no_requests() {
        let mock_server = MockServer::start().await;

        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200).set_body_json(labels_body()))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = GmailLabelClient::with_base_url(DenyingProvider, &mock_server.uri());

        assert!(matches!(client.list_labels().await, Err(GmailError::Auth(_))));
        assert!(matches!(client.create_label("Work").await, Err(GmailError::Auth(_))));
        assert!(matches!(client.delete_label("Work").await, Err(GmailError::Auth(_))));
    }
}
