//! Retroactive sender rules: label every existing message from a set of senders.

use std::fmt;

use catman_auth::TokenProvider;
use catman_core::ConfigError;
use tracing::instrument;

use crate::client::{require_label_name, GmailLabelClient};
use crate::error::GmailError;
use crate::types::find_by_name;

/// Sender addresses parsed from a comma separated list.
///
/// Entries are trimmed and empty ones dropped; nothing checks that an entry
/// is an email address, so Gmail search operators pass through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderQuery {
    senders: Vec<String>,
}

impl SenderQuery {
    /// # Errors
    ///
    /// `ConfigError::Invalid` when no sender remains after trimming.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let senders: Vec<String> = input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if senders.is_empty() {
            return Err(ConfigError::Invalid("Sender list is empty!".to_string()));
        }

        Ok(Self { senders })
    }

    pub fn senders(&self) -> &[String] {
        &self.senders
    }
}

impl fmt::Display for SenderQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, sender) in self.senders.iter().enumerate() {
            if i > 0 {
                f.write_str(" OR ")?;
            }
            write!(f, "from:{}", sender)?;
        }
        Ok(())
    }
}

/// A message the label could not be added to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedMessage {
    pub id: String,
    pub error: String,
}

/// Outcome of one rule application.
#[derive(Debug, Clone, Default)]
pub struct ApplyReport {
    pub label_id: String,
    pub query: String,
    pub applied: Vec<String>,
    pub failed: Vec<FailedMessage>,
    /// Search had further pages that were not processed
    pub truncated: bool,
}

impl ApplyReport {
    pub fn matched(&self) -> usize {
        self.applied.len() + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && !self.truncated
    }
}

pub struct BulkRuleApplier<'a, P> {
    client: &'a GmailLabelClient<P>,
}

impl<'a, P: TokenProvider> BulkRuleApplier<'a, P> {
    pub fn new(client: &'a GmailLabelClient<P>) -> Self {
        Self { client }
    }

    /// Add `label_name` to every message from the senders in `sender_list`.
    ///
    /// Label lookup and search failures abort the rule. Per-message failures
    /// are collected in the report and the loop moves on; nothing is rolled back.
    ///
    /// # Errors
    ///
    /// `Config` for empty inputs, `Auth` when no token is granted,
    /// `LabelNotFound` when the label is missing, `Network`/`Api` when the
    /// lookup or search request fails.
    #[instrument(skip(self), level = "info")]
    pub async fn apply_rule(
        &self,
        sender_list: &str,
        label_name: &str,
    ) -> Result<ApplyReport, GmailError> {
        let label_name = require_label_name(label_name)?;
        let query = SenderQuery::parse(sender_list)?.to_string();

        let token = self.client.acquire_token().await?;

        let labels = self.client.fetch_labels(&token).await?;
        let label_id = find_by_name(&labels, label_name)
            .map(|l| l.id.clone())
            .ok_or_else(|| GmailError::LabelNotFound(label_name.to_string()))?;
        tracing::debug!("ID of label '{}': {}", label_name, label_id);

        let search = self.client.search_messages(&token, &query).await?;
        let truncated = search.next_page_token.is_some();
        if truncated {
            tracing::warn!(
                "Search for '{}' has more results; only the first page is labeled",
                query
            );
        }
        tracing::info!("Found {} messages to label", search.messages.len());

        let mut report = ApplyReport {
            label_id,
            query,
            truncated,
            ..ApplyReport::default()
        };

        for msg in search.messages {
            match self
                .client
                .add_label_to_message(&token, &msg.id, &report.label_id)
                .await
            {
                Ok(()) => report.applied.push(msg.id),
                Err(e) => {
                    tracing::warn!("Failed to label message {}: {}", msg.id, e);
                    report.failed.push(FailedMessage {
                        id: msg.id,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Applied label '{}' to {} of {} messages",
            label_name,
            report.applied.len(),
            report.matched()
        );
        Ok(report)
    }
}
