//! Routes front-end actions to the Gmail client.
//!
//! Every outcome is turned into a notification plus an `ActionResponse`;
//! errors never propagate past `dispatch`.

use catman_auth::TokenProvider;
use catman_gmail::{ApplyReport, BulkRuleApplier, GmailError, GmailLabelClient};

use crate::action::{Action, ActionResponse};
use crate::notify::{Notification, NotificationSink};

pub struct ActionDispatcher<P, N> {
    client: GmailLabelClient<P>,
    notifier: N,
}

impl<P: TokenProvider, N: NotificationSink> ActionDispatcher<P, N> {
    pub fn new(client: GmailLabelClient<P>, notifier: N) -> Self {
        Self { client, notifier }
    }

    pub fn client(&self) -> &GmailLabelClient<P> {
        &self.client
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub async fn dispatch(&self, action: Action) -> ActionResponse {
        tracing::debug!("Received action: {}", action.name());

        match action {
            Action::NotifyError { message } => {
                let message = message.unwrap_or_else(|| "An error occurred".to_string());
                self.notifier.notify(Notification::error("label_error", message));
                ActionResponse::ok(None)
            }
            Action::CreateLabel { label_name } => self.create_label(&label_name).await,
            Action::DeleteLabel { label_name } => self.delete_label(&label_name).await,
            Action::CreateEmailRule {
                sender_email,
                label_name,
            } => self.apply_rule(&sender_email, &label_name).await,
        }
    }

    async fn create_label(&self, label_name: &str) -> ActionResponse {
        match self.client.create_label(label_name).await {
            Ok(label) => {
                let message = format!("Label created: {} with ID: {}", label.name, label.id);
                self.notifier.notify(Notification::success("label_created", &message));
                ActionResponse::ok(Some(message))
            }
            Err(e) => self.fail(
                "label_created_error",
                format!("Error creating label: {}", e.user_message()),
                e,
            ),
        }
    }

    async fn delete_label(&self, label_name: &str) -> ActionResponse {
        match self.client.delete_label(label_name).await {
            Ok(label) => {
                let message = format!("Label '{}' deleted successfully.", label.name);
                self.notifier.notify(Notification::success("label_deleted", &message));
                ActionResponse::ok(Some(message))
            }
            Err(e) => {
                let message = match &e {
                    GmailError::LabelNotFound(_) => e.user_message(),
                    _ => format!("Failed to delete label: {}", e.user_message()),
                };
                self.fail("label_error", message, e)
            }
        }
    }

    async fn apply_rule(&self, sender_email: &str, label_name: &str) -> ActionResponse {
        let applier = BulkRuleApplier::new(&self.client);

        match applier.apply_rule(sender_email, label_name).await {
            Ok(report) => {
                let message = summarize(&report, sender_email, label_name);
                self.notifier.notify(Notification::success("label_applied", &message));
                ActionResponse::ok(Some(message))
            }
            Err(e) => {
                let message = match &e {
                    GmailError::LabelNotFound(_) | GmailError::Config(_) => e.user_message(),
                    _ => format!(
                        "Failed to apply label '{}' to existing emails from: {}",
                        label_name, sender_email
                    ),
                };
                self.fail("label_applied_error", message, e)
            }
        }
    }

    fn fail(&self, id: &'static str, message: String, error: GmailError) -> ActionResponse {
        tracing::error!("Action failed: {}", error);

        let notification = match &error {
            GmailError::Auth(auth) if auth.is_denial() => {
                Notification::error("auth_denied", auth.user_message())
            }
            _ => Notification::error(id, message),
        };
        self.notifier.notify(notification);

        ActionResponse::failed(error.to_string())
    }
}

fn summarize(report: &ApplyReport, sender_email: &str, label_name: &str) -> String {
    let mut message = format!(
        "Applied label '{}' to existing emails from: {} ({} of {} messages labeled",
        label_name,
        sender_email,
        report.applied.len(),
        report.matched()
    );
    if !report.failed.is_empty() {
        message.push_str(&format!(", {} failed", report.failed.len()));
    }
    message.push(')');
    if report.truncated {
        message.push_str(". More matches exist; only the first page of results was labeled.");
    }
    message
}
