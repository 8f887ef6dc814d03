//! User-visible notifications.

use serde::Serialize;

pub const TITLE: &str = "Gmail Category Manager";
pub const ERROR_TITLE: &str = "Gmail Category Manager Error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Stable identifier such as `label_created` or `auth_denied`
    pub id: &'static str,
    pub title: &'static str,
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(id: &'static str, message: impl Into<String>) -> Self {
        Self {
            id,
            title: TITLE,
            message: message.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn error(id: &'static str, message: impl Into<String>) -> Self {
        Self {
            id,
            title: ERROR_TITLE,
            message: message.into(),
            level: NotificationLevel::Error,
        }
    }
}

/// Where notifications are rendered.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Renders notifications as log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => {
                tracing::info!(id = notification.id, "{}: {}", notification.title, notification.message)
            }
            NotificationLevel::Error => {
                tracing::error!(id = notification.id, "{}: {}", notification.title, notification.message)
            }
        }
    }
}
