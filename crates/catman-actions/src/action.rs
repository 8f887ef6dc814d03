//! Requests accepted from the front end and the responses sent back.

use serde::{Deserialize, Serialize};

/// A front-end request, tagged by its `action` field on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Action {
    #[serde(rename = "createLabel", rename_all = "camelCase")]
    CreateLabel { label_name: String },

    #[serde(rename = "deleteLabel", rename_all = "camelCase")]
    DeleteLabel { label_name: String },

    #[serde(rename = "createEmailRule", rename_all = "camelCase")]
    CreateEmailRule {
        sender_email: String,
        label_name: String,
    },

    /// Validation failure detected by the front end before dispatch
    #[serde(rename = "notify_error")]
    NotifyError {
        #[serde(default)]
        message: Option<String>,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::CreateLabel { .. } => "createLabel",
            Action::DeleteLabel { .. } => "deleteLabel",
            Action::CreateEmailRule { .. } => "createEmailRule",
            Action::NotifyError { .. } => "notify_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResponse {
    pub fn ok(result: Option<String>) -> Self {
        Self {
            success: true,
            result,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }
}
