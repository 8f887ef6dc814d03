//! Gmail API types and data structures.

use serde::{Deserialize, Serialize};

/// Background color given to labels created by catman.
pub const DEFAULT_BACKGROUND_COLOR: &str = "#ffbc6b";
/// Text color given to labels created by catman.
pub const DEFAULT_TEXT_COLOR: &str = "#000000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LabelListVisibility {
    LabelShow,
    LabelShowIfUnread,
    LabelHide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageListVisibility {
    Show,
    Hide,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelColor {
    pub background_color: String,
    pub text_color: String,
}

/// Gmail label.
///
/// System labels come back without visibility or color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_list_visibility: Option<LabelListVisibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_list_visibility: Option<MessageListVisibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<LabelColor>,
}

/// Request body for `POST /labels`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLabel {
    pub name: String,
    pub label_list_visibility: LabelListVisibility,
    pub message_list_visibility: MessageListVisibility,
    pub color: LabelColor,
}

impl NewLabel {
    /// Visible everywhere, orange background, black text.
    pub fn with_defaults(name: &str) -> Self {
        Self {
            name: name.to_string(),
            label_list_visibility: LabelListVisibility::LabelShow,
            message_list_visibility: MessageListVisibility::Show,
            color: LabelColor {
                background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
                text_color: DEFAULT_TEXT_COLOR.to_string(),
            },
        }
    }
}

/// First match wins when names are duplicated.
pub fn find_by_name<'a>(labels: &'a [Label], name: &str) -> Option<&'a Label> {
    labels.iter().find(|l| l.name == name)
}

/// API response for label list.
#[derive(Debug, Deserialize)]
pub struct LabelListResponse {
    #[serde(default)]
    pub labels: Vec<Label>,
}

/// API response for message search.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageListResponse {
    #[serde(default)]
    pub messages: Vec<MessageRef>,
    pub next_page_token: Option<String>,
    pub result_size_estimate: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    pub id: String,
    pub thread_id: Option<String>,
}

/// Error envelope returned by Google APIs.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: Option<u16>,
    pub message: String,
}
