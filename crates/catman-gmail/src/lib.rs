//! Gmail label management.
//!
//! Provides the label client (list, create, delete) and bulk sender rules.

pub mod client;
pub mod error;
pub mod rules;
pub mod types;

pub use client::GmailLabelClient;
pub use error::GmailError;
pub use rules::{ApplyReport, BulkRuleApplier, FailedMessage, SenderQuery};
pub use types::{
    Label, LabelColor, LabelListVisibility, MessageListResponse, MessageListVisibility,
    MessageRef, NewLabel,
};
