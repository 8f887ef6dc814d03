//! Action dispatch for the catman front end.
//!
//! Front ends send an [`Action`], receive an [`ActionResponse`], and see
//! progress through a [`NotificationSink`].

pub mod action;
pub mod dispatcher;
pub mod notify;

pub use action::{Action, ActionResponse};
pub use dispatcher::ActionDispatcher;
pub use notify::{LogNotifier, Notification, NotificationLevel, NotificationSink};
