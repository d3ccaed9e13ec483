use serde::Serialize;

use crate::models::user::User;

/// What happened to a meeting, from a recipient's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationAction {
    /// Freshly scheduled (or freshly invited on update).
    Created,
    /// Awaiting approval; addressed to managers and admins.
    Pending,
    /// Details changed for recipients who remain invited.
    Updated,
    /// Recipient is no longer invited.
    Removed,
    /// Meeting was deleted.
    Cancelled,
    /// Meeting starts shortly.
    Reminder,
}

/// One audience and the action it is told about.
#[derive(Debug, Clone)]
pub struct NotificationBatch {
    pub action: NotificationAction,
    pub recipients: Vec<User>,
}

impl NotificationBatch {
    pub fn new(action: NotificationAction, recipients: Vec<User>) -> Self {
        Self { action, recipients }
    }
}

/// The full set of batches produced by one meeting mutation.
pub type NotificationPlan = Vec<NotificationBatch>;

/// A rendered notification, ready for the sink.
#[derive(Debug, Clone)]
pub struct RenderedMessage {
    pub subject: String,
    pub text: String,
    pub html: String,
}
