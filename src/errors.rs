use thiserror::Error;

/// Result type for scheduling engine operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by the scheduling engine.
///
/// Input-validation and not-found errors abort the operation that raised
/// them. Delivery errors are recovered where they occur (logged and
/// counted) and never abort the meeting-state change that triggered the
/// notification.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Booking window is empty or inverted (start >= end).
    #[error("Invalid booking window: start must be strictly before end")]
    InvalidWindow,

    /// Meeting start instant is missing or unparseable.
    #[error("Invalid start time: {0}")]
    InvalidStartTime(String),

    /// Meeting reason is required and must be non-empty.
    #[error("Meeting reason must not be empty")]
    EmptyReason,

    /// An operation referenced an unknown meeting, room or principal.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A single recipient could not be delivered to. Non-fatal.
    #[error("Notification delivery to {recipient} failed: {message}")]
    Delivery { recipient: String, message: String },

    /// Per-meeting serialization was violated.
    #[error("Concurrent modification of meeting {0}")]
    ConcurrentModification(String),

    /// Storage backend failure (file IO, malformed record, ...).
    #[error("Storage error: {0}")]
    Store(String),

    /// Transport failure talking to the mail relay API.
    #[error("Mail relay request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl ServiceError {
    /// Creates a not-found error for the given entity kind.
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Creates a storage error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Creates a delivery error for a single recipient.
    pub fn delivery(recipient: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Delivery {
            recipient: recipient.into(),
            message: message.into(),
        }
    }
}
