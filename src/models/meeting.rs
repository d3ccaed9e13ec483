use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A booked meeting as persisted by the store.
///
/// The engine operates on snapshots; the store owns the canonical copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub id: String,
    pub room_id: String,
    pub organizer_id: String,
    pub candidate_ids: Vec<String>,
    pub reason: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Meeting {
    /// True when the meeting has not started yet at `now`.
    pub fn starts_after(&self, now: DateTime<Utc>) -> bool {
        self.start_time > now
    }
}

/// Fields of a meeting before the store assigns identity and timestamps.
#[derive(Debug, Clone)]
pub struct MeetingDraft {
    pub room_id: String,
    pub organizer_id: String,
    pub candidate_ids: Vec<String>,
    pub reason: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_approved: bool,
}

/// Caller-supplied fields for creating a meeting.
#[derive(Debug, Clone, Deserialize)]
pub struct MeetingRequest {
    pub room_id: String,
    pub candidate_ids: Vec<String>,
    pub reason: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Caller-supplied replacement fields for updating a meeting.
///
/// Updates are whole-field replacements, matching the original PUT
/// semantics: every field is provided, none are merged.
#[derive(Debug, Clone, Deserialize)]
pub struct MeetingChanges {
    pub room_id: String,
    pub candidate_ids: Vec<String>,
    pub reason: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}
