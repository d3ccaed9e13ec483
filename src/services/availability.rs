use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::debug;

use crate::errors::{ServiceError, ServiceResult};
use crate::models::room::Room;
use crate::services::database::MeetingStore;

/// Half-open interval overlap test: touching endpoints do not conflict.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// Validates a booking window. Zero or negative duration is rejected.
pub fn validate_window(start: DateTime<Utc>, end: DateTime<Utc>) -> ServiceResult<()> {
    if start >= end {
        return Err(ServiceError::InvalidWindow);
    }
    Ok(())
}

/// Returns the rooms from `candidate_rooms` with no stored meeting
/// overlapping `[window_start, window_end)`.
///
/// Any stored meeting blocks a room regardless of approval status: a
/// pending booking still holds its slot until it is rejected or deleted.
/// Pure over a snapshot of the store; no side effects.
pub async fn resolve(
    store: &dyn MeetingStore,
    candidate_rooms: &[Room],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> ServiceResult<Vec<Room>> {
    validate_window(window_start, window_end)?;

    if candidate_rooms.is_empty() {
        return Ok(Vec::new());
    }

    let conflicting = store
        .find_meetings_overlapping(window_start, window_end)
        .await?;

    let booked_room_ids: HashSet<&str> =
        conflicting.iter().map(|m| m.room_id.as_str()).collect();

    debug!(
        "{} meetings overlap window {} - {}, blocking {} rooms",
        conflicting.len(),
        window_start,
        window_end,
        booked_room_ids.len()
    );

    Ok(candidate_rooms
        .iter()
        .filter(|room| !booked_room_ids.contains(room.id.as_str()))
        .cloned()
        .collect())
}
