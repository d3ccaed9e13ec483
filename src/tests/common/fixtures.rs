use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::models::meeting::{Meeting, MeetingChanges, MeetingRequest};
use crate::models::room::Room;
use crate::models::user::{Role, User};
use crate::services::directory::{StaticRoomCatalog, StaticUserDirectory};
use crate::services::meetings::MeetingService;
use crate::services::notifier::Notifier;
use crate::services::reminder::ReminderScheduler;
use crate::tests::common::test_utils::{MemoryMeetingStore, RecordingSink};

pub const APP_URL: &str = "https://rooms.example.com";

pub fn user(id: &str, role: Role) -> User {
    User {
        id: id.to_string(),
        fullname: format!("Test {}", id),
        email: format!("{}@example.com", id),
        role,
    }
}

/// One admin, one manager, three ordinary members.
pub fn sample_users() -> Vec<User> {
    vec![
        user("alice", Role::Admin),
        user("bob", Role::Manager),
        user("carol", Role::Member),
        user("dave", Role::Member),
        user("erin", Role::Member),
    ]
}

pub fn sample_rooms() -> Vec<Room> {
    vec![
        Room {
            id: "room-1".to_string(),
            name: "Blue Room".to_string(),
            capacity: 8,
        },
        Room {
            id: "room-2".to_string(),
            name: "Green Room".to_string(),
            capacity: 4,
        },
    ]
}

pub fn meeting_request(
    room_id: &str,
    candidate_ids: &[&str],
    start: DateTime<Utc>,
) -> MeetingRequest {
    MeetingRequest {
        room_id: room_id.to_string(),
        candidate_ids: candidate_ids.iter().map(|id| id.to_string()).collect(),
        reason: "Sprint planning".to_string(),
        start_time: start,
        end_time: start + Duration::hours(1),
    }
}

pub fn meeting_changes(
    room_id: &str,
    candidate_ids: &[&str],
    start: DateTime<Utc>,
) -> MeetingChanges {
    MeetingChanges {
        room_id: room_id.to_string(),
        candidate_ids: candidate_ids.iter().map(|id| id.to_string()).collect(),
        reason: "Sprint planning".to_string(),
        start_time: start,
        end_time: start + Duration::hours(1),
    }
}

/// A fully-formed stored meeting for seeding the store directly.
pub fn stored_meeting(
    id: &str,
    room_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    is_approved: bool,
) -> Meeting {
    Meeting {
        id: id.to_string(),
        room_id: room_id.to_string(),
        organizer_id: "bob".to_string(),
        candidate_ids: vec!["carol".to_string(), "dave".to_string()],
        reason: "Sprint planning".to_string(),
        start_time: start,
        end_time: end,
        is_approved,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Everything an engine test needs, wired against in-memory collaborators.
pub struct TestEngine {
    pub service: MeetingService,
    pub store: Arc<MemoryMeetingStore>,
    pub sink: Arc<RecordingSink>,
    pub notifier: Arc<Notifier>,
    pub reminders: Arc<ReminderScheduler>,
}

pub fn build_engine() -> TestEngine {
    let store = Arc::new(MemoryMeetingStore::new());
    let directory = Arc::new(StaticUserDirectory::from_users(sample_users()));
    let rooms = Arc::new(StaticRoomCatalog::from_rooms(sample_rooms()));
    let sink = Arc::new(RecordingSink::new());
    let notifier = Arc::new(Notifier::new(sink.clone()));
    let reminders = Arc::new(ReminderScheduler::new(
        store.clone(),
        directory.clone(),
        rooms.clone(),
        notifier.clone(),
        APP_URL.to_string(),
    ));

    let service = MeetingService::new(
        store.clone(),
        directory,
        rooms,
        notifier.clone(),
        reminders.clone(),
        APP_URL.to_string(),
    );

    TestEngine {
        service,
        store,
        sink,
        notifier,
        reminders,
    }
}
