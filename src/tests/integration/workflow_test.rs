use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::models::notification::NotificationAction;
use crate::models::user::Role;
use crate::services::approval::ApprovalState;
use crate::services::directory::{StaticRoomCatalog, StaticUserDirectory};
use crate::services::notifier::Notifier;
use crate::services::reminder::ReminderScheduler;
use crate::tests::common::fixtures::{
    build_engine, meeting_changes, meeting_request, sample_rooms, sample_users, user, APP_URL,
};
use crate::tests::common::test_utils::{settle, wait_for_sends, RecordingSink};

/// Full lifecycle: a member books, an admin approves, the organizer edits
/// the attendee list, then the meeting is deleted.
#[tokio::test]
async fn test_pending_meeting_lifecycle() {
    let engine = build_engine();
    let admin = user("alice", Role::Admin);
    let start = Utc::now() + Duration::hours(3);

    // Member booking goes to the approvers
    let (meeting, state) = engine
        .service
        .create_meeting("carol", meeting_request("room-1", &["dave", "erin"], start))
        .await
        .unwrap();
    assert_eq!(state, ApprovalState::Pending);
    assert!(!engine.reminders.has_job(&meeting.id).await);

    wait_for_sends(&engine.sink, 2).await;
    assert!(engine
        .sink
        .sent()
        .iter()
        .all(|m| m.subject.starts_with("Meeting Approval Required")));

    // Approval notifies the candidates and arms the reminder
    let approved = engine.service.approve_meeting(&meeting.id, &admin).await.unwrap();
    assert!(approved.is_approved);
    assert!(engine.reminders.has_job(&meeting.id).await);

    wait_for_sends(&engine.sink, 4).await;
    let scheduled: Vec<_> = engine
        .sink
        .sent()
        .into_iter()
        .filter(|m| m.subject.starts_with("Meeting Scheduled"))
        .collect();
    assert_eq!(scheduled.len(), 2);

    // Swapping erin for dave produces a removal-first plan
    let (saved, plan) = engine
        .service
        .update_meeting(&meeting.id, meeting_changes("room-1", &["dave"], start))
        .await
        .unwrap();
    assert_eq!(saved.candidate_ids, vec!["dave"]);
    assert_eq!(plan[0].action, NotificationAction::Removed);
    assert_eq!(plan[0].recipients[0].id, "erin");
    assert_eq!(plan[1].action, NotificationAction::Updated);
    assert_eq!(plan[1].recipients[0].id, "dave");

    wait_for_sends(&engine.sink, 6).await;

    // Deletion cancels the reminder and tells the remaining candidates
    let plan = engine.service.delete_meeting(&meeting.id).await.unwrap();
    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].action, NotificationAction::Cancelled);
    assert!(!engine.reminders.has_job(&meeting.id).await);
    assert_eq!(engine.store.len(), 0);

    wait_for_sends(&engine.sink, 7).await;
    settle().await;
    assert_eq!(engine.sink.count(), 7);
}

/// A restart recomputes the reminder set from the store: pending timers
/// are not persisted, approved upcoming meetings get fresh jobs.
#[tokio::test]
async fn test_restart_restores_reminder_jobs() {
    let engine = build_engine();
    let start = Utc::now() + Duration::hours(3);

    let (approved_a, _) = engine
        .service
        .create_meeting("bob", meeting_request("room-1", &["carol"], start))
        .await
        .unwrap();
    let (approved_b, _) = engine
        .service
        .create_meeting("bob", meeting_request("room-2", &["dave"], start + Duration::hours(2)))
        .await
        .unwrap();
    let (pending, _) = engine
        .service
        .create_meeting("carol", meeting_request("room-1", &["erin"], start + Duration::hours(4)))
        .await
        .unwrap();

    // Fresh scheduler over the same store, as after a process restart
    let sink = Arc::new(RecordingSink::new());
    let directory = Arc::new(StaticUserDirectory::from_users(sample_users()));
    let rooms = Arc::new(StaticRoomCatalog::from_rooms(sample_rooms()));
    let notifier = Arc::new(Notifier::new(sink.clone()));
    let restarted = Arc::new(ReminderScheduler::new(
        engine.store.clone(),
        directory,
        rooms,
        notifier,
        APP_URL.to_string(),
    ));

    let restored = restarted.restore_from_store().await.unwrap();
    assert_eq!(restored, 2);
    assert!(restarted.has_job(&approved_a.id).await);
    assert!(restarted.has_job(&approved_b.id).await);
    assert!(!restarted.has_job(&pending.id).await);
}
