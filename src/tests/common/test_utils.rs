use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::errors::{ServiceError, ServiceResult};
use crate::models::meeting::{Meeting, MeetingDraft};
use crate::services::availability::overlaps;
use crate::services::database::MeetingStore;
use crate::services::notifier::NotificationSink;

/// In-memory meeting store for engine tests.
pub struct MemoryMeetingStore {
    meetings: Mutex<HashMap<String, Meeting>>,
    next_id: AtomicU32,
}

impl MemoryMeetingStore {
    pub fn new() -> Self {
        Self {
            meetings: Mutex::new(HashMap::new()),
            next_id: AtomicU32::new(1),
        }
    }

    /// Inserts a fully-formed meeting, bypassing id assignment.
    pub fn seed(&self, meeting: Meeting) {
        self.meetings
            .lock()
            .unwrap()
            .insert(meeting.id.clone(), meeting);
    }

    pub fn len(&self) -> usize {
        self.meetings.lock().unwrap().len()
    }
}

#[async_trait]
impl MeetingStore for MemoryMeetingStore {
    async fn find_meetings_overlapping(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ServiceResult<Vec<Meeting>> {
        Ok(self
            .meetings
            .lock()
            .unwrap()
            .values()
            .filter(|m| overlaps(m.start_time, m.end_time, start, end))
            .cloned()
            .collect())
    }

    async fn get_meeting(&self, id: &str) -> ServiceResult<Option<Meeting>> {
        Ok(self.meetings.lock().unwrap().get(id).cloned())
    }

    async fn insert_meeting(&self, draft: MeetingDraft) -> ServiceResult<Meeting> {
        let now = Utc::now();
        let meeting = Meeting {
            id: format!("meeting-{:04}", self.next_id.fetch_add(1, Ordering::Relaxed)),
            room_id: draft.room_id,
            organizer_id: draft.organizer_id,
            candidate_ids: draft.candidate_ids,
            reason: draft.reason,
            start_time: draft.start_time,
            end_time: draft.end_time,
            is_approved: draft.is_approved,
            created_at: now,
            updated_at: now,
        };
        self.seed(meeting.clone());
        Ok(meeting)
    }

    async fn update_meeting(&self, meeting: &Meeting) -> ServiceResult<Meeting> {
        let mut meetings = self.meetings.lock().unwrap();
        match meetings.get(&meeting.id) {
            Some(existing) => {
                let mut updated = meeting.clone();
                updated.created_at = existing.created_at;
                updated.updated_at = Utc::now();
                meetings.insert(updated.id.clone(), updated.clone());
                Ok(updated)
            }
            None => Err(ServiceError::not_found("meeting", meeting.id.clone())),
        }
    }

    async fn delete_meeting(&self, id: &str) -> ServiceResult<Option<Meeting>> {
        Ok(self.meetings.lock().unwrap().remove(id))
    }

    async fn find_approved_after(&self, instant: DateTime<Utc>) -> ServiceResult<Vec<Meeting>> {
        Ok(self
            .meetings
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.is_approved && m.start_time > instant)
            .cloned()
            .collect())
    }
}

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub to: String,
    pub subject: String,
}

/// Sink that records every delivery instead of sending it.
pub struct RecordingSink {
    sent: Mutex<Vec<SentMessage>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(
        &self,
        recipient_email: &str,
        subject: &str,
        _text_body: &str,
        _html_body: &str,
    ) -> ServiceResult<()> {
        self.sent.lock().unwrap().push(SentMessage {
            to: recipient_email.to_string(),
            subject: subject.to_string(),
        });
        Ok(())
    }
}

/// Sink that fails for a configured set of recipients and records the rest.
pub struct FailingSink {
    fail_for: Vec<String>,
    sent: Mutex<Vec<SentMessage>>,
}

impl FailingSink {
    pub fn new(fail_for: Vec<String>) -> Self {
        Self {
            fail_for,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for FailingSink {
    async fn send(
        &self,
        recipient_email: &str,
        subject: &str,
        _text_body: &str,
        _html_body: &str,
    ) -> ServiceResult<()> {
        if self.fail_for.iter().any(|email| email == recipient_email) {
            return Err(ServiceError::delivery(recipient_email, "relay unavailable"));
        }
        self.sent.lock().unwrap().push(SentMessage {
            to: recipient_email.to_string(),
            subject: subject.to_string(),
        });
        Ok(())
    }
}

/// Polls until the sink has recorded at least `at_least` sends.
///
/// Background dispatch and reminder timers deliver from spawned tasks,
/// so tests must yield until the sends land.
pub async fn wait_for_sends(sink: &RecordingSink, at_least: usize) {
    for _ in 0..200 {
        if sink.count() >= at_least {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    // Under a paused clock each sleep only auto-advances time by its own
    // length, so take larger steps to reach reminder timers minutes away.
    for _ in 0..200 {
        if sink.count() >= at_least {
            return;
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
    }
    panic!(
        "timed out waiting for {} sends, saw {}",
        at_least,
        sink.count()
    );
}

/// Yields long enough for any pending background dispatch to finish.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
