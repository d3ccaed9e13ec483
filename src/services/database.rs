use async_trait::async_trait;
use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

use crate::errors::{ServiceError, ServiceResult};
use crate::models::meeting::{Meeting, MeetingDraft};
use crate::services::availability::overlaps;

/// Read/write view over persisted meetings.
///
/// The engine never holds a canonical meeting beyond the timers it
/// schedules against; everything round-trips through this trait.
#[async_trait]
pub trait MeetingStore: Send + Sync {
    /// All meetings whose interval overlaps `[start, end)` under the
    /// half-open test.
    async fn find_meetings_overlapping(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ServiceResult<Vec<Meeting>>;

    /// Snapshot of one meeting, or `None` for an unknown id.
    async fn get_meeting(&self, id: &str) -> ServiceResult<Option<Meeting>>;

    /// Persists a new meeting, assigning its id and timestamps.
    async fn insert_meeting(&self, draft: MeetingDraft) -> ServiceResult<Meeting>;

    /// Replaces the stored meeting with the same id, bumping `updated_at`.
    async fn update_meeting(&self, meeting: &Meeting) -> ServiceResult<Meeting>;

    /// Removes a meeting, returning the removed snapshot if it existed.
    async fn delete_meeting(&self, id: &str) -> ServiceResult<Option<Meeting>>;

    /// Approved meetings starting strictly after `instant`. Used to
    /// recompute the reminder set at startup.
    async fn find_approved_after(&self, instant: DateTime<Utc>) -> ServiceResult<Vec<Meeting>>;
}

// Record as stored in the CSV file
#[derive(Debug, Serialize, Deserialize, Clone)]
struct MeetingRecord {
    id: String,
    room_id: String,
    organizer_id: String,
    candidate_ids: String, // semicolon-separated
    reason: String,
    start_time: String, // ISO format
    end_time: String,   // ISO format
    is_approved: String, // "true" or "false"
    created_at: String,
    updated_at: String,
}

const CSV_HEADERS: [&str; 10] = [
    "id",
    "room_id",
    "organizer_id",
    "candidate_ids",
    "reason",
    "start_time",
    "end_time",
    "is_approved",
    "created_at",
    "updated_at",
];

impl MeetingRecord {
    fn from_meeting(meeting: &Meeting) -> Self {
        Self {
            id: meeting.id.clone(),
            room_id: meeting.room_id.clone(),
            organizer_id: meeting.organizer_id.clone(),
            candidate_ids: meeting.candidate_ids.join(";"),
            reason: meeting.reason.clone(),
            start_time: meeting.start_time.to_rfc3339(),
            end_time: meeting.end_time.to_rfc3339(),
            is_approved: meeting.is_approved.to_string(),
            created_at: meeting.created_at.to_rfc3339(),
            updated_at: meeting.updated_at.to_rfc3339(),
        }
    }

    fn into_meeting(self) -> ServiceResult<Meeting> {
        let start_time = parse_instant(&self.start_time)
            .ok_or_else(|| ServiceError::InvalidStartTime(self.start_time.clone()))?;
        let end_time = parse_instant(&self.end_time)
            .ok_or_else(|| ServiceError::store(format!("bad end_time: {}", self.end_time)))?;
        let created_at = parse_instant(&self.created_at)
            .ok_or_else(|| ServiceError::store(format!("bad created_at: {}", self.created_at)))?;
        let updated_at = parse_instant(&self.updated_at)
            .ok_or_else(|| ServiceError::store(format!("bad updated_at: {}", self.updated_at)))?;

        let candidate_ids = if self.candidate_ids.is_empty() {
            Vec::new()
        } else {
            self.candidate_ids.split(';').map(String::from).collect()
        };

        Ok(Meeting {
            id: self.id,
            room_id: self.room_id,
            organizer_id: self.organizer_id,
            candidate_ids,
            reason: self.reason,
            start_time,
            end_time,
            is_approved: self.is_approved == "true",
            created_at,
            updated_at,
        })
    }
}

fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// CSV-backed meeting store.
///
/// Appends on insert; updates and deletes rewrite the whole file under a
/// file mutex. Fine for the single-process reference deployment.
pub struct CsvMeetingStore {
    csv_path: String,
    file_mutex: Mutex<()>,
}

impl CsvMeetingStore {
    pub fn new(csv_path: &str) -> ServiceResult<Self> {
        // Create the CSV file if it doesn't exist with proper headers
        if !Path::new(csv_path).exists() {
            info!("Creating new meetings database file at {}", csv_path);

            let file = File::create(csv_path)
                .map_err(|e| ServiceError::store(format!("Failed to create database file: {}", e)))?;

            let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

            writer
                .write_record(CSV_HEADERS)
                .map_err(|e| ServiceError::store(format!("Failed to write headers: {}", e)))?;
            writer
                .flush()
                .map_err(|e| ServiceError::store(format!("Failed to flush headers: {}", e)))?;
        }

        Ok(Self {
            csv_path: csv_path.to_string(),
            file_mutex: Mutex::new(()),
        })
    }

    fn lock_file(&self) -> ServiceResult<std::sync::MutexGuard<'_, ()>> {
        self.file_mutex
            .lock()
            .map_err(|e| ServiceError::store(format!("Failed to acquire file mutex: {}", e)))
    }

    fn read_all(&self) -> ServiceResult<Vec<Meeting>> {
        if !Path::new(&self.csv_path).exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.csv_path)
            .map_err(|e| ServiceError::store(format!("Failed to open database file: {}", e)))?;

        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
        let mut meetings = Vec::new();

        for result in reader.deserialize::<MeetingRecord>() {
            let record =
                result.map_err(|e| ServiceError::store(format!("Failed to read record: {}", e)))?;
            match record.into_meeting() {
                Ok(meeting) => meetings.push(meeting),
                Err(e) => {
                    // A single corrupt row should not take the whole store down
                    warn!("Skipping malformed meeting record: {}", e);
                }
            }
        }

        Ok(meetings)
    }

    fn write_all(&self, meetings: &[Meeting]) -> ServiceResult<()> {
        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(&self.csv_path)
            .map_err(|e| {
                ServiceError::store(format!("Failed to open database file for writing: {}", e))
            })?;

        let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

        for meeting in meetings {
            writer
                .serialize(MeetingRecord::from_meeting(meeting))
                .map_err(|e| ServiceError::store(format!("Failed to write record: {}", e)))?;
        }

        writer
            .flush()
            .map_err(|e| ServiceError::store(format!("Failed to flush writer: {}", e)))?;

        Ok(())
    }

    fn append_record(&self, meeting: &Meeting) -> ServiceResult<()> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .map_err(|e| ServiceError::store(format!("Failed to open database file: {}", e)))?;

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

        writer
            .serialize(MeetingRecord::from_meeting(meeting))
            .map_err(|e| ServiceError::store(format!("Failed to serialize record: {}", e)))?;
        writer
            .flush()
            .map_err(|e| ServiceError::store(format!("Failed to flush writer: {}", e)))?;

        info!(
            "Stored meeting record {} for room {}",
            meeting.id, meeting.room_id
        );

        Ok(())
    }
}

#[async_trait]
impl MeetingStore for CsvMeetingStore {
    async fn find_meetings_overlapping(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ServiceResult<Vec<Meeting>> {
        let _lock = self.lock_file()?;
        let meetings = self.read_all()?;
        Ok(meetings
            .into_iter()
            .filter(|m| overlaps(m.start_time, m.end_time, start, end))
            .collect())
    }

    async fn get_meeting(&self, id: &str) -> ServiceResult<Option<Meeting>> {
        let _lock = self.lock_file()?;
        Ok(self.read_all()?.into_iter().find(|m| m.id == id))
    }

    async fn insert_meeting(&self, draft: MeetingDraft) -> ServiceResult<Meeting> {
        let _lock = self.lock_file()?;

        let now = Utc::now();
        let meeting = Meeting {
            id: format!("meeting-{:08x}", rand::random::<u32>()),
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

        self.append_record(&meeting)?;
        Ok(meeting)
    }

    async fn update_meeting(&self, meeting: &Meeting) -> ServiceResult<Meeting> {
        let _lock = self.lock_file()?;

        let mut meetings = self.read_all()?;
        let slot = meetings.iter_mut().find(|m| m.id == meeting.id);

        match slot {
            Some(existing) => {
                let mut updated = meeting.clone();
                updated.created_at = existing.created_at;
                updated.updated_at = Utc::now();
                *existing = updated.clone();
                self.write_all(&meetings)?;
                info!("Updated meeting record {}", updated.id);
                Ok(updated)
            }
            None => {
                warn!("No meeting found to update for id {}", meeting.id);
                Err(ServiceError::not_found("meeting", meeting.id.clone()))
            }
        }
    }

    async fn delete_meeting(&self, id: &str) -> ServiceResult<Option<Meeting>> {
        let _lock = self.lock_file()?;

        let meetings = self.read_all()?;
        let removed = meetings.iter().find(|m| m.id == id).cloned();

        if removed.is_some() {
            let remaining: Vec<Meeting> =
                meetings.into_iter().filter(|m| m.id != id).collect();
            self.write_all(&remaining)?;
            info!("Deleted meeting record {}", id);
        }

        Ok(removed)
    }

    async fn find_approved_after(&self, instant: DateTime<Utc>) -> ServiceResult<Vec<Meeting>> {
        let _lock = self.lock_file()?;
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|m| m.is_approved && m.start_time > instant)
            .collect())
    }
}

/// Builds the meeting store from the environment.
pub fn create_meeting_store() -> ServiceResult<Arc<CsvMeetingStore>> {
    // Default path with environment variable override
    let default_path = "/app/data/meetings.csv";
    let csv_path =
        std::env::var("MEETING_DATABASE_PATH").unwrap_or_else(|_| default_path.to_string());

    if csv_path == default_path {
        if let Some(dir) = Path::new(default_path).parent() {
            if let Err(e) = std::fs::create_dir_all(dir) {
                error!("Failed to create data directory: {}", e);
                return Err(ServiceError::store(format!(
                    "Failed to create data directory: {}",
                    e
                )));
            }
        }
    }

    Ok(Arc::new(CsvMeetingStore::new(&csv_path)?))
}
