use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::ServiceResult;
use crate::models::meeting::Meeting;
use crate::models::notification::NotificationAction;
use crate::models::user::User;
use crate::services::database::MeetingStore;
use crate::services::directory::{RoomCatalog, UserDirectory};
use crate::services::notifier::Notifier;
use crate::templates;

/// How long before a meeting's start the reminder fires.
pub const DEFAULT_REMINDER_LEAD_MINUTES: i64 = 5;

struct ReminderJob {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Process-wide registry of one-shot reminder timers, one per approved
/// meeting with a future start.
///
/// Injected as an `Arc` service rather than ambient shared state. Jobs
/// are not persisted: `restore_from_store` recomputes the reminder set
/// after a restart.
pub struct ReminderScheduler {
    jobs: Mutex<HashMap<String, ReminderJob>>,
    next_generation: AtomicU64,
    lead: ChronoDuration,
    store: Arc<dyn MeetingStore>,
    directory: Arc<dyn UserDirectory>,
    rooms: Arc<dyn RoomCatalog>,
    notifier: Arc<Notifier>,
    app_url: String,
}

impl ReminderScheduler {
    pub fn new(
        store: Arc<dyn MeetingStore>,
        directory: Arc<dyn UserDirectory>,
        rooms: Arc<dyn RoomCatalog>,
        notifier: Arc<Notifier>,
        app_url: String,
    ) -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
            lead: ChronoDuration::minutes(DEFAULT_REMINDER_LEAD_MINUTES),
            store,
            directory,
            rooms,
            notifier,
            app_url,
        }
    }

    /// Overrides the reminder lead time. Mainly for tests.
    pub fn with_lead(mut self, lead: ChronoDuration) -> Self {
        self.lead = lead;
        self
    }

    /// Registers a one-shot timer for `meeting`, replacing any existing
    /// job for the same id.
    ///
    /// Returns false without scheduling when the meeting has already
    /// started. A fire time already in the past (but a start still in the
    /// future) fires immediately.
    ///
    /// The registry lock is held across abort-old/spawn/insert so that a
    /// racing reschedule and a natural fire can never leave two live jobs
    /// or zero jobs for a meeting that is still approved and upcoming.
    pub async fn schedule(self: &Arc<Self>, meeting: &Meeting) -> ServiceResult<bool> {
        let now = Utc::now();

        if meeting.start_time <= now {
            debug!(
                "Meeting {} starts in the past ({}), skipping reminder",
                meeting.id, meeting.start_time
            );
            return Ok(false);
        }

        let fire_at = meeting.start_time - self.lead;
        let delay = (fire_at - now).to_std().unwrap_or(Duration::ZERO);

        let mut jobs = self.jobs.lock().await;

        if let Some(old) = jobs.remove(&meeting.id) {
            old.handle.abort();
            debug!("Replaced existing reminder job for meeting {}", meeting.id);
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let scheduler = Arc::clone(self);
        let meeting_id = meeting.id.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            scheduler.run_job(meeting_id, generation).await;
        });

        jobs.insert(
            meeting.id.clone(),
            ReminderJob { generation, handle },
        );

        info!(
            "Scheduled reminder for meeting {} at {} ({}s from now)",
            meeting.id,
            fire_at,
            delay.as_secs()
        );

        Ok(true)
    }

    /// Stops and removes the timer for `meeting_id`. Returns false (not
    /// an error) when no job exists.
    pub async fn cancel(&self, meeting_id: &str) -> bool {
        let mut jobs = self.jobs.lock().await;
        match jobs.remove(meeting_id) {
            Some(job) => {
                job.handle.abort();
                info!("Cancelled reminder job for meeting {}", meeting_id);
                true
            }
            None => {
                debug!("No reminder job to cancel for meeting {}", meeting_id);
                false
            }
        }
    }

    /// Cancel-then-schedule, used whenever an approved meeting's start
    /// time changes or it transitions into approved.
    pub async fn reschedule(self: &Arc<Self>, meeting: &Meeting) -> ServiceResult<bool> {
        self.cancel(&meeting.id).await;
        self.schedule(meeting).await
    }

    /// True if a live job exists for the meeting.
    pub async fn has_job(&self, meeting_id: &str) -> bool {
        self.jobs.lock().await.contains_key(meeting_id)
    }

    /// Number of live jobs.
    pub async fn job_count(&self) -> usize {
        self.jobs.lock().await.len()
    }

    /// Recomputes the reminder set from the store: one job per approved
    /// meeting with a future start. Called once at startup, since pending
    /// jobs do not survive a process restart.
    pub async fn restore_from_store(self: &Arc<Self>) -> ServiceResult<usize> {
        let upcoming = self.store.find_approved_after(Utc::now()).await?;
        let mut restored = 0;

        for meeting in &upcoming {
            if self.schedule(meeting).await? {
                restored += 1;
            }
        }

        info!("Restored {} reminder jobs from the store", restored);
        Ok(restored)
    }

    /// Body of a fired timer.
    ///
    /// Claims the registry entry first (a superseded generation bails
    /// out), then re-reads the meeting so an edit, deletion or approval
    /// change that landed while the timer slept wins over the stale
    /// snapshot the job was scheduled against.
    async fn run_job(self: Arc<Self>, meeting_id: String, generation: u64) {
        {
            let mut jobs = self.jobs.lock().await;
            match jobs.get(&meeting_id) {
                Some(job) if job.generation == generation => {
                    // One-shot: remove before sending so this job can
                    // never fire twice.
                    jobs.remove(&meeting_id);
                }
                _ => {
                    debug!(
                        "Reminder job for meeting {} was superseded, skipping",
                        meeting_id
                    );
                    return;
                }
            }
        }

        let meeting = match self.store.get_meeting(&meeting_id).await {
            Ok(Some(meeting)) => meeting,
            Ok(None) => {
                debug!("Meeting {} no longer exists, dropping reminder", meeting_id);
                return;
            }
            Err(e) => {
                warn!("Failed to load meeting {} for reminder: {}", meeting_id, e);
                return;
            }
        };

        if !meeting.is_approved {
            debug!(
                "Meeting {} is no longer approved, dropping reminder",
                meeting_id
            );
            return;
        }

        let recipients = match self.reminder_audience(&meeting).await {
            Ok(recipients) => recipients,
            Err(e) => {
                warn!(
                    "Failed to resolve reminder audience for meeting {}: {}",
                    meeting_id, e
                );
                return;
            }
        };

        let room_name = match self.rooms.get_room(&meeting.room_id).await {
            Ok(Some(room)) => room.name,
            _ => "—".to_string(),
        };

        let organizer_email = recipients
            .iter()
            .find(|u| u.id == meeting.organizer_id)
            .map(|u| u.email.clone())
            .unwrap_or_default();

        let rendered = templates::build_meeting_message(
            &meeting,
            &room_name,
            &organizer_email,
            NotificationAction::Reminder,
            &self.app_url,
        );

        info!(
            "Firing reminder for meeting {} to {} recipients",
            meeting_id,
            recipients.len()
        );

        self.notifier.send_batch(&recipients, &rendered).await;
    }

    /// All current candidates plus the organizer, de-duplicated by id.
    async fn reminder_audience(&self, meeting: &Meeting) -> ServiceResult<Vec<User>> {
        let mut recipients: Vec<User> = Vec::new();

        for id in meeting.candidate_ids.iter().chain([&meeting.organizer_id]) {
            if recipients.iter().any(|u| &u.id == id) {
                continue;
            }
            match self.directory.get_user(id).await? {
                Some(user) => recipients.push(user),
                None => warn!("Reminder recipient {} not found in directory", id),
            }
        }

        Ok(recipients)
    }
}
