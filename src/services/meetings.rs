use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::errors::{ServiceError, ServiceResult};
use crate::models::meeting::{Meeting, MeetingChanges, MeetingDraft, MeetingRequest};
use crate::models::notification::{
    NotificationAction, NotificationBatch, NotificationPlan, RenderedMessage,
};
use crate::models::room::Room;
use crate::models::user::{Role, User};
use crate::services::approval::{
    approve_transition, creation_outcome, ApprovalState, ApproveTransition, Audience,
};
use crate::services::availability;
use crate::services::candidate_diff::{dedup_ids, diff};
use crate::services::database::MeetingStore;
use crate::services::directory::{RoomCatalog, UserDirectory};
use crate::services::notifier::Notifier;
use crate::services::reminder::ReminderScheduler;
use crate::templates;

/// The meeting scheduling engine.
///
/// Composes the availability resolver, approval state machine, candidate
/// diff engine, reminder scheduler and notification orchestrator behind
/// the operations a request layer calls.
pub struct MeetingService {
    store: Arc<dyn MeetingStore>,
    directory: Arc<dyn UserDirectory>,
    rooms: Arc<dyn RoomCatalog>,
    notifier: Arc<Notifier>,
    reminders: Arc<ReminderScheduler>,
    app_url: String,
    // Per-meeting-id locks: mutations on the same meeting are linearized,
    // cross-meeting operations run in parallel.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl MeetingService {
    pub fn new(
        store: Arc<dyn MeetingStore>,
        directory: Arc<dyn UserDirectory>,
        rooms: Arc<dyn RoomCatalog>,
        notifier: Arc<Notifier>,
        reminders: Arc<ReminderScheduler>,
        app_url: String,
    ) -> Self {
        Self {
            store,
            directory,
            rooms,
            notifier,
            reminders,
            app_url,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a meeting. The organizer's role decides the initial
    /// approval state and who gets notified.
    pub async fn create_meeting(
        &self,
        organizer_id: &str,
        request: MeetingRequest,
    ) -> ServiceResult<(Meeting, ApprovalState)> {
        if request.reason.trim().is_empty() {
            return Err(ServiceError::EmptyReason);
        }
        availability::validate_window(request.start_time, request.end_time)?;

        let organizer = self.require_user(organizer_id).await?;
        self.require_room(&request.room_id).await?;

        let candidate_ids = dedup_ids(&request.candidate_ids);
        let candidates = self.require_users(&candidate_ids).await?;

        let outcome = creation_outcome(organizer.role);

        let meeting = self
            .store
            .insert_meeting(MeetingDraft {
                room_id: request.room_id,
                organizer_id: organizer.id.clone(),
                candidate_ids,
                reason: request.reason,
                start_time: request.start_time,
                end_time: request.end_time,
                is_approved: outcome.state.is_approved(),
            })
            .await?;

        info!(
            "Created meeting {} by {} ({}), initial state {:?}",
            meeting.id,
            organizer.email,
            organizer.role.as_str(),
            outcome.state
        );

        let audience = match outcome.audience {
            Audience::Candidates => candidates,
            Audience::Approvers => self.approver_audience().await?,
        };

        let rendered = self.render(&meeting, outcome.action).await;
        self.notifier.dispatch(audience, rendered);

        if outcome.state.is_approved() {
            if let Err(e) = self.reminders.schedule(&meeting).await {
                warn!("Failed to schedule reminder for meeting {}: {}", meeting.id, e);
            }
        }

        Ok((meeting, outcome.state))
    }

    /// Replaces a meeting's fields and notifies per the candidate diff.
    pub async fn update_meeting(
        &self,
        id: &str,
        changes: MeetingChanges,
    ) -> ServiceResult<(Meeting, NotificationPlan)> {
        let lock = self.meeting_lock(id).await;
        let _guard = lock.lock().await;

        let old = self.require_meeting(id).await?;

        if changes.reason.trim().is_empty() {
            return Err(ServiceError::EmptyReason);
        }
        availability::validate_window(changes.start_time, changes.end_time)?;
        self.require_room(&changes.room_id).await?;

        let candidate_ids = dedup_ids(&changes.candidate_ids);
        self.require_users(&candidate_ids).await?;

        let updated = Meeting {
            id: old.id.clone(),
            room_id: changes.room_id,
            organizer_id: old.organizer_id.clone(),
            candidate_ids,
            reason: changes.reason,
            start_time: changes.start_time,
            end_time: changes.end_time,
            is_approved: old.is_approved,
            created_at: old.created_at,
            updated_at: old.updated_at,
        };

        let saved = self.store.update_meeting(&updated).await?;

        let plan = if old.is_approved {
            let d = diff(&old.candidate_ids, &saved.candidate_ids);

            // Priority-ordered branches: removal wins over addition when a
            // single update does both, so the added-member notification is
            // dropped in that case.
            let plan = if !d.removed.is_empty() {
                vec![
                    NotificationBatch::new(
                        NotificationAction::Removed,
                        self.lookup_users(&d.removed).await,
                    ),
                    NotificationBatch::new(
                        NotificationAction::Updated,
                        self.lookup_users(&d.unchanged).await,
                    ),
                ]
            } else if !d.added.is_empty() {
                vec![
                    NotificationBatch::new(
                        NotificationAction::Created,
                        self.lookup_users(&d.added).await,
                    ),
                    NotificationBatch::new(
                        NotificationAction::Updated,
                        self.lookup_users(&d.unchanged).await,
                    ),
                ]
            } else {
                vec![NotificationBatch::new(
                    NotificationAction::Updated,
                    self.lookup_users(&saved.candidate_ids).await,
                )]
            };

            if let Err(e) = self.reminders.reschedule(&saved).await {
                warn!("Failed to reschedule reminder for meeting {}: {}", saved.id, e);
            }

            plan
        } else {
            // Unapproved meetings produce no diff-driven notifications;
            // only the approver audience hears about the edit.
            vec![NotificationBatch::new(
                NotificationAction::Updated,
                self.approver_audience().await?,
            )]
        };

        let plan: NotificationPlan = plan
            .into_iter()
            .filter(|batch| !batch.recipients.is_empty())
            .collect();

        for batch in &plan {
            let rendered = self.render(&saved, batch.action).await;
            self.notifier.dispatch(batch.recipients.clone(), rendered);
        }

        info!("Updated meeting {} ({} batches queued)", saved.id, plan.len());

        Ok((saved, plan))
    }

    /// Deletes a meeting, cancelling its reminder job before returning.
    pub async fn delete_meeting(&self, id: &str) -> ServiceResult<NotificationPlan> {
        let lock = self.meeting_lock(id).await;
        let _guard = lock.lock().await;

        let removed = self
            .store
            .delete_meeting(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("meeting", id))?;

        // No orphaned reminder may fire after deletion.
        self.reminders.cancel(id).await;

        let plan: NotificationPlan = if removed.is_approved {
            let recipients = self.lookup_users(&removed.candidate_ids).await;
            if recipients.is_empty() {
                Vec::new()
            } else {
                vec![NotificationBatch::new(
                    NotificationAction::Cancelled,
                    recipients,
                )]
            }
        } else {
            Vec::new()
        };

        for batch in &plan {
            let rendered = self.render(&removed, batch.action).await;
            self.notifier.dispatch(batch.recipients.clone(), rendered);
        }

        info!("Deleted meeting {}", id);

        Ok(plan)
    }

    /// Approves a pending meeting. Approving an already-approved meeting
    /// is a no-op success with no re-notification.
    pub async fn approve_meeting(&self, id: &str, acting: &User) -> ServiceResult<Meeting> {
        let lock = self.meeting_lock(id).await;
        let _guard = lock.lock().await;

        let mut meeting = self.require_meeting(id).await?;

        match approve_transition(meeting.is_approved) {
            ApproveTransition::AlreadyApproved => {
                info!(
                    "Meeting {} already approved, no-op approval by {}",
                    id, acting.email
                );
                Ok(meeting)
            }
            ApproveTransition::BecameApproved => {
                meeting.is_approved = true;
                let saved = self.store.update_meeting(&meeting).await?;

                info!("Meeting {} approved by {}", saved.id, acting.email);

                let recipients = self.lookup_users(&saved.candidate_ids).await;
                let rendered = self.render(&saved, NotificationAction::Created).await;
                self.notifier.dispatch(recipients, rendered);

                if let Err(e) = self.reminders.schedule(&saved).await {
                    warn!("Failed to schedule reminder for meeting {}: {}", saved.id, e);
                }

                Ok(saved)
            }
        }
    }

    /// Rooms from `candidate_rooms` that are free over the window.
    pub async fn check_availability(
        &self,
        window_start: chrono::DateTime<chrono::Utc>,
        window_end: chrono::DateTime<chrono::Utc>,
        candidate_rooms: &[Room],
    ) -> ServiceResult<Vec<Room>> {
        availability::resolve(
            self.store.as_ref(),
            candidate_rooms,
            window_start,
            window_end,
        )
        .await
    }

    async fn meeting_lock(&self, id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(
            locks
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    async fn require_meeting(&self, id: &str) -> ServiceResult<Meeting> {
        self.store
            .get_meeting(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("meeting", id))
    }

    async fn require_user(&self, id: &str) -> ServiceResult<User> {
        self.directory
            .get_user(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("user", id))
    }

    async fn require_room(&self, id: &str) -> ServiceResult<Room> {
        self.rooms
            .get_room(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("room", id))
    }

    /// Strict resolution: every id must be known to the directory.
    async fn require_users(&self, ids: &[String]) -> ServiceResult<Vec<User>> {
        let mut users = Vec::with_capacity(ids.len());
        for id in ids {
            users.push(self.require_user(id).await?);
        }
        Ok(users)
    }

    /// Lenient resolution for dispatch audiences: unknown ids are logged
    /// and skipped rather than failing the whole batch.
    async fn lookup_users(&self, ids: &[String]) -> Vec<User> {
        let mut users = Vec::with_capacity(ids.len());
        for id in ids {
            match self.directory.get_user(id).await {
                Ok(Some(user)) => users.push(user),
                Ok(None) => warn!("Notification recipient {} not found in directory", id),
                Err(e) => warn!("Directory lookup for {} failed: {}", id, e),
            }
        }
        users
    }

    /// All managers plus all admins, de-duplicated by id.
    async fn approver_audience(&self) -> ServiceResult<Vec<User>> {
        let mut audience = self.directory.find_by_role(Role::Manager).await?;
        for admin in self.directory.find_by_role(Role::Admin).await? {
            if !audience.iter().any(|u| u.id == admin.id) {
                audience.push(admin);
            }
        }
        Ok(audience)
    }

    async fn render(&self, meeting: &Meeting, action: NotificationAction) -> RenderedMessage {
        let room_name = match self.rooms.get_room(&meeting.room_id).await {
            Ok(Some(room)) => room.name,
            _ => "—".to_string(),
        };
        let organizer_email = match self.directory.get_user(&meeting.organizer_id).await {
            Ok(Some(user)) => user.email,
            _ => String::new(),
        };
        templates::build_meeting_message(meeting, &room_name, &organizer_email, action, &self.app_url)
    }
}
