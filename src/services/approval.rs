use serde::Serialize;
use tracing::debug;

use crate::models::notification::NotificationAction;
use crate::models::user::Role;

/// Approval status of a meeting. `Approved` is terminal: the engine never
/// demotes an approved meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalState {
    Pending,
    Approved,
}

impl ApprovalState {
    pub fn is_approved(&self) -> bool {
        matches!(self, ApprovalState::Approved)
    }
}

/// Who a creation notification goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// The meeting's candidate set.
    Candidates,
    /// All managers plus all admins, resolved through the directory.
    Approvers,
}

/// Outcome of creating a meeting, as decided by the role policy.
#[derive(Debug, Clone, Copy)]
pub struct CreationOutcome {
    pub state: ApprovalState,
    pub action: NotificationAction,
    pub audience: Audience,
}

/// Result of attempting the approve transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApproveTransition {
    /// Pending -> Approved: notify candidates, schedule a reminder.
    BecameApproved,
    /// Already approved: treated as a no-op success, no re-notification.
    AlreadyApproved,
}

/// Policy table mapping the creator's role to approval outcome and
/// notification audience.
///
/// | role    | state    | action  | audience   |
/// |---------|----------|---------|------------|
/// | member  | Pending  | Pending | Approvers  |
/// | manager | Approved | Created | Candidates |
/// | admin   | Approved | Created | Candidates |
pub fn creation_outcome(role: Role) -> CreationOutcome {
    let outcome = match role {
        Role::Manager | Role::Admin => CreationOutcome {
            state: ApprovalState::Approved,
            action: NotificationAction::Created,
            audience: Audience::Candidates,
        },
        Role::Member => CreationOutcome {
            state: ApprovalState::Pending,
            action: NotificationAction::Pending,
            audience: Audience::Approvers,
        },
    };

    debug!(
        "Creation by {} resolves to {:?} state",
        role.as_str(),
        outcome.state
    );

    outcome
}

/// Decides the approve transition for a meeting's current state.
pub fn approve_transition(is_approved: bool) -> ApproveTransition {
    if is_approved {
        ApproveTransition::AlreadyApproved
    } else {
        ApproveTransition::BecameApproved
    }
}
