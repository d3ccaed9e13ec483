use serde::{Deserialize, Serialize};

/// Role of a principal. Determines auto-approval eligibility and
/// notification audiences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Manager,
    Admin,
}

impl Role {
    /// Parses a role from its stored string form.
    ///
    /// The original user records used "user" for ordinary members; both
    /// spellings are accepted.
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "user" | "member" => Some(Role::Member),
            "manager" => Some(Role::Manager),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }

    /// Managers and admins can approve meetings and get their own meetings
    /// auto-approved.
    pub fn is_approver(&self) -> bool {
        matches!(self, Role::Manager | Role::Admin)
    }
}

/// An authenticated actor known to the directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub fullname: String,
    pub email: String,
    pub role: Role,
}
