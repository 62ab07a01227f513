//! Authenticated users and their roles.

use crate::tenant::OrganizationId;
use serde::{Deserialize, Serialize};

/// Platform role, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// A resident of the community.
    Resident,
    /// Elected board member.
    BoardMember,
    /// Organization administrator.
    Admin,
    /// Platform operator, not bound to any organization.
    SuperAdmin,
}

impl Role {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Resident => "RESIDENT",
            Self::BoardMember => "BOARD_MEMBER",
            Self::Admin => "ADMIN",
            Self::SuperAdmin => "SUPER_ADMIN",
        }
    }

    /// Returns true if this role is `minimum` or above.
    #[must_use]
    pub fn at_least(&self, minimum: Self) -> bool {
        *self >= minimum
    }

    /// Returns true for platform operators.
    #[must_use]
    pub const fn is_super_admin(&self) -> bool {
        matches!(self, Self::SuperAdmin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RESIDENT" => Ok(Self::Resident),
            "BOARD_MEMBER" => Ok(Self::BoardMember),
            "ADMIN" => Ok(Self::Admin),
            "SUPER_ADMIN" => Ok(Self::SuperAdmin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// The user behind an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// User ID.
    pub user_id: String,
    /// Email, if the identity provider supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Role.
    pub role: Role,
    /// Owning organization; `None` only for platform operators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<OrganizationId>,
}

impl Principal {
    /// Creates a member of an organization.
    #[must_use]
    pub fn member(user_id: impl Into<String>, role: Role, organization_id: OrganizationId) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
            role,
            organization_id: Some(organization_id),
        }
    }

    /// Creates a platform operator.
    #[must_use]
    pub fn super_admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
            role: Role::SuperAdmin,
            organization_id: None,
        }
    }

    /// Sets the email.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Returns true if this principal belongs to the organization.
    #[must_use]
    pub fn belongs_to(&self, organization_id: OrganizationId) -> bool {
        self.organization_id == Some(organization_id)
    }
}
