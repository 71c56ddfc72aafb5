//! Roles: the person-record role id and the signed-in operator role.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Role id stored on a person record by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum RoleId {
    /// Administrator (1).
    Admin,
    /// Consultant / konsulent (2).
    Consultant,
    /// Customer (3).
    Customer,
    /// Any id this frontend does not know about.
    Unknown(i64),
}

impl RoleId {
    /// The numeric id sent over the wire.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        match self {
            Self::Admin => 1,
            Self::Consultant => 2,
            Self::Customer => 3,
            Self::Unknown(id) => id,
        }
    }
}

impl From<i64> for RoleId {
    fn from(id: i64) -> Self {
        match id {
            1 => Self::Admin,
            2 => Self::Consultant,
            3 => Self::Customer,
            other => Self::Unknown(other),
        }
    }
}

impl From<RoleId> for i64 {
    fn from(role: RoleId) -> Self {
        role.as_i64()
    }
}

/// Role of the signed-in operator, taken from the bearer credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Manages consultants and customers.
    Admin,
    /// Manages customers and orders, and may change their own password.
    Consultant,
}

impl Role {
    /// Map a credential role claim onto a known role, case-insensitively.
    ///
    /// Returns `None` for anything unrecognized; callers fall back to
    /// [`Role::Consultant`], the lower privilege.
    #[must_use]
    pub fn from_claim(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "konsulent" | "consultant" => Some(Self::Consultant),
            _ => None,
        }
    }

    /// URL path segment of this role's area (`/admin`, `/konsulent`).
    #[must_use]
    pub const fn home_path(self) -> &'static str {
        match self {
            Self::Admin => "/admin",
            Self::Consultant => "/konsulent",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Consultant => write!(f, "konsulent"),
        }
    }
}
