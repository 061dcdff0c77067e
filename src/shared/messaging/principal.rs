//! Principal Data Structure
//!
//! An authenticated identity with a role. Roles are fixed once the principal
//! is created.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::shared::error::SharedError;
use crate::shared::ids::PrincipalId;

/// Role of a principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Full access to every room, may create and manage rooms
    Admin,
    /// Access limited to rooms listing the principal as participant
    #[default]
    Member,
}

impl Role {
    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Member => "MEMBER",
        }
    }
}

impl FromStr for Role {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "MEMBER" => Ok(Role::Member),
            other => Err(SharedError::validation(
                "role",
                format!("unknown role '{}'", other),
            )),
        }
    }
}

/// An authenticated identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Unique principal ID
    pub id: PrincipalId,
    /// Role, immutable after creation
    pub role: Role,
    /// Name shown to other users
    pub display_name: String,
}

impl Principal {
    /// Create a principal with a fresh id
    pub fn new(display_name: impl Into<String>, role: Role) -> Self {
        Self {
            id: PrincipalId::new(),
            role,
            display_name: display_name.into(),
        }
    }

    /// Whether this principal holds the ADMIN role
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A principal as persisted, with its last known presence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalRecord {
    /// The identity itself
    #[serde(flatten)]
    pub principal: Principal,
    /// Online flag maintained by presence marking
    pub is_online: bool,
    /// When presence last changed
    pub last_seen: Option<DateTime<Utc>>,
}

impl From<Principal> for PrincipalRecord {
    fn from(principal: Principal) -> Self {
        Self {
            principal,
            is_online: false,
            last_seen: None,
        }
    }
}
