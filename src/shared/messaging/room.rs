//! Room Data Structure
//!
//! A named collaboration space with an explicit participant set. Access is
//! granted to listed participants and to ADMIN principals; the creator is
//! only a participant if the creating operation lists them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::shared::error::SharedError;
use crate::shared::ids::{PrincipalId, RoomId};

/// Maximum room name length in characters
pub const MAX_ROOM_NAME_LEN: usize = 100;

/// Maximum room description length in characters
pub const MAX_ROOM_DESCRIPTION_LEN: usize = 500;

/// Lifecycle status of a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RoomStatus {
    #[default]
    Active,
    Completed,
    Archived,
}

impl RoomStatus {
    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Active => "Active",
            RoomStatus::Completed => "Completed",
            RoomStatus::Archived => "Archived",
        }
    }
}

impl FromStr for RoomStatus {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(RoomStatus::Active),
            "Completed" => Ok(RoomStatus::Completed),
            "Archived" => Ok(RoomStatus::Archived),
            other => Err(SharedError::validation(
                "status",
                format!("unknown room status '{}'", other),
            )),
        }
    }
}

/// A project room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Unique room ID
    pub id: RoomId,
    /// Room name (trimmed, non-empty)
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Principal that created the room
    pub created_by: PrincipalId,
    /// Principals granted access
    pub participants: BTreeSet<PrincipalId>,
    /// Lifecycle status
    pub status: RoomStatus,
    /// False once archived
    pub is_active: bool,
    /// When the room was created
    pub created_at: DateTime<Utc>,
    /// When the room was last modified
    pub updated_at: DateTime<Utc>,
}

impl Room {
    /// Create a validated, active room
    pub fn new(
        name: &str,
        description: Option<&str>,
        created_by: PrincipalId,
        participants: impl IntoIterator<Item = PrincipalId>,
    ) -> Result<Self, SharedError> {
        let now = Utc::now();
        Ok(Self {
            id: RoomId::new(),
            name: validate_room_name(name)?,
            description: validate_room_description(description)?,
            created_by,
            participants: participants.into_iter().collect(),
            status: RoomStatus::Active,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether `id` is listed as a participant
    pub fn is_participant(&self, id: PrincipalId) -> bool {
        self.participants.contains(&id)
    }
}

/// Trim and validate a room name
pub fn validate_room_name(name: &str) -> Result<String, SharedError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(SharedError::validation("name", "Room name is required"));
    }
    if trimmed.chars().count() > MAX_ROOM_NAME_LEN {
        return Err(SharedError::validation(
            "name",
            format!("Room name cannot exceed {} characters", MAX_ROOM_NAME_LEN),
        ));
    }
    Ok(trimmed.to_string())
}

/// Trim a description; blank descriptions become `None`
pub fn validate_room_description(description: Option<&str>) -> Result<Option<String>, SharedError> {
    let Some(trimmed) = description.map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok(None);
    };
    if trimmed.chars().count() > MAX_ROOM_DESCRIPTION_LEN {
        return Err(SharedError::validation(
            "description",
            format!("Description cannot exceed {} characters", MAX_ROOM_DESCRIPTION_LEN),
        ));
    }
    Ok(Some(trimmed.to_string()))
}

/// A room annotated with whether the requesting principal may enter it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomView {
    #[serde(flatten)]
    pub room: Room,
    pub has_access: bool,
}

/// Request to create a room
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub participants: Vec<PrincipalId>,
}

/// Request to replace a room's participant set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateParticipantsRequest {
    pub participant_ids: Vec<PrincipalId>,
}

/// Presence of one room participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantPresence {
    pub principal_id: PrincipalId,
    pub online: bool,
}
