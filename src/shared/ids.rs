//! Canonical Identifiers
//!
//! Every entity is addressed by its own newtype over `Uuid`. Ids compare by
//! value and serialize as plain UUID strings, so the same type flows through
//! the registry, channel membership and the access policy without ad hoc
//! string conversions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random id
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// The underlying UUID
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

define_id!(
    /// Identity of an authenticated principal (user)
    PrincipalId
);
define_id!(
    /// Identity of a project room
    RoomId
);
define_id!(
    /// Identity of a direct-message conversation
    ConversationId
);
define_id!(
    /// Identity of a task
    TaskId
);
define_id!(
    /// Identity of a persisted chat message
    MessageId
);
define_id!(
    /// Identity of one focus session
    FocusSessionId
);
define_id!(
    /// Identity of one physical transport connection
    ConnectionId
);
