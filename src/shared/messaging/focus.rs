//! Focus Session Data Structure
//!
//! A stretch of focused work by one principal. At most one session per
//! principal is active; starting a new one ends the previous.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::ids::{FocusSessionId, PrincipalId};

/// How many past sessions the stats view returns
pub const FOCUS_STATS_LIMIT: usize = 10;

/// A focus session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusSession {
    pub id: FocusSessionId,
    pub principal_id: PrincipalId,
    pub start_time: DateTime<Utc>,
    /// Set when the session is stopped or superseded
    pub end_time: Option<DateTime<Utc>>,
    /// Messages sent by the principal while the session was active
    pub message_count: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl FocusSession {
    /// A session starting now
    pub fn start(principal_id: PrincipalId) -> Self {
        let now = Utc::now();
        Self {
            id: FocusSessionId::new(),
            principal_id,
            start_time: now,
            end_time: None,
            message_count: 0,
            is_active: true,
            created_at: now,
        }
    }

    /// End the session at `at`
    pub fn finish(&mut self, at: DateTime<Utc>) {
        self.end_time = Some(at);
        self.is_active = false;
    }
}
