//! Access Policy
//!
//! Decides whether a principal may observe or act on a room. This is the
//! single predicate used by both the HTTP request path and the real-time
//! join path, so the two can never disagree.
//!
//! # Rules
//!
//! - ADMIN principals may access every room
//! - Any other principal needs to be listed in the room's participants
//! - An absent principal or room is never accessible

use crate::shared::messaging::{Principal, Room};

/// Whether `principal` may access `room`
///
/// Pure: no I/O and no side effects. Callers pass `None` when a lookup came
/// back empty, which denies access (fail closed).
///
/// ```rust
/// use huddle::backend::access::can_access;
/// use huddle::shared::messaging::{Principal, Role, Room};
///
/// let admin = Principal::new("alice", Role::Admin);
/// let member = Principal::new("bob", Role::Member);
/// let room = Room::new("eng", None, admin.id, [member.id]).unwrap();
///
/// assert!(can_access(Some(&admin), Some(&room)));
/// assert!(can_access(Some(&member), Some(&room)));
/// assert!(!can_access(Some(&member), None));
/// ```
pub fn can_access(principal: Option<&Principal>, room: Option<&Room>) -> bool {
    match (principal, room) {
        (Some(principal), Some(room)) => principal.is_admin() || room.is_participant(principal.id),
        _ => false,
    }
}

/// Whether `principal` may perform ADMIN-only room management
pub fn can_manage_rooms(principal: &Principal) -> bool {
    principal.is_admin()
}
