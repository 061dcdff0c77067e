/**
 * Room/Channel Membership
 *
 * Decides whether a connection may join a channel and records the join in
 * the connection's joined set.
 *
 * - **Personal** channels: only the owning principal
 * - **Conversation** channels: always permitted, no lookup
 * - **Room** channels: the room is loaded from the store and checked with
 *   `access::can_access`, the same predicate the HTTP handlers use
 *
 * A denial is a normal outcome, not an error: the requester alone receives
 * `join_channel_error` and its joined set is left untouched. A room that does
 * not exist, or that could not be looked up, is denied (fail closed).
 *
 * If the connection closes while the room lookup is in flight, the result is
 * discarded. A granted room join is checked once more after the channel is
 * recorded: a room deleted between the lookup and the insert has already
 * had its channel purged, so the late insert is undone and denied.
 */

use std::fmt;
use std::sync::Arc;

use super::registry::{Connection, ConnectionRegistry};
use crate::backend::access::can_access;
use crate::backend::store::Store;
use crate::shared::channel::{ChannelKey, ChannelKind};
use crate::shared::messaging::Principal;
use crate::shared::RealtimeEvent;

/// Why a join was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    RoomNotFound,
    AccessRestricted,
    ForeignPersonalChannel,
    LookupFailed,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::RoomNotFound => "room_not_found",
            DenyReason::AccessRestricted => "access_restricted",
            DenyReason::ForeignPersonalChannel => "foreign_personal_channel",
            DenyReason::LookupFailed => "lookup_failed",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    AlreadyJoined,
    Denied(DenyReason),
    /// The connection closed before the decision was made
    Discarded,
}

pub struct ChannelMembership {
    store: Arc<dyn Store>,
    registry: Arc<ConnectionRegistry>,
}

impl ChannelMembership {
    pub fn new(store: Arc<dyn Store>, registry: Arc<ConnectionRegistry>) -> Self {
        Self { store, registry }
    }

    /// Evaluate and apply a join request from `connection`
    pub async fn join_channel(
        &self,
        connection: &Connection,
        principal: &Principal,
        channel: ChannelKey,
    ) -> JoinOutcome {
        if connection.is_joined(&channel) {
            return JoinOutcome::AlreadyJoined;
        }

        let decision = self.authorize(principal, channel).await;

        if connection.is_closed() {
            tracing::debug!(
                "[Membership] Connection {} closed during join of {}, discarding",
                connection.id(),
                channel
            );
            return JoinOutcome::Discarded;
        }

        match decision {
            Ok(()) => {
                if !connection.join(channel) {
                    return JoinOutcome::AlreadyJoined;
                }
                if channel.kind == ChannelKind::Room {
                    if let Err(reason) = self.authorize(principal, channel).await {
                        connection.leave(&channel);
                        tracing::info!(
                            "[Membership] {} lost {} while joining",
                            principal.id,
                            channel
                        );
                        return self.deny(connection, principal, channel, reason);
                    }
                }
                tracing::debug!("[Membership] {} joined {}", principal.id, channel);
                JoinOutcome::Joined
            }
            Err(reason) => self.deny(connection, principal, channel, reason),
        }
    }

    fn deny(
        &self,
        connection: &Connection,
        principal: &Principal,
        channel: ChannelKey,
        reason: DenyReason,
    ) -> JoinOutcome {
        tracing::info!(
            "[Membership] {} denied {}: {}",
            principal.id,
            channel,
            reason
        );
        connection.deliver(RealtimeEvent::join_channel_error(channel, reason.as_str()));
        JoinOutcome::Denied(reason)
    }

    /// Whether `principal` may use `channel` right now
    ///
    /// Room channels are re-evaluated against the store on every call.
    pub async fn authorize(&self, principal: &Principal, channel: ChannelKey) -> Result<(), DenyReason> {
        match channel.kind {
            ChannelKind::Personal => {
                if channel.personal_owner() == Some(principal.id) {
                    Ok(())
                } else {
                    Err(DenyReason::ForeignPersonalChannel)
                }
            }
            ChannelKind::Conversation => Ok(()),
            ChannelKind::Room => {
                let Some(room_id) = channel.room_id() else {
                    return Err(DenyReason::RoomNotFound);
                };
                match self.store.find_room(room_id).await {
                    Ok(Some(room)) if can_access(Some(principal), Some(&room)) => Ok(()),
                    Ok(Some(_)) => Err(DenyReason::AccessRestricted),
                    Ok(None) => Err(DenyReason::RoomNotFound),
                    Err(e) => {
                        tracing::error!("[Membership] Room lookup for {} failed: {}", room_id, e);
                        Err(DenyReason::LookupFailed)
                    }
                }
            }
        }
    }

    /// Remove `channel` from every connection's joined set
    ///
    /// Returns how many connections had joined it.
    pub fn purge_channel(&self, channel: &ChannelKey) -> usize {
        self.registry
            .snapshot()
            .iter()
            .filter(|conn| conn.leave(channel))
            .count()
    }
}
