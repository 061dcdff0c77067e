/**
 * Connection Registry
 *
 * Process-wide record of live connections and of which principal owns them.
 *
 * # Structure
 *
 * - `connections`: every attached connection by `ConnectionId`, identified
 *   or not, so broadcasts reach all of them
 * - `principals`: principal to the set of its connection ids (one entry per
 *   device)
 *
 * Both maps are `DashMap`s, so mutations lock a single shard rather than the
 * whole registry. All changes to one principal's connection set go through
 * that principal's entry, which serializes concurrent connect/disconnect of
 * the same principal while other principals proceed in parallel.
 *
 * # Presence
 *
 * A principal is online while its connection set is non-empty. `register`
 * reports the 0 to 1 transition and `unregister` the 1 to 0 transition so the
 * presence publisher announces each change exactly once.
 */

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::shared::channel::ChannelKey;
use crate::shared::ids::{ConnectionId, PrincipalId};
use crate::shared::RealtimeEvent;

/// One live transport session
///
/// The joined-channel set is only mutated by the connection's own worker
/// (and by room deletion purging a channel), while relays read it on every
/// publish, hence the reader-friendly lock.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    principal: RwLock<Option<PrincipalId>>,
    channels: RwLock<HashSet<ChannelKey>>,
    outbound: mpsc::Sender<RealtimeEvent>,
    closed: AtomicBool,
}

impl Connection {
    pub fn new(outbound: mpsc::Sender<RealtimeEvent>) -> Self {
        Self {
            id: ConnectionId::new(),
            principal: RwLock::new(None),
            channels: RwLock::new(HashSet::new()),
            outbound,
            closed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Owner, once the session has been identified
    pub fn principal(&self) -> Option<PrincipalId> {
        *self.principal.read()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Mark closed; returns false if it already was
    pub fn mark_closed(&self) -> bool {
        !self.closed.swap(true, Ordering::SeqCst)
    }

    pub fn is_joined(&self, channel: &ChannelKey) -> bool {
        self.channels.read().contains(channel)
    }

    /// Add a channel; returns false if it was already joined
    pub fn join(&self, channel: ChannelKey) -> bool {
        self.channels.write().insert(channel)
    }

    /// Remove a channel; returns false if it was not joined
    pub fn leave(&self, channel: &ChannelKey) -> bool {
        self.channels.write().remove(channel)
    }

    pub fn joined_channels(&self) -> Vec<ChannelKey> {
        self.channels.read().iter().copied().collect()
    }

    /// Queue an event for this connection's writer
    ///
    /// Never blocks. A full queue or a finished writer drops the event.
    pub fn deliver(&self, event: RealtimeEvent) -> bool {
        match self.outbound.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(event)) => {
                tracing::debug!(
                    "[Registry] Outbound queue full for connection {}, dropping {}",
                    self.id,
                    event.event_type.as_str()
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

/// Outcome of removing a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unregistered {
    pub principal_id: PrincipalId,
    /// True when this was the principal's last connection
    pub went_offline: bool,
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, Arc<Connection>>,
    principals: DashMap<PrincipalId, HashSet<ConnectionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly opened, not yet identified connection
    pub fn attach(&self, connection: Arc<Connection>) {
        self.connections.insert(connection.id(), connection);
    }

    /// Bind `connection_id` to `principal_id`
    ///
    /// Returns true when the principal had no other connection, i.e. it just
    /// came online.
    pub fn register(&self, principal_id: PrincipalId, connection_id: ConnectionId) -> bool {
        if let Some(connection) = self.connections.get(&connection_id) {
            *connection.principal.write() = Some(principal_id);
        }

        let mut entry = self.principals.entry(principal_id).or_default();
        let came_online = entry.is_empty();
        entry.insert(connection_id);
        came_online
    }

    /// Drop a connection entirely
    ///
    /// Returns the owning principal, if the connection had been identified,
    /// and whether it was that principal's last connection.
    pub fn unregister(&self, connection_id: ConnectionId) -> Option<Unregistered> {
        let (_, connection) = self.connections.remove(&connection_id)?;
        connection.mark_closed();
        let principal_id = connection.principal()?;

        let went_offline = match self.principals.entry(principal_id) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().remove(&connection_id);
                if entry.get().is_empty() {
                    entry.remove();
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(_) => false,
        };

        Some(Unregistered {
            principal_id,
            went_offline,
        })
    }

    pub fn is_online(&self, principal_id: PrincipalId) -> bool {
        self.principals
            .get(&principal_id)
            .map(|set| !set.is_empty())
            .unwrap_or(false)
    }

    pub fn connection(&self, connection_id: ConnectionId) -> Option<Arc<Connection>> {
        self.connections.get(&connection_id).map(|c| Arc::clone(c.value()))
    }

    pub fn connections_of(&self, principal_id: PrincipalId) -> Vec<ConnectionId> {
        self.principals
            .get(&principal_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Point-in-time copy of every attached connection
    ///
    /// Fan-out iterates the snapshot so no shard lock is held while events
    /// are queued.
    pub fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.connections
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn online_count(&self) -> usize {
        self.principals.len()
    }
}
