/**
 * Event Relay
 *
 * Routes server events to connections. Delivery is at-most-once and
 * best-effort: a connection that has not joined the channel, or whose
 * outbound queue is full, simply misses the event. Clients reconcile by
 * fetching over HTTP when they (re)join.
 *
 * Each connection's outbound queue is FIFO, so events published on one
 * channel by one origin arrive at every subscriber in publish order.
 *
 * Publishing never touches persisted state.
 */

use std::sync::Arc;

use super::registry::ConnectionRegistry;
use crate::shared::channel::ChannelKey;
use crate::shared::ids::ConnectionId;
use crate::shared::RealtimeEvent;

#[derive(Debug, Clone)]
pub struct EventRelay {
    registry: Arc<ConnectionRegistry>,
}

impl EventRelay {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Deliver `event` to every connection joined to `channel`, except
    /// `exclude`
    ///
    /// Returns the number of connections the event was queued for.
    pub fn publish(
        &self,
        channel: &ChannelKey,
        event: RealtimeEvent,
        exclude: Option<ConnectionId>,
    ) -> usize {
        let delivered = self
            .registry
            .snapshot()
            .into_iter()
            .filter(|conn| Some(conn.id()) != exclude && conn.is_joined(channel))
            .filter(|conn| conn.deliver(event.clone()))
            .count();
        tracing::debug!(
            "[Realtime] {} on {} delivered to {} connection(s)",
            event.event_type.as_str(),
            channel,
            delivered
        );
        delivered
    }

    /// Deliver `event` to every attached connection regardless of channel
    /// membership, except `exclude`
    ///
    /// Used for presence changes and room deletion.
    pub fn broadcast_all(&self, event: RealtimeEvent, exclude: Option<ConnectionId>) -> usize {
        let delivered = self
            .registry
            .snapshot()
            .into_iter()
            .filter(|conn| Some(conn.id()) != exclude)
            .filter(|conn| conn.deliver(event.clone()))
            .count();
        tracing::info!(
            "[Realtime] {} broadcast to {} connection(s)",
            event.event_type.as_str(),
            delivered
        );
        delivered
    }

    /// Deliver `event` to a single connection
    pub fn send_to(&self, connection_id: ConnectionId, event: RealtimeEvent) -> bool {
        match self.registry.connection(connection_id) {
            Some(conn) => conn.deliver(event),
            None => false,
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }
}
