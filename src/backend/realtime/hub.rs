//! Realtime hub
//!
//! Bundles the registry, relay, membership and presence components around
//! one store so handlers and sockets share a single cheaply clonable value.

use std::sync::Arc;
use tokio::sync::mpsc;

use super::membership::ChannelMembership;
use super::presence::PresencePublisher;
use super::registry::ConnectionRegistry;
use super::relay::EventRelay;
use crate::backend::store::Store;
use crate::shared::config::RealtimeSettings;
use crate::shared::RealtimeEvent;

#[derive(Clone)]
pub struct RealtimeHub {
    registry: Arc<ConnectionRegistry>,
    relay: EventRelay,
    membership: Arc<ChannelMembership>,
    presence: Arc<PresencePublisher>,
    store: Arc<dyn Store>,
    settings: RealtimeSettings,
}

impl RealtimeHub {
    pub fn new(store: Arc<dyn Store>, settings: RealtimeSettings) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let relay = EventRelay::new(Arc::clone(&registry));
        let membership = Arc::new(ChannelMembership::new(Arc::clone(&store), Arc::clone(&registry)));
        let presence = Arc::new(PresencePublisher::new(
            Arc::clone(&registry),
            relay.clone(),
            Arc::clone(&store),
        ));
        Self {
            registry,
            relay,
            membership,
            presence,
            store,
            settings,
        }
    }

    /// Bounded outbound queue for a new connection
    pub fn outbound_channel(&self) -> (mpsc::Sender<RealtimeEvent>, mpsc::Receiver<RealtimeEvent>) {
        mpsc::channel(self.settings.outbound_capacity.max(1))
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn relay(&self) -> &EventRelay {
        &self.relay
    }

    pub fn membership(&self) -> &ChannelMembership {
        &self.membership
    }

    pub fn presence(&self) -> &PresencePublisher {
        &self.presence
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn settings(&self) -> &RealtimeSettings {
        &self.settings
    }
}
