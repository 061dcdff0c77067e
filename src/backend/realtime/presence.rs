/**
 * Presence Publisher
 *
 * Turns registry changes into presence: the persisted online flag and the
 * `user_online` / `user_offline` broadcasts.
 *
 * Presence is derived from the registry's connection multiset, so a second
 * device connecting or the first of two disconnecting is silent. Only the
 * first connection (0 to 1) and the last disconnection (1 to 0) of a
 * principal are announced.
 *
 * Announcements for one principal are serialized behind a per-principal
 * async lock. Whoever holds it reads the registry, and only a change from
 * the last announced state is marked and broadcast. A reconnect that lands
 * while a slow offline mark is still in flight therefore waits, then
 * announces `user_online` after the `user_offline`.
 *
 * Store failures while marking presence are logged and swallowed; they never
 * delay or prevent connection setup or teardown.
 */

use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::registry::{Connection, ConnectionRegistry, Unregistered};
use super::relay::EventRelay;
use crate::backend::store::Store;
use crate::shared::ids::{ConnectionId, PrincipalId};
use crate::shared::RealtimeEvent;

pub struct PresencePublisher {
    registry: Arc<ConnectionRegistry>,
    relay: EventRelay,
    store: Arc<dyn Store>,
    /// Last state announced per principal; the lock is held across the
    /// store mark and the broadcast
    announced: DashMap<PrincipalId, Arc<Mutex<bool>>>,
}

impl PresencePublisher {
    pub fn new(registry: Arc<ConnectionRegistry>, relay: EventRelay, store: Arc<dyn Store>) -> Self {
        Self {
            registry,
            relay,
            store,
            announced: DashMap::new(),
        }
    }

    /// Register `connection` for `principal_id`
    ///
    /// Returns true if this call announced the principal as online.
    pub async fn connect(&self, connection: &Connection, principal_id: PrincipalId) -> bool {
        if !self.registry.register(principal_id, connection.id()) {
            tracing::debug!(
                "[Presence] {} opened another connection ({} total)",
                principal_id,
                self.registry.connections_of(principal_id).len()
            );
        }
        self.settle(principal_id, Some(connection.id())).await == Some(true)
    }

    /// Remove `connection_id` from the registry
    ///
    /// The registry update happens before any await, so it completes even if
    /// the caller is cancelled afterwards.
    pub async fn disconnect(&self, connection_id: ConnectionId) -> Option<Unregistered> {
        let removed = self.registry.unregister(connection_id)?;
        if removed.went_offline {
            self.settle(removed.principal_id, None).await;
        }
        Some(removed)
    }

    pub fn is_online(&self, principal_id: PrincipalId) -> bool {
        self.registry.is_online(principal_id)
    }

    /// Bring the announced state of `principal_id` in line with the registry
    ///
    /// Connects and disconnects of one principal settle one at a time, and
    /// each reads the registry only once it holds the lock, so the last
    /// announcement always matches the registry. Returns the newly announced
    /// state, or `None` if nothing changed.
    async fn settle(&self, principal_id: PrincipalId, exclude: Option<ConnectionId>) -> Option<bool> {
        let gate = Arc::clone(self.announced.entry(principal_id).or_default().value());
        let changed = {
            let mut announced = gate.lock().await;
            let online = self.registry.is_online(principal_id);
            if online == *announced {
                None
            } else {
                self.mark(principal_id, online).await;
                let event = if online {
                    tracing::info!("[Presence] {} is online", principal_id);
                    RealtimeEvent::user_online(principal_id)
                } else {
                    tracing::info!("[Presence] {} is offline", principal_id);
                    RealtimeEvent::user_offline(principal_id)
                };
                self.relay
                    .broadcast_all(event, if online { exclude } else { None });
                *announced = online;
                Some(online)
            }
        };

        // Forget offline principals nobody else is settling
        self.announced.remove_if(&principal_id, |_, entry| {
            Arc::strong_count(entry) == 2 && entry.try_lock().map(|state| !*state).unwrap_or(false)
        });
        changed
    }

    async fn mark(&self, principal_id: PrincipalId, online: bool) {
        if let Err(e) = self
            .store
            .set_principal_online(principal_id, online, Utc::now())
            .await
        {
            tracing::warn!(
                "[Presence] Failed to mark {} {}: {}",
                principal_id,
                if online { "online" } else { "offline" },
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::store::MemoryStore;
    use crate::shared::event::EventType;
    use crate::shared::messaging::{Principal, Role};
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct Fixture {
        presence: Arc<PresencePublisher>,
        registry: Arc<ConnectionRegistry>,
        store: Arc<MemoryStore>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let registry = Arc::new(ConnectionRegistry::new());
        let relay = EventRelay::new(registry.clone());
        let presence = Arc::new(PresencePublisher::new(registry.clone(), relay, store.clone()));
        Fixture {
            presence,
            registry,
            store,
        }
    }

    fn connection(registry: &ConnectionRegistry) -> (Arc<Connection>, mpsc::Receiver<RealtimeEvent>) {
        let (tx, rx) = mpsc::channel(8);
        let conn = Arc::new(Connection::new(tx));
        registry.attach(conn.clone());
        (conn, rx)
    }

    #[tokio::test]
    async fn second_device_is_silent() {
        let f = fixture();
        let bob = Principal::new("bob", Role::Member);
        f.store.insert_principal(bob.clone()).await.unwrap();
        let (_watcher, mut watcher_rx) = connection(&f.registry);
        let (laptop, _l) = connection(&f.registry);
        let (phone, _p) = connection(&f.registry);

        assert!(f.presence.connect(&laptop, bob.id).await);
        assert!(!f.presence.connect(&phone, bob.id).await);

        assert_eq!(watcher_rx.try_recv().unwrap().event_type, EventType::UserOnline);
        assert!(watcher_rx.try_recv().is_err());
        assert!(f.store.find_principal(bob.id).await.unwrap().unwrap().is_online);

        let first = f.presence.disconnect(laptop.id()).await.unwrap();
        assert!(!first.went_offline);
        assert!(watcher_rx.try_recv().is_err());
        assert!(f.presence.is_online(bob.id));

        let last = f.presence.disconnect(phone.id()).await.unwrap();
        assert!(last.went_offline);
        assert_eq!(watcher_rx.try_recv().unwrap().event_type, EventType::UserOffline);
        assert!(!f.store.find_principal(bob.id).await.unwrap().unwrap().is_online);
    }

    #[tokio::test]
    async fn online_broadcast_skips_the_new_connection() {
        let f = fixture();
        let bob = Principal::new("bob", Role::Member);
        f.store.insert_principal(bob.clone()).await.unwrap();
        let (conn, mut rx) = connection(&f.registry);
        f.presence.connect(&conn, bob.id).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn store_failures_do_not_block_presence() {
        let f = fixture();
        let bob = Principal::new("bob", Role::Member);
        f.store.insert_principal(bob.clone()).await.unwrap();
        f.store.fail_presence_updates(true);
        let (_watcher, mut watcher_rx) = connection(&f.registry);
        let (conn, _rx) = connection(&f.registry);

        assert!(f.presence.connect(&conn, bob.id).await);
        assert!(f.presence.is_online(bob.id));
        assert_eq!(watcher_rx.try_recv().unwrap().event_type, EventType::UserOnline);

        assert!(f.presence.disconnect(conn.id()).await.unwrap().went_offline);
        assert!(!f.presence.is_online(bob.id));
        assert_eq!(watcher_rx.try_recv().unwrap().event_type, EventType::UserOffline);
    }

    #[tokio::test]
    async fn reconnect_during_slow_offline_mark_ends_online() {
        let f = fixture();
        let bob = Principal::new("bob", Role::Member);
        f.store.insert_principal(bob.clone()).await.unwrap();
        f.store.delay_offline_marks(Duration::from_millis(200));
        let (_watcher, mut watcher_rx) = connection(&f.registry);
        let (laptop, _l) = connection(&f.registry);
        let (phone, _p) = connection(&f.registry);

        assert!(f.presence.connect(&laptop, bob.id).await);
        let leaving = tokio::spawn({
            let presence = Arc::clone(&f.presence);
            let laptop_id = laptop.id();
            async move { presence.disconnect(laptop_id).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(f.presence.connect(&phone, bob.id).await);
        assert!(leaving.await.unwrap().unwrap().went_offline);

        let mut seen = Vec::new();
        while let Ok(event) = watcher_rx.try_recv() {
            seen.push(event.event_type);
        }
        assert_eq!(
            seen,
            vec![EventType::UserOnline, EventType::UserOffline, EventType::UserOnline]
        );
        assert!(f.registry.is_online(bob.id));
        assert!(f.store.find_principal(bob.id).await.unwrap().unwrap().is_online);
    }

    #[tokio::test]
    async fn offline_principals_are_forgotten() {
        let f = fixture();
        let bob = Principal::new("bob", Role::Member);
        f.store.insert_principal(bob.clone()).await.unwrap();
        let (conn, _rx) = connection(&f.registry);

        f.presence.connect(&conn, bob.id).await;
        assert!(f.presence.announced.contains_key(&bob.id));
        f.presence.disconnect(conn.id()).await;
        assert!(!f.presence.announced.contains_key(&bob.id));
    }
}
