//! The Hub: a process-wide registry mapping room ids to their room actors.
//!
//! Rooms are created lazily on first registration and torn down once their
//! last session unregisters (§4.4: "if room set becomes empty, removes the
//! room entry"). The registry itself is guarded by a `tokio::sync::Mutex`
//! held only long enough to look up or insert a `RoomHandle` — no I/O and
//! no broadcast happens while it's held (§5's locking discipline).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::room::spawn_room;
use crate::RoomHandle;

/// Per-session send queue capacity and the coordinator's command queue
/// depth (§4.4, SPEC_FULL.md Configuration). Both default per §4.4's
/// "e.g. 256 messages".
#[derive(Debug, Clone, Copy)]
pub struct HubConfig {
    /// Bounded capacity of each session's outbound queue. A session that
    /// can't keep up is evicted rather than allowed to block fan-out.
    pub send_queue_capacity: usize,
    /// Bounded capacity of a room actor's command inbox.
    pub command_queue_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self { send_queue_capacity: 256, command_queue_capacity: 256 }
    }
}

/// Cheap to clone; every Session and every entry-layer handler holds one.
#[derive(Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

struct HubInner {
    config: HubConfig,
    rooms: Mutex<HashMap<Uuid, RoomHandle>>,
}

impl Hub {
    pub fn new(config: HubConfig) -> Self {
        Self { inner: Arc::new(HubInner { config, rooms: Mutex::new(HashMap::new()) }) }
    }

    /// Returns the room actor for `room_id`, spawning one if this is the
    /// first session to touch it.
    pub async fn room(&self, room_id: Uuid) -> RoomHandle {
        let mut rooms = self.inner.rooms.lock().await;
        rooms
            .entry(room_id)
            .or_insert_with(|| spawn_room(room_id, self.inner.config))
            .clone()
    }

    /// Unregisters a session and, if that was the room's last session,
    /// tears down the room actor and drops it from the registry.
    pub async fn unregister(&self, room_id: Uuid, room_player_id: camelot_protocol::RoomPlayerId) {
        let handle = {
            let rooms = self.inner.rooms.lock().await;
            rooms.get(&room_id).cloned()
        };
        let Some(handle) = handle else { return };
        handle.unregister(room_player_id).await;

        if handle.session_count().await == 0 {
            let mut rooms = self.inner.rooms.lock().await;
            if let Some(h) = rooms.get(&room_id) {
                if h.session_count().await == 0 {
                    let removed = rooms.remove(&room_id);
                    drop(rooms);
                    if let Some(removed) = removed {
                        removed.shutdown().await;
                    }
                }
            }
        }
    }

    pub fn config(&self) -> HubConfig {
        self.inner.config
    }

    /// Number of rooms with at least one active session.
    pub async fn room_count(&self) -> usize {
        self.inner.rooms.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camelot_protocol::RoomPlayerId;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn room_is_created_lazily_and_removed_when_empty() {
        let hub = Hub::new(HubConfig::default());
        let room_id = Uuid::new_v4();
        let room_player_id = RoomPlayerId(Uuid::new_v4());

        assert_eq!(hub.room_count().await, 0);

        let handle = hub.room(room_id).await;
        let (tx, _rx) = mpsc::channel(8);
        handle.register(room_player_id, tx).await;
        assert_eq!(hub.room_count().await, 1);

        hub.unregister(room_id, room_player_id).await;
        // give the actor a tick to process Unregister before we check
        tokio::task::yield_now().await;
        assert_eq!(handle.session_count().await, 0);
    }

    #[tokio::test]
    async fn same_room_id_returns_same_handle() {
        let hub = Hub::new(HubConfig::default());
        let room_id = Uuid::new_v4();
        let a = hub.room(room_id).await;
        let b = hub.room(room_id).await;
        assert_eq!(a.room_id(), b.room_id());
    }
}
