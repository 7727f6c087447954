//! Integration tests for the Hub's registration and fan-out behavior.

use std::time::Duration;

use camelot_hub::{Hub, HubConfig};
use camelot_protocol::{GameId, RoomPlayerId, ServerEnvelope};
use tokio::sync::mpsc;
use uuid::Uuid;

#[tokio::test]
async fn broadcast_reaches_every_registered_session() {
    let hub = Hub::new(HubConfig::default());
    let room_id = Uuid::new_v4();
    let handle = hub.room(room_id).await;

    let p1 = RoomPlayerId(Uuid::new_v4());
    let p2 = RoomPlayerId(Uuid::new_v4());
    let (tx1, mut rx1) = mpsc::channel(8);
    let (tx2, mut rx2) = mpsc::channel(8);
    handle.register(p1, tx1).await;
    handle.register(p2, tx2).await;

    handle.broadcast_envelope(ServerEnvelope::error("ping")).await;

    let msg1 = rx1.recv().await.expect("p1 should receive broadcast");
    let msg2 = rx2.recv().await.expect("p2 should receive broadcast");
    assert_eq!(msg1, ServerEnvelope::error("ping"));
    assert_eq!(msg2, ServerEnvelope::error("ping"));
}

#[tokio::test]
async fn broadcast_except_skips_the_excluded_session() {
    let hub = Hub::new(HubConfig::default());
    let room_id = Uuid::new_v4();
    let handle = hub.room(room_id).await;

    let sender_id = RoomPlayerId(Uuid::new_v4());
    let other_id = RoomPlayerId(Uuid::new_v4());
    let (tx_sender, mut rx_sender) = mpsc::channel(8);
    let (tx_other, mut rx_other) = mpsc::channel(8);
    handle.register(sender_id, tx_sender).await;
    handle.register(other_id, tx_other).await;

    handle.broadcast_except(ServerEnvelope::error("chat"), sender_id).await;

    assert!(rx_other.recv().await.is_some());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(rx_sender.try_recv().is_err());
}

#[tokio::test]
async fn slow_consumer_is_evicted_without_blocking_others() {
    let hub = Hub::new(HubConfig { send_queue_capacity: 1, command_queue_capacity: 16 });
    let room_id = Uuid::new_v4();
    let handle = hub.room(room_id).await;

    let slow = RoomPlayerId(Uuid::new_v4());
    let healthy = RoomPlayerId(Uuid::new_v4());
    let (tx_slow, rx_slow) = mpsc::channel(1);
    let (tx_healthy, mut rx_healthy) = mpsc::channel(1);
    handle.register(slow, tx_slow).await;
    handle.register(healthy, tx_healthy).await;

    // Never drained — the slow session's queue fills on the first send and
    // the second send finds it full.
    handle.broadcast_envelope(ServerEnvelope::error("one")).await;
    handle.broadcast_envelope(ServerEnvelope::error("two")).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(handle.session_count().await, 1);
    drop(rx_slow);
    assert!(rx_healthy.try_recv().is_ok());
}

#[tokio::test]
async fn masked_state_strips_roles_the_viewer_cannot_see() {
    let hub = Hub::new(HubConfig::default());
    let room_id = Uuid::new_v4();
    let handle = hub.room(room_id).await;

    let good = RoomPlayerId(Uuid::new_v4());
    let evil = RoomPlayerId(Uuid::new_v4());
    let (tx_good, mut rx_good) = mpsc::channel(8);
    let (tx_evil, mut rx_evil) = mpsc::channel(8);
    handle.register(good, tx_good).await;
    handle.register(evil, tx_evil).await;

    let mut roles = camelot_hub::RoleMap::new();
    roles.insert(good, "good".into());
    roles.insert(evil, "evil".into());

    let state = serde_json::json!({
        "roles": { good.0.to_string(): "good", evil.0.to_string(): "evil" },
    });

    handle.broadcast_masked_state(GameId(Uuid::new_v4()), state, "team_selection".into(), 2, roles).await;

    let good_env = rx_good.recv().await.unwrap();
    let evil_env = rx_evil.recv().await.unwrap();

    let ServerEnvelope::State { payload, .. } = good_env else { panic!("expected state envelope") };
    assert_eq!(payload.state["roles"].as_object().unwrap().len(), 1);

    let ServerEnvelope::State { payload, .. } = evil_env else { panic!("expected state envelope") };
    assert_eq!(payload.state["roles"].as_object().unwrap().len(), 2);
}
