//! End-to-end dispatch tests against a real Postgres instance. Skipped (with
//! a message on stderr) when `DATABASE_URL` isn't set.

use std::net::{IpAddr, Ipv4Addr};

use camelot_engine::RulesConfig;
use camelot_hub::{Hub, HubConfig};
use camelot_protocol::{ActionPayload, ChatPayload, ClientEnvelope, RoomPlayerId, ServerEnvelope};
use camelot_session::{Dispatcher, SessionContext};
use camelot_store::Store;
use tokio::sync::mpsc;

async fn test_store() -> Option<Store> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("skipping camelot-session dispatch tests: DATABASE_URL not set");
            return None;
        }
    };
    let store = Store::connect(&url).await.expect("connect to test database");
    store.run_migrations().await.expect("run migrations");
    Some(store)
}

#[tokio::test]
async fn start_game_broadcasts_game_started_and_state() {
    let Some(store) = test_store().await else { return };

    let (room_row, host, _game) =
        store.create_room(None, "arthur", None, serde_json::json!({})).await.expect("create room");
    for name in ["lancelot", "gawain", "percival", "galahad"] {
        store.join_room(&room_row.code, None, name, None).await.expect("join room");
    }

    let hub = Hub::new(HubConfig::default());
    let room = hub.room(room_row.id).await;

    let (tx, mut rx) = mpsc::channel(16);
    room.register(RoomPlayerId(host.id), tx).await;

    let dispatcher = Dispatcher::new(store.clone(), RulesConfig::default());
    let ctx = SessionContext::new(
        room_row.id,
        RoomPlayerId(host.id),
        host.display_name.clone(),
        IpAddr::V4(Ipv4Addr::LOCALHOST),
    );

    dispatcher
        .dispatch(
            &ctx,
            &room,
            &mpsc::channel(1).0,
            ClientEnvelope::Action { correlation_id: None, payload: ActionPayload::StartGame },
        )
        .await
        .expect("dispatch succeeds");

    let game_started = rx.recv().await.expect("game_started event");
    assert!(matches!(game_started, ServerEnvelope::Event { .. }));
    let state = rx.recv().await.expect("state broadcast");
    let ServerEnvelope::State { payload, .. } = state else { panic!("expected state envelope") };
    assert_eq!(payload.phase, "team_selection");
}

#[tokio::test]
async fn chat_is_not_echoed_to_sender() {
    let Some(store) = test_store().await else { return };

    let (room_row, host, _game) =
        store.create_room(None, "merlin", None, serde_json::json!({})).await.expect("create room");
    let (_room, other, _latest_game, _game_player) =
        store.join_room(&room_row.code, None, "morgana", None).await.expect("join room");

    let hub = Hub::new(HubConfig::default());
    let room = hub.room(room_row.id).await;

    let (tx_host, mut rx_host) = mpsc::channel(16);
    let (tx_other, mut rx_other) = mpsc::channel(16);
    room.register(RoomPlayerId(host.id), tx_host).await;
    room.register(RoomPlayerId(other.id), tx_other).await;

    let dispatcher = Dispatcher::new(store.clone(), RulesConfig::default());
    let ctx = SessionContext::new(
        room_row.id,
        RoomPlayerId(host.id),
        host.display_name.clone(),
        IpAddr::V4(Ipv4Addr::LOCALHOST),
    );

    dispatcher
        .dispatch(
            &ctx,
            &room,
            &mpsc::channel(1).0,
            ClientEnvelope::Chat {
                correlation_id: None,
                payload: ChatPayload { message: "hello court".into() },
            },
        )
        .await
        .expect("dispatch succeeds");

    assert!(rx_other.recv().await.is_some());
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert!(rx_host.try_recv().is_err());
}
