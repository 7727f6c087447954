//! Room socket round-trip: connect, authenticate with a minted room token,
//! exchange a message, observe the reply. Skipped when `DATABASE_URL` isn't
//! set.

#[allow(dead_code)]
mod common;

use common::{unique_email, TestServer};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

#[tokio::test]
async fn sync_state_replies_with_lobby_state() {
    let Some(server) = TestServer::new().await else {
        eprintln!("skipping camelot-server ws tests: DATABASE_URL not set");
        return;
    };
    let client = reqwest::Client::new();

    let email = unique_email("merlin");
    let resp = client
        .post(format!("{}/auth/register", server.base_url()))
        .json(&serde_json::json!({
            "email": email,
            "password": "prophecy-1",
            "display_name": "Merlin",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let registered: serde_json::Value = resp.json().await.unwrap();
    let user_token = registered["token"].as_str().unwrap();

    let resp = client
        .post(format!("{}/rooms", server.base_url()))
        .bearer_auth(user_token)
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let created: serde_json::Value = resp.json().await.unwrap();
    let code = created["room"]["code"].as_str().unwrap();
    let room_token = created["token"].as_str().unwrap();

    let (mut socket, _) = tokio_tungstenite::connect_async(server.ws_url(code, room_token))
        .await
        .expect("ws connect");

    socket
        .send(Message::Text(r#"{"type":"sync_state","payload":{}}"#.into()))
        .await
        .unwrap();

    let reply = tokio::time::timeout(std::time::Duration::from_secs(5), socket.next())
        .await
        .expect("timed out waiting for reply")
        .expect("socket closed")
        .expect("ws error");

    let Message::Text(text) = reply else { panic!("expected a text frame, got {reply:?}") };
    let body: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body["type"], "state");
    assert_eq!(body["payload"]["phase"], "lobby");

    socket.close(None).await.ok();
}

#[tokio::test]
async fn connecting_without_a_token_is_rejected() {
    let Some(server) = TestServer::new().await else { return };

    let url = format!("ws://{}/ws/rooms/ABCDEF", server.addr);
    let err = tokio_tungstenite::connect_async(url).await.unwrap_err();
    match err {
        tokio_tungstenite::tungstenite::Error::Http(resp) => {
            assert_eq!(resp.status(), 401);
        }
        other => panic!("expected an HTTP rejection, got {other:?}"),
    }
}
