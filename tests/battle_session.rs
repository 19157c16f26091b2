mod support;

use battle_client::domain::assets::MANIFEST;
use battle_client::domain::ports::{Action, Inbound};
use battle_client::domain::state::Direction;
use battle_client::interface_adapters::clients::RestAuthClient;
use battle_client::interface_adapters::ws::WsConnector;
use battle_client::use_cases::{BattleOutcome, TransportSession};
use battle_client::{BattleTarget, ClientSettings};
use image::{Rgba, RgbaImage};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;
use support::{GOOD_REFRESH, StubBackend, eventually, jwt, now};
use tokio::sync::mpsc;

// Scratch directory removed on drop.
struct ScratchDir(PathBuf);

impl ScratchDir {
    fn new() -> Self {
        let path = std::env::temp_dir().join(format!("battle-client-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&path).expect("create scratch dir");
        Self(path)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

#[tokio::test]
async fn when_session_connects_with_expired_token_then_refreshed_token_opens_the_socket() {
    let stub = StubBackend::start(None).await;
    let auth = RestAuthClient::new(stub.api_base.clone(), Duration::from_secs(2))
        .expect("build auth client")
        .with_tokens(Some(jwt(now() - 60)), Some(GOOD_REFRESH.to_string()));
    let connector = WsConnector::new(&stub.ws_base, 16).expect("valid ws base");

    let mut session = TransportSession::connect(&auth, &connector, "b-1")
        .await
        .expect("session should connect");

    let Some(Inbound::Snapshot(snapshot)) = session.recv().await else {
        panic!("expected the initial snapshot");
    };
    assert_eq!(snapshot.battle_id, "b-1");
    assert_eq!(snapshot.tanks.len(), 2);
    assert!(snapshot.map.is_some());

    assert!(session.send(Action::Move {
        direction: Direction::Left
    }));
    assert!(session.send(Action::Shoot));
    assert!(
        eventually(|| stub.recorded.actions.lock().expect("recorded mutex").len() == 2).await
    );

    let actions = stub.recorded.actions.lock().expect("recorded mutex").clone();
    assert_eq!(
        actions,
        vec![
            r#"{"action":"move","direction":"left"}"#.to_string(),
            r#"{"action":"shoot"}"#.to_string()
        ]
    );
    let issued = stub.recorded.issued_access.lock().expect("recorded mutex").clone();
    let connections = stub.recorded.connections.lock().expect("recorded mutex").clone();
    assert_eq!(connections, vec![("b-1".to_string(), issued[0].clone())]);

    session.close();
}

#[tokio::test]
async fn when_refresh_fails_then_no_socket_is_opened() {
    let stub = StubBackend::start(None).await;
    let auth = RestAuthClient::new(stub.api_base.clone(), Duration::from_secs(2))
        .expect("build auth client")
        .with_tokens(None, Some("revoked".to_string()));
    let connector = WsConnector::new(&stub.ws_base, 16).expect("valid ws base");

    let result = TransportSession::connect(&auth, &connector, "b-2").await;

    assert!(result.is_err());
    assert_eq!(stub.recorded.refresh_calls.load(Ordering::SeqCst), 1);
    assert!(stub.recorded.connections.lock().expect("recorded mutex").is_empty());
}

#[tokio::test]
async fn when_battle_ends_then_client_reports_close_leaves_room_and_saves_last_frame() {
    let stub = StubBackend::start(Some(Duration::from_millis(300))).await;
    let assets = ScratchDir::new();
    for (_, name) in MANIFEST {
        RgbaImage::from_pixel(8, 8, Rgba([0, 200, 0, 255]))
            .save(assets.0.join(name))
            .expect("write sprite");
    }
    let dump = assets.0.join("last-frame.png");
    let settings = ClientSettings {
        api_base_url: stub.api_base.clone(),
        ws_base_url: stub.ws_base.clone(),
        asset_dir: assets.0.clone(),
        target: BattleTarget::Room(3),
        access_token: None,
        refresh_token: None,
        login: Some(("pilot".to_string(), "secret".to_string())),
        local_player_id: None,
        http_timeout: Duration::from_secs(2),
        frame_dump_path: Some(dump.clone()),
    };
    let (keys_tx, keys_rx) = mpsc::channel(8);
    keys_tx.send("d".to_string()).await.expect("queue key");

    let outcome = battle_client::run(settings, keys_rx)
        .await
        .expect("client run should succeed");

    assert_eq!(
        outcome,
        BattleOutcome::ChannelClosed {
            reason: Some("game finished".to_string())
        }
    );
    assert_eq!(
        *stub.recorded.joined_rooms.lock().expect("recorded mutex"),
        vec![3]
    );
    let connections = stub.recorded.connections.lock().expect("recorded mutex").clone();
    assert_eq!(connections[0].0, "battle-3");
    assert_eq!(stub.recorded.leave_calls.load(Ordering::SeqCst), 1);

    let frame = image::open(&dump).expect("frame dump readable").to_rgba8();
    assert_eq!(frame.dimensions(), (128, 128));
    // Wall sprite in the top-left tile.
    assert_eq!(frame.get_pixel(10, 10), &Rgba([0, 200, 0, 255]));
}
