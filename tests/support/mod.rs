// Stub backend (REST + battle WebSocket) shared by the integration tests.
#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use serde_json::json;
use std::{
    // `Mutex` guards the recorded traffic; atomics count simple calls.
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};

// Refresh token the stub accepts; anything else is rejected with 401.
pub const GOOD_REFRESH: &str = "good-refresh";
// Player id of the stub's logged-in user.
pub const USER_ID: u64 = 7;

// Build an unsigned JWT whose payload only carries `exp`.
pub fn jwt(exp: u64) -> String {
    format!(
        "{}.{}.stub",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp},"user_id":{USER_ID}}}"#))
    )
}

pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs()
}

// Everything the stub observed, for assertions.
#[derive(Default)]
pub struct Recorded {
    pub refresh_calls: AtomicUsize,
    pub leave_calls: AtomicUsize,
    pub issued_access: Mutex<Vec<String>>,
    pub joined_rooms: Mutex<Vec<u64>>,
    // (battle_id, token) for every battle socket opened.
    pub connections: Mutex<Vec<(String, String)>>,
    // Raw text frames the client sent on the battle socket.
    pub actions: Mutex<Vec<String>>,
    // JSON bodies posted to the register and room create endpoints.
    pub registrations: Mutex<Vec<serde_json::Value>>,
    pub created_rooms: Mutex<Vec<serde_json::Value>>,
}

struct StubState {
    recorded: Arc<Recorded>,
    // When set, the battle socket sends game over and closes after this delay.
    close_after: Option<Duration>,
}

pub struct StubBackend {
    pub api_base: String,
    pub ws_base: String,
    pub recorded: Arc<Recorded>,
}

impl StubBackend {
    // Start the stub on an ephemeral port inside the current test runtime.
    pub async fn start(close_after: Option<Duration>) -> Self {
        let recorded = Arc::new(Recorded::default());
        let state = Arc::new(StubState {
            recorded: recorded.clone(),
            close_after,
        });

        let app = Router::new()
            .route("/api/authenticator/token/", post(login))
            .route("/api/authenticator/token/refresh/", post(refresh))
            .route("/api/authenticator/me/", get(me))
            .route("/api/authenticator/register/", post(register))
            .route("/api/rooms/", get(list_rooms))
            .route("/api/rooms/create/", post(create_room))
            .route("/api/rooms/join/", post(join_room))
            .route("/api/rooms/leave", post(leave_room))
            .route("/ws/battle/{battle_id}/", get(battle_ws))
            .with_state(state);

        // Bind to an ephemeral port to avoid collisions with local services.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral test port");
        let addr = listener.local_addr().expect("get local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub server failed");
        });

        Self {
            api_base: format!("http://{addr}/api"),
            ws_base: format!("ws://{addr}"),
            recorded,
        }
    }
}

// Poll `check` until it holds or two seconds pass.
pub async fn eventually(check: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}

fn user() -> serde_json::Value {
    json!({
        "id": USER_ID,
        "username": "pilot",
        "nickname": "Pilot",
        "email": "pilot@example.com",
        "score": 12
    })
}

fn issue_access(state: &StubState) -> String {
    let access = jwt(now() + 3600);
    state
        .recorded
        .issued_access
        .lock()
        .expect("recorded mutex")
        .push(access.clone());
    access
}

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

async fn login(State(state): State<Arc<StubState>>, Json(body): Json<LoginBody>) -> impl IntoResponse {
    if body.username != "pilot" || body.password != "secret" {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "No active account found with the given credentials"})),
        )
            .into_response();
    }
    let access = issue_access(&state);
    Json(json!({"access": access, "refresh": GOOD_REFRESH, "user": user()})).into_response()
}

#[derive(Deserialize)]
struct RefreshBody {
    refresh: String,
}

async fn refresh(
    State(state): State<Arc<StubState>>,
    Json(body): Json<RefreshBody>,
) -> impl IntoResponse {
    state.recorded.refresh_calls.fetch_add(1, Ordering::SeqCst);
    if body.refresh != GOOD_REFRESH {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Token is invalid or expired"})),
        )
            .into_response();
    }
    Json(json!({"access": issue_access(&state)})).into_response()
}

async fn me() -> impl IntoResponse {
    Json(user())
}

async fn register(
    State(state): State<Arc<StubState>>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    state
        .recorded
        .registrations
        .lock()
        .expect("recorded mutex")
        .push(body.clone());
    let nickname = body["nickname"].as_str().unwrap_or_default();
    if nickname.is_empty() || !nickname.chars().all(char::is_alphanumeric) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Nickname must contain only alphanumeric characters"})),
        )
            .into_response();
    }
    (
        StatusCode::CREATED,
        Json(json!({
            "id": 9,
            "username": body["username"],
            "nickname": nickname,
            "email": body["email"],
            "score": 0
        })),
    )
        .into_response()
}

// Room as the lobby serializes it, including fields the client does not model.
fn room(id: u64, map_name: &str, mode: &str, max_players: u64) -> serde_json::Value {
    json!({
        "id": id,
        "battle_id": format!("battle-{id}"),
        "creator": user(),
        "map_name": map_name,
        "mode": mode,
        "max_players": max_players,
        "current_player_count": 1,
        "current_players": [user()],
        "is_active": true,
        "created_at": "2024-05-01T12:00:00Z",
        "end_time": null
    })
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("Bearer ") && value.len() > "Bearer ".len())
}

async fn list_rooms(headers: HeaderMap) -> impl IntoResponse {
    if !authorized(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Authentication credentials were not provided."})),
        )
            .into_response();
    }
    Json(json!([room(3, "Desert", "DM", 2), room(4, "Forest", "TB", 4)])).into_response()
}

async fn create_room(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    state
        .recorded
        .created_rooms
        .lock()
        .expect("recorded mutex")
        .push(body.clone());
    let map_name = body["map_name"].as_str().unwrap_or_default();
    let mode = body["mode"].as_str().unwrap_or_default();
    let max_players = body["max_players"].as_u64().unwrap_or_default();
    (StatusCode::CREATED, Json(room(5, map_name, mode, max_players))).into_response()
}

#[derive(Deserialize)]
struct JoinBody {
    room_id: u64,
}

async fn join_room(
    State(state): State<Arc<StubState>>,
    Json(body): Json<JoinBody>,
) -> impl IntoResponse {
    state
        .recorded
        .joined_rooms
        .lock()
        .expect("recorded mutex")
        .push(body.room_id);
    Json(json!({"battle_id": format!("battle-{}", body.room_id)}))
}

async fn leave_room(State(state): State<Arc<StubState>>) -> impl IntoResponse {
    state.recorded.leave_calls.fetch_add(1, Ordering::SeqCst);
    Json(json!({}))
}

#[derive(Deserialize)]
struct TokenQuery {
    token: String,
}

async fn battle_ws(
    ws: WebSocketUpgrade,
    Path(battle_id): Path<String>,
    Query(query): Query<TokenQuery>,
    State(state): State<Arc<StubState>>,
) -> impl IntoResponse {
    state
        .recorded
        .connections
        .lock()
        .expect("recorded mutex")
        .push((battle_id.clone(), query.token));
    ws.on_upgrade(move |socket| serve_battle(socket, battle_id, state))
}

fn state_message(battle_id: &str) -> String {
    json!({
        "type": "state",
        "data": {
            "tanks": [
                {"player_id": USER_ID, "x": 32, "y": 96, "direction": "up", "is_alive": true},
                {"player_id": 8, "x": 96, "y": 96, "direction": "left", "is_alive": true}
            ],
            "bullets": [],
            "map": {"name": "Tiny", "width": 128, "height": 128, "obstacles": "WB.S"},
            "battle_id": battle_id,
            "time_left": 60
        }
    })
    .to_string()
}

async fn serve_battle(mut socket: WebSocket, battle_id: String, state: Arc<StubState>) {
    if socket
        .send(Message::Text(state_message(&battle_id).into()))
        .await
        .is_err()
    {
        return;
    }

    let close_after = state.close_after;
    let finish = async move {
        match close_after {
            Some(delay) => tokio::time::sleep(delay).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(finish);

    loop {
        tokio::select! {
            msg = socket.recv() => match msg {
                Some(Ok(Message::Text(text))) => {
                    state
                        .recorded
                        .actions
                        .lock()
                        .expect("recorded mutex")
                        .push(text.as_str().to_string());
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            _ = &mut finish => {
                let game_over = json!({"type": "event", "data": {"event": "game_over", "reason": "time_up"}});
                let _ = socket.send(Message::Text(game_over.to_string().into())).await;
                let _ = socket
                    .send(Message::Close(Some(CloseFrame {
                        code: close_code::NORMAL,
                        reason: String::from("game finished").into(),
                    })))
                    .await;
                break;
            }
        }
    }
}
