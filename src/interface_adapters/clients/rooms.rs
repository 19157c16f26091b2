use crate::domain::state::Credential;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::info;

// Thin reqwest client for the room lobby endpoints. Every call is bearer-authenticated.

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Room {
    pub id: u64,
    pub battle_id: String,
    pub map_name: String,
    pub mode: String,
    pub max_players: u32,
    #[serde(default)]
    pub current_player_count: u32,
    pub is_active: bool,
    #[serde(default)]
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateRoomRequest {
    pub map_name: String,
    pub max_players: u32,
    // "DM" (deathmatch) or "TB" (team battle).
    pub mode: String,
}

#[derive(Debug, Serialize)]
struct JoinRoomRequest {
    room_id: u64,
}

#[derive(Debug, Deserialize)]
struct JoinRoomResponse {
    battle_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    detail: String,
}

#[derive(Debug)]
pub enum RoomsClientError {
    Transport(reqwest::Error),
    Upstream {
        status: StatusCode,
        message: Option<String>,
    },
    Decode(reqwest::Error),
}

impl fmt::Display for RoomsClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomsClientError::Transport(err) => write!(f, "rooms transport error: {err}"),
            RoomsClientError::Upstream { status, message } => {
                if let Some(message) = message {
                    write!(f, "rooms upstream error {status}: {message}")
                } else {
                    write!(f, "rooms upstream error {status}")
                }
            }
            RoomsClientError::Decode(err) => write!(f, "rooms response decode error: {err}"),
        }
    }
}

impl std::error::Error for RoomsClientError {}

#[derive(Clone)]
pub struct RoomsClient {
    http: Client,
    base_url: String,
}

impl RoomsClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub async fn list_rooms(&self, credential: &Credential) -> Result<Vec<Room>, RoomsClientError> {
        let url = format!("{}/rooms/", self.base_url);
        let res = self
            .http
            .get(url)
            .bearer_auth(credential.as_str())
            .send()
            .await
            .map_err(RoomsClientError::Transport)?;
        let res = upstream_ok(res).await?;
        res.json::<Vec<Room>>()
            .await
            .map_err(RoomsClientError::Decode)
    }

    pub async fn create_room(
        &self,
        credential: &Credential,
        request: &CreateRoomRequest,
    ) -> Result<Room, RoomsClientError> {
        let url = format!("{}/rooms/create/", self.base_url);
        let res = self
            .http
            .post(url)
            .bearer_auth(credential.as_str())
            .json(request)
            .send()
            .await
            .map_err(RoomsClientError::Transport)?;
        let res = upstream_ok(res).await?;
        let room = res.json::<Room>().await.map_err(RoomsClientError::Decode)?;
        info!(room_id = room.id, battle_id = %room.battle_id, "room created");
        Ok(room)
    }

    /// Joins a room and returns the battle id of its channel.
    pub async fn join_room(
        &self,
        credential: &Credential,
        room_id: u64,
    ) -> Result<String, RoomsClientError> {
        let url = format!("{}/rooms/join/", self.base_url);
        let res = self
            .http
            .post(url)
            .bearer_auth(credential.as_str())
            .json(&JoinRoomRequest { room_id })
            .send()
            .await
            .map_err(RoomsClientError::Transport)?;
        let res = upstream_ok(res).await?;
        let body = res
            .json::<JoinRoomResponse>()
            .await
            .map_err(RoomsClientError::Decode)?;
        info!(room_id, battle_id = %body.battle_id, "room joined");
        Ok(body.battle_id)
    }

    pub async fn leave_room(&self, credential: &Credential) -> Result<(), RoomsClientError> {
        let url = format!("{}/rooms/leave", self.base_url);
        let res = self
            .http
            .post(url)
            .bearer_auth(credential.as_str())
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(RoomsClientError::Transport)?;
        upstream_ok(res).await?;
        Ok(())
    }
}

async fn upstream_ok(res: reqwest::Response) -> Result<reqwest::Response, RoomsClientError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let message = res
        .json::<ErrorResponse>()
        .await
        .ok()
        .map(|payload| payload.detail);
    Err(RoomsClientError::Upstream { status, message })
}
