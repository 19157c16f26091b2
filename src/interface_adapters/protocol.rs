// Wire protocol DTOs and conversions for the battle channel.
// REST payloads live next to their clients.

use crate::domain::ports::{Action, Inbound};
use crate::domain::{Arena, Bullet, Direction, ServerEvent, Snapshot, Tank};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionDto {
    Up,
    Down,
    Left,
    Right,
}

impl From<DirectionDto> for Direction {
    fn from(direction: DirectionDto) -> Self {
        match direction {
            DirectionDto::Up => Direction::Up,
            DirectionDto::Down => Direction::Down,
            DirectionDto::Left => Direction::Left,
            DirectionDto::Right => Direction::Right,
        }
    }
}

impl From<Direction> for DirectionDto {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => DirectionDto::Up,
            Direction::Down => DirectionDto::Down,
            Direction::Left => DirectionDto::Left,
            Direction::Right => DirectionDto::Right,
        }
    }
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ClientMessage {
    Move { direction: DirectionDto },
    Shoot,
}

impl From<Action> for ClientMessage {
    fn from(action: Action) -> Self {
        match action {
            Action::Move { direction } => ClientMessage::Move {
                direction: direction.into(),
            },
            Action::Shoot => ClientMessage::Shoot,
        }
    }
}

// Outer frame of every server message; `data` is decoded once `type` is known.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Full battle state pushed by the server on every tick.
#[derive(Debug, Clone, Deserialize)]
pub struct StateDto {
    #[serde(default)]
    pub tanks: Vec<TankDto>,
    #[serde(default)]
    pub bullets: Vec<BulletDto>,
    // Sent on the first state of a session and after a block was destroyed.
    #[serde(default)]
    pub map: Option<MapDto>,
    #[serde(default)]
    pub battle_id: String,
    #[serde(default)]
    pub time_left: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TankDto {
    pub player_id: u64,
    pub x: f32,
    pub y: f32,
    pub direction: DirectionDto,
    pub is_alive: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulletDto {
    pub id: String,
    pub shooter_id: u64,
    pub x: f32,
    pub y: f32,
    pub direction: DirectionDto,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapDto {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub obstacles: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventDto {
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl From<TankDto> for Tank {
    fn from(tank: TankDto) -> Self {
        Self {
            player_id: tank.player_id,
            x: tank.x,
            y: tank.y,
            direction: tank.direction.into(),
            is_alive: tank.is_alive,
        }
    }
}

impl From<BulletDto> for Bullet {
    fn from(bullet: BulletDto) -> Self {
        Self {
            id: bullet.id,
            shooter_id: bullet.shooter_id,
            x: bullet.x,
            y: bullet.y,
            direction: bullet.direction.into(),
        }
    }
}

impl From<MapDto> for Arena {
    fn from(map: MapDto) -> Self {
        Self {
            name: map.name,
            width: map.width,
            height: map.height,
            obstacles: map.obstacles,
        }
    }
}

impl From<StateDto> for Snapshot {
    fn from(state: StateDto) -> Self {
        Self {
            tanks: state.tanks.into_iter().map(Tank::from).collect(),
            bullets: state.bullets.into_iter().map(Bullet::from).collect(),
            map: state.map.map(Arena::from),
            battle_id: state.battle_id,
            time_left: state.time_left,
        }
    }
}

impl From<EventDto> for ServerEvent {
    fn from(event: EventDto) -> Self {
        match (event.event, event.message) {
            (Some(name), _) if name == "game_over" => ServerEvent::GameOver {
                reason: event.reason.unwrap_or_default(),
            },
            (_, Some(message)) => ServerEvent::Error { message },
            (Some(name), None) => ServerEvent::Other { event: name },
            (None, None) => ServerEvent::Other {
                event: String::new(),
            },
        }
    }
}

/// Decodes one text frame. Unknown and malformed messages are logged and dropped.
pub fn decode_server_message(text: &str) -> Option<Inbound> {
    let envelope = match serde_json::from_str::<Envelope>(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(error = %e, "malformed server message");
            return None;
        }
    };

    match envelope.kind.as_str() {
        "state" => match serde_json::from_value::<StateDto>(envelope.data) {
            Ok(state) => Some(Inbound::Snapshot(state.into())),
            Err(e) => {
                warn!(error = %e, "malformed state payload");
                None
            }
        },
        "event" => match serde_json::from_value::<EventDto>(envelope.data) {
            Ok(event) => Some(Inbound::Event(event.into())),
            Err(e) => {
                warn!(error = %e, "malformed event payload");
                None
            }
        },
        other => {
            debug!(kind = other, "ignoring unknown server message");
            None
        }
    }
}

pub fn encode_action(action: Action) -> Result<String, serde_json::Error> {
    serde_json::to_string(&ClientMessage::from(action))
}
