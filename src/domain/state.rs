// Domain-level battle state as received from the server, plus the session credential.

use std::fmt;

/// One of the four cardinal facings used by tanks, bullets and shot effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Clockwise rotation from the unrotated (`Up`) sprite, in quarter turns.
    pub fn quarter_turns(self) -> u8 {
        match self {
            Direction::Up => 0,
            Direction::Right => 1,
            Direction::Down => 2,
            Direction::Left => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tank {
    pub player_id: u64,
    pub x: f32,
    pub y: f32,
    pub direction: Direction,
    pub is_alive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bullet {
    pub id: String,
    pub shooter_id: u64,
    pub x: f32,
    pub y: f32,
    pub direction: Direction,
}

/// Authoritative battle state. Each snapshot replaces the previous one wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub tanks: Vec<Tank>,
    pub bullets: Vec<Bullet>,
    // Only present on the first state of a session or after a map change.
    pub map: Option<super::Arena>,
    pub battle_id: String,
    pub time_left: Option<u32>,
}

impl Snapshot {
    pub fn tank(&self, player_id: u64) -> Option<&Tank> {
        self.tanks.iter().find(|t| t.player_id == player_id)
    }
}

/// Named events pushed by the server alongside state updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    GameOver { reason: String },
    Error { message: String },
    Other { event: String },
}

/// Bearer access credential used to open a battle channel.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Never print the token itself.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(<{} bytes>)", self.0.len())
    }
}
