use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Notify, mpsc};

use crate::domain::assets::SpriteId;
use crate::domain::errors::{AuthError, SessionError};
use crate::domain::state::{Credential, Direction, ServerEvent, Snapshot};

// Port for the credential collaborator the transport session depends on.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    fn is_credential_expired(&self) -> bool;
    async fn refresh_credential(&self) -> Result<Credential, AuthError>;
    fn current_credential(&self) -> Option<Credential>;
}

// Port for retrieving the current time.
pub trait Clock: Send + Sync {
    fn now_epoch_seconds(&self) -> u64;
}

/// Actions the client sends to the server. Fire-and-forget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Move { direction: Direction },
    Shoot,
}

/// Decoded inbound traffic of one battle channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Snapshot(Snapshot),
    Event(ServerEvent),
    // The peer closed the channel (or the socket ended without a close frame).
    Closed { reason: Option<String> },
    // Transport-level failure; the channel is unusable afterwards.
    Failed { error: String },
}

/// Both halves of an open battle channel.
pub struct BattleChannel {
    pub inbound: mpsc::Receiver<Inbound>,
    pub outbound: mpsc::UnboundedSender<Action>,
    // Signalled once on teardown; the transport closes the socket when notified.
    pub shutdown: Arc<Notify>,
}

// Port for opening the real-time channel of one battle.
#[async_trait]
pub trait BattleConnector: Send + Sync {
    async fn open(
        &self,
        battle_id: &str,
        credential: &Credential,
    ) -> Result<BattleChannel, SessionError>;
}

/// Square destination on the canvas, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub size: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, size: u32) -> Self {
        Self { x, y, size }
    }

    pub fn centered(cx: f32, cy: f32, size: u32) -> Self {
        let half = size as f32 / 2.0;
        Self {
            x: (cx - half).round() as i32,
            y: (cy - half).round() as i32,
            size,
        }
    }
}

// Painting surface the render loop draws onto.
pub trait Canvas {
    /// Resets the visible area to the background colour.
    fn clear(&mut self, width: u32, height: u32);
    /// Draws a sprite into `dest`, rotated clockwise to `facing` (`Up` is unrotated).
    fn draw_sprite(&mut self, sprite: SpriteId, dest: Rect, facing: Direction);
    /// Strokes the border of `dest` (spawn markers).
    fn outline(&mut self, dest: Rect);
    /// Called once after a frame is complete.
    fn present(&mut self);
}

/// User-facing notifications raised by the battle view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    GameOver { reason: String },
    ServerError { message: String },
    ChannelClosed { reason: Option<String> },
    ChannelFailed { error: String },
}

// Port for surfacing terminal notifications to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}
