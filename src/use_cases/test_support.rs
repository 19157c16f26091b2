use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{Notify, mpsc};

use crate::domain::assets::SpriteId;
use crate::domain::errors::{AuthError, SessionError};
use crate::domain::ports::{
    Action, AuthProvider, BattleChannel, BattleConnector, Canvas, Inbound, Notification, Notifier,
    Rect,
};
use crate::domain::state::{Credential, Direction};

// Credential collaborator with scripted answers.
pub(crate) struct FakeAuth {
    current: Option<Credential>,
    expired: bool,
    refresh: Mutex<Result<Credential, AuthError>>,
    refresh_calls: AtomicUsize,
}

impl FakeAuth {
    pub(crate) fn missing() -> Self {
        Self {
            current: None,
            expired: true,
            refresh: Mutex::new(Err(AuthError::MissingRefreshToken)),
            refresh_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn expired(token: &str) -> Self {
        Self {
            current: Some(Credential::new(token)),
            ..Self::missing()
        }
    }

    pub(crate) fn valid(token: &str) -> Self {
        Self {
            current: Some(Credential::new(token)),
            expired: false,
            ..Self::missing()
        }
    }

    pub(crate) fn with_refresh(self, result: Result<Credential, AuthError>) -> Self {
        *self.refresh.lock().expect("refresh mutex poisoned") = result;
        self
    }

    pub(crate) fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthProvider for FakeAuth {
    fn is_credential_expired(&self) -> bool {
        self.expired
    }

    async fn refresh_credential(&self) -> Result<Credential, AuthError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.refresh.lock().expect("refresh mutex poisoned").clone()
    }

    fn current_credential(&self) -> Option<Credential> {
        self.current.clone()
    }
}

// Transport-side ends of a battle channel.
pub(crate) struct ChannelPeer {
    pub inbound_tx: mpsc::Sender<Inbound>,
    pub outbound_rx: mpsc::UnboundedReceiver<Action>,
    pub shutdown: Arc<Notify>,
}

pub(crate) fn channel_pair(capacity: usize) -> (BattleChannel, ChannelPeer) {
    let (inbound_tx, inbound) = mpsc::channel(capacity);
    let (outbound, outbound_rx) = mpsc::unbounded_channel();
    let shutdown = Arc::new(Notify::new());
    (
        BattleChannel {
            inbound,
            outbound,
            shutdown: shutdown.clone(),
        },
        ChannelPeer {
            inbound_tx,
            outbound_rx,
            shutdown,
        },
    )
}

// Connector that records every open and keeps the peer ends for the test.
pub(crate) struct FakeConnector {
    opened: Mutex<Vec<(String, Credential)>>,
    peer: Mutex<Option<ChannelPeer>>,
}

impl FakeConnector {
    pub(crate) fn new() -> Self {
        Self {
            opened: Mutex::new(Vec::new()),
            peer: Mutex::new(None),
        }
    }

    pub(crate) fn open_calls(&self) -> usize {
        self.opened.lock().expect("opened mutex poisoned").len()
    }

    pub(crate) fn opened(&self) -> Vec<(String, Credential)> {
        self.opened.lock().expect("opened mutex poisoned").clone()
    }

    pub(crate) fn take_peer(&self) -> Option<ChannelPeer> {
        self.peer.lock().expect("peer mutex poisoned").take()
    }
}

#[async_trait]
impl BattleConnector for FakeConnector {
    async fn open(
        &self,
        battle_id: &str,
        credential: &Credential,
    ) -> Result<BattleChannel, SessionError> {
        self.opened
            .lock()
            .expect("opened mutex poisoned")
            .push((battle_id.to_string(), credential.clone()));
        let (channel, peer) = channel_pair(64);
        *self.peer.lock().expect("peer mutex poisoned") = Some(peer);
        Ok(channel)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DrawOp {
    Clear { width: u32, height: u32 },
    Sprite { sprite: SpriteId, dest: Rect, facing: Direction },
    Outline(Rect),
    Present,
}

// Canvas that records draw calls instead of painting.
#[derive(Default)]
pub(crate) struct RecordingCanvas {
    pub ops: Vec<DrawOp>,
}

impl RecordingCanvas {
    pub(crate) fn frames(&self) -> usize {
        self.ops.iter().filter(|op| **op == DrawOp::Present).count()
    }

    // Draw calls of the most recent complete frame, without Clear/Present.
    pub(crate) fn last_frame(&self) -> Vec<DrawOp> {
        let end = self
            .ops
            .iter()
            .rposition(|op| *op == DrawOp::Present)
            .unwrap_or(0);
        let start = self.ops[..end]
            .iter()
            .rposition(|op| matches!(op, DrawOp::Clear { .. }))
            .map(|i| i + 1)
            .unwrap_or(0);
        self.ops[start..end].to_vec()
    }

    pub(crate) fn last_frame_sprites(&self) -> Vec<(SpriteId, Rect, Direction)> {
        self.last_frame()
            .into_iter()
            .filter_map(|op| match op {
                DrawOp::Sprite {
                    sprite,
                    dest,
                    facing,
                } => Some((sprite, dest, facing)),
                _ => None,
            })
            .collect()
    }
}

impl Canvas for RecordingCanvas {
    fn clear(&mut self, width: u32, height: u32) {
        self.ops.push(DrawOp::Clear { width, height });
    }

    fn draw_sprite(&mut self, sprite: SpriteId, dest: Rect, facing: Direction) {
        self.ops.push(DrawOp::Sprite {
            sprite,
            dest,
            facing,
        });
    }

    fn outline(&mut self, dest: Rect) {
        self.ops.push(DrawOp::Outline(dest));
    }

    fn present(&mut self) {
        self.ops.push(DrawOp::Present);
    }
}

#[derive(Clone, Default)]
pub(crate) struct RecordingNotifier {
    seen: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub(crate) fn seen(&self) -> Vec<Notification> {
        self.seen.lock().expect("notifier mutex poisoned").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
    }
}
