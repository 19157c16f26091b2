// Keyboard-to-action translation with a debounced "moving" flag.

use std::time::Duration;

use tracing::trace;

use crate::domain::ports::Action;
use crate::domain::state::Direction;
use crate::use_cases::schedule::Debounce;
use crate::use_cases::session::TransportSession;

/// Where the input mapper sends actions.
pub trait ActionSink {
    fn is_open(&self) -> bool;
    fn send(&mut self, action: Action) -> bool;
}

impl ActionSink for TransportSession {
    fn is_open(&self) -> bool {
        TransportSession::is_open(self)
    }

    fn send(&mut self, action: Action) -> bool {
        TransportSession::send(self, action)
    }
}

/// Maps a key name (lowercase, browser style) to the action it triggers.
pub fn action_for_key(key: &str) -> Option<Action> {
    let direction = match key {
        "arrowup" | "w" => Direction::Up,
        "arrowdown" | "s" => Direction::Down,
        "arrowleft" | "a" => Direction::Left,
        "arrowright" | "d" => Direction::Right,
        " " | "space" => return Some(Action::Shoot),
        _ => return None,
    };
    Some(Action::Move { direction })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    Moved(Direction),
    Shot,
}

pub struct InputMapper {
    moving: Debounce,
}

impl InputMapper {
    pub fn new(move_debounce: Duration) -> Self {
        Self {
            moving: Debounce::new("move-debounce", move_debounce),
        }
    }

    /// Handles one key press. Keys are no-ops unless the sink is open.
    pub fn on_key<S>(&mut self, key: &str, sink: &mut S) -> KeyOutcome
    where
        S: ActionSink + ?Sized,
    {
        if !sink.is_open() {
            trace!(key, "channel not open; key ignored");
            return KeyOutcome::Ignored;
        }

        let key = key.to_lowercase();
        match action_for_key(&key) {
            Some(action @ Action::Move { direction }) => {
                sink.send(action);
                self.moving.restart();
                KeyOutcome::Moved(direction)
            }
            Some(Action::Shoot) => {
                sink.send(Action::Shoot);
                KeyOutcome::Shot
            }
            None => KeyOutcome::Ignored,
        }
    }

    /// True until the debounce delay has passed since the last direction key.
    pub fn is_moving(&self) -> bool {
        self.moving.is_armed()
    }

    /// Resolves when the moving flag clears.
    pub async fn movement_settled(&mut self) {
        self.moving.expired().await;
    }

    pub fn reset(&mut self) {
        self.moving.cancel();
    }
}
