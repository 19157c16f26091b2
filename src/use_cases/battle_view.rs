// Battle view: the single event loop that owns all rendering state of one battle.

use std::sync::Arc;

use tokio::sync::{Notify, mpsc};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::domain::arena::Arena;
use crate::domain::assets::{EXPLOSION_FRAMES, SHOT_FRAMES};
use crate::domain::effects::{EffectBook, EffectDeriver, HitReach};
use crate::domain::ports::{Canvas, Inbound, Notification, Notifier};
use crate::domain::state::{ServerEvent, Snapshot};
use crate::domain::tuning::RenderTuning;
use crate::use_cases::input::{InputMapper, KeyOutcome};
use crate::use_cases::render::{RenderLoop, Scene};
use crate::use_cases::schedule::PeriodicTask;
use crate::use_cases::session::TransportSession;

/// Session-scoped settings for one battle view.
#[derive(Debug, Clone)]
pub struct BattleViewConfig {
    // Tank drawn with the player sprite; everyone else is an enemy.
    pub local_player_id: Option<u64>,
    pub tuning: RenderTuning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BattleOutcome {
    Disposed,
    ChannelClosed { reason: Option<String> },
    ChannelFailed { error: String },
}

enum Wake {
    Shutdown,
    Inbound(Option<Inbound>),
    Key(Option<String>),
    Paint(Instant),
    Age,
    Walk,
    Settled,
}

pub struct BattleView<C> {
    session: TransportSession,
    canvas: C,
    notifier: Arc<dyn Notifier>,
    config: BattleViewConfig,
    snapshot: Option<Snapshot>,
    arena: Option<Arena>,
    deriver: EffectDeriver,
    effects: EffectBook,
    input: InputMapper,
    render: RenderLoop,
    walk_frame: u8,
}

impl<C: Canvas> BattleView<C> {
    pub fn new(
        session: TransportSession,
        canvas: C,
        notifier: Arc<dyn Notifier>,
        config: BattleViewConfig,
    ) -> Self {
        let tuning = config.tuning;
        Self {
            session,
            canvas,
            notifier,
            snapshot: None,
            arena: None,
            deriver: EffectDeriver::new(HitReach {
                half_extent: tuning.hit_half_extent,
                step: tuning.bullet_step,
            }),
            effects: EffectBook::new(SHOT_FRAMES, EXPLOSION_FRAMES, tuning.max_effects),
            input: InputMapper::new(tuning.move_debounce),
            render: RenderLoop::new(tuning),
            walk_frame: 0,
            config,
        }
    }

    /// Runs until `shutdown` is notified or the channel ends, then tears everything down.
    pub async fn run(
        &mut self,
        mut keys: mpsc::Receiver<String>,
        shutdown: Arc<Notify>,
    ) -> BattleOutcome {
        let tuning = self.config.tuning;
        let mut paint = PeriodicTask::new("paint", tuning.frame_interval);
        let mut aging = PeriodicTask::new("effect-aging", tuning.effect_frame_interval);
        let mut walk = PeriodicTask::new("walk-animation", tuning.walk_frame_interval);
        paint.start();
        aging.start();
        let mut keys_open = true;

        info!(battle_id = %self.session.battle_id(), "battle view started");

        let outcome = loop {
            let wake = tokio::select! {
                biased;
                _ = shutdown.notified() => Wake::Shutdown,
                inbound = self.session.recv() => Wake::Inbound(inbound),
                key = keys.recv(), if keys_open => Wake::Key(key),
                _ = self.input.movement_settled() => Wake::Settled,
                now = paint.tick() => Wake::Paint(now),
                _ = aging.tick() => Wake::Age,
                _ = walk.tick() => Wake::Walk,
            };

            match wake {
                Wake::Shutdown => break BattleOutcome::Disposed,
                Wake::Inbound(Some(inbound)) => {
                    if let Some(outcome) = self.apply_inbound(inbound) {
                        break outcome;
                    }
                }
                Wake::Inbound(None) => {
                    warn!("battle channel ended without close frame");
                    self.notifier
                        .notify(Notification::ChannelClosed { reason: None });
                    break BattleOutcome::ChannelClosed { reason: None };
                }
                Wake::Key(Some(key)) => {
                    if let KeyOutcome::Moved(direction) = self.input.on_key(&key, &mut self.session)
                    {
                        debug!(direction = direction.as_str(), "move sent");
                        self.render.mark_dirty();
                        walk.start();
                    }
                }
                Wake::Key(None) => {
                    debug!("key source closed");
                    keys_open = false;
                }
                Wake::Settled => walk.stop(),
                Wake::Paint(now) => self.paint_frame(now),
                Wake::Age => {
                    if !self.effects.is_empty() {
                        self.effects.tick();
                        self.render.mark_dirty();
                    }
                }
                Wake::Walk => {
                    self.walk_frame = (self.walk_frame + 1) % 2;
                    self.render.mark_dirty();
                }
            }
        };

        // Stop every timer before closing so nothing fires after disposal.
        paint.stop();
        aging.stop();
        walk.stop();
        self.input.reset();
        self.session.close();
        info!(?outcome, frames = self.render.frames_painted(), "battle view stopped");
        outcome
    }

    /// Applies one inbound item. Returns an outcome when the channel is finished.
    pub fn apply_inbound(&mut self, inbound: Inbound) -> Option<BattleOutcome> {
        match inbound {
            Inbound::Snapshot(snapshot) => {
                self.apply_snapshot(snapshot);
                None
            }
            Inbound::Event(ServerEvent::GameOver { reason }) => {
                info!(%reason, "game over");
                self.notifier.notify(Notification::GameOver { reason });
                None
            }
            Inbound::Event(ServerEvent::Error { message }) => {
                error!(%message, "server reported an error");
                self.notifier
                    .notify(Notification::ServerError { message });
                None
            }
            Inbound::Event(ServerEvent::Other { event }) => {
                debug!(%event, "unhandled server event");
                None
            }
            Inbound::Closed { reason } => {
                info!(?reason, "battle channel closed by server");
                self.notifier.notify(Notification::ChannelClosed {
                    reason: reason.clone(),
                });
                Some(BattleOutcome::ChannelClosed { reason })
            }
            Inbound::Failed { error } => {
                error!(%error, "battle channel failed");
                self.notifier.notify(Notification::ChannelFailed {
                    error: error.clone(),
                });
                Some(BattleOutcome::ChannelFailed { error })
            }
        }
    }

    fn apply_snapshot(&mut self, mut snapshot: Snapshot) {
        if let Some(map) = snapshot.map.take() {
            if map.is_within_bounds() {
                info!(name = %map.name, width = map.width, height = map.height, "arena received");
                self.arena = Some(map);
            } else {
                warn!(
                    name = %map.name,
                    width = map.width,
                    height = map.height,
                    "oversized arena ignored; keeping the previous one"
                );
            }
        }

        let derived = self.deriver.observe(&snapshot);
        if !derived.is_empty() {
            debug!(count = derived.len(), "effects derived");
        }
        self.effects.extend(derived);
        self.snapshot = Some(snapshot);
        self.render.mark_dirty();
    }

    fn paint_frame(&mut self, now: Instant) {
        let scene = match (&self.snapshot, &self.arena) {
            (Some(snapshot), Some(arena)) => Some(Scene {
                snapshot,
                arena,
                effects: &self.effects,
                walk_frame: self.walk_frame,
                local_player_id: self.config.local_player_id,
            }),
            _ => None,
        };
        self.render.on_frame(now, scene, &mut self.canvas);
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn arena(&self) -> Option<&Arena> {
        self.arena.as_ref()
    }

    pub fn effects(&self) -> &EffectBook {
        &self.effects
    }

    pub fn frames_painted(&self) -> u64 {
        self.render.frames_painted()
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn into_canvas(self) -> C {
        self.canvas
    }
}
