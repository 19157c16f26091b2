// Locally derived visual effects: a change-detection fold over consecutive snapshots
// plus the fixed-period book that ages and expires them.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::domain::state::{Bullet, Direction, Snapshot};

/// Muzzle flash spawned when a bullet first appears.
#[derive(Debug, Clone, PartialEq)]
pub struct ShotEffect {
    pub projectile_id: String,
    pub x: f32,
    pub y: f32,
    pub direction: Direction,
    pub age: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplosionCause {
    EntityDeath { player_id: u64 },
    ProjectileVanished { projectile_id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExplosionEffect {
    pub x: f32,
    pub y: f32,
    pub age: u8,
    pub cause: ExplosionCause,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DerivedEffect {
    Shot(ShotEffect),
    Explosion(ExplosionEffect),
}

/// Server hit test as seen from the client: a bullet hits a tank when, after one
/// more `step` along its direction, both axis distances are below `half_extent`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitReach {
    pub half_extent: f32,
    pub step: f32,
}

impl HitReach {
    /// Whether a bullet last seen at `bullet` could have hit a tank at (`x`, `y`)
    /// before the next snapshot.
    pub fn covers(&self, bullet: &Bullet, x: f32, y: f32) -> bool {
        // Offset of the tank along the bullet's travel axis and across it.
        let (along, across) = match bullet.direction {
            Direction::Up => (bullet.y - y, x - bullet.x),
            Direction::Down => (y - bullet.y, x - bullet.x),
            Direction::Left => (bullet.x - x, y - bullet.y),
            Direction::Right => (x - bullet.x, y - bullet.y),
        };
        across.abs() < self.half_extent
            && along > -self.half_extent
            && along < self.step + self.half_extent
    }
}

/// What the deriver remembers from the last processed snapshot.
#[derive(Debug, Clone, Default)]
pub struct PreviousState {
    pub bullets: Vec<Bullet>,
    pub alive: HashMap<u64, bool>,
}

impl PreviousState {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            bullets: snapshot.bullets.clone(),
            alive: snapshot
                .tanks
                .iter()
                .map(|t| (t.player_id, t.is_alive))
                .collect(),
        }
    }
}

/// Diffs `previous` against `current` and returns the effects the transition implies.
///
/// A vanished bullet explodes at its last position unless a tank that died in the
/// same transition lies within its `reach`; the death explosion already covers that impact.
pub fn derive_effects(
    previous: &PreviousState,
    current: &Snapshot,
    reach: HitReach,
) -> Vec<DerivedEffect> {
    let mut effects = Vec::new();

    // New bullets fired by a living tank.
    let old_ids: HashSet<&str> = previous.bullets.iter().map(|b| b.id.as_str()).collect();
    for bullet in current.bullets.iter().filter(|b| !old_ids.contains(b.id.as_str())) {
        let shooter_alive = current
            .tank(bullet.shooter_id)
            .is_some_and(|tank| tank.is_alive);
        if shooter_alive {
            effects.push(DerivedEffect::Shot(ShotEffect {
                projectile_id: bullet.id.clone(),
                x: bullet.x,
                y: bullet.y,
                direction: bullet.direction,
                age: 0,
            }));
        }
    }

    // Tanks that were alive last time and are dead now. Unknown tanks never explode.
    let mut deaths: Vec<(f32, f32)> = Vec::new();
    for tank in &current.tanks {
        let was_alive = previous.alive.get(&tank.player_id).copied().unwrap_or(false);
        if was_alive && !tank.is_alive {
            deaths.push((tank.x, tank.y));
            effects.push(DerivedEffect::Explosion(ExplosionEffect {
                x: tank.x,
                y: tank.y,
                age: 0,
                cause: ExplosionCause::EntityDeath {
                    player_id: tank.player_id,
                },
            }));
        }
    }

    // Bullets that disappeared.
    let new_ids: HashSet<&str> = current.bullets.iter().map(|b| b.id.as_str()).collect();
    for bullet in previous.bullets.iter().filter(|b| !new_ids.contains(b.id.as_str())) {
        if deaths.iter().any(|&(x, y)| reach.covers(bullet, x, y)) {
            continue;
        }
        effects.push(DerivedEffect::Explosion(ExplosionEffect {
            x: bullet.x,
            y: bullet.y,
            age: 0,
            cause: ExplosionCause::ProjectileVanished {
                projectile_id: bullet.id.clone(),
            },
        }));
    }

    effects
}

/// Stateful wrapper around [`derive_effects`] that keeps the previous snapshot's cache.
#[derive(Debug, Clone)]
pub struct EffectDeriver {
    previous: PreviousState,
    reach: HitReach,
}

impl EffectDeriver {
    pub fn new(reach: HitReach) -> Self {
        Self {
            previous: PreviousState::default(),
            reach,
        }
    }

    pub fn observe(&mut self, snapshot: &Snapshot) -> Vec<DerivedEffect> {
        let effects = derive_effects(&self.previous, snapshot, self.reach);
        self.previous = PreviousState::from_snapshot(snapshot);
        effects
    }
}

/// Live effect lists, aged on a fixed-period tick and capped per kind.
#[derive(Debug, Clone)]
pub struct EffectBook {
    shots: VecDeque<ShotEffect>,
    explosions: VecDeque<ExplosionEffect>,
    shot_frames: u8,
    explosion_frames: u8,
    cap: usize,
}

impl EffectBook {
    pub fn new(shot_frames: u8, explosion_frames: u8, cap: usize) -> Self {
        Self {
            shots: VecDeque::new(),
            explosions: VecDeque::new(),
            shot_frames,
            explosion_frames,
            cap,
        }
    }

    /// Adds an effect, evicting the oldest one of the same kind when the cap is reached.
    pub fn push(&mut self, effect: DerivedEffect) {
        match effect {
            DerivedEffect::Shot(shot) => push_capped(&mut self.shots, shot, self.cap),
            DerivedEffect::Explosion(explosion) => {
                push_capped(&mut self.explosions, explosion, self.cap)
            }
        }
    }

    pub fn extend(&mut self, effects: impl IntoIterator<Item = DerivedEffect>) {
        for effect in effects {
            self.push(effect);
        }
    }

    /// One aging step: every age grows by one and finished animations are dropped.
    pub fn tick(&mut self) {
        for shot in self.shots.iter_mut() {
            shot.age = shot.age.saturating_add(1);
        }
        for explosion in self.explosions.iter_mut() {
            explosion.age = explosion.age.saturating_add(1);
        }

        let shot_frames = self.shot_frames;
        let explosion_frames = self.explosion_frames;
        self.shots.retain(|s| s.age < shot_frames);
        self.explosions.retain(|e| e.age < explosion_frames);

        truncate_oldest(&mut self.shots, self.cap);
        truncate_oldest(&mut self.explosions, self.cap);
    }

    pub fn shots(&self) -> impl Iterator<Item = &ShotEffect> {
        self.shots.iter()
    }

    pub fn explosions(&self) -> impl Iterator<Item = &ExplosionEffect> {
        self.explosions.iter()
    }

    pub fn shot_frames(&self) -> u8 {
        self.shot_frames
    }

    pub fn explosion_frames(&self) -> u8 {
        self.explosion_frames
    }

    pub fn is_empty(&self) -> bool {
        self.shots.is_empty() && self.explosions.is_empty()
    }

}

fn push_capped<T>(list: &mut VecDeque<T>, item: T, cap: usize) {
    if cap == 0 {
        return;
    }
    while list.len() >= cap {
        list.pop_front();
    }
    list.push_back(item);
}

fn truncate_oldest<T>(list: &mut VecDeque<T>, cap: usize) {
    while list.len() > cap {
        list.pop_front();
    }
}
