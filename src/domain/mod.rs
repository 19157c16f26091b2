// Domain layer: battle state, derived effects and the ports the client depends on.

pub mod arena;
pub mod assets;
pub mod effects;
pub mod errors;
pub mod ports;
pub mod state;
pub mod tuning;

pub use arena::{Arena, MAX_ARENA_SIDE, Tile};
pub use assets::SpriteId;
pub use effects::{
    DerivedEffect, EffectBook, EffectDeriver, ExplosionCause, ExplosionEffect, HitReach, ShotEffect,
};
pub use state::{Bullet, Credential, Direction, ServerEvent, Snapshot, Tank};
