// Time-gated, dirty-flag driven compositor for the battle scene.

use tokio::time::Instant;
use tracing::trace;

use crate::domain::arena::{Arena, Tile};
use crate::domain::assets::SpriteId;
use crate::domain::effects::EffectBook;
use crate::domain::ports::{Canvas, Rect};
use crate::domain::state::{Direction, Snapshot};
use crate::domain::tuning::RenderTuning;

/// Everything one frame is painted from.
pub struct Scene<'a> {
    pub snapshot: &'a Snapshot,
    pub arena: &'a Arena,
    pub effects: &'a EffectBook,
    // Walk animation frame, 0 or 1.
    pub walk_frame: u8,
    pub local_player_id: Option<u64>,
}

/// Paints one frame back to front: arena, tanks, bullets, shot effects, explosions.
pub fn paint_scene<C>(scene: &Scene<'_>, tuning: &RenderTuning, canvas: &mut C)
where
    C: Canvas + ?Sized,
{
    let tile = tuning.tile_size;
    canvas.clear(scene.arena.width, scene.arena.height);

    for (row, col, kind) in scene.arena.solid_tiles(tile) {
        let dest = Rect::new((col * tile) as i32, (row * tile) as i32, tile);
        match kind {
            Tile::Wall => canvas.draw_sprite(SpriteId::Wall, dest, Direction::Up),
            Tile::Block => canvas.draw_sprite(SpriteId::Block, dest, Direction::Up),
            Tile::Spawn => canvas.outline(dest),
            Tile::Empty => {}
        }
    }

    for tank in scene.snapshot.tanks.iter().filter(|t| t.is_alive) {
        let sprite = if scene.local_player_id == Some(tank.player_id) {
            SpriteId::Player(scene.walk_frame)
        } else {
            SpriteId::Enemy(scene.walk_frame)
        };
        canvas.draw_sprite(sprite, Rect::centered(tank.x, tank.y, tile), tank.direction);
    }

    for bullet in &scene.snapshot.bullets {
        canvas.draw_sprite(
            SpriteId::Bullet,
            Rect::centered(bullet.x, bullet.y, tuning.bullet_size),
            bullet.direction,
        );
    }

    for shot in scene.effects.shots() {
        if shot.age >= scene.effects.shot_frames() {
            continue;
        }
        canvas.draw_sprite(
            SpriteId::Shot(shot.age),
            Rect::centered(shot.x, shot.y, tile),
            shot.direction,
        );
    }

    for explosion in scene.effects.explosions() {
        if explosion.age >= scene.effects.explosion_frames() {
            continue;
        }
        canvas.draw_sprite(
            SpriteId::Explosion(explosion.age),
            Rect::centered(explosion.x, explosion.y, tuning.explosion_size),
            Direction::Up,
        );
    }

    canvas.present();
}

pub struct RenderLoop {
    tuning: RenderTuning,
    last_paint: Option<Instant>,
    dirty: bool,
    frames_painted: u64,
}

impl RenderLoop {
    pub fn new(tuning: RenderTuning) -> Self {
        Self {
            tuning,
            last_paint: None,
            dirty: true,
            frames_painted: 0,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn frames_painted(&self) -> u64 {
        self.frames_painted
    }

    /// Called on every scheduled frame. Repaints only when a frame interval has passed
    /// since the last paint, something changed, and there is a scene to paint.
    pub fn on_frame<C>(&mut self, now: Instant, scene: Option<Scene<'_>>, canvas: &mut C) -> bool
    where
        C: Canvas + ?Sized,
    {
        if let Some(last) = self.last_paint {
            if now.saturating_duration_since(last) < self.tuning.frame_interval {
                return false;
            }
        }
        if !self.dirty {
            return false;
        }
        let Some(scene) = scene else {
            return false;
        };

        paint_scene(&scene, &self.tuning, canvas);
        self.last_paint = Some(now);
        self.dirty = false;
        self.frames_painted += 1;
        trace!(frame = self.frames_painted, "frame painted");
        true
    }
}
