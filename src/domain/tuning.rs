use std::time::Duration;

/// Presentation tuning for the battle view.
///
/// Keep this separate from runtime/client configuration (URLs, buffer sizes, etc.).
#[derive(Debug, Clone, Copy)]
pub struct RenderTuning {
    /// Edge length of one arena tile and of tank/shot sprites, in pixels.
    pub tile_size: u32,

    /// Edge length of bullet sprites, in pixels.
    pub bullet_size: u32,

    /// Edge length of explosion sprites, in pixels.
    pub explosion_size: u32,

    /// Minimum time between two repaints.
    pub frame_interval: Duration,

    /// Period of the effect aging tick.
    pub effect_frame_interval: Duration,

    /// Period of the walk animation toggle while moving.
    pub walk_frame_interval: Duration,

    /// Delay after the last direction key before the tank counts as standing still.
    pub move_debounce: Duration,

    /// Maximum number of live effects of each kind.
    pub max_effects: usize,

    /// Half the side of the server's bullet/tank hit box, in world units.
    pub hit_half_extent: f32,

    /// Distance a bullet travels per server tick, in world units.
    pub bullet_step: f32,
}

impl Default for RenderTuning {
    fn default() -> Self {
        Self {
            tile_size: 64,
            bullet_size: 32,
            explosion_size: 96,
            frame_interval: Duration::from_millis(20),
            effect_frame_interval: Duration::from_millis(200),
            walk_frame_interval: Duration::from_millis(100),
            move_debounce: Duration::from_millis(150),
            max_effects: 50,
            hit_half_extent: 20.0,
            bullet_step: 10.0,
        }
    }
}
