// Fixed sprite set the battle view draws with.

/// Number of animation frames in the muzzle flash.
pub const SHOT_FRAMES: u8 = 3;
/// Number of animation frames in the explosion.
pub const EXPLOSION_FRAMES: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteId {
    // Local player's tank, walk frames 0 and 1.
    Player(u8),
    // Every other tank, walk frames 0 and 1.
    Enemy(u8),
    Bullet,
    Wall,
    Block,
    Shot(u8),
    Explosion(u8),
}

/// Every sprite with the file it is loaded from.
pub const MANIFEST: &[(SpriteId, &str)] = &[
    (SpriteId::Player(0), "player_1.png"),
    (SpriteId::Player(1), "player_2.png"),
    (SpriteId::Enemy(0), "enemy_1.png"),
    (SpriteId::Enemy(1), "enemy_2.png"),
    (SpriteId::Bullet, "bullet_8x8.png"),
    (SpriteId::Wall, "wall_16x16.png"),
    (SpriteId::Block, "brick_16x16.png"),
    (SpriteId::Shot(0), "shoot_1.png"),
    (SpriteId::Shot(1), "shoot_2.png"),
    (SpriteId::Shot(2), "shoot_3.png"),
    (SpriteId::Explosion(0), "explosion_1.png"),
    (SpriteId::Explosion(1), "explosion_2.png"),
];
