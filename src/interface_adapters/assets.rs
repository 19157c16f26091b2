// Sprite loading: the whole manifest is read and decoded up front, or nothing is.

use crate::domain::assets::SpriteId;
use crate::domain::errors::{AssetError, AssetErrorKind};

use futures::future::try_join_all;
use image::RgbaImage;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Every sprite of the manifest, decoded to RGBA.
pub struct AssetSet {
    sprites: HashMap<SpriteId, RgbaImage>,
}

impl AssetSet {
    pub fn from_sprites(sprites: HashMap<SpriteId, RgbaImage>) -> Self {
        Self { sprites }
    }

    pub fn get(&self, id: SpriteId) -> Option<&RgbaImage> {
        self.sprites.get(&id)
    }

}

/// Loads every manifest entry from `dir` concurrently.
/// Fails with the first entry that cannot be read or decoded.
pub async fn load_assets(dir: &Path, manifest: &[(SpriteId, &str)]) -> Result<AssetSet, AssetError> {
    let loaded = try_join_all(
        manifest
            .iter()
            .map(|(id, name)| load_sprite(dir, *id, name)),
    )
    .await?;

    info!(dir = %dir.display(), count = loaded.len(), "sprites loaded");
    Ok(AssetSet::from_sprites(loaded.into_iter().collect()))
}

async fn load_sprite(dir: &Path, id: SpriteId, name: &str) -> Result<(SpriteId, RgbaImage), AssetError> {
    let bytes = tokio::fs::read(dir.join(name))
        .await
        .map_err(|e| AssetError {
            name: name.to_string(),
            kind: AssetErrorKind::Read(e),
        })?;
    let image = image::load_from_memory(&bytes).map_err(|e| AssetError {
        name: name.to_string(),
        kind: AssetErrorKind::Decode(e.to_string()),
    })?;
    debug!(name, width = image.width(), height = image.height(), "sprite decoded");
    Ok((id, image.to_rgba8()))
}
