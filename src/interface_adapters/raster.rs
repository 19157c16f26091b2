// Software canvas: composites sprites onto an RGBA framebuffer.

use crate::domain::arena::MAX_ARENA_SIDE;
use crate::domain::assets::SpriteId;
use crate::domain::ports::{Canvas, Rect};
use crate::domain::state::Direction;
use crate::interface_adapters::assets::AssetSet;

use image::imageops::{self, FilterType};
use image::{ImageResult, Rgba, RgbaImage};
use std::path::Path;
use tracing::{debug, trace, warn};

const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);
const SPAWN_OUTLINE: Rgba<u8> = Rgba([255, 255, 0, 255]);

pub struct RasterCanvas {
    assets: AssetSet,
    frame: RgbaImage,
    frames_presented: u64,
}

impl RasterCanvas {
    pub fn new(assets: AssetSet) -> Self {
        Self {
            assets,
            frame: RgbaImage::new(0, 0),
            frames_presented: 0,
        }
    }

    /// Last composited frame.
    pub fn frame(&self) -> &RgbaImage {
        &self.frame
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn save_png(&self, path: &Path) -> ImageResult<()> {
        self.frame.save_with_format(path, image::ImageFormat::Png)
    }
}

impl Canvas for RasterCanvas {
    fn clear(&mut self, width: u32, height: u32) {
        if width > MAX_ARENA_SIDE || height > MAX_ARENA_SIDE {
            warn!(width, height, "framebuffer size out of bounds; frame not cleared");
            return;
        }
        if self.frame.dimensions() != (width, height) {
            debug!(width, height, "framebuffer resized");
            self.frame = RgbaImage::from_pixel(width, height, BACKGROUND);
            return;
        }
        for pixel in self.frame.pixels_mut() {
            *pixel = BACKGROUND;
        }
    }

    fn draw_sprite(&mut self, sprite: SpriteId, dest: Rect, facing: Direction) {
        let Some(source) = self.assets.get(sprite) else {
            trace!(?sprite, "sprite not loaded; skipped");
            return;
        };
        let rotated = match facing.quarter_turns() {
            1 => imageops::rotate90(source),
            2 => imageops::rotate180(source),
            3 => imageops::rotate270(source),
            _ => source.clone(),
        };
        let scaled = imageops::resize(&rotated, dest.size, dest.size, FilterType::Nearest);
        imageops::overlay(&mut self.frame, &scaled, i64::from(dest.x), i64::from(dest.y));
    }

    fn outline(&mut self, dest: Rect) {
        let (width, height) = self.frame.dimensions();
        let size = dest.size as i64;
        let (left, top) = (i64::from(dest.x), i64::from(dest.y));
        let (right, bottom) = (left + size - 1, top + size - 1);

        let mut plot = |x: i64, y: i64| {
            if (0..width as i64).contains(&x) && (0..height as i64).contains(&y) {
                self.frame.put_pixel(x as u32, y as u32, SPAWN_OUTLINE);
            }
        };
        for x in left..=right {
            plot(x, top);
            plot(x, bottom);
        }
        for y in top..=bottom {
            plot(left, y);
            plot(right, y);
        }
    }

    fn present(&mut self) {
        self.frames_presented += 1;
        trace!(frame = self.frames_presented, "frame presented");
    }
}
