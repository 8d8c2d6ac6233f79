use std::f32::consts::TAU;

use crate::buffer::PixelsMut;
use crate::error::KernelError;
use crate::player::Pose;
use crate::texture::Texture;

use super::software::for_each_row;

/// Sky panorama resampled once to the screen height and doubled in width,
/// so the per-frame pass is a plain wrapped copy.
#[derive(Debug, Clone)]
pub struct Background {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Background {
    pub fn new(texture: &Texture, screen_height: usize) -> Self {
        let height = screen_height.max(1);
        let scale = height as f32 / texture.height() as f32;
        let width = ((texture.width() as f32 * scale * 2.0).round() as usize).max(1);

        let mut pixels = vec![0u8; width * height * 4];
        for (y, row) in pixels.chunks_exact_mut(width * 4).enumerate() {
            let ty = (y as f32 / height as f32 * texture.height() as f32) as i32;
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let tx = (x as f32 / width as f32 * texture.width() as f32) as i32;
                px.copy_from_slice(&texture.texel(tx, ty));
            }
        }
        tracing::debug!(width, height, "background scaled");

        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline(always)]
    fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * self.width + x) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            255,
        ]
    }
}

/// Horizontal scroll for a heading: a full turn pans the whole panorama.
pub(super) fn scroll_offset(pose: &Pose, background_width: usize) -> usize {
    let turn = pose.heading() / TAU;
    ((turn * background_width as f32) as i64).rem_euclid(background_width as i64) as usize
}

pub(super) fn draw(
    pose: &Pose,
    background: &Background,
    light: f32,
    pixels: &mut PixelsMut<'_>,
    parallel: bool,
) -> Result<(), KernelError> {
    if background.pixels.is_empty() {
        return Err(KernelError::EmptyTexture { what: "background" });
    }

    let width = pixels.width();
    let offset = scroll_offset(pose, background.width);
    let pitch = pose.pitch.round() as i64;
    let glow = (light * 0.1).clamp(0.0, 1.0);
    let last_row = background.height as i64 - 1;

    for_each_row(pixels, parallel, |y, row| {
        let sy = (y as i64 - pitch).clamp(0, last_row) as usize;
        for (x, px) in row.chunks_exact_mut(4).take(width).enumerate() {
            let sx = (x + offset) % background.width;
            let mut c = background.pixel(sx, sy);
            if glow > 0.0 {
                for ch in c.iter_mut().take(3) {
                    *ch = (*ch as f32 + (255.0 - *ch as f32) * glow) as u8;
                }
            }
            px.copy_from_slice(&c);
        }
    });
    Ok(())
}
