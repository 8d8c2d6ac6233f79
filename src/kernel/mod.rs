//! Rasterization kernel: the pixel-level work behind every render pass.
//!
//! The camera only talks to the [`Kernel`] trait. Each call is synchronous,
//! borrows the buffers it writes for its own duration and returns once the
//! output is complete.

mod floor;
pub mod raycast;
mod sky;
mod software;
mod sprites;
mod walk;
mod walls;

pub use sky::Background;
pub use software::SoftwareKernel;
pub use walk::WALL_MARGIN;

use crate::buffer::PixelsMut;
use crate::error::KernelError;
use crate::player::Pose;
use crate::texture::{SpriteIndex, SpriteInstance, Texture};
use crate::world::WorldGrid;

use raycast::WindowHit;

/// Scalars shared by the column and row passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassParams {
    /// Maximum cells a ray walks.
    pub range: u32,
    /// Distance at which fog reaches full strength.
    pub light_range: f32,
    /// Ambient light level from the grid.
    pub light: f32,
}

pub struct FloorTextures<'a> {
    pub floor: &'a Texture,
    pub ceiling: &'a Texture,
    /// Falls back to `floor` when absent.
    pub road: Option<&'a Texture>,
}

pub struct WallTextures<'a> {
    pub wall: &'a Texture,
    pub door: &'a Texture,
}

/// Something the wall pass found that the sprite pass composites.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Candidate {
    Sprite(SpriteInstance),
    Window { column: u32, slice: WindowSlice },
}

/// One screen column of a see-through window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSlice {
    /// Depth in the same units as the depth buffer.
    pub depth: f32,
    pub tex_u: f32,
    pub x: f32,
    pub y: f32,
}

impl WindowSlice {
    pub(crate) fn from_hit(hit: &WindowHit, plane_y_initial: f32) -> Self {
        Self {
            depth: hit.t * plane_y_initial,
            tex_u: hit.tex_u,
            x: hit.x,
            y: hit.y,
        }
    }
}

/// A resolved, ready-to-draw billboard. Drawn in slice order.
#[derive(Debug, Clone, Copy)]
pub enum Billboard<'a> {
    Sprite {
        x: f32,
        y: f32,
        height_scale: f32,
        texture: &'a Texture,
    },
    Window {
        column: u32,
        slice: WindowSlice,
        texture: &'a Texture,
    },
}

impl Billboard<'_> {
    /// World position used for back-to-front ordering.
    pub fn position(&self) -> (f32, f32) {
        match self {
            Billboard::Sprite { x, y, .. } => (*x, *y),
            Billboard::Window { slice, .. } => (slice.x, slice.y),
        }
    }
}

/// Foreground overlay placement in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlay {
    pub left: f32,
    pub top: f32,
    pub scale: f32,
}

pub trait Kernel {
    /// Compose the pre-scaled background for the current heading and pitch.
    fn draw_background(
        &self,
        pose: &Pose,
        background: &Background,
        light: f32,
        pixels: &mut PixelsMut<'_>,
    ) -> Result<(), KernelError>;

    /// Textured floor, road and ceiling rows.
    fn draw_floor_ceiling(
        &self,
        pose: &Pose,
        grid: &WorldGrid,
        textures: &FloorTextures<'_>,
        params: &PassParams,
        pixels: &mut PixelsMut<'_>,
    ) -> Result<(), KernelError>;

    /// Cast every column, write pixels and depth, and push the sprites and
    /// window slices met on the way into `candidates`. Returns how many were
    /// pushed.
    fn draw_walls(
        &self,
        pose: &Pose,
        grid: &WorldGrid,
        sprites: &SpriteIndex,
        textures: &WallTextures<'_>,
        params: &PassParams,
        pixels: &mut PixelsMut<'_>,
        depth: &mut [f32],
        candidates: &mut Vec<Candidate>,
    ) -> Result<usize, KernelError>;

    /// Project and composite billboards in the order given, occluded by
    /// `depth`.
    fn draw_sprites(
        &self,
        pose: &Pose,
        billboards: &[Billboard<'_>],
        params: &PassParams,
        pixels: &mut PixelsMut<'_>,
        depth: &[f32],
    ) -> Result<(), KernelError>;

    /// Blit a foreground image with no depth test.
    fn draw_overlay(
        &self,
        texture: &Texture,
        overlay: Overlay,
        pixels: &mut PixelsMut<'_>,
    ) -> Result<(), KernelError>;

    /// Corrected position after stepping `distance` along the heading.
    fn walk(&self, pose: &Pose, grid: &WorldGrid, distance: f32) -> (f32, f32);
}

/// Darken (factor < 1) or brighten (factor > 1) an opaque colour.
#[inline(always)]
pub(crate) fn shade(rgba: [u8; 4], factor: f32) -> [u8; 4] {
    let f = factor.max(0.0);
    [
        (rgba[0] as f32 * f).min(255.0) as u8,
        (rgba[1] as f32 * f).min(255.0) as u8,
        (rgba[2] as f32 * f).min(255.0) as u8,
        rgba[3],
    ]
}

pub(crate) fn check_depth(depth: &[f32], width: usize) -> Result<(), KernelError> {
    if depth.len() != width {
        return Err(KernelError::BufferMismatch {
            what: "depth",
            expected: width,
            actual: depth.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shade_scales_and_saturates() {
        assert_eq!(shade([100, 200, 50, 255], 0.5), [50, 100, 25, 255]);
        assert_eq!(shade([200, 200, 200, 7], 2.0), [255, 255, 255, 7]);
        assert_eq!(shade([10, 10, 10, 255], -1.0), [0, 0, 0, 255]);
    }

    #[test]
    fn depth_length_is_checked() {
        assert!(check_depth(&[0.0; 4], 4).is_ok());
        assert_eq!(
            check_depth(&[0.0; 3], 4),
            Err(KernelError::BufferMismatch {
                what: "depth",
                expected: 4,
                actual: 3
            })
        );
    }
}
