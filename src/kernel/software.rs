use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

use crate::buffer::PixelsMut;
use crate::error::KernelError;
use crate::player::Pose;
use crate::texture::{SpriteIndex, Texture};
use crate::world::WorldGrid;

use super::{
    Background, Billboard, Candidate, FloorTextures, Kernel, Overlay, PassParams, WallTextures,
    floor, sky, sprites, walk, walls,
};

/// Run `f` over every pixel row, on the rayon pool when `parallel` is set.
/// Rows are handed out as RGBA byte slices.
pub(super) fn for_each_row<F>(pixels: &mut PixelsMut<'_>, parallel: bool, f: F)
where
    F: Fn(usize, &mut [u8]) + Sync + Send,
{
    let stride = pixels.stride();
    if stride == 0 {
        return;
    }
    let bytes = pixels.bytes_mut();
    if parallel {
        bytes
            .par_chunks_mut(stride)
            .enumerate()
            .for_each(|(y, row)| f(y, row));
    } else {
        bytes
            .chunks_mut(stride)
            .enumerate()
            .for_each(|(y, row)| f(y, row));
    }
}

/// CPU kernel. Splits row and column work across the rayon pool when
/// `parallel` is set.
#[derive(Debug, Clone, Copy)]
pub struct SoftwareKernel {
    parallel: bool,
}

impl SoftwareKernel {
    pub fn new(parallel: bool) -> Self {
        Self { parallel }
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }
}

impl Default for SoftwareKernel {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Kernel for SoftwareKernel {
    fn draw_background(
        &self,
        pose: &Pose,
        background: &Background,
        light: f32,
        pixels: &mut PixelsMut<'_>,
    ) -> Result<(), KernelError> {
        sky::draw(pose, background, light, pixels, self.parallel)
    }

    fn draw_floor_ceiling(
        &self,
        pose: &Pose,
        grid: &WorldGrid,
        textures: &FloorTextures<'_>,
        params: &PassParams,
        pixels: &mut PixelsMut<'_>,
    ) -> Result<(), KernelError> {
        floor::draw(pose, grid, textures, params, pixels, self.parallel)
    }

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
    ) -> Result<usize, KernelError> {
        walls::draw(
            pose,
            grid,
            sprites,
            textures,
            params,
            pixels,
            depth,
            candidates,
            self.parallel,
        )
    }

    fn draw_sprites(
        &self,
        pose: &Pose,
        billboards: &[Billboard<'_>],
        params: &PassParams,
        pixels: &mut PixelsMut<'_>,
        depth: &[f32],
    ) -> Result<(), KernelError> {
        sprites::draw(pose, billboards, params, pixels, depth, self.parallel)
    }

    fn draw_overlay(
        &self,
        texture: &Texture,
        overlay: Overlay,
        pixels: &mut PixelsMut<'_>,
    ) -> Result<(), KernelError> {
        if overlay.scale <= 0.0 {
            return Ok(());
        }
        let dst_w = (texture.width() as f32 * overlay.scale) as i32;
        let dst_h = (texture.height() as f32 * overlay.scale) as i32;
        let left = overlay.left as i32;
        let top = overlay.top as i32;

        for dy in 0..dst_h {
            let ty = (dy as f32 / overlay.scale) as i32;
            for dx in 0..dst_w {
                let tx = (dx as f32 / overlay.scale) as i32;
                let texel = texture.texel(tx, ty);
                if texel[3] == 0 {
                    continue;
                }
                pixels.blend(left + dx, top + dy, texel);
            }
        }
        Ok(())
    }

    fn walk(&self, pose: &Pose, grid: &WorldGrid, distance: f32) -> (f32, f32) {
        walk::walk(pose, grid, distance)
    }
}
