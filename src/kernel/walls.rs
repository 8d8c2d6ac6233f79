use std::collections::HashSet;

use rayon::prelude::*;

use crate::buffer::PixelsMut;
use crate::error::KernelError;
use crate::player::Pose;
use crate::texture::{SpriteIndex, Texture};
use crate::world::WorldGrid;

use super::raycast::{self, CastMode, HitSurface, RayHit, Side, TraceEvent, WindowHit};
use super::software::for_each_row;
use super::{Candidate, PassParams, WallTextures, WindowSlice, check_depth, shade};

const MAX_FOG: f32 = 0.8;
/// y-sides are darker; this caps the doubled fog.
const MAX_SIDE_FOG: f32 = 0.85;

struct Column {
    hit: Option<RayHit>,
    /// Cells along the ray that hold sprites, in visit order.
    sprite_cells: Vec<(i32, i32)>,
    windows: Vec<WindowHit>,
}

/// Screen-space slice of one wall column.
struct Span<'t> {
    top: f32,
    bottom: f32,
    texture: &'t Texture,
    tex_x: i32,
    factor: f32,
}

fn cast_column(
    column: usize,
    width: usize,
    pose: &Pose,
    grid: &WorldGrid,
    sprites: &SpriteIndex,
    range: u32,
) -> Column {
    // x-coordinate in camera space
    let camera_x = 2.0 * column as f32 / width as f32 - 1.0;
    let dir = [
        pose.dir_x + pose.plane_x * camera_x,
        pose.dir_y + pose.plane_y * camera_x,
    ];

    let mut sprite_cells = Vec::new();
    let mut windows = Vec::new();
    let hit = raycast::trace(
        grid,
        [pose.x, pose.y],
        dir,
        range,
        CastMode::Render,
        |event| match event {
            TraceEvent::Cell(x, y) => {
                if sprites.contains_cell(x, y) {
                    sprite_cells.push((x, y));
                }
            }
            TraceEvent::Window(w) => windows.push(w),
        },
    );

    Column {
        hit,
        sprite_cells,
        windows,
    }
}

/// Fog factor for a wall at `distance`.
pub(super) fn wall_factor(distance: f32, side: Side, light_range: f32) -> f32 {
    let mut fog = (distance / light_range).min(MAX_FOG);
    if side == Side::Y {
        fog *= 2.0;
    }
    1.0 - fog.min(MAX_SIDE_FOG)
}

/// Vertical screen extent of something one wall tall at `distance`.
pub(super) fn vertical_extent(pose: &Pose, distance: f32, width: usize, height: usize) -> (f32, f32) {
    let line_height = width as f32 / 2.0 / distance;
    let aspect = height as f32 / width as f32;
    let center = height as f32 / 2.0 + pose.pitch + pose.z / (distance * 2.0 * aspect);
    (center - line_height / 2.0, center + line_height / 2.0)
}

pub(super) fn draw(
    pose: &Pose,
    grid: &WorldGrid,
    sprites: &SpriteIndex,
    textures: &WallTextures<'_>,
    params: &PassParams,
    pixels: &mut PixelsMut<'_>,
    depth: &mut [f32],
    candidates: &mut Vec<Candidate>,
    parallel: bool,
) -> Result<usize, KernelError> {
    let width = pixels.width();
    let height = pixels.height();
    check_depth(depth, width)?;

    let columns: Vec<Column> = if parallel {
        (0..width)
            .into_par_iter()
            .map(|c| cast_column(c, width, pose, grid, sprites, params.range))
            .collect()
    } else {
        (0..width)
            .map(|c| cast_column(c, width, pose, grid, sprites, params.range))
            .collect()
    };

    let before = candidates.len();
    let mut seen = HashSet::new();
    let mut spans: Vec<Option<Span<'_>>> = Vec::with_capacity(width);

    for (column, (col, slot)) in columns.iter().zip(depth.iter_mut()).enumerate() {
        for &(x, y) in &col.sprite_cells {
            if seen.insert((x, y)) {
                candidates.extend(sprites.sprites_at(x, y).iter().copied().map(Candidate::Sprite));
            }
        }
        for window in &col.windows {
            candidates.push(Candidate::Window {
                column: column as u32,
                slice: WindowSlice::from_hit(window, pose.plane_y_initial),
            });
        }

        let Some(hit) = col.hit else {
            *slot = f32::INFINITY;
            spans.push(None);
            continue;
        };

        let distance = hit.t * pose.plane_y_initial;
        *slot = distance;

        let texture = match hit.surface {
            HitSurface::Wall => textures.wall,
            HitSurface::Door => textures.door,
        };
        let (top, bottom) = vertical_extent(pose, distance, width, height);
        let tex_x = ((hit.tex_u * texture.width() as f32) as i32).min(texture.width() as i32 - 1);
        spans.push(Some(Span {
            top,
            bottom,
            texture,
            tex_x,
            factor: wall_factor(distance, hit.side, params.light_range),
        }));
    }

    for_each_row(pixels, parallel, |y, row| {
        let yf = y as f32;
        for (px, span) in row.chunks_exact_mut(4).zip(spans.iter()) {
            let Some(span) = span else { continue };
            if yf < span.top || yf >= span.bottom {
                continue;
            }
            let v = (yf - span.top) / (span.bottom - span.top);
            let ty = (v * span.texture.height() as f32) as i32;
            let c = shade(span.texture.texel(span.tex_x, ty), span.factor);
            px.copy_from_slice(&[c[0], c[1], c[2], 255]);
        }
    });

    Ok(candidates.len() - before)
}
