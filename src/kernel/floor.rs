use crate::buffer::PixelsMut;
use crate::error::KernelError;
use crate::player::Pose;
use crate::world::WorldGrid;

use super::software::for_each_row;
use super::{FloorTextures, PassParams, shade};

/// Rows at or past this fog level stop darkening.
const MAX_FOG: f32 = 0.8;

pub(super) fn draw(
    pose: &Pose,
    grid: &WorldGrid,
    textures: &FloorTextures<'_>,
    params: &PassParams,
    pixels: &mut PixelsMut<'_>,
    parallel: bool,
) -> Result<(), KernelError> {
    let width = pixels.width();
    let height = pixels.height();
    if width == 0 || height == 0 {
        return Ok(());
    }

    // leftmost and rightmost ray
    let ray_x0 = pose.dir_x - pose.plane_x;
    let ray_y0 = pose.dir_y - pose.plane_y;
    let ray_dx = 2.0 * pose.plane_x;
    let ray_dy = 2.0 * pose.plane_y;

    let half_height = height as f32 / 2.0;
    let horizon = half_height + pose.pitch;
    let distance_divider = 2.0 * (height as f32 / width as f32) * pose.plane_y_initial;
    let road = textures.road.unwrap_or(textures.floor);

    for_each_row(pixels, parallel, |y, row| {
        let is_floor = y as f32 > horizon;
        let p = if is_floor {
            y as f32 - horizon
        } else {
            horizon - y as f32
        };
        if p <= 0.0 {
            return;
        }
        let cam_z = if is_floor {
            half_height + pose.z
        } else {
            half_height - pose.z
        };

        let row_distance = cam_z / (p * distance_divider);
        let fog = (row_distance / params.light_range - params.light).min(MAX_FOG);
        let factor = 1.0 - fog;

        let step_x = row_distance * ray_dx / width as f32;
        let step_y = row_distance * ray_dy / width as f32;
        let start_x = pose.x + row_distance * ray_x0;
        let start_y = pose.y + row_distance * ray_y0;

        for (x, px) in row.chunks_exact_mut(4).take(width).enumerate() {
            let floor_x = start_x + step_x * x as f32;
            let floor_y = start_y + step_y * x as f32;
            if floor_x < 0.0 || floor_y < 0.0 {
                continue;
            }

            let cell = grid.get(floor_x as i32, floor_y as i32);
            let texture = if is_floor {
                if cell.is_road() {
                    road
                } else if cell.is_floor() {
                    textures.floor
                } else {
                    continue;
                }
            } else if cell.is_ceiling() {
                textures.ceiling
            } else {
                // roads are open to the sky
                continue;
            };

            let tx = (texture.width() as f32 * floor_x.fract()) as i32;
            let ty = (texture.height() as f32 * floor_y.fract()) as i32;
            let c = shade(texture.texel(tx, ty), factor);
            px.copy_from_slice(&[c[0], c[1], c[2], 255]);
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::PixelBuffer;
    use crate::texture::Texture;
    use crate::world::Cell;

    const SENTINEL: [u8; 4] = [1, 2, 3, 4];

    fn params() -> PassParams {
        PassParams {
            range: 40,
            light_range: 1.0e6,
            light: 0.0,
        }
    }

    fn render(grid: &WorldGrid, textures: &FloorTextures<'_>) -> PixelBuffer {
        let mut buf = PixelBuffer::new(16, 12);
        {
            let mut view = buf.view_mut();
            for y in 0..12 {
                for x in 0..16 {
                    view.put(x, y, SENTINEL);
                }
            }
            let pose = Pose::new(4.5, 4.5, [0.0, -1.0], [-0.66, 0.0]);
            draw(&pose, grid, textures, &params(), &mut view, false).unwrap();
        }
        buf
    }

    #[test]
    fn interior_gets_floor_and_ceiling() {
        let grid = WorldGrid::new(9, vec![Cell(0x6); 81]).unwrap();
        let floor = Texture::solid(4, 4, [0, 200, 0, 255]);
        let ceiling = Texture::solid(4, 4, [0, 0, 200, 255]);
        let textures = FloorTextures {
            floor: &floor,
            ceiling: &ceiling,
            road: None,
        };
        let buf = render(&grid, &textures);
        assert_eq!(buf.pixel(8, 11), Some([0, 200, 0, 255]));
        assert_eq!(buf.pixel(8, 0), Some([0, 0, 200, 255]));
    }

    #[test]
    fn road_has_no_ceiling_and_falls_back_to_floor() {
        let grid = WorldGrid::new(9, vec![Cell(0x8); 81]).unwrap();
        let floor = Texture::solid(4, 4, [0, 200, 0, 255]);
        let ceiling = Texture::solid(4, 4, [0, 0, 200, 255]);
        let textures = FloorTextures {
            floor: &floor,
            ceiling: &ceiling,
            road: None,
        };
        let buf = render(&grid, &textures);
        assert_eq!(buf.pixel(8, 11), Some([0, 200, 0, 255]));
        assert_eq!(buf.pixel(8, 0), Some(SENTINEL));
    }

    #[test]
    fn fog_darkens_far_rows() {
        let grid = WorldGrid::new(32, vec![Cell(0x6); 32 * 32]).unwrap();
        let floor = Texture::solid(4, 4, [200, 200, 200, 255]);
        let textures = FloorTextures {
            floor: &floor,
            ceiling: &floor,
            road: None,
        };
        let mut buf = PixelBuffer::new(16, 12);
        let pose = Pose::new(16.5, 16.5, [0.0, -1.0], [-0.66, 0.0]);
        let params = PassParams {
            range: 40,
            light_range: 2.0,
            light: 0.0,
        };
        draw(&pose, &grid, &textures, &params, &mut buf.view_mut(), true).unwrap();
        let near = buf.pixel(8, 11).unwrap()[0];
        let far = buf.pixel(8, 7).unwrap()[0];
        assert!(far < near);
        // clamped at the strongest fog
        assert!(far >= 39);
    }
}
