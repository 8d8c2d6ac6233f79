use crate::buffer::PixelsMut;
use crate::error::KernelError;
use crate::player::Pose;
use crate::texture::Texture;

use super::software::for_each_row;
use super::walls::vertical_extent;
use super::{Billboard, PassParams, check_depth, shade};

/// Sprites never fade below this brightness.
const MIN_BRIGHTNESS: f32 = 0.2;

/// A billboard resolved to screen space.
struct Projected<'t> {
    left: i32,
    /// Exclusive.
    right: i32,
    top: f32,
    bottom: f32,
    depth: f32,
    texture: &'t Texture,
    /// Texture column at `left` and its advance per screen pixel.
    tex_x0: f32,
    tex_dx: f32,
    brightness: f32,
}

pub(super) fn brightness(depth: f32, params: &PassParams) -> f32 {
    let fog = depth / params.light_range - params.light;
    ((100.0 - fog * 100.0).floor() / 100.0).clamp(MIN_BRIGHTNESS, 1.0)
}

/// Camera-space position of a world point: `(camera_x, depth)` where
/// `camera_x` is in -1..1 across the view and depth is in depth-buffer
/// units. `None` behind the camera.
pub(super) fn to_camera(pose: &Pose, x: f32, y: f32) -> Option<(f32, f32)> {
    let sx = x - pose.x;
    let sy = y - pose.y;
    let det = pose.plane_x * pose.dir_y - pose.dir_x * pose.plane_y;
    if det.abs() < f32::EPSILON {
        return None;
    }
    let across = pose.dir_y * sx - pose.dir_x * sy;
    let forward = -pose.plane_y * sx + pose.plane_x * sy;
    let distance = forward / det;
    if distance <= 0.0 {
        return None;
    }
    Some((across / forward, distance * pose.plane_y_initial))
}

fn project<'t>(
    pose: &Pose,
    billboard: &Billboard<'t>,
    params: &PassParams,
    width: usize,
    height: usize,
) -> Option<Projected<'t>> {
    match *billboard {
        Billboard::Sprite {
            x,
            y,
            height_scale,
            texture,
        } => {
            let (camera_x, depth) = to_camera(pose, x, y)?;
            let screen_x = width as f32 / 2.0 * (1.0 + camera_x);

            // stands on the floor line of a full-height wall at the same depth
            let (_, bottom) = vertical_extent(pose, depth, width, height);
            let sprite_height = (width as f32 / 2.0 / depth) * height_scale;
            let top = bottom - sprite_height;

            let aspect = texture.width() as f32 / texture.height() as f32;
            let sprite_width = sprite_height * aspect;
            if sprite_width < 1.0 {
                return None;
            }
            let start = screen_x - sprite_width / 2.0;
            let left = start.max(0.0) as i32;
            let right = (screen_x + sprite_width / 2.0).min(width as f32) as i32;
            let tex_dx = texture.width() as f32 / sprite_width;

            Some(Projected {
                left,
                right,
                top,
                bottom,
                depth,
                texture,
                tex_x0: (left as f32 - start) * tex_dx,
                tex_dx,
                brightness: brightness(depth, params),
            })
        }
        Billboard::Window {
            column,
            slice,
            texture,
        } => {
            let (top, bottom) = vertical_extent(pose, slice.depth, width, height);
            Some(Projected {
                left: column as i32,
                right: column as i32 + 1,
                top,
                bottom,
                depth: slice.depth,
                texture,
                tex_x0: slice.tex_u * texture.width() as f32,
                tex_dx: 0.0,
                brightness: brightness(slice.depth, params),
            })
        }
    }
}

pub(super) fn draw(
    pose: &Pose,
    billboards: &[Billboard<'_>],
    params: &PassParams,
    pixels: &mut PixelsMut<'_>,
    depth: &[f32],
    parallel: bool,
) -> Result<(), KernelError> {
    let width = pixels.width();
    let height = pixels.height();
    check_depth(depth, width)?;

    let projected: Vec<Projected<'_>> = billboards
        .iter()
        .filter_map(|b| project(pose, b, params, width, height))
        .filter(|p| p.left < p.right && p.bottom > 0.0 && p.top < height as f32)
        .collect();
    if projected.is_empty() {
        return Ok(());
    }

    // rows are independent and each row keeps the billboard order
    for_each_row(pixels, parallel, |y, row| {
        let yf = y as f32;
        for p in &projected {
            if yf < p.top || yf >= p.bottom {
                continue;
            }
            let v = (yf - p.top) / (p.bottom - p.top);
            let ty = (v * p.texture.height() as f32) as i32;
            for x in p.left.max(0)..p.right.min(width as i32) {
                let column = x as usize;
                if p.depth >= depth[column] {
                    continue;
                }
                let tx = (p.tex_x0 + (x - p.left) as f32 * p.tex_dx) as i32;
                let texel = p.texture.texel(tx, ty);
                if texel[3] == 0 {
                    continue;
                }
                let c = shade(texel, p.brightness);
                let px = &mut row[column * 4..column * 4 + 4];
                let a = c[3] as u32;
                let inv = 255 - a;
                for ch in 0..3 {
                    px[ch] = ((c[ch] as u32 * a + px[ch] as u32 * inv) / 255) as u8;
                }
                px[3] = 255;
            }
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{DepthBuffer, PixelBuffer};
    use crate::kernel::WindowSlice;

    /// Bright enough that nothing is fogged.
    fn params() -> PassParams {
        PassParams {
            range: 40,
            light_range: 1.0e6,
            light: 1.0,
        }
    }

    fn pose() -> Pose {
        Pose::new(4.5, 4.5, [0.0, -1.0], [-0.66, 0.0])
    }

    #[test]
    fn camera_space_matches_column_rays() {
        let p = pose();
        // two cells straight ahead
        let (cx, depth) = to_camera(&p, 4.5, 2.5).unwrap();
        assert!(cx.abs() < 1e-6);
        assert!((depth - 2.0 * 0.66).abs() < 1e-5);
        // on the ray of camera_x = 0.5
        let (cx, _) = to_camera(&p, 4.5 - 0.66 * 0.5 * 2.0, 2.5).unwrap();
        assert!((cx - 0.5).abs() < 1e-5);
        assert!(to_camera(&p, 4.5, 6.5).is_none());
    }

    #[test]
    fn brightness_is_clamped() {
        let p = PassParams {
            range: 40,
            light_range: 10.0,
            light: 0.0,
        };
        assert_eq!(brightness(0.0, &p), 1.0);
        assert!((brightness(5.0, &p) - 0.5).abs() < 1e-6);
        assert_eq!(brightness(50.0, &p), 0.2);
        let lit = PassParams { light: 3.0, ..p };
        assert_eq!(brightness(5.0, &lit), 1.0);
    }

    #[test]
    fn sprite_is_hidden_behind_nearer_wall() {
        let texture = Texture::solid(4, 4, [250, 0, 0, 255]);
        let billboards = [Billboard::Sprite {
            x: 4.5,
            y: 2.5,
            height_scale: 1.0,
            texture: &texture,
        }];
        let mut buf = PixelBuffer::new(16, 12);

        let mut depth = DepthBuffer::new(16);
        depth.as_mut_slice().fill(0.5);
        draw(&pose(), &billboards, &params(), &mut buf.view_mut(), depth.as_slice(), false).unwrap();
        assert_eq!(buf.pixel(8, 6), Some([0, 0, 0, 0]));

        depth.as_mut_slice().fill(f32::INFINITY);
        draw(&pose(), &billboards, &params(), &mut buf.view_mut(), depth.as_slice(), true).unwrap();
        assert_eq!(buf.pixel(8, 6), Some([250, 0, 0, 255]));
    }

    #[test]
    fn transparent_texels_are_skipped() {
        let texture = Texture::solid(4, 4, [250, 250, 250, 0]);
        let billboards = [Billboard::Sprite {
            x: 4.5,
            y: 2.5,
            height_scale: 1.0,
            texture: &texture,
        }];
        let mut buf = PixelBuffer::new(16, 12);
        buf.view_mut().put(8, 6, [1, 2, 3, 255]);
        let depth = DepthBuffer::new(16);
        draw(&pose(), &billboards, &params(), &mut buf.view_mut(), depth.as_slice(), false).unwrap();
        assert_eq!(buf.pixel(8, 6), Some([1, 2, 3, 255]));
    }

    #[test]
    fn later_billboards_draw_over_earlier_ones() {
        let far = Texture::solid(4, 4, [0, 0, 200, 255]);
        let near = Texture::solid(4, 4, [0, 200, 0, 255]);
        let billboards = [
            Billboard::Sprite {
                x: 4.5,
                y: 1.5,
                height_scale: 1.0,
                texture: &far,
            },
            Billboard::Sprite {
                x: 4.5,
                y: 2.5,
                height_scale: 1.0,
                texture: &near,
            },
        ];
        let mut buf = PixelBuffer::new(16, 12);
        let depth = DepthBuffer::new(16);
        draw(&pose(), &billboards, &params(), &mut buf.view_mut(), depth.as_slice(), true).unwrap();
        assert_eq!(buf.pixel(8, 6), Some([0, 200, 0, 255]));
    }

    #[test]
    fn window_slice_blends_in_its_column_only() {
        let glass = Texture::solid(2, 2, [200, 200, 200, 128]);
        let billboards = [Billboard::Window {
            column: 3,
            slice: WindowSlice {
                depth: 1.0,
                tex_u: 0.5,
                x: 4.0,
                y: 3.0,
            },
            texture: &glass,
        }];
        let mut buf = PixelBuffer::new(8, 6);
        let depth = DepthBuffer::new(8);
        draw(&pose(), &billboards, &params(), &mut buf.view_mut(), depth.as_slice(), false).unwrap();
        assert_eq!(buf.pixel(3, 3), Some([100, 100, 100, 255]));
        assert_eq!(buf.pixel(2, 3), Some([0, 0, 0, 0]));
        assert_eq!(buf.pixel(4, 3), Some([0, 0, 0, 0]));
    }
}
