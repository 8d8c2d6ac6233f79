//! Procedurally generated stand-ins for the demo's art, so the binary runs
//! without any image files.

use std::f32::consts::TAU;

use crate::error::TextureError;
use crate::texture::{AngleBucket, Material, SpriteKind, Texture, TextureIndex, TextureKey};

const CLEAR: [u8; 4] = [0, 0, 0, 0];

/// Cheap integer hash, stable across runs.
fn noise(x: u32, y: u32, seed: u32) -> u8 {
    let mut h = x
        .wrapping_mul(0x27d4_eb2d)
        ^ y.wrapping_mul(0x1656_67b1)
        ^ seed.wrapping_mul(0x9e37_79b9);
    h ^= h >> 15;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    (h & 0xFF) as u8
}

fn scale(rgb: [u8; 3], factor: f32) -> [u8; 4] {
    let c = |v: u8| (v as f32 * factor).clamp(0.0, 255.0) as u8;
    [c(rgb[0]), c(rgb[1]), c(rgb[2]), 255]
}

fn paint(width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 4]) -> Result<Texture, TextureError> {
    let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&f(x, y));
        }
    }
    Texture::new(width, height, pixels)
}

/// Dusk gradient over a mountain ridge. Wraps horizontally.
pub fn sky() -> Result<Texture, TextureError> {
    let (w, h) = (512u32, 128u32);
    paint(w, h, |x, y| {
        let u = x as f32 / w as f32;
        let ridge = h as f32
            * (0.72 - 0.08 * (u * TAU * 3.0).sin() - 0.05 * (u * TAU * 7.0 + 1.3).sin());
        let yf = y as f32;
        if yf > ridge {
            let shade = 0.6 + noise(x, y, 1) as f32 / 1200.0;
            return scale([92, 70, 64], shade);
        }
        let t = yf / h as f32;
        [
            (40.0 + 200.0 * t) as u8,
            (60.0 + 90.0 * t) as u8,
            (120.0 - 40.0 * t) as u8,
            255,
        ]
    })
}

/// Red brick with mortar joints.
pub fn brick_wall() -> Result<Texture, TextureError> {
    paint(64, 64, |x, y| {
        let row = y / 16;
        let shift = if row % 2 == 0 { 0 } else { 16 };
        if y % 16 == 0 || (x + shift) % 32 == 0 {
            return [150, 145, 135, 255];
        }
        let shade = 0.8 + noise(x / 2, y / 2, 2) as f32 / 1000.0;
        scale([150, 62, 44], shade)
    })
}

/// Vertical planks with a brass handle.
pub fn door() -> Result<Texture, TextureError> {
    paint(64, 64, |x, y| {
        if (48..52).contains(&x) && (30..36).contains(&y) {
            return [210, 170, 60, 255];
        }
        if x % 16 == 0 || y < 2 || y > 61 {
            return [50, 30, 18, 255];
        }
        let grain = 0.85 + ((y as f32 * 0.4 + x as f32).sin() * 0.08);
        scale([120, 78, 42], grain)
    })
}

/// Opaque frame around a translucent pane.
pub fn window() -> Result<Texture, TextureError> {
    paint(64, 64, |x, y| {
        let border = x < 4 || y < 4 || x > 59 || y > 59;
        let mullion = (30..34).contains(&x) || (30..34).contains(&y);
        if border || mullion {
            [235, 235, 225, 255]
        } else {
            [160, 200, 230, 96]
        }
    })
}

/// Tiled floor.
pub fn floor() -> Result<Texture, TextureError> {
    paint(32, 32, |x, y| {
        let light = ((x / 16) + (y / 16)) % 2 == 0;
        let base = if light { [176, 150, 110] } else { [120, 96, 70] };
        scale(base, 0.9 + noise(x, y, 3) as f32 / 2500.0)
    })
}

/// Plaster ceiling with panel seams.
pub fn ceiling() -> Result<Texture, TextureError> {
    paint(32, 32, |x, y| {
        if x % 32 == 0 || y % 32 == 0 {
            return [120, 120, 118, 255];
        }
        scale([200, 198, 190], 0.95 + noise(x, y, 4) as f32 / 5000.0)
    })
}

/// Loose gravel.
pub fn gravel() -> Result<Texture, TextureError> {
    paint(32, 32, |x, y| {
        let n = noise(x, y, 5) as f32 / 255.0;
        scale([128, 122, 112], 0.7 + n * 0.5)
    })
}

/// Transparent canvas with a shape drawn by `inside`.
fn cutout(
    width: u32,
    height: u32,
    inside: impl Fn(f32, f32) -> Option<[u8; 4]>,
) -> Result<Texture, TextureError> {
    paint(width, height, |x, y| {
        let u = (x as f32 + 0.5) / width as f32;
        let v = (y as f32 + 0.5) / height as f32;
        inside(u, v).unwrap_or(CLEAR)
    })
}

fn trunk(u: f32, v: f32, from: f32) -> Option<[u8; 4]> {
    ((u - 0.5).abs() < 0.06 && v >= from).then_some([90, 60, 35, 255])
}

pub fn sprite(kind: SpriteKind, bucket: AngleBucket) -> Result<Texture, TextureError> {
    match kind {
        SpriteKind::TreeCone => cutout(48, 64, |u, v| {
            let half = 0.45 * v / 0.85;
            if v < 0.85 && (u - 0.5).abs() < half {
                Some(scale([40, 120, 50], 0.8 + v * 0.3))
            } else {
                trunk(u, v, 0.85)
            }
        }),
        SpriteKind::TreeVase => cutout(56, 64, |u, v| {
            let (dx, dy) = ((u - 0.5) / 0.45, (v - 0.35) / 0.3);
            if dx * dx + dy * dy < 1.0 {
                Some(scale([70, 140, 60], 0.8 + dy.abs() * 0.2))
            } else {
                trunk(u, v, 0.6)
            }
        }),
        SpriteKind::TreeColumnar => cutout(24, 64, |u, v| {
            let (dx, dy) = ((u - 0.5) / 0.45, (v - 0.45) / 0.45);
            if dx * dx + dy * dy < 1.0 {
                Some(scale([30, 100, 45], 0.9 + dx.abs() * 0.2))
            } else {
                trunk(u, v, 0.88)
            }
        }),
        SpriteKind::Bush => cutout(48, 40, |u, v| {
            let (dx, dy) = ((u - 0.5) / 0.48, (v - 0.6) / 0.4);
            (dx * dx + dy * dy < 1.0).then(|| scale([60, 130, 50], 0.75 + (1.0 - v) * 0.4))
        }),
        SpriteKind::Pillar => cutout(40, 48, |u, v| {
            if (u - 0.5).abs() > 0.42 {
                return None;
            }
            let band = (v * 10.0) as u32 % 4 == 0;
            let rim = 1.0 - (u - 0.5).abs();
            Some(if band {
                scale([70, 70, 75], rim)
            } else {
                scale([140, 90, 50], rim)
            })
        }),
        SpriteKind::Lady | SpriteKind::Custom(_) => {
            // the face slides around the head as the viewing angle turns
            let angle = bucket.index() as f32 * TAU / AngleBucket::COUNT as f32;
            let (face_x, facing_us) = (0.5 + angle.sin() * 0.08, angle.cos() > -0.1);
            cutout(24, 48, move |u, v| {
                let head = {
                    let (dx, dy) = ((u - 0.5) / 0.18, (v - 0.12) / 0.09);
                    dx * dx + dy * dy < 1.0
                };
                if head {
                    let face = facing_us && (u - face_x).abs() < 0.1 && v > 0.1;
                    return Some(if face { [230, 190, 160, 255] } else { [70, 40, 25, 255] });
                }
                let dress = v > 0.22 && (u - 0.5).abs() < 0.12 + (v - 0.22) * 0.35;
                dress.then(|| scale([160, 40, 90], 1.1 - v * 0.4))
            })
        }
    }
}

/// First-person weapon, barrel pointing up and left.
pub fn weapon() -> Result<Texture, TextureError> {
    cutout(96, 64, |u, v| {
        let barrel = (v - (1.0 - u) * 0.9).abs() < 0.12 && u > 0.25;
        let grip = u > 0.65 && v > 0.55 && (u - 0.75).abs() < 0.1;
        if barrel {
            Some(scale([80, 80, 90], 1.2 - v * 0.5))
        } else if grip {
            Some([60, 40, 30, 255])
        } else {
            None
        }
    })
}

/// Every texture the demo level uses.
pub fn demo_textures() -> Result<TextureIndex, TextureError> {
    let mut index = TextureIndex::new();
    let front = AngleBucket::FRONT;

    index.register(Material::Sky, front, sky()?);
    index.register(Material::Wall, front, brick_wall()?);
    index.register(Material::Door, front, door()?);
    index.register(Material::Window, front, window()?);
    index.register(Material::Floor, front, floor()?);
    index.register(Material::Ceiling, front, ceiling()?);
    index.register(Material::Road, front, gravel()?);
    index.register(TextureKey::Weapon, front, weapon()?);

    for kind in [
        SpriteKind::TreeCone,
        SpriteKind::Pillar,
        SpriteKind::Bush,
        SpriteKind::TreeVase,
        SpriteKind::TreeColumnar,
        SpriteKind::Lady,
    ] {
        for i in 0..kind.angle_variants() {
            let bucket = AngleBucket::new(i);
            index.register(kind, bucket, sprite(kind, bucket)?);
        }
    }

    tracing::info!(textures = index.texture_count(), "procedural textures ready");
    Ok(index)
}
