//! Frame assembly: owns the frame memory and runs the passes in order.

use std::collections::HashSet;

use crate::buffer::{DepthBuffer, PixelBuffer};
use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::kernel::{
    Background, Billboard, Candidate, FloorTextures, Kernel, Overlay, PassParams, WallTextures,
};
use crate::player::Pose;
use crate::texture::{
    AngleBucket, Fallback, Material, SpriteIndex, SpriteInstance, SpriteKind, TextureIndex,
    angle_bucket,
};
use crate::world::WorldGrid;

/// Where finished frames go.
pub trait Display {
    fn present(&mut self, frame: &PixelBuffer) -> Result<(), RenderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Required textures are missing; the previous frame is untouched.
    NotReady,
    Rendered {
        /// Sprites and window slices found by the wall pass.
        candidates: usize,
        /// Billboards actually handed to the sprite pass.
        billboards: usize,
    },
}

/// Viewing-angle bucket of a sprite as seen from `pose`.
pub fn sprite_bucket(pose: &Pose, sprite: &SpriteInstance) -> AngleBucket {
    let dx = pose.x - sprite.x;
    let dy = pose.y - sprite.y;
    angle_bucket(dx.atan2(dy).to_degrees() + 180.0 + sprite.facing)
}

/// Weapon placement for a stride count.
pub fn weapon_overlay(width: usize, height: usize, paces: f32) -> Overlay {
    let scale = (width + height) as f32 / 1200.0;
    let bob_x = (paces * 2.0).cos() * scale * 6.0;
    let bob_y = (paces * 4.0).sin() * scale * 6.0;
    Overlay {
        left: width as f32 * 0.66 + bob_x,
        top: height as f32 * 0.6 + bob_y,
        scale,
    }
}

pub struct Camera {
    pixels: PixelBuffer,
    depth: DepthBuffer,
    candidates: Vec<Candidate>,
    background: Option<Background>,
    range: u32,
    light_range: f32,
    reported_misses: HashSet<(SpriteKind, AngleBucket)>,
}

impl Camera {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            pixels: PixelBuffer::new(config.width, config.height),
            depth: DepthBuffer::new(config.width),
            candidates: Vec::new(),
            background: None,
            range: config.range,
            light_range: config.light_range,
            reported_misses: HashSet::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.pixels.width()
    }

    pub fn height(&self) -> usize {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    pub fn depth(&self) -> &DepthBuffer {
        &self.depth
    }

    /// Distinct sprite texture misses seen so far.
    pub fn reported_misses(&self) -> usize {
        self.reported_misses.len()
    }

    /// Render one frame into the owned buffer.
    pub fn render<K: Kernel + ?Sized>(
        &mut self,
        pose: &Pose,
        grid: &WorldGrid,
        textures: &TextureIndex,
        sprites: &SpriteIndex,
        kernel: &K,
        paces: f32,
    ) -> Result<FrameOutcome, RenderError> {
        let (Some(sky), Some(floor), Some(ceiling), Some(wall), Some(door)) = (
            textures.material(Material::Sky),
            textures.material(Material::Floor),
            textures.material(Material::Ceiling),
            textures.material(Material::Wall),
            textures.material(Material::Door),
        ) else {
            tracing::debug!(missing = ?textures.missing_required(), "textures not ready");
            return Ok(FrameOutcome::NotReady);
        };

        let height = self.pixels.height();
        let background = match self.background.take() {
            Some(bg) if bg.height() == height => bg,
            _ => Background::new(sky, height),
        };

        let params = PassParams {
            range: self.range,
            light_range: self.light_range,
            light: grid.light(),
        };

        let mut view = self.pixels.view_mut();
        let passes = kernel
            .draw_background(pose, &background, params.light, &mut view)
            .and_then(|()| {
                kernel.draw_floor_ceiling(
                    pose,
                    grid,
                    &FloorTextures {
                        floor,
                        ceiling,
                        road: textures.material(Material::Road),
                    },
                    &params,
                    &mut view,
                )
            });
        self.background = Some(background);
        passes?;

        self.candidates.clear();
        let found = kernel.draw_walls(
            pose,
            grid,
            sprites,
            &WallTextures { wall, door },
            &params,
            &mut view,
            self.depth.as_mut_slice(),
            &mut self.candidates,
        )?;

        let window = textures.material(Material::Window);
        let mut billboards = Vec::with_capacity(self.candidates.len());
        for candidate in &self.candidates {
            match *candidate {
                Candidate::Sprite(sprite) => {
                    let bucket = sprite_bucket(pose, &sprite);
                    let (texture, fallback) = textures.resolve_sprite(sprite.kind, bucket);
                    let first_miss =
                        fallback.is_some() && self.reported_misses.insert((sprite.kind, bucket));
                    if let (true, Some(fallback)) = (first_miss, fallback) {
                        match fallback {
                            Fallback::FrontVariant => tracing::warn!(
                                kind = ?sprite.kind,
                                %bucket,
                                "sprite angle missing, using front view"
                            ),
                            Fallback::Missing => tracing::warn!(
                                kind = ?sprite.kind,
                                "no texture for sprite kind, skipping"
                            ),
                        }
                    }
                    if let Some(texture) = texture {
                        billboards.push(Billboard::Sprite {
                            x: sprite.x,
                            y: sprite.y,
                            height_scale: sprite.height_scale,
                            texture,
                        });
                    }
                }
                Candidate::Window { column, slice } => {
                    if let Some(texture) = window {
                        billboards.push(Billboard::Window {
                            column,
                            slice,
                            texture,
                        });
                    }
                }
            }
        }

        // far to near
        billboards.sort_by(|a, b| {
            let (ax, ay) = a.position();
            let (bx, by) = b.position();
            let da = (pose.x - ax).powi(2) + (pose.y - ay).powi(2);
            let db = (pose.x - bx).powi(2) + (pose.y - by).powi(2);
            db.total_cmp(&da)
        });

        kernel.draw_sprites(pose, &billboards, &params, &mut view, self.depth.as_slice())?;

        if let Some(weapon) = textures.weapon() {
            let overlay = weapon_overlay(view.width(), view.height(), paces);
            kernel.draw_overlay(weapon, overlay, &mut view)?;
        }

        Ok(FrameOutcome::Rendered {
            candidates: found,
            billboards: billboards.len(),
        })
    }

    /// Hand the whole frame to the display in one call.
    pub fn present(&self, display: &mut dyn Display) -> Result<(), RenderError> {
        display.present(&self.pixels)
    }
}
