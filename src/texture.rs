//! Texture storage keyed by material or sprite kind and viewing angle, plus
//! the per-coordinate sprite placement index.

use std::collections::HashMap;
use std::fmt;

use crate::error::TextureError;

/// Raw RGBA8 image, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Texture {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, TextureError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(TextureError::InvalidSize {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Single-colour texture.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Pixel at texel coordinates, clamped to the image.
    #[inline(always)]
    pub fn texel(&self, tx: i32, ty: i32) -> [u8; 4] {
        let tx = tx.clamp(0, self.width as i32 - 1) as usize;
        let ty = ty.clamp(0, self.height as i32 - 1) as usize;
        let i = (ty * self.width as usize + tx) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }
}

/// Statically-known surfaces the renderer draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Material {
    Sky,
    Wall,
    Door,
    Window,
    Floor,
    Ceiling,
    Road,
}

impl Material {
    /// Textures that must be present before anything is drawn.
    pub const REQUIRED: [Material; 5] = [
        Material::Sky,
        Material::Floor,
        Material::Ceiling,
        Material::Wall,
        Material::Door,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteKind {
    TreeCone,
    Pillar,
    Bush,
    TreeVase,
    TreeColumnar,
    Lady,
    /// Data-driven content registered at runtime.
    Custom(u16),
}

impl SpriteKind {
    /// Number of baked viewing-angle variants.
    pub fn angle_variants(self) -> u8 {
        match self {
            SpriteKind::Lady => 8,
            SpriteKind::TreeCone
            | SpriteKind::Pillar
            | SpriteKind::Bush
            | SpriteKind::TreeVase
            | SpriteKind::TreeColumnar => 1,
            SpriteKind::Custom(_) => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKey {
    Material(Material),
    Sprite(SpriteKind),
    /// First-person weapon overlay.
    Weapon,
}

impl From<Material> for TextureKey {
    fn from(m: Material) -> Self {
        TextureKey::Material(m)
    }
}

impl From<SpriteKind> for TextureKey {
    fn from(k: SpriteKind) -> Self {
        TextureKey::Sprite(k)
    }
}

/// One of eight 45° viewing-angle bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct AngleBucket(u8);

impl AngleBucket {
    pub const FRONT: AngleBucket = AngleBucket(0);
    pub const COUNT: u8 = 8;

    pub fn new(index: u8) -> Self {
        Self(index % Self::COUNT)
    }

    pub fn index(self) -> u8 {
        self.0
    }
}

impl fmt::Display for AngleBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Round to the nearest 45° bin, 360° wrapping to 0.
pub fn angle_bucket(degrees: f32) -> AngleBucket {
    let wrapped = degrees.rem_euclid(360.0);
    let index = (wrapped / 45.0).round() as u8;
    AngleBucket::new(index)
}

/// Why a sprite texture lookup fell back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fallback {
    /// Requested angle missing, front view used.
    FrontVariant,
    /// Nothing registered for the kind at all.
    Missing,
}

/// Textures keyed by `(key, angle)`. Images are registered already decoded.
#[derive(Debug, Default)]
pub struct TextureIndex {
    textures: HashMap<(TextureKey, AngleBucket), Texture>,
}

impl TextureIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: impl Into<TextureKey>, bucket: AngleBucket, texture: Texture) {
        let key = key.into();
        tracing::debug!(
            ?key,
            %bucket,
            width = texture.width(),
            height = texture.height(),
            "registered texture"
        );
        self.textures.insert((key, bucket), texture);
    }

    pub fn lookup(
        &self,
        key: impl Into<TextureKey>,
        bucket: AngleBucket,
    ) -> Result<&Texture, TextureError> {
        let key = key.into();
        self.textures
            .get(&(key, bucket))
            .ok_or(TextureError::MissingVariant { key, bucket })
    }

    pub fn material(&self, material: Material) -> Option<&Texture> {
        self.textures
            .get(&(TextureKey::Material(material), AngleBucket::FRONT))
    }

    pub fn weapon(&self) -> Option<&Texture> {
        self.textures.get(&(TextureKey::Weapon, AngleBucket::FRONT))
    }

    /// Sprite texture for a viewing angle, falling back to the front view.
    ///
    /// Kinds with a single variant always use the front view without
    /// reporting a fallback.
    pub fn resolve_sprite(
        &self,
        kind: SpriteKind,
        bucket: AngleBucket,
    ) -> (Option<&Texture>, Option<Fallback>) {
        let bucket = if kind.angle_variants() == 1 {
            AngleBucket::FRONT
        } else {
            bucket
        };
        if let Ok(texture) = self.lookup(kind, bucket) {
            return (Some(texture), None);
        }
        match self.lookup(kind, AngleBucket::FRONT) {
            Ok(texture) => (Some(texture), Some(Fallback::FrontVariant)),
            Err(_) => (None, Some(Fallback::Missing)),
        }
    }

    /// All materials the pipeline cannot draw without are present.
    pub fn is_ready(&self) -> bool {
        Material::REQUIRED
            .iter()
            .all(|m| self.material(*m).is_some())
    }

    pub fn missing_required(&self) -> Vec<Material> {
        Material::REQUIRED
            .into_iter()
            .filter(|m| self.material(*m).is_none())
            .collect()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}

/// A billboard placed in the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteInstance {
    pub x: f32,
    pub y: f32,
    /// Facing in degrees, 0..360.
    pub facing: f32,
    /// Height as a multiple of one wall height.
    pub height_scale: f32,
    pub kind: SpriteKind,
}

impl SpriteInstance {
    pub fn new(x: f32, y: f32, facing: f32, height_scale: f32, kind: SpriteKind) -> Self {
        Self {
            x,
            y,
            facing,
            height_scale,
            kind,
        }
    }

    pub fn cell(&self) -> (i32, i32) {
        (self.x.floor() as i32, self.y.floor() as i32)
    }
}

/// Sprites bucketed by the cell they stand in. Built once per level.
#[derive(Debug, Default, Clone)]
pub struct SpriteIndex {
    cells: HashMap<(i32, i32), Vec<SpriteInstance>>,
    len: usize,
}

impl SpriteIndex {
    pub fn from_instances(instances: impl IntoIterator<Item = SpriteInstance>) -> Self {
        let mut cells: HashMap<(i32, i32), Vec<SpriteInstance>> = HashMap::new();
        let mut len = 0;
        for sprite in instances {
            cells.entry(sprite.cell()).or_default().push(sprite);
            len += 1;
        }
        tracing::debug!(sprites = len, cells = cells.len(), "sprite index built");
        Self { cells, len }
    }

    pub fn sprites_at(&self, x: i32, y: i32) -> &[SpriteInstance] {
        self.cells.get(&(x, y)).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_cell(&self, x: i32, y: i32) -> bool {
        self.cells.contains_key(&(x, y))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}
