use thiserror::Error;

use crate::texture::{AngleBucket, TextureKey};

/// Errors raised while authoring or loading a world grid.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("grid of {len} cells is not square")]
    NotSquare { len: usize },

    #[error("grid size {size} does not match {len} cells")]
    SizeMismatch { size: usize, len: usize },

    #[error("cell ({x}, {y}) combines a full wall with a walkable material")]
    IncompatibleMaterials { x: usize, y: usize },

    #[error("segment value {value} out of range (0..=10 tenths)")]
    SegmentOutOfRange { value: u8 },

    #[error("cell ({x}, {y}) has more than three segments")]
    TooManySegments { x: usize, y: usize },

    #[error("cell ({x}, {y}) is a door or window without a segment")]
    MissingSegment { x: usize, y: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TextureError {
    #[error("texture {width}x{height} needs {expected} RGBA bytes, got {actual}")]
    InvalidSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("no texture registered for {key:?} at angle bucket {bucket}")]
    MissingVariant { key: TextureKey, bucket: AngleBucket },
}

/// A fault inside a kernel call. Fatal to the frame, never to the loop.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KernelError {
    #[error("{what} buffer holds {actual} elements, expected {expected}")]
    BufferMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("empty {what} texture")]
    EmptyTexture { what: &'static str },
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("kernel call failed: {0}")]
    Kernel(#[from] KernelError),

    #[error("presentation failed: {0}")]
    Present(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
