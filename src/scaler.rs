//! Presentation-side scaling: RGBA frame in, window-sized `0RGB` words out.

use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::{ParallelSlice, ParallelSliceMut},
};

use crate::buffer::PixelBuffer;

const PACK_CHUNK: usize = 4096;

/// Precomputed mapping from destination pixels to source neighbors and
/// 8.8 fixed-point weights.
#[derive(Debug, Clone, Default)]
pub struct ScaleLut {
    dst: (usize, usize),
    src: (usize, usize),
    x0: Vec<usize>,
    x1: Vec<usize>,
    wx: Vec<u16>,
    y0: Vec<usize>,
    y1: Vec<usize>,
    wy: Vec<u16>,
}

/// Neighbor indices and weights along one axis.
fn axis_lut(dst: usize, src: usize) -> (Vec<usize>, Vec<usize>, Vec<u16>) {
    let scale = src as f32 / dst as f32;
    let last = src as isize - 1;
    let mut lo = Vec::with_capacity(dst);
    let mut hi = Vec::with_capacity(dst);
    let mut weight = Vec::with_capacity(dst);
    for i in 0..dst {
        let f = i as f32 * scale;
        let i0 = (f.floor() as isize).clamp(0, last);
        lo.push(i0 as usize);
        hi.push((i0 + 1).min(last) as usize);
        weight.push(((f - i0 as f32) * 256.0).round().clamp(0.0, 256.0) as u16);
    }
    (lo, hi, weight)
}

impl ScaleLut {
    pub fn new(dst_w: usize, dst_h: usize, src_w: usize, src_h: usize) -> Self {
        if dst_w == 0 || dst_h == 0 || src_w == 0 || src_h == 0 {
            return Self::default();
        }
        let (x0, x1, wx) = axis_lut(dst_w, src_w);
        let (y0, y1, wy) = axis_lut(dst_h, src_h);
        Self {
            dst: (dst_w, dst_h),
            src: (src_w, src_h),
            x0,
            x1,
            wx,
            y0,
            y1,
            wy,
        }
    }

    pub fn fits(&self, dst_w: usize, dst_h: usize, src_w: usize, src_h: usize) -> bool {
        self.dst == (dst_w, dst_h) && self.src == (src_w, src_h)
    }
}

#[inline]
fn lerp_color_u32(a: u32, b: u32, w256: u32) -> u32 {
    let inv = 256 - w256;
    // red and blue share one multiply (00RR00BB), green gets its own
    let rb = (((a & 0x00FF00FF) * inv + (b & 0x00FF00FF) * w256) >> 8) & 0x00FF00FF;
    let g = (((a & 0x0000FF00) * inv + (b & 0x0000FF00) * w256) >> 8) & 0x0000FF00;
    rb | g
}

/// RGBA8 bytes to `0RGB` words, alpha dropped.
pub fn pack_rgba(src: &[u8], dst: &mut Vec<u32>) {
    dst.resize(src.len() / 4, 0);
    dst.par_chunks_mut(PACK_CHUNK)
        .zip(src.par_chunks(PACK_CHUNK * 4))
        .for_each(|(out, bytes)| {
            for (o, p) in out.iter_mut().zip(bytes.chunks_exact(4)) {
                *o = (p[0] as u32) << 16 | (p[1] as u32) << 8 | p[2] as u32;
            }
        });
}

/// Bilinear stretch, one destination row per rayon task.
pub fn blit_bilinear_stretch(dst: &mut [u32], src: &[u32], lut: &ScaleLut) {
    let (dw, dh) = lut.dst;
    let (sw, sh) = lut.src;
    if dw == 0 || src.len() < sw * sh || dst.len() < dw * dh {
        return;
    }
    dst[..dw * dh]
        .par_chunks_mut(dw)
        .enumerate()
        .for_each(|(y, dst_row)| {
            let row0 = lut.y0[y] * sw;
            let row1 = lut.y1[y] * sw;
            let wy = lut.wy[y] as u32;

            for (x, out) in dst_row.iter_mut().enumerate() {
                let (x0, x1, wx) = (lut.x0[x], lut.x1[x], lut.wx[x] as u32);
                let top = lerp_color_u32(src[row0 + x0], src[row0 + x1], wx);
                let bottom = lerp_color_u32(src[row1 + x0], src[row1 + x1], wx);
                *out = lerp_color_u32(top, bottom, wy);
            }
        });
}

#[inline]
fn channels(c: u32) -> [i32; 3] {
    [
        ((c >> 16) & 0xFF) as i32,
        ((c >> 8) & 0xFF) as i32,
        (c & 0xFF) as i32,
    ]
}

/// Cross-shaped 3x3 sharpen. Border pixels are left as they are.
pub fn sharpen_cross(dst: &mut [u32], w: usize, h: usize) {
    if w < 3 || h < 3 || dst.len() < w * h {
        return;
    }
    let src = dst[..w * h].to_vec();

    dst[..w * h]
        .par_chunks_mut(w)
        .enumerate()
        .filter(|(y, _)| *y > 0 && *y < h - 1)
        .for_each(|(y, row)| {
            for x in 1..w - 1 {
                let c = channels(src[y * w + x]);
                let n = channels(src[(y - 1) * w + x]);
                let s = channels(src[(y + 1) * w + x]);
                let e = channels(src[y * w + x + 1]);
                let wv = channels(src[y * w + x - 1]);

                let mut out = 0u32;
                for ch in 0..3 {
                    let v = 5 * c[ch] - (n[ch] + s[ch] + e[ch] + wv[ch]);
                    out = out << 8 | v.clamp(0, 255) as u32;
                }
                row[x] = out;
            }
        });
}

/// Turns rendered frames into window pixels. Keeps the lookup table and the
/// packed copy of the frame between calls.
#[derive(Debug, Default)]
pub struct Scaler {
    lut: ScaleLut,
    packed: Vec<u32>,
    sharpen: bool,
}

impl Scaler {
    pub fn new(sharpen: bool) -> Self {
        Self {
            sharpen,
            ..Self::default()
        }
    }

    /// Stretch `frame` over a `dst_w` x `dst_h` surface.
    pub fn present(&mut self, frame: &PixelBuffer, dst: &mut [u32], dst_w: usize, dst_h: usize) {
        let (src_w, src_h) = (frame.width(), frame.height());
        if !self.lut.fits(dst_w, dst_h, src_w, src_h) {
            tracing::debug!(dst_w, dst_h, src_w, src_h, "rebuilding scale table");
            self.lut = ScaleLut::new(dst_w, dst_h, src_w, src_h);
        }

        pack_rgba(frame.as_bytes(), &mut self.packed);
        blit_bilinear_stretch(dst, &self.packed, &self.lut);
        if self.sharpen {
            sharpen_cross(dst, dst_w, dst_h);
        }
    }
}
