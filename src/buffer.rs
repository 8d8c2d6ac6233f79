//! Frame memory owned by the camera and lent to the kernel one call at a time.

/// Fixed-size RGBA8 pixel region. Allocated once, never resized.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    data: Box<[u8]>,
}

impl PixelBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height * 4].into_boxed_slice(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width * 4
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Borrow the whole region for one kernel call.
    pub fn view_mut(&mut self) -> PixelsMut<'_> {
        PixelsMut {
            width: self.width,
            height: self.height,
            data: &mut self.data,
        }
    }
}

/// Mutable borrowed view over a [`PixelBuffer`].
#[derive(Debug)]
pub struct PixelsMut<'a> {
    width: usize,
    height: usize,
    data: &'a mut [u8],
}

impl<'a> PixelsMut<'a> {
    /// View over caller-owned bytes; `None` when the length does not match.
    pub fn from_slice(width: usize, height: usize, data: &'a mut [u8]) -> Option<Self> {
        (data.len() == width * height * 4).then_some(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.width * 4
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut *self.data
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    #[inline(always)]
    pub fn put(&mut self, x: i32, y: i32, rgba: [u8; 4]) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let i = (y as usize * self.width + x as usize) * 4;
        self.data[i..i + 4].copy_from_slice(&rgba);
    }

    /// Alpha-blend `rgba` over the existing pixel.
    #[inline(always)]
    pub fn blend(&mut self, x: i32, y: i32, rgba: [u8; 4]) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let i = (y as usize * self.width + x as usize) * 4;
        let a = rgba[3] as u32;
        let inv = 255 - a;
        for c in 0..3 {
            let dst = self.data[i + c] as u32;
            self.data[i + c] = ((rgba[c] as u32 * a + dst * inv) / 255) as u8;
        }
        self.data[i + 3] = 255;
    }
}

/// Nearest wall distance per screen column.
#[derive(Debug, Clone)]
pub struct DepthBuffer {
    data: Box<[f32]>,
}

impl DepthBuffer {
    pub fn new(columns: usize) -> Self {
        Self {
            data: vec![f32::INFINITY; columns].into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }
}
