//! Bit-packed world grid.
//!
//! Every cell is a `u64`. The low 16 bits are material and geometry flags,
//! the upper 48 bits hold up to three thin segments of four nibbles each.
//!
//! ```text
//! bit  0   wall             bit  5   door (primary segment)
//! bit  1   floor            bit  6   primary segment axis (1 = north/south)
//! bit  2   ceiling          bit  7   second segment axis
//! bit  3   road             bit  8   window (primary segment)
//! bit  4   thin             bit  9   third segment axis
//! bit 15   out-of-bounds boundary (only produced by `WorldGrid::get`)
//!
//! bits 16.. per segment: offset, thickness, extent, secondary offset
//! ```
//!
//! Segment nibbles are tenths of a cell; values above 10 wrap (`% 11`).

use crate::error::GridError;

const WALL: u64 = 1 << 0;
const FLOOR: u64 = 1 << 1;
const CEILING: u64 = 1 << 2;
const ROAD: u64 = 1 << 3;
const THIN: u64 = 1 << 4;
const DOOR: u64 = 1 << 5;
const WINDOW: u64 = 1 << 8;
const BOUNDARY: u64 = 1 << 15;

const AXIS_BITS: [u8; 3] = [6, 7, 9];
const SEGMENT_BASE: u8 = 16;
const SEGMENT_STRIDE: u8 = 16;

/// Ambient light lost per second.
pub const LIGHT_DECAY_PER_SECOND: f32 = 10.0;

#[inline(always)]
fn has_bit(value: u64, mask: u64) -> bool {
    value & mask != 0
}

#[inline(always)]
fn nibble(value: u64, start_bit: u8) -> u8 {
    ((value >> start_bit) & 0b1111) as u8
}

/// Which way a thin segment's plane faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Plane at constant x, seen from east or west.
    EastWest,
    /// Plane at constant y, seen from north or south.
    NorthSouth,
}

/// A sub-cell wall plane, all values in tenths of a cell.
///
/// `offset` is measured from the west (or north) edge along the facing axis,
/// `secondary_offset` and `extent` along the plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub axis: Axis,
    pub offset: u8,
    pub thickness: u8,
    pub extent: u8,
    pub secondary_offset: u8,
}

impl Segment {
    pub fn new(axis: Axis, offset: u8, thickness: u8, extent: u8, secondary_offset: u8) -> Self {
        Self {
            axis,
            offset,
            thickness,
            extent,
            secondary_offset,
        }
    }

    /// Full-length plane of thickness 0.1 at `offset` tenths.
    pub fn plane(axis: Axis, offset: u8) -> Self {
        Self {
            axis,
            offset,
            thickness: 1,
            extent: 10,
            secondary_offset: 0,
        }
    }

    pub fn offset_f32(&self) -> f32 {
        tenths(self.offset)
    }

    pub fn thickness_f32(&self) -> f32 {
        tenths(self.thickness)
    }

    pub fn extent_f32(&self) -> f32 {
        tenths(self.extent)
    }

    pub fn secondary_offset_f32(&self) -> f32 {
        tenths(self.secondary_offset)
    }

    pub(crate) fn validate(&self) -> Result<(), GridError> {
        for value in [
            self.offset,
            self.thickness,
            self.extent,
            self.secondary_offset,
        ] {
            if value > 10 {
                return Err(GridError::SegmentOutOfRange { value });
            }
        }
        Ok(())
    }
}

#[inline]
fn tenths(v: u8) -> f32 {
    (v % 11) as f32 / 10.0
}

/// Decoded view of a cell. Produced by [`Cell::decode`], inverted by
/// [`CellFields::encode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellFields {
    pub is_wall: bool,
    pub is_floor: bool,
    pub is_ceiling: bool,
    pub is_road: bool,
    pub is_thin: bool,
    pub is_door: bool,
    pub is_window: bool,
    pub is_boundary: bool,
    pub segments: [Option<Segment>; 3],
}

impl CellFields {
    /// Axis of the door, if the primary segment is a door.
    pub fn door_axis(&self) -> Option<Axis> {
        if !self.is_door {
            return None;
        }
        self.segments[0].map(|s| s.axis)
    }

    /// Both floor and ceiling present.
    pub fn is_interior(&self) -> bool {
        self.is_floor && self.is_ceiling
    }

    pub fn encode(&self) -> Cell {
        let mut v = 0u64;
        let flags = [
            (self.is_wall, WALL),
            (self.is_floor, FLOOR),
            (self.is_ceiling, CEILING),
            (self.is_road, ROAD),
            (self.is_thin, THIN),
            (self.is_door, DOOR),
            (self.is_window, WINDOW),
            (self.is_boundary, BOUNDARY),
        ];
        for (set, mask) in flags {
            if set {
                v |= mask;
            }
        }

        for (i, segment) in self.segments.iter().enumerate() {
            let Some(s) = segment else { continue };
            if s.axis == Axis::NorthSouth {
                v |= 1 << AXIS_BITS[i];
            }
            let base = SEGMENT_BASE + SEGMENT_STRIDE * i as u8;
            v |= (s.offset as u64 & 0xF) << base;
            v |= (s.thickness as u64 & 0xF) << (base + 4);
            v |= (s.extent as u64 & 0xF) << (base + 8);
            v |= (s.secondary_offset as u64 & 0xF) << (base + 12);
        }

        Cell(v)
    }
}

/// One packed grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Cell(pub u64);

impl Cell {
    pub const EMPTY: Cell = Cell(0);
    /// Returned for every query outside the grid. Solid.
    pub const OUT_OF_BOUNDS: Cell = Cell(WALL | BOUNDARY);

    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn is_wall(self) -> bool {
        has_bit(self.0, WALL)
    }

    pub fn is_floor(self) -> bool {
        has_bit(self.0, FLOOR)
    }

    pub fn is_ceiling(self) -> bool {
        has_bit(self.0, CEILING)
    }

    pub fn is_road(self) -> bool {
        has_bit(self.0, ROAD)
    }

    /// Flagged thin, or carrying a primary segment.
    pub fn is_thin(self) -> bool {
        has_bit(self.0, THIN) || self.segment(0).is_some()
    }

    pub fn is_door(self) -> bool {
        has_bit(self.0, DOOR)
    }

    pub fn is_window(self) -> bool {
        has_bit(self.0, WINDOW)
    }

    pub fn is_boundary(self) -> bool {
        has_bit(self.0, BOUNDARY)
    }

    /// Solid for the whole cell volume: a full wall or the world edge.
    pub fn is_blocking(self) -> bool {
        self.is_boundary() || (self.is_wall() && !self.is_thin())
    }

    /// Segment `index` (0..3), `None` when its extent nibble is zero.
    pub fn segment(self, index: usize) -> Option<Segment> {
        if index >= 3 {
            return None;
        }
        let base = SEGMENT_BASE + SEGMENT_STRIDE * index as u8;
        let extent = nibble(self.0, base + 8);
        if extent == 0 {
            return None;
        }
        let axis = if has_bit(self.0, 1 << AXIS_BITS[index]) {
            Axis::NorthSouth
        } else {
            Axis::EastWest
        };
        Some(Segment {
            axis,
            offset: nibble(self.0, base),
            thickness: nibble(self.0, base + 4),
            extent,
            secondary_offset: nibble(self.0, base + 12),
        })
    }

    pub fn decode(self) -> CellFields {
        CellFields {
            is_wall: self.is_wall(),
            is_floor: self.is_floor(),
            is_ceiling: self.is_ceiling(),
            is_road: self.is_road(),
            is_thin: has_bit(self.0, THIN),
            is_door: self.is_door(),
            is_window: self.is_window(),
            is_boundary: self.is_boundary(),
            segments: [self.segment(0), self.segment(1), self.segment(2)],
        }
    }
}

/// Square occupancy grid plus the scalar ambient light.
#[derive(Debug, Clone)]
pub struct WorldGrid {
    size: usize,
    cells: Vec<Cell>,
    light: f32,
}

impl WorldGrid {
    pub fn new(size: usize, cells: Vec<Cell>) -> Result<Self, GridError> {
        if size.checked_mul(size) != Some(cells.len()) {
            return Err(GridError::SizeMismatch {
                size,
                len: cells.len(),
            });
        }
        Ok(Self {
            size,
            cells,
            light: 0.0,
        })
    }

    /// Derive the size from a square cell list.
    pub fn from_cells(cells: Vec<Cell>) -> Result<Self, GridError> {
        let len = cells.len();
        let size = (len as f64).sqrt().round() as usize;
        if size * size != len {
            return Err(GridError::NotSquare { len });
        }
        Self::new(size, cells)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn light(&self) -> f32 {
        self.light
    }

    pub fn set_light(&mut self, light: f32) {
        self.light = light.max(0.0);
    }

    #[inline(always)]
    pub fn get(&self, x: i32, y: i32) -> Cell {
        let size = self.size as i32;
        if x < 0 || y < 0 || x >= size || y >= size {
            return Cell::OUT_OF_BOUNDS;
        }
        self.cells
            .get(y as usize * self.size + x as usize)
            .copied()
            .unwrap_or(Cell::OUT_OF_BOUNDS)
    }

    /// Cell containing a fractional world position.
    #[inline]
    pub fn get_at(&self, x: f32, y: f32) -> Cell {
        self.get(x.floor() as i32, y.floor() as i32)
    }

    /// Decay the ambient light toward zero.
    pub fn update(&mut self, dt: f32) {
        if self.light > 0.0 {
            self.light = (self.light - LIGHT_DECAY_PER_SECOND * dt).max(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn next(seed: &mut u64) -> u64 {
        *seed = seed.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = *seed;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    fn random_segment(seed: &mut u64) -> Option<Segment> {
        let r = next(seed);
        if r % 3 == 0 {
            return None;
        }
        Some(Segment {
            axis: if r & 4 == 0 {
                Axis::EastWest
            } else {
                Axis::NorthSouth
            },
            offset: ((r >> 8) % 11) as u8,
            thickness: ((r >> 16) % 11) as u8,
            extent: 1 + ((r >> 24) % 10) as u8,
            secondary_offset: ((r >> 32) % 11) as u8,
        })
    }

    #[test]
    fn decode_encode_round_trip() {
        let mut seed = 7;
        for _ in 0..2000 {
            let r = next(&mut seed);
            let fields = CellFields {
                is_wall: r & 1 != 0,
                is_floor: r & 2 != 0,
                is_ceiling: r & 4 != 0,
                is_road: r & 8 != 0,
                is_thin: r & 16 != 0,
                is_door: r & 32 != 0,
                is_window: r & 64 != 0,
                is_boundary: r & 128 != 0,
                segments: [
                    random_segment(&mut seed),
                    random_segment(&mut seed),
                    random_segment(&mut seed),
                ],
            };
            assert_eq!(fields.encode().decode(), fields);
        }
    }

    #[test]
    fn floor_and_ceiling_cell() {
        let fields = Cell(0x000006).decode();
        assert!(!fields.is_wall);
        assert!(fields.is_floor);
        assert!(fields.is_ceiling);
        assert!(fields.is_interior());
        assert!(!fields.is_road);
    }

    #[test]
    fn thin_north_wall_segment() {
        // thin wall with floor/ceiling, plane facing north, 0.1 thick, full length
        let cell = Cell(0x0A10_0057);
        let fields = cell.decode();
        assert!(fields.is_wall && fields.is_thin);
        assert_eq!(
            fields.segments[0],
            Some(Segment {
                axis: Axis::NorthSouth,
                offset: 0,
                thickness: 1,
                extent: 10,
                secondary_offset: 0,
            })
        );
        assert!(fields.segments[1].is_none());
        assert!(!cell.is_blocking());
    }

    #[test]
    fn door_axis_selector() {
        let east = CellFields {
            is_wall: true,
            is_thin: true,
            is_door: true,
            segments: [Some(Segment::plane(Axis::EastWest, 5)), None, None],
            ..Default::default()
        };
        assert_eq!(east.encode().decode().door_axis(), Some(Axis::EastWest));

        let north = CellFields {
            segments: [Some(Segment::plane(Axis::NorthSouth, 5)), None, None],
            ..east
        };
        assert_eq!(north.encode().decode().door_axis(), Some(Axis::NorthSouth));

        let plain = CellFields { is_door: false, ..north };
        assert_eq!(plain.door_axis(), None);
    }

    #[test]
    fn out_of_bounds_is_boundary_sentinel() {
        let grid = WorldGrid::new(3, vec![Cell(0x6); 9]).unwrap();
        for (x, y) in [(-1, 0), (0, -1), (3, 0), (0, 3), (i32::MIN, i32::MAX), (100, 100)] {
            let cell = grid.get(x, y);
            assert_eq!(cell, Cell::OUT_OF_BOUNDS);
            assert!(cell.is_blocking());
        }
        assert_eq!(grid.get(2, 2), Cell(0x6));
        assert_eq!(grid.get_at(-0.5, 1.5), Cell::OUT_OF_BOUNDS);
    }

    #[test]
    fn absurd_size_is_a_mismatch() {
        assert_eq!(
            WorldGrid::new(usize::MAX, vec![Cell::EMPTY; 4]).unwrap_err(),
            GridError::SizeMismatch {
                size: usize::MAX,
                len: 4
            }
        );
    }

    #[test]
    fn from_cells_rejects_non_square() {
        assert_eq!(
            WorldGrid::from_cells(vec![Cell::EMPTY; 8]).unwrap_err(),
            GridError::NotSquare { len: 8 }
        );
        assert_eq!(WorldGrid::from_cells(vec![Cell::EMPTY; 16]).unwrap().size(), 4);
    }

    #[test]
    fn light_decays_to_zero_and_stays() {
        let mut grid = WorldGrid::new(1, vec![Cell::EMPTY]).unwrap();
        grid.set_light(2.0);
        grid.update(0.05);
        assert!((grid.light() - 1.5).abs() < 1e-6);
        grid.update(1.0);
        assert_eq!(grid.light(), 0.0);
        grid.update(1.0);
        assert_eq!(grid.light(), 0.0);
    }

    #[test]
    fn light_decay_matches_formula() {
        let mut seed = 3;
        for _ in 0..500 {
            let light = (next(&mut seed) % 1000) as f32 / 100.0;
            let dt = (next(&mut seed) % 500) as f32 / 1000.0;
            let mut grid = WorldGrid::new(1, vec![Cell::EMPTY]).unwrap();
            grid.set_light(light);
            grid.update(dt);
            let expected = (light - 10.0 * dt).max(0.0);
            assert!((grid.light() - expected).abs() < 1e-5);
        }
    }
}
