//! Level authoring: a checked builder for cells and the bundled demo level.

use crate::error::GridError;
use crate::player::Pose;
use crate::texture::{SpriteInstance, SpriteKind};
use crate::world::{Axis, Cell, CellFields, Segment, WorldGrid};

pub const DEMO_SIZE: usize = 13;

/// Builds one cell and rejects combinations the renderer cannot draw.
#[derive(Debug, Clone, Default)]
pub struct CellBuilder {
    fields: CellFields,
    segments: Vec<Segment>,
}

impl CellBuilder {
    /// Nothing: no floor, no ceiling, no wall.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Floor and ceiling.
    pub fn room() -> Self {
        let mut builder = Self::default();
        builder.fields.is_floor = true;
        builder.fields.is_ceiling = true;
        builder
    }

    /// Open-air road surface.
    pub fn road() -> Self {
        let mut builder = Self::default();
        builder.fields.is_road = true;
        builder
    }

    /// Full-cell solid wall.
    pub fn wall() -> Self {
        let mut builder = Self::default();
        builder.fields.is_wall = true;
        builder
    }

    /// Add a thin wall segment. The first one added is the primary.
    pub fn thin(mut self, segment: Segment) -> Self {
        self.fields.is_wall = true;
        self.fields.is_thin = true;
        self.segments.push(segment);
        self
    }

    /// The primary segment is a door.
    pub fn door(mut self) -> Self {
        self.fields.is_door = true;
        self
    }

    /// The primary segment is a see-through window.
    pub fn window(mut self) -> Self {
        self.fields.is_window = true;
        self
    }

    /// Finish the cell at `(x, y)`; the position is only used in errors.
    pub fn build(self, x: usize, y: usize) -> Result<Cell, GridError> {
        let Self {
            mut fields,
            segments,
        } = self;

        if segments.len() > fields.segments.len() {
            return Err(GridError::TooManySegments { x, y });
        }
        for segment in &segments {
            segment.validate()?;
        }
        if fields.is_wall && !fields.is_thin && (fields.is_floor || fields.is_road) {
            return Err(GridError::IncompatibleMaterials { x, y });
        }
        if (fields.is_door || fields.is_window) && segments.is_empty() {
            return Err(GridError::MissingSegment { x, y });
        }

        for (slot, segment) in fields.segments.iter_mut().zip(segments) {
            *slot = Some(segment);
        }
        Ok(fields.encode())
    }
}

/// The bundled 13x13 level: a walled house with inner rooms, doors and two
/// front windows, surrounded by road.
pub fn demo_level() -> Result<WorldGrid, GridError> {
    use Axis::{EastWest as EW, NorthSouth as NS};

    let n = DEMO_SIZE;
    let mut plan: Vec<CellBuilder> = (0..n * n)
        .map(|i| {
            if i / n == n - 1 && i % n > 0 {
                CellBuilder::empty()
            } else {
                CellBuilder::road()
            }
        })
        .collect();

    // house interior
    for y in 2..=9 {
        for x in 2..=11 {
            plan[y * n + x] = CellBuilder::room();
        }
    }
    for x in 8..=11 {
        plan[4 * n + x] = CellBuilder::wall();
    }
    for y in 5..=6 {
        plan[y * n + 8] = CellBuilder::wall();
    }
    for x in 9..=10 {
        plan[5 * n + x] = CellBuilder::road();
        plan[6 * n + x] = CellBuilder::road();
        plan[7 * n + x] = CellBuilder::wall();
    }
    plan[5 * n + 11] = CellBuilder::road();
    plan[7 * n + 8] = CellBuilder::wall();

    let plane = Segment::plane;
    let cells = [
        // north wall, with the porch and the side door
        ((1, 2), CellBuilder::road().thin(plane(NS, 9))),
        ((2, 2), CellBuilder::room().thin(plane(EW, 0)).thin(plane(NS, 0))),
        ((3, 2), CellBuilder::room().thin(plane(NS, 0))),
        ((4, 2), CellBuilder::room().thin(plane(NS, 0))),
        ((5, 2), CellBuilder::room().thin(plane(NS, 0))),
        ((6, 2), CellBuilder::room().thin(plane(NS, 0)).window()),
        ((7, 2), CellBuilder::room().thin(plane(NS, 0)).window()),
        ((8, 2), CellBuilder::room().thin(plane(NS, 0))),
        ((9, 2), CellBuilder::room().thin(plane(NS, 0))),
        ((10, 2), CellBuilder::room().thin(plane(NS, 0))),
        ((11, 2), CellBuilder::road().thin(Segment::new(EW, 0, 1, 9, 1)).door()),
        ((1, 3), CellBuilder::room().thin(plane(EW, 0)).door()),
        ((5, 3), CellBuilder::room().thin(Segment::new(EW, 9, 1, 8, 2))),
        ((11, 3), CellBuilder::room().thin(plane(EW, 9)).thin(plane(NS, 0))),
        ((1, 4), CellBuilder::road().thin(plane(NS, 0))),
        // west wall
        ((2, 4), CellBuilder::room().thin(plane(EW, 0))),
        ((2, 5), CellBuilder::room().thin(plane(EW, 0))),
        ((2, 6), CellBuilder::room().thin(plane(EW, 0))),
        ((2, 7), CellBuilder::room().thin(plane(EW, 0))),
        ((2, 8), CellBuilder::room().thin(plane(EW, 0))),
        // inner rooms
        ((4, 5), CellBuilder::room().thin(Segment::new(NS, 7, 3, 2, 2))),
        ((5, 5), CellBuilder::room().thin(plane(NS, 9))),
        ((5, 6), CellBuilder::room().thin(plane(EW, 9))),
        ((7, 6), CellBuilder::room().thin(Segment::new(NS, 9, 1, 8, 2))),
        ((5, 7), CellBuilder::room().thin(plane(EW, 9))),
        ((6, 7), CellBuilder::room().thin(plane(NS, 9)).door()),
        ((7, 7), CellBuilder::room().thin(Segment::new(EW, 0, 1, 8, 2))),
        // east wing
        ((11, 6), CellBuilder::road().thin(plane(NS, 9))),
        ((11, 7), CellBuilder::room().thin(plane(EW, 9))),
        ((11, 8), CellBuilder::room().thin(plane(EW, 9)).door()),
        // south wall, with the back door
        ((2, 9), CellBuilder::room().thin(plane(EW, 0)).thin(plane(NS, 9))),
        ((3, 9), CellBuilder::road().thin(plane(NS, 0)).door()),
        ((4, 9), CellBuilder::room().thin(plane(NS, 9)).thin(plane(EW, 0))),
        ((5, 9), CellBuilder::room().thin(plane(NS, 9))),
        ((6, 9), CellBuilder::room().thin(plane(NS, 9))),
        ((7, 9), CellBuilder::room().thin(plane(NS, 9))),
        ((8, 9), CellBuilder::room().thin(plane(NS, 9))),
        ((9, 9), CellBuilder::room().thin(plane(NS, 9))),
        ((10, 9), CellBuilder::room().thin(plane(NS, 9))),
        ((11, 9), CellBuilder::room().thin(plane(EW, 9)).thin(plane(NS, 9))),
    ];
    for ((x, y), builder) in cells {
        plan[y * n + x] = builder;
    }

    let cells = plan
        .into_iter()
        .enumerate()
        .map(|(i, builder)| builder.build(i % n, i / n))
        .collect::<Result<Vec<_>, _>>()?;
    let grid = WorldGrid::new(n, cells)?;
    tracing::info!(size = n, "demo level built");
    Ok(grid)
}

/// Trees, bushes, barrels and the two ladies of the demo level.
pub fn demo_sprites() -> Vec<SpriteInstance> {
    use SpriteKind::*;

    [
        (-1.0, 5.0, 0.0, 1.5, TreeCone),
        (-2.0, 5.0, 0.0, 0.5, TreeCone),
        (-1.0, 6.0, 0.0, 0.9, Bush),
        (-2.0, 4.0, 0.0, 1.0, TreeVase),
        (2.3, 3.3, 90.0, 0.8, Lady),
        (0.8, 3.2, 270.0, 0.8, Lady),
        (4.0, 7.0, 0.0, 0.7, Pillar),
        (14.0, 8.5, 0.0, 0.5, Pillar),
        (-0.5, 1.5, 0.0, 1.0, TreeCone),
        (-0.5, 3.5, 0.0, 1.0, TreeColumnar),
        (18.5, 4.5, 0.0, 1.0, TreeCone),
        (12.5, 5.0, 0.0, 1.0, TreeVase),
        (12.5, 4.5, 0.0, 1.0, TreeCone),
        (12.5, 12.5, 0.0, 1.0, TreeCone),
        (3.5, 20.5, 0.0, 1.0, TreeCone),
        (3.5, 14.5, 0.0, 1.0, TreeCone),
        (14.5, 20.5, 0.0, 1.0, TreeCone),
        (18.5, 10.5, 0.0, 1.0, TreeCone),
        (18.5, 11.5, 0.0, 1.0, TreeCone),
        (18.5, 12.5, 0.0, 1.0, TreeCone),
        (21.5, 1.5, 0.0, 1.0, TreeCone),
        (15.5, 0.5, 0.0, 1.0, TreeCone),
        (16.0, 0.8, 0.0, 1.0, TreeCone),
        (16.2, 0.2, 0.0, 1.0, TreeCone),
        (9.5, 15.5, 0.0, 1.0, TreeCone),
        (10.0, 15.1, 0.0, 1.0, TreeCone),
        (10.5, 15.8, 0.0, 1.0, TreeCone),
    ]
    .into_iter()
    .map(|(x, y, facing, height, kind)| SpriteInstance::new(x, y, facing, height, kind))
    .collect()
}

/// Where the demo player starts: inside the house, looking north.
pub fn demo_spawn() -> Pose {
    Pose::new(4.0, 4.0, [0.0, -1.0], [-1.1, 0.0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_encodes_thin_north_wall() {
        let cell = CellBuilder::room()
            .thin(Segment::plane(Axis::NorthSouth, 0))
            .build(0, 0)
            .unwrap();
        assert_eq!(cell, Cell(0x0A10_0057));
    }

    #[test]
    fn builder_rejects_full_wall_on_walkable_ground() {
        let mut room_wall = CellBuilder::room();
        room_wall.fields.is_wall = true;
        assert_eq!(
            room_wall.build(1, 2),
            Err(GridError::IncompatibleMaterials { x: 1, y: 2 })
        );
        let mut road_wall = CellBuilder::wall();
        road_wall.fields.is_road = true;
        assert_eq!(
            road_wall.build(3, 4),
            Err(GridError::IncompatibleMaterials { x: 3, y: 4 })
        );
        assert!(CellBuilder::wall().build(0, 0).is_ok());
    }

    #[test]
    fn builder_checks_segments() {
        let too_far = Segment::new(Axis::EastWest, 11, 1, 10, 0);
        assert_eq!(
            CellBuilder::room().thin(too_far).build(0, 0),
            Err(GridError::SegmentOutOfRange { value: 11 })
        );

        let s = Segment::plane(Axis::EastWest, 0);
        assert_eq!(
            CellBuilder::room().thin(s).thin(s).thin(s).thin(s).build(5, 6),
            Err(GridError::TooManySegments { x: 5, y: 6 })
        );
        assert_eq!(
            CellBuilder::room().door().build(2, 2),
            Err(GridError::MissingSegment { x: 2, y: 2 })
        );
        assert_eq!(
            CellBuilder::road().window().build(2, 3),
            Err(GridError::MissingSegment { x: 2, y: 3 })
        );
    }

    #[test]
    fn demo_level_never_walls_walkable_ground() {
        let grid = demo_level().unwrap();
        assert_eq!(grid.size(), DEMO_SIZE);
        for cell in grid.cells() {
            let solid = cell.is_wall() && !cell.is_thin();
            assert!(!(solid && (cell.is_floor() || cell.is_road())), "{cell:?}");
            if cell.is_door() || cell.is_window() {
                assert!(cell.segment(0).is_some(), "{cell:?}");
            }
        }
    }

    #[test]
    fn demo_level_layout() {
        let grid = demo_level().unwrap();
        assert!(grid.get(0, 0).is_road());
        assert!(grid.get(6, 2).is_window());
        assert!(grid.get(7, 2).is_window());
        assert!(grid.get(1, 3).is_door());
        assert!(grid.get(8, 4).is_blocking());
        assert_eq!(grid.get(5, 12), Cell::EMPTY);
        let corner = grid.get(2, 9).decode();
        assert_eq!(corner.segments[0], Some(Segment::plane(Axis::EastWest, 0)));
        assert_eq!(corner.segments[1], Some(Segment::plane(Axis::NorthSouth, 9)));
        assert_eq!(corner.segments[2], None);
    }

    #[test]
    fn demo_spawn_is_inside_the_house() {
        let grid = demo_level().unwrap();
        let spawn = demo_spawn();
        let cell = grid.get_at(spawn.x, spawn.y);
        assert!(cell.decode().is_interior());
        assert!(!cell.is_blocking());
        assert!((spawn.plane_y_initial - 1.1).abs() < 1e-6);
    }

    #[test]
    fn demo_sprites_are_complete() {
        let sprites = demo_sprites();
        assert_eq!(sprites.len(), 27);
        assert_eq!(
            sprites.iter().filter(|s| s.kind == SpriteKind::Lady).count(),
            2
        );
    }
}
