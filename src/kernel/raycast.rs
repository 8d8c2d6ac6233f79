//! Grid DDA shared by the wall pass and the walk contract.

use crate::world::{Axis, Cell, Segment, WorldGrid};

/// Which grid line the ray crossed last: 0 = x-side, 1 = y-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    X,
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitSurface {
    Wall,
    Door,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Ray parameter at the hit. For a camera ray built as `dir + plane * cx`
    /// this is the perpendicular distance to the camera plane.
    pub t: f32,
    pub side: Side,
    pub surface: HitSurface,
    /// Horizontal texture coordinate, 0..1.
    pub tex_u: f32,
    pub cell: (i32, i32),
}

/// A see-through segment the ray passed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowHit {
    pub t: f32,
    pub side: Side,
    pub tex_u: f32,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastMode {
    /// Camera rays: windows are recorded and passed, the world edge is open.
    Render,
    /// Movement rays: doors are open, windows and the world edge are solid.
    Collision,
}

pub enum TraceEvent {
    Cell(i32, i32),
    Window(WindowHit),
}

struct SegmentHit {
    t: f32,
    side: Side,
    main_face: bool,
    index: usize,
    segment: Segment,
}

/// Slab test of the ray against the rectangle a segment occupies.
fn intersect_segment(
    origin: [f32; 2],
    dir: [f32; 2],
    map_x: i32,
    map_y: i32,
    index: usize,
    segment: Segment,
) -> Option<SegmentHit> {
    let across = (
        segment.offset_f32(),
        segment.offset_f32() + segment.thickness_f32(),
    );
    let along = (
        segment.secondary_offset_f32(),
        segment.secondary_offset_f32() + segment.extent_f32(),
    );
    let (x_range, y_range) = match segment.axis {
        Axis::EastWest => (across, along),
        Axis::NorthSouth => (along, across),
    };
    let x_range = (map_x as f32 + x_range.0, map_x as f32 + x_range.1);
    let y_range = (map_y as f32 + y_range.0, map_y as f32 + y_range.1);

    let slab = |o: f32, d: f32, lo: f32, hi: f32| -> Option<(f32, f32)> {
        if d == 0.0 {
            return (o >= lo && o <= hi).then_some((f32::NEG_INFINITY, f32::INFINITY));
        }
        let t1 = (lo - o) / d;
        let t2 = (hi - o) / d;
        Some((t1.min(t2), t1.max(t2)))
    };

    let (tx_near, tx_far) = slab(origin[0], dir[0], x_range.0, x_range.1)?;
    let (ty_near, ty_far) = slab(origin[1], dir[1], y_range.0, y_range.1)?;
    let enter = tx_near.max(ty_near);
    let exit = tx_far.min(ty_far);
    if enter > exit || enter < 0.0 || !enter.is_finite() {
        return None;
    }

    let side = if tx_near > ty_near { Side::X } else { Side::Y };
    let main_face = matches!(
        (segment.axis, side),
        (Axis::EastWest, Side::X) | (Axis::NorthSouth, Side::Y)
    );
    Some(SegmentHit {
        t: enter,
        side,
        main_face,
        index,
        segment,
    })
}

fn texture_u(side: Side, origin: [f32; 2], dir: [f32; 2], t: f32) -> f32 {
    let along = match side {
        Side::X => origin[1] + t * dir[1],
        Side::Y => origin[0] + t * dir[0],
    };
    let mut u = along - along.floor();
    if (side == Side::X && dir[0] > 0.0) || (side == Side::Y && dir[1] < 0.0) {
        u = 1.0 - u;
    }
    u.clamp(0.0, 1.0)
}

/// Texture coordinate stretched over a door or window's own extent.
fn stretched_u(hit: &SegmentHit, origin: [f32; 2], dir: [f32; 2], map_x: i32, map_y: i32) -> f32 {
    let (along, base) = match hit.side {
        Side::X => (origin[1] + hit.t * dir[1], map_y as f32),
        Side::Y => (origin[0] + hit.t * dir[0], map_x as f32),
    };
    let extent = hit.segment.extent_f32().max(f32::EPSILON);
    ((along - base - hit.segment.secondary_offset_f32()) / extent).clamp(0.0, 1.0)
}

/// Walk the grid from `origin` along `dir` for at most `range` cells.
///
/// `on_event` sees every visited cell (including the starting one) and every
/// window passed in render mode.
pub fn trace<F: FnMut(TraceEvent)>(
    grid: &WorldGrid,
    origin: [f32; 2],
    dir: [f32; 2],
    range: u32,
    mode: CastMode,
    mut on_event: F,
) -> Option<RayHit> {
    let mut map_x = origin[0].floor() as i32;
    let mut map_y = origin[1].floor() as i32;

    // length of ray from one x or y-side to the next
    let delta_dist_x = dir[0].abs().recip();
    let delta_dist_y = dir[1].abs().recip();

    let (step_x, mut side_dist_x) = if dir[0] < 0.0 {
        (-1, (origin[0] - map_x as f32) * delta_dist_x)
    } else {
        (1, (map_x as f32 + 1.0 - origin[0]) * delta_dist_x)
    };
    let (step_y, mut side_dist_y) = if dir[1] < 0.0 {
        (-1, (origin[1] - map_y as f32) * delta_dist_y)
    } else {
        (1, (map_y as f32 + 1.0 - origin[1]) * delta_dist_y)
    };

    let mut t_enter = 0.0f32;
    let mut side = Side::X;

    for _ in 0..=range {
        on_event(TraceEvent::Cell(map_x, map_y));
        let cell = grid.get(map_x, map_y);

        if let Some(hit) = hit_in_cell(
            cell, origin, dir, map_x, map_y, t_enter, side, mode, &mut on_event,
        ) {
            return Some(hit);
        }

        if side_dist_x < side_dist_y {
            t_enter = side_dist_x;
            side_dist_x += delta_dist_x;
            map_x += step_x;
            side = Side::X;
        } else {
            t_enter = side_dist_y;
            side_dist_y += delta_dist_y;
            map_y += step_y;
            side = Side::Y;
        }
        if !t_enter.is_finite() {
            break;
        }
    }

    None
}

fn hit_in_cell<F: FnMut(TraceEvent)>(
    cell: Cell,
    origin: [f32; 2],
    dir: [f32; 2],
    map_x: i32,
    map_y: i32,
    t_enter: f32,
    side: Side,
    mode: CastMode,
    on_event: &mut F,
) -> Option<RayHit> {
    if cell.is_boundary() {
        return match mode {
            CastMode::Render => None,
            CastMode::Collision => Some(RayHit {
                t: t_enter,
                side,
                surface: HitSurface::Wall,
                tex_u: texture_u(side, origin, dir, t_enter),
                cell: (map_x, map_y),
            }),
        };
    }

    if !cell.is_wall() {
        return None;
    }

    if !cell.is_thin() {
        return Some(RayHit {
            t: t_enter,
            side,
            surface: HitSurface::Wall,
            tex_u: texture_u(side, origin, dir, t_enter),
            cell: (map_x, map_y),
        });
    }

    let mut hits: Vec<SegmentHit> = (0..3)
        .filter_map(|i| {
            let segment = cell.segment(i)?;
            intersect_segment(origin, dir, map_x, map_y, i, segment)
        })
        .collect();
    hits.sort_by(|a, b| a.t.total_cmp(&b.t));

    for hit in hits {
        let primary = hit.index == 0;
        // every face of a door segment belongs to the door, jambs included
        let is_door = primary && cell.is_door();
        let is_window = primary && cell.is_window() && hit.main_face;

        match mode {
            CastMode::Collision if is_door => continue,
            CastMode::Render if is_window => {
                let x = origin[0] + hit.t * dir[0];
                let y = origin[1] + hit.t * dir[1];
                on_event(TraceEvent::Window(WindowHit {
                    t: hit.t,
                    side: hit.side,
                    tex_u: stretched_u(&hit, origin, dir, map_x, map_y),
                    x,
                    y,
                }));
                continue;
            }
            _ => {}
        }

        let (surface, tex_u) = if is_door && hit.main_face {
            (
                HitSurface::Door,
                stretched_u(&hit, origin, dir, map_x, map_y),
            )
        } else if is_door {
            (HitSurface::Door, texture_u(hit.side, origin, dir, hit.t))
        } else {
            (HitSurface::Wall, texture_u(hit.side, origin, dir, hit.t))
        };
        return Some(RayHit {
            t: hit.t,
            side: hit.side,
            surface,
            tex_u,
            cell: (map_x, map_y),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::CellFields;

    const FLOOR: Cell = Cell(0x6);
    const WALL: Cell = Cell(0x1);

    fn open_room(size: usize) -> Vec<Cell> {
        vec![FLOOR; size * size]
    }

    fn grid_with(size: usize, cells: &[((usize, usize), Cell)]) -> WorldGrid {
        let mut all = open_room(size);
        for ((x, y), c) in cells {
            all[y * size + x] = *c;
        }
        WorldGrid::new(size, all).unwrap()
    }

    fn thin(axis: Axis, offset: u8, door: bool, window: bool) -> Cell {
        CellFields {
            is_wall: true,
            is_floor: true,
            is_ceiling: true,
            is_thin: true,
            is_door: door,
            is_window: window,
            segments: [Some(Segment::plane(axis, offset)), None, None],
            ..Default::default()
        }
        .encode()
    }

    #[test]
    fn hits_full_wall_at_cell_edge() {
        let grid = grid_with(8, &[((5, 2), WALL)]);
        let hit = trace(&grid, [2.5, 2.5], [1.0, 0.0], 20, CastMode::Render, |_| {}).unwrap();
        assert!((hit.t - 2.5).abs() < 1e-5);
        assert_eq!(hit.side, Side::X);
        assert_eq!(hit.cell, (5, 2));
        assert_eq!(hit.surface, HitSurface::Wall);
    }

    #[test]
    fn render_ray_passes_world_edge() {
        let grid = grid_with(4, &[]);
        let mut cells = Vec::new();
        let hit = trace(&grid, [1.5, 1.5], [-1.0, 0.0], 5, CastMode::Render, |e| {
            if let TraceEvent::Cell(x, y) = e {
                cells.push((x, y));
            }
        });
        assert!(hit.is_none());
        assert!(cells.contains(&(-1, 1)));
    }

    #[test]
    fn collision_ray_stops_at_world_edge() {
        let grid = grid_with(4, &[]);
        let hit = trace(&grid, [1.5, 1.5], [-1.0, 0.0], 5, CastMode::Collision, |_| {}).unwrap();
        assert!((hit.t - 1.5).abs() < 1e-5);
    }

    #[test]
    fn thin_wall_hit_at_offset() {
        // plane at x = 3.5
        let grid = grid_with(8, &[((3, 2), thin(Axis::EastWest, 5, false, false))]);
        let hit = trace(&grid, [1.5, 2.5], [1.0, 0.0], 20, CastMode::Render, |_| {}).unwrap();
        assert!((hit.t - 2.0).abs() < 1e-5);
        assert_eq!(hit.surface, HitSurface::Wall);
    }

    #[test]
    fn thin_wall_missed_when_parallel_outside() {
        // plane at y = 2.5, ray runs along y = 2.2 parallel to it
        let grid = grid_with(8, &[((3, 2), thin(Axis::NorthSouth, 5, false, false))]);
        let hit = trace(&grid, [1.5, 2.2], [1.0, 0.0], 5, CastMode::Render, |_| {});
        assert!(hit.is_none());
    }

    #[test]
    fn door_is_drawn_but_walkable() {
        let grid = grid_with(8, &[((3, 2), thin(Axis::EastWest, 5, true, false))]);
        let render = trace(&grid, [1.5, 2.5], [1.0, 0.0], 10, CastMode::Render, |_| {}).unwrap();
        assert_eq!(render.surface, HitSurface::Door);
        assert!((render.tex_u - 0.5).abs() < 1e-5);

        let walk = trace(&grid, [1.5, 2.5], [1.0, 0.0], 10, CastMode::Collision, |_| {}).unwrap();
        assert_eq!(walk.cell, (8, 2));
    }

    #[test]
    fn window_is_recorded_and_passed() {
        let grid = grid_with(
            8,
            &[((3, 2), thin(Axis::EastWest, 5, false, true)), ((6, 2), WALL)],
        );
        let mut windows = Vec::new();
        let hit = trace(&grid, [1.5, 2.5], [1.0, 0.0], 10, CastMode::Render, |e| {
            if let TraceEvent::Window(w) = e {
                windows.push(w);
            }
        })
        .unwrap();
        assert_eq!(hit.cell, (6, 2));
        assert_eq!(windows.len(), 1);
        assert!((windows[0].t - 2.0).abs() < 1e-5);
        assert!((windows[0].x - 3.5).abs() < 1e-5);

        let blocked = trace(&grid, [1.5, 2.5], [1.0, 0.0], 10, CastMode::Collision, |_| {}).unwrap();
        assert_eq!(blocked.cell, (3, 2));
    }

    #[test]
    fn door_jambs_use_the_door_surface() {
        // a short door leaf across x = 3.5..3.6, spanning y = 2.2..2.8
        let door = CellFields {
            is_wall: true,
            is_floor: true,
            is_ceiling: true,
            is_thin: true,
            is_door: true,
            segments: [Some(Segment::new(Axis::EastWest, 5, 1, 6, 2)), None, None],
            ..Default::default()
        }
        .encode();
        let grid = grid_with(8, &[((3, 2), door)]);

        // heading south along x = 3.55 meets the leaf's north edge
        let jamb = trace(&grid, [3.55, 0.5], [0.0, 1.0], 10, CastMode::Render, |_| {}).unwrap();
        assert_eq!(jamb.surface, HitSurface::Door);
        assert_eq!(jamb.side, Side::Y);
        assert!((jamb.t - 1.7).abs() < 1e-5);

        let walk = trace(&grid, [3.55, 0.5], [0.0, 1.0], 10, CastMode::Collision, |_| {}).unwrap();
        assert_eq!(walk.cell, (3, 8));
    }

    #[test]
    fn range_limits_traversal() {
        let grid = grid_with(32, &[((30, 1), WALL)]);
        assert!(trace(&grid, [0.5, 1.5], [1.0, 0.0], 10, CastMode::Render, |_| {}).is_none());
        assert!(trace(&grid, [0.5, 1.5], [1.0, 0.0], 40, CastMode::Render, |_| {}).is_some());
    }
}
