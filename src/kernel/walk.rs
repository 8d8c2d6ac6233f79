use crate::player::Pose;
use crate::world::WorldGrid;

use super::raycast::{self, CastMode};

/// Closest the player may get to anything solid.
pub const WALL_MARGIN: f32 = 0.2;

/// Free distance along a unit direction before the margin.
fn clearance(grid: &WorldGrid, origin: [f32; 2], dir: [f32; 2], reach: f32) -> f32 {
    // a ray crosses at most 2 * size cell borders before it leaves the grid
    let span = grid.size().saturating_mul(2).min(u32::MAX as usize) as u32;
    let range = (reach.ceil() as u32).min(span).saturating_add(2);
    match raycast::trace(grid, origin, dir, range, CastMode::Collision, |_| {}) {
        Some(hit) => (hit.t - WALL_MARGIN).max(0.0),
        None => f32::INFINITY,
    }
}

/// Step along the heading; if blocked, slide along x then along y, each
/// clamped to its own clearance.
pub(super) fn walk(pose: &Pose, grid: &WorldGrid, distance: f32) -> (f32, f32) {
    let (mut x, mut y) = (pose.x, pose.y);
    let len = (pose.dir_x * pose.dir_x + pose.dir_y * pose.dir_y).sqrt();
    if distance == 0.0 || !distance.is_finite() || len == 0.0 {
        return (x, y);
    }

    // walking backwards casts behind the player
    let sign = distance.signum();
    let dir = [pose.dir_x / len * sign, pose.dir_y / len * sign];
    let step = distance.abs();

    if step <= clearance(grid, [x, y], dir, step + WALL_MARGIN) {
        return (x + dir[0] * step, y + dir[1] * step);
    }

    let dx = dir[0] * step;
    if dx != 0.0 {
        let free = clearance(grid, [x, y], [dx.signum(), 0.0], dx.abs() + WALL_MARGIN);
        x += dx.signum() * dx.abs().min(free);
    }

    let dy = dir[1] * step;
    if dy != 0.0 {
        let free = clearance(grid, [x, y], [0.0, dy.signum()], dy.abs() + WALL_MARGIN);
        y += dy.signum() * dy.abs().min(free);
    }

    tracing::trace!(from = ?(pose.x, pose.y), to = ?(x, y), "walk clamped");
    (x, y)
}
