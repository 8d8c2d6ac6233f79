use crate::config::PlayerConfig;
use crate::kernel::Kernel;
use crate::world::WorldGrid;

/// Camera pose in grid units.
///
/// `dir` and `plane` stay orthogonal: they are only ever rotated together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    /// Jump offset, not map height.
    pub z: f32,
    pub dir_x: f32,
    pub dir_y: f32,
    pub plane_x: f32,
    pub plane_y: f32,
    /// Vertical look offset in screen pixels.
    pub pitch: f32,
    /// Plane magnitude at spawn, used to undo perspective distortion.
    pub plane_y_initial: f32,
}

impl Pose {
    pub fn new(x: f32, y: f32, dir: [f32; 2], plane: [f32; 2]) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            dir_x: dir[0],
            dir_y: dir[1],
            plane_x: plane[0],
            plane_y: plane[1],
            pitch: 0.0,
            plane_y_initial: plane[0].abs().max(plane[1].abs()),
        }
    }

    /// Heading in radians, measured the way the sky is scrolled.
    pub fn heading(&self) -> f32 {
        self.dir_x.atan2(self.dir_y) + std::f32::consts::PI
    }
}

/// Input flags polled once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Controls {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub jump_up: bool,
    pub jump_down: bool,
    pub look_up: bool,
    pub look_down: bool,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub pose: Pose,
    /// Distance walked, drives the weapon bob.
    pub paces: f32,
    config: PlayerConfig,
}

impl Player {
    pub fn new(pose: Pose, config: PlayerConfig) -> Self {
        Self {
            pose,
            paces: 0.0,
            config,
        }
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Rotate direction and camera plane by the same angle (radians).
    pub fn rotate(&mut self, angle: f32) {
        let (s, c) = angle.sin_cos();
        let p = &mut self.pose;

        let dir_x = p.dir_x * c - p.dir_y * s;
        let dir_y = p.dir_x * s + p.dir_y * c;
        let plane_x = p.plane_x * c - p.plane_y * s;
        let plane_y = p.plane_x * s + p.plane_y * c;

        p.dir_x = dir_x;
        p.dir_y = dir_y;
        p.plane_x = plane_x;
        p.plane_y = plane_y;
    }

    /// Step along the heading; the kernel decides how far is legal.
    pub fn walk<K: Kernel + ?Sized>(&mut self, distance: f32, grid: &WorldGrid, kernel: &K) {
        let (x, y) = kernel.walk(&self.pose, grid, distance);
        let moved = ((x - self.pose.x).powi(2) + (y - self.pose.y).powi(2)).sqrt();
        self.pose.x = x;
        self.pose.y = y;
        self.paces += moved;
    }

    pub fn jump_up(&mut self, dt: f32) {
        self.pose.z = (self.pose.z + self.config.jump_speed * dt).min(self.config.max_z);
    }

    pub fn jump_down(&mut self, dt: f32) {
        self.pose.z = (self.pose.z - self.config.jump_speed * dt).max(0.0);
    }

    pub fn look_up(&mut self, dt: f32) {
        self.pose.pitch = (self.pose.pitch + self.config.pitch_speed * dt).min(self.config.max_pitch);
    }

    pub fn look_down(&mut self, dt: f32) {
        self.pose.pitch =
            (self.pose.pitch - self.config.pitch_speed * dt).max(-self.config.max_pitch);
    }

    /// One tick of input. Opposing inputs resolve by priority, not cancellation.
    pub fn update<K: Kernel + ?Sized>(
        &mut self,
        controls: &Controls,
        grid: &WorldGrid,
        kernel: &K,
        dt: f32,
    ) {
        if controls.left {
            self.rotate(self.config.turn_speed * dt);
        } else if controls.right {
            self.rotate(-self.config.turn_speed * dt);
        }

        if controls.forward {
            self.walk(self.config.move_speed * dt, grid, kernel);
        } else if controls.backward {
            self.walk(-self.config.move_speed * dt, grid, kernel);
        }

        if controls.jump_down {
            self.jump_down(dt);
        } else if controls.jump_up {
            self.jump_up(dt);
        }

        if controls.look_down {
            self.look_down(dt);
        } else if controls.look_up {
            self.look_up(dt);
        }

        if !controls.look_up && !controls.look_down {
            let decay = self.config.pitch_decay * dt;
            if self.pose.pitch > 0.0 {
                self.pose.pitch = (self.pose.pitch - decay).max(0.0);
            } else if self.pose.pitch < 0.0 {
                self.pose.pitch = (self.pose.pitch + decay).min(0.0);
            }
        }

        if !controls.jump_up && !controls.jump_down && self.pose.z > 0.0 {
            self.pose.z = (self.pose.z - self.config.z_decay * dt).max(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::SoftwareKernel;
    use crate::world::Cell;

    fn player() -> Player {
        Player::new(
            Pose::new(4.0, 4.0, [0.0, -1.0], [-1.1, 0.0]),
            PlayerConfig::default(),
        )
    }

    fn open_grid() -> WorldGrid {
        WorldGrid::new(8, vec![Cell(0x6); 64]).unwrap()
    }

    fn controls_from_bits(bits: u8) -> Controls {
        Controls {
            forward: bits & 1 != 0,
            backward: bits & 2 != 0,
            left: bits & 4 != 0,
            right: bits & 8 != 0,
            jump_up: bits & 16 != 0,
            jump_down: bits & 32 != 0,
            look_up: bits & 64 != 0,
            look_down: bits & 128 != 0,
        }
    }

    #[test]
    fn plane_initial_is_larger_component() {
        assert_eq!(player().pose.plane_y_initial, 1.1);
        assert_eq!(Pose::new(0.0, 0.0, [-1.0, 0.0], [0.0, 0.66]).plane_y_initial, 0.66);
    }

    #[test]
    fn rotation_is_invertible() {
        for i in 0..64 {
            let theta = (i as f32 - 32.0) * 0.173;
            let mut p = player();
            let before = p.pose;
            p.rotate(theta);
            p.rotate(-theta);
            assert!((p.pose.dir_x - before.dir_x).abs() < 1e-5);
            assert!((p.pose.dir_y - before.dir_y).abs() < 1e-5);
            assert!((p.pose.plane_x - before.plane_x).abs() < 1e-5);
            assert!((p.pose.plane_y - before.plane_y).abs() < 1e-5);
        }
    }

    #[test]
    fn rotation_keeps_orthogonality_and_plane_initial() {
        let mut p = player();
        for i in 0..500 {
            p.rotate(0.01 * (i % 7) as f32 - 0.02);
            let dot = p.pose.dir_x * p.pose.plane_x + p.pose.dir_y * p.pose.plane_y;
            assert!(dot.abs() < 1e-3);
            assert_eq!(p.pose.plane_y_initial, 1.1);
        }
        let plane_len = (p.pose.plane_x.powi(2) + p.pose.plane_y.powi(2)).sqrt();
        assert!((plane_len - 1.1).abs() < 1e-3);
    }

    #[test]
    fn jump_and_look_are_clamped() {
        let mut p = player();
        for _ in 0..100 {
            p.jump_up(0.1);
            p.look_up(0.1);
        }
        assert_eq!(p.pose.z, 300.0);
        assert_eq!(p.pose.pitch, 200.0);
        for _ in 0..100 {
            p.jump_down(0.1);
            p.look_down(0.1);
        }
        assert_eq!(p.pose.z, 0.0);
        assert_eq!(p.pose.pitch, -200.0);
    }

    #[test]
    fn pitch_and_z_stay_in_range_for_any_input() {
        let grid = open_grid();
        let kernel = SoftwareKernel::new(false);
        let mut p = player();
        let mut seed: u32 = 17;
        for _ in 0..5000 {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let bits = (seed >> 24) as u8;
            let dt = ((seed >> 8) % 200) as f32 / 1000.0;
            p.update(&controls_from_bits(bits), &grid, &kernel, dt);
            assert!(p.pose.pitch >= -200.0 && p.pose.pitch <= 200.0);
            assert!(p.pose.z >= 0.0 && p.pose.z <= 300.0);
            assert_eq!(p.pose.plane_y_initial, 1.1);
        }

        p.update(&controls_from_bits(0xFF), &grid, &kernel, 10.0);
        assert!(p.pose.pitch >= -200.0 && p.pose.pitch <= 200.0);
        assert!(p.pose.z >= 0.0 && p.pose.z <= 300.0);
    }

    #[test]
    fn priority_resolves_opposing_inputs() {
        let grid = open_grid();
        let kernel = SoftwareKernel::new(false);
        let mut p = player();
        let all = controls_from_bits(0xFF);
        p.update(&all, &grid, &kernel, 0.1);
        // forward wins over backward, left over right
        assert!(p.pose.y < 4.0);
        let mut rotated_left = player();
        rotated_left.rotate(PlayerConfig::default().turn_speed * 0.1);
        assert!((p.pose.dir_x - rotated_left.pose.dir_x).abs() < 1e-6);
        // jump down and look down win
        assert_eq!(p.pose.z, 0.0);
        assert!(p.pose.pitch < 0.0);
    }

    #[test]
    fn decays_are_scaled_by_time() {
        let grid = open_grid();
        let kernel = SoftwareKernel::new(false);
        let mut p = player();
        p.pose.pitch = 50.0;
        p.pose.z = 50.0;
        p.update(&Controls::default(), &grid, &kernel, 0.25);
        assert!((p.pose.pitch - 37.5).abs() < 1e-4);
        assert!((p.pose.z - 25.0).abs() < 1e-4);
        p.update(&Controls::default(), &grid, &kernel, 1.0);
        assert_eq!(p.pose.pitch, 0.0);
        assert_eq!(p.pose.z, 0.0);

        p.pose.pitch = -10.0;
        p.update(&Controls::default(), &grid, &kernel, 0.05);
        assert!((p.pose.pitch + 7.5).abs() < 1e-4);
    }

    #[test]
    fn pitch_settles_slower_than_height() {
        let grid = open_grid();
        let kernel = SoftwareKernel::new(false);
        let mut p = player();
        p.pose.pitch = 80.0;
        p.pose.z = 80.0;
        for _ in 0..10 {
            p.update(&Controls::default(), &grid, &kernel, 0.05);
        }
        assert!(p.pose.pitch > p.pose.z);
        assert!(p.pose.pitch < 80.0);
    }

    #[test]
    fn walking_counts_paces() {
        let grid = open_grid();
        let kernel = SoftwareKernel::new(false);
        let mut p = player();
        p.walk(0.5, &grid, &kernel);
        assert!((p.pose.y - 3.5).abs() < 1e-5);
        assert!((p.paces - 0.5).abs() < 1e-5);
        p.walk(-0.25, &grid, &kernel);
        assert!((p.pose.y - 3.75).abs() < 1e-5);
        assert!((p.paces - 0.75).abs() < 1e-5);
    }
}
