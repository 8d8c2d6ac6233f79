//! Grid-world raycasting renderer: a bit-packed occupancy grid projected
//! into a first-person 2.5D view with billboard sprites.

pub mod buffer;
pub mod camera;
pub mod config;
pub mod error;
pub mod game_loop;
pub mod kernel;
pub mod level;
pub mod player;
pub mod procedural;
pub mod scaler;
pub mod texture;
pub mod world;

pub use camera::{Camera, Display, FrameOutcome};
pub use config::EngineConfig;
pub use game_loop::{FrameSnapshot, GameLoop, TickOutcome};
pub use kernel::{Kernel, SoftwareKernel};
pub use player::{Controls, Player, Pose};
pub use world::{Cell, WorldGrid};
