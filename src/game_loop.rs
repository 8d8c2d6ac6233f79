//! Frame scheduler: one call per display refresh.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::camera::{Camera, Display, FrameOutcome};
use crate::config::LoopConfig;
use crate::kernel::Kernel;
use crate::player::{Controls, Player, Pose};
use crate::texture::{SpriteIndex, TextureIndex};
use crate::world::WorldGrid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Called too soon after the last accepted tick.
    Skipped,
    /// Simulation ran, textures still loading.
    NotReady,
    Rendered,
    /// Rendering or presenting failed; the loop keeps going.
    Failed,
}

/// State published after every accepted tick.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub frame: u64,
    /// Seconds since the previous accepted tick.
    pub frame_time: f32,
    pub fps: f32,
    pub worst_fps: f32,
    pub pose: Pose,
    pub light: f32,
    pub outcome: TickOutcome,
}

/// Rolling window of accepted frame times.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    times: VecDeque<f32>,
    capacity: usize,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            times: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, frame_time: f32) {
        if self.times.len() == self.capacity {
            self.times.pop_front();
        }
        self.times.push_back(frame_time);
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// 1 / mean frame time; 0 before the first frame.
    pub fn smoothed_fps(&self) -> f32 {
        if self.times.is_empty() {
            return 0.0;
        }
        let mean = self.times.iter().sum::<f32>() / self.times.len() as f32;
        if mean > 0.0 { 1.0 / mean } else { 0.0 }
    }

    /// 1 / slowest frame time in the window.
    pub fn worst_fps(&self) -> f32 {
        let max = self.times.iter().copied().fold(0.0f32, f32::max);
        if max > 0.0 { 1.0 / max } else { 0.0 }
    }
}

pub struct GameLoop<K: Kernel> {
    world: WorldGrid,
    player: Player,
    textures: TextureIndex,
    sprites: SpriteIndex,
    camera: Camera,
    kernel: K,
    controls: Controls,
    config: LoopConfig,
    /// Milliseconds of the last accepted tick.
    last_time: f64,
    timer: FrameTimer,
    frame: u64,
    subscribers: Vec<Sender<FrameSnapshot>>,
}

impl<K: Kernel> GameLoop<K> {
    pub fn new(
        world: WorldGrid,
        player: Player,
        textures: TextureIndex,
        sprites: SpriteIndex,
        camera: Camera,
        kernel: K,
        config: LoopConfig,
    ) -> Self {
        tracing::info!(
            grid = world.size(),
            sprites = sprites.len(),
            textures = textures.texture_count(),
            "game loop created"
        );
        Self {
            world,
            player,
            textures,
            sprites,
            camera,
            kernel,
            controls: Controls::default(),
            timer: FrameTimer::new(config.fps_window),
            config,
            last_time: 0.0,
            frame: 0,
            subscribers: Vec::new(),
        }
    }

    pub fn world(&self) -> &WorldGrid {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut WorldGrid {
        &mut self.world
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn textures(&self) -> &TextureIndex {
        &self.textures
    }

    /// Textures may arrive after the loop starts; frames stay `NotReady`
    /// until the required set is complete.
    pub fn textures_mut(&mut self) -> &mut TextureIndex {
        &mut self.textures
    }

    pub fn set_controls(&mut self, controls: Controls) {
        self.controls = controls;
    }

    pub fn controls(&self) -> Controls {
        self.controls
    }

    pub fn last_time(&self) -> f64 {
        self.last_time
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn fps(&self) -> f32 {
        self.timer.smoothed_fps()
    }

    pub fn worst_fps(&self) -> f32 {
        self.timer.worst_fps()
    }

    /// New receiver for per-tick snapshots. Dropped receivers are pruned on
    /// the next publish.
    pub fn subscribe(&mut self) -> Receiver<FrameSnapshot> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// One display refresh at `now_ms`.
    pub fn frame(&mut self, now_ms: f64, display: &mut dyn Display) -> TickOutcome {
        let frame_time = ((now_ms - self.last_time) / 1000.0) as f32;
        if frame_time < self.config.min_frame_time {
            tracing::trace!(frame_time, "tick skipped");
            return TickOutcome::Skipped;
        }
        self.last_time = now_ms;
        self.timer.push(frame_time);

        let dt = frame_time.min(self.config.max_frame_time);
        let outcome = self.tick(dt, display);

        self.frame += 1;
        let snapshot = FrameSnapshot {
            frame: self.frame,
            frame_time,
            fps: self.timer.smoothed_fps(),
            worst_fps: self.timer.worst_fps(),
            pose: self.player.pose,
            light: self.world.light(),
            outcome,
        };
        self.publish(snapshot);
        outcome
    }

    /// light decay, player, render, present. In that order.
    fn tick(&mut self, dt: f32, display: &mut dyn Display) -> TickOutcome {
        self.world.update(dt);
        self.player
            .update(&self.controls, &self.world, &self.kernel, dt);

        let rendered = self.camera.render(
            &self.player.pose,
            &self.world,
            &self.textures,
            &self.sprites,
            &self.kernel,
            self.player.paces,
        );

        match rendered {
            Ok(FrameOutcome::NotReady) => TickOutcome::NotReady,
            Ok(FrameOutcome::Rendered { .. }) => match self.camera.present(display) {
                Ok(()) => TickOutcome::Rendered,
                Err(err) => {
                    tracing::warn!(error = %err, frame = self.frame, "present failed");
                    TickOutcome::Failed
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, frame = self.frame, "render failed");
                TickOutcome::Failed
            }
        }
    }

    fn publish(&mut self, snapshot: FrameSnapshot) {
        self.subscribers
            .retain(|tx| tx.send(snapshot.clone()).is_ok());
    }
}
