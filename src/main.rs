use std::collections::HashSet;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use gridcaster::buffer::PixelBuffer;
use gridcaster::camera::{Camera, Display};
use gridcaster::config::EngineConfig;
use gridcaster::error::RenderError;
use gridcaster::game_loop::{GameLoop, TickOutcome};
use gridcaster::kernel::SoftwareKernel;
use gridcaster::level;
use gridcaster::player::{Controls, Player};
use gridcaster::procedural;
use gridcaster::scaler::Scaler;
use gridcaster::texture::SpriteIndex;

/// Ambient light set by a lightning flash.
const FLASH_LIGHT: f32 = 2.0;

#[derive(Debug, Parser)]
#[command(version, about = "Walk around the demo level")]
struct Args {
    /// JSON config file; missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Debug logging unless RUST_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

/// softbuffer window surface, stretched to the window size.
struct WindowDisplay {
    window: Rc<Window>,
    surface: softbuffer::Surface<Rc<Window>, Rc<Window>>,
    scaler: Scaler,
}

fn present_error(err: impl std::fmt::Display) -> RenderError {
    RenderError::Present(err.to_string())
}

impl Display for WindowDisplay {
    fn present(&mut self, frame: &PixelBuffer) -> Result<(), RenderError> {
        let size = self.window.inner_size();
        let (Some(w), Some(h)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        else {
            // minimized
            return Ok(());
        };
        self.surface.resize(w, h).map_err(present_error)?;
        let mut buffer = self.surface.buffer_mut().map_err(present_error)?;
        self.scaler
            .present(frame, &mut buffer, w.get() as usize, h.get() as usize);
        buffer.present().map_err(present_error)
    }
}

fn controls(keys: &HashSet<KeyCode>) -> Controls {
    let any = |codes: &[KeyCode]| codes.iter().any(|c| keys.contains(c));
    Controls {
        forward: any(&[KeyCode::KeyW, KeyCode::ArrowUp]),
        backward: any(&[KeyCode::KeyS, KeyCode::ArrowDown]),
        left: any(&[KeyCode::KeyA, KeyCode::ArrowLeft]),
        right: any(&[KeyCode::KeyD, KeyCode::ArrowRight]),
        jump_up: any(&[KeyCode::Space]),
        jump_down: any(&[KeyCode::KeyC]),
        look_up: any(&[KeyCode::PageUp]),
        look_down: any(&[KeyCode::PageDown]),
    }
}

struct App {
    config: EngineConfig,
    game: GameLoop<SoftwareKernel>,
    display: Option<WindowDisplay>,
    keys_down: HashSet<KeyCode>,
    started: Instant,

    // HUD
    frame_counter: u32,
    last_fps_print: Instant,

    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(config: EngineConfig) -> anyhow::Result<Self> {
        let world = level::demo_level().context("building demo level")?;
        let sprites = SpriteIndex::from_instances(level::demo_sprites());
        let textures = procedural::demo_textures().context("generating textures")?;
        let player = Player::new(level::demo_spawn(), config.player.clone());
        let camera = Camera::new(&config.render);
        let kernel = SoftwareKernel::new(config.render.parallel);
        let game = GameLoop::new(
            world,
            player,
            textures,
            sprites,
            camera,
            kernel,
            config.game_loop.clone(),
        );

        Ok(Self {
            config,
            game,
            display: None,
            keys_down: HashSet::new(),
            started: Instant::now(),
            frame_counter: 0,
            last_fps_print: Instant::now(),
            fatal: None,
        })
    }

    fn open_window(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<WindowDisplay> {
        let window = &self.config.window;
        let attributes = Window::default_attributes()
            .with_title(window.title.clone())
            .with_inner_size(LogicalSize::new(window.width as f64, window.height as f64));
        let window = Rc::new(event_loop.create_window(attributes)?);

        let context =
            softbuffer::Context::new(window.clone()).map_err(|e| anyhow::anyhow!("{e}"))?;
        let surface = softbuffer::Surface::new(&context, window.clone())
            .map_err(|e| anyhow::anyhow!("{e}"))?;

        Ok(WindowDisplay {
            window,
            surface,
            scaler: Scaler::new(self.config.render.sharpen),
        })
    }

    fn redraw(&mut self) {
        let Some(display) = self.display.as_mut() else {
            return;
        };
        self.game.set_controls(controls(&self.keys_down));
        let now_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        if self.game.frame(now_ms, display) == TickOutcome::Rendered {
            self.frame_counter += 1;
        }

        let now = Instant::now();
        let elapsed = now.duration_since(self.last_fps_print).as_secs_f32();
        if elapsed >= 1.0 {
            tracing::info!(
                fps = format_args!("{:.1}", self.frame_counter as f32 / elapsed),
                smoothed = format_args!("{:.1}", self.game.fps()),
                worst = format_args!("{:.1}", self.game.worst_fps()),
                "frame rate"
            );
            self.frame_counter = 0;
            self.last_fps_print = now;
        }

        display.window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.display.is_some() {
            return;
        }
        match self.open_window(event_loop) {
            Ok(display) => {
                let size = display.window.inner_size();
                tracing::info!(width = size.width, height = size.height, "window opened");
                display.window.request_redraw();
                self.display = Some(display);
            }
            Err(err) => {
                self.fatal = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if self.display.as_ref().is_some_and(|d| d.window.id() != id) {
            return;
        }
        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("close requested");
                event_loop.exit();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => match (state, code) {
                (ElementState::Pressed, KeyCode::Escape) => event_loop.exit(),
                (ElementState::Pressed, KeyCode::KeyL) => {
                    tracing::debug!("lightning");
                    self.game.world_mut().set_light(FLASH_LIGHT);
                }
                (ElementState::Pressed, _) => {
                    self.keys_down.insert(code);
                }
                (ElementState::Released, _) => {
                    self.keys_down.remove(&code);
                }
            },

            WindowEvent::RedrawRequested => self.redraw(),

            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(display) = &self.display {
            display.window.request_redraw();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    tracing::info!(
        width = config.render.width,
        height = config.render.height,
        parallel = config.render.parallel,
        "starting"
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config)?;
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
