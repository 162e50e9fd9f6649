mod input;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use edgeview_common::OutputSize;
use edgeview_game::{Game, GameConfig, GameError, TickStatus};
use edgeview_render::{DeviceNotify, RenderError};
use edgeview_render_wgpu::WgpuBackend;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use crate::input::WinitInput;

#[derive(Parser)]
#[command(name = "edgeview-desktop", about = "Sobel edge-detection demo")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Initial window width (defaults to the config's default size)
    #[arg(long)]
    width: Option<u32>,

    /// Initial window height
    #[arg(long)]
    height: Option<u32>,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,
}

struct App {
    game: Game,
    initial_size: OutputSize,
    window: Option<Arc<Window>>,
    backend: Option<WgpuBackend>,
    input: WinitInput,
    last_frame: Instant,
    suspended: bool,
    failure: Option<anyhow::Error>,
}

impl App {
    fn new(config: GameConfig, initial_size: OutputSize) -> Self {
        Self {
            game: Game::new(config),
            initial_size,
            window: None,
            backend: None,
            input: WinitInput::default(),
            last_frame: Instant::now(),
            suspended: false,
            failure: None,
        }
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("EdgeView")
            .with_inner_size(PhysicalSize::new(
                self.initial_size.width,
                self.initial_size.height,
            ));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no suitable GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("edgeview_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let output = OutputSize::new(size.width.max(1), size.height.max(1));
        let mut backend = WgpuBackend::new(surface, &adapter, device, queue, output)
            .context("configure surface")?;
        self.game
            .initialize(&mut backend, output.width, output.height)
            .context("initialize game")?;

        tracing::info!(
            format = ?backend.surface_format(),
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        self.input.attach(window.clone());
        self.window = Some(window);
        self.backend = Some(backend);
        self.last_frame = Instant::now();
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        tracing::error!("{err:#}");
        self.failure = Some(err);
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let delta = now - self.last_frame;
        self.last_frame = now;

        let Some(backend) = self.backend.as_mut() else {
            return;
        };

        match self.game.tick(backend, &mut self.input, delta) {
            Ok(TickStatus::Continue) => {}
            Ok(TickStatus::Exit) => {
                event_loop.exit();
                return;
            }
            Err(GameError::Render(e)) if e.is_surface_loss() => {
                tracing::warn!("{e}, recreating resources");
                self.game.on_device_lost(backend);
                if let Err(e) = self.game.on_device_restored(backend) {
                    self.fail(event_loop, anyhow::Error::new(e).context("restore device"));
                    return;
                }
            }
            Err(GameError::Render(e @ RenderError::Surface(_))) => {
                tracing::warn!("{e}, skipping frame");
            }
            Err(e) => {
                self.fail(event_loop, anyhow::Error::new(e).context("render frame"));
                return;
            }
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            if self.suspended {
                self.suspended = false;
                self.game.on_resuming();
            }
            return;
        }
        if let Err(e) = self.init_gpu(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        self.suspended = true;
        self.game.on_suspending();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(backend) = self.backend.as_mut() {
                    if let Err(e) =
                        self.game
                            .on_window_size_changed(backend, new_size.width, new_size.height)
                    {
                        self.fail(event_loop, anyhow::Error::new(e).context("resize"));
                    }
                }
            }
            WindowEvent::Moved(_) => {
                if let Some(backend) = self.backend.as_mut() {
                    if let Err(e) = self.game.on_window_moved(backend) {
                        self.fail(event_loop, anyhow::Error::new(e).context("window moved"));
                    }
                }
            }
            WindowEvent::Focused(true) => self.game.on_activated(),
            WindowEvent::Focused(false) => {
                self.input.clear();
                self.game.on_deactivated();
            }
            WindowEvent::Occluded(true) => {
                self.suspended = true;
                self.game.on_suspending();
            }
            WindowEvent::Occluded(false) if self.suspended => {
                self.suspended = false;
                self.game.on_resuming();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                self.input.on_key(key, key_state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input.on_cursor_moved(position.x, position.y);
            }
            WindowEvent::MouseInput {
                button: MouseButton::Right,
                state: btn_state,
                ..
            } => {
                self.input.on_right_button(btn_state == ElementState::Pressed);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.input.on_mouse_motion(delta.0, delta.1);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => GameConfig::from_path(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => GameConfig::default(),
    };
    let default = config.default_size;
    let size = OutputSize::validated(
        cli.width.unwrap_or(default.width),
        cli.height.unwrap_or(default.height),
    )
    .context("window size")?;

    tracing::info!(%size, "edgeview-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, size);
    event_loop.run_app(&mut app)?;

    if let Some(backend) = &app.backend {
        tracing::info!(frames = backend.frames_presented(), "edgeview-desktop exiting");
    }

    match app.failure.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
