use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use runner::config::{self, GameConfig, GAME_CONFIG_FILE};
use runner::controller::input::{self, InputEvent, InputProcessor, InputState};
use runner::controller::{Game, LoggingAudio};
use runner::model::Definitions;
use runner::view::{GpuContext, Renderer, UiFrame};
use runner::{logging, ui};

/// Initial window height in logical pixels; width follows the config aspect
const WINDOW_HEIGHT: f64 = 800.0;

/// Window-bound resources, created once the event loop is running
struct Graphics {
    window: Arc<Window>,
    gpu: GpuContext,
    renderer: Renderer,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
}

struct App {
    config: GameConfig,
    game: Game,
    input: InputState,
    graphics: Option<Graphics>,
    /// Cursor in window points, for menu hit testing
    cursor: egui::Pos2,
    last_frame_time: Instant,
}

impl App {
    fn new(config: GameConfig, game: Game) -> Self {
        Self {
            config,
            game,
            input: InputState::new(),
            graphics: None,
            cursor: egui::Pos2::ZERO,
            last_frame_time: Instant::now(),
        }
    }

    fn create_graphics(&self, event_loop: &ActiveEventLoop) -> Result<Graphics, Box<dyn std::error::Error>> {
        let attributes = Window::default_attributes()
            .with_title(self.config.window_title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                WINDOW_HEIGHT * self.config.window_aspect as f64,
                WINDOW_HEIGHT,
            ));
        let window = Arc::new(event_loop.create_window(attributes)?);
        let gpu = pollster::block_on(GpuContext::new(window.clone()))?;
        let renderer = Renderer::new(&gpu);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(egui_ctx.clone(), egui::ViewportId::ROOT, &window, None, None, None);

        Ok(Graphics { window, gpu, renderer, egui_ctx, egui_state })
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(graphics) = self.graphics.as_mut() else { return };

        let now = Instant::now();
        let dt = (now - self.last_frame_time).as_secs_f32();
        self.last_frame_time = now;

        self.game.update(dt, &self.input);

        let raw_input = graphics.egui_state.take_egui_input(&graphics.window);
        let mut clicked = None;
        let game = &self.game;
        let input = &self.input;
        let cursor = self.cursor;
        let output = graphics.egui_ctx.run(raw_input, |ctx| {
            clicked = ui::build_ui(ctx, game, input, cursor);
        });
        graphics.egui_state.handle_platform_output(&graphics.window, output.platform_output);
        let primitives = graphics.egui_ctx.tessellate(output.shapes, output.pixels_per_point);

        let ui_frame = UiFrame {
            primitives,
            textures_delta: output.textures_delta,
            pixels_per_point: output.pixels_per_point,
        };
        match graphics.renderer.render(&graphics.gpu, &self.game, ui_frame) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::OutOfMemory) => {
                tracing::error!("GPU out of memory, exiting");
                event_loop.exit();
            }
            Err(e) => tracing::warn!("Dropped frame: {}", e),
        }

        if let Some(action) = clicked {
            self.game.handle_action(action);
        }
        self.input.end_frame();

        if self.game.quit_requested() {
            tracing::info!("Quit requested");
            event_loop.exit();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.graphics.is_some() {
            return;
        }
        match self.create_graphics(event_loop) {
            Ok(graphics) => {
                let size = graphics.window.inner_size();
                self.game.camera.set_aspect(size.width, size.height);
                self.graphics = Some(graphics);
                self.last_frame_time = Instant::now();
            }
            Err(e) => {
                tracing::error!("Failed to initialize graphics: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(graphics) = self.graphics.as_mut() else { return };
        // egui only paints; menu clicks go through our own hit test
        let _ = graphics.egui_state.on_window_event(&graphics.window, &event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                graphics.gpu.resize(size.width, size.height);
                graphics.renderer.resize(&graphics.gpu);
                self.game.camera.set_aspect(size.width, size.height);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let Some(e) = input::native::keyboard_event_to_input(&event) {
                    self.input.process_event(&e);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(e) = input::native::mouse_button_to_input(button, state) {
                    self.input.process_event(&e);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let scale = graphics.window.scale_factor() as f32;
                let (x, y) = (position.x as f32, position.y as f32);
                self.cursor = egui::pos2(x / scale, y / scale);
                self.input.process_event(&InputEvent::CursorMoved { x, y });
            }
            WindowEvent::Focused(false) => self.input.process_event(&InputEvent::FocusLost),
            WindowEvent::RedrawRequested => self.frame(event_loop),
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.input.process_event(&InputEvent::MouseMove { dx: delta.0 as f32, dy: delta.1 as f32 });
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(graphics) = &self.graphics {
            graphics.window.request_redraw();
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = config::data_dir();
    let config = GameConfig::load(&data_dir.join(GAME_CONFIG_FILE));
    let definitions = Definitions::load(&data_dir)?;
    let game = Game::new(&definitions, &config, Box::new(LoggingAudio::new()), InputProcessor::default())?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = App::new(config, game);
    event_loop.run_app(&mut app)?;
    Ok(())
}

fn main() {
    logging::init();

    if let Err(e) = run() {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
