use anyhow::{Context, Result, anyhow};
use clap::Parser;
use egui::Context as EguiContext;
use glam::Vec2;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use toydrive_config::DriveConfig;
use toydrive_input::{Action, InputState, KeyBindings, PointerButton};
use toydrive_kernel::DriveWorld;
use toydrive_render::{CameraMode, CameraRig, RenderView, Scene};
use toydrive_render_wgpu::{Projection, WgpuRenderer};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "toydrive-desktop", about = "Drive a toy car around a flat world")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML or JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Binding overrides, e.g. "arrowup=accelerate,w="
    #[arg(short, long)]
    bind: Option<String>,
}

/// Lowercase identifier for a logical key, matching binding names.
fn key_name(key: &Key) -> Option<String> {
    match key {
        Key::Named(NamedKey::Space) => Some("space".into()),
        Key::Named(named) => Some(format!("{named:?}").to_ascii_lowercase()),
        Key::Character(text) => Some(text.to_lowercase()),
        _ => None,
    }
}

fn pointer_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::Primary,
        MouseButton::Right => PointerButton::Secondary,
        _ => PointerButton::Other,
    }
}

/// Application state.
struct AppState {
    world: DriveWorld,
    scene: Scene,
    input: InputState,
    bindings: KeyBindings,
    rig: CameraRig,
    projection: Projection,
    cursor: Vec2,
    show_hud: bool,
    last_frame: Instant,
    frame_ms: f32,
}

impl AppState {
    fn new(config: &DriveConfig) -> Result<Self> {
        Ok(Self {
            world: config.build_world(),
            scene: Scene::bootstrap(&config.scene),
            input: InputState::new(),
            bindings: config.bindings.clone(),
            rig: config.camera_rig()?,
            projection: Projection::default(),
            cursor: Vec2::ZERO,
            show_hud: true,
            last_frame: Instant::now(),
            frame_ms: 0.0,
        })
    }

    /// One animation tick: drive the player, then place the camera.
    fn update(&mut self) -> RenderView {
        let now = Instant::now();
        self.frame_ms = (now - self.last_frame).as_secs_f32() * 1000.0;
        self.last_frame = now;

        self.world.step(self.input.drive_controls(&self.bindings));
        // Nothing records a live session; keep the log from growing.
        self.world.drain_events();
        match self.world.player() {
            Some(player) => self.rig.follow(player),
            None => RenderView::default(),
        }
    }

    fn handle_key(&mut self, key: &str, pressed: bool) {
        if !pressed {
            self.input.key_up(key);
            return;
        }
        if !self.input.key_down(key) {
            return;
        }
        match self.bindings.action_for(key) {
            Some(Action::CycleCamera) => {
                self.rig.cycle_mode();
            }
            Some(Action::ToggleHud) => {
                self.show_hud = !self.show_hud;
            }
            _ => {}
        }
    }

    fn handle_pointer_button(&mut self, button: MouseButton, pressed: bool) {
        let button = pointer_button(button);
        if pressed {
            self.input.pointer_down(button, self.cursor);
        } else {
            self.input.pointer_up(button);
        }
    }

    /// Events that end held input. These must reach the input state even
    /// when egui consumes them, or a drag released over the HUD never ends.
    fn handle_release(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::MouseInput {
                button,
                state: ElementState::Released,
                ..
            } => self.handle_pointer_button(*button, false),
            WindowEvent::Focused(false) => self.input.release_all(),
            _ => {}
        }
    }

    fn handle_cursor(&mut self, position: Vec2) {
        self.cursor = position;
        if let Some(delta) = self.input.pointer_moved(position) {
            self.rig.apply_drag(delta.dx, delta.dy);
        }
    }

    fn legend(&self, action: Action) -> String {
        let keys: Vec<&str> = self.bindings.keys_for(action).collect();
        if keys.is_empty() {
            "-".into()
        } else {
            keys.join(" / ")
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if !self.show_hud {
            return;
        }

        egui::SidePanel::left("hud")
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("toydrive");
                ui.separator();
                ui.label(format!("Tick: {}", self.world.tick()));
                ui.label(format!(
                    "Frame: {:.1} ms  Vehicles: {}",
                    self.frame_ms,
                    self.world.vehicle_count()
                ));

                if let Some(player) = self.world.player() {
                    ui.separator();
                    ui.heading("Vehicle");
                    ui.label(format!("Speed: {:+.3}", player.velocity));
                    ui.label(format!("Heading: {:.1} deg", player.heading.to_degrees()));
                    ui.label(format!("Angular: {:+.4}", player.angular_velocity));
                    ui.label(format!("Wheel spin: {:.2} rad", player.wheels[0].spin));
                    ui.label(format!(
                        "Position: ({:.1}, {:.1})",
                        player.position.x, player.position.z
                    ));
                }

                ui.separator();
                ui.heading("Camera");
                ui.label(format!("Mode: {}", self.rig.mode().label()));
                ui.label(format!(
                    "Orbit: {:.2} rad  Height: {:.1}",
                    self.rig.angle(),
                    self.rig.height()
                ));
                ui.horizontal(|ui| {
                    for mode in [CameraMode::Orbit, CameraMode::Chase] {
                        if ui
                            .selectable_label(self.rig.mode() == mode, mode.label())
                            .clicked()
                        {
                            self.rig.set_mode(mode);
                        }
                    }
                });

                ui.separator();
                ui.heading("Controls");
                for action in Action::ALL {
                    ui.small(format!("{}: {}", action.name(), self.legend(action)));
                }
                ui.small("left drag: orbit camera");
            });
    }
}

/// Window, device and everything created against them.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn init(event_loop: &ActiveEventLoop, egui_ctx: &EguiContext) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("toydrive")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("create window")?,
        );

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
        .ok_or_else(|| anyhow!("no compatible GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("toydrive_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(&device, surface_format, config.width, config.height);

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            format = ?surface_format,
            "GPU initialized"
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }

    fn redraw(&mut self) {
        let view = self.state.update();

        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let target = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let items = self.state.scene.draw_list(&self.state.world);
        gpu.renderer.render(
            &gpu.device,
            &gpu.queue,
            &target,
            &self.state.projection,
            &view,
            &self.state.scene,
            &items,
        );

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let state = &mut self.state;
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            state.draw_ui(ctx);
        });
        gpu.egui_winit
            .handle_platform_output(&gpu.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        gpu.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &target,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            gpu.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        output.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        match Gpu::init(event_loop, &self.egui_ctx) {
            Ok(gpu) => {
                self.state
                    .projection
                    .resize(gpu.config.width, gpu.config.height);
                self.gpu = Some(gpu);
            }
            Err(e) => {
                tracing::error!("failed to initialize graphics: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        self.state.handle_release(&event);

        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size.width, new_size.height);
                    self.state
                        .projection
                        .resize(gpu.config.width, gpu.config.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: key_state,
                        ..
                    },
                ..
            } => {
                if let Some(name) = key_name(&logical_key) {
                    self.state
                        .handle_key(&name, key_state == ElementState::Pressed);
                }
            }
            WindowEvent::MouseInput {
                button,
                state: ElementState::Pressed,
                ..
            } => {
                self.state.handle_pointer_button(button, true);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.state
                    .handle_cursor(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("toydrive-desktop starting");

    let mut config = DriveConfig::load_or_default(cli.config.as_deref())?;
    if let Some(overrides) = &cli.bind {
        config
            .apply_binding_overrides(overrides)
            .context("invalid --bind")?;
    }
    let state = AppState::new(&config)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(state);
    event_loop.run_app(&mut app)?;

    Ok(())
}
