mod cli;
mod render_loop;
mod stats;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use cli::Cli;
use glam::Mat4;
use render_loop::RenderLoop;
use stats::FrameSummary;
use std::sync::Arc;
use teapot_config::{AppConfig, DrawTarget};
use teapot_imu::SampleSource;
use teapot_input::mouse::CameraController;
use teapot_renderer::{Camera, Mesh, ModelRenderer, ScenePose};
use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Application state.
struct App {
    config: AppConfig,
    /// Geometry waiting for the GPU; drained when the window comes up.
    meshes: Vec<Mesh>,
    render_loop: Option<RenderLoop>,
    /// `None` when the overlay is disabled.
    controller: Option<CameraController>,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    /// First fatal error raised inside the event loop.
    failure: Option<anyhow::Error>,
}

struct GpuState {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    renderer: ModelRenderer,
    camera: Camera,
}

impl App {
    fn new(config: AppConfig, meshes: Vec<Mesh>, render_loop: RenderLoop) -> Self {
        let controller = config
            .overlay
            .enabled
            .then(|| CameraController::new(&config.overlay));
        Self {
            config,
            meshes,
            render_loop: Some(render_loop),
            controller,
            window: None,
            gpu: None,
            failure: None,
        }
    }

    fn shut_down(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(render_loop) = &mut self.render_loop {
            render_loop.request_quit();
        }
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!(error = %err, "Fatal error");
        if self.failure.is_none() {
            self.failure = Some(err);
        }
        self.shut_down(event_loop);
    }

    /// Close the sample source and hand back the run summary.
    fn finish(self) -> (Option<FrameSummary>, Option<anyhow::Error>) {
        let summary = self.render_loop.map(RenderLoop::finish);
        (summary, self.failure)
    }

    fn init_gpu(&self, window: Arc<Window>) -> Result<GpuState> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let (device, queue, adapter) = pollster::block_on(async {
            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::default(),
                    compatible_surface: Some(&surface),
                    force_fallback_adapter: false,
                })
                .await
                .ok_or_else(|| anyhow!("No suitable GPU adapter found"))?;

            info!(name = adapter.get_info().name, "Using GPU");

            let (device, queue) = adapter
                .request_device(
                    &wgpu::DeviceDescriptor {
                        label: Some("teapot_device"),
                        required_features: wgpu::Features::empty(),
                        required_limits: wgpu::Limits::downlevel_defaults(),
                        memory_hints: Default::default(),
                    },
                    None,
                )
                .await
                .context("Failed to create device")?;

            Ok::<_, anyhow::Error>((device, queue, adapter))
        })?;

        let win_size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("Surface reports no texture formats"))?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: win_size.width.max(1),
            height: win_size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let renderer = ModelRenderer::new(
            &device,
            format,
            (surface_config.width, surface_config.height),
            &self.meshes,
            self.config.display.clear_color,
        );

        let mut camera = Camera::new(&self.config.display);
        camera.set_viewport(surface_config.width, surface_config.height);

        Ok(GpuState {
            device,
            queue,
            surface,
            surface_config,
            renderer,
            camera,
        })
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(gpu), Some(render_loop)) = (&mut self.gpu, &mut self.render_loop) else {
            return;
        };

        let overlay = self
            .controller
            .as_ref()
            .map(|c| c.state().matrix())
            .unwrap_or(Mat4::IDENTITY);

        let transform = match render_loop.tick(overlay) {
            Ok(Some(transform)) => transform,
            Ok(None) => {
                event_loop.exit();
                return;
            }
            Err(e) => {
                self.fail(event_loop, e.into());
                return;
            }
        };

        match gpu.surface.get_current_texture() {
            Ok(output) => {
                let view = output
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                let mut encoder = gpu
                    .device
                    .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                        label: Some("frame_encoder"),
                    });
                gpu.renderer
                    .render(&gpu.queue, &mut encoder, &view, &gpu.camera, transform);
                gpu.queue.submit(std::iter::once(encoder.finish()));
                output.present();
                render_loop.record_frame();
            }
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.surface_config);
            }
            Err(e) => {
                warn!(?e, "Failed to get surface texture");
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
            return;
        }

        let (width, height) = self.config.display.size;
        let attrs = Window::default_attributes()
            .with_title(self.config.display.title.clone())
            .with_inner_size(PhysicalSize::new(width, height));

        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.fail(event_loop, anyhow!(e).context("Failed to create window"));
                return;
            }
        };
        self.window = Some(window.clone());

        match self.init_gpu(window.clone()) {
            Ok(gpu) => {
                self.gpu = Some(gpu);
                self.meshes.clear();
                info!(width, height, "Application initialized");
                window.request_redraw();
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => self.shut_down(event_loop),

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape)
                {
                    self.shut_down(event_loop);
                }
            }

            WindowEvent::Resized(size) => {
                if size.width > 0 && size.height > 0 {
                    if let Some(gpu) = &mut self.gpu {
                        gpu.surface_config.width = size.width;
                        gpu.surface_config.height = size.height;
                        gpu.surface.configure(&gpu.device, &gpu.surface_config);
                        gpu.renderer.resize(&gpu.device, size.width, size.height);
                        gpu.camera.set_viewport(size.width, size.height);
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                if let Some(controller) = &mut self.controller {
                    controller.on_cursor_moved(position.x, position.y);
                }
            }

            WindowEvent::MouseInput { button, state, .. } => {
                if let Some(controller) = &mut self.controller {
                    controller.on_mouse_button(button, state);
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(controller) = &mut self.controller {
                    controller.on_scroll(delta);
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }
}

/// Build the geometry for the configured scene.
fn load_meshes(config: &AppConfig) -> Result<Vec<Mesh>> {
    match &config.scene.target {
        DrawTarget::Model { path, color } => {
            let mesh = teapot_renderer::load_obj(path, *color)
                .with_context(|| format!("Failed to load model {}", path.display()))?;
            Ok(vec![mesh])
        }
        DrawTarget::Axes => Ok(vec![
            teapot_renderer::slab_mesh(),
            teapot_renderer::axes_mesh(2.0, 0.2),
        ]),
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    match &cli.config {
        Some(path) => teapot_config::load_config_from(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(teapot_config::load_config().unwrap_or_else(|e| {
            warn!(?e, "Failed to load config, using defaults");
            AppConfig::default()
        })),
    }
}

fn main() -> Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "teapot_app=info,teapot_config=info,teapot_imu=info,teapot_renderer=info".into()
            }),
        )
        .init();

    let cli = Cli::parse();

    let mut config = load_config(&cli)?;
    cli.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    if cli.init_config {
        let path = match &cli.config {
            Some(path) => path.clone(),
            None => teapot_config::config_path()?,
        };
        teapot_config::save_config_to(&config, &path)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    info!(
        mode = ?config.sample_mode,
        target = ?config.scene.target,
        overlay = config.overlay.enabled,
        "Config loaded"
    );

    let meshes = load_meshes(&config)?;

    let source = if config.transport.is_disabled() {
        info!("No sensor configured, drawing the scene at rest");
        None
    } else {
        let source =
            SampleSource::connect(&config.transport, config.sample_mode, config.calibration)
                .context("Failed to open sample transport")?;
        Some(source)
    };
    let render_loop = RenderLoop::new(source, ScenePose::from_config(&config.scene));

    let mut app = App::new(config, meshes, render_loop);
    let run = match EventLoop::new() {
        Ok(event_loop) => event_loop.run_app(&mut app).map_err(anyhow::Error::from),
        Err(e) => Err(e.into()),
    };

    let (summary, failure) = app.finish();
    if let Some(summary) = summary {
        println!("fps: {}", summary.fps as u64);
    }

    run?;
    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
