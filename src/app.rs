// ============================================================================
// app.rs — Branches
// Application state and winit event-loop handler: one cycle frame per tick
// of a fixed 60 fps clock, presented on the redraw it requests.
// ============================================================================

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::ThreadRng;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow},
    keyboard::{Key, NamedKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::camera::Camera2D;
use crate::config::{frame_interval, CANVAS_SIZE, CLEAR_COLOR, TARGET_FPS};
use crate::cycle::CycleController;
use crate::gpu_canvas::GpuTextureAllocator;
use crate::pipeline::create_canvas_pipeline;
use crate::renderer::{HudInfo, HudRenderer};

// ======================== Application ========================

#[derive(Default)]
pub struct App {
    state: Option<AppState>,
}

struct AppState {
    // GPU
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    canvas_pipeline: wgpu::RenderPipeline,

    // Window
    window: Arc<Window>,

    // Simulation
    controller: CycleController<GpuTextureAllocator>,
    rng: ThreadRng,
    camera: Camera2D,

    // HUD
    hud: HudRenderer,

    // Timing
    pacer: FramePacer,
    step_due: bool,
    update_ms: f32,
    draw_ms: f32,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        match AppState::new(event_loop) {
            Ok(state) => {
                state.window.request_redraw();
                self.state = Some(state);
            }
            Err(err) => {
                log::error!("Startup failed: {err}");
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(state) = &mut self.state else {
            return;
        };
        if state.pacer.poll(Instant::now()) {
            state.step_due = true;
            state.window.request_redraw();
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(state.pacer.deadline()));
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(state) = &mut self.state else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state.is_pressed() && event.logical_key == Key::Named(NamedKey::Escape) {
                    event_loop.exit();
                }
            }

            WindowEvent::Resized(new_size) => {
                if new_size.width > 0 && new_size.height > 0 {
                    state.surface_config.width = new_size.width;
                    state.surface_config.height = new_size.height;
                    state.surface.configure(&state.device, &state.surface_config);
                }
            }

            WindowEvent::RedrawRequested => redraw(state),

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut state) = self.state.take() {
            state.controller.shutdown();
            log::info!(
                "Exiting after {} cycle(s)",
                state.controller.stats().cycle
            );
        }
    }
}

// ======================== GPU Initialization ========================

impl AppState {
    fn new(event_loop: &ActiveEventLoop) -> Result<Self, String> {
        let window_attrs = WindowAttributes::default()
            .with_title("branches")
            .with_inner_size(winit::dpi::LogicalSize::new(CANVAS_SIZE, CANVAS_SIZE));

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .map_err(|e| format!("failed to create window: {e}"))?,
        );

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| format!("failed to create surface: {e}"))?;

        let (device, queue, surface_config) =
            pollster::block_on(init_gpu(&instance, &surface, &window))?;
        surface.configure(&device, &surface_config);

        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let allocator = GpuTextureAllocator::new(Arc::clone(&device), Arc::clone(&queue));
        let canvas_pipeline =
            create_canvas_pipeline(&device, allocator.layout(), surface_config.format);
        let hud = HudRenderer::new(&device, &queue, surface_config.format);

        let mut rng = rand::thread_rng();
        let controller = CycleController::new(allocator, &mut rng);

        let side = controller.canvas().side();
        log::info!("Branches initialized: {}x{} canvas at {} fps", side, side, TARGET_FPS);

        Ok(Self {
            device,
            queue,
            surface,
            surface_config,
            canvas_pipeline,
            window,
            controller,
            rng,
            camera: Camera2D::default(),
            hud,
            pacer: FramePacer::new(frame_interval(), Instant::now()),
            step_due: false,
            update_ms: 0.0,
            draw_ms: 0.0,
        })
    }
}

async fn init_gpu(
    instance: &wgpu::Instance,
    surface: &wgpu::Surface<'_>,
    window: &Window,
) -> Result<(wgpu::Device, wgpu::Queue, wgpu::SurfaceConfiguration), String> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(surface),
            force_fallback_adapter: false,
        })
        .await
        .ok_or_else(|| String::from("no suitable GPU adapter (Vulkan, Metal, DX12 or GL)"))?;

    log::info!("GPU: {}", adapter.get_info().name);

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("branches_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
            },
            None,
        )
        .await
        .map_err(|e| format!("failed to create device: {e}"))?;

    let size = window.inner_size();
    let surface_caps = surface.get_capabilities(&adapter);
    let surface_format = surface_caps
        .formats
        .iter()
        .find(|f| f.is_srgb())
        .copied()
        .or_else(|| surface_caps.formats.first().copied())
        .ok_or_else(|| String::from("surface reports no supported formats"))?;

    // Frames are paced by the event loop; vsync only prevents tearing.
    let present_mode = if surface_caps.present_modes.contains(&wgpu::PresentMode::Mailbox) {
        wgpu::PresentMode::Mailbox
    } else {
        wgpu::PresentMode::Fifo
    };
    log::info!("Present mode: {:?}", present_mode);

    let surface_config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: surface_format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode,
        alpha_mode: surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto),
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    };

    Ok((device, queue, surface_config))
}

// ======================== Frame Pacing ========================

/// Fixed-rate frame clock. Each deadline is the previous one plus the
/// interval, so event-loop latency does not accumulate.
struct FramePacer {
    interval: Duration,
    deadline: Instant,
}

impl FramePacer {
    fn new(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            deadline: start,
        }
    }

    fn deadline(&self) -> Instant {
        self.deadline
    }

    /// True when a frame is due at `now`; schedules the following one.
    fn poll(&mut self, now: Instant) -> bool {
        if now < self.deadline {
            return false;
        }
        self.deadline += self.interval;
        // A stall longer than one interval drops the missed frames.
        if self.deadline <= now {
            self.deadline = now + self.interval;
        }
        true
    }
}

// ======================== Frame Rendering ========================

fn as_ms(elapsed: Duration) -> f32 {
    elapsed.as_secs_f32() * 1000.0
}

fn redraw(state: &mut AppState) {
    // ---- Simulation ----
    // Expose and resize redraws only repaint.
    if std::mem::take(&mut state.step_due) {
        let update_start = Instant::now();
        state.controller.frame(&mut state.rng);
        state.update_ms = as_ms(update_start.elapsed());
    }

    // ---- Camera ----
    let draw_start = Instant::now();
    let win_w = state.surface_config.width;
    let win_h = state.surface_config.height;
    state.camera.zoom = state.controller.zoom();
    state.camera.fit_viewport(win_w, win_h);
    state
        .controller
        .allocator()
        .write_camera(&state.camera.uniforms(win_w, win_h));

    // ---- HUD ----
    let info = HudInfo {
        pens: state.controller.pens().len(),
        phase: state.controller.phase(),
        cycle: state.controller.stats().cycle,
        zoom: state.controller.zoom(),
        update_ms: state.update_ms,
        draw_ms: state.draw_ms,
    };
    state
        .hud
        .prepare(&state.device, &state.queue, &info, win_w, win_h);

    // ---- Render pass ----
    let output = match state.surface.get_current_texture() {
        Ok(t) => t,
        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
            log::warn!("Surface lost or outdated; reconfiguring");
            state.surface.configure(&state.device, &state.surface_config);
            return;
        }
        Err(e) => {
            log::error!("Surface error: {:?}", e);
            return;
        }
    };

    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = state
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

    {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("canvas_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if let Some(texture) = state.controller.canvas().texture() {
            pass.set_pipeline(&state.canvas_pipeline);
            pass.set_bind_group(0, texture.bind_group(), &[]);
            pass.draw(0..6, 0..1);
        }

        state.hud.render(&mut pass);
    }

    state.queue.submit(std::iter::once(encoder.finish()));
    output.present();
    state.hud.trim();

    state.draw_ms = as_ms(draw_start.elapsed());
}
