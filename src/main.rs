//! Meadow - grass field viewer
//!
//! Flies a scripted orbit camera over a procedural terrain so every LOD range
//! is visited. `--settings <path>` loads grass settings from JSON,
//! `--seed <n>` overrides the seed. Esc closes.

use std::path::PathBuf;
use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use meadow::core::{
    camera::Camera,
    logging,
    time::FrameClock,
    types::Vec3,
    Result,
};
use meadow::grass::{FieldStats, GrassField, GrassSettings};
use meadow::render::{context::GpuContext, texture::DepthTexture};
use meadow::terrain::{NoiseTerrain, TerrainParams};

const SKY_COLOR: wgpu::Color = wgpu::Color { r: 0.55, g: 0.72, b: 0.92, a: 1.0 };

/// Camera path circling the field center while its radius breathes in and out
struct OrbitPath {
    center: Vec3,
    min_radius: f32,
    max_radius: f32,
    /// Seconds for one in-out radius sweep
    period: f32,
}

impl OrbitPath {
    fn radius(&self, t: f32) -> f32 {
        let s = 0.5 - 0.5 * (t * std::f32::consts::TAU / self.period).cos();
        self.min_radius + (self.max_radius - self.min_radius) * s
    }

    fn apply(&self, camera: &mut Camera, t: f32) {
        let radius = self.radius(t);
        let angle = t * 0.15;
        camera.position = self.center + Vec3::new(angle.cos() * radius, 3.0 + radius * 0.12, angle.sin() * radius);
        camera.look_at(self.center, Vec3::Y);
    }
}

struct Scene {
    field: GrassField,
    depth: DepthTexture,
    last_stats: FieldStats,
}

struct App {
    settings: GrassSettings,
    window: Option<Arc<Window>>,
    gpu: Option<GpuContext>,
    scene: Option<Scene>,
    camera: Camera,
    orbit: OrbitPath,
    clock: FrameClock,
}

impl App {
    fn new(settings: GrassSettings) -> Self {
        let terrain = TerrainParams::default();
        let center = Vec3::new(terrain.width * 0.5, 0.0, terrain.depth * 0.5);
        let far = settings.lod.max_distance();

        let mut camera = Camera::new(center + Vec3::new(0.0, 5.0, 10.0), 60.0, 16.0 / 9.0);
        camera.far = far * 2.0;

        Self {
            orbit: OrbitPath {
                center,
                min_radius: 4.0,
                max_radius: far,
                period: 60.0,
            },
            settings,
            window: None,
            gpu: None,
            scene: None,
            camera,
            clock: FrameClock::new(),
        }
    }

    fn build_scene(&self, gpu: &GpuContext) -> Result<Scene> {
        let terrain = NoiseTerrain::new(TerrainParams {
            seed: self.settings.seed as u32,
            ..Default::default()
        });
        let field = GrassField::new(
            &gpu.device,
            &gpu.queue,
            gpu.format(),
            self.settings.clone(),
            &terrain,
            Vec3::ZERO,
        )?;
        let (width, height) = gpu.size();

        Ok(Scene {
            field,
            depth: DepthTexture::new(&gpu.device, width, height),
            last_stats: FieldStats::default(),
        })
    }

    fn render(&mut self) -> Result<()> {
        let (Some(gpu), Some(scene)) = (&self.gpu, &mut self.scene) else {
            return Ok(());
        };

        self.orbit.apply(&mut self.camera, self.clock.elapsed_secs());

        let frame = gpu.get_current_texture()?;
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame_encoder"),
        });

        scene.field.update(&gpu.queue, &mut encoder, &self.camera, &self.clock)?;

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("grass_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(SKY_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: scene.depth.view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            scene.last_stats = scene.field.render(&mut pass, &self.camera.frustum());
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn update_title(&self) {
        let (Some(window), Some(scene)) = (&self.window, &self.scene) else {
            return;
        };
        let stats = scene.last_stats;
        window.set_title(&format!(
            "Meadow - {:.1} FPS | r={:.0}m | {} | {} blades",
            self.clock.fps(),
            self.orbit.radius(self.clock.elapsed_secs()),
            stats,
            stats.primitives(scene.field.settings())
        ));
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title("Meadow")
            .with_inner_size(PhysicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let gpu = match pollster::block_on(GpuContext::new(window.clone())) {
            Ok(gpu) => gpu,
            Err(e) => {
                log::error!("Failed to create GPU context: {}", e);
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.camera.set_aspect(size.width.max(1) as f32, size.height.max(1) as f32);
        log::info!("Window created: {}x{}", size.width, size.height);

        match self.build_scene(&gpu) {
            Ok(scene) => self.scene = Some(scene),
            Err(e) => {
                log::error!("Failed to build grass field: {}", e);
                event_loop.exit();
                return;
            }
        }

        self.window = Some(window);
        self.gpu = Some(gpu);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if size.width > 0 && size.height > 0 {
                    if let Some(gpu) = &mut self.gpu {
                        gpu.resize(size.width, size.height);
                        self.camera.set_aspect(size.width as f32, size.height as f32);
                        if let Some(scene) = &mut self.scene {
                            scene.depth.resize(&gpu.device, size.width, size.height);
                        }
                    }
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state.is_pressed() && event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                    event_loop.exit();
                }
            }
            WindowEvent::RedrawRequested => {
                self.clock.tick();

                if let Err(e) = self.render() {
                    // Lost/outdated surfaces recover after the next resize
                    log::warn!("Frame skipped: {}", e);
                }

                if self.clock.frame_count() % 30 == 0 {
                    self.update_title();
                }

                if let Some(w) = &self.window {
                    w.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Value following `flag` on the command line
fn parse_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn load_settings(args: &[String]) -> Result<GrassSettings> {
    let mut settings = match parse_arg(args, "--settings") {
        Some(path) => GrassSettings::load(PathBuf::from(path))?,
        None => GrassSettings::default(),
    };
    if let Some(seed) = parse_arg(args, "--seed") {
        match seed.parse() {
            Ok(seed) => settings.seed = seed,
            Err(_) => log::warn!("Ignoring invalid --seed '{}'", seed),
        }
    }
    settings.validate()?;
    Ok(settings)
}

fn main() {
    logging::init();
    log::info!("Meadow starting...");

    let args: Vec<String> = std::env::args().collect();
    let settings = match load_settings(&args) {
        Ok(s) => s,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };
    log::info!(
        "Grass: patch_size={} resolution={} seed={}",
        settings.patch_size,
        settings.grass_data_resolution,
        settings.seed
    );

    let event_loop = match EventLoop::new() {
        Ok(el) => el,
        Err(e) => {
            log::error!("Failed to create event loop: {}", e);
            std::process::exit(1);
        }
    };
    let mut app = App::new(settings);

    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {}", e);
    }
}
