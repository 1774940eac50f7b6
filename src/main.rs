// Walk an avatar through a static city.
// The simulation ticks once per redraw; everything on screen is an instanced
// unit cube scaled to a mesh's bounding box, drawn in a single call.

mod engine;

use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use glam::{Mat4, Vec3, Vec4};
use wgpu::util::DeviceExt;
use winit::{
    event::{ElementState, Event as WinitEvent, KeyEvent, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use engine::bounds::Aabb;
use engine::camera::FollowCamera;
use engine::components::LoadState;
use engine::debug_overlay::{DebugOverlay, DebugStats, OccluderOutline};
use engine::input::{InputState, JoystickEvent};
use engine::{AssetKind, AssetLoader, AssetSource, Cli, SimulationClock};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("failed to create render surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible GPU adapter found")]
    NoAdapter,

    #[error("failed to open GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}

// ============================================================================
// VERTEX DEFINITION
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 3],
}

impl Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

// ============================================================================
// INSTANCE DATA (per-box)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct InstanceData {
    model: [[f32; 4]; 4],
    color: [f32; 4],
}

impl InstanceData {
    const ATTRIBS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        1 => Float32x4,
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
    ];

    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,  // One per instance, not per vertex
            attributes: &Self::ATTRIBS,
        }
    }

    /// Unit cube stretched over `bounds`, then placed by `world`.
    fn for_box(world: Mat4, bounds: &Aabb, color: [f32; 3]) -> Self {
        let fit = Mat4::from_translation(bounds.center()) * Mat4::from_scale(bounds.size());
        Self {
            model: (world * fit).to_cols_array_2d(),
            color: [color[0], color[1], color[2], 1.0],
        }
    }
}

// Unit cube centred on the origin
const CUBE_VERTICES: &[Vertex] = &[
    Vertex { position: [-0.5, -0.5,  0.5] },
    Vertex { position: [ 0.5, -0.5,  0.5] },
    Vertex { position: [ 0.5,  0.5,  0.5] },
    Vertex { position: [-0.5,  0.5,  0.5] },
    Vertex { position: [-0.5, -0.5, -0.5] },
    Vertex { position: [ 0.5, -0.5, -0.5] },
    Vertex { position: [ 0.5,  0.5, -0.5] },
    Vertex { position: [-0.5,  0.5, -0.5] },
];

const CUBE_INDICES: &[u16] = &[
    0, 1, 2,  0, 2, 3,  // Front
    5, 4, 7,  5, 7, 6,  // Back
    4, 0, 3,  4, 3, 7,  // Left
    1, 5, 6,  1, 6, 2,  // Right
    3, 2, 6,  3, 6, 7,  // Top
    4, 5, 1,  4, 1, 0,  // Bottom
];

// ============================================================================
// UNIFORM DATA
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    light_dir: [f32; 4],
}

impl Uniforms {
    fn new() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            light_dir: [10.0, 10.0, 5.0, 0.0],
        }
    }
}

fn create_depth_view(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

// ============================================================================
// FRAME TIMING
// ============================================================================

/// Rolling one-second window of frame times.
struct FrameTimer {
    window_start: Instant,
    last_frame: Instant,
    frames: u32,
    sum_ms: f32,
    min_ms: f32,
    max_ms: f32,
    // Last completed window
    fps: u32,
    avg_ms: f32,
    shown_min_ms: f32,
    shown_max_ms: f32,
}

impl FrameTimer {
    fn new() -> Self {
        let now = Instant::now();
        Self {
            window_start: now,
            last_frame: now,
            frames: 0,
            sum_ms: 0.0,
            min_ms: f32::MAX,
            max_ms: 0.0,
            fps: 0,
            avg_ms: 0.0,
            shown_min_ms: 0.0,
            shown_max_ms: 0.0,
        }
    }

    /// Record a frame. Returns true when a one-second window just closed.
    fn frame(&mut self) -> bool {
        let now = Instant::now();
        let ms = (now - self.last_frame).as_secs_f32() * 1000.0;
        self.last_frame = now;
        self.frames += 1;
        self.sum_ms += ms;
        self.min_ms = self.min_ms.min(ms);
        self.max_ms = self.max_ms.max(ms);

        if (now - self.window_start).as_secs_f32() < 1.0 {
            return false;
        }
        self.fps = self.frames;
        self.avg_ms = self.sum_ms / self.frames as f32;
        self.shown_min_ms = self.min_ms;
        self.shown_max_ms = self.max_ms;
        self.window_start = now;
        self.frames = 0;
        self.sum_ms = 0.0;
        self.min_ms = f32::MAX;
        self.max_ms = 0.0;
        true
    }
}

// ============================================================================
// APPLICATION STATE
// ============================================================================

struct State {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    render_pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    depth_view: wgpu::TextureView,
    num_indices: u32,
    max_instances: usize,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,

    // Simulation
    clock: SimulationClock,
    loader: AssetLoader,
    input: InputState,
    camera: FollowCamera,

    overlay: DebugOverlay,
    timer: FrameTimer,
    last_instance_count: usize,
}

impl State {
    async fn new(window: Arc<Window>, clock: SimulationClock, loader: AssetLoader) -> Result<Self, StartupError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(StartupError::NoAdapter)?;
        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);
        let depth_view = create_depth_view(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader_instanced.wgsl").into()),
        });

        let uniforms = Uniforms::new();

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("uniform_bind_group_layout"),
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("uniform_bind_group"),
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Render Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc(), InstanceData::desc()],  // Vertex + Instance buffers
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // glTF nodes may carry mirroring scales, which flip winding.
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(CUBE_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(CUBE_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        // Create instance buffer (large enough for a dense city)
        let max_instances = 10000;
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Instance Buffer"),
            size: (max_instances * std::mem::size_of::<InstanceData>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let num_indices = CUBE_INDICES.len() as u32;

        let overlay = DebugOverlay::new(&window, &device, surface_format);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            render_pipeline,
            vertex_buffer,
            index_buffer,
            instance_buffer,
            depth_view,
            num_indices,
            max_instances,
            uniform_buffer,
            uniform_bind_group,
            clock,
            loader,
            input: InputState::new(),
            camera: FollowCamera::new(),
            overlay,
            timer: FrameTimer::new(),
            last_instance_count: 0,
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_view(&self.device, &self.config);
        }
    }

    /// One frame of simulation: finished loads, then input, then the tick.
    fn update(&mut self) {
        for event in self.loader.poll() {
            self.clock.apply_load(event);
        }

        match self.input.poll_joystick() {
            Some(JoystickEvent::Move(sample)) => self.clock.on_move(sample),
            Some(JoystickEvent::End) => self.clock.on_release(),
            None => {}
        }

        self.clock.tick();

        let focus = self.clock.pose().map(|p| p.position).unwrap_or(Vec3::ZERO);
        self.camera.update(&self.input, focus);
    }

    /// Box instances for the environment (shifted by the scroll offset) and
    /// the posed avatar.
    fn collect_instances(&mut self) -> Vec<InstanceData> {
        let mut instances = Vec::new();

        if let Some(env) = self.clock.environment_model() {
            let offset = Mat4::from_translation(self.clock.environment_offset());
            let world = env.world_matrices();
            for (id, node) in env.nodes().iter().enumerate() {
                if let Some(bounds) = node.mesh_bounds {
                    instances.push(InstanceData::for_box(offset * world[id], &bounds, node.color));
                }
            }
        }

        let pose = self.clock.pose();
        let skeleton = self.clock.skeleton();
        if let (Some(pose), Some(model)) = (pose, self.clock.avatar_model()) {
            let root = Mat4::from_translation(pose.position) * Mat4::from_rotation_y(pose.facing);
            let world = model.world_matrices_with(|id, node| {
                match skeleton.and_then(|s| s.pose_for(id, &pose.joints)) {
                    Some((x, z)) => node.local_matrix_with_euler(x, None, z),
                    None => node.local_matrix(),
                }
            });
            for (id, node) in model.nodes().iter().enumerate() {
                if let Some(bounds) = node.mesh_bounds {
                    instances.push(InstanceData::for_box(root * world[id], &bounds, node.color));
                }
            }
        }

        instances
    }

    /// Screen rectangles of every occluder fully in front of the camera.
    fn occluder_outlines(&self, view_proj: Mat4) -> Vec<OccluderOutline> {
        let offset = self.clock.environment_offset();
        let scale = self.window.scale_factor() as f32;
        let (w, h) = (self.size.width as f32 / scale, self.size.height as f32 / scale);

        self.clock
            .index()
            .boxes()
            .iter()
            .filter_map(|b| {
                let mut min = egui::pos2(f32::MAX, f32::MAX);
                let mut max = egui::pos2(f32::MIN, f32::MIN);
                for corner in b.translated(offset).corners() {
                    let clip = view_proj * Vec4::from((corner, 1.0));
                    if clip.w <= 0.0 {
                        return None;
                    }
                    let ndc = clip.truncate() / clip.w;
                    let p = egui::pos2((ndc.x + 1.0) * 0.5 * w, (1.0 - ndc.y) * 0.5 * h);
                    min = min.min(p);
                    max = max.max(p);
                }
                Some(OccluderOutline { min, max })
            })
            .collect()
    }

    fn debug_stats(&mut self) -> DebugStats {
        let pose = self.clock.pose();
        let status = self.clock.status();
        let stats = self.clock.stats();
        let (vector, force) = self.clock.movement();
        let (walk_state, walk_phase) = self.clock.walk();
        let offset = self.clock.environment_offset();
        let label = |s: LoadState| format!("{:?}", s);

        DebugStats {
            fps: self.timer.fps,
            frame_time_avg_ms: self.timer.avg_ms,
            frame_time_min_ms: self.timer.shown_min_ms,
            frame_time_max_ms: self.timer.shown_max_ms,
            resolution: (self.size.width, self.size.height),
            instance_count: self.last_instance_count,
            movement_frame: format!("{:?}", self.clock.config().movement_frame),
            avatar_status: label(status.avatar),
            environment_status: label(status.environment),
            occluders: self.clock.index().len(),
            avatar_position: pose.map(|p| (p.position.x, p.position.y, p.position.z)),
            facing_deg: pose.map(|p| p.facing.to_degrees()).unwrap_or(0.0),
            move_vector: (vector.x, vector.z),
            force,
            walk_state: format!("{:?}", walk_state),
            walk_phase,
            world_offset: (offset.x, offset.y, offset.z),
            ticks: stats.ticks,
            admitted: stats.admitted,
            blocked: stats.blocked,
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Collect instance data BEFORE creating render pass
        let instance_data = self.collect_instances();
        let instance_count = instance_data.len().min(self.max_instances);
        self.last_instance_count = instance_count;

        // Write instance data to buffer BEFORE render pass
        if !instance_data.is_empty() {
            self.queue.write_buffer(
                &self.instance_buffer,
                0,
                bytemuck::cast_slice(&instance_data[..instance_count]),
            );
        }

        // Update camera uniforms
        let aspect = self.size.width as f32 / self.size.height.max(1) as f32;
        let view_proj = self.camera.view_projection(aspect);
        let uniforms = Uniforms {
            view_proj: view_proj.to_cols_array_2d(),
            ..Uniforms::new()
        };

        self.queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.55,
                            g: 0.70,
                            b: 0.85,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));  // Instance data
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);

            // ONE DRAW CALL for all boxes
            render_pass.draw_indexed(0..self.num_indices, 0, 0..instance_count as u32);
        }

        if self.overlay.visible || self.overlay.show_occluders {
            let stats = self.overlay.visible.then(|| self.debug_stats());
            let outlines = self.overlay.show_occluders.then(|| self.occluder_outlines(view_proj));
            let screen_descriptor = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [self.config.width, self.config.height],
                pixels_per_point: self.window.scale_factor() as f32,
            };
            self.overlay.render(
                &self.device,
                &self.queue,
                &mut encoder,
                &self.window,
                &view,
                &screen_descriptor,
                stats.as_ref(),
                outlines.as_deref(),
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    fn log_frame_stats(&mut self) {
        let status = self.clock.status();
        let stats = self.clock.stats();
        log::info!(
            "FPS: {} | Boxes: {} | avatar {:?} env {:?} | admitted {} blocked {}",
            self.timer.fps,
            self.last_instance_count,
            status.avatar,
            status.environment,
            stats.admitted,
            stats.blocked,
        );
    }
}

// ============================================================================
// MAIN
// ============================================================================

fn start_loading(loader: &AssetLoader, cli: &Cli, floor_name: &str) {
    let avatar = match &cli.avatar {
        Some(path) => AssetSource::Gltf(path.clone()),
        None => AssetSource::ProceduralHumanoid,
    };
    let environment = match &cli.environment {
        Some(path) => AssetSource::Gltf(path.clone()),
        None => AssetSource::ProceduralCity {
            seed: cli.city_seed,
            floor_name: floor_name.to_string(),
        },
    };
    loader.load(AssetKind::Avatar, avatar);
    loader.load(AssetKind::Environment, environment);
}

fn run(cli: Cli) -> Result<(), StartupError> {
    let sim_config = cli.sim_config();
    log::info!(
        "movement frame {:?}, collision pad {}, floor mesh {:?}",
        sim_config.movement_frame,
        sim_config.collision_pad,
        sim_config.floor_mesh_name
    );

    let loader = AssetLoader::new();
    start_loading(&loader, &cli, &sim_config.floor_mesh_name);
    let clock = SimulationClock::new(sim_config);

    let event_loop = EventLoop::new()?;

    let window_attributes = Window::default_attributes()
        .with_title("City Stroll - WASD / arrows or drag to walk, Shift to run, F3 stats, F4 occluders")
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

    let window = Arc::new(event_loop.create_window(window_attributes)?);

    let mut state = pollster::block_on(State::new(window.clone(), clock, loader))?;

    event_loop.run(move |event, control_flow| {
        match event {
            WinitEvent::WindowEvent {
                ref event,
                window_id,
            } if window_id == window.id() => {
                let _ = state.overlay.handle_window_event(&window, event);
                state.input.process_event(event);

                match event {
                    WindowEvent::CloseRequested
                    | WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                state: ElementState::Pressed,
                                physical_key: PhysicalKey::Code(KeyCode::Escape),
                                ..
                            },
                        ..
                    } => control_flow.exit(),
                    WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                state: ElementState::Pressed,
                                physical_key: PhysicalKey::Code(key),
                                repeat: false,
                                ..
                            },
                        ..
                    } => match key {
                        KeyCode::F3 => state.overlay.toggle(),
                        KeyCode::F4 => state.overlay.toggle_occluders(),
                        _ => {}
                    },
                    WindowEvent::Resized(physical_size) => {
                        state.resize(*physical_size);
                    }
                    WindowEvent::RedrawRequested => {
                        state.update();
                        match state.render() {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost) => state.resize(state.size),
                            Err(wgpu::SurfaceError::OutOfMemory) => control_flow.exit(),
                            Err(e) => log::warn!("{:?}", e),
                        }
                        state.input.end_frame();

                        if state.timer.frame() {
                            state.log_frame_stats();
                        }
                    }
                    _ => {}
                }
            }
            WinitEvent::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
