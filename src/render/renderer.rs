use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

use super::bloom::BloomPipeline;
use super::common::{helper_lines, SceneUniform};
use super::shared::SCENE_SHADER;
use crate::render_loop::Compositor;
use crate::scene::SceneGraph;

/// What the host should do after a failed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceAction {
    /// The surface was reconfigured; the next frame should succeed.
    Reconfigured,
    /// Transient failure; try again next frame.
    SkipFrame,
    /// The device cannot continue.
    Fatal,
}

/// GPU renderer: draws the plane and the light marker offscreen, then lets
/// the bloom pipeline composite the result onto the window surface.
pub struct Renderer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth: DepthBuffer,
    mesh_pipeline: wgpu::RenderPipeline,
    helper_pipeline: wgpu::RenderPipeline,
    scene_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    plane: PlaneBuffers,
    helper_vertices: wgpu::Buffer,
    helper_vertex_count: u32,
    bloom: BloomPipeline,
}

impl Renderer {
    /// Initializes the device, the surface and every pipeline for `scene`.
    pub async fn new(window: Arc<Window>, scene: &SceneGraph) -> Result<Self> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(anyhow!("window has zero area"));
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: BACKENDS,
            ..Default::default()
        });
        let surface = instance.create_surface(Arc::clone(&window))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to acquire GPU adapter")?;
        let adapter_info = adapter.get_info();
        info!(
            "Selected GPU: {} ({:?})",
            adapter_info.name, adapter_info.backend
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("backdrop-device"),
                required_features: wgpu::Features::empty(),
                required_limits: required_limits(&adapter),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|format| format.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no supported formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::AutoVsync,
            desired_maximum_frame_latency: 2,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let buffer_size = scene.renderer.size.drawing_buffer();
        let depth = DepthBuffer::create(&device, buffer_size);
        let bloom = BloomPipeline::new(
            &device,
            OFFSCREEN_FORMAT,
            surface_format,
            buffer_size,
            scene.composer.bloom().unwrap_or_default(),
        );

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene-shader"),
            source: wgpu::ShaderSource::Wgsl(SCENE_SHADER.into()),
        });

        let scene_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene-bind-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<SceneUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene-pipeline-layout"),
            bind_group_layouts: &[&scene_layout],
            immediate_size: 0,
        });

        let uniform = SceneUniform::from_scene(scene);
        let scene_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("scene-uniform"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene-bind-group"),
            layout: &scene_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buffer.as_entire_binding(),
            }],
        });

        let mesh_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("plane-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_mesh"),
                compilation_options: Default::default(),
                buffers: &[POSITION_LAYOUT, COLOR_LAYOUT],
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                ..Default::default()
            },
            depth_stencil: Some(DepthBuffer::state()),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_mesh"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: OFFSCREEN_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview_mask: None,
            cache: None,
        });

        let helper_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("light-helper-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_helper"),
                compilation_options: Default::default(),
                buffers: &[POSITION_LAYOUT],
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(DepthBuffer::state()),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_helper"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: OFFSCREEN_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview_mask: None,
            cache: None,
        });

        let plane = PlaneBuffers::from_scene(&device, scene);
        let lines = helper_lines();
        let helper_vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("light-helper-vertices"),
            contents: bytemuck::cast_slice(&lines),
            usage: wgpu::BufferUsages::VERTEX,
        });

        info!(
            "Renderer ready: surface {}x{} {:?}, offscreen {}x{} {:?}",
            config.width, config.height, surface_format, buffer_size.0, buffer_size.1, OFFSCREEN_FORMAT
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            depth,
            mesh_pipeline,
            helper_pipeline,
            scene_buffer,
            scene_bind_group,
            plane,
            helper_vertices,
            helper_vertex_count: lines.len() as u32,
            bloom,
        })
    }

    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Reconfigures the surface for `window_size` and reallocates the
    /// offscreen targets at `buffer_size`.
    pub fn resize(&mut self, window_size: PhysicalSize<u32>, buffer_size: (u32, u32)) {
        if window_size.width == 0 || window_size.height == 0 {
            return;
        }
        self.config.width = window_size.width;
        self.config.height = window_size.height;
        self.surface.configure(&self.device, &self.config);
        if buffer_size != self.bloom.size() {
            self.depth = DepthBuffer::create(&self.device, buffer_size);
            self.bloom.resize(&self.device, buffer_size);
        }
    }

    /// Maps a failed frame to a recovery action, reconfiguring when the surface went stale.
    pub fn handle_surface_error(&mut self, err: &wgpu::SurfaceError) -> SurfaceAction {
        match err {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                self.surface.configure(&self.device, &self.config);
                SurfaceAction::Reconfigured
            }
            wgpu::SurfaceError::OutOfMemory => SurfaceAction::Fatal,
            wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => {
                warn!("Skipping frame: {err}");
                SurfaceAction::SkipFrame
            }
        }
    }

    fn upload(&mut self, scene: &mut SceneGraph) {
        let uniform = SceneUniform::from_scene(scene);
        self.queue
            .write_buffer(&self.scene_buffer, 0, bytemuck::bytes_of(&uniform));
        if scene.mesh.colors.take_update() {
            self.queue.write_buffer(
                &self.plane.colors,
                0,
                bytemuck::cast_slice(&scene.mesh.colors.as_floats()),
            );
        }
        if let Some(bloom) = scene.composer.bloom() {
            if bloom != self.bloom.config() {
                self.bloom.update_config(&self.device, &self.queue, bloom);
            }
        }
    }
}

impl Compositor for Renderer {
    type Error = wgpu::SurfaceError;

    fn render(&mut self, scene: &mut SceneGraph) -> Result<(), wgpu::SurfaceError> {
        self.upload(scene);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("backdrop-encoder"),
            });

        let clear = scene.renderer.clear_color;
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.bloom.scene_view(),
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(clear.r),
                            g: f64::from(clear.g),
                            b: f64::from(clear.b),
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
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

            pass.set_bind_group(0, &self.scene_bind_group, &[]);
            pass.set_pipeline(&self.mesh_pipeline);
            pass.set_vertex_buffer(0, self.plane.positions.slice(..));
            pass.set_vertex_buffer(1, self.plane.colors.slice(..));
            pass.set_index_buffer(self.plane.indices.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..self.plane.index_count, 0, 0..1);

            pass.set_pipeline(&self.helper_pipeline);
            pass.set_vertex_buffer(0, self.helper_vertices.slice(..));
            pass.draw(0..self.helper_vertex_count, 0..1);
        }

        self.bloom.execute(&mut encoder, &view);
        self.queue.submit(std::iter::once(encoder.finish()));
        self.window.pre_present_notify();
        output.present();
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
const BACKENDS: wgpu::Backends = wgpu::Backends::PRIMARY;
#[cfg(target_arch = "wasm32")]
const BACKENDS: wgpu::Backends = wgpu::Backends::GL;

/// HDR where available; WebGL2 cannot render to half floats without an extension.
#[cfg(not(target_arch = "wasm32"))]
const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
#[cfg(target_arch = "wasm32")]
const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

#[cfg(not(target_arch = "wasm32"))]
fn required_limits(adapter: &wgpu::Adapter) -> wgpu::Limits {
    wgpu::Limits::default().using_resolution(adapter.limits())
}

#[cfg(target_arch = "wasm32")]
fn required_limits(adapter: &wgpu::Adapter) -> wgpu::Limits {
    wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits())
}

const POSITION_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: (3 * std::mem::size_of::<f32>()) as u64,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x3,
        offset: 0,
        shader_location: 0,
    }],
};

const COLOR_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: (3 * std::mem::size_of::<f32>()) as u64,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x3,
        offset: 0,
        shader_location: 1,
    }],
};

struct PlaneBuffers {
    positions: wgpu::Buffer,
    colors: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

impl PlaneBuffers {
    fn from_scene(device: &wgpu::Device, scene: &SceneGraph) -> Self {
        let geometry = &scene.mesh.geometry;
        let positions: Vec<[f32; 3]> = geometry.positions().iter().map(|p| p.to_array()).collect();
        let positions = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("plane-positions"),
            contents: bytemuck::cast_slice(&positions),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let colors = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("plane-colors"),
            contents: bytemuck::cast_slice(&scene.mesh.colors.as_floats()),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("plane-indices"),
            contents: bytemuck::cast_slice(geometry.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            positions,
            colors,
            indices,
            index_count: geometry.indices().len() as u32,
        }
    }
}

struct DepthBuffer {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthBuffer {
    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

    fn create(device: &wgpu::Device, (width, height): (u32, u32)) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth-texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }

    fn state() -> wgpu::DepthStencilState {
        wgpu::DepthStencilState {
            format: Self::FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }
    }
}
