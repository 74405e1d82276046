//! Bloom post-processing: luminance high-pass, five Gaussian-blurred levels
//! and an additive composite onto the swapchain image.
//!
//! The scene is drawn into [`BloomPipeline::scene_view`]; [`BloomPipeline::execute`]
//! then writes the final image to the surface, so the scene never reaches the
//! screen without bloom.

use wgpu::util::DeviceExt;

use super::common::{
    bloom_level_sizes, CompositeParams, PassParams, BLOOM_KERNEL_RADII, BLOOM_LEVELS,
};
use super::shared::{BLOOM_PASSES, COMPOSITE_PASS, FULLSCREEN_VERTEX};
use crate::config::BloomConfig;

struct Target {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl Target {
    fn create(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        (width, height): (u32, u32),
        label: &str,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

/// One fullscreen pass reading a single texture through [`PassParams`].
struct FilterPass {
    _params: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl FilterPass {
    fn create(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        source: &wgpu::TextureView,
        params: PassParams,
        label: &str,
    ) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(source),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });
        Self {
            _params: buffer,
            bind_group,
        }
    }
}

/// Size-dependent targets and bind groups, rebuilt on resize.
struct Chain {
    scene: Target,
    bright: Target,
    horizontal: Vec<Target>,
    vertical: Vec<Target>,
    bright_pass: FilterPass,
    blur_passes: Vec<(FilterPass, FilterPass)>,
    composite_bind_group: wgpu::BindGroup,
}

pub struct BloomPipeline {
    config: BloomConfig,
    format: wgpu::TextureFormat,
    size: (u32, u32),
    filter_layout: wgpu::BindGroupLayout,
    composite_layout: wgpu::BindGroupLayout,
    bright_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    sampler: wgpu::Sampler,
    composite_params: wgpu::Buffer,
    chain: Chain,
}

impl BloomPipeline {
    /// `format` is used for the scene and every blur target; `surface_format`
    /// is the swapchain format the composite writes to.
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        surface_format: wgpu::TextureFormat,
        size: (u32, u32),
        config: BloomConfig,
    ) -> Self {
        let filter_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("bloom-filter-shader"),
            source: wgpu::ShaderSource::Wgsl(format!("{FULLSCREEN_VERTEX}{BLOOM_PASSES}").into()),
        });
        let composite_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("bloom-composite-shader"),
            source: wgpu::ShaderSource::Wgsl(
                format!("{FULLSCREEN_VERTEX}{COMPOSITE_PASS}").into(),
            ),
        });

        let filter_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bloom-filter-bgl"),
            entries: &[uniform_entry(0), texture_entry(1), sampler_entry(2)],
        });
        let mut composite_entries = vec![uniform_entry(0), texture_entry(1)];
        composite_entries.extend((0..BLOOM_LEVELS as u32).map(|level| texture_entry(2 + level)));
        composite_entries.push(sampler_entry(2 + BLOOM_LEVELS as u32));
        let composite_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bloom-composite-bgl"),
            entries: &composite_entries,
        });

        let filter_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("bloom-filter-layout"),
            bind_group_layouts: &[&filter_layout],
            immediate_size: 0,
        });
        let composite_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("bloom-composite-layout"),
                bind_group_layouts: &[&composite_layout],
                immediate_size: 0,
            });

        let bright_pipeline = create_fullscreen_pipeline(
            device,
            &filter_shader,
            &filter_pipeline_layout,
            "fs_bright",
            format,
            "bloom-bright",
        );
        let blur_pipeline = create_fullscreen_pipeline(
            device,
            &filter_shader,
            &filter_pipeline_layout,
            "fs_blur",
            format,
            "bloom-blur",
        );
        let composite_pipeline = create_fullscreen_pipeline(
            device,
            &composite_shader,
            &composite_pipeline_layout,
            "fs_composite",
            surface_format,
            "bloom-composite",
        );

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("bloom-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let composite_params = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("bloom-composite-params"),
            contents: bytemuck::bytes_of(&CompositeParams::new(&config)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let chain = Chain::create(
            device,
            &filter_layout,
            &composite_layout,
            &sampler,
            &composite_params,
            format,
            size,
            &config,
        );

        Self {
            config,
            format,
            size,
            filter_layout,
            composite_layout,
            bright_pipeline,
            blur_pipeline,
            composite_pipeline,
            sampler,
            composite_params,
            chain,
        }
    }

    /// Target the scene pass renders into.
    pub fn scene_view(&self) -> &wgpu::TextureView {
        &self.chain.scene.view
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn config(&self) -> BloomConfig {
        self.config
    }

    /// Reallocates every target for a drawing buffer of `size`.
    pub fn resize(&mut self, device: &wgpu::Device, size: (u32, u32)) {
        if size == self.size {
            return;
        }
        self.size = size;
        self.chain = Chain::create(
            device,
            &self.filter_layout,
            &self.composite_layout,
            &self.sampler,
            &self.composite_params,
            self.format,
            size,
            &self.config,
        );
    }

    /// Changes strength and radius in place; a new threshold needs rebuilt passes.
    pub fn update_config(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, config: BloomConfig) {
        queue.write_buffer(
            &self.composite_params,
            0,
            bytemuck::bytes_of(&CompositeParams::new(&config)),
        );
        let threshold_changed = config.threshold != self.config.threshold;
        self.config = config;
        if threshold_changed {
            self.chain = Chain::create(
                device,
                &self.filter_layout,
                &self.composite_layout,
                &self.sampler,
                &self.composite_params,
                self.format,
                self.size,
                &self.config,
            );
        }
    }

    /// Bright pass, blur chain, then the composite into `surface_view`.
    pub fn execute(&self, encoder: &mut wgpu::CommandEncoder, surface_view: &wgpu::TextureView) {
        let chain = &self.chain;
        run_pass(
            encoder,
            &self.bright_pipeline,
            &chain.bright_pass.bind_group,
            &chain.bright.view,
            "bloom-bright",
        );
        for (level, (horizontal, vertical)) in chain.blur_passes.iter().enumerate() {
            run_pass(
                encoder,
                &self.blur_pipeline,
                &horizontal.bind_group,
                &chain.horizontal[level].view,
                "bloom-blur-h",
            );
            run_pass(
                encoder,
                &self.blur_pipeline,
                &vertical.bind_group,
                &chain.vertical[level].view,
                "bloom-blur-v",
            );
        }
        run_pass(
            encoder,
            &self.composite_pipeline,
            &chain.composite_bind_group,
            surface_view,
            "bloom-composite",
        );
    }
}

impl Chain {
    #[allow(clippy::too_many_arguments)]
    fn create(
        device: &wgpu::Device,
        filter_layout: &wgpu::BindGroupLayout,
        composite_layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        composite_params: &wgpu::Buffer,
        format: wgpu::TextureFormat,
        size: (u32, u32),
        config: &BloomConfig,
    ) -> Self {
        let levels = bloom_level_sizes(size.0, size.1);
        let scene = Target::create(device, format, size, "bloom-scene");
        let bright = Target::create(device, format, levels[0], "bloom-bright");
        let horizontal: Vec<Target> = levels
            .iter()
            .map(|&level| Target::create(device, format, level, "bloom-blur-h"))
            .collect();
        let vertical: Vec<Target> = levels
            .iter()
            .map(|&level| Target::create(device, format, level, "bloom-blur-v"))
            .collect();

        let bright_pass = FilterPass::create(
            device,
            filter_layout,
            sampler,
            &scene.view,
            PassParams::bright(config.threshold),
            "bloom-bright-params",
        );

        let blur_passes = levels
            .iter()
            .zip(BLOOM_KERNEL_RADII)
            .enumerate()
            .map(|(level, (&(width, height), radius))| {
                let source = if level == 0 {
                    &bright.view
                } else {
                    &vertical[level - 1].view
                };
                let horizontal_pass = FilterPass::create(
                    device,
                    filter_layout,
                    sampler,
                    source,
                    PassParams::blur(true, width, height, radius),
                    "bloom-blur-h-params",
                );
                let vertical_pass = FilterPass::create(
                    device,
                    filter_layout,
                    sampler,
                    &horizontal[level].view,
                    PassParams::blur(false, width, height, radius),
                    "bloom-blur-v-params",
                );
                (horizontal_pass, vertical_pass)
            })
            .collect();

        let mut entries = vec![
            wgpu::BindGroupEntry {
                binding: 0,
                resource: composite_params.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&scene.view),
            },
        ];
        entries.extend(vertical.iter().enumerate().map(|(level, target)| {
            wgpu::BindGroupEntry {
                binding: 2 + level as u32,
                resource: wgpu::BindingResource::TextureView(&target.view),
            }
        }));
        entries.push(wgpu::BindGroupEntry {
            binding: 2 + BLOOM_LEVELS as u32,
            resource: wgpu::BindingResource::Sampler(sampler),
        });
        let composite_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("bloom-composite-bg"),
            layout: composite_layout,
            entries: &entries,
        });

        Self {
            scene,
            bright,
            horizontal,
            vertical,
            bright_pass,
            blur_passes,
            composite_bind_group,
        }
    }
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn run_pass(
    encoder: &mut wgpu::CommandEncoder,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
    target: &wgpu::TextureView,
    label: &str,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    });
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.draw(0..3, 0..1);
}

fn create_fullscreen_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    fragment_entry: &str,
    target_format: wgpu::TextureFormat,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_fullscreen"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format: target_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview_mask: None,
        cache: None,
    })
}
