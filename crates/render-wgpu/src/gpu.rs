use bytemuck::{Pod, Zeroable};
use edgeview_common::{OutputSize, Rgba};
use edgeview_render::{
    ColorFormat, DispatchSize, FrameBackend, MeshDraw, MeshKind, PassEncoder, PassTracker,
    PostProcessTargets, RenderError, ResourceFactory, SamplerKind, TargetHandle,
};
use wgpu::util::DeviceExt;

use crate::meshes::{MeshData, Vertex};
use crate::shaders;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;
const EDGE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
/// Uniform slots available to `draw_mesh` per frame.
const MAX_DRAWS: u64 = 64;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct DrawUniforms {
    world: [[f32; 4]; 4],
    view_proj: [[f32; 4]; 4],
    tint: [f32; 4],
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, kind: MeshKind) -> Self {
        let data = MeshData::for_kind(kind);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_vertex_buffer"),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_index_buffer"),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
        }
    }
}

/// Shaders, pipelines, meshes and samplers. Independent of the output size.
struct DeviceObjects {
    scene_pipeline: wgpu::RenderPipeline,
    scene_bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    uniform_stride: u64,
    teapot: GpuMesh,
    cone: GpuMesh,
    tetrahedron: GpuMesh,
    edge_pipeline: wgpu::ComputePipeline,
    edge_layout: wgpu::BindGroupLayout,
    composite_pipeline: wgpu::RenderPipeline,
    composite_layout: wgpu::BindGroupLayout,
    point_clamp: wgpu::Sampler,
}

impl DeviceObjects {
    fn mesh(&self, kind: MeshKind) -> &GpuMesh {
        match kind {
            MeshKind::Teapot => &self.teapot,
            MeshKind::Cone => &self.cone,
            MeshKind::Tetrahedron => &self.tetrahedron,
        }
    }
}

/// Color, depth and edge buffers plus the bind groups that reference them.
struct SizeObjects {
    generation: u64,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    edge_bind_group: wgpu::BindGroup,
    composite_bind_group: wgpu::BindGroup,
}

/// One frame in flight. Passes drop before the encoder.
struct Frame {
    scene_pass: Option<wgpu::RenderPass<'static>>,
    edge_pass: Option<wgpu::ComputePass<'static>>,
    composite_pass: Option<wgpu::RenderPass<'static>>,
    draws: u64,
    encoder: wgpu::CommandEncoder,
    surface_view: wgpu::TextureView,
    surface_texture: wgpu::SurfaceTexture,
}

/// wgpu render backend: scene pass into an off-screen color buffer, Sobel
/// compute pass into the edge buffer, full-screen composite to the surface.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    color_format: ColorFormat,
    generation: u64,
    device_objects: Option<DeviceObjects>,
    size_objects: Option<SizeObjects>,
    frame: Option<Frame>,
    tracker: PassTracker,
    frames_presented: u64,
}

impl WgpuBackend {
    /// Configure `surface` for `size` and wrap the device. GPU resources are
    /// created later through [`ResourceFactory`].
    pub fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        device: wgpu::Device,
        queue: wgpu::Queue,
        size: OutputSize,
    ) -> Result<Self, RenderError> {
        let caps = surface.get_capabilities(adapter);
        let (format, color_format) =
            pick_surface_format(&caps.formats).ok_or_else(|| RenderError::ResourceCreation {
                what: "swap chain",
                reason: format!("no supported surface format in {:?}", caps.formats),
            })?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        tracing::info!(?format, %size, "surface configured");

        Ok(Self {
            device,
            queue,
            surface,
            config,
            color_format,
            generation: 0,
            device_objects: None,
            size_objects: None,
            frame: None,
            tracker: PassTracker::new(),
            frames_presented: 0,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    fn check_target(&self, handle: TargetHandle) -> Result<(), RenderError> {
        let size = self
            .size_objects
            .as_ref()
            .ok_or(RenderError::ResourcesReleased)?;
        handle.ensure_current(size.generation)
    }

    /// Run `create` inside a validation error scope so that shader and
    /// pipeline errors come back as values instead of the uncaptured-error
    /// panic.
    fn scoped<T>(
        &self,
        what: &'static str,
        create: impl FnOnce(&wgpu::Device) -> T,
    ) -> Result<T, RenderError> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = create(&self.device);
        match pollster::block_on(self.device.pop_error_scope()) {
            None => Ok(value),
            Some(err) => {
                tracing::error!(what, "resource creation failed: {err}");
                Err(RenderError::ResourceCreation {
                    what,
                    reason: err.to_string(),
                })
            }
        }
    }

    fn build_device_objects(&self) -> Result<DeviceObjects, RenderError> {
        let surface_format = self.config.format;
        let uniform_size = std::mem::size_of::<DrawUniforms>() as u64;
        let uniform_stride = uniform_stride(
            uniform_size,
            self.device.limits().min_uniform_buffer_offset_alignment as u64,
        );

        let (scene_pipeline, scene_bind_group, uniform_buffer) =
            self.scoped("scene pipeline", |device| {
                let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("scene_shader"),
                    source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
                });

                let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("draw_uniform_buffer"),
                    size: uniform_stride * MAX_DRAWS,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });

                let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("draw_uniform_layout"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: true,
                            min_binding_size: wgpu::BufferSize::new(uniform_size),
                        },
                        count: None,
                    }],
                });

                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("draw_uniform_bind_group"),
                    layout: &layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer: &uniform_buffer,
                            offset: 0,
                            size: wgpu::BufferSize::new(uniform_size),
                        }),
                    }],
                });

                let pipeline_layout =
                    device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                        label: Some("scene_pipeline_layout"),
                        bind_group_layouts: &[&layout],
                        push_constant_ranges: &[],
                    });

                let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some("scene_pipeline"),
                    layout: Some(&pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &shader,
                        entry_point: Some("vs_main"),
                        compilation_options: Default::default(),
                        buffers: &[wgpu::VertexBufferLayout {
                            array_stride: std::mem::size_of::<Vertex>() as u64,
                            step_mode: wgpu::VertexStepMode::Vertex,
                            attributes: &wgpu::vertex_attr_array![
                                0 => Float32x3,
                                1 => Float32x3,
                            ],
                        }],
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &shader,
                        entry_point: Some("fs_main"),
                        compilation_options: Default::default(),
                        targets: &[Some(wgpu::ColorTargetState {
                            format: surface_format,
                            blend: Some(wgpu::BlendState::REPLACE),
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology: wgpu::PrimitiveTopology::TriangleList,
                        cull_mode: Some(wgpu::Face::Back),
                        ..Default::default()
                    },
                    depth_stencil: Some(wgpu::DepthStencilState {
                        format: DEPTH_FORMAT,
                        depth_write_enabled: true,
                        depth_compare: wgpu::CompareFunction::Less,
                        stencil: Default::default(),
                        bias: Default::default(),
                    }),
                    multisample: Default::default(),
                    multiview: None,
                    cache: None,
                });

                (pipeline, bind_group, uniform_buffer)
            })?;

        let (edge_pipeline, edge_layout) = self.scoped("edge detection shader", |device| {
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("edge_shader"),
                source: wgpu::ShaderSource::Wgsl(shaders::EDGE_SHADER.into()),
            });

            let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("edge_layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: false },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::StorageTexture {
                            access: wgpu::StorageTextureAccess::WriteOnly,
                            format: EDGE_FORMAT,
                            view_dimension: wgpu::TextureViewDimension::D2,
                        },
                        count: None,
                    },
                ],
            });

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("edge_pipeline_layout"),
                bind_group_layouts: &[&layout],
                push_constant_ranges: &[],
            });

            let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("edge_pipeline"),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: Some("cs_main"),
                compilation_options: Default::default(),
                cache: None,
            });

            (pipeline, layout)
        })?;

        let (composite_pipeline, composite_layout) = self.scoped("composite shader", |device| {
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("composite_shader"),
                source: wgpu::ShaderSource::Wgsl(shaders::COMPOSITE_SHADER.into()),
            });

            let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            };
            let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("composite_layout"),
                entries: &[
                    texture_entry(0),
                    texture_entry(1),
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                        count: None,
                    },
                ],
            });

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("composite_pipeline_layout"),
                bind_group_layouts: &[&layout],
                push_constant_ranges: &[],
            });

            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("composite_pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: Default::default(),
                multiview: None,
                cache: None,
            });

            (pipeline, layout)
        })?;

        let (teapot, cone, tetrahedron) = self.scoped("mesh buffers", |device| {
            (
                GpuMesh::upload(device, MeshKind::Teapot),
                GpuMesh::upload(device, MeshKind::Cone),
                GpuMesh::upload(device, MeshKind::Tetrahedron),
            )
        })?;

        let point_clamp = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("point_clamp_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Ok(DeviceObjects {
            scene_pipeline,
            scene_bind_group,
            uniform_buffer,
            uniform_stride,
            teapot,
            cone,
            tetrahedron,
            edge_pipeline,
            edge_layout,
            composite_pipeline,
            composite_layout,
            point_clamp,
        })
    }

    fn build_size_objects(
        &self,
        objects: &DeviceObjects,
        size: OutputSize,
        generation: u64,
    ) -> Result<SizeObjects, RenderError> {
        let extent = wgpu::Extent3d {
            width: size.width,
            height: size.height,
            depth_or_array_layers: 1,
        };
        let texture = |label, format, usage| {
            self.device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some(label),
                    size: extent,
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        };

        let (color_view, depth_view, edge_view) = self.scoped("render targets", |_| {
            (
                texture(
                    "color_buffer",
                    self.config.format,
                    wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
                ),
                texture(
                    "depth_stencil_buffer",
                    DEPTH_FORMAT,
                    wgpu::TextureUsages::RENDER_ATTACHMENT,
                ),
                texture(
                    "edge_buffer",
                    EDGE_FORMAT,
                    wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
                ),
            )
        })?;

        let (edge_bind_group, composite_bind_group) =
            self.scoped("post-process bindings", |device| {
                let edge = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("edge_bind_group"),
                    layout: &objects.edge_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&color_view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::TextureView(&edge_view),
                        },
                    ],
                });
                let composite = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("composite_bind_group"),
                    layout: &objects.composite_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&color_view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::TextureView(&edge_view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: wgpu::BindingResource::Sampler(&objects.point_clamp),
                        },
                    ],
                });
                (edge, composite)
            })?;

        Ok(SizeObjects {
            generation,
            color_view,
            depth_view,
            edge_bind_group,
            composite_bind_group,
        })
    }
}

impl ResourceFactory for WgpuBackend {
    fn output_size(&self) -> OutputSize {
        OutputSize::new(self.config.width, self.config.height)
    }

    fn color_format(&self) -> ColorFormat {
        self.color_format
    }

    fn resize_output(&mut self, size: OutputSize) -> Result<bool, RenderError> {
        if size.is_empty() || size == self.output_size() {
            return Ok(false);
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
        tracing::debug!(%size, "surface reconfigured");
        Ok(true)
    }

    fn create_device_resources(&mut self) -> Result<(), RenderError> {
        // Also the restore path after a lost surface.
        self.surface.configure(&self.device, &self.config);
        let objects = self.build_device_objects()?;
        self.device_objects = Some(objects);
        tracing::debug!("device resources created");
        Ok(())
    }

    fn create_size_resources(
        &mut self,
        size: OutputSize,
    ) -> Result<PostProcessTargets, RenderError> {
        if size.is_empty() {
            return Err(RenderError::ResourceCreation {
                what: "render targets",
                reason: format!("zero-sized output {size}"),
            });
        }

        // Drop the old targets before allocating the new ones.
        self.size_objects = None;
        let objects = self
            .device_objects
            .as_ref()
            .ok_or_else(|| RenderError::ResourceCreation {
                what: "render targets",
                reason: "device resources have not been created".to_string(),
            })?;
        let generation = self.generation + 1;
        let built = self.build_size_objects(objects, size, generation)?;
        self.generation = generation;
        self.size_objects = Some(built);
        tracing::debug!(%size, generation, "size resources created");
        Ok(PostProcessTargets::new(generation, size))
    }

    fn release_resources(&mut self) {
        self.frame = None;
        self.size_objects = None;
        self.device_objects = None;
        self.generation += 1;
        self.tracker.abandon();
        tracing::debug!(generation = self.generation, "resources released");
    }
}

impl FrameBackend for WgpuBackend {
    fn begin_frame(&mut self) -> Result<(), RenderError> {
        if self.device_objects.is_none() || self.size_objects.is_none() {
            return Err(RenderError::ResourcesReleased);
        }

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                return Err(RenderError::SurfaceLost);
            }
            Err(e) => return Err(RenderError::Surface(e.to_string())),
        };
        self.tracker.begin_frame()?;

        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });
        self.frame = Some(Frame {
            scene_pass: None,
            edge_pass: None,
            composite_pass: None,
            draws: 0,
            encoder,
            surface_view,
            surface_texture,
        });
        Ok(())
    }

    fn clear(&mut self, color: Rgba) -> Result<(), RenderError> {
        self.tracker.begin_scene()?;
        let (Some(frame), Some(objects), Some(size)) = (
            self.frame.as_mut(),
            self.device_objects.as_ref(),
            self.size_objects.as_ref(),
        ) else {
            return Err(RenderError::ResourcesReleased);
        };

        let mut pass = frame
            .encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &size.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: color.r as f64,
                            g: color.g as f64,
                            b: color.b as f64,
                            a: color.a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &size.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(0),
                        store: wgpu::StoreOp::Store,
                    }),
                }),
                ..Default::default()
            })
            .forget_lifetime();
        pass.set_pipeline(&objects.scene_pipeline);
        frame.scene_pass = Some(pass);
        frame.draws = 0;
        Ok(())
    }

    fn draw_mesh(&mut self, draw: &MeshDraw) -> Result<(), RenderError> {
        self.tracker.draw_mesh()?;
        let (Some(frame), Some(objects)) = (self.frame.as_mut(), self.device_objects.as_ref())
        else {
            return Err(RenderError::ResourcesReleased);
        };
        if frame.draws >= MAX_DRAWS {
            return Err(RenderError::ResourceCreation {
                what: "draw uniforms",
                reason: format!("more than {MAX_DRAWS} draws in one frame"),
            });
        }
        let Some(pass) = frame.scene_pass.as_mut() else {
            return Err(RenderError::ResourcesReleased);
        };

        let offset = frame.draws * objects.uniform_stride;
        let uniforms = DrawUniforms {
            world: draw.world.to_cols_array_2d(),
            view_proj: (draw.proj * draw.view).to_cols_array_2d(),
            tint: draw.tint.to_array(),
        };
        self.queue
            .write_buffer(&objects.uniform_buffer, offset, bytemuck::bytes_of(&uniforms));

        let mesh = objects.mesh(draw.mesh);
        pass.set_bind_group(0, &objects.scene_bind_group, &[offset as u32]);
        pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        frame.draws += 1;
        Ok(())
    }

    fn end_scene(&mut self) -> Result<(), RenderError> {
        self.tracker.end_scene()?;
        if let Some(frame) = self.frame.as_mut() {
            frame.scene_pass = None;
        }
        Ok(())
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.tracker.present()?;
        let frame = self.frame.take().ok_or(RenderError::ResourcesReleased)?;
        let Frame {
            encoder,
            surface_texture,
            ..
        } = frame;

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        self.frames_presented += 1;
        tracing::trace!(frame = self.frames_presented, "presented");
        Ok(())
    }

    fn abort_frame(&mut self) {
        self.tracker.abandon();
        // The acquired surface texture is discarded unpresented.
        if self.frame.take().is_some() {
            tracing::debug!("frame aborted");
        }
    }
}

impl PassEncoder for WgpuBackend {
    fn begin_edge_pass(
        &mut self,
        color: TargetHandle,
        edge: TargetHandle,
    ) -> Result<(), RenderError> {
        self.check_target(color)?;
        self.check_target(edge)?;
        self.tracker.begin_edge()?;
        let (Some(frame), Some(objects), Some(size)) = (
            self.frame.as_mut(),
            self.device_objects.as_ref(),
            self.size_objects.as_ref(),
        ) else {
            return Err(RenderError::ResourcesReleased);
        };

        let mut pass = frame
            .encoder
            .begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("edge_pass"),
                timestamp_writes: None,
            })
            .forget_lifetime();
        pass.set_pipeline(&objects.edge_pipeline);
        pass.set_bind_group(0, &size.edge_bind_group, &[]);
        frame.edge_pass = Some(pass);
        Ok(())
    }

    fn dispatch(&mut self, groups: DispatchSize) -> Result<(), RenderError> {
        self.tracker.dispatch()?;
        let pass = self
            .frame
            .as_mut()
            .and_then(|f| f.edge_pass.as_mut())
            .ok_or(RenderError::ResourcesReleased)?;
        pass.dispatch_workgroups(groups.x, groups.y, groups.z);
        Ok(())
    }

    fn end_edge_pass(&mut self) -> Result<(), RenderError> {
        self.tracker.end_edge()?;
        if let Some(frame) = self.frame.as_mut() {
            frame.edge_pass = None;
        }
        Ok(())
    }

    fn begin_composite_pass(
        &mut self,
        color: TargetHandle,
        edge: TargetHandle,
        sampler: SamplerKind,
    ) -> Result<(), RenderError> {
        self.check_target(color)?;
        self.check_target(edge)?;
        self.tracker.begin_composite()?;
        let (Some(frame), Some(objects), Some(size)) = (
            self.frame.as_mut(),
            self.device_objects.as_ref(),
            self.size_objects.as_ref(),
        ) else {
            return Err(RenderError::ResourcesReleased);
        };
        // The composite bind group carries the only sampler we build.
        let SamplerKind::PointClamp = sampler;

        let mut pass = frame
            .encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("composite_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.surface_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            })
            .forget_lifetime();
        pass.set_pipeline(&objects.composite_pipeline);
        pass.set_bind_group(0, &size.composite_bind_group, &[]);
        frame.composite_pass = Some(pass);
        Ok(())
    }

    fn draw_fullscreen(&mut self, vertex_count: u32) -> Result<(), RenderError> {
        self.tracker.draw_fullscreen()?;
        let pass = self
            .frame
            .as_mut()
            .and_then(|f| f.composite_pass.as_mut())
            .ok_or(RenderError::ResourcesReleased)?;
        pass.draw(0..vertex_count, 0..1);
        Ok(())
    }

    fn end_composite_pass(&mut self) -> Result<(), RenderError> {
        self.tracker.end_composite()?;
        if let Some(frame) = self.frame.as_mut() {
            frame.composite_pass = None;
        }
        Ok(())
    }
}

fn color_format_of(format: wgpu::TextureFormat) -> Option<ColorFormat> {
    match format {
        wgpu::TextureFormat::Bgra8Unorm => Some(ColorFormat::Bgra8Unorm),
        wgpu::TextureFormat::Bgra8UnormSrgb => Some(ColorFormat::Bgra8UnormSrgb),
        wgpu::TextureFormat::Rgba8Unorm => Some(ColorFormat::Rgba8Unorm),
        wgpu::TextureFormat::Rgba8UnormSrgb => Some(ColorFormat::Rgba8UnormSrgb),
        wgpu::TextureFormat::Rgba16Float => Some(ColorFormat::Rgba16Float),
        _ => None,
    }
}

/// First sRGB format we can use, else the first usable one.
fn pick_surface_format(
    formats: &[wgpu::TextureFormat],
) -> Option<(wgpu::TextureFormat, ColorFormat)> {
    let usable = || {
        formats
            .iter()
            .filter_map(|&f| color_format_of(f).map(|c| (f, c)))
    };
    usable().find(|(_, c)| c.is_srgb()).or_else(|| usable().next())
}

fn uniform_stride(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}
