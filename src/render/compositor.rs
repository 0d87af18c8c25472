//! Offscreen compositor: draws the queued quads into a render-target texture.

use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3};
use log::{error, info};

use crate::panorama::{QuadRenderer, VIEW_HEIGHT, VIEW_WIDTH};
use crate::video::DecodedFrame;

use super::{unit_quad, SliceTexture, Vertex};

/// Render target dimensions in pixels.
pub const TARGET_WIDTH: u32 = 1280;
pub const TARGET_HEIGHT: u32 = 720;

/// Per-frame quad capacity of the dynamic uniform buffer.
const MAX_QUADS: usize = 1024;
/// Dynamic uniform offsets must be 256-aligned.
const UNIFORM_STRIDE: u64 = 256;

/// Camera state for one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewParams {
    /// Left edge of the visible view rectangle in scene units.
    pub camera_position: f32,
    /// Rotation of the whole arrangement about the view center, degrees.
    pub rotation_degrees: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct ViewUniforms {
    view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct QuadUniforms {
    center: [f32; 2],
    size: [f32; 2],
}

struct QuadCommand {
    texture: SliceTexture,
    center: Vec2,
    size: Vec2,
}

/// Orthographic view of the scene rectangle, rotated about its center.
///
/// Scene space is y-down: the top of the view maps to y = 0 and the bottom to
/// `VIEW_HEIGHT`. Horizontally the view spans `[camera, camera + VIEW_WIDTH]`.
pub fn view_matrix(view: &ViewParams) -> Mat4 {
    let projection = Mat4::orthographic_rh(
        view.camera_position,
        view.camera_position + VIEW_WIDTH,
        VIEW_HEIGHT,
        0.0,
        -100.0,
        100.0,
    );
    let center = Vec3::new(
        view.camera_position + VIEW_WIDTH * 0.5,
        VIEW_HEIGHT * 0.5,
        0.0,
    );
    let rotation = Mat4::from_translation(center)
        * Mat4::from_rotation_z(view.rotation_degrees.to_radians())
        * Mat4::from_translation(-center);
    projection * rotation
}

/// Draws queued textured quads into an offscreen render target.
///
/// GPU handles arrive after construction (eframe hands them over once the
/// render state exists), so every resource is optional and rendering is a
/// no-op until `initialize` runs. The target texture is registered with egui
/// for display and copied out through `read_back` for recording.
pub struct Compositor {
    device: Option<Arc<wgpu::Device>>,
    queue: Option<Arc<wgpu::Queue>>,
    target_texture: Option<wgpu::Texture>,
    target_view: Option<Arc<wgpu::TextureView>>,
    pipeline: Option<wgpu::RenderPipeline>,
    view_layout: Option<wgpu::BindGroupLayout>,
    quad_layout: Option<wgpu::BindGroupLayout>,
    texture_layout: Option<wgpu::BindGroupLayout>,
    sampler: Option<wgpu::Sampler>,
    view_buffer: Option<wgpu::Buffer>,
    quad_buffer: Option<wgpu::Buffer>,
    vertex_buffer: Option<wgpu::Buffer>,
    readback_buffer: Option<wgpu::Buffer>,
    commands: Vec<QuadCommand>,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compositor {
    pub fn new() -> Self {
        Self {
            device: None,
            queue: None,
            target_texture: None,
            target_view: None,
            pipeline: None,
            view_layout: None,
            quad_layout: None,
            texture_layout: None,
            sampler: None,
            view_buffer: None,
            quad_buffer: None,
            vertex_buffer: None,
            readback_buffer: None,
            commands: Vec::new(),
        }
    }

    /// Take ownership of the GPU handles and build all render resources.
    pub fn initialize(&mut self, device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) {
        self.device = Some(device.clone());
        self.queue = Some(queue);
        self.create_target();
        self.create_pipeline(&device);
        info!("Compositor initialized ({TARGET_WIDTH}x{TARGET_HEIGHT})");
    }

    pub fn is_initialized(&self) -> bool {
        self.device.is_some() && self.queue.is_some()
    }

    /// View of the render target, for registration with egui.
    pub fn target_view(&self) -> Option<&Arc<wgpu::TextureView>> {
        self.target_view.as_ref()
    }

    fn create_target(&mut self) {
        let Some(device) = &self.device else { return };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Panorama Target"),
            size: wgpu::Extent3d {
                width: TARGET_WIDTH,
                height: TARGET_HEIGHT,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.target_texture = Some(texture);
        self.target_view = Some(Arc::new(view));
    }

    fn create_pipeline(&mut self, device: &wgpu::Device) {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Slice Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/slice.wgsl").into()),
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Slice Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let view_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("View Uniform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let quad_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Quad Uniform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<QuadUniforms>() as u64
                    ),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Slice Texture Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Slice Pipeline Layout"),
            bind_group_layouts: &[&view_layout, &quad_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Slice Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[Vertex::LAYOUT],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: wgpu::TextureFormat::Rgba8UnormSrgb,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let view_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("View Uniform Buffer"),
            size: std::mem::size_of::<ViewUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let quad_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Quad Uniform Buffer"),
            size: UNIFORM_STRIDE * MAX_QUADS as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let vertices = unit_quad();
        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Quad Vertex Buffer"),
            size: (std::mem::size_of::<Vertex>() * vertices.len()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        if let Some(queue) = &self.queue {
            queue.write_buffer(&vertex_buffer, 0, bytemuck::cast_slice(&vertices));
        }

        self.pipeline = Some(pipeline);
        self.view_layout = Some(view_layout);
        self.quad_layout = Some(quad_layout);
        self.texture_layout = Some(texture_layout);
        self.sampler = Some(sampler);
        self.view_buffer = Some(view_buffer);
        self.quad_buffer = Some(quad_buffer);
        self.vertex_buffer = Some(vertex_buffer);
    }

    /// Upload a decoded frame as a new GPU texture.
    pub fn upload_frame(&self, frame: &DecodedFrame) -> Option<SliceTexture> {
        let device = self.device.as_ref()?;
        let queue = self.queue.as_ref()?;

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Frame Texture"),
            size: wgpu::Extent3d {
                width: frame.width,
                height: frame.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &frame.rgba,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(frame.width * 4),
                rows_per_image: None,
            },
            wgpu::Extent3d {
                width: frame.width,
                height: frame.height,
                depth_or_array_layers: 1,
            },
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Some(Arc::new(view))
    }

    /// Render every queued quad into the target and clear the queue.
    pub fn render(&mut self, view: &ViewParams) {
        let commands = std::mem::take(&mut self.commands);
        let Some(device) = &self.device else { return };
        let Some(queue) = &self.queue else { return };
        let Some(target) = &self.target_view else { return };
        let Some(pipeline) = &self.pipeline else { return };
        let (Some(view_buffer), Some(quad_buffer), Some(vertex_buffer)) =
            (&self.view_buffer, &self.quad_buffer, &self.vertex_buffer)
        else {
            return;
        };
        let (Some(view_layout), Some(quad_layout), Some(texture_layout), Some(sampler)) = (
            &self.view_layout,
            &self.quad_layout,
            &self.texture_layout,
            &self.sampler,
        ) else {
            return;
        };

        let uniforms = ViewUniforms {
            view_proj: view_matrix(view).to_cols_array_2d(),
        };
        queue.write_buffer(view_buffer, 0, bytemuck::bytes_of(&uniforms));

        let quads = &commands[..commands.len().min(MAX_QUADS)];
        for (i, quad) in quads.iter().enumerate() {
            let uniforms = QuadUniforms {
                center: quad.center.to_array(),
                size: quad.size.to_array(),
            };
            queue.write_buffer(
                quad_buffer,
                i as u64 * UNIFORM_STRIDE,
                bytemuck::bytes_of(&uniforms),
            );
        }

        let view_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("View Bind Group"),
            layout: view_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: view_buffer.as_entire_binding(),
            }],
        });

        let quad_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Quad Bind Group"),
            layout: quad_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: quad_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<QuadUniforms>() as u64),
                }),
            }],
        });

        let texture_bind_groups: Vec<wgpu::BindGroup> = quads
            .iter()
            .map(|quad| {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Slice Texture Bind Group"),
                    layout: texture_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&quad.texture),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(sampler),
                        },
                    ],
                })
            })
            .collect();

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Panorama Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Panorama Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(0, &view_bind_group, &[]);
            render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));

            for (i, bind_group) in texture_bind_groups.iter().enumerate() {
                let offset = (i as u64 * UNIFORM_STRIDE) as u32;
                render_pass.set_bind_group(1, &quad_bind_group, &[offset]);
                render_pass.set_bind_group(2, bind_group, &[]);
                render_pass.draw(0..6, 0..1);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Copy the rendered target back to the CPU as tightly packed RGBA rows.
    pub fn read_back(&mut self) -> Option<Vec<u8>> {
        let device = self.device.as_ref()?;
        let queue = self.queue.as_ref()?;
        let target = self.target_texture.as_ref()?;

        // Buffer rows must be 256-byte aligned for texture copies.
        let unpadded_bytes_per_row = TARGET_WIDTH * 4;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(256) * 256;
        let buffer_size = (padded_bytes_per_row * TARGET_HEIGHT) as u64;

        if self.readback_buffer.is_none() {
            self.readback_buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Readback Buffer"),
                size: buffer_size,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                mapped_at_creation: false,
            }));
        }
        let buffer = self.readback_buffer.as_ref()?;

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Readback Encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: target,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: None,
                },
            },
            wgpu::Extent3d {
                width: TARGET_WIDTH,
                height: TARGET_HEIGHT,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        let (tx, rx) = crossbeam_channel::bounded(1);
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device.poll(wgpu::Maintain::Wait);

        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!("readback map failed: {e}");
                return None;
            }
            Err(_) => return None,
        }

        let mut pixels = Vec::with_capacity((unpadded_bytes_per_row * TARGET_HEIGHT) as usize);
        {
            let data = slice.get_mapped_range();
            for row in 0..TARGET_HEIGHT {
                let begin = (row * padded_bytes_per_row) as usize;
                pixels.extend_from_slice(&data[begin..begin + unpadded_bytes_per_row as usize]);
            }
        }
        buffer.unmap();
        Some(pixels)
    }
}

impl QuadRenderer<SliceTexture> for Compositor {
    fn draw_quad(&mut self, texture: &SliceTexture, center: Vec2, size: Vec2) {
        if self.commands.len() < MAX_QUADS {
            self.commands.push(QuadCommand {
                texture: Arc::clone(texture),
                center,
                size,
            });
        }
    }
}
