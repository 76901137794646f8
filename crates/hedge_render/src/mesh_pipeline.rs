use std::collections::HashMap;
use std::sync::Arc;

use image::RgbaImage;
use wgpu::util::DeviceExt;

use crate::batch::FrameBatches;
use crate::camera::{Camera3D, CameraUniform};
use crate::mesh::{GpuMesh, MeshData};
use crate::texture::{checker_image, Texture};
use crate::vertex::{InstanceRaw, MeshVertex};

const FALLBACK_TEXTURE: &str = "__fallback";

struct GpuTexture {
    #[allow(unused)]
    texture: Texture,
    bind_group: wgpu::BindGroup,
}

/// Instanced textured-mesh renderer: camera at group 0, diffuse texture at group 1.
pub struct MeshRenderer {
    opaque_pipeline: wgpu::RenderPipeline,
    translucent_pipeline: wgpu::RenderPipeline,
    texture_layout: wgpu::BindGroupLayout,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    meshes: HashMap<Arc<str>, GpuMesh>,
    textures: HashMap<Arc<str>, GpuTexture>,
}

impl MeshRenderer {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, format: wgpu::TextureFormat) -> Self {
        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera Bind Group Layout"),
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
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Texture Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
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

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[Camera3D::new(1, 1).build_uniform()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[&camera_layout, &texture_layout],
            push_constant_ranges: &[],
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });

        let opaque_pipeline = create_pipeline(
            device,
            &layout,
            &shader,
            format,
            wgpu::BlendState::REPLACE,
            true,
            "Opaque Mesh Pipeline",
        );
        let translucent_pipeline = create_pipeline(
            device,
            &layout,
            &shader,
            format,
            wgpu::BlendState::ALPHA_BLENDING,
            false,
            "Translucent Mesh Pipeline",
        );

        let instance_capacity = 256;
        let instance_buffer = create_instance_buffer(device, instance_capacity);

        let mut renderer = Self {
            opaque_pipeline,
            translucent_pipeline,
            texture_layout,
            camera_buffer,
            camera_bind_group,
            instance_buffer,
            instance_capacity,
            meshes: HashMap::new(),
            textures: HashMap::new(),
        };
        renderer.add_texture(
            device,
            queue,
            FALLBACK_TEXTURE,
            &checker_image(64, 8, [255, 0, 255, 255], [32, 32, 32, 255]),
        );
        renderer
    }

    pub fn add_mesh(&mut self, device: &wgpu::Device, name: &str, data: &MeshData) {
        self.meshes
            .insert(Arc::from(name), data.upload(device, name));
    }

    pub fn add_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
        image: &RgbaImage,
    ) {
        let texture = Texture::from_rgba(device, queue, image, name);
        let Some(sampler) = texture.sampler.as_ref() else {
            log::warn!("Texture '{}' has no sampler, skipping", name);
            return;
        };
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(name),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });
        self.textures.insert(
            Arc::from(name),
            GpuTexture {
                texture,
                bind_group,
            },
        );
    }

    pub fn has_mesh(&self, name: &str) -> bool {
        self.meshes.contains_key(name)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len().saturating_sub(1)
    }

    pub fn update_camera(&self, queue: &wgpu::Queue, camera: &Camera3D) {
        let uniform: CameraUniform = camera.build_uniform();
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    /// Streams instance data to the GPU. The buffer grows (power-of-two) but never shrinks.
    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, frame: &FrameBatches) {
        if frame.instances.len() > self.instance_capacity {
            self.instance_capacity = frame.instances.len().next_power_of_two();
            self.instance_buffer = create_instance_buffer(device, self.instance_capacity);
        }
        if !frame.instances.is_empty() {
            queue.write_buffer(
                &self.instance_buffer,
                0,
                bytemuck::cast_slice(&frame.instances),
            );
        }
    }

    /// Records the batches into `pass`. Returns the number of draw calls issued.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, frame: &FrameBatches) -> u32 {
        let mut draws = 0;
        let mut translucent_bound: Option<bool> = None;
        let mut last_texture: Option<&str> = None;

        pass.set_bind_group(0, &self.camera_bind_group, &[]);
        pass.set_vertex_buffer(1, self.instance_buffer.slice(..));

        for batch in &frame.batches {
            let Some(mesh) = self.meshes.get(&batch.mesh) else {
                log::warn!("Draw references unknown mesh '{}'", batch.mesh);
                continue;
            };
            if translucent_bound != Some(batch.translucent) {
                let pipeline = if batch.translucent {
                    &self.translucent_pipeline
                } else {
                    &self.opaque_pipeline
                };
                pass.set_pipeline(pipeline);
                translucent_bound = Some(batch.translucent);
            }
            if last_texture != Some(&*batch.texture) {
                let texture = self
                    .textures
                    .get(&batch.texture)
                    .or_else(|| self.textures.get(FALLBACK_TEXTURE));
                if let Some(texture) = texture {
                    pass.set_bind_group(1, &texture.bind_group, &[]);
                }
                last_texture = Some(&*batch.texture);
            }
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(
                0..mesh.index_count,
                0,
                batch.instance_start..batch.instance_start + batch.instance_count,
            );
            draws += 1;
        }
        draws
    }
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    let byte_len = (capacity * std::mem::size_of::<InstanceRaw>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Instance Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    blend: wgpu::BlendState,
    depth_write: bool,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[MeshVertex::layout(), InstanceRaw::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // Skybox faces and rotated walls are seen from both sides.
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: Texture::DEPTH_FORMAT,
            depth_write_enabled: depth_write,
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
    })
}
