use crate::camera::Projection;
use crate::mesh::{self, GridVertex, Vertex};
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use std::ops::Range;
use toydrive_render::{DrawItem, Primitive, RenderView, Scene, WHEEL_SEGMENTS};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    sun_dir: [f32; 4],
    sun_color: [f32; 4],
    ambient: [f32; 4],
}

impl Uniforms {
    fn new(view_proj: Mat4, scene: &Scene) -> Self {
        let sun = scene.sun.direction().unwrap_or(Vec3::Y);
        let [sr, sg, sb, _] = scene.sun.color.to_linear_rgba();
        let [ar, ag, ab, _] = scene.ambient.color.to_linear_rgba();
        let ambient = scene.ambient.intensity;
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            sun_dir: [sun.x, sun.y, sun.z, scene.sun.intensity],
            sun_color: [sr, sg, sb, 1.0],
            ambient: [ar * ambient, ag * ambient, ab * ambient, 1.0],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    color: [f32; 4],
}

impl From<&DrawItem> for InstanceData {
    fn from(item: &DrawItem) -> Self {
        let cols = item.model.to_cols_array_2d();
        Self {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
            color: item.color.to_linear_rgba(),
        }
    }
}

/// Which unit mesh a draw item uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MeshKind {
    Box,
    Cylinder,
    Plane,
}

impl MeshKind {
    const ALL: [Self; 3] = [Self::Box, Self::Cylinder, Self::Plane];

    fn of(primitive: &Primitive) -> Self {
        match primitive {
            Primitive::Box { .. } => Self::Box,
            Primitive::Cylinder { .. } => Self::Cylinder,
            Primitive::Plane { .. } => Self::Plane,
        }
    }
}

struct MeshBuffers {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl MeshBuffers {
    fn upload(device: &wgpu::Device, label: &str, (verts, indices): (Vec<Vertex>, Vec<u16>)) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vertex_buffer")),
            contents: bytemuck::cast_slice(&verts),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_index_buffer")),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }
}

/// Sort draw items into contiguous per-mesh runs. Returns the instance data
/// and, for each mesh kind in [`MeshKind::ALL`] order, its instance range.
fn batch(items: &[DrawItem], max_instances: usize) -> (Vec<InstanceData>, [Range<u32>; 3]) {
    let mut instances = Vec::with_capacity(items.len().min(max_instances));
    let mut ranges: [Range<u32>; 3] = [0..0, 0..0, 0..0];
    for (slot, kind) in MeshKind::ALL.into_iter().enumerate() {
        let start = instances.len() as u32;
        for item in items.iter().filter(|i| MeshKind::of(&i.primitive) == kind) {
            if instances.len() >= max_instances {
                break;
            }
            instances.push(InstanceData::from(item));
        }
        ranges[slot] = start..instances.len() as u32;
    }
    (instances, ranges)
}

/// wgpu-based scene renderer.
pub struct WgpuRenderer {
    primitive_pipeline: wgpu::RenderPipeline,
    grid_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    meshes: [MeshBuffers; 3],
    grid_vertex_buffer: wgpu::Buffer,
    grid_vertex_count: u32,
    instance_buffer: wgpu::Buffer,
    max_instances: u32,
    depth_texture: wgpu::TextureView,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        // Uniform buffer
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniform_buffer"),
            size: std::mem::size_of::<Uniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let depth_stencil = Some(wgpu::DepthStencilState {
            format: wgpu::TextureFormat::Depth32Float,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        });

        // Primitive pipeline
        let primitive_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("primitive_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::PRIMITIVE_SHADER.into()),
        });

        let primitive_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("primitive_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &primitive_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x3,
                        ],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceData>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            2 => Float32x4,
                            3 => Float32x4,
                            4 => Float32x4,
                            5 => Float32x4,
                            6 => Float32x4,
                        ],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &primitive_shader,
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
            depth_stencil: depth_stencil.clone(),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        // Grid pipeline
        let grid_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("grid_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::GRID_SHADER.into()),
        });

        let grid_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("grid_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &grid_shader,
                entry_point: Some("vs_grid"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<GridVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x4,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &grid_shader,
                entry_point: Some("fs_grid"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        // Unit meshes, in MeshKind::ALL order
        let meshes = [
            MeshBuffers::upload(device, "box", mesh::cube_mesh()),
            MeshBuffers::upload(device, "cylinder", mesh::cylinder_mesh(WHEEL_SEGMENTS)),
            MeshBuffers::upload(device, "plane", mesh::plane_mesh()),
        ];

        // Grid over the 200x200 ground, 2 units apart
        let grid_verts = mesh::grid_mesh(50, 2.0, 0.01);
        let grid_vertex_count = grid_verts.len() as u32;
        let grid_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grid_vertex_buffer"),
            contents: bytemuck::cast_slice(&grid_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });

        // Instance buffer (pre-allocated)
        let max_instances = 4_096u32;
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: (max_instances as u64) * std::mem::size_of::<InstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            primitive_pipeline,
            grid_pipeline,
            uniform_buffer,
            uniform_bind_group,
            meshes,
            grid_vertex_buffer,
            grid_vertex_count,
            instance_buffer,
            max_instances,
            depth_texture,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    /// Render one frame: every draw item, then the grid overlay.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        projection: &Projection,
        view: &RenderView,
        scene: &Scene,
        items: &[DrawItem],
    ) {
        let uniforms = Uniforms::new(projection.view_projection(view), scene);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let (instances, ranges) = batch(items, self.max_instances as usize);
        if instances.len() < items.len() {
            tracing::warn!(
                dropped = items.len() - instances.len(),
                "draw list exceeds instance buffer"
            );
        }
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let [r, g, b, _] = scene.background.to_linear_rgba();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            // Draw primitives, one instanced call per mesh
            if !instances.is_empty() {
                pass.set_pipeline(&self.primitive_pipeline);
                pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                for (mesh, range) in self.meshes.iter().zip(ranges) {
                    if range.is_empty() {
                        continue;
                    }
                    pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                    pass.draw_indexed(0..mesh.index_count, 0, range);
                }
            }

            // Draw grid overlay
            pass.set_pipeline(&self.grid_pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_vertex_buffer(0, self.grid_vertex_buffer.slice(..));
            pass.draw(0..self.grid_vertex_count, 0..1);
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toydrive_kernel::{DriveWorld, VehicleSpec};
    use toydrive_render::SceneConfig;

    fn car_items() -> Vec<DrawItem> {
        let mut world = DriveWorld::new();
        world.spawn(VehicleSpec::default());
        Scene::bootstrap(&SceneConfig::default()).draw_list(&world)
    }

    #[test]
    fn batch_groups_by_mesh() {
        let items = car_items();
        let (instances, ranges) = batch(&items, 1024);
        assert_eq!(instances.len(), items.len());
        // body + 4 markers, 4 wheels, ground
        assert_eq!(ranges[0], 0..5);
        assert_eq!(ranges[1], 5..9);
        assert_eq!(ranges[2], 9..10);
    }

    #[test]
    fn batch_respects_capacity() {
        let items = car_items();
        let (instances, ranges) = batch(&items, 3);
        assert_eq!(instances.len(), 3);
        assert_eq!(ranges[0], 0..3);
        assert!(ranges[1].is_empty());
        assert!(ranges[2].is_empty());
    }

    #[test]
    fn uniforms_follow_scene_lights() {
        let scene = Scene::bootstrap(&SceneConfig::default());
        let u = Uniforms::new(Mat4::IDENTITY, &scene);
        assert!((u.ambient[0] - 0.6).abs() < 1e-6);
        assert!((u.sun_dir[3] - 0.6).abs() < 1e-6);
        let dir = Vec3::new(u.sun_dir[0], u.sun_dir[1], u.sun_dir[2]);
        assert!((dir.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn instance_colors_are_linear() {
        let items = car_items();
        // Ground 0x444444 decodes to about 0.058 in linear light.
        let ground = InstanceData::from(&items[0]);
        assert!((ground.color[0] - 0.0578).abs() < 1e-3);
        assert_eq!(ground.color[3], 1.0);
    }
}
