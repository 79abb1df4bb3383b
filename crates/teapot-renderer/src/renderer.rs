use crate::camera::Camera;
use crate::mesh::{Mesh, Topology};
use crate::pipeline::{RenderPipeline, Uniforms};
use glam::Mat4;
use wgpu::util::DeviceExt;

/// GPU buffers for one mesh.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub topology: Topology,
}

/// Draws a fixed set of meshes, all sharing one model transform.
pub struct ModelRenderer {
    pipeline: RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    meshes: Vec<GpuMesh>,
    clear_color: wgpu::Color,
}

impl ModelRenderer {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        size: (u32, u32),
        meshes: &[Mesh],
        clear_color: [f32; 3],
    ) -> Self {
        let pipeline = RenderPipeline::new(device, color_format, size.0, size.1);

        let initial = Uniforms::new(Mat4::IDENTITY, Mat4::IDENTITY, Mat4::IDENTITY);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::cast_slice(&[initial]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let uniform_bind_group = pipeline.create_uniform_bind_group(device, &uniform_buffer);

        let meshes: Vec<GpuMesh> = meshes
            .iter()
            .filter(|m| !m.is_empty())
            .map(|m| upload_mesh(device, m))
            .collect();
        tracing::debug!(meshes = meshes.len(), "Uploaded meshes");

        let [r, g, b] = clear_color;
        Self {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            meshes,
            clear_color: wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: 1.0,
            },
        }
    }

    /// Recreate size-dependent resources.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.pipeline.resize(device, width, height);
    }

    /// Record one frame: clear, then draw every mesh with `transform`.
    pub fn render(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        camera: &Camera,
        transform: Mat4,
    ) {
        let uniforms = Uniforms::new(transform, camera.view_matrix(), camera.projection_matrix());
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("model_render_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.pipeline.depth_texture,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        for mesh in &self.meshes {
            pass.set_pipeline(self.pipeline.for_topology(mesh.topology));
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}

pub fn upload_mesh(device: &wgpu::Device, mesh: &Mesh) -> GpuMesh {
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("mesh_vertex_buffer"),
        contents: bytemuck::cast_slice(&mesh.vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("mesh_index_buffer"),
        contents: bytemuck::cast_slice(&mesh.indices),
        usage: wgpu::BufferUsages::INDEX,
    });

    GpuMesh {
        vertex_buffer,
        index_buffer,
        index_count: mesh.indices.len() as u32,
        topology: mesh.topology,
    }
}
