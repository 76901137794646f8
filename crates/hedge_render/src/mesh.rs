//! Procedural meshes. Every model the game references is built here rather
//! than imported from disk.

use std::f32::consts::{PI, TAU};

use wgpu::util::DeviceExt;

use crate::vertex::MeshVertex;

#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Axis-aligned unit cube centred on the origin (half extent 0.5).
    pub fn cube() -> Self {
        // (normal, tangent u, tangent v) per face
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ];

        let mut mesh = MeshData::default();
        for (n, u, v) in faces {
            let base = mesh.vertices.len() as u32;
            for (su, sv, tex) in [
                (-0.5, -0.5, [0.0, 1.0]),
                (0.5, -0.5, [1.0, 1.0]),
                (0.5, 0.5, [1.0, 0.0]),
                (-0.5, 0.5, [0.0, 0.0]),
            ] {
                let position = [
                    n[0] * 0.5 + u[0] * su + v[0] * sv,
                    n[1] * 0.5 + u[1] * su + v[1] * sv,
                    n[2] * 0.5 + u[2] * su + v[2] * sv,
                ];
                mesh.vertices.push(MeshVertex {
                    position,
                    normal: n,
                    tex_coords: tex,
                });
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        mesh
    }

    /// UV sphere of radius 1.
    pub fn sphere(stacks: u32, slices: u32) -> Self {
        let stacks = stacks.max(2);
        let slices = slices.max(3);
        let mut mesh = MeshData::default();

        for i in 0..=stacks {
            let v = i as f32 / stacks as f32;
            let phi = v * PI;
            for j in 0..=slices {
                let u = j as f32 / slices as f32;
                let theta = u * TAU;
                let n = [phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin()];
                mesh.vertices.push(MeshVertex {
                    position: n,
                    normal: n,
                    tex_coords: [u, v],
                });
            }
        }

        let row = slices + 1;
        for i in 0..stacks {
            for j in 0..slices {
                let a = i * row + j;
                let b = a + row;
                mesh.indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
            }
        }
        mesh
    }

    /// Unit quad in the XY plane facing +Z.
    pub fn quad() -> Self {
        let n = [0.0, 0.0, 1.0];
        let vertices = vec![
            MeshVertex { position: [-0.5, -0.5, 0.0], normal: n, tex_coords: [0.0, 1.0] },
            MeshVertex { position: [0.5, -0.5, 0.0], normal: n, tex_coords: [1.0, 1.0] },
            MeshVertex { position: [0.5, 0.5, 0.0], normal: n, tex_coords: [1.0, 0.0] },
            MeshVertex { position: [-0.5, 0.5, 0.0], normal: n, tex_coords: [0.0, 0.0] },
        ];
        Self {
            vertices,
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    pub fn upload(&self, device: &wgpu::Device, label: &str) -> GpuMesh {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
        }
    }
}

pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}
