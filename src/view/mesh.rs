use bytemuck::NoUninit;
use glam::{Mat3, Vec2, Vec3};
use wgpu::util::DeviceExt;

use crate::model::definitions::BillboardType;
use crate::model::geometry::{Obb3, Rgba8, ZCylinder};

#[repr(C)]
#[derive(Debug, Clone, Copy, NoUninit)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn new(pos: Vec3, normal: Vec3, color: Rgba8, uv: Vec2) -> Self {
        Self { pos: pos.to_array(), normal: normal.to_array(), color: color.to_f32(), uv: uv.to_array() }
    }

    pub const ATTRIBUTES: [wgpu::VertexAttribute; 4] = [
        wgpu::VertexAttribute { offset: 0, shader_location: 0, format: wgpu::VertexFormat::Float32x3 },
        wgpu::VertexAttribute { offset: 12, shader_location: 1, format: wgpu::VertexFormat::Float32x3 },
        wgpu::VertexAttribute { offset: 24, shader_location: 2, format: wgpu::VertexFormat::Float32x4 },
        wgpu::VertexAttribute { offset: 40, shader_location: 3, format: wgpu::VertexFormat::Float32x2 },
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_index(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn upload(&self, device: &wgpu::Device, label: &str) -> MeshBuffer {
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

        MeshBuffer { vertex_buffer, index_buffer, index_count: self.indices.len() as u32 }
    }

    /// Counter-clockwise quad `bl, br, tr, tl` as two triangles
    #[allow(clippy::too_many_arguments)]
    pub fn add_quad(&mut self, bl: Vec3, br: Vec3, tr: Vec3, tl: Vec3, color: Rgba8, uv_min: Vec2, uv_max: Vec2) {
        let normal = (br - bl).cross(tl - bl).normalize_or_zero();
        let base = self.next_index();
        self.vertices.extend([
            Vertex::new(bl, normal, color, Vec2::new(uv_min.x, uv_max.y)),
            Vertex::new(br, normal, color, Vec2::new(uv_max.x, uv_max.y)),
            Vertex::new(tr, normal, color, Vec2::new(uv_max.x, uv_min.y)),
            Vertex::new(tl, normal, color, Vec2::new(uv_min.x, uv_min.y)),
        ]);
        self.indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Quad whose normals bend outward toward its left and right edges,
    /// so lighting makes a flat sprite look rounded
    #[allow(clippy::too_many_arguments)]
    pub fn add_rounded_quad(&mut self, bl: Vec3, br: Vec3, tr: Vec3, tl: Vec3, color: Rgba8, uv_min: Vec2, uv_max: Vec2) {
        let right = (br - bl).normalize_or_zero();
        let normal = right.cross(tl - bl).normalize_or_zero();
        let bm = (bl + br) * 0.5;
        let tm = (tl + tr) * 0.5;
        let uv_mid = (uv_min.x + uv_max.x) * 0.5;

        let base = self.next_index();
        self.vertices.extend([
            Vertex::new(bl, -right, color, Vec2::new(uv_min.x, uv_max.y)),
            Vertex::new(bm, normal, color, Vec2::new(uv_mid, uv_max.y)),
            Vertex::new(br, right, color, Vec2::new(uv_max.x, uv_max.y)),
            Vertex::new(tr, right, color, Vec2::new(uv_max.x, uv_min.y)),
            Vertex::new(tm, normal, color, Vec2::new(uv_mid, uv_min.y)),
            Vertex::new(tl, -right, color, Vec2::new(uv_min.x, uv_min.y)),
        ]);
        self.indices.extend([
            base, base + 1, base + 4, base, base + 4, base + 5, // left half
            base + 1, base + 2, base + 3, base + 1, base + 3, base + 4, // right half
        ]);
    }

    /// Six flat-shaded faces of an oriented box
    pub fn add_obb(&mut self, obb: &Obb3, color: Rgba8) {
        let [i, j, k] = [obb.i_basis * obb.half_dims.x, obb.j_basis * obb.half_dims.y, obb.k_basis * obb.half_dims.z];
        let c = obb.center;
        let (uv0, uv1) = (Vec2::ZERO, Vec2::ONE);

        // Each face seen from outside: bottom-left, bottom-right, top-right, top-left
        self.add_quad(c + i - j - k, c + i + j - k, c + i + j + k, c + i - j + k, color, uv0, uv1); // +I
        self.add_quad(c - i + j - k, c - i - j - k, c - i - j + k, c - i + j + k, color, uv0, uv1); // -I
        self.add_quad(c + i + j - k, c - i + j - k, c - i + j + k, c + i + j + k, color, uv0, uv1); // +J
        self.add_quad(c - i - j - k, c + i - j - k, c + i - j + k, c - i - j + k, color, uv0, uv1); // -J
        self.add_quad(c - i - j + k, c + i - j + k, c + i + j + k, c - i + j + k, color, uv0, uv1); // +K
        self.add_quad(c - i - j - k, c - i + j - k, c + i + j - k, c + i - j - k, color, uv0, uv1); // -K
    }

    /// UV sphere with smooth normals
    pub fn add_sphere(&mut self, center: Vec3, radius: f32, color: Rgba8, slices: u32, stacks: u32) {
        let slices = slices.max(3);
        let stacks = stacks.max(2);
        let base = self.next_index();

        for stack in 0..=stacks {
            let v = stack as f32 / stacks as f32;
            let latitude = std::f32::consts::PI * (v - 0.5);
            for slice in 0..=slices {
                let u = slice as f32 / slices as f32;
                let longitude = std::f32::consts::TAU * u;
                let normal = Vec3::new(
                    latitude.cos() * longitude.cos(),
                    latitude.cos() * longitude.sin(),
                    latitude.sin(),
                );
                self.vertices.push(Vertex::new(center + normal * radius, normal, color, Vec2::new(u, 1.0 - v)));
            }
        }

        let row = slices + 1;
        for stack in 0..stacks {
            for slice in 0..slices {
                let a = base + stack * row + slice;
                let b = a + 1;
                let c = a + row;
                let d = c + 1;
                self.indices.extend([a, b, d, a, d, c]);
            }
        }
    }

    /// Line-list outline of a vertical cylinder: two rings and some uprights
    pub fn add_z_cylinder_wire(&mut self, cylinder: &ZCylinder, color: Rgba8, segments: u32) {
        let segments = segments.max(3);
        let base = self.next_index();
        for ring in [cylinder.bottom(), cylinder.top()] {
            for s in 0..segments {
                let angle = std::f32::consts::TAU * s as f32 / segments as f32;
                let offset = Vec3::new(angle.cos(), angle.sin(), 0.0) * cylinder.radius;
                let pos = Vec3::new(cylinder.center.x, cylinder.center.y, ring) + offset;
                self.vertices.push(Vertex::new(pos, offset.normalize_or_zero(), color, Vec2::ZERO));
            }
        }
        for s in 0..segments {
            let next = (s + 1) % segments;
            self.indices.extend([base + s, base + next]);
            self.indices.extend([base + segments + s, base + segments + next]);
            if s % 4 == 0 {
                self.indices.extend([base + s, base + segments + s]);
            }
        }
    }
}

/// Orientation of a sprite for the given billboard mode, as forward, left
/// and up columns. The sprite's face points along forward.
pub fn billboard_basis(
    billboard: BillboardType,
    entity_basis: Mat3,
    sprite_position: Vec3,
    camera_position: Vec3,
    camera_basis: Mat3,
) -> Mat3 {
    let from_forward = |forward: Vec3| {
        let i = forward.truncate().normalize_or_zero().extend(0.0);
        if i == Vec3::ZERO {
            return entity_basis;
        }
        let k = Vec3::Z;
        Mat3::from_cols(i, k.cross(i), k)
    };

    match billboard {
        BillboardType::None => entity_basis,
        BillboardType::WorldUpFacing => from_forward(camera_position - sprite_position),
        BillboardType::WorldUpOpposing => from_forward(-camera_basis.x_axis),
        BillboardType::FullOpposing => Mat3::from_cols(-camera_basis.x_axis, -camera_basis.y_axis, camera_basis.z_axis),
    }
}

/// Corners `bl, br, tr, tl` of a sprite of `size` whose `pivot` (0..1 on
/// each axis) sits at `position`, laid out in the basis' left/up plane
pub fn sprite_corners(position: Vec3, basis: Mat3, size: Vec2, pivot: Vec2) -> [Vec3; 4] {
    let left = basis.y_axis;
    let up = basis.z_axis;
    let corner = |u: f32, v: f32| position + left * (size.x * (u - pivot.x)) + up * (size.y * (v - pivot.y));
    [corner(0.0, 0.0), corner(1.0, 0.0), corner(1.0, 1.0), corner(0.0, 1.0)]
}
