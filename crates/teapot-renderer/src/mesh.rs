use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Vertex format shared by loaded models and procedural primitives.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    /// Zero normal means "unlit" (used for lines).
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

impl ModelVertex {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // normal
                wgpu::VertexAttribute {
                    offset: 12,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // color
                wgpu::VertexAttribute {
                    offset: 24,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Triangles,
    Lines,
}

/// CPU-side geometry ready for upload.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub topology: Topology,
}

impl Mesh {
    pub fn new(topology: Topology) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            topology,
        }
    }

    /// Append a flat-shaded triangle.
    pub fn push_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3, color: [f32; 3]) {
        let normal = (b - a).cross(c - a).normalize_or_zero().to_array();
        let base = self.vertices.len() as u32;
        for p in [a, b, c] {
            self.vertices.push(ModelVertex {
                position: p.to_array(),
                normal,
                color,
            });
        }
        self.indices.extend_from_slice(&[base, base + 1, base + 2]);
    }

    /// Append a planar quad as two triangles (corners in winding order).
    pub fn push_quad(&mut self, corners: [Vec3; 4], color: [f32; 3]) {
        let [a, b, c, d] = corners;
        self.push_triangle(a, b, c, color);
        self.push_triangle(a, c, d, color);
    }

    pub fn push_line(&mut self, a: Vec3, b: Vec3, color: [f32; 3]) {
        let base = self.vertices.len() as u32;
        for p in [a, b] {
            self.vertices.push(ModelVertex {
                position: p.to_array(),
                normal: [0.0; 3],
                color,
            });
        }
        self.indices.extend_from_slice(&[base, base + 1]);
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

const RED: [f32; 3] = [1.0, 0.0, 0.0];
const GREEN: [f32; 3] = [0.0, 1.0, 0.0];
const BLUE: [f32; 3] = [0.0, 0.0, 1.0];

/// Reference axes for the sensor's absolute frame.
///
/// Sensor X is drawn red along -Z, sensor Y blue along -X, sensor Z green
/// along +Y, each with a two-stroke arrow tip.
pub fn axes_mesh(length: f32, tip: f32) -> Mesh {
    let mut mesh = Mesh::new(Topology::Lines);

    // Sensor X reaches a little further so the tip clears the slab.
    let x_end = Vec3::new(0.0, 0.0, -length - 0.5);
    let y_end = Vec3::new(-length, 0.0, 0.0);
    let z_end = Vec3::new(0.0, length, 0.0);

    mesh.push_line(Vec3::ZERO, y_end, BLUE);
    mesh.push_line(y_end, y_end + Vec3::new(tip, 0.0, tip), BLUE);
    mesh.push_line(y_end, y_end + Vec3::new(tip, 0.0, -tip), BLUE);

    mesh.push_line(Vec3::ZERO, z_end, GREEN);
    mesh.push_line(z_end, z_end + Vec3::new(tip, -tip, 0.0), GREEN);
    mesh.push_line(z_end, z_end + Vec3::new(-tip, -tip, 0.0), GREEN);

    mesh.push_line(Vec3::ZERO, x_end, RED);
    mesh.push_line(x_end, x_end + Vec3::new(0.0, tip, tip), RED);
    mesh.push_line(x_end, x_end + Vec3::new(0.0, -tip, tip), RED);

    mesh
}

/// A 2 x 0.4 x 2 slab with a different colour on each face.
pub fn slab_mesh() -> Mesh {
    let (hx, hy, hz) = (1.0, 0.2, 1.0);
    let v = |x: f32, y: f32, z: f32| Vec3::new(x * hx, y * hy, z * hz);
    let mut mesh = Mesh::new(Topology::Triangles);

    // top
    mesh.push_quad([v(1., 1., -1.), v(-1., 1., -1.), v(-1., 1., 1.), v(1., 1., 1.)], GREEN);
    // bottom
    mesh.push_quad([v(1., -1., 1.), v(-1., -1., 1.), v(-1., -1., -1.), v(1., -1., -1.)], [1.0, 0.5, 0.0]);
    // front
    mesh.push_quad([v(1., 1., 1.), v(-1., 1., 1.), v(-1., -1., 1.), v(1., -1., 1.)], RED);
    // back
    mesh.push_quad([v(1., -1., -1.), v(-1., -1., -1.), v(-1., 1., -1.), v(1., 1., -1.)], [1.0, 1.0, 0.0]);
    // left
    mesh.push_quad([v(-1., 1., 1.), v(-1., 1., -1.), v(-1., -1., -1.), v(-1., -1., 1.)], BLUE);
    // right
    mesh.push_quad([v(1., 1., -1.), v(1., 1., 1.), v(1., -1., 1.), v(1., -1., -1.)], [1.0, 0.0, 1.0]);

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_matches_struct() {
        assert_eq!(std::mem::size_of::<ModelVertex>(), 36);
        assert_eq!(ModelVertex::layout().array_stride, 36);
    }

    #[test]
    fn axes_are_nine_line_segments() {
        let mesh = axes_mesh(2.0, 0.2);
        assert_eq!(mesh.topology, Topology::Lines);
        assert_eq!(mesh.indices.len(), 18);
        assert!(mesh.vertices.iter().all(|v| v.normal == [0.0; 3]));
    }

    #[test]
    fn slab_has_six_faces_pointing_outward() {
        let mesh = slab_mesh();
        assert_eq!(mesh.topology, Topology::Triangles);
        assert_eq!(mesh.indices.len(), 6 * 2 * 3);

        for tri in mesh.indices.chunks(3) {
            let v = &mesh.vertices[tri[0] as usize];
            let centroid = tri
                .iter()
                .map(|&i| Vec3::from_array(mesh.vertices[i as usize].position))
                .sum::<Vec3>()
                / 3.0;
            assert!(Vec3::from_array(v.normal).dot(centroid) > 0.0);
        }
    }

    #[test]
    fn degenerate_triangle_gets_zero_normal() {
        let mut mesh = Mesh::new(Topology::Triangles);
        mesh.push_triangle(Vec3::ZERO, Vec3::X, Vec3::X * 2.0, RED);
        assert_eq!(mesh.vertices[0].normal, [0.0; 3]);
    }
}
