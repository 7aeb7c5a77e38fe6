//! Mesh and geometry types consumed by the shadow and lighting passes.
//!
//! Triangle tags are stable across frames: a triangle's tag is the mesh's
//! tag base plus its index in submission order. Multi-part models give each
//! part its own base so tags never collide between groups.

use glam::{Vec2, Vec3, Vec4};
use serde::{Serialize, Deserialize};

/// Vertex attributes.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub color: Vec4,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            normal: Vec3::Y,
            uv: Vec2::ZERO,
            color: Vec4::ONE,
        }
    }
}

/// Triangle mesh data.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    /// First triangle tag for this mesh (group index for multi-part models).
    pub tag_base: u32,
}

/// One triangle of a mesh, resolved to world-space-ready attributes.
#[derive(Clone, Copy, Debug)]
pub struct TriangleRef {
    pub positions: [Vec3; 3],
    /// Stable tag: `mesh.tag_base + triangle index`.
    pub tag: u32,
}

impl MeshData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a quad in the XY plane facing +Z, centered at the origin.
    pub fn quad(size: f32) -> Self {
        let half = size * 0.5;
        let corner = |x: f32, y: f32, u: f32, v: f32| Vertex {
            position: Vec3::new(x, y, 0.0),
            normal: Vec3::Z,
            uv: Vec2::new(u, v),
            ..Default::default()
        };
        Self {
            vertices: vec![
                corner(-half, -half, 0.0, 1.0),
                corner(half, -half, 1.0, 1.0),
                corner(half, half, 1.0, 0.0),
                corner(-half, half, 0.0, 0.0),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
            tag_base: 0,
        }
    }

    /// Quad centered at `center`, lying in the plane facing `normal`.
    pub fn quad_facing(center: Vec3, normal: Vec3, size: f32) -> Self {
        let n = normal.normalize_or_zero();
        let reference = if n.y.abs() > 0.9 { Vec3::Z } else { Vec3::Y };
        let right = reference.cross(n).normalize_or_zero();
        let up = n.cross(right);
        let half = size * 0.5;

        let mut mesh = Self::new();
        for (r, u, tu, tv) in [
            (-half, -half, 0.0, 1.0),
            (half, -half, 1.0, 1.0),
            (half, half, 1.0, 0.0),
            (-half, half, 0.0, 0.0),
        ] {
            mesh.vertices.push(Vertex {
                position: center + right * r + up * u,
                normal: n,
                uv: Vec2::new(tu, tv),
                ..Default::default()
            });
        }
        mesh.indices = vec![0, 1, 2, 0, 2, 3];
        mesh
    }

    /// Set the tag base for multi-part models.
    pub fn with_tag_base(mut self, base: u32) -> Self {
        self.tag_base = base;
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Resolve triangle `i` to its positions and stable tag.
    ///
    /// Returns `None` when the triangle references out-of-range vertices;
    /// such triangles still consume their tag slot.
    pub fn triangle(&self, i: usize) -> Option<TriangleRef> {
        let base = i * 3;
        if base + 2 >= self.indices.len() {
            return None;
        }
        let mut positions = [Vec3::ZERO; 3];
        for (k, p) in positions.iter_mut().enumerate() {
            *p = self.vertices.get(self.indices[base + k] as usize)?.position;
        }
        Some(TriangleRef {
            positions,
            tag: self.tag_base + i as u32,
        })
    }

    /// Iterate resolved triangles, skipping unresolvable ones.
    pub fn triangles(&self) -> impl Iterator<Item = TriangleRef> + '_ {
        (0..self.triangle_count()).filter_map(|i| self.triangle(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad() {
        let quad = MeshData::quad(2.0);
        assert_eq!(quad.vertex_count(), 4);
        assert_eq!(quad.triangle_count(), 2);
        assert_eq!(quad.triangle(0).unwrap().tag, 0);
        assert_eq!(quad.triangle(1).unwrap().tag, 1);
    }

    #[test]
    fn test_quad_facing() {
        let quad = MeshData::quad_facing(Vec3::new(0.0, 5.0, 0.0), Vec3::Y, 4.0);
        for v in &quad.vertices {
            assert!((v.position.y - 5.0).abs() < 1e-5);
            assert!(v.position.x.abs() <= 2.0 + 1e-5);
        }
    }

    #[test]
    fn test_tag_base() {
        let quad = MeshData::quad(1.0).with_tag_base(100);
        assert_eq!(quad.triangle(1).unwrap().tag, 101);
    }

    #[test]
    fn test_out_of_range_triangle() {
        let mut mesh = MeshData::quad(1.0);
        mesh.indices.extend([0, 1, 99]); // bad vertex reference
        assert_eq!(mesh.triangle_count(), 3);
        assert!(mesh.triangle(2).is_none());
        assert_eq!(mesh.triangles().count(), 2);
    }
}
