//! Shadow Map Rasterizer
//!
//! Scan-converts scene triangles into a cascade's depth buffer from the
//! light's orthographic viewpoint. Depth is encoded on write and the
//! nearest value per texel wins. Triangle tags are consumed in submission
//! order whether or not a triangle produces texels, so tags stay stable
//! and collision-free even for degenerate geometry.

use glam::{Mat4, Vec2, Vec3};
use serde::{Serialize, Deserialize};

use crate::geometry::MeshData;
use crate::shadow::cascade::CascadeView;
use crate::shadow::map::ShadowMap;

/// Minimum doubled triangle area, in texels, below which a triangle is
/// treated as degenerate.
const MIN_AREA: f32 = 1e-6;

/// Per-pass rasterization counters.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct RasterStats {
    /// Triangles submitted.
    pub triangles_in: u32,
    /// Triangles that produced at least a coverage test.
    pub triangles_rasterized: u32,
    /// Zero-area triangles (tag consumed, nothing drawn).
    pub triangles_degenerate: u32,
    /// Triangles entirely outside the cascade volume.
    pub triangles_culled: u32,
    /// Depth writes that passed the nearest test.
    pub texels_written: u64,
}

impl RasterStats {
    pub fn merge(&mut self, other: &RasterStats) {
        self.triangles_in += other.triangles_in;
        self.triangles_rasterized += other.triangles_rasterized;
        self.triangles_degenerate += other.triangles_degenerate;
        self.triangles_culled += other.triangles_culled;
        self.texels_written += other.texels_written;
    }
}

#[inline]
fn edge(p0: Vec2, p1: Vec2, p: Vec2) -> f32 {
    (p1.x - p0.x) * (p.y - p0.y) - (p1.y - p0.y) * (p.x - p0.x)
}

/// Rasterize one mesh into a cascade's shadow map.
pub fn rasterize_mesh(
    map: &mut ShadowMap,
    view: &CascadeView,
    mesh: &MeshData,
    model: Mat4,
    stats: &mut RasterStats,
) {
    let res = map.resolution() as f32;

    for tri in mesh.triangles() {
        stats.triangles_in += 1;

        // Light-space screen coordinates (orthographic, so no divide)
        let mut screen = [Vec3::ZERO; 3];
        let mut finite = true;
        for (s, p) in screen.iter_mut().zip(tri.positions) {
            let world = model.transform_point3(p);
            let ndc = view.view_proj.transform_point3(world);
            *s = Vec3::new(
                (ndc.x * 0.5 + 0.5) * res,
                (ndc.y * 0.5 + 0.5) * res,
                ndc.z,
            );
            finite &= s.is_finite();
        }
        if !finite {
            stats.triangles_culled += 1;
            continue;
        }

        let [a, b, c] = screen;
        let area = edge(a.truncate(), b.truncate(), c.truncate());
        if area.abs() < MIN_AREA {
            stats.triangles_degenerate += 1;
            continue;
        }

        // Depth-clip whole triangles outside the cascade window
        if (a.z < 0.0 && b.z < 0.0 && c.z < 0.0) || (a.z > 1.0 && b.z > 1.0 && c.z > 1.0) {
            stats.triangles_culled += 1;
            continue;
        }

        let min_x = a.x.min(b.x).min(c.x).floor().max(0.0) as u32;
        let min_y = a.y.min(b.y).min(c.y).floor().max(0.0) as u32;
        let max_x = a.x.max(b.x).max(c.x).ceil().min(res - 1.0);
        let max_y = a.y.max(b.y).max(c.y).ceil().min(res - 1.0);
        if max_x < 0.0 || max_y < 0.0 || min_x as f32 > max_x || min_y as f32 > max_y {
            stats.triangles_culled += 1;
            continue;
        }
        let (max_x, max_y) = (max_x as u32, max_y as u32);

        stats.triangles_rasterized += 1;
        let inv_area = 1.0 / area;

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let l0 = edge(b.truncate(), c.truncate(), p) * inv_area;
                let l1 = edge(c.truncate(), a.truncate(), p) * inv_area;
                let l2 = edge(a.truncate(), b.truncate(), p) * inv_area;
                if l0 < 0.0 || l1 < 0.0 || l2 < 0.0 {
                    continue;
                }
                let z = l0 * a.z + l1 * b.z + l2 * c.z;
                if !(0.0..=1.0).contains(&z) {
                    continue;
                }
                if map.store(x, y, z, tri.tag) {
                    stats.texels_written += 1;
                }
            }
        }
    }
}
