//! Cascade Table
//!
//! Each shadowed directional light owns an ordered list of cascades, finest
//! to coarsest. A cascade covers a square world-space region of half-width
//! `range` around the frame anchor, with a light-axis depth extent of
//! `range * depth_ratio` on either side. Selection walks the table in order
//! and accepts the first cascade whose light-space projection of the
//! fragment lands inside its texture bounds, so ties always resolve to the
//! finest resolution.
//!
//! The table also reconstructs stored depths back to world-space positions
//! along the light axis. The sampler uses this to exclude occluders that a
//! finer cascade has already validated, which keeps overlapping cascades
//! from double-shadowing and leaves no gap at their boundary.

use glam::{Mat4, Vec2, Vec3};
use serde::{Serialize, Deserialize};

/// Maximum cascades per directional light.
pub const MAX_CASCADES: usize = 6;

/// Maximum shadow-casting directional lights.
pub const MAX_SHADOW_LIGHTS: usize = 2;

/// Total simultaneously addressable shadow maps.
pub const MAX_SHADOW_MAPS: usize = MAX_SHADOW_LIGHTS * MAX_CASCADES;

/// Static shadow map slot for a (light, cascade) pair.
pub const fn map_slot(light: usize, cascade: usize) -> usize {
    light * MAX_CASCADES + cascade
}

/// One cascade of a directional light's shadow map set.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Cascade {
    /// World-space half-width of the orthographic footprint.
    pub range: f32,
    /// Light-axis half-depth as a multiple of `range`.
    pub depth_ratio: f32,
    /// Shadow map resolution for this cascade.
    pub resolution: u32,
}

impl Cascade {
    /// World units covered by one texel.
    pub fn texel_size(&self) -> f32 {
        self.range * 2.0 / self.resolution as f32
    }

    /// Half-extent of the depth window along the light axis.
    pub fn half_depth(&self) -> f32 {
        self.range * self.depth_ratio
    }
}

/// Per-frame derived view data for one cascade.
#[derive(Clone, Copy, Debug)]
pub struct CascadeView {
    /// Orthographic light view-projection for this cascade.
    pub view_proj: Mat4,
    /// Light-axis coordinate (`world · light_dir`) at texture depth 0.
    pub window_start: f32,
    /// Light-axis length of the depth window.
    pub window_len: f32,
    /// World units per texel.
    pub texel_size: f32,
    /// World-space half-width.
    pub range: f32,
    /// Shadow map resolution.
    pub resolution: u32,
}

impl CascadeView {
    /// Light-axis coordinate of a stored texture-space depth.
    pub fn axis_from_depth(&self, depth: f32) -> f32 {
        self.window_start + depth * self.window_len
    }

    /// Light-axis depth window as an interval.
    pub fn depth_window(&self) -> (f32, f32) {
        (self.window_start, self.window_start + self.window_len)
    }
}

/// Light-space texture coordinates for a projected fragment.
#[derive(Clone, Copy, Debug)]
pub struct CascadeCoord {
    /// Texture-space position, in bounds when both components are in [0,1].
    pub uv: Vec2,
    /// Normalized depth within the cascade's window.
    pub depth: f32,
}

impl CascadeCoord {
    /// True when the projection lands inside the cascade's texture bounds
    /// and depth window.
    pub fn in_bounds(&self) -> bool {
        self.uv.x >= 0.0
            && self.uv.x <= 1.0
            && self.uv.y >= 0.0
            && self.uv.y <= 1.0
            && self.depth >= 0.0
            && self.depth <= 1.0
    }
}

/// Ordered cascade list for one directional light.
///
/// Static configuration (the cascades) serializes for hot-reload; per-frame
/// view data is rebuilt by [`CascadeTable::update`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CascadeTable {
    cascades: Vec<Cascade>,

    #[serde(skip)]
    light_dir: Vec3,
    #[serde(skip)]
    anchor: Vec3,
    #[serde(skip)]
    right: Vec3,
    #[serde(skip)]
    up: Vec3,
    #[serde(skip)]
    views: Vec<CascadeView>,
}

impl CascadeTable {
    /// Build a table from cascades ordered near to far.
    ///
    /// Cascades beyond [`MAX_CASCADES`], and cascades that break the
    /// strictly ascending range order or have non-positive extents, are
    /// dropped with a warning.
    pub fn new(cascades: impl IntoIterator<Item = Cascade>) -> Self {
        let mut accepted: Vec<Cascade> = Vec::new();
        for cascade in cascades {
            if accepted.len() == MAX_CASCADES {
                log::warn!("cascade dropped: table is full ({MAX_CASCADES} max)");
                continue;
            }
            if cascade.range <= 0.0 || cascade.depth_ratio <= 0.0 || cascade.resolution == 0 {
                log::warn!("cascade dropped: non-positive extent {cascade:?}");
                continue;
            }
            if let Some(prev) = accepted.last() {
                if cascade.range <= prev.range {
                    log::warn!(
                        "cascade dropped: range {} not above previous {}",
                        cascade.range,
                        prev.range
                    );
                    continue;
                }
            }
            accepted.push(cascade);
        }

        Self {
            cascades: accepted,
            light_dir: Vec3::NEG_Z,
            anchor: Vec3::ZERO,
            right: Vec3::X,
            up: Vec3::Y,
            views: Vec::new(),
        }
    }

    /// Convenience: uniform depth ratio and resolution over a range list.
    pub fn with_ranges(ranges: &[f32], depth_ratio: f32, resolution: u32) -> Self {
        Self::new(ranges.iter().map(|&range| Cascade {
            range,
            depth_ratio,
            resolution,
        }))
    }

    /// Rebuild per-frame view data around a world anchor.
    ///
    /// `light_dir` points from the light toward the scene. The host must
    /// call this with identical values before generation and sampling
    /// within a frame.
    pub fn update(&mut self, anchor: Vec3, light_dir: Vec3) {
        let dir = light_dir.normalize_or_zero();
        let dir = if dir == Vec3::ZERO {
            log::warn!("degenerate light direction, using -Z");
            Vec3::NEG_Z
        } else {
            dir
        };

        let reference = if dir.y.abs() > 0.9 { Vec3::Z } else { Vec3::Y };
        let right = reference.cross(dir).normalize();
        let up = dir.cross(right);

        self.light_dir = dir;
        self.anchor = anchor;
        self.right = right;
        self.up = up;

        self.views.clear();
        for cascade in &self.cascades {
            let half_depth = cascade.half_depth();
            let eye = anchor - dir * half_depth;
            let view = Mat4::look_at_rh(eye, anchor, up);
            let proj = Mat4::orthographic_rh(
                -cascade.range,
                cascade.range,
                -cascade.range,
                cascade.range,
                0.0,
                half_depth * 2.0,
            );
            self.views.push(CascadeView {
                view_proj: proj * view,
                window_start: eye.dot(dir),
                window_len: half_depth * 2.0,
                texel_size: cascade.texel_size(),
                range: cascade.range,
                resolution: cascade.resolution,
            });
        }
    }

    pub fn len(&self) -> usize {
        self.cascades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cascades.is_empty()
    }

    pub fn cascades(&self) -> &[Cascade] {
        &self.cascades
    }

    /// Per-frame views; empty until [`Self::update`] has run.
    pub fn views(&self) -> &[CascadeView] {
        &self.views
    }

    pub fn view(&self, cascade: usize) -> Option<&CascadeView> {
        self.views.get(cascade)
    }

    /// Unit direction from the light toward the scene.
    pub fn light_dir(&self) -> Vec3 {
        self.light_dir
    }

    /// Coordinate of a world position along the light axis.
    pub fn axis_coord(&self, world: Vec3) -> f32 {
        world.dot(self.light_dir)
    }

    /// Project a world position into a cascade's texture space.
    pub fn project(&self, cascade: usize, world: Vec3) -> Option<CascadeCoord> {
        let view = self.views.get(cascade)?;
        let ndc = view.view_proj.transform_point3(world);
        Some(CascadeCoord {
            uv: Vec2::new(ndc.x * 0.5 + 0.5, ndc.y * 0.5 + 0.5),
            depth: ndc.z,
        })
    }

    /// First cascade whose texture bounds contain the projected position
    /// (finest-resolution-first tie-break).
    pub fn covering_cascade(&self, world: Vec3) -> Option<usize> {
        (0..self.views.len()).find(|&i| {
            self.project(i, world)
                .is_some_and(|coord| coord.in_bounds())
        })
    }

    /// Shadow strength for a fragment in the given cascade.
    ///
    /// Inner cascades never fade; the outermost fades linearly from 1 at
    /// `fade_start` of its range down to 0 at the edge, measured as
    /// max-norm distance from the anchor in the light plane to match the
    /// square orthographic footprint.
    pub fn fade_factor(&self, cascade: usize, world: Vec3, fade_start: f32) -> f32 {
        if cascade + 1 < self.views.len() {
            return 1.0;
        }
        let Some(view) = self.views.get(cascade) else {
            return 1.0;
        };

        let offset = world - self.anchor;
        let planar = Vec2::new(offset.dot(self.right), offset.dot(self.up));
        let t = planar.x.abs().max(planar.y.abs()) / view.range;

        if t <= fade_start {
            1.0
        } else {
            ((1.0 - t) / (1.0 - fade_start)).clamp(0.0, 1.0)
        }
    }
}
