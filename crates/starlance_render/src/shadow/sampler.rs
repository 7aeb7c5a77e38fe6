//! Cascade Selector & Sampler
//!
//! Per-fragment shadow evaluation for the main color pass. For each
//! shadowed directional light the sampler walks the light's cascade table
//! finest-first, applies a normal-offset bias, filters the shadow map with
//! a fixed set of rotated taps, and returns a scalar attenuation in [0,1]
//! (1 = fully lit).
//!
//! Cascades overlap, so the walk carries the depth interval already
//! validated by finer cascades along the light axis. Coarser cascades skip
//! stored occluders inside that interval: an occluder is tested in exactly
//! one cascade's evaluation, which prevents double-shadowing without
//! leaving gaps at cascade boundaries.
//!
//! Malformed fragment input fails open to fully lit; at this layer
//! availability beats strict correctness.

use glam::{Vec2, Vec3};

use crate::depth::DEPTH_SCALE;
use crate::shadow::cascade::{CascadeCoord, CascadeTable, CascadeView};
use crate::shadow::config::ShadowConfig;
use crate::shadow::map::ShadowMap;
use crate::shadow::pass::FrameShadows;

/// Number of precomputed filter offsets.
pub const MAX_PCF_TAPS: usize = 8;

/// Rotated filter tap offsets, in texels. Two interleaved rings so partial
/// tap counts still cover all directions.
pub const PCF_OFFSETS: [Vec2; MAX_PCF_TAPS] = [
    Vec2::new(0.9239, 0.3827),
    Vec2::new(-0.5081, 0.2105),
    Vec2::new(-0.3827, 0.9239),
    Vec2::new(0.2105, -0.5081),
    Vec2::new(-0.9239, -0.3827),
    Vec2::new(0.5081, -0.2105),
    Vec2::new(0.3827, -0.9239),
    Vec2::new(-0.2105, 0.5081),
];

/// Depth interval along the light axis already covered by finer cascades.
type ValidatedBand = Option<(f32, f32)>;

/// Per-fragment shadow sampler over one frame's shadow maps.
#[derive(Clone, Copy, Debug)]
pub struct ShadowSampler<'a> {
    config: &'a ShadowConfig,
    shadows: &'a FrameShadows,
}

impl<'a> ShadowSampler<'a> {
    pub fn new(config: &'a ShadowConfig, shadows: &'a FrameShadows) -> Self {
        Self { config, shadows }
    }

    /// Shadow attenuation for one fragment under one directional light.
    ///
    /// `table` must be the same table the shadow pass rendered from this
    /// frame. Returns 1.0 when the surface faces away from the light (the
    /// diffuse term is zero there, so no shadow work is spent).
    pub fn sample(&self, light: usize, table: &CascadeTable, world_pos: Vec3, normal: Vec3) -> f32 {
        if !self.config.enabled {
            return 1.0;
        }
        if !(world_pos.is_finite() && normal.is_finite()) {
            log::warn!("non-finite fragment input, failing open to lit");
            return 1.0;
        }

        let diffuse = normal.dot(-table.light_dir());
        if diffuse <= 0.0 {
            return 1.0;
        }

        let mut lit_total = 1.0f32;
        let mut validated: ValidatedBand = None;

        for (cascade, view) in table.views().iter().enumerate() {
            // Grazing angles get a larger offset along the normal
            let bias = view.texel_size * self.config.bias_scale * (1.0 - diffuse * diffuse);
            let biased = world_pos + normal * bias;

            let Some(coord) = table.project(cascade, biased) else {
                continue;
            };
            if !coord.in_bounds() {
                continue;
            }
            let Some(map) = self.shadows.map(light, cascade) else {
                continue;
            };

            let lit = self.filtered_lit(map, view, coord, validated);
            let occlusion =
                (1.0 - lit) * table.fade_factor(cascade, world_pos, self.config.fade_start);
            lit_total *= 1.0 - occlusion;
            if lit_total <= 0.0 {
                return 0.0;
            }

            validated = Some(match validated {
                Some((lo, hi)) => {
                    let (near, far) = view.depth_window();
                    (lo.min(near), hi.max(far))
                }
                None => view.depth_window(),
            });
        }

        lit_total
    }

    /// Percentage-closer filter over one cascade map.
    ///
    /// Each tap subtracts an equal share of the lit fraction when its
    /// stored depth is strictly nearer the light than the fragment (plus a
    /// fixed tolerance). Taps outside the map, on empty texels, or inside
    /// the validated band see no occluder.
    fn filtered_lit(
        &self,
        map: &ShadowMap,
        view: &CascadeView,
        coord: CascadeCoord,
        validated: ValidatedBand,
    ) -> f32 {
        let taps = (self.config.pcf_taps as usize).clamp(1, MAX_PCF_TAPS);
        let share = 1.0 / taps as f32;
        let res = map.resolution() as f32;
        let band_eps = view.window_len / DEPTH_SCALE;

        let mut lit = 1.0f32;
        for offset in &PCF_OFFSETS[..taps] {
            let uv = coord.uv + *offset / res;
            if !(0.0..1.0).contains(&uv.x) || !(0.0..1.0).contains(&uv.y) {
                continue;
            }
            let Some(stored) = map.depth_at((uv.x * res) as u32, (uv.y * res) as u32) else {
                continue;
            };
            if let Some((lo, hi)) = validated {
                let axis = view.axis_from_depth(stored);
                if axis >= lo - band_eps && axis <= hi + band_eps {
                    continue; // a finer cascade already tested this band
                }
            }
            if stored + self.config.depth_tolerance < coord.depth {
                lit -= share;
                if lit <= 1e-6 {
                    return 0.0;
                }
            }
        }
        lit
    }
}

/// Legacy single-map variant with triangle-tag self-shadow veto.
///
/// Superseded by the cascade walk's depth-band exclusion, kept for
/// pre-existing single shadow map data. Taps whose stored tag equals the
/// fragment's own triangle tag are ignored instead of excluding by depth
/// band; never combine this with the cascade path.
pub fn sample_shadow_single(
    config: &ShadowConfig,
    map: &ShadowMap,
    view: &CascadeView,
    light_dir: Vec3,
    world_pos: Vec3,
    normal: Vec3,
    self_tag: u32,
) -> f32 {
    if !config.enabled {
        return 1.0;
    }
    if !(world_pos.is_finite() && normal.is_finite()) {
        log::warn!("non-finite fragment input, failing open to lit");
        return 1.0;
    }
    let diffuse = normal.dot(-light_dir.normalize_or_zero());
    if diffuse <= 0.0 {
        return 1.0;
    }

    let bias = view.texel_size * config.bias_scale * (1.0 - diffuse * diffuse);
    let biased = world_pos + normal * bias;
    let ndc = view.view_proj.transform_point3(biased);
    let coord = CascadeCoord {
        uv: Vec2::new(ndc.x * 0.5 + 0.5, ndc.y * 0.5 + 0.5),
        depth: ndc.z,
    };
    if !coord.in_bounds() {
        return 1.0;
    }

    let taps = (config.pcf_taps as usize).clamp(1, MAX_PCF_TAPS);
    let share = 1.0 / taps as f32;
    let res = map.resolution() as f32;

    let mut lit = 1.0f32;
    for offset in &PCF_OFFSETS[..taps] {
        let uv = coord.uv + *offset / res;
        if !(0.0..1.0).contains(&uv.x) || !(0.0..1.0).contains(&uv.y) {
            continue;
        }
        let (x, y) = ((uv.x * res) as u32, (uv.y * res) as u32);
        let Some(stored) = map.depth_at(x, y) else {
            continue;
        };
        if map.tag_at(x, y) == Some(self_tag) {
            continue; // fragment's own triangle cannot occlude it
        }
        if stored + config.depth_tolerance < coord.depth {
            lit -= share;
            if lit <= 1e-6 {
                return 0.0;
            }
        }
    }
    lit
}
