//! Shadow Generation Pass
//!
//! Renders every (light, cascade) shadow map for a frame before the main
//! color pass runs. The pass returns [`FrameShadows`] by value with all
//! maps immutable, so the write-then-read frame contract is enforced by
//! ownership: nothing can touch a map's texels once sampling begins.
//!
//! Maps live in a fixed array of `MAX_SHADOW_MAPS` slots addressed as
//! `light * MAX_CASCADES + cascade`; the bound is part of the type, not a
//! runtime check.

use glam::Mat4;
use serde::{Serialize, Deserialize};

use crate::geometry::MeshData;
use crate::shadow::cascade::{map_slot, CascadeTable, MAX_CASCADES, MAX_SHADOW_LIGHTS, MAX_SHADOW_MAPS};
use crate::shadow::config::ShadowConfig;
use crate::shadow::map::ShadowMap;
use crate::shadow::raster::{rasterize_mesh, RasterStats};

/// A mesh instance submitted to the shadow pass.
#[derive(Clone, Copy, Debug)]
pub struct ShadowCaster<'a> {
    pub mesh: &'a MeshData,
    pub model: Mat4,
}

/// All shadow maps for one frame, read-only once produced.
#[derive(Debug, Default)]
pub struct FrameShadows {
    maps: [Option<ShadowMap>; MAX_SHADOW_MAPS],
}

impl FrameShadows {
    /// Shadow map for a (light, cascade) pair, if one was rendered.
    pub fn map(&self, light: usize, cascade: usize) -> Option<&ShadowMap> {
        if light >= MAX_SHADOW_LIGHTS || cascade >= MAX_CASCADES {
            return None;
        }
        self.maps[map_slot(light, cascade)].as_ref()
    }

    /// Number of occupied slots.
    pub fn map_count(&self) -> usize {
        self.maps.iter().filter(|m| m.is_some()).count()
    }
}

/// Per-frame shadow pass statistics.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct PassStats {
    /// Lights that received shadow maps.
    pub lights_rendered: u32,
    /// Lights dropped at the fixed cap.
    pub lights_dropped: u32,
    /// Cascade maps rendered.
    pub maps_rendered: u32,
    /// Aggregate rasterizer counters.
    pub raster: RasterStats,
}

/// Shadow map generation for all shadowed directional lights.
#[derive(Clone, Debug)]
pub struct ShadowPass {
    config: ShadowConfig,
}

impl ShadowPass {
    pub fn new(mut config: ShadowConfig) -> Self {
        config.validate();
        Self { config }
    }

    pub fn config(&self) -> &ShadowConfig {
        &self.config
    }

    /// Render every cascade map for the given lights.
    ///
    /// Tables must already be updated for this frame; the host keeps them
    /// unchanged until sampling is done. Lights beyond
    /// [`MAX_SHADOW_LIGHTS`] are dropped with a warning.
    pub fn render(
        &self,
        tables: &[&CascadeTable],
        casters: &[ShadowCaster<'_>],
    ) -> (FrameShadows, PassStats) {
        let mut shadows = FrameShadows::default();
        let mut stats = PassStats::default();

        if !self.config.enabled {
            return (shadows, stats);
        }

        if tables.len() > MAX_SHADOW_LIGHTS {
            stats.lights_dropped = (tables.len() - MAX_SHADOW_LIGHTS) as u32;
            log::warn!(
                "{} shadow lights submitted, cap is {MAX_SHADOW_LIGHTS}",
                tables.len()
            );
        }

        for (light, table) in tables.iter().take(MAX_SHADOW_LIGHTS).enumerate() {
            for (cascade, view) in table.views().iter().enumerate() {
                let mut map = ShadowMap::new(
                    view.resolution,
                    self.config.precision,
                    self.config.triangle_tags,
                );
                let mut raster = RasterStats::default();
                for caster in casters {
                    rasterize_mesh(&mut map, view, caster.mesh, caster.model, &mut raster);
                }
                log::debug!(
                    "shadow map light {light} cascade {cascade}: {} texels from {} triangles",
                    raster.texels_written,
                    raster.triangles_in
                );
                stats.raster.merge(&raster);
                stats.maps_rendered += 1;
                shadows.maps[map_slot(light, cascade)] = Some(map);
            }
            stats.lights_rendered += 1;
        }

        (shadows, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn table(ranges: &[f32]) -> CascadeTable {
        let mut t = CascadeTable::with_ranges(ranges, 1.0, 64);
        t.update(Vec3::ZERO, Vec3::NEG_Z);
        t
    }

    #[test]
    fn test_pass_renders_all_cascades() {
        let pass = ShadowPass::new(ShadowConfig {
            resolution: 64,
            ..Default::default()
        });
        let t0 = table(&[10.0, 30.0]);
        let t1 = table(&[20.0]);
        let quad = MeshData::quad(5.0);
        let casters = [ShadowCaster { mesh: &quad, model: Mat4::IDENTITY }];

        let (shadows, stats) = pass.render(&[&t0, &t1], &casters);

        assert_eq!(stats.maps_rendered, 3);
        assert_eq!(stats.lights_rendered, 2);
        assert!(shadows.map(0, 0).is_some());
        assert!(shadows.map(0, 1).is_some());
        assert!(shadows.map(1, 0).is_some());
        assert!(shadows.map(1, 1).is_none());
        assert_eq!(shadows.map_count(), 3);
    }

    #[test]
    fn test_pass_disabled() {
        let pass = ShadowPass::new(ShadowConfig::disabled());
        let t = table(&[10.0]);
        let (shadows, stats) = pass.render(&[&t], &[]);
        assert_eq!(shadows.map_count(), 0);
        assert_eq!(stats.maps_rendered, 0);
    }

    #[test]
    fn test_light_cap_enforced() {
        let pass = ShadowPass::new(ShadowConfig {
            resolution: 64,
            ..Default::default()
        });
        let tables: Vec<CascadeTable> = (0..3).map(|_| table(&[10.0])).collect();
        let refs: Vec<&CascadeTable> = tables.iter().collect();

        let (shadows, stats) = pass.render(&refs, &[]);
        assert_eq!(stats.lights_rendered, MAX_SHADOW_LIGHTS as u32);
        assert_eq!(stats.lights_dropped, 1);
        assert!(shadows.map(2, 0).is_none());
    }

    #[test]
    fn test_out_of_range_lookup() {
        let shadows = FrameShadows::default();
        assert!(shadows.map(MAX_SHADOW_LIGHTS, 0).is_none());
        assert!(shadows.map(0, MAX_CASCADES).is_none());
    }
}
