//! Cascaded Shadow Mapping
//!
//! Directional-light shadows over large, mostly-empty space scenes. Each
//! shadowed light carries an ordered table of overlapping cascades centered
//! on a host-chosen anchor; a shadow pass renders every cascade's depth map
//! up front, and the color pass samples them per fragment with filtering,
//! bias, and an outer fade band.
//!
//! Frame flow:
//!
//! 1. [`CascadeTable::update`] positions each cascade around the anchor.
//! 2. [`ShadowPass::render`] rasterizes casters into [`FrameShadows`].
//! 3. [`ShadowSampler::sample`] returns per-fragment attenuation for the
//!    lighting accumulator.

pub mod cascade;
pub mod config;
pub mod map;
pub mod pass;
pub mod raster;
pub mod sampler;

pub use cascade::{
    map_slot, Cascade, CascadeCoord, CascadeTable, CascadeView, MAX_CASCADES, MAX_SHADOW_LIGHTS,
    MAX_SHADOW_MAPS,
};
pub use config::{ShadowConfig, ShadowQuality};
pub use map::{DepthStorage, ShadowMap, NO_TAG};
pub use pass::{FrameShadows, PassStats, ShadowCaster, ShadowPass};
pub use raster::{rasterize_mesh, RasterStats};
pub use sampler::{sample_shadow_single, ShadowSampler, MAX_PCF_TAPS};
