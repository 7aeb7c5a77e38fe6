//! # starlance_render - Shadow and Lighting Core
//!
//! Backend-agnostic rendering core for the Starlance space-combat
//! simulation:
//! - Cascaded shadow maps for up to 2 directional lights, 6 cascades each
//! - Two-channel packed depth for 8-bit render targets, with a native f32
//!   path
//! - Software shadow rasterizer and percentage-closer sampling
//! - Per-fragment lighting accumulation over directional, point and spot
//!   lights
//!
//! ## Frame flow
//!
//! 1. Update each light's [`CascadeTable`] around the frame anchor
//! 2. Render all shadow maps with [`ShadowPass`]
//! 3. Shade fragments: [`ShadowSampler`] for attenuation, [`shade`] for
//!    the final color
//!
//! ## Example
//!
//! ```ignore
//! use starlance_render::prelude::*;
//!
//! let config = ShadowQuality::Medium.to_config();
//! let mut table = CascadeTable::with_ranges(&[50.0, 200.0, 800.0], 1.0, config.resolution);
//!
//! // Once per frame, before the shadow pass
//! table.update(camera_focus, sun.direction);
//!
//! let pass = ShadowPass::new(config.clone());
//! let (shadows, _stats) = pass.render(&[&table], &casters);
//!
//! // In the color pass
//! let sampler = ShadowSampler::new(&config, &shadows);
//! let attenuation = sampler.sample(0, &table, fragment_pos, fragment_normal);
//! let color = shade(&rig, &material, &fragment, &[attenuation]);
//! ```

pub mod depth;
pub mod geometry;
pub mod lighting;
pub mod shadow;

pub use depth::{encode_native, DepthPrecision, PackedDepth};
pub use geometry::{MeshData, TriangleRef, Vertex};
pub use lighting::{shade, DirectionalLight, LightRig, Material, PointLight, SpotLight, SurfaceSample};
pub use shadow::{
    Cascade, CascadeTable, FrameShadows, ShadowCaster, ShadowConfig, ShadowMap, ShadowPass,
    ShadowQuality, ShadowSampler,
};

/// Common imports for hosts of the rendering core.
pub mod prelude {
    pub use crate::depth::{DepthPrecision, PackedDepth};
    pub use crate::geometry::{MeshData, Vertex};
    pub use crate::lighting::{
        shade, DirectionalLight, LightRig, Material, PointLight, SpotLight, SurfaceSample,
    };
    pub use crate::shadow::{
        Cascade, CascadeTable, FrameShadows, ShadowCaster, ShadowConfig, ShadowMap, ShadowPass,
        ShadowQuality, ShadowSampler, MAX_CASCADES, MAX_SHADOW_LIGHTS, MAX_SHADOW_MAPS,
    };
}
