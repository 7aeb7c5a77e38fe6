//! Lighting Accumulator
//!
//! Combines shadowed directional terms with unshadowed point, spot and
//! ambient terms into a final fragment color. Directional lights take a
//! per-light shadow attenuation from the shadow sampler; point and spot
//! lights are never shadowed.
//!
//! Output channels are linear and left unsaturated; tone mapping or
//! clamping happens downstream. Alpha is material alpha times texture
//! alpha, independent of lighting.

use glam::{Vec3, Vec4};
use serde::{Serialize, Deserialize};

/// A directional light (sun-style, no falloff).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DirectionalLight {
    /// Direction from the light toward the scene (normalized).
    pub direction: Vec3,
    /// Light color (linear RGB).
    pub color: Vec3,
    /// Intensity multiplier.
    pub intensity: f32,
}

impl DirectionalLight {
    pub fn new(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            direction: direction.normalize_or_zero(),
            color,
            intensity,
        }
    }
}

/// A point light with inverse-square falloff.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PointLight {
    /// World position.
    pub position: Vec3,
    /// Light color (linear RGB).
    pub color: Vec3,
    /// Intensity at unit distance.
    pub intensity: f32,
}

/// A spot light: inverse-square falloff inside a cone with a linear
/// penumbra between the inner and outer cone angles.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SpotLight {
    /// World position.
    pub position: Vec3,
    /// Cone axis, from the light toward the scene (normalized).
    pub direction: Vec3,
    /// Light color (linear RGB).
    pub color: Vec3,
    /// Intensity at unit distance.
    pub intensity: f32,
    /// Cosine of the inner cone angle (full brightness inside).
    pub inner_cos: f32,
    /// Cosine of the outer cone angle (zero outside).
    pub outer_cos: f32,
}

impl SpotLight {
    /// Build from cone angles in radians, `inner <= outer`.
    pub fn new(position: Vec3, direction: Vec3, color: Vec3, intensity: f32, inner: f32, outer: f32) -> Self {
        Self {
            position,
            direction: direction.normalize_or_zero(),
            color,
            intensity,
            inner_cos: inner.min(outer).cos(),
            outer_cos: outer.cos(),
        }
    }

    /// Cone falloff for a direction from the light toward a point.
    fn cone_factor(&self, to_surface: Vec3) -> f32 {
        let cos_theta = self.direction.dot(to_surface);
        let span = (self.inner_cos - self.outer_cos).max(1e-4);
        ((cos_theta - self.outer_cos) / span).clamp(0.0, 1.0)
    }
}

/// Surface material parameters.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Material {
    /// Base color and alpha, modulated by the surface texture.
    pub base_color: Vec4,
    /// Self-illumination (linear RGB), unaffected by lights.
    pub emissive: Vec3,
    /// Specular strength.
    pub specular: f32,
    /// Blinn exponent; `0.0` disables the specular term.
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: Vec4::ONE,
            emissive: Vec3::ZERO,
            specular: 0.5,
            shininess: 0.0,
        }
    }
}

/// Per-fragment shading context.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceSample {
    /// World position.
    pub position: Vec3,
    /// Unit surface normal.
    pub normal: Vec3,
    /// Unit direction from the surface toward the viewer.
    pub view_dir: Vec3,
    /// Sampled texture color and alpha.
    pub texture: Vec4,
}

/// All lights affecting a frame, serde-loadable so scene presets are data
/// rather than code.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LightRig {
    /// Ambient color (linear RGB), applied to every surface.
    pub ambient: Vec3,
    /// Directional lights; index order matches shadow attenuation order.
    pub directional: Vec<DirectionalLight>,
    /// Point lights, unshadowed.
    pub point: Vec<PointLight>,
    /// Spot lights, unshadowed.
    pub spot: Vec<SpotLight>,
}

impl LightRig {
    /// Single sun with a faint ambient floor, the open-space default.
    pub fn single_sun(direction: Vec3) -> Self {
        Self {
            ambient: Vec3::splat(0.03),
            directional: vec![DirectionalLight::new(direction, Vec3::ONE, 1.0)],
            ..Default::default()
        }
    }

    /// Key light plus a dim opposing fill, for cockpit and hangar scenes.
    pub fn key_fill(key_direction: Vec3) -> Self {
        let key = DirectionalLight::new(key_direction, Vec3::ONE, 1.0);
        let fill = DirectionalLight::new(-key.direction, Vec3::new(0.6, 0.7, 1.0), 0.15);
        Self {
            ambient: Vec3::splat(0.05),
            directional: vec![key, fill],
            ..Default::default()
        }
    }
}

/// Accumulate all light contributions for one fragment.
///
/// `shadow` holds per-directional-light attenuation in rig order, as
/// produced by the shadow sampler; missing entries default to fully lit.
pub fn shade(rig: &LightRig, material: &Material, surface: &SurfaceSample, shadow: &[f32]) -> Vec4 {
    let normal = surface.normal.normalize_or_zero();
    let base = material.base_color.truncate() * surface.texture.truncate();

    let mut rgb = material.emissive + rig.ambient * base;

    for (i, light) in rig.directional.iter().enumerate() {
        let l = -light.direction.normalize_or_zero();
        let diffuse = normal.dot(l).max(0.0);
        if diffuse <= 0.0 {
            continue;
        }
        let attenuation = shadow.get(i).copied().unwrap_or(1.0);
        let mut term = base * diffuse;
        if material.shininess > 0.0 {
            let half = (l + surface.view_dir.normalize_or_zero()).normalize_or_zero();
            let blinn = normal.dot(half).max(0.0).powf(material.shininess);
            term += Vec3::splat(material.specular * blinn);
        }
        rgb += light.color * light.intensity * attenuation * term;
    }

    for light in &rig.point {
        let to_light = light.position - surface.position;
        let dist2 = to_light.length_squared().max(1e-4);
        let diffuse = normal.dot(to_light / dist2.sqrt()).max(0.0);
        if diffuse <= 0.0 {
            continue;
        }
        rgb += light.color * (light.intensity / dist2) * base * diffuse;
    }

    for light in &rig.spot {
        let to_light = light.position - surface.position;
        let dist2 = to_light.length_squared().max(1e-4);
        let l = to_light / dist2.sqrt();
        let diffuse = normal.dot(l).max(0.0);
        if diffuse <= 0.0 {
            continue;
        }
        let cone = light.cone_factor(-l);
        if cone <= 0.0 {
            continue;
        }
        rgb += light.color * (light.intensity / dist2) * cone * base * diffuse;
    }

    let alpha = material.base_color.w * surface.texture.w;
    rgb.extend(alpha)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> SurfaceSample {
        SurfaceSample {
            position: Vec3::ZERO,
            normal: Vec3::Z,
            view_dir: Vec3::Z,
            texture: Vec4::ONE,
        }
    }

    fn sun() -> LightRig {
        LightRig {
            ambient: Vec3::ZERO,
            directional: vec![DirectionalLight::new(Vec3::NEG_Z, Vec3::ONE, 1.0)],
            ..Default::default()
        }
    }

    #[test]
    fn test_emissive_and_ambient_only() {
        let rig = LightRig {
            ambient: Vec3::splat(0.1),
            ..Default::default()
        };
        let material = Material {
            emissive: Vec3::new(0.2, 0.0, 0.0),
            ..Default::default()
        };
        let color = shade(&rig, &material, &surface(), &[]);
        assert!((color.x - 0.3).abs() < 1e-6);
        assert!((color.y - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_directional_lambert() {
        let color = shade(&sun(), &Material::default(), &surface(), &[1.0]);
        // Head-on: full diffuse, no specular at shininess 0
        assert!((color.x - 1.0).abs() < 1e-6);

        let mut tilted = surface();
        tilted.normal = Vec3::new(1.0, 0.0, 1.0).normalize();
        let color = shade(&sun(), &Material::default(), &tilted, &[1.0]);
        assert!((color.x - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-5);
    }

    #[test]
    fn test_shadow_attenuation_scales_directional() {
        let material = Material::default();
        let lit = shade(&sun(), &material, &surface(), &[1.0]);
        let half = shade(&sun(), &material, &surface(), &[0.5]);
        let dark = shade(&sun(), &material, &surface(), &[0.0]);
        assert!((half.x - lit.x * 0.5).abs() < 1e-6);
        assert_eq!(dark.x, 0.0);
    }

    #[test]
    fn test_missing_attenuation_defaults_lit() {
        let with = shade(&sun(), &Material::default(), &surface(), &[1.0]);
        let without = shade(&sun(), &Material::default(), &surface(), &[]);
        assert_eq!(with, without);
    }

    #[test]
    fn test_facing_away_no_contribution() {
        let mut s = surface();
        s.normal = Vec3::NEG_Z;
        let color = shade(&sun(), &Material::default(), &s, &[1.0]);
        assert_eq!(color.truncate(), Vec3::ZERO);
    }

    #[test]
    fn test_point_inverse_square() {
        let rig = LightRig {
            point: vec![PointLight {
                position: Vec3::new(0.0, 0.0, 2.0),
                color: Vec3::ONE,
                intensity: 4.0,
            }],
            ..Default::default()
        };
        let near = shade(&rig, &Material::default(), &surface(), &[]);
        assert!((near.x - 1.0).abs() < 1e-5); // 4 / 2^2

        let mut far = surface();
        far.position = Vec3::new(0.0, 0.0, -2.0); // distance 4
        let far = shade(&rig, &Material::default(), &far, &[]);
        assert!((far.x - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_spot_penumbra_monotonic() {
        let spot = SpotLight::new(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::NEG_Z,
            Vec3::ONE,
            25.0,
            0.2,
            0.5,
        );
        let rig = LightRig {
            spot: vec![spot],
            ..Default::default()
        };

        // Sweep the surface point outward through the cone
        let mut prev = f32::INFINITY;
        for x in [0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0] {
            let mut s = surface();
            s.position = Vec3::new(x, 0.0, 0.0);
            let color = shade(&rig, &Material::default(), &s, &[]);
            assert!(color.x <= prev + 1e-6, "brightness rose at x = {x}");
            prev = color.x;
        }
        // Inside the inner cone: lit; well outside the outer cone: dark
        assert!(shade(&rig, &Material::default(), &surface(), &[]).x > 0.0);
        let mut outside = surface();
        outside.position = Vec3::new(4.0, 0.0, 0.0);
        assert_eq!(shade(&rig, &Material::default(), &outside, &[]).x, 0.0);
    }

    #[test]
    fn test_alpha_independent_of_lighting() {
        let material = Material {
            base_color: Vec4::new(1.0, 1.0, 1.0, 0.5),
            ..Default::default()
        };
        let mut s = surface();
        s.texture = Vec4::new(1.0, 1.0, 1.0, 0.8);

        let lit = shade(&sun(), &material, &s, &[1.0]);
        let dark = shade(&sun(), &material, &s, &[0.0]);
        assert!((lit.w - 0.4).abs() < 1e-6);
        assert_eq!(lit.w, dark.w);
    }

    #[test]
    fn test_channels_unclamped() {
        let rig = LightRig {
            directional: vec![DirectionalLight::new(Vec3::NEG_Z, Vec3::ONE, 10.0)],
            ..Default::default()
        };
        let color = shade(&rig, &Material::default(), &surface(), &[1.0]);
        assert!(color.x > 1.0);
    }

    #[test]
    fn test_specular_requires_shininess() {
        let matte = Material::default();
        let shiny = Material {
            shininess: 32.0,
            ..Default::default()
        };
        let flat = shade(&sun(), &matte, &surface(), &[1.0]);
        let glint = shade(&sun(), &shiny, &surface(), &[1.0]);
        assert!(glint.x > flat.x);
    }

    #[test]
    fn test_rig_presets_and_serde() {
        let rig = LightRig::key_fill(Vec3::new(0.0, -1.0, -1.0));
        assert_eq!(rig.directional.len(), 2);
        assert!(rig.directional[1].intensity < rig.directional[0].intensity);

        let json = serde_json::to_string(&rig).unwrap();
        let restored: LightRig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.directional.len(), 2);
        assert_eq!(restored.directional[0].direction, rig.directional[0].direction);
    }
}
