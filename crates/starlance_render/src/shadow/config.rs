//! Shadow Configuration
//!
//! Global shadow settings with serde support for hot-reload.

use serde::{Serialize, Deserialize};

use crate::depth::DepthPrecision;
use crate::shadow::sampler::MAX_PCF_TAPS;

/// Global shadow configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShadowConfig {
    /// Enable shadows globally.
    pub enabled: bool,

    /// Default shadow map resolution per cascade (power of 2).
    pub resolution: u32,

    /// Number of PCF taps per fragment (1..=8).
    pub pcf_taps: u32,

    /// Fixed tolerance added to stored depth before comparison.
    pub depth_tolerance: f32,

    /// Normal-offset bias multiplier (texel-size units).
    pub bias_scale: f32,

    /// Fraction of the outermost cascade's range where fade-out begins.
    pub fade_start: f32,

    /// Depth storage precision.
    pub precision: DepthPrecision,

    /// Write stable triangle tags alongside depth (legacy single-map path).
    pub triangle_tags: bool,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            resolution: 2048,
            pcf_taps: 8,
            depth_tolerance: 1.5 / 255.0,
            bias_scale: 2.0,
            fade_start: 0.9,
            precision: DepthPrecision::Packed,
            triangle_tags: false,
        }
    }
}

impl ShadowConfig {
    /// High-quality configuration.
    pub fn high_quality() -> Self {
        Self {
            resolution: 4096,
            pcf_taps: 8,
            precision: DepthPrecision::Native,
            ..Default::default()
        }
    }

    /// Low-quality configuration for performance.
    pub fn low_quality() -> Self {
        Self {
            resolution: 1024,
            pcf_taps: 4,
            ..Default::default()
        }
    }

    /// Configuration with shadows disabled.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Clamp all values to valid ranges, logging any adjustment.
    pub fn validate(&mut self) {
        let resolution = self.resolution.clamp(256, 8192).next_power_of_two();
        if resolution != self.resolution {
            log::warn!(
                "shadow resolution {} clamped to {}",
                self.resolution,
                resolution
            );
            self.resolution = resolution;
        }

        let taps = self.pcf_taps.clamp(1, MAX_PCF_TAPS as u32);
        if taps != self.pcf_taps {
            log::warn!("pcf tap count {} clamped to {}", self.pcf_taps, taps);
            self.pcf_taps = taps;
        }

        self.depth_tolerance = self.depth_tolerance.clamp(0.0, 0.05);
        self.bias_scale = self.bias_scale.clamp(0.0, 8.0);
        self.fade_start = self.fade_start.clamp(0.5, 0.99);
    }
}

/// Shadow quality preset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadowQuality {
    /// No shadows.
    Off,
    /// Basic shadows with low resolution.
    Low,
    /// Balanced quality and performance.
    Medium,
    /// High quality with native depth precision.
    High,
}

impl ShadowQuality {
    /// Convert to a [`ShadowConfig`].
    pub fn to_config(self) -> ShadowConfig {
        match self {
            Self::Off => ShadowConfig::disabled(),
            Self::Low => ShadowConfig::low_quality(),
            Self::Medium => ShadowConfig::default(),
            Self::High => ShadowConfig::high_quality(),
        }
    }
}
