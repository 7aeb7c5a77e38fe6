//! Packed Depth Encoding
//!
//! Shadow map targets only guarantee 8 bits per channel, so a normalized
//! depth value is split across two channels: the fractional and integer
//! parts of `depth * 255`. Decoding recombines them within 1/255 of the
//! original, and the packed comparison key preserves ordering so depth
//! tests can run on packed values directly.
//!
//! The all-zero packed value is reserved as the "no geometry" sentinel; the
//! encoder floors its output so no legitimate depth can produce it. Targets
//! with native high-precision depth storage skip packing entirely and apply
//! the same sentinel rule to `0.0`.

use serde::{Serialize, Deserialize};

/// Depth quantization scale (8-bit channel).
pub const DEPTH_SCALE: f32 = 255.0;

/// Smallest value the native-precision path will store. Keeps `0.0` free
/// for the sentinel.
pub const MIN_NATIVE_DEPTH: f32 = 1.0 / (255.0 * 255.0);

/// Two-channel packed depth texel.
///
/// Channel layout matches the render-target layout other passes may reuse:
/// channel 0 holds the fractional part of `depth * 255`, channel 1 the
/// integer part. Each stored channel divided by 255 is the [0,1] channel
/// value.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PackedDepth {
    /// Fractional part of `depth * 255`, quantized to 8 bits.
    pub frac: u8,
    /// Integer part of `depth * 255`.
    pub whole: u8,
}

impl PackedDepth {
    /// Reserved "no geometry rendered here" value.
    pub const SENTINEL: PackedDepth = PackedDepth { frac: 0, whole: 0 };

    /// Encode a normalized depth.
    ///
    /// Input is clamped to [0,1]. The result is never [`Self::SENTINEL`]:
    /// a depth of exactly zero encodes to the smallest positive packed
    /// value instead.
    pub fn encode(depth: f32) -> Self {
        let d = if depth.is_finite() { depth.clamp(0.0, 1.0) } else { 1.0 };
        let scaled = d * DEPTH_SCALE;
        let mut whole = scaled.floor() as u32;
        let mut frac = ((scaled - whole as f32) * DEPTH_SCALE).round() as u32;

        // Carry when the fraction rounds up to a full step
        if frac >= 256 {
            frac = 0;
            whole += 1;
        }
        if whole >= 256 {
            whole = 255;
            frac = 255;
        }

        // Keep the sentinel unreachable
        if whole == 0 && frac == 0 {
            frac = 1;
        }

        Self {
            frac: frac as u8,
            whole: whole as u8,
        }
    }

    /// Decode back to a normalized depth.
    pub fn decode(self) -> f32 {
        self.whole as f32 / DEPTH_SCALE + self.frac as f32 / (DEPTH_SCALE * DEPTH_SCALE)
    }

    /// Comparison key; ordering on keys matches ordering on decoded depth.
    pub fn key(self) -> u16 {
        ((self.whole as u16) << 8) | self.frac as u16
    }

    /// True if this texel holds the reserved "empty" value.
    pub fn is_sentinel(self) -> bool {
        self == Self::SENTINEL
    }
}

impl PartialOrd for PackedDepth {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackedDepth {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

/// Floor a depth value for native-precision storage so the `0.0` sentinel
/// stays unreachable.
pub fn encode_native(depth: f32) -> f32 {
    let d = if depth.is_finite() { depth.clamp(0.0, 1.0) } else { 1.0 };
    d.max(MIN_NATIVE_DEPTH)
}

/// Depth storage precision for shadow maps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepthPrecision {
    /// Two-channel 8-bit packing (portable baseline).
    #[default]
    Packed,
    /// Native f32 depth storage; packing skipped, depths compared directly.
    Native,
}
