//! Shadow Map Storage
//!
//! One depth buffer per (light, cascade), written during the shadow pass
//! and read-only afterwards. Texels hold packed two-channel depth or native
//! f32 depth, cleared to the reserved "no geometry" sentinel. An optional
//! tag plane stores the stable triangle tag of the nearest occluder for the
//! legacy single-map self-shadow veto.

use serde::{Serialize, Deserialize};

use crate::depth::{encode_native, DepthPrecision, PackedDepth};

/// Tag value for texels with no rasterized triangle.
pub const NO_TAG: u32 = u32::MAX;

/// Depth texel storage.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum DepthStorage {
    /// Two-channel packed texels.
    Packed(Vec<PackedDepth>),
    /// Native f32 depth.
    Native(Vec<f32>),
}

/// A single shadow map: square depth buffer plus optional triangle tags.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShadowMap {
    resolution: u32,
    depths: DepthStorage,
    tags: Option<Vec<u32>>,
}

impl ShadowMap {
    /// Create a map cleared to the sentinel.
    pub fn new(resolution: u32, precision: DepthPrecision, with_tags: bool) -> Self {
        let texels = (resolution * resolution) as usize;
        let depths = match precision {
            DepthPrecision::Packed => DepthStorage::Packed(vec![PackedDepth::SENTINEL; texels]),
            DepthPrecision::Native => DepthStorage::Native(vec![0.0; texels]),
        };
        Self {
            resolution,
            depths,
            tags: with_tags.then(|| vec![NO_TAG; texels]),
        }
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn has_tags(&self) -> bool {
        self.tags.is_some()
    }

    /// Reset every texel to the sentinel.
    pub fn clear(&mut self) {
        match &mut self.depths {
            DepthStorage::Packed(texels) => texels.fill(PackedDepth::SENTINEL),
            DepthStorage::Native(texels) => texels.fill(0.0),
        }
        if let Some(tags) = &mut self.tags {
            tags.fill(NO_TAG);
        }
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.resolution && y < self.resolution)
            .then(|| (y * self.resolution + x) as usize)
    }

    /// Write a depth if it is nearer than the stored value.
    ///
    /// Returns true when the texel was updated. Depth is encoded on write,
    /// so the stored value can never collide with the sentinel.
    pub fn store(&mut self, x: u32, y: u32, depth: f32, tag: u32) -> bool {
        let Some(i) = self.index(x, y) else {
            return false;
        };
        let written = match &mut self.depths {
            DepthStorage::Packed(texels) => {
                let encoded = PackedDepth::encode(depth);
                let nearer = texels[i].is_sentinel() || encoded.key() < texels[i].key();
                if nearer {
                    texels[i] = encoded;
                }
                nearer
            }
            DepthStorage::Native(texels) => {
                let encoded = encode_native(depth);
                let nearer = texels[i] == 0.0 || encoded < texels[i];
                if nearer {
                    texels[i] = encoded;
                }
                nearer
            }
        };
        if written {
            if let Some(tags) = &mut self.tags {
                tags[i] = tag;
            }
        }
        written
    }

    /// Decoded depth at a texel; `None` outside the map or where no
    /// geometry was rendered.
    pub fn depth_at(&self, x: u32, y: u32) -> Option<f32> {
        let i = self.index(x, y)?;
        match &self.depths {
            DepthStorage::Packed(texels) => {
                (!texels[i].is_sentinel()).then(|| texels[i].decode())
            }
            DepthStorage::Native(texels) => (texels[i] != 0.0).then(|| texels[i]),
        }
    }

    /// Triangle tag of the nearest occluder at a texel, if tags are stored
    /// and geometry was rendered there.
    pub fn tag_at(&self, x: u32, y: u32) -> Option<u32> {
        let i = self.index(x, y)?;
        let tag = *self.tags.as_ref()?.get(i)?;
        (tag != NO_TAG).then_some(tag)
    }

    /// Raw packed texels as bytes, in the two-channel fractional/integer
    /// layout other passes may reuse. `None` for native-precision maps.
    pub fn packed_bytes(&self) -> Option<&[u8]> {
        match &self.depths {
            DepthStorage::Packed(texels) => Some(bytemuck::cast_slice(texels)),
            DepthStorage::Native(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_map_is_empty() {
        let map = ShadowMap::new(8, DepthPrecision::Packed, false);
        for y in 0..8 {
            for x in 0..8 {
                assert!(map.depth_at(x, y).is_none());
            }
        }
    }

    #[test]
    fn test_store_keeps_nearest() {
        let mut map = ShadowMap::new(8, DepthPrecision::Packed, false);
        assert!(map.store(2, 3, 0.8, 0));
        assert!(map.store(2, 3, 0.3, 1)); // nearer wins
        assert!(!map.store(2, 3, 0.5, 2)); // farther loses
        let depth = map.depth_at(2, 3).unwrap();
        assert!((depth - 0.3).abs() < 1.0 / 255.0);
    }

    #[test]
    fn test_store_out_of_bounds() {
        let mut map = ShadowMap::new(8, DepthPrecision::Packed, false);
        assert!(!map.store(8, 0, 0.5, 0));
        assert!(map.depth_at(9, 9).is_none());
    }

    #[test]
    fn test_tags_follow_nearest() {
        let mut map = ShadowMap::new(8, DepthPrecision::Packed, true);
        map.store(1, 1, 0.9, 7);
        map.store(1, 1, 0.2, 42);
        map.store(1, 1, 0.5, 99); // loses the depth test
        assert_eq!(map.tag_at(1, 1), Some(42));
        assert_eq!(map.tag_at(0, 0), None);
    }

    #[test]
    fn test_native_precision() {
        let mut map = ShadowMap::new(8, DepthPrecision::Native, false);
        map.store(0, 0, 0.123456, 0);
        let depth = map.depth_at(0, 0).unwrap();
        assert!((depth - 0.123456).abs() < 1e-6); // no packing loss
    }

    #[test]
    fn test_zero_depth_still_occupied() {
        // A real depth of 0 must not read back as "empty"
        let mut map = ShadowMap::new(4, DepthPrecision::Packed, false);
        map.store(0, 0, 0.0, 0);
        assert!(map.depth_at(0, 0).is_some());

        let mut native = ShadowMap::new(4, DepthPrecision::Native, false);
        native.store(0, 0, 0.0, 0);
        assert!(native.depth_at(0, 0).is_some());
    }

    #[test]
    fn test_clear() {
        let mut map = ShadowMap::new(4, DepthPrecision::Packed, true);
        map.store(1, 1, 0.5, 3);
        map.clear();
        assert!(map.depth_at(1, 1).is_none());
        assert_eq!(map.tag_at(1, 1), None);
    }

    #[test]
    fn test_packed_bytes_layout() {
        let mut map = ShadowMap::new(2, DepthPrecision::Packed, false);
        map.store(0, 0, 0.5, 0);
        let bytes = map.packed_bytes().unwrap();
        assert_eq!(bytes.len(), 2 * 2 * 2);

        let native = ShadowMap::new(2, DepthPrecision::Native, false);
        assert!(native.packed_bytes().is_none());
    }
}
