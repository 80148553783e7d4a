//! Pick buffer color encoding.
//!
//! Pick programs write each element's global pick index as a 24-bit RGB
//! color. Index 0 is black and stands for the background.

use glam::Vec3;

/// Largest index representable in the pick buffer.
pub const MAX_PICK_INDEX: u64 = 0x00FF_FFFF;

/// Decodes a pick color back to an index.
///
/// The color is encoded as RGB where:
/// - R contains bits 16-23
/// - G contains bits 8-15
/// - B contains bits 0-7
#[must_use]
pub fn color_to_index(r: u8, g: u8, b: u8) -> u32 {
    (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

/// Encodes an index as a pick color.
#[must_use]
pub fn index_to_color(index: u32) -> [u8; 3] {
    let [_, r, g, b] = index.to_be_bytes();
    [r, g, b]
}

/// Encodes a global pick index as a normalized color attribute.
///
/// Indices beyond the 24-bit range wrap; a warning is logged.
#[must_use]
pub fn index_to_vec(index: u64) -> Vec3 {
    if index > MAX_PICK_INDEX {
        log::warn!("pick index {index} exceeds the 24-bit pick buffer");
    }
    #[allow(clippy::cast_possible_truncation)]
    let [r, g, b] = index_to_color((index & MAX_PICK_INDEX) as u32);
    Vec3::new(f32::from(r), f32::from(g), f32::from(b)) / 255.0
}

/// Decodes a normalized color read back from the pick buffer.
#[must_use]
pub fn vec_to_index(color: Vec3) -> u64 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    u64::from(color_to_index(channel(color.x), channel(color.y), channel(color.z)))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_specific_colors() {
        assert_eq!(index_to_color(0), [0, 0, 0]);
        assert_eq!(index_to_color(1), [0, 0, 1]);
        assert_eq!(index_to_color(255), [0, 0, 255]);
        assert_eq!(index_to_color(256), [0, 1, 0]);
        assert_eq!(index_to_color(0xFF0000), [255, 0, 0]);
        assert_eq!(index_to_vec(0), Vec3::ZERO);
    }

    proptest! {
        #[test]
        fn prop_normalized_color_roundtrip(index in 0..=MAX_PICK_INDEX) {
            prop_assert_eq!(vec_to_index(index_to_vec(index)), index);
        }
    }
}
