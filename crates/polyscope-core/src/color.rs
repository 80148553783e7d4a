//! Distinct default colors for newly registered structures.

use glam::Vec3;

const GOLDEN_RATIO_CONJUGATE: f32 = 0.618_034;

/// Generates a sequence of well-separated hues.
///
/// Owned by the session context and passed to whoever registers a structure,
/// so two sessions never share a sequence.
#[derive(Debug, Clone)]
pub struct UniqueColorSequence {
    hue: f32,
}

impl Default for UniqueColorSequence {
    fn default() -> Self {
        // start near green
        Self { hue: 0.3333 }
    }
}

impl UniqueColorSequence {
    /// Creates a fresh sequence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next color and advances the sequence.
    pub fn next_color(&mut self) -> Vec3 {
        self.hue = (self.hue + GOLDEN_RATIO_CONJUGATE).fract();
        hsv_to_rgb(self.hue, 0.65, 0.9)
    }
}

/// Converts HSV (all components in `[0, 1]`) to RGB.
#[must_use]
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Vec3 {
    let h6 = (h.fract() * 6.0).max(0.0);
    let sector = h6.floor();
    let f = h6 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let sector = sector as u32 % 6;
    match sector {
        0 => Vec3::new(v, t, p),
        1 => Vec3::new(q, v, p),
        2 => Vec3::new(p, v, t),
        3 => Vec3::new(p, q, v),
        4 => Vec3::new(t, p, v),
        _ => Vec3::new(v, p, q),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsv_primaries() {
        assert!((hsv_to_rgb(0.0, 1.0, 1.0) - Vec3::X).length() < 1e-5);
        assert!((hsv_to_rgb(1.0 / 3.0, 1.0, 1.0) - Vec3::Y).length() < 1e-5);
        assert!((hsv_to_rgb(2.0 / 3.0, 1.0, 1.0) - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_sequence_colors_differ() {
        let mut seq = UniqueColorSequence::new();
        let a = seq.next_color();
        let b = seq.next_color();
        assert!((a - b).length() > 0.1);
        for c in [a, b] {
            assert!(c.min_element() >= 0.0 && c.max_element() <= 1.0);
        }
    }
}
