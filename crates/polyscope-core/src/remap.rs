//! Mapping data values into drawable ranges.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Fraction of values trimmed from each end when computing a robust range.
pub const ROBUST_RANGE_FRACTION: f64 = 1e-5;

/// How scalar data should be interpreted when choosing a color map range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DataType {
    /// Map the full data range.
    #[default]
    Standard,
    /// Map a range symmetric about zero.
    Symmetric,
    /// Map from zero to the maximum.
    Magnitude,
}

impl DataType {
    /// The visualization range this data type uses for a given data range.
    #[must_use]
    pub fn default_viz_range(self, data_range: (f64, f64)) -> (f64, f64) {
        match self {
            Self::Standard => data_range,
            Self::Symmetric => {
                let abs_max = data_range.0.abs().max(data_range.1.abs());
                (-abs_max, abs_max)
            }
            Self::Magnitude => (0.0, data_range.1),
        }
    }
}

/// Min/max of the finite values, ignoring a small outlier fraction at each end.
///
/// Returns `(0.0, 1.0)` when there are no finite values.
#[must_use]
pub fn robust_min_max(values: &[f64], trim_fraction: f64) -> (f64, f64) {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return (0.0, 1.0);
    }
    sorted.sort_by(f64::total_cmp);

    let last = sorted.len() - 1;
    #[allow(clippy::cast_precision_loss)]
    let span = last as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lo = ((trim_fraction * span).floor() as usize).min(last);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let hi = (((1.0 - trim_fraction) * span).ceil() as usize).clamp(lo, last);

    (sorted[lo], sorted[hi])
}

/// How vector lengths should be interpreted when drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VectorType {
    /// Rescale so the longest vector draws at a fixed length.
    #[default]
    Standard,
    /// Vectors live in world units and are drawn as-is.
    Ambient,
}

/// Maps vectors to their drawn length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorMapper {
    vector_type: VectorType,
    min_magnitude: f32,
    max_magnitude: f32,
}

impl VectorMapper {
    /// Builds the mapper from the magnitudes of `vectors`.
    #[must_use]
    pub fn new(vectors: &[Vec3], vector_type: VectorType) -> Self {
        let mut min_magnitude = f32::INFINITY;
        let mut max_magnitude = 0.0_f32;
        for v in vectors {
            let len = v.length();
            if len.is_finite() {
                min_magnitude = min_magnitude.min(len);
                max_magnitude = max_magnitude.max(len);
            }
        }
        if !min_magnitude.is_finite() {
            min_magnitude = 0.0;
        }

        Self {
            vector_type,
            min_magnitude,
            max_magnitude,
        }
    }

    /// The vector interpretation this mapper was built for.
    #[must_use]
    pub fn vector_type(&self) -> VectorType {
        self.vector_type
    }

    /// Smallest finite magnitude seen.
    #[must_use]
    pub fn min_magnitude(&self) -> f32 {
        self.min_magnitude
    }

    /// Largest finite magnitude seen.
    #[must_use]
    pub fn max_magnitude(&self) -> f32 {
        self.max_magnitude
    }

    /// Maps one vector; standard vectors come out with length at most 1.
    #[must_use]
    pub fn map(&self, v: Vec3) -> Vec3 {
        match self.vector_type {
            VectorType::Ambient => v,
            VectorType::Standard if self.max_magnitude > 0.0 => v / self.max_magnitude,
            VectorType::Standard => v,
        }
    }
}
