//! # Cropping
//!
//! Restricts aligned arrays to a window of positions. Used twice: once to
//! cut the measurement area out of the raw sensor data, and once per crack to
//! cut its transfer length out of the compensated strain.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::errors::{CrackError, CrackResult};

/// Index range of the samples with `start_pos <= x <= end_pos`.
///
/// `x` must be ascending. `None` leaves that side open; infinite bounds are
/// allowed. An empty window yields an empty range.
///
/// ```rust
/// use crack_core::equations::cropping::crop_range;
///
/// let x = [0.0, 1.0, 2.0, 3.0, 4.0];
/// assert_eq!(crop_range(&x, Some(1.0), Some(3.0)), 1..4);
/// assert_eq!(crop_range(&x, Some(0.5), None), 1..5);
/// assert_eq!(crop_range(&x, Some(f64::NEG_INFINITY), Some(f64::INFINITY)), 0..5);
/// ```
pub fn crop_range(x: &[f64], start_pos: Option<f64>, end_pos: Option<f64>) -> Range<usize> {
    let start = start_pos.map_or(0, |s| x.partition_point(|&v| v < s));
    let end = end_pos.map_or(x.len(), |e| x.partition_point(|&v| v <= e));
    start..end.max(start)
}

/// Measurement-area window applied to the raw data of a strain profile.
///
/// Positions are first shifted by `offset`, then restricted to
/// `[start_pos, end_pos]`. If `end_pos` is not set but `length` is, the end
/// is `start_pos + length` (or the first sample + `length`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Crop {
    /// Start of the measurement area
    pub start_pos: Option<f64>,
    /// End of the measurement area, takes precedence over `length`
    pub end_pos: Option<f64>,
    /// Length of the measurement area
    pub length: Option<f64>,
    /// Shift added to every position before cropping
    pub offset: Option<f64>,
}

impl Crop {
    /// Crop between two positions.
    pub fn between(start_pos: f64, end_pos: f64) -> Self {
        Crop {
            start_pos: Some(start_pos),
            end_pos: Some(end_pos),
            ..Default::default()
        }
    }

    /// Check the window is usable.
    pub fn validate(&self) -> CrackResult<()> {
        for (name, value) in [
            ("crop.start_pos", self.start_pos),
            ("crop.end_pos", self.end_pos),
            ("crop.length", self.length),
            ("crop.offset", self.offset),
        ] {
            if let Some(v) = value {
                if v.is_nan() {
                    return Err(CrackError::configuration(name, "NaN", "Value must be a number"));
                }
            }
        }
        if let Some(length) = self.length {
            if length < 0.0 {
                return Err(CrackError::configuration(
                    "crop.length",
                    length.to_string(),
                    "Length must not be negative",
                ));
            }
        }
        Ok(())
    }

    /// True if the crop leaves the data untouched.
    pub fn is_noop(&self) -> bool {
        *self == Crop::default()
    }

    /// Shift and crop `x`.
    ///
    /// Returns the shifted, cropped positions and the index range to apply
    /// to every array aligned with `x`.
    pub fn apply(&self, x: &[f64]) -> (Vec<f64>, Range<usize>) {
        let offset = self.offset.unwrap_or(0.0);
        let shifted: Vec<f64> = x.iter().map(|v| v + offset).collect();
        let start = self.start_pos;
        let end = self.end_pos.or_else(|| {
            self.length
                .map(|len| start.or_else(|| shifted.first().copied()).unwrap_or(0.0) + len)
        });
        let range = crop_range(&shifted, start, end);
        (shifted[range.clone()].to_vec(), range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_range_inclusive_end() {
        let x = [0.0, 0.5, 1.0, 1.5, 2.0];
        assert_eq!(crop_range(&x, Some(0.5), Some(1.5)), 1..4);
        assert_eq!(crop_range(&x, Some(0.6), Some(1.4)), 2..3);
    }

    #[test]
    fn test_crop_range_empty_window() {
        let x = [0.0, 1.0, 2.0];
        assert!(crop_range(&x, Some(5.0), None).is_empty());
        assert!(crop_range(&x, Some(1.5), Some(1.2)).is_empty());
        assert!(crop_range(&x, None, Some(-1.0)).is_empty());
    }

    #[test]
    fn test_crop_apply_with_offset() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let crop = Crop {
            start_pos: Some(2.0),
            offset: Some(1.0),
            ..Default::default()
        };
        let (cropped, range) = crop.apply(&x);
        assert_eq!(cropped, vec![2.0, 3.0, 4.0]);
        assert_eq!(range, 1..4);
    }

    #[test]
    fn test_crop_apply_with_length() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let crop = Crop {
            start_pos: Some(1.0),
            length: Some(2.0),
            ..Default::default()
        };
        let (cropped, range) = crop.apply(&x);
        assert_eq!(cropped, vec![1.0, 2.0, 3.0]);
        assert_eq!(range, 1..4);

        // end_pos wins over length
        let crop = Crop {
            end_pos: Some(1.0),
            length: Some(3.0),
            ..Default::default()
        };
        assert_eq!(crop.apply(&x).1, 0..2);
    }

    #[test]
    fn test_default_crop_is_noop() {
        let x = [0.0, 1.0, 2.0];
        let crop = Crop::default();
        assert!(crop.is_noop());
        assert_eq!(crop.apply(&x), (x.to_vec(), 0..3));
    }

    #[test]
    fn test_crop_validation() {
        assert!(Crop::between(0.0, 1.0).validate().is_ok());
        let bad = Crop {
            length: Some(-1.0),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
