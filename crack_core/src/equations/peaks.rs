//! # Peak Detection
//!
//! Local maxima of a sampled signal, filtered by height and topographic
//! prominence.
//!
//! ## Definitions
//!
//! - **Local maximum**: a sample strictly higher than its left neighbour and
//!   strictly higher than the first differing sample to its right. A flat
//!   plateau resolves to its middle sample (rounded down). The first and last
//!   samples are never peaks.
//! - **Prominence**: height of the peak above the higher of the two valley
//!   floors found by scanning outward until the signal rises above the peak
//!   or the edge of the signal is reached.
//! - **Bases**: the samples holding those valley floors. On ties, the sample
//!   closest to the peak wins.
//!
//! ```text
//!            peak
//!             /\        /\
//!            /  \      /  \
//!      /\   /    \    /    \
//!     /  \_/      \__/      \
//!    ↑              ↑
//!  left base     right base
//! ```

use serde::{Deserialize, Serialize};

/// Acceptance criteria for peaks. `None` disables a criterion.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PeakCriteria {
    /// Minimum peak value
    pub height: Option<f64>,
    /// Minimum prominence
    pub prominence: Option<f64>,
}

/// An accepted peak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    /// Sample index of the peak
    pub index: usize,
    /// Signal value at the peak
    pub height: f64,
    /// Topographic prominence
    pub prominence: f64,
    /// Sample index of the left valley floor
    pub left_base: usize,
    /// Sample index of the right valley floor
    pub right_base: usize,
}

/// Indices of all local maxima, plateaus resolved to their middle sample.
pub fn local_maxima(y: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if y.len() < 3 {
        return peaks;
    }
    let i_max = y.len() - 1;
    let mut i = 1;
    while i < i_max {
        if y[i - 1] < y[i] {
            let mut i_ahead = i + 1;
            while i_ahead < i_max && y[i_ahead] == y[i] {
                i_ahead += 1;
            }
            if y[i_ahead] < y[i] {
                let left_edge = i;
                let right_edge = i_ahead - 1;
                peaks.push((left_edge + right_edge) / 2);
                i = i_ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Prominence and bases of the peak at `peak`.
///
/// Returns `(prominence, left_base, right_base)`.
pub fn prominence(y: &[f64], peak: usize) -> (f64, usize, usize) {
    let top = y[peak];

    let mut left_min = top;
    let mut left_base = peak;
    let mut i = peak;
    loop {
        if y[i] > top {
            break;
        }
        if y[i] < left_min {
            left_min = y[i];
            left_base = i;
        }
        if i == 0 {
            break;
        }
        i -= 1;
    }

    let mut right_min = top;
    let mut right_base = peak;
    for (j, &value) in y.iter().enumerate().skip(peak) {
        if value > top {
            break;
        }
        if value < right_min {
            right_min = value;
            right_base = j;
        }
    }

    (top - left_min.max(right_min), left_base, right_base)
}

/// All peaks of `y` satisfying `criteria`, in ascending index order.
pub fn find_peaks(y: &[f64], criteria: &PeakCriteria) -> Vec<Peak> {
    local_maxima(y)
        .into_iter()
        .filter(|&i| criteria.height.map_or(true, |h| y[i] >= h))
        .filter_map(|i| {
            let (prom, left_base, right_base) = prominence(y, i);
            if criteria.prominence.map_or(true, |p| prom >= p) {
                Some(Peak {
                    index: i,
                    height: y[i],
                    prominence: prom,
                    left_base,
                    right_base,
                })
            } else {
                None
            }
        })
        .collect()
}

/// Local minima of `y`, found as peaks of `-y`.
///
/// The criteria apply to the negated signal, so `height` is a minimum depth
/// below zero. Reported heights are negated back to the values of `y`.
pub fn find_minima(y: &[f64], criteria: &PeakCriteria) -> Vec<Peak> {
    let negated: Vec<f64> = y.iter().map(|v| -v).collect();
    find_peaks(&negated, criteria)
        .into_iter()
        .map(|peak| Peak {
            height: -peak.height,
            ..peak
        })
        .collect()
}
