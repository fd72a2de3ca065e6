//! # Crack Detection
//!
//! Cracks show up as local peaks in the distributed strain signal. The
//! [`CrackFinder`] accepts a peak if it is both high enough and prominent
//! enough, and uses the peak's valley floors as provisional transfer length
//! boundaries.
//!
//! ## Example
//!
//! ```rust
//! use crack_core::crackmonitoring::finding::CrackFinder;
//!
//! let x = [0.0, 1.0, 2.0, 3.0, 4.0];
//! let strain = [0.0, 50.0, 500.0, 50.0, 0.0];
//!
//! let cracks = CrackFinder::default().run(&x, &strain).unwrap();
//! assert_eq!(cracks.len(), 1);
//! assert_eq!(cracks[0].location, Some(2.0));
//! assert_eq!(cracks[0].segment(), Some((0.0, 4.0)));
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crackmonitoring::cracks::{Crack, CrackList};
use crate::equations::peaks::{find_peaks, PeakCriteria};
use crate::errors::{CrackError, CrackResult};

/// Peak based crack detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrackFinder {
    /// Minimum strain at a peak, `None` disables the check
    pub height: Option<f64>,
    /// Minimum prominence of a peak, `None` disables the check
    pub prominence: Option<f64>,
}

impl Default for CrackFinder {
    fn default() -> Self {
        CrackFinder {
            height: Some(100.0),
            prominence: Some(100.0),
        }
    }
}

impl CrackFinder {
    /// Finder with explicit criteria.
    pub fn new(height: Option<f64>, prominence: Option<f64>) -> Self {
        CrackFinder { height, prominence }
    }

    /// Peak criteria handed to the peak search.
    pub fn criteria(&self) -> PeakCriteria {
        PeakCriteria {
            height: self.height,
            prominence: self.prominence,
        }
    }

    /// Detect cracks in `strain` sampled at `x`.
    ///
    /// Returns one crack per accepted peak, ordered by location. No peaks
    /// gives an empty list.
    pub fn run(&self, x: &[f64], strain: &[f64]) -> CrackResult<CrackList> {
        if x.len() != strain.len() {
            return Err(CrackError::invalid_input(
                "strain",
                format!("{} values", strain.len()),
                format!("Length does not match x ({} values)", x.len()),
            ));
        }
        let cracks: CrackList = find_peaks(strain, &self.criteria())
            .into_iter()
            .map(|peak| {
                Crack::new(peak.index, x[peak.index], strain[peak.index])
                    .with_segment(x[peak.left_base], x[peak.right_base])
            })
            .collect();
        debug!(
            count = cracks.len(),
            height = ?self.height,
            prominence = ?self.prominence,
            "crack detection finished"
        );
        Ok(cracks)
    }
}
