//! # Shrink and Creep Compensation
//!
//! Shrinkage and creep of the concrete shift the whole strain profile by a
//! roughly constant amount between the instantaneous measurement
//! (`strain_inst`, taken right after loading) and a later one. The offset is
//! estimated at the local minima of `strain_inst`, where no crack influences
//! the signal.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compensation::check_aligned;
use crate::equations::peaks::{find_minima, PeakCriteria};
use crate::errors::{CrackError, CrackResult};

/// Estimation method for the shrink offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShrinkMethod {
    /// Mean difference `strain - strain_inst` at the minima of `strain_inst`
    #[default]
    MeanMin,
}

/// Compensates shrinkage and creep with a uniform offset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShrinkCompensator {
    pub method: ShrinkMethod,
    /// Minimum depth of a minimum (applied to the negated signal)
    pub height: Option<f64>,
    /// Minimum prominence of a minimum
    pub prominence: Option<f64>,
}

impl ShrinkCompensator {
    /// Compensation values, one per sample.
    ///
    /// ```rust
    /// use crack_core::compensation::shrinking::ShrinkCompensator;
    ///
    /// let x = [0.0, 1.0, 2.0, 3.0, 4.0];
    /// let strain_inst = [30.0, 20.0, 10.0, 20.0, 30.0];
    /// let strain = [60.0, 50.0, 40.0, 50.0, 60.0];
    ///
    /// let values = ShrinkCompensator::default().run(&x, &strain, Some(&strain_inst)).unwrap();
    /// assert_eq!(values, vec![30.0; 5]);
    /// ```
    pub fn run(&self, x: &[f64], strain: &[f64], strain_inst: Option<&[f64]>) -> CrackResult<Vec<f64>> {
        let strain_inst = strain_inst.ok_or_else(|| {
            CrackError::precondition("shrink compensation", "strain_inst is required but not available")
        })?;
        check_aligned(x, strain, "strain")?;
        check_aligned(x, strain_inst, "strain_inst")?;

        let criteria = PeakCriteria {
            height: self.height,
            prominence: self.prominence,
        };
        let minima = find_minima(strain_inst, &criteria);
        if minima.is_empty() {
            return Err(CrackError::calculation_failed(
                "shrink compensation",
                "No local minimum found in strain_inst",
            ));
        }
        let offset = match self.method {
            ShrinkMethod::MeanMin => {
                let total: f64 = minima.iter().map(|m| strain[m.index] - strain_inst[m.index]).sum();
                total / minima.len() as f64
            }
        };
        debug!(minima = minima.len(), offset, "shrink offset estimated");
        Ok(vec![offset; x.len()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_single_minimum() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let strain_inst = [50.0, 30.0, 10.0, 30.0, 50.0, 60.0];
        let strain = [90.0, 70.0, 40.0, 70.0, 90.0, 100.0];
        let values = ShrinkCompensator::default().run(&x, &strain, Some(&strain_inst)).unwrap();
        assert_eq!(values.len(), 6);
        assert!(values.iter().all(|&v| approx_eq(v, 30.0)));
    }

    #[test]
    fn test_mean_over_minima() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let strain_inst = [50.0, 10.0, 50.0, 50.0, 20.0, 50.0, 50.0];
        let strain = [50.0, 30.0, 50.0, 50.0, 60.0, 50.0, 50.0];
        let values = ShrinkCompensator::default().run(&x, &strain, Some(&strain_inst)).unwrap();
        assert!(approx_eq(values[0], 30.0));
    }

    #[test]
    fn test_missing_strain_inst() {
        let err = ShrinkCompensator::default().run(&[0.0], &[0.0], None).unwrap_err();
        assert_eq!(err.error_code(), "PRECONDITION_FAILED");
    }

    #[test]
    fn test_no_minimum() {
        let x = [0.0, 1.0, 2.0];
        let strain_inst = [1.0, 2.0, 3.0];
        let err = ShrinkCompensator::default()
            .run(&x, &strain_inst, Some(&strain_inst))
            .unwrap_err();
        assert_eq!(err.error_code(), "CALCULATION_FAILED");
    }

    #[test]
    fn test_length_mismatch() {
        let x = [0.0, 1.0, 2.0];
        let err = ShrinkCompensator::default()
            .run(&x, &[0.0, 1.0, 0.0], Some(&[0.0, 1.0]))
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }
}
