//! # Tension Stiffening Compensation
//!
//! Between cracks the concrete still carries tension, so part of the measured
//! strain does not open a crack. The compensators here estimate that part so
//! it can be subtracted before the crack widths are integrated.
//!
//! ## Approaches
//!
//! - [`Berrocal`] - for sensors attached to the reinforcement. The concrete
//!   share is the gap between the measured strain and the straight line
//!   through the crack peaks, scaled by `ρ·α`.
//! - [`Fischer`] - for sensors embedded in the concrete. The concrete strain
//!   rises linearly from zero at the crack to a limit strain at each end of
//!   the transfer length.
//!
//! ```text
//!   Fischer, one crack:
//!
//!   limit_l                         limit_r
//!      \                            /
//!       \                        /
//!        \                    /
//!         \________________/___________ 0
//!    x_l      location          x_r
//! ```
//!
//! Both implement [`TensionStiffening`]. [`TensionStiffeningCompensator`] is
//! the serializable selection between them.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compensation::check_aligned;
use crate::crackmonitoring::cracks::CrackList;
use crate::equations::interpolation::{find_closest_value, interp};
use crate::errors::{CrackError, CrackResult};

/// Estimates the strain carried by the concrete between cracks.
pub trait TensionStiffening {
    /// Compensation values, one per sample of `x`.
    fn run(&self, x: &[f64], strain: &[f64], cracks: &CrackList) -> CrackResult<Vec<f64>>;

    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;
}

/// Tension stiffening for reinforcement-attached sensors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Berrocal {
    /// Reinforcement ratio ρ
    pub reinforcement_ratio: f64,
    /// Ratio of the Young's moduli of steel and concrete α
    pub modulus_ratio: f64,
}

impl Berrocal {
    pub fn new(modulus_ratio: f64, reinforcement_ratio: f64) -> Self {
        Berrocal {
            reinforcement_ratio,
            modulus_ratio,
        }
    }
}

impl TensionStiffening for Berrocal {
    /// ```rust
    /// use crack_core::compensation::tension_stiffening::{Berrocal, TensionStiffening};
    /// use crack_core::crackmonitoring::cracks::{Crack, CrackList};
    ///
    /// let x = [0.0, 1.0, 2.0];
    /// let strain = [400.0, 100.0, 200.0];
    /// let cracks = CrackList::from(vec![Crack::new(0, 0.0, 400.0), Crack::new(2, 2.0, 200.0)]);
    ///
    /// let values = Berrocal::new(5.0, 0.02).run(&x, &strain, &cracks).unwrap();
    /// assert!((values[1] - 20.0).abs() < 1e-9);
    /// ```
    fn run(&self, x: &[f64], strain: &[f64], cracks: &CrackList) -> CrackResult<Vec<f64>> {
        check_aligned(x, strain, "strain")?;
        if cracks.len() < 2 {
            return Err(CrackError::precondition(
                "berrocal tension stiffening",
                format!("At least 2 cracks are required, got {}", cracks.len()),
            ));
        }
        let mut peaks = cracks
            .iter()
            .map(|c| match (c.location, c.max_strain) {
                (Some(location), Some(max_strain)) => Ok((location, max_strain)),
                (None, _) => Err(CrackError::missing_field("location")),
                (_, None) => Err(CrackError::missing_field("max_strain")),
            })
            .collect::<CrackResult<Vec<(f64, f64)>>>()?;
        peaks.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (xp, fp): (Vec<f64>, Vec<f64>) = peaks.into_iter().unzip();

        let factor = self.reinforcement_ratio * self.modulus_ratio;
        let values = interp(x, &xp, &fp)
            .into_iter()
            .zip(strain)
            .map(|(peak_line, measured)| (factor * (peak_line - measured)).max(0.0))
            .collect();
        Ok(values)
    }

    fn name(&self) -> &'static str {
        "berrocal"
    }
}

/// Tension stiffening for concrete-embedded sensors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fischer {
    /// Upper limit of the concrete strain at the transfer length ends
    pub max_concrete_strain: f64,
}

impl Default for Fischer {
    fn default() -> Self {
        Fischer {
            max_concrete_strain: 100.0,
        }
    }
}

impl Fischer {
    pub fn new(max_concrete_strain: f64) -> Self {
        Fischer { max_concrete_strain }
    }
}

/// Linear ramp from 0 at `at` to `limit` at `end`.
fn ramp(position: f64, at: f64, end: f64, limit: f64) -> f64 {
    let span = end - at;
    if span == 0.0 {
        0.0
    } else {
        limit * (position - at) / span
    }
}

impl TensionStiffening for Fischer {
    fn run(&self, x: &[f64], strain: &[f64], cracks: &CrackList) -> CrackResult<Vec<f64>> {
        check_aligned(x, strain, "strain")?;
        let mut values = vec![0.0; x.len()];
        if x.is_empty() {
            return Ok(values);
        }
        for crack in cracks {
            let location = crack.location.ok_or_else(|| CrackError::missing_field("location"))?;
            let x_l = crack.x_l.ok_or_else(|| CrackError::missing_field("x_l"))?;
            let x_r = crack.x_r.ok_or_else(|| CrackError::missing_field("x_r"))?;
            let (Some((l_i, x_l)), Some((r_i, x_r))) = (find_closest_value(x, x_l), find_closest_value(x, x_r)) else {
                continue;
            };
            let limit_l = strain[l_i].min(self.max_concrete_strain);
            let limit_r = strain[r_i].min(self.max_concrete_strain);
            for i in l_i..=r_i {
                values[i] = if x[i] <= location {
                    ramp(x[i], location, x_l, limit_l)
                } else {
                    ramp(x[i], location, x_r, limit_r)
                };
            }
        }
        for (value, measured) in values.iter_mut().zip(strain) {
            *value = value.min(*measured).max(0.0);
        }
        Ok(values)
    }

    fn name(&self) -> &'static str {
        "fischer"
    }
}

/// Selects the tension stiffening approach.
///
/// ## JSON Example
///
/// ```json
/// { "method": "berrocal", "reinforcement_ratio": 0.02, "modulus_ratio": 6.0 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum TensionStiffeningCompensator {
    Berrocal(Berrocal),
    Fischer(Fischer),
}

impl Default for TensionStiffeningCompensator {
    fn default() -> Self {
        TensionStiffeningCompensator::Fischer(Fischer::default())
    }
}

impl TensionStiffeningCompensator {
    fn inner(&self) -> &dyn TensionStiffening {
        match self {
            TensionStiffeningCompensator::Berrocal(c) => c,
            TensionStiffeningCompensator::Fischer(c) => c,
        }
    }

    /// Check the parameters are usable.
    pub fn validate(&self) -> CrackResult<()> {
        let checks: Vec<(&str, f64)> = match self {
            TensionStiffeningCompensator::Berrocal(c) => vec![
                ("reinforcement_ratio", c.reinforcement_ratio),
                ("modulus_ratio", c.modulus_ratio),
            ],
            TensionStiffeningCompensator::Fischer(c) => vec![("max_concrete_strain", c.max_concrete_strain)],
        };
        for (option, value) in checks {
            if !value.is_finite() {
                return Err(CrackError::configuration(option, value.to_string(), "Value must be finite"));
            }
        }
        Ok(())
    }
}

impl TensionStiffening for TensionStiffeningCompensator {
    fn run(&self, x: &[f64], strain: &[f64], cracks: &CrackList) -> CrackResult<Vec<f64>> {
        let values = self.inner().run(x, strain, cracks)?;
        debug!(method = self.name(), cracks = cracks.len(), "tension stiffening computed");
        Ok(values)
    }

    fn name(&self) -> &'static str {
        self.inner().name()
    }
}

impl From<Berrocal> for TensionStiffeningCompensator {
    fn from(c: Berrocal) -> Self {
        TensionStiffeningCompensator::Berrocal(c)
    }
}

impl From<Fischer> for TensionStiffeningCompensator {
    fn from(c: Fischer) -> Self {
        TensionStiffeningCompensator::Fischer(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crackmonitoring::cracks::Crack;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_berrocal_needs_two_cracks() {
        let x = [0.0, 1.0, 2.0];
        let strain = [0.0, 300.0, 0.0];
        let cracks = CrackList::from(vec![Crack::new(1, 1.0, 300.0)]);
        let err = Berrocal::new(6.0, 0.01).run(&x, &strain, &cracks).unwrap_err();
        assert_eq!(err.error_code(), "PRECONDITION_FAILED");
    }

    #[test]
    fn test_berrocal_flat_outside_cracks() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let strain = [100.0, 400.0, 100.0, 200.0, 50.0];
        let cracks = CrackList::from(vec![Crack::new(3, 3.0, 200.0), Crack::new(1, 1.0, 400.0)]);
        let values = Berrocal::new(10.0, 0.1).run(&x, &strain, &cracks).unwrap();
        // Peak line: 400, 400, 300, 200, 200
        let expected = [300.0, 0.0, 200.0, 0.0, 150.0];
        for (v, e) in values.iter().zip(expected.iter()) {
            assert!(approx_eq(*v, *e), "{} != {}", v, e);
        }
    }

    #[test]
    fn test_berrocal_floors_at_zero() {
        let x = [0.0, 1.0, 2.0];
        let strain = [100.0, 500.0, 100.0];
        let cracks = CrackList::from(vec![Crack::new(0, 0.0, 100.0), Crack::new(2, 2.0, 100.0)]);
        let values = Berrocal::new(6.0, 0.02).run(&x, &strain, &cracks).unwrap();
        assert_eq!(values, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_fischer_linear_ramp() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let strain = [300.0, 300.0, 300.0, 500.0, 300.0, 300.0, 300.0];
        let cracks = CrackList::from(vec![Crack::new(3, 3.0, 500.0).with_segment(1.0, 5.0)]);
        let values = Fischer::default().run(&x, &strain, &cracks).unwrap();
        let expected = [0.0, 100.0, 50.0, 0.0, 50.0, 100.0, 0.0];
        for (v, e) in values.iter().zip(expected.iter()) {
            assert!(approx_eq(*v, *e), "{} != {}", v, e);
        }
    }

    #[test]
    fn test_fischer_limited_by_measured_strain() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let strain = [40.0, 30.0, 400.0, 60.0, -20.0];
        let cracks = CrackList::from(vec![Crack::new(2, 2.0, 400.0).with_segment(0.0, 4.0)]);
        let values = Fischer::default().run(&x, &strain, &cracks).unwrap();
        // Left limit 40, right limit -20
        assert!(approx_eq(values[0], 40.0));
        assert!(approx_eq(values[1], 20.0));
        assert!(approx_eq(values[2], 0.0));
        assert!(values.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_fischer_snaps_infinite_boundaries() {
        let x = [0.0, 1.0, 2.0];
        let strain = [80.0, 300.0, 60.0];
        let cracks =
            CrackList::from(vec![Crack::new(1, 1.0, 300.0).with_segment(f64::NEG_INFINITY, f64::INFINITY)]);
        let values = Fischer::default().run(&x, &strain, &cracks).unwrap();
        assert_eq!(values, vec![80.0, 0.0, 60.0]);
    }

    #[test]
    fn test_fischer_missing_boundary() {
        let x = [0.0, 1.0, 2.0];
        let strain = [0.0, 300.0, 0.0];
        let cracks = CrackList::from(vec![Crack::new(1, 1.0, 300.0)]);
        let err = Fischer::default().run(&x, &strain, &cracks).unwrap_err();
        assert_eq!(err, CrackError::missing_field("x_l"));
    }

    #[test]
    fn test_compensator_selection_json() {
        let json = r#"{"method": "berrocal", "reinforcement_ratio": 0.02, "modulus_ratio": 6.0}"#;
        let comp: TensionStiffeningCompensator = serde_json::from_str(json).unwrap();
        assert_eq!(comp, Berrocal::new(6.0, 0.02).into());
        assert_eq!(comp.name(), "berrocal");

        let comp: TensionStiffeningCompensator = serde_json::from_str(r#"{"method": "fischer"}"#).unwrap();
        assert_eq!(comp, TensionStiffeningCompensator::Fischer(Fischer::new(100.0)));

        assert!(serde_json::from_str::<TensionStiffeningCompensator>(r#"{"method": "linear"}"#).is_err());
    }

    #[test]
    fn test_validate() {
        assert!(TensionStiffeningCompensator::default().validate().is_ok());
        let bad = TensionStiffeningCompensator::from(Berrocal::new(f64::NAN, 0.02));
        assert!(bad.validate().is_err());
    }
}
