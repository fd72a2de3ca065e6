//! # Transfer Length Assignment
//!
//! Each crack influences the strain over a segment `[x_l, x_r]` around its
//! location, the transfer length. [`CrackLengths`] narrows these segments by
//! applying a sequence of [`LengthRule`]s.
//!
//! ## Procedure
//!
//! 1. Sort the cracks by location, unset boundaries become `-inf`/`+inf`
//! 2. Reset boundaries according to [`ResetScope`]
//! 3. Apply every rule in order. A rule only ever tightens a boundary:
//!    left boundaries combine with `max`, right boundaries with `min`
//!
//! ## Rules
//!
//! | Rule | Boundary |
//! |------|----------|
//! | `min` | Sample of least strain strictly between two neighbouring peaks |
//! | `middle` | Midpoint between two neighbouring cracks |
//! | `threshold` | First sample on each side with strain at or below the value |
//! | `length` | `location ± value` |
//!
//! ## Example
//!
//! ```rust
//! use crack_core::crackmonitoring::cracks::{Crack, CrackList};
//! use crack_core::crackmonitoring::separation::{CrackLengths, LengthRule, ResetScope};
//!
//! let x = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
//! let strain = [0.0, 400.0, 100.0, 50.0, 120.0, 400.0, 0.0];
//! let mut cracks = CrackList::from(vec![Crack::new(1, 1.0, 400.0), Crack::new(5, 5.0, 400.0)]);
//!
//! let splitter = CrackLengths::new(ResetScope::All, vec![LengthRule::Min, LengthRule::Length(1.5)]);
//! splitter.run(&x, &strain, &mut cracks).unwrap();
//!
//! assert_eq!(cracks[0].segment(), Some((-0.5, 2.5)));
//! assert_eq!(cracks[1].segment(), Some((3.5, 6.5)));
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crackmonitoring::cracks::CrackList;
use crate::equations::interpolation::find_closest_value;
use crate::errors::{CrackError, CrackResult};

/// Which boundaries are discarded before the rules run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetScope {
    /// Reset all boundaries except the outer boundaries of the outermost cracks
    #[default]
    Inner,
    /// Reset every boundary
    All,
    /// Keep the boundaries as they are
    No,
}

impl ResetScope {
    /// Scope by its configuration name.
    pub fn from_name(name: &str) -> CrackResult<Self> {
        match name {
            "inner" => Ok(ResetScope::Inner),
            "all" => Ok(ResetScope::All),
            "no" => Ok(ResetScope::No),
            other => Err(CrackError::configuration(
                "reset",
                other,
                "Expected one of: inner, all, no",
            )),
        }
    }
}

/// A single boundary restriction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "value", rename_all = "lowercase")]
pub enum LengthRule {
    /// Boundary at the strain minimum between two neighbouring peaks
    Min,
    /// Boundary halfway between two neighbouring cracks
    Middle,
    /// Boundary at the first sample with strain at or below the value
    Threshold(f64),
    /// Boundary at most this far from the crack
    Length(f64),
}

impl LengthRule {
    /// Rule by its configuration name.
    ///
    /// `threshold` and `length` need a value, the others ignore it.
    pub fn from_name(name: &str, value: Option<f64>) -> CrackResult<Self> {
        let required = |value: Option<f64>| {
            value.ok_or_else(|| CrackError::configuration(name, "None", "Rule requires a value"))
        };
        let rule = match name {
            "min" => LengthRule::Min,
            "middle" => LengthRule::Middle,
            "threshold" => LengthRule::Threshold(required(value)?),
            "length" => LengthRule::Length(required(value)?),
            other => {
                return Err(CrackError::configuration(
                    "rule",
                    other,
                    "Expected one of: min, middle, threshold, length",
                ));
            }
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Configuration name of the rule.
    pub fn name(&self) -> &'static str {
        match self {
            LengthRule::Min => "min",
            LengthRule::Middle => "middle",
            LengthRule::Threshold(_) => "threshold",
            LengthRule::Length(_) => "length",
        }
    }

    /// Check the rule value is usable.
    pub fn validate(&self) -> CrackResult<()> {
        match *self {
            LengthRule::Threshold(v) if v.is_nan() => {
                Err(CrackError::configuration("threshold", "NaN", "Value must be a number"))
            }
            LengthRule::Length(v) if v.is_nan() || v < 0.0 => Err(CrackError::configuration(
                "length",
                v.to_string(),
                "Radius must be a non-negative number",
            )),
            _ => Ok(()),
        }
    }
}

/// Assigns transfer lengths to cracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrackLengths {
    /// Boundaries discarded before the rules run
    pub reset: ResetScope,
    /// Rules, applied in order
    pub rules: Vec<LengthRule>,
}

impl Default for CrackLengths {
    fn default() -> Self {
        CrackLengths {
            reset: ResetScope::Inner,
            rules: vec![LengthRule::Min, LengthRule::Length(0.2)],
        }
    }
}

impl CrackLengths {
    pub fn new(reset: ResetScope, rules: Vec<LengthRule>) -> Self {
        CrackLengths { reset, rules }
    }

    /// Check every rule.
    pub fn validate(&self) -> CrackResult<()> {
        self.rules.iter().try_for_each(LengthRule::validate)
    }

    /// Assign transfer lengths to all cracks in place.
    ///
    /// The list is sorted by location afterwards. Every crack needs a location.
    pub fn run<'a>(&self, x: &[f64], strain: &[f64], cracks: &'a mut CrackList) -> CrackResult<&'a mut CrackList> {
        self.validate()?;
        prepare(x, strain, cracks)?;
        reset_boundaries(self.reset, cracks);
        let peaks = peak_indices(x, cracks)?;
        for rule in &self.rules {
            apply(*rule, x, strain, &peaks, cracks);
        }
        Ok(cracks)
    }
}

/// Apply a single rule to all cracks, without any reset.
///
/// Sorts the list and opens unset boundaries like [`CrackLengths::run`].
pub fn apply_rule(rule: LengthRule, x: &[f64], strain: &[f64], cracks: &mut CrackList) -> CrackResult<()> {
    rule.validate()?;
    prepare(x, strain, cracks)?;
    let peaks = peak_indices(x, cracks)?;
    apply(rule, x, strain, &peaks, cracks);
    Ok(())
}

fn prepare(x: &[f64], strain: &[f64], cracks: &mut CrackList) -> CrackResult<()> {
    if x.len() != strain.len() {
        return Err(CrackError::invalid_input(
            "strain",
            format!("{} values", strain.len()),
            format!("Length does not match x ({} values)", x.len()),
        ));
    }
    if cracks.iter().any(|c| c.location.is_none()) {
        return Err(CrackError::missing_field("location"));
    }
    cracks.sort();
    for crack in cracks.iter_mut() {
        crack.x_l = Some(crack.x_l.unwrap_or(f64::NEG_INFINITY));
        crack.x_r = Some(crack.x_r.unwrap_or(f64::INFINITY));
    }
    Ok(())
}

fn reset_boundaries(scope: ResetScope, cracks: &mut CrackList) {
    let last = cracks.len().saturating_sub(1);
    for (i, crack) in cracks.iter_mut().enumerate() {
        match scope {
            ResetScope::No => {}
            ResetScope::All => {
                crack.x_l = Some(f64::NEG_INFINITY);
                crack.x_r = Some(f64::INFINITY);
            }
            ResetScope::Inner => {
                if i > 0 {
                    crack.x_l = Some(f64::NEG_INFINITY);
                }
                if i < last {
                    crack.x_r = Some(f64::INFINITY);
                }
            }
        }
    }
}

/// Sample index of every crack's peak, snapped from the location if unset.
fn peak_indices(x: &[f64], cracks: &CrackList) -> CrackResult<Vec<usize>> {
    cracks
        .iter()
        .map(|crack| match (crack.index, crack.location) {
            (Some(i), _) if i < x.len() => Ok(i),
            (Some(i), _) => Err(CrackError::invalid_input(
                "index",
                i.to_string(),
                format!("Index out of range for {} samples", x.len()),
            )),
            (None, Some(location)) => find_closest_value(x, location)
                .map(|(i, _)| i)
                .ok_or_else(|| CrackError::invalid_input("x", "empty", "No samples to locate the crack")),
            (None, None) => Err(CrackError::missing_field("location")),
        })
        .collect()
}

fn tighten_left(current: Option<f64>, candidate: f64) -> Option<f64> {
    Some(current.map_or(candidate, |c| c.max(candidate)))
}

fn tighten_right(current: Option<f64>, candidate: f64) -> Option<f64> {
    Some(current.map_or(candidate, |c| c.min(candidate)))
}

/// Index of the least strain strictly between two peaks, first one on ties.
fn valley_index(strain: &[f64], left_peak: usize, right_peak: usize) -> usize {
    let mut best = left_peak;
    let mut best_value = f64::INFINITY;
    for (i, &value) in strain.iter().enumerate().take(right_peak).skip(left_peak + 1) {
        if value < best_value {
            best = i;
            best_value = value;
        }
    }
    best
}

fn apply(rule: LengthRule, x: &[f64], strain: &[f64], peaks: &[usize], cracks: &mut CrackList) {
    let list = cracks.as_mut_slice();
    match rule {
        LengthRule::Min => {
            for i in 1..list.len() {
                let boundary = x[valley_index(strain, peaks[i - 1], peaks[i])];
                list[i - 1].x_r = tighten_right(list[i - 1].x_r, boundary);
                list[i].x_l = tighten_left(list[i].x_l, boundary);
            }
        }
        LengthRule::Middle => {
            for i in 1..list.len() {
                if let (Some(left), Some(right)) = (list[i - 1].location, list[i].location) {
                    let boundary = (left + right) / 2.0;
                    list[i - 1].x_r = tighten_right(list[i - 1].x_r, boundary);
                    list[i].x_l = tighten_left(list[i].x_l, boundary);
                }
            }
        }
        LengthRule::Threshold(value) => {
            for (crack, &peak) in list.iter_mut().zip(peaks) {
                if let Some(j) = (0..peak).rev().find(|&j| strain[j] <= value) {
                    crack.x_l = tighten_left(crack.x_l, x[j]);
                }
                if let Some(j) = (peak + 1..strain.len()).find(|&j| strain[j] <= value) {
                    crack.x_r = tighten_right(crack.x_r, x[j]);
                }
            }
        }
        LengthRule::Length(radius) => {
            for crack in list.iter_mut() {
                if let Some(location) = crack.location {
                    crack.x_l = tighten_left(crack.x_l, location - radius);
                    crack.x_r = tighten_right(crack.x_r, location + radius);
                }
            }
        }
    }
    debug!(rule = rule.name(), cracks = list.len(), "transfer length rule applied");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crackmonitoring::cracks::Crack;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn two_triangles() -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (0..=10).map(|i| i as f64).collect();
        let strain = vec![
            0.0, 500.0 / 3.0, 1000.0 / 3.0, 500.0, 275.0, 50.0, 275.0, 500.0, 1000.0 / 3.0, 500.0 / 3.0, 0.0,
        ];
        (x, strain)
    }

    fn detected() -> CrackList {
        CrackList::from(vec![
            Crack::new(3, 3.0, 500.0).with_segment(0.0, 10.0),
            Crack::new(7, 7.0, 500.0).with_segment(0.0, 10.0),
        ])
    }

    #[test]
    fn test_min_rule_splits_at_valley() {
        let (x, strain) = two_triangles();
        let mut cracks = detected();
        CrackLengths::new(ResetScope::Inner, vec![LengthRule::Min])
            .run(&x, &strain, &mut cracks)
            .unwrap();
        assert_eq!(cracks[0].segment(), Some((0.0, 5.0)));
        assert_eq!(cracks[1].segment(), Some((5.0, 10.0)));
    }

    #[test]
    fn test_default_rules() {
        let (x, strain) = two_triangles();
        let mut cracks = detected();
        CrackLengths::default().run(&x, &strain, &mut cracks).unwrap();
        assert!(approx_eq(cracks[0].x_l.unwrap(), 2.8));
        assert!(approx_eq(cracks[0].x_r.unwrap(), 3.2));
        assert!(approx_eq(cracks[1].x_l.unwrap(), 6.8));
        assert!(approx_eq(cracks[1].x_r.unwrap(), 7.2));
    }

    #[test]
    fn test_reset_scopes() {
        let (x, strain) = two_triangles();

        let mut cracks = detected();
        CrackLengths::new(ResetScope::Inner, vec![]).run(&x, &strain, &mut cracks).unwrap();
        assert_eq!(cracks[0].segment(), Some((0.0, f64::INFINITY)));
        assert_eq!(cracks[1].segment(), Some((f64::NEG_INFINITY, 10.0)));

        let mut cracks = detected();
        CrackLengths::new(ResetScope::All, vec![]).run(&x, &strain, &mut cracks).unwrap();
        assert_eq!(cracks[0].segment(), Some((f64::NEG_INFINITY, f64::INFINITY)));

        let mut cracks = detected();
        CrackLengths::new(ResetScope::No, vec![]).run(&x, &strain, &mut cracks).unwrap();
        assert_eq!(cracks, detected());
    }

    #[test]
    fn test_unset_boundaries_become_infinite() {
        let (x, strain) = two_triangles();
        let mut cracks = CrackList::from(vec![Crack::new(3, 3.0, 500.0)]);
        CrackLengths::new(ResetScope::No, vec![]).run(&x, &strain, &mut cracks).unwrap();
        assert_eq!(cracks[0].segment(), Some((f64::NEG_INFINITY, f64::INFINITY)));
    }

    #[test]
    fn test_middle_rule() {
        let (x, strain) = two_triangles();
        let mut cracks = detected();
        CrackLengths::new(ResetScope::All, vec![LengthRule::Middle])
            .run(&x, &strain, &mut cracks)
            .unwrap();
        assert_eq!(cracks[0].x_r, Some(5.0));
        assert_eq!(cracks[1].x_l, Some(5.0));
        assert_eq!(cracks[0].x_l, Some(f64::NEG_INFINITY));
    }

    #[test]
    fn test_threshold_rule() {
        let (x, strain) = two_triangles();
        let mut cracks = detected();
        CrackLengths::new(ResetScope::All, vec![LengthRule::Threshold(200.0)])
            .run(&x, &strain, &mut cracks)
            .unwrap();
        assert_eq!(cracks[0].segment(), Some((1.0, 5.0)));
        assert_eq!(cracks[1].segment(), Some((5.0, 9.0)));
    }

    #[test]
    fn test_threshold_without_match_keeps_boundary() {
        let x = [0.0, 1.0, 2.0];
        let strain = [300.0, 500.0, 300.0];
        let mut cracks = CrackList::from(vec![Crack::new(1, 1.0, 500.0).with_segment(0.0, 2.0)]);
        apply_rule(LengthRule::Threshold(100.0), &x, &strain, &mut cracks).unwrap();
        assert_eq!(cracks[0].segment(), Some((0.0, 2.0)));
    }

    #[test]
    fn test_rules_only_tighten() {
        let (x, strain) = two_triangles();
        let mut cracks = detected();
        apply_rule(LengthRule::Length(1.0), &x, &strain, &mut cracks).unwrap();
        apply_rule(LengthRule::Min, &x, &strain, &mut cracks).unwrap();
        apply_rule(LengthRule::Length(4.0), &x, &strain, &mut cracks).unwrap();
        assert_eq!(cracks[0].segment(), Some((2.0, 4.0)));
        assert_eq!(cracks[1].segment(), Some((6.0, 8.0)));
    }

    #[test]
    fn test_adjacent_peaks_fall_back_to_left_peak() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let strain = [0.0, 400.0, 300.0, 0.0];
        let mut cracks = CrackList::from(vec![Crack::new(1, 1.0, 400.0), Crack::new(2, 2.0, 300.0)]);
        apply_rule(LengthRule::Min, &x, &strain, &mut cracks).unwrap();
        assert_eq!(cracks[0].x_r, Some(1.0));
        assert_eq!(cracks[1].x_l, Some(1.0));
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let (x, strain) = two_triangles();
        let mut cracks = detected();
        cracks.as_mut_slice().reverse();
        let sorted = CrackLengths::default().run(&x, &strain, &mut cracks).unwrap();
        assert_eq!(sorted.indices(), vec![Some(3), Some(7)]);
        assert!(sorted.is_sorted());
        assert_eq!(cracks.indices(), vec![Some(3), Some(7)]);
    }

    #[test]
    fn test_missing_index_is_snapped() {
        let (x, strain) = two_triangles();
        let mut cracks = CrackList::from(vec![Crack::at(3.2), Crack::at(6.9)]);
        CrackLengths::new(ResetScope::All, vec![LengthRule::Min])
            .run(&x, &strain, &mut cracks)
            .unwrap();
        assert_eq!(cracks[0].x_r, Some(5.0));
    }

    #[test]
    fn test_missing_location_is_rejected() {
        let (x, strain) = two_triangles();
        let mut cracks = CrackList::from(vec![Crack::default()]);
        let err = CrackLengths::default().run(&x, &strain, &mut cracks).unwrap_err();
        assert_eq!(err, CrackError::missing_field("location"));
    }

    #[test]
    fn test_rule_from_name() {
        assert_eq!(LengthRule::from_name("min", None).unwrap(), LengthRule::Min);
        assert_eq!(LengthRule::from_name("length", Some(0.3)).unwrap(), LengthRule::Length(0.3));
        assert_eq!(
            LengthRule::from_name("maximum", None).unwrap_err().error_code(),
            "CONFIGURATION_ERROR"
        );
        assert!(LengthRule::from_name("threshold", None).is_err());
        assert!(LengthRule::from_name("length", Some(-1.0)).is_err());
        assert!(ResetScope::from_name("outer").is_err());
    }

    #[test]
    fn test_config_json() {
        let json = r#"{"reset": "all", "rules": [{"rule": "middle"}, {"rule": "length", "value": 0.5}]}"#;
        let splitter: CrackLengths = serde_json::from_str(json).unwrap();
        assert_eq!(splitter.reset, ResetScope::All);
        assert_eq!(splitter.rules, vec![LengthRule::Middle, LengthRule::Length(0.5)]);

        let unknown = r#"{"rules": [{"rule": "maximum"}]}"#;
        assert!(serde_json::from_str::<CrackLengths>(unknown).is_err());
    }
}
