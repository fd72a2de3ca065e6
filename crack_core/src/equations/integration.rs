//! # Numerical Integration
//!
//! Trapezoidal integration of a discretized function `y = f(x)`.
//!
//! The crack width is the integral of the (compensated) strain over the
//! transfer length of a crack:
//!
//! ```text
//! w = ∫ ε(x) dx  ≈  Σ (y_i + y_{i+1}) · (x_{i+1} − x_i) / 2
//! ```
//!
//! Inputs are assumed to be free of NaN; cleaning them up is the job of the
//! preprocessing that runs before a strain profile is built.
//!
//! ## Example
//!
//! ```rust
//! use crack_core::equations::integration::Integrator;
//!
//! let x = [0.0, 1.0, 2.0, 3.0, 4.0];
//! let strain = [0.0, 50.0, 500.0, 50.0, 0.0];
//!
//! let integrator = Integrator::default();
//! let width = integrator.integrate_segment(&x, &strain, None, None, 0.0).unwrap();
//! assert!((width - 600.0).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CrackError, CrackResult};

/// Definite integral over all given samples using the trapezoidal rule.
///
/// Fewer than two samples integrate to zero. Extra entries of the longer
/// slice are ignored.
#[inline]
pub fn trapezoid(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (ys[0] + ys[1]) * (xs[1] - xs[0]) / 2.0)
        .sum()
}

/// Cumulative trapezoidal integral, same length as the input.
///
/// The first entry equals `initial`, every later entry is the integral from
/// `x[0]` up to that sample plus `initial`.
pub fn cumulative_trapezoid(x: &[f64], y: &[f64], initial: f64) -> Vec<f64> {
    let n = x.len().min(y.len());
    let mut result = Vec::with_capacity(n);
    if n == 0 {
        return result;
    }
    let mut total = initial;
    result.push(total);
    for i in 1..n {
        total += (y[i - 1] + y[i]) * (x[i] - x[i - 1]) / 2.0;
        result.push(total);
    }
    result
}

/// Interpolation scheme assumed between two samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationMethod {
    /// Linear between samples (trapezoidal rule)
    #[default]
    Trapezoidal,
}

/// Integrates strain data to obtain crack widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Integrator {
    /// Interpolation between samples
    pub method: IntegrationMethod,
}

impl Integrator {
    /// Create an integrator using the given method.
    pub fn new(method: IntegrationMethod) -> Self {
        Integrator { method }
    }

    /// Integral over `[start_index, end_index]` (both inclusive) plus `initial`.
    ///
    /// `start_index` defaults to the first sample, `end_index` to the last.
    pub fn integrate_segment(
        &self,
        x: &[f64],
        y: &[f64],
        start_index: Option<usize>,
        end_index: Option<usize>,
        initial: f64,
    ) -> CrackResult<f64> {
        check_lengths(x, y)?;
        if x.is_empty() {
            return Ok(initial);
        }
        let start = start_index.unwrap_or(0);
        let end = end_index.unwrap_or(x.len() - 1);
        if end >= x.len() {
            return Err(CrackError::invalid_input(
                "end_index",
                end.to_string(),
                format!("Index out of range for {} samples", x.len()),
            ));
        }
        if start > end {
            return Err(CrackError::invalid_input(
                "start_index",
                start.to_string(),
                format!("Start index exceeds end index {}", end),
            ));
        }
        let segment = start..end + 1;
        match self.method {
            IntegrationMethod::Trapezoidal => Ok(trapezoid(&x[segment.clone()], &y[segment]) + initial),
        }
    }

    /// Antiderivative `F(x) = ∫ f(x) dx + initial`, one value per sample.
    pub fn antiderivative(&self, x: &[f64], y: &[f64], initial: f64) -> CrackResult<Vec<f64>> {
        check_lengths(x, y)?;
        match self.method {
            IntegrationMethod::Trapezoidal => Ok(cumulative_trapezoid(x, y, initial)),
        }
    }
}

fn check_lengths(x: &[f64], y: &[f64]) -> CrackResult<()> {
    if x.len() != y.len() {
        return Err(CrackError::invalid_input(
            "y",
            format!("{} values", y.len()),
            format!("Length does not match x ({} values)", x.len()),
        ));
    }
    Ok(())
}
