//! # Strain Compensation
//!
//! Not all measured strain opens a crack. Compensators estimate the share
//! caused by other effects and return it as an array aligned with `x`, which
//! the strain profile subtracts before integrating crack widths. Positive
//! values reduce the estimated widths.
//!
//! ## Modules
//!
//! - [`shrinking`] - Shrinkage and creep, a uniform offset
//! - [`tension_stiffening`] - Concrete carrying tension between cracks

pub mod shrinking;
pub mod tension_stiffening;

pub use shrinking::{ShrinkCompensator, ShrinkMethod};
pub use tension_stiffening::{Berrocal, Fischer, TensionStiffening, TensionStiffeningCompensator};

use crate::errors::{CrackError, CrackResult};

/// Fails unless `values` has one entry per sample of `x`.
pub(crate) fn check_aligned(x: &[f64], values: &[f64], field: &str) -> CrackResult<()> {
    if x.len() != values.len() {
        return Err(CrackError::invalid_input(
            field,
            format!("{} values", values.len()),
            format!("Length does not match x ({} values)", x.len()),
        ));
    }
    Ok(())
}
