//! # Numeric Building Blocks
//!
//! Pure functions on sampled signals used by the crack monitoring workflow.
//! Keeping them in one place makes them easy to verify in isolation.
//!
//! ## Modules
//!
//! - [`integration`] - Trapezoidal integration and the [`Integrator`]
//! - [`peaks`] - Local maxima with height/prominence filtering and bases
//! - [`interpolation`] - Nearest-sample snapping and linear interpolation
//! - [`cropping`] - Position windows on aligned arrays
//!
//! ## Conventions
//!
//! - Position arrays (`x`) are strictly ascending
//! - Value arrays are index-aligned with their position array
//! - Strain in µm/m and positions in m give crack widths in µm

pub mod cropping;
pub mod integration;
pub mod interpolation;
pub mod peaks;

// Re-export commonly used items
pub use cropping::{crop_range, Crop};
pub use integration::{cumulative_trapezoid, trapezoid, IntegrationMethod, Integrator};
pub use interpolation::{find_closest_value, interp, interp_at};
pub use peaks::{find_minima, find_peaks, local_maxima, Peak, PeakCriteria};
