//! # crack_core - Crack Width Estimation Engine
//!
//! `crack_core` estimates crack widths in reinforced concrete members from
//! distributed strain measurements, e.g. from fibre optic sensors. It turns a
//! strain-over-position signal into a list of discrete cracks, each with a
//! location, a transfer length, a peak strain and an opening width.
//!
//! ## Design Philosophy
//!
//! - **Deterministic**: Single-threaded, no I/O, same input gives same output
//! - **JSON-First**: Settings, cracks and errors implement Serialize/Deserialize
//! - **Rich Errors**: Structured error types, not just strings
//! - **Pluggable**: Detection, transfer length rules and compensators are
//!   configurable strategies
//!
//! ## Quick Start
//!
//! ```rust
//! use crack_core::StrainProfile;
//!
//! let x: Vec<f64> = (0..=10).map(|i| i as f64 * 0.1).collect();
//! let strain = vec![0.0, 20.0, 60.0, 400.0, 80.0, 30.0, 90.0, 350.0, 70.0, 20.0, 0.0];
//!
//! let mut profile = StrainProfile::concrete(x, strain, None).unwrap();
//! let cracks = profile.calculate_crack_widths(true).unwrap();
//!
//! assert_eq!(cracks.len(), 2);
//! for crack in cracks {
//!     println!("crack at {:?}: w = {:?}", crack.location, crack.width);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`crackmonitoring`] - Cracks, detection, transfer lengths and the strain profile
//! - [`compensation`] - Shrinkage and tension stiffening compensation
//! - [`equations`] - Integration, peak search, interpolation and cropping
//! - [`settings`] - Serializable analysis settings
//! - [`errors`] - Structured error types
//!
//! ## Units
//!
//! No units are enforced. With positions in m and strain in µm/m, crack
//! widths come out in µm.

pub mod compensation;
pub mod crackmonitoring;
pub mod equations;
pub mod errors;
pub mod settings;

// Re-export commonly used types at crate root for convenience
pub use compensation::{ShrinkCompensator, TensionStiffening, TensionStiffeningCompensator};
pub use crackmonitoring::{Crack, CrackFinder, CrackLengths, CrackList, StrainProfile};
pub use errors::{CrackError, CrackResult};
pub use settings::AnalysisSettings;
