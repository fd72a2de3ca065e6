//! # Crack Monitoring
//!
//! Crack identification and crack width estimation on distributed strain
//! measurements.
//!
//! ## Modules
//!
//! - [`cracks`] - The [`Crack`] record and the queryable [`CrackList`]
//! - [`finding`] - Peak based crack detection
//! - [`separation`] - Transfer length assignment
//! - [`strain_profile`] - The workflow tying everything together

pub mod cracks;
pub mod finding;
pub mod separation;
pub mod strain_profile;

pub use cracks::{AttributeValue, Crack, CrackList};
pub use finding::CrackFinder;
pub use separation::{CrackLengths, LengthRule, ResetScope};
pub use strain_profile::{CrackEntry, ProfileMetadata, ProfileState, StrainProfile};
