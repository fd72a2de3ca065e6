//! # Error Types
//!
//! Structured error types for crack_core. Each variant names the kind of
//! failure (bad input data, bad configuration, unmet precondition, failed
//! compensation) so callers can react programmatically instead of parsing
//! messages.
//!
//! ## Example
//!
//! ```rust
//! use crack_core::errors::{CrackError, CrackResult};
//!
//! fn validate_radius(radius: f64) -> CrackResult<()> {
//!     if radius <= 0.0 {
//!         return Err(CrackError::invalid_input(
//!             "radius",
//!             radius.to_string(),
//!             "Radius must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_radius(-0.1).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for crack_core operations
pub type CrackResult<T> = Result<T, CrackError>;

/// Structured error type for crack analysis operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CrackError {
    /// Input data is invalid (mismatched lengths, unordered positions, NaN, ...)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Unknown strategy name or malformed option
    #[error("Configuration error for '{option}': {value} - {reason}")]
    Configuration {
        option: String,
        value: String,
        reason: String,
    },

    /// The data state does not allow the operation (e.g. too few cracks)
    #[error("Precondition failed: {operation} - {reason}")]
    PreconditionFailed { operation: String, reason: String },

    /// A numeric step could not produce a result
    #[error("Calculation failed: {calculation_type} - {reason}")]
    CalculationFailed {
        calculation_type: String,
        reason: String,
    },

    /// A compensator failed while the strain profile was computing corrections
    #[error("Compensation failed: {compensator} - {cause}")]
    CompensationFailed {
        compensator: String,
        #[source]
        cause: Box<CrackError>,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },
}

impl CrackError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CrackError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CrackError::MissingField {
            field: field.into(),
        }
    }

    /// Create a Configuration error
    pub fn configuration(option: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CrackError::Configuration {
            option: option.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a PreconditionFailed error
    pub fn precondition(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        CrackError::PreconditionFailed {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create a CalculationFailed error
    pub fn calculation_failed(calculation_type: impl Into<String>, reason: impl Into<String>) -> Self {
        CrackError::CalculationFailed {
            calculation_type: calculation_type.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a compensator failure
    pub fn compensation_failed(compensator: impl Into<String>, cause: CrackError) -> Self {
        CrackError::CompensationFailed {
            compensator: compensator.into(),
            cause: Box::new(cause),
        }
    }

    /// The wrapped cause of a `CompensationFailed` error.
    pub fn cause(&self) -> Option<&CrackError> {
        match self {
            CrackError::CompensationFailed { cause, .. } => Some(cause),
            _ => None,
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CrackError::InvalidInput { .. } => "INVALID_INPUT",
            CrackError::MissingField { .. } => "MISSING_FIELD",
            CrackError::Configuration { .. } => "CONFIGURATION_ERROR",
            CrackError::PreconditionFailed { .. } => "PRECONDITION_FAILED",
            CrackError::CalculationFailed { .. } => "CALCULATION_FAILED",
            CrackError::CompensationFailed { .. } => "COMPENSATION_FAILED",
            CrackError::SerializationError { .. } => "SERIALIZATION_ERROR",
        }
    }
}

impl From<serde_json::Error> for CrackError {
    fn from(err: serde_json::Error) -> Self {
        CrackError::SerializationError {
            reason: err.to_string(),
        }
    }
}
