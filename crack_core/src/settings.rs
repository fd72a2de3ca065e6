//! # Analysis Settings
//!
//! All strategy configurations of a strain profile in one serializable
//! object. Every field has a default, so a JSON document only needs to name
//! what differs.
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "crack_finder": { "height": 150.0, "prominence": 100.0 },
//!   "length_splitter": {
//!     "reset": "inner",
//!     "rules": [{ "rule": "min" }, { "rule": "length", "value": 0.2 }]
//!   },
//!   "shrink_compensator": { "method": "mean_min" },
//!   "ts_compensator": { "method": "fischer", "max_concrete_strain": 100.0 },
//!   "integrator": { "method": "trapezoidal" },
//!   "crop": { "start_pos": 0.5, "end_pos": 4.5 },
//!   "suppress_compression": true
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::error::Category;

use crate::compensation::shrinking::ShrinkCompensator;
use crate::compensation::tension_stiffening::{Berrocal, Fischer, TensionStiffeningCompensator};
use crate::crackmonitoring::finding::CrackFinder;
use crate::crackmonitoring::separation::CrackLengths;
use crate::equations::cropping::Crop;
use crate::equations::integration::Integrator;
use crate::errors::{CrackError, CrackResult};

/// Configuration of every step of the crack width workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Crack detection
    pub crack_finder: CrackFinder,

    /// Transfer length assignment
    pub length_splitter: CrackLengths,

    /// Shrink and creep compensation, skipped if not set
    pub shrink_compensator: Option<ShrinkCompensator>,

    /// Tension stiffening compensation, skipped if not set
    pub ts_compensator: Option<TensionStiffeningCompensator>,

    /// Crack width integration
    pub integrator: Integrator,

    /// Measurement area
    pub crop: Crop,

    /// Clip negative compensated strain to zero before integrating
    pub suppress_compression: bool,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        AnalysisSettings {
            crack_finder: CrackFinder::default(),
            length_splitter: CrackLengths::default(),
            shrink_compensator: None,
            ts_compensator: None,
            integrator: Integrator::default(),
            crop: Crop::default(),
            suppress_compression: true,
        }
    }
}

impl AnalysisSettings {
    /// Settings for sensors embedded in the concrete.
    pub fn concrete() -> Self {
        AnalysisSettings {
            ts_compensator: Some(Fischer::default().into()),
            ..Default::default()
        }
    }

    /// Settings for sensors attached to the reinforcement.
    pub fn rebar(modulus_ratio: f64, reinforcement_ratio: f64) -> Self {
        AnalysisSettings {
            ts_compensator: Some(Berrocal::new(modulus_ratio, reinforcement_ratio).into()),
            ..Default::default()
        }
    }

    /// Check every part of the configuration.
    pub fn validate(&self) -> CrackResult<()> {
        self.length_splitter.validate()?;
        self.crop.validate()?;
        if let Some(ts) = &self.ts_compensator {
            ts.validate()?;
        }
        Ok(())
    }

    /// Parse and validate settings from JSON.
    ///
    /// Malformed JSON is a serialization error. Well-formed JSON naming an
    /// unknown strategy or carrying a wrongly typed option is a
    /// configuration error.
    ///
    /// ```rust
    /// use crack_core::settings::AnalysisSettings;
    ///
    /// let settings = AnalysisSettings::from_json(r#"{"suppress_compression": false}"#).unwrap();
    /// assert!(!settings.suppress_compression);
    ///
    /// let err = AnalysisSettings::from_json(r#"{"ts_compensator": {"method": "linear"}}"#).unwrap_err();
    /// assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    /// ```
    pub fn from_json(json: &str) -> CrackResult<Self> {
        let settings: AnalysisSettings = serde_json::from_str(json).map_err(|e| match e.classify() {
            Category::Data => CrackError::configuration("settings", "json", e.to_string()),
            _ => CrackError::from(e),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> CrackResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crackmonitoring::separation::{LengthRule, ResetScope};

    #[test]
    fn test_defaults() {
        let settings = AnalysisSettings::default();
        assert!(settings.suppress_compression);
        assert!(settings.shrink_compensator.is_none());
        assert!(settings.ts_compensator.is_none());
        assert_eq!(settings.crack_finder.height, Some(100.0));
        assert_eq!(settings.length_splitter.reset, ResetScope::Inner);
        assert!(settings.crop.is_noop());
    }

    #[test]
    fn test_presets() {
        assert_eq!(
            AnalysisSettings::concrete().ts_compensator,
            Some(TensionStiffeningCompensator::Fischer(Fischer::new(100.0)))
        );
        assert_eq!(
            AnalysisSettings::rebar(6.0, 0.015).ts_compensator,
            Some(TensionStiffeningCompensator::Berrocal(Berrocal::new(6.0, 0.015)))
        );
    }

    #[test]
    fn test_json_roundtrip() {
        let mut settings = AnalysisSettings::rebar(6.0, 0.015);
        settings.length_splitter.rules = vec![LengthRule::Middle, LengthRule::Threshold(50.0)];
        settings.crop = Crop::between(1.0, 9.0);
        let json = settings.to_json().unwrap();
        let roundtrip = AnalysisSettings::from_json(&json).unwrap();
        assert_eq!(roundtrip, settings);
    }

    #[test]
    fn test_error_classification() {
        let syntax = AnalysisSettings::from_json("{ not json").unwrap_err();
        assert_eq!(syntax.error_code(), "SERIALIZATION_ERROR");

        let unknown_rule = r#"{"length_splitter": {"rules": [{"rule": "widest"}]}}"#;
        assert_eq!(
            AnalysisSettings::from_json(unknown_rule).unwrap_err().error_code(),
            "CONFIGURATION_ERROR"
        );

        let negative = r#"{"length_splitter": {"rules": [{"rule": "length", "value": -1.0}]}}"#;
        assert_eq!(
            AnalysisSettings::from_json(negative).unwrap_err().error_code(),
            "CONFIGURATION_ERROR"
        );
    }
}
