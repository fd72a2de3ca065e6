//! # Strain Profile
//!
//! The [`StrainProfile`] owns one distributed strain measurement and runs the
//! crack width workflow on it:
//!
//! ```text
//!   Empty ──find_cracks──▶ Found ──set_leff──▶ LengthsAssigned
//!                                                    │
//!                                          compensate_shrink
//!                                     calculate_tension_stiffening
//!                                                    ▼
//!                        WidthsComputed ◀──────── Compensated
//! ```
//!
//! Every step runs the earlier ones it depends on if they have not run yet.
//! [`StrainProfile::clean_data`] returns to `Empty`. Manual edits with
//! [`StrainProfile::add_cracks`] and [`StrainProfile::delete_cracks`] return
//! to `Found` and by default rerun the remaining steps for the whole list,
//! since transfer lengths depend on the neighbouring cracks.
//!
//! ## Example
//!
//! ```rust
//! use crack_core::crackmonitoring::strain_profile::StrainProfile;
//!
//! let x = vec![0.0, 0.1, 0.2, 0.3, 0.4];
//! let strain = vec![0.0, 50.0, 500.0, 50.0, 0.0];
//!
//! let mut profile = StrainProfile::new(x, strain).unwrap().named("beam 1, load step 3");
//! let cracks = profile.calculate_crack_widths(true).unwrap();
//!
//! assert_eq!(cracks.len(), 1);
//! assert_eq!(cracks[0].location, Some(0.2));
//! assert!((cracks[0].width.unwrap() - 60.0).abs() < 1e-9);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::compensation::tension_stiffening::TensionStiffening;
use crate::crackmonitoring::cracks::{Crack, CrackList};
use crate::equations::cropping::crop_range;
use crate::equations::interpolation::find_closest_value;
use crate::errors::{CrackError, CrackResult};
use crate::settings::AnalysisSettings;

/// Progress of the crack width workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileState {
    /// No cracks known
    #[default]
    Empty,
    /// Cracks detected or edited, transfer lengths outdated
    Found,
    /// Transfer lengths assigned
    LengthsAssigned,
    /// Compensated strain computed
    Compensated,
    /// Crack widths computed
    WidthsComputed,
}

/// Identification and bookkeeping of a strain profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileMetadata {
    /// Unique identifier
    pub id: Uuid,

    /// Name of the measurement (e.g., sensor, load step)
    pub name: String,

    /// When the profile was created
    pub created: DateTime<Utc>,

    /// When the profile was last modified
    pub modified: DateTime<Utc>,
}

impl ProfileMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        ProfileMetadata {
            id: Uuid::new_v4(),
            name: name.into(),
            created: now,
            modified: now,
        }
    }

    /// Update the modification timestamp.
    pub fn touch(&mut self) {
        self.modified = Utc::now();
    }
}

/// Entry accepted by [`StrainProfile::add_cracks`].
#[derive(Debug, Clone, PartialEq)]
pub enum CrackEntry {
    /// Approximate crack position
    Position(f64),
    /// Crack to copy, e.g. from another profile
    Crack(Crack),
}

impl From<f64> for CrackEntry {
    fn from(position: f64) -> Self {
        CrackEntry::Position(position)
    }
}

impl From<Crack> for CrackEntry {
    fn from(crack: Crack) -> Self {
        CrackEntry::Crack(crack)
    }
}

impl From<&Crack> for CrackEntry {
    fn from(crack: &Crack) -> Self {
        CrackEntry::Crack(crack.clone())
    }
}

/// A distributed strain measurement and the cracks derived from it.
#[derive(Debug, Clone, Serialize)]
pub struct StrainProfile {
    meta: ProfileMetadata,
    settings: AnalysisSettings,

    x_raw: Vec<f64>,
    strain_raw: Vec<f64>,
    strain_inst_raw: Option<Vec<f64>>,

    x: Vec<f64>,
    strain: Vec<f64>,
    strain_inst: Option<Vec<f64>>,

    crack_list: CrackList,
    shrink_calibration_values: Option<Vec<f64>>,
    tension_stiffening_values: Option<Vec<f64>>,
    strain_compensated: Option<Vec<f64>>,
    state: ProfileState,
}

fn check_finite(values: &[f64], field: &str) -> CrackResult<()> {
    if let Some(i) = values.iter().position(|v| !v.is_finite()) {
        return Err(CrackError::invalid_input(
            field,
            values[i].to_string(),
            format!("Value at sample {} is not finite", i),
        ));
    }
    Ok(())
}

fn check_length(x: &[f64], values: &[f64], field: &str) -> CrackResult<()> {
    if x.len() != values.len() {
        return Err(CrackError::invalid_input(
            field,
            format!("{} values", values.len()),
            format!("Length does not match x ({} values)", x.len()),
        ));
    }
    Ok(())
}

/// Derived data of a profile, kept while a manual edit is recalculated.
struct Snapshot {
    crack_list: CrackList,
    shrink_calibration_values: Option<Vec<f64>>,
    tension_stiffening_values: Option<Vec<f64>>,
    strain_compensated: Option<Vec<f64>>,
    state: ProfileState,
}

/// Compensator output must be aligned with `x` and finite.
fn check_correction(values: &[f64], samples: usize) -> CrackResult<()> {
    if values.len() != samples {
        return Err(CrackError::calculation_failed(
            "compensation",
            format!("Returned {} values for {} samples", values.len(), samples),
        ));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(CrackError::calculation_failed(
            "compensation",
            "Returned non-finite values",
        ));
    }
    Ok(())
}

impl StrainProfile {
    /// Profile with default settings and without `strain_inst`.
    pub fn new(x: Vec<f64>, strain: Vec<f64>) -> CrackResult<Self> {
        Self::with_settings(x, strain, None, AnalysisSettings::default())
    }

    /// Profile for a sensor embedded in the concrete.
    pub fn concrete(x: Vec<f64>, strain: Vec<f64>, strain_inst: Option<Vec<f64>>) -> CrackResult<Self> {
        Self::with_settings(x, strain, strain_inst, AnalysisSettings::concrete())
    }

    /// Profile for a sensor attached to the reinforcement.
    pub fn rebar(
        x: Vec<f64>,
        strain: Vec<f64>,
        strain_inst: Option<Vec<f64>>,
        modulus_ratio: f64,
        reinforcement_ratio: f64,
    ) -> CrackResult<Self> {
        Self::with_settings(
            x,
            strain,
            strain_inst,
            AnalysisSettings::rebar(modulus_ratio, reinforcement_ratio),
        )
    }

    /// Profile with explicit settings.
    ///
    /// `x` must be finite and strictly ascending, `strain` and `strain_inst`
    /// finite and of the same length as `x`.
    pub fn with_settings(
        x: Vec<f64>,
        strain: Vec<f64>,
        strain_inst: Option<Vec<f64>>,
        settings: AnalysisSettings,
    ) -> CrackResult<Self> {
        check_length(&x, &strain, "strain")?;
        check_finite(&x, "x")?;
        check_finite(&strain, "strain")?;
        if let Some(inst) = &strain_inst {
            check_length(&x, inst, "strain_inst")?;
            check_finite(inst, "strain_inst")?;
        }
        if let Some(i) = x.windows(2).position(|w| w[1] <= w[0]) {
            return Err(CrackError::invalid_input(
                "x",
                x[i + 1].to_string(),
                format!("Positions must be strictly ascending (sample {})", i + 1),
            ));
        }
        settings.validate()?;

        let mut profile = StrainProfile {
            meta: ProfileMetadata::new(""),
            settings,
            x_raw: x,
            strain_raw: strain,
            strain_inst_raw: strain_inst,
            x: Vec::new(),
            strain: Vec::new(),
            strain_inst: None,
            crack_list: CrackList::new(),
            shrink_calibration_values: None,
            tension_stiffening_values: None,
            strain_compensated: None,
            state: ProfileState::Empty,
        };
        profile.clean_data();
        debug!(
            id = %profile.meta.id,
            samples = profile.x.len(),
            raw_samples = profile.x_raw.len(),
            "strain profile created"
        );
        Ok(profile)
    }

    /// Set the name of the profile.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.meta.name = name.into();
        self
    }

    pub fn meta(&self) -> &ProfileMetadata {
        &self.meta
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.meta.name = name.into();
        self.meta.touch();
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Replace the settings. All derived data is discarded.
    pub fn set_settings(&mut self, settings: AnalysisSettings) -> CrackResult<()> {
        settings.validate()?;
        self.settings = settings;
        self.clean_data();
        Ok(())
    }

    /// Working positions (after cropping).
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Working strain (after cropping).
    pub fn strain(&self) -> &[f64] {
        &self.strain
    }

    /// Working instantaneous strain (after cropping).
    pub fn strain_inst(&self) -> Option<&[f64]> {
        self.strain_inst.as_deref()
    }

    /// Positions as passed in.
    pub fn x_raw(&self) -> &[f64] {
        &self.x_raw
    }

    /// Strain as passed in.
    pub fn strain_raw(&self) -> &[f64] {
        &self.strain_raw
    }

    /// Instantaneous strain as passed in.
    pub fn strain_inst_raw(&self) -> Option<&[f64]> {
        self.strain_inst_raw.as_deref()
    }

    pub fn crack_list(&self) -> &CrackList {
        &self.crack_list
    }

    pub fn shrink_calibration_values(&self) -> Option<&[f64]> {
        self.shrink_calibration_values.as_deref()
    }

    pub fn tension_stiffening_values(&self) -> Option<&[f64]> {
        self.tension_stiffening_values.as_deref()
    }

    /// Strain the crack widths were integrated from.
    pub fn strain_compensated(&self) -> Option<&[f64]> {
        self.strain_compensated.as_deref()
    }

    pub fn state(&self) -> ProfileState {
        self.state
    }

    /// Discard all derived data and rebuild the working arrays.
    pub fn clean_data(&mut self) {
        let (x, range) = self.settings.crop.apply(&self.x_raw);
        self.strain = self.strain_raw[range.clone()].to_vec();
        self.strain_inst = self.strain_inst_raw.as_ref().map(|inst| inst[range].to_vec());
        self.x = x;
        self.crack_list = CrackList::new();
        self.shrink_calibration_values = None;
        self.tension_stiffening_values = None;
        self.strain_compensated = None;
        self.state = ProfileState::Empty;
        self.meta.touch();
    }

    /// Detect cracks if the crack list is empty.
    pub fn find_cracks(&mut self) -> CrackResult<&CrackList> {
        if self.crack_list.is_empty() {
            self.crack_list = self.settings.crack_finder.run(&self.x, &self.strain)?;
            self.state = ProfileState::Found;
            self.meta.touch();
            info!(profile = %self.meta.name, cracks = self.crack_list.len(), "cracks detected");
        }
        Ok(&self.crack_list)
    }

    /// Assign transfer lengths, detecting cracks first if the list is empty.
    pub fn set_leff(&mut self) -> CrackResult<&CrackList> {
        self.find_cracks()?;
        self.settings
            .length_splitter
            .run(&self.x, &self.strain, &mut self.crack_list)?;
        self.state = ProfileState::LengthsAssigned;
        self.meta.touch();
        Ok(&self.crack_list)
    }

    /// Compute the shrink and creep correction.
    ///
    /// Returns `None` if no shrink compensator is configured.
    pub fn compensate_shrink(&mut self) -> CrackResult<Option<&[f64]>> {
        let Some(compensator) = self.settings.shrink_compensator else {
            self.shrink_calibration_values = None;
            return Ok(None);
        };
        let result = compensator
            .run(&self.x, &self.strain, self.strain_inst.as_deref())
            .and_then(|values| check_correction(&values, self.x.len()).map(|_| values));
        match result {
            Ok(values) => {
                self.shrink_calibration_values = Some(values);
                Ok(self.shrink_calibration_values.as_deref())
            }
            Err(e) => {
                warn!(compensator = "shrink", error = %e, "compensation failed");
                self.shrink_calibration_values = None;
                self.discard_widths();
                Err(CrackError::compensation_failed("shrink", e))
            }
        }
    }

    /// Compute the tension stiffening correction.
    ///
    /// Assigns transfer lengths first if necessary. Returns `None` if no
    /// tension stiffening compensator is configured.
    pub fn calculate_tension_stiffening(&mut self) -> CrackResult<Option<&[f64]>> {
        let Some(compensator) = self.settings.ts_compensator else {
            self.tension_stiffening_values = None;
            return Ok(None);
        };
        if self.state < ProfileState::LengthsAssigned {
            self.set_leff()?;
        }
        let result = compensator
            .run(&self.x, &self.strain, &self.crack_list)
            .and_then(|values| check_correction(&values, self.x.len()).map(|_| values));
        match result {
            Ok(values) => {
                self.tension_stiffening_values = Some(values);
                Ok(self.tension_stiffening_values.as_deref())
            }
            Err(e) => {
                warn!(compensator = compensator.name(), error = %e, "compensation failed");
                self.tension_stiffening_values = None;
                self.discard_widths();
                Err(CrackError::compensation_failed(compensator.name(), e))
            }
        }
    }

    /// Widths and compensated strain no longer match the corrections.
    fn discard_widths(&mut self) {
        self.strain_compensated = None;
        for crack in self.crack_list.iter_mut() {
            crack.width = None;
        }
        self.state = self.state.min(ProfileState::LengthsAssigned);
    }

    /// Compute the width of every crack.
    ///
    /// With `clean`, everything is recomputed from scratch. Otherwise the
    /// current cracks are kept and only missing steps are run.
    pub fn calculate_crack_widths(&mut self, clean: bool) -> CrackResult<&CrackList> {
        if clean {
            self.clean_data();
        }
        if self.state < ProfileState::LengthsAssigned {
            self.set_leff()?;
        }
        self.compensate_shrink()?;
        self.calculate_tension_stiffening()?;

        let mut compensated = self.strain.clone();
        let corrections = [&self.shrink_calibration_values, &self.tension_stiffening_values];
        for correction in corrections.into_iter().flatten() {
            for (value, c) in compensated.iter_mut().zip(correction) {
                *value -= c;
            }
        }
        self.state = ProfileState::Compensated;
        if self.settings.suppress_compression {
            for value in compensated.iter_mut() {
                *value = value.max(0.0);
            }
        }

        for crack in self.crack_list.iter_mut() {
            let range = crop_range(&self.x, crack.x_l, crack.x_r);
            let width = self.settings.integrator.integrate_segment(
                &self.x[range.clone()],
                &compensated[range],
                None,
                None,
                0.0,
            )?;
            crack.width = Some(width);
        }
        self.strain_compensated = Some(compensated);
        self.state = ProfileState::WidthsComputed;
        self.meta.touch();
        info!(profile = %self.meta.name, cracks = self.crack_list.len(), "crack widths computed");
        Ok(&self.crack_list)
    }

    /// Add cracks by position or as copies of existing cracks.
    ///
    /// Each crack is placed at the sample closest to its position (ties go to
    /// the smaller sample) and takes the strain there as `max_strain`. Copied
    /// boundaries are kept only if they still enclose the new location. With
    /// `recalculate`, transfer lengths and widths are recomputed for all
    /// cracks.
    ///
    /// ```rust
    /// use crack_core::crackmonitoring::strain_profile::StrainProfile;
    ///
    /// let x = vec![0.0, 0.5, 1.0, 1.5, 2.0];
    /// let strain = vec![0.0, 10.0, 20.0, 10.0, 0.0];
    /// let mut profile = StrainProfile::new(x, strain).unwrap();
    ///
    /// let cracks = profile.add_cracks([1.2], true).unwrap();
    /// assert_eq!(cracks[0].location, Some(1.0));
    /// assert_eq!(cracks[0].max_strain, Some(20.0));
    /// ```
    pub fn add_cracks<E, I>(&mut self, entries: I, recalculate: bool) -> CrackResult<&CrackList>
    where
        E: Into<CrackEntry>,
        I: IntoIterator<Item = E>,
    {
        let mut added = Vec::new();
        for entry in entries {
            added.push(self.place_crack(entry.into())?);
        }
        let count = added.len();
        for crack in added {
            self.crack_list.push(crack);
        }
        self.state = ProfileState::Found;
        self.meta.touch();
        info!(profile = %self.meta.name, added = count, total = self.crack_list.len(), "cracks added");

        if recalculate {
            self.recalculate()?;
        }
        Ok(&self.crack_list)
    }

    fn recalculate(&mut self) -> CrackResult<()> {
        self.set_leff()?;
        self.calculate_crack_widths(false)?;
        Ok(())
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            crack_list: self.crack_list.clone(),
            shrink_calibration_values: self.shrink_calibration_values.clone(),
            tension_stiffening_values: self.tension_stiffening_values.clone(),
            strain_compensated: self.strain_compensated.clone(),
            state: self.state,
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.crack_list = snapshot.crack_list;
        self.shrink_calibration_values = snapshot.shrink_calibration_values;
        self.tension_stiffening_values = snapshot.tension_stiffening_values;
        self.strain_compensated = snapshot.strain_compensated;
        self.state = snapshot.state;
    }

    fn place_crack(&self, entry: CrackEntry) -> CrackResult<Crack> {
        let (position, template) = match entry {
            CrackEntry::Position(p) => (p, None),
            CrackEntry::Crack(c) => {
                let location = c.location.ok_or_else(|| CrackError::missing_field("location"))?;
                (location, Some(c))
            }
        };
        if position.is_nan() {
            return Err(CrackError::invalid_input("location", "NaN", "Crack position must be a number"));
        }
        let (index, location) = find_closest_value(&self.x, position)
            .ok_or_else(|| CrackError::precondition("add cracks", "Profile has no samples"))?;

        let mut crack = template.unwrap_or_default();
        crack.index = Some(index);
        crack.location = Some(location);
        crack.max_strain = Some(self.strain[index]);
        crack.width = None;
        crack.x_l = crack.x_l.filter(|&l| l < location);
        crack.x_r = crack.x_r.filter(|&r| r > location);
        Ok(crack)
    }

    /// Remove cracks by their position in the crack list.
    ///
    /// Out-of-range and repeated indices are ignored. Returns the removed
    /// cracks in the order given. With `recalculate`, transfer lengths and
    /// widths are recomputed for the remaining cracks. If that fails, the
    /// deletion is reverted and the profile is left as it was.
    pub fn delete_cracks(&mut self, indices: &[usize], recalculate: bool) -> CrackResult<CrackList> {
        let available = self.crack_list.len();
        for (n, &i) in indices.iter().enumerate() {
            if i >= available {
                warn!(index = i, cracks = available, "crack index out of range, ignored");
            } else if indices[..n].contains(&i) {
                warn!(index = i, "crack index given twice, ignored");
            }
        }
        let before = recalculate.then(|| self.snapshot());
        let removed = self.crack_list.remove_indices(indices);
        if self.state != ProfileState::Empty {
            self.state = ProfileState::Found;
        }
        self.meta.touch();
        info!(
            profile = %self.meta.name,
            removed = removed.len(),
            total = self.crack_list.len(),
            "cracks deleted"
        );

        if let Some(before) = before {
            if let Err(e) = self.recalculate() {
                warn!(profile = %self.meta.name, error = %e, "recalculation failed, deletion reverted");
                self.restore(before);
                return Err(e);
            }
        }
        Ok(removed)
    }
}
