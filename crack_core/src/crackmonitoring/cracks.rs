//! # Cracks and Crack Lists
//!
//! A [`Crack`] is assembled step by step: detection sets its location and a
//! provisional segment, separation refines the segment, and the strain
//! profile finally writes the width. Every field is therefore optional and
//! reading an unset field yields `None`.
//!
//! ## Fields
//!
//! ```text
//!            x_l        location       x_r
//!             |<-- lt_l -->|<-- lt_r -->|
//!             |<---------- lt --------->|
//! ```
//!
//! Besides the core fields, arbitrary named attributes can be attached
//! (e.g. a crack pattern id or a quality flag) and read back through the
//! same generic [`Crack::get`] accessor.
//!
//! ## Example
//!
//! ```rust
//! use crack_core::crackmonitoring::cracks::{Crack, CrackList};
//!
//! let mut list = CrackList::from(vec![
//!     Crack::new(7, 0.7, 420.0).with_segment(0.55, 0.85),
//!     Crack::new(3, 0.3, 510.0).with_segment(0.15, 0.55),
//! ]);
//! list.sort();
//!
//! assert_eq!(list.locations(), vec![Some(0.3), Some(0.7)]);
//! assert_eq!(list.containing(0.6).and_then(|c| c.index), Some(7));
//! assert!(list.nearest(2.0, Some(0.1)).is_none());
//! ```

use std::collections::BTreeMap;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::errors::{CrackError, CrackResult};

/// Names of the core fields, readable and writable through [`Crack::get`]/[`Crack::set`].
pub const CORE_FIELDS: [&str; 7] = ["index", "location", "x_l", "x_r", "max_strain", "width", "name"];

/// Names of the derived, read-only quantities.
pub const DERIVED_FIELDS: [&str; 3] = ["lt", "lt_l", "lt_r"];

/// Value of a crack attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Flag(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

impl AttributeValue {
    /// Numeric view of the value (integers are widened).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(v) => Some(*v),
            AttributeValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Text view of the value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::Flag(_) => "flag",
            AttributeValue::Integer(_) => "integer",
            AttributeValue::Number(_) => "number",
            AttributeValue::Text(_) => "text",
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Number(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Integer(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Flag(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Text(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::Text(v)
    }
}

/// A crack in the concrete.
///
/// Transfer length assignment opens unset boundaries to `±inf`. JSON has no
/// infinity, so `serde_json` writes those as `null` and they read back as
/// unset (`segment()` is then `None`). Assigning transfer lengths again
/// restores them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Crack {
    /// Sample index of the peak in the working arrays of the strain profile
    pub index: Option<usize>,
    /// Position of the crack along the sensor (a sample of `x`)
    pub location: Option<f64>,
    /// Left end of the transfer length
    pub x_l: Option<f64>,
    /// Right end of the transfer length
    pub x_r: Option<f64>,
    /// Strain at the crack location
    pub max_strain: Option<f64>,
    /// Crack opening width, integrated over the transfer length
    pub width: Option<f64>,
    /// Optional label
    pub name: Option<String>,
    /// Additional named attributes
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Crack {
    /// Crack at a detected peak.
    pub fn new(index: usize, location: f64, max_strain: f64) -> Self {
        Crack {
            index: Some(index),
            location: Some(location),
            max_strain: Some(max_strain),
            ..Default::default()
        }
    }

    /// Crack known only by its approximate position.
    pub fn at(location: f64) -> Self {
        Crack {
            location: Some(location),
            ..Default::default()
        }
    }

    /// Crack with every field unset, used as a "no match" stand-in.
    pub fn placeholder() -> Self {
        Crack::default()
    }

    /// Set both ends of the transfer length.
    pub fn with_segment(mut self, x_l: f64, x_r: f64) -> Self {
        self.x_l = Some(x_l);
        self.x_r = Some(x_r);
        self
    }

    /// Set the label.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Length of the transfer length, `x_r - x_l`.
    pub fn lt(&self) -> Option<f64> {
        match (self.x_l, self.x_r) {
            (Some(l), Some(r)) => Some(r - l),
            _ => None,
        }
    }

    /// Distance from the left end to the crack, `location - x_l`.
    pub fn lt_l(&self) -> Option<f64> {
        match (self.location, self.x_l) {
            (Some(loc), Some(l)) => Some(loc - l),
            _ => None,
        }
    }

    /// Distance from the crack to the right end, `x_r - location`.
    pub fn lt_r(&self) -> Option<f64> {
        match (self.location, self.x_r) {
            (Some(loc), Some(r)) => Some(r - loc),
            _ => None,
        }
    }

    /// The influence segment `(x_l, x_r)`.
    pub fn segment(&self) -> Option<(f64, f64)> {
        match (self.x_l, self.x_r) {
            (Some(l), Some(r)) => Some((l, r)),
            _ => None,
        }
    }

    /// Read any field, derived quantity or extra attribute by name.
    ///
    /// Unset and unknown names both yield `None`.
    pub fn get(&self, name: &str) -> Option<AttributeValue> {
        match name {
            "index" => self.index.map(|i| AttributeValue::Integer(i as i64)),
            "location" => self.location.map(AttributeValue::Number),
            "x_l" => self.x_l.map(AttributeValue::Number),
            "x_r" => self.x_r.map(AttributeValue::Number),
            "max_strain" => self.max_strain.map(AttributeValue::Number),
            "width" => self.width.map(AttributeValue::Number),
            "name" => self.name.clone().map(AttributeValue::Text),
            "lt" => self.lt().map(AttributeValue::Number),
            "lt_l" => self.lt_l().map(AttributeValue::Number),
            "lt_r" => self.lt_r().map(AttributeValue::Number),
            other => self.attributes.get(other).cloned(),
        }
    }

    /// Numeric value of a field or attribute, if set and numeric.
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(|v| v.as_f64())
    }

    /// Write a field or attribute by name.
    ///
    /// Core fields are type-checked; derived quantities cannot be written.
    pub fn set(&mut self, name: &str, value: impl Into<AttributeValue>) -> CrackResult<()> {
        let value = value.into();
        let type_error = |expected: &str, value: &AttributeValue| {
            CrackError::invalid_input(
                name,
                format!("{:?}", value),
                format!("Expected {}, got {}", expected, value.type_name()),
            )
        };
        match name {
            "index" => match value {
                AttributeValue::Integer(i) if i >= 0 => self.index = Some(i as usize),
                other => return Err(type_error("non-negative integer", &other)),
            },
            "location" | "x_l" | "x_r" | "max_strain" | "width" => {
                let v = value.as_f64().ok_or_else(|| type_error("number", &value))?;
                match name {
                    "location" => self.location = Some(v),
                    "x_l" => self.x_l = Some(v),
                    "x_r" => self.x_r = Some(v),
                    "max_strain" => self.max_strain = Some(v),
                    _ => self.width = Some(v),
                }
            }
            "name" => match value {
                AttributeValue::Text(s) => self.name = Some(s),
                other => return Err(type_error("text", &other)),
            },
            derived if DERIVED_FIELDS.contains(&derived) => {
                return Err(CrackError::invalid_input(
                    derived,
                    format!("{:?}", value),
                    "Derived quantity is read-only",
                ));
            }
            other => {
                self.attributes.insert(other.to_string(), value);
            }
        }
        Ok(())
    }

    /// Unset a field or remove an attribute by name.
    pub fn clear(&mut self, name: &str) -> CrackResult<()> {
        match name {
            "index" => self.index = None,
            "location" => self.location = None,
            "x_l" => self.x_l = None,
            "x_r" => self.x_r = None,
            "max_strain" => self.max_strain = None,
            "width" => self.width = None,
            "name" => self.name = None,
            derived if DERIVED_FIELDS.contains(&derived) => {
                return Err(CrackError::invalid_input(derived, "", "Derived quantity is read-only"));
            }
            other => {
                self.attributes.remove(other);
            }
        }
        Ok(())
    }
}

/// Ordered collection of cracks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrackList {
    cracks: Vec<Crack>,
}

impl CrackList {
    /// Create an empty list.
    pub fn new() -> Self {
        CrackList::default()
    }

    pub fn len(&self) -> usize {
        self.cracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cracks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Crack> {
        self.cracks.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Crack> {
        self.cracks.iter_mut()
    }

    pub fn get(&self, index: usize) -> Option<&Crack> {
        self.cracks.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Crack> {
        self.cracks.get_mut(index)
    }

    pub fn push(&mut self, crack: Crack) {
        self.cracks.push(crack);
    }

    pub fn as_slice(&self) -> &[Crack] {
        &self.cracks
    }

    pub fn as_mut_slice(&mut self) -> &mut [Crack] {
        &mut self.cracks
    }

    pub fn into_vec(self) -> Vec<Crack> {
        self.cracks
    }

    /// Remove and return the cracks at the given positions.
    ///
    /// Out-of-range and repeated positions are skipped. The removed cracks
    /// are returned in the order the positions were given.
    pub fn remove_indices(&mut self, indices: &[usize]) -> CrackList {
        let mut selected: Vec<usize> = Vec::with_capacity(indices.len());
        for &i in indices {
            if i < self.cracks.len() && !selected.contains(&i) {
                selected.push(i);
            }
        }
        let removed: Vec<Crack> = selected.iter().map(|&i| self.cracks[i].clone()).collect();
        let mut position = 0;
        self.cracks.retain(|_| {
            let keep = !selected.contains(&position);
            position += 1;
            keep
        });
        CrackList::from(removed)
    }

    /// Stable sort by location. Cracks without a location go last.
    pub fn sort(&mut self) {
        self.cracks.sort_by(|a, b| {
            let ka = a.location.unwrap_or(f64::INFINITY);
            let kb = b.location.unwrap_or(f64::INFINITY);
            ka.total_cmp(&kb)
        });
    }

    /// True if the locations are ascending.
    pub fn is_sorted(&self) -> bool {
        self.cracks.windows(2).all(|w| {
            w[0].location.unwrap_or(f64::INFINITY) <= w[1].location.unwrap_or(f64::INFINITY)
        })
    }

    /// One attribute across all cracks.
    pub fn project(&self, name: &str) -> Vec<Option<AttributeValue>> {
        self.cracks.iter().map(|c| c.get(name)).collect()
    }

    /// Numeric projection of one attribute across all cracks.
    pub fn project_f64(&self, name: &str) -> Vec<Option<f64>> {
        self.cracks.iter().map(|c| c.get_f64(name)).collect()
    }

    pub fn locations(&self) -> Vec<Option<f64>> {
        self.cracks.iter().map(|c| c.location).collect()
    }

    pub fn x_l(&self) -> Vec<Option<f64>> {
        self.cracks.iter().map(|c| c.x_l).collect()
    }

    pub fn x_r(&self) -> Vec<Option<f64>> {
        self.cracks.iter().map(|c| c.x_r).collect()
    }

    pub fn max_strains(&self) -> Vec<Option<f64>> {
        self.cracks.iter().map(|c| c.max_strain).collect()
    }

    pub fn widths(&self) -> Vec<Option<f64>> {
        self.cracks.iter().map(|c| c.width).collect()
    }

    pub fn indices(&self) -> Vec<Option<usize>> {
        self.cracks.iter().map(|c| c.index).collect()
    }

    /// Crack whose location is closest to `position`.
    ///
    /// On equal distance the earlier crack wins. With a tolerance, cracks
    /// further away than `tolerance` do not match.
    pub fn nearest(&self, position: f64, tolerance: Option<f64>) -> Option<&Crack> {
        let mut best: Option<(&Crack, f64)> = None;
        for crack in &self.cracks {
            let Some(location) = crack.location else {
                continue;
            };
            let dist = (position - location).abs();
            if best.map_or(true, |(_, d)| dist < d) {
                best = Some((crack, dist));
            }
        }
        match (best, tolerance) {
            (Some((_, dist)), Some(tol)) if dist > tol => None,
            (found, _) => found.map(|(crack, _)| crack),
        }
    }

    /// Copy of the nearest crack, or a placeholder on a miss.
    pub fn nearest_or_placeholder(&self, position: f64, tolerance: Option<f64>) -> Crack {
        self.nearest(position, tolerance)
            .cloned()
            .unwrap_or_else(Crack::placeholder)
    }

    /// First crack whose segment contains `position`, `x_l < position <= x_r`.
    pub fn containing(&self, position: f64) -> Option<&Crack> {
        self.cracks.iter().find(|c| match c.segment() {
            Some((l, r)) => l < position && position <= r,
            None => false,
        })
    }

    /// Copies of the cracks nearest to each position.
    ///
    /// Misses are dropped, or replaced by placeholders if `placeholder` is set
    /// so the result stays aligned with `positions`.
    pub fn cracks_by_location(&self, positions: &[f64], tolerance: Option<f64>, placeholder: bool) -> CrackList {
        positions
            .iter()
            .filter_map(|&p| match self.nearest(p, tolerance) {
                Some(crack) => Some(crack.clone()),
                None if placeholder => Some(Crack::placeholder()),
                None => None,
            })
            .collect()
    }

    /// Copies of the cracks whose numeric attribute lies in `[min, max]`.
    ///
    /// Unset bounds are open. Cracks without a numeric value are excluded.
    pub fn filter_range(&self, name: &str, min: Option<f64>, max: Option<f64>) -> CrackList {
        self.cracks
            .iter()
            .filter(|c| match c.get_f64(name) {
                Some(v) => min.map_or(true, |lo| v >= lo) && max.map_or(true, |hi| v <= hi),
                None => false,
            })
            .cloned()
            .collect()
    }

    /// Copies of the cracks where the attribute is not set.
    pub fn filter_unset(&self, name: &str) -> CrackList {
        self.cracks
            .iter()
            .filter(|c| c.get(name).is_none())
            .cloned()
            .collect()
    }

    /// Unset one attribute on every crack.
    pub fn clear_attribute(&mut self, name: &str) -> CrackResult<()> {
        for crack in &mut self.cracks {
            crack.clear(name)?;
        }
        Ok(())
    }
}

impl From<Vec<Crack>> for CrackList {
    fn from(cracks: Vec<Crack>) -> Self {
        CrackList { cracks }
    }
}

impl FromIterator<Crack> for CrackList {
    fn from_iter<I: IntoIterator<Item = Crack>>(iter: I) -> Self {
        CrackList {
            cracks: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for CrackList {
    type Item = Crack;
    type IntoIter = std::vec::IntoIter<Crack>;

    fn into_iter(self) -> Self::IntoIter {
        self.cracks.into_iter()
    }
}

impl<'a> IntoIterator for &'a CrackList {
    type Item = &'a Crack;
    type IntoIter = std::slice::Iter<'a, Crack>;

    fn into_iter(self) -> Self::IntoIter {
        self.cracks.iter()
    }
}

impl Index<usize> for CrackList {
    type Output = Crack;

    fn index(&self, index: usize) -> &Crack {
        &self.cracks[index]
    }
}
