//! Per-record surface type classification state
//!
//! Surface classes follow the CryoSat-2 conventions: a fixed nine-category
//! code set with lead/polynya/sea-ice refinements of the radar-dark and
//! radar-bright regimes. Classes are applied as boolean masks with
//! last-writer-wins overwrite semantics, which makes the application order a
//! priority order (ocean, lead, sea_ice, then land; land always terminal).

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::types::{FlagMask, FloeError, FloeResult, TrackArray};

/// Fixed surface type category set with per-class integer codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SurfaceClass {
    Unknown = 0,
    Ocean = 1,
    Lead = 2,
    Polynya = 3,
    SeaIce = 4,
    ClosedSea = 5,
    LandIce = 6,
    Land = 7,
    Invalid = 8,
}

impl SurfaceClass {
    pub const ALL: [SurfaceClass; 9] = [
        SurfaceClass::Unknown,
        SurfaceClass::Ocean,
        SurfaceClass::Lead,
        SurfaceClass::Polynya,
        SurfaceClass::SeaIce,
        SurfaceClass::ClosedSea,
        SurfaceClass::LandIce,
        SurfaceClass::Land,
        SurfaceClass::Invalid,
    ];

    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn name(&self) -> &'static str {
        match self {
            SurfaceClass::Unknown => "unknown",
            SurfaceClass::Ocean => "ocean",
            SurfaceClass::Lead => "lead",
            SurfaceClass::Polynya => "polynya",
            SurfaceClass::SeaIce => "sea_ice",
            SurfaceClass::ClosedSea => "closed_sea",
            SurfaceClass::LandIce => "land_ice",
            SurfaceClass::Land => "land",
            SurfaceClass::Invalid => "invalid",
        }
    }

    /// Resolve a configured class name, rejecting anything outside the
    /// fixed category set before any orbit is processed
    pub fn from_name(name: &str) -> FloeResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|class| class.name() == name)
            .ok_or_else(|| FloeError::UnknownSurfaceClass(name.to_string()))
    }
}

impl std::fmt::Display for SurfaceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Container for per-record surface type codes
///
/// The record count is fixed by the first flag added; every later flag must
/// have the same length. `add_flag` overwrites prior codes at true mask
/// positions and leaves the rest untouched.
#[derive(Debug, Clone, Default)]
pub struct SurfaceType {
    codes: Option<Array1<u8>>,
    applied: Vec<SurfaceClass>,
}

impl SurfaceType {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn n_records(&self) -> usize {
        self.codes.as_ref().map_or(0, |codes| codes.len())
    }

    /// Per-record surface type codes (None before the first flag)
    pub fn flag(&self) -> Option<&Array1<u8>> {
        self.codes.as_ref()
    }

    /// Set the surface type code at true mask positions, overwriting any
    /// prior class there (last writer wins)
    pub fn add_flag(&mut self, mask: &FlagMask, class: SurfaceClass) -> FloeResult<()> {
        let codes = match &mut self.codes {
            None => {
                self.codes = Some(Array1::zeros(mask.len()));
                self.codes.as_mut().unwrap()
            }
            Some(codes) => {
                if codes.len() != mask.len() {
                    return Err(FloeError::InvalidRecordCount {
                        expected: codes.len(),
                        actual: mask.len(),
                    });
                }
                codes
            }
        };
        ndarray::Zip::from(codes).and(mask).for_each(|code, &m| {
            if m {
                *code = class.code();
            }
        });
        self.applied.push(class);
        Ok(())
    }

    /// True if the class was ever applied, even if fully overwritten since
    pub fn has_flag(&self, class: SurfaceClass) -> bool {
        self.applied.contains(&class)
    }

    /// Mask of records currently carrying the given class
    ///
    /// Never fails: an unapplied class yields an all-false mask of the
    /// current record count.
    pub fn get_by_name(&self, class: SurfaceClass) -> FlagMask {
        match &self.codes {
            Some(codes) => codes.mapv(|code| code == class.code()),
            None => FlagMask::from_elem(0, false),
        }
    }

    pub fn lead(&self) -> FlagMask {
        self.get_by_name(SurfaceClass::Lead)
    }

    pub fn sea_ice(&self) -> FlagMask {
        self.get_by_name(SurfaceClass::SeaIce)
    }

    /// Concatenate another state end-to-end for orbit stitching
    pub fn append(&mut self, annex: &SurfaceType) {
        match (&mut self.codes, &annex.codes) {
            (Some(codes), Some(other)) => {
                let mut joined = codes.to_vec();
                joined.extend(other.iter());
                *codes = Array1::from_vec(joined);
            }
            (None, Some(other)) => self.codes = Some(other.clone()),
            _ => {}
        }
        for class in &annex.applied {
            if !self.applied.contains(class) {
                self.applied.push(*class);
            }
        }
    }

    /// Restrict the state to a record subset (ROI trimming), rewriting the
    /// record count
    pub fn set_subset(&mut self, indices: &[usize]) {
        if let Some(codes) = &self.codes {
            self.codes = Some(indices.iter().map(|&i| codes[i]).collect());
        }
    }
}

/// Named per-record classifier input parameters for one orbit
///
/// Append-only: the first parameter fixes the record count, and parameters
/// are never replaced once added. Classifiers treat the set as read-only.
#[derive(Debug, Clone, Default)]
pub struct ClassifierParameterSet {
    parameters: Vec<(String, TrackArray)>,
    n_records: Option<usize>,
}

impl ClassifierParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn n_records(&self) -> usize {
        self.n_records.unwrap_or(0)
    }

    pub fn parameter_list(&self) -> Vec<&str> {
        self.parameters.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn add_parameter(&mut self, name: &str, parameter: TrackArray) -> FloeResult<()> {
        if let Some(n) = self.n_records {
            if parameter.len() != n {
                return Err(FloeError::InvalidRecordCount {
                    expected: n,
                    actual: parameter.len(),
                });
            }
        } else {
            self.n_records = Some(parameter.len());
        }
        if self.parameters.iter().any(|(existing, _)| existing == name) {
            return Err(FloeError::InvalidConfig(format!(
                "classifier parameter '{}' added twice",
                name
            )));
        }
        self.parameters.push((name.to_string(), parameter));
        Ok(())
    }

    /// Look up a parameter required by the active rule set
    pub fn get(&self, name: &str) -> FloeResult<&TrackArray> {
        self.parameters
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, parameter)| parameter)
            .ok_or_else(|| {
                FloeError::InvalidConfig(format!(
                    "classifier parameter '{}' not provided by the Level-1 adapter",
                    name
                ))
            })
    }

    /// Subset every parameter to the given record indices
    pub fn select(&self, indices: &[usize]) -> Self {
        let parameters = self
            .parameters
            .iter()
            .map(|(name, parameter)| {
                let subset: TrackArray = indices.iter().map(|&i| parameter[i]).collect();
                (name.clone(), subset)
            })
            .collect();
        Self {
            parameters,
            n_records: Some(indices.len()),
        }
    }
}
