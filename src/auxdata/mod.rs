//! Auxiliary dataset handling
//!
//! Auxiliary fields (snow climatologies, observational composites) come as
//! externally supplied grids keyed by a coarse period (hemisphere + year +
//! month). Many consecutive orbits fall in the same period, so the run-level
//! context owns a single-slot cache that reloads only on a key change. A
//! missing external file is never fatal: consumers degrade to all-NaN
//! containers and record a diagnostic retrievable after the run.

pub mod snow;

use std::collections::HashMap;

use crate::types::{FloeError, FloeResult, GridArray, Hemisphere};

pub use snow::{SnowHandler, SnowSourceDef};

/// Coarse temporal key of an auxiliary dataset period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuxPeriodKey {
    pub hemisphere: Hemisphere,
    pub year: i32,
    pub month: u32,
}

impl std::fmt::Display for AuxPeriodKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:04}-{:02}", self.hemisphere, self.year, self.month)
    }
}

/// A loaded external gridded dataset: named 2-D variables plus the grid
/// longitude/latitude arrays (the shape the netCDF reader hands over)
#[derive(Debug, Clone)]
pub struct GriddedDataset {
    pub longitude: GridArray,
    pub latitude: GridArray,
    variables: HashMap<String, GridArray>,
}

impl GriddedDataset {
    pub fn new(longitude: GridArray, latitude: GridArray) -> FloeResult<Self> {
        if longitude.dim() != latitude.dim() {
            return Err(FloeError::InvalidConfig(format!(
                "grid coordinate shapes differ: {:?} vs {:?}",
                longitude.dim(),
                latitude.dim()
            )));
        }
        Ok(Self {
            longitude,
            latitude,
            variables: HashMap::new(),
        })
    }

    pub fn add_variable(&mut self, name: &str, variable: GridArray) -> FloeResult<()> {
        if variable.dim() != self.longitude.dim() {
            return Err(FloeError::InvalidConfig(format!(
                "variable '{}' shape {:?} does not match grid {:?}",
                name,
                variable.dim(),
                self.longitude.dim()
            )));
        }
        self.variables.insert(name.to_string(), variable);
        Ok(())
    }

    pub fn variable(&self, name: &str) -> FloeResult<&GridArray> {
        self.variables.get(name).ok_or_else(|| {
            FloeError::MissingExternalData(format!("dataset has no variable '{}'", name))
        })
    }
}

/// Seam to the external gridded-dataset reader (netCDF adapter, test mock)
pub trait GriddedDatasetSource {
    /// Load the dataset for the requested period
    ///
    /// A missing file must map to `FloeError::MissingExternalData`.
    fn load(&mut self, key: &AuxPeriodKey) -> FloeResult<GriddedDataset>;
}

/// Single-slot, period-keyed cache of a loaded auxiliary dataset
///
/// Owned by the run-level context and shared across all granules of a run.
/// A requested key equal to the cached one makes `ensure_loaded` a no-op;
/// a new key evicts and replaces the slot. A failed load is remembered for
/// its key (empty slot) so one missing monthly file costs one load attempt,
/// not one per orbit.
#[derive(Debug, Default)]
pub struct AuxdataCache {
    requested: Option<AuxPeriodKey>,
    slot: Option<(AuxPeriodKey, Option<GriddedDataset>)>,
}

impl AuxdataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive and set the requested period key for the upcoming orbit
    pub fn request(&mut self, key: AuxPeriodKey) {
        self.requested = Some(key);
    }

    /// Load the requested dataset unless it is already cached
    pub fn ensure_loaded(&mut self, source: &mut dyn GriddedDatasetSource) -> FloeResult<()> {
        let requested = self.requested.ok_or_else(|| {
            FloeError::InvalidConfig("auxiliary data requested before a period was set".to_string())
        })?;
        if let Some((cached, _)) = &self.slot {
            if *cached == requested {
                return Ok(());
            }
        }
        log::info!("Loading auxiliary dataset for period {}", requested);
        match source.load(&requested) {
            Ok(dataset) => {
                self.slot = Some((requested, Some(dataset)));
                Ok(())
            }
            Err(error) => {
                log::warn!("Auxiliary dataset load failed for {}: {}", requested, error);
                self.slot = Some((requested, None));
                Err(error)
            }
        }
    }

    /// Whether a valid dataset is cached for the requested period
    pub fn has_data(&self) -> bool {
        match (&self.requested, &self.slot) {
            (Some(requested), Some((cached, data))) => cached == requested && data.is_some(),
            _ => false,
        }
    }

    pub fn data(&self) -> Option<&GriddedDataset> {
        self.slot.as_ref().and_then(|(_, data)| data.as_ref())
    }

    pub fn cached_key(&self) -> Option<AuxPeriodKey> {
        self.slot.as_ref().map(|(key, _)| *key)
    }
}

/// Taxonomy tag of a non-fatal auxiliary data condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    MissingExternalData,
    UnsupportedHemisphere,
}

/// Non-fatal condition recorded by an auxiliary data handler
///
/// Diagnostics accumulate per handler instance and stay retrievable after
/// the run, independent of whether they caused a degrade.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}
