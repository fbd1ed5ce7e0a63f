use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Along-track geophysical variable, one value per radar record
pub type TrackArray = Array1<f64>;

/// Per-record boolean flag array
pub type FlagMask = Array1<bool>;

/// Gridded auxiliary field (rows x columns)
pub type GridArray = Array2<f64>;

/// Hemisphere tag attached to orbit segments and auxiliary grids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hemisphere {
    North,
    South,
}

impl Hemisphere {
    /// Parse the hemisphere tag carried by the Level-1 adapter
    pub fn from_tag(tag: &str) -> FloeResult<Self> {
        match tag {
            "north" | "nh" => Ok(Hemisphere::North),
            "south" | "sh" => Ok(Hemisphere::South),
            _ => Err(FloeError::InvalidConfig(format!(
                "unknown hemisphere tag: {}",
                tag
            ))),
        }
    }
}

impl std::fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Hemisphere::North => write!(f, "north"),
            Hemisphere::South => write!(f, "south"),
        }
    }
}

/// Ice type (first-year vs multi-year mix) along the track
///
/// `fraction` is the multi-year ice fraction in [0, 1]; `uncertainty` is the
/// per-record uncertainty of that fraction. Both come from the Level-1
/// adapter together with the waveform parameters.
#[derive(Debug, Clone)]
pub struct IceTypeFraction {
    pub fraction: TrackArray,
    pub uncertainty: TrackArray,
}

impl IceTypeFraction {
    pub fn new(fraction: TrackArray, uncertainty: TrackArray) -> FloeResult<Self> {
        if fraction.len() != uncertainty.len() {
            return Err(FloeError::InvalidRecordCount {
                expected: fraction.len(),
                actual: uncertainty.len(),
            });
        }
        Ok(Self {
            fraction,
            uncertainty,
        })
    }

    pub fn n_records(&self) -> usize {
        self.fraction.len()
    }

    /// Subset to the given record indices
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            fraction: indices.iter().map(|&i| self.fraction[i]).collect(),
            uncertainty: indices.iter().map(|&i| self.uncertainty[i]).collect(),
        }
    }
}

/// Snow depth & density along the track with propagated uncertainties
///
/// All arrays have the record count of the orbit they were derived for.
/// Records without a valid estimate carry NaN; the all-NaN state is the
/// degrade result when an auxiliary source is unavailable.
#[derive(Debug, Clone)]
pub struct SnowParameters {
    pub depth: TrackArray,
    pub density: TrackArray,
    pub depth_uncertainty: TrackArray,
    pub density_uncertainty: TrackArray,
}

impl SnowParameters {
    /// All-NaN container of the given record count (degrade result)
    pub fn nan(n_records: usize) -> Self {
        Self {
            depth: TrackArray::from_elem(n_records, f64::NAN),
            density: TrackArray::from_elem(n_records, f64::NAN),
            depth_uncertainty: TrackArray::from_elem(n_records, f64::NAN),
            density_uncertainty: TrackArray::from_elem(n_records, f64::NAN),
        }
    }

    pub fn n_records(&self) -> usize {
        self.depth.len()
    }

    /// Force NaN at the given record positions in all four parameters
    pub fn set_invalid(&mut self, indices: &[usize]) {
        for &i in indices {
            self.depth[i] = f64::NAN;
            self.density[i] = f64::NAN;
            self.depth_uncertainty[i] = f64::NAN;
            self.density_uncertainty[i] = f64::NAN;
        }
    }

    /// Check that all four arrays share one record count
    pub fn validate(&self) -> FloeResult<()> {
        let n = self.depth.len();
        for len in [
            self.density.len(),
            self.depth_uncertainty.len(),
            self.density_uncertainty.len(),
        ] {
            if len != n {
                return Err(FloeError::InvalidRecordCount {
                    expected: n,
                    actual: len,
                });
            }
        }
        Ok(())
    }
}

/// Error types for the retrieval chain
#[derive(Debug, thiserror::Error)]
pub enum FloeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing external data: {0}")]
    MissingExternalData(String),

    #[error("{dataset} is not defined for hemisphere '{hemisphere}'")]
    UnsupportedHemisphere {
        dataset: String,
        hemisphere: Hemisphere,
    },

    #[error("Invalid record count: {actual} (must be {expected})")]
    InvalidRecordCount { expected: usize, actual: usize },

    #[error("Unknown surface type class: {0}")]
    UnknownSurfaceClass(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Stage '{stage}' failed: {reason}")]
    Stage {
        stage: &'static str,
        reason: anyhow::Error,
    },
}

/// Result type for retrieval operations
pub type FloeResult<T> = Result<T, FloeError>;
