//! Per-orbit data containers
//!
//! `Level1bData` is the validated hand-over from the mission-specific
//! Level-1 adapter (parsing and byte layout live outside this crate).
//! `Level2Data` is the retrieval product container for one orbit segment;
//! it is owned by the orbit invocation that created it and appended to the
//! run's orbit collection when the granule completes.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::auxdata::AuxPeriodKey;
use crate::core::surface_type::ClassifierParameterSet;
use crate::core::SurfaceType;
use crate::types::{
    FlagMask, FloeError, FloeResult, Hemisphere, IceTypeFraction, SnowParameters, TrackArray,
};

/// Geographic track of one orbit segment
#[derive(Debug, Clone)]
pub struct TrackData {
    pub longitude: TrackArray,
    pub latitude: TrackArray,
    pub timestamps: Vec<DateTime<Utc>>,
}

impl TrackData {
    pub fn new(
        longitude: TrackArray,
        latitude: TrackArray,
        timestamps: Vec<DateTime<Utc>>,
    ) -> FloeResult<Self> {
        let n = longitude.len();
        for len in [latitude.len(), timestamps.len()] {
            if len != n {
                return Err(FloeError::InvalidRecordCount {
                    expected: n,
                    actual: len,
                });
            }
        }
        Ok(Self {
            longitude,
            latitude,
            timestamps,
        })
    }

    pub fn n_records(&self) -> usize {
        self.longitude.len()
    }

    /// Subset to the given record indices
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            longitude: indices.iter().map(|&i| self.longitude[i]).collect(),
            latitude: indices.iter().map(|&i| self.latitude[i]).collect(),
            timestamps: indices.iter().map(|&i| self.timestamps[i]).collect(),
        }
    }
}

/// Validated per-orbit input from the Level-1 adapter
#[derive(Debug, Clone)]
pub struct Level1bData {
    pub granule: String,
    pub hemisphere: Hemisphere,
    pub track: TrackData,
    /// Along-track footprint spacing (m)
    pub footprint_spacing: f64,
    /// Land indicator from the Level-1 surface type, copied verbatim into
    /// the classification (never re-derived from radar parameters)
    pub land_mask: FlagMask,
    pub classifier_parameters: ClassifierParameterSet,
    pub sea_ice_type: IceTypeFraction,
}

impl Level1bData {
    pub fn new(
        granule: String,
        hemisphere: Hemisphere,
        track: TrackData,
        footprint_spacing: f64,
        land_mask: FlagMask,
        classifier_parameters: ClassifierParameterSet,
        sea_ice_type: IceTypeFraction,
    ) -> FloeResult<Self> {
        let n = track.n_records();
        for len in [
            land_mask.len(),
            classifier_parameters.n_records(),
            sea_ice_type.n_records(),
        ] {
            if len != n {
                return Err(FloeError::InvalidRecordCount {
                    expected: n,
                    actual: len,
                });
            }
        }
        Ok(Self {
            granule,
            hemisphere,
            track,
            footprint_spacing,
            land_mask,
            classifier_parameters,
            sea_ice_type,
        })
    }

    pub fn n_records(&self) -> usize {
        self.track.n_records()
    }

    /// Subset every per-record container to the given indices (ROI trim)
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            granule: self.granule.clone(),
            hemisphere: self.hemisphere,
            track: self.track.select(indices),
            footprint_spacing: self.footprint_spacing,
            land_mask: indices.iter().map(|&i| self.land_mask[i]).collect(),
            classifier_parameters: self.classifier_parameters.select(indices),
            sea_ice_type: self.sea_ice_type.select(indices),
        }
    }
}

/// Retrieval product container for one orbit segment
#[derive(Debug, Clone)]
pub struct Level2Data {
    pub granule: String,
    pub hemisphere: Hemisphere,
    pub track: TrackData,
    pub footprint_spacing: f64,
    pub sea_ice_type: IceTypeFraction,
    pub surface_type: SurfaceType,
    pub snow: Option<SnowParameters>,
}

impl Level2Data {
    pub fn from_l1b(l1b: &Level1bData) -> Self {
        Self {
            granule: l1b.granule.clone(),
            hemisphere: l1b.hemisphere,
            track: l1b.track.clone(),
            footprint_spacing: l1b.footprint_spacing,
            sea_ice_type: l1b.sea_ice_type.clone(),
            surface_type: SurfaceType::new(),
            snow: None,
        }
    }

    pub fn n_records(&self) -> usize {
        self.track.n_records()
    }

    /// Month number (1-12) of the first track record
    pub fn month(&self) -> FloeResult<u32> {
        self.track
            .timestamps
            .first()
            .map(|timestamp| timestamp.month())
            .ok_or_else(|| {
                FloeError::InvalidConfig("orbit segment holds no records".to_string())
            })
    }

    /// Coarse period key for auxiliary dataset caching
    pub fn period_key(&self) -> FloeResult<AuxPeriodKey> {
        let timestamp = self.track.timestamps.first().ok_or_else(|| {
            FloeError::InvalidConfig("orbit segment holds no records".to_string())
        })?;
        Ok(AuxPeriodKey {
            hemisphere: self.hemisphere,
            year: timestamp.year(),
            month: timestamp.month(),
        })
    }
}

/// Geographic region of interest an orbit is trimmed to
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RegionOfInterest {
    pub hemisphere: Hemisphere,
    /// Equatorward latitude bound (degrees); records poleward of this
    /// latitude on the configured hemisphere are retained
    pub latitude_threshold: f64,
}

impl RegionOfInterest {
    /// Mask of track records inside the region
    pub fn track_mask(&self, track: &TrackData) -> FlagMask {
        match self.hemisphere {
            Hemisphere::North => track.latitude.mapv(|lat| lat >= self.latitude_threshold),
            Hemisphere::South => track.latitude.mapv(|lat| lat <= self.latitude_threshold),
        }
    }
}
