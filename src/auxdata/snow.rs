//! Auxiliary snow depth & density sources
//!
//! Every variant produces a `SnowParameters` container with exactly the
//! orbit's record count, degrading to all-NaN (plus a diagnostic) when its
//! external data is unavailable or the orbit is in a hemisphere the source
//! does not cover. Grid-backed variants share the run-level dataset cache;
//! all variants share the correction cascade.

use serde::{Deserialize, Serialize};

use crate::core::corrections::{CorrectionCascade, SmoothingOptions};
use crate::core::grid::{GridDefinition, GridTrackInterpolator};
use crate::core::warren::Warren99;
use crate::l2::data::Level2Data;
use crate::types::{FloeResult, Hemisphere, SnowParameters, TrackArray};

use super::{AuxdataCache, Diagnostic, DiagnosticKind, GriddedDatasetSource};

/// Options for the Warren (1999) climatology source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warren99Options {
    /// Valid snow depth band (m); depth outside invalidates the record
    pub valid_snow_depth_range: (f64, f64),
    /// Scaling constant for the first-year ice snow depth correction
    pub fyi_correction_factor: f64,
    pub smooth_snow_depth: bool,
    pub smooth_filter_width_m: f64,
}

/// Explicit mapping from snow parameters to dataset variable names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnowVariableMap {
    pub depth: String,
    pub density: String,
    pub depth_uncertainty: String,
    pub density_uncertainty: String,
}

/// Per-hemisphere grid definitions of a gridded snow source
///
/// A hemisphere without a definition is outside the source's coverage and
/// degrades to NaN at request time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HemisphereGrids {
    pub north: Option<GridDefinition>,
    pub south: Option<GridDefinition>,
}

impl HemisphereGrids {
    fn get(&self, hemisphere: Hemisphere) -> Option<GridDefinition> {
        match hemisphere {
            Hemisphere::North => self.north,
            Hemisphere::South => self.south,
        }
    }
}

/// Options for the merged Warren99/passive-microwave composite climatology
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedClimatologyOptions {
    pub grids: HemisphereGrids,
    pub variable_map: SnowVariableMap,
    /// Regional weight of the Warren climatology in the composite (0..1);
    /// suppresses first-year ice scaling over the observational region
    pub weight_variable: String,
    pub fyi_correction_factor: f64,
}

/// Options for the daily southern-ocean snow climatology
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SouthernClimatologyOptions {
    pub grid: GridDefinition,
    pub snow_depth_variable: String,
    pub snow_depth_uncertainty_variable: String,
    /// Density is not part of the dataset and comes as a fixed value
    pub snow_density: f64,
    pub snow_density_uncertainty: f64,
    pub smooth_snow_depth: bool,
    pub smooth_filter_width_m: f64,
    /// Source grid rows run north-up and need flipping into the projection
    /// orientation
    #[serde(default)]
    pub flip_rows: bool,
}

/// Options for constant snow depth & density
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedSnowOptions {
    pub fixed_snow_depth: f64,
    pub fixed_snow_density: f64,
    #[serde(default)]
    pub fixed_snow_depth_uncertainty: f64,
    #[serde(default)]
    pub fixed_snow_density_uncertainty: f64,
}

/// Snow source selection with per-variant options
///
/// Closed set: an unknown `name` tag fails at configuration load, before
/// any orbit is processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum SnowSourceDef {
    Warren99(Warren99Options),
    MergedWarren99Climatology(MergedClimatologyOptions),
    SouthernClimatology(SouthernClimatologyOptions),
    FixedSnowDepthDensity(FixedSnowOptions),
}

impl SnowSourceDef {
    pub fn name(&self) -> &'static str {
        match self {
            SnowSourceDef::Warren99(_) => "warren99",
            SnowSourceDef::MergedWarren99Climatology(_) => "merged_warren99_climatology",
            SnowSourceDef::SouthernClimatology(_) => "southern_climatology",
            SnowSourceDef::FixedSnowDepthDensity(_) => "fixed_snow_depth_density",
        }
    }
}

/// Snow source wrapper owning the per-run diagnostics
#[derive(Debug)]
pub struct SnowHandler {
    def: SnowSourceDef,
    diagnostics: Vec<Diagnostic>,
}

impl SnowHandler {
    pub fn new(def: SnowSourceDef) -> Self {
        Self {
            def,
            diagnostics: Vec::new(),
        }
    }

    /// Diagnostics accumulated over the run, for post-run audit
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Snow depth, density and uncertainties for one orbit
    ///
    /// Degrade paths (missing external data, unsupported hemisphere) return
    /// an all-NaN container of the orbit's record count and record a
    /// diagnostic; fatal errors (record count mismatches, configuration
    /// faults) propagate.
    pub fn get_l2_track_vars(
        &mut self,
        l2: &Level2Data,
        cache: &mut AuxdataCache,
        source: &mut dyn GriddedDatasetSource,
    ) -> FloeResult<SnowParameters> {
        let def = self.def.clone();
        match &def {
            SnowSourceDef::Warren99(options) => self.warren99_track_vars(l2, options),
            SnowSourceDef::MergedWarren99Climatology(options) => {
                self.merged_climatology_track_vars(l2, options, cache, source)
            }
            SnowSourceDef::SouthernClimatology(options) => {
                self.southern_climatology_track_vars(l2, options, cache, source)
            }
            SnowSourceDef::FixedSnowDepthDensity(options) => {
                Ok(Self::fixed_track_vars(l2, options))
            }
        }
    }

    fn degrade(&mut self, kind: DiagnosticKind, message: String, n_records: usize) -> SnowParameters {
        log::warn!("{}", message);
        self.diagnostics.push(Diagnostic::new(kind, message));
        SnowParameters::nan(n_records)
    }

    fn warren99_track_vars(
        &mut self,
        l2: &Level2Data,
        options: &Warren99Options,
    ) -> FloeResult<SnowParameters> {
        // The Warren climatology is fitted to Arctic drifting station data
        // and must not be evaluated in the south
        if l2.hemisphere == Hemisphere::South {
            return Ok(self.degrade(
                DiagnosticKind::UnsupportedHemisphere,
                "warren99 climatology not valid for the southern hemisphere".to_string(),
                l2.n_records(),
            ));
        }

        let mut snow =
            Warren99::new().evaluate(&l2.track.longitude, &l2.track.latitude, l2.month()?)?;

        let cascade = CorrectionCascade {
            valid_depth_range: Some(options.valid_snow_depth_range),
            fyi_correction_factor: Some(options.fyi_correction_factor),
            smoothing: options.smooth_snow_depth.then_some(SmoothingOptions {
                filter_width_m: options.smooth_filter_width_m,
                smooth_uncertainty: false,
            }),
        };
        cascade.apply(&mut snow, &l2.sea_ice_type, None, l2.footprint_spacing)?;
        Ok(snow)
    }

    fn merged_climatology_track_vars(
        &mut self,
        l2: &Level2Data,
        options: &MergedClimatologyOptions,
        cache: &mut AuxdataCache,
        source: &mut dyn GriddedDatasetSource,
    ) -> FloeResult<SnowParameters> {
        let Some(griddef) = options.grids.get(l2.hemisphere) else {
            return Ok(self.degrade(
                DiagnosticKind::UnsupportedHemisphere,
                format!(
                    "merged snow climatology has no grid for hemisphere '{}'",
                    l2.hemisphere
                ),
                l2.n_records(),
            ));
        };

        let Some(dataset) = self.ensure_dataset(l2, cache, source)? else {
            return Ok(SnowParameters::nan(l2.n_records()));
        };

        let grid2track = GridTrackInterpolator::new(
            &l2.track.longitude,
            &l2.track.latitude,
            &dataset.longitude,
            &dataset.latitude,
            &griddef,
        )?;

        let map = &options.variable_map;
        let mut snow = SnowParameters {
            depth: grid2track.sample(dataset.variable(&map.depth)?, false)?,
            density: grid2track.sample(dataset.variable(&map.density)?, false)?,
            depth_uncertainty: grid2track.sample(dataset.variable(&map.depth_uncertainty)?, false)?,
            density_uncertainty: grid2track
                .sample(dataset.variable(&map.density_uncertainty)?, false)?,
        };

        // The composite weight (0..1) keeps the first-year ice scaling out
        // of the region dominated by the observational source
        let weight = grid2track.sample(dataset.variable(&options.weight_variable)?, false)?;

        let cascade = CorrectionCascade {
            fyi_correction_factor: Some(options.fyi_correction_factor),
            ..Default::default()
        };
        cascade.apply(&mut snow, &l2.sea_ice_type, Some(&weight), l2.footprint_spacing)?;
        Ok(snow)
    }

    fn southern_climatology_track_vars(
        &mut self,
        l2: &Level2Data,
        options: &SouthernClimatologyOptions,
        cache: &mut AuxdataCache,
        source: &mut dyn GriddedDatasetSource,
    ) -> FloeResult<SnowParameters> {
        if l2.hemisphere == Hemisphere::North {
            return Ok(self.degrade(
                DiagnosticKind::UnsupportedHemisphere,
                "southern snow climatology not valid for the northern hemisphere".to_string(),
                l2.n_records(),
            ));
        }

        let Some(dataset) = self.ensure_dataset(l2, cache, source)? else {
            return Ok(SnowParameters::nan(l2.n_records()));
        };

        let grid2track = GridTrackInterpolator::new(
            &l2.track.longitude,
            &l2.track.latitude,
            &dataset.longitude,
            &dataset.latitude,
            &options.grid,
        )?;

        let mut depth = grid2track.sample(
            dataset.variable(&options.snow_depth_variable)?,
            options.flip_rows,
        )?;
        let mut depth_uncertainty = grid2track.sample(
            dataset.variable(&options.snow_depth_uncertainty_variable)?,
            options.flip_rows,
        )?;
        // Negative values are the dataset's fill
        depth.mapv_inplace(|value| if value < 0.0 { f64::NAN } else { value });
        depth_uncertainty.mapv_inplace(|value| if value < 0.0 { f64::NAN } else { value });

        let n_records = l2.n_records();
        let mut snow = SnowParameters {
            depth,
            depth_uncertainty,
            density: TrackArray::from_elem(n_records, options.snow_density),
            density_uncertainty: TrackArray::from_elem(n_records, options.snow_density_uncertainty),
        };

        let cascade = CorrectionCascade {
            smoothing: options.smooth_snow_depth.then_some(SmoothingOptions {
                filter_width_m: options.smooth_filter_width_m,
                smooth_uncertainty: true,
            }),
            ..Default::default()
        };
        cascade.apply(&mut snow, &l2.sea_ice_type, None, l2.footprint_spacing)?;
        Ok(snow)
    }

    fn fixed_track_vars(l2: &Level2Data, options: &FixedSnowOptions) -> SnowParameters {
        let n_records = l2.n_records();
        SnowParameters {
            depth: TrackArray::from_elem(n_records, options.fixed_snow_depth),
            density: TrackArray::from_elem(n_records, options.fixed_snow_density),
            depth_uncertainty: TrackArray::from_elem(
                n_records,
                options.fixed_snow_depth_uncertainty,
            ),
            density_uncertainty: TrackArray::from_elem(
                n_records,
                options.fixed_snow_density_uncertainty,
            ),
        }
    }

    /// Request/refresh the cached dataset for the orbit's period
    ///
    /// Returns None (after recording a diagnostic on a fresh failure) when
    /// no dataset is available and the caller must degrade.
    fn ensure_dataset<'cache>(
        &mut self,
        l2: &Level2Data,
        cache: &'cache mut AuxdataCache,
        source: &mut dyn GriddedDatasetSource,
    ) -> FloeResult<Option<&'cache super::GriddedDataset>> {
        cache.request(l2.period_key()?);
        if let Err(error) = cache.ensure_loaded(source) {
            let message = format!("{}: {}", self.def.name(), error);
            log::warn!("{}", message);
            self.diagnostics
                .push(Diagnostic::new(DiagnosticKind::MissingExternalData, message));
            return Ok(None);
        }
        if !cache.has_data() {
            // Load failure remembered from an earlier orbit of this period
            log::debug!(
                "{}: no dataset for period, returning dummy parameters",
                self.def.name()
            );
            return Ok(None);
        }
        Ok(cache.data())
    }
}
