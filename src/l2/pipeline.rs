//! Level-2 orbit processing loop
//!
//! One processor instance drives one run: an ordered list of input granules
//! is processed strictly sequentially, each through the fixed stage
//! sequence read -> ROI trim -> range corrections -> surface type
//! classification -> retracking -> sea surface referencing -> quality
//! filter -> snow post-processing -> outputs -> orbit accumulation.
//!
//! The mission-specific stages (reading, retracking, referencing, quality
//! filtering, output writing) are external collaborators behind traits;
//! this crate supplies the sequencing, the classification and the auxiliary
//! snow stages. The auxiliary dataset cache is owned here at run level and
//! shared across all granules.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::auxdata::{AuxdataCache, Diagnostic, GriddedDatasetSource, SnowHandler, SnowSourceDef};
use crate::core::classifier::SurfaceTypeClassifierDef;
use crate::core::flag::where_true;
use crate::l2::data::{Level1bData, Level2Data, RegionOfInterest};
use crate::types::{FloeError, FloeResult};

/// Reader seam to the mission-specific Level-1 adapter
pub trait L1bSource {
    fn read(&mut self, granule: &Path) -> FloeResult<Level1bData>;
}

/// Geophysical range corrections (ionosphere, tides, ...); out of scope
pub trait RangeCorrection {
    fn apply(&mut self, l1b: &mut Level1bData) -> anyhow::Result<()>;
}

/// Waveform retracker producing surface elevations; out of scope
pub trait Retracker {
    fn retrack(&mut self, l1b: &Level1bData, l2: &mut Level2Data) -> anyhow::Result<()>;
}

/// Sea surface height referencing (elevations -> radar freeboard); out of scope
pub trait SeaSurfaceReference {
    fn apply(&mut self, l2: &mut Level2Data) -> anyhow::Result<()>;
}

/// Data quality filter on the Level-2 product; out of scope
pub trait QualityFilter {
    fn apply(&mut self, l2: &mut Level2Data) -> anyhow::Result<()>;
}

/// Per-orbit product writer; out of scope
pub trait OutputWriter {
    fn write(&mut self, l2: &Level2Data) -> anyhow::Result<()>;
}

/// No-op stand-in for every out-of-scope stage
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpStage;

impl RangeCorrection for NoOpStage {
    fn apply(&mut self, _l1b: &mut Level1bData) -> anyhow::Result<()> {
        Ok(())
    }
}

impl Retracker for NoOpStage {
    fn retrack(&mut self, _l1b: &Level1bData, _l2: &mut Level2Data) -> anyhow::Result<()> {
        Ok(())
    }
}

impl SeaSurfaceReference for NoOpStage {
    fn apply(&mut self, _l2: &mut Level2Data) -> anyhow::Result<()> {
        Ok(())
    }
}

impl QualityFilter for NoOpStage {
    fn apply(&mut self, _l2: &mut Level2Data) -> anyhow::Result<()> {
        Ok(())
    }
}

impl OutputWriter for NoOpStage {
    fn write(&mut self, _l2: &Level2Data) -> anyhow::Result<()> {
        Ok(())
    }
}

fn default_raise_on_error() -> bool {
    true
}

/// Typed job configuration, constructed and validated once before the run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level2JobConfig {
    pub roi: RegionOfInterest,
    pub surface_type: SurfaceTypeClassifierDef,
    pub snow: SnowSourceDef,
    /// Abort the run on the first stage failure (default); otherwise the
    /// failing granule is skipped and processing continues
    #[serde(default = "default_raise_on_error")]
    pub raise_on_error: bool,
}

impl Level2JobConfig {
    /// Reject invalid option combinations before any orbit is processed
    pub fn validate(&self) -> FloeResult<()> {
        if let SnowSourceDef::Warren99(options) = &self.snow {
            let (valid_min, valid_max) = options.valid_snow_depth_range;
            if valid_min >= valid_max {
                return Err(FloeError::InvalidConfig(format!(
                    "valid_snow_depth_range [{}, {}] is not ascending",
                    valid_min, valid_max
                )));
            }
            if options.smooth_snow_depth && options.smooth_filter_width_m <= 0.0 {
                return Err(FloeError::InvalidConfig(
                    "smooth_filter_width_m must be positive".to_string(),
                ));
            }
        }
        if let SnowSourceDef::SouthernClimatology(options) = &self.snow {
            if options.smooth_snow_depth && options.smooth_filter_width_m <= 0.0 {
                return Err(FloeError::InvalidConfig(
                    "smooth_filter_width_m must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Counters of one processing run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub skipped_roi: usize,
    pub skipped_error: usize,
}

/// Orbit-wise Level-2 processor
pub struct Level2Processor {
    job: Level2JobConfig,
    snow_handler: SnowHandler,
    aux_cache: AuxdataCache,
    orbits: Vec<Level2Data>,
    range_correction: Box<dyn RangeCorrection>,
    retracker: Box<dyn Retracker>,
    sea_surface: Box<dyn SeaSurfaceReference>,
    quality_filter: Box<dyn QualityFilter>,
    output_writer: Box<dyn OutputWriter>,
}

impl Level2Processor {
    /// Create a processor with no-op collaborator stages
    pub fn new(job: Level2JobConfig) -> FloeResult<Self> {
        job.validate()?;
        let snow_handler = SnowHandler::new(job.snow.clone());
        Ok(Self {
            job,
            snow_handler,
            aux_cache: AuxdataCache::new(),
            orbits: Vec::new(),
            range_correction: Box::new(NoOpStage),
            retracker: Box::new(NoOpStage),
            sea_surface: Box::new(NoOpStage),
            quality_filter: Box::new(NoOpStage),
            output_writer: Box::new(NoOpStage),
        })
    }

    pub fn with_range_correction(mut self, stage: Box<dyn RangeCorrection>) -> Self {
        self.range_correction = stage;
        self
    }

    pub fn with_retracker(mut self, stage: Box<dyn Retracker>) -> Self {
        self.retracker = stage;
        self
    }

    pub fn with_sea_surface_reference(mut self, stage: Box<dyn SeaSurfaceReference>) -> Self {
        self.sea_surface = stage;
        self
    }

    pub fn with_quality_filter(mut self, stage: Box<dyn QualityFilter>) -> Self {
        self.quality_filter = stage;
        self
    }

    pub fn with_output_writer(mut self, stage: Box<dyn OutputWriter>) -> Self {
        self.output_writer = stage;
        self
    }

    /// Orbit collection accumulated over the run
    pub fn orbits(&self) -> &[Level2Data] {
        &self.orbits
    }

    /// Snow handler diagnostics accumulated over the run
    pub fn snow_diagnostics(&self) -> &[Diagnostic] {
        self.snow_handler.diagnostics()
    }

    /// Clear the orbit collection between runs
    pub fn purge(&mut self) {
        self.orbits.clear();
    }

    /// Process the given granules in order (callers pass them sorted
    /// chronologically)
    pub fn run(
        &mut self,
        l1b_source: &mut dyn L1bSource,
        aux_source: &mut dyn GriddedDatasetSource,
        granules: &[PathBuf],
    ) -> FloeResult<RunSummary> {
        log::info!(
            "Level-2 run: {} granules, classifier '{}', snow source '{}'",
            granules.len(),
            self.job.surface_type.name(),
            self.job.snow.name()
        );
        let mut summary = RunSummary::default();
        for granule in granules {
            match self.process_granule(l1b_source, aux_source, granule) {
                Ok(Some(l2)) => {
                    summary.processed += 1;
                    self.orbits.push(l2);
                }
                Ok(None) => {
                    summary.skipped_roi += 1;
                }
                Err(error) => {
                    if self.job.raise_on_error {
                        return Err(error);
                    }
                    log::error!(
                        "Skipping granule {}: {}",
                        granule.display(),
                        error
                    );
                    summary.skipped_error += 1;
                }
            }
        }
        log::info!(
            "Level-2 run complete: {} processed, {} outside ROI, {} failed",
            summary.processed,
            summary.skipped_roi,
            summary.skipped_error
        );
        Ok(summary)
    }

    /// One granule through the stage sequence; None if no records remain
    /// in the region of interest
    fn process_granule(
        &mut self,
        l1b_source: &mut dyn L1bSource,
        aux_source: &mut dyn GriddedDatasetSource,
        granule: &Path,
    ) -> FloeResult<Option<Level2Data>> {
        let l1b = l1b_source.read(granule)?;
        log::debug!(
            "Read granule {} ({} records)",
            l1b.granule,
            l1b.n_records()
        );

        let in_roi = where_true(&self.job.roi.track_mask(&l1b.track));
        if in_roi.is_empty() {
            log::info!("Granule {} has no records in the region of interest", l1b.granule);
            return Ok(None);
        }
        let mut l1b = if in_roi.len() == l1b.n_records() {
            l1b
        } else {
            l1b.select(&in_roi)
        };

        self.range_correction
            .apply(&mut l1b)
            .map_err(|reason| FloeError::Stage {
                stage: "range_corrections",
                reason,
            })?;

        let mut l2 = Level2Data::from_l1b(&l1b);
        l2.surface_type = self
            .job
            .surface_type
            .classify(&l1b.classifier_parameters, &l1b.land_mask)?;

        self.retracker
            .retrack(&l1b, &mut l2)
            .map_err(|reason| FloeError::Stage {
                stage: "retracker",
                reason,
            })?;

        self.sea_surface
            .apply(&mut l2)
            .map_err(|reason| FloeError::Stage {
                stage: "sea_surface_reference",
                reason,
            })?;

        self.quality_filter
            .apply(&mut l2)
            .map_err(|reason| FloeError::Stage {
                stage: "quality_filter",
                reason,
            })?;

        let snow = self
            .snow_handler
            .get_l2_track_vars(&l2, &mut self.aux_cache, aux_source)?;
        l2.snow = Some(snow);

        self.output_writer
            .write(&l2)
            .map_err(|reason| FloeError::Stage {
                stage: "output_writer",
                reason,
            })?;

        Ok(Some(l2))
    }
}
