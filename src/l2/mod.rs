//! Level-2 data containers and the orbit processing loop

pub mod data;
pub mod pipeline;

pub use data::{Level1bData, Level2Data, RegionOfInterest, TrackData};
pub use pipeline::{
    L1bSource, Level2JobConfig, Level2Processor, NoOpStage, OutputWriter, QualityFilter,
    RangeCorrection, Retracker, RunSummary, SeaSurfaceReference,
};
