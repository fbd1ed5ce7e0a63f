//! floe: A Fast, Modular Sea-Ice Radar Altimetry Retrieval Processor
//!
//! This library turns per-orbit Level-1 radar altimeter measurements into
//! sea-ice surface type classification and snow loading estimates for
//! freeboard and thickness retrieval. Mission-specific readers, retrackers
//! and writers plug in behind traits; the crate provides the rule-based
//! surface type classification, the auxiliary snow climatology handling
//! with track interpolation and uncertainty propagation, and the per-orbit
//! processing loop.

pub mod auxdata;
pub mod core;
pub mod l2;
pub mod types;

// Re-export main types and functions for easier access
pub use crate::types::{
    FlagMask, FloeError, FloeResult, GridArray, Hemisphere, IceTypeFraction, SnowParameters,
    TrackArray,
};

pub use crate::core::{
    AndCondition, ClassifierParameterSet, CorrectionCascade, GridDefinition,
    GridTrackInterpolator, StereoProjection, SurfaceClass, SurfaceType, SurfaceTypeClassifierDef,
    Warren99,
};

pub use crate::auxdata::{
    AuxdataCache, GriddedDataset, GriddedDatasetSource, SnowHandler, SnowSourceDef,
};

pub use crate::l2::{Level1bData, Level2Data, Level2Processor, RegionOfInterest};
