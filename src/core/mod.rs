//! Core retrieval algorithms

pub mod classifier;
pub mod corrections;
pub mod flag;
pub mod grid;
pub mod smooth;
pub mod surface_type;
pub mod warren;

// Re-export main types
pub use classifier::SurfaceTypeClassifierDef;
pub use corrections::{CorrectionCascade, SmoothingOptions};
pub use flag::AndCondition;
pub use grid::{GridDefinition, GridDimension, GridTrackInterpolator, StereoProjection};
pub use smooth::{boxcar_smooth_nan, smoothing_window};
pub use surface_type::{ClassifierParameterSet, SurfaceClass, SurfaceType};
pub use warren::Warren99;
