//! Shared snow parameter correction cascade
//!
//! Every auxiliary snow source runs the same correction sequence after
//! evaluation or grid sampling, in this fixed order:
//!
//! 1. range validation (out-of-band depth invalidates all four parameters)
//! 2. ice-type-fraction scaling of depth and depth uncertainty
//! 3. addition of the scaling uncertainty term
//! 4. optional along-track boxcar smoothing
//!
//! Variants differ only in which steps they enable and whether a spatial
//! blend weight suppresses the scaling over regions dominated by an
//! alternate data source.

use crate::core::flag::where_true;
use crate::core::smooth::{boxcar_smooth_nan, smoothing_window};
use crate::types::{FloeError, FloeResult, IceTypeFraction, SnowParameters, TrackArray};

/// Along-track smoothing step configuration
#[derive(Debug, Clone, Copy)]
pub struct SmoothingOptions {
    /// Physical filter width (m), converted to an odd record window via the
    /// orbit's footprint spacing
    pub filter_width_m: f64,
    /// Also smooth the depth uncertainty (daily observational climatologies
    /// carry per-record uncertainty worth smoothing; the Warren fit does not)
    pub smooth_uncertainty: bool,
}

/// Correction cascade applied to freshly evaluated snow parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrectionCascade {
    pub valid_depth_range: Option<(f64, f64)>,
    pub fyi_correction_factor: Option<f64>,
    pub smoothing: Option<SmoothingOptions>,
}

impl CorrectionCascade {
    /// Apply the enabled correction steps in cascade order
    ///
    /// `blend_weight` (0..1 per record) scales the ice-type correction in
    /// merged-climatology variants; `None` means full weight everywhere.
    pub fn apply(
        &self,
        snow: &mut SnowParameters,
        sea_ice_type: &IceTypeFraction,
        blend_weight: Option<&TrackArray>,
        footprint_spacing_m: f64,
    ) -> FloeResult<()> {
        snow.validate()?;
        let n_records = snow.n_records();
        if sea_ice_type.n_records() != n_records {
            return Err(FloeError::InvalidRecordCount {
                expected: n_records,
                actual: sea_ice_type.n_records(),
            });
        }
        if let Some(weight) = blend_weight {
            if weight.len() != n_records {
                return Err(FloeError::InvalidRecordCount {
                    expected: n_records,
                    actual: weight.len(),
                });
            }
        }

        if let Some((valid_min, valid_max)) = self.valid_depth_range {
            let invalid = snow
                .depth
                .mapv(|depth| depth < valid_min || depth > valid_max);
            let invalid_records = where_true(&invalid);
            if !invalid_records.is_empty() {
                log::debug!(
                    "Snow depth range validation: {} records outside [{}, {}]",
                    invalid_records.len(),
                    valid_min,
                    valid_max
                );
            }
            snow.set_invalid(&invalid_records);
        }

        if let Some(correction_factor) = self.fyi_correction_factor {
            self.apply_ice_type_scaling(snow, sea_ice_type, blend_weight, correction_factor);
        }

        if let Some(smoothing) = &self.smoothing {
            let window = smoothing_window(smoothing.filter_width_m, footprint_spacing_m);
            log::debug!(
                "Smoothing snow depth: width {} m -> {} records",
                smoothing.filter_width_m,
                window
            );
            snow.depth = boxcar_smooth_nan(&snow.depth, window);
            if smoothing.smooth_uncertainty {
                snow.depth_uncertainty = boxcar_smooth_nan(&snow.depth_uncertainty, window);
            }
        }

        Ok(())
    }

    /// First-year ice carries less snow than the climatology assumes: scale
    /// depth down by the first-year fraction times the correction constant
    fn apply_ice_type_scaling(
        &self,
        snow: &mut SnowParameters,
        sea_ice_type: &IceTypeFraction,
        blend_weight: Option<&TrackArray>,
        correction_factor: f64,
    ) {
        let weight_at = |i: usize| blend_weight.map_or(1.0, |weight| weight[i]);

        let scale_factor: TrackArray = sea_ice_type
            .fraction
            .iter()
            .enumerate()
            .map(|(i, &fraction)| (1.0 - fraction) * correction_factor * weight_at(i))
            .collect();

        // The scaling factor affects the snow depth and, under the
        // assumption of proportional error, the depth uncertainty
        ndarray::Zip::from(&mut snow.depth)
            .and(&scale_factor)
            .for_each(|depth, &scale| *depth -= scale * *depth);
        ndarray::Zip::from(&mut snow.depth_uncertainty)
            .and(&scale_factor)
            .for_each(|uncertainty, &scale| *uncertainty -= scale * *uncertainty);

        // The ice type fraction itself is uncertain: acknowledge it with an
        // additional term from the scaled depth and the fraction uncertainty
        for i in 0..snow.depth.len() {
            let scaling_uncertainty =
                snow.depth[i] * scale_factor[i] * sea_ice_type.uncertainty[i] * weight_at(i);
            snow.depth_uncertainty[i] += scaling_uncertainty;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn snow() -> SnowParameters {
        SnowParameters {
            depth: array![0.2, 0.3, 0.4],
            density: array![300.0, 310.0, 320.0],
            depth_uncertainty: array![0.05, 0.05, 0.05],
            density_uncertainty: array![50.0, 50.0, 50.0],
        }
    }

    fn sea_ice_type(fraction: f64) -> IceTypeFraction {
        IceTypeFraction::new(
            array![fraction, fraction, fraction],
            array![0.1, 0.1, 0.1],
        )
        .unwrap()
    }

    #[test]
    fn test_multi_year_ice_is_unscaled() {
        // fraction = 1 means pure multi-year ice: scale factor 0
        let cascade = CorrectionCascade {
            fyi_correction_factor: Some(0.5),
            ..Default::default()
        };
        let mut snow = snow();
        cascade
            .apply(&mut snow, &sea_ice_type(1.0), None, 300.0)
            .unwrap();
        assert_abs_diff_eq!(snow.depth[0], 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(snow.depth_uncertainty[0], 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_first_year_ice_scaling() {
        // fraction = 0: scale factor equals the raw correction constant
        let cascade = CorrectionCascade {
            fyi_correction_factor: Some(0.5),
            ..Default::default()
        };
        let mut snow = snow();
        cascade
            .apply(&mut snow, &sea_ice_type(0.0), None, 300.0)
            .unwrap();
        assert_abs_diff_eq!(snow.depth[0], 0.1, epsilon = 1e-12);
        // uncertainty: 0.05*0.5 = 0.025, plus 0.1*0.5*0.1 = 0.005
        assert_abs_diff_eq!(snow.depth_uncertainty[0], 0.030, epsilon = 1e-12);
    }

    #[test]
    fn test_blend_weight_suppresses_scaling() {
        let cascade = CorrectionCascade {
            fyi_correction_factor: Some(0.5),
            ..Default::default()
        };
        let mut snow = snow();
        let weight = array![0.0, 0.0, 0.0];
        cascade
            .apply(&mut snow, &sea_ice_type(0.0), Some(&weight), 300.0)
            .unwrap();
        assert_abs_diff_eq!(snow.depth[0], 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(snow.depth_uncertainty[0], 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_range_validation_invalidates_all_parameters() {
        let cascade = CorrectionCascade {
            valid_depth_range: Some((0.0, 0.35)),
            ..Default::default()
        };
        let mut snow = snow();
        cascade
            .apply(&mut snow, &sea_ice_type(1.0), None, 300.0)
            .unwrap();
        assert!(snow.depth[2].is_nan());
        assert!(snow.density[2].is_nan());
        assert!(snow.depth_uncertainty[2].is_nan());
        assert!(snow.density_uncertainty[2].is_nan());
        assert_abs_diff_eq!(snow.depth[0], 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_record_count_mismatch_is_fatal() {
        let cascade = CorrectionCascade::default();
        let mut snow = snow();
        let sea_ice_type =
            IceTypeFraction::new(array![1.0, 1.0], array![0.1, 0.1]).unwrap();
        let result = cascade.apply(&mut snow, &sea_ice_type, None, 300.0);
        assert!(matches!(
            result,
            Err(FloeError::InvalidRecordCount { .. })
        ));
    }
}
