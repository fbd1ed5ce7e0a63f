//! Warren et al. (1999) Arctic snow climatology
//!
//! Closed-form monthly climatology of snow depth and snow water equivalent
//! on Arctic sea ice. Each month carries six fit coefficients of a bivariate
//! quadratic in stereographic coordinates (degrees of arc), plus the fit RMS
//! error and the interannual variability used for the uncertainty model.
//!
//! Warren, S. G., et al.: Snow depth on Arctic sea ice,
//! J. Climate, 12, 1814-1829, 1999.

use crate::core::grid::StereoProjection;
use crate::types::{FloeError, FloeResult, SnowParameters, TrackArray};

/// Mean Earth radius used to rescale projected meters to degrees of arc (m)
const EARTH_RADIUS: f64 = 6_371_000.8;

/// Water density for snow water equivalent conversion (kg/m^3)
const WATER_DENSITY: f64 = 1024.0;

// Monthly fit coefficients, one row per month (January first).
// Columns: H0, A, B, C, D, E (fit), epsilon (rms fit error), F (trend),
// sigma (rms residual), IAV (interannual variability). Units: cm.
#[rustfmt::skip]
const SNOW_DEPTH_COEFS: [[f64; 10]; 12] = [
    [28.01,  0.1270, -1.1833, -0.1164, -0.0051,  0.0243,  7.6, -0.06, 0.07, 4.6],
    [30.28,  0.1056, -0.5908, -0.0263, -0.0049,  0.0044,  7.9, -0.06, 0.08, 5.5],
    [33.89,  0.5486, -0.1996,  0.0280,  0.0216, -0.0176,  9.4, -0.04, 0.10, 6.2],
    [36.80,  0.4046, -0.4005,  0.0256,  0.0024, -0.0641,  9.4, -0.09, 0.09, 6.1],
    [36.93,  0.0214, -1.1795, -0.1076, -0.0244, -0.0142, 10.6, -0.21, 0.09, 6.3],
    [36.59,  0.7021, -1.4819, -0.1195, -0.0009, -0.0603, 14.1, -0.16, 0.12, 8.1],
    [11.02,  0.3008, -1.2591, -0.0811, -0.0043, -0.0959,  9.5,  0.02, 0.10, 6.7],
    [ 4.64,  0.3100, -0.6350, -0.0655,  0.0059, -0.0005,  4.6, -0.01, 0.05, 3.3],
    [15.81,  0.2119, -1.0292, -0.0868, -0.0177, -0.0723,  7.8, -0.03, 0.06, 3.8],
    [22.66,  0.3594, -1.3483, -0.1063,  0.0051, -0.0577,  8.0, -0.08, 0.06, 4.0],
    [25.57,  0.1496, -1.4643, -0.1409, -0.0079, -0.0258,  7.9, -0.05, 0.07, 4.3],
    [26.67, -0.1876, -1.4229, -0.1413, -0.0316, -0.0029,  8.2, -0.06, 0.07, 4.8],
];

#[rustfmt::skip]
const SNOW_WATER_EQUIVALENT_COEFS: [[f64; 10]; 12] = [
    [ 8.37, -0.0270, -0.3400, -0.0319, -0.0056, -0.0005, 2.5, -0.005, 0.024, 1.6],
    [ 9.43,  0.0058, -0.1309,  0.0017, -0.0021, -0.0072, 2.6, -0.007, 0.028, 1.8],
    [10.74,  0.1618,  0.0276,  0.0213,  0.0076, -0.0125, 3.1,  0.007, 0.032, 2.1],
    [11.67,  0.0841, -0.1328,  0.0081, -0.0003, -0.0301, 3.2, -0.013, 0.032, 2.1],
    [11.80, -0.0043, -0.4284, -0.0380, -0.0071, -0.0063, 3.5, -0.047, 0.033, 2.2],
    [12.48,  0.2084, -0.5739, -0.0468, -0.0023, -0.0253, 4.9, -0.030, 0.044, 2.9],
    [ 4.01,  0.0970, -0.4930, -0.0333, -0.0026, -0.0343, 3.5,  0.008, 0.037, 2.4],
    [ 1.08,  0.0712, -0.1450, -0.0155,  0.0014, -0.0000, 1.1, -0.001, 0.012, 0.8],
    [ 3.84,  0.0393, -0.2107, -0.0182, -0.0053, -0.0190, 2.0, -0.003, 0.016, 1.0],
    [ 6.24,  0.1158, -0.2803, -0.0215,  0.0015, -0.0176, 2.3, -0.005, 0.021, 1.4],
    [ 7.54,  0.0567, -0.3201, -0.0284, -0.0032, -0.0129, 2.4, -0.000, 0.023, 1.5],
    [ 8.00, -0.0540, -0.3650, -0.0362, -0.0112, -0.0035, 2.5, -0.003, 0.024, 1.5],
];

/// Warren (1999) climatology evaluator
///
/// Defined for the northern hemisphere only; the hemisphere gate lives in
/// the snow handler so this evaluator never sees southern tracks.
#[derive(Debug, Clone)]
pub struct Warren99 {
    projection: StereoProjection,
}

impl Default for Warren99 {
    fn default() -> Self {
        Self::new()
    }
}

impl Warren99 {
    pub fn new() -> Self {
        // Native stereographic system of the climatology fit
        Self {
            projection: StereoProjection::north(-90.0, 70.0),
        }
    }

    /// Evaluate the climatology for track coordinates and a month (1-12)
    pub fn evaluate(
        &self,
        lons: &TrackArray,
        lats: &TrackArray,
        month: u32,
    ) -> FloeResult<SnowParameters> {
        if !(1..=12).contains(&month) {
            return Err(FloeError::InvalidConfig(format!(
                "month number {} outside 1-12",
                month
            )));
        }
        if lons.len() != lats.len() {
            return Err(FloeError::InvalidRecordCount {
                expected: lons.len(),
                actual: lats.len(),
            });
        }

        // Coordinates in the cartesian system of the climatology,
        // rescaled to degrees of arc
        let (mut x, mut y) = self.projection.forward_track(lons, lats);
        let arc_degree = EARTH_RADIUS * std::f64::consts::PI / 180.0;
        x.mapv_inplace(|v| v / arc_degree);
        y.mapv_inplace(|v| v / arc_degree);

        let depth = self.snow_depth(month, &x, &y);
        let density = self.snow_density(&depth, month, &x, &y);
        let (depth_uncertainty, density_uncertainty) = self.uncertainty(month, &depth);

        Ok(SnowParameters {
            depth,
            density,
            depth_uncertainty,
            density_uncertainty,
        })
    }

    fn fit(coefs: &[f64; 10], x: f64, y: f64) -> f64 {
        coefs[0]
            + coefs[1] * x
            + coefs[2] * y
            + coefs[3] * x * y
            + coefs[4] * x * x
            + coefs[5] * y * y
    }

    fn snow_depth(&self, month: u32, x: &TrackArray, y: &TrackArray) -> TrackArray {
        let coefs = &SNOW_DEPTH_COEFS[month as usize - 1];
        ndarray::Zip::from(x)
            .and(y)
            .map_collect(|&x, &y| Self::fit(coefs, x, y) * 0.01)
    }

    fn snow_density(
        &self,
        depth: &TrackArray,
        month: u32,
        x: &TrackArray,
        y: &TrackArray,
    ) -> TrackArray {
        let coefs = &SNOW_WATER_EQUIVALENT_COEFS[month as usize - 1];
        let mut density = ndarray::Zip::from(x)
            .and(y)
            .map_collect(|&x, &y| Self::fit(coefs, x, y) * 0.01);
        // Density follows from water equivalent and depth; a zero depth
        // propagates as inf/NaN (no guard, matching the reference output)
        ndarray::Zip::from(&mut density)
            .and(depth)
            .for_each(|swe, &depth| *swe = *swe / depth * WATER_DENSITY);
        density
    }

    /// Uncertainty model: snow depth as fit rms + interannual variability,
    /// snow density from the water equivalent errors scaled by local depth
    fn uncertainty(&self, month: u32, depth: &TrackArray) -> (TrackArray, TrackArray) {
        let sd_coefs = &SNOW_DEPTH_COEFS[month as usize - 1];
        let swe_coefs = &SNOW_WATER_EQUIVALENT_COEFS[month as usize - 1];

        let depth_uncertainty =
            TrackArray::from_elem(depth.len(), sd_coefs[6] * 0.01 + sd_coefs[9] * 0.01);

        let density_uncertainty = depth.mapv(|depth| {
            (swe_coefs[6] * 0.01) / depth * WATER_DENSITY
                + (swe_coefs[9] * 0.01) / depth * WATER_DENSITY
        });

        (depth_uncertainty, density_uncertainty)
    }
}
