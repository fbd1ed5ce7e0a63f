//! Track-to-grid coordinate mapping for auxiliary datasets
//!
//! Auxiliary fields come on hemisphere-specific polar stereographic grids.
//! Track positions and grid nodes are projected into the grid's planar
//! system once per (track, grid) pair; sampling any number of variables from
//! the same grid then reuses the derived nearest-cell indices. Track points
//! outside the grid coverage sample as NaN, never as an out-of-bounds access.

use serde::{Deserialize, Serialize};

use crate::types::{FloeError, FloeResult, GridArray, TrackArray};

/// WGS84 semi-major axis (m)
pub const WGS84_SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
/// WGS84 semi-minor axis (m)
pub const WGS84_SEMI_MINOR_AXIS: f64 = 6_356_752.314_245;

fn wgs84_semi_major_axis() -> f64 {
    WGS84_SEMI_MAJOR_AXIS
}

fn wgs84_semi_minor_axis() -> f64 {
    WGS84_SEMI_MINOR_AXIS
}

/// Polar stereographic projection definition
///
/// Matches the parameter set auxiliary grids are distributed with: pole
/// (`lat_0` = +90 or -90), central meridian `lon_0`, true-scale latitude
/// `lat_ts` and the ellipsoid axes (WGS84 unless the grid states otherwise,
/// e.g. the Hughes ellipsoid of the polar stereographic 25 km grids).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StereoProjection {
    pub lat_0: f64,
    pub lon_0: f64,
    pub lat_ts: f64,
    #[serde(default = "wgs84_semi_major_axis")]
    pub a: f64,
    #[serde(default = "wgs84_semi_minor_axis")]
    pub b: f64,
}

impl StereoProjection {
    pub fn north(lon_0: f64, lat_ts: f64) -> Self {
        Self {
            lat_0: 90.0,
            lon_0,
            lat_ts,
            a: WGS84_SEMI_MAJOR_AXIS,
            b: WGS84_SEMI_MINOR_AXIS,
        }
    }

    pub fn south(lon_0: f64, lat_ts: f64) -> Self {
        Self {
            lat_0: -90.0,
            lon_0,
            lat_ts,
            a: WGS84_SEMI_MAJOR_AXIS,
            b: WGS84_SEMI_MINOR_AXIS,
        }
    }

    fn eccentricity(&self) -> f64 {
        (1.0 - (self.b / self.a).powi(2)).sqrt()
    }

    // Isometric colatitude function t (Snyder eq. 15-9)
    fn t(&self, lat_rad: f64) -> f64 {
        let e = self.eccentricity();
        let sin_lat = lat_rad.sin();
        (std::f64::consts::FRAC_PI_4 - lat_rad / 2.0).tan()
            / ((1.0 - e * sin_lat) / (1.0 + e * sin_lat)).powf(e / 2.0)
    }

    // Meridional scale factor m (Snyder eq. 14-15)
    fn m(&self, lat_rad: f64) -> f64 {
        let e = self.eccentricity();
        lat_rad.cos() / (1.0 - (e * lat_rad.sin()).powi(2)).sqrt()
    }

    /// Forward projection of geographic coordinates (degrees) to planar
    /// x/y (meters)
    ///
    /// Snyder's ellipsoidal polar stereographic equations; the south polar
    /// aspect is evaluated through the standard sign reversal.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let south = self.lat_0 < 0.0;
        let lat = if south { -lat_deg } else { lat_deg }.to_radians();
        let lat_ts = self.lat_ts.abs().to_radians();
        let delta_lon = (lon_deg - self.lon_0).to_radians();

        let t = self.t(lat);
        let rho = if (self.lat_ts.abs() - 90.0).abs() < 1e-12 {
            let e = self.eccentricity();
            2.0 * self.a * t / ((1.0 + e).powf(1.0 + e) * (1.0 - e).powf(1.0 - e)).sqrt()
        } else {
            self.a * self.m(lat_ts) * t / self.t(lat_ts)
        };

        let x = rho * delta_lon.sin();
        let y = if south {
            rho * delta_lon.cos()
        } else {
            -rho * delta_lon.cos()
        };
        (x, y)
    }

    /// Forward projection of coordinate arrays
    pub fn forward_track(&self, lons: &TrackArray, lats: &TrackArray) -> (TrackArray, TrackArray) {
        let mut x = TrackArray::zeros(lons.len());
        let mut y = TrackArray::zeros(lons.len());
        for i in 0..lons.len() {
            let (xi, yi) = self.forward(lons[i], lats[i]);
            x[i] = xi;
            y[i] = yi;
        }
        (x, y)
    }
}

/// Grid shape and cell resolution (meters)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GridDimension {
    pub n_cols: usize,
    pub n_lines: usize,
    pub dx: f64,
    pub dy: f64,
}

/// Hemisphere-specific grid definition for an auxiliary dataset
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GridDefinition {
    pub projection: StereoProjection,
    pub dimension: GridDimension,
}

/// Nearest-cell sampler from a grid onto a satellite track
///
/// Cell indices are derived once at construction and reused for every
/// `sample` call against the same grid.
#[derive(Debug)]
pub struct GridTrackInterpolator {
    cell_indices: Vec<Option<(usize, usize)>>,
    n_lines: usize,
    n_cols: usize,
}

impl GridTrackInterpolator {
    pub fn new(
        track_lon: &TrackArray,
        track_lat: &TrackArray,
        grid_lon: &GridArray,
        grid_lat: &GridArray,
        griddef: &GridDefinition,
    ) -> FloeResult<Self> {
        if track_lon.len() != track_lat.len() {
            return Err(FloeError::InvalidRecordCount {
                expected: track_lon.len(),
                actual: track_lat.len(),
            });
        }
        let shape = (griddef.dimension.n_lines, griddef.dimension.n_cols);
        if grid_lon.dim() != shape || grid_lat.dim() != shape {
            return Err(FloeError::InvalidConfig(format!(
                "grid coordinate shape {:?} does not match grid definition {:?}",
                grid_lon.dim(),
                shape
            )));
        }

        // Project the grid nodes to find the planar grid origin
        let projection = &griddef.projection;
        let mut x_min = f64::INFINITY;
        let mut y_min = f64::INFINITY;
        for (lon, lat) in grid_lon.iter().zip(grid_lat.iter()) {
            let (x, y) = projection.forward(*lon, *lat);
            if x.is_finite() && x < x_min {
                x_min = x;
            }
            if y.is_finite() && y < y_min {
                y_min = y;
            }
        }
        if !x_min.is_finite() || !y_min.is_finite() {
            return Err(FloeError::InvalidConfig(
                "grid coordinates contain no finite positions".to_string(),
            ));
        }

        let (dx, dy) = (griddef.dimension.dx, griddef.dimension.dy);
        let cell_indices = track_lon
            .iter()
            .zip(track_lat.iter())
            .map(|(&lon, &lat)| {
                let (x, y) = projection.forward(lon, lat);
                let col = ((x - x_min) / dx).round();
                let row = ((y - y_min) / dy).round();
                if !col.is_finite() || !row.is_finite() {
                    return None;
                }
                if col < 0.0
                    || row < 0.0
                    || col as usize >= griddef.dimension.n_cols
                    || row as usize >= griddef.dimension.n_lines
                {
                    return None;
                }
                Some((row as usize, col as usize))
            })
            .collect::<Vec<_>>();

        let n_outside = cell_indices.iter().filter(|c| c.is_none()).count();
        if n_outside > 0 {
            log::debug!(
                "Grid track mapping: {} of {} track points outside grid coverage",
                n_outside,
                cell_indices.len()
            );
        }

        Ok(Self {
            cell_indices,
            n_lines: griddef.dimension.n_lines,
            n_cols: griddef.dimension.n_cols,
        })
    }

    pub fn n_records(&self) -> usize {
        self.cell_indices.len()
    }

    /// Sample a grid variable at the track's nearest cells
    ///
    /// `flip_rows` reverses the row order first, for source grids whose row
    /// convention is inverted relative to the projection orientation.
    /// Out-of-coverage track points yield NaN.
    pub fn sample(&self, grid_variable: &GridArray, flip_rows: bool) -> FloeResult<TrackArray> {
        if grid_variable.dim() != (self.n_lines, self.n_cols) {
            return Err(FloeError::InvalidConfig(format!(
                "grid variable shape {:?} does not match grid {:?}",
                grid_variable.dim(),
                (self.n_lines, self.n_cols)
            )));
        }
        let values = self
            .cell_indices
            .iter()
            .map(|cell| match cell {
                Some((row, col)) => {
                    let row = if flip_rows { self.n_lines - 1 - row } else { *row };
                    grid_variable[(row, *col)]
                }
                None => f64::NAN,
            })
            .collect();
        Ok(values)
    }
}
