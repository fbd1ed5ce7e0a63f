use approx::assert_abs_diff_eq;
use floe::{GridArray, GridTrackInterpolator, StereoProjection};
use floe::core::grid::{GridDefinition, GridDimension};
use ndarray::array;

const SPHERE_RADIUS: f64 = 6_371_000.0;

/// Polar cap test grid: all nodes at (0E, 80N) on a sphere with true scale
/// at the pole, so the planar grid origin is exactly (0, -rho(80))
fn north_test_grid() -> (GridArray, GridArray, GridDefinition) {
    let n = 60;
    let grid_lon = GridArray::from_elem((n, n), 0.0);
    let grid_lat = GridArray::from_elem((n, n), 80.0);
    let griddef = GridDefinition {
        projection: StereoProjection {
            lat_0: 90.0,
            lon_0: 0.0,
            lat_ts: 90.0,
            a: SPHERE_RADIUS,
            b: SPHERE_RADIUS,
        },
        dimension: GridDimension {
            n_cols: n,
            n_lines: n,
            dx: 25_000.0,
            dy: 25_000.0,
        },
    };
    (grid_lon, grid_lat, griddef)
}

#[test]
fn test_constant_grid_samples_constant() {
    let (grid_lon, grid_lat, griddef) = north_test_grid();
    let track_lon = array![0.0, 90.0, 0.0];
    let track_lat = array![80.0, 85.0, 90.0];

    let grid2track =
        GridTrackInterpolator::new(&track_lon, &track_lat, &grid_lon, &grid_lat, &griddef)
            .unwrap();
    let variable = GridArray::from_elem((60, 60), 0.31);
    let sampled = grid2track.sample(&variable, false).unwrap();

    assert_eq!(sampled.len(), 3);
    for value in sampled.iter() {
        assert_abs_diff_eq!(*value, 0.31, epsilon = 1e-12);
    }
}

#[test]
fn test_out_of_coverage_samples_nan() {
    let (grid_lon, grid_lat, griddef) = north_test_grid();
    // Negative x relative to the grid origin: nearest cell is off-grid
    let track_lon = array![-90.0, 0.0];
    let track_lat = array![85.0, 90.0];

    let grid2track =
        GridTrackInterpolator::new(&track_lon, &track_lat, &grid_lon, &grid_lat, &griddef)
            .unwrap();
    let variable = GridArray::from_elem((60, 60), 1.0);
    let sampled = grid2track.sample(&variable, false).unwrap();

    assert!(sampled[0].is_nan());
    assert_abs_diff_eq!(sampled[1], 1.0, epsilon = 1e-12);
}

#[test]
fn test_flip_rows_reverses_row_convention() {
    let (grid_lon, grid_lat, griddef) = north_test_grid();
    // The pole maps to row rho(80)/dy = 45, column 0
    let track_lon = array![0.0];
    let track_lat = array![90.0];

    let grid2track =
        GridTrackInterpolator::new(&track_lon, &track_lat, &grid_lon, &grid_lat, &griddef)
            .unwrap();

    let mut variable = GridArray::from_elem((60, 60), 0.0);
    variable[(45, 0)] = 1.0;
    variable[(60 - 1 - 45, 0)] = 2.0;

    let upright = grid2track.sample(&variable, false).unwrap();
    let flipped = grid2track.sample(&variable, true).unwrap();
    assert_abs_diff_eq!(upright[0], 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(flipped[0], 2.0, epsilon = 1e-12);
}

#[test]
fn test_variable_shape_mismatch_is_rejected() {
    let (grid_lon, grid_lat, griddef) = north_test_grid();
    let grid2track = GridTrackInterpolator::new(
        &array![0.0],
        &array![85.0],
        &grid_lon,
        &grid_lat,
        &griddef,
    )
    .unwrap();
    let variable = GridArray::from_elem((10, 10), 1.0);
    assert!(grid2track.sample(&variable, false).is_err());
}
