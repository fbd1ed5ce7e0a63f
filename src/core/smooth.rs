//! Along-track smoothing helpers

use ndarray::Array1;
use num_traits::Float;

/// Convert a physical smoothing width (m) to an odd record-count window
///
/// The window is `floor(width / spacing) / 2 * 2 + 1`: always odd and never
/// below one record, so a width smaller than the footprint spacing degrades
/// to a no-op window.
pub fn smoothing_window(filter_width_m: f64, footprint_spacing_m: f64) -> usize {
    let n = (filter_width_m / footprint_spacing_m).floor() as i64;
    (n / 2 * 2 + 1).max(1) as usize
}

/// NaN-aware boxcar smoothing with edge truncation
///
/// Each record becomes the mean of the finite values inside the window
/// centered on it; the window shrinks symmetrically near the array edges.
/// Records whose window holds no finite value stay NaN.
pub fn boxcar_smooth_nan<T: Float>(x: &Array1<T>, window: usize) -> Array1<T> {
    let n = x.len();
    let half = window.saturating_sub(1) / 2;
    Array1::from_shape_fn(n, |i| {
        let half = half.min(i).min(n - 1 - i);
        let mut sum = T::zero();
        let mut count = 0usize;
        for value in x.slice(ndarray::s![i - half..=i + half]) {
            if value.is_finite() {
                sum = sum + *value;
                count += 1;
            }
        }
        if count > 0 {
            sum / T::from(count).unwrap()
        } else {
            T::nan()
        }
    })
}
