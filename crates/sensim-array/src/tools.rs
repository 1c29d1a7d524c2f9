//! Helpers for laying out sensors.

use ndarray::Array2;
use sensim_core::ConfigError;

/// A regular grid of `n_sens[0] × n_sens[1] × n_sens[2]` sensors.
///
/// Along each axis the sensors are evenly spaced strictly inside the
/// limits: `n` sensors split `[lo, hi]` into `n + 1` equal gaps. With one
/// sensor on an axis it sits at the midpoint. Rows are ordered with y
/// outermost, then x, then z.
///
/// # Errors
///
/// Returns `Err` if any count is zero or any limit is non-finite.
pub fn sensor_grid(
    n_sens: [usize; 3],
    x_lims: [f64; 2],
    y_lims: [f64; 2],
    z_lims: [f64; 2],
) -> Result<Array2<f64>, ConfigError> {
    if n_sens.contains(&0) {
        return Err(ConfigError::invalid(
            "n_sens",
            format!("every axis needs at least one sensor, got {n_sens:?}"),
        ));
    }
    let lims = [x_lims, y_lims, z_lims];
    if lims.iter().flatten().any(|v| !v.is_finite()) {
        return Err(ConfigError::invalid("lims", "limits must be finite"));
    }

    let axis = |n: usize, [lo, hi]: [f64; 2]| -> Vec<f64> {
        (1..=n)
            .map(|i| lo + (hi - lo) * i as f64 / (n + 1) as f64)
            .collect()
    };
    let xs = axis(n_sens[0], x_lims);
    let ys = axis(n_sens[1], y_lims);
    let zs = axis(n_sens[2], z_lims);

    let mut positions = Array2::zeros((xs.len() * ys.len() * zs.len(), 3));
    let mut row = 0;
    for &y in &ys {
        for &x in &xs {
            for &z in &zs {
                positions[[row, 0]] = x;
                positions[[row, 1]] = y;
                positions[[row, 2]] = z;
                row += 1;
            }
        }
    }
    Ok(positions)
}
