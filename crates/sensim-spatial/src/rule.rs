//! Quadrature rules on the canonical `[-1, 1]²` footprint.
//!
//! Offsets are fractions of the footprint's half-width and half-height in
//! the sensor's local x-y plane. Weights are expressed on the canonical
//! domain, whose area is 4: a rule integrates a constant exactly when its
//! weights sum to 4.

use ndarray::{array, Array1, Array2};
use sensim_core::{ConfigError, SpatialAverager};

const CANONICAL_AREA: f64 = 4.0;

/// Offset points and weights for integrating over a sensor footprint.
#[derive(Clone, Debug, PartialEq)]
pub struct QuadratureRule {
    /// Shape `(n_points, 2)`.
    offsets: Array2<f64>,
    /// Shape `(n_points,)`.
    weights: Array1<f64>,
}

impl QuadratureRule {
    /// The rule selected by `averager`.
    pub fn for_averager(averager: SpatialAverager) -> Self {
        match averager {
            SpatialAverager::Rect1 => Self::rect_1pt(),
            SpatialAverager::Rect4 => Self::rect_4pt(),
            SpatialAverager::Rect9 => Self::rect_9pt(),
            SpatialAverager::Gauss4 => Self::gauss_4pt(),
            SpatialAverager::Gauss9 => Self::gauss_9pt(),
        }
    }

    /// Single centre point carrying the whole domain. Equivalent to point
    /// sampling.
    pub fn rect_1pt() -> Self {
        Self {
            offsets: array![[0.0, 0.0]],
            weights: array![CANONICAL_AREA],
        }
    }

    /// Midpoints of the four quadrants.
    pub fn rect_4pt() -> Self {
        Self {
            offsets: array![[-0.5, -0.5], [-0.5, 0.5], [0.5, -0.5], [0.5, 0.5]],
            weights: Array1::from_elem(4, CANONICAL_AREA / 4.0),
        }
    }

    /// A 3×3 grid at `{-1/3, 0, 1/3}²`.
    pub fn rect_9pt() -> Self {
        let third = 1.0 / 3.0;
        let axis = [-third, 0.0, third];
        let mut offsets = Array2::zeros((9, 2));
        let mut k = 0;
        for &x in &axis {
            for &y in &axis {
                offsets[[k, 0]] = x;
                offsets[[k, 1]] = y;
                k += 1;
            }
        }
        Self {
            offsets,
            weights: Array1::from_elem(9, CANONICAL_AREA / 9.0),
        }
    }

    /// 2×2 Gauss-Legendre points at `±1/√3`, unit weights. Exact for
    /// fields that are bicubic or lower in the local coordinates.
    pub fn gauss_4pt() -> Self {
        let g = 1.0 / 3.0_f64.sqrt();
        Self {
            offsets: array![[-g, -g], [-g, g], [g, -g], [g, g]],
            weights: Array1::ones(4),
        }
    }

    /// 3×3 Gauss-Legendre points at `{0, ±√0.6}²`.
    ///
    /// Corners weigh 25/81, edge midpoints 40/81, the centre 64/81.
    pub fn gauss_9pt() -> Self {
        let g = 0.6_f64.sqrt();
        let offsets = array![
            [-g, -g],
            [-g, g],
            [g, -g],
            [g, g],
            [-g, 0.0],
            [0.0, -g],
            [0.0, g],
            [g, 0.0],
            [0.0, 0.0],
        ];
        let mut weights = Array1::zeros(9);
        weights.slice_mut(ndarray::s![0..4]).fill(25.0 / 81.0);
        weights.slice_mut(ndarray::s![4..8]).fill(40.0 / 81.0);
        weights[8] = 64.0 / 81.0;
        Self { offsets, weights }
    }

    /// A custom rule.
    ///
    /// # Errors
    ///
    /// Returns `Err` if:
    /// - `offsets` is not `(n, 2)` with `n > 0`
    /// - `weights` does not have one entry per offset
    /// - any value is non-finite, or the weights sum to zero or less
    pub fn custom(offsets: Array2<f64>, weights: Array1<f64>) -> Result<Self, ConfigError> {
        if offsets.nrows() == 0 || offsets.ncols() != 2 {
            return Err(ConfigError::invalid(
                "offsets",
                format!("must be (n, 2) with n > 0, got {:?}", offsets.shape()),
            ));
        }
        if weights.len() != offsets.nrows() {
            return Err(ConfigError::ShapeMismatch {
                context: "quadrature weights".to_string(),
                declared: vec![offsets.nrows()],
                supplied: vec![weights.len()],
            });
        }
        if offsets.iter().chain(weights.iter()).any(|v| !v.is_finite()) {
            return Err(ConfigError::invalid("offsets/weights", "must be finite"));
        }
        if weights.sum() <= 0.0 {
            return Err(ConfigError::invalid("weights", "must sum to a positive value"));
        }
        Ok(Self { offsets, weights })
    }

    /// Number of offset points.
    pub fn n_points(&self) -> usize {
        self.weights.len()
    }

    /// Offsets as fractions of the half-extents, shape `(n_points, 2)`.
    pub fn offsets(&self) -> &Array2<f64> {
        &self.offsets
    }

    /// Weights on the canonical domain, shape `(n_points,)`.
    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    /// Sum of the weights (4 for every built-in rule).
    pub fn weight_sum(&self) -> f64 {
        self.weights.sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const ALL: [SpatialAverager; 5] = [
        SpatialAverager::Rect1,
        SpatialAverager::Rect4,
        SpatialAverager::Rect9,
        SpatialAverager::Gauss4,
        SpatialAverager::Gauss9,
    ];

    #[test]
    fn built_in_weights_cover_canonical_domain() {
        for averager in ALL {
            let rule = QuadratureRule::for_averager(averager);
            assert_abs_diff_eq!(rule.weight_sum(), 4.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn point_counts() {
        let counts: Vec<usize> = ALL
            .iter()
            .map(|&a| QuadratureRule::for_averager(a).n_points())
            .collect();
        assert_eq!(counts, vec![1, 4, 9, 4, 9]);
    }

    #[test]
    fn offsets_are_symmetric() {
        for averager in ALL {
            let rule = QuadratureRule::for_averager(averager);
            let col_sums = rule.offsets().sum_axis(ndarray::Axis(0));
            assert_abs_diff_eq!(col_sums[0], 0.0, epsilon = 1e-14);
            assert_abs_diff_eq!(col_sums[1], 0.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn offsets_stay_inside_footprint() {
        for averager in ALL {
            let rule = QuadratureRule::for_averager(averager);
            assert!(rule.offsets().iter().all(|v| v.abs() <= 1.0));
        }
    }

    #[test]
    fn custom_rejects_weight_count_mismatch() {
        let err = QuadratureRule::custom(array![[0.0, 0.0]], array![1.0, 1.0]).unwrap_err();
        assert!(matches!(err, ConfigError::ShapeMismatch { .. }));
    }

    #[test]
    fn custom_rejects_three_column_offsets() {
        assert!(QuadratureRule::custom(array![[0.0, 0.0, 0.0]], array![4.0]).is_err());
    }

    #[test]
    fn custom_rejects_zero_weight_sum() {
        assert!(QuadratureRule::custom(array![[0.5, 0.0], [-0.5, 0.0]], array![1.0, -1.0]).is_err());
    }

    #[test]
    fn custom_accepts_valid_rule() {
        let rule = QuadratureRule::custom(array![[0.0, 0.0]], array![4.0]).unwrap();
        assert_eq!(rule, QuadratureRule::rect_1pt());
    }
}
