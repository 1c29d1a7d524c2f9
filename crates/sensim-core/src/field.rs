//! The field collaborator: the simulation output the sensors observe.

use ndarray::{Array1, Array3, ArrayView1, ArrayView2};

use crate::error::FieldError;

/// How a field's components transform when a sensor is rotated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Scalar components (e.g. temperature). Orientation has no effect on
    /// the sampled values.
    Scalar,
    /// A vector with one component per spatial dimension (e.g.
    /// displacement). Rotated into the sensor frame as `Rᵀ v`.
    Vector {
        /// Spatial dimensions of the vector, 2 or 3.
        dims: u8,
    },
    /// A symmetric in-plane tensor stored as `[xx, yy, xy]` (e.g. 2-D
    /// strain). Rotated into the sensor frame as `Rᵀ T R` using the
    /// in-plane block of the rotation.
    Tensor2D,
}

impl FieldKind {
    /// Number of components the kind implies, if fixed.
    ///
    /// `None` for [`FieldKind::Scalar`], which may carry any number of
    /// independent scalar components.
    pub fn implied_components(&self) -> Option<usize> {
        match self {
            Self::Scalar => None,
            Self::Vector { dims } => Some(*dims as usize),
            Self::Tensor2D => Some(3),
        }
    }
}

/// A physical field produced by a numerical simulation.
///
/// The engine never assumes how sampling is implemented (interpolation,
/// lookup, analytic evaluation). Implementations must be deterministic:
/// sampling the same points at the same times returns identical values.
///
/// # Contract
///
/// - `points` has shape `(n_points, 3)`.
/// - `times` of `None` means the field's native [`time_steps`](Field::time_steps).
/// - The result has shape `(n_points, component_count(), n_times)`.
///
/// Callers batch every point they need into one `sample` call.
pub trait Field: Send + Sync {
    /// Sample the field at `points` and `times`.
    fn sample(
        &self,
        points: ArrayView2<'_, f64>,
        times: Option<ArrayView1<'_, f64>>,
    ) -> Result<Array3<f64>, FieldError>;

    /// The field's native time steps, in ascending order.
    fn time_steps(&self) -> Array1<f64>;

    /// Component names, in storage order.
    fn components(&self) -> &[String];

    /// How the components transform under sensor rotation.
    ///
    /// Default: [`FieldKind::Scalar`].
    fn kind(&self) -> FieldKind {
        FieldKind::Scalar
    }

    /// Number of components per sample.
    fn component_count(&self) -> usize {
        self.components().len()
    }

    /// Index of the component called `name`.
    fn component_index(&self, name: &str) -> Result<usize, FieldError> {
        self.components()
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| FieldError::UnknownComponent {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array3};

    struct TwoComponent {
        components: Vec<String>,
    }

    impl Field for TwoComponent {
        fn sample(
            &self,
            points: ArrayView2<'_, f64>,
            times: Option<ArrayView1<'_, f64>>,
        ) -> Result<Array3<f64>, FieldError> {
            let n_t = times.map_or(1, |t| t.len());
            Ok(Array3::zeros((points.nrows(), 2, n_t)))
        }

        fn time_steps(&self) -> Array1<f64> {
            Array1::from(vec![0.0])
        }

        fn components(&self) -> &[String] {
            &self.components
        }

        fn kind(&self) -> FieldKind {
            FieldKind::Vector { dims: 2 }
        }
    }

    fn field() -> TwoComponent {
        TwoComponent {
            components: vec!["disp_x".to_string(), "disp_y".to_string()],
        }
    }

    #[test]
    fn component_lookup_by_name() {
        let f = field();
        assert_eq!(f.component_count(), 2);
        assert_eq!(f.component_index("disp_y"), Ok(1));
    }

    #[test]
    fn unknown_component_is_an_error() {
        let f = field();
        assert_eq!(
            f.component_index("disp_z"),
            Err(FieldError::UnknownComponent {
                name: "disp_z".to_string()
            })
        );
    }

    #[test]
    fn implied_components_per_kind() {
        assert_eq!(FieldKind::Scalar.implied_components(), None);
        assert_eq!(FieldKind::Vector { dims: 3 }.implied_components(), Some(3));
        assert_eq!(FieldKind::Tensor2D.implied_components(), Some(3));
        assert_eq!(field().kind().implied_components(), Some(2));
    }
}
