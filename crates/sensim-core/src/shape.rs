//! The measurement shape contract.

use std::fmt;

use ndarray::{Array3, ArrayBase, Data, Ix3};

use crate::error::ShapeError;

/// Shape `(n_sensors, n_components, n_time_steps)` shared by every array in
/// a measurement simulation: truth, each per-source error array, the summed
/// systematic and random errors, and the final measurement.
///
/// Fixed for a given sensor array once its geometry and field are bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeasShape {
    /// Number of sensors (axis 0).
    pub n_sensors: usize,
    /// Number of field components (axis 1).
    pub n_components: usize,
    /// Number of sample times (axis 2).
    pub n_time_steps: usize,
}

impl MeasShape {
    /// Create a shape from its three extents.
    pub fn new(n_sensors: usize, n_components: usize, n_time_steps: usize) -> Self {
        Self {
            n_sensors,
            n_components,
            n_time_steps,
        }
    }

    /// Shape of an existing three-axis array.
    pub fn of<S: Data<Elem = f64>>(array: &ArrayBase<S, Ix3>) -> Self {
        let (s, c, t) = array.dim();
        Self::new(s, c, t)
    }

    /// The shape as an ndarray dimension tuple.
    pub fn dim(&self) -> (usize, usize, usize) {
        (self.n_sensors, self.n_components, self.n_time_steps)
    }

    /// The shape as a slice-friendly array.
    pub fn as_array(&self) -> [usize; 3] {
        [self.n_sensors, self.n_components, self.n_time_steps]
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.n_sensors * self.n_components * self.n_time_steps
    }

    /// Whether any axis is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A zero-filled array of this shape.
    pub fn zeros(&self) -> Array3<f64> {
        Array3::zeros(self.dim())
    }

    /// Check `array` against this shape, naming `context` on failure.
    pub fn check<S: Data<Elem = f64>>(
        &self,
        array: &ArrayBase<S, Ix3>,
        context: &str,
    ) -> Result<(), ShapeError> {
        if array.shape() == self.as_array() {
            Ok(())
        } else {
            Err(ShapeError::new(context, &self.as_array(), array.shape()))
        }
    }
}

impl fmt::Display for MeasShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.n_sensors, self.n_components, self.n_time_steps
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn of_reads_array_dims() {
        let a = Array3::<f64>::zeros((4, 2, 7));
        let shape = MeasShape::of(&a);
        assert_eq!(shape, MeasShape::new(4, 2, 7));
        assert_eq!(shape.len(), 56);
        assert!(!shape.is_empty());
    }

    #[test]
    fn check_accepts_matching_array() {
        let shape = MeasShape::new(3, 1, 5);
        assert!(shape.check(&shape.zeros(), "truth").is_ok());
    }

    #[test]
    fn check_rejects_transposed_array() {
        let shape = MeasShape::new(3, 1, 5);
        let wrong = Array3::<f64>::zeros((5, 1, 3));
        let err = shape.check(&wrong, "errors").unwrap_err();
        assert_eq!(err.expected, vec![3, 1, 5]);
        assert_eq!(err.actual, vec![5, 1, 3]);
        assert_eq!(err.context, "errors");
    }

    #[test]
    fn display_is_tuple_like() {
        assert_eq!(format!("{}", MeasShape::new(1, 2, 3)), "(1, 2, 3)");
    }
}
