//! Sensor geometry and sampling configuration.

use ndarray::{Array1, Array2};

use crate::error::ConfigError;
use crate::field::Field;
use crate::rotation::{identity_rotations, Rotation};
use crate::shape::MeasShape;

/// Footprint rule used to average the field over a sensor's area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpatialAverager {
    /// Rectangle rule, single centre point.
    Rect1,
    /// Rectangle rule, four quadrant midpoints.
    Rect4,
    /// Rectangle rule, 3×3 grid.
    Rect9,
    /// 2×2 Gauss-Legendre quadrature.
    Gauss4,
    /// 3×3 Gauss-Legendre quadrature.
    Gauss9,
}

/// Geometry and timing for an array of sensors.
///
/// Immutable once handed to a sensor array. Error chains that perturb
/// geometry produce modified copies; the original is never mutated.
#[derive(Clone, Debug, PartialEq)]
pub struct SensorData {
    /// Sensor centres, shape `(n_sensors, 3)`.
    pub positions: Array2<f64>,
    /// Sample times. `None` samples at the field's native time steps.
    pub sample_times: Option<Array1<f64>>,
    /// Per-sensor orientation. `None` means every sensor is aligned with
    /// the global frame.
    pub angles: Option<Vec<Rotation>>,
    /// Footprint rule. `None` means point sensors.
    pub spatial_averager: Option<SpatialAverager>,
    /// Full footprint extents `[x, y, z]` in the sensor's local frame.
    /// Only x and y are integrated over.
    pub spatial_dims: Option<[f64; 3]>,
}

impl SensorData {
    /// Point sensors at `positions`, sampled at the field's native times.
    pub fn new(positions: Array2<f64>) -> Self {
        Self {
            positions,
            sample_times: None,
            angles: None,
            spatial_averager: None,
            spatial_dims: None,
        }
    }

    /// Sample at explicit times instead of the field's native time steps.
    pub fn with_sample_times(mut self, times: Array1<f64>) -> Self {
        self.sample_times = Some(times);
        self
    }

    /// Give every sensor an orientation.
    pub fn with_angles(mut self, angles: Vec<Rotation>) -> Self {
        self.angles = Some(angles);
        self
    }

    /// Average over a footprint of full extents `dims` using `averager`.
    pub fn with_spatial_averaging(mut self, averager: SpatialAverager, dims: [f64; 3]) -> Self {
        self.spatial_averager = Some(averager);
        self.spatial_dims = Some(dims);
        self
    }

    /// Number of sensors.
    pub fn n_sensors(&self) -> usize {
        self.positions.nrows()
    }

    /// Orientations, substituting identity when none are set.
    pub fn angles_or_identity(&self) -> Vec<Rotation> {
        match &self.angles {
            Some(angles) => angles.clone(),
            None => identity_rotations(self.n_sensors()),
        }
    }

    /// Footprint rule and extents, if the sensors average over an area.
    ///
    /// Both the averager and the extents must be set.
    pub fn footprint(&self) -> Option<(SpatialAverager, [f64; 3])> {
        match (self.spatial_averager, self.spatial_dims) {
            (Some(averager), Some(dims)) => Some((averager, dims)),
            _ => None,
        }
    }

    /// Effective sample times: the configured times, or the field's.
    pub fn sample_times_or(&self, field: &dyn Field) -> Array1<f64> {
        match &self.sample_times {
            Some(times) => times.clone(),
            None => field.time_steps(),
        }
    }

    /// Measurement shape these sensors produce when observing `field`.
    pub fn meas_shape(&self, field: &dyn Field) -> MeasShape {
        let n_times = match &self.sample_times {
            Some(times) => times.len(),
            None => field.time_steps().len(),
        };
        MeasShape::new(self.n_sensors(), field.component_count(), n_times)
    }

    /// Validate structural invariants.
    ///
    /// Checks performed:
    ///
    /// 1. At least one sensor; positions are `(n, 3)` and finite.
    /// 2. Sample times, if set, are non-empty, finite and strictly increasing.
    /// 3. Angles, if set, have one entry per sensor.
    /// 4. A spatial averager has finite, positive in-plane extents.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.positions.nrows() == 0 {
            return Err(invalid("no sensor positions"));
        }
        if self.positions.ncols() != 3 {
            return Err(invalid(format!(
                "positions must have 3 columns, got {}",
                self.positions.ncols()
            )));
        }
        if self.positions.iter().any(|v| !v.is_finite()) {
            return Err(invalid("positions must be finite"));
        }

        if let Some(times) = &self.sample_times {
            if times.is_empty() {
                return Err(invalid("sample_times is empty"));
            }
            if times.iter().any(|t| !t.is_finite()) {
                return Err(invalid("sample_times must be finite"));
            }
            if times.windows(2).into_iter().any(|w| w[1] <= w[0]) {
                return Err(invalid("sample_times must be strictly increasing"));
            }
        }

        if let Some(angles) = &self.angles {
            if angles.len() != self.n_sensors() {
                return Err(invalid(format!(
                    "{} angles for {} sensors",
                    angles.len(),
                    self.n_sensors()
                )));
            }
        }

        if self.spatial_averager.is_some() {
            match self.spatial_dims {
                None => return Err(invalid("spatial_averager set without spatial_dims")),
                Some(dims) => {
                    if !(dims[0].is_finite() && dims[1].is_finite() && dims[0] > 0.0 && dims[1] > 0.0)
                    {
                        return Err(invalid(format!(
                            "spatial_dims x and y must be finite and positive, got {dims:?}"
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidSensorData {
        reason: reason.into(),
    }
}
