//! Analytic and mock fields.
//!
//! - [`AnalyticField`]: evaluates a closure `f(point, time)` exactly.
//! - [`CountingField`]: wraps a field and counts `sample` calls.
//! - [`FailingField`]: every `sample` call fails.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use ndarray::{Array1, Array3, ArrayView1, ArrayView2};
use sensim_core::{Field, FieldError, FieldKind};

type PointFn = dyn Fn([f64; 3], f64, &mut [f64]) + Send + Sync;

/// A field defined by a closed-form function of position and time.
///
/// Sampling at explicit times evaluates the function at those times
/// directly; no interpolation is involved.
pub struct AnalyticField {
    components: Vec<String>,
    kind: FieldKind,
    time_steps: Array1<f64>,
    func: Box<PointFn>,
}

impl AnalyticField {
    /// A multi-component field. `func` writes one value per component.
    pub fn new(
        components: &[&str],
        kind: FieldKind,
        time_steps: Array1<f64>,
        func: impl Fn([f64; 3], f64, &mut [f64]) + Send + Sync + 'static,
    ) -> Self {
        Self {
            components: components.iter().map(|c| c.to_string()).collect(),
            kind,
            time_steps,
            func: Box::new(func),
        }
    }

    /// A single-component scalar field.
    pub fn scalar(
        name: &str,
        time_steps: Array1<f64>,
        func: impl Fn([f64; 3], f64) -> f64 + Send + Sync + 'static,
    ) -> Self {
        Self::new(&[name], FieldKind::Scalar, time_steps, move |p, t, out| {
            out[0] = func(p, t);
        })
    }
}

impl Field for AnalyticField {
    fn sample(
        &self,
        points: ArrayView2<'_, f64>,
        times: Option<ArrayView1<'_, f64>>,
    ) -> Result<Array3<f64>, FieldError> {
        if points.ncols() != 3 {
            return Err(FieldError::InvalidPoints {
                shape: points.shape().to_vec(),
            });
        }
        let times: Vec<f64> = match times {
            Some(t) => t.to_vec(),
            None => self.time_steps.to_vec(),
        };
        let n_comps = self.components.len();
        let mut out = Array3::zeros((points.nrows(), n_comps, times.len()));
        let mut buf = vec![0.0; n_comps];
        for (i, p) in points.rows().into_iter().enumerate() {
            let point = [p[0], p[1], p[2]];
            for (k, &t) in times.iter().enumerate() {
                (self.func)(point, t, &mut buf);
                for (c, &v) in buf.iter().enumerate() {
                    out[[i, c, k]] = v;
                }
            }
        }
        Ok(out)
    }

    fn time_steps(&self) -> Array1<f64> {
        self.time_steps.clone()
    }

    fn components(&self) -> &[String] {
        &self.components
    }

    fn kind(&self) -> FieldKind {
        self.kind
    }
}

/// A spatially and temporally constant scalar field.
pub fn constant_field(value: f64, time_steps: Array1<f64>) -> AnalyticField {
    AnalyticField::scalar("value", time_steps, move |_, _| value)
}

/// Wraps a field and records every `sample` call.
///
/// Used to assert that components batch their field access into a single
/// call rather than sampling sensor-by-sensor.
pub struct CountingField<F> {
    inner: F,
    calls: AtomicUsize,
    points_per_call: Mutex<Vec<usize>>,
}

impl<F: Field> CountingField<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            points_per_call: Mutex::new(Vec::new()),
        }
    }

    /// Number of `sample` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of points passed to each `sample` call, in call order.
    pub fn points_per_call(&self) -> Vec<usize> {
        self.points_per_call
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }
}

impl<F: Field> Field for CountingField<F> {
    fn sample(
        &self,
        points: ArrayView2<'_, f64>,
        times: Option<ArrayView1<'_, f64>>,
    ) -> Result<Array3<f64>, FieldError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut v) = self.points_per_call.lock() {
            v.push(points.nrows());
        }
        self.inner.sample(points, times)
    }

    fn time_steps(&self) -> Array1<f64> {
        self.inner.time_steps()
    }

    fn components(&self) -> &[String] {
        self.inner.components()
    }

    fn kind(&self) -> FieldKind {
        self.inner.kind()
    }
}

/// A field whose every `sample` call fails.
pub struct FailingField {
    components: Vec<String>,
    time_steps: Array1<f64>,
}

impl FailingField {
    pub fn new(time_steps: Array1<f64>) -> Self {
        Self {
            components: vec!["value".to_string()],
            time_steps,
        }
    }
}

impl Field for FailingField {
    fn sample(
        &self,
        _points: ArrayView2<'_, f64>,
        _times: Option<ArrayView1<'_, f64>>,
    ) -> Result<Array3<f64>, FieldError> {
        Err(FieldError::SamplingFailed {
            reason: "mesh not loaded".to_string(),
        })
    }

    fn time_steps(&self) -> Array1<f64> {
        self.time_steps.clone()
    }

    fn components(&self) -> &[String] {
        &self.components
    }
}
