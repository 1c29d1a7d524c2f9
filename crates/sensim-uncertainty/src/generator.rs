//! Seeded random generators for random error sources.
//!
//! A [`RandomGenerator`] binds a distribution family and its parameters at
//! construction and draws i.i.d. deviates into arrays of any shape. The
//! stream is a ChaCha8 generator seeded through [`Seed`]: the same fixed
//! seed and the same sequence of `generate` calls reproduce the same
//! values on every run and platform.

use ndarray::{Array, ShapeBuilder};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{
    Beta, ChiSquared, Distribution, Exp, FisherF, Gamma, LogNormal, Normal, StudentT,
    Triangular, Uniform,
};
use sensim_core::ConfigError;

/// How a random stream is seeded.
///
/// There is no implicit default: every construction site chooses between
/// reproducibility and fresh entropy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Seed {
    /// Reproducible stream from a fixed seed.
    Fixed(u64),
    /// Fresh, non-reproducible stream seeded from the thread RNG.
    Entropy,
}

impl Seed {
    fn rng(self) -> ChaCha8Rng {
        match self {
            Self::Fixed(seed) => ChaCha8Rng::seed_from_u64(seed),
            Self::Entropy => ChaCha8Rng::from_rng(&mut rand::rng()),
        }
    }
}

/// Distribution family and parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum RandomDist {
    /// Normal with mean `mean` and standard deviation `std`.
    Normal {
        /// Mean.
        mean: f64,
        /// Standard deviation, `>= 0`.
        std: f64,
    },
    /// Log-normal; `mean` and `std` describe the underlying normal.
    LogNormal {
        /// Mean of the underlying normal.
        mean: f64,
        /// Standard deviation of the underlying normal, `>= 0`.
        std: f64,
    },
    /// Uniform on `[low, high)`.
    Uniform {
        /// Lower bound (inclusive).
        low: f64,
        /// Upper bound (exclusive), `> low`.
        high: f64,
    },
    /// Exponential with mean `scale`.
    Exponential {
        /// Mean, `> 0`.
        scale: f64,
    },
    /// Chi-square with `dofs` degrees of freedom.
    ChiSquare {
        /// Degrees of freedom, `> 0`.
        dofs: f64,
    },
    /// First-component marginal of a Dirichlet draw with concentration
    /// `alpha`. Each element comes from an independent draw.
    Dirichlet {
        /// Concentration parameters; at least two, all `> 0`.
        alpha: Vec<f64>,
    },
    /// Fisher-Snedecor F.
    F {
        /// Numerator degrees of freedom, `> 0`.
        dofs_num: f64,
        /// Denominator degrees of freedom, `> 0`.
        dofs_den: f64,
    },
    /// Gamma with shape `shape` and scale `scale`.
    Gamma {
        /// Shape, `> 0`.
        shape: f64,
        /// Scale, `> 0`.
        scale: f64,
    },
    /// Student's t with `dofs` degrees of freedom.
    StudentT {
        /// Degrees of freedom, `> 0`.
        dofs: f64,
    },
    /// Beta with shape parameters `a` and `b`.
    Beta {
        /// First shape parameter, `> 0`.
        a: f64,
        /// Second shape parameter, `> 0`.
        b: f64,
    },
    /// Triangular on `[left, right]` peaking at `mode`.
    Triangular {
        /// Lower bound.
        left: f64,
        /// Peak, `left <= mode <= right`.
        mode: f64,
        /// Upper bound, `> left`.
        right: f64,
    },
}

impl RandomDist {
    /// Short family name used in error messages and calculator names.
    pub fn family(&self) -> &'static str {
        match self {
            Self::Normal { .. } => "normal",
            Self::LogNormal { .. } => "lognormal",
            Self::Uniform { .. } => "uniform",
            Self::Exponential { .. } => "exponential",
            Self::ChiSquare { .. } => "chisquare",
            Self::Dirichlet { .. } => "dirichlet",
            Self::F { .. } => "f",
            Self::Gamma { .. } => "gamma",
            Self::StudentT { .. } => "student_t",
            Self::Beta { .. } => "beta",
            Self::Triangular { .. } => "triangular",
        }
    }

    fn sampler(&self) -> Result<Sampler, ConfigError> {
        let family = self.family();
        let bad = |e: &dyn std::fmt::Display| ConfigError::invalid(family, e.to_string());
        match self {
            Self::Normal { mean, std } => {
                finite(family, &[*mean, *std])?;
                non_negative(family, "std", *std)?;
                Normal::new(*mean, *std).map(Sampler::Normal).map_err(|e| bad(&e))
            }
            Self::LogNormal { mean, std } => {
                finite(family, &[*mean, *std])?;
                non_negative(family, "std", *std)?;
                LogNormal::new(*mean, *std)
                    .map(Sampler::LogNormal)
                    .map_err(|e| bad(&e))
            }
            Self::Uniform { low, high } => {
                finite(family, &[*low, *high])?;
                if low >= high {
                    return Err(ConfigError::invalid(
                        family,
                        format!("low must be < high, got [{low}, {high})"),
                    ));
                }
                Uniform::new(*low, *high)
                    .map(Sampler::Uniform)
                    .map_err(|e| bad(&e))
            }
            Self::Exponential { scale } => {
                positive(family, "scale", *scale)?;
                Exp::new(1.0 / scale).map(Sampler::Exp).map_err(|e| bad(&e))
            }
            Self::ChiSquare { dofs } => {
                positive(family, "dofs", *dofs)?;
                ChiSquared::new(*dofs)
                    .map(Sampler::ChiSquared)
                    .map_err(|e| bad(&e))
            }
            Self::Dirichlet { alpha } => {
                if alpha.len() < 2 {
                    return Err(ConfigError::invalid(
                        family,
                        format!("needs at least 2 concentration values, got {}", alpha.len()),
                    ));
                }
                alpha
                    .iter()
                    .map(|&a| {
                        positive(family, "alpha", a)?;
                        Gamma::new(a, 1.0).map_err(|e| bad(&e))
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Sampler::Dirichlet)
            }
            Self::F { dofs_num, dofs_den } => {
                positive(family, "dofs_num", *dofs_num)?;
                positive(family, "dofs_den", *dofs_den)?;
                FisherF::new(*dofs_num, *dofs_den)
                    .map(Sampler::FisherF)
                    .map_err(|e| bad(&e))
            }
            Self::Gamma { shape, scale } => {
                positive(family, "shape", *shape)?;
                positive(family, "scale", *scale)?;
                Gamma::new(*shape, *scale)
                    .map(Sampler::Gamma)
                    .map_err(|e| bad(&e))
            }
            Self::StudentT { dofs } => {
                positive(family, "dofs", *dofs)?;
                StudentT::new(*dofs)
                    .map(Sampler::StudentT)
                    .map_err(|e| bad(&e))
            }
            Self::Beta { a, b } => {
                positive(family, "a", *a)?;
                positive(family, "b", *b)?;
                Beta::new(*a, *b).map(Sampler::Beta).map_err(|e| bad(&e))
            }
            Self::Triangular { left, mode, right } => {
                finite(family, &[*left, *mode, *right])?;
                if !(left <= mode && mode <= right && left < right) {
                    return Err(ConfigError::invalid(
                        family,
                        format!("need left <= mode <= right and left < right, got ({left}, {mode}, {right})"),
                    ));
                }
                Triangular::new(*left, *right, *mode)
                    .map(Sampler::Triangular)
                    .map_err(|e| bad(&e))
            }
        }
    }
}

fn finite(family: &str, values: &[f64]) -> Result<(), ConfigError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ConfigError::invalid(family, format!("parameters must be finite, got {values:?}")))
    }
}

fn non_negative(family: &str, param: &str, v: f64) -> Result<(), ConfigError> {
    if v >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(family, format!("{param} must be >= 0, got {v}")))
    }
}

fn positive(family: &str, param: &str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            family,
            format!("{param} must be finite and > 0, got {v}"),
        ))
    }
}

/// Validated, ready-to-draw distribution.
#[derive(Clone, Debug)]
enum Sampler {
    Normal(Normal<f64>),
    LogNormal(LogNormal<f64>),
    Uniform(Uniform<f64>),
    Exp(Exp<f64>),
    ChiSquared(ChiSquared<f64>),
    Dirichlet(Vec<Gamma<f64>>),
    FisherF(FisherF<f64>),
    Gamma(Gamma<f64>),
    StudentT(StudentT<f64>),
    Beta(Beta<f64>),
    Triangular(Triangular<f64>),
}

impl Sampler {
    fn draw(&self, rng: &mut ChaCha8Rng) -> f64 {
        match self {
            Self::Normal(d) => d.sample(rng),
            Self::LogNormal(d) => d.sample(rng),
            Self::Uniform(d) => d.sample(rng),
            Self::Exp(d) => d.sample(rng),
            Self::ChiSquared(d) => d.sample(rng),
            Self::Dirichlet(gammas) => {
                let draws: Vec<f64> = gammas.iter().map(|g| g.sample(rng)).collect();
                let total: f64 = draws.iter().sum();
                if total > 0.0 {
                    draws[0] / total
                } else {
                    0.0
                }
            }
            Self::FisherF(d) => d.sample(rng),
            Self::Gamma(d) => d.sample(rng),
            Self::StudentT(d) => d.sample(rng),
            Self::Beta(d) => d.sample(rng),
            Self::Triangular(d) => d.sample(rng),
        }
    }
}

/// A seeded generator of i.i.d. deviates from one distribution.
#[derive(Clone, Debug)]
pub struct RandomGenerator {
    dist: RandomDist,
    sampler: Sampler,
    rng: ChaCha8Rng,
}

impl RandomGenerator {
    /// Bind `dist` and a stream seeded by `seed`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidParameter`] naming the family if any
    /// parameter is outside its valid range.
    pub fn new(dist: RandomDist, seed: Seed) -> Result<Self, ConfigError> {
        let sampler = dist.sampler()?;
        Ok(Self {
            dist,
            sampler,
            rng: seed.rng(),
        })
    }

    /// Normal deviates with mean `mean` and standard deviation `std`.
    pub fn normal(mean: f64, std: f64, seed: Seed) -> Result<Self, ConfigError> {
        Self::new(RandomDist::Normal { mean, std }, seed)
    }

    /// Uniform deviates on `[low, high)`.
    pub fn uniform(low: f64, high: f64, seed: Seed) -> Result<Self, ConfigError> {
        Self::new(RandomDist::Uniform { low, high }, seed)
    }

    /// The bound distribution.
    pub fn dist(&self) -> &RandomDist {
        &self.dist
    }

    /// Draw one deviate.
    pub fn draw(&mut self) -> f64 {
        self.sampler.draw(&mut self.rng)
    }

    /// Draw an array of shape `shape`, filled in logical order.
    pub fn generate<Sh>(&mut self, shape: Sh) -> Array<f64, Sh::Dim>
    where
        Sh: ShapeBuilder,
    {
        let sampler = &self.sampler;
        let rng = &mut self.rng;
        Array::from_shape_simple_fn(shape, || sampler.draw(rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn mean(a: &Array3<f64>) -> f64 {
        a.sum() / a.len() as f64
    }

    #[test]
    fn fixed_seed_reproduces_stream() {
        let mut a = RandomGenerator::normal(0.0, 1.0, Seed::Fixed(7)).unwrap();
        let mut b = RandomGenerator::normal(0.0, 1.0, Seed::Fixed(7)).unwrap();
        assert_eq!(a.generate((4, 2, 3)), b.generate((4, 2, 3)));
        assert_eq!(a.generate((2, 1, 5)), b.generate((2, 1, 5)));
    }

    #[test]
    fn different_seeds_differ() {
        let mut a = RandomGenerator::normal(0.0, 1.0, Seed::Fixed(1)).unwrap();
        let mut b = RandomGenerator::normal(0.0, 1.0, Seed::Fixed(2)).unwrap();
        assert_ne!(a.generate((10, 1, 1)), b.generate((10, 1, 1)));
    }

    #[test]
    fn successive_calls_advance_the_stream() {
        let mut g = RandomGenerator::uniform(0.0, 1.0, Seed::Fixed(3)).unwrap();
        let first = g.generate((5, 1, 1));
        let second = g.generate((5, 1, 1));
        assert_ne!(first, second);
    }

    #[test]
    fn entropy_seed_constructs() {
        let mut g = RandomGenerator::normal(0.0, 1.0, Seed::Entropy).unwrap();
        assert_eq!(g.generate((3, 2, 1)).dim(), (3, 2, 1));
    }

    #[test]
    fn uniform_stays_in_bounds() {
        let mut g = RandomGenerator::uniform(-2.0, 3.0, Seed::Fixed(11)).unwrap();
        let a: Array3<f64> = g.generate((50, 2, 10));
        assert!(a.iter().all(|&v| (-2.0..3.0).contains(&v)));
    }

    #[test]
    fn normal_sample_mean_is_close() {
        let mut g = RandomGenerator::normal(5.0, 0.5, Seed::Fixed(42)).unwrap();
        let a = g.generate((100, 1, 100));
        assert!((mean(&a) - 5.0).abs() < 0.05);
    }

    #[test]
    fn exponential_mean_is_scale() {
        let mut g = RandomGenerator::new(RandomDist::Exponential { scale: 2.0 }, Seed::Fixed(5))
            .unwrap();
        let a = g.generate((100, 1, 100));
        assert!((mean(&a) - 2.0).abs() < 0.1);
    }

    #[test]
    fn dirichlet_marginal_in_unit_interval() {
        let mut g = RandomGenerator::new(
            RandomDist::Dirichlet {
                alpha: vec![2.0, 3.0, 5.0],
            },
            Seed::Fixed(9),
        )
        .unwrap();
        let a = g.generate((100, 1, 50));
        assert!(a.iter().all(|&v| (0.0..=1.0).contains(&v)));
        // Marginal of the first component is Beta(2, 8), mean 0.2.
        assert!((mean(&a) - 0.2).abs() < 0.02);
    }

    #[test]
    fn triangular_respects_bounds() {
        let mut g = RandomGenerator::new(
            RandomDist::Triangular {
                left: -1.0,
                mode: 0.0,
                right: 2.0,
            },
            Seed::Fixed(4),
        )
        .unwrap();
        let a = g.generate((20, 1, 20));
        assert!(a.iter().all(|&v| (-1.0..=2.0).contains(&v)));
    }

    #[test]
    fn every_family_constructs_with_valid_parameters() {
        let families = vec![
            RandomDist::Normal { mean: 0.0, std: 1.0 },
            RandomDist::LogNormal { mean: 0.0, std: 0.5 },
            RandomDist::Uniform { low: 0.0, high: 1.0 },
            RandomDist::Exponential { scale: 1.0 },
            RandomDist::ChiSquare { dofs: 3.0 },
            RandomDist::Dirichlet { alpha: vec![1.0, 1.0] },
            RandomDist::F { dofs_num: 4.0, dofs_den: 6.0 },
            RandomDist::Gamma { shape: 2.0, scale: 1.5 },
            RandomDist::StudentT { dofs: 5.0 },
            RandomDist::Beta { a: 2.0, b: 3.0 },
            RandomDist::Triangular { left: 0.0, mode: 0.5, right: 1.0 },
        ];
        for dist in families {
            let mut g = RandomGenerator::new(dist.clone(), Seed::Fixed(0))
                .unwrap_or_else(|e| panic!("{}: {e}", dist.family()));
            assert!(g.draw().is_finite());
        }
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let bad = vec![
            RandomDist::Normal { mean: 0.0, std: -1.0 },
            RandomDist::Normal { mean: f64::NAN, std: 1.0 },
            RandomDist::Uniform { low: 1.0, high: 1.0 },
            RandomDist::Exponential { scale: 0.0 },
            RandomDist::ChiSquare { dofs: -2.0 },
            RandomDist::Dirichlet { alpha: vec![1.0] },
            RandomDist::Dirichlet { alpha: vec![1.0, 0.0] },
            RandomDist::F { dofs_num: 0.0, dofs_den: 1.0 },
            RandomDist::Gamma { shape: 1.0, scale: -1.0 },
            RandomDist::StudentT { dofs: 0.0 },
            RandomDist::Beta { a: 0.0, b: 1.0 },
            RandomDist::Triangular { left: 0.0, mode: 2.0, right: 1.0 },
        ];
        for dist in bad {
            let err = RandomGenerator::new(dist.clone(), Seed::Fixed(0)).unwrap_err();
            match err {
                ConfigError::InvalidParameter { name, .. } => assert_eq!(name, dist.family()),
                other => panic!("unexpected error {other:?}"),
            }
        }
    }
}
