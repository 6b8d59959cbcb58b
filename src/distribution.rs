//! Probability distributions attached to uncertain basic events.
//!
//! Each basic event may carry a *deviate*: a description of the epistemic
//! uncertainty around its nominal probability. One draw is produced per
//! Monte Carlo trial; the caller clamps draws into `[0, 1]`. Parameters are
//! validated at construction so that sampling itself never fails.

use std::fmt;

use rand::distributions::Distribution;
use rand::{Rng, RngCore};
use statrs::distribution::{Beta, Gamma, LogNormal, Normal, Triangular, Uniform, Weibull};

use crate::error::{Error, Result};

/// Standard normal quantile at 0.95, used to recover log-normal parameters
/// from a 95% error factor.
const Z95: f64 = 1.6448536269514722;

/// A caller-supplied sampler for user-expression deviates.
///
/// The core does not grow an expression language; an external collaborator
/// that evaluates user expressions hands the core one of these instead.
pub trait Sampler: Send {
    /// Produce one draw. The caller clamps the result into `[0, 1]`.
    fn sample(&self, rng: &mut dyn RngCore) -> f64;
}

/// Uncertainty descriptor of a basic event.
pub enum Deviate {
    /// No uncertainty; draws reproduce the nominal probability.
    Point,
    Uniform(Uniform),
    Normal(Normal),
    LogNormal(LogNormal),
    Histogram(HistogramDeviate),
    Triangular(Triangular),
    Beta(Beta),
    Gamma(Gamma),
    Weibull(Weibull),
    /// User expression evaluated by an external collaborator.
    Expression(Box<dyn Sampler>),
}

impl Deviate {
    pub fn uniform(lower: f64, upper: f64) -> Result<Self> {
        Uniform::new(lower, upper)
            .map(Deviate::Uniform)
            .map_err(|e| Error::settings(format!("uniform deviate: {}", e)))
    }

    pub fn normal(mean: f64, sigma: f64) -> Result<Self> {
        Normal::new(mean, sigma)
            .map(Deviate::Normal)
            .map_err(|e| Error::settings(format!("normal deviate: {}", e)))
    }

    /// Log-normal deviate parameterised by its mean and 95% error factor,
    /// the customary form in risk models:
    ///
    /// ```text
    /// sigma = ln(ef) / z_0.95
    /// mu    = ln(mean) - sigma^2 / 2
    /// ```
    pub fn lognormal(mean: f64, error_factor: f64) -> Result<Self> {
        if !(mean > 0.0) || !mean.is_finite() {
            return Err(Error::settings(format!("log-normal mean must be positive, got {}", mean)));
        }
        if !(error_factor > 1.0) || !error_factor.is_finite() {
            return Err(Error::settings(format!(
                "log-normal error factor must be greater than 1, got {}",
                error_factor
            )));
        }
        let sigma = error_factor.ln() / Z95;
        let mu = mean.ln() - sigma * sigma / 2.0;
        LogNormal::new(mu, sigma)
            .map(Deviate::LogNormal)
            .map_err(|e| Error::settings(format!("log-normal deviate: {}", e)))
    }

    pub fn histogram(lower: f64, bins: Vec<(f64, f64)>) -> Result<Self> {
        HistogramDeviate::new(lower, bins).map(Deviate::Histogram)
    }

    pub fn triangular(lower: f64, mode: f64, upper: f64) -> Result<Self> {
        Triangular::new(lower, upper, mode)
            .map(Deviate::Triangular)
            .map_err(|e| Error::settings(format!("triangular deviate: {}", e)))
    }

    pub fn beta(alpha: f64, beta: f64) -> Result<Self> {
        Beta::new(alpha, beta)
            .map(Deviate::Beta)
            .map_err(|e| Error::settings(format!("beta deviate: {}", e)))
    }

    /// Gamma deviate in shape/scale form.
    pub fn gamma(shape: f64, scale: f64) -> Result<Self> {
        if !(scale > 0.0) || !scale.is_finite() {
            return Err(Error::settings(format!("gamma scale must be positive, got {}", scale)));
        }
        Gamma::new(shape, 1.0 / scale)
            .map(Deviate::Gamma)
            .map_err(|e| Error::settings(format!("gamma deviate: {}", e)))
    }

    pub fn weibull(shape: f64, scale: f64) -> Result<Self> {
        Weibull::new(shape, scale)
            .map(Deviate::Weibull)
            .map_err(|e| Error::settings(format!("weibull deviate: {}", e)))
    }

    pub fn expression(sampler: Box<dyn Sampler>) -> Self {
        Deviate::Expression(sampler)
    }

    /// Whether draws from this deviate actually vary.
    pub fn is_uncertain(&self) -> bool {
        !matches!(self, Deviate::Point)
    }

    /// One draw. `nominal` is the event's nominal probability, reproduced by
    /// point deviates. Not clamped here.
    pub fn sample(&self, nominal: f64, rng: &mut dyn RngCore) -> f64 {
        match self {
            Deviate::Point => nominal,
            Deviate::Uniform(d) => d.sample(rng),
            Deviate::Normal(d) => d.sample(rng),
            Deviate::LogNormal(d) => d.sample(rng),
            Deviate::Histogram(d) => d.sample(rng),
            Deviate::Triangular(d) => d.sample(rng),
            Deviate::Beta(d) => d.sample(rng),
            Deviate::Gamma(d) => d.sample(rng),
            Deviate::Weibull(d) => d.sample(rng),
            Deviate::Expression(s) => s.sample(rng),
        }
    }
}

impl fmt::Debug for Deviate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Deviate::Point => "Point",
            Deviate::Uniform(_) => "Uniform",
            Deviate::Normal(_) => "Normal",
            Deviate::LogNormal(_) => "LogNormal",
            Deviate::Histogram(_) => "Histogram",
            Deviate::Triangular(_) => "Triangular",
            Deviate::Beta(_) => "Beta",
            Deviate::Gamma(_) => "Gamma",
            Deviate::Weibull(_) => "Weibull",
            Deviate::Expression(_) => "Expression",
        };
        write!(f, "Deviate::{}", name)
    }
}

/// Piecewise-uniform deviate over explicit bins.
///
/// `bins` holds `(upper_bound, weight)` pairs above the common `lower`
/// bound; bounds must ascend and weights must be non-negative with a
/// positive total. Sampling inverts the cumulative weight.
pub struct HistogramDeviate {
    lower: f64,
    bins: Vec<(f64, f64)>,
    cumulative: Vec<f64>,
    total: f64,
}

impl HistogramDeviate {
    pub fn new(lower: f64, bins: Vec<(f64, f64)>) -> Result<Self> {
        if bins.is_empty() {
            return Err(Error::settings("histogram deviate needs at least one bin"));
        }
        let mut prev = lower;
        let mut cumulative = Vec::with_capacity(bins.len());
        let mut total = 0.0;
        for &(upper, weight) in &bins {
            if !(upper > prev) {
                return Err(Error::settings(format!(
                    "histogram bounds must ascend: {} after {}",
                    upper, prev
                )));
            }
            if !(weight >= 0.0) || !weight.is_finite() {
                return Err(Error::settings(format!("histogram weight out of range: {}", weight)));
            }
            total += weight;
            cumulative.push(total);
            prev = upper;
        }
        if !(total > 0.0) {
            return Err(Error::settings("histogram weights sum to zero"));
        }
        Ok(Self { lower, bins, cumulative, total })
    }

    fn sample(&self, rng: &mut dyn RngCore) -> f64 {
        let u = rng.gen::<f64>() * self.total;
        let k = self.cumulative.partition_point(|&c| c < u).min(self.bins.len() - 1);
        let lo = if k == 0 { self.lower } else { self.bins[k - 1].0 };
        let hi = self.bins[k].0;
        lo + rng.gen::<f64>() * (hi - lo)
    }
}
