//! Basic events: the atomic failures of the risk model.

use std::cell::Cell;

use rand::RngCore;

use crate::distribution::Deviate;
use crate::error::{Error, Result};

/// Failure model determining the nominal probability of a basic event.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FailureModel {
    /// Time-independent probability.
    Constant(f64),
    /// Exponential failure at constant rate; `p(t) = 1 - exp(-lambda * t)`
    /// evaluated at the mission time.
    Exponential { lambda: f64 },
}

/// An atomic failure with an assigned probability and, optionally, an
/// uncertainty distribution.
///
/// Events are identified by a stable string id and bound to a 1-indexed
/// variable of the Boolean graph. One draw per Monte Carlo trial is cached
/// so that an event referenced from several places samples once; `reset`
/// clears the cache for the next trial.
#[derive(Debug)]
pub struct BasicEvent {
    id: String,
    index: u32,
    model: FailureModel,
    deviate: Option<Deviate>,
    draw: Cell<Option<f64>>,
}

impl BasicEvent {
    /// Event with a constant probability `p` in `[0, 1]`.
    pub fn new(id: impl Into<String>, index: u32, p: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&p) || !p.is_finite() {
            return Err(Error::settings(format!("event probability out of [0, 1]: {}", p)));
        }
        if index == 0 {
            return Err(Error::GraphInconsistency { index: 0 });
        }
        Ok(Self {
            id: id.into(),
            index,
            model: FailureModel::Constant(p),
            deviate: None,
            draw: Cell::new(None),
        })
    }

    /// Event failing exponentially at rate `lambda` (per hour).
    pub fn exponential(id: impl Into<String>, index: u32, lambda: f64) -> Result<Self> {
        if !(lambda >= 0.0) || !lambda.is_finite() {
            return Err(Error::settings(format!("failure rate out of range: {}", lambda)));
        }
        if index == 0 {
            return Err(Error::GraphInconsistency { index: 0 });
        }
        Ok(Self {
            id: id.into(),
            index,
            model: FailureModel::Exponential { lambda },
            deviate: None,
            draw: Cell::new(None),
        })
    }

    /// Attaches an uncertainty distribution.
    pub fn with_deviate(mut self, deviate: Deviate) -> Self {
        self.deviate = Some(deviate);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn model(&self) -> FailureModel {
        self.model
    }

    /// Nominal probability at the given mission time (hours).
    pub fn p(&self, mission_time: f64) -> f64 {
        match self.model {
            FailureModel::Constant(p) => p,
            FailureModel::Exponential { lambda } => 1.0 - (-lambda * mission_time).exp(),
        }
    }

    /// Whether Monte Carlo trials should sample this event.
    pub fn is_uncertain(&self) -> bool {
        self.deviate.as_ref().map_or(false, Deviate::is_uncertain)
    }

    /// Clears the per-trial cached draw.
    pub fn reset(&self) {
        self.draw.set(None);
    }

    /// One draw of the event probability for the current trial.
    ///
    /// Repeated calls within a trial return the cached draw; the result is
    /// not clamped here. Events without a distribution reproduce the nominal
    /// probability.
    pub fn sample(&self, mission_time: f64, rng: &mut dyn RngCore) -> f64 {
        if let Some(x) = self.draw.get() {
            return x;
        }
        let nominal = self.p(mission_time);
        let x = match &self.deviate {
            Some(d) => d.sample(nominal, rng),
            None => nominal,
        };
        self.draw.set(Some(x));
        x
    }
}
