//! Deserialization of the core's inputs.
//!
//! The qualitative stage (an external collaborator) delivers basic events
//! and minimal cut sets; on the command line that delivery is one or more
//! JSON files of this shape:
//!
//! ```json
//! {
//!   "events": [
//!     { "id": "pump-fails", "index": 1, "p": 0.1 },
//!     { "id": "valve-stuck", "index": 2, "lambda": 1e-4,
//!       "distribution": { "type": "lognormal", "mean": 0.01, "error_factor": 3.0 } }
//!   ],
//!   "cut_sets": [[1, 2], [-1, 3]]
//! }
//! ```
//!
//! This is transport of already-compiled analysis inputs, not model
//! construction; several files merge into one graph.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::cutset::{CutSet, MinimalCutSets};
use crate::distribution::Deviate;
use crate::error::{Error, Result};
use crate::event::BasicEvent;
use crate::graph::BooleanGraph;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct InputModel {
    #[serde(default)]
    events: Vec<InputEvent>,
    #[serde(default)]
    cut_sets: Vec<Vec<i32>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct InputEvent {
    id: String,
    index: u32,
    #[serde(default)]
    p: Option<f64>,
    #[serde(default)]
    lambda: Option<f64>,
    #[serde(default)]
    distribution: Option<InputDistribution>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum InputDistribution {
    Uniform { lower: f64, upper: f64 },
    Normal { mean: f64, sigma: f64 },
    Lognormal { mean: f64, error_factor: f64 },
    Histogram { lower: f64, bins: Vec<(f64, f64)> },
    Triangular { lower: f64, mode: f64, upper: f64 },
    Beta { alpha: f64, beta: f64 },
    Gamma { shape: f64, scale: f64 },
    Weibull { shape: f64, scale: f64 },
}

impl InputDistribution {
    fn into_deviate(self) -> Result<Deviate> {
        match self {
            InputDistribution::Uniform { lower, upper } => Deviate::uniform(lower, upper),
            InputDistribution::Normal { mean, sigma } => Deviate::normal(mean, sigma),
            InputDistribution::Lognormal { mean, error_factor } => Deviate::lognormal(mean, error_factor),
            InputDistribution::Histogram { lower, bins } => Deviate::histogram(lower, bins),
            InputDistribution::Triangular { lower, mode, upper } => Deviate::triangular(lower, mode, upper),
            InputDistribution::Beta { alpha, beta } => Deviate::beta(alpha, beta),
            InputDistribution::Gamma { shape, scale } => Deviate::gamma(shape, scale),
            InputDistribution::Weibull { shape, scale } => Deviate::weibull(shape, scale),
        }
    }
}

impl InputEvent {
    fn into_basic_event(self) -> Result<BasicEvent> {
        let event = match (self.p, self.lambda) {
            (Some(p), None) => BasicEvent::new(&self.id, self.index, p)?,
            (None, Some(lambda)) => BasicEvent::exponential(&self.id, self.index, lambda)?,
            (Some(_), Some(_)) => {
                return Err(Error::config(format!(
                    "event '{}' gives both a probability and a failure rate",
                    self.id
                )));
            }
            (None, None) => {
                return Err(Error::config(format!(
                    "event '{}' gives neither a probability nor a failure rate",
                    self.id
                )));
            }
        };
        match self.distribution {
            Some(d) => Ok(event.with_deviate(d.into_deviate()?)),
            None => Ok(event),
        }
    }
}

/// Reads and merges one or more input files into the analysis inputs.
pub fn load_inputs<P: AsRef<Path>>(paths: &[P]) -> Result<(BooleanGraph, MinimalCutSets)> {
    let mut events = Vec::new();
    let mut sets = Vec::new();
    for path in paths {
        let text = fs::read_to_string(path.as_ref())?;
        let model: InputModel = serde_json::from_str(&text).map_err(|e| {
            Error::config(format!("malformed input '{}': {}", path.as_ref().display(), e))
        })?;
        for event in model.events {
            events.push(event.into_basic_event()?);
        }
        for literals in model.cut_sets {
            sets.push(CutSet::new(literals)?);
        }
    }
    let graph = BooleanGraph::new(events)?;
    Ok((graph, MinimalCutSets::new(sets)))
}

/// Parses one in-memory input document; test seam for [`load_inputs`].
pub fn parse_input(text: &str) -> Result<(Vec<BasicEvent>, Vec<CutSet>)> {
    let model: InputModel =
        serde_json::from_str(text).map_err(|e| Error::config(format!("malformed input: {}", e)))?;
    let mut events = Vec::new();
    for event in model.events {
        events.push(event.into_basic_event()?);
    }
    let mut sets = Vec::new();
    for literals in model.cut_sets {
        sets.push(CutSet::new(literals)?);
    }
    Ok((events, sets))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_model() {
        let (events, sets) = parse_input(
            r#"{
                "events": [
                    { "id": "a", "index": 1, "p": 0.1 },
                    { "id": "b", "index": 2, "lambda": 1e-4 }
                ],
                "cut_sets": [[1, 2], [-1]]
            }"#,
        )
        .unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id(), "a");
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[1].literals(), &[-1]);
    }

    #[test]
    fn test_distribution_variants() {
        let (events, _) = parse_input(
            r#"{
                "events": [
                    { "id": "a", "index": 1, "p": 0.01,
                      "distribution": { "type": "lognormal", "mean": 0.01, "error_factor": 3.0 } },
                    { "id": "b", "index": 2, "p": 0.2,
                      "distribution": { "type": "uniform", "lower": 0.1, "upper": 0.3 } }
                ],
                "cut_sets": [[1]]
            }"#,
        )
        .unwrap();
        assert!(events.iter().all(BasicEvent::is_uncertain));
    }

    #[test]
    fn test_rejects_conflicting_event() {
        let err = parse_input(
            r#"{ "events": [ { "id": "a", "index": 1, "p": 0.1, "lambda": 1e-4 } ], "cut_sets": [] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));

        let err =
            parse_input(r#"{ "events": [ { "id": "a", "index": 1 } ], "cut_sets": [] }"#).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(parse_input("{"), Err(Error::Config { .. })));
        assert!(matches!(
            parse_input(r#"{ "unknown": [] }"#),
            Err(Error::Config { .. })
        ));
    }
}
