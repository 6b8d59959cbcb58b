//! Final results as stable key/value records.
//!
//! The only persistence this core offers: the enabled analyses' results
//! serialized as JSON with fixed field names.

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::importance::{ImportanceAnalyzer, ImportanceFactors};
use crate::probability::ProbabilityAnalyzer;
use crate::uncertainty::UncertaintyResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbabilityRecord {
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportanceRecord {
    /// Basic-event id -> factors, emitted in id order.
    pub by_event: BTreeMap<String, ImportanceFactors>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UncertaintyRecord {
    pub mean: f64,
    pub sigma: f64,
    pub error_factor: f64,
    pub ci95_low: f64,
    pub ci95_high: f64,
    /// `[bin_lower, density]` pairs.
    pub histogram: Vec<(f64, f64)>,
    pub quantiles: Vec<f64>,
}

/// Aggregate of the enabled analyses' records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<ProbabilityRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub importance: Option<ImportanceRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<UncertaintyRecord>,
}

impl Report {
    pub fn with_probability(&mut self, prob: &ProbabilityAnalyzer<'_>) -> &mut Self {
        if let Some(value) = prob.p_total() {
            self.probability = Some(ProbabilityRecord { value });
        }
        self
    }

    pub fn with_importance(&mut self, importance: &ImportanceAnalyzer<'_, '_>) -> &mut Self {
        let by_event = importance
            .importance()
            .iter()
            .map(|(id, factors)| (id.clone(), *factors))
            .collect();
        self.importance = Some(ImportanceRecord { by_event });
        self
    }

    pub fn with_uncertainty(&mut self, result: &UncertaintyResult) -> &mut Self {
        self.uncertainty = Some(UncertaintyRecord {
            mean: result.mean,
            sigma: result.sigma,
            error_factor: result.error_factor,
            ci95_low: result.ci95.0,
            ci95_high: result.ci95.1,
            histogram: result.histogram.clone(),
            quantiles: result.quantiles.clone(),
        });
        self
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::config(format!("report serialization: {}", e)))
    }

    pub fn write<W: Write>(&self, mut writer: W) -> Result<()> {
        let json = self.to_json()?;
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cutset::{CutSet, MinimalCutSets};
    use crate::event::BasicEvent;
    use crate::graph::BooleanGraph;
    use crate::settings::Settings;

    #[test]
    fn test_record_field_names() {
        let graph = BooleanGraph::new(vec![BasicEvent::new("a", 1, 0.1).unwrap()]).unwrap();
        let mut settings = Settings::default();
        settings.importance_analysis(true).approx("rare-event").unwrap();
        let sets = MinimalCutSets::new(vec![CutSet::new([1]).unwrap()]);
        let mut prob = ProbabilityAnalyzer::new(&graph, sets, &settings).unwrap();
        prob.analyze().unwrap();
        let mut importance = ImportanceAnalyzer::new(&mut prob);
        importance.analyze().unwrap();

        let mut report = Report::default();
        report.with_importance(&importance);
        report.with_probability(&prob);

        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["probability"]["value"], 0.1);
        let factors = &value["importance"]["by_event"]["a"];
        for field in ["mif", "cif", "dif", "raw", "rrw"] {
            assert!(!factors[field].is_null() || field == "rrw", "missing field {}", field);
        }
        // RRW is infinite here; JSON renders that as null.
        assert!(factors["rrw"].is_null());
        assert!(value.get("uncertainty").is_none());
    }

    #[test]
    fn test_uncertainty_record_shape() {
        let result = UncertaintyResult {
            mean: 0.5,
            sigma: 0.1,
            error_factor: 1.2,
            ci95: (0.4, 0.6),
            histogram: vec![(0.0, 2.0)],
            quantiles: vec![0.5; 99],
        };
        let mut report = Report::default();
        report.with_uncertainty(&result);
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["uncertainty"]["ci95_low"], 0.4);
        assert_eq!(value["uncertainty"]["ci95_high"], 0.6);
        assert_eq!(value["uncertainty"]["histogram"][0][0], 0.0);
        assert_eq!(value["uncertainty"]["quantiles"].as_array().unwrap().len(), 99);
    }
}
