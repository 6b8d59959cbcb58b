//! Monte Carlo uncertainty of the top-event probability.

use std::time::{Duration, Instant};

use log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::probability::ProbabilityAnalyzer;

/// Number of equal-width histogram bins over the sample range.
const NUM_BINS: usize = 20;

/// Summary statistics of the sampled top-event probability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UncertaintyResult {
    pub mean: f64,
    /// Unbiased (n-1) standard deviation.
    pub sigma: f64,
    /// 95% error factor, `q(0.95) / q(0.50)`.
    pub error_factor: f64,
    /// 95% confidence interval of the mean.
    pub ci95: (f64, f64),
    /// `(bin_lower, density)` pairs; densities integrate to 1 over the
    /// sample range.
    pub histogram: Vec<(f64, f64)>,
    /// The 100-quantile table, `q(0.01)` through `q(0.99)`.
    pub quantiles: Vec<f64>,
}

/// Monte Carlo quantifier of the top-event uncertainty (C4).
///
/// Each trial samples every basic event that carries a distribution, writes
/// the clamped draws into the shared `var_probs`, and delegates the total
/// probability to the probability calculator. The vector is restored to its
/// entry values before `analyze` returns, on the error path included.
pub struct UncertaintyAnalyzer<'a, 'g> {
    prob: &'a mut ProbabilityAnalyzer<'g>,
    result: Option<UncertaintyResult>,
    analysis_time: Duration,
}

impl<'a, 'g> UncertaintyAnalyzer<'a, 'g> {
    pub fn new(prob: &'a mut ProbabilityAnalyzer<'g>) -> Self {
        Self { prob, result: None, analysis_time: Duration::ZERO }
    }

    /// Runs the single-shot uncertainty analysis.
    pub fn analyze(&mut self) -> Result<()> {
        if self.result.is_some() {
            return Err(Error::MissingPrerequisite {
                what: "uncertainty analysis already ran; analyses are single-shot".into(),
            });
        }
        if self.prob.p_total().is_none() {
            return Err(Error::MissingPrerequisite {
                what: "uncertainty analysis needs a completed probability analysis".into(),
            });
        }
        let start = Instant::now();
        let samples = self.sample()?;
        self.result = Some(calculate_statistics(&samples));
        self.analysis_time = start.elapsed();
        info!("uncertainty analysis drew {} trials", samples.len());
        Ok(())
    }

    /// The sampled top-event probabilities, one per trial.
    ///
    /// Bit-reproducible for a fixed `(seed, num_trials, graph,
    /// distributions)`.
    fn sample(&mut self) -> Result<Vec<f64>> {
        let num_trials = self.prob.settings().get_num_trials() as usize;
        let seed = self.prob.settings().get_seed();
        let mission_time = self.prob.settings().get_mission_time();

        let uncertain: Vec<_> = self.prob.graph().events().filter(|e| e.is_uncertain()).collect();
        debug!("{} of {} events carry distributions", uncertain.len(), self.prob.graph().num_vars());

        let saved: Vec<(usize, f64)> = uncertain
            .iter()
            .map(|event| {
                let slot = event.index() as usize;
                (slot, self.prob.var_probs()[slot])
            })
            .collect();

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for event in &uncertain {
            event.reset();
        }

        let mut samples = Vec::with_capacity(num_trials);
        for _ in 0..num_trials {
            for event in &uncertain {
                event.reset();
            }
            for event in &uncertain {
                let draw = event.sample(mission_time, &mut rng);
                if !draw.is_finite() {
                    self.restore(&saved);
                    return Err(Error::DistributionDomain {
                        id: event.id().to_string(),
                        value: draw,
                    });
                }
                self.prob.var_probs_mut()[event.index() as usize] = draw.max(0.0).min(1.0);
            }
            let p = self.prob.calculate_total_probability();
            samples.push(p.max(0.0).min(1.0));
        }

        self.restore(&saved);
        Ok(samples)
    }

    fn restore(&mut self, saved: &[(usize, f64)]) {
        for &(slot, value) in saved {
            self.prob.var_probs_mut()[slot] = value;
        }
    }

    /// The summary recorded by [`UncertaintyAnalyzer::analyze`].
    pub fn result(&self) -> Option<&UncertaintyResult> {
        self.result.as_ref()
    }

    pub fn analysis_time(&self) -> Duration {
        self.analysis_time
    }
}

/// Summarises the sample distribution.
fn calculate_statistics(samples: &[f64]) -> UncertaintyResult {
    let n = samples.len();
    assert!(n > 0, "num_trials is validated to be at least 1");

    let mean = samples.iter().sum::<f64>() / n as f64;
    let sigma = if n > 1 {
        (samples.iter().map(|s| (s - mean) * (s - mean)).sum::<f64>() / (n - 1) as f64).sqrt()
    } else {
        0.0
    };

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("samples are clamped, never NaN"));
    let quantile = |p: f64| sorted[(p * (n - 1) as f64) as usize];

    let quantiles: Vec<f64> = (1..100).map(|i| quantile(i as f64 / 100.0)).collect();
    let median = quantile(0.50);
    let error_factor = if median > 0.0 { quantile(0.95) / median } else { f64::INFINITY };

    let half_width = 1.96 * sigma / (n as f64).sqrt();
    let ci95 = (mean - half_width, mean + half_width);

    let min = sorted[0];
    let max = sorted[n - 1];
    let bin_width = (max - min) / NUM_BINS as f64;
    let histogram = if bin_width > 0.0 {
        let mut counts = [0usize; NUM_BINS];
        for &s in samples {
            let bin = ((s - min) / bin_width) as usize;
            counts[bin.min(NUM_BINS - 1)] += 1;
        }
        counts
            .iter()
            .enumerate()
            .map(|(k, &count)| (min + k as f64 * bin_width, count as f64 / (n as f64 * bin_width)))
            .collect()
    } else {
        // Degenerate sample: every draw identical.
        vec![(min, 0.0)]
    };

    UncertaintyResult { mean, sigma, error_factor, ci95, histogram, quantiles }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cutset::{CutSet, MinimalCutSets};
    use crate::distribution::Deviate;
    use crate::event::BasicEvent;
    use crate::graph::BooleanGraph;
    use crate::settings::Settings;

    fn lognormal_graph() -> BooleanGraph {
        let event = BasicEvent::new("a", 1, 0.01)
            .unwrap()
            .with_deviate(Deviate::lognormal(0.01, 3.0).unwrap());
        BooleanGraph::new(vec![event]).unwrap()
    }

    fn mcs_single() -> MinimalCutSets {
        MinimalCutSets::new(vec![CutSet::new([1]).unwrap()])
    }

    fn settings(trials: u32, seed: u64) -> Settings {
        let mut s = Settings::default();
        s.uncertainty_analysis(true).approx("rare-event").unwrap();
        s.num_trials(trials).unwrap().seed(seed);
        s
    }

    fn run(trials: u32, seed: u64) -> UncertaintyResult {
        let graph = lognormal_graph();
        let s = settings(trials, seed);
        let mut prob = ProbabilityAnalyzer::new(&graph, mcs_single(), &s).unwrap();
        prob.analyze().unwrap();
        let mut uncertainty = UncertaintyAnalyzer::new(&mut prob);
        uncertainty.analyze().unwrap();
        uncertainty.result().unwrap().clone()
    }

    #[test]
    fn test_deterministic_per_seed() {
        let a = run(2000, 12345);
        let b = run(2000, 12345);
        assert_eq!(a, b);

        let c = run(2000, 54321);
        assert_ne!(a.mean, c.mean);
    }

    #[test]
    fn test_statistics_sanity() {
        let r = run(5000, 12345);
        assert!(r.mean > 0.0 && r.mean < 1.0);
        assert!(r.sigma > 0.0);
        assert!(r.ci95.0 <= r.mean && r.mean <= r.ci95.1);
        assert!(r.error_factor > 1.0);
        assert_eq!(r.quantiles.len(), 99);
        assert!(r.quantiles.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_histogram_integrates_to_one() {
        let r = run(5000, 7);
        assert_eq!(r.histogram.len(), NUM_BINS);
        let bin_width = r.histogram[1].0 - r.histogram[0].0;
        let total: f64 = r.histogram.iter().map(|(_, density)| density * bin_width).sum();
        assert!((total - 1.0).abs() < 1e-9, "densities integrate to {}", total);
    }

    #[test]
    fn test_var_probs_restored() {
        let graph = lognormal_graph();
        let s = settings(100, 1);
        let mut prob = ProbabilityAnalyzer::new(&graph, mcs_single(), &s).unwrap();
        prob.analyze().unwrap();
        let before = prob.var_probs().to_vec();
        let mut uncertainty = UncertaintyAnalyzer::new(&mut prob);
        uncertainty.analyze().unwrap();
        drop(uncertainty);
        assert_eq!(prob.var_probs(), &before[..]);
    }

    #[test]
    fn test_degenerate_sample_histogram() {
        // No distributions: every trial reproduces the nominal probability.
        let graph = BooleanGraph::new(vec![BasicEvent::new("a", 1, 0.25).unwrap()]).unwrap();
        let s = settings(50, 3);
        let mut prob = ProbabilityAnalyzer::new(&graph, mcs_single(), &s).unwrap();
        prob.analyze().unwrap();
        let mut uncertainty = UncertaintyAnalyzer::new(&mut prob);
        uncertainty.analyze().unwrap();
        let r = uncertainty.result().unwrap();
        assert_eq!(r.mean, 0.25);
        assert_eq!(r.sigma, 0.0);
        assert_eq!(r.histogram, vec![(0.25, 0.0)]);
    }

    #[test]
    fn test_prerequisite_and_single_shot() {
        let graph = lognormal_graph();
        let s = settings(10, 1);
        let mut prob = ProbabilityAnalyzer::new(&graph, mcs_single(), &s).unwrap();

        let mut early = UncertaintyAnalyzer::new(&mut prob);
        assert!(matches!(early.analyze(), Err(Error::MissingPrerequisite { .. })));
        drop(early);

        prob.analyze().unwrap();
        let mut uncertainty = UncertaintyAnalyzer::new(&mut prob);
        uncertainty.analyze().unwrap();
        assert!(matches!(uncertainty.analyze(), Err(Error::MissingPrerequisite { .. })));
    }

    #[test]
    fn test_non_finite_draw_fails_and_restores() {
        struct NanSampler;
        impl crate::distribution::Sampler for NanSampler {
            fn sample(&self, _rng: &mut dyn rand::RngCore) -> f64 {
                f64::NAN
            }
        }

        let event = BasicEvent::new("a", 1, 0.1)
            .unwrap()
            .with_deviate(Deviate::expression(Box::new(NanSampler)));
        let graph = BooleanGraph::new(vec![event]).unwrap();
        let s = settings(10, 1);
        let mut prob = ProbabilityAnalyzer::new(&graph, mcs_single(), &s).unwrap();
        prob.analyze().unwrap();
        let before = prob.var_probs().to_vec();

        let mut uncertainty = UncertaintyAnalyzer::new(&mut prob);
        let err = uncertainty.analyze().unwrap_err();
        assert!(matches!(err, Error::DistributionDomain { .. }));
        assert!(uncertainty.result().is_none());
        drop(uncertainty);
        assert_eq!(prob.var_probs(), &before[..]);
    }

    #[test]
    fn test_statistics_of_known_sample() {
        let samples = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let r = calculate_statistics(&samples);
        assert!((r.mean - 3.0).abs() < 1e-12);
        assert!((r.sigma - (2.5f64).sqrt()).abs() < 1e-12);
        assert_eq!(r.quantiles[49], 3.0); // q(0.50)
        // q(0.95) lands on index 3 of the sorted sample.
        assert!((r.error_factor - 4.0 / 3.0).abs() < 1e-12);
    }
}
