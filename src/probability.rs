//! Total probability of the top event.
//!
//! The calculator owns the working vector of per-variable probabilities and
//! computes the top-event probability either from the minimal cut sets
//! (rare-event, MCUB, or truncated inclusion-exclusion, selected by the
//! settings) or, when the qualitative stage delivered one, from the shared
//! BDD by bottom-up propagation.
//!
//! `calculate_total_probability` is deliberately infallible: all inputs are
//! validated at construction, and numeric excursions (rare-event sums above
//! 1, negative rounding dust) are clamped back into `[0, 1]`. The importance
//! and uncertainty analyses call it in a loop while temporarily rewriting
//! `var_probs`; they restore the vector before returning.

use std::time::{Duration, Instant};

use log::{debug, info};

use crate::bdd::Bdd;
use crate::cutset::{CutSet, MinimalCutSets};
use crate::error::{Error, Result};
use crate::graph::BooleanGraph;
use crate::settings::{Approximation, Settings};

enum Mode {
    /// Approximate from the cut sets alone.
    CutSets(Approximation),
    /// Exact propagation over the delivered diagram.
    Bdd(Bdd),
}

/// Quantifier of the top event (C2).
pub struct ProbabilityAnalyzer<'g> {
    graph: &'g BooleanGraph,
    cut_sets: MinimalCutSets,
    settings: Settings,
    mode: Mode,
    /// Working probability per variable; slot 0 unused.
    var_probs: Vec<f64>,
    p_total: Option<f64>,
    analysis_time: Duration,
}

impl<'g> ProbabilityAnalyzer<'g> {
    /// Cut-set-mode analyzer; the formula is fixed by `settings.approx`.
    pub fn new(graph: &'g BooleanGraph, cut_sets: MinimalCutSets, settings: &Settings) -> Result<Self> {
        Self::build(graph, cut_sets, settings, None)
    }

    /// Exact analyzer over a delivered BDD.
    pub fn with_bdd(
        graph: &'g BooleanGraph,
        cut_sets: MinimalCutSets,
        settings: &Settings,
        bdd: Bdd,
    ) -> Result<Self> {
        Self::build(graph, cut_sets, settings, Some(bdd))
    }

    fn build(
        graph: &'g BooleanGraph,
        cut_sets: MinimalCutSets,
        settings: &Settings,
        bdd: Option<Bdd>,
    ) -> Result<Self> {
        cut_sets.validate(graph, settings.get_limit_order())?;

        let mission_time = settings.get_mission_time();
        let mut var_probs = vec![0.0; graph.num_vars() as usize + 1];
        for event in graph.events() {
            var_probs[event.index() as usize] = event.p(mission_time);
        }

        let mode = match bdd {
            Some(bdd) => Mode::Bdd(bdd),
            None => Mode::CutSets(settings.approximation()),
        };

        Ok(Self {
            graph,
            cut_sets,
            settings: settings.clone(),
            mode,
            var_probs,
            p_total: None,
            analysis_time: Duration::ZERO,
        })
    }

    pub fn graph(&self) -> &'g BooleanGraph {
        self.graph
    }

    pub fn cut_sets(&self) -> &MinimalCutSets {
        &self.cut_sets
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Total probability recorded by [`ProbabilityAnalyzer::analyze`].
    pub fn p_total(&self) -> Option<f64> {
        self.p_total
    }

    pub fn analysis_time(&self) -> Duration {
        self.analysis_time
    }

    pub fn var_probs(&self) -> &[f64] {
        &self.var_probs
    }

    pub(crate) fn var_probs_mut(&mut self) -> &mut [f64] {
        &mut self.var_probs
    }

    /// Runs the single-shot probability analysis.
    pub fn analyze(&mut self) -> Result<()> {
        if self.p_total.is_some() {
            return Err(Error::MissingPrerequisite {
                what: "probability analysis already ran; analyses are single-shot".into(),
            });
        }
        let start = Instant::now();
        let p = self.calculate_total_probability();
        self.p_total = Some(p);
        self.analysis_time = start.elapsed();
        info!("total probability of the top event: {}", p);
        Ok(())
    }

    /// Computes the top-event probability from the current `var_probs`.
    ///
    /// Infallible after construction; the result is clamped into `[0, 1]`.
    pub fn calculate_total_probability(&mut self) -> f64 {
        let p = match &mut self.mode {
            Mode::Bdd(bdd) => bdd.probability(&self.var_probs),
            Mode::CutSets(approx) => match approx {
                Approximation::RareEvent => prob_rare_event(self.cut_sets.sets(), &self.var_probs),
                Approximation::Mcub => prob_mcub(self.cut_sets.sets(), &self.var_probs),
                Approximation::None => {
                    prob_or(self.cut_sets.sets(), self.settings.get_num_sums(), &self.var_probs)
                }
            },
        };
        debug!("calculate_total_probability -> {}", p);
        clamp_unit(p)
    }

    /// Marginal importance factor with its conditional probabilities,
    /// `(mif, p_up, p_down)` where `p_up = P(top | x_i = 1)` and
    /// `p_down = P(top | x_i = 0)`.
    ///
    /// Cut-set mode pins `var_probs[i]` to 1 and 0 around full
    /// recomputations and restores the slot. BDD mode runs one factor
    /// traversal against the memoised probability annotation and recovers
    /// the conditionals algebraically (the Shannon expansion is multilinear
    /// in every variable, so the recovery is exact).
    pub(crate) fn importance_inputs(&mut self, index: u32) -> (f64, f64, f64) {
        let order = self.graph.index_to_order(index);
        if let Mode::Bdd(bdd) = &mut self.mode {
            let mif = bdd.mif(&self.var_probs, index, order);
            let p = self.p_total.unwrap_or(0.0);
            let p_event = self.var_probs[index as usize];
            let p_down = clamp_unit(p - p_event * mif);
            let p_up = clamp_unit(p_down + mif);
            return (mif, p_up, p_down);
        }

        let slot = index as usize;
        let original = self.var_probs[slot];

        self.var_probs[slot] = 1.0;
        let p_up = self.calculate_total_probability();

        self.var_probs[slot] = 0.0;
        let p_down = self.calculate_total_probability();

        self.var_probs[slot] = original;
        (p_up - p_down, p_up, p_down)
    }
}

fn clamp_unit(p: f64) -> f64 {
    // max before min: a stray NaN lands on 0, never in the results.
    p.max(0.0).min(1.0)
}

/// Probability of one cut set under the working probabilities; negative
/// literals contribute the complement, a contradictory set contributes 0.
fn cut_set_probability(set: &CutSet, var_probs: &[f64]) -> f64 {
    if set.is_contradictory() {
        return 0.0;
    }
    set.literals()
        .iter()
        .map(|&lit| {
            let p = var_probs[lit.unsigned_abs() as usize];
            if lit < 0 {
                1.0 - p
            } else {
                p
            }
        })
        .product()
}

/// Rare-event approximation: the plain sum of cut-set probabilities.
fn prob_rare_event(sets: &[CutSet], var_probs: &[f64]) -> f64 {
    sets.iter().map(|set| cut_set_probability(set, var_probs)).sum()
}

/// Min-cut upper bound: `1 - prod(1 - P(c))`. Exact for disjoint cut sets.
fn prob_mcub(sets: &[CutSet], var_probs: &[f64]) -> f64 {
    1.0 - sets.iter().map(|set| 1.0 - cut_set_probability(set, var_probs)).product::<f64>()
}

/// Truncated inclusion-exclusion over the union of cut sets.
///
/// The k-th alternating sum contributes with sign `(-1)^(k+1)`; the
/// recursion peels the first set and charges its pairwise unions to the next
/// depth, so `num_sums` bounds how many sums are expanded:
///
/// ```text
/// P(A v rest) = P(A) + P(rest) - P(A ^ rest)
/// ```
fn prob_or(sets: &[CutSet], num_sums: u32, var_probs: &[f64]) -> f64 {
    if num_sums == 0 || sets.is_empty() {
        return 0.0;
    }
    let (first, rest) = sets.split_first().expect("non-empty");
    let p_first = cut_set_probability(first, var_probs);
    let combined: Vec<CutSet> = rest.iter().filter_map(|set| first.union(set)).collect();
    p_first + prob_or(rest, num_sums, var_probs) - prob_or(&combined, num_sums - 1, var_probs)
}
