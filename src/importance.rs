//! Importance factors of the basic events appearing in the cut sets.

use std::time::{Duration, Instant};

use log::{debug, info};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::event::BasicEvent;
use crate::probability::ProbabilityAnalyzer;

/// The importance factors of one basic event.
///
/// - `mif`: Birnbaum marginal importance, `P(top|x=1) - P(top|x=0)`.
/// - `cif`: criticality importance, `mif * p / p_total`.
/// - `dif`: Fussell-Vesely diagnosis importance, `p * P(top|x=1) / p_total`.
/// - `raw`: risk achievement worth, `P(top|x=1) / p_total`.
/// - `rrw`: risk reduction worth, `p_total / P(top|x=0)`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct ImportanceFactors {
    pub mif: f64,
    pub cif: f64,
    pub dif: f64,
    pub raw: f64,
    pub rrw: f64,
}

impl ImportanceFactors {
    /// Derives the full record from the marginal factor and its conditional
    /// probabilities.
    ///
    /// Division guards: a non-positive `P(top|x=0)` reports RRW as infinity;
    /// a non-positive total reports the ratio factors as 0. NaN is never
    /// emitted.
    fn derive(mif: f64, p_up: f64, p_down: f64, p_total: f64, p_event: f64) -> Self {
        let guarded = |x: f64| if p_total > 0.0 { x / p_total } else { 0.0 };
        Self {
            mif,
            cif: guarded(mif * p_event),
            dif: guarded(p_event * p_up),
            raw: guarded(p_up),
            rrw: if p_down > 0.0 { p_total / p_down } else { f64::INFINITY },
        }
    }
}

/// Quantifier of per-event importance (C3).
///
/// Borrows the completed probability analyzer; its conditional
/// recomputations temporarily rewrite `var_probs`, which is restored before
/// `analyze` returns.
pub struct ImportanceAnalyzer<'a, 'g> {
    prob: &'a mut ProbabilityAnalyzer<'g>,
    importance: FxHashMap<String, ImportanceFactors>,
    important_events: Vec<(&'g BasicEvent, ImportanceFactors)>,
    done: bool,
    analysis_time: Duration,
}

impl<'a, 'g> ImportanceAnalyzer<'a, 'g> {
    pub fn new(prob: &'a mut ProbabilityAnalyzer<'g>) -> Self {
        Self {
            prob,
            importance: FxHashMap::default(),
            important_events: Vec::new(),
            done: false,
            analysis_time: Duration::ZERO,
        }
    }

    /// Runs the single-shot importance analysis.
    pub fn analyze(&mut self) -> Result<()> {
        if self.done {
            return Err(Error::MissingPrerequisite {
                what: "importance analysis already ran; analyses are single-shot".into(),
            });
        }
        let p_total = self.prob.p_total().ok_or_else(|| Error::MissingPrerequisite {
            what: "importance analysis needs a completed probability analysis".into(),
        })?;
        let start = Instant::now();
        let mission_time = self.prob.settings().get_mission_time();

        #[cfg(debug_assertions)]
        let var_probs_before = self.prob.var_probs().to_vec();

        for (index, event) in self.gather_important_events() {
            let (mif, p_up, p_down) = self.prob.importance_inputs(index);
            let p_event = event.p(mission_time);
            let factors = ImportanceFactors::derive(mif, p_up, p_down, p_total, p_event);
            debug!("importance of '{}': {:?}", event.id(), factors);
            self.importance.insert(event.id().to_string(), factors);
            self.important_events.push((event, factors));
        }

        #[cfg(debug_assertions)]
        debug_assert_eq!(var_probs_before, self.prob.var_probs(), "var_probs not restored");

        self.done = true;
        self.analysis_time = start.elapsed();
        info!("importance analysis covered {} events", self.important_events.len());
        Ok(())
    }

    /// Events present in the cut sets, in first-encounter order. Only these
    /// can have importance factors.
    fn gather_important_events(&self) -> Vec<(u32, &'g BasicEvent)> {
        let graph = self.prob.graph();
        let mut unique = FxHashSet::default();
        let mut events = Vec::new();
        for set in self.prob.cut_sets().iter() {
            for &literal in set.literals() {
                let index = literal.unsigned_abs();
                if unique.insert(index) {
                    events.push((index, graph.basic_event(index)));
                }
            }
        }
        events
    }

    /// Map from basic-event id to its factors.
    pub fn importance(&self) -> &FxHashMap<String, ImportanceFactors> {
        &self.importance
    }

    /// Events with their factors, in first-encounter order over the cut
    /// sets.
    pub fn important_events(&self) -> &[(&'g BasicEvent, ImportanceFactors)] {
        &self.important_events
    }

    pub fn analysis_time(&self) -> Duration {
        self.analysis_time
    }
}
