//! # fta-rs: quantitative fault-tree analysis in Rust
//!
//! **`fta-rs`** is the quantitative core of a probabilistic risk-assessment
//! pipeline. Given a fault tree already compiled into a Boolean variable
//! namespace and reduced into minimal cut sets --- optionally with a Binary
//! Decision Diagram of the top event --- it computes:
//!
//! - the **total probability** of the top event,
//! - **importance factors** (Birnbaum, criticality, diagnosis, risk
//!   achievement and risk reduction worth) for every basic event in the cut
//!   sets,
//! - **uncertainty statistics** (mean, standard deviation, error factor,
//!   confidence interval, histogram, quantiles) by Monte Carlo sampling of
//!   the basic-event distributions.
//!
//! ## Architecture
//!
//! All quantification goes through the
//! [`ProbabilityAnalyzer`](crate::probability::ProbabilityAnalyzer): it owns the working vector of
//! per-variable probabilities and either approximates over the cut sets
//! (rare-event, MCUB, truncated inclusion-exclusion) or propagates exactly
//! over the shared BDD. The importance and uncertainty analyses borrow the
//! calculator mutably, rewrite the vector for their conditional and sampled
//! recomputations, and restore it before returning. BDD traversals memoise
//! per-vertex results behind a flipped mark stamp, so each vertex is
//! evaluated once per pass regardless of sharing.
//!
//! ## Quick start
//!
//! ```rust
//! use fta_rs::cutset::{CutSet, MinimalCutSets};
//! use fta_rs::event::BasicEvent;
//! use fta_rs::graph::BooleanGraph;
//! use fta_rs::probability::ProbabilityAnalyzer;
//! use fta_rs::settings::Settings;
//!
//! // Two-event OR: p(a) = 0.1, p(b) = 0.2.
//! let graph = BooleanGraph::new(vec![
//!     BasicEvent::new("a", 1, 0.1).unwrap(),
//!     BasicEvent::new("b", 2, 0.2).unwrap(),
//! ])
//! .unwrap();
//! let cut_sets = MinimalCutSets::new(vec![
//!     CutSet::new([1]).unwrap(),
//!     CutSet::new([2]).unwrap(),
//! ]);
//!
//! let mut settings = Settings::default();
//! settings.probability_analysis(true).approx("rare-event").unwrap();
//!
//! let mut prob = ProbabilityAnalyzer::new(&graph, cut_sets, &settings).unwrap();
//! prob.analyze().unwrap();
//! let p = prob.p_total().unwrap();
//! assert!((p - 0.3).abs() < 1e-9);
//! ```
//!
//! ## Core components
//!
//! - **[`graph`]**: the read-only variable namespace delivered by the
//!   qualitative stage.
//! - **[`bdd`]**: the shared diagram with complement edges, modules, and
//!   the mark/probability/factor scratch fields.
//! - **[`probability`]**, **[`importance`]**, **[`uncertainty`]**: the three
//!   analyses.
//! - **[`report`]**: the final key/value records.
//! - **[`config`]** and **[`input`]**: the command-line collaborators.

pub mod bdd;
pub mod config;
pub mod cutset;
pub mod distribution;
pub mod error;
pub mod event;
pub mod graph;
pub mod importance;
pub mod input;
pub mod probability;
pub mod reference;
pub mod report;
pub mod settings;
pub mod uncertainty;
pub mod utils;
