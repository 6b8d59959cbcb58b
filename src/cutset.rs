//! Minimal cut sets delivered by the qualitative stage.

use crate::error::{Error, Result};
use crate::graph::BooleanGraph;

/// A conjunction of literals: positive `i` is variable `i`, negative `-i`
/// its complement. Literals are kept sorted by `(|lit|, sign)` and
/// deduplicated, so a contradictory pair `i, -i` sits adjacent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutSet {
    literals: Vec<i32>,
}

impl CutSet {
    pub fn new(literals: impl IntoIterator<Item = i32>) -> Result<Self> {
        let mut literals: Vec<i32> = literals.into_iter().collect();
        for &lit in &literals {
            if lit == 0 {
                return Err(Error::GraphInconsistency { index: 0 });
            }
        }
        literals.sort_unstable_by_key(|&lit| (lit.unsigned_abs(), lit < 0));
        literals.dedup();
        Ok(Self { literals })
    }

    pub fn literals(&self) -> &[i32] {
        &self.literals
    }

    /// Number of literals (the cut-set order).
    pub fn order(&self) -> usize {
        self.literals.len()
    }

    /// Whether the set contains both a variable and its complement.
    pub fn is_contradictory(&self) -> bool {
        self.literals
            .windows(2)
            .any(|w| w[0].unsigned_abs() == w[1].unsigned_abs())
    }

    /// Union with another set; `None` when the union is contradictory.
    pub(crate) fn union(&self, other: &CutSet) -> Option<CutSet> {
        let mut literals = Vec::with_capacity(self.literals.len() + other.literals.len());
        literals.extend_from_slice(&self.literals);
        literals.extend_from_slice(&other.literals);
        literals.sort_unstable_by_key(|&lit| (lit.unsigned_abs(), lit < 0));
        literals.dedup();
        let merged = CutSet { literals };
        if merged.is_contradictory() {
            None
        } else {
            Some(merged)
        }
    }
}

/// The reduced, unordered collection of minimal cut sets.
///
/// An empty collection means the top event cannot occur.
#[derive(Debug, Clone, Default)]
pub struct MinimalCutSets {
    sets: Vec<CutSet>,
}

impl MinimalCutSets {
    pub fn new(sets: Vec<CutSet>) -> Self {
        Self { sets }
    }

    /// Checks every literal against the graph and every set against the
    /// order limit.
    pub fn validate(&self, graph: &BooleanGraph, limit_order: u32) -> Result<()> {
        for set in &self.sets {
            if set.order() as u32 > limit_order {
                return Err(Error::settings(format!(
                    "cut set of order {} exceeds the limit {}",
                    set.order(),
                    limit_order
                )));
            }
            for &lit in set.literals() {
                if graph.try_basic_event(lit.unsigned_abs()).is_none() {
                    return Err(Error::GraphInconsistency { index: lit });
                }
            }
        }
        Ok(())
    }

    pub fn sets(&self) -> &[CutSet] {
        &self.sets
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CutSet> {
        self.sets.iter()
    }
}
