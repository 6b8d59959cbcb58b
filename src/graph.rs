//! Read-only view of the compiled Boolean graph.
//!
//! The qualitative stage compiles the fault tree into variables `1..=N` and
//! hands the quantitative core this view: a map from positive variable
//! indices to basic-event descriptors plus the index-to-order permutation
//! used along BDD paths (a variable with a smaller order sits nearer the
//! root).

use crate::error::{Error, Result};
use crate::event::BasicEvent;

/// Immutable variable namespace of one analysis.
#[derive(Debug)]
pub struct BooleanGraph {
    /// 1-indexed; slot 0 is an unused sentinel.
    events: Vec<Option<BasicEvent>>,
    /// 1-indexed; `order[i]` is the BDD order of variable `i`.
    order: Vec<u32>,
}

impl BooleanGraph {
    /// Builds the view from basic events with indices in `1..=N`.
    ///
    /// Every index must be bound exactly once. The default variable ordering
    /// is the index order; [`BooleanGraph::set_order`] installs another one.
    pub fn new(events: Vec<BasicEvent>) -> Result<Self> {
        let n = events.len();
        let mut slots: Vec<Option<BasicEvent>> = Vec::with_capacity(n + 1);
        slots.resize_with(n + 1, || None);
        for event in events {
            let i = event.index() as usize;
            if i == 0 || i > n {
                return Err(Error::GraphInconsistency { index: event.index() as i32 });
            }
            if slots[i].is_some() {
                return Err(Error::config(format!(
                    "variable {} is bound to more than one basic event",
                    i
                )));
            }
            slots[i] = Some(event);
        }
        let order = (0..=n as u32).collect();
        Ok(Self { events: slots, order })
    }

    /// Installs a variable ordering; `order[i]` is the order of variable `i`
    /// and the values must form a permutation of `1..=N`.
    pub fn set_order(&mut self, order: Vec<u32>) -> Result<()> {
        let n = self.num_vars() as usize;
        if order.len() != n + 1 {
            return Err(Error::config(format!(
                "ordering has {} entries for {} variables",
                order.len(),
                n
            )));
        }
        let mut seen = vec![false; n + 1];
        for &o in &order[1..] {
            if o == 0 || o as usize > n || seen[o as usize] {
                return Err(Error::config(format!("ordering is not a permutation at {}", o)));
            }
            seen[o as usize] = true;
        }
        self.order = order;
        Ok(())
    }

    /// Number of variables `N`.
    pub fn num_vars(&self) -> u32 {
        (self.events.len() - 1) as u32
    }

    /// Descriptor of variable `index`.
    ///
    /// # Panics
    ///
    /// Panics if the index is unbound; analyses validate their inputs
    /// against the graph before any lookup.
    pub fn basic_event(&self, index: u32) -> &BasicEvent {
        self.try_basic_event(index)
            .unwrap_or_else(|| panic!("no basic event behind index {}", index))
    }

    pub fn try_basic_event(&self, index: u32) -> Option<&BasicEvent> {
        self.events.get(index as usize).and_then(Option::as_ref)
    }

    /// BDD order of variable `index`.
    pub fn index_to_order(&self, index: u32) -> u32 {
        self.order[index as usize]
    }

    /// Events in index order.
    pub fn events(&self) -> impl Iterator<Item = &BasicEvent> {
        self.events.iter().filter_map(Option::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_events() -> Vec<BasicEvent> {
        vec![
            BasicEvent::new("a", 1, 0.1).unwrap(),
            BasicEvent::new("b", 2, 0.2).unwrap(),
            BasicEvent::new("c", 3, 0.3).unwrap(),
        ]
    }

    #[test]
    fn test_lookup() {
        let graph = BooleanGraph::new(three_events()).unwrap();
        assert_eq!(graph.num_vars(), 3);
        assert_eq!(graph.basic_event(2).id(), "b");
        assert!(graph.try_basic_event(4).is_none());
        assert_eq!(graph.index_to_order(3), 3);
    }

    #[test]
    fn test_rejects_gaps_and_duplicates() {
        let gap = vec![BasicEvent::new("a", 1, 0.1).unwrap(), BasicEvent::new("c", 3, 0.3).unwrap()];
        assert!(BooleanGraph::new(gap).is_err());

        let dup = vec![BasicEvent::new("a", 1, 0.1).unwrap(), BasicEvent::new("b", 1, 0.2).unwrap()];
        assert!(BooleanGraph::new(dup).is_err());
    }

    #[test]
    fn test_custom_order() {
        let mut graph = BooleanGraph::new(three_events()).unwrap();
        graph.set_order(vec![0, 3, 1, 2]).unwrap();
        assert_eq!(graph.index_to_order(1), 3);
        assert_eq!(graph.index_to_order(2), 1);

        assert!(graph.set_order(vec![0, 1, 1, 2]).is_err());
        assert!(graph.set_order(vec![0, 1, 2]).is_err());
    }
}
