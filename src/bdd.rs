//! Reduced ordered BDD of the top event, shared by the quantitative
//! analyses.
//!
//! The diagram is delivered by the qualitative stage and owned by the
//! probability calculator. Vertices live in an arena and are referenced by
//! [`Ref`] handles whose low bit is the complement tag, so negation is an
//! edge attribute and the constant-false terminal is the complement of the
//! constant-true one. Canonical form keeps high edges regular; complement
//! edges occur only on low edges and on function roots.
//!
//! Every vertex carries three scratch fields used by the traversals:
//!
//! - `mark`: the pass stamp. A pass reads the root's mark, targets its
//!   negation, and treats a vertex as evaluated once its mark equals the
//!   target; each vertex is therefore computed once per pass no matter how
//!   many parents reach it.
//! - `prob`: the memoised probability of the (regular) function rooted at
//!   the vertex, written by the bottom-up probability pass and read back by
//!   the importance traversal.
//! - `factor`: the memoised marginal-importance factor of the current query
//!   variable.
//!
//! A *module* vertex stands for a separately stored sub-function: its
//! `index` keys the `gates` table instead of naming a graph variable. The
//! diagram records, per module, the set of variable indices the module's
//! subgraph contains (transitively), and the importance traversal consults
//! that set before deciding whether a module can mention the query variable.

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{Error, Result};
use crate::reference::Ref;
use crate::utils::MyHash;

/// An internal `if index then high else low` vertex.
#[derive(Debug, Clone)]
struct Ite {
    /// Graph variable index, or the module id for module vertices.
    index: u32,
    /// Position along any path from the root; strictly increasing downward.
    order: u32,
    /// Whether `index` keys the `gates` table.
    module: bool,
    high: Ref,
    low: Ref,
    /// Next vertex in the unique-table bucket chain.
    next: u32,
    mark: bool,
    prob: f64,
    factor: f64,
}

impl Ite {
    fn sentinel() -> Self {
        Self {
            index: 0,
            order: u32::MAX,
            module: false,
            high: Ref::ONE,
            low: Ref::ONE,
            next: 0,
            mark: false,
            prob: 0.0,
            factor: 0.0,
        }
    }
}

/// Arena-backed BDD with complement edges and modules.
pub struct Bdd {
    /// Slot 0 is a sentinel, slot 1 the terminal vertex.
    nodes: Vec<Ite>,
    buckets: Vec<u32>,
    bitmask: u64,
    root: Ref,
    /// Module id -> root of the module's function (complement tag on the
    /// handle is the function complement).
    gates: FxHashMap<u32, Ref>,
    /// Module id -> variable indices contained in the module's subgraph.
    module_vars: FxHashMap<u32, FxHashSet<u32>>,
}

impl Default for Bdd {
    fn default() -> Self {
        Bdd::new(16)
    }
}

impl Bdd {
    /// Creates an empty diagram with a unique table of `2^bits` buckets.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Bucket bits should be in the range 0..=31");
        let size = 1 << bits;
        Self {
            nodes: vec![Ite::sentinel(), Ite::sentinel()],
            buckets: vec![0; size],
            bitmask: (size - 1) as u64,
            root: Ref::ZERO,
            gates: FxHashMap::default(),
            module_vars: FxHashMap::default(),
        }
    }

    /// Number of internal vertices (terminal excluded).
    pub fn size(&self) -> usize {
        self.nodes.len() - 2
    }

    pub fn root(&self) -> Ref {
        self.root
    }

    /// Installs the top-event function.
    pub fn set_root(&mut self, root: Ref) {
        self.root = root;
    }

    pub fn gates(&self) -> &FxHashMap<u32, Ref> {
        &self.gates
    }

    fn lookup(&self, index: u32, module: bool, low: Ref, high: Ref) -> usize {
        let key = ((index as u64) << 1) | (module as u64);
        (MyHash::hash(&(key, low, high)) & self.bitmask) as usize
    }

    fn mk(&mut self, index: u32, order: u32, module: bool, low: Ref, high: Ref) -> Ref {
        debug!("mk(index = {}, order = {}, low = {}, high = {})", index, order, low, high);
        assert_ne!(index, 0, "Variable index must not be zero");

        // Restore canonicity: high edges are kept regular.
        if high.is_complement() {
            debug!("mk: restoring canonicity");
            return -self.mk(index, order, module, -low, -high);
        }

        // The vertex is redundant when both branches agree.
        if low == high {
            debug!("mk: redundant vertex over {} == {}", low, high);
            return low;
        }

        let bucket_index = self.lookup(index, module, low, high);
        let mut i = self.buckets[bucket_index];

        if i == 0 {
            let node = self.push(index, order, module, low, high);
            self.buckets[bucket_index] = node.index();
            return node;
        }

        loop {
            let entry = &self.nodes[i as usize];
            if entry.index == index && entry.module == module && entry.low == low && entry.high == high {
                debug_assert_eq!(entry.order, order, "one index, two orders");
                return Ref::positive(i);
            }
            let next = self.nodes[i as usize].next;
            if next == 0 {
                let node = self.push(index, order, module, low, high);
                self.nodes[i as usize].next = node.index();
                return node;
            }
            i = next;
        }
    }

    fn push(&mut self, index: u32, order: u32, module: bool, low: Ref, high: Ref) -> Ref {
        let i = self.nodes.len() as u32;
        self.nodes.push(Ite {
            index,
            order,
            module,
            high,
            low,
            next: 0,
            mark: false,
            prob: 0.0,
            factor: 0.0,
        });
        debug!("mk: created vertex @{}", i);
        Ref::positive(i)
    }

    /// Hash-consed vertex over graph variable `index` at the given order.
    pub fn mk_node(&mut self, index: u32, order: u32, low: Ref, high: Ref) -> Ref {
        self.mk(index, order, false, low, high)
    }

    /// Vertex over variable `index` with children `one`/`zero`.
    pub fn mk_var(&mut self, index: u32, order: u32) -> Ref {
        self.mk_node(index, order, Ref::ZERO, Ref::ONE)
    }

    /// Hash-consed module vertex; `index` keys a function registered with
    /// [`Bdd::register_module`].
    pub fn mk_module_node(&mut self, index: u32, order: u32, low: Ref, high: Ref) -> Ref {
        self.mk(index, order, true, low, high)
    }

    /// Registers a module's function. Nested modules must be registered
    /// before the modules enclosing them, matching the strictly-nested
    /// construction of the fault tree.
    pub fn register_module(&mut self, index: u32, function: Ref) -> Result<()> {
        let mut vars = FxHashSet::default();
        let mut visited = FxHashSet::default();
        self.collect_vars(function, &mut vars, &mut visited)?;
        self.module_vars.insert(index, vars);
        self.gates.insert(index, function);
        Ok(())
    }

    fn collect_vars(&self, f: Ref, vars: &mut FxHashSet<u32>, visited: &mut FxHashSet<u32>) -> Result<()> {
        if f.is_terminal() || !visited.insert(f.index()) {
            return Ok(());
        }
        let node = &self.nodes[f.index() as usize];
        if node.module {
            let inner = self.module_vars.get(&node.index).ok_or_else(|| Error::MissingPrerequisite {
                what: format!("module {} is referenced before registration", node.index),
            })?;
            vars.extend(inner.iter().copied());
        } else {
            vars.insert(node.index);
        }
        self.collect_vars(node.high, vars, visited)?;
        self.collect_vars(node.low, vars, visited)
    }

    /// Whether the registered module may mention the given variable.
    /// Unregistered modules are conservatively assumed to mention it.
    pub fn module_contains(&self, module_index: u32, var_index: u32) -> bool {
        self.module_vars.get(&module_index).map_or(true, |vars| vars.contains(&var_index))
    }

    /// Sets every vertex's mark in one arena sweep.
    pub fn clear_marks(&mut self, restore_to: bool) {
        for node in &mut self.nodes[2..] {
            node.mark = restore_to;
        }
    }

    /// Current mark of the root vertex; `false` for terminal roots.
    fn root_mark(&self) -> bool {
        if self.root.is_terminal() {
            false
        } else {
            self.nodes[self.root.index() as usize].mark
        }
    }

    /// Memoised probability of the function a handle refers to, valid after
    /// a completed probability pass.
    fn retrieve_prob(&self, f: Ref) -> f64 {
        let p = if f.is_terminal() { 1.0 } else { self.nodes[f.index() as usize].prob };
        if f.is_complement() {
            1.0 - p
        } else {
            p
        }
    }

    /// Bottom-up probability of the top event under `var_probs`.
    ///
    /// One mark-flipped pass; afterwards marks are restored to their
    /// pre-call value and every visited vertex keeps its memoised `prob`.
    pub fn probability(&mut self, var_probs: &[f64]) -> f64 {
        let root = self.root;
        if root.is_terminal() {
            return if root.is_complement() { 0.0 } else { 1.0 };
        }
        let original = self.root_mark();
        let p = self.prob_traverse(root, !original, var_probs);
        self.clear_marks(original);
        p
    }

    fn prob_traverse(&mut self, f: Ref, target: bool, var_probs: &[f64]) -> f64 {
        if f.is_terminal() {
            return if f.is_complement() { 0.0 } else { 1.0 };
        }
        let i = f.index() as usize;
        if self.nodes[i].mark != target {
            self.nodes[i].mark = target;
            let (index, module, high, low) = {
                let node = &self.nodes[i];
                (node.index, node.module, node.high, node.low)
            };
            let p_var = if module {
                let function = self.gates[&index];
                self.prob_traverse(function, target, var_probs)
            } else {
                var_probs[index as usize]
            };
            let ph = self.prob_traverse(high, target, var_probs);
            let pl = self.prob_traverse(low, target, var_probs);
            self.nodes[i].prob = p_var * ph + (1.0 - p_var) * pl;
        }
        let p = self.nodes[i].prob;
        if f.is_complement() {
            1.0 - p
        } else {
            p
        }
    }

    /// Marginal importance factor of the variable `q_index` at order
    /// `q_order`, from the probability annotation of the last
    /// [`Bdd::probability`] pass.
    ///
    /// One mark-flipped pass over the part of the diagram that can mention
    /// the variable; the partial marking is swept back to the pre-call value
    /// before returning.
    pub fn mif(&mut self, var_probs: &[f64], q_index: u32, q_order: u32) -> f64 {
        let root = self.root;
        if root.is_terminal() {
            return 0.0;
        }
        let original = self.root_mark();
        let factor = self.mif_traverse(root, q_index, q_order, !original, var_probs);
        self.clear_marks(original);
        factor
    }

    fn mif_traverse(&mut self, f: Ref, q_index: u32, q_order: u32, target: bool, var_probs: &[f64]) -> f64 {
        if f.is_terminal() {
            return 0.0;
        }
        let i = f.index() as usize;
        if self.nodes[i].mark != target {
            self.nodes[i].mark = target;
            let (index, order, module, high, low) = {
                let node = &self.nodes[i];
                (node.index, node.order, node.module, node.high, node.low)
            };
            let factor = if order > q_order {
                // The subgraph below can mention the variable only through
                // a module.
                if module && self.module_contains(index, q_index) {
                    let ph = self.retrieve_prob(high);
                    let pl = self.retrieve_prob(low);
                    let function = self.gates[&index];
                    let sub = self.mif_traverse(function, q_index, q_order, target, var_probs);
                    (ph - pl) * sub
                } else {
                    0.0
                }
            } else if order == q_order {
                debug_assert!(!module, "a variable cannot be a module");
                self.retrieve_prob(high) - self.retrieve_prob(low)
            } else {
                let p_var = if module {
                    let function = self.gates[&index];
                    self.retrieve_prob(function)
                } else {
                    var_probs[index as usize]
                };
                let fh = self.mif_traverse(high, q_index, q_order, target, var_probs);
                let fl = self.mif_traverse(low, q_index, q_order, target, var_probs);
                p_var * fh + (1.0 - p_var) * fl
            };
            self.nodes[i].factor = factor;
        }
        let factor = self.nodes[i].factor;
        if f.is_complement() {
            -factor
        } else {
            factor
        }
    }

    /// Whether all marks currently equal `expected`. Used by tests and
    /// debug assertions around the mark discipline.
    pub fn marks_uniform(&self, expected: bool) -> bool {
        self.nodes[2..].iter().all(|node| node.mark == expected)
    }

    /// Renders the function as nested `index:(x_i, high, low)` brackets.
    pub fn to_bracket_string(&self, f: Ref) -> String {
        if f == Ref::ZERO {
            return "(0)".to_string();
        }
        if f == Ref::ONE {
            return "(1)".to_string();
        }
        let node = &self.nodes[f.index() as usize];
        format!(
            "{}{}:({}{}, {}, {})",
            if f.is_complement() { "~" } else { "" },
            f.index(),
            if node.module { "m" } else { "x" },
            node.index,
            self.to_bracket_string(node.high),
            self.to_bracket_string(node.low),
        )
    }
}

impl std::fmt::Debug for Bdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bdd")
            .field("size", &self.size())
            .field("root", &self.root)
            .field("modules", &self.gates.len())
            .finish()
    }
}
