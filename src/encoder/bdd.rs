//! Hash-consed interval BDDs for the duplex encoder.
//!
//! A node represents "at most one" or "all false" over a contiguous range
//! of input variables. Its id is the propositional literal standing for the
//! node's truth value: a fresh auxiliary for inner nodes, `var` at an
//! at-most-one leaf and `-var` at an all-false leaf. Children are stored as
//! ids; intervals shrink strictly toward the leaves, so no cycles arise.

use std::collections::HashMap;

/// Constraint bound a node enforces on its interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Bound {
    /// At most one variable in the interval is true.
    AtMostOne,
    /// Every variable in the interval is false.
    AllFalse,
}

/// One BDD node over the input interval `[from, to]`. For windows built
/// right-to-left `from` is the higher end.
#[derive(Debug, Clone, Copy)]
pub(super) struct BddNode {
    pub id: i32,
    pub true_child: i32,
    pub false_child: i32,
    pub from: i32,
    pub to: i32,
    pub bound: Bound,
}

/// Store of all built nodes with one hash-consing map per bound kind:
/// every `(from, to)` pair is built at most once and shared afterwards.
#[derive(Debug, Default)]
pub(super) struct BddStore {
    nodes: HashMap<i32, BddNode>,
    amo_roots: HashMap<(i32, i32), i32>,
    amz_roots: HashMap<(i32, i32), i32>,
}

impl BddStore {
    pub fn lookup_amo(&self, from: i32, to: i32) -> Option<i32> {
        self.amo_roots.get(&(from, to)).copied()
    }

    pub fn lookup_amz(&self, from: i32, to: i32) -> Option<i32> {
        self.amz_roots.get(&(from, to)).copied()
    }

    pub fn save(&mut self, node: BddNode) {
        let roots = match node.bound {
            Bound::AtMostOne => &mut self.amo_roots,
            Bound::AllFalse => &mut self.amz_roots,
        };
        let previous = roots.insert((node.from, node.to), node.id);
        debug_assert!(previous.is_none(), "interval built twice");
        self.nodes.insert(node.id, node);
    }

    /// The input interval of a node.
    pub fn interval(&self, id: i32) -> (i32, i32) {
        let node = &self.nodes[&id];
        (node.from, node.to)
    }

    /// The at-most-one root for an interval, which must have been built.
    pub fn amo(&self, from: i32, to: i32) -> i32 {
        self.lookup_amo(from, to)
            .unwrap_or_else(|| panic!("missing at-most-one node for [{}, {}]", from, to))
    }

    /// The all-false root for an interval, which must have been built.
    pub fn amz(&self, from: i32, to: i32) -> i32 {
        self.lookup_amz(from, to)
            .unwrap_or_else(|| panic!("missing all-false node for [{}, {}]", from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consing_is_per_bound_kind() {
        let mut store = BddStore::default();
        store.save(BddNode {
            id: 7,
            true_child: 0,
            false_child: 0,
            from: 1,
            to: 3,
            bound: Bound::AtMostOne,
        });
        store.save(BddNode {
            id: 8,
            true_child: 0,
            false_child: 0,
            from: 1,
            to: 3,
            bound: Bound::AllFalse,
        });
        assert_eq!(store.lookup_amo(1, 3), Some(7));
        assert_eq!(store.lookup_amz(1, 3), Some(8));
        assert_eq!(store.lookup_amo(1, 2), None);
        assert_eq!(store.interval(8), (1, 3));
    }
}
