//! Duplex encoding: windowed at-most-one via interval BDDs.
//!
//! Each vertex row is partitioned into windows of `w` consecutive labels
//! (the last window may be shorter). Per window an at-most-one and an
//! all-false BDD are built, forward for all but the last window and
//! backward (right-to-left) for all but the first; matching middle windows
//! are made equal by mutual implication. Window AMO roots are asserted as
//! units, the all-false roots form a per-row "exactly one window occupied"
//! block, and a seam slides across each window boundary recording two-literal
//! all-false alternatives into the node-window literal table. Edge gluing
//! takes the Cartesian product of the two endpoints' table entries. Columns
//! get an explicit 2-product exactly-one.

use crate::cnf::Emitter;
use crate::graph::Graph;

use super::bdd::{BddNode, BddStore, Bound};
use super::{column_vars, product_exactly_one, proper_edges};

pub(super) fn encode(em: &mut Emitter<'_>, graph: &Graph, width: usize) {
    let mut encoder = DuplexEncoder::new(graph.num_vertices());
    encoder.build_window_bdds(em, graph, width);
    encoder.glue_windows(em, graph);
    for (u, v) in proper_edges(em, graph) {
        encoder.glue_edge(em, u - 1, v - 1);
    }
    for label in 1..=graph.num_vertices() {
        product_exactly_one(em, &column_vars(graph, label));
    }
}

struct DuplexEncoder {
    store: BddStore,
    /// Per vertex, per window: AMO / all-false root ids in forward and
    /// backward orientation. Boundary windows exist in one orientation only
    /// and are entered into both tables.
    fwd_amo: Vec<Vec<i32>>,
    bwd_amo: Vec<Vec<i32>>,
    fwd_amz: Vec<Vec<i32>>,
    bwd_amz: Vec<Vec<i32>>,
    /// Node-window literal table: per vertex one entry per seam position,
    /// each a one- or two-literal all-false alternative.
    seam_table: Vec<Vec<Vec<i32>>>,
    windows: usize,
}

impl DuplexEncoder {
    fn new(n: usize) -> Self {
        Self {
            store: BddStore::default(),
            fwd_amo: vec![Vec::new(); n],
            bwd_amo: vec![Vec::new(); n],
            fwd_amz: vec![Vec::new(); n],
            bwd_amz: vec![Vec::new(); n],
            seam_table: Vec::with_capacity(n),
            windows: 0,
        }
    }

    fn build_window_bdds(&mut self, em: &mut Emitter<'_>, graph: &Graph, width: usize) {
        let n = graph.num_vertices();
        let mut windows = n / width;
        if n % width != 0 {
            windows += 1;
        }
        self.windows = windows;

        for vertex in 0..n {
            for gw in 0..windows {
                let first = (vertex * n + gw * width + 1) as i32;
                let last = if gw == windows - 1 {
                    ((vertex + 1) * n) as i32
                } else {
                    first + width as i32 - 1
                };
                let vars: Vec<i32> = (first..=last).collect();

                let window_amo;
                if windows == 1 {
                    // a single window serves both orientations
                    let amo = self.build_amo(em, &vars);
                    let amz = self.build_amz(em, &vars);
                    self.fwd_amo[vertex].push(amo);
                    self.fwd_amz[vertex].push(amz);
                    self.bwd_amo[vertex].push(amo);
                    self.bwd_amz[vertex].push(amz);
                    window_amo = amo;
                } else if gw == 0 {
                    let amo = self.build_amo(em, &vars);
                    let amz = self.build_amz(em, &vars);
                    self.fwd_amo[vertex].push(amo);
                    self.fwd_amz[vertex].push(amz);
                    self.bwd_amo[vertex].push(amo);
                    self.bwd_amz[vertex].push(amz);
                    window_amo = amo;
                } else if gw == windows - 1 {
                    let reversed: Vec<i32> = vars.iter().rev().copied().collect();
                    let amo = self.build_amo(em, &reversed);
                    let amz = self.build_amz(em, &reversed);
                    self.bwd_amo[vertex].push(amo);
                    self.bwd_amz[vertex].push(amz);
                    self.fwd_amo[vertex].push(amo);
                    self.fwd_amz[vertex].push(amz);
                    window_amo = amo;
                } else {
                    let fwd_amo = self.build_amo(em, &vars);
                    let fwd_amz = self.build_amz(em, &vars);
                    let reversed: Vec<i32> = vars.iter().rev().copied().collect();
                    let bwd_amo = self.build_amo(em, &reversed);
                    let bwd_amz = self.build_amz(em, &reversed);
                    self.fwd_amo[vertex].push(fwd_amo);
                    self.fwd_amz[vertex].push(fwd_amz);
                    self.bwd_amo[vertex].push(bwd_amo);
                    self.bwd_amz[vertex].push(bwd_amz);
                    make_equal(em, fwd_amo, bwd_amo);
                    make_equal(em, fwd_amz, bwd_amz);
                    window_amo = fwd_amo;
                }

                if vars.len() > 1 {
                    em.add(&[window_amo]);
                }
            }

            // exactly one window of the row is occupied
            let roots = &self.fwd_amz[vertex];
            debug_assert!(!roots.is_empty());
            let mut occupied = Vec::with_capacity(roots.len());
            for (i, &a) in roots.iter().enumerate() {
                occupied.push(-a);
                for &b in &roots[i + 1..] {
                    em.add(&[a, b]);
                }
            }
            em.add(&occupied);
        }
    }

    fn glue_windows(&mut self, em: &mut Emitter<'_>, graph: &Graph) {
        for vertex in 0..graph.num_vertices() {
            let mut table: Vec<Vec<i32>> = Vec::new();
            for window in 0..self.windows - 1 {
                table.push(vec![self.fwd_amz[vertex][window]]);

                let fwd_root = self.fwd_amo[vertex][window];
                let bwd_root = self.bwd_amo[vertex][window + 1];
                let (fwd_from, fwd_to) = self.store.interval(fwd_root);
                let (bwd_from, bwd_to) = self.store.interval(bwd_root);
                debug_assert_eq!(bwd_to, fwd_to + 1);

                if fwd_from != fwd_to {
                    em.add(&[fwd_root]);
                }
                if bwd_from != bwd_to {
                    em.add(&[bwd_root]);
                }

                // slide the seam: either the left-of-seam suffix or the
                // right-of-seam prefix is all false
                let mut left = fwd_from + 1;
                let mut right = fwd_to + 1;
                while left <= fwd_to && right <= bwd_from {
                    let left_amo = self.store.amo(left, fwd_to);
                    let left_amz = self.store.amz(left, fwd_to);
                    let right_amo = self.store.amo(right, fwd_to + 1);
                    let right_amz = self.store.amz(right, fwd_to + 1);

                    if left < fwd_to {
                        em.add(&[left_amo]);
                    }
                    if right > fwd_to + 1 {
                        em.add(&[right_amo]);
                    }
                    em.add(&[left_amz, right_amz]);
                    table.push(vec![left_amz, right_amz]);

                    left += 1;
                    right += 1;
                }
            }
            table.push(vec![self.bwd_amz[vertex][self.windows - 1]]);
            self.seam_table.push(table);
        }
    }

    /// Cartesian product of the two endpoints' table entries: the edge
    /// forbids both labels inside the same w-wide band.
    fn glue_edge(&self, em: &mut Emitter<'_>, u: usize, v: usize) {
        debug_assert_eq!(self.seam_table[u].len(), self.seam_table[v].len());
        for (u_entry, v_entry) in self.seam_table[u].iter().zip(&self.seam_table[v]) {
            for &a in u_entry {
                for &b in v_entry {
                    em.add(&[a, b]);
                }
            }
        }
    }

    fn build_amo(&mut self, em: &mut Emitter<'_>, vars: &[i32]) -> i32 {
        let from = vars[0];
        let to = vars[vars.len() - 1];
        if let Some(id) = self.store.lookup_amo(from, to) {
            return id;
        }

        let node = if vars.len() == 1 {
            BddNode {
                id: from,
                true_child: 0,
                false_child: 0,
                from,
                to,
                bound: Bound::AtMostOne,
            }
        } else {
            let id = em.fresh_var();
            let false_child = self.build_amo(em, &vars[1..]);
            let true_child = self.build_amz(em, &vars[1..]);
            em.add(&[-from, -id, true_child]);
            if vars.len() > 2 {
                em.add(&[-id, false_child]);
            }
            BddNode {
                id,
                true_child,
                false_child,
                from,
                to,
                bound: Bound::AtMostOne,
            }
        };
        self.store.save(node);
        node.id
    }

    fn build_amz(&mut self, em: &mut Emitter<'_>, vars: &[i32]) -> i32 {
        let from = vars[0];
        let to = vars[vars.len() - 1];
        if let Some(id) = self.store.lookup_amz(from, to) {
            return id;
        }

        let node = if vars.len() == 1 {
            BddNode {
                id: -from,
                true_child: 0,
                false_child: 0,
                from,
                to,
                bound: Bound::AllFalse,
            }
        } else {
            let id = em.fresh_var();
            let false_child = self.build_amz(em, &vars[1..]);
            em.add(&[-from, -id]);
            em.add(&[from, -id, false_child]);
            em.add(&[from, id, -false_child]);
            BddNode {
                id,
                true_child: 0,
                false_child,
                from,
                to,
                bound: Bound::AllFalse,
            }
        };
        self.store.save(node);
        node.id
    }
}

/// Asserts equivalence of two BDD roots. Both must be inner nodes, which
/// hold fresh positive auxiliaries; leaves never reach this point because
/// only full-width middle windows are equalised.
fn make_equal(em: &mut Emitter<'_>, a: i32, b: i32) {
    if a == b {
        return;
    }
    debug_assert!(a > 0 && b > 0);
    em.add(&[-a, b]);
    em.add(&[a, -b]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnf::{CnfBuffer, VarPool};
    use crate::encoder::testing::{brute_force_antibandwidth, encode_and_solve};
    use crate::options::EncoderChoice;

    #[test]
    fn store_keeps_every_window_suffix_interval() {
        let graph = Graph::new("g", 4, vec![(1, 2)]);
        let mut buffer = CnfBuffer::default();
        let mut em = Emitter::new(VarPool::new(16), &mut buffer, 0);
        let mut encoder = DuplexEncoder::new(4);
        encoder.build_window_bdds(&mut em, &graph, 2);
        // first window of vertex 1 covers variables 1..=2
        assert!(encoder.store.lookup_amo(1, 2).is_some());
        assert!(encoder.store.lookup_amz(1, 2).is_some());
        assert!(encoder.store.lookup_amo(2, 2).is_some());
        // backward window of the second vertex-1 window covers 4..=3
        assert!(encoder.store.lookup_amo(4, 3).is_some());
    }

    #[test]
    fn middle_window_roots_are_auxiliaries() {
        let graph = Graph::new("g", 6, vec![(1, 2)]);
        let mut buffer = CnfBuffer::default();
        let mut em = Emitter::new(VarPool::new(36), &mut buffer, 0);
        let mut encoder = DuplexEncoder::new(6);
        encoder.build_window_bdds(&mut em, &graph, 2);
        for vertex in 0..6 {
            for window in 1..encoder.windows - 1 {
                assert!(encoder.fwd_amo[vertex][window] > 36);
                assert!(encoder.bwd_amo[vertex][window] > 36);
            }
        }
    }

    #[test]
    fn full_row_window_makes_any_edge_infeasible() {
        // w = n leaves one window per row; an edge then has no placement
        let graph = Graph::new("p3", 3, vec![(1, 2), (2, 3)]);
        assert!(!encode_and_solve(EncoderChoice::Duplex, &graph, 3));
        let optimum = brute_force_antibandwidth(&graph);
        assert!(optimum < 3);
    }
}
