//! Sequential-counter encoding.
//!
//! Same skeleton as the reduced encoder, but every at-most-one group runs
//! through the classic sequential auxiliary chain: for variables
//! `v1..vm` the chain allocates one auxiliary per inner position with
//! `a_i` implied by `a_{i-1}` and `v_i`, and forbids `v_i` together with
//! `a_{i-1}`. Each edge window pair becomes a single chain over the `2w`
//! variables of both windows.

use crate::cnf::Emitter;
use crate::graph::Graph;

use super::{column_vars, proper_edges, row_vars};

pub(super) fn encode(em: &mut Emitter<'_>, graph: &Graph, width: usize) {
    for vertex in 1..=graph.num_vertices() {
        chain_exactly_one(em, &row_vars(graph, vertex));
    }
    for label in 1..=graph.num_vertices() {
        chain_exactly_one(em, &column_vars(graph, label));
    }
    for (u, v) in proper_edges(em, graph) {
        encode_pair(em, graph, width, u, v);
    }
}

/// Exactly-one as a sequential chain plus the long at-least-one clause.
fn chain_exactly_one(em: &mut Emitter<'_>, vars: &[i32]) {
    let mut alo = Vec::with_capacity(vars.len());
    let mut prev = vars[0];
    alo.push(prev);
    for &curr in &vars[1..vars.len() - 1] {
        let next = em.fresh_var();
        em.add(&[-prev, -curr]);
        em.add(&[-prev, next]);
        em.add(&[-curr, next]);
        alo.push(curr);
        prev = next;
    }
    em.add(&[-prev, -vars[vars.len() - 1]]);
    alo.push(vars[vars.len() - 1]);
    em.add(&alo);
}

fn encode_pair(em: &mut Emitter<'_>, graph: &Graph, width: usize, u: usize, v: usize) {
    debug_assert!(u != v);
    let n = graph.num_vertices();
    for offset in 0..=n - width {
        let u_window: Vec<i32> = (offset + 1..=offset + width)
            .map(|label| graph.label_var(u, label))
            .collect();
        let v_window: Vec<i32> = (offset + 1..=offset + width)
            .map(|label| graph.label_var(v, label))
            .collect();
        chained_window_amo(em, &u_window, &v_window);
    }
}

/// One sequential at-most-one chain across both windows, forbidding a true
/// literal in each.
fn chained_window_amo(em: &mut Emitter<'_>, u_window: &[i32], v_window: &[i32]) {
    let mut prev = u_window[0];
    let rest = u_window[1..]
        .iter()
        .chain(&v_window[..v_window.len() - 1]);
    for &curr in rest {
        let next = em.fresh_var();
        em.add(&[-prev, -curr]);
        em.add(&[-prev, next]);
        em.add(&[-curr, next]);
        prev = next;
    }
    em.add(&[-prev, -v_window[v_window.len() - 1]]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnf::{ClauseSink, CnfBuffer, VarPool};

    #[test]
    fn chain_allocates_one_auxiliary_per_inner_variable() {
        let mut buffer = CnfBuffer::default();
        let mut em = Emitter::new(VarPool::new(4), &mut buffer, 0);
        chain_exactly_one(&mut em, &[1, 2, 3, 4]);
        // two inner positions, 3 clauses each, the final guard and the ALO
        assert_eq!(em.var_count(), 6);
        assert_eq!(buffer.clause_count(), 8);
        assert_eq!(buffer.clauses().last().unwrap(), &vec![1, 2, 3, 4]);
    }

    #[test]
    fn window_chain_spans_both_windows() {
        let mut buffer = CnfBuffer::default();
        let mut em = Emitter::new(VarPool::new(8), &mut buffer, 0);
        chained_window_amo(&mut em, &[1, 2], &[5, 6]);
        // inner chain positions: 2, 5; final clause guards 6
        assert_eq!(em.var_count(), 10);
        assert_eq!(buffer.clauses().last().unwrap(), &vec![-10, -6]);
    }
}
