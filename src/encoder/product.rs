//! 2-product encoding.
//!
//! Each cardinality group of size `m` is mapped onto a `p * q` grid with
//! `p = ceil(sqrt(m))` and `q = ceil(m / p)`: input `i` implies its row
//! index variable `v[i / p]` and its column index variable `u[i mod p]`,
//! and the index vectors get at-most-one recursively by the same scheme.

use crate::cnf::Emitter;
use crate::graph::Graph;

use super::{column_vars, proper_edges, row_vars};

pub(super) fn encode(em: &mut Emitter<'_>, graph: &Graph, width: usize) {
    for vertex in 1..=graph.num_vertices() {
        exactly_one(em, &row_vars(graph, vertex));
    }
    for label in 1..=graph.num_vertices() {
        exactly_one(em, &column_vars(graph, label));
    }
    for (u, v) in proper_edges(em, graph) {
        encode_pair(em, graph, width, u, v);
    }
}

fn grid(len: usize) -> (usize, usize) {
    let p = (len as f64).sqrt().ceil() as usize;
    let q = (len + p - 1) / p;
    (p, q)
}

fn exactly_one(em: &mut Emitter<'_>, vars: &[i32]) {
    if vars.len() < 2 {
        return;
    }
    if vars.len() == 2 {
        em.add(&[vars[0], vars[1]]);
        em.add(&[-vars[0], -vars[1]]);
        return;
    }

    let (p, q) = grid(vars.len());
    let u_vars: Vec<i32> = (0..p).map(|_| em.fresh_var()).collect();
    let v_vars: Vec<i32> = (0..q).map(|_| em.fresh_var()).collect();

    let mut alo = Vec::with_capacity(vars.len());
    for (idx, &var) in vars.iter().enumerate() {
        em.add(&[-var, v_vars[idx / p]]);
        em.add(&[-var, u_vars[idx % p]]);
        alo.push(var);
    }
    em.add(&alo);

    at_most_one(em, &u_vars);
    at_most_one(em, &v_vars);
}

fn at_most_one(em: &mut Emitter<'_>, vars: &[i32]) {
    if vars.len() < 2 {
        return;
    }
    if vars.len() == 2 {
        if vars[0] == vars[1] {
            return;
        }
        em.add(&[vars[0], vars[1]]);
        em.add(&[-vars[0], -vars[1]]);
        return;
    }

    let (p, q) = grid(vars.len());
    let u_vars: Vec<i32> = (0..p).map(|_| em.fresh_var()).collect();
    let v_vars: Vec<i32> = (0..q).map(|_| em.fresh_var()).collect();

    for (idx, &var) in vars.iter().enumerate() {
        em.add(&[-var, v_vars[idx / p]]);
        em.add(&[-var, u_vars[idx % p]]);
    }

    at_most_one(em, &u_vars);
    at_most_one(em, &v_vars);
}

fn encode_pair(em: &mut Emitter<'_>, graph: &Graph, width: usize, u: usize, v: usize) {
    debug_assert!(u != v);
    let n = graph.num_vertices();
    for offset in 0..=n - width {
        let window: Vec<i32> = (offset + 1..=offset + width)
            .map(|label| graph.label_var(u, label))
            .chain((offset + 1..=offset + width).map(|label| graph.label_var(v, label)))
            .collect();
        windowed_amo(em, &window);
    }
}

/// At-most-one over the combined `2w` window variables of both endpoints.
fn windowed_amo(em: &mut Emitter<'_>, vars: &[i32]) {
    debug_assert!(vars.len() > 2);
    let (p, q) = grid(vars.len());
    let u_vars: Vec<i32> = (0..p).map(|_| em.fresh_var()).collect();
    let v_vars: Vec<i32> = (0..q).map(|_| em.fresh_var()).collect();

    for (idx, &var) in vars.iter().enumerate() {
        em.add(&[-var, v_vars[idx / p]]);
        em.add(&[-var, u_vars[idx % p]]);
    }

    at_most_one(em, &u_vars);
    at_most_one(em, &v_vars);
}
