//! Reduced pairwise encoding.
//!
//! Rows and columns of the label matrix get binomial exactly-one blocks.
//! For every edge, each window of `w` consecutive labels forbids the two
//! endpoints from both landing inside it, expressed as pairwise binary
//! clauses; sliding the window by one reuses the previous window's clauses
//! and only adds the pairs involving the newly entered label.

use crate::cnf::Emitter;
use crate::graph::Graph;

use super::{column_vars, proper_edges, row_vars};

pub(super) fn encode(em: &mut Emitter<'_>, graph: &Graph, width: usize) {
    encode_labelling(em, graph);
    for (u, v) in proper_edges(em, graph) {
        encode_pair(em, graph, width, u, v);
    }
}

/// Exactly-one per row (each vertex bears one label) and per column (each
/// label is borne by one vertex), both binomial.
fn encode_labelling(em: &mut Emitter<'_>, graph: &Graph) {
    for vertex in 1..=graph.num_vertices() {
        binomial_exactly_one(em, &row_vars(graph, vertex));
    }
    for label in 1..=graph.num_vertices() {
        binomial_exactly_one(em, &column_vars(graph, label));
    }
}

fn binomial_exactly_one(em: &mut Emitter<'_>, vars: &[i32]) {
    for (i, &a) in vars.iter().enumerate() {
        for &b in &vars[i + 1..] {
            em.add(&[-a, -b]);
        }
    }
    em.add(vars);
}

fn encode_pair(em: &mut Emitter<'_>, graph: &Graph, width: usize, u: usize, v: usize) {
    debug_assert!(u != v);
    let n = graph.num_vertices();

    // window at offset 0: full cross product, skipping equal labels
    // (already excluded by the column constraints)
    for i in 1..=width {
        for j in 1..=width {
            if i != j {
                em.add(&[-graph.label_var(u, i), -graph.label_var(v, j)]);
            }
        }
    }

    // each slide adds only the pairs touching the incoming label
    for offset in 1..=n - width {
        let incoming = offset + width;
        for label in offset + 1..incoming {
            em.add(&[-graph.label_var(u, label), -graph.label_var(v, incoming)]);
        }
        for label in offset + 1..incoming {
            em.add(&[-graph.label_var(u, incoming), -graph.label_var(v, label)]);
        }
    }
}
