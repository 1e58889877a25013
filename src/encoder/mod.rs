//! CNF encoders for the antibandwidth feasibility question.
//!
//! Every encoder emits a bijective labelling of the vertices (each vertex
//! bears exactly one label, each label exactly one vertex) and forbids, for
//! every edge, that both endpoints place their labels inside the same
//! window of `w` consecutive label values. The encoders differ in the
//! cardinality schemes used for both parts; for the same graph and width
//! they are equisatisfiable.

mod bdd;
mod duplex;
mod ladder;
mod ladder_split;
mod product;
mod reduced;
mod sequential;

use log::{debug, warn};

use crate::cnf::Emitter;
use crate::graph::Graph;
use crate::options::{EncoderChoice, SymmetryBreak};

/// Encodes the question "does a labelling with antibandwidth >= `width`
/// exist" into the emitter. Clause order is deterministic for a fixed
/// graph, width and encoder choice.
pub fn encode(
    choice: EncoderChoice,
    em: &mut Emitter<'_>,
    graph: &Graph,
    width: usize,
    symmetry: SymmetryBreak,
) {
    let n = graph.num_vertices();
    if width < 1 || width > n {
        warn!("width {} out of range for {} vertices, nothing to encode", width, n);
        return;
    }
    break_symmetry(em, graph, symmetry);
    match choice {
        EncoderChoice::Reduced => reduced::encode(em, graph, width),
        EncoderChoice::Sequential => sequential::encode(em, graph, width),
        EncoderChoice::Product => product::encode(em, graph, width),
        EncoderChoice::Duplex => duplex::encode(em, graph, width),
        EncoderChoice::Ladder => ladder::encode(em, graph, width, false),
        EncoderChoice::LadderSplit => ladder_split::encode(em, graph, width, false),
    }
}

/// Fixes the label of an anchor vertex to the lower half of the label range
/// by forbidding its upper-half label variables.
fn break_symmetry(em: &mut Emitter<'_>, graph: &Graph, symmetry: SymmetryBreak) {
    let anchor = match symmetry {
        SymmetryBreak::None => return,
        SymmetryBreak::First => 1,
        SymmetryBreak::HighDegree => graph.max_degree_vertex(),
        SymmetryBreak::LowDegree => graph.min_degree_vertex(),
    };
    let n = graph.num_vertices();
    debug!("symmetry break on vertex {} ({})", anchor, symmetry);
    for label in n - n / 2 + 1..=n {
        em.add(&[-graph.label_var(anchor, label)]);
    }
}

/// The label variables of one vertex, in label order.
fn row_vars(graph: &Graph, vertex: usize) -> Vec<i32> {
    (1..=graph.num_vertices())
        .map(|label| graph.label_var(vertex, label))
        .collect()
}

/// The vertex variables of one label, in vertex order.
fn column_vars(graph: &Graph, label: usize) -> Vec<i32> {
    (1..=graph.num_vertices())
        .map(|vertex| graph.label_var(vertex, label))
        .collect()
}

/// Filters the edge list down to proper edges. A self-loop fixes an edge
/// distance of zero, below any encoded width, so it turns into the empty
/// clause and is dropped from pair encoding.
fn proper_edges(em: &mut Emitter<'_>, graph: &Graph) -> Vec<(usize, usize)> {
    let mut edges = Vec::with_capacity(graph.edges().len());
    for &(u, v) in graph.edges() {
        if u == v {
            warn!("self-loop on vertex {}, instance has no labelling of positive width", u);
            em.add(&[]);
        } else {
            edges.push((u, v));
        }
    }
    edges
}

/// Exactly-one by the 2-product scheme: row/column index variables over a
/// `p * q` grid with `p = ceil(sqrt(m))`, a long at-least-one clause, and
/// sequential at-most-one chains on the index vectors.
fn product_exactly_one(em: &mut Emitter<'_>, vars: &[i32]) {
    if vars.len() < 2 {
        return;
    }
    if vars.len() == 2 {
        em.add(&[vars[0], vars[1]]);
        em.add(&[-vars[0], -vars[1]]);
        return;
    }

    let p = (vars.len() as f64).sqrt().ceil() as usize;
    let q = (vars.len() + p - 1) / p;
    let u_vars: Vec<i32> = (0..p).map(|_| em.fresh_var()).collect();
    let v_vars: Vec<i32> = (0..q).map(|_| em.fresh_var()).collect();

    let mut alo = Vec::with_capacity(vars.len());
    for (idx, &var) in vars.iter().enumerate() {
        em.add(&[-var, v_vars[idx / p]]);
        em.add(&[-var, u_vars[idx % p]]);
        alo.push(var);
    }
    em.add(&alo);

    sequential_at_most_one(em, &u_vars);
    sequential_at_most_one(em, &v_vars);
}

/// At-most-one by the sequential chain: one auxiliary per inner position,
/// each implied by its predecessor and the variable it follows.
fn sequential_at_most_one(em: &mut Emitter<'_>, vars: &[i32]) {
    if vars.len() < 2 {
        return;
    }
    let mut prev = vars[0];
    for &curr in &vars[1..vars.len() - 1] {
        let next = em.fresh_var();
        em.add(&[-prev, -curr]);
        em.add(&[-prev, next]);
        em.add(&[-curr, next]);
        prev = next;
    }
    em.add(&[-prev, -vars[vars.len() - 1]]);
}

#[cfg(test)]
pub(crate) mod testing {
    //! Helpers shared by the encoder test modules.

    use super::*;
    use crate::cnf::{CnfBuffer, VarPool};
    use crate::solver::{SatBackend, SolveOutcome};

    /// Encodes with the given encoder and solves, returning satisfiability.
    pub fn encode_and_solve(choice: EncoderChoice, graph: &Graph, width: usize) -> bool {
        let mut backend = SatBackend::new();
        let n = graph.num_vertices();
        let mut em = Emitter::new(VarPool::new(n * n), &mut backend, 0);
        encode(choice, &mut em, graph, width, SymmetryBreak::None);
        match backend.solve() {
            SolveOutcome::Sat => true,
            SolveOutcome::Unsat => false,
            SolveOutcome::Failed => panic!("solver failure"),
        }
    }

    /// Encodes into a buffer and returns it with the final variable count.
    pub fn encode_to_buffer(
        choice: EncoderChoice,
        graph: &Graph,
        width: usize,
    ) -> (CnfBuffer, usize) {
        let mut buffer = CnfBuffer::default();
        let n = graph.num_vertices();
        let mut em = Emitter::new(VarPool::new(n * n), &mut buffer, 0);
        encode(choice, &mut em, graph, width, SymmetryBreak::None);
        let vars = em.var_count();
        (buffer, vars)
    }

    /// True antibandwidth by exhaustive search over all labellings.
    pub fn brute_force_antibandwidth(graph: &Graph) -> usize {
        let n = graph.num_vertices();
        let mut labels: Vec<usize> = (1..=n).collect();
        let mut best = 0;
        permute(&mut labels, 0, &mut |labelling| {
            let ab = graph.antibandwidth(labelling);
            if ab > best {
                best = ab;
            }
        });
        best
    }

    fn permute(values: &mut Vec<usize>, k: usize, visit: &mut impl FnMut(&[usize])) {
        if k == values.len() {
            visit(values);
            return;
        }
        for i in k..values.len() {
            values.swap(k, i);
            permute(values, k + 1, visit);
            values.swap(k, i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::cnf::{CnfBuffer, VarPool};

    fn small_graphs() -> Vec<Graph> {
        vec![
            Graph::new("p3", 3, vec![(1, 2), (2, 3)]),
            Graph::new("p4", 4, vec![(1, 2), (2, 3), (3, 4)]),
            Graph::new("p5", 5, vec![(1, 2), (2, 3), (3, 4), (4, 5)]),
            Graph::new("c4", 4, vec![(1, 2), (2, 3), (3, 4), (1, 4)]),
            Graph::new("c5", 5, vec![(1, 2), (2, 3), (3, 4), (4, 5), (1, 5)]),
            Graph::new("k4", 4, vec![(1, 2), (1, 3), (1, 4), (2, 3), (2, 4), (3, 4)]),
            Graph::new("star5", 5, vec![(1, 2), (1, 3), (1, 4), (1, 5)]),
            Graph::new("edgeless5", 5, vec![]),
        ]
    }

    const ALL_ENCODERS: [EncoderChoice; 6] = [
        EncoderChoice::Reduced,
        EncoderChoice::Sequential,
        EncoderChoice::Product,
        EncoderChoice::Duplex,
        EncoderChoice::Ladder,
        EncoderChoice::LadderSplit,
    ];

    #[test]
    fn encoders_agree_with_exhaustive_search() {
        for graph in small_graphs() {
            let optimum = brute_force_antibandwidth(&graph);
            for width in 2..=graph.num_vertices() {
                let expected = optimum >= width;
                for &choice in &ALL_ENCODERS {
                    assert_eq!(
                        encode_and_solve(choice, &graph, width),
                        expected,
                        "{} on {} at width {} (optimum {})",
                        choice,
                        graph.name(),
                        width,
                        optimum
                    );
                }
            }
        }
    }

    #[test]
    fn self_loop_is_infeasible_for_every_encoder() {
        let graph = Graph::new("loop", 3, vec![(1, 1)]);
        for &choice in &ALL_ENCODERS {
            for width in 2..=3 {
                assert!(
                    !encode_and_solve(choice, &graph, width),
                    "{} at width {}",
                    choice,
                    width
                );
            }
        }
    }

    #[test]
    fn symmetry_break_preserves_satisfiability() {
        let graph = Graph::new("p5", 5, vec![(1, 2), (2, 3), (3, 4), (4, 5)]);
        let optimum = brute_force_antibandwidth(&graph);
        for symmetry in [
            SymmetryBreak::First,
            SymmetryBreak::HighDegree,
            SymmetryBreak::LowDegree,
        ] {
            for width in 2..=5 {
                let mut backend = crate::solver::SatBackend::new();
                let mut em = Emitter::new(VarPool::new(25), &mut backend, 0);
                encode(EncoderChoice::Duplex, &mut em, &graph, width, symmetry);
                let sat = matches!(backend.solve(), crate::solver::SolveOutcome::Sat);
                assert_eq!(sat, optimum >= width, "{} at width {}", symmetry, width);
            }
        }
    }

    #[test]
    fn symmetry_break_pins_the_anchor() {
        let graph = Graph::new("p4", 4, vec![(1, 2), (2, 3), (3, 4)]);
        let mut buffer = CnfBuffer::default();
        let mut em = Emitter::new(VarPool::new(16), &mut buffer, 0);
        break_symmetry(&mut em, &graph, SymmetryBreak::HighDegree);
        // vertex 2 is the first vertex of maximum degree; labels 3 and 4 are banned
        assert_eq!(buffer.clauses(), &[vec![-7], vec![-8]]);
    }

    #[test]
    fn all_emitted_variables_are_allocated() {
        for graph in small_graphs() {
            for &choice in &ALL_ENCODERS {
                for width in [2, graph.num_vertices()] {
                    let (buffer, vars) = encode_to_buffer(choice, &graph, width);
                    for clause in buffer.clauses() {
                        for &lit in clause {
                            let var = lit.unsigned_abs() as usize;
                            assert!(
                                var >= 1 && var <= vars,
                                "{} width {}: literal {} outside 1..={}",
                                choice,
                                width,
                                lit,
                                vars
                            );
                        }
                    }
                }
            }
        }
    }
}
