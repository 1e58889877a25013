//! SAT-based solver for the antibandwidth problem on undirected graphs.
//!
//! The antibandwidth of a graph is the largest w such that some bijective
//! labelling of the vertices with 1..n keeps every edge's label distance at
//! least w. This crate answers the question by reduction to Boolean
//! satisfiability: per candidate width a CNF encoder (one of six published
//! schemes) builds a feasibility formula for an embedded CDCL solver, and a
//! search driver walks the widths from the lower bound, from the upper
//! bound or by bisection — serially or with a process-parallel supervisor
//! that prunes by monotonicity.

pub mod cnf;
pub mod encoder;
pub mod graph;
pub mod options;
pub mod search;
pub mod solver;
pub mod supervisor;
pub mod width;

pub use graph::{Graph, GraphError};
pub use options::{EncoderChoice, SearchOptions, SearchStrategy};
pub use search::SearchOutcome;
pub use width::Verdict;

/// Runs the configured search for the optimal antibandwidth of `graph`.
///
/// With more than one worker configured the process-parallel supervisor
/// dispatches per-width worker processes; otherwise the search runs
/// serially in-process.
pub fn solve_with(graph: &Graph, options: &SearchOptions) -> SearchOutcome {
    if options.workers > 1 {
        supervisor::run(graph, options)
    } else {
        search::run(graph, options)
    }
}
