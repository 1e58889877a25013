//! Per-width feasibility driver.
//!
//! Answers "does a labelling with antibandwidth >= w exist" for one width:
//! trivial gates first, then a fresh solver, variable pool and encoder run,
//! one solver call, and optionally a verification pass decoding the model
//! back into a labelling.

use std::fmt;
use std::io::{self, Write};
use std::time::Instant;

use log::{debug, error, info, warn};

use crate::cnf::{CnfBuffer, Emitter, VarPool};
use crate::encoder;
use crate::graph::Graph;
use crate::options::SearchOptions;
use crate::solver::{SatBackend, SolveOutcome};

/// Result of a single width query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The graph is too small to constrain anything.
    Empty,
    /// A labelling of the requested width exists.
    Sat,
    /// No labelling of the requested width exists.
    Unsat,
    /// The solver claimed satisfiability but the decoded labelling does not
    /// reach the requested width.
    BadModel,
    /// The solver reported neither satisfiable nor unsatisfiable.
    Failed,
}

impl Verdict {
    /// Conventional result code: 0, 10, 20, -10 or -20.
    pub fn code(self) -> i32 {
        match self {
            Verdict::Empty => 0,
            Verdict::Sat => 10,
            Verdict::Unsat => 20,
            Verdict::BadModel => -10,
            Verdict::Failed => -20,
        }
    }

    /// The result code as a process exit code; negative codes wrap into the
    /// upper byte range (-10 becomes 246, -20 becomes 236).
    pub fn exit_code(self) -> i32 {
        (self.code() as u8) as i32
    }

    /// Reverses [`Verdict::exit_code`].
    pub fn from_exit_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Verdict::Empty),
            10 => Some(Verdict::Sat),
            20 => Some(Verdict::Unsat),
            246 => Some(Verdict::BadModel),
            236 => Some(Verdict::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Verdict::Empty => "nothing to encode",
            Verdict::Sat => "SAT",
            Verdict::Unsat => "UNSAT",
            Verdict::BadModel => "invalid model",
            Verdict::Failed => "solver failure",
        };
        write!(f, "{}", text)
    }
}

/// Runs one feasibility query.
pub fn solve_width(graph: &Graph, width: usize, options: &SearchOptions) -> Verdict {
    let n = graph.num_vertices();
    info!("[w = {}] feasibility query on {}", width, graph);
    if n < 1 {
        info!("[w = {}] the graph is empty, nothing to encode", width);
        return Verdict::Empty;
    }
    if width < 2 {
        info!("[w = {}] every labelling has distance at least 1", width);
        return Verdict::Sat;
    }
    if width > n {
        // no window of that width fits into the label range
        return if graph.edges().is_empty() {
            Verdict::Sat
        } else {
            Verdict::Unsat
        };
    }

    let mut backend = SatBackend::new();
    let profile = options.profile.name();
    let known = backend.configure(profile);
    debug!("[w = {}] solver profile {:?} ({})", width, profile, known);
    if options.force_phase {
        for option in &["--forcephase", "--phase=0", "--no-rephase"] {
            let supported = backend.set_option(option);
            debug!("[w = {}] solver option {} ({})", width, option, supported);
        }
    }

    let encode_start = Instant::now();
    let (vars, clauses) = {
        let mut em = Emitter::new(VarPool::new(n * n), &mut backend, options.split_size);
        encoder::encode(options.encoder, &mut em, graph, width, options.symmetry);
        (em.var_count(), em.clause_count())
    };
    info!(
        "[w = {}] encoded {} clauses over {} variables in {:.2}s",
        width,
        clauses,
        vars,
        encode_start.elapsed().as_secs_f32()
    );

    let solve_start = Instant::now();
    let outcome = backend.solve();
    info!(
        "[w = {}] solving took {} ms",
        width,
        solve_start.elapsed().as_millis()
    );
    match outcome {
        SolveOutcome::Sat => {
            info!("[w = {}] SAT", width);
            if options.verify {
                verify_model(graph, width, &backend)
            } else {
                Verdict::Sat
            }
        }
        SolveOutcome::Unsat => {
            info!("[w = {}] UNSAT", width);
            Verdict::Unsat
        }
        SolveOutcome::Failed => {
            warn!("[w = {}] solver gave no answer", width);
            Verdict::Failed
        }
    }
}

/// Encodes the width into an in-memory formula and writes it in DIMACS
/// format; the solver is never constructed.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn print_dimacs<W: Write>(
    graph: &Graph,
    width: usize,
    options: &SearchOptions,
    out: &mut W,
) -> io::Result<()> {
    let n = graph.num_vertices();
    let mut buffer = CnfBuffer::default();
    let vars = {
        let mut em = Emitter::new(VarPool::new(n * n), &mut buffer, options.split_size);
        if n >= 1 && width >= 2 && width <= n {
            encoder::encode(options.encoder, &mut em, graph, width, options.symmetry);
        }
        em.var_count()
    };
    buffer.write_dimacs(out, vars)
}

/// Decodes the model into a labelling and checks that it is a bijection
/// reaching the requested width.
fn verify_model(graph: &Graph, width: usize, backend: &SatBackend) -> Verdict {
    let n = graph.num_vertices();
    let mut labels = Vec::with_capacity(n);
    for vertex in 1..=n {
        let mut assigned = None;
        for label in 1..=n {
            if backend.value(graph.label_var(vertex, label)) {
                if assigned.is_some() {
                    error!(
                        "[w = {}] model assigns more than one label to vertex {}",
                        width, vertex
                    );
                    return Verdict::BadModel;
                }
                assigned = Some(label);
            }
        }
        match assigned {
            Some(label) => labels.push(label),
            None => {
                error!("[w = {}] model assigns no label to vertex {}", width, vertex);
                return Verdict::BadModel;
            }
        }
    }

    let mut used = vec![false; n];
    for &label in &labels {
        if used[label - 1] {
            error!("[w = {}] model assigns label {} twice", width, label);
            return Verdict::BadModel;
        }
        used[label - 1] = true;
    }

    let reached = graph.antibandwidth(&labels);
    if reached < width {
        error!(
            "[w = {}] decoded labelling only reaches antibandwidth {}",
            width, reached
        );
        return Verdict::BadModel;
    }
    info!("[w = {}] verified labelling, distance {}", width, reached);
    Verdict::Sat
}
