//! Embedded CDCL solver backend.
//!
//! Wraps [`varisat::Solver`] behind the narrow surface the width driver
//! consumes: configure by profile name, accept Boolean long options, stream
//! clauses, solve, and read variable polarities from the model.

use log::{debug, error};
use varisat::{ExtendFormula, Lit, Solver};

use crate::cnf::ClauseSink;

/// Outcome of a solver invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveOutcome {
    /// A model was found.
    Sat,
    /// The formula is unsatisfiable.
    Unsat,
    /// The solver reported an error.
    Failed,
}

/// A CDCL solver instance together with the clause stream feeding it.
///
/// Literals arrive in DIMACS convention and are terminated per clause by a
/// zero sentinel (see [`SatBackend::add_literal`]); the [`ClauseSink`] impl
/// uses the same path.
pub struct SatBackend {
    solver: Solver<'static>,
    pending: Vec<Lit>,
    clauses: usize,
    model: Option<Vec<Lit>>,
    profile: &'static str,
}

impl SatBackend {
    pub fn new() -> Self {
        Self {
            solver: Solver::new(),
            pending: Vec::new(),
            clauses: 0,
            model: None,
            profile: "",
        }
    }

    /// Selects a named configuration profile: `"sat"`, `"unsat"` or `""`
    /// for the default. Returns whether the name was recognized.
    ///
    /// The embedded solver has no tuned profiles, so the choice is recorded
    /// for reporting only.
    pub fn configure(&mut self, name: &str) -> bool {
        match name {
            "" => {
                self.profile = "";
                true
            }
            "sat" => {
                self.profile = "sat";
                true
            }
            "unsat" => {
                self.profile = "unsat";
                true
            }
            _ => false,
        }
    }

    /// Applies a Boolean long option such as `--forcephase`. Returns whether
    /// the option is supported; the embedded solver currently supports none
    /// and records the request for reporting.
    pub fn set_option(&mut self, option: &str) -> bool {
        debug!("solver option {} requested (unsupported by backend)", option);
        false
    }

    /// The configured profile name.
    pub fn profile(&self) -> &'static str {
        self.profile
    }

    /// Appends one literal to the clause under construction; a zero
    /// terminates the clause and ships it to the solver.
    pub fn add_literal(&mut self, lit: i32) {
        if lit == 0 {
            self.solver.add_clause(&self.pending);
            self.pending.clear();
            self.clauses += 1;
        } else {
            self.pending.push(Lit::from_dimacs(lit as isize));
        }
    }

    /// Runs the solver on the clauses received so far.
    pub fn solve(&mut self) -> SolveOutcome {
        debug_assert!(self.pending.is_empty(), "unterminated clause");
        match self.solver.solve() {
            Ok(true) => {
                self.model = self.solver.model();
                SolveOutcome::Sat
            }
            Ok(false) => SolveOutcome::Unsat,
            Err(err) => {
                error!("solver error: {}", err);
                SolveOutcome::Failed
            }
        }
    }

    /// Polarity of a variable in the last model; `false` for variables the
    /// model does not mention. Only meaningful after a [`SolveOutcome::Sat`].
    pub fn value(&self, var: i32) -> bool {
        debug_assert!(var > 0);
        self.model
            .as_ref()
            .and_then(|model| model.get(var as usize - 1))
            .map_or(false, |lit| lit.is_positive())
    }

    /// Number of clauses streamed into the solver.
    pub fn clause_count(&self) -> usize {
        self.clauses
    }
}

impl Default for SatBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ClauseSink for SatBackend {
    fn push_clause(&mut self, clause: &[i32]) {
        for &lit in clause {
            self.add_literal(lit);
        }
        self.add_literal(0);
    }

    fn clause_count(&self) -> usize {
        self.clauses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_a_satisfiable_formula() {
        let mut backend = SatBackend::new();
        backend.push_clause(&[1, 2]);
        backend.push_clause(&[-1]);
        assert_eq!(backend.solve(), SolveOutcome::Sat);
        assert!(!backend.value(1));
        assert!(backend.value(2));
        assert_eq!(backend.clause_count(), 2);
    }

    #[test]
    fn detects_unsatisfiability() {
        let mut backend = SatBackend::new();
        backend.push_clause(&[1]);
        backend.push_clause(&[-1]);
        assert_eq!(backend.solve(), SolveOutcome::Unsat);
    }

    #[test]
    fn empty_clause_is_unsatisfiable() {
        let mut backend = SatBackend::new();
        backend.push_clause(&[]);
        assert_eq!(backend.solve(), SolveOutcome::Unsat);
    }

    #[test]
    fn known_profiles_are_accepted() {
        let mut backend = SatBackend::new();
        assert!(backend.configure("sat"));
        assert!(backend.configure("unsat"));
        assert!(backend.configure(""));
        assert!(!backend.configure("plain"));
        assert!(!backend.set_option("--forcephase"));
    }
}
