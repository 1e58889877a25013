//! CNF assembly: variable pool, clause sinks and the splitting emitter.
//!
//! Clauses are slices of non-zero DIMACS literals. Encoders write through an
//! [`Emitter`], which owns the variable pool, rewrites clauses longer than
//! the configured split threshold with fresh link variables and forwards the
//! result to a [`ClauseSink`]: either an in-memory buffer for DIMACS output
//! or the solver backend.

use std::io::{self, Write};

/// Receiver of finished clauses.
pub trait ClauseSink {
    /// Accepts one clause. The slice contains no zero literal.
    fn push_clause(&mut self, clause: &[i32]);

    /// Number of clauses received so far.
    fn clause_count(&self) -> usize;
}

/// Monotone allocator of propositional variable ids.
///
/// The first `input_vars` ids are reserved for the labelling matrix;
/// auxiliary variables are handed out above them. Ids are never reused.
#[derive(Debug, Clone)]
pub struct VarPool {
    next: i32,
}

impl VarPool {
    /// Creates a pool whose auxiliaries start right above `input_vars`.
    pub fn new(input_vars: usize) -> Self {
        Self {
            next: input_vars as i32 + 1,
        }
    }

    /// Allocates the next auxiliary variable.
    pub fn fresh(&mut self) -> i32 {
        let var = self.next;
        self.next += 1;
        var
    }

    /// Highest id allocated so far (input variables included).
    pub fn last(&self) -> i32 {
        self.next - 1
    }

    /// Total number of variables, input variables included.
    pub fn count(&self) -> usize {
        (self.next - 1) as usize
    }
}

/// Clause writer binding a [`VarPool`] and a [`ClauseSink`] together with
/// the split threshold.
///
/// With a threshold `s > 0` every clause leaving the emitter has at most
/// `s` literals: a longer clause is rewritten into `s - 1` of its literals
/// plus a fresh link variable, and the link's negation prefixed to the
/// remainder, repeated until the remainder fits. The link variable is
/// existentially quantified, so satisfiability is preserved. Thresholds 1
/// and 2 cannot make progress and are rejected.
pub struct Emitter<'a> {
    vars: VarPool,
    sink: &'a mut dyn ClauseSink,
    split_limit: usize,
}

impl<'a> Emitter<'a> {
    /// Creates an emitter. `split_limit` of 0 disables splitting.
    pub fn new(vars: VarPool, sink: &'a mut dyn ClauseSink, split_limit: usize) -> Self {
        assert!(
            split_limit == 0 || split_limit >= 3,
            "split limit must be 0 (off) or at least 3"
        );
        Self {
            vars,
            sink,
            split_limit,
        }
    }

    /// Allocates a fresh auxiliary variable.
    pub fn fresh_var(&mut self) -> i32 {
        self.vars.fresh()
    }

    /// Emits a clause, splitting it if it exceeds the threshold.
    pub fn add(&mut self, clause: &[i32]) {
        if self.split_limit == 0 || clause.len() <= self.split_limit {
            self.sink.push_clause(clause);
            return;
        }
        let head = self.split_limit - 1;
        let mut rest = clause.to_vec();
        while rest.len() > self.split_limit {
            let link = self.vars.fresh();
            let mut chunk = rest[..head].to_vec();
            chunk.push(link);
            self.sink.push_clause(&chunk);

            let mut tail = Vec::with_capacity(rest.len() - head + 1);
            tail.push(-link);
            tail.extend_from_slice(&rest[head..]);
            rest = tail;
        }
        self.sink.push_clause(&rest);
    }

    /// Total number of variables allocated, input variables included.
    pub fn var_count(&self) -> usize {
        self.vars.count()
    }

    /// Highest variable id in use.
    pub fn last_var(&self) -> i32 {
        self.vars.last()
    }

    /// Number of clauses emitted to the sink.
    pub fn clause_count(&self) -> usize {
        self.sink.clause_count()
    }
}

/// In-memory clause store with DIMACS output, used by the print mode.
#[derive(Debug, Default)]
pub struct CnfBuffer {
    clauses: Vec<Vec<i32>>,
}

impl CnfBuffer {
    /// The collected clauses.
    pub fn clauses(&self) -> &[Vec<i32>] {
        &self.clauses
    }

    /// Writes the formula in DIMACS format: a `p cnf` header followed by
    /// each clause terminated with `0`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `out` fails.
    pub fn write_dimacs<W: Write>(&self, out: &mut W, num_vars: usize) -> io::Result<()> {
        writeln!(out, "p cnf {} {}", num_vars, self.clauses.len())?;
        for clause in &self.clauses {
            for lit in clause {
                write!(out, "{} ", lit)?;
            }
            writeln!(out, "0")?;
        }
        Ok(())
    }
}

impl ClauseSink for CnfBuffer {
    fn push_clause(&mut self, clause: &[i32]) {
        self.clauses.push(clause.to_vec());
    }

    fn clause_count(&self) -> usize {
        self.clauses.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Exhaustively checks satisfiability of a clause set over `num_vars`
    /// variables.
    fn brute_force_sat(clauses: &[Vec<i32>], num_vars: usize) -> bool {
        (0u64..1 << num_vars).any(|mask| {
            clauses.iter().all(|clause| {
                clause.iter().any(|&lit| {
                    let value = mask >> (lit.unsigned_abs() - 1) & 1 == 1;
                    (lit > 0) == value
                })
            })
        })
    }

    #[test]
    fn pool_is_monotone() {
        let mut pool = VarPool::new(9);
        assert_eq!(pool.count(), 9);
        let a = pool.fresh();
        let b = pool.fresh();
        assert_eq!(a, 10);
        assert_eq!(b, 11);
        assert_eq!(pool.last(), 11);
        assert_eq!(pool.count(), 11);
    }

    #[test]
    fn no_splitting_when_disabled() {
        let mut buffer = CnfBuffer::default();
        let mut em = Emitter::new(VarPool::new(6), &mut buffer, 0);
        em.add(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(buffer.clauses(), &[vec![1, 2, 3, 4, 5, 6]]);
    }

    #[test]
    fn splitting_bounds_clause_length() {
        let mut buffer = CnfBuffer::default();
        let mut em = Emitter::new(VarPool::new(8), &mut buffer, 3);
        em.add(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let vars = em.var_count();
        assert!(vars > 8, "link variables must be allocated");
        for clause in buffer.clauses() {
            assert!(clause.len() <= 3, "clause {:?} exceeds split limit", clause);
        }
    }

    #[test]
    fn splitting_preserves_satisfiability() {
        // one long clause and one unit clause forcing a literal of it
        let original = vec![vec![1, 2, 3, 4, 5], vec![-3]];
        let mut buffer = CnfBuffer::default();
        let mut em = Emitter::new(VarPool::new(5), &mut buffer, 3);
        for clause in &original {
            em.add(clause);
        }
        let vars = em.var_count();
        assert_eq!(
            brute_force_sat(&original, 5),
            brute_force_sat(buffer.clauses(), vars)
        );

        // an unsatisfiable pair stays unsatisfiable after splitting
        let mut buffer = CnfBuffer::default();
        let mut em = Emitter::new(VarPool::new(4), &mut buffer, 3);
        em.add(&[1, 2, 3, 4]);
        for &v in &[1, 2, 3, 4] {
            em.add(&[-v]);
        }
        let vars = em.var_count();
        assert!(!brute_force_sat(buffer.clauses(), vars));
    }

    #[test]
    fn dimacs_output_format() {
        let mut buffer = CnfBuffer::default();
        buffer.push_clause(&[1, -2]);
        buffer.push_clause(&[2, 3]);
        let mut out = Vec::new();
        buffer.write_dimacs(&mut out, 3).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "p cnf 3 2\n1 -2 0\n2 3 0\n");
    }

    #[test]
    #[should_panic]
    fn rejects_unusable_split_limit() {
        let mut buffer = CnfBuffer::default();
        let _ = Emitter::new(VarPool::new(1), &mut buffer, 2);
    }
}
