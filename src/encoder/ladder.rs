//! Ladder encoding: staircase of sequential-counter register chains.
//!
//! Works on windows of width `w - 1`. Every window of a vertex row gets an
//! upper register chain (`R(first, j)` true iff some label up to `j` is
//! used) and, where needed, a lower chain (`R(j, last)`), with the register
//! for a singleton interval being the input variable itself. The window
//! head registers of a row form an exactly-one block, adjacent windows are
//! glued along their seam, and per edge the four pairings of suffix and
//! prefix registers forbid both endpoints inside any sliding span of `w`
//! labels. Columns get an explicit exactly-one, either by the 2-product
//! scheme or by the symbolic-counter chain.

use std::collections::HashMap;

use crate::cnf::Emitter;
use crate::graph::Graph;

use super::{column_vars, product_exactly_one, proper_edges};

pub(super) fn encode(em: &mut Emitter<'_>, graph: &Graph, width: usize, nsc_columns: bool) {
    let n = graph.num_vertices();
    let mut bank = RegisterBank::new();

    for label in 1..=n {
        let vars = column_vars(graph, label);
        if nsc_columns {
            bank.nsc_exactly_one(em, &vars, (n * n + (label - 1) * n) as i32);
        } else {
            product_exactly_one(em, &vars);
        }
    }

    let win = width - 1;
    let nwin = (n + win - 1) / win;
    for stair in 0..n {
        for window in 0..nwin {
            bank.window_chains(em, n, window, stair, win, nwin);
        }
        for window in 0..nwin - 1 {
            bank.glue_adjacent(em, n, window, stair, win, true);
        }
        bank.window_heads_exactly_one(em, n, stair, win);
    }

    for (u, v) in proper_edges(em, graph) {
        glue_stairs(em, &mut bank, n, u - 1, v - 1, win);
    }
}

/// Per-edge staircase glue: for every offset the forbidden span of `win + 1`
/// labels splits into a window suffix and the following window's prefix;
/// the four register pairings rule out one endpoint in each.
fn glue_stairs(
    em: &mut Emitter<'_>,
    bank: &mut RegisterBank,
    n: usize,
    s1: usize,
    s2: usize,
    win: usize,
) {
    for i in 0..n - win {
        let m = i % win;
        let sub = i / win;
        let suffix = |stair: usize| {
            (
                (stair * n + sub * win + 1 + m) as i32,
                (stair * n + sub * win + win) as i32,
            )
        };
        let prefix = |stair: usize| {
            (
                (stair * n + sub * win + win + 1) as i32,
                (stair * n + sub * win + win + m + 1) as i32,
            )
        };
        let (f1, l1) = suffix(s1);
        let a1 = bank.register(em, f1, l1);
        let (f2, l2) = prefix(s1);
        let a2 = bank.register(em, f2, l2);
        let (f3, l3) = suffix(s2);
        let b1 = bank.register(em, f3, l3);
        let (f4, l4) = prefix(s2);
        let b2 = bank.register(em, f4, l4);
        em.add(&[-a1, -b1]);
        em.add(&[-a1, -b2]);
        em.add(&[-a2, -b1]);
        em.add(&[-a2, -b2]);
    }
}

/// Auxiliary-variable memo and chain builders shared by the ladder and
/// ladder-split encoders.
pub(super) struct RegisterBank {
    /// Symbolic counter ids of the sequential-counter exactly-one.
    counters: HashMap<i32, i32>,
    /// Register bit per input-variable interval. A singleton interval is
    /// its own register.
    registers: HashMap<(i32, i32), i32>,
}

impl RegisterBank {
    pub fn new() -> Self {
        Self {
            counters: HashMap::new(),
            registers: HashMap::new(),
        }
    }

    fn counter(&mut self, em: &mut Emitter<'_>, symbolic: i32) -> i32 {
        *self
            .counters
            .entry(symbolic)
            .or_insert_with(|| em.fresh_var())
    }

    pub fn register(&mut self, em: &mut Emitter<'_>, first: i32, last: i32) -> i32 {
        if first == last {
            return first;
        }
        *self
            .registers
            .entry((first, last))
            .or_insert_with(|| em.fresh_var())
    }

    /// Number of distinct register intervals materialised.
    #[cfg(test)]
    pub fn register_count(&self) -> usize {
        self.registers.len()
    }

    /// Exactly-one over `vars` by the sequential counter chain, with
    /// symbolic counter ids starting at `base + 1`.
    pub fn nsc_exactly_one(&mut self, em: &mut Emitter<'_>, vars: &[i32], base: i32) {
        let m = vars.len();
        // a true input raises its counter bit
        for i in 1..m {
            let c = self.counter(em, base + i as i32);
            em.add(&[-vars[i - 1], c]);
        }
        // counter bits are monotone
        for i in 2..m {
            let c0 = self.counter(em, base + i as i32 - 1);
            let c1 = self.counter(em, base + i as i32);
            em.add(&[-c0, c1]);
        }
        // a counter bit needs a reason
        for i in 2..m {
            let c0 = self.counter(em, base + i as i32 - 1);
            let c1 = self.counter(em, base + i as i32);
            em.add(&[vars[i - 1], c0, -c1]);
        }
        let c1 = self.counter(em, base + 1);
        em.add(&[vars[0], -c1]);
        // at least one
        let c_last = self.counter(em, base + m as i32 - 1);
        em.add(&[c_last, vars[m - 1]]);
        // at most one
        for i in 2..=m {
            let c = self.counter(em, base + i as i32 - 1);
            em.add(&[-vars[i - 1], -c]);
        }
    }

    /// Register chains for one window of a vertex row. The first window
    /// carries the lower chain (with its at-most-one guard), the last
    /// window the upper chain over its possibly shorter width, middle
    /// windows both.
    pub fn window_chains(
        &mut self,
        em: &mut Emitter<'_>,
        n: usize,
        window: usize,
        stair: usize,
        w: usize,
        nwin: usize,
    ) {
        let first = (stair * n + window * w + 1) as i32;
        if window == 0 {
            self.lower_chain(em, first, w, true);
        } else if window == nwin - 1 {
            let real_w = if (window + 1) * w > n { n % w } else { w };
            self.upper_chain(em, first, real_w);
        } else {
            self.upper_chain(em, first, w);
            self.lower_chain(em, first, w, false);
        }
    }

    /// Chain of suffix registers `R(var, last)` over a window.
    fn lower_chain(&mut self, em: &mut Emitter<'_>, first: i32, width: usize, with_guard: bool) {
        let last = first + width as i32 - 1;
        for var in (first..last).rev() {
            let r = self.register(em, var, last);
            em.add(&[-var, r]);
        }
        for var in (first + 1..=last).rev() {
            let longer = self.register(em, var - 1, last);
            let shorter = self.register(em, var, last);
            em.add(&[-shorter, longer]);
        }
        for var in first..last {
            let main = self.register(em, var, last);
            let sub = self.register(em, var + 1, last);
            em.add(&[var, sub, -main]);
        }
        if with_guard {
            for var in first..last {
                let r = self.register(em, var + 1, last);
                em.add(&[-var, -r]);
            }
        }
    }

    /// Chain of prefix registers `R(first, var)` over a window, including
    /// the in-window at-most-one guard.
    fn upper_chain(&mut self, em: &mut Emitter<'_>, first: i32, width: usize) {
        let end = first + width as i32 - 1;
        for var in first + 1..=end {
            let r = self.register(em, first, var);
            em.add(&[-var, r]);
        }
        for var in first..end {
            let shorter = self.register(em, first, var);
            let longer = self.register(em, first, var + 1);
            em.add(&[-shorter, longer]);
        }
        for var in (first + 1..=end).rev() {
            let main = self.register(em, first, var);
            let sub = self.register(em, first, var - 1);
            em.add(&[sub, var, -main]);
        }
        for var in (first + 1..=end).rev() {
            let r = self.register(em, first, var - 1);
            em.add(&[-var, -r]);
        }
    }

    /// Seam between a window and its successor: a suffix of the current
    /// window and a prefix of the next cannot both hold a true literal.
    /// With `wide_span` the prefix reaches one position further, so the
    /// seam pairs cover spans of `w + 1` instead of `w` positions.
    pub fn glue_adjacent(
        &mut self,
        em: &mut Emitter<'_>,
        n: usize,
        window: usize,
        stair: usize,
        w: usize,
        wide_span: bool,
    ) {
        let base = stair * n + window * w;
        let cur_last = (base + w) as i32;
        let next_first = (base + w + 1) as i32;
        if (window + 2) * w > n {
            let real_w = n % w;
            for i in 1..=real_w {
                let rv = next_first + i as i32 - 1;
                let var = (base + i + 1) as i32;
                let a = self.register(em, var, cur_last);
                let b = self.register(em, next_first, rv);
                em.add(&[-a, -b]);
            }
        } else if wide_span {
            for i in 0..w {
                let rv = next_first + i as i32;
                let var = (base + i + 1) as i32;
                let a = self.register(em, var, cur_last);
                let b = self.register(em, next_first, rv);
                em.add(&[-a, -b]);
            }
        } else {
            for i in 1..w {
                let rv = next_first + i as i32 - 1;
                let var = (base + i + 1) as i32;
                let a = self.register(em, var, cur_last);
                let b = self.register(em, next_first, rv);
                em.add(&[-a, -b]);
            }
        }
    }

    /// Exactly-one over the window head registers of a row: the row's label
    /// falls into exactly one window.
    pub fn window_heads_exactly_one(
        &mut self,
        em: &mut Emitter<'_>,
        n: usize,
        stair: usize,
        w: usize,
    ) {
        let nwin = (n + w - 1) / w;
        let anchor = stair * n;
        let mut heads = Vec::with_capacity(nwin);
        for i in 0..nwin {
            let start = i * w;
            let last = if start + w > n { anchor + n } else { anchor + start + w };
            let head = self.register(em, (anchor + start + 1) as i32, last as i32);
            heads.push(head);
        }
        let mut alo = Vec::with_capacity(nwin);
        for (i, &a) in heads.iter().enumerate() {
            alo.push(a);
            for &b in &heads[i + 1..] {
                em.add(&[-a, -b]);
            }
        }
        em.add(&alo);
    }
}
