//! Ladder-split encoding: the staircase replicated at half-window offsets.
//!
//! For even widths every window of width `w` is divided into two halves of
//! `w / 2`; register chains run over the half windows and the staircase
//! slides in steps of one label, pairing the up-to-four non-empty span
//! parts of both endpoints. For odd widths the chains run over full-width
//! windows with their own seam ranges and a one-or-four-clause glue per
//! offset. The two parities stay separate code paths on purpose.

use crate::cnf::Emitter;
use crate::graph::Graph;

use super::ladder::RegisterBank;
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

    if width % 2 == 0 {
        for stair in 0..n {
            encode_stair_even(em, &mut bank, n, stair, width);
        }
        for (u, v) in proper_edges(em, graph) {
            glue_stairs_even(em, &mut bank, n, u - 1, v - 1, width);
        }
    } else {
        for stair in 0..n {
            encode_stair_odd(em, &mut bank, n, stair, width);
        }
        for (u, v) in proper_edges(em, graph) {
            glue_stairs_odd(em, &mut bank, n, u - 1, v - 1, width);
        }
    }
}

/// The non-empty parts of the `w`-span starting at offset `i`, split at the
/// sliding boundary `part` inside each half window: `(front, back)` hold the
/// intervals lying in the first and second half respectively.
type Interval = (i32, i32);

fn span_parts(anchor: usize, i: usize, part: usize, half: usize, width: usize) -> (Vec<Interval>, Vec<Interval>) {
    let a = anchor + i;
    let mut front = vec![((a) as i32, (a + part - 1) as i32)];
    if part < half {
        front.push(((a + part) as i32, (a + half - 1) as i32));
    }
    let mut back = vec![((a + half) as i32, (a + half + part - 1) as i32)];
    if part < half {
        back.push(((a + half + part) as i32, (a + width - 1) as i32));
    }
    (front, back)
}

fn encode_stair_even(em: &mut Emitter<'_>, bank: &mut RegisterBank, n: usize, stair: usize, width: usize) {
    let half = width / 2;
    let nwin = (n + half - 1) / half;
    for window in 0..nwin {
        bank.window_chains(em, n, window, stair, half, nwin);
    }
    for window in 0..n / half {
        bank.glue_adjacent(em, n, window, stair, half, false);
    }

    // intra-row staircase: no span may be occupied in both halves
    let mut part = half;
    for i in 1..=n - width + 1 {
        let (front, back) = span_parts(stair * n, i, part, half, width);
        for &(f1, l1) in &front {
            for &(f2, l2) in &back {
                let a = bank.register(em, f1, l1);
                let b = bank.register(em, f2, l2);
                em.add(&[-a, -b]);
            }
        }
        part -= 1;
        if part == 0 {
            part = half;
        }
    }

    bank.window_heads_exactly_one(em, n, stair, half);
}

fn glue_stairs_even(
    em: &mut Emitter<'_>,
    bank: &mut RegisterBank,
    n: usize,
    s1: usize,
    s2: usize,
    width: usize,
) {
    let half = width / 2;
    let mut part = half;
    for i in 1..=n - width + 1 {
        let (front1, back1) = span_parts(s1 * n, i, part, half, width);
        let (front2, back2) = span_parts(s2 * n, i, part, half, width);
        let parts1: Vec<Interval> = front1.into_iter().chain(back1).collect();
        let parts2: Vec<Interval> = front2.into_iter().chain(back2).collect();
        for &(f1, l1) in &parts1 {
            for &(f2, l2) in &parts2 {
                let a = bank.register(em, f1, l1);
                let b = bank.register(em, f2, l2);
                em.add(&[-a, -b]);
            }
        }
        part -= 1;
        if part == 0 {
            part = half;
        }
    }
}

fn encode_stair_odd(em: &mut Emitter<'_>, bank: &mut RegisterBank, n: usize, stair: usize, width: usize) {
    let nwin = (n + width - 1) / width;
    for window in 0..nwin {
        bank.window_chains(em, n, window, stair, width, nwin);
    }
    for window in 0..nwin - 1 {
        bank.glue_adjacent(em, n, window, stair, width, false);
    }
    bank.window_heads_exactly_one(em, n, stair, width);
}

fn glue_stairs_odd(
    em: &mut Emitter<'_>,
    bank: &mut RegisterBank,
    n: usize,
    s1: usize,
    s2: usize,
    width: usize,
) {
    for i in 0..=n - width {
        let m = i % width;
        let sub = i / width;
        if m == 0 {
            let a = bank.register(
                em,
                (s1 * n + sub * width + 1) as i32,
                (s1 * n + sub * width + width) as i32,
            );
            let b = bank.register(
                em,
                (s2 * n + sub * width + 1) as i32,
                (s2 * n + sub * width + width) as i32,
            );
            em.add(&[-a, -b]);
        } else {
            let suffix = |stair: usize| {
                (
                    (stair * n + sub * width + 1 + m) as i32,
                    (stair * n + sub * width + width) as i32,
                )
            };
            let prefix = |stair: usize| {
                (
                    (stair * n + sub * width + width + 1) as i32,
                    (stair * n + sub * width + width + m) as i32,
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
}
