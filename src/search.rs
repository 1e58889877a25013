//! Serial search over candidate widths.
//!
//! The optimum is bracketed by a lower and an upper bound (published table
//! or defaults) and located by one of three strategies: ascending from the
//! lower bound until the first UNSAT, descending from the upper bound until
//! the first SAT, or bisection. By monotonicity a SAT at width w implies
//! SAT below and an UNSAT implies UNSAT above, so each strategy stops at
//! its first decisive answer.

use std::fmt;

use log::{info, warn};

use crate::graph::{published_bounds, Graph};
use crate::options::{LimitKind, SearchOptions, SearchStrategy};
use crate::width::{solve_width, Verdict};

/// Outcome of a search run: the monotone frontier and the per-width
/// verdicts actually observed.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Largest width answered SAT, if any.
    pub max_sat: Option<usize>,
    /// Smallest width answered UNSAT, if any.
    pub min_unsat: Option<usize>,
    /// Every explicit query in execution order.
    pub queries: Vec<(usize, Verdict)>,
    /// Set when the parallel supervisor cut the search short.
    pub limit_breached: Option<LimitKind>,
}

impl SearchOutcome {
    pub(crate) fn record(&mut self, width: usize, verdict: Verdict) {
        match verdict {
            Verdict::Sat if self.max_sat.map_or(true, |m| width > m) => {
                info!("max SAT width raised to {}", width);
                self.max_sat = Some(width);
            }
            Verdict::Unsat if self.min_unsat.map_or(true, |m| width < m) => {
                info!("min UNSAT width lowered to {}", width);
                self.min_unsat = Some(width);
            }
            _ => {}
        }
        self.queries.push((width, verdict));
    }

    /// Whether the frontier is closed: every width below `min_unsat` is
    /// known or implied SAT.
    pub fn is_closed(&self) -> bool {
        match (self.max_sat, self.min_unsat) {
            (Some(sat), Some(unsat)) => sat + 1 >= unsat,
            _ => false,
        }
    }
}

impl fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmt_width = |value: Option<usize>| match value {
            Some(v) => v.to_string(),
            None => "-".to_string(),
        };
        writeln!(f, "max SAT width:   {}", fmt_width(self.max_sat))?;
        write!(f, "min UNSAT width: {}", fmt_width(self.min_unsat))?;
        if let Some(kind) = self.limit_breached {
            write!(f, "\nsearch aborted: {} limit exceeded", kind)?;
        }
        Ok(())
    }
}

/// Resolves the width bounds for a graph: published table entry or the
/// defaults `(1, n / 2 + 1)`, then overrides, swap if inverted, and a clamp
/// to the vertex count.
pub(crate) fn setup_bounds(graph: &Graph, options: &SearchOptions) -> (usize, usize) {
    let n = graph.num_vertices();
    let (mut lower, mut upper) = match published_bounds(graph.name()) {
        Some(bounds) => {
            info!(
                "published bounds for {}: LB {} UB {}",
                graph.name(),
                bounds.0,
                bounds.1
            );
            bounds
        }
        None => {
            info!(
                "no published bounds for {}, defaulting to LB 1 UB {}",
                graph.name(),
                n / 2 + 1
            );
            (1, n / 2 + 1)
        }
    };
    if let Some(value) = options.lower_bound {
        info!("lower bound {} overridden with {}", lower, value);
        lower = value;
    }
    if let Some(value) = options.upper_bound {
        info!("upper bound {} overridden with {}", upper, value);
        upper = value;
    }
    if lower > upper {
        std::mem::swap(&mut lower, &mut upper);
        info!("swapped bounds to keep LB {} <= UB {}", lower, upper);
    }
    if n > 0 && upper > n {
        warn!("upper bound {} exceeds vertex count, clamped to {}", upper, n);
        upper = n;
        if lower > upper {
            lower = upper;
        }
    }
    assert!(lower >= 1 && lower <= upper);
    (lower, upper)
}

/// Runs the configured strategy serially.
pub fn run(graph: &Graph, options: &SearchOptions) -> SearchOutcome {
    let (lower, upper) = setup_bounds(graph, options);
    match options.strategy {
        SearchStrategy::FromLb => from_lower(graph, options, lower, upper),
        SearchStrategy::FromUb => from_upper(graph, options, lower, upper),
        SearchStrategy::Bisect => bisect(graph, options, lower, upper),
    }
}

fn from_lower(graph: &Graph, options: &SearchOptions, lower: usize, upper: usize) -> SearchOutcome {
    info!("searching upward from LB {} to UB {}", lower, upper);
    let mut outcome = SearchOutcome::default();
    for width in lower..=upper {
        if options.width_cap.map_or(false, |cap| width > cap) {
            info!("width cap {} reached", options.width_cap.unwrap());
            break;
        }
        let verdict = solve_width(graph, width, options);
        outcome.record(width, verdict);
        match verdict {
            Verdict::Unsat | Verdict::Empty | Verdict::BadModel => break,
            _ => {}
        }
    }
    outcome
}

fn from_upper(graph: &Graph, options: &SearchOptions, lower: usize, upper: usize) -> SearchOutcome {
    info!("searching downward from UB {} to LB {}", upper, lower);
    let mut outcome = SearchOutcome::default();
    for width in (lower..=upper).rev() {
        let verdict = solve_width(graph, width, options);
        outcome.record(width, verdict);
        match verdict {
            Verdict::Sat | Verdict::Empty | Verdict::BadModel => break,
            _ => {}
        }
    }
    outcome
}

fn bisect(graph: &Graph, options: &SearchOptions, lower: usize, upper: usize) -> SearchOutcome {
    info!("bisecting between LB {} and UB {}", lower, upper);
    let mut outcome = SearchOutcome::default();
    let mut lo = lower;
    let mut hi = upper;
    while lo <= hi {
        let mid = (lo + hi) / 2;
        let verdict = solve_width(graph, mid, options);
        outcome.record(mid, verdict);
        match verdict {
            Verdict::Sat => lo = mid + 1,
            Verdict::Unsat => hi = mid - 1,
            Verdict::Empty => break,
            Verdict::BadModel | Verdict::Failed => {
                warn!("width {} got no usable verdict, stopping bisection", mid);
                break;
            }
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::SearchOptions;

    fn p5() -> Graph {
        Graph::new("p5", 5, vec![(1, 2), (2, 3), (3, 4), (4, 5)])
    }

    fn options_with_bounds(lower: usize, upper: usize) -> SearchOptions {
        SearchOptions {
            lower_bound: Some(lower),
            upper_bound: Some(upper),
            ..SearchOptions::default()
        }
    }

    #[test]
    fn default_bounds_for_unknown_instances() {
        let graph = Graph::new("nameless", 8, vec![(1, 2)]);
        let options = SearchOptions::default();
        assert_eq!(setup_bounds(&graph, &options), (1, 5));
    }

    #[test]
    fn published_bounds_are_used() {
        let graph = Graph::new("B-ibm32.mtx.rnd", 32, vec![(1, 2)]);
        let options = SearchOptions::default();
        assert_eq!(setup_bounds(&graph, &options), (9, 9));
    }

    #[test]
    fn inverted_overrides_are_swapped() {
        let graph = Graph::new("g", 10, vec![(1, 2)]);
        let options = options_with_bounds(6, 2);
        assert_eq!(setup_bounds(&graph, &options), (2, 6));
    }

    #[test]
    fn upper_bound_clamps_to_vertex_count() {
        let graph = Graph::new("g", 4, vec![(1, 2)]);
        let options = SearchOptions {
            upper_bound: Some(9),
            ..SearchOptions::default()
        };
        assert_eq!(setup_bounds(&graph, &options), (1, 4));
    }

    #[test]
    fn width_cap_stops_the_upward_search() {
        let graph = Graph::new("e", 6, vec![]);
        let options = SearchOptions {
            width_cap: Some(2),
            ..SearchOptions::default()
        };
        let outcome = run(&graph, &options);
        assert_eq!(outcome.max_sat, Some(2));
        assert!(outcome.queries.iter().all(|&(w, _)| w <= 2));
    }

    #[test]
    fn record_keeps_the_extremes() {
        let mut outcome = SearchOutcome::default();
        outcome.record(3, Verdict::Sat);
        outcome.record(2, Verdict::Sat);
        outcome.record(6, Verdict::Unsat);
        outcome.record(7, Verdict::Unsat);
        assert_eq!(outcome.max_sat, Some(3));
        assert_eq!(outcome.min_unsat, Some(6));
        assert!(!outcome.is_closed());
        outcome.record(4, Verdict::Sat);
        outcome.record(5, Verdict::Unsat);
        assert!(outcome.is_closed());
    }
}
