//! End-to-end tests: serial search scenarios at the library level and
//! print / single-width / supervisor runs of the built executable.

use std::io::Write;
use std::process::Command;

use antiband::options::SymmetryBreak;
use antiband::width::{print_dimacs, solve_width};
use antiband::{
    solve_with, EncoderChoice, Graph, SearchOptions, SearchStrategy, Verdict,
};

fn path5() -> Graph {
    Graph::new("p5", 5, vec![(1, 2), (2, 3), (3, 4), (4, 5)])
}

fn cycle5() -> Graph {
    Graph::new("c5", 5, vec![(1, 2), (2, 3), (3, 4), (4, 5), (1, 5)])
}

fn complete4() -> Graph {
    Graph::new(
        "k4",
        4,
        vec![(1, 2), (1, 3), (1, 4), (2, 3), (2, 4), (3, 4)],
    )
}

fn options_with(encoder: EncoderChoice, strategy: SearchStrategy) -> SearchOptions {
    SearchOptions {
        encoder,
        strategy,
        verify: true,
        ..SearchOptions::default()
    }
}

/// True antibandwidth by exhaustive search over all labellings.
fn brute_force_antibandwidth(graph: &Graph) -> usize {
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
    let mut labels: Vec<usize> = (1..=graph.num_vertices()).collect();
    let mut best = 0;
    permute(&mut labels, 0, &mut |labelling| {
        best = best.max(graph.antibandwidth(labelling));
    });
    best
}

#[test]
fn upward_search_brackets_the_optimum_of_a_path() {
    let graph = path5();
    assert_eq!(brute_force_antibandwidth(&graph), 2);
    let outcome = solve_with(&graph, &options_with(EncoderChoice::Duplex, SearchStrategy::FromLb));
    assert_eq!(outcome.max_sat, Some(2));
    assert_eq!(outcome.min_unsat, Some(3));
    let unsat_count = outcome
        .queries
        .iter()
        .filter(|(_, v)| *v == Verdict::Unsat)
        .count();
    assert_eq!(unsat_count, 1, "upward search meets UNSAT exactly once");
}

#[test]
fn upward_search_on_a_cycle() {
    let graph = cycle5();
    assert_eq!(brute_force_antibandwidth(&graph), 2);
    let outcome = solve_with(&graph, &options_with(EncoderChoice::Ladder, SearchStrategy::FromLb));
    assert_eq!(outcome.max_sat, Some(2));
    assert_eq!(outcome.min_unsat, Some(3));
}

#[test]
fn complete_graph_tops_out_at_width_one() {
    let graph = complete4();
    assert_eq!(brute_force_antibandwidth(&graph), 1);
    let outcome = solve_with(&graph, &options_with(EncoderChoice::Reduced, SearchStrategy::FromLb));
    assert_eq!(outcome.max_sat, Some(1));
    assert_eq!(outcome.min_unsat, Some(2));
}

#[test]
fn edgeless_graph_satisfies_every_width_up_to_the_bound() {
    let graph = Graph::new("edgeless", 5, vec![]);
    let outcome = solve_with(&graph, &options_with(EncoderChoice::Sequential, SearchStrategy::FromLb));
    // default upper bound is n / 2 + 1 = 3 and nothing is ever UNSAT
    assert_eq!(outcome.max_sat, Some(3));
    assert_eq!(outcome.min_unsat, None);
}

#[test]
fn self_loop_blocks_every_encoded_width() {
    let graph = Graph::new("loop", 3, vec![(1, 1)]);
    let outcome = solve_with(&graph, &options_with(EncoderChoice::Product, SearchStrategy::FromLb));
    // only the trivial width 1 short-circuits to SAT
    assert_eq!(outcome.max_sat, Some(1));
    assert_eq!(outcome.min_unsat, Some(2));
}

#[test]
fn downward_search_meets_sat_exactly_once() {
    let graph = path5();
    let outcome = solve_with(&graph, &options_with(EncoderChoice::Duplex, SearchStrategy::FromUb));
    assert_eq!(outcome.max_sat, Some(2));
    assert_eq!(outcome.min_unsat, Some(3));
    let sat_count = outcome
        .queries
        .iter()
        .filter(|(_, v)| *v == Verdict::Sat)
        .count();
    assert_eq!(sat_count, 1);
}

#[test]
fn bisection_matches_and_stays_within_the_query_budget() {
    let graph = path5();
    let outcome = solve_with(&graph, &options_with(EncoderChoice::Duplex, SearchStrategy::Bisect));
    assert_eq!(outcome.max_sat, Some(2));
    assert_eq!(outcome.min_unsat, Some(3));
    // interval [1, 3]: at most ceil(log2(3 - 1 + 2)) = 2 queries
    assert!(outcome.queries.len() <= 2, "queries: {:?}", outcome.queries);
}

#[test]
fn repeated_runs_are_deterministic() {
    let graph = cycle5();
    let options = options_with(EncoderChoice::LadderSplit, SearchStrategy::FromLb);
    let first = solve_with(&graph, &options);
    let second = solve_with(&graph, &options);
    assert_eq!(first.max_sat, second.max_sat);
    assert_eq!(first.min_unsat, second.min_unsat);
    assert_eq!(first.queries, second.queries);
}

#[test]
fn every_encoder_answers_like_the_exhaustive_search() {
    let graph = cycle5();
    let optimum = brute_force_antibandwidth(&graph);
    for encoder in [
        EncoderChoice::Reduced,
        EncoderChoice::Sequential,
        EncoderChoice::Product,
        EncoderChoice::Duplex,
        EncoderChoice::Ladder,
        EncoderChoice::LadderSplit,
    ] {
        let options = options_with(encoder, SearchStrategy::FromLb);
        for width in 2..=graph.num_vertices() {
            let expected = if optimum >= width {
                Verdict::Sat
            } else {
                Verdict::Unsat
            };
            assert_eq!(
                solve_width(&graph, width, &options),
                expected,
                "{} at width {}",
                encoder,
                width
            );
        }
    }
}

#[test]
fn clause_splitting_keeps_verdicts_and_bounds_lengths() {
    let graph = path5();
    let options = SearchOptions {
        split_size: 3,
        verify: true,
        ..SearchOptions::default()
    };
    assert_eq!(solve_width(&graph, 2, &options), Verdict::Sat);
    assert_eq!(solve_width(&graph, 3, &options), Verdict::Unsat);

    let mut out = Vec::new();
    print_dimacs(&graph, 2, &options, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    for line in text.lines().skip(1) {
        let literals = line.split_whitespace().count() - 1;
        assert!(literals <= 3, "clause too long: {}", line);
    }
}

#[test]
fn symmetry_breaking_leaves_the_frontier_unchanged() {
    let graph = path5();
    for symmetry in [SymmetryBreak::First, SymmetryBreak::HighDegree, SymmetryBreak::LowDegree] {
        let options = SearchOptions {
            symmetry,
            verify: true,
            ..SearchOptions::default()
        };
        let outcome = solve_with(&graph, &options);
        assert_eq!(outcome.max_sat, Some(2), "{}", symmetry);
        assert_eq!(outcome.min_unsat, Some(3), "{}", symmetry);
    }
}

// --- binary-level tests -------------------------------------------------

const PATH5_INSTANCE: &str = "5 5 4\n1 2\n2 3\n3 4\n4 5\n";
const PATH3_INSTANCE: &str = "3 3 2\n1 2\n2 3\n";

fn write_instance(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

fn run_binary(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_antiband"))
        .args(args)
        .output()
        .expect("failed to run the search executable")
}

#[test]
fn print_mode_writes_a_well_formed_formula() {
    let file = write_instance(PATH3_INSTANCE);
    let output = run_binary(&[
        file.path().to_str().unwrap(),
        "--print-w",
        "2",
        "--reduced",
    ]);
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    let header = text.lines().next().unwrap();
    assert!(header.starts_with("p cnf 9 "), "header: {}", header);
    let clauses: usize = header.split_whitespace().nth(3).unwrap().parse().unwrap();
    assert_eq!(clauses, text.lines().count() - 1);
    assert!(text.lines().skip(1).all(|line| line.ends_with(" 0")));
}

#[test]
fn single_width_mode_exits_with_the_verdict_code() {
    let file = write_instance(PATH5_INSTANCE);
    let sat = run_binary(&[file.path().to_str().unwrap(), "--solve-w", "2", "--verify-result"]);
    assert_eq!(sat.status.code(), Some(10));
    let unsat = run_binary(&[file.path().to_str().unwrap(), "--solve-w", "3"]);
    assert_eq!(unsat.status.code(), Some(20));
}

#[test]
fn supervised_search_reports_the_same_frontier() {
    let file = write_instance(PATH5_INSTANCE);
    let output = run_binary(&[
        file.path().to_str().unwrap(),
        "--process-count",
        "2",
        "--verify-result",
    ]);
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("max SAT width:   2"), "output: {}", text);
    assert!(text.contains("min UNSAT width: 3"), "output: {}", text);
}

#[test]
fn supervised_bisection_agrees() {
    let file = write_instance(PATH5_INSTANCE);
    let output = run_binary(&[
        file.path().to_str().unwrap(),
        "--process-count",
        "3",
        "--bin-search",
        "--ladder",
    ]);
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("max SAT width:   2"), "output: {}", text);
}

#[test]
fn bad_arguments_exit_with_code_one() {
    let file = write_instance(PATH3_INSTANCE);
    let output = run_binary(&[file.path().to_str().unwrap(), "--set-lb", "1"]);
    assert_eq!(output.status.code(), Some(1));
    let conflict = run_binary(&[file.path().to_str().unwrap(), "--reduced", "--duplex"]);
    assert_eq!(conflict.status.code(), Some(1));
}

#[test]
fn missing_instance_runs_on_the_empty_graph() {
    let output = run_binary(&["/nonexistent/instance.mtx"]);
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("max SAT width:   -"), "output: {}", text);
}
