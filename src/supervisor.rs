//! Process-parallel search supervisor.
//!
//! Keeps up to P worker processes alive, each re-invoking this executable
//! with `--solve-w` for one candidate width, and prunes by monotonicity: a
//! SAT verdict at width w terminates every worker below w (their answer is
//! implied SAT), an UNSAT verdict terminates every worker above. A limits
//! monitor thread samples the resident set of the supervisor and all
//! descendants and raises a flag that mass-terminates the workers when a
//! configured cap is exceeded.
//!
//! Workers share nothing; the only cross-thread state is the monitor's
//! rolling maximum (single writer, read at teardown) and its breach flag.

use std::collections::HashMap;
use std::path::Path;
use std::process::{Child, Command};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::graph::Graph;
use crate::options::{EncoderChoice, LimitKind, ResourceLimits, SearchOptions, SearchStrategy, SolverProfile};
use crate::search::{self, SearchOutcome};
use crate::width::Verdict;

/// Runs the search with worker processes. Falls back to the serial driver
/// when no instance path is available to hand to workers or the graph is
/// trivially small.
pub fn run(graph: &Graph, options: &SearchOptions) -> SearchOutcome {
    let graph_file = match &options.graph_file {
        Some(path) => path.clone(),
        None => {
            warn!("no instance path for worker processes, searching serially");
            return search::run(graph, options);
        }
    };
    if graph.num_vertices() < 2 {
        return search::run(graph, options);
    }
    let binary = match &options.worker_binary {
        Some(path) => path.clone(),
        None => match std::env::current_exe() {
            Ok(path) => path,
            Err(err) => {
                warn!("cannot locate own executable ({}), searching serially", err);
                return search::run(graph, options);
            }
        },
    };

    let (lower, upper) = search::setup_bounds(graph, options);
    info!(
        "supervising {} workers over widths {}..={}",
        options.workers, lower, upper
    );
    let cores = num_cpus::get();
    if options.workers > cores {
        warn!("{} workers on {} hardware threads", options.workers, cores);
    }

    let mut planner = WidthPlanner::new(options.strategy, lower, upper, options.width_cap);
    let monitor = Monitor::spawn(options.limits.clone());
    let mut outcome = SearchOutcome::default();
    let mut active: HashMap<usize, Child> = HashMap::new();
    let poll = Duration::from_millis(10);

    loop {
        top_up(
            &mut active,
            &mut planner,
            &outcome,
            options,
            &binary,
            &graph_file,
        );
        if active.is_empty() {
            break;
        }
        thread::sleep(poll);

        if let Some(kind) = monitor.breach() {
            warn!("{} limit exceeded, terminating every worker", kind);
            for (width, mut child) in active.drain() {
                terminate(width, &mut child);
            }
            outcome.limit_breached = Some(kind);
            break;
        }

        let mut finished = Vec::new();
        for (&width, child) in active.iter_mut() {
            match child.try_wait() {
                Ok(Some(status)) => finished.push((width, status.code())),
                Ok(None) => {}
                Err(err) => {
                    warn!("polling worker for width {} failed: {}", width, err);
                    finished.push((width, None));
                }
            }
        }
        for (width, code) in finished {
            active.remove(&width);
            handle_completion(width, code, &mut active, &mut outcome);
        }
    }

    let peak = monitor.finish();
    if peak > 0.0 {
        info!("peak memory consumption {:.1} MB", peak);
    }
    outcome
}

fn handle_completion(
    width: usize,
    code: Option<i32>,
    active: &mut HashMap<usize, Child>,
    outcome: &mut SearchOutcome,
) {
    let verdict = code.and_then(Verdict::from_exit_code);
    match verdict {
        Some(Verdict::Sat) => {
            info!("[w = {}] worker reports SAT", width);
            outcome.record(width, Verdict::Sat);
            let dominated: Vec<usize> = active.keys().copied().filter(|&w| w < width).collect();
            for w in dominated {
                if let Some(mut child) = active.remove(&w) {
                    info!("[w = {}] implied SAT, terminating worker", w);
                    terminate(w, &mut child);
                }
            }
        }
        Some(Verdict::Unsat) => {
            info!("[w = {}] worker reports UNSAT", width);
            outcome.record(width, Verdict::Unsat);
            let dominated: Vec<usize> = active.keys().copied().filter(|&w| w > width).collect();
            for w in dominated {
                if let Some(mut child) = active.remove(&w) {
                    info!("[w = {}] implied UNSAT, terminating worker", w);
                    terminate(w, &mut child);
                }
            }
        }
        Some(Verdict::BadModel) => {
            error!("[w = {}] worker decoded an invalid model", width);
            outcome.record(width, Verdict::BadModel);
        }
        Some(other) => {
            outcome.record(width, other);
        }
        None => {
            // crashed or signalled: this width stays unknown
            warn!("[w = {}] worker ended without a verdict ({:?})", width, code);
        }
    }
}

fn terminate(width: usize, child: &mut Child) {
    if let Err(err) = child.kill() {
        debug!("[w = {}] worker already gone: {}", width, err);
    }
    let _ = child.wait();
}

fn top_up(
    active: &mut HashMap<usize, Child>,
    planner: &mut WidthPlanner,
    outcome: &SearchOutcome,
    options: &SearchOptions,
    binary: &Path,
    graph_file: &Path,
) {
    while active.len() < options.workers.max(1) {
        let width = match planner.next_width(outcome) {
            Some(width) => width,
            None => break,
        };
        let child = spawn_worker(binary, graph_file, width, options);
        info!("[w = {}] worker started (pid {})", width, child.id());
        active.insert(width, child);
    }
}

/// Spawns one worker process for a single width. A failure to spawn aborts
/// the supervisor; without workers no verdict could ever arrive.
fn spawn_worker(binary: &Path, graph_file: &Path, width: usize, options: &SearchOptions) -> Child {
    let mut command = Command::new(binary);
    command.arg(graph_file).arg("--solve-w").arg(width.to_string());
    match options.encoder {
        EncoderChoice::Reduced => command.arg("--reduced"),
        EncoderChoice::Sequential => command.arg("--seq"),
        EncoderChoice::Product => command.arg("--product"),
        EncoderChoice::Duplex => command.arg("--duplex"),
        EncoderChoice::Ladder => command.arg("--ladder"),
        EncoderChoice::LadderSplit => command.arg("--ladder-split"),
    };
    match options.profile {
        SolverProfile::Sat => command.arg("--conf-sat"),
        SolverProfile::Unsat => command.arg("--conf-unsat"),
        SolverProfile::Default => command.arg("--conf-def"),
    };
    if options.force_phase {
        command.arg("--force-phase");
    }
    if options.verify {
        command.arg("--verify-result");
    }
    if options.split_size > 0 {
        command.arg("--split-size").arg(options.split_size.to_string());
    }
    command
        .arg("--symmetry-break")
        .arg(options.symmetry.to_string());
    command
        .spawn()
        .unwrap_or_else(|err| panic!("failed to spawn worker for width {}: {}", width, err))
}

/// Chooses the next width to dispatch, strictly between the known SAT and
/// UNSAT frontiers and never twice.
struct WidthPlanner {
    strategy: SearchStrategy,
    lower: usize,
    upper: usize,
    width_cap: Option<usize>,
    dispatched: Vec<usize>,
}

impl WidthPlanner {
    fn new(strategy: SearchStrategy, lower: usize, upper: usize, width_cap: Option<usize>) -> Self {
        Self {
            strategy,
            lower,
            upper,
            width_cap,
            dispatched: Vec::new(),
        }
    }

    fn next_width(&mut self, outcome: &SearchOutcome) -> Option<usize> {
        let mut lo = self.lower;
        let mut hi = self.upper;
        if let Some(sat) = outcome.max_sat {
            lo = lo.max(sat + 1);
        }
        if let Some(unsat) = outcome.min_unsat {
            hi = hi.min(unsat.saturating_sub(1));
        }
        if let Some(cap) = self.width_cap {
            hi = hi.min(cap);
        }
        if lo > hi {
            return None;
        }
        let free = |w: usize, dispatched: &[usize]| !dispatched.contains(&w);

        let choice = match self.strategy {
            SearchStrategy::FromLb => (lo..=hi).find(|&w| free(w, &self.dispatched)),
            SearchStrategy::FromUb => (lo..=hi).rev().find(|&w| free(w, &self.dispatched)),
            SearchStrategy::Bisect => self.widest_gap_midpoint(lo, hi),
        };
        if let Some(width) = choice {
            self.dispatched.push(width);
        }
        choice
    }

    /// Midpoint of the widest run of undispatched widths, so concurrent
    /// bisection probes spread over the unknown interval.
    fn widest_gap_midpoint(&self, lo: usize, hi: usize) -> Option<usize> {
        let mut best: Option<(usize, usize, usize)> = None; // (len, start, end)
        let mut start = None;
        for w in lo..=hi + 1 {
            let free = w <= hi && !self.dispatched.contains(&w);
            match (free, start) {
                (true, None) => start = Some(w),
                (false, Some(s)) => {
                    let len = w - s;
                    if best.map_or(true, |(l, _, _)| len > l) {
                        best = Some((len, s, w - 1));
                    }
                    start = None;
                }
                _ => {}
            }
        }
        best.map(|(_, s, e)| (s + e) / 2)
    }
}

/// Limits monitor: one sampler thread publishing a rolling maximum and a
/// breach flag through atomics.
struct Monitor {
    state: Arc<MonitorState>,
    handle: Option<thread::JoinHandle<()>>,
}

struct MonitorState {
    /// Rolling maximum resident set in kilobytes. Written only by the
    /// sampler thread, read by the supervisor at teardown.
    max_rss_kb: AtomicU64,
    /// 0 = within limits, otherwise the violated dimension.
    breach: AtomicU8,
    stop: AtomicBool,
}

impl Monitor {
    fn spawn(limits: ResourceLimits) -> Self {
        let state = Arc::new(MonitorState {
            max_rss_kb: AtomicU64::new(0),
            breach: AtomicU8::new(0),
            stop: AtomicBool::new(false),
        });
        let sampler_state = Arc::clone(&state);
        let handle = thread::spawn(move || sample_loop(&limits, &sampler_state));
        Self {
            state,
            handle: Some(handle),
        }
    }

    fn breach(&self) -> Option<LimitKind> {
        match self.state.breach.load(Ordering::Relaxed) {
            1 => Some(LimitKind::Memory),
            2 => Some(LimitKind::RealTime),
            3 => Some(LimitKind::ElapsedTime),
            _ => None,
        }
    }

    /// Stops the sampler and returns the peak memory seen, in megabytes.
    fn finish(mut self) -> f64 {
        self.state.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        self.state.max_rss_kb.load(Ordering::Relaxed) as f64 / 1024.0
    }
}

fn sample_loop(limits: &ResourceLimits, state: &MonitorState) {
    let started = Instant::now();
    let interval = Duration::from_micros(limits.sample_rate_us.max(1));
    let sample_secs = interval.as_secs_f64();
    let mut elapsed_total = 0.0;
    let mut samples = 0u32;

    while !state.stop.load(Ordering::Relaxed) {
        let pid = std::process::id();
        let workers = descendant_pids(pid);
        let mut rss_kb = resident_kb(pid);
        for &worker in &workers {
            rss_kb += resident_kb(worker);
        }
        let consumed_mb = rss_kb as f64 / 1024.0;
        if rss_kb > state.max_rss_kb.load(Ordering::Relaxed) {
            state.max_rss_kb.store(rss_kb, Ordering::Relaxed);
        }

        let real = started.elapsed().as_secs_f64();
        elapsed_total += sample_secs * workers.len() as f64;

        samples += 1;
        if limits.report_every > 0 && samples >= limits.report_every {
            info!(
                "sampler: memory {:.1} MB, real time {:.1}s, elapsed time {:.1}s",
                consumed_mb, real, elapsed_total
            );
            samples = 0;
        }

        if limits.memory_mb.map_or(false, |cap| consumed_mb > cap) {
            state.breach.store(1, Ordering::Relaxed);
            break;
        }
        if limits.real_time.map_or(false, |cap| real > cap) {
            state.breach.store(2, Ordering::Relaxed);
            break;
        }
        if limits.elapsed_time.map_or(false, |cap| elapsed_total > cap) {
            state.breach.store(3, Ordering::Relaxed);
            break;
        }
        thread::sleep(interval);
    }
}

/// Resident set size of a process in kilobytes, from `/proc`. Zero on
/// platforms without it, which leaves the memory cap inert.
#[cfg(target_os = "linux")]
fn resident_kb(pid: u32) -> u64 {
    let status = match std::fs::read_to_string(format!("/proc/{}/status", pid)) {
        Ok(content) => content,
        Err(_) => return 0,
    };
    for line in status.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            return rest
                .split_whitespace()
                .next()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
        }
    }
    0
}

#[cfg(not(target_os = "linux"))]
fn resident_kb(_pid: u32) -> u64 {
    0
}

/// All descendant process ids of `pid`, via the children lists in `/proc`.
#[cfg(target_os = "linux")]
fn descendant_pids(pid: u32) -> Vec<u32> {
    let mut descendants = Vec::new();
    let children = std::fs::read_to_string(format!("/proc/{}/task/{}/children", pid, pid))
        .unwrap_or_default();
    for token in children.split_whitespace() {
        if let Ok(child) = token.parse::<u32>() {
            descendants.push(child);
            descendants.extend(descendant_pids(child));
        }
    }
    descendants
}

#[cfg(not(target_os = "linux"))]
fn descendant_pids(_pid: u32) -> Vec<u32> {
    Vec::new()
}
