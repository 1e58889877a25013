//! Options for the search procedure and the command-line interface.

use std::fmt;
use std::path::PathBuf;

use clap::{ArgGroup, Parser, ValueEnum};

/// The CNF encoder used for a feasibility query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderChoice {
    /// Pairwise binary clauses over sliding windows.
    Reduced,
    /// Sequential-counter chains over sliding windows.
    Sequential,
    /// Recursive 2-product cardinality groups.
    Product,
    /// Windowed at-most-one via hash-consed BDDs.
    Duplex,
    /// Staircase of sequential-counter register chains.
    Ladder,
    /// Ladder staircase replicated at half-window offsets.
    LadderSplit,
}

impl Default for EncoderChoice {
    fn default() -> Self {
        Self::Duplex
    }
}

impl fmt::Display for EncoderChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Reduced => "reduced",
            Self::Sequential => "seq",
            Self::Product => "product",
            Self::Duplex => "duplex",
            Self::Ladder => "ladder",
            Self::LadderSplit => "ladder-split",
        };
        write!(f, "{}", name)
    }
}

/// The iteration strategy over candidate widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrategy {
    /// Ascend from the lower bound until the first UNSAT.
    FromLb,
    /// Descend from the upper bound until the first SAT.
    FromUb,
    /// Bisect the bound interval.
    Bisect,
}

impl Default for SearchStrategy {
    fn default() -> Self {
        Self::FromLb
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FromLb => "from-lb",
            Self::FromUb => "from-ub",
            Self::Bisect => "bin-search",
        };
        write!(f, "{}", name)
    }
}

/// Named solver configuration profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverProfile {
    /// Tuned for satisfiable instances.
    Sat,
    /// Tuned for unsatisfiable instances.
    Unsat,
    /// The solver's defaults.
    Default,
}

impl SolverProfile {
    /// The profile name handed to the solver backend.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sat => "sat",
            Self::Unsat => "unsat",
            Self::Default => "",
        }
    }
}

impl Default for SolverProfile {
    fn default() -> Self {
        Self::Sat
    }
}

/// Anchor choice for symmetry breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SymmetryBreak {
    /// Pin vertex 1.
    #[value(name = "f")]
    First,
    /// Pin the vertex of highest degree.
    #[value(name = "h")]
    HighDegree,
    /// Pin the vertex of lowest degree.
    #[value(name = "l")]
    LowDegree,
    /// No symmetry breaking.
    #[value(name = "n")]
    None,
}

impl Default for SymmetryBreak {
    fn default() -> Self {
        Self::None
    }
}

impl fmt::Display for SymmetryBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::First => "f",
            Self::HighDegree => "h",
            Self::LowDegree => "l",
            Self::None => "n",
        };
        write!(f, "{}", name)
    }
}

/// The trace level / verbosity for the logging framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TraceLevel {
    /// Turn logging off.
    Off,
    /// Only print errors.
    Error,
    /// Print errors and warnings.
    Warn,
    /// Print errors, warnings and useful information.
    Info,
    /// Print errors, warnings, useful and debug information.
    Debug,
    /// Print all information, including very verbose output.
    Trace,
}

impl Default for TraceLevel {
    fn default() -> Self {
        Self::Warn
    }
}

impl fmt::Display for TraceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        };
        write!(f, "{}", name)
    }
}

impl From<TraceLevel> for log::LevelFilter {
    fn from(level: TraceLevel) -> Self {
        match level {
            TraceLevel::Off => Self::Off,
            TraceLevel::Error => Self::Error,
            TraceLevel::Warn => Self::Warn,
            TraceLevel::Info => Self::Info,
            TraceLevel::Debug => Self::Debug,
            TraceLevel::Trace => Self::Trace,
        }
    }
}

/// The resource dimension whose cap was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    /// Total resident set of supervisor and workers.
    Memory,
    /// Wall clock of the supervisor.
    RealTime,
    /// Accumulated worker time.
    ElapsedTime,
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Memory => "memory",
            Self::RealTime => "real time",
            Self::ElapsedTime => "elapsed time",
        };
        write!(f, "{}", name)
    }
}

/// Resource caps enforced by the limits monitor.
#[derive(Debug, Clone)]
pub struct ResourceLimits {
    /// Cap on the resident set of supervisor plus workers, in megabytes.
    pub memory_mb: Option<f64>,
    /// Cap on supervisor wall clock, in seconds.
    pub real_time: Option<f64>,
    /// Cap on accumulated per-worker time, in seconds.
    pub elapsed_time: Option<f64>,
    /// Sampling interval of the monitor, in microseconds.
    pub sample_rate_us: u64,
    /// Report a sampler line every this many samples.
    pub report_every: u32,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            memory_mb: None,
            real_time: None,
            elapsed_time: None,
            sample_rate_us: 100_000,
            report_every: 100,
        }
    }
}

fn parse_split_size(s: &str) -> Result<u32, String> {
    let value: u32 = s.parse().map_err(|e| format!("invalid number: {}", e))?;
    if value == 1 || value == 2 {
        Err("split size must be 0 (off) or at least 3".to_string())
    } else {
        Ok(value)
    }
}

/// Command-line options of the search executable.
///
/// For using this crate as a library, build a [`SearchOptions`] directly.
#[derive(Debug, Clone, Parser)]
#[command(version, about = "SAT-based solver for the antibandwidth problem")]
#[command(group = ArgGroup::new("encoder").multiple(false))]
#[command(group = ArgGroup::new("profile").multiple(false))]
#[command(group = ArgGroup::new("strategy").multiple(false))]
#[command(group = ArgGroup::new("single-width").multiple(false))]
pub struct CliOptions {
    /// Path to the graph instance (MatrixMarket-style edge list).
    pub graph: PathBuf,

    /// Use the reduced pairwise encoding.
    #[arg(long, group = "encoder")]
    pub reduced: bool,
    /// Use the sequential-counter encoding.
    #[arg(long, group = "encoder")]
    pub seq: bool,
    /// Use the 2-product encoding.
    #[arg(long, group = "encoder")]
    pub product: bool,
    /// Use the duplex (BDD) encoding [default].
    #[arg(long, group = "encoder")]
    pub duplex: bool,
    /// Use the ladder (staircase) encoding.
    #[arg(long, group = "encoder")]
    pub ladder: bool,
    /// Use the ladder encoding with split windows.
    #[arg(long = "ladder-split", group = "encoder")]
    pub ladder_split: bool,

    /// Configure the solver for satisfiable instances [default].
    #[arg(long = "conf-sat", group = "profile")]
    pub conf_sat: bool,
    /// Configure the solver for unsatisfiable instances.
    #[arg(long = "conf-unsat", group = "profile")]
    pub conf_unsat: bool,
    /// Use the solver's default configuration.
    #[arg(long = "conf-def", group = "profile")]
    pub conf_def: bool,
    /// Request fixed-phase decision heuristics from the solver.
    #[arg(long = "force-phase")]
    pub force_phase: bool,

    /// Decode each SAT model and check it reaches the queried width.
    #[arg(long = "verify-result")]
    pub verify_result: bool,

    /// Search upward from the lower bound [default].
    #[arg(long = "from-lb", group = "strategy")]
    pub from_lb: bool,
    /// Search downward from the upper bound.
    #[arg(long = "from-ub", group = "strategy")]
    pub from_ub: bool,
    /// Bisect between the bounds.
    #[arg(long = "bin-search", group = "strategy")]
    pub bin_search: bool,

    /// Overwrite the lower bound (at least 2).
    #[arg(long = "set-lb", value_name = "N", value_parser = clap::value_parser!(u32).range(2..))]
    pub set_lb: Option<u32>,
    /// Overwrite the upper bound (positive).
    #[arg(long = "set-ub", value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub set_ub: Option<u32>,
    /// Hard cap on the width the upward search may reach.
    #[arg(long = "w-cap", value_name = "N")]
    pub w_cap: Option<u32>,

    /// Split clauses longer than N literals (0 = off, otherwise at least 3).
    #[arg(long = "split-size", value_name = "N", default_value_t = 0, value_parser = parse_split_size)]
    pub split_size: u32,
    /// Symmetry breaking anchor: f(irst), h(ighest degree), l(owest degree), n(one).
    #[arg(long = "symmetry-break", value_name = "POINT", value_enum, default_value_t = SymmetryBreak::None)]
    pub symmetry_break: SymmetryBreak,

    /// Encode the single width W and print the formula in DIMACS, without solving.
    #[arg(long = "print-w", value_name = "W", group = "single-width", value_parser = clap::value_parser!(u32).range(2..))]
    pub print_w: Option<u32>,
    /// Solve the single width W and exit with its verdict code.
    #[arg(long = "solve-w", value_name = "W", group = "single-width", value_parser = clap::value_parser!(u32).range(1..))]
    pub solve_w: Option<u32>,

    /// Number of parallel worker processes.
    #[arg(long = "process-count", value_name = "N", default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub process_count: u32,
    /// Cap on total resident memory of supervisor and workers, in megabytes.
    #[arg(long = "limit-memory", value_name = "MB")]
    pub limit_memory: Option<f64>,
    /// Cap on supervisor wall clock, in seconds.
    #[arg(long = "limit-real-time", value_name = "SECONDS")]
    pub limit_real_time: Option<f64>,
    /// Cap on accumulated worker time, in seconds.
    #[arg(long = "limit-elapsed-time", value_name = "SECONDS")]
    pub limit_elapsed_time: Option<f64>,
    /// Sampling interval of the limits monitor, in microseconds.
    #[arg(long = "sample-rate", value_name = "MICROSECONDS", default_value_t = 100_000)]
    pub sample_rate: u64,
    /// Report resource usage every N samples.
    #[arg(long = "report-rate", value_name = "SAMPLES", default_value_t = 100)]
    pub report_rate: u32,

    /// Trace level.
    #[arg(long, value_enum, default_value_t = TraceLevel::Warn)]
    pub trace: TraceLevel,
}

/// Options controlling a search run, independent of the command line.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub encoder: EncoderChoice,
    pub strategy: SearchStrategy,
    pub profile: SolverProfile,
    pub force_phase: bool,
    pub verify: bool,
    /// Clause split threshold; 0 disables splitting.
    pub split_size: usize,
    pub symmetry: SymmetryBreak,
    /// Lower bound override.
    pub lower_bound: Option<usize>,
    /// Upper bound override.
    pub upper_bound: Option<usize>,
    /// Hard cap on the width of the upward search.
    pub width_cap: Option<usize>,
    /// Number of worker processes; up to 1 searches serially in-process.
    pub workers: usize,
    pub limits: ResourceLimits,
    /// Instance path handed to worker processes.
    pub graph_file: Option<PathBuf>,
    /// Worker executable; the current executable when unset.
    pub worker_binary: Option<PathBuf>,
}

impl From<&CliOptions> for SearchOptions {
    fn from(cli: &CliOptions) -> Self {
        let encoder = if cli.reduced {
            EncoderChoice::Reduced
        } else if cli.seq {
            EncoderChoice::Sequential
        } else if cli.product {
            EncoderChoice::Product
        } else if cli.ladder {
            EncoderChoice::Ladder
        } else if cli.ladder_split {
            EncoderChoice::LadderSplit
        } else {
            EncoderChoice::Duplex
        };
        let strategy = if cli.from_ub {
            SearchStrategy::FromUb
        } else if cli.bin_search {
            SearchStrategy::Bisect
        } else {
            SearchStrategy::FromLb
        };
        let profile = if cli.conf_unsat {
            SolverProfile::Unsat
        } else if cli.conf_def {
            SolverProfile::Default
        } else {
            SolverProfile::Sat
        };
        Self {
            encoder,
            strategy,
            profile,
            force_phase: cli.force_phase,
            verify: cli.verify_result,
            split_size: cli.split_size as usize,
            symmetry: cli.symmetry_break,
            lower_bound: cli.set_lb.map(|v| v as usize),
            upper_bound: cli.set_ub.map(|v| v as usize),
            width_cap: cli.w_cap.map(|v| v as usize),
            workers: cli.process_count as usize,
            limits: ResourceLimits {
                memory_mb: cli.limit_memory,
                real_time: cli.limit_real_time,
                elapsed_time: cli.limit_elapsed_time,
                sample_rate_us: cli.sample_rate,
                report_every: cli.report_rate,
            },
            graph_file: Some(cli.graph.clone()),
            worker_binary: None,
        }
    }
}
