//! Graph model and instance loading.
//!
//! Instances are MatrixMarket-style edge lists: the first all-numeric line
//! carries `rows cols nnz`, every following all-numeric line one edge as a
//! pair of 1-based vertex ids. Anything else (comments, banners) is skipped.

use std::fmt;
use std::path::Path;

use fs_err as fs;
use thiserror::Error;

/// Largest vertex count for which the labelling matrix `n * n` plus
/// auxiliary variables still fits into the literal representation.
const MAX_VERTICES: usize = 46_000;

/// An error produced while loading a graph instance.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The instance file could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The header declared a different number of edges than the file contains.
    #[error("edge list length {found} does not match declared edge count {declared}")]
    EdgeCount {
        /// Edge count declared in the header line.
        declared: usize,
        /// Number of edge lines actually parsed.
        found: usize,
    },
    /// The instance is too large for the variable numbering scheme.
    #[error("graph has {0} vertices, more than the supported {MAX_VERTICES}")]
    TooLarge(usize),
}

/// An undirected graph, immutable after construction.
///
/// Edges are stored with the smaller endpoint first; self-loops are kept.
#[derive(Debug, Clone)]
pub struct Graph {
    name: String,
    n: usize,
    edges: Vec<(usize, usize)>,
}

impl Graph {
    /// Creates a graph from its parts. Endpoints are reordered so that the
    /// smaller one comes first.
    pub fn new(name: impl Into<String>, n: usize, edges: Vec<(usize, usize)>) -> Self {
        let edges = edges
            .into_iter()
            .map(|(u, v)| if u <= v { (u, v) } else { (v, u) })
            .collect();
        Self {
            name: name.into(),
            n,
            edges,
        }
    }

    /// Loads a graph from the given file. The graph name used for bound
    /// lookup is the final path component.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the declared edge count
    /// does not match, or the instance exceeds the supported size.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |f| f.to_string_lossy().into_owned());
        Self::parse(&content, name)
    }

    /// Parses a graph from the textual edge-list format.
    ///
    /// # Errors
    ///
    /// Returns an error if the declared edge count does not match the number
    /// of edge lines, or the vertex count is out of range.
    pub fn parse(content: &str, name: impl Into<String>) -> Result<Self, GraphError> {
        let mut n = 0;
        let mut declared = 0;
        let mut edges = Vec::new();
        for line in content.lines() {
            let mut terms = Vec::with_capacity(3);
            let mut numeric = true;
            for token in line.split_whitespace() {
                match token.parse::<usize>() {
                    Ok(value) => terms.push(value),
                    Err(_) => {
                        numeric = false;
                        break;
                    }
                }
            }
            if !numeric {
                continue;
            }
            match terms[..] {
                [rows, _cols, nnz] => {
                    n = rows;
                    declared = nnz;
                    edges.reserve(nnz);
                }
                // self-loops are kept on purpose
                [u, v] => edges.push(if u <= v { (u, v) } else { (v, u) }),
                _ => {}
            }
        }
        if edges.len() != declared {
            return Err(GraphError::EdgeCount {
                declared,
                found: edges.len(),
            });
        }
        if n > MAX_VERTICES {
            return Err(GraphError::TooLarge(n));
        }
        Ok(Self::new(name, n, edges))
    }

    /// The empty graph under the given name, used when an instance file
    /// cannot be opened.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            n: 0,
            edges: Vec::new(),
        }
    }

    /// Instance name used for bound lookup.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.n
    }

    /// Edge list, smaller endpoint first.
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// Whether any edge is a self-loop.
    pub fn has_self_loop(&self) -> bool {
        self.edges.iter().any(|&(u, v)| u == v)
    }

    /// The variable encoding "vertex `v` bears label `l`", both 1-based.
    pub fn label_var(&self, vertex: usize, label: usize) -> i32 {
        debug_assert!(1 <= vertex && vertex <= self.n);
        debug_assert!(1 <= label && label <= self.n);
        ((vertex - 1) * self.n + label) as i32
    }

    fn degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0; self.n];
        for &(u, v) in &self.edges {
            degrees[u - 1] += 1;
            degrees[v - 1] += 1;
        }
        degrees
    }

    /// 1-based id of the vertex with the highest degree; lowest id on ties.
    pub fn max_degree_vertex(&self) -> usize {
        assert!(self.n > 0);
        let degrees = self.degrees();
        let mut best = 0;
        for (i, &d) in degrees.iter().enumerate().skip(1) {
            if d > degrees[best] {
                best = i;
            }
        }
        best + 1
    }

    /// 1-based id of the vertex with the lowest degree; lowest id on ties.
    pub fn min_degree_vertex(&self) -> usize {
        assert!(self.n > 0);
        let degrees = self.degrees();
        let mut best = 0;
        for (i, &d) in degrees.iter().enumerate().skip(1) {
            if d < degrees[best] {
                best = i;
            }
        }
        best + 1
    }

    /// The antibandwidth of the given labelling: the minimum label distance
    /// over all edges. `labels[v - 1]` is the label of vertex `v`.
    /// For an edgeless graph this is `n`.
    pub fn antibandwidth(&self, labels: &[usize]) -> usize {
        let mut min_dist = self.n;
        for &(u, v) in &self.edges {
            let a = labels[u - 1];
            let b = labels[v - 1];
            let dist = if a > b { a - b } else { b - a };
            if dist < min_dist {
                min_dist = dist;
            }
        }
        min_dist
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} vertices, {} edges)",
            self.name,
            self.n,
            self.edges.len()
        )
    }
}

/// Published lower and upper antibandwidth bounds for the benchmark
/// instances of Sinnl, "A note on computational approaches for the
/// antibandwidth problem".
const PUBLISHED_BOUNDS: &[(&str, usize, usize)] = &[
    ("A-pores_1.mtx.rnd", 6, 8),
    ("B-ibm32.mtx.rnd", 9, 9),
    ("C-bcspwr01.mtx.rnd", 16, 17),
    ("D-bcsstk01.mtx.rnd", 8, 9),
    ("E-bcspwr02.mtx.rnd", 21, 22),
    ("F-curtis54.mtx.rnd", 12, 13),
    ("G-will57.mtx.rnd", 12, 14),
    ("H-impcol_b.mtx.rnd", 8, 8),
    ("I-ash85.mtx.rnd", 19, 27),
    ("J-nos4.mtx.rnd", 32, 40),
    ("K-dwt__234.mtx.rnd", 46, 58),
    ("L-bcspwr03.mtx.rnd", 39, 39),
    ("M-bcsstk06.mtx.rnd", 28, 72),
    ("N-bcsstk07.mtx.rnd", 28, 72),
    ("O-impcol_d.mtx.rnd", 91, 173),
    ("P-can__445.mtx.rnd", 78, 120),
    ("Q-494_bus.mtx.rnd", 219, 246),
    ("R-dwt__503.mtx.rnd", 46, 71),
    ("S-sherman4.mtx.rnd", 256, 272),
    ("T-dwt__592.mtx.rnd", 103, 150),
    ("U-662_bus.mtx.rnd", 219, 220),
    ("V-nos6.mtx.rnd", 326, 337),
    ("W-685_bus.mtx.rnd", 136, 136),
    ("X-can__715.mtx.rnd", 112, 142),
];

/// Looks up the published `(lower, upper)` bounds for an instance name.
pub fn published_bounds(name: &str) -> Option<(usize, usize)> {
    PUBLISHED_BOUNDS
        .iter()
        .find(|(entry, _, _)| *entry == name)
        .map(|&(_, lb, ub)| (lb, ub))
}
