use crate::error::{CentralityError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One observed directed relationship with an associated strength.
///
/// In the source domain a record is one passer→receiver connection carrying
/// an assist or pass count, but any weighted directed relationship fits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source_id: String,
    pub target_id: String,
    pub source_label: Option<String>,
    pub target_label: Option<String>,
    pub weight: f64,
}

impl EdgeRecord {
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>, weight: f64) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            source_label: None,
            target_label: None,
            weight,
        }
    }

    pub fn with_labels(
        mut self,
        source_label: impl Into<String>,
        target_label: impl Into<String>,
    ) -> Self {
        self.source_label = Some(source_label.into());
        self.target_label = Some(target_label.into());
        self
    }
}

/// How repeated observations of the same ordered (source, target) pair merge.
///
/// The default reproduces the upstream behavior: a later record replaces the
/// stored weight. `Sum` accumulates instead and must be asked for by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    #[default]
    LastWriteWins,
    Sum,
}

/// Maps an edge weight to a traversal distance for betweenness.
///
/// Higher weight means a stronger connection, so the default treats it as
/// relationally *closer*. Weight-0 edges are excluded from traversal under
/// every transform, keeping the traversable edge set transform-independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceTransform {
    /// distance = 1 / weight
    #[default]
    Reciprocal,
    /// Every traversable edge costs 1 (unweighted hop counts).
    Unit,
}

impl DistanceTransform {
    /// Traversal cost of an edge, or `None` if the edge is untraversable.
    pub fn cost(&self, weight: f64) -> Option<f64> {
        if weight <= 0.0 {
            return None;
        }
        match self {
            Self::Reciprocal => Some(1.0 / weight),
            Self::Unit => Some(1.0),
        }
    }
}

/// Configuration for graph construction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Records with `weight < min_weight` are filtered out (default 0: keep all).
    #[serde(default = "default_min_weight")]
    pub min_weight: f64,
    #[serde(default)]
    pub merge_policy: MergePolicy,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            min_weight: default_min_weight(),
            merge_policy: MergePolicy::default(),
        }
    }
}

/// Configuration for the centrality calculations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_damping_factor")]
    pub damping: f64,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default)]
    pub distance_transform: DistanceTransform,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            damping: default_damping_factor(),
            tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
            distance_transform: DistanceTransform::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.damping.is_finite() || !(0.0..=1.0).contains(&self.damping) {
            return Err(CentralityError::invalid_parameter(
                "damping must be finite and in [0,1]",
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(CentralityError::invalid_parameter(
                "tolerance must be finite and > 0",
            ));
        }
        if self.max_iterations == 0 {
            return Err(CentralityError::invalid_parameter(
                "max_iterations must be > 0",
            ));
        }
        Ok(())
    }
}

/// Which adjacency a degree calculation sums over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    In,
    Out,
}

/// Why a record was dropped during graph construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Source or target id is empty.
    MissingId,
    NegativeWeight,
    /// Weight is NaN or infinite.
    NonFiniteWeight,
    /// source_id == target_id.
    SelfLoop,
}

/// A record dropped during graph construction, kept for caller visibility
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedRecord {
    pub record: EdgeRecord,
    pub reason: RejectReason,
}

/// Scores for a single centrality metric, keyed by node id
#[derive(Debug, Clone, Serialize)]
pub struct CentralityScores {
    pub scores: HashMap<String, f64>,
    pub nodes_processed: usize,
}

/// PageRank scores with convergence reporting.
///
/// `diff_l1` is the final L1 residual (sum of absolute per-node deltas)
/// between the last two iterations.
#[derive(Debug, Clone, Serialize)]
pub struct PageRankRun {
    pub scores: HashMap<String, f64>,
    pub iterations: usize,
    pub diff_l1: f64,
    pub converged: bool,
}

/// All four metrics for one node
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct NodeMetrics {
    pub out_weighted_degree: f64,
    pub in_weighted_degree: f64,
    pub betweenness: f64,
    pub pagerank: f64,
}

/// Combined result of a full centrality computation.
///
/// `pagerank_converged` is a warning annotation: when false, PageRank hit
/// the iteration cap before reaching tolerance and the partially-converged
/// ranks are still included. Iteration order of `scores` carries no meaning.
#[derive(Debug, Clone, Serialize)]
pub struct CentralityResult {
    pub scores: HashMap<String, NodeMetrics>,
    pub nodes_processed: usize,
    pub pagerank_iterations: usize,
    pub pagerank_converged: bool,
}

// Default values for serde
fn default_min_weight() -> f64 {
    0.0
}

fn default_damping_factor() -> f64 {
    0.85
}

fn default_tolerance() -> f64 {
    1e-8
}

fn default_max_iterations() -> usize {
    100
}
