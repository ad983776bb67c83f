/*!
# Passnet Centrality

Centrality calculations for weighted directed pass networks.

This library provides:
- Graph construction from weighted relationship records, with per-record
  validation, threshold filtering, and explicit duplicate-edge merge policies
- Weighted in/out degree centrality
- Weighted betweenness centrality (Brandes' algorithm over shortest paths)
- Weighted PageRank with dangling-node handling and convergence reporting
- Ranking helpers for downstream tables and visuals

Data acquisition and tabular I/O live upstream; reporting and rendering live
downstream. Both talk to this crate through [`EdgeRecord`] sequences in and
[`CentralityResult`] tables out.
*/

pub mod algorithms;
pub mod builder;
pub mod error;
pub mod graph;
pub mod models;
pub mod rankings;

pub use algorithms::{
    calculate_all_centralities, calculate_betweenness, calculate_degree, calculate_pagerank,
};
pub use builder::{BuildOutcome, GraphBuilder};
pub use error::{CentralityError, Result};
pub use graph::{Graph, GraphStats};
pub use models::{
    BuildConfig, CentralityResult, CentralityScores, Direction, DistanceTransform, EdgeRecord,
    EngineConfig, MergePolicy, NodeMetrics, PageRankRun, RejectReason, RejectedRecord,
};
pub use rankings::{normalize_max, top_k};
