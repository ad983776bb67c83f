use crate::error::{CentralityError, Result};
use crate::graph::Graph;
use crate::models::{
    CentralityResult, CentralityScores, DistanceTransform, Direction, EngineConfig, NodeMetrics,
    PageRankRun,
};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Tie tolerance when comparing accumulated path distances.
const DIST_EPS: f64 = 1e-12;

/// Calculate weighted degree centrality: the sum of edge weights over the
/// chosen adjacency of each node.
pub fn calculate_degree(graph: &Graph, direction: Direction) -> Result<CentralityScores> {
    let start = Instant::now();
    info!(
        "Starting degree centrality calculation for direction: {:?}",
        direction
    );

    if graph.is_empty() {
        return Err(CentralityError::EmptyGraph);
    }

    let values = degree_values(graph, direction);
    let scores = score_map(graph, &values);

    info!(
        "Degree centrality calculation completed in {:?} for {} nodes",
        start.elapsed(),
        scores.len()
    );

    Ok(CentralityScores {
        nodes_processed: scores.len(),
        scores,
    })
}

/// Calculate weighted betweenness centrality (Brandes' algorithm, directed).
///
/// Edge weights become traversal distances through `transform` (default:
/// reciprocal, so stronger connections are shorter); weight-0 edges are
/// unreachable. Scores are raw pair-dependency sums — directed pairs are
/// counted once each, with no halving and no pair-count normalization.
pub fn calculate_betweenness(
    graph: &Graph,
    transform: DistanceTransform,
) -> Result<CentralityScores> {
    let start = Instant::now();
    info!("Starting betweenness centrality calculation");

    if graph.is_empty() {
        return Err(CentralityError::EmptyGraph);
    }

    let values = betweenness_values(graph, transform);
    let scores = score_map(graph, &values);

    info!(
        "Betweenness centrality calculation completed in {:?} for {} nodes",
        start.elapsed(),
        scores.len()
    );

    Ok(CentralityScores {
        nodes_processed: scores.len(),
        scores,
    })
}

/// Calculate weighted PageRank by power iteration.
///
/// Each node spreads its rank across outgoing edges proportionally to their
/// weights; a node with zero out-weight spreads its rank uniformly over the
/// whole graph. Iteration stops when the L1 residual drops below
/// `config.tolerance` or after `config.max_iterations` steps — hitting the
/// cap is reported through `converged`, not as an error.
pub fn calculate_pagerank(graph: &Graph, config: &EngineConfig) -> Result<PageRankRun> {
    let start = Instant::now();
    info!(
        "Starting PageRank calculation with damping={}, tolerance={}, max_iterations={}",
        config.damping, config.tolerance, config.max_iterations
    );

    config.validate()?;
    if graph.is_empty() {
        return Err(CentralityError::EmptyGraph);
    }

    let run = pagerank_values(graph, config);
    if run.converged {
        info!("PageRank converged after {} iterations", run.iterations);
    } else {
        warn!(
            "PageRank hit the iteration cap ({}) with residual {:.3e}; returning partially-converged ranks",
            run.iterations, run.diff_l1
        );
    }

    let scores = score_map(graph, &run.scores);
    info!(
        "PageRank calculation completed in {:?} for {} nodes",
        start.elapsed(),
        scores.len()
    );

    Ok(PageRankRun {
        scores,
        iterations: run.iterations,
        diff_l1: run.diff_l1,
        converged: run.converged,
    })
}

/// Calculate all centrality metrics in one pass over the graph.
pub fn calculate_all_centralities(graph: &Graph, config: &EngineConfig) -> Result<CentralityResult> {
    let start = Instant::now();
    info!("Starting calculation of all centrality metrics");

    config.validate()?;
    if graph.is_empty() {
        return Err(CentralityError::EmptyGraph);
    }

    let out_degree = degree_values(graph, Direction::Out);
    let in_degree = degree_values(graph, Direction::In);
    let betweenness = betweenness_values(graph, config.distance_transform);
    let pagerank = pagerank_values(graph, config);

    if !pagerank.converged {
        warn!(
            "PageRank hit the iteration cap ({}) with residual {:.3e}; returning partially-converged ranks",
            pagerank.iterations, pagerank.diff_l1
        );
    }

    let n = graph.node_count();
    let mut scores = HashMap::with_capacity(n);
    for i in 0..n {
        scores.insert(
            graph.node_id(i).to_owned(),
            NodeMetrics {
                out_weighted_degree: out_degree[i],
                in_weighted_degree: in_degree[i],
                betweenness: betweenness[i],
                pagerank: pagerank.scores[i],
            },
        );
    }

    info!(
        "All centrality calculations completed in {:?} for {} nodes",
        start.elapsed(),
        n
    );

    Ok(CentralityResult {
        scores,
        nodes_processed: n,
        pagerank_iterations: pagerank.iterations,
        pagerank_converged: pagerank.converged,
    })
}

fn score_map(graph: &Graph, values: &[f64]) -> HashMap<String, f64> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| (graph.node_id(i).to_owned(), v))
        .collect()
}

fn degree_values(graph: &Graph, direction: Direction) -> Vec<f64> {
    (0..graph.node_count())
        .map(|i| {
            let edges = match direction {
                Direction::Out => graph.out_edges(i),
                Direction::In => graph.in_edges(i),
            };
            edges.iter().map(|&(_, w)| w).sum()
        })
        .collect()
}

/// Min-heap entry for the shortest-path search. Distances are finite and
/// never NaN (costs come from `DistanceTransform::cost`).
#[derive(Debug, Clone, Copy, PartialEq)]
struct HeapEntry {
    dist: f64,
    node: usize,
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed for BinaryHeap's max-heap; ties break on node for determinism
        other
            .dist
            .partial_cmp(&self.dist)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One source's contribution to betweenness: Dijkstra to count shortest
/// paths, then dependency accumulation in reverse settling order. Endpoints
/// of a pair are excluded from its dependency by construction.
fn accumulate_from_source(
    graph: &Graph,
    transform: DistanceTransform,
    source: usize,
    betweenness: &mut [f64],
) {
    let n = graph.node_count();
    let mut dist = vec![f64::INFINITY; n];
    let mut sigma = vec![0.0; n];
    let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut settled = vec![false; n];
    let mut settle_order = Vec::new();
    let mut heap = BinaryHeap::new();

    dist[source] = 0.0;
    sigma[source] = 1.0;
    heap.push(HeapEntry {
        dist: 0.0,
        node: source,
    });

    while let Some(HeapEntry { dist: d, node: v }) = heap.pop() {
        if settled[v] {
            continue;
        }
        settled[v] = true;
        settle_order.push(v);

        for &(w_node, weight) in graph.out_edges(v) {
            let Some(cost) = transform.cost(weight) else {
                continue;
            };
            let candidate = d + cost;
            if candidate + DIST_EPS < dist[w_node] {
                dist[w_node] = candidate;
                sigma[w_node] = sigma[v];
                preds[w_node].clear();
                preds[w_node].push(v);
                heap.push(HeapEntry {
                    dist: candidate,
                    node: w_node,
                });
            } else if (candidate - dist[w_node]).abs() <= DIST_EPS && !settled[w_node] {
                // another shortest path to w_node, through v
                sigma[w_node] += sigma[v];
                preds[w_node].push(v);
            }
        }
    }

    let mut delta = vec![0.0; n];
    for &v in settle_order.iter().rev() {
        for &p in &preds[v] {
            delta[p] += sigma[p] / sigma[v] * (1.0 + delta[v]);
        }
        if v != source {
            betweenness[v] += delta[v];
        }
    }
}

#[cfg(not(feature = "parallel"))]
fn betweenness_values(graph: &Graph, transform: DistanceTransform) -> Vec<f64> {
    let n = graph.node_count();
    let mut totals = vec![0.0; n];
    for source in 0..n {
        accumulate_from_source(graph, transform, source, &mut totals);
    }
    totals
}

/// Per-source searches are independent, so fan them out and merge partial
/// sums afterwards. Partials are collected in source order and reduced
/// sequentially, keeping results identical to the serial path.
#[cfg(feature = "parallel")]
fn betweenness_values(graph: &Graph, transform: DistanceTransform) -> Vec<f64> {
    use rayon::prelude::*;

    let n = graph.node_count();
    let partials: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|source| {
            let mut partial = vec![0.0; n];
            accumulate_from_source(graph, transform, source, &mut partial);
            partial
        })
        .collect();

    let mut totals = vec![0.0; n];
    for partial in partials {
        for (total, value) in totals.iter_mut().zip(partial) {
            *total += value;
        }
    }
    totals
}

struct PageRankValues {
    scores: Vec<f64>,
    iterations: usize,
    diff_l1: f64,
    converged: bool,
}

fn pagerank_values(graph: &Graph, config: &EngineConfig) -> PageRankValues {
    let n = graph.node_count();
    let n_f64 = n as f64;
    let mut scores = vec![1.0 / n_f64; n];
    let mut new_scores = vec![0.0; n];

    // Out-weight sums decide each node's share split; zero out-weight makes
    // the node dangling even if it has zero-weight edges.
    let out_wsum: Vec<f64> = (0..n)
        .map(|u| graph.out_edges(u).iter().map(|&(_, w)| w).sum())
        .collect();

    let mut iterations = 0usize;
    let mut diff_l1 = f64::INFINITY;
    let mut converged = false;
    for _ in 0..config.max_iterations {
        iterations += 1;

        let dangling_sum: f64 = out_wsum
            .iter()
            .enumerate()
            .filter(|(_, &ws)| ws == 0.0)
            .map(|(i, _)| scores[i])
            .sum();
        let dangling_contrib = config.damping * dangling_sum / n_f64;
        let teleport = (1.0 - config.damping) / n_f64;
        new_scores.fill(teleport + dangling_contrib);

        for u in 0..n {
            let ws = out_wsum[u];
            if ws > 0.0 {
                for &(v, w) in graph.out_edges(u) {
                    if w > 0.0 {
                        new_scores[v] += config.damping * scores[u] * (w / ws);
                    }
                }
            }
        }

        let diff: f64 = scores
            .iter()
            .zip(new_scores.iter())
            .map(|(old, new)| (old - new).abs())
            .sum();
        diff_l1 = diff;
        std::mem::swap(&mut scores, &mut new_scores);

        debug!("Iteration {}: L1 residual = {:.3e}", iterations, diff);
        if diff < config.tolerance {
            converged = true;
            break;
        }
    }

    PageRankValues {
        scores,
        iterations,
        diff_l1,
        converged,
    }
}
