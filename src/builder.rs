use crate::graph::Graph;
use crate::models::{BuildConfig, EdgeRecord, MergePolicy, RejectReason, RejectedRecord};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Assembles an immutable [`Graph`] from a sequence of [`EdgeRecord`]s.
///
/// Records are processed in input order. Invalid records (empty id, negative
/// or non-finite weight) and self-loops go into the rejection list instead of
/// aborting the batch; records below the weight threshold are filtered and
/// counted. Duplicate ordered pairs merge per [`MergePolicy`] — by default a
/// later record replaces the stored weight, matching the upstream pipeline.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    config: BuildConfig,
}

/// A built graph together with the per-record accounting
#[derive(Debug, Clone, Serialize)]
pub struct BuildOutcome {
    #[serde(skip)]
    pub graph: Graph,
    /// Records dropped as invalid or self-looping, with reasons.
    pub rejected: Vec<RejectedRecord>,
    pub records_seen: usize,
    /// Accepted records (including ones merged into an existing edge).
    pub records_kept: usize,
    /// Valid records dropped because `weight < min_weight`.
    pub records_filtered: usize,
}

impl GraphBuilder {
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Build a graph from `records`. Pure: consumes its input, touches
    /// nothing else.
    pub fn build(&self, records: impl IntoIterator<Item = EdgeRecord>) -> BuildOutcome {
        let mut ids: Vec<String> = Vec::new();
        let mut labels: Vec<Option<String>> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        // Edges in first-insertion order; the map points at the slot to merge into.
        let mut edges: Vec<(usize, usize, f64)> = Vec::new();
        let mut edge_slots: HashMap<(usize, usize), usize> = HashMap::new();

        let mut rejected = Vec::new();
        let mut records_seen = 0usize;
        let mut records_kept = 0usize;
        let mut records_filtered = 0usize;

        for record in records {
            records_seen += 1;

            if let Some(reason) = Self::rejection_reason(&record) {
                warn!(
                    "Rejecting record {} -> {} ({:?})",
                    record.source_id, record.target_id, reason
                );
                rejected.push(RejectedRecord { record, reason });
                continue;
            }

            if record.weight < self.config.min_weight {
                debug!(
                    "Filtering record {} -> {} (weight {} below threshold {})",
                    record.source_id, record.target_id, record.weight, self.config.min_weight
                );
                records_filtered += 1;
                continue;
            }

            let source = intern(
                &mut ids,
                &mut labels,
                &mut index,
                &record.source_id,
                record.source_label.as_deref(),
            );
            let target = intern(
                &mut ids,
                &mut labels,
                &mut index,
                &record.target_id,
                record.target_label.as_deref(),
            );

            match edge_slots.get(&(source, target)) {
                Some(&slot) => match self.config.merge_policy {
                    MergePolicy::LastWriteWins => edges[slot].2 = record.weight,
                    MergePolicy::Sum => edges[slot].2 += record.weight,
                },
                None => {
                    edge_slots.insert((source, target), edges.len());
                    edges.push((source, target, record.weight));
                }
            }
            records_kept += 1;
        }

        let edge_count = edges.len();
        let mut out: Vec<Vec<(usize, f64)>> = vec![Vec::new(); ids.len()];
        let mut inc: Vec<Vec<(usize, f64)>> = vec![Vec::new(); ids.len()];
        for (source, target, weight) in edges {
            out[source].push((target, weight));
            inc[target].push((source, weight));
        }

        info!(
            "Graph built: {} nodes, {} edges ({} of {} records kept, {} filtered, {} rejected)",
            ids.len(),
            edge_count,
            records_kept,
            records_seen,
            records_filtered,
            rejected.len()
        );

        BuildOutcome {
            graph: Graph::from_parts(ids, labels, index, out, inc, edge_count),
            rejected,
            records_seen,
            records_kept,
            records_filtered,
        }
    }

    fn rejection_reason(record: &EdgeRecord) -> Option<RejectReason> {
        if record.source_id.is_empty() || record.target_id.is_empty() {
            return Some(RejectReason::MissingId);
        }
        if !record.weight.is_finite() {
            return Some(RejectReason::NonFiniteWeight);
        }
        if record.weight < 0.0 {
            return Some(RejectReason::NegativeWeight);
        }
        if record.source_id == record.target_id {
            return Some(RejectReason::SelfLoop);
        }
        None
    }
}

/// Intern `id`, creating the node on first sight. The first label seen for a
/// node wins; later labels never overwrite it.
fn intern(
    ids: &mut Vec<String>,
    labels: &mut Vec<Option<String>>,
    index: &mut HashMap<String, usize>,
    id: &str,
    label: Option<&str>,
) -> usize {
    match index.get(id) {
        Some(&i) => {
            if labels[i].is_none() {
                labels[i] = label.map(str::to_owned);
            }
            i
        }
        None => {
            let i = ids.len();
            ids.push(id.to_owned());
            labels.push(label.map(str::to_owned));
            index.insert(id.to_owned(), i);
            i
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_pair_overwrites_by_default() {
        let records = vec![
            EdgeRecord::new("a", "b", 3.0),
            EdgeRecord::new("a", "b", 7.0),
        ];
        let outcome = GraphBuilder::default().build(records);
        let g = &outcome.graph;

        assert_eq!(g.edge_count(), 1);
        let a = g.index_of("a").unwrap();
        let b = g.index_of("b").unwrap();
        assert_eq!(g.out_edges(a), &[(b, 7.0)]);
        assert_eq!(outcome.records_kept, 2);
    }

    #[test]
    fn sum_policy_accumulates_duplicate_pairs() {
        let config = BuildConfig {
            merge_policy: MergePolicy::Sum,
            ..BuildConfig::default()
        };
        let records = vec![
            EdgeRecord::new("a", "b", 3.0),
            EdgeRecord::new("a", "b", 7.0),
        ];
        let g = GraphBuilder::new(config).build(records).graph;

        let a = g.index_of("a").unwrap();
        assert_eq!(g.out_edges(a)[0].1, 10.0);
    }

    #[test]
    fn min_weight_threshold_filters_records() {
        let config = BuildConfig {
            min_weight: 5.0,
            ..BuildConfig::default()
        };
        let records = vec![
            EdgeRecord::new("a", "b", 2.0),
            EdgeRecord::new("b", "c", 5.0),
            EdgeRecord::new("c", "d", 9.0),
        ];
        let outcome = GraphBuilder::new(config).build(records);

        assert_eq!(outcome.graph.edge_count(), 2);
        assert_eq!(outcome.records_filtered, 1);
        assert!(outcome.rejected.is_empty());
        // the node only reachable through the filtered record never appears
        assert!(outcome.graph.index_of("a").is_none());
    }

    #[test]
    fn self_loops_are_rejected_not_filtered() {
        let records = vec![
            EdgeRecord::new("a", "a", 4.0),
            EdgeRecord::new("a", "b", 4.0),
        ];
        let outcome = GraphBuilder::default().build(records);

        assert_eq!(outcome.graph.edge_count(), 1);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].reason, RejectReason::SelfLoop);
        assert_eq!(outcome.records_filtered, 0);
    }

    #[test]
    fn invalid_records_are_rejected_with_reasons() {
        let records = vec![
            EdgeRecord::new("", "b", 1.0),
            EdgeRecord::new("a", "", 1.0),
            EdgeRecord::new("a", "b", -2.0),
            EdgeRecord::new("a", "b", f64::NAN),
            EdgeRecord::new("a", "b", f64::INFINITY),
        ];
        let outcome = GraphBuilder::default().build(records);

        assert!(outcome.graph.is_empty());
        let reasons: Vec<_> = outcome.rejected.iter().map(|r| r.reason).collect();
        assert_eq!(
            reasons,
            vec![
                RejectReason::MissingId,
                RejectReason::MissingId,
                RejectReason::NegativeWeight,
                RejectReason::NonFiniteWeight,
                RejectReason::NonFiniteWeight,
            ]
        );
    }

    #[test]
    fn one_bad_record_never_aborts_the_batch() {
        let records = vec![
            EdgeRecord::new("a", "b", 1.0),
            EdgeRecord::new("", "x", 1.0),
            EdgeRecord::new("b", "c", 2.0),
        ];
        let outcome = GraphBuilder::default().build(records);

        assert_eq!(outcome.graph.node_count(), 3);
        assert_eq!(outcome.graph.edge_count(), 2);
        assert_eq!(outcome.rejected.len(), 1);
    }

    #[test]
    fn first_label_seen_wins() {
        let records = vec![
            EdgeRecord::new("30", "35", 5.0).with_labels("Curry, Stephen", "Durant, Kevin"),
            EdgeRecord::new("30", "23", 3.0).with_labels("S. Curry", "Green, Draymond"),
        ];
        let g = GraphBuilder::default().build(records).graph;

        let curry = g.index_of("30").unwrap();
        assert_eq!(g.node_label(curry), Some("Curry, Stephen"));
    }

    #[test]
    fn label_fills_in_from_the_first_record_that_carries_one() {
        let records = vec![
            EdgeRecord::new("30", "35", 5.0),
            EdgeRecord::new("35", "30", 2.0).with_labels("Durant, Kevin", "Curry, Stephen"),
        ];
        let g = GraphBuilder::default().build(records).graph;

        let curry = g.index_of("30").unwrap();
        assert_eq!(g.node_label(curry), Some("Curry, Stephen"));
    }

    #[test]
    fn empty_input_builds_an_empty_graph() {
        let outcome = GraphBuilder::default().build(Vec::new());
        assert!(outcome.graph.is_empty());
        assert_eq!(outcome.records_seen, 0);
    }

    #[test]
    fn zero_weight_records_are_kept_by_default() {
        // AST=0 rows survive cleaning upstream; they must survive here too.
        let records = vec![EdgeRecord::new("a", "b", 0.0)];
        let g = GraphBuilder::default().build(records).graph;
        assert_eq!(g.edge_count(), 1);
    }
}
