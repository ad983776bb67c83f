//! Helpers for turning a score map into rankings downstream can render.

use std::collections::HashMap;

/// The `k` highest-scoring nodes, best first. Ties break on node id so the
/// ordering is deterministic regardless of map iteration order.
pub fn top_k(scores: &HashMap<String, f64>, k: usize) -> Vec<(String, f64)> {
    let mut ranked: Vec<(String, f64)> = scores
        .iter()
        .map(|(id, &score)| (id.clone(), score))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked.truncate(k);
    ranked
}

/// Scale scores into [0, 1] by dividing by the maximum. A map whose maximum
/// is 0 (or that is empty) is left untouched.
pub fn normalize_max(scores: &mut HashMap<String, f64>) {
    let max_score = scores.values().fold(0.0_f64, |a, &b| a.max(b));
    if max_score > 0.0 {
        for score in scores.values_mut() {
            *score /= max_score;
        }
    }
}
