// Per-component scores on [0, 1] and the weighted blend shared by the
// single-game and aggregate calculators.

use serde::Serialize;

use crate::config::{ComponentScales, WeightVector};
use crate::stats::DerivedMetrics;

/// Points on the 0-99 scale a perfect weighted blend is worth.
pub const RATING_SCALE: f64 = 99.0;

/// Each rating component mapped onto [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ComponentScores {
    pub attack: f64,
    pub block: f64,
    pub serve: f64,
    pub ace: f64,
    pub pass: f64,
    pub dig: f64,
    pub set: f64,
    pub consistency: f64,
}

impl ComponentScores {
    pub fn from_metrics(m: &DerivedMetrics, scales: &ComponentScales) -> Self {
        // A line with no actions has no error rate to be consistent about.
        let consistency = if m.has_activity() {
            (1.0 - m.error_rate / scales.max_error_rate).clamp(0.0, 1.0)
        } else {
            0.0
        };

        ComponentScores {
            attack: scales.attack.score(m.kill_pct),
            block: scales.block.score(m.blocks_per_set),
            serve: scales.serve.score(m.serve_pct),
            ace: scales.ace.score(m.ace_rate),
            pass: scales.pass.score(m.pass_rating),
            dig: scales.dig.score(m.digs_per_set),
            set: scales.set.score(m.set_rating),
            consistency,
        }
    }

    /// (weight, score) pairs in a fixed component order.
    pub fn weighted(&self, w: &WeightVector) -> [(f64, f64); 8] {
        [
            (w.attack, self.attack),
            (w.block, self.block),
            (w.serve, self.serve),
            (w.ace, self.ace),
            (w.pass, self.pass),
            (w.dig, self.dig),
            (w.set, self.set),
            (w.consistency, self.consistency),
        ]
    }
}

/// Weighted mean of `(weight, score)` pairs. Returns 0.0 when every weight
/// is zero.
pub fn weighted_mean(pairs: &[(f64, f64)]) -> f64 {
    let total_weight: f64 = pairs.iter().map(|(w, _)| w).sum();
    if total_weight <= 0.0 {
        return 0.0;
    }
    pairs.iter().map(|(w, s)| w * s).sum::<f64>() / total_weight
}

/// Unadjusted 0-99 score for a set of metrics under one weight vector.
pub fn base_score(m: &DerivedMetrics, weights: &WeightVector, scales: &ComponentScales) -> f64 {
    let scores = ComponentScores::from_metrics(m, scales);
    weighted_mean(&scores.weighted(weights)) * RATING_SCALE
}
