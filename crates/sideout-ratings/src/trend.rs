// Recent-form trend detection.
//
// Compares the average of the most recent window of games against the
// window immediately before it. With no previous window, the comparison is
// against a fixed per-metric baseline instead.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use crate::config::{TrendBaselines, TrendConfig};
use crate::rating::Rating;
use crate::stats::{normalize, StatLine};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrendError {
    #[error("trend window must be at least 1 game")]
    ZeroWindow,

    #[error("trend threshold must be a finite value >= 0, got {0}")]
    InvalidThreshold(f64),
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendMetric {
    KillPct,
    ServePct,
    PassRating,
    ErrorRate,
    Overall,
}

impl TrendMetric {
    pub const ALL: [TrendMetric; 5] = [
        TrendMetric::KillPct,
        TrendMetric::ServePct,
        TrendMetric::PassRating,
        TrendMetric::ErrorRate,
        TrendMetric::Overall,
    ];

    /// Metrics where a decrease is an improvement.
    pub fn lower_is_better(&self) -> bool {
        matches!(self, TrendMetric::ErrorRate)
    }

    pub fn baseline(&self, baselines: &TrendBaselines) -> f64 {
        match self {
            TrendMetric::KillPct => baselines.kill_pct,
            TrendMetric::ServePct => baselines.serve_pct,
            TrendMetric::PassRating => baselines.pass_rating,
            TrendMetric::ErrorRate => baselines.error_rate,
            TrendMetric::Overall => baselines.overall,
        }
    }
}

/// One game's values for every trend metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GameMetrics {
    pub kill_pct: f64,
    pub serve_pct: f64,
    pub pass_rating: f64,
    pub error_rate: f64,
    /// Game rating or another composite score on the 0-99 scale.
    pub overall: f64,
}

impl GameMetrics {
    pub fn from_game(line: &StatLine, rating: Rating) -> Self {
        let m = normalize(line);
        GameMetrics {
            kill_pct: m.kill_pct,
            serve_pct: m.serve_pct,
            pass_rating: m.pass_rating,
            error_rate: m.error_rate,
            overall: rating.value() as f64,
        }
    }

    pub fn value(&self, metric: TrendMetric) -> f64 {
        match metric {
            TrendMetric::KillPct => self.kill_pct,
            TrendMetric::ServePct => self.serve_pct,
            TrendMetric::PassRating => self.pass_rating,
            TrendMetric::ErrorRate => self.error_rate,
            TrendMetric::Overall => self.overall,
        }
    }
}

// ---------------------------------------------------------------------------
// Trend output
// ---------------------------------------------------------------------------

/// Direction of improvement. For lower-is-better metrics `Up` means the raw
/// value fell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trend {
    pub direction: TrendDirection,
    /// Raw `recent_avg - previous_avg`, without polarity inversion.
    pub delta: f64,
    pub recent_avg: f64,
    /// Previous-window average, or the metric baseline if there was none.
    pub previous_avg: f64,
    pub percent_change: f64,
}

impl Trend {
    fn flat(recent_avg: f64) -> Self {
        Trend {
            direction: TrendDirection::Stable,
            delta: 0.0,
            recent_avg,
            previous_avg: recent_avg,
            percent_change: 0.0,
        }
    }
}

pub type TrendReport = BTreeMap<TrendMetric, Trend>;

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Relative change of `delta` against `previous`. Falls back to the absolute
/// change when the previous average is zero.
pub fn percent_change(delta: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        delta.abs()
    } else {
        delta.abs() / previous.abs()
    }
}

/// Classify a change. Anything not strictly above the threshold (including
/// NaN input) is stable.
pub fn classify(delta: f64, pct: f64, threshold: f64, lower_is_better: bool) -> TrendDirection {
    if !(pct > threshold) {
        return TrendDirection::Stable;
    }
    let improved = if lower_is_better { delta < 0.0 } else { delta > 0.0 };
    let worsened = if lower_is_better { delta > 0.0 } else { delta < 0.0 };
    if improved {
        TrendDirection::Up
    } else if worsened {
        TrendDirection::Down
    } else {
        TrendDirection::Stable
    }
}

/// Compute a trend for every metric from games ordered most recent first.
///
/// `recent` is the first `window` games and `previous` the next `window`.
/// Fewer than two games gives a stable, zero-delta trend for every metric.
pub fn compute_trends(
    games: &[GameMetrics],
    window: usize,
    threshold: f64,
    baselines: &TrendBaselines,
) -> Result<TrendReport, TrendError> {
    if window == 0 {
        return Err(TrendError::ZeroWindow);
    }
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(TrendError::InvalidThreshold(threshold));
    }

    let recent = &games[..games.len().min(window)];
    let previous = &games[recent.len()..games.len().min(window * 2)];

    let mut report = TrendReport::new();
    for metric in TrendMetric::ALL {
        let recent_values: Vec<f64> = recent.iter().map(|g| g.value(metric)).collect();
        let recent_avg = mean(&recent_values);

        if games.len() < 2 {
            report.insert(metric, Trend::flat(recent_avg));
            continue;
        }

        let previous_avg = if previous.is_empty() {
            metric.baseline(baselines)
        } else {
            let values: Vec<f64> = previous.iter().map(|g| g.value(metric)).collect();
            mean(&values)
        };

        let delta = recent_avg - previous_avg;
        let pct = percent_change(delta, previous_avg);
        let direction = classify(delta, pct, threshold, metric.lower_is_better());

        report.insert(
            metric,
            Trend {
                direction,
                delta,
                recent_avg,
                previous_avg,
                percent_change: pct,
            },
        );
    }

    debug!(
        "Computed trends over {} games (window {}, {} previous)",
        games.len(),
        window,
        previous.len()
    );
    Ok(report)
}

/// `compute_trends` with the window, threshold and baselines from config.
pub fn compute_trends_default(
    games: &[GameMetrics],
    config: &TrendConfig,
) -> Result<TrendReport, TrendError> {
    compute_trends(games, config.window, config.threshold, &config.baselines)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
