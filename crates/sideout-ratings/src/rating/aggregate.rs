// Aggregate ratings over many games, for players and teams.
//
// Raw counts are summed across games and normalized once. Sub-ratings group
// the rating components; the overall rating is the same weighted blend a
// single game uses at a neutral opponent tier.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::marker::PhantomData;
use tracing::debug;

use crate::config::{ComponentScales, RatingConfig, WeightVector};
use crate::position::Position;
use crate::rating::component::{weighted_mean, ComponentScores, RATING_SCALE};
use crate::rating::Rating;
use crate::stats::{normalize, DerivedMetrics, StatLine, StatLineError, TeamGameTotals};

// ---------------------------------------------------------------------------
// Sub-rating labels
// ---------------------------------------------------------------------------

/// Display names for the four sub-rating slots, in slot order:
/// attack, serve, receive, consistency.
pub trait SubRatingLabels {
    const LABELS: [&'static str; 4];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerLabels;

impl SubRatingLabels for PlayerLabels {
    const LABELS: [&'static str; 4] = ["attack", "serve", "receive", "mental"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamLabels;

impl SubRatingLabels for TeamLabels {
    const LABELS: [&'static str; 4] = ["attack", "serve", "reception", "consistency"];
}

// ---------------------------------------------------------------------------
// SubRatings / OverallRating
// ---------------------------------------------------------------------------

/// Four sub-ratings. Slot meaning is fixed; the label set `L` names them.
///
/// - attack: attack and block components
/// - serve: serve and ace components
/// - receive: pass, dig and set components
/// - consistency: error-rate component
pub struct SubRatings<L> {
    pub attack: Rating,
    pub serve: Rating,
    pub receive: Rating,
    pub consistency: Rating,
    labels: PhantomData<fn() -> L>,
}

impl<L: SubRatingLabels> SubRatings<L> {
    pub fn new(attack: Rating, serve: Rating, receive: Rating, consistency: Rating) -> Self {
        SubRatings {
            attack,
            serve,
            receive,
            consistency,
            labels: PhantomData,
        }
    }

    /// Sub-ratings paired with their labels, in slot order.
    pub fn labeled(&self) -> [(&'static str, Rating); 4] {
        let [a, s, r, c] = L::LABELS;
        [
            (a, self.attack),
            (s, self.serve),
            (r, self.receive),
            (c, self.consistency),
        ]
    }

    /// Look up a sub-rating by its label.
    pub fn get(&self, label: &str) -> Option<Rating> {
        self.labeled()
            .into_iter()
            .find(|(l, _)| *l == label)
            .map(|(_, r)| r)
    }
}

// Manual impls: the label marker never needs to satisfy these traits itself.
impl<L> Clone for SubRatings<L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<L> Copy for SubRatings<L> {}

impl<L> PartialEq for SubRatings<L> {
    fn eq(&self, other: &Self) -> bool {
        self.attack == other.attack
            && self.serve == other.serve
            && self.receive == other.receive
            && self.consistency == other.consistency
    }
}

impl<L> Eq for SubRatings<L> {}

impl<L: SubRatingLabels> fmt::Debug for SubRatings<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (label, rating) in self.labeled() {
            map.entry(&label, &rating.value());
        }
        map.finish()
    }
}

/// Serializes as a map keyed by the label set, e.g.
/// `{"attack": 71, "serve": 64, "receive": 58, "mental": 80}`.
impl<L: SubRatingLabels> Serialize for SubRatings<L> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        for (label, rating) in self.labeled() {
            map.serialize_entry(label, &rating)?;
        }
        map.end()
    }
}

/// Multi-game rating with its breakdown and sample-size flag.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(bound(serialize = "L: SubRatingLabels"))]
pub struct OverallRating<L: SubRatingLabels> {
    pub overall: Rating,
    pub sub_ratings: SubRatings<L>,
    pub games_played: usize,
    /// Fewer games than the provisional threshold; render distinctly.
    pub is_provisional: bool,
    pub aggregated_stats: DerivedMetrics,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Weighted mean of one component group on the 0-99 scale. A group whose
/// weights are all zero falls back to the plain mean so the sub-rating still
/// describes the player.
fn group_rating(pairs: &[(f64, f64)]) -> Rating {
    let total_weight: f64 = pairs.iter().map(|(w, _)| w).sum();
    let score = if total_weight > 0.0 {
        weighted_mean(pairs)
    } else if pairs.is_empty() {
        0.0
    } else {
        pairs.iter().map(|(_, s)| s).sum::<f64>() / pairs.len() as f64
    };
    Rating::from_score(score * RATING_SCALE)
}

fn aggregate<L: SubRatingLabels>(
    lines: impl Iterator<Item = StatLine>,
    games_played: usize,
    weights: &WeightVector,
    scales: &ComponentScales,
    provisional_threshold: usize,
) -> OverallRating<L> {
    let total: StatLine = lines.sum();
    let metrics = normalize(&total);
    let scores = ComponentScores::from_metrics(&metrics, scales);
    let w = weights;

    let sub_ratings = SubRatings::new(
        group_rating(&[(w.attack, scores.attack), (w.block, scores.block)]),
        group_rating(&[(w.serve, scores.serve), (w.ace, scores.ace)]),
        group_rating(&[
            (w.pass, scores.pass),
            (w.dig, scores.dig),
            (w.set, scores.set),
        ]),
        group_rating(&[(w.consistency, scores.consistency)]),
    );

    // Blending the group means by group weight is the full weighted mean;
    // computing it directly keeps it bit-identical to the single-game path.
    let overall = Rating::from_score(weighted_mean(&scores.weighted(weights)) * RATING_SCALE);

    OverallRating {
        overall,
        sub_ratings,
        games_played,
        is_provisional: games_played < provisional_threshold,
        aggregated_stats: metrics,
    }
}

/// Aggregate rating for one player across games (most recent first; order
/// does not affect the result).
pub fn rate_aggregate(
    lines: &[StatLine],
    position: Position,
    config: &RatingConfig,
) -> Result<OverallRating<PlayerLabels>, StatLineError> {
    for line in lines {
        line.validate()?;
    }

    let rating = aggregate(
        lines.iter().copied(),
        lines.len(),
        config.weights.for_position(position),
        &config.scales,
        config.provisional_threshold,
    );
    debug!(
        "Aggregate rating for {}: overall={} over {} games (provisional={})",
        position, rating.overall, rating.games_played, rating.is_provisional
    );
    Ok(rating)
}

/// Aggregate rating for a team from its per-game totals.
pub fn rate_team_aggregate(
    games: &[TeamGameTotals],
    config: &RatingConfig,
) -> Result<OverallRating<TeamLabels>, StatLineError> {
    for game in games {
        game.totals.validate()?;
    }

    let rating = aggregate(
        games.iter().map(|g| g.totals),
        games.len(),
        &config.weights.team,
        &config.scales,
        config.provisional_threshold,
    );
    debug!(
        "Team aggregate rating: overall={} over {} games (provisional={})",
        rating.overall, rating.games_played, rating.is_provisional
    );
    Ok(rating)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
