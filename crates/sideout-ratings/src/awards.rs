// Match and season awards with deterministic tie-breaking.
//
// Every category ranks participants by a primary score, then a raw-volume
// secondary key, then player id ascending. A category where nobody scores
// above zero produces no award.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use crate::stats::{normalize, DerivedMetrics, StatLine, StatLineError};

// Weights inside the MVP composite.
const MVP_DIG_WEIGHT: f64 = 0.5;
const MVP_PASS_POINT_WEIGHT: f64 = 0.1;
const MVP_SET_POINT_WEIGHT: f64 = 0.05;

/// Credit per serve kept in play in the top-server score.
const SERVE_IN_PLAY_WEIGHT: f64 = 0.1;

/// Pseudo-attempts that shrink the passer score toward zero for small samples.
const PASS_VOLUME_PRIOR: f64 = 5.0;

// ---------------------------------------------------------------------------
// Award types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown award type `{0}`")]
pub struct ParseAwardTypeError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwardType {
    Mvp,
    TopAttacker,
    TopServer,
    TopDefender,
    TopPasser,
}

impl AwardType {
    /// Categories in presentation order.
    pub const ALL: [AwardType; 5] = [
        AwardType::Mvp,
        AwardType::TopAttacker,
        AwardType::TopServer,
        AwardType::TopDefender,
        AwardType::TopPasser,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AwardType::Mvp => "MVP",
            AwardType::TopAttacker => "Top Attacker",
            AwardType::TopServer => "Top Server",
            AwardType::TopDefender => "Top Defender",
            AwardType::TopPasser => "Top Passer",
        }
    }

    /// What the first tie-breaker compares.
    pub fn secondary_key(&self) -> &'static str {
        match self {
            AwardType::Mvp => "total actions",
            AwardType::TopAttacker => "kills",
            AwardType::TopServer => "serve attempts",
            AwardType::TopDefender => "digs",
            AwardType::TopPasser => "pass attempts",
        }
    }

    /// Primary score and secondary tie-break key for one participant.
    fn score(&self, line: &StatLine, m: &DerivedMetrics) -> (f64, f64) {
        match self {
            AwardType::Mvp => {
                let composite = m.kills as f64
                    + m.aces as f64
                    + m.blocks
                    + MVP_DIG_WEIGHT * m.digs as f64
                    + MVP_PASS_POINT_WEIGHT * line.pass_sum as f64
                    + MVP_SET_POINT_WEIGHT * line.set_sum as f64
                    - m.total_errors as f64;
                (composite, m.total_actions as f64)
            }
            AwardType::TopAttacker => {
                let score = m.kills as f64 * (1.0 + m.kill_pct);
                (score, m.kills as f64)
            }
            AwardType::TopServer => {
                let in_play = line.serve_attempts.saturating_sub(line.service_errors);
                let score = m.aces as f64 + SERVE_IN_PLAY_WEIGHT * in_play as f64;
                (score, m.serve_attempts as f64)
            }
            AwardType::TopDefender => (m.digs as f64 + m.blocks, m.digs as f64),
            AwardType::TopPasser => {
                let n = m.pass_attempts as f64;
                let score = m.pass_rating * n / (n + PASS_VOLUME_PRIOR);
                (score, n)
            }
        }
    }
}

impl FromStr for AwardType {
    type Err = ParseAwardTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "mvp" => Ok(AwardType::Mvp),
            "topattacker" => Ok(AwardType::TopAttacker),
            "topserver" => Ok(AwardType::TopServer),
            "topdefender" => Ok(AwardType::TopDefender),
            "toppasser" => Ok(AwardType::TopPasser),
            _ => Err(ParseAwardTypeError(s.to_string())),
        }
    }
}

impl fmt::Display for AwardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// A stat line tagged with the player it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantLine {
    pub player_id: String,
    pub stats: StatLine,
}

/// Every participant line from one match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchAggregate {
    pub match_id: String,
    pub participants: Vec<ParticipantLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Award {
    pub award_type: AwardType,
    pub player_id: String,
    /// The winning primary score.
    pub award_value: Option<f64>,
}

/// One participant's standing in a category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub player_id: String,
    pub score: f64,
    pub secondary: f64,
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Validate every line and sum lines that share a player id.
fn group_by_player<'a>(
    lines: impl Iterator<Item = &'a ParticipantLine>,
) -> Result<BTreeMap<String, StatLine>, StatLineError> {
    let mut grouped: BTreeMap<String, StatLine> = BTreeMap::new();
    for p in lines {
        p.stats.validate().map_err(|e| StatLineError::Participant {
            player_id: p.player_id.clone(),
            source: Box::new(e),
        })?;
        let entry = grouped.entry(p.player_id.clone()).or_default();
        *entry = *entry + p.stats;
    }
    Ok(grouped)
}

/// Higher score, then higher secondary, then smaller player id.
fn rank_order(a: &RankedEntry, b: &RankedEntry) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.secondary.total_cmp(&a.secondary))
        .then_with(|| a.player_id.cmp(&b.player_id))
}

fn rank_grouped(grouped: &BTreeMap<String, StatLine>, award_type: AwardType) -> Vec<RankedEntry> {
    let mut ranked: Vec<RankedEntry> = grouped
        .iter()
        .filter_map(|(id, line)| {
            let (score, secondary) = award_type.score(line, &normalize(line));
            (score > 0.0).then(|| RankedEntry {
                player_id: id.clone(),
                score,
                secondary,
            })
        })
        .collect();
    ranked.sort_by(rank_order);
    ranked
}

/// Full ranking of eligible participants for one category, best first.
/// Lines sharing a player id are summed.
pub fn rank_category(
    participants: &[ParticipantLine],
    award_type: AwardType,
) -> Result<Vec<RankedEntry>, StatLineError> {
    let grouped = group_by_player(participants.iter())?;
    Ok(rank_grouped(&grouped, award_type))
}

fn select_awards(grouped: &BTreeMap<String, StatLine>) -> Vec<Award> {
    let mut awards = Vec::new();
    for award_type in AwardType::ALL {
        let ranked = rank_grouped(grouped, award_type);
        let Some(winner) = ranked.into_iter().next() else {
            debug!("No eligible participant for {}", award_type);
            continue;
        };
        debug!(
            "{} -> {} (score {:.2}, {} {})",
            award_type,
            winner.player_id,
            winner.score,
            award_type.secondary_key(),
            winner.secondary
        );
        awards.push(Award {
            award_type,
            player_id: winner.player_id,
            award_value: Some(winner.score),
        });
    }
    awards
}

/// Awards for one match, at most one per category, in `AwardType::ALL`
/// order. The MVP may also win specialty categories.
pub fn compute_match_awards(participants: &[ParticipantLine]) -> Result<Vec<Award>, StatLineError> {
    let grouped = group_by_player(participants.iter())?;
    Ok(select_awards(&grouped))
}

/// Season awards: each player's lines are summed across every match, then
/// ranked exactly like a single match.
pub fn compute_season_awards(matches: &[MatchAggregate]) -> Result<Vec<Award>, StatLineError> {
    let grouped = group_by_player(matches.iter().flat_map(|m| m.participants.iter()))?;
    debug!(
        "Season awards over {} matches, {} players",
        matches.len(),
        grouped.len()
    );
    Ok(select_awards(&grouped))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
