// Raw stat lines and the ratio normalizer shared by every rating path.
//
// All ratio formulas live in `normalize`. Aggregates sum raw counts first and
// normalize once, so single-game and multi-game ratings never drift apart.

use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::Add;
use thiserror::Error;
use tracing::warn;

/// Highest score a single pass or set can receive.
pub const MAX_QUALITY_SCORE: u32 = 3;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatLineError {
    #[error("`{field}` ({value}) exceeds `{limit_field}` ({limit})")]
    ExceedsAttempts {
        field: &'static str,
        value: u64,
        limit_field: &'static str,
        limit: u64,
    },

    #[error("`{field}` ({value}) exceeds the maximum of {max} for {attempts} attempts")]
    QualitySumOutOfRange {
        field: &'static str,
        value: u32,
        attempts: u32,
        max: u64,
    },

    #[error("starting rotation {0} is outside 1-6")]
    StartingRotation(u8),

    #[error("opponent tier {0} is outside 1-9")]
    OpponentTier(u8),

    #[error("invalid stat line for player `{player_id}`: {source}")]
    Participant {
        player_id: String,
        #[source]
        source: Box<StatLineError>,
    },
}

// ---------------------------------------------------------------------------
// StatLine
// ---------------------------------------------------------------------------

/// One player's counting stats for one game.
///
/// Missing columns deserialize as zero so box scores that never track a skill
/// (e.g. set quality) still load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatLine {
    pub kills: u32,
    pub attack_errors: u32,
    pub attack_attempts: u32,

    pub aces: u32,
    pub service_errors: u32,
    pub serve_attempts: u32,

    pub block_solos: u32,
    pub block_assists: u32,
    pub block_touches: u32,

    pub digs: u32,
    pub ball_handling_errors: u32,

    pub pass_attempts: u32,
    /// Sum of 0-3 pass quality scores.
    pub pass_sum: u32,

    pub set_attempts: u32,
    /// Sum of 0-3 set quality scores.
    pub set_sum: u32,
    pub set_errors: u32,

    pub sets_played: u32,
    pub rotations_played: u32,
    pub starting_rotation: Option<u8>,
}

impl StatLine {
    /// Check the caller contract: no error or made-action count may exceed
    /// its attempts, quality sums stay within 3 per attempt, and the starting
    /// rotation (if any) is 1-6.
    pub fn validate(&self) -> Result<(), StatLineError> {
        let result = self.check_bounds();
        if let Err(ref e) = result {
            warn!("rejecting stat line: {}", e);
        }
        result
    }

    fn check_bounds(&self) -> Result<(), StatLineError> {
        let attack = self.attack_attempts as u64;
        let serve = self.serve_attempts as u64;

        not_above("attack_errors", self.attack_errors as u64, "attack_attempts", attack)?;
        not_above(
            "kills + attack_errors",
            self.kills as u64 + self.attack_errors as u64,
            "attack_attempts",
            attack,
        )?;
        not_above("service_errors", self.service_errors as u64, "serve_attempts", serve)?;
        not_above(
            "aces + service_errors",
            self.aces as u64 + self.service_errors as u64,
            "serve_attempts",
            serve,
        )?;
        not_above(
            "set_errors",
            self.set_errors as u64,
            "set_attempts",
            self.set_attempts as u64,
        )?;

        quality_in_range("pass_sum", self.pass_sum, self.pass_attempts)?;
        quality_in_range("set_sum", self.set_sum, self.set_attempts)?;

        if let Some(rotation) = self.starting_rotation {
            if !(1..=6).contains(&rotation) {
                return Err(StatLineError::StartingRotation(rotation));
            }
        }

        Ok(())
    }

    /// Sum a slice of stat lines into one line of raw totals.
    pub fn total(lines: &[StatLine]) -> StatLine {
        lines.iter().copied().sum()
    }
}

fn not_above(
    field: &'static str,
    value: u64,
    limit_field: &'static str,
    limit: u64,
) -> Result<(), StatLineError> {
    if value > limit {
        return Err(StatLineError::ExceedsAttempts {
            field,
            value,
            limit_field,
            limit,
        });
    }
    Ok(())
}

fn quality_in_range(field: &'static str, sum: u32, attempts: u32) -> Result<(), StatLineError> {
    let max = attempts as u64 * MAX_QUALITY_SCORE as u64;
    if sum as u64 > max {
        return Err(StatLineError::QualitySumOutOfRange {
            field,
            value: sum,
            attempts,
            max,
        });
    }
    Ok(())
}

/// Field-wise saturating sum of raw counts. The starting rotation survives
/// only when both sides agree; aggregates built with `Sum` therefore carry
/// none.
impl Add for StatLine {
    type Output = StatLine;

    fn add(self, rhs: StatLine) -> StatLine {
        StatLine {
            kills: self.kills.saturating_add(rhs.kills),
            attack_errors: self.attack_errors.saturating_add(rhs.attack_errors),
            attack_attempts: self.attack_attempts.saturating_add(rhs.attack_attempts),
            aces: self.aces.saturating_add(rhs.aces),
            service_errors: self.service_errors.saturating_add(rhs.service_errors),
            serve_attempts: self.serve_attempts.saturating_add(rhs.serve_attempts),
            block_solos: self.block_solos.saturating_add(rhs.block_solos),
            block_assists: self.block_assists.saturating_add(rhs.block_assists),
            block_touches: self.block_touches.saturating_add(rhs.block_touches),
            digs: self.digs.saturating_add(rhs.digs),
            ball_handling_errors: self
                .ball_handling_errors
                .saturating_add(rhs.ball_handling_errors),
            pass_attempts: self.pass_attempts.saturating_add(rhs.pass_attempts),
            pass_sum: self.pass_sum.saturating_add(rhs.pass_sum),
            set_attempts: self.set_attempts.saturating_add(rhs.set_attempts),
            set_sum: self.set_sum.saturating_add(rhs.set_sum),
            set_errors: self.set_errors.saturating_add(rhs.set_errors),
            sets_played: self.sets_played.saturating_add(rhs.sets_played),
            rotations_played: self.rotations_played.saturating_add(rhs.rotations_played),
            starting_rotation: if self.starting_rotation == rhs.starting_rotation {
                self.starting_rotation
            } else {
                None
            },
        }
    }
}

impl Sum for StatLine {
    fn sum<I: Iterator<Item = StatLine>>(iter: I) -> StatLine {
        iter.fold(StatLine::default(), Add::add)
    }
}

// ---------------------------------------------------------------------------
// Team totals
// ---------------------------------------------------------------------------

/// One game's stat totals for a whole team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamGameTotals {
    pub totals: StatLine,
}

impl TeamGameTotals {
    /// Sum every player's line for one game.
    ///
    /// Sets played is the longest individual stint, not the sum, since every
    /// player on the court shares the same sets.
    pub fn from_player_lines(lines: &[StatLine]) -> Self {
        let mut totals = StatLine::total(lines);
        totals.sets_played = lines.iter().map(|l| l.sets_played).max().unwrap_or(0);
        TeamGameTotals { totals }
    }
}

impl From<StatLine> for TeamGameTotals {
    fn from(totals: StatLine) -> Self {
        TeamGameTotals { totals }
    }
}

// ---------------------------------------------------------------------------
// Derived metrics
// ---------------------------------------------------------------------------

/// Ratios and totals computed from a stat line. Every ratio is 0.0 when its
/// denominator is 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// Hitting percentage: (kills - errors) / attempts. Can be negative.
    pub kill_pct: f64,
    /// Share of serves kept in play.
    pub serve_pct: f64,
    pub ace_rate: f64,
    /// Average pass quality, 0-3.
    pub pass_rating: f64,
    /// Average set quality, 0-3.
    pub set_rating: f64,
    /// Solo blocks plus half of block assists.
    pub blocks: f64,
    /// Errors of every kind over every recorded action.
    pub error_rate: f64,

    pub kills_per_set: f64,
    pub digs_per_set: f64,
    pub blocks_per_set: f64,
    pub aces_per_set: f64,

    pub kills: u32,
    pub aces: u32,
    pub digs: u32,
    pub attack_attempts: u32,
    pub serve_attempts: u32,
    pub pass_attempts: u32,
    pub set_attempts: u32,
    pub total_errors: u64,
    pub total_actions: u64,
    pub sets_played: u32,
}

impl DerivedMetrics {
    /// Whether the line records anything at all.
    pub fn has_activity(&self) -> bool {
        self.total_actions > 0
    }
}

fn ratio(numerator: f64, denominator: impl Into<u64>) -> f64 {
    let denominator = denominator.into();
    if denominator == 0 {
        return 0.0;
    }
    numerator / denominator as f64
}

/// Derive ratio metrics from raw counts. Never fails.
pub fn normalize(line: &StatLine) -> DerivedMetrics {
    let blocks = line.block_solos as f64 + 0.5 * line.block_assists as f64;
    let total_errors: u64 = [
        line.attack_errors,
        line.service_errors,
        line.ball_handling_errors,
        line.set_errors,
    ]
    .iter()
    .map(|&n| n as u64)
    .sum();
    let total_actions: u64 = [
        line.attack_attempts,
        line.serve_attempts,
        line.pass_attempts,
        line.set_attempts,
        line.digs,
        line.block_touches,
        line.block_solos,
        line.block_assists,
    ]
    .iter()
    .map(|&n| n as u64)
    .sum();
    let in_play = line.serve_attempts.saturating_sub(line.service_errors);

    DerivedMetrics {
        kill_pct: ratio(
            line.kills as f64 - line.attack_errors as f64,
            line.attack_attempts,
        ),
        serve_pct: ratio(in_play as f64, line.serve_attempts),
        ace_rate: ratio(line.aces as f64, line.serve_attempts),
        pass_rating: ratio(line.pass_sum as f64, line.pass_attempts),
        set_rating: ratio(line.set_sum as f64, line.set_attempts),
        blocks,
        error_rate: ratio(total_errors as f64, total_actions),
        kills_per_set: ratio(line.kills as f64, line.sets_played),
        digs_per_set: ratio(line.digs as f64, line.sets_played),
        blocks_per_set: ratio(blocks, line.sets_played),
        aces_per_set: ratio(line.aces as f64, line.sets_played),
        kills: line.kills,
        aces: line.aces,
        digs: line.digs,
        attack_attempts: line.attack_attempts,
        serve_attempts: line.serve_attempts,
        pass_attempts: line.pass_attempts,
        set_attempts: line.set_attempts,
        total_errors,
        total_actions,
        sets_played: line.sets_played,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn sample_line() -> StatLine {
        StatLine {
            kills: 10,
            attack_errors: 2,
            attack_attempts: 20,
            aces: 1,
            service_errors: 0,
            serve_attempts: 5,
            digs: 8,
            pass_attempts: 10,
            pass_sum: 24,
            ..Default::default()
        }
    }

    #[test]
    fn normalize_known_line() {
        let m = normalize(&sample_line());
        assert!(approx_eq(m.kill_pct, 0.40, 1e-12));
        assert!(approx_eq(m.serve_pct, 1.0, 1e-12));
        assert!(approx_eq(m.pass_rating, 2.4, 1e-12));
        assert!(approx_eq(m.ace_rate, 0.2, 1e-12));
        assert_eq!(m.kills, 10);
        assert_eq!(m.total_errors, 2);
        // 20 attacks + 5 serves + 10 passes + 8 digs
        assert_eq!(m.total_actions, 43);
    }

    #[test]
    fn zero_denominators_yield_zero() {
        let m = normalize(&StatLine::default());
        for value in [
            m.kill_pct,
            m.serve_pct,
            m.ace_rate,
            m.pass_rating,
            m.set_rating,
            m.blocks,
            m.error_rate,
            m.kills_per_set,
            m.digs_per_set,
            m.blocks_per_set,
            m.aces_per_set,
        ] {
            assert_eq!(value, 0.0);
            assert!(!value.is_nan());
        }
        assert!(!m.has_activity());
    }

    #[test]
    fn kill_pct_zero_without_attempts_even_with_kills_recorded() {
        // Out-of-contract line; the normalizer must still stay finite.
        let line = StatLine {
            kills: 3,
            ..Default::default()
        };
        assert_eq!(normalize(&line).kill_pct, 0.0);
    }

    #[test]
    fn kill_pct_can_be_negative() {
        let line = StatLine {
            kills: 1,
            attack_errors: 4,
            attack_attempts: 10,
            ..Default::default()
        };
        assert!(approx_eq(normalize(&line).kill_pct, -0.3, 1e-12));
    }

    #[test]
    fn blocks_count_assists_as_half() {
        let line = StatLine {
            block_solos: 2,
            block_assists: 3,
            sets_played: 2,
            ..Default::default()
        };
        let m = normalize(&line);
        assert!(approx_eq(m.blocks, 3.5, 1e-12));
        assert!(approx_eq(m.blocks_per_set, 1.75, 1e-12));
    }

    #[test]
    fn per_set_rates_use_sets_played() {
        let line = StatLine {
            kills: 9,
            digs: 12,
            aces: 3,
            attack_attempts: 20,
            serve_attempts: 10,
            sets_played: 3,
            ..Default::default()
        };
        let m = normalize(&line);
        assert!(approx_eq(m.kills_per_set, 3.0, 1e-12));
        assert!(approx_eq(m.digs_per_set, 4.0, 1e-12));
        assert!(approx_eq(m.aces_per_set, 1.0, 1e-12));
    }

    #[test]
    fn sum_adds_raw_counts() {
        let total = StatLine::total(&[sample_line(), sample_line(), sample_line()]);
        assert_eq!(total.kills, 30);
        assert_eq!(total.attack_attempts, 60);
        assert_eq!(total.pass_sum, 72);
        // Ratios of summed counts match the single line exactly
        assert_eq!(normalize(&total).kill_pct, normalize(&sample_line()).kill_pct);
    }

    #[test]
    fn aggregate_ratio_is_not_average_of_ratios() {
        // 1/1 and 0/9 averages to 0.5 per-game, but the pooled rate is 0.1.
        let a = StatLine {
            kills: 1,
            attack_attempts: 1,
            ..Default::default()
        };
        let b = StatLine {
            attack_attempts: 9,
            ..Default::default()
        };
        let pooled = normalize(&(a + b));
        assert!(approx_eq(pooled.kill_pct, 0.1, 1e-12));
    }

    #[test]
    fn normalize_handles_counts_near_u32_max() {
        let line = StatLine {
            attack_attempts: 3_000_000_000,
            serve_attempts: 2_000_000_000,
            ..Default::default()
        };
        assert!(line.validate().is_ok());
        let m = normalize(&line);
        assert_eq!(m.total_actions, 5_000_000_000);
        assert_eq!(m.error_rate, 0.0);
        assert_eq!(m.serve_pct, 1.0);
    }

    #[test]
    fn add_saturates_instead_of_overflowing() {
        let big = StatLine {
            digs: 3_000_000_000,
            ..Default::default()
        };
        let total = StatLine::total(&[big, big]);
        assert_eq!(total.digs, u32::MAX);
        assert!(total.validate().is_ok());
    }

    #[test]
    fn add_keeps_matching_rotation_only() {
        let a = StatLine {
            starting_rotation: Some(2),
            ..Default::default()
        };
        let b = StatLine {
            starting_rotation: Some(2),
            ..Default::default()
        };
        let c = StatLine {
            starting_rotation: Some(4),
            ..Default::default()
        };
        assert_eq!((a + b).starting_rotation, Some(2));
        assert_eq!((a + c).starting_rotation, None);
    }

    #[test]
    fn team_totals_take_max_sets_played() {
        let a = StatLine {
            kills: 5,
            sets_played: 3,
            ..Default::default()
        };
        let b = StatLine {
            kills: 7,
            sets_played: 2,
            ..Default::default()
        };
        let team = TeamGameTotals::from_player_lines(&[a, b]);
        assert_eq!(team.totals.kills, 12);
        assert_eq!(team.totals.sets_played, 3);
    }

    // ---- validation ----

    #[test]
    fn validate_accepts_well_formed_line() {
        assert!(sample_line().validate().is_ok());
        assert!(StatLine::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_errors_above_attempts() {
        let line = StatLine {
            attack_errors: 5,
            attack_attempts: 4,
            ..Default::default()
        };
        let err = line.validate().unwrap_err();
        assert!(matches!(
            err,
            StatLineError::ExceedsAttempts {
                field: "attack_errors",
                ..
            }
        ));
    }

    #[test]
    fn validate_rejects_kills_plus_errors_above_attempts() {
        let line = StatLine {
            kills: 3,
            attack_errors: 2,
            attack_attempts: 4,
            ..Default::default()
        };
        assert!(line.validate().is_err());
    }

    #[test]
    fn validate_rejects_aces_plus_errors_above_serves() {
        let line = StatLine {
            aces: 2,
            service_errors: 2,
            serve_attempts: 3,
            ..Default::default()
        };
        assert!(line.validate().is_err());
    }

    #[test]
    fn validate_rejects_pass_sum_above_max() {
        let line = StatLine {
            pass_attempts: 2,
            pass_sum: 7,
            ..Default::default()
        };
        let err = line.validate().unwrap_err();
        assert!(matches!(err, StatLineError::QualitySumOutOfRange { max: 6, .. }));
    }

    #[test]
    fn validate_rejects_set_sum_above_max() {
        let line = StatLine {
            set_attempts: 4,
            set_sum: 13,
            ..Default::default()
        };
        let err = line.validate().unwrap_err();
        assert!(matches!(
            err,
            StatLineError::QualitySumOutOfRange {
                field: "set_sum",
                max: 12,
                ..
            }
        ));

        let at_max = StatLine {
            set_attempts: 4,
            set_sum: 12,
            ..Default::default()
        };
        assert!(at_max.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_rotation() {
        for rotation in [0u8, 7] {
            let line = StatLine {
                starting_rotation: Some(rotation),
                ..Default::default()
            };
            assert_eq!(
                line.validate(),
                Err(StatLineError::StartingRotation(rotation))
            );
        }
    }

    #[test]
    fn error_message_names_fields() {
        let line = StatLine {
            set_errors: 2,
            set_attempts: 1,
            ..Default::default()
        };
        let msg = line.validate().unwrap_err().to_string();
        assert!(msg.contains("set_errors"));
        assert!(msg.contains("set_attempts"));
    }
}
