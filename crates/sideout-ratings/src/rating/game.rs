// Single-game rating: one stat line, a position and an opponent tier.

use tracing::{debug, trace};

use crate::config::RatingConfig;
use crate::position::Position;
use crate::rating::component::base_score;
use crate::rating::{OpponentTier, Rating};
use crate::stats::{normalize, StatLine, StatLineError};

/// Rate one game on the 0-99 scale.
///
/// The position's weight vector blends the component scores. The result is
/// then scaled by the opponent adjustment, so identical raw output rates
/// higher against a stronger opponent. A line with no recorded actions rates 0.
pub fn rate_game(
    line: &StatLine,
    position: Position,
    opponent: OpponentTier,
    config: &RatingConfig,
) -> Result<Rating, StatLineError> {
    line.validate()?;

    let metrics = normalize(line);
    let weights = config.weights.for_position(position);
    let base = base_score(&metrics, weights, &config.scales);
    let multiplier = config.opponent.multiplier(opponent.get());
    trace!(
        "{} base score {:.2}, opponent tier {} multiplier {:.3}",
        position,
        base,
        opponent.get(),
        multiplier
    );

    let rating = Rating::from_score(base * multiplier);
    debug!("Game rating for {}: {}", position, rating);
    Ok(rating)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(t: u8) -> OpponentTier {
        OpponentTier::new(t).unwrap()
    }

    fn hitter_line() -> StatLine {
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
            sets_played: 3,
            ..Default::default()
        }
    }

    fn setter_line() -> StatLine {
        StatLine {
            set_attempts: 40,
            set_sum: 108,
            set_errors: 1,
            serve_attempts: 12,
            service_errors: 1,
            aces: 1,
            digs: 6,
            sets_played: 3,
            ..Default::default()
        }
    }

    fn libero_line() -> StatLine {
        StatLine {
            pass_attempts: 25,
            pass_sum: 65,
            digs: 15,
            ball_handling_errors: 1,
            sets_played: 3,
            ..Default::default()
        }
    }

    fn perfect_line() -> StatLine {
        StatLine {
            kills: 12,
            attack_attempts: 12,
            aces: 5,
            serve_attempts: 5,
            block_solos: 6,
            digs: 20,
            pass_attempts: 10,
            pass_sum: 30,
            set_attempts: 10,
            set_sum: 30,
            sets_played: 3,
            ..Default::default()
        }
    }

    #[test]
    fn rating_always_within_bounds() {
        let config = RatingConfig::default();
        let lines = [
            StatLine::default(),
            hitter_line(),
            setter_line(),
            libero_line(),
            perfect_line(),
            StatLine {
                attack_errors: 10,
                attack_attempts: 10,
                service_errors: 5,
                serve_attempts: 5,
                ..Default::default()
            },
        ];
        for line in &lines {
            for pos in Position::ALL {
                for t in OpponentTier::MIN..=OpponentTier::MAX {
                    let r = rate_game(line, pos, tier(t), &config).unwrap();
                    assert!(r <= Rating::MAX, "{pos} tier {t} gave {r}");
                }
            }
        }
    }

    #[test]
    fn zero_activity_rates_zero() {
        let config = RatingConfig::default();
        for pos in Position::ALL {
            let r = rate_game(&StatLine::default(), pos, OpponentTier::NEUTRAL, &config).unwrap();
            assert_eq!(r, Rating::MIN);
        }
    }

    #[test]
    fn perfect_line_tops_out() {
        let config = RatingConfig::default();
        let r = rate_game(&perfect_line(), Position::AllAround, OpponentTier::NEUTRAL, &config)
            .unwrap();
        assert_eq!(r, Rating::MAX);
        // Stronger opponent cannot push past the cap
        let r = rate_game(&perfect_line(), Position::AllAround, tier(9), &config).unwrap();
        assert_eq!(r, Rating::MAX);
        // 99 * (1 - 4 * 0.03) = 87.12
        let r = rate_game(&perfect_line(), Position::AllAround, tier(1), &config).unwrap();
        assert_eq!(r.value(), 87);
    }

    #[test]
    fn stronger_opponent_rates_higher() {
        let config = RatingConfig::default();
        let line = hitter_line();
        let weak = rate_game(&line, Position::OutsideHitter, tier(2), &config).unwrap();
        let even = rate_game(&line, Position::OutsideHitter, tier(5), &config).unwrap();
        let strong = rate_game(&line, Position::OutsideHitter, tier(8), &config).unwrap();
        assert!(weak < even, "weak {weak} vs even {even}");
        assert!(even < strong, "even {even} vs strong {strong}");
    }

    #[test]
    fn setter_line_rates_higher_as_setter() {
        let config = RatingConfig::default();
        let as_setter = rate_game(&setter_line(), Position::Setter, OpponentTier::NEUTRAL, &config)
            .unwrap();
        let as_middle =
            rate_game(&setter_line(), Position::MiddleBlocker, OpponentTier::NEUTRAL, &config)
                .unwrap();
        assert!(as_setter > as_middle);
    }

    #[test]
    fn libero_line_rates_higher_as_libero() {
        let config = RatingConfig::default();
        let as_libero =
            rate_game(&libero_line(), Position::Libero, OpponentTier::NEUTRAL, &config).unwrap();
        let as_opposite =
            rate_game(&libero_line(), Position::Opposite, OpponentTier::NEUTRAL, &config).unwrap();
        assert!(as_libero > as_opposite);
    }

    #[test]
    fn efficient_hitter_beats_inefficient_hitter() {
        let config = RatingConfig::default();
        let mut sloppy = hitter_line();
        sloppy.kills = 4;
        sloppy.attack_errors = 8;
        let neutral = OpponentTier::NEUTRAL;
        let good = rate_game(&hitter_line(), Position::OutsideHitter, neutral, &config).unwrap();
        let bad = rate_game(&sloppy, Position::OutsideHitter, neutral, &config).unwrap();
        assert!(good > bad);
    }

    #[test]
    fn malformed_line_is_rejected() {
        let config = RatingConfig::default();
        let line = StatLine {
            attack_errors: 6,
            attack_attempts: 5,
            ..Default::default()
        };
        let result = rate_game(&line, Position::Opposite, OpponentTier::NEUTRAL, &config);
        assert!(matches!(result, Err(StatLineError::ExceedsAttempts { .. })));
    }

    #[test]
    fn huge_valid_counts_rate_without_overflow() {
        let config = RatingConfig::default();
        let line = StatLine {
            attack_attempts: 3_000_000_000,
            serve_attempts: 2_000_000_000,
            ..Default::default()
        };
        for pos in Position::ALL {
            let rating = rate_game(&line, pos, OpponentTier::NEUTRAL, &config).unwrap();
            assert!(rating <= Rating::MAX);
        }
    }

    #[test]
    fn zero_tier_step_ignores_opponent() {
        let mut config = RatingConfig::default();
        config.opponent.tier_step = 0.0;
        let line = hitter_line();
        let weak = rate_game(&line, Position::OutsideHitter, tier(1), &config).unwrap();
        let strong = rate_game(&line, Position::OutsideHitter, tier(9), &config).unwrap();
        assert_eq!(weak, strong);
    }
}
