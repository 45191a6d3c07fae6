// Rating engine: 0-99 game ratings and multi-game aggregate ratings.

pub mod aggregate;
pub mod component;
pub mod game;

pub use aggregate::{
    rate_aggregate, rate_team_aggregate, OverallRating, PlayerLabels, SubRatingLabels,
    SubRatings, TeamLabels,
};
pub use game::rate_game;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::stats::StatLineError;

// ---------------------------------------------------------------------------
// Rating
// ---------------------------------------------------------------------------

/// A performance score on the 0-99 scale.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: Rating = Rating(0);
    pub const MAX: Rating = Rating(99);

    /// Clamp and round a raw score into a rating. NaN maps to 0.
    pub fn from_score(score: f64) -> Rating {
        if score.is_nan() {
            return Rating::MIN;
        }
        Rating(score.clamp(0.0, Rating::MAX.0 as f64).round() as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Rating> for u8 {
    fn from(r: Rating) -> u8 {
        r.0
    }
}

// ---------------------------------------------------------------------------
// Opponent tier
// ---------------------------------------------------------------------------

/// Opponent strength classification, 1 (weakest) to 9 (strongest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct OpponentTier(u8);

impl OpponentTier {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 9;
    /// Default opponent midpoint. A config may move it; see
    /// `OpponentAdjustment::neutral_tier`.
    pub const NEUTRAL: OpponentTier = OpponentTier(5);

    pub fn new(tier: u8) -> Result<Self, StatLineError> {
        if !(Self::MIN..=Self::MAX).contains(&tier) {
            return Err(StatLineError::OpponentTier(tier));
        }
        Ok(OpponentTier(tier))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for OpponentTier {
    type Error = StatLineError;

    fn try_from(tier: u8) -> Result<Self, Self::Error> {
        OpponentTier::new(tier)
    }
}

impl From<OpponentTier> for u8 {
    fn from(t: OpponentTier) -> u8 {
        t.0
    }
}
