// Player positions used to pick a rating weight vector.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown position `{0}`")]
pub struct ParsePositionError(pub String);

/// Primary volleyball positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Setter,
    OutsideHitter,
    MiddleBlocker,
    Opposite,
    Libero,
    DefensiveSpecialist,
    AllAround,
}

impl Position {
    pub const ALL: [Position; 7] = [
        Position::Setter,
        Position::OutsideHitter,
        Position::MiddleBlocker,
        Position::Opposite,
        Position::Libero,
        Position::DefensiveSpecialist,
        Position::AllAround,
    ];

    /// Short label as printed on a lineup card.
    pub fn label(&self) -> &'static str {
        match self {
            Position::Setter => "S",
            Position::OutsideHitter => "OH",
            Position::MiddleBlocker => "MB",
            Position::Opposite => "OPP",
            Position::Libero => "L",
            Position::DefensiveSpecialist => "DS",
            Position::AllAround => "AA",
        }
    }
}

impl FromStr for Position {
    type Err = ParsePositionError;

    /// Accepts lineup abbreviations ("OH", "RS", "L") and full names in
    /// any case, with spaces, dashes or underscores.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "s" | "setter" => Ok(Position::Setter),
            "oh" | "outside" | "outsidehitter" => Ok(Position::OutsideHitter),
            "mb" | "middle" | "middleblocker" => Ok(Position::MiddleBlocker),
            "opp" | "rs" | "opposite" | "rightside" => Ok(Position::Opposite),
            "l" | "libero" => Ok(Position::Libero),
            "ds" | "defensivespecialist" => Ok(Position::DefensiveSpecialist),
            "aa" | "allaround" | "utility" => Ok(Position::AllAround),
            _ => Err(ParsePositionError(s.to_string())),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Position::Setter => "setter",
            Position::OutsideHitter => "outside hitter",
            Position::MiddleBlocker => "middle blocker",
            Position::Opposite => "opposite",
            Position::Libero => "libero",
            Position::DefensiveSpecialist => "defensive specialist",
            Position::AllAround => "all-around",
        };
        f.write_str(name)
    }
}
