// Rating configuration: position weight vectors, component scales, opponent
// adjustment, trend defaults and takeaway thresholds.
//
// The built-in `Default` mirrors `defaults/ratings.toml`. A config file only
// needs the sections it overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::position::Position;
use crate::rating::OpponentTier;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// Aggregates with fewer games than this are flagged provisional.
    pub provisional_threshold: usize,
    pub opponent: OpponentAdjustment,
    pub scales: ComponentScales,
    pub weights: PositionWeights,
    pub trends: TrendConfig,
    pub takeaways: TakeawayConfig,
}

impl Default for RatingConfig {
    fn default() -> Self {
        RatingConfig {
            provisional_threshold: 3,
            opponent: OpponentAdjustment::default(),
            scales: ComponentScales::default(),
            weights: PositionWeights::default(),
            trends: TrendConfig::default(),
            takeaways: TakeawayConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Opponent adjustment
// ---------------------------------------------------------------------------

/// Multiplicative opponent-strength adjustment:
/// `rating * (1 + (tier - midpoint) * tier_step)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpponentAdjustment {
    pub midpoint: u8,
    pub tier_step: f64,
}

impl Default for OpponentAdjustment {
    fn default() -> Self {
        OpponentAdjustment {
            midpoint: OpponentTier::NEUTRAL.get(),
            tier_step: 0.03,
        }
    }
}

impl OpponentAdjustment {
    /// Multiplier for a given opponent tier. Exactly 1.0 at the midpoint.
    pub fn multiplier(&self, tier: u8) -> f64 {
        1.0 + (tier as f64 - self.midpoint as f64) * self.tier_step
    }

    /// The tier whose multiplier is exactly 1.0. A midpoint outside 1-9 only
    /// exists in an unvalidated config and falls back to the default.
    pub fn neutral_tier(&self) -> OpponentTier {
        OpponentTier::new(self.midpoint).unwrap_or(OpponentTier::NEUTRAL)
    }
}

// ---------------------------------------------------------------------------
// Component scales
// ---------------------------------------------------------------------------

/// Linear map of a raw metric onto [0, 1]: values at or below `floor` score
/// 0, values at or above `ceiling` score 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub floor: f64,
    pub ceiling: f64,
}

impl Scale {
    pub const fn new(floor: f64, ceiling: f64) -> Self {
        Scale { floor, ceiling }
    }

    pub fn score(&self, value: f64) -> f64 {
        let span = self.ceiling - self.floor;
        if !value.is_finite() || span <= 0.0 {
            return 0.0;
        }
        ((value - self.floor) / span).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentScales {
    /// Hitting percentage.
    pub attack: Scale,
    /// Blocks per set.
    pub block: Scale,
    /// Serve-in percentage.
    pub serve: Scale,
    /// Aces per serve.
    pub ace: Scale,
    /// Average pass quality.
    pub pass: Scale,
    /// Digs per set.
    pub dig: Scale,
    /// Average set quality.
    pub set: Scale,
    /// Error rate at which the consistency component bottoms out.
    pub max_error_rate: f64,
}

impl Default for ComponentScales {
    fn default() -> Self {
        ComponentScales {
            attack: Scale::new(0.0, 0.45),
            block: Scale::new(0.0, 1.5),
            serve: Scale::new(0.7, 1.0),
            ace: Scale::new(0.0, 0.2),
            pass: Scale::new(1.0, 2.7),
            dig: Scale::new(0.0, 5.0),
            set: Scale::new(1.0, 2.7),
            max_error_rate: 0.3,
        }
    }
}

// ---------------------------------------------------------------------------
// Weight vectors
// ---------------------------------------------------------------------------

/// Relative importance of each rating component. Only ratios between fields
/// matter; the vector is normalized by its sum.
///
/// Every field is required when a vector appears in a config file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    pub attack: f64,
    pub block: f64,
    pub serve: f64,
    pub ace: f64,
    pub pass: f64,
    pub dig: f64,
    pub set: f64,
    pub consistency: f64,
}

impl WeightVector {
    pub fn sum(&self) -> f64 {
        self.fields().iter().map(|(_, w)| w).sum()
    }

    /// Named fields, for validation and display.
    pub fn fields(&self) -> [(&'static str, f64); 8] {
        [
            ("attack", self.attack),
            ("block", self.block),
            ("serve", self.serve),
            ("ace", self.ace),
            ("pass", self.pass),
            ("dig", self.dig),
            ("set", self.set),
            ("consistency", self.consistency),
        ]
    }
}

/// One weight vector per position, plus one for team-level ratings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionWeights {
    pub setter: WeightVector,
    pub outside_hitter: WeightVector,
    pub middle_blocker: WeightVector,
    pub opposite: WeightVector,
    pub libero: WeightVector,
    pub defensive_specialist: WeightVector,
    pub all_around: WeightVector,
    pub team: WeightVector,
}

impl PositionWeights {
    pub fn for_position(&self, position: Position) -> &WeightVector {
        match position {
            Position::Setter => &self.setter,
            Position::OutsideHitter => &self.outside_hitter,
            Position::MiddleBlocker => &self.middle_blocker,
            Position::Opposite => &self.opposite,
            Position::Libero => &self.libero,
            Position::DefensiveSpecialist => &self.defensive_specialist,
            Position::AllAround => &self.all_around,
        }
    }

    fn named(&self) -> [(&'static str, &WeightVector); 8] {
        [
            ("setter", &self.setter),
            ("outside_hitter", &self.outside_hitter),
            ("middle_blocker", &self.middle_blocker),
            ("opposite", &self.opposite),
            ("libero", &self.libero),
            ("defensive_specialist", &self.defensive_specialist),
            ("all_around", &self.all_around),
            ("team", &self.team),
        ]
    }
}

impl Default for PositionWeights {
    fn default() -> Self {
        PositionWeights {
            setter: WeightVector {
                attack: 0.5,
                block: 0.5,
                serve: 1.0,
                ace: 0.5,
                pass: 0.5,
                dig: 1.0,
                set: 3.0,
                consistency: 1.0,
            },
            outside_hitter: WeightVector {
                attack: 3.0,
                block: 1.0,
                serve: 1.0,
                ace: 0.5,
                pass: 2.0,
                dig: 1.0,
                set: 0.0,
                consistency: 1.0,
            },
            middle_blocker: WeightVector {
                attack: 3.0,
                block: 3.0,
                serve: 1.0,
                ace: 0.5,
                pass: 0.0,
                dig: 0.5,
                set: 0.0,
                consistency: 1.0,
            },
            opposite: WeightVector {
                attack: 3.0,
                block: 2.0,
                serve: 1.0,
                ace: 0.5,
                pass: 0.5,
                dig: 1.0,
                set: 0.5,
                consistency: 1.0,
            },
            libero: WeightVector {
                attack: 0.0,
                block: 0.0,
                serve: 1.0,
                ace: 0.5,
                pass: 3.0,
                dig: 3.0,
                set: 0.5,
                consistency: 1.0,
            },
            defensive_specialist: WeightVector {
                attack: 0.0,
                block: 0.0,
                serve: 1.5,
                ace: 1.0,
                pass: 2.5,
                dig: 2.5,
                set: 0.5,
                consistency: 1.0,
            },
            all_around: WeightVector {
                attack: 1.5,
                block: 1.0,
                serve: 1.0,
                ace: 0.5,
                pass: 1.5,
                dig: 1.5,
                set: 1.0,
                consistency: 1.0,
            },
            team: WeightVector {
                attack: 3.0,
                block: 1.0,
                serve: 1.5,
                ace: 1.0,
                pass: 2.0,
                dig: 1.0,
                set: 0.5,
                consistency: 1.0,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Trends
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Number of games in the recent (and previous) window.
    pub window: usize,
    /// Relative change at or below which a metric is stable.
    pub threshold: f64,
    pub baselines: TrendBaselines,
}

impl Default for TrendConfig {
    fn default() -> Self {
        TrendConfig {
            window: 5,
            threshold: 0.05,
            baselines: TrendBaselines::default(),
        }
    }
}

/// Reference averages used when there is no previous window to compare to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendBaselines {
    pub kill_pct: f64,
    pub serve_pct: f64,
    pub pass_rating: f64,
    pub error_rate: f64,
    pub overall: f64,
}

impl Default for TrendBaselines {
    fn default() -> Self {
        TrendBaselines {
            kill_pct: 0.25,
            serve_pct: 0.9,
            pass_rating: 2.0,
            error_rate: 0.15,
            overall: 50.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Takeaways
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TakeawayConfig {
    pub strong_kill_pct: f64,
    pub weak_kill_pct: f64,
    pub strong_serve_pct: f64,
    pub weak_serve_pct: f64,
    pub ace_pressure: u32,
    pub strong_pass_rating: f64,
    pub weak_pass_rating: f64,
    pub dominant_blocks: f64,
    pub floor_defense_digs: u32,
    pub max_error_rate: f64,
}

impl Default for TakeawayConfig {
    fn default() -> Self {
        TakeawayConfig {
            strong_kill_pct: 0.3,
            weak_kill_pct: 0.15,
            strong_serve_pct: 0.9,
            weak_serve_pct: 0.85,
            ace_pressure: 6,
            strong_pass_rating: 2.2,
            weak_pass_rating: 1.8,
            dominant_blocks: 8.0,
            floor_defense_digs: 40,
            max_error_rate: 0.2,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate a rating config from a TOML file.
pub fn load_config_from(path: &Path) -> Result<RatingConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    let config = parse_with_path(&text, path)?;
    debug!("Loaded rating config from {}", path.display());
    Ok(config)
}

/// Parse and validate a rating config from TOML text.
pub fn parse_config(text: &str) -> Result<RatingConfig, ConfigError> {
    parse_with_path(text, Path::new("<inline>"))
}

fn parse_with_path(text: &str, path: &Path) -> Result<RatingConfig, ConfigError> {
    let config: RatingConfig = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    if let Err(e) = validate(&config) {
        warn!("Rejected rating config {}: {}", path.display(), e);
        return Err(e);
    }
    Ok(config)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

pub fn validate(config: &RatingConfig) -> Result<(), ConfigError> {
    if config.provisional_threshold == 0 {
        return Err(invalid("provisional_threshold", "must be at least 1"));
    }

    let opp = &config.opponent;
    if !(1..=9).contains(&opp.midpoint) {
        return Err(invalid(
            "opponent.midpoint",
            format!("must be between 1 and 9, got {}", opp.midpoint),
        ));
    }
    if !opp.tier_step.is_finite() || opp.tier_step < 0.0 {
        return Err(invalid(
            "opponent.tier_step",
            format!("must be >= 0, got {}", opp.tier_step),
        ));
    }

    let s = &config.scales;
    let scales: &[(&str, Scale)] = &[
        ("scales.attack", s.attack),
        ("scales.block", s.block),
        ("scales.serve", s.serve),
        ("scales.ace", s.ace),
        ("scales.pass", s.pass),
        ("scales.dig", s.dig),
        ("scales.set", s.set),
    ];
    for (name, scale) in scales {
        if !(scale.ceiling > scale.floor) {
            return Err(invalid(
                *name,
                format!(
                    "ceiling ({}) must be greater than floor ({})",
                    scale.ceiling, scale.floor
                ),
            ));
        }
    }
    if !(s.max_error_rate > 0.0) {
        return Err(invalid(
            "scales.max_error_rate",
            format!("must be > 0, got {}", s.max_error_rate),
        ));
    }

    for (vector_name, vector) in config.weights.named() {
        for (field, weight) in vector.fields() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(invalid(
                    format!("weights.{vector_name}.{field}"),
                    format!("must be >= 0, got {weight}"),
                ));
            }
        }
        if vector.sum() <= 0.0 {
            return Err(invalid(
                format!("weights.{vector_name}"),
                "at least one weight must be > 0",
            ));
        }
    }

    let t = &config.trends;
    if t.window == 0 {
        return Err(invalid("trends.window", "must be at least 1"));
    }
    if !t.threshold.is_finite() || t.threshold < 0.0 {
        return Err(invalid(
            "trends.threshold",
            format!("must be >= 0, got {}", t.threshold),
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
