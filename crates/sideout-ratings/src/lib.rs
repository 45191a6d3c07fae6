// Performance rating and awards engine: turns raw per-game volleyball stat
// lines into 0-99 ratings, trends, awards and match takeaways.
//
// Everything here is a pure function of its inputs. Persistence, rosters and
// rendering belong to the calling application.

pub mod awards;
pub mod config;
pub mod position;
pub mod rating;
pub mod stats;
pub mod takeaways;
pub mod trend;

pub use awards::{
    compute_match_awards, compute_season_awards, rank_category, Award, AwardType,
    MatchAggregate, ParticipantLine,
};
pub use config::{load_config_from, parse_config, ConfigError, RatingConfig};
pub use position::Position;
pub use rating::{
    rate_aggregate, rate_game, rate_team_aggregate, OpponentTier, OverallRating, Rating,
};
pub use stats::{normalize, DerivedMetrics, StatLine, StatLineError, TeamGameTotals};
pub use takeaways::{categorize_takeaways, MatchOutcome, Takeaway, TakeawayCategory};
pub use trend::{
    compute_trends, compute_trends_default, GameMetrics, Trend, TrendDirection, TrendMetric,
};
