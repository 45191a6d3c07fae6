// Rule-based match takeaways from team totals.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TakeawayConfig;
use crate::stats::DerivedMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TakeawayCategory {
    Positive,
    Improvement,
    Milestone,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Takeaway {
    pub text: String,
    pub category: TakeawayCategory,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub sets_won: u32,
    pub sets_lost: u32,
}

impl MatchOutcome {
    pub fn won(&self) -> bool {
        self.sets_won > self.sets_lost
    }
}

struct Rule {
    category: TakeawayCategory,
    text: &'static str,
    fires: fn(&DerivedMetrics, &MatchOutcome, &TakeawayConfig) -> bool,
}

/// Evaluated in order; the order only affects presentation.
const RULES: &[Rule] = &[
    Rule {
        category: TakeawayCategory::Positive,
        text: "Strong attack efficiency",
        fires: |m, _, c| m.kill_pct >= c.strong_kill_pct,
    },
    Rule {
        category: TakeawayCategory::Positive,
        text: "Excellent serving consistency",
        fires: |m, _, c| m.serve_pct >= c.strong_serve_pct,
    },
    Rule {
        category: TakeawayCategory::Positive,
        text: "Great serving pressure",
        fires: |m, _, c| m.aces >= c.ace_pressure,
    },
    Rule {
        category: TakeawayCategory::Positive,
        text: "Solid serve receive",
        fires: |m, _, c| m.pass_rating >= c.strong_pass_rating,
    },
    Rule {
        category: TakeawayCategory::Positive,
        text: "Dominant at the net",
        fires: |m, _, c| m.blocks >= c.dominant_blocks,
    },
    Rule {
        category: TakeawayCategory::Positive,
        text: "Relentless floor defense",
        fires: |m, _, c| m.digs >= c.floor_defense_digs,
    },
    Rule {
        category: TakeawayCategory::Improvement,
        text: "Attack efficiency needs work",
        fires: |m, _, c| m.attack_attempts > 0 && m.kill_pct < c.weak_kill_pct,
    },
    Rule {
        category: TakeawayCategory::Improvement,
        text: "Cut down on service errors",
        fires: |m, _, c| m.serve_attempts > 0 && m.serve_pct < c.weak_serve_pct,
    },
    Rule {
        category: TakeawayCategory::Improvement,
        text: "Serve receive needs attention",
        fires: |m, _, c| m.pass_attempts > 0 && m.pass_rating < c.weak_pass_rating,
    },
    Rule {
        category: TakeawayCategory::Improvement,
        text: "Too many unforced errors",
        fires: |m, _, c| m.error_rate > c.max_error_rate,
    },
    Rule {
        category: TakeawayCategory::Milestone,
        text: "Secured the win",
        fires: |_, o, _| o.won(),
    },
    Rule {
        category: TakeawayCategory::Milestone,
        text: "Clean sweep",
        fires: |_, o, _| o.won() && o.sets_lost == 0,
    },
    Rule {
        category: TakeawayCategory::Milestone,
        text: "Battled through five sets",
        fires: |_, o, _| o.sets_won + o.sets_lost >= 5,
    },
];

/// Produce takeaways for one match from the team's aggregate metrics.
pub fn categorize_takeaways(
    team: &DerivedMetrics,
    outcome: MatchOutcome,
    config: &TakeawayConfig,
) -> Vec<Takeaway> {
    let takeaways: Vec<Takeaway> = RULES
        .iter()
        .filter(|rule| (rule.fires)(team, &outcome, config))
        .map(|rule| Takeaway {
            text: rule.text.to_string(),
            category: rule.category,
        })
        .collect();
    debug!(
        "{} takeaways for {}-{} match",
        takeaways.len(),
        outcome.sets_won,
        outcome.sets_lost
    );
    takeaways
}
