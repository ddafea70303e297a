use serde::{Deserialize, Serialize};

use super::match_model::MatchEventKind;
use super::timer::TimerSnapshot;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScoringType {
    Points,
    Goals,
    Sets,
    Rounds,
}

impl std::fmt::Display for ScoringType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoringType::Points => write!(f, "points"),
            ScoringType::Goals => write!(f, "goals"),
            ScoringType::Sets => write!(f, "sets"),
            ScoringType::Rounds => write!(f, "rounds"),
        }
    }
}

/// Sport-specific rules for a match: period layout and per-team event limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchConfiguration {
    pub sport: String,
    pub scoring_type: ScoringType,
    pub period_count: u32,
    /// Seconds per period.
    pub period_duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overtime_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_substitutions: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_timeouts: Option<u32>,
}

impl Default for MatchConfiguration {
    /// Water polo: four 8-minute periods and a 5-minute overtime.
    fn default() -> Self {
        Self {
            sport: "water-polo".to_string(),
            scoring_type: ScoringType::Goals,
            period_count: 4,
            period_duration: 480,
            overtime_duration: Some(300),
            max_substitutions: Some(6),
            max_timeouts: Some(2),
        }
    }
}

impl MatchConfiguration {
    pub fn regulation_seconds(&self) -> u32 {
        self.period_count.saturating_mul(self.period_duration)
    }

    /// Initial (stopped) timer for a match played under these rules.
    pub fn timer_snapshot(&self) -> TimerSnapshot {
        TimerSnapshot::new(self.regulation_seconds(), self.overtime_duration)
    }

    /// Per-team cap for an event kind, if the rules set one.
    pub fn limit_for(&self, kind: MatchEventKind) -> Option<u32> {
        match kind {
            MatchEventKind::Substitution => self.max_substitutions,
            MatchEventKind::Timeout => self.max_timeouts,
            MatchEventKind::Goal | MatchEventKind::Penalty => None,
        }
    }
}
