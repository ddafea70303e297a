use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::timer::TimerSnapshot;

/// Match lifecycle status
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStatus {
    #[default]
    Scheduled,
    #[serde(alias = "inProgress", alias = "in_progress")]
    InProgress,
    Paused,
    Completed,
    Cancelled,
}

impl MatchStatus {
    /// Check if transition to another status is valid
    pub fn can_transition_to(&self, to: &MatchStatus) -> bool {
        match (self, to) {
            // Nothing leaves a terminal status
            (from, _) if from.is_terminal() => false,
            // Same status is allowed (idempotency)
            (a, b) if a == b => true,
            (MatchStatus::Scheduled, MatchStatus::InProgress) => true,
            (MatchStatus::InProgress, MatchStatus::Paused) => true,
            (MatchStatus::Paused, MatchStatus::InProgress) => true,
            // Completion and cancellation are reachable from any live status
            (_, MatchStatus::Completed) => true,
            (_, MatchStatus::Cancelled) => true,
            _ => false,
        }
    }

    /// Get all valid next statuses from the current one
    pub fn valid_next_states(&self) -> Vec<MatchStatus> {
        match self {
            MatchStatus::Scheduled => vec![
                MatchStatus::InProgress,
                MatchStatus::Completed,
                MatchStatus::Cancelled,
            ],
            MatchStatus::InProgress => vec![
                MatchStatus::Paused,
                MatchStatus::Completed,
                MatchStatus::Cancelled,
            ],
            MatchStatus::Paused => vec![
                MatchStatus::InProgress,
                MatchStatus::Completed,
                MatchStatus::Cancelled,
            ],
            MatchStatus::Completed | MatchStatus::Cancelled => vec![],
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchStatus::Completed | MatchStatus::Cancelled)
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Scheduled => write!(f, "scheduled"),
            MatchStatus::InProgress => write!(f, "in-progress"),
            MatchStatus::Paused => write!(f, "paused"),
            MatchStatus::Completed => write!(f, "completed"),
            MatchStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct Team {
    pub id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub players: Vec<String>,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            players: Vec::new(),
        }
    }
}

/// Accumulated points for one team.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchScore {
    pub team_id: Uuid,
    pub points: i32,
    /// Every delta recorded for the team, in call order.
    #[serde(default)]
    pub period_scores: Vec<i32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MatchEventKind {
    Goal,
    Penalty,
    Substitution,
    Timeout,
}

impl std::fmt::Display for MatchEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchEventKind::Goal => write!(f, "goal"),
            MatchEventKind::Penalty => write!(f, "penalty"),
            MatchEventKind::Substitution => write!(f, "substitution"),
            MatchEventKind::Timeout => write!(f, "timeout"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchEvent {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: MatchEventKind,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<String>,
    #[serde(default)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl MatchEvent {
    pub fn new(kind: MatchEventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            timestamp: Utc::now(),
            team: None,
            player: None,
            details: serde_json::Map::new(),
        }
    }

    pub fn for_team(mut self, team_id: Uuid) -> Self {
        self.team = Some(team_id);
        self
    }

    pub fn by_player(mut self, player: impl Into<String>) -> Self {
        self.player = Some(player.into());
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Row stored in the events collection: the event plus its owning match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchEventRecord {
    pub match_id: Uuid,
    #[serde(flatten)]
    pub event: MatchEvent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tournament_id: Option<Uuid>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sport: Option<String>,
    pub status: MatchStatus,
    pub teams: Vec<Team>,
    #[serde(default)]
    pub scores: Vec<MatchScore>,
    pub timer: TimerSnapshot,
    /// Loaded from the events collection, never written with the match row.
    #[serde(default, skip_serializing)]
    pub events: Vec<MatchEvent>,
    pub round: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
}

impl Match {
    pub fn team(&self, team_id: Uuid) -> Option<&Team> {
        self.teams.iter().find(|team| team.id == team_id)
    }

    pub fn score_of(&self, team_id: Uuid) -> Option<&MatchScore> {
        self.scores.iter().find(|score| score.team_id == team_id)
    }

    /// Points for a team, counting a team without a score entry as zero.
    pub fn points_of(&self, team_id: Uuid) -> i32 {
        self.score_of(team_id).map(|s| s.points).unwrap_or(0)
    }

    pub fn winner(&self) -> Option<&Team> {
        self.winner_id.and_then(|id| self.team(id))
    }
}

/// Create payload for a match.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewMatch {
    pub tournament_id: Option<Uuid>,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub sport: Option<String>,
    #[validate(length(min = 2), nested, custom(function = "validate_unique_teams"))]
    pub teams: Vec<Team>,
    #[validate(range(min = 1))]
    pub round: u32,
    pub timer: TimerSnapshot,
    pub start_time: Option<DateTime<Utc>>,
    pub venue: Option<String>,
}

impl NewMatch {
    pub fn new(name: impl Into<String>, teams: Vec<Team>, timer: TimerSnapshot) -> Self {
        Self {
            tournament_id: None,
            name: name.into(),
            sport: None,
            teams,
            round: 1,
            timer,
            start_time: None,
            venue: None,
        }
    }

    pub fn in_tournament(mut self, tournament_id: Uuid, round: u32) -> Self {
        self.tournament_id = Some(tournament_id);
        self.round = round;
        self
    }

    /// Full record for a freshly scheduled match.
    pub fn into_match(self) -> Match {
        Match {
            id: Uuid::new_v4(),
            tournament_id: self.tournament_id,
            name: self.name,
            sport: self.sport,
            status: MatchStatus::Scheduled,
            teams: self.teams,
            scores: Vec::new(),
            timer: self.timer,
            events: Vec::new(),
            round: self.round,
            start_time: self.start_time,
            end_time: None,
            winner_id: None,
            venue: self.venue,
        }
    }
}

fn validate_unique_teams(teams: &[Team]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(teams.len());
    if teams.iter().all(|team| seen.insert(team.id)) {
        Ok(())
    } else {
        Err(ValidationError::new("duplicate_team"))
    }
}

/// Fields of a stored match that may be updated after creation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MatchStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<Vec<MatchScore>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer: Option<TimerSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// `Some(None)` writes an explicit null (a drawn match).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_id: Option<Option<Uuid>>,
}

impl MatchPatch {
    pub fn status(status: MatchStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn scores(scores: Vec<MatchScore>) -> Self {
        Self {
            scores: Some(scores),
            ..Default::default()
        }
    }

    pub fn timer(timer: TimerSnapshot) -> Self {
        Self {
            timer: Some(timer),
            ..Default::default()
        }
    }

    pub fn completion(end_time: DateTime<Utc>, winner_id: Option<Uuid>) -> Self {
        Self {
            status: Some(MatchStatus::Completed),
            end_time: Some(end_time),
            winner_id: Some(winner_id),
            ..Default::default()
        }
    }
}
