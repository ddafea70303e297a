use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::match_model::{Match, MatchStatus};

/// Summary row shown in a tournament bracket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BracketMatch {
    pub id: Uuid,
    pub tournament_id: Option<Uuid>,
    pub round: u32,
    pub participant1: Option<String>,
    pub participant2: Option<String>,
    pub score1: Option<i32>,
    pub score2: Option<i32>,
    pub status: MatchStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub winner_id: Option<Uuid>,
}

impl From<&Match> for BracketMatch {
    fn from(record: &Match) -> Self {
        let side = |index: usize| record.teams.get(index);
        let score = |index: usize| {
            side(index)
                .and_then(|team| record.score_of(team.id))
                .map(|s| s.points)
        };

        Self {
            id: record.id,
            tournament_id: record.tournament_id,
            round: record.round,
            participant1: side(0).map(|team| team.name.clone()),
            participant2: side(1).map(|team| team.name.clone()),
            score1: score(0),
            score2: score(1),
            status: record.status,
            start_time: record.start_time,
            winner_id: record.winner_id,
        }
    }
}
