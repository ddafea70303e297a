//! Groups a tournament's matches into labelled bracket rounds.

use serde::{Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{BracketError, MatchError};
use crate::models::{BracketMatch, Match};
use crate::store::{Collection, RecordStore};

/// Deepest bracket accepted. A knockout of 2^64 entrants cannot exist, so a
/// larger round number is a corrupt record.
pub const MAX_ROUNDS: u32 = 64;

/// Anything that sits in a bracket round.
pub trait Bracketed {
    fn bracket_id(&self) -> Uuid;
    /// 1-based bracket stage.
    fn round(&self) -> u32;
}

impl Bracketed for Match {
    fn bracket_id(&self) -> Uuid {
        self.id
    }

    fn round(&self) -> u32 {
        self.round
    }
}

impl Bracketed for BracketMatch {
    fn bracket_id(&self) -> Uuid {
        self.id
    }

    fn round(&self) -> u32 {
        self.round
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundLabel {
    Final,
    SemiFinals,
    QuarterFinals,
    Round(u32),
}

impl RoundLabel {
    /// Label for `round` when the bracket has `total_rounds` stages.
    pub fn for_round(round: u32, total_rounds: u32) -> Self {
        if round == total_rounds {
            RoundLabel::Final
        } else if round == total_rounds.saturating_sub(1) {
            RoundLabel::SemiFinals
        } else if round == total_rounds.saturating_sub(2) {
            RoundLabel::QuarterFinals
        } else {
            RoundLabel::Round(round)
        }
    }
}

impl std::fmt::Display for RoundLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoundLabel::Final => write!(f, "Final"),
            RoundLabel::SemiFinals => write!(f, "Semi-Finals"),
            RoundLabel::QuarterFinals => write!(f, "Quarter-Finals"),
            RoundLabel::Round(n) => write!(f, "Round {}", n),
        }
    }
}

impl Serialize for RoundLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BracketRound<M> {
    pub number: u32,
    pub label: RoundLabel,
    pub matches: Vec<M>,
}

/// Partition `matches` by round, first round first.
///
/// Matches sharing a round keep their input order. A round number with no
/// matches still gets an (empty) group. Empty input yields no rounds.
pub fn derive_rounds<M: Bracketed + Clone>(
    matches: &[M],
) -> Result<Vec<BracketRound<M>>, BracketError> {
    if let Some(bad) = matches
        .iter()
        .find(|m| m.round() == 0 || m.round() > MAX_ROUNDS)
    {
        return Err(BracketError::InvalidRound {
            match_id: bad.bracket_id(),
            round: bad.round(),
        });
    }

    let total_rounds = matches.iter().map(Bracketed::round).max().unwrap_or(0);
    let mut groups: Vec<Vec<M>> = (0..total_rounds).map(|_| Vec::new()).collect();
    for m in matches {
        groups[(m.round() - 1) as usize].push(m.clone());
    }

    Ok(groups
        .into_iter()
        .zip(1..)
        .map(|(matches, number)| BracketRound {
            number,
            label: RoundLabel::for_round(number, total_rounds),
            matches,
        })
        .collect())
}

/// Load every match of a tournament and arrange it for display.
pub async fn load_tournament_bracket<S: RecordStore + ?Sized>(
    store: &S,
    tournament_id: Uuid,
) -> Result<Vec<BracketRound<BracketMatch>>, MatchError> {
    let rows = store
        .find_by(
            Collection::Matches,
            "tournament_id",
            &Value::String(tournament_id.to_string()),
        )
        .await
        .map_err(|e| MatchError::persistence("Tournament lookup", e))?;

    let summaries = rows
        .into_iter()
        .map(|row| serde_json::from_value::<Match>(row).map(|m| BracketMatch::from(&m)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(derive_rounds(&summaries)?)
}
