use thiserror::Error;
use uuid::Uuid;

use crate::models::MatchStatus;
use crate::store::Collection;

/// Failures reported by a record store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record {id} not found in {collection}")]
    NotFound { collection: Collection, id: Uuid },

    #[error("{0}")]
    Rejected(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn rejected(message: impl Into<String>) -> Self {
        StoreError::Rejected(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

#[derive(Debug, Error)]
pub enum MatchError {
    /// A write or read against the record store failed.
    #[error("{operation} failed: {source}")]
    Persistence {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("Match not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: MatchStatus, to: MatchStatus },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Team {0} does not play in this match")]
    UnknownTeam(Uuid),

    #[error("Match is {0} and no longer accepts changes")]
    MatchClosed(MatchStatus),

    #[error("Rule violation: {0}")]
    RuleViolation(String),

    #[error("Malformed match record: {0}")]
    MalformedRecord(#[from] serde_json::Error),

    #[error(transparent)]
    InvalidBracket(#[from] BracketError),
}

impl MatchError {
    pub fn persistence(operation: &'static str, source: StoreError) -> Self {
        MatchError::Persistence { operation, source }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        MatchError::Validation(message.into())
    }

    pub fn rule_violation(message: impl Into<String>) -> Self {
        MatchError::RuleViolation(message.into())
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, MatchError::Persistence { .. })
    }
}

impl From<validator::ValidationErrors> for MatchError {
    fn from(errors: validator::ValidationErrors) -> Self {
        MatchError::Validation(errors.to_string())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BracketError {
    #[error(
        "Match {match_id} has round {round}; rounds run from 1 to {max}",
        max = crate::service::bracket::MAX_ROUNDS
    )]
    InvalidRound { match_id: Uuid, round: u32 },
}
