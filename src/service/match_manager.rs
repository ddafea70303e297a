use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::error::MatchError;
use crate::models::*;
use crate::store::{Collection, RecordStore};

/// Result of finalizing a match.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    pub winner: Option<Team>,
    pub end_time: DateTime<Utc>,
}

impl MatchOutcome {
    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }
}

/// Match Lifecycle Manager - sole mutator of one match record.
///
/// Every mutation is staged, written to the record store, and only then
/// applied to the in-memory record. A failed write leaves local state as it
/// was before the call.
pub struct MatchManager<S: RecordStore + ?Sized> {
    store: Arc<S>,
    record: Match,
    configuration: Option<MatchConfiguration>,
}

impl<S: RecordStore + ?Sized> std::fmt::Debug for MatchManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchManager")
            .field("record", &self.record)
            .field("configuration", &self.configuration)
            .finish_non_exhaustive()
    }
}

impl<S: RecordStore + ?Sized> MatchManager<S> {
    pub fn new(store: Arc<S>, record: Match) -> Self {
        Self {
            store,
            record,
            configuration: None,
        }
    }

    /// Attach sport rules; event limits are enforced from then on.
    pub fn with_configuration(mut self, configuration: MatchConfiguration) -> Self {
        self.configuration = Some(configuration);
        self
    }

    // =============================================================================
    // CREATE / LOAD
    // =============================================================================

    /// Validate and insert a new match (SCHEDULED status).
    pub async fn create_match(store: &S, new_match: NewMatch) -> Result<Match, MatchError> {
        new_match.validate()?;

        let record = new_match.into_match();
        info!(
            match_id = %record.id,
            teams = record.teams.len(),
            round = record.round,
            "Creating new match"
        );

        let created = store
            .create(Collection::Matches, serde_json::to_value(&record)?)
            .await
            .map_err(|e| {
                error!(match_id = %record.id, error = %e, "Failed to create match");
                MatchError::persistence("Match creation", e)
            })?;

        Ok(serde_json::from_value(created)?)
    }

    /// Load a stored match together with its recorded events.
    pub async fn load(store: Arc<S>, match_id: Uuid) -> Result<Self, MatchError> {
        let raw = match store.get(Collection::Matches, match_id).await {
            Ok(raw) => raw,
            Err(e) if e.is_not_found() => return Err(MatchError::NotFound(match_id)),
            Err(e) => return Err(MatchError::persistence("Match lookup", e)),
        };
        let mut record: Match = serde_json::from_value(raw)?;

        let rows = store
            .find_by(
                Collection::MatchEvents,
                "match_id",
                &Value::String(match_id.to_string()),
            )
            .await
            .map_err(|e| MatchError::persistence("Event lookup", e))?;
        record.events = rows
            .into_iter()
            .map(|row| serde_json::from_value::<MatchEventRecord>(row).map(|r| r.event))
            .collect::<Result<_, _>>()?;

        debug!(match_id = %match_id, events = record.events.len(), "Match loaded");
        Ok(Self::new(store, record))
    }

    // =============================================================================
    // QUERIES
    // =============================================================================

    pub fn current(&self) -> &Match {
        &self.record
    }

    pub fn id(&self) -> Uuid {
        self.record.id
    }

    pub fn status(&self) -> MatchStatus {
        self.record.status
    }

    pub fn configuration(&self) -> Option<&MatchConfiguration> {
        self.configuration.as_ref()
    }

    /// Highest score wins; a tie between the top two is a draw.
    ///
    /// Teams without a score entry count as zero points.
    pub fn determine_winner(&self) -> Option<&Team> {
        let mut standings: Vec<(&Team, i32)> = self
            .record
            .teams
            .iter()
            .map(|team| (team, self.record.points_of(team.id)))
            .collect();
        standings.sort_by(|a, b| b.1.cmp(&a.1));

        match standings.as_slice() {
            [(leader, first), (_, second), ..] if first > second => Some(*leader),
            _ => None,
        }
    }

    // =============================================================================
    // MUTATIONS
    // =============================================================================

    /// Move the match to another status. Completion goes through
    /// [`finalize_match`](Self::finalize_match) instead.
    pub async fn update_status(&mut self, status: MatchStatus) -> Result<(), MatchError> {
        let from = self.record.status;
        if status == MatchStatus::Completed || !from.can_transition_to(&status) {
            warn!(
                match_id = %self.record.id,
                from_state = %from,
                to_state = %status,
                "Rejected status transition"
            );
            return Err(MatchError::InvalidTransition { from, to: status });
        }
        if status == from {
            debug!(match_id = %self.record.id, status = %status, "Status unchanged");
            return Ok(());
        }

        self.persist("Status update", MatchPatch::status(status)).await?;
        self.record.status = status;

        info!(
            match_id = %self.record.id,
            from_state = %from,
            to_state = %status,
            "Match status updated"
        );
        Ok(())
    }

    /// Add `delta` to a team's score. Returns the team's new total.
    pub async fn record_score(&mut self, team_id: Uuid, delta: i32) -> Result<i32, MatchError> {
        self.ensure_open()?;
        if self.record.team(team_id).is_none() {
            return Err(MatchError::UnknownTeam(team_id));
        }

        let mut staged = self.record.scores.clone();
        let total = match staged.iter_mut().find(|score| score.team_id == team_id) {
            Some(score) => {
                score.points = score.points.saturating_add(delta);
                score.period_scores.push(delta);
                score.points
            }
            None => {
                staged.push(MatchScore {
                    team_id,
                    points: delta,
                    period_scores: vec![delta],
                });
                delta
            }
        };

        self.persist("Score update", MatchPatch::scores(staged.clone()))
            .await?;
        self.record.scores = staged;

        debug!(
            match_id = %self.record.id,
            team_id = %team_id,
            delta,
            total,
            "Score recorded"
        );
        Ok(total)
    }

    /// Append an event to the match log. Returns the event id.
    pub async fn record_event(&mut self, event: MatchEvent) -> Result<Uuid, MatchError> {
        self.ensure_open()?;
        if let Some(team_id) = event.team {
            if self.record.team(team_id).is_none() {
                return Err(MatchError::UnknownTeam(team_id));
            }
            self.check_event_limit(team_id, event.kind)?;
        }

        let row = MatchEventRecord {
            match_id: self.record.id,
            event: event.clone(),
        };
        self.store
            .insert_event(Collection::MatchEvents, serde_json::to_value(&row)?)
            .await
            .map_err(|e| {
                error!(match_id = %self.record.id, error = %e, "Failed to record event");
                MatchError::persistence("Event recording", e)
            })?;

        let event_id = event.id;
        info!(
            match_id = %self.record.id,
            event_id = %event_id,
            kind = %event.kind,
            "Match event recorded"
        );
        self.record.events.push(event);
        Ok(event_id)
    }

    /// Merge timer fields into the stored timer.
    pub async fn update_timer(&mut self, patch: TimerPatch) -> Result<&TimerSnapshot, MatchError> {
        let merged = self.record.timer.merged(&patch);

        self.persist("Timer update", MatchPatch::timer(merged.clone()))
            .await?;
        self.record.timer = merged;

        debug!(
            match_id = %self.record.id,
            timer_status = %self.record.timer.status,
            "Timer updated"
        );
        Ok(&self.record.timer)
    }

    /// Decide the winner and close the match (any live status -> COMPLETED).
    pub async fn finalize_match(&mut self) -> Result<MatchOutcome, MatchError> {
        let from = self.record.status;
        if !from.can_transition_to(&MatchStatus::Completed) {
            warn!(match_id = %self.record.id, from_state = %from, "Rejected finalization");
            return Err(MatchError::InvalidTransition {
                from,
                to: MatchStatus::Completed,
            });
        }

        let winner_id = self.determine_winner().map(|team| team.id);
        let end_time = Utc::now();

        info!(
            match_id = %self.record.id,
            from_state = %from,
            winner_id = ?winner_id,
            "Finalizing match"
        );

        self.persist(
            "Match finalization",
            MatchPatch::completion(end_time, winner_id),
        )
        .await?;

        self.record.status = MatchStatus::Completed;
        self.record.end_time = Some(end_time);
        self.record.winner_id = winner_id;

        info!(match_id = %self.record.id, "Match finalized successfully");

        Ok(MatchOutcome {
            winner: self.record.winner().cloned(),
            end_time,
        })
    }

    // =============================================================================
    // HELPER METHODS
    // =============================================================================

    fn ensure_open(&self) -> Result<(), MatchError> {
        if self.record.status.is_terminal() {
            return Err(MatchError::MatchClosed(self.record.status));
        }
        Ok(())
    }

    fn check_event_limit(&self, team_id: Uuid, kind: MatchEventKind) -> Result<(), MatchError> {
        let Some(limit) = self
            .configuration
            .as_ref()
            .and_then(|config| config.limit_for(kind))
        else {
            return Ok(());
        };

        let used = self
            .record
            .events
            .iter()
            .filter(|event| event.kind == kind && event.team == Some(team_id))
            .count();
        if used >= limit as usize {
            return Err(MatchError::rule_violation(format!(
                "team {} has no {} left (limit {})",
                team_id, kind, limit
            )));
        }
        Ok(())
    }

    async fn persist(&self, operation: &'static str, patch: MatchPatch) -> Result<Value, MatchError> {
        let patch = serde_json::to_value(&patch)?;
        self.store
            .update(Collection::Matches, self.record.id, patch)
            .await
            .map_err(|e| {
                error!(
                    match_id = %self.record.id,
                    operation,
                    error = %e,
                    "Persistence call failed"
                );
                MatchError::persistence(operation, e)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn manager_with(points: &[i32]) -> MatchManager<MemoryStore> {
        let teams: Vec<Team> = (0..points.len())
            .map(|n| Team::new(format!("Team {}", n)))
            .collect();
        let mut record = NewMatch::new("Test", teams, TimerSnapshot::new(600, None)).into_match();
        record.scores = record
            .teams
            .iter()
            .zip(points)
            .map(|(team, &points)| MatchScore {
                team_id: team.id,
                points,
                period_scores: vec![points],
            })
            .collect();
        MatchManager::new(Arc::new(MemoryStore::new()), record)
    }

    #[test]
    fn test_highest_score_wins() {
        let manager = manager_with(&[10, 7]);
        let winner = manager.determine_winner().unwrap();
        assert_eq!(winner.id, manager.current().teams[0].id);
    }

    #[test]
    fn test_tied_leaders_draw() {
        assert!(manager_with(&[5, 5]).determine_winner().is_none());
    }

    #[test]
    fn test_only_top_two_are_compared() {
        assert!(manager_with(&[5, 5, 3]).determine_winner().is_none());

        let manager = manager_with(&[3, 9, 4]);
        assert_eq!(
            manager.determine_winner().map(|t| t.id),
            Some(manager.current().teams[1].id)
        );
    }

    #[test]
    fn test_unscored_team_counts_as_zero() {
        let mut manager = manager_with(&[2, 0]);
        manager.record.scores.truncate(1);
        assert_eq!(
            manager.determine_winner().map(|t| t.id),
            Some(manager.current().teams[0].id)
        );

        manager.record.scores.clear();
        assert!(manager.determine_winner().is_none());
    }
}
