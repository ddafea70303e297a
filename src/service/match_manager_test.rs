#[cfg(test)]
mod tests {
    use crate::error::MatchError;
    use crate::models::*;
    use crate::service::match_manager::MatchManager;
    use crate::store::{Collection, MemoryStore, RecordStore};
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};
    use uuid::Uuid;

    /// Helper to create a stored two-team match and its manager
    async fn create_test_manager() -> (Arc<MemoryStore>, MatchManager<MemoryStore>, Team, Team) {
        let store = Arc::new(MemoryStore::new());
        let home = Team::new("Sharks");
        let away = Team::new("Dolphins");
        let new_match = NewMatch::new(
            "Pool A - Game 1",
            vec![home.clone(), away.clone()],
            MatchConfiguration::default().timer_snapshot(),
        );

        let record = MatchManager::create_match(store.as_ref(), new_match)
            .await
            .unwrap();
        let manager = MatchManager::new(Arc::clone(&store), record);
        (store, manager, home, away)
    }

    async fn stored_match(store: &MemoryStore, id: Uuid) -> Match {
        let raw = store.get(Collection::Matches, id).await.unwrap();
        serde_json::from_value(raw).unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end_scoring_and_finalization() {
        let (store, mut manager, home, away) = create_test_manager().await;

        assert_ok!(manager.record_score(home.id, 3).await);
        assert_ok!(manager.record_score(away.id, 1).await);
        assert_eq!(assert_ok!(manager.record_score(home.id, 2).await), 5);

        assert_eq!(manager.current().points_of(home.id), 5);
        assert_eq!(manager.current().points_of(away.id), 1);

        let outcome = assert_ok!(manager.finalize_match().await);
        assert_eq!(outcome.winner.as_ref().map(|t| t.id), Some(home.id));
        assert!(!outcome.is_draw());
        assert_eq!(manager.status(), MatchStatus::Completed);
        assert_eq!(manager.current().winner_id, Some(home.id));

        let stored = stored_match(&store, manager.id()).await;
        assert_eq!(stored.status, MatchStatus::Completed);
        assert_eq!(stored.winner_id, Some(home.id));
        assert_eq!(stored.end_time, Some(outcome.end_time));
        assert_eq!(stored.points_of(home.id), 5);
    }

    #[tokio::test]
    async fn test_score_accumulates_deltas_in_order() {
        let (store, mut manager, home, _) = create_test_manager().await;

        for delta in [1, 3, -1, 2] {
            manager.record_score(home.id, delta).await.unwrap();
        }

        let score = manager.current().score_of(home.id).unwrap();
        assert_eq!(score.points, 5);
        assert_eq!(score.period_scores, vec![1, 3, -1, 2]);

        let stored = stored_match(&store, manager.id()).await;
        assert_eq!(stored.score_of(home.id), Some(score));
    }

    #[tokio::test]
    async fn test_failed_status_update_keeps_previous_status() {
        let (store, mut manager, _, _) = create_test_manager().await;
        store.fail_writes("connection reset by peer");

        let err = assert_err!(manager.update_status(MatchStatus::InProgress).await);
        assert!(err.is_persistence());
        assert_eq!(err.to_string(), "Status update failed: connection reset by peer");
        assert_eq!(manager.status(), MatchStatus::Scheduled);

        store.heal();
        assert_ok!(manager.update_status(MatchStatus::InProgress).await);
        assert_eq!(manager.status(), MatchStatus::InProgress);
    }

    #[tokio::test]
    async fn test_failed_score_update_leaves_scores_untouched() {
        let (store, mut manager, home, _) = create_test_manager().await;
        manager.record_score(home.id, 2).await.unwrap();

        store.fail_writes("timeout");
        assert_err!(manager.record_score(home.id, 4).await);

        let score = manager.current().score_of(home.id).unwrap();
        assert_eq!(score.points, 2);
        assert_eq!(score.period_scores, vec![2]);
    }

    #[tokio::test]
    async fn test_illegal_transitions_never_reach_the_store() {
        let (store, mut manager, _, _) = create_test_manager().await;
        store.fail_writes("store must not be called");

        let err = assert_err!(manager.update_status(MatchStatus::Paused).await);
        assert!(matches!(
            err,
            MatchError::InvalidTransition {
                from: MatchStatus::Scheduled,
                to: MatchStatus::Paused
            }
        ));

        // Completion requires a winner computation.
        let err = assert_err!(manager.update_status(MatchStatus::Completed).await);
        assert!(matches!(err, MatchError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_pause_resume_cycle() {
        let (_, mut manager, _, _) = create_test_manager().await;

        for status in [
            MatchStatus::InProgress,
            MatchStatus::Paused,
            MatchStatus::InProgress,
            MatchStatus::Paused,
        ] {
            assert_ok!(manager.update_status(status).await);
        }
        assert_eq!(manager.status(), MatchStatus::Paused);

        let outcome = assert_ok!(manager.finalize_match().await);
        assert!(outcome.is_draw());
        assert_eq!(manager.current().winner_id, None);
    }

    #[tokio::test]
    async fn test_same_status_succeeds_without_store_write() {
        let (store, mut manager, _, _) = create_test_manager().await;
        assert_ok!(manager.update_status(MatchStatus::InProgress).await);

        store.fail_writes("down");
        assert_ok!(manager.update_status(MatchStatus::InProgress).await);
        assert_eq!(manager.status(), MatchStatus::InProgress);

        // A real change still needs the store.
        let err = assert_err!(manager.update_status(MatchStatus::Paused).await);
        assert_eq!(err.to_string(), "Status update failed: down");
        assert_eq!(manager.status(), MatchStatus::InProgress);
    }

    #[tokio::test]
    async fn test_cancelled_match_is_closed() {
        let (_, mut manager, home, _) = create_test_manager().await;
        manager.update_status(MatchStatus::Cancelled).await.unwrap();

        let err = assert_err!(manager.record_score(home.id, 1).await);
        assert!(matches!(err, MatchError::MatchClosed(MatchStatus::Cancelled)));
        assert_err!(manager.record_event(MatchEvent::new(MatchEventKind::Goal)).await);
        assert_err!(manager.update_status(MatchStatus::InProgress).await);
        assert_err!(manager.finalize_match().await);
    }

    #[tokio::test]
    async fn test_finalize_twice_is_rejected() {
        let (_, mut manager, home, _) = create_test_manager().await;
        manager.record_score(home.id, 1).await.unwrap();
        manager.finalize_match().await.unwrap();

        let err = assert_err!(manager.finalize_match().await);
        assert!(matches!(
            err,
            MatchError::InvalidTransition {
                from: MatchStatus::Completed,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_failed_finalization_keeps_match_open() {
        let (store, mut manager, home, _) = create_test_manager().await;
        manager.record_score(home.id, 1).await.unwrap();

        store.fail_writes("read-only replica");
        let err = assert_err!(manager.finalize_match().await);
        assert_eq!(err.to_string(), "Match finalization failed: read-only replica");
        assert_eq!(manager.status(), MatchStatus::Scheduled);
        assert_eq!(manager.current().winner_id, None);
        assert_eq!(manager.current().end_time, None);
    }

    #[tokio::test]
    async fn test_unknown_team_is_rejected() {
        let (_, mut manager, _, _) = create_test_manager().await;
        let stranger = Uuid::new_v4();

        let err = assert_err!(manager.record_score(stranger, 1).await);
        assert!(matches!(err, MatchError::UnknownTeam(id) if id == stranger));

        let event = MatchEvent::new(MatchEventKind::Goal).for_team(stranger);
        assert_err!(manager.record_event(event).await);
        assert!(manager.current().events.is_empty());
    }

    #[tokio::test]
    async fn test_events_are_persisted_and_reloaded() {
        let (store, mut manager, home, away) = create_test_manager().await;

        let goal = MatchEvent::new(MatchEventKind::Goal)
            .for_team(home.id)
            .by_player("#9");
        let timeout = MatchEvent::new(MatchEventKind::Timeout).for_team(away.id);
        let goal_id = assert_ok!(manager.record_event(goal).await);
        assert_ok!(manager.record_event(timeout).await);
        assert_eq!(store.len(Collection::MatchEvents), 2);

        let reloaded = assert_ok!(MatchManager::load(Arc::clone(&store), manager.id()).await);
        let kinds: Vec<MatchEventKind> = reloaded.current().events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![MatchEventKind::Goal, MatchEventKind::Timeout]);
        assert_eq!(reloaded.current().events[0].id, goal_id);
        assert_eq!(reloaded.current().events[0].player.as_deref(), Some("#9"));
    }

    #[tokio::test]
    async fn test_failed_event_insert_is_not_appended() {
        let (store, mut manager, home, _) = create_test_manager().await;
        store.fail_writes("disk full");

        let err = assert_err!(
            manager
                .record_event(MatchEvent::new(MatchEventKind::Penalty).for_team(home.id))
                .await
        );
        assert_eq!(err.to_string(), "Event recording failed: disk full");
        assert!(manager.current().events.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_limit_from_configuration() {
        let (_, manager, home, away) = create_test_manager().await;
        let mut manager = manager.with_configuration(MatchConfiguration::default());

        for _ in 0..2 {
            assert_ok!(
                manager
                    .record_event(MatchEvent::new(MatchEventKind::Timeout).for_team(home.id))
                    .await
            );
        }
        let err = assert_err!(
            manager
                .record_event(MatchEvent::new(MatchEventKind::Timeout).for_team(home.id))
                .await
        );
        assert!(matches!(err, MatchError::RuleViolation(_)));

        // Limits are per team, and goals are never capped.
        assert_ok!(
            manager
                .record_event(MatchEvent::new(MatchEventKind::Timeout).for_team(away.id))
                .await
        );
        for _ in 0..10 {
            assert_ok!(
                manager
                    .record_event(MatchEvent::new(MatchEventKind::Goal).for_team(home.id))
                    .await
            );
        }
    }

    #[tokio::test]
    async fn test_update_timer_merges_fields() {
        let (store, mut manager, _, _) = create_test_manager().await;
        let started = chrono::Utc::now();

        let timer = assert_ok!(
            manager
                .update_timer(TimerPatch::status(TimerStatus::Running).started_at(started))
                .await
        )
        .clone();
        assert_eq!(timer.status, TimerStatus::Running);
        assert_eq!(timer.start_time, Some(started));
        assert_eq!(timer.duration, 1920);
        assert_eq!(timer.overtime, Some(300));

        let stored = stored_match(&store, manager.id()).await;
        assert_eq!(stored.timer, timer);
    }

    #[tokio::test]
    async fn test_failed_timer_update_keeps_previous_timer() {
        let (store, mut manager, _, _) = create_test_manager().await;
        store.fail_writes("unavailable");

        assert_err!(manager.update_timer(TimerPatch::status(TimerStatus::Running)).await);
        assert_eq!(manager.current().timer.status, TimerStatus::Stopped);
    }

    #[tokio::test]
    async fn test_create_match_rejects_invalid_payload() {
        let store = MemoryStore::new();
        let new_match = NewMatch::new(
            "Walkover",
            vec![Team::new("Sharks")],
            TimerSnapshot::new(600, None),
        );

        let err = assert_err!(MatchManager::create_match(&store, new_match).await);
        assert!(matches!(err, MatchError::Validation(_)));
        assert!(store.is_empty(Collection::Matches));
    }

    #[tokio::test]
    async fn test_create_match_wraps_store_failure() {
        let store = MemoryStore::new();
        store.fail_writes("permission denied for table matches");
        let new_match = NewMatch::new(
            "Final",
            vec![Team::new("Sharks"), Team::new("Dolphins")],
            TimerSnapshot::new(600, None),
        );

        let err = assert_err!(MatchManager::create_match(&store, new_match).await);
        assert_eq!(
            err.to_string(),
            "Match creation failed: permission denied for table matches"
        );
    }

    #[tokio::test]
    async fn test_load_missing_match() {
        let store = Arc::new(MemoryStore::new());
        let id = Uuid::new_v4();
        let err = assert_err!(MatchManager::load(store, id).await);
        assert!(matches!(err, MatchError::NotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn test_manager_over_trait_object() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let record = MatchManager::create_match(
            store.as_ref(),
            NewMatch::new(
                "Dyn",
                vec![Team::new("Sharks"), Team::new("Dolphins")],
                TimerSnapshot::new(600, None),
            ),
        )
        .await
        .unwrap();

        let mut manager = MatchManager::new(store, record);
        assert_ok!(manager.update_status(MatchStatus::InProgress).await);
    }
}
