use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::MatchError;
use crate::models::{MatchConfiguration, NewMatch};
use crate::service::match_manager::MatchManager;
use crate::store::RecordStore;

/// Shared handle to one match. Lock it for the duration of a mutation.
pub type SharedMatch<S> = Arc<Mutex<MatchManager<S>>>;

type Slot<S> = Arc<OnceCell<SharedMatch<S>>>;

/// Hands out one manager per match id so that mutations of the same match
/// queue behind each other while different matches proceed independently.
pub struct MatchRegistry<S: RecordStore + ?Sized> {
    store: Arc<S>,
    configuration: Option<MatchConfiguration>,
    managers: Mutex<HashMap<Uuid, Slot<S>>>,
}

impl<S: RecordStore + ?Sized> MatchRegistry<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            configuration: None,
            managers: Mutex::new(HashMap::new()),
        }
    }

    /// Rules attached to every manager opened from now on.
    pub fn with_configuration(mut self, configuration: MatchConfiguration) -> Self {
        self.configuration = Some(configuration);
        self
    }

    pub async fn create(&self, new_match: NewMatch) -> Result<SharedMatch<S>, MatchError> {
        let record = MatchManager::create_match(self.store.as_ref(), new_match).await?;
        let match_id = record.id;
        let handle = Arc::new(Mutex::new(
            self.configure(MatchManager::new(Arc::clone(&self.store), record)),
        ));

        self.managers
            .lock()
            .await
            .insert(match_id, Arc::new(OnceCell::new_with(Some(Arc::clone(&handle)))));
        info!(match_id = %match_id, "Match registered");
        Ok(handle)
    }

    /// Handle for a match, loading it from the store on first use.
    ///
    /// Concurrent opens of one id share a single load. The map lock is only
    /// held to find the slot, never across a load.
    pub async fn open(&self, match_id: Uuid) -> Result<SharedMatch<S>, MatchError> {
        let slot = {
            let mut managers = self.managers.lock().await;
            Arc::clone(managers.entry(match_id).or_default())
        };

        let loaded = slot
            .get_or_try_init(|| async {
                let manager = MatchManager::load(Arc::clone(&self.store), match_id).await?;
                debug!(match_id = %match_id, "Match opened");
                Ok::<_, MatchError>(Arc::new(Mutex::new(self.configure(manager))))
            })
            .await
            .cloned();

        if loaded.is_err() {
            self.discard_empty_slot(match_id, &slot).await;
        }
        loaded
    }

    /// Forget a cached manager. Returns whether one was cached.
    pub async fn evict(&self, match_id: Uuid) -> bool {
        let removed = self
            .managers
            .lock()
            .await
            .remove(&match_id)
            .is_some_and(|slot| slot.initialized());
        if removed {
            debug!(match_id = %match_id, "Match evicted");
        }
        removed
    }

    /// Number of loaded matches.
    pub async fn len(&self) -> usize {
        self.managers
            .lock()
            .await
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn configure(&self, manager: MatchManager<S>) -> MatchManager<S> {
        match &self.configuration {
            Some(configuration) => manager.with_configuration(configuration.clone()),
            None => manager,
        }
    }

    async fn discard_empty_slot(&self, match_id: Uuid, slot: &Slot<S>) {
        let mut managers = self.managers.lock().await;
        let unused = managers
            .get(&match_id)
            .is_some_and(|current| Arc::ptr_eq(current, slot) && !current.initialized());
        if unused {
            managers.remove(&match_id);
        }
    }
}
