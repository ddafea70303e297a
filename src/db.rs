use sqlx::{postgres::PgPoolOptions, PgPool};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::config::DatabaseConfig;
use crate::error::StoreError;
use crate::store::PgRecordStore;

pub type DbPool = PgPool;

pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect(&config.url)
        .await
}

pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub async fn health_check(pool: &DbPool) -> Result<(), StoreError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Lazily connects the Postgres record store.
///
/// Concurrent callers of [`connect`](Self::connect) share one in-flight
/// connection attempt. A failed attempt is not cached, the next call retries.
#[derive(Debug)]
pub struct StoreConnector {
    config: DatabaseConfig,
    store: OnceCell<Arc<PgRecordStore>>,
}

impl StoreConnector {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            store: OnceCell::new(),
        }
    }

    pub async fn connect(&self) -> Result<Arc<PgRecordStore>, StoreError> {
        self.connect_with(|| async {
            info!(max_connections = self.config.max_connections, "Connecting record store");
            let pool = create_pool(&self.config).await.map_err(|e| {
                error!(error = %e, "Failed to connect record store");
                StoreError::from(e)
            })?;
            Ok::<_, StoreError>(PgRecordStore::new(pool))
        })
        .await
    }

    /// Runs `init` unless a store is already connected or being connected.
    pub async fn connect_with<F, Fut>(&self, init: F) -> Result<Arc<PgRecordStore>, StoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<PgRecordStore, StoreError>>,
    {
        self.store
            .get_or_try_init(|| async { init().await.map(Arc::new) })
            .await
            .cloned()
    }

    pub fn is_connected(&self) -> bool {
        self.store.initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn unreachable_config() -> DatabaseConfig {
        DatabaseConfig {
            url: "not a database url".to_string(),
            max_connections: 1,
            acquire_timeout_secs: 1,
        }
    }

    #[tokio::test]
    async fn test_failed_connection_is_not_memoized() {
        let connector = StoreConnector::new(unreachable_config());

        assert!(connector.connect().await.is_err());
        assert!(!connector.is_connected());

        // A second attempt runs again instead of replaying a cached failure.
        assert!(connector.connect().await.is_err());
        assert!(!connector.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_connects_share_one_attempt() {
        let connector = StoreConnector::new(unreachable_config());
        let attempts = AtomicUsize::new(0);
        let attempts = &attempts;

        let init = move || async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            let pool = PgPoolOptions::new().connect_lazy("postgres://localhost/matchday")?;
            Ok::<_, StoreError>(PgRecordStore::new(pool))
        };

        let (first, second) = tokio::join!(connector.connect_with(init), connector.connect_with(init));
        let (first, second) = (first.unwrap(), second.unwrap());

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(connector.is_connected());

        // Once connected, later calls reuse the store.
        let third = connector.connect().await.unwrap();
        assert!(Arc::ptr_eq(&first, &third));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
