use std::sync::Arc;

use crate::{
    cart::CartStore,
    config::AppConfig,
    db::{DbPool, create_orm_conn, create_pool},
    query::{Database, TableBackend},
    storage::{Cipher, FileBackend, LocalStorage, MemoryBackend},
};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub storage: LocalStorage,
    pub carts: CartStore,
    /// Present only with the remote backend.
    pub pool: Option<DbPool>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Opens local storage and, when `DATABASE_URL` is configured, Postgres.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let cipher = Cipher::new(&config.storage_secret);
        let storage = match &config.storage_path {
            Some(path) => LocalStorage::new(FileBackend::open(path)?, cipher),
            None => LocalStorage::new(MemoryBackend::new(), cipher),
        };

        let migrated = storage.migrate_legacy()?;
        let cleaned = storage.cleanup_expired()?;
        tracing::debug!(migrated, cleaned, "local storage prepared");

        let (backend, pool) = match &config.database_url {
            Some(url) => {
                let pool = create_pool(url).await?;
                (TableBackend::remote(create_orm_conn(&pool)), Some(pool))
            }
            None => (TableBackend::local(storage.clone()), None),
        };

        Ok(Self {
            db: Database::new(backend, config.query_cache_ttl),
            carts: CartStore::new(storage.clone()),
            storage,
            pool,
            config: Arc::new(config),
        })
    }

    /// Fully in-memory state: local tables, memory storage, no Postgres.
    pub fn in_memory(config: AppConfig) -> Self {
        let storage = LocalStorage::new(MemoryBackend::new(), Cipher::new(&config.storage_secret));
        Self {
            db: Database::new(TableBackend::local(storage.clone()), config.query_cache_ttl),
            carts: CartStore::new(storage.clone()),
            storage,
            pool: None,
            config: Arc::new(config),
        }
    }
}
