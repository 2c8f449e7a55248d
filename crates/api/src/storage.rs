//! Guest store selection for the configured backend.

use domain::{GuestStore, InMemoryGuestStore};
use persistence::{GuestRepository, JsonFileGuestStore};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{Config, StorageBackend};

/// The opened store plus the pool backing it, if any.
pub struct OpenedStore {
    pub store: Arc<dyn GuestStore>,
    pub pool: Option<PgPool>,
}

/// Open the configured backend. The postgres backend also runs migrations.
pub async fn open_store(config: &Config) -> anyhow::Result<OpenedStore> {
    match config.storage.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory guest store; guests are lost on restart");
            Ok(OpenedStore {
                store: Arc::new(InMemoryGuestStore::new()),
                pool: None,
            })
        }
        StorageBackend::JsonFile => {
            info!(path = %config.storage.json_path.display(), "Using JSON file guest store");
            Ok(OpenedStore {
                store: Arc::new(JsonFileGuestStore::new(config.storage.json_path.clone())),
                pool: None,
            })
        }
        StorageBackend::Postgres => {
            let db_config: persistence::db::DatabaseConfig = (&config.database).into();
            let pool = persistence::db::create_pool(&db_config).await?;
            persistence::db::run_migrations(&pool).await?;
            info!("Using PostgreSQL guest store");
            Ok(OpenedStore {
                store: Arc::new(GuestRepository::new(pool.clone())),
                pool: Some(pool),
            })
        }
    }
}
