use std::sync::Arc;

use tracing::warn;

use crate::config::AppConfig;
use crate::store::{DocumentStore, MemoryStore, PgStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Builds the store once for the whole process. Returns the Postgres handle
    /// separately so `main` can close it on shutdown.
    pub async fn init(config: AppConfig) -> anyhow::Result<(Self, Option<PgStore>)> {
        let config = Arc::new(config);

        let Some(url) = config.database_url.clone() else {
            warn!("DATABASE_URL not set; using in-memory store, data is lost on restart");
            let store = Arc::new(MemoryStore::new()) as Arc<dyn DocumentStore>;
            return Ok((Self::from_parts(store, config), None));
        };

        let pg = PgStore::connect(&url, config.db_max_connections).await?;
        if let Err(e) = pg.migrate().await {
            warn!(error = ?e, "migration failed; continuing");
        }
        let store = Arc::new(pg.clone()) as Arc<dyn DocumentStore>;
        Ok((Self::from_parts(store, config), Some(pg)))
    }

    pub fn from_parts(store: Arc<dyn DocumentStore>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            db_max_connections: 1,
            host: "127.0.0.1".into(),
            port: 0,
            admin: crate::config::AdminDefaults {
                email: "admin@test.local".into(),
                password: "admin-test-pw".into(),
                name: "Test Admin".into(),
            },
        });
        Self::from_parts(Arc::new(MemoryStore::new()), config)
    }
}
