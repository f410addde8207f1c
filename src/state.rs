use std::sync::Arc;

use deadpool_postgres::Pool;
use redis::aio::ConnectionManager;

use crate::config::Config;
use crate::error::Result;
use crate::repositories::user::{PgUserStore, UserStore};
use crate::session::{MemorySessionStore, RedisSessionStore, SessionStore};

/// The application's shared state.
///
/// Every field is shared-read and internally synchronized; cloning the state
/// clones handles, not resources. The injection middleware places one clone
/// on each request scope.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: Pool,
    /// The session store (memory or Redis, per configuration).
    pub sessions: Arc<dyn SessionStore>,
    /// The persistent user store.
    pub users: Arc<dyn UserStore>,
    /// The application's configuration.
    pub config: Config,
}

impl AppState {
    /// Creates a new `AppState` from the configuration.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = crate::db::create_pool(&config.database_url)?;
        tracing::info!("✅ PostgreSQL pool initialized");

        let sessions: Arc<dyn SessionStore> = match &config.redis_url {
            Some(url) => {
                let client = redis::Client::open(url.as_str())?;
                let redis = ConnectionManager::new(client).await?;
                tracing::info!("✅ Redis session store initialized");
                Arc::new(RedisSessionStore::new(redis, config.session_max_age))
            }
            None => {
                tracing::info!("✅ In-memory session store initialized");
                Arc::new(MemorySessionStore::new(config.session_max_age))
            }
        };

        let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(db.clone()));

        Ok(AppState {
            db,
            sessions,
            users,
            config: config.clone(),
        })
    }
}
