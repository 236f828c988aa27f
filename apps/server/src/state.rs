//! Shared application state.
//!
//! ```text
//! AppState::init:     config ──► database (+ migrations) ──► JWT manager ──► backup store
//! AppState::shutdown: pool close
//! ```

use std::sync::Arc;

use tokio::fs;
use tracing::info;

use crate::auth::JwtManager;
use crate::config::ServerConfig;
use madeh_db::{BackupStore, Database, DbConfig, DbResult};

pub type SharedState = Arc<AppState>;

/// Everything a handler needs, built once at startup.
pub struct AppState {
    pub config: ServerConfig,
    pub db: Database,
    pub jwt: JwtManager,
    pub store: BackupStore,
}

impl AppState {
    /// Opens the database and prepares storage.
    pub async fn init(config: ServerConfig) -> DbResult<SharedState> {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::create_dir_all(&config.storage_dir).await?;

        let db = Database::new(
            DbConfig::new(&config.database_path).max_connections(config.db_max_connections),
        )
        .await?;

        info!(
            database = %config.database_path.display(),
            storage = %config.storage_dir.display(),
            "Application state ready"
        );

        Ok(Arc::new(Self::from_parts(config, db)))
    }

    /// Assembles state around an already-open database.
    pub fn from_parts(config: ServerConfig, db: Database) -> Self {
        let jwt = JwtManager::new(&config.jwt_secret, config.session_lifetime_secs);
        let store = BackupStore::new(&config.storage_dir);
        AppState {
            config,
            db,
            jwt,
            store,
        }
    }

    pub async fn shutdown(&self) {
        self.db.close().await;
        info!("Application state released");
    }
}
