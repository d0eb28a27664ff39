use crate::config::AppConfig;
use crate::users::repo::{MongoUserStore, UserStore};
use mongodb::Client;
use std::sync::Arc;

/// Per-request context: the persistence handle plus loaded config.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Wires the Mongo-backed store and makes sure its indexes exist.
    pub async fn init(client: &Client, config: AppConfig) -> anyhow::Result<Self> {
        let store = MongoUserStore::new(&client.database(&config.mongo.database));
        store.init_indexes().await?;

        Ok(Self::from_parts(
            Arc::new(store) as Arc<dyn UserStore>,
            Arc::new(config),
        ))
    }

    pub fn from_parts(users: Arc<dyn UserStore>, config: Arc<AppConfig>) -> Self {
        Self { users, config }
    }

    /// State backed by an empty in-memory store; no database needed.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::MongoConfig;
        use crate::users::memory::InMemoryUserStore;

        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            mongo: MongoConfig {
                url: "mongodb://localhost:27017".into(),
                database: "users_api_test".into(),
                app_name: None,
                connect_timeout_secs: 1,
                server_selection_timeout_secs: 1,
            },
        });

        let users = Arc::new(InMemoryUserStore::new()) as Arc<dyn UserStore>;
        Self::from_parts(users, config)
    }
}
