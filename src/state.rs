use std::sync::Arc;

use tracing::warn;

use crate::auth::{jwt::JwtKeys, password::Argon2Hasher};
use crate::config::{AppConfig, UserStore};
use crate::db;
use crate::users::{
    memory::InMemoryUserRepository,
    ports::{TokenIssuer, UserRepository, UserUseCases},
    repo::PgUserRepository,
    services::UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserUseCases>,
    pub tokens: Arc<dyn TokenIssuer>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let repo: Arc<dyn UserRepository> = match config.user_store {
            UserStore::Postgres => {
                let pool = db::connect(&config).await?;
                Arc::new(PgUserRepository::new(pool))
            }
            UserStore::Memory => {
                warn!("USER_STORE=memory: users are kept in process memory only");
                Arc::new(InMemoryUserRepository::new())
            }
        };
        Self::from_parts(Arc::new(config), repo)
    }

    /// Wire the user service from a repository adapter and the configured
    /// hasher and token issuer.
    pub fn from_parts(
        config: Arc<AppConfig>,
        repo: Arc<dyn UserRepository>,
    ) -> anyhow::Result<Self> {
        let hasher = Arc::new(Argon2Hasher::new(&config.hash)?);
        let tokens: Arc<dyn TokenIssuer> = Arc::new(JwtKeys::new(&config.jwt));
        let users = Arc::new(UserService::new(repo, hasher, tokens.clone()));
        Ok(Self {
            config,
            users,
            tokens,
        })
    }

    #[cfg(test)]
    pub fn fake(config: AppConfig) -> Self {
        Self::from_parts(Arc::new(config), Arc::new(InMemoryUserRepository::new()))
            .expect("test state")
    }
}
