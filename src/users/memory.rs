use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::users::{
    domain::{User, UserStatus},
    error::{RepoError, RepoResult},
    ports::UserRepository,
};

/// Process-local `UserRepository` with the same uniqueness rules as the
/// `users` table. Contents are lost on restart.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_unique(users: &HashMap<Uuid, User>, user: &User) -> RepoResult<()> {
    for other in users.values().filter(|u| u.id != user.id) {
        if other.national_id == user.national_id {
            return Err(RepoError::UniqueViolation {
                constraint: "users_national_id_key".into(),
            });
        }
        if other.reg_number == user.reg_number {
            return Err(RepoError::UniqueViolation {
                constraint: "users_reg_number_key".into(),
            });
        }
    }
    Ok(())
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn save(&self, user: &User) -> RepoResult<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(RepoError::UniqueViolation {
                constraint: "users_pkey".into(),
            });
        }
        check_unique(&users, user)?;
        users.insert(user.id, user.clone());
        tracing::debug!(user_id = %user.id, "user inserted");
        Ok(())
    }

    async fn update(&self, user: &User) -> RepoResult<()> {
        let mut users = self.users.write().await;
        check_unique(&users, user)?;
        users.insert(user.id, user.clone());
        tracing::debug!(user_id = %user.id, status = %user.status, "user upserted");
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<User> {
        let users = self.users.read().await;
        users.get(&id).cloned().ok_or(RepoError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<User> {
        let users = self.users.read().await;
        users
            .values()
            .filter(|u| u.email == email)
            .min_by_key(|u| u.created_at)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn find_by_status(&self, status: UserStatus) -> RepoResult<Vec<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .filter(|u| u.status == status)
            .cloned()
            .collect())
    }
}
