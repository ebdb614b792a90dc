//! Boundaries between the user service and the outside world.
//!
//! `UserUseCases` is what HTTP handlers drive. The remaining traits are what
//! the service drives; concrete adapters live in `auth::*` and `users::repo`.

use async_trait::async_trait;
use time::Date;
use uuid::Uuid;

use crate::auth::{jwt::TokenError, password::HashError};
use crate::users::{
    domain::{User, UserStatus},
    error::{RepoResult, ServiceResult},
};

/// Raw registration data as received from a client.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub national_id: String,
    pub title: String,
    pub reg_number: String,
    pub department: String,
    pub email: String,
    pub phone: String,
    pub sex: String,
    pub date_of_birth: Date,
    pub password: String,
}

#[async_trait]
pub trait UserUseCases: Send + Sync {
    async fn register(&self, input: Registration) -> ServiceResult<User>;

    /// Returns a signed bearer token.
    async fn login(&self, email: &str, password: &str) -> ServiceResult<String>;

    async fn approve(&self, user_id: Uuid) -> ServiceResult<User>;

    async fn list_pending(&self) -> ServiceResult<Vec<User>>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. Uniqueness failures come back as `RepoError::UniqueViolation`.
    async fn save(&self, user: &User) -> RepoResult<()>;

    /// Full upsert keyed by id.
    async fn update(&self, user: &User) -> RepoResult<()>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<User>;

    async fn find_by_email(&self, email: &str) -> RepoResult<User>;

    async fn find_by_status(&self, status: UserStatus) -> RepoResult<Vec<User>>;
}

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String, HashError>;

    /// Never fails: a malformed hash simply does not verify.
    fn verify(&self, plain: &str, hash: &str) -> bool;
}

/// Identity carried by a validated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub user_id: Uuid,
    pub role: String,
}

pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user_id: Uuid, role: &str) -> Result<String, TokenError>;

    fn validate(&self, token: &str) -> Result<TokenSubject, TokenError>;
}
