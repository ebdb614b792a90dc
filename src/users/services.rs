use std::sync::Arc;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::password::HashError;
use crate::users::{
    domain::{NewUser, User, UserStatus},
    error::{RepoError, ServiceError, ServiceResult},
    ports::{PasswordHasher, Registration, TokenIssuer, UserRepository, UserUseCases},
};

pub const MIN_PASSWORD_CHARS: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Registration, login and approval rules. The only caller of the
/// repository, hasher and token issuer.
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenIssuer>,
}

impl UserService {
    pub fn new(
        repo: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            repo,
            hasher,
            tokens,
        }
    }
}

fn required(field: &str, value: String) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn validate(input: Registration) -> ServiceResult<(NewUser, String)> {
    if input.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ServiceError::validation(
            "password must be at least 8 characters",
        ));
    }
    let email = required("email", input.email)?;
    if !is_valid_email(&email) {
        return Err(ServiceError::validation("invalid email"));
    }
    let user = NewUser {
        name: required("name", input.name)?,
        national_id: required("nationalId", input.national_id)?,
        title: required("title", input.title)?,
        reg_number: required("regNumber", input.reg_number)?,
        department: required("department", input.department)?,
        email,
        phone: required("phone", input.phone)?,
        sex: required("sex", input.sex)?,
        date_of_birth: input.date_of_birth,
    };
    Ok((user, input.password))
}

#[async_trait]
impl UserUseCases for UserService {
    async fn register(&self, input: Registration) -> ServiceResult<User> {
        let (new_user, password) = validate(input)?;

        let hasher = self.hasher.clone();
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .unwrap_or_else(|e| Err(HashError(e.to_string())))
            .map_err(|e| {
                error!(error = %e, "hash_password failed");
                ServiceError::Hashing(e)
            })?;

        let user = User::new(new_user, hash);
        if let Err(e) = self.repo.save(&user).await {
            error!(error = %e, "save user failed");
            return Err(ServiceError::Persistence(e));
        }

        info!(user_id = %user.id, reg_number = %user.reg_number, "user registered");
        Ok(user)
    }

    async fn login(&self, email: &str, password: &str) -> ServiceResult<String> {
        let user = match self.repo.find_by_email(email).await {
            Ok(u) => u,
            Err(RepoError::NotFound) => {
                warn!(email = %email, "login unknown email");
                return Err(ServiceError::Authentication);
            }
            Err(e) => {
                error!(error = %e, "find_by_email failed");
                return Err(ServiceError::Persistence(e));
            }
        };

        let hasher = self.hasher.clone();
        let plain = password.to_string();
        let stored = user.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || hasher.verify(&plain, &stored))
            .await
            .map_err(|e| {
                error!(error = %e, "verify_password task failed");
                ServiceError::Hashing(HashError(e.to_string()))
            })?;
        if !verified {
            warn!(user_id = %user.id, "login invalid password");
            return Err(ServiceError::Authentication);
        }

        let token = self.tokens.issue(user.id, &user.title).map_err(|e| {
            error!(error = %e, "jwt sign failed");
            ServiceError::Token(e)
        })?;

        info!(user_id = %user.id, "user logged in");
        Ok(token)
    }

    async fn approve(&self, user_id: Uuid) -> ServiceResult<User> {
        let mut user = match self.repo.find_by_id(user_id).await {
            Ok(u) => u,
            Err(RepoError::NotFound) => return Err(ServiceError::NotFound),
            Err(e) => {
                error!(error = %e, %user_id, "find_by_id failed");
                return Err(ServiceError::Persistence(e));
            }
        };

        if !user.approve() {
            warn!(%user_id, status = %user.status, "approval refused");
            return Err(ServiceError::State);
        }

        if let Err(e) = self.repo.update(&user).await {
            error!(error = %e, %user_id, "update user failed");
            return Err(ServiceError::Persistence(e));
        }

        info!(%user_id, "user approved");
        Ok(user)
    }

    async fn list_pending(&self) -> ServiceResult<Vec<User>> {
        self.repo
            .find_by_status(UserStatus::Pending)
            .await
            .map_err(|e| {
                error!(error = %e, "find_by_status failed");
                ServiceError::Persistence(e)
            })
    }
}
