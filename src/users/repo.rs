use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::users::{
    domain::{User, UserStatus},
    error::{RepoError, RepoResult},
    ports::UserRepository,
    repo_types::UserRow,
};

const USER_COLUMNS: &str = "id, name, national_id, title, reg_number, department, email, phone, \
     sex, date_of_birth, password_hash, status, created_at, updated_at";

/// Postgres-backed `UserRepository`.
#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Turn a unique-constraint failure into `RepoError::UniqueViolation`.
fn map_write_error(e: sqlx::Error) -> RepoError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return RepoError::UniqueViolation {
                constraint: db_err.constraint().unwrap_or("unknown").to_string(),
            };
        }
    }
    RepoError::Database(e)
}

fn bind_user<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    user: &'q User,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.national_id)
        .bind(&user.title)
        .bind(&user.reg_number)
        .bind(&user.department)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.sex)
        .bind(user.date_of_birth)
        .bind(&user.password_hash)
        .bind(user.status.as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn save(&self, user: &User) -> RepoResult<()> {
        let sql = format!(
            "INSERT INTO users ({USER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)"
        );
        bind_user(sqlx::query(&sql), user)
            .execute(&self.db)
            .await
            .map_err(map_write_error)?;
        debug!(user_id = %user.id, "user inserted");
        Ok(())
    }

    async fn update(&self, user: &User) -> RepoResult<()> {
        let sql = format!(
            "INSERT INTO users ({USER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             ON CONFLICT (id) DO UPDATE SET \
                name = EXCLUDED.name, \
                national_id = EXCLUDED.national_id, \
                title = EXCLUDED.title, \
                reg_number = EXCLUDED.reg_number, \
                department = EXCLUDED.department, \
                email = EXCLUDED.email, \
                phone = EXCLUDED.phone, \
                sex = EXCLUDED.sex, \
                date_of_birth = EXCLUDED.date_of_birth, \
                password_hash = EXCLUDED.password_hash, \
                status = EXCLUDED.status, \
                updated_at = EXCLUDED.updated_at"
        );
        bind_user(sqlx::query(&sql), user)
            .execute(&self.db)
            .await
            .map_err(map_write_error)?;
        debug!(user_id = %user.id, status = %user.status, "user upserted");
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(RepoError::NotFound)?;
        row.try_into()
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<User> {
        // email is not unique; the oldest registration wins
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 ORDER BY created_at ASC LIMIT 1"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await?
            .ok_or(RepoError::NotFound)?;
        row.try_into()
    }

    async fn find_by_status(&self, status: UserStatus) -> RepoResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE status = $1");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(status.as_str())
            .fetch_all(&self.db)
            .await?;
        rows.into_iter().map(User::try_from).collect()
    }
}
