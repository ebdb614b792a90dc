use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::users::{
    domain::{User, UserStatus},
    error::RepoError,
};

/// Row shape of the `users` table.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub national_id: String,
    pub title: String,
    pub reg_number: String,
    pub department: String,
    pub email: String,
    pub phone: String,
    pub sex: String,
    pub date_of_birth: Date,
    pub password_hash: String,
    pub status: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = RepoError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let status = r
            .status
            .parse::<UserStatus>()
            .map_err(|e| RepoError::Corrupt(e.to_string()))?;
        Ok(Self {
            id: r.id,
            name: r.name,
            national_id: r.national_id,
            title: r.title,
            reg_number: r.reg_number,
            department: r.department,
            email: r.email,
            phone: r.phone,
            sex: r.sex,
            date_of_birth: r.date_of_birth,
            password_hash: r.password_hash,
            status,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}
