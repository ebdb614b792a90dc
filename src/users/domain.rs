use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{macros::format_description, Date, OffsetDateTime};
use uuid::Uuid;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, thiserror::Error)]
#[error("invalid date '{0}', expected YYYY-MM-DD")]
pub struct InvalidDate(String);

/// Parse a calendar date in strict `YYYY-MM-DD` form: four-digit year from
/// 0001, no sign, no surrounding whitespace.
pub fn parse_iso_date(raw: &str) -> Result<Date, InvalidDate> {
    let bytes = raw.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped || raw.starts_with("0000") {
        return Err(InvalidDate(raw.to_string()));
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map_err(|_| InvalidDate(raw.to_string()))
}

/// Registration lifecycle. Every user starts out `Pending`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Inactive,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Pending => "PENDING",
            UserStatus::Approved => "APPROVED",
            UserStatus::Rejected => "REJECTED",
            UserStatus::Inactive => "INACTIVE",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown user status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for UserStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(UserStatus::Pending),
            "APPROVED" => Ok(UserStatus::Approved),
            "REJECTED" => Ok(UserStatus::Rejected),
            "INACTIVE" => Ok(UserStatus::Inactive),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A person registered in the system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub national_id: String,             // unique
    pub title: String,                   // job title, doubles as the token role
    pub reg_number: String,              // unique
    pub department: String,
    pub email: String,
    pub phone: String,
    pub sex: String,
    #[serde(with = "iso_date")]
    pub date_of_birth: Date,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub status: UserStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Registration input, already validated and with the password hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub national_id: String,
    pub title: String,
    pub reg_number: String,
    pub department: String,
    pub email: String,
    pub phone: String,
    pub sex: String,
    pub date_of_birth: Date,
}

impl User {
    pub fn new(input: NewUser, password_hash: String) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            name: input.name,
            national_id: input.national_id,
            title: input.title,
            reg_number: input.reg_number,
            department: input.department,
            email: input.email,
            phone: input.phone,
            sex: input.sex,
            date_of_birth: input.date_of_birth,
            password_hash,
            status: UserStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == UserStatus::Pending
    }

    /// Move a pending user to `Approved`. Returns false, leaving the user
    /// untouched, for any other current status.
    pub fn approve(&mut self) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.status = UserStatus::Approved;
        self.updated_at = OffsetDateTime::now_utc();
        true
    }
}

#[cfg(test)]
pub(crate) fn sample_new_user(national_id: &str, reg_number: &str, email: &str) -> NewUser {
    NewUser {
        name: "Maria Souza".into(),
        national_id: national_id.into(),
        title: "attendant".into(),
        reg_number: reg_number.into(),
        department: "front desk".into(),
        email: email.into(),
        phone: "+55 68 99999-0000".into(),
        sex: "F".into(),
        date_of_birth: time::macros::date!(1990 - 04 - 15),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_starts_pending() {
        let user = User::new(sample_new_user("111", "R-1", "a@example.com"), "hash".into());
        assert_eq!(user.status, UserStatus::Pending);
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn approve_only_from_pending() {
        let mut user = User::new(sample_new_user("111", "R-1", "a@example.com"), "hash".into());
        assert!(user.approve());
        assert_eq!(user.status, UserStatus::Approved);
        assert!(!user.approve());

        user.status = UserStatus::Rejected;
        assert!(!user.approve());
        assert_eq!(user.status, UserStatus::Rejected);
    }

    #[test]
    fn status_text_matches_storage_form() {
        for status in [
            UserStatus::Pending,
            UserStatus::Approved,
            UserStatus::Rejected,
            UserStatus::Inactive,
        ] {
            assert_eq!(status.as_str().parse::<UserStatus>().unwrap(), status);
        }
        assert!("PENDENTE".parse::<UserStatus>().is_err());
    }

    #[test]
    fn serialization_hides_password_and_formats_dates() {
        let user = User::new(sample_new_user("111", "R-1", "a@example.com"), "secret-hash".into());
        let json = serde_json::to_value(&user).unwrap();

        assert!(json.get("passwordHash").is_none());
        assert!(!json.to_string().contains("secret-hash"));
        assert_eq!(json["dateOfBirth"], "1990-04-15");
        assert_eq!(json["status"], "PENDING");
        assert_eq!(json["nationalId"], "111");
    }

    #[test]
    fn iso_date_parsing() {
        assert_eq!(
            parse_iso_date("2001-12-31").unwrap(),
            time::macros::date!(2001 - 12 - 31)
        );
        assert!(parse_iso_date("31/12/2001").is_err());
        assert!(parse_iso_date("2001-13-01").is_err());
        assert!(parse_iso_date("").is_err());
        assert!(parse_iso_date("2001-02-30").is_err());
        assert!(parse_iso_date("1990-1-01").is_err());
        assert!(parse_iso_date("+1990-01-01").is_err());
        assert!(parse_iso_date("-1990-01-01").is_err());
        assert!(parse_iso_date(" 1990-01-01 ").is_err());
        assert!(parse_iso_date("1990-01-01\n").is_err());
        assert!(parse_iso_date("0000-01-01").is_err());
        assert_eq!(
            parse_iso_date("0001-01-01").unwrap(),
            time::macros::date!(0001 - 01 - 01)
        );
    }
}
