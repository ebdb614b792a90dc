use serde::{Deserialize, Serialize};
use time::Date;

use crate::users::ports::Registration;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub national_id: String,
    pub title: String,
    pub reg_number: String,
    pub department: String,
    pub email: String,
    pub phone: String,
    pub sex: String,
    pub date_of_birth: String, // YYYY-MM-DD
    pub password: String,
}

impl RegisterRequest {
    pub fn into_registration(self, date_of_birth: Date) -> Registration {
        Registration {
            name: self.name,
            national_id: self.national_id,
            title: self.title,
            reg_number: self.reg_number,
            department: self.department,
            email: self.email,
            phone: self.phone,
            sex: self.sex,
            date_of_birth,
            password: self.password,
        }
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}
