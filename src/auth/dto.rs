use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::auth::repo_types::User;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Request body for signup. Fields are optional so that a missing field maps
/// to our own 400 instead of the extractor's rejection.
#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub cpf: Option<String>,
    pub birth: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetPasswordRequest {
    pub uid: Option<UserIdParam>,
    pub token: Option<String>,
    pub password: Option<String>,
}

/// Reset links carry the id as a query parameter, so clients may echo it
/// back either as a number or as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UserIdParam {
    Number(i64),
    Text(String),
}

impl UserIdParam {
    pub fn as_id(&self) -> Option<i64> {
        let id = match self {
            UserIdParam::Number(n) => *n,
            UserIdParam::Text(s) => s.trim().parse().ok()?,
        };
        (id > 0).then_some(id)
    }
}

/// Response returned after signup or login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: PublicUser,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

/// Public part of the user returned to the client. Password hash and reset
/// fields are left out on purpose.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub cpf: String,
    #[serde(with = "iso_date")]
    pub birth: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            cpf: user.cpf,
            birth: user.birth,
            created_at: user.created_at,
        }
    }
}
