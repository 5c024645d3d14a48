use sqlx::FromRow;
use time::{Date, OffsetDateTime};

/// User record in the database. Never serialized directly; see `PublicUser`.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub cpf: String, // digits only
    pub birth: Date,
    pub password_hash: String, // Argon2 PHC string
    pub reset_token: Option<String>,
    pub reset_expires: Option<OffsetDateTime>, // set iff reset_token is set
    pub created_at: OffsetDateTime,
}

/// Validated signup data ready for insertion.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub cpf: String,
    pub birth: Date,
    pub password_hash: String,
}
