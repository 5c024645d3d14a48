use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use time::OffsetDateTime;

use crate::auth::repo_types::{NewUser, User};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint (email or cpf) rejected the write.
    #[error("duplicate user")]
    Duplicate,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate,
            _ => StoreError::Other(e.into()),
        }
    }
}

/// Persistence for user records and their reset-token fields.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_email_or_cpf(&self, email: &str, cpf: &str) -> anyhow::Result<Option<User>>;
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;
    /// Replaces any previous reset token.
    async fn set_reset_token(
        &self,
        id: i64,
        token: &str,
        expires: OffsetDateTime,
    ) -> anyhow::Result<()>;
    /// Writes the new hash and clears both reset fields in one step, but only
    /// while `token` is still the stored, unexpired token. Returns whether a row changed.
    async fn consume_reset_token(
        &self,
        id: i64,
        token: &str,
        password_hash: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<bool>;
}

const USER_COLUMNS: &str =
    "id, name, email, cpf, birth, password_hash, reset_token, reset_expires, created_at";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_email_or_cpf(&self, email: &str, cpf: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 OR cpf = $2 LIMIT 1"
        ))
        .bind(email)
        .bind(cpf)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, cpf, birth, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.cpf)
        .bind(user.birth)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await?;
        Ok(created)
    }

    async fn set_reset_token(
        &self,
        id: i64,
        token: &str,
        expires: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET reset_token = $2, reset_expires = $3 WHERE id = $1")
            .bind(id)
            .bind(token)
            .bind(expires)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        id: i64,
        token: &str,
        password_hash: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $3, reset_token = NULL, reset_expires = NULL
            WHERE id = $1 AND reset_token = $2 AND reset_expires > $4
            "#,
        )
        .bind(id)
        .bind(token)
        .bind(password_hash)
        .bind(now)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
