use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use super::{
    cookie::extract_session_token,
    jwt::{Claims, SessionKeys},
};
use crate::error::AppError;

/// Verified session claims of the caller.
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_session_token(&parts.headers).ok_or(AppError::Unauthorized)?;

        let keys = SessionKeys::from_ref(state);
        let claims = keys.verify(&token).map_err(|_| {
            warn!("invalid or expired session token");
            AppError::Unauthorized
        })?;

        Ok(AuthUser(claims))
    }
}
