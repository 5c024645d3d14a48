use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub const MSG_MISSING_FIELDS: &str = "Campos obrigatórios ausentes.";
pub const MSG_INVALID_BIRTH: &str = "Data de nascimento inválida.";
pub const MSG_INVALID_EMAIL: &str = "Email inválido.";
pub const MSG_INVALID_CPF: &str = "CPF inválido.";
pub const MSG_LOGIN_FIELDS: &str = "Email e senha são obrigatórios.";
pub const MSG_RESET_FIELDS: &str = "Dados inválidos.";

/// Errors surfaced by the auth handlers.
///
/// Messages for credential and reset failures are fixed strings: they must not
/// vary with the reason, otherwise callers could probe which accounts exist.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(&'static str),

    #[error("Email ou CPF já cadastrado.")]
    Conflict,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Link inválido ou expirado.")]
    InvalidOrExpired,

    #[error("Not found")]
    NotFound,

    #[error("Erro interno.")]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) | AppError::InvalidOrExpired => StatusCode::BAD_REQUEST,
            AppError::Conflict => StatusCode::CONFLICT,
            AppError::Unauthorized | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(cause) = &self {
            error!(error = %cause, "internal error");
        }
        let body = ErrorBody {
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
