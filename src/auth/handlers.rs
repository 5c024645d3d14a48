use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        cookie::{clear_session_cookie, session_cookie},
        dto::{
            AuthResponse, ForgotPasswordRequest, LoginRequest, MeResponse, OkResponse,
            ResetPasswordRequest, SignupRequest,
        },
        extractors::AuthUser,
        jwt::SessionKeys,
        services::{self, Session},
    },
    error::{AppError, MSG_LOGIN_FIELDS, MSG_MISSING_FIELDS, MSG_RESET_FIELDS},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>, message: &'static str) -> Result<T, AppError> {
    payload.map(|Json(v)| v).map_err(|e| {
        warn!(error = %e, "rejected request body");
        AppError::InvalidInput(message)
    })
}

fn session_headers(state: &AppState, token: &str) -> Result<HeaderMap, AppError> {
    let ttl = SessionKeys::new(&state.config.jwt).ttl();
    let cookie = session_cookie(token, ttl, state.config.cookie_secure)
        .map_err(|e| AppError::Internal(e.into()))?;
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    Ok(headers)
}

fn auth_response(state: &AppState, session: Session) -> Result<(HeaderMap, Json<AuthResponse>), AppError> {
    let headers = session_headers(state, &session.token)?;
    Ok((
        headers,
        Json(AuthResponse {
            user: session.user.into(),
            token: session.token,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, HeaderMap, Json<AuthResponse>), AppError> {
    let req = body(payload, MSG_MISSING_FIELDS)?;
    let session = services::signup(&state, req).await?;
    let (headers, json) = auth_response(&state, session)?;
    Ok((StatusCode::CREATED, headers, json))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(HeaderMap, Json<AuthResponse>), AppError> {
    let req = body(payload, MSG_LOGIN_FIELDS)?;
    let session = services::login(&state, req).await?;
    auth_response(&state, session)
}

pub async fn logout(State(state): State<AppState>) -> (HeaderMap, Json<OkResponse>) {
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, clear_session_cookie(state.config.cookie_secure));
    (headers, Json(OkResponse::ok()))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    payload: Result<Json<ForgotPasswordRequest>, JsonRejection>,
) -> Json<OkResponse> {
    let req = payload.map(|Json(v)| v).unwrap_or_default();
    services::forgot_password(&state, req).await;
    Json(OkResponse::ok())
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, AppError> {
    let req = body(payload, MSG_RESET_FIELDS)?;
    services::reset_password(&state, req).await?;
    Ok(Json(OkResponse::ok()))
}

#[instrument(skip(state, claims))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<MeResponse>, AppError> {
    let user = services::current_user(&state, &claims).await?;
    Ok(Json(MeResponse { user: user.into() }))
}
