use lazy_static::lazy_static;
use regex::Regex;
use time::{macros::format_description, Date, OffsetDateTime};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, SignupRequest},
        jwt::{Claims, SessionKeys},
        password::{hash_password, verify_password},
        repo::StoreError,
        repo_types::{NewUser, User},
        reset::{check_reset, new_reset_token, reset_expiry},
    },
    error::{
        AppError, MSG_INVALID_BIRTH, MSG_INVALID_CPF, MSG_INVALID_EMAIL, MSG_LOGIN_FIELDS,
        MSG_MISSING_FIELDS, MSG_RESET_FIELDS,
    },
    mail::{reset_email_html, reset_link, RESET_SUBJECT},
    state::AppState,
};

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    // Verified against when the email is unknown so both login failures cost the same.
    static ref DUMMY_HASH: String = hash_password("essenza-timing-equalizer").unwrap_or_default();
}

/// A freshly authenticated user and the session token issued for them.
#[derive(Debug)]
pub struct Session {
    pub user: User,
    pub token: String,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Strip everything but digits: "111.222.333-44" -> "11122233344".
pub(crate) fn normalize_cpf(cpf: &str) -> String {
    cpf.chars().filter(char::is_ascii_digit).collect()
}

pub(crate) fn parse_birth(birth: &str) -> Option<Date> {
    Date::parse(birth.trim(), format_description!("[year]-[month]-[day]")).ok()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Passwords are taken verbatim; only an empty string counts as missing.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn issue_session(state: &AppState, user: User) -> Result<Session, AppError> {
    let keys = SessionKeys::new(&state.config.jwt);
    let token = keys.issue(user.id, &user.email).map_err(|e| {
        error!(error = %e, "session token signing failed");
        AppError::Internal(e)
    })?;
    Ok(Session { user, token })
}

#[instrument(skip(state, req))]
pub async fn signup(state: &AppState, req: SignupRequest) -> Result<Session, AppError> {
    let (Some(name), Some(cpf), Some(birth), Some(email), Some(password)) = (
        non_blank(req.name),
        non_blank(req.cpf),
        non_blank(req.birth),
        non_blank(req.email),
        present(req.password),
    ) else {
        warn!("signup missing fields");
        return Err(AppError::InvalidInput(MSG_MISSING_FIELDS));
    };

    let email = normalize_email(&email);
    if !is_valid_email(&email) {
        warn!(email = %email, "signup invalid email");
        return Err(AppError::InvalidInput(MSG_INVALID_EMAIL));
    }

    let cpf = normalize_cpf(&cpf);
    if cpf.is_empty() {
        warn!("signup cpf without digits");
        return Err(AppError::InvalidInput(MSG_INVALID_CPF));
    }

    let birth = parse_birth(&birth).ok_or_else(|| {
        warn!("signup invalid birth date");
        AppError::InvalidInput(MSG_INVALID_BIRTH)
    })?;

    if state.users.find_by_email_or_cpf(&email, &cpf).await?.is_some() {
        warn!(email = %email, "email or cpf already registered");
        return Err(AppError::Conflict);
    }

    let password_hash = hash_password(&password)?;

    let new_user = NewUser {
        name: name.trim().to_string(),
        email,
        cpf,
        birth,
        password_hash,
    };
    let user = match state.users.create(new_user).await {
        Ok(u) => u,
        Err(StoreError::Duplicate) => {
            warn!("unique constraint hit on insert");
            return Err(AppError::Conflict);
        }
        Err(StoreError::Other(e)) => {
            error!(error = %e, "create user failed");
            return Err(AppError::Internal(e));
        }
    };

    info!(user_id = user.id, email = %user.email, "user registered");
    issue_session(state, user)
}

#[instrument(skip(state, req))]
pub async fn login(state: &AppState, req: LoginRequest) -> Result<Session, AppError> {
    let (Some(email), Some(password)) = (non_blank(req.email), present(req.password)) else {
        return Err(AppError::InvalidInput(MSG_LOGIN_FIELDS));
    };
    let email = normalize_email(&email);

    let user = match state.users.find_by_email(&email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            let _ = verify_password(&password, &DUMMY_HASH);
            warn!("login unknown email");
            return Err(AppError::InvalidCredentials);
        }
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err(AppError::Internal(e));
        }
    };

    if !verify_password(&password, &user.password_hash)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    info!(user_id = user.id, "user logged in");
    issue_session(state, user)
}

/// Never fails: the caller answers `{ok: true}` whatever happens here.
#[instrument(skip(state, req))]
pub async fn forgot_password(state: &AppState, req: ForgotPasswordRequest) {
    let Some(email) = non_blank(req.email) else {
        return;
    };
    let email = normalize_email(&email);

    let user = match state.users.find_by_email(&email).await {
        Ok(Some(u)) => u,
        Ok(None) => return,
        Err(e) => {
            error!(error = %e, "find_by_email failed during forgot-password");
            return;
        }
    };

    let ttl_minutes = state.config.reset_ttl_minutes;
    let token = new_reset_token();
    let expires = reset_expiry(ttl_minutes);
    if let Err(e) = state.users.set_reset_token(user.id, &token, expires).await {
        error!(error = %e, user_id = user.id, "storing reset token failed");
        return;
    }

    let link = reset_link(&state.config.app_url, &token, user.id);
    let html = reset_email_html(&link, ttl_minutes);
    match state.mailer.send(&user.email, RESET_SUBJECT, &html).await {
        Ok(()) => info!(user_id = user.id, "reset email sent"),
        Err(e) => warn!(error = %e, user_id = user.id, "reset email failed"),
    }
}

#[instrument(skip(state, req))]
pub async fn reset_password(state: &AppState, req: ResetPasswordRequest) -> Result<(), AppError> {
    let (Some(id), Some(token), Some(password)) = (
        req.uid.as_ref().and_then(|u| u.as_id()),
        non_blank(req.token),
        present(req.password),
    ) else {
        return Err(AppError::InvalidInput(MSG_RESET_FIELDS));
    };

    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or(AppError::InvalidOrExpired)?;

    let now = OffsetDateTime::now_utc();
    if let Err(e) = check_reset(&user, &token, now) {
        warn!(user_id = id, "reset link invalid or expired");
        return Err(e);
    }

    let password_hash = hash_password(&password)?;
    if !state
        .users
        .consume_reset_token(id, &token, &password_hash, now)
        .await?
    {
        warn!(user_id = id, "reset token consumed concurrently");
        return Err(AppError::InvalidOrExpired);
    }

    info!(user_id = id, "password reset");
    Ok(())
}

#[instrument(skip(state, claims), fields(user_id = claims.sub))]
pub async fn current_user(state: &AppState, claims: &Claims) -> Result<User, AppError> {
    state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or(AppError::NotFound)
}
