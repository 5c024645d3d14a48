use anyhow::Context;

pub const DEFAULT_APP_URL: &str = "http://localhost:5173";
pub const SENDGRID_API_URL: &str = "https://api.sendgrid.com/v3/mail/send";

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_key: String,
    pub from: String,
    pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    /// Base URL of the frontend; reset links point at `{app_url}/reset-password`.
    pub app_url: String,
    pub front_origin: String,
    pub reset_ttl_minutes: i64,
    /// Marks the session cookie `Secure`; on in production only.
    pub cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = required("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: required("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "essenza".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "essenza-users".into()),
            ttl_minutes: minutes("JWT_TTL_MINUTES", 15),
        };
        let mail = MailConfig {
            api_key: required("SENDGRID_API_KEY")?,
            from: required("SENDGRID_FROM")?,
            api_url: std::env::var("SENDGRID_API_URL").unwrap_or_else(|_| SENDGRID_API_URL.into()),
        };
        let cookie_secure = std::env::var("APP_ENV")
            .map(|v| v == "production")
            .unwrap_or(false);

        Ok(Self {
            database_url,
            jwt,
            mail,
            app_url: std::env::var("APP_URL").unwrap_or_else(|_| DEFAULT_APP_URL.into()),
            front_origin: std::env::var("FRONT_ORIGIN").unwrap_or_else(|_| DEFAULT_APP_URL.into()),
            reset_ttl_minutes: minutes(
                "RESET_TTL_MINUTES",
                crate::auth::reset::DEFAULT_RESET_TTL_MINUTES,
            ),
            cookie_secure,
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    std::env::var(key).with_context(|| format!("missing environment variable {key}"))
}

fn minutes(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}
