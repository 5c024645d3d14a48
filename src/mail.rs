use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, instrument};

use crate::config::MailConfig;

pub const RESET_SUBJECT: &str = "Redefinição de senha - Essenza";

/// Outbound email delivery.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()>;
}

/// SendGrid v3 `mail/send` client.
#[derive(Clone)]
pub struct SendGridMailer {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl SendGridMailer {
    pub fn new(cfg: &MailConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_url: cfg.api_url.clone(),
            api_key: cfg.api_key.clone(),
            from: cfg.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    #[instrument(skip(self, html))]
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()> {
        let payload = json!({
            "personalizations": [{ "to": [{ "email": to }] }],
            "from": { "email": self.from },
            "subject": subject,
            "content": [{ "type": "text/html", "value": html }],
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("{} - {}, {}", self.api_url, status, body));
        }
        debug!(%status, "email accepted");
        Ok(())
    }
}

pub fn reset_link(app_url: &str, token: &str, user_id: i64) -> String {
    format!(
        "{}/reset-password?token={}&uid={}",
        app_url.trim_end_matches('/'),
        token,
        user_id
    )
}

pub fn reset_email_html(link: &str, ttl_minutes: i64) -> String {
    format!(
        r#"<div style="font-family:Arial,sans-serif;line-height:1.5;color:#111"> <p>Você solicitou a redefinição de senha.</p> <p>Clique no link (expira em {ttl_minutes} minutos): <a href="{link}">{link}</a></p> <p>Se não foi você, ignore este e-mail.</p> </div>"#
    )
}
