use crate::auth::repo::{PgUserStore, UserStore};
use crate::config::AppConfig;
use crate::mail::{Mailer, SendGridMailer};
use anyhow::Context;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub mailer: Arc<dyn Mailer>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;

        let users = Arc::new(PgUserStore::new(db)) as Arc<dyn UserStore>;
        let mailer =
            Arc::new(SendGridMailer::new(&config.mail).context("build mail client")?) as Arc<dyn Mailer>;

        Ok(Self::from_parts(users, mailer, config))
    }

    pub fn from_parts(
        users: Arc<dyn UserStore>,
        mailer: Arc<dyn Mailer>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            users,
            mailer,
            config,
        }
    }
}
