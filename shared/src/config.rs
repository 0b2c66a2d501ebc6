use anyhow::{Context, Result};
use std::env;

#[derive(Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub mailer: MailerConfig,
    pub queue: QueueConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        Ok(Self {
            database: DatabaseConfig::from_env()?,
            mailer: MailerConfig::from_env()?,
            queue: QueueConfig::from_env()?,
        })
    }
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl DatabaseConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("DATABASE_HOST").context("DATABASE_HOST is not set")?,
            port: env::var("DATABASE_PORT")
                .context("DATABASE_PORT is not set")?
                .parse()
                .context("DATABASE_PORT must be a port number")?,
            username: env::var("DATABASE_USERNAME").context("DATABASE_USERNAME is not set")?,
            password: env::var("DATABASE_PASSWORD").context("DATABASE_PASSWORD is not set")?,
            database: env::var("DATABASE_NAME").context("DATABASE_NAME is not set")?,
        })
    }
}

/// Settings for the HTTP mail API the notification worker delivers through.
#[derive(Clone)]
pub struct MailerConfig {
    pub endpoint: String,
    pub token: String,
    pub sender: String,
}

impl MailerConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            endpoint: env::var("MAILER_ENDPOINT").context("MAILER_ENDPOINT is not set")?,
            token: env::var("MAILER_TOKEN").context("MAILER_TOKEN is not set")?,
            sender: env::var("MAILER_SENDER").context("MAILER_SENDER is not set")?,
        })
    }
}

/// Retry policy and polling cadence for the notification queue.
#[derive(Clone)]
pub struct QueueConfig {
    pub max_attempts: i32,
    pub retry_interval_secs: u64,
    pub poll_interval_secs: u64,
}

impl QueueConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            max_attempts: optional_var("QUEUE_MAX_ATTEMPTS")?.unwrap_or(5),
            retry_interval_secs: optional_var("QUEUE_RETRY_INTERVAL_SECS")?.unwrap_or(30),
            poll_interval_secs: optional_var("QUEUE_POLL_INTERVAL_SECS")?.unwrap_or(10),
        })
    }
}

fn optional_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Err(_) => Ok(None),
        Ok(v) => v
            .parse()
            .map(Some)
            .with_context(|| format!("{name} has an invalid value")),
    }
}
