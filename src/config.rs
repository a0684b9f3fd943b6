use anyhow::{Context, Result};
use compute::OverflowScope;
use config::{builder::DefaultState, Config, ConfigBuilder, Environment};
use sea_orm::Database;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::auth::TokenKeys;
use crate::schemas::AppState;

/// Database used when neither `DATABASE_URL` nor `POSTGRES_DB` is set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://budgeteer.db?mode=rwc";

/// Application settings, read from the process environment.
///
/// Every field maps to the upper-cased environment variable of the same
/// name, e.g. `secret_key` is read from `SECRET_KEY`.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: Option<String>,
    pub postgres_db: Option<String>,
    pub postgres_user: Option<String>,
    pub postgres_password: Option<String>,
    #[serde(default = "default_database_host")]
    pub database_host: String,
    #[serde(default = "default_database_port")]
    pub database_port: u16,
    pub secret_key: Option<String>,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: i64,
    #[serde(default = "default_overflow_scope")]
    pub recurrence_overflow_scope: String,
}

fn default_database_host() -> String {
    "localhost".to_string()
}

fn default_database_port() -> u16 {
    5432
}

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_token_ttl_minutes() -> i64 {
    720
}

fn default_overflow_scope() -> String {
    OverflowScope::default().to_string()
}

impl Settings {
    /// Loads `.env` if present, then reads the environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_builder(
            Config::builder().add_source(Environment::default().try_parsing(true)),
        )
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Resolves the connection string.
    ///
    /// An explicit `DATABASE_URL` wins; otherwise a PostgreSQL URL is
    /// composed when `POSTGRES_DB` is set; otherwise a local SQLite file.
    /// User and password are percent-encoded in the composed URL.
    pub fn database_url(&self) -> String {
        if let Some(url) = self.database_url.as_deref().filter(|url| !url.trim().is_empty()) {
            return url.to_string();
        }

        match self.postgres_db.as_deref().filter(|name| !name.trim().is_empty()) {
            Some(name) => format!(
                "postgres://{}:{}@{}:{}/{}",
                urlencoding::encode(self.postgres_user.as_deref().unwrap_or("postgres")),
                urlencoding::encode(self.postgres_password.as_deref().unwrap_or_default()),
                self.database_host,
                self.database_port,
                name
            ),
            None => DEFAULT_DATABASE_URL.to_string(),
        }
    }

    /// Command line flags take precedence over the environment.
    pub fn apply_overrides(&mut self, database_url: Option<String>, bind_address: Option<String>) {
        if let Some(url) = database_url {
            self.database_url = Some(url);
        }
        if let Some(address) = bind_address {
            self.bind_address = address;
        }
    }

    pub fn overflow_scope(&self) -> Result<OverflowScope> {
        self.recurrence_overflow_scope
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
            .context("Invalid RECURRENCE_OVERFLOW_SCOPE")
    }

    /// The token signing secret. Serving without one is refused.
    pub fn require_secret_key(&self) -> Result<&str> {
        self.secret_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .context("SECRET_KEY must be set to sign authentication tokens")
    }
}

/// Connects to the database and assembles the shared handler state.
pub async fn initialize_app_state(settings: &Settings) -> Result<AppState> {
    let secret = settings.require_secret_key()?;
    let overflow_scope = settings.overflow_scope()?;
    let database_url = settings.database_url();

    info!("Connecting to database");
    debug!("Database URL: {}", redact_password(&database_url));
    let db = Database::connect(&database_url)
        .await
        .with_context(|| format!("Failed to connect to {}", redact_password(&database_url)))?;

    debug!(
        "Tokens expire after {} minutes, overflow scope is {}",
        settings.token_ttl_minutes, overflow_scope
    );
    Ok(AppState {
        db,
        auth: Arc::new(TokenKeys::new(secret.as_bytes(), settings.token_ttl_minutes)),
        overflow_scope,
    })
}

/// Hides the password part of a connection URL for logging.
fn redact_password(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    match rest.split_once('@') {
        Some((credentials, host)) => {
            let user = credentials.split(':').next().unwrap_or_default();
            format!("{}://{}:***@{}", scheme, user, host)
        }
        None => url.to_string(),
    }
}
