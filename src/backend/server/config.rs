/**
 * Server Configuration
 *
 * This module loads the service configuration from the environment and
 * opens the SQLite database that backs the key/lock registry, the remote
 * health cache and the version ledger.
 *
 * # Configuration Sources
 *
 * Values come from environment variables (a `.env` file is loaded first by
 * `main`), with development defaults where a safe one exists.
 *
 * | Variable | Default |
 * |----------|---------|
 * | `SERVER_PORT` | `3000` |
 * | `DATABASE_URL` | `sqlite://docbridge.db?mode=rwc` |
 * | `DOCBRIDGE_INSTANCE_ID` | `docbridge` |
 * | `DOCBRIDGE_SECRET` | development secret (warns) |
 * | `DOCBRIDGE_STORAGE_URL` | `http://127.0.0.1:<port>` |
 * | `DOCBRIDGE_ENGINE_URL` | `http://127.0.0.1:8080` (warns) |
 * | `DOCBRIDGE_ENGINE_INTERNAL_URL` | unset |
 * | `DOCBRIDGE_ENGINE_SECRET` | unset (unsigned) |
 * | `DOCBRIDGE_ENGINE_JWT_HEADER` | `Authorization` |
 * | `DOCBRIDGE_ENGINE_VERIFY_PEER` | `true` |
 * | `DOCBRIDGE_ENGINE_TIMEOUT` | `60` seconds |
 * | `DOCBRIDGE_ENGINE_CONVERT_TIMEOUT` | `120` seconds |
 * | `DOCBRIDGE_VERSION_HISTORY` | `true` |
 *
 * # Database
 *
 * The registry must be durable and shared between workers, so a database
 * failure stops startup.
 */

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::shared::{ConfigError, ServiceConfig};

/// Everything `main` needs to start the server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: String,
    pub service: ServiceConfig,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
    env_var(name).map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

fn env_secs(name: &str) -> Option<Duration> {
    env_var(name)
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Load the configuration from environment variables
pub fn load_config() -> Result<ServerConfig, ConfigError> {
    let port = env_var("SERVER_PORT")
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3000);

    let database_url = env_var("DATABASE_URL").unwrap_or_else(|| "sqlite://docbridge.db?mode=rwc".to_string());

    let host_secret = env_var("DOCBRIDGE_SECRET").unwrap_or_else(|| {
        tracing::warn!("DOCBRIDGE_SECRET not set. Using a development secret for session tokens.");
        "docbridge-development-secret-change-me".to_string()
    });

    let engine_url = env_var("DOCBRIDGE_ENGINE_URL").unwrap_or_else(|| {
        tracing::warn!("DOCBRIDGE_ENGINE_URL not set. Assuming a Docs engine on http://127.0.0.1:8080");
        "http://127.0.0.1:8080".to_string()
    });

    let mut builder = ServiceConfig::builder()
        .instance_id(env_var("DOCBRIDGE_INSTANCE_ID").unwrap_or_else(|| "docbridge".to_string()))
        .host_secret(host_secret)
        .storage_url(env_var("DOCBRIDGE_STORAGE_URL").unwrap_or_else(|| format!("http://127.0.0.1:{}", port)))
        .engine_url(engine_url);

    if let Some(url) = env_var("DOCBRIDGE_ENGINE_INTERNAL_URL") {
        builder = builder.engine_internal_url(url);
    }
    if let Some(secret) = env_var("DOCBRIDGE_ENGINE_SECRET") {
        builder = builder.engine_secret(secret);
    } else {
        tracing::warn!("DOCBRIDGE_ENGINE_SECRET not set. Engine callbacks will not be authenticated.");
    }
    if let Some(header) = env_var("DOCBRIDGE_ENGINE_JWT_HEADER") {
        builder = builder.jwt_header(header);
    }
    if let Some(verify) = env_bool("DOCBRIDGE_ENGINE_VERIFY_PEER") {
        builder = builder.verify_peer(verify);
    }
    if let Some(timeout) = env_secs("DOCBRIDGE_ENGINE_TIMEOUT") {
        builder = builder.request_timeout(timeout);
    }
    if let Some(timeout) = env_secs("DOCBRIDGE_ENGINE_CONVERT_TIMEOUT") {
        builder = builder.convert_timeout(timeout);
    }
    if let Some(enabled) = env_bool("DOCBRIDGE_VERSION_HISTORY") {
        builder = builder.version_history(enabled);
    }

    Ok(ServerConfig {
        port,
        database_url,
        service: builder.build()?,
    })
}

/// Open the SQLite database and run migrations
///
/// The database file is created if missing and switched to WAL mode so
/// concurrent callbacks do not serialize on readers.
pub async fn load_database(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    tracing::info!("Connecting to database...");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!().run(&pool).await?;
    tracing::info!("Database ready");

    Ok(pool)
}

/// Open a private in-memory database with the schema applied
///
/// A single connection that never expires keeps the database alive for as
/// long as the pool.
pub async fn open_memory_database() -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    sqlx::migrate!().run(&pool).await?;
    Ok(pool)
}
