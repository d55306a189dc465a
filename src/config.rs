use serde::Serialize;

use crate::error::{config::ConfigError, AppError};

const DEFAULT_COMMAND_PREFIX: &str = "s.";
const DEFAULT_HEALTH_PORT: u16 = 8080;

/// Deployment environment the process is running in, detected from
/// hosting-provider environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Replit,
    Heroku,
    DigitalOcean,
    Production,
    Development,
}

impl Environment {
    /// Detects the deployment environment from well-known provider variables.
    ///
    /// Falls back to `Development` when nothing matches.
    pub fn detect() -> Self {
        if std::env::var("REPL_ID").is_ok() {
            Environment::Replit
        } else if std::env::var("DYNO").is_ok() {
            Environment::Heroku
        } else if std::env::var("DO_APP_NAME").is_ok() {
            Environment::DigitalOcean
        } else if std::env::var("NODE_ENV").as_deref() == Ok("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    /// Lowercase name used in logs and exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Replit => "replit",
            Environment::Heroku => "heroku",
            Environment::DigitalOcean => "digitalocean",
            Environment::Production => "production",
            Environment::Development => "development",
        }
    }
}

pub struct Config {
    pub database_url: String,
    pub discord_token: String,

    /// Zero-based index of this cluster within the deployment.
    pub cluster_id: u32,
    /// Total number of deployed cluster processes.
    pub total_clusters: u32,
    /// Total shard count across all clusters.
    pub total_shards: u32,

    pub command_prefix: String,
    pub health_port: u16,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?,
            discord_token: std::env::var("DISCORD_BOT_TOKEN")
                .map_err(|_| ConfigError::MissingEnvVar("DISCORD_BOT_TOKEN".to_string()))?,
            cluster_id: parse_env_or("CLUSTER_ID", 0)?,
            total_clusters: parse_env_or("TOTAL_CLUSTERS", 1)?,
            total_shards: parse_env_or("TOTAL_SHARDS", 1)?,
            command_prefix: std::env::var("COMMAND_PREFIX")
                .unwrap_or_else(|_| DEFAULT_COMMAND_PREFIX.to_string()),
            health_port: parse_env_or("HEALTH_PORT", DEFAULT_HEALTH_PORT)?,
            environment: Environment::detect(),
        })
    }
}

/// Parses an optional numeric environment variable, falling back to a default
/// when unset and failing loudly when set to garbage.
fn parse_env_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match std::env::var(name) {
        Ok(value) => value.parse::<T>().map_err(|_| {
            AppError::ConfigErr(ConfigError::InvalidEnvVar {
                name: name.to_string(),
                value,
            })
        }),
        Err(_) => Ok(default),
    }
}
