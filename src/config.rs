use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub database_max_connections: u32,
    pub rate_limit_rps: u32,
    /// Slack added to an attempt's duration before it counts as expired.
    pub attempt_grace_seconds: i64,
    /// Interval of the expiry sweeper; zero disables it.
    pub deadline_sweep_seconds: u64,
    pub log_format: LogFormat,
    /// Empty means any origin.
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            database_max_connections: get_env_parse_or("DATABASE_MAX_CONNECTIONS", 20)?,
            rate_limit_rps: get_env_parse_or("RATE_LIMIT_RPS", 20)?,
            attempt_grace_seconds: get_env_parse_or("ATTEMPT_GRACE_SECONDS", 30)?,
            deadline_sweep_seconds: get_env_parse_or("DEADLINE_SWEEP_SECONDS", 60)?,
            log_format: match env::var("LOG_FORMAT").ok().as_deref() {
                None | Some("") | Some("text") => LogFormat::Text,
                Some("json") => LogFormat::Json,
                Some(other) => {
                    return Err(Error::Config(format!(
                        "Invalid value for LOG_FORMAT: {}",
                        other
                    )))
                }
            },
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        _ => Ok(default),
    }
}
