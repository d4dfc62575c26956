use once_cell::sync::Lazy;
use std::env;
use std::net::SocketAddr;
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_BODY_LIMIT_BYTES: u64 = 16 * 1024;

#[derive(Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{0} is invalid: {1}")]
    Invalid(&'static str, String),
}

#[derive(Debug, Clone)]
pub struct Config {
    database_url: String,
    bind_addr: SocketAddr,
    db_max_connections: u32,
    body_limit_bytes: u64,
    otel_stdout: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let bind_addr = parse_or(&lookup, "BIND_ADDR", DEFAULT_BIND_ADDR.parse().ok())?;
        let db_max_connections =
            parse_or(&lookup, "DB_MAX_CONNECTIONS", Some(DEFAULT_DB_MAX_CONNECTIONS))?;
        let body_limit_bytes =
            parse_or(&lookup, "BODY_LIMIT_BYTES", Some(DEFAULT_BODY_LIMIT_BYTES))?;
        let otel_stdout = parse_or(&lookup, "OTEL_STDOUT", Some(false))?;

        if db_max_connections == 0 {
            return Err(ConfigError::Invalid(
                "DB_MAX_CONNECTIONS",
                "must be at least 1".to_owned(),
            ));
        }

        Ok(Config {
            database_url,
            bind_addr,
            db_max_connections,
            body_limit_bytes,
            otel_stdout,
        })
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
    }

    pub fn body_limit_bytes(&self) -> u64 {
        self.body_limit_bytes
    }

    pub fn otel_stdout(&self) -> bool {
        self.otel_stdout
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: Option<T>) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(key, raw.clone())),
        None => default.ok_or(ConfigError::Missing(key)),
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv::dotenv().ok();
    match Config::from_env() {
        Ok(config) => config,
        Err(e) => panic!("Invalid configuration: {}", e),
    }
});
