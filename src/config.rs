use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

const MIB: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    /// Per-file cap for `file` and `pdf` parts.
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://courses.db".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            max_connections: 5,
            max_upload_bytes: 100 * MIB,
        }
    }
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let database_url = env::var("DATABASE_URL").unwrap_or(defaults.database_url);
        let bind_addr = parse_value("BIND_ADDR", env::var("BIND_ADDR").ok(), defaults.bind_addr)?;
        let max_connections = parse_value(
            "DB_MAX_CONNECTIONS",
            env::var("DB_MAX_CONNECTIONS").ok(),
            defaults.max_connections,
        )?;
        let max_upload_mb = parse_value(
            "MAX_UPLOAD_MB",
            env::var("MAX_UPLOAD_MB").ok(),
            defaults.max_upload_bytes / MIB,
        )?;

        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
            max_upload_bytes: max_upload_mb.saturating_mul(MIB),
        })
    }

    /// Whole-request cap: a video, an assignment and room for the text fields.
    pub fn body_limit(&self) -> usize {
        self.max_upload_bytes
            .saturating_mul(2)
            .saturating_add(MIB)
    }
}

fn parse_value<T: FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
