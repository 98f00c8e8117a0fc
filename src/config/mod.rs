//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Maximum number of live entities in the arena
    pub max_players: usize,
    /// Seed for world generation (random when unset)
    pub world_seed: Option<u64>,
    /// Sessions with no input for this long are evicted
    pub idle_timeout_secs: u64,

    /// Allowed client origin for CORS ("*" allows any)
    pub client_origin: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            max_players: parse_var("MAX_PLAYERS", 32)?,
            world_seed: match env::var("WORLD_SEED") {
                Ok(raw) => Some(raw.parse().map_err(|_| ConfigError::InvalidNumber("WORLD_SEED"))?),
                Err(_) => None,
            },
            idle_timeout_secs: parse_var("IDLE_TIMEOUT_SECS", 60)?,

            client_origin: env::var("CLIENT_ORIGIN").unwrap_or_else(|_| "*".to_string()),
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidNumber(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server address format")]
    InvalidAddress,

    #[error("Invalid numeric value for environment variable: {0}")]
    InvalidNumber(&'static str),
}
