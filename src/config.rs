use std::{env, net::SocketAddr, path::PathBuf};

use dotenvy::dotenv;
use thiserror::Error;

pub const DEFAULT_STORAGE_PATH: &str = "uploads";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be a number, got {value:?}")]
    NotANumber { name: &'static str, value: String },
    #[error("{name} must be a boolean, got {value:?}")]
    NotABool { name: &'static str, value: String },
    #[error("LOG_LEVEL {0:?} is not a tracing level")]
    LogLevel(String),
    #[error("invalid listen address {0:?}")]
    Address(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage_path: PathBuf,
    pub wipe_on_init: bool,
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub log_level: tracing::Level,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            wipe_on_init: false,
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            log_level: tracing::Level::INFO,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source; unset variables
    /// keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let log_level = match lookup("LOG_LEVEL") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::LogLevel(value.clone()))?,
            None => defaults.log_level,
        };

        Ok(Self {
            storage_path: lookup("STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_path),
            wipe_on_init: match lookup("STORAGE_WIPE_ON_INIT") {
                Some(value) => parse_bool("STORAGE_WIPE_ON_INIT", value)?,
                None => defaults.wipe_on_init,
            },
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_number("PORT", lookup("PORT"), defaults.port)?,
            max_upload_bytes: parse_number(
                "MAX_UPLOAD_BYTES",
                lookup("MAX_UPLOAD_BYTES"),
                defaults.max_upload_bytes,
            )?,
            log_level,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|_| ConfigError::Address(addr))
    }
}

fn parse_number<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::NotANumber { name, value }),
        None => Ok(default),
    }
}

fn parse_bool(name: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::NotABool { name, value }),
    }
}
