use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    /// Base URL of the hosted data store, e.g. `https://xyz.example.co`.
    pub store_url: String,
    /// Public (anon) API key sent with every store request.
    pub store_anon_key: String,
    /// Secret the data store signs user access tokens with.
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub store_timeout_secs: Option<u64>,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            store_url: get_env("STORE_URL")?,
            store_anon_key: get_env("STORE_ANON_KEY")?,
            jwt_secret: get_env("JWT_SECRET")?,
            jwt_audience: env::var("JWT_AUDIENCE").unwrap_or_else(|_| "authenticated".to_string()),
            store_timeout_secs: positive_secs(
                "STORE_TIMEOUT_SECS",
                get_env_parse_opt("STORE_TIMEOUT_SECS")?,
            )?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse_opt<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        _ => Ok(None),
    }
}

// A zero timeout would fail every store call immediately.
fn positive_secs(name: &str, value: Option<u64>) -> Result<Option<u64>> {
    match value {
        Some(0) => Err(Error::Config(format!("{} must be at least 1 second", name))),
        other => Ok(other),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
