use std::env;

use anyhow::Context;

pub const DEFAULT_PORT: u16 = 5000;

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// MongoDB connection string. Required.
    pub mongodb_uri: String,
    /// Database name; falls back to the database named in the URI path.
    pub mongodb_database: Option<String>,
    /// Listening port.
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let mongodb_uri =
            env::var("MONGODB_URI").context("MONGODB_URI is missing from the environment")?;
        let mongodb_database = env::var("MONGODB_DATABASE").ok();
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Ok(Self {
            mongodb_uri,
            mongodb_database,
            port,
        })
    }
}
