use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub stats_server_url: String,
    pub api_keys: String,
    pub trusted_proxies: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: std::env::var("HOST").context("Cannot load HOST env variable")?,
            port: std::env::var("PORT")
                .context("Cannot load PORT env variable")?
                .parse()
                .context("PORT must be a number")?,
            database_url: std::env::var("DATABASE_URL")
                .context("Cannot load DATABASE_URL env variable")?,
            stats_server_url: std::env::var("STATS_SERVER_URL")
                .context("Cannot load STATS_SERVER_URL env variable")?,
            api_keys: std::env::var("API_KEYS").unwrap_or_default(),
            trusted_proxies: std::env::var("TRUSTED_PROXIES").unwrap_or_default(),
        })
    }
}
