use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: std::env::var("STATS_HOST").context("Cannot load STATS_HOST env variable")?,
            port: std::env::var("STATS_PORT")
                .context("Cannot load STATS_PORT env variable")?
                .parse()
                .context("STATS_PORT must be a number")?,
            database_url: std::env::var("STATS_DATABASE_URL")
                .context("Cannot load STATS_DATABASE_URL env variable")?,
        })
    }
}
