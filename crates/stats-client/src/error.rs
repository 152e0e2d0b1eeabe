use thiserror::Error;

pub type Result<T> = std::result::Result<T, StatsClientError>;

#[derive(Error, Debug)]
pub enum StatsClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Stats server responded with {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}
