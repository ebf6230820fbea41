// src/error.rs
use chrono::NaiveDate;
use thiserror::Error;

/// Failures that end the current display pass.
///
/// Missing fundamentals and zero denominators are not errors; they surface as
/// `Metric::Unavailable` instead.
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("No data found for {ticker} between {start} and {end}. Please check the ticker symbol.")]
    NoData {
        ticker: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Invalid ticker symbol: {0}")]
    InvalidTicker(String),

    #[error("Unknown industry: {0}")]
    UnknownIndustry(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DashboardError {
    pub fn upstream<S: Into<String>>(message: S) -> Self {
        DashboardError::Upstream(message.into())
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(e: serde_json::Error) -> Self {
        DashboardError::Upstream(format!("Malformed response: {}", e))
    }
}

pub type DashboardResult<T> = Result<T, DashboardError>;
