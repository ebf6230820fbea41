// src/handlers/mod.rs
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::config::Config;
use crate::services::market_data::MarketDataProvider;
use crate::services::tickers::TickerListProvider;
use self::error::ApiError;

pub mod error;
pub mod group;
pub mod stock;
pub mod tickers;

/// Shared collaborators handed to every handler.
pub struct AppState {
    pub provider: Arc<dyn MarketDataProvider>,
    pub ticker_lists: Arc<dyn TickerListProvider>,
    pub config: Config,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Fill in the configured start date and today. `end >= start` is not checked.
    pub fn resolve(&self, config: &Config) -> (NaiveDate, NaiveDate) {
        let start = self.start.unwrap_or(config.default_start_date);
        let end = self.end.unwrap_or_else(|| Utc::now().date_naive());
        (start, end)
    }
}

/// Percent-decode a ticker path segment (`%5EGSPC` -> `^GSPC`).
pub fn decode_ticker(segment: &str) -> Result<String, ApiError> {
    urlencoding::decode(segment)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| ApiError::bad_request(format!("Ticker is not valid UTF-8: {}", e)))
}

pub fn validate_wacc(wacc: f64) -> Result<f64, ApiError> {
    if wacc.is_finite() && (0.0..=100.0).contains(&wacc) {
        Ok(wacc)
    } else {
        Err(ApiError::bad_request(format!("wacc must be a percentage between 0 and 100, got {}", wacc)))
    }
}
