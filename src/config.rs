// src/config.rs
use chrono::NaiveDate;
use log::{debug, info, warn};
use std::env;
use std::fmt::Display;
use std::fs;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{DashboardError, DashboardResult};
use crate::services::group::IndustryRosters;

pub const DEFAULT_PORT: u16 = 3030;
pub const DEFAULT_WACC_PERCENT: f64 = 8.0;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub yahoo_chart_url: String,
    pub yahoo_summary_url: String,
    pub yahoo_cookie_url: String,
    pub yahoo_crumb_url: String,
    pub constituents_url: String,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub default_wacc_percent: f64,
    pub default_start_date: NaiveDate,
    pub industry_rosters: IndustryRosters,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: DEFAULT_PORT,
            yahoo_chart_url: "https://query1.finance.yahoo.com/v8/finance/chart".to_string(),
            yahoo_summary_url: "https://query2.finance.yahoo.com/v10/finance/quoteSummary".to_string(),
            yahoo_cookie_url: "https://fc.yahoo.com".to_string(),
            yahoo_crumb_url: "https://query1.finance.yahoo.com/v1/test/getcrumb".to_string(),
            constituents_url: "https://en.wikipedia.org/wiki/List_of_S%26P_500_companies".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            request_timeout: Duration::from_secs(20),
            default_wacc_percent: DEFAULT_WACC_PERCENT,
            default_start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or(NaiveDate::MIN),
            industry_rosters: IndustryRosters::default(),
        }
    }
}

fn parse_var<T>(key: &str, default: T) -> DashboardResult<T>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| DashboardError::Config(format!("{} is invalid ({}): {}", key, raw, e))),
        Err(_) => {
            debug!("{} not set, defaulting to {}", key, default);
            Ok(default)
        }
    }
}

impl Config {
    /// Build the configuration from the process environment (call `dotenv().ok()` first).
    pub fn from_env() -> DashboardResult<Self> {
        let defaults = Config::default();

        // Heroku style $PORT
        let port = match env::var("PORT") {
            Ok(p) => p
                .parse::<u16>()
                .map_err(|e| DashboardError::Config(format!("PORT must be a number: {}", e)))?,
            Err(_) => {
                warn!("$PORT not set, defaulting to {}", DEFAULT_PORT);
                DEFAULT_PORT
            }
        };

        let default_wacc_percent = parse_var("DEFAULT_WACC_PERCENT", defaults.default_wacc_percent)?;
        if !(0.0..=100.0).contains(&default_wacc_percent) {
            return Err(DashboardError::Config(format!(
                "DEFAULT_WACC_PERCENT must be between 0 and 100, got {}",
                default_wacc_percent
            )));
        }

        let industry_rosters = match env::var("INDUSTRY_ROSTERS_PATH") {
            Ok(path) => {
                info!("Loading industry rosters from {}", path);
                let raw = fs::read_to_string(&path)
                    .map_err(|e| DashboardError::Config(format!("Cannot read {}: {}", path, e)))?;
                IndustryRosters::from_json(&raw)?
            }
            Err(_) => defaults.industry_rosters,
        };

        let config = Config {
            port,
            yahoo_chart_url: parse_var("YAHOO_CHART_URL", defaults.yahoo_chart_url)?,
            yahoo_summary_url: parse_var("YAHOO_SUMMARY_URL", defaults.yahoo_summary_url)?,
            yahoo_cookie_url: parse_var("YAHOO_COOKIE_URL", defaults.yahoo_cookie_url)?,
            yahoo_crumb_url: parse_var("YAHOO_CRUMB_URL", defaults.yahoo_crumb_url)?,
            constituents_url: parse_var("CONSTITUENTS_URL", defaults.constituents_url)?,
            user_agent: parse_var("HTTP_USER_AGENT", defaults.user_agent)?,
            request_timeout: Duration::from_secs(parse_var("HTTP_TIMEOUT_SECS", defaults.request_timeout.as_secs())?),
            default_wacc_percent,
            default_start_date: parse_var("DEFAULT_START_DATE", defaults.default_start_date)?,
            industry_rosters,
        };

        info!(
            "Configuration loaded: port={}, default WACC={}%, default start={}, {} industries",
            config.port,
            config.default_wacc_percent,
            config.default_start_date,
            config.industry_rosters.len()
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_setting() {
        let config = Config::default();
        assert_eq!(config.port, 3030);
        assert_eq!(config.default_start_date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(config.default_wacc_percent, 8.0);
        assert!(!config.industry_rosters.is_empty());
    }

    #[test]
    fn parse_var_falls_back_when_unset() {
        let value: u64 = parse_var("STOCK_TRACKER_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }
}
