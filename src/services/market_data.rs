// src/services/market_data.rs
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use chrono_tz::America::New_York;
use log::{debug, error, info, warn};
use regex::Regex;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::Mutex as AsyncMutex;

use crate::config::Config;
use crate::error::{DashboardError, DashboardResult};
use crate::models::{PriceBar, PriceSeries};
use super::fundamentals::InfoRecord;

const SUMMARY_MODULES: &str =
    "summaryDetail,defaultKeyStatistics,financialData,assetProfile,balanceSheetHistory";

/// Price history plus the opaque info record for one ticker and date range.
#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    pub series: PriceSeries,
    pub info: InfoRecord,
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn price_history(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> DashboardResult<PriceSeries>;

    async fn info(&self, ticker: &str) -> DashboardResult<InfoRecord>;

    /// Fetch both halves. An empty series skips the info request.
    async fn snapshot(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> DashboardResult<MarketSnapshot> {
        let series = self.price_history(ticker, start, end).await?;
        if series.is_empty() {
            return Ok(MarketSnapshot::default());
        }
        let info = self.info(ticker).await?;
        Ok(MarketSnapshot { series, info })
    }
}

/// Trim and upper-case a user supplied symbol, rejecting anything that can't be a ticker.
pub fn normalize_ticker(raw: &str) -> DashboardResult<String> {
    let ticker = raw.trim().to_uppercase();
    let re = Regex::new(r"^[A-Z0-9.\-\^=]{1,12}$").map_err(|e| DashboardError::Config(e.to_string()))?;
    if re.is_match(&ticker) {
        Ok(ticker)
    } else {
        Err(DashboardError::InvalidTicker(raw.to_string()))
    }
}

fn midnight_timestamp(date: NaiveDate) -> DashboardResult<i64> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .ok_or_else(|| DashboardError::upstream(format!("Cannot build a timestamp for {}", date)))
}

pub struct YahooFinance {
    client: Client,
    chart_url: String,
    summary_url: String,
    cookie_url: String,
    crumb_url: String,
    crumb: AsyncMutex<Option<String>>,
}

impl YahooFinance {
    pub fn new(config: &Config) -> DashboardResult<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout)
            .cookie_store(true)
            .build()?;

        Ok(YahooFinance {
            client,
            chart_url: config.yahoo_chart_url.trim_end_matches('/').to_string(),
            summary_url: config.yahoo_summary_url.trim_end_matches('/').to_string(),
            cookie_url: config.yahoo_cookie_url.clone(),
            crumb_url: config.yahoo_crumb_url.clone(),
            crumb: AsyncMutex::new(None),
        })
    }

    /// Session crumb for quoteSummary. Cached until `refresh` is asked for.
    async fn crumb(&self, refresh: bool) -> DashboardResult<String> {
        let mut cached = self.crumb.lock().await;
        if !refresh {
            if let Some(crumb) = cached.as_ref() {
                return Ok(crumb.clone());
            }
        }

        // The cookie endpoint answers 404 but still sets the session cookie
        debug!("Requesting Yahoo session cookie from {}", self.cookie_url);
        self.client.get(&self.cookie_url).send().await?;

        let crumb = self
            .client
            .get(&self.crumb_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let crumb = crumb.trim().to_string();
        if crumb.is_empty() || crumb.contains('<') {
            error!("Yahoo returned no usable crumb");
            return Err(DashboardError::upstream("Yahoo did not issue a session crumb"));
        }

        info!("Obtained Yahoo session crumb");
        *cached = Some(crumb.clone());
        Ok(crumb)
    }

    async fn request_summary(&self, url: &str, crumb: &str) -> DashboardResult<Response> {
        let response = self
            .client
            .get(url)
            .query(&[("modules", SUMMARY_MODULES), ("crumb", crumb)])
            .send()
            .await?;
        Ok(response)
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinance {
    async fn price_history(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> DashboardResult<PriceSeries> {
        let url = format!("{}/{}", self.chart_url, ticker);
        let period1 = midnight_timestamp(start)?;
        let period2 = midnight_timestamp(end)?;
        info!("Fetching price history for {} ({} to {}) from {}", ticker, start, end, url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            warn!("Yahoo has no chart for {}", ticker);
            return Ok(PriceSeries::default());
        }

        let body = response.error_for_status()?.text().await?;
        let series = parse_chart(&body)?;
        info!("Fetched {} price rows for {}", series.len(), ticker);
        Ok(series)
    }

    async fn info(&self, ticker: &str) -> DashboardResult<InfoRecord> {
        let url = format!("{}/{}", self.summary_url, ticker);
        info!("Fetching fundamentals for {} from {}", ticker, url);

        let crumb = self.crumb(false).await?;
        let mut response = self.request_summary(&url, &crumb).await?;
        if matches!(response.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            warn!("Yahoo rejected the session crumb for {}; refreshing", ticker);
            let crumb = self.crumb(true).await?;
            response = self.request_summary(&url, &crumb).await?;
        }

        if response.status() == StatusCode::NOT_FOUND {
            warn!("Yahoo has no quote summary for {}; all fundamentals unavailable", ticker);
            return Ok(InfoRecord::new());
        }

        let body = response.error_for_status()?.text().await?;
        parse_summary(&body)
    }
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Parse a v8 chart response. Rows with any missing field are dropped.
pub(crate) fn parse_chart(body: &str) -> DashboardResult<PriceSeries> {
    let envelope: ChartEnvelope = serde_json::from_str(body)?;

    if let Some(err) = envelope.chart.error {
        if err.code == "Not Found" {
            warn!("Chart not found: {}", err.description.unwrap_or_default());
            return Ok(PriceSeries::default());
        }
        error!("Chart request failed: {} {:?}", err.code, err.description);
        return Err(DashboardError::upstream(format!(
            "{}: {}",
            err.code,
            err.description.unwrap_or_default()
        )));
    }

    let result = match envelope.chart.result.and_then(|r| r.into_iter().next()) {
        Some(result) => result,
        None => return Ok(PriceSeries::default()),
    };
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut bars = Vec::with_capacity(result.timestamp.len());
    let mut dropped = 0;
    for (i, ts) in result.timestamp.iter().enumerate() {
        let field = |column: &Vec<Option<f64>>| column.get(i).copied().flatten().filter(|v| v.is_finite());
        let row = (
            DateTime::from_timestamp(*ts, 0),
            field(&quote.open),
            field(&quote.high),
            field(&quote.low),
            field(&quote.close),
            field(&quote.volume),
        );
        match row {
            (Some(at), Some(open), Some(high), Some(low), Some(close), Some(volume)) => bars.push(PriceBar {
                date: at.with_timezone(&New_York).date_naive(),
                open,
                high,
                low,
                close,
                volume: volume.max(0.0) as u64,
            }),
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!("Dropped {} incomplete price rows", dropped);
    }
    Ok(PriceSeries::new(bars))
}

#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryBody,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    result: Option<Vec<Map<String, Value>>>,
    error: Option<YahooError>,
}

/// Parse a v10 quoteSummary response into one flat info record.
pub(crate) fn parse_summary(body: &str) -> DashboardResult<InfoRecord> {
    let envelope: SummaryEnvelope = serde_json::from_str(body)?;

    if let Some(err) = envelope.quote_summary.error {
        return Err(DashboardError::upstream(format!(
            "{}: {}",
            err.code,
            err.description.unwrap_or_default()
        )));
    }

    let modules = envelope
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .unwrap_or_default();
    Ok(flatten_modules(&modules))
}

fn flatten_modules(modules: &Map<String, Value>) -> InfoRecord {
    let mut info = InfoRecord::new();

    for (name, module) in modules {
        let fields = match module.as_object() {
            Some(fields) => fields,
            None => continue,
        };
        for (key, value) in fields {
            if key == "balanceSheetStatements" {
                // Most recent statement comes first
                if let Some(latest) = value.as_array().and_then(|s| s.first()).and_then(Value::as_object) {
                    for (k, v) in latest {
                        info.entry(k.clone()).or_insert_with(|| v.clone());
                    }
                }
            } else if key != "maxAge" {
                info.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        debug!("Flattened module {}", name);
    }

    info
}

type SnapshotKey = (String, NaiveDate, NaiveDate);

/// Result cache keyed by (ticker, start, end). Unbounded; entries are never evicted.
pub struct CachedProvider<P> {
    inner: P,
    snapshots: Mutex<HashMap<SnapshotKey, MarketSnapshot>>,
}

impl<P: MarketDataProvider> CachedProvider<P> {
    pub fn new(inner: P) -> Self {
        CachedProvider {
            inner,
            snapshots: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, key: &SnapshotKey) -> Option<MarketSnapshot> {
        let snapshots = self.snapshots.lock().unwrap_or_else(|e| e.into_inner());
        snapshots.get(key).cloned()
    }

    fn store(&self, key: SnapshotKey, snapshot: MarketSnapshot) {
        let mut snapshots = self.snapshots.lock().unwrap_or_else(|e| e.into_inner());
        snapshots.insert(key, snapshot);
    }

    pub fn len(&self) -> usize {
        self.snapshots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl<P: MarketDataProvider> MarketDataProvider for CachedProvider<P> {
    async fn price_history(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> DashboardResult<PriceSeries> {
        self.inner.price_history(ticker, start, end).await
    }

    async fn info(&self, ticker: &str) -> DashboardResult<InfoRecord> {
        self.inner.info(ticker).await
    }

    async fn snapshot(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> DashboardResult<MarketSnapshot> {
        let key = (ticker.to_string(), start, end);
        if let Some(hit) = self.cached(&key) {
            debug!("Cache hit for {} {}..{}", ticker, start, end);
            return Ok(hit);
        }

        let snapshot = self.inner.snapshot(ticker, start, end).await?;
        self.store(key, snapshot.clone());
        Ok(snapshot)
    }
}
