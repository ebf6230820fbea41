// src/services/dashboard.rs
use chrono::NaiveDate;
use log::{info, warn};
use serde::Serialize;

use crate::error::{DashboardError, DashboardResult};
use crate::models::{DerivedRatios, IndicatorFrame, Metric, MetricKey, PriceBar, PriceSeries};
use super::fundamentals::{extract_fundamentals, roe_percent};
use super::indicators::compute_indicators;
use super::market_data::{normalize_ticker, MarketDataProvider, MarketSnapshot};
use super::ratios::{calculate_ratios, metric_values};
use super::valuation::{evaluate, Emphasis, Valuation};

#[derive(Debug, Clone)]
pub struct StockQuery {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub wacc_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartSeries {
    pub label: String,
    pub color: &'static str,
    pub dashed: bool,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Chart {
    pub title: String,
    pub dates: Vec<NaiveDate>,
    pub series: Vec<ChartSeries>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableRow {
    pub metric: &'static str,
    pub value: Metric,
    pub emphasis: Emphasis,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockView {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub price_chart: Chart,
    pub rsi_chart: Chart,
    pub macd_chart: Chart,
    pub fundamentals: Vec<TableRow>,
    pub ratios: DerivedRatios,
    pub valuation: Valuation,
}

fn line(label: &str, color: &'static str, dashed: bool, values: Vec<Option<f64>>) -> ChartSeries {
    ChartSeries {
        label: label.to_string(),
        color,
        dashed,
        values,
    }
}

fn build_charts(ticker: &str, frame: IndicatorFrame) -> (Chart, Chart, Chart) {
    let close = frame.close.into_iter().map(Some).collect();

    let price_chart = Chart {
        title: format!("{} Stock Price", ticker),
        dates: frame.dates.clone(),
        series: vec![
            line("Close", "black", false, close),
            line("SMA 20", "blue", true, frame.sma_20),
            line("EMA 20", "green", true, frame.ema_20),
        ],
    };
    let rsi_chart = Chart {
        title: "RSI (Relative Strength Index)".to_string(),
        dates: frame.dates.clone(),
        series: vec![line("RSI", "purple", false, frame.rsi_14)],
    };
    let macd_chart = Chart {
        title: "MACD".to_string(),
        dates: frame.dates,
        series: vec![line("MACD Histogram", "orange", false, frame.macd_diff)],
    };

    (price_chart, rsi_chart, macd_chart)
}

/// Fetch the snapshot for a query, failing with `NoData` when the series is empty.
pub async fn load_snapshot(
    provider: &dyn MarketDataProvider,
    ticker: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> DashboardResult<(String, MarketSnapshot)> {
    let ticker = normalize_ticker(ticker)?;
    let snapshot = provider.snapshot(&ticker, start, end).await?;

    if snapshot.series.is_empty() {
        warn!("No price data for {} between {} and {}", ticker, start, end);
        return Err(DashboardError::NoData { ticker, start, end });
    }
    Ok((ticker, snapshot))
}

/// One full display pass for a single ticker.
pub async fn build_stock_view(provider: &dyn MarketDataProvider, query: &StockQuery) -> DashboardResult<StockView> {
    info!("Building view for {} ({} to {}, WACC {}%)", query.ticker, query.start, query.end, query.wacc_percent);
    let (ticker, snapshot) = load_snapshot(provider, &query.ticker, query.start, query.end).await?;

    let frame = compute_indicators(&snapshot.series);
    let (price_chart, rsi_chart, macd_chart) = build_charts(&ticker, frame);

    let record = extract_fundamentals(&snapshot.info);
    let ratios = calculate_ratios(&record);
    let valuation = evaluate(roe_percent(&record), query.wacc_percent);

    let fundamentals = metric_values(&record)
        .into_iter()
        .map(|(key, value)| TableRow {
            metric: key.label(),
            value,
            emphasis: if key == MetricKey::RoePercent { valuation.emphasis } else { Emphasis::Neutral },
        })
        .collect();

    Ok(StockView {
        ticker,
        start: query.start,
        end: query.end,
        sector: record.sector,
        industry: record.industry,
        price_chart,
        rsi_chart,
        macd_chart,
        fundamentals,
        ratios,
        valuation,
    })
}

/// The last `rows` bars of a ticker's series.
pub async fn raw_tail(
    provider: &dyn MarketDataProvider,
    ticker: &str,
    start: NaiveDate,
    end: NaiveDate,
    rows: usize,
) -> DashboardResult<Vec<PriceBar>> {
    let (_, snapshot) = load_snapshot(provider, ticker, start, end).await?;
    Ok(snapshot.series.tail(rows).to_vec())
}

/// Render a price series as CSV with a header row.
pub fn series_to_csv(series: &PriceSeries) -> DashboardResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for bar in &series.bars {
        writer
            .serialize(bar)
            .map_err(|e| DashboardError::upstream(format!("CSV encoding failed: {}", e)))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| DashboardError::upstream(format!("CSV encoding failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| DashboardError::upstream(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            volume: 1_500,
        }
    }

    #[test]
    fn csv_has_header_and_one_line_per_bar() {
        let series = PriceSeries::new(vec![bar(2, 10.5), bar(1, 10.0)]);
        let csv = series_to_csv(&series).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "date,open,high,low,close,volume");
        assert_eq!(lines[1], "2024-03-01,9.0,11.0,8.0,10.0,1500");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn price_chart_uses_close_and_dashed_overlays() {
        let series = PriceSeries::new((1..=25).map(|d| bar(d, d as f64)).collect());
        let (price, rsi, macd) = build_charts("MSFT", compute_indicators(&series));

        assert_eq!(price.title, "MSFT Stock Price");
        assert_eq!(price.series.len(), 3);
        assert_eq!(price.series[0].color, "black");
        assert!(!price.series[0].dashed);
        assert!(price.series[1].dashed && price.series[2].dashed);
        assert_eq!(rsi.dates.len(), 25);
        assert_eq!(macd.series[0].values.len(), 25);
    }
}
