// src/handlers/stock.rs
use chrono::NaiveDate;
use log::{debug, info};
use serde::Deserialize;
use std::sync::Arc;
use warp::reply::Json;
use warp::{Rejection, Reply};

use super::error::reject;
use super::{decode_ticker, validate_wacc, AppState, DateRange};
use crate::services::dashboard::{build_stock_view, load_snapshot, raw_tail, series_to_csv, StockQuery};

const DEFAULT_RAW_ROWS: usize = 5;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StockViewParams {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub wacc: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawParams {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub rows: Option<usize>,
}

/// The CSV export only takes a date range.
pub type CsvParams = DateRange;

pub async fn get_stock_view(ticker: String, params: StockViewParams, state: Arc<AppState>) -> Result<Json, Rejection> {
    let ticker = decode_ticker(&ticker).map_err(warp::reject::custom)?;
    info!("Handling request for stock view of {}", ticker);

    let wacc_percent = validate_wacc(params.wacc.unwrap_or(state.config.default_wacc_percent))
        .map_err(warp::reject::custom)?;
    let range = DateRange {
        start: params.start,
        end: params.end,
    };
    let (start, end) = range.resolve(&state.config);

    let query = StockQuery {
        ticker,
        start,
        end,
        wacc_percent,
    };
    let view = build_stock_view(state.provider.as_ref(), &query).await.map_err(reject)?;

    debug!("Stock view for {}: {:?} valuation", view.ticker, view.valuation.outcome);
    Ok(warp::reply::json(&view))
}

pub async fn get_raw_prices(ticker: String, params: RawParams, state: Arc<AppState>) -> Result<Json, Rejection> {
    let ticker = decode_ticker(&ticker).map_err(warp::reject::custom)?;
    info!("Handling request for raw prices of {}", ticker);

    let range = DateRange {
        start: params.start,
        end: params.end,
    };
    let (start, end) = range.resolve(&state.config);
    let rows = params.rows.unwrap_or(DEFAULT_RAW_ROWS);
    let tail = raw_tail(state.provider.as_ref(), &ticker, start, end, rows)
        .await
        .map_err(reject)?;

    Ok(warp::reply::json(&tail))
}

pub async fn get_prices_csv(ticker: String, params: CsvParams, state: Arc<AppState>) -> Result<impl Reply, Rejection> {
    let ticker = decode_ticker(&ticker).map_err(warp::reject::custom)?;
    info!("Handling CSV export for {}", ticker);

    let (start, end) = params.resolve(&state.config);
    let (ticker, snapshot) = load_snapshot(state.provider.as_ref(), &ticker, start, end)
        .await
        .map_err(reject)?;
    let csv = series_to_csv(&snapshot.series).map_err(reject)?;

    Ok(warp::reply::with_header(
        warp::reply::with_header(csv, "content-type", "text/csv; charset=utf-8"),
        "content-disposition",
        format!("attachment; filename=\"{}_{}_{}.csv\"", ticker, start, end),
    ))
}
