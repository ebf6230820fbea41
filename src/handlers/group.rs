// src/handlers/group.rs
use log::{info, warn};
use serde::Deserialize;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use super::error::{reject, ApiError};
use super::AppState;
use crate::services::group::{industry_averages, sector_averages};
use crate::services::market_data::normalize_ticker;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectorParams {
    pub name: String,
    /// Comma separated override of the candidate tickers.
    pub tickers: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndustryParams {
    pub name: String,
}

pub async fn get_sector_averages(params: SectorParams, state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Handling request for sector averages of '{}'", params.name);

    let mut tickers = match &params.tickers {
        Some(list) => list
            .split(',')
            .filter(|t| !t.trim().is_empty())
            .map(normalize_ticker)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| warp::reject::custom(ApiError::from(e)))?,
        None => state.ticker_lists.constituents().await,
    };
    if tickers.is_empty() {
        warn!("No candidate tickers for sector '{}'", params.name);
    }
    if let Some(limit) = params.limit {
        tickers.truncate(limit);
    }

    let averages = sector_averages(state.provider.as_ref(), &tickers, &params.name)
        .await
        .map_err(reject)?;
    Ok(warp::reply::json(&averages))
}

pub async fn get_industry_averages(params: IndustryParams, state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Handling request for industry averages of '{}'", params.name);

    let averages = industry_averages(state.provider.as_ref(), &state.config.industry_rosters, &params.name)
        .await
        .map_err(reject)?;
    Ok(warp::reply::json(&averages))
}

pub async fn get_industries(state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Handling request for industry rosters");
    Ok(warp::reply::json(&state.config.industry_rosters))
}
