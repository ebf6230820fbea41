// src/handlers/tickers.rs
use log::info;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use super::AppState;

pub async fn get_constituents(state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Handling request for index constituents");
    let tickers = state.ticker_lists.constituents().await;
    Ok(warp::reply::json(&tickers))
}
