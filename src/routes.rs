// src/routes.rs
use std::convert::Infallible;
use std::sync::Arc;
use log::info;
use warp::reject::Rejection;
use warp::{Filter, Reply};

use crate::handlers::error::ApiError;
use crate::handlers::group::{get_industries, get_industry_averages, get_sector_averages, IndustryParams, SectorParams};
use crate::handlers::stock::{get_prices_csv, get_raw_prices, get_stock_view, CsvParams, RawParams, StockViewParams};
use crate::handlers::tickers::get_constituents;
use crate::handlers::AppState;

// Turn rejections into JSON error bodies
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = warp::http::StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = api_error.status_code();
        message = api_error.message.clone();
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        code = warp::http::StatusCode::BAD_REQUEST;
        message = e.to_string();
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = warp::http::StatusCode::METHOD_NOT_ALLOWED;
        message = "Method Not Allowed".to_string();
    } else {
        code = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error".to_string();
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
        })),
        code,
    ))
}

pub fn routes(state: Arc<AppState>) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let state_filter = warp::any().map(move || state.clone());

    let stock_route = warp::path!("api" / "v1" / "stock" / String)
        .and(warp::get())
        .and(warp::query::<StockViewParams>())
        .and(state_filter.clone())
        .and_then(get_stock_view);

    let raw_route = warp::path!("api" / "v1" / "stock" / String / "raw")
        .and(warp::get())
        .and(warp::query::<RawParams>())
        .and(state_filter.clone())
        .and_then(get_raw_prices);

    let csv_route = warp::path!("api" / "v1" / "stock" / String / "prices.csv")
        .and(warp::get())
        .and(warp::query::<CsvParams>())
        .and(state_filter.clone())
        .and_then(get_prices_csv);

    let sector_route = warp::path!("api" / "v1" / "group" / "sector")
        .and(warp::get())
        .and(warp::query::<SectorParams>())
        .and(state_filter.clone())
        .and_then(get_sector_averages);

    let industry_route = warp::path!("api" / "v1" / "group" / "industry")
        .and(warp::get())
        .and(warp::query::<IndustryParams>())
        .and(state_filter.clone())
        .and_then(get_industry_averages);

    let industries_route = warp::path!("api" / "v1" / "industries")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_industries);

    let tickers_route = warp::path!("api" / "v1" / "tickers")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_constituents);

    info!("All routes configured successfully.");

    stock_route
        .or(raw_route)
        .or(csv_route)
        .or(sector_route)
        .or(industry_route)
        .or(industries_route)
        .or(tickers_route)
        .recover(handle_rejection)
}
