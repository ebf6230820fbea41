use dotenv::dotenv;
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::Filter;

use stock_tracker_dashboard::config::Config;
use stock_tracker_dashboard::handlers::AppState;
use stock_tracker_dashboard::routes;
use stock_tracker_dashboard::services::market_data::{CachedProvider, YahooFinance};
use stock_tracker_dashboard::services::tickers::WikipediaConstituents;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize the logger
    env_logger::init();
    info!("Logger initialized. Starting the application...");

    let config = Config::from_env()?;

    // Bind to 0.0.0.0 for Heroku
    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    info!("Will bind to: {}", addr);

    let provider = CachedProvider::new(YahooFinance::new(&config)?);
    let ticker_lists = WikipediaConstituents::new(&config)?;
    let state = Arc::new(AppState {
        provider: Arc::new(provider),
        ticker_lists: Arc::new(ticker_lists),
        config,
    });

    // Set up CORS
    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("content-type")
        .allow_methods(vec!["GET"]);

    let api = routes::routes(state).with(cors);
    info!("Routes configured successfully with CORS.");

    info!("Starting server on {}", addr);
    warp::serve(api).run(addr).await;
    Ok(())
}
