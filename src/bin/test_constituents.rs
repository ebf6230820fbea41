// Print the scraped index constituent list.
use dotenv::dotenv;
use log::{info, warn};

use stock_tracker_dashboard::config::Config;
use stock_tracker_dashboard::services::tickers::{TickerListProvider, WikipediaConstituents};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;
    let provider = WikipediaConstituents::new(&config)?;

    let tickers = provider.constituents().await;
    if tickers.is_empty() {
        warn!("No constituents returned from {}", config.constituents_url);
    } else {
        info!("Fetched {} constituents", tickers.len());
        println!("{}", tickers.join(","));
    }
    Ok(())
}
