// Fetch one ticker end to end and print its fundamentals table.
// Usage: cargo run --bin test_yahoo -- AAPL [wacc]
use chrono::Utc;
use dotenv::dotenv;
use log::{error, info};
use std::env;

use stock_tracker_dashboard::config::Config;
use stock_tracker_dashboard::services::dashboard::{build_stock_view, StockQuery};
use stock_tracker_dashboard::services::market_data::YahooFinance;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;
    let mut args = env::args().skip(1);
    let ticker = args.next().unwrap_or_else(|| "AAPL".to_string());
    let wacc_percent = match args.next() {
        Some(w) => w.parse::<f64>()?,
        None => config.default_wacc_percent,
    };

    info!("Testing Yahoo Finance fetch for {}...", ticker);
    let provider = YahooFinance::new(&config)?;
    let query = StockQuery {
        ticker,
        start: config.default_start_date,
        end: Utc::now().date_naive(),
        wacc_percent,
    };

    match build_stock_view(&provider, &query).await {
        Ok(view) => {
            info!("SUCCESS: {} price rows", view.price_chart.dates.len());
            println!(
                "{} ({} / {})",
                view.ticker,
                view.sector.as_deref().unwrap_or("N/A"),
                view.industry.as_deref().unwrap_or("N/A")
            );
            for row in &view.fundamentals {
                println!("{:<18} {}", row.metric, row.value);
            }
            println!("{}", view.valuation.label);
        }
        Err(e) => {
            error!("ERROR: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
