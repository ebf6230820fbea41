// src/services/tickers.rs
use async_trait::async_trait;
use log::{error, info, warn};
use reqwest::Client;
use scraper::{Html, Selector};

use crate::config::Config;
use crate::error::{DashboardError, DashboardResult};

/// Source of an index's current constituent tickers.
///
/// Failures never propagate: a missing table or a network error yields an
/// empty list and a log line.
#[async_trait]
pub trait TickerListProvider: Send + Sync {
    async fn constituents(&self) -> Vec<String>;
}

pub struct WikipediaConstituents {
    client: Client,
    url: String,
}

impl WikipediaConstituents {
    pub fn new(config: &Config) -> DashboardResult<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout)
            .build()?;

        Ok(WikipediaConstituents {
            client,
            url: config.constituents_url.clone(),
        })
    }

    async fn fetch_page(&self) -> DashboardResult<String> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }
}

#[async_trait]
impl TickerListProvider for WikipediaConstituents {
    async fn constituents(&self) -> Vec<String> {
        info!("Fetching index constituents from {}", self.url);

        let page = match self.fetch_page().await {
            Ok(page) => page,
            Err(e) => {
                error!("Failed to fetch constituent list: {}", e);
                return Vec::new();
            }
        };

        match parse_constituents(&page) {
            Ok(Some(tickers)) => {
                info!("Found {} constituents", tickers.len());
                tickers
            }
            Ok(None) => {
                warn!("Constituent table not found at {}", self.url);
                Vec::new()
            }
            Err(e) => {
                error!("Failed to parse constituent list: {}", e);
                Vec::new()
            }
        }
    }
}

fn selector(css: &str) -> DashboardResult<Selector> {
    Selector::parse(css).map_err(|e| DashboardError::upstream(format!("Bad selector {}: {:?}", css, e)))
}

/// Pull the symbol column out of the `#constituents` table.
/// `Ok(None)` means the table is not on the page.
pub fn parse_constituents(html: &str) -> DashboardResult<Option<Vec<String>>> {
    let document = Html::parse_document(html);
    let table_selector = selector("table#constituents")?;
    let row_selector = selector("tbody tr")?;
    let cell_selector = selector("td")?;

    let table = match document.select(&table_selector).next() {
        Some(table) => table,
        None => return Ok(None),
    };

    let tickers = table
        .select(&row_selector)
        .filter_map(|row| row.select(&cell_selector).next())
        .map(|cell| cell.text().collect::<String>().trim().replace('.', "-"))
        .filter(|symbol| !symbol.is_empty())
        .collect();

    Ok(Some(tickers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_symbol_column() {
        let html = r#"
            <html><body>
            <table id="constituents" class="wikitable">
              <tbody>
                <tr><th>Symbol</th><th>Security</th><th>GICS Sector</th></tr>
                <tr><td><a href="x">MMM</a></td><td>3M</td><td>Industrials</td></tr>
                <tr><td><a href="x">BRK.B</a>
                </td><td>Berkshire Hathaway</td><td>Financials</td></tr>
                <tr><td>AAPL</td><td>Apple Inc.</td><td>Information Technology</td></tr>
              </tbody>
            </table>
            </body></html>"#;

        let tickers = parse_constituents(html).unwrap().unwrap();
        assert_eq!(tickers, vec!["MMM", "BRK-B", "AAPL"]);
    }

    #[test]
    fn missing_table_is_none() {
        let html = "<html><body><table id=\"other\"><tr><td>X</td></tr></table></body></html>";
        assert_eq!(parse_constituents(html).unwrap(), None);
    }

    #[tokio::test]
    async fn unreachable_source_yields_empty_list() {
        let config = Config {
            constituents_url: "http://127.0.0.1:9/constituents".to_string(),
            request_timeout: std::time::Duration::from_secs(2),
            ..Config::default()
        };
        let provider = WikipediaConstituents::new(&config).unwrap();
        assert!(provider.constituents().await.is_empty());
    }
}
