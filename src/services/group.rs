// src/services/group.rs
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{DashboardError, DashboardResult};
use crate::models::{FundamentalsRecord, GroupAverages, GroupPolicy, Metric, MetricKey, round2};
use super::fundamentals::extract_fundamentals;
use super::market_data::{normalize_ticker, MarketDataProvider};
use super::ratios::metric_values;

/// Hardcoded industry -> ticker roster table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndustryRosters {
    rosters: BTreeMap<String, Vec<String>>,
}

impl Default for IndustryRosters {
    fn default() -> Self {
        let table: [(&str, [&str; 5]); 6] = [
            ("Technology", ["AAPL", "MSFT", "NVDA", "GOOGL", "META"]),
            ("Banking", ["JPM", "BAC", "WFC", "C", "GS"]),
            ("Healthcare", ["JNJ", "UNH", "PFE", "MRK", "ABBV"]),
            ("Energy", ["XOM", "CVX", "COP", "SLB", "EOG"]),
            ("Retail", ["WMT", "COST", "TGT", "HD", "AMZN"]),
            ("Automotive", ["TSLA", "GM", "F", "TM", "HMC"]),
        ];

        IndustryRosters {
            rosters: table
                .iter()
                .map(|(name, tickers)| (name.to_string(), tickers.iter().map(|t| t.to_string()).collect()))
                .collect(),
        }
    }
}

impl IndustryRosters {
    pub fn new(rosters: BTreeMap<String, Vec<String>>) -> Self {
        IndustryRosters { rosters }
    }

    /// Parse a roster file. Every roster must be non-empty and every ticker
    /// must be a valid symbol; tickers are stored normalised.
    pub fn from_json(raw: &str) -> DashboardResult<Self> {
        let parsed: BTreeMap<String, Vec<String>> = serde_json::from_str(raw)
            .map_err(|e| DashboardError::Config(format!("Invalid industry roster file: {}", e)))?;

        let mut rosters = BTreeMap::new();
        for (name, tickers) in parsed {
            if tickers.is_empty() {
                return Err(DashboardError::Config(format!("Industry {} has an empty roster", name)));
            }
            let tickers = tickers
                .iter()
                .map(|t| normalize_ticker(t).map_err(|e| DashboardError::Config(format!("Industry {}: {}", name, e))))
                .collect::<DashboardResult<Vec<_>>>()?;
            rosters.insert(name, tickers);
        }
        Ok(IndustryRosters { rosters })
    }

    /// Case-insensitive lookup, returning the canonical name with its roster.
    pub fn lookup(&self, industry: &str) -> Option<(&str, &[String])> {
        let wanted = industry.trim();
        self.rosters
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
            .map(|(name, tickers)| (name.as_str(), tickers.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.rosters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rosters.is_empty()
    }
}

/// Arithmetic mean of every metric across `records` under one explicit policy.
pub fn average_metrics(records: &[FundamentalsRecord], policy: GroupPolicy) -> BTreeMap<MetricKey, Metric> {
    let per_ticker: Vec<Vec<(MetricKey, Metric)>> = records.iter().map(metric_values).collect();

    MetricKey::ALL
        .iter()
        .enumerate()
        .map(|(idx, key)| {
            let column = per_ticker.iter().map(|values| values[idx].1);
            let values: Vec<f64> = match policy {
                GroupPolicy::ExcludeMissing => column.filter_map(|m| m.as_f64()).collect(),
                GroupPolicy::ZeroFill => column.map(Metric::or_zero).collect(),
            };

            let average = if values.is_empty() {
                Metric::Unavailable
            } else {
                Metric::new(round2(values.iter().sum::<f64>() / values.len() as f64))
            };
            (*key, average)
        })
        .collect()
}

fn same_sector(record: &FundamentalsRecord, sector: &str) -> bool {
    record.sector.as_deref() == Some(sector)
}

/// Sector policy: fetch every ticker, keep those labelled with `sector`, and
/// leave missing values out of each mean.
pub async fn sector_averages(
    provider: &dyn MarketDataProvider,
    tickers: &[String],
    sector: &str,
) -> DashboardResult<GroupAverages> {
    info!("Averaging sector '{}' over {} candidate tickers", sector, tickers.len());

    let mut members = Vec::new();
    let mut records = Vec::new();
    for ticker in tickers {
        let info = provider.info(ticker).await?;
        let record = extract_fundamentals(&info);
        if same_sector(&record, sector) {
            debug!("{} is in sector {}", ticker, sector);
            members.push(ticker.clone());
            records.push(record);
        }
    }

    if members.is_empty() {
        warn!("No tickers matched sector '{}'", sector);
    }

    Ok(GroupAverages {
        group: sector.to_string(),
        policy: GroupPolicy::ExcludeMissing,
        members,
        averages: average_metrics(&records, GroupPolicy::ExcludeMissing),
    })
}

/// Industry policy: use the fixed roster as-is and count missing values as zero.
pub async fn industry_averages(
    provider: &dyn MarketDataProvider,
    rosters: &IndustryRosters,
    industry: &str,
) -> DashboardResult<GroupAverages> {
    let (name, roster) = rosters
        .lookup(industry)
        .ok_or_else(|| DashboardError::UnknownIndustry(industry.to_string()))?;
    info!("Averaging industry '{}' over roster {:?}", name, roster);

    let mut records = Vec::with_capacity(roster.len());
    for ticker in roster {
        let info = provider.info(ticker).await?;
        records.push(extract_fundamentals(&info));
    }

    Ok(GroupAverages {
        group: name.to_string(),
        policy: GroupPolicy::ZeroFill,
        members: roster.to_vec(),
        averages: average_metrics(&records, GroupPolicy::ZeroFill),
    })
}
