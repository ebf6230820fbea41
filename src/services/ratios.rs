// src/services/ratios.rs
use crate::models::{DerivedRatios, FundamentalsRecord, Metric, MetricKey};
use super::fundamentals::roe_percent;

/// `numerator / denominator` rounded to 2 decimals, or unavailable when the
/// denominator is zero or either side is missing.
pub fn guarded_ratio(numerator: Metric, denominator: Metric) -> Metric {
    numerator.checked_div(denominator).round2()
}

pub fn calculate_ratios(record: &FundamentalsRecord) -> DerivedRatios {
    DerivedRatios {
        cash_to_debt: guarded_ratio(record.total_cash, record.total_debt),
        equity_to_asset: guarded_ratio(record.total_equity, record.total_assets),
        // Liabilities, not debt: the two are separate inputs.
        cash_ratio: guarded_ratio(record.total_cash, record.total_liabilities),
    }
}

/// Every named metric for one ticker, raw fields and derived ratios together.
pub fn metric_values(record: &FundamentalsRecord) -> Vec<(MetricKey, Metric)> {
    let ratios = calculate_ratios(record);
    MetricKey::ALL
        .iter()
        .map(|key| {
            let value = match key {
                MetricKey::PeRatio => record.pe_ratio,
                MetricKey::PbRatio => record.pb_ratio,
                MetricKey::PegRatio => record.peg_ratio,
                MetricKey::Eps => record.eps,
                MetricKey::RoePercent => roe_percent(record),
                MetricKey::CashToDebt => ratios.cash_to_debt,
                MetricKey::EquityToAsset => ratios.equity_to_asset,
                MetricKey::CashRatio => ratios.cash_ratio,
            };
            (*key, value)
        })
        .collect()
}
