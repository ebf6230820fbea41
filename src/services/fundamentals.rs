// src/services/fundamentals.rs
use log::debug;
use serde_json::{Map, Value};

use crate::models::{FundamentalsRecord, Metric};

/// Opaque per-ticker info mapping as returned by the market data provider.
pub type InfoRecord = Map<String, Value>;

/// Read a numeric field, accepting plain numbers and Yahoo's `{"raw": n, "fmt": ".."}` wrappers.
fn numeric_field(info: &InfoRecord, keys: &[&str]) -> Metric {
    for key in keys {
        let value = match info.get(*key) {
            Some(Value::Object(wrapped)) => wrapped.get("raw"),
            other => other,
        };
        if let Some(n) = value.and_then(Value::as_f64) {
            return Metric::new(n);
        }
    }
    Metric::Unavailable
}

fn text_field(info: &InfoRecord, key: &str) -> Option<String> {
    info.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn extract_fundamentals(info: &InfoRecord) -> FundamentalsRecord {
    let record = FundamentalsRecord {
        pe_ratio: numeric_field(info, &["trailingPE"]),
        pb_ratio: numeric_field(info, &["priceToBook"]),
        peg_ratio: numeric_field(info, &["pegRatio"]),
        eps: numeric_field(info, &["trailingEps"]),
        return_on_equity: numeric_field(info, &["returnOnEquity"]),
        total_cash: numeric_field(info, &["totalCash"]),
        total_debt: numeric_field(info, &["totalDebt"]),
        total_liabilities: numeric_field(info, &["totalLiab", "totalLiabilities"]),
        total_assets: numeric_field(info, &["totalAssets"]),
        total_equity: numeric_field(info, &["totalStockholderEquity", "totalEquity"]),
        sector: text_field(info, "sector"),
        industry: text_field(info, "industry"),
    };
    debug!("Extracted fundamentals: {:?}", record);
    record
}

/// Return on equity as a percentage, rounded to 2 decimals.
pub fn roe_percent(record: &FundamentalsRecord) -> Metric {
    record.return_on_equity.scale(100.0).round2()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info(value: Value) -> InfoRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn extracts_plain_and_wrapped_numbers() {
        let record = extract_fundamentals(&info(json!({
            "trailingPE": 28.4,
            "priceToBook": {"raw": 45.1, "fmt": "45.10"},
            "totalCash": 1000,
            "sector": "Technology",
        })));
        assert_eq!(record.pe_ratio, Metric::Numeric(28.4));
        assert_eq!(record.pb_ratio, Metric::Numeric(45.1));
        assert_eq!(record.total_cash, Metric::Numeric(1000.0));
        assert_eq!(record.sector.as_deref(), Some("Technology"));
    }

    #[test]
    fn missing_and_sentinel_fields_are_unavailable() {
        let record = extract_fundamentals(&info(json!({
            "pegRatio": "N/A",
            "trailingEps": null,
            "returnOnEquity": {"fmt": "-"},
            "sector": "",
        })));
        assert_eq!(record.peg_ratio, Metric::Unavailable);
        assert_eq!(record.eps, Metric::Unavailable);
        assert_eq!(record.return_on_equity, Metric::Unavailable);
        assert_eq!(record.total_debt, Metric::Unavailable);
        assert_eq!(record.sector, None);
    }

    #[test]
    fn liabilities_and_debt_are_distinct_fields() {
        let record = extract_fundamentals(&info(json!({
            "totalDebt": 50.0,
            "totalLiabilities": 80.0,
            "totalEquity": 30.0,
        })));
        assert_eq!(record.total_debt, Metric::Numeric(50.0));
        assert_eq!(record.total_liabilities, Metric::Numeric(80.0));
        assert_eq!(record.total_equity, Metric::Numeric(30.0));
    }

    #[test]
    fn roe_percent_rounds_fraction() {
        let mut record = FundamentalsRecord::unavailable();
        record.return_on_equity = Metric::Numeric(0.156_78);
        assert_eq!(roe_percent(&record), Metric::Numeric(15.68));

        record.return_on_equity = Metric::Unavailable;
        assert_eq!(roe_percent(&record), Metric::Unavailable);
    }
}
