// src/models.rs
use serde::{Serialize, Serializer, Deserialize};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;

/// A figure that is either a number or explicitly unavailable ("N/A").
///
/// Every arithmetic helper propagates `Unavailable`: if any operand is
/// unavailable the result is too.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Numeric(f64),
    Unavailable,
}

impl Metric {
    /// Non-finite values are never numeric.
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Metric::Numeric(value)
        } else {
            Metric::Unavailable
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Metric::Numeric(v) => Some(*v),
            Metric::Unavailable => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Metric::Numeric(_))
    }

    /// Division guarded against a zero or unavailable denominator.
    pub fn checked_div(self, denominator: Metric) -> Metric {
        match (self, denominator) {
            (Metric::Numeric(n), Metric::Numeric(d)) if d != 0.0 => Metric::new(n / d),
            _ => Metric::Unavailable,
        }
    }

    pub fn scale(self, factor: f64) -> Metric {
        match self {
            Metric::Numeric(v) => Metric::new(v * factor),
            Metric::Unavailable => Metric::Unavailable,
        }
    }

    pub fn round2(self) -> Metric {
        match self {
            Metric::Numeric(v) => Metric::Numeric(round2(v)),
            Metric::Unavailable => Metric::Unavailable,
        }
    }

    /// Zero substitution, used only by the industry averaging policy.
    pub fn or_zero(self) -> f64 {
        self.as_f64().unwrap_or(0.0)
    }
}

impl From<Option<f64>> for Metric {
    fn from(value: Option<f64>) -> Self {
        value.map(Metric::new).unwrap_or(Metric::Unavailable)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Metric::Numeric(v) => write!(f, "{:.2}", v),
            Metric::Unavailable => write!(f, "N/A"),
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Metric::Numeric(v) => serializer.serialize_f64(*v),
            Metric::Unavailable => serializer.serialize_str("N/A"),
        }
    }
}

/// Round half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    PeRatio,
    PbRatio,
    PegRatio,
    Eps,
    RoePercent,
    CashToDebt,
    EquityToAsset,
    CashRatio,
}

impl MetricKey {
    pub const ALL: [MetricKey; 8] = [
        MetricKey::PeRatio,
        MetricKey::PbRatio,
        MetricKey::PegRatio,
        MetricKey::Eps,
        MetricKey::RoePercent,
        MetricKey::CashToDebt,
        MetricKey::EquityToAsset,
        MetricKey::CashRatio,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MetricKey::PeRatio => "P/E Ratio",
            MetricKey::PbRatio => "P/B Ratio",
            MetricKey::PegRatio => "PEG Ratio",
            MetricKey::Eps => "EPS",
            MetricKey::RoePercent => "ROE (%)",
            MetricKey::CashToDebt => "Cash-to-Debt",
            MetricKey::EquityToAsset => "Equity-to-Asset",
            MetricKey::CashRatio => "Cash Ratio",
        }
    }
}

/// Fundamentals pulled out of one ticker's info record. Lives for one display pass.
#[derive(Debug, Clone, PartialEq)]
pub struct FundamentalsRecord {
    pub pe_ratio: Metric,
    pub pb_ratio: Metric,
    pub peg_ratio: Metric,
    pub eps: Metric,
    /// Fraction, e.g. 0.25 for 25%.
    pub return_on_equity: Metric,
    pub total_cash: Metric,
    pub total_debt: Metric,
    pub total_liabilities: Metric,
    pub total_assets: Metric,
    pub total_equity: Metric,
    pub sector: Option<String>,
    pub industry: Option<String>,
}

impl FundamentalsRecord {
    pub fn unavailable() -> Self {
        FundamentalsRecord {
            pe_ratio: Metric::Unavailable,
            pb_ratio: Metric::Unavailable,
            peg_ratio: Metric::Unavailable,
            eps: Metric::Unavailable,
            return_on_equity: Metric::Unavailable,
            total_cash: Metric::Unavailable,
            total_debt: Metric::Unavailable,
            total_liabilities: Metric::Unavailable,
            total_assets: Metric::Unavailable,
            total_equity: Metric::Unavailable,
            sector: None,
            industry: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedRatios {
    pub cash_to_debt: Metric,
    pub equity_to_asset: Metric,
    pub cash_ratio: Metric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOutcome {
    ValueCreating,
    ValueDestroying,
    Indeterminate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupPolicy {
    /// Sector policy: missing values are left out of the mean.
    ExcludeMissing,
    /// Industry policy: missing values count as zero.
    ZeroFill,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupAverages {
    pub group: String,
    pub policy: GroupPolicy,
    pub members: Vec<String>,
    pub averages: BTreeMap<MetricKey, Metric>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceSeries {
    pub bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        PriceSeries { bars }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn tail(&self, rows: usize) -> &[PriceBar] {
        let start = self.bars.len().saturating_sub(rows);
        &self.bars[start..]
    }
}

/// Indicator columns aligned to the price series' date index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorFrame {
    pub dates: Vec<NaiveDate>,
    pub close: Vec<f64>,
    pub sma_20: Vec<Option<f64>>,
    pub ema_20: Vec<Option<f64>>,
    pub rsi_14: Vec<Option<f64>>,
    pub macd_diff: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_propagates_through_division() {
        assert_eq!(Metric::Unavailable.checked_div(Metric::Numeric(2.0)), Metric::Unavailable);
        assert_eq!(Metric::Numeric(2.0).checked_div(Metric::Unavailable), Metric::Unavailable);
        assert_eq!(Metric::Numeric(2.0).checked_div(Metric::Numeric(0.0)), Metric::Unavailable);
        assert_eq!(Metric::Numeric(3.0).checked_div(Metric::Numeric(2.0)), Metric::Numeric(1.5));
    }

    #[test]
    fn non_finite_is_unavailable() {
        assert_eq!(Metric::new(f64::NAN), Metric::Unavailable);
        assert_eq!(Metric::new(f64::INFINITY), Metric::Unavailable);
        assert_eq!(Metric::from(None), Metric::Unavailable);
    }

    #[test]
    fn rounding_is_idempotent() {
        for v in [1.234_567, -8.005, 0.1 + 0.2, 12345.678_9, 0.0] {
            let once = round2(v);
            assert_eq!(round2(once), once);
        }
    }

    #[test]
    fn metric_serializes_as_number_or_na() {
        assert_eq!(serde_json::to_string(&Metric::Numeric(1.5)).unwrap(), "1.5");
        assert_eq!(serde_json::to_string(&Metric::Unavailable).unwrap(), "\"N/A\"");
    }

    #[test]
    fn tail_returns_last_rows() {
        let bars = (1..=7)
            .map(|d| PriceBar {
                date: NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
                open: 1.0,
                high: 1.0,
                low: 1.0,
                close: d as f64,
                volume: 10,
            })
            .collect();
        let series = PriceSeries::new(bars);
        let tail = series.tail(5);
        assert_eq!(tail.len(), 5);
        assert_eq!(tail[0].close, 3.0);
        assert_eq!(series.tail(50).len(), 7);
    }
}
