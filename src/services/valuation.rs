// src/services/valuation.rs
use serde::Serialize;

use crate::models::{ComparisonOutcome, Metric};

/// Inline styling hint for the rendered table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Emphasis {
    Affirmative,
    Warning,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Valuation {
    pub roe_percent: Metric,
    pub wacc_percent: f64,
    pub outcome: ComparisonOutcome,
    pub label: String,
    pub emphasis: Emphasis,
}

pub fn compare_to_wacc(roe_percent: Metric, wacc_percent: f64) -> ComparisonOutcome {
    match roe_percent {
        Metric::Numeric(roe) if roe > wacc_percent => ComparisonOutcome::ValueCreating,
        Metric::Numeric(_) => ComparisonOutcome::ValueDestroying,
        Metric::Unavailable => ComparisonOutcome::Indeterminate,
    }
}

pub fn evaluate(roe_percent: Metric, wacc_percent: f64) -> Valuation {
    let outcome = compare_to_wacc(roe_percent, wacc_percent);
    let (label, emphasis) = match outcome {
        ComparisonOutcome::ValueCreating => (
            format!("Value-creating: ROE {}% exceeds WACC {:.2}%", roe_percent, wacc_percent),
            Emphasis::Affirmative,
        ),
        ComparisonOutcome::ValueDestroying => (
            format!("Value-destroying: ROE {}% does not exceed WACC {:.2}%", roe_percent, wacc_percent),
            Emphasis::Warning,
        ),
        ComparisonOutcome::Indeterminate => (
            "ROE unavailable; cannot compare against WACC".to_string(),
            Emphasis::Neutral,
        ),
    };

    Valuation {
        roe_percent,
        wacc_percent,
        outcome,
        label,
        emphasis,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roe_above_wacc_creates_value() {
        assert_eq!(compare_to_wacc(Metric::Numeric(15.2), 8.0), ComparisonOutcome::ValueCreating);
        assert_eq!(compare_to_wacc(Metric::Numeric(0.01), 0.0), ComparisonOutcome::ValueCreating);
    }

    #[test]
    fn equality_destroys_value() {
        assert_eq!(compare_to_wacc(Metric::Numeric(8.0), 8.0), ComparisonOutcome::ValueDestroying);
        assert_eq!(compare_to_wacc(Metric::Numeric(-3.5), 8.0), ComparisonOutcome::ValueDestroying);
    }

    #[test]
    fn unavailable_roe_is_indeterminate() {
        let valuation = evaluate(Metric::Unavailable, 8.0);
        assert_eq!(valuation.outcome, ComparisonOutcome::Indeterminate);
        assert_eq!(valuation.emphasis, Emphasis::Neutral);
    }

    #[test]
    fn label_and_emphasis_follow_outcome() {
        let good = evaluate(Metric::Numeric(25.31), 9.0);
        assert_eq!(good.emphasis, Emphasis::Affirmative);
        assert!(good.label.contains("25.31%"));
        assert!(good.label.contains("9.00%"));

        let bad = evaluate(Metric::Numeric(4.0), 9.0);
        assert_eq!(bad.emphasis, Emphasis::Warning);
        assert!(bad.label.starts_with("Value-destroying"));
    }
}
