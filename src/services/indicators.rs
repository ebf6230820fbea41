// src/services/indicators.rs
//! Moving averages, RSI and MACD over a close series.
//!
//! Every column is aligned with the input: positions before the lookback
//! window has filled are `None`.

use log::debug;

use crate::models::{IndicatorFrame, PriceSeries};

pub const SMA_WINDOW: usize = 20;
pub const EMA_WINDOW: usize = 20;
pub const RSI_WINDOW: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

/// Rolling arithmetic mean.
pub fn sma(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return result;
    }

    let mut sum: f64 = values[..window].iter().sum();
    result[window - 1] = Some(sum / window as f64);
    for i in window..values.len() {
        sum += values[i] - values[i - window];
        result[i] = Some(sum / window as f64);
    }
    result
}

/// Recursive exponentially weighted mean seeded at the first observation:
/// `y[t] = (1 - alpha) * y[t-1] + alpha * x[t]`. Leading `None`s are skipped
/// and nothing is emitted until `min_periods` observations have been seen.
fn ewm(values: &[Option<f64>], alpha: f64, min_periods: usize) -> Vec<Option<f64>> {
    let mut state: Option<f64> = None;
    let mut seen = 0;

    values
        .iter()
        .map(|value| {
            if let Some(x) = value {
                state = Some(match state {
                    Some(prev) => (1.0 - alpha) * prev + alpha * x,
                    None => *x,
                });
                seen += 1;
            }
            if seen >= min_periods.max(1) {
                state
            } else {
                None
            }
        })
        .collect()
}

fn span_alpha(window: usize) -> f64 {
    2.0 / (window as f64 + 1.0)
}

pub fn ema(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    let observed: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
    ewm(&observed, span_alpha(window), window)
}

/// Relative Strength Index with Wilder smoothing (`alpha = 1 / window`).
///
/// The first bar has no prior close and counts as a zero gain and a zero loss,
/// so the first value lands at index `window - 1`.
pub fn rsi(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 || values.is_empty() {
        return vec![None; values.len()];
    }

    let mut gains = Vec::with_capacity(values.len());
    let mut losses = Vec::with_capacity(values.len());
    gains.push(Some(0.0));
    losses.push(Some(0.0));
    for pair in values.windows(2) {
        let change = pair[1] - pair[0];
        gains.push(Some(change.max(0.0)));
        losses.push(Some((-change).max(0.0)));
    }

    let alpha = 1.0 / window as f64;
    let avg_gain = ewm(&gains, alpha, window);
    let avg_loss = ewm(&losses, alpha, window);

    avg_gain
        .iter()
        .zip(avg_loss.iter())
        .map(|(gain, loss)| match (gain, loss) {
            (Some(_), Some(loss)) if *loss == 0.0 => Some(100.0),
            (Some(gain), Some(loss)) => Some(100.0 - 100.0 / (1.0 + gain / loss)),
            _ => None,
        })
        .collect()
}

/// MACD histogram: (fast EMA - slow EMA) minus its signal-line EMA.
pub fn macd_diff(values: &[f64], fast: usize, slow: usize, signal: usize) -> Vec<Option<f64>> {
    if fast == 0 || slow == 0 || signal == 0 {
        return vec![None; values.len()];
    }

    let fast_ema = ema(values, fast);
    let slow_ema = ema(values, slow);
    let macd_line: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    let signal_line = ewm(&macd_line, span_alpha(signal), signal);
    macd_line
        .iter()
        .zip(signal_line.iter())
        .map(|(m, s)| Some((*m)? - (*s)?))
        .collect()
}

/// Attach every indicator column to the series' date index.
pub fn compute_indicators(series: &PriceSeries) -> IndicatorFrame {
    let close = series.closes();
    debug!("Computing indicators over {} closes", close.len());

    IndicatorFrame {
        dates: series.dates(),
        sma_20: sma(&close, SMA_WINDOW),
        ema_20: ema(&close, EMA_WINDOW),
        rsi_14: rsi(&close, RSI_WINDOW),
        macd_diff: macd_diff(&close, MACD_FAST, MACD_SLOW, MACD_SIGNAL),
        close,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceBar;
    use chrono::NaiveDate;

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.map(|a| (a - b).abs() < 1e-9).unwrap_or(false)
    }

    #[test]
    fn sma_is_undefined_before_window() {
        let result = sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(result.len(), 5);
        assert_eq!(&result[..2], &[None, None]);
        assert!(approx(result[2], 2.0));
        assert!(approx(result[3], 3.0));
        assert!(approx(result[4], 4.0));
    }

    #[test]
    fn sma_with_short_series_is_all_undefined() {
        assert_eq!(sma(&[1.0, 2.0], 3), vec![None, None]);
        assert_eq!(sma(&[1.0, 2.0], 0), vec![None, None]);
    }

    #[test]
    fn ema_is_seeded_at_first_value() {
        // alpha = 0.5: 1, 1.5, 2.25, 3.125
        let result = ema(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(&result[..2], &[None, None]);
        assert!(approx(result[2], 2.25));
        assert!(approx(result[3], 3.125));
    }

    #[test]
    fn rsi_first_defined_at_window_minus_one() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 + (i as f64 * 0.7).sin() * 3.0).collect();
        let result = rsi(&prices, 14);
        assert!(result[..13].iter().all(Option::is_none));
        assert!(result[13..].iter().all(Option::is_some));
        for value in result.iter().flatten() {
            assert!((0.0..=100.0).contains(value));
        }
    }

    #[test]
    fn rsi_small_window_by_hand() {
        // gains 0, 1, 0, 1 and losses 0, 0, 1, 0 smoothed with alpha = 0.5
        let result = rsi(&[1.0, 2.0, 1.0, 2.0], 2);
        assert_eq!(result[0], None);
        assert!(approx(result[1], 100.0));
        assert!((result[2].unwrap() - 100.0 / 3.0).abs() < 1e-9);
        assert!((result[3].unwrap() - (100.0 - 100.0 / 3.5)).abs() < 1e-9);
    }

    #[test]
    fn rsi_matches_reference_values() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64 * 0.7).sin() * 3.0).collect();
        let result = rsi(&prices, 14);
        let expected = [(13, 52.564259), (14, 43.794867), (20, 60.439078), (29, 59.280079)];
        for (idx, value) in expected {
            let got = result[idx].unwrap();
            assert!((got - value).abs() < 1e-5, "index {}: {} vs {}", idx, got, value);
        }
    }

    #[test]
    fn rsi_of_rising_series_is_100() {
        let prices: Vec<f64> = (0..30).map(|i| 10.0 + i as f64).collect();
        let result = rsi(&prices, 14);
        assert!(approx(result[29], 100.0));
    }

    #[test]
    fn rsi_of_falling_series_is_0() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        let result = rsi(&prices, 14);
        assert!(approx(result[29], 0.0));
    }

    #[test]
    fn macd_diff_alignment_and_flat_series() {
        let flat = vec![50.0; 40];
        let result = macd_diff(&flat, 12, 26, 9);
        assert_eq!(result.len(), 40);
        // Slow EMA defined at 25, signal needs 9 MACD values
        assert!(result[..33].iter().all(Option::is_none));
        assert!(result[33..].iter().all(|v| approx(*v, 0.0)));
    }

    #[test]
    fn macd_diff_positive_when_trend_accelerates() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64).powi(2) * 0.05).collect();
        let result = macd_diff(&prices, 12, 26, 9);
        assert!(result[59].unwrap() > 0.0);
    }

    #[test]
    fn frame_columns_share_the_date_index() {
        let bars: Vec<PriceBar> = (0..45)
            .map(|i| PriceBar {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i),
                open: 10.0,
                high: 11.0,
                low: 9.0,
                close: 10.0 + i as f64,
                volume: 1_000,
            })
            .collect();
        let frame = compute_indicators(&PriceSeries::new(bars));

        assert_eq!(frame.dates.len(), 45);
        assert_eq!(frame.sma_20.len(), 45);
        assert_eq!(frame.ema_20.len(), 45);
        assert_eq!(frame.rsi_14.len(), 45);
        assert_eq!(frame.macd_diff.len(), 45);
        assert!(frame.sma_20[18].is_none() && frame.sma_20[19].is_some());
        assert!(frame.ema_20[18].is_none() && frame.ema_20[19].is_some());
        assert!(frame.rsi_14[12].is_none() && frame.rsi_14[13].is_some());
    }
}
