//! Common helper functions for candlestick pattern detection
//!
//! Trailing-window averages shared across the detector modules. A trailing
//! window at bar `i` covers `[max(0, i - window), i)` - the bar itself is
//! excluded, so a bar is always compared against its own history.

use crate::Candle;

/// Average real-body size over the trailing window at `at`.
///
/// At the first bar there is no history; the bar's own body is the fallback,
/// which makes `body > avg * factor` comparisons fail there - a bar cannot be
/// "large" relative to itself.
#[inline]
pub fn trailing_avg_body(candles: &[Candle], at: usize, window: usize) -> f64 {
    if at == 0 {
        return candles[0].body();
    }
    let start = at.saturating_sub(window);
    let slice = &candles[start..at];
    slice.iter().map(Candle::body).sum::<f64>() / slice.len() as f64
}

/// Simple moving average of the closes of the `window` bars preceding `at`.
///
/// Returns `None` unless a full window of history exists - a partial window
/// is not a trend signal.
#[inline]
pub fn trailing_close_sma(candles: &[Candle], at: usize, window: usize) -> Option<f64> {
    if at < window {
        return None;
    }
    let slice = &candles[at - window..at];
    Some(slice.iter().map(Candle::close).sum::<f64>() / window as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn candle(d: u32, o: f64, h: f64, l: f64, c: f64) -> Candle {
        let date = NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        Candle::new(date, o, h, l, c, 0).unwrap()
    }

    #[test]
    fn test_trailing_avg_body_excludes_current_bar() {
        let candles = vec![
            candle(1, 100.0, 102.0, 99.0, 101.0), // body 1
            candle(2, 100.0, 104.0, 99.0, 103.0), // body 3
            candle(3, 100.0, 111.0, 99.0, 110.0), // body 10
        ];
        assert!((trailing_avg_body(&candles, 2, 10) - 2.0).abs() < f64::EPSILON);
        assert!((trailing_avg_body(&candles, 1, 10) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_trailing_avg_body_first_bar_falls_back_to_itself() {
        let candles = vec![candle(1, 100.0, 105.0, 99.0, 104.0)];
        assert!((trailing_avg_body(&candles, 0, 10) - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_trailing_close_sma_requires_full_window() {
        let candles = vec![
            candle(1, 100.0, 107.0, 99.0, 106.0),
            candle(2, 100.0, 105.0, 99.0, 104.0),
            candle(3, 100.0, 103.0, 99.0, 102.0),
            candle(4, 100.0, 102.0, 98.0, 101.0),
        ];
        assert_eq!(trailing_close_sma(&candles, 2, 3), None);
        let sma = trailing_close_sma(&candles, 3, 3).unwrap();
        assert!((sma - 104.0).abs() < f64::EPSILON);
    }
}
