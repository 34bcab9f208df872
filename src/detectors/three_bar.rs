//! Three-bar candlestick pattern detectors
//!
//! Morning Star and Evening Star. "Large" and "small" bodies are judged
//! against the trailing average body at each bar's own position, so the
//! comparison adapts to the series' recent volatility instead of using an
//! absolute price threshold.

use super::helpers;
use crate::{Candle, Pattern, PatternDetector, PatternHit, Period, TrendContext};

// ============================================================
// MORNING STAR
// ============================================================

/// Morning Star - bullish reversal: a large bearish bar, a small-bodied star
/// gapping below it, and a large bullish bar closing back above the midpoint
/// of the first bar's body.
#[derive(Debug, Clone, Copy)]
pub struct MorningStarDetector {
    pub large_body_factor: f64,
    pub small_body_factor: f64,
    pub body_avg_window: Period,
}

impl Default for MorningStarDetector {
    fn default() -> Self {
        Self {
            large_body_factor: 1.0,
            small_body_factor: 1.0,
            body_avg_window: Period::new_const(10),
        }
    }
}

impl PatternDetector for MorningStarDetector {
    fn min_bars(&self) -> usize {
        3
    }

    fn detect(&self, candles: &[Candle], index: usize, _ctx: &TrendContext) -> Option<PatternHit> {
        if index < 2 {
            return None;
        }
        let first = candles.get(index - 2)?;
        let star = candles.get(index - 1)?;
        let third = candles.get(index)?;

        if !first.is_bearish() {
            return None;
        }
        if !third.is_bullish() {
            return None;
        }

        let window = self.body_avg_window.get();

        // First bar: large body relative to its own trailing average
        let first_avg = helpers::trailing_avg_body(candles, index - 2, window);
        if first.body() <= first_avg * self.large_body_factor {
            return None;
        }

        // Star: small body, gapping entirely below the first body
        let star_avg = helpers::trailing_avg_body(candles, index - 1, window);
        if star.body() >= star_avg * self.small_body_factor {
            return None;
        }
        if star.body_top() >= first.body_bottom() {
            return None;
        }

        // Third bar: large body, closing above the first body's midpoint
        let third_avg = helpers::trailing_avg_body(candles, index, window);
        if third.body() <= third_avg * self.large_body_factor {
            return None;
        }
        if third.close() <= first.body_midpoint() {
            return None;
        }

        Some(PatternHit {
            pattern: Pattern::MorningStar,
            start_index: index - 2,
            end_index: index,
        })
    }
}

// ============================================================
// EVENING STAR
// ============================================================

/// Evening Star - bearish reversal, the exact mirror of the Morning Star:
/// large bullish bar, small star gapping above it, large bearish bar closing
/// below the midpoint of the first bar's body.
#[derive(Debug, Clone, Copy)]
pub struct EveningStarDetector {
    pub large_body_factor: f64,
    pub small_body_factor: f64,
    pub body_avg_window: Period,
}

impl Default for EveningStarDetector {
    fn default() -> Self {
        Self {
            large_body_factor: 1.0,
            small_body_factor: 1.0,
            body_avg_window: Period::new_const(10),
        }
    }
}

impl PatternDetector for EveningStarDetector {
    fn min_bars(&self) -> usize {
        3
    }

    fn detect(&self, candles: &[Candle], index: usize, _ctx: &TrendContext) -> Option<PatternHit> {
        if index < 2 {
            return None;
        }
        let first = candles.get(index - 2)?;
        let star = candles.get(index - 1)?;
        let third = candles.get(index)?;

        if !first.is_bullish() {
            return None;
        }
        if !third.is_bearish() {
            return None;
        }

        let window = self.body_avg_window.get();

        let first_avg = helpers::trailing_avg_body(candles, index - 2, window);
        if first.body() <= first_avg * self.large_body_factor {
            return None;
        }

        // Star gaps entirely above the first body
        let star_avg = helpers::trailing_avg_body(candles, index - 1, window);
        if star.body() >= star_avg * self.small_body_factor {
            return None;
        }
        if star.body_bottom() <= first.body_top() {
            return None;
        }

        let third_avg = helpers::trailing_avg_body(candles, index, window);
        if third.body() <= third_avg * self.large_body_factor {
            return None;
        }
        if third.close() >= first.body_midpoint() {
            return None;
        }

        Some(PatternHit {
            pattern: Pattern::EveningStar,
            start_index: index - 2,
            end_index: index,
        })
    }
}
