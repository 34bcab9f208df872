//! Single-bar candlestick pattern detectors
//!
//! Doji, Hammer, and Shooting Star. Hammer and Shooting Star are gated on
//! local trend context: the same shape after an uptrend and after a downtrend
//! carries different conventional names, so each only fires on its own side
//! of the trailing close average.

use crate::{Candle, Pattern, PatternDetector, PatternHit, Ratio, TrendContext};

// ============================================================
// DOJI
// ============================================================

/// Doji - real body is a negligible fraction of the bar's range.
///
/// A zero-range bar (open = high = low = close) is a distinct degenerate case
/// and is never classified as a Doji.
#[derive(Debug, Clone, Copy)]
pub struct DojiDetector {
    pub max_body_ratio: Ratio,
}

impl Default for DojiDetector {
    fn default() -> Self {
        Self {
            max_body_ratio: Ratio::new_const(0.1),
        }
    }
}

impl PatternDetector for DojiDetector {
    fn min_bars(&self) -> usize {
        1
    }

    fn detect(&self, candles: &[Candle], index: usize, _ctx: &TrendContext) -> Option<PatternHit> {
        let candle = candles.get(index)?;
        // body_ratio is None on a zero-range bar, so the degenerate case
        // falls out here
        let ratio = candle.body_ratio()?;
        if ratio > self.max_body_ratio.get() {
            return None;
        }

        Some(PatternHit {
            pattern: Pattern::Doji,
            start_index: index,
            end_index: index,
        })
    }
}

// ============================================================
// HAMMER
// ============================================================

/// Hammer - long lower shadow, small upper shadow, after a local downtrend.
#[derive(Debug, Clone, Copy)]
pub struct HammerDetector {
    /// Minimum lower-shadow length as a multiple of the body
    pub shadow_body_ratio: f64,
}

impl Default for HammerDetector {
    fn default() -> Self {
        Self {
            shadow_body_ratio: 2.0,
        }
    }
}

impl PatternDetector for HammerDetector {
    fn min_bars(&self) -> usize {
        1
    }

    fn detect(&self, candles: &[Candle], index: usize, ctx: &TrendContext) -> Option<PatternHit> {
        let candle = candles.get(index)?;
        if candle.range() <= 0.0 {
            return None;
        }
        // Trend gate: only meaningful at a local low
        let sma = ctx.close_sma?;
        if candle.close() >= sma {
            return None;
        }

        let body = candle.body();
        if candle.lower_shadow() < self.shadow_body_ratio * body {
            return None;
        }
        if candle.upper_shadow() > body {
            return None;
        }

        Some(PatternHit {
            pattern: Pattern::Hammer,
            start_index: index,
            end_index: index,
        })
    }
}

// ============================================================
// SHOOTING STAR
// ============================================================

/// Shooting Star - mirror of the Hammer: long upper shadow, small lower
/// shadow, after a local uptrend.
#[derive(Debug, Clone, Copy)]
pub struct ShootingStarDetector {
    /// Minimum upper-shadow length as a multiple of the body
    pub shadow_body_ratio: f64,
}

impl Default for ShootingStarDetector {
    fn default() -> Self {
        Self {
            shadow_body_ratio: 2.0,
        }
    }
}

impl PatternDetector for ShootingStarDetector {
    fn min_bars(&self) -> usize {
        1
    }

    fn detect(&self, candles: &[Candle], index: usize, ctx: &TrendContext) -> Option<PatternHit> {
        let candle = candles.get(index)?;
        if candle.range() <= 0.0 {
            return None;
        }
        let sma = ctx.close_sma?;
        if candle.close() <= sma {
            return None;
        }

        let body = candle.body();
        if candle.upper_shadow() < self.shadow_body_ratio * body {
            return None;
        }
        if candle.lower_shadow() > body {
            return None;
        }

        Some(PatternHit {
            pattern: Pattern::ShootingStar,
            start_index: index,
            end_index: index,
        })
    }
}
