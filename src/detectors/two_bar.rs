//! Two-bar candlestick pattern detectors
//!
//! Engulfing: the current bar's real body contains the previous bar's real
//! body with the colors reversed. One detector resolves to the bullish or the
//! bearish tag depending on the color sequence.

use crate::{Candle, Pattern, PatternDetector, PatternHit, TrendContext};

/// Engulfing pattern (bullish and bearish).
///
/// Containment is inclusive at both ends: a body that matches the previous
/// body's boundary exactly still engulfs it. The same bounds apply in both
/// directions.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngulfingDetector;

impl PatternDetector for EngulfingDetector {
    fn min_bars(&self) -> usize {
        2
    }

    fn detect(&self, candles: &[Candle], index: usize, _ctx: &TrendContext) -> Option<PatternHit> {
        if index < 1 {
            return None;
        }
        let prev = candles.get(index - 1)?;
        let curr = candles.get(index)?;

        // Bullish: white body swallows the prior black body
        if prev.is_bearish()
            && curr.is_bullish()
            && curr.open() <= prev.close()
            && curr.close() >= prev.open()
        {
            return Some(PatternHit {
                pattern: Pattern::BullishEngulfing,
                start_index: index - 1,
                end_index: index,
            });
        }

        // Bearish: black body swallows the prior white body
        if prev.is_bullish()
            && curr.is_bearish()
            && curr.open() >= prev.close()
            && curr.close() <= prev.open()
        {
            return Some(PatternHit {
                pattern: Pattern::BearishEngulfing,
                start_index: index - 1,
                end_index: index,
            });
        }

        None
    }
}
