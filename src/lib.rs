//! # candlescan
//!
//! Candlestick pattern recognition for ordered OHLC time series.
//!
//! The crate classifies each bar of a date-ordered candle sequence against a
//! closed set of patterns (Doji, Hammer, Shooting Star, Bullish/Bearish
//! Engulfing, Morning/Evening Star), aggregates simultaneous hits into one
//! deterministic per-row label, and derives per-pattern counts and date lists.
//!
//! ## Quick Start
//!
//! ```rust
//! use candlescan::prelude::*;
//! use chrono::NaiveDate;
//!
//! # fn main() -> candlescan::Result<()> {
//! let day = |d: u32| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
//!
//! let candles = vec![
//!     Candle::new(day(1), 108.0, 109.0, 105.0, 106.0, 1_000)?,
//!     Candle::new(day(2), 110.0, 111.0, 99.0, 100.0, 1_200)?,
//!     Candle::new(day(3), 99.0, 113.0, 98.0, 112.0, 1_500)?,
//! ];
//! let series = CandleSeries::new(candles)?;
//!
//! let rows = analyze_patterns(&series, &AnalyzerConfig::default())?;
//! assert_eq!(rows.len(), 3);
//! assert_eq!(rows[2].label(), "bullish_engulfing");
//!
//! let summary = summarize(&rows);
//! assert_eq!(summary[&Pattern::BullishEngulfing].count, 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod detectors;
pub mod io;

pub mod prelude {
    pub use crate::{
        // Aggregation
        analyze_patterns,
        config::AnalyzerConfig,
        // Detectors
        detectors::{
            DojiDetector, EngulfingDetector, EveningStarDetector, HammerDetector,
            MorningStarDetector, ShootingStarDetector,
        },
        // File processing
        io::{process_file, process_latest_file, read_candles, write_labeled},
        pattern_dates,
        summarize,
        // Errors
        AnalysisError,
        // Engine
        BuiltinDetector,
        // Types
        Candle,
        CandleSeries,
        Direction,
        LabeledCandle,
        Pattern,
        PatternAnalyzer,
        // Core traits
        PatternDetector,
        PatternHit,
        PatternStats,
        PatternSummary,
        Period,
        Ratio,
        Result,
        TrendContext,
    };
}

use std::collections::BTreeMap;

use chrono::NaiveDate;

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that can occur during ingestion or pattern analysis
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Missing required column '{column}', available columns: [{available}]")]
    MissingColumn {
        column: &'static str,
        available: String,
    },

    #[error("Invalid candle at row {index}: {reason}")]
    InvalidCandle { index: usize, reason: String },

    #[error("Rows not in ascending date order at row {index}: {date} follows {previous}")]
    UnorderedDates {
        index: usize,
        date: NaiveDate,
        previous: NaiveDate,
    },

    #[error("Conflicting data for duplicate date {date} at row {index}")]
    ConflictingDuplicate { index: usize, date: NaiveDate },

    #[error("No candles supplied")]
    EmptyInput,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(AnalysisError::InvalidValue(
                "Ratio cannot be NaN or infinite",
            ));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(AnalysisError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    /// Create a Ratio from a compile-time constant (library internal use)
    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Window size in bars (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(AnalysisError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// CANDLE MODEL
// ============================================================

/// One validated OHLCV bar.
///
/// Fields are private; construction goes through [`Candle::new`], which
/// enforces `low <= min(open, close)`, `max(open, close) <= high`, and finite
/// price values. A zero-range candle (open = high = low = close) is valid.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Candle {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

impl Candle {
    pub fn new(
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Result<Self> {
        let candle = Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        };
        candle.check()?;
        Ok(candle)
    }

    /// Construction invariants. Errors carry row index 0; callers that know
    /// the real position rewrite it.
    fn check(&self) -> Result<()> {
        for (name, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if !value.is_finite() {
                return Err(AnalysisError::InvalidCandle {
                    index: 0,
                    reason: format!("{name} is not a finite number"),
                });
            }
        }
        if self.low > self.high {
            return Err(AnalysisError::InvalidCandle {
                index: 0,
                reason: format!("low {} > high {}", self.low, self.high),
            });
        }
        if self.body_bottom() < self.low || self.body_top() > self.high {
            return Err(AnalysisError::InvalidCandle {
                index: 0,
                reason: format!(
                    "open/close outside [low, high]: open {} close {} low {} high {}",
                    self.open, self.close, self.low, self.high
                ),
            });
        }
        Ok(())
    }

    #[inline]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    #[inline]
    pub fn open(&self) -> f64 {
        self.open
    }

    #[inline]
    pub fn high(&self) -> f64 {
        self.high
    }

    #[inline]
    pub fn low(&self) -> f64 {
        self.low
    }

    #[inline]
    pub fn close(&self) -> f64 {
        self.close
    }

    #[inline]
    pub fn volume(&self) -> u64 {
        self.volume
    }

    #[inline]
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    #[inline]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    #[inline]
    pub fn upper_shadow(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    #[inline]
    pub fn lower_shadow(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    #[inline]
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    #[inline]
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Top of the real body: max(open, close)
    #[inline]
    pub fn body_top(&self) -> f64 {
        self.open.max(self.close)
    }

    /// Bottom of the real body: min(open, close)
    #[inline]
    pub fn body_bottom(&self) -> f64 {
        self.open.min(self.close)
    }

    /// Midpoint of the real body: (open + close) / 2
    #[inline]
    pub fn body_midpoint(&self) -> f64 {
        (self.open + self.close) / 2.0
    }

    /// Body as ratio of range. Returns None if range ≈ 0
    #[inline]
    pub fn body_ratio(&self) -> Option<f64> {
        let range = self.range();
        (range > f64::EPSILON).then(|| self.body() / range)
    }
}

impl<'de> serde::Deserialize<'de> for Candle {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        struct RawCandle {
            date: NaiveDate,
            open: f64,
            high: f64,
            low: f64,
            close: f64,
            #[serde(default)]
            volume: u64,
        }

        let raw = RawCandle::deserialize(d)?;
        Candle::new(raw.date, raw.open, raw.high, raw.low, raw.close, raw.volume)
            .map_err(serde::de::Error::custom)
    }
}

/// A candle sequence ordered by ascending date.
///
/// Identical rows sharing a date are permitted (the upstream source decides
/// whether duplicates exist); a repeated date carrying different OHLCV values
/// is rejected as a conflict.
#[derive(Debug, Clone, PartialEq)]
pub struct CandleSeries(Vec<Candle>);

impl CandleSeries {
    /// Build a series from candles already in ascending date order.
    pub fn new(candles: Vec<Candle>) -> Result<Self> {
        for index in 1..candles.len() {
            let prev = &candles[index - 1];
            let curr = &candles[index];
            if curr.date() < prev.date() {
                return Err(AnalysisError::UnorderedDates {
                    index,
                    date: curr.date(),
                    previous: prev.date(),
                });
            }
            if curr.date() == prev.date() && curr != prev {
                return Err(AnalysisError::ConflictingDuplicate {
                    index,
                    date: curr.date(),
                });
            }
        }
        Ok(Self(candles))
    }

    /// Build a series from candles in arbitrary order, sorting by date first.
    /// The sort is stable, so same-date rows keep their relative order.
    pub fn from_unsorted(mut candles: Vec<Candle>) -> Result<Self> {
        candles.sort_by_key(Candle::date);
        Self::new(candles)
    }

    #[inline]
    pub fn candles(&self) -> &[Candle] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candle> {
        self.0.iter()
    }
}

// ============================================================
// PATTERN TAGS
// ============================================================

/// Closed set of recognized patterns.
///
/// Declaration order is the canonical label order - single-candle patterns
/// first, then multi-candle, alphabetical within each group - and the derived
/// `Ord` follows it, so sorting hits yields the canonical label directly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    Doji,
    Hammer,
    ShootingStar,
    BearishEngulfing,
    BullishEngulfing,
    EveningStar,
    MorningStar,
}

impl Pattern {
    /// All tags in canonical order
    pub const ALL: [Pattern; 7] = [
        Pattern::Doji,
        Pattern::Hammer,
        Pattern::ShootingStar,
        Pattern::BearishEngulfing,
        Pattern::BullishEngulfing,
        Pattern::EveningStar,
        Pattern::MorningStar,
    ];

    /// Label fragment used in the output `pattern` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Pattern::Doji => "doji",
            Pattern::Hammer => "hammer",
            Pattern::ShootingStar => "shooting_star",
            Pattern::BearishEngulfing => "bearish_engulfing",
            Pattern::BullishEngulfing => "bullish_engulfing",
            Pattern::EveningStar => "evening_star",
            Pattern::MorningStar => "morning_star",
        }
    }

    /// Typical directional bias of the pattern
    pub fn direction(&self) -> Direction {
        match self {
            Pattern::Doji => Direction::Neutral,
            Pattern::Hammer | Pattern::BullishEngulfing | Pattern::MorningStar => {
                Direction::Bullish
            }
            Pattern::ShootingStar | Pattern::BearishEngulfing | Pattern::EveningStar => {
                Direction::Bearish
            }
        }
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Pattern {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        Pattern::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or(AnalysisError::InvalidValue("unknown pattern tag"))
    }
}

/// Direction/bias of a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    Bullish,
    Neutral,
    Bearish,
}

/// One detected pattern occurrence.
///
/// `end_index` is the confirming candle - the row the label attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternHit {
    pub pattern: Pattern,
    pub start_index: usize,
    pub end_index: usize,
}

/// A candle together with every pattern confirmed at its row, in canonical
/// order.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LabeledCandle {
    pub candle: Candle,
    pub patterns: Vec<Pattern>,
}

impl LabeledCandle {
    /// Comma-joined label for the output `pattern` column; empty when no
    /// pattern fired.
    pub fn label(&self) -> String {
        let mut label = String::new();
        for (i, pattern) in self.patterns.iter().enumerate() {
            if i > 0 {
                label.push(',');
            }
            label.push_str(pattern.as_str());
        }
        label
    }
}

// ============================================================
// TREND CONTEXT
// ============================================================

/// Local trend context at a specific bar, precomputed for the whole series.
///
/// `close_sma` is the simple moving average of the closes of the
/// `trend_window` bars preceding the bar (the bar itself excluded); `None`
/// until enough history exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendContext {
    pub close_sma: Option<f64>,
}

/// Compute the per-bar trend context for a candle slice.
pub fn compute_contexts(candles: &[Candle], trend_window: Period) -> Vec<TrendContext> {
    (0..candles.len())
        .map(|i| TrendContext {
            close_sma: detectors::helpers::trailing_close_sma(candles, i, trend_window.get()),
        })
        .collect()
}

// ============================================================
// PATTERN DETECTOR TRAIT
// ============================================================

/// A stateless predicate over a trailing candle window.
///
/// Detectors are pure: they read only the slice and context they are handed
/// and never error - numeric edge cases degrade to "no hit".
pub trait PatternDetector: Send + Sync {
    /// Smallest window (in bars) the detector needs; it is never invoked at
    /// an index where that window would extend before the first bar.
    fn min_bars(&self) -> usize;

    fn detect(&self, candles: &[Candle], index: usize, ctx: &TrendContext) -> Option<PatternHit>;
}

// ============================================================
// BUILTIN DETECTORS
// ============================================================

use detectors::{
    DojiDetector, EngulfingDetector, EveningStarDetector, HammerDetector, MorningStarDetector,
    ShootingStarDetector,
};

/// All builtin detectors - fast path via enum dispatch
#[derive(Debug, Clone)]
pub enum BuiltinDetector {
    Doji(DojiDetector),
    Hammer(HammerDetector),
    ShootingStar(ShootingStarDetector),
    Engulfing(EngulfingDetector),
    MorningStar(MorningStarDetector),
    EveningStar(EveningStarDetector),
}

impl BuiltinDetector {
    #[inline]
    pub fn min_bars(&self) -> usize {
        match self {
            Self::Doji(d) => d.min_bars(),
            Self::Hammer(d) => d.min_bars(),
            Self::ShootingStar(d) => d.min_bars(),
            Self::Engulfing(d) => d.min_bars(),
            Self::MorningStar(d) => d.min_bars(),
            Self::EveningStar(d) => d.min_bars(),
        }
    }

    #[inline]
    pub fn detect(
        &self,
        candles: &[Candle],
        index: usize,
        ctx: &TrendContext,
    ) -> Option<PatternHit> {
        match self {
            Self::Doji(d) => d.detect(candles, index, ctx),
            Self::Hammer(d) => d.detect(candles, index, ctx),
            Self::ShootingStar(d) => d.detect(candles, index, ctx),
            Self::Engulfing(d) => d.detect(candles, index, ctx),
            Self::MorningStar(d) => d.detect(candles, index, ctx),
            Self::EveningStar(d) => d.detect(candles, index, ctx),
        }
    }
}

// ============================================================
// PATTERN ANALYZER
// ============================================================

use config::AnalyzerConfig;
use rayon::prelude::*;

/// Runs all detectors over an ordered candle series and merges the per-row
/// hits into one deterministic label each.
#[derive(Debug, Clone)]
pub struct PatternAnalyzer {
    config: AnalyzerConfig,
    detectors: Vec<BuiltinDetector>,
}

impl PatternAnalyzer {
    /// Build an analyzer, validating the configuration first.
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        let detectors = vec![
            BuiltinDetector::Doji(DojiDetector {
                max_body_ratio: config.doji_max_body_ratio,
            }),
            BuiltinDetector::Hammer(HammerDetector {
                shadow_body_ratio: config.shadow_body_ratio,
            }),
            BuiltinDetector::ShootingStar(ShootingStarDetector {
                shadow_body_ratio: config.shadow_body_ratio,
            }),
            BuiltinDetector::Engulfing(EngulfingDetector),
            BuiltinDetector::MorningStar(MorningStarDetector {
                large_body_factor: config.large_body_factor,
                small_body_factor: config.small_body_factor,
                body_avg_window: config.body_avg_window,
            }),
            BuiltinDetector::EveningStar(EveningStarDetector {
                large_body_factor: config.large_body_factor,
                small_body_factor: config.small_body_factor,
                body_avg_window: config.body_avg_window,
            }),
        ];
        Ok(Self { config, detectors })
    }

    #[inline]
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Label every row of the series. Output has exactly one row per input
    /// candle, in input order, dates unchanged.
    pub fn analyze(&self, series: &CandleSeries) -> Result<Vec<LabeledCandle>> {
        let candles = series.candles();
        if candles.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let contexts = compute_contexts(candles, self.config.trend_window);
        let rows = candles
            .iter()
            .enumerate()
            .map(|(i, candle)| LabeledCandle {
                candle: *candle,
                patterns: self.patterns_at(candles, i, &contexts[i]),
            })
            .collect();

        tracing::debug!(rows = candles.len(), "pattern analysis complete");
        Ok(rows)
    }

    /// Like [`analyze`](Self::analyze), evaluating rows across rayon workers.
    /// Rows depend only on their trailing window, so they parallelize freely;
    /// the indexed collect keeps the output in row order.
    pub fn analyze_parallel(&self, series: &CandleSeries) -> Result<Vec<LabeledCandle>> {
        let candles = series.candles();
        if candles.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let contexts = compute_contexts(candles, self.config.trend_window);
        let rows = (0..candles.len())
            .into_par_iter()
            .map(|i| LabeledCandle {
                candle: candles[i],
                patterns: self.patterns_at(candles, i, &contexts[i]),
            })
            .collect();

        tracing::debug!(rows = candles.len(), "parallel pattern analysis complete");
        Ok(rows)
    }

    /// Flat list of every hit in the series, grouped by confirming index.
    pub fn hits(&self, series: &CandleSeries) -> Result<Vec<PatternHit>> {
        let candles = series.candles();
        if candles.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let contexts = compute_contexts(candles, self.config.trend_window);
        let mut hits = Vec::new();
        for index in 0..candles.len() {
            let mut row_hits: Vec<PatternHit> = self
                .detectors
                .iter()
                .filter(|d| index + 1 >= d.min_bars())
                .filter_map(|d| d.detect(candles, index, &contexts[index]))
                .collect();
            row_hits.sort_unstable_by_key(|h| h.pattern);
            hits.extend(row_hits);
        }
        Ok(hits)
    }

    fn patterns_at(&self, candles: &[Candle], index: usize, ctx: &TrendContext) -> Vec<Pattern> {
        let mut patterns: Vec<Pattern> = self
            .detectors
            .iter()
            .filter(|d| index + 1 >= d.min_bars())
            .filter_map(|d| d.detect(candles, index, ctx))
            .map(|hit| hit.pattern)
            .collect();
        patterns.sort_unstable();
        patterns
    }
}

/// Analyze a series with the given configuration. Convenience wrapper over
/// [`PatternAnalyzer`].
pub fn analyze_patterns(
    series: &CandleSeries,
    config: &AnalyzerConfig,
) -> Result<Vec<LabeledCandle>> {
    PatternAnalyzer::new(config.clone())?.analyze(series)
}

// ============================================================
// SUMMARY & QUERY
// ============================================================

/// Occurrence statistics for one pattern tag
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct PatternStats {
    pub count: usize,
    pub dates: Vec<NaiveDate>,
}

/// Per-pattern occurrence statistics, iterated in canonical tag order
pub type PatternSummary = BTreeMap<Pattern, PatternStats>;

/// Count occurrences and collect the ordered hit dates for every tag.
/// Tags that never fired are present with count 0 and no dates.
pub fn summarize(rows: &[LabeledCandle]) -> PatternSummary {
    let mut summary: PatternSummary = Pattern::ALL
        .into_iter()
        .map(|p| (p, PatternStats::default()))
        .collect();

    for row in rows {
        for pattern in &row.patterns {
            let stats = summary.entry(*pattern).or_default();
            stats.count += 1;
            stats.dates.push(row.candle.date());
        }
    }

    summary
}

/// Dates at which one pattern fired, in row order. Empty when the pattern
/// never occurred - that is not an error.
pub fn pattern_dates(rows: &[LabeledCandle], pattern: Pattern) -> Vec<NaiveDate> {
    rows.iter()
        .filter(|row| row.patterns.contains(&pattern))
        .map(|row| row.candle.date())
        .collect()
}

// ============================================================
// TESTS
// ============================================================
