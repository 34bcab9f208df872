//! Property-based tests over arbitrary valid candle sequences.

use candlescan::prelude::*;
use chrono::{Days, NaiveDate};
use proptest::prelude::*;

/// Arbitrary valid OHLC geometry: open and close always land inside
/// [low, high] by construction.
fn candle_spec() -> impl Strategy<Value = (f64, f64, f64, f64)> {
    (
        10.0..1000.0f64, // center
        0.0..20.0f64,    // extent above
        0.0..20.0f64,    // extent below
        0.0..=1.0f64,    // open position within the range
        0.0..=1.0f64,    // close position within the range
    )
        .prop_map(|(center, up, down, open_t, close_t)| {
            let low = center - down;
            let high = center + up;
            let open = low + (high - low) * open_t;
            let close = low + (high - low) * close_t;
            (open, high, low, close)
        })
}

fn series_strategy() -> impl Strategy<Value = CandleSeries> {
    prop::collection::vec(candle_spec(), 1..120).prop_map(|specs| {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let candles = specs
            .into_iter()
            .enumerate()
            .map(|(i, (o, h, l, c))| {
                Candle::new(start + Days::new(i as u64), o, h, l, c, 100).unwrap()
            })
            .collect();
        CandleSeries::new(candles).unwrap()
    })
}

proptest! {
    #[test]
    fn analyze_preserves_row_count_order_and_dates(series in series_strategy()) {
        let rows = analyze_patterns(&series, &AnalyzerConfig::default()).unwrap();
        prop_assert_eq!(rows.len(), series.len());
        for (row, candle) in rows.iter().zip(series.iter()) {
            prop_assert_eq!(row.candle.date(), candle.date());
        }
    }

    #[test]
    fn analyze_is_idempotent(series in series_strategy()) {
        let config = AnalyzerConfig::default();
        let first = analyze_patterns(&series, &config).unwrap();
        let second = analyze_patterns(&series, &config).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn parallel_analysis_matches_sequential(series in series_strategy()) {
        let analyzer = PatternAnalyzer::new(AnalyzerConfig::default()).unwrap();
        let sequential = analyzer.analyze(&series).unwrap();
        let parallel = analyzer.analyze_parallel(&series).unwrap();
        prop_assert_eq!(sequential, parallel);
    }

    #[test]
    fn summary_counts_always_match_date_lists(series in series_strategy()) {
        let rows = analyze_patterns(&series, &AnalyzerConfig::default()).unwrap();
        let summary = summarize(&rows);
        for pattern in Pattern::ALL {
            let dates = pattern_dates(&rows, pattern);
            prop_assert_eq!(summary[&pattern].count, dates.len());
            prop_assert_eq!(&summary[&pattern].dates, &dates);
            prop_assert!(dates.windows(2).all(|pair| pair[0] <= pair[1]));
        }
    }

    #[test]
    fn labels_are_canonical_and_round_trip(series in series_strategy()) {
        let rows = analyze_patterns(&series, &AnalyzerConfig::default()).unwrap();
        for row in &rows {
            // patterns are sorted and unique
            prop_assert!(row.patterns.windows(2).all(|pair| pair[0] < pair[1]));

            let label = row.label();
            if label.is_empty() {
                prop_assert!(row.patterns.is_empty());
            } else {
                let parsed: Vec<Pattern> = label
                    .split(',')
                    .map(|tag| tag.parse::<Pattern>().unwrap())
                    .collect();
                prop_assert_eq!(&parsed, &row.patterns);
            }
        }
    }

    #[test]
    fn zero_range_bars_are_never_labeled(spec in 10.0..1000.0f64) {
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let flat = Candle::new(date, spec, spec, spec, spec, 0).unwrap();
        let series = CandleSeries::new(vec![flat]).unwrap();
        let rows = analyze_patterns(&series, &AnalyzerConfig::default()).unwrap();
        prop_assert!(rows[0].patterns.is_empty());
    }
}
