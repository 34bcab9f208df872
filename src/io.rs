//! CSV ingestion and labeled-file export
//!
//! The tabular boundary of the engine: raw rows are mapped onto typed
//! [`Candle`] values exactly once here, and everything downstream operates on
//! the typed series. Column names are resolved case-insensitively with
//! synonym fallback, rows are sorted chronologically before analysis, and the
//! output file carries the input columns plus one `pattern` column.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::{debug, info, warn};

use crate::{
    analyze_patterns, config::AnalyzerConfig, summarize, AnalysisError, Candle, CandleSeries,
    LabeledCandle, Result,
};

/// Accepted header spellings, matched after lowercasing
const DATE_COLUMNS: &[&str] = &["date", "timestamp", "datetime", "time"];
const OPEN_COLUMNS: &[&str] = &["open"];
const HIGH_COLUMNS: &[&str] = &["high"];
const LOW_COLUMNS: &[&str] = &["low"];
const CLOSE_COLUMNS: &[&str] = &["close"];
const VOLUME_COLUMNS: &[&str] = &["volume", "vol"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%d/%m/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Suffix appended to the input file stem for the output file
const OUTPUT_SUFFIX: &str = "_with_patterns";

/// A row rejected during permissive ingestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 0-based data row position (header excluded)
    pub index: usize,
    pub reason: String,
}

#[derive(Debug)]
struct ColumnMap {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

fn find_column(lower: &[String], names: &[&str]) -> Option<usize> {
    names
        .iter()
        .find_map(|name| lower.iter().position(|header| header == name))
}

fn resolve_columns(headers: &StringRecord) -> Result<ColumnMap> {
    let lower: Vec<String> = headers
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();
    let require = |column: &'static str, names: &[&str]| {
        find_column(&lower, names).ok_or_else(|| AnalysisError::MissingColumn {
            column,
            available: headers.iter().collect::<Vec<_>>().join(", "),
        })
    };

    Ok(ColumnMap {
        date: require("date", DATE_COLUMNS)?,
        open: require("open", OPEN_COLUMNS)?,
        high: require("high", HIGH_COLUMNS)?,
        low: require("low", LOW_COLUMNS)?,
        close: require("close", CLOSE_COLUMNS)?,
        volume: find_column(&lower, VOLUME_COLUMNS),
    })
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
            return Some(datetime.date());
        }
    }
    None
}

fn get_field<'a>(
    record: &'a StringRecord,
    pos: usize,
    name: &str,
    index: usize,
) -> Result<&'a str> {
    record.get(pos).ok_or_else(|| AnalysisError::InvalidCandle {
        index,
        reason: format!("missing {name} field"),
    })
}

fn parse_price(record: &StringRecord, pos: usize, name: &str, index: usize) -> Result<f64> {
    let text = get_field(record, pos, name, index)?;
    text.parse::<f64>()
        .map_err(|_| AnalysisError::InvalidCandle {
            index,
            reason: format!("unparsable {name} value '{text}'"),
        })
}

fn parse_volume(text: &str, index: usize) -> Result<u64> {
    if text.is_empty() {
        return Ok(0);
    }
    if let Ok(volume) = text.parse::<u64>() {
        return Ok(volume);
    }
    // Sources exporting through floating point write volumes like "1000.0"
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 && value.fract() == 0.0 => Ok(value as u64),
        _ => Err(AnalysisError::InvalidCandle {
            index,
            reason: format!("volume must be a non-negative integer, got '{text}'"),
        }),
    }
}

fn parse_row(record: &StringRecord, columns: &ColumnMap, index: usize) -> Result<Candle> {
    let date_text = get_field(record, columns.date, "date", index)?;
    let date = parse_date(date_text).ok_or_else(|| AnalysisError::InvalidCandle {
        index,
        reason: format!("unparsable date '{date_text}'"),
    })?;

    let open = parse_price(record, columns.open, "open", index)?;
    let high = parse_price(record, columns.high, "high", index)?;
    let low = parse_price(record, columns.low, "low", index)?;
    let close = parse_price(record, columns.close, "close", index)?;
    let volume = match columns.volume {
        Some(pos) => parse_volume(get_field(record, pos, "volume", index)?, index)?,
        None => 0,
    };

    Candle::new(date, open, high, low, close, volume).map_err(|err| match err {
        AnalysisError::InvalidCandle { reason, .. } => AnalysisError::InvalidCandle { index, reason },
        other => other,
    })
}

/// Read candles from a CSV file.
///
/// In strict mode (`permissive = false`) the first invalid row fails the
/// whole read with its position. In permissive mode invalid rows are skipped
/// and returned as diagnostics alongside the parsed candles. A missing or
/// unrecognized required column is fatal in both modes.
pub fn read_candles(path: &Path, permissive: bool) -> Result<(Vec<Candle>, Vec<SkippedRow>)> {
    debug!(path = %path.display(), "reading candle file");
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));
    let columns = resolve_columns(reader.headers()?)?;

    let mut candles = Vec::new();
    let mut skipped = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        match parse_row(&record, &columns, index) {
            Ok(candle) => candles.push(candle),
            Err(err) if permissive => {
                warn!(row = index, error = %err, "skipping invalid row");
                skipped.push(SkippedRow {
                    index,
                    reason: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        }
    }

    if candles.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    Ok((candles, skipped))
}

/// Write labeled rows as CSV: the candle columns plus one `pattern` column.
pub fn write_labeled(path: &Path, rows: &[LabeledCandle]) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(BufWriter::new(File::create(path)?));
    writer.write_record(["date", "open", "high", "low", "close", "volume", "pattern"])?;
    for row in rows {
        let candle = &row.candle;
        writer.write_record([
            candle.date().to_string(),
            candle.open().to_string(),
            candle.high().to_string(),
            candle.low().to_string(),
            candle.close().to_string(),
            candle.volume().to_string(),
            row.label(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn labeled_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("candles");
    input.with_file_name(format!("{stem}{OUTPUT_SUFFIX}.csv"))
}

/// Read a candle CSV, run the pattern analysis, and write the labeled rows
/// to `<stem>_with_patterns.csv` beside the input. Returns the output path.
pub fn process_file(input: &Path, config: &AnalyzerConfig) -> Result<PathBuf> {
    info!(path = %input.display(), "processing candle file");

    let (candles, skipped) = read_candles(input, config.permissive)?;
    if !skipped.is_empty() {
        warn!(skipped = skipped.len(), "rows skipped during ingestion");
    }

    let series = CandleSeries::from_unsorted(candles)?;
    let rows = analyze_patterns(&series, config)?;

    let output = labeled_output_path(input);
    write_labeled(&output, &rows)?;

    let summary = summarize(&rows);
    info!(path = %output.display(), rows = rows.len(), "wrote labeled candle file");
    for (pattern, stats) in &summary {
        if stats.count > 0 {
            info!(pattern = pattern.as_str(), count = stats.count, "pattern occurrences");
        }
    }

    Ok(output)
}

/// Process the most recently modified `<prefix>*.csv` file in a directory.
/// Previously produced output files are not considered.
pub fn process_latest_file(dir: &Path, prefix: &str, config: &AnalyzerConfig) -> Result<PathBuf> {
    let mut latest: Option<(std::time::SystemTime, PathBuf)> = None;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if !name.starts_with(prefix)
            || !name.ends_with(".csv")
            || name.ends_with(&format!("{OUTPUT_SUFFIX}.csv"))
        {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        if latest.as_ref().map_or(true, |(time, _)| modified > *time) {
            latest = Some((modified, path));
        }
    }

    let (_, path) = latest.ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no '{prefix}*.csv' files in {}", dir.display()),
        )
    })?;
    info!(path = %path.display(), "found latest candle file");
    process_file(&path, config)
}
