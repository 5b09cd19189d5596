//! Explicit mapping from a provider's [`RawFrame`] onto [`PriceBar`]s.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;

use crate::{
    fetcher::{FetchFailure, extrema::DailyRange},
    models::{
        bar::PriceBar,
        raw_frame::{RawFrame, RawValue},
    },
};

/// A canonical field and the header names accepted for it.
struct Field {
    name: &'static str,
    aliases: &'static [&'static str],
}

const DATE: Field = Field {
    name: "date",
    aliases: &["date", "datetime"],
};
const OPEN: Field = Field {
    name: "open",
    aliases: &["open"],
};
const HIGH: Field = Field {
    name: "high",
    aliases: &["high"],
};
const LOW: Field = Field {
    name: "low",
    aliases: &["low"],
};
const CLOSE: Field = Field {
    name: "close",
    aliases: &["close"],
};
const VOLUME: Field = Field {
    name: "volume",
    aliases: &["volume"],
};

fn locate(index: &IndexMap<String, usize>, field: &Field) -> Result<usize, FetchFailure> {
    field
        .aliases
        .iter()
        .find_map(|alias| index.get(*alias).copied())
        .ok_or(FetchFailure::MissingColumn { column: field.name })
}

/// Normalizes a provider frame into chronological bars.
///
/// Multi-level headers are flattened to their outer level first; when two
/// headers collapse to the same name the leftmost one is used. Rows whose
/// price and volume cells are all null are provider placeholders and are
/// dropped. Bars come back sorted by date with one bar per date; on duplicate
/// dates the row appearing later in the response wins.
///
/// An empty frame yields an empty vector, not an error: whether "no data" is
/// fatal depends on the caller.
pub fn normalize_frame(mut frame: RawFrame) -> Result<Vec<PriceBar>, FetchFailure> {
    if frame.is_empty() {
        return Ok(Vec::new());
    }

    let index = column_index(&mut frame);
    let date_at = locate(&index, &DATE)?;
    let value_fields = [&OPEN, &HIGH, &LOW, &CLOSE, &VOLUME];
    let mut value_at = [0usize; 5];
    for (slot, field) in value_at.iter_mut().zip(value_fields) {
        *slot = locate(&index, field)?;
    }

    let mut bars: Vec<PriceBar> = Vec::with_capacity(frame.height());
    for (row, cells) in frame.rows().iter().enumerate() {
        let values = value_at.map(|at| &cells[at]);
        if values.iter().all(|cell| cell.is_null()) {
            continue;
        }
        let invalid = |reason: String| FetchFailure::InvalidRow { row, reason };

        if let Some((field, _)) = value_fields
            .iter()
            .zip(values)
            .find(|(_, cell)| cell.is_null())
        {
            return Err(invalid(format!("`{}` is null", field.name)));
        }

        let [open, high, low, close, volume] = values;
        bars.push(PriceBar {
            date: coerce_date(&cells[date_at]).map_err(invalid)?,
            open: coerce_number(OPEN.name, open).map_err(invalid)?,
            high: coerce_number(HIGH.name, high).map_err(invalid)?,
            low: coerce_number(LOW.name, low).map_err(invalid)?,
            close: coerce_number(CLOSE.name, close).map_err(invalid)?,
            volume: coerce_volume(volume).map_err(invalid)?,
        });
    }

    // Stable sort keeps response order among equal dates, so the last one wins.
    bars.sort_by_key(|bar| bar.date);
    let mut deduped: Vec<PriceBar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match deduped.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            _ => deduped.push(bar),
        }
    }

    Ok(deduped)
}

/// Reads only `date`, `high` and `low` from a long history, for extrema.
///
/// Unlike [`normalize_frame`], bad cells do not fail the frame: a row with an
/// unusable date is skipped, and an unusable `high` or `low` is left out of
/// that side of the scan only. Missing columns are still an error.
pub fn daily_ranges(mut frame: RawFrame) -> Result<Vec<DailyRange>, FetchFailure> {
    if frame.is_empty() {
        return Ok(Vec::new());
    }

    let index = column_index(&mut frame);
    let date_at = locate(&index, &DATE)?;
    let high_at = locate(&index, &HIGH)?;
    let low_at = locate(&index, &LOW)?;

    let mut ranges: Vec<DailyRange> = frame
        .rows()
        .iter()
        .filter_map(|cells| {
            let date = coerce_date(&cells[date_at]).ok()?;
            Some(DailyRange {
                date,
                high: coerce_number(HIGH.name, &cells[high_at]).ok(),
                low: coerce_number(LOW.name, &cells[low_at]).ok(),
            })
        })
        .filter(|range| range.high.is_some() || range.low.is_some())
        .collect();
    ranges.sort_by_key(|range| range.date);
    Ok(ranges)
}

/// Flattens headers and maps each lowercased name to its leftmost position.
fn column_index(frame: &mut RawFrame) -> IndexMap<String, usize> {
    frame.flatten_columns();
    let mut index = IndexMap::new();
    for (position, column) in frame.columns().iter().enumerate() {
        index
            .entry(column.level0().trim().to_ascii_lowercase())
            .or_insert(position);
    }
    index
}

/// Reduces a date-like cell to a calendar date.
///
/// Timestamps keep the date in the offset they carry, so an exchange-local
/// open time never rolls over into the neighbouring UTC day.
fn coerce_date(cell: &RawValue) -> Result<NaiveDate, String> {
    match cell {
        RawValue::Date(date) => Ok(*date),
        RawValue::Timestamp(ts) => Ok(ts.date_naive()),
        RawValue::Text(text) => {
            let text = text.trim();
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .or_else(|_| DateTime::parse_from_rfc3339(text).map(|ts| ts.date_naive()))
                .or_else(|_| {
                    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").map(|ts| ts.date())
                })
                .map_err(|_| format!("`date` value {text:?} is not a date"))
        }
        RawValue::Null => Err("`date` is null".to_string()),
        RawValue::Number(n) => Err(format!("`date` value {n} is not a date")),
    }
}

fn coerce_number(field: &str, cell: &RawValue) -> Result<f64, String> {
    let value = match cell {
        RawValue::Number(n) => *n,
        RawValue::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("`{field}` value {text:?} is not numeric"))?,
        other => return Err(format!("`{field}` value {other:?} is not numeric")),
    };
    if !value.is_finite() || value < 0.0 {
        return Err(format!("`{field}` value {value} is not a non-negative number"));
    }
    Ok(value)
}

fn coerce_volume(cell: &RawValue) -> Result<u64, String> {
    let value = coerce_number(VOLUME.name, cell)?;
    if value.fract() != 0.0 || value > u64::MAX as f64 {
        return Err(format!("`volume` value {value} is not a whole number"));
    }
    Ok(value as u64)
}
