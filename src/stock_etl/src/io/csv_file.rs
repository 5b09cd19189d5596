//! CSV encoding of a [`Dataset`] in its fixed column order.

use std::io::Write;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::dataset::{Dataset, DatasetRow, RunTimestamp};

// Field order must match `Dataset::columns`.
#[derive(Serialize)]
struct BarRecord<'a> {
    ticker: &'a str,
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
    timestamp: RunTimestamp,
}

#[derive(Serialize)]
struct ExtremaBarRecord<'a> {
    ticker: &'a str,
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
    all_time_high: Option<f64>,
    all_time_high_date: Option<NaiveDate>,
    all_time_low: Option<f64>,
    all_time_low_date: Option<NaiveDate>,
    timestamp: RunTimestamp,
}

impl<'a> From<&'a DatasetRow> for BarRecord<'a> {
    fn from(row: &'a DatasetRow) -> Self {
        Self {
            ticker: &row.ticker,
            date: row.bar.date,
            open: row.bar.open,
            high: row.bar.high,
            low: row.bar.low,
            close: row.bar.close,
            volume: row.bar.volume,
            timestamp: row.timestamp,
        }
    }
}

impl<'a> From<&'a DatasetRow> for ExtremaBarRecord<'a> {
    fn from(row: &'a DatasetRow) -> Self {
        let extrema = row.extrema.as_ref();
        Self {
            ticker: &row.ticker,
            date: row.bar.date,
            open: row.bar.open,
            high: row.bar.high,
            low: row.bar.low,
            close: row.bar.close,
            volume: row.bar.volume,
            all_time_high: extrema.map(|e| e.all_time_high),
            all_time_high_date: extrema.map(|e| e.all_time_high_date),
            all_time_low: extrema.map(|e| e.all_time_low),
            all_time_low_date: extrema.map(|e| e.all_time_low_date),
            timestamp: row.timestamp,
        }
    }
}

/// Writes a header line followed by one record per row.
///
/// Missing extrema are written as empty cells.
pub fn write_dataset<W: Write>(dataset: &Dataset, writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(dataset.columns())?;

    for row in dataset.rows() {
        if dataset.include_extrema() {
            wtr.serialize(ExtremaBarRecord::from(row))?;
        } else {
            wtr.serialize(BarRecord::from(row))?;
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{bar::PriceBar, symbol_history::Extrema};

    fn row(ticker: &str, extrema: Option<Extrema>) -> DatasetRow {
        DatasetRow {
            ticker: ticker.to_string(),
            bar: PriceBar {
                date: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
                open: 1.0,
                high: 2.0,
                low: 0.5,
                close: 1.5,
                volume: 10,
            },
            extrema,
            timestamp: "2025-10-01_08-00-00".parse().unwrap(),
        }
    }

    fn encode(dataset: &Dataset) -> String {
        let mut buf = Vec::new();
        write_dataset(dataset, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn writes_plain_schema() {
        let dataset = Dataset::new(
            "2025-10-01_08-00-00".parse().unwrap(),
            false,
            vec![row("AAA", None)],
        );

        assert_eq!(
            encode(&dataset),
            "ticker,date,open,high,low,close,volume,timestamp\n\
             AAA,2025-10-01,1.0,2.0,0.5,1.5,10,2025-10-01_08-00-00\n"
        );
    }

    #[test]
    fn unavailable_extrema_are_empty_cells() {
        let extrema = Extrema {
            all_time_high: 3.0,
            all_time_high_date: NaiveDate::from_ymd_opt(2021, 11, 19).unwrap(),
            all_time_low: 0.25,
            all_time_low_date: NaiveDate::from_ymd_opt(2009, 3, 9).unwrap(),
        };
        let dataset = Dataset::new(
            "2025-10-01_08-00-00".parse().unwrap(),
            true,
            vec![row("AAA", Some(extrema)), row("BBB", None)],
        );

        let text = encode(&dataset);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "ticker,date,open,high,low,close,volume,all_time_high,all_time_high_date,all_time_low,all_time_low_date,timestamp"
        );
        assert_eq!(
            lines[1],
            "AAA,2025-10-01,1.0,2.0,0.5,1.5,10,3.0,2021-11-19,0.25,2009-03-09,2025-10-01_08-00-00"
        );
        assert_eq!(lines[2], "BBB,2025-10-01,1.0,2.0,0.5,1.5,10,,,,,2025-10-01_08-00-00");
    }
}
