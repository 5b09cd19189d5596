use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::models::raw_frame::{ColumnHeader, RawFrame, RawValue};

#[derive(Deserialize, Debug)]
pub struct ChartResponse {
    pub chart: ChartEnvelope,
}

#[derive(Deserialize, Debug)]
pub struct ChartEnvelope {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
pub struct ChartError {
    pub code: String,
    pub description: String,
}

#[derive(Deserialize, Debug)]
pub struct ChartResult {
    pub meta: ChartMeta,
    /// Absent when the symbol exists but has no bars in the window.
    #[serde(default)]
    pub timestamp: Option<Vec<i64>>,
    pub indicators: Indicators,
}

#[derive(Deserialize, Debug)]
pub struct ChartMeta {
    pub symbol: String,
    /// IANA zone of the listing exchange, e.g. `America/New_York`.
    #[serde(default, rename = "exchangeTimezoneName")]
    pub exchange_timezone_name: Option<String>,
    /// The exchange's offset from UTC in seconds at request time.
    #[serde(default)]
    pub gmtoffset: i32,
}

/// The clock bar timestamps are read in.
enum ExchangeClock {
    Zone(Tz),
    /// Only correct for bars on the same side of a DST change as the request.
    Offset(FixedOffset),
}

impl ExchangeClock {
    fn from_meta(meta: &ChartMeta) -> Result<Self, String> {
        if let Some(zone) = meta
            .exchange_timezone_name
            .as_deref()
            .and_then(|name| name.parse::<Tz>().ok())
        {
            return Ok(Self::Zone(zone));
        }
        FixedOffset::east_opt(meta.gmtoffset)
            .map(Self::Offset)
            .ok_or_else(|| format!("gmtoffset {} out of range", meta.gmtoffset))
    }

    fn local(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            Self::Zone(zone) => instant.with_timezone(zone).fixed_offset(),
            Self::Offset(offset) => instant.with_timezone(offset),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<Quote>,
}

#[derive(Deserialize, Debug, Default)]
pub struct Quote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

impl ChartResult {
    /// Lays the parallel arrays out as rows.
    ///
    /// The date column holds each bar's open time in the exchange's own time
    /// zone, with the offset in force on that day. Price columns carry a
    /// second header level with the symbol. When the response has no quote
    /// block only the date column is emitted.
    pub fn into_raw_frame(self) -> Result<RawFrame, String> {
        let clock = ExchangeClock::from_meta(&self.meta)?;
        let timestamps = self.timestamp.unwrap_or_default();
        let symbol = self.meta.symbol;
        let quote = self.indicators.quote.into_iter().next();

        let mut columns = vec![ColumnHeader::flat("Date")];
        if quote.is_some() {
            for field in ["Open", "High", "Low", "Close", "Volume"] {
                columns.push(ColumnHeader::nested([field, symbol.as_str()]));
            }
        }

        let mut rows = Vec::with_capacity(timestamps.len());
        for (i, ts) in timestamps.iter().enumerate() {
            let opened_at = clock.local(
                DateTime::from_timestamp(*ts, 0)
                    .ok_or_else(|| format!("timestamp {ts} out of range"))?,
            );
            let mut row = vec![RawValue::Timestamp(opened_at)];
            if let Some(quote) = &quote {
                for series in [&quote.open, &quote.high, &quote.low, &quote.close, &quote.volume] {
                    row.push(series.get(i).copied().flatten().into());
                }
            }
            rows.push(row);
        }

        RawFrame::new(columns, rows).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AAPL_TWO_DAYS: &str = r#"{
      "chart": {
        "result": [{
          "meta": { "symbol": "AAPL", "gmtoffset": -14400, "exchangeTimezoneName": "America/New_York" },
          "timestamp": [1759325400, 1759411800],
          "indicators": {
            "quote": [{
              "open":   [254.0, 256.5],
              "high":   [258.79, 258.18],
              "low":    [253.8, 254.15],
              "close":  [255.45, null],
              "volume": [48713900, 42630200]
            }],
            "adjclose": [{ "adjclose": [255.45, 257.13] }]
          }
        }],
        "error": null
      }
    }"#;

    #[test]
    fn decodes_into_nested_frame() {
        let response: ChartResponse = serde_json::from_str(AAPL_TWO_DAYS).unwrap();
        let result = response.chart.result.unwrap().into_iter().next().unwrap();
        let frame = result.into_raw_frame().unwrap();

        assert_eq!(frame.height(), 2);
        assert!(frame.has_nested_columns());
        assert_eq!(frame.columns()[1], ColumnHeader::nested(["Open", "AAPL"]));

        // 1759325400 is 2025-10-01T13:30:00Z, 09:30 in New York.
        match &frame.rows()[0][0] {
            RawValue::Timestamp(ts) => {
                assert_eq!(ts.to_rfc3339(), "2025-10-01T09:30:00-04:00");
            }
            other => panic!("expected timestamp, got {other:?}"),
        }
        assert_eq!(frame.rows()[1][4], RawValue::Null);
        assert_eq!(frame.rows()[0][5], RawValue::Number(48713900.0));
    }

    fn first_timestamp(body: &str) -> DateTime<FixedOffset> {
        let response: ChartResponse = serde_json::from_str(body).unwrap();
        let frame = response
            .chart
            .result
            .unwrap()
            .remove(0)
            .into_raw_frame()
            .unwrap();
        match &frame.rows()[0][0] {
            RawValue::Timestamp(ts) => *ts,
            other => panic!("expected timestamp, got {other:?}"),
        }
    }

    #[test]
    fn summer_bar_uses_summer_offset_when_requested_in_winter() {
        // 1721016000 is 2024-07-15T04:00:00Z, midnight in New York (EDT).
        // The request-time offset is EST.
        let body = r#"{"chart":{"result":[{
            "meta":{"symbol":"SPY","gmtoffset":-18000,"exchangeTimezoneName":"America/New_York"},
            "timestamp":[1721016000],
            "indicators":{"quote":[{"open":[1.0],"high":[1.0],"low":[1.0],"close":[1.0],"volume":[1]}]}
        }],"error":null}}"#;

        let ts = first_timestamp(body);
        assert_eq!(ts.to_rfc3339(), "2024-07-15T00:00:00-04:00");
        assert_eq!(ts.date_naive().to_string(), "2024-07-15");
    }

    #[test]
    fn falls_back_to_gmtoffset_without_a_known_zone() {
        let body = r#"{"chart":{"result":[{
            "meta":{"symbol":"SPY","gmtoffset":-18000,"exchangeTimezoneName":"Mars/Olympus_Mons"},
            "timestamp":[1721016000],
            "indicators":{"quote":[{"open":[1.0],"high":[1.0],"low":[1.0],"close":[1.0],"volume":[1]}]}
        }],"error":null}}"#;

        assert_eq!(first_timestamp(body).to_rfc3339(), "2024-07-14T23:00:00-05:00");
    }

    #[test]
    fn missing_timestamps_is_an_empty_frame() {
        let body = r#"{"chart":{"result":[{"meta":{"symbol":"ZZZZ","gmtoffset":0},
            "indicators":{"quote":[{}]}}],"error":null}}"#;
        let response: ChartResponse = serde_json::from_str(body).unwrap();
        let frame = response
            .chart
            .result
            .unwrap()
            .remove(0)
            .into_raw_frame()
            .unwrap();
        assert!(frame.is_empty());
    }

    #[test]
    fn decodes_chart_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let response: ChartResponse = serde_json::from_str(body).unwrap();
        let error = response.chart.error.unwrap();
        assert_eq!(error.code, "Not Found");
        assert!(response.chart.result.is_none());
    }
}
