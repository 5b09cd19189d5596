use chrono::{DateTime, Duration, Utc};

use crate::models::window::{HistoryRange, HistoryRequest, Interval};

fn interval_param(interval: Interval) -> &'static str {
    match interval {
        Interval::Daily => "1d",
    }
}

/// Builds the query string for a chart request.
///
/// A trailing window is sent as an explicit `period1`/`period2` pair so the
/// window length is not limited to the endpoint's fixed `range` presets.
pub fn construct_params(request: &HistoryRequest, now: DateTime<Utc>) -> Vec<(String, String)> {
    let mut query = vec![
        ("interval".to_string(), interval_param(request.interval).to_string()),
        ("includePrePost".to_string(), "false".to_string()),
    ];

    match request.range {
        HistoryRange::Trailing { days } => {
            let start = now - Duration::days(i64::from(days));
            query.push(("period1".to_string(), start.timestamp().to_string()));
            query.push(("period2".to_string(), now.timestamp().to_string()));
        }
        HistoryRange::Max => {
            query.push(("range".to_string(), "max".to_string()));
        }
    }

    query
}
