use chrono::NaiveDate;

use crate::models::{bar::PriceBar, symbol_history::Extrema};

/// One day's price span. A side is `None` when the provider had no usable
/// value for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyRange {
    pub date: NaiveDate,
    pub high: Option<f64>,
    pub low: Option<f64>,
}

impl From<&PriceBar> for DailyRange {
    fn from(bar: &PriceBar) -> Self {
        Self {
            date: bar.date,
            high: Some(bar.high),
            low: Some(bar.low),
        }
    }
}

/// Highest `high` and lowest `low` over `ranges`, with the dates they occurred.
///
/// Each side skips days where it is missing. Ties resolve to the first
/// occurrence, so `ranges` should be in date order. Returns `None` unless both
/// sides have at least one value.
pub fn compute_extrema(ranges: &[DailyRange]) -> Option<Extrema> {
    let high = ranges
        .iter()
        .filter_map(|range| Some((range.high?, range.date)))
        .reduce(|best, next| if next.0 > best.0 { next } else { best })?;
    let low = ranges
        .iter()
        .filter_map(|range| Some((range.low?, range.date)))
        .reduce(|best, next| if next.0 < best.0 { next } else { best })?;

    Some(Extrema {
        all_time_high: high.0,
        all_time_high_date: high.1,
        all_time_low: low.0,
        all_time_low_date: low.1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(day: u32, high: f64, low: f64) -> DailyRange {
        let bar = PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: low,
            high,
            low,
            close: high,
            volume: 1,
        };
        DailyRange::from(&bar)
    }

    #[test]
    fn picks_extremes_and_their_dates() {
        let ranges = [day(1, 10.0, 5.0), day(2, 12.0, 6.0), day(3, 11.0, 4.0)];
        let extrema = compute_extrema(&ranges).unwrap();

        assert_eq!(extrema.all_time_high, 12.0);
        assert_eq!(extrema.all_time_high_date, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(extrema.all_time_low, 4.0);
        assert_eq!(extrema.all_time_low_date, NaiveDate::from_ymd_opt(2024, 3, 3).unwrap());
    }

    #[test]
    fn ties_keep_first_occurrence() {
        let ranges = [day(1, 12.0, 4.0), day(2, 12.0, 4.0)];
        let extrema = compute_extrema(&ranges).unwrap();
        assert_eq!(extrema.all_time_high_date.to_string(), "2024-03-01");
        assert_eq!(extrema.all_time_low_date.to_string(), "2024-03-01");
    }

    #[test]
    fn missing_sides_are_skipped_independently() {
        let mut gap = day(1, 99.0, 0.01);
        gap.high = None;
        let ranges = [gap, day(2, 12.0, 6.0)];
        let extrema = compute_extrema(&ranges).unwrap();

        assert_eq!(extrema.all_time_high, 12.0);
        assert_eq!(extrema.all_time_low, 0.01);
        assert_eq!(extrema.all_time_low_date.to_string(), "2024-03-01");
    }

    #[test]
    fn no_usable_days_no_extrema() {
        assert!(compute_extrema(&[]).is_none());

        let mut only_lows = day(1, 1.0, 1.0);
        only_lows.high = None;
        assert!(compute_extrema(&[only_lows]).is_none());
    }
}
