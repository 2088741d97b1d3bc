//! Windowing and as-of lookups over date-sorted series.
//!
//! Every function here assumes its input is sorted ascending by date and
//! does not re-sort it.

use chrono::NaiveDate;

use crate::models::{DateWindow, Dated, Valued};

/// The contiguous run of `series` whose dates fall in `window` (inclusive).
///
/// An inverted window, or one that does not overlap the series, yields an
/// empty slice.
pub fn filter_window<T: Dated>(series: &[T], window: DateWindow) -> &[T] {
    let lo = series.partition_point(|p| p.date() < window.start);
    let hi = series.partition_point(|p| p.date() <= window.end);
    if hi <= lo {
        return &series[..0];
    }
    &series[lo..hi]
}

/// Most recent point dated on or before `date`.
pub fn point_as_of<T: Dated>(series: &[T], date: NaiveDate) -> Option<&T> {
    let idx = series.partition_point(|p| p.date() <= date);
    idx.checked_sub(1).map(|i| &series[i])
}

/// Last-observation-carried-forward value as of `date`.
pub fn value_as_of<T: Valued>(series: &[T], date: NaiveDate) -> Option<f64> {
    point_as_of(series, date).map(Valued::value)
}

/// Walks a sorted series alongside an ascending date axis, carrying the last
/// observation forward. Each call is amortized O(1).
#[derive(Debug)]
pub(crate) struct Resampler<'a, T> {
    series: &'a [T],
    next: usize,
}

impl<'a, T: Valued> Resampler<'a, T> {
    pub(crate) fn new(series: &'a [T]) -> Self {
        Self { series, next: 0 }
    }

    /// Value as of `date`. Dates must be passed in ascending order.
    pub(crate) fn at(&mut self, date: NaiveDate) -> Option<f64> {
        while self.next < self.series.len() && self.series[self.next].date() <= date {
            self.next += 1;
        }
        self.next
            .checked_sub(1)
            .map(|i| self.series[i].value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PricePoint;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn series() -> Vec<PricePoint> {
        vec![
            PricePoint::new(d(2), 10.0),
            PricePoint::new(d(3), 11.0),
            PricePoint::new(d(6), 12.0),
            PricePoint::new(d(7), 13.0),
        ]
    }

    #[test]
    fn filter_window_is_inclusive_on_both_ends() {
        let s = series();
        let out = filter_window(&s, DateWindow::new(d(3), d(6)));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].date, d(3));
        assert_eq!(out[1].date, d(6));
    }

    #[test]
    fn filter_window_between_samples_is_empty() {
        let s = series();
        assert!(filter_window(&s, DateWindow::new(d(4), d(5))).is_empty());
    }

    #[test]
    fn filter_window_inverted_is_empty() {
        let s = series();
        assert!(filter_window(&s, DateWindow::new(d(7), d(2))).is_empty());
    }

    #[test]
    fn filter_window_after_series_is_empty() {
        let s = series();
        assert!(filter_window(&s, DateWindow::new(d(20), d(25))).is_empty());
        let empty: Vec<PricePoint> = Vec::new();
        assert!(filter_window(&empty, DateWindow::new(d(1), d(31))).is_empty());
    }

    #[test]
    fn value_as_of_carries_last_observation_forward() {
        let s = series();
        assert_eq!(value_as_of(&s, d(1)), None);
        assert_eq!(value_as_of(&s, d(2)), Some(10.0));
        assert_eq!(value_as_of(&s, d(5)), Some(11.0));
        assert_eq!(value_as_of(&s, d(31)), Some(13.0));
    }

    #[test]
    fn resampler_matches_point_lookups() {
        let s = series();
        let mut resampler = Resampler::new(&s);
        for day in 1..=9 {
            assert_eq!(resampler.at(d(day)), value_as_of(&s, d(day)), "day {day}");
        }
    }
}
