//! Input adapter: raw observations -> year-keyed or date-keyed series.

use chrono::Datelike;
use tracing::debug;

use crate::domain::{
    DuplicatePolicy, FilterWindow, FilteredSeries, PeriodSeries, PeriodValue, RawObservation, YearValue,
};
use crate::error::AppError;

/// Extract one entity's observations for a calendar month over an inclusive year range.
///
/// An empty result is a valid series, not an error.
pub fn filter_series(
    rows: &[RawObservation],
    entity: &str,
    month: u32,
    year_start: i32,
    year_end: i32,
    on_duplicate: DuplicatePolicy,
) -> FilteredSeries {
    let matched = rows
        .iter()
        .filter(|r| r.entity == entity)
        .filter(|r| r.timestamp.month() == month)
        .filter(|r| (year_start..=year_end).contains(&r.timestamp.year()))
        .map(|r| YearValue {
            year: r.timestamp.year(),
            value: r.value,
        });

    let series = FilteredSeries::from_points(matched, on_duplicate);
    debug!(entity, month, year_start, year_end, points = series.len(), "filtered series");
    series
}

/// Same as [`filter_series`], with the window's settings.
pub fn filter_window(rows: &[RawObservation], entity: &str, window: &FilterWindow) -> FilteredSeries {
    filter_series(
        rows,
        entity,
        window.month,
        window.year_start,
        window.year_end,
        window.on_duplicate,
    )
}

/// Extract every observation of one entity, one point per reference date.
///
/// The range runs from January of `year_start` through `window.month` of
/// `year_end`, so the default window ends on the same snapshot as the annual
/// series.
pub fn filter_periods(rows: &[RawObservation], entity: &str, window: &FilterWindow) -> PeriodSeries {
    let first = (window.year_start, 1);
    let last = (window.year_end, window.month);
    let matched = rows
        .iter()
        .filter(|r| r.entity == entity)
        .filter(|r| {
            let key = (r.timestamp.year(), r.timestamp.month());
            first <= key && key <= last
        })
        .map(|r| PeriodValue {
            date: r.timestamp,
            value: r.value,
        });

    let series = PeriodSeries::from_points(matched, window.on_duplicate);
    debug!(entity, points = series.len(), "filtered period series");
    series
}

/// Reject windows that can never match anything.
pub fn validate_window(window: &FilterWindow) -> Result<(), AppError> {
    if !(1..=12).contains(&window.month) {
        return Err(AppError::new(
            2,
            format!("Invalid month {} (expected 1-12).", window.month),
        ));
    }
    if window.year_start > window.year_end {
        return Err(AppError::new(
            2,
            format!(
                "Invalid year range: start {} is after end {}.",
                window.year_start, window.year_end
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn obs(entity: &str, y: i32, m: u32, value: Option<f64>) -> RawObservation {
        RawObservation {
            entity: entity.to_string(),
            timestamp: NaiveDate::from_ymd_opt(y, m, 1).unwrap(),
            value,
        }
    }

    #[test]
    fn keeps_only_matching_entity_month_and_years() {
        let rows = vec![
            obs("Alberta", 2011, 1, Some(1.0)),
            obs("Alberta", 2012, 1, Some(2.0)),
            obs("Alberta", 2012, 4, Some(3.0)),
            obs("Canada", 2013, 1, Some(4.0)),
            obs("Alberta", 2014, 1, Some(5.0)),
            obs("Alberta", 2015, 1, Some(6.0)),
        ];
        let s = filter_series(&rows, "Alberta", 1, 2012, 2014, DuplicatePolicy::Last);
        let years: Vec<i32> = s.years().collect();
        assert_eq!(years, vec![2012, 2014]);
        assert_eq!(s.value_at(2012), Some(2.0));
        assert_eq!(s.value_at(2014), Some(5.0));
    }

    #[test]
    fn entity_match_is_exact() {
        let rows = vec![obs("alberta", 2012, 1, Some(1.0)), obs("Alberta ", 2012, 1, Some(1.0))];
        assert!(filter_series(&rows, "Alberta", 1, 2000, 2030, DuplicatePolicy::Last).is_empty());
    }

    #[test]
    fn output_is_sorted_by_year() {
        let rows = vec![
            obs("A", 2015, 1, Some(3.0)),
            obs("A", 2012, 1, Some(1.0)),
            obs("A", 2013, 1, Some(2.0)),
        ];
        let s = filter_series(&rows, "A", 1, 2000, 2030, DuplicatePolicy::Last);
        let years: Vec<i32> = s.years().collect();
        assert_eq!(years, vec![2012, 2013, 2015]);
    }

    #[test]
    fn duplicate_years_follow_policy() {
        let rows = vec![
            obs("A", 2012, 1, Some(1.0)),
            obs("A", 2012, 1, Some(9.0)),
            obs("A", 2013, 1, Some(2.0)),
        ];
        let last = filter_series(&rows, "A", 1, 2000, 2030, DuplicatePolicy::Last);
        assert_eq!(last.len(), 2);
        assert_eq!(last.value_at(2012), Some(9.0));

        let first = filter_series(&rows, "A", 1, 2000, 2030, DuplicatePolicy::First);
        assert_eq!(first.len(), 2);
        assert_eq!(first.value_at(2012), Some(1.0));
    }

    #[test]
    fn no_match_is_empty_not_error() {
        let rows = vec![obs("A", 2012, 1, Some(1.0))];
        let s = filter_series(&rows, "B", 1, 2000, 2030, DuplicatePolicy::Last);
        assert!(s.is_empty());
    }

    #[test]
    fn missing_values_survive_filtering() {
        let rows = vec![obs("A", 2012, 1, None)];
        let s = filter_series(&rows, "A", 1, 2012, 2012, DuplicatePolicy::Last);
        assert_eq!(s.len(), 1);
        assert_eq!(s.points()[0].value, None);
    }

    #[test]
    fn period_filter_keeps_every_month_up_to_the_end_snapshot() {
        let rows = vec![
            obs("Alberta", 2011, 10, Some(0.0)),
            obs("Alberta", 2012, 4, Some(2.0)),
            obs("Alberta", 2012, 1, Some(1.0)),
            obs("Alberta", 2012, 4, Some(3.0)),
            obs("Canada", 2012, 7, Some(9.0)),
            obs("Alberta", 2013, 1, Some(4.0)),
            obs("Alberta", 2013, 4, Some(5.0)),
        ];
        let window = FilterWindow {
            month: 1,
            year_start: 2012,
            year_end: 2013,
            on_duplicate: DuplicatePolicy::First,
        };
        let s = filter_periods(&rows, "Alberta", &window);
        let values: Vec<Option<f64>> = s.points().iter().map(|p| p.value).collect();
        assert_eq!(values, vec![Some(1.0), Some(2.0), Some(4.0)]);
        assert_eq!(s.value_at(NaiveDate::from_ymd_opt(2013, 1, 1).unwrap()), Some(4.0));
    }

    #[test]
    fn validate_window_rejects_bad_month_and_range() {
        let ok = FilterWindow {
            month: 1,
            year_start: 2012,
            year_end: 2025,
            on_duplicate: DuplicatePolicy::Last,
        };
        assert!(validate_window(&ok).is_ok());

        let bad_month = FilterWindow { month: 13, ..ok };
        assert_eq!(validate_window(&bad_month).unwrap_err().exit_code(), 2);

        let bad_range = FilterWindow {
            year_start: 2026,
            ..ok
        };
        assert_eq!(validate_window(&bad_range).unwrap_err().exit_code(), 2);
    }
}
