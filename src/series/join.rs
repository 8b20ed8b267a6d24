//! Join stage: align two series on year (left join on the primary).

use crate::domain::{FilteredSeries, JoinedRecord};

/// Left-join `secondary` onto `primary` by year.
///
/// Every primary year appears exactly once, in primary order. Years the
/// secondary lacks get `secondary: None`.
pub fn join_series(primary: &FilteredSeries, secondary: &FilteredSeries) -> Vec<JoinedRecord> {
    primary
        .points()
        .iter()
        .map(|p| JoinedRecord {
            year: p.year,
            primary: p.value,
            secondary: secondary.value_at(p.year),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DuplicatePolicy, YearValue};

    fn series(points: &[(i32, Option<f64>)]) -> FilteredSeries {
        FilteredSeries::from_points(
            points.iter().map(|&(year, value)| YearValue { year, value }),
            DuplicatePolicy::Last,
        )
    }

    #[test]
    fn left_join_marks_absent_years_as_missing() {
        let primary = series(&[(2012, Some(100.0)), (2013, Some(110.0))]);
        let secondary = series(&[(2013, Some(50.0))]);
        let joined = join_series(&primary, &secondary);
        assert_eq!(
            joined,
            vec![
                JoinedRecord {
                    year: 2012,
                    primary: Some(100.0),
                    secondary: None
                },
                JoinedRecord {
                    year: 2013,
                    primary: Some(110.0),
                    secondary: Some(50.0)
                },
            ]
        );
    }

    #[test]
    fn row_count_follows_primary() {
        let primary = series(&[(2012, Some(1.0)), (2020, Some(2.0))]);
        let secondary = series(&[
            (2010, Some(1.0)),
            (2011, Some(1.0)),
            (2012, Some(1.0)),
            (2013, Some(1.0)),
        ]);
        assert_eq!(join_series(&primary, &secondary).len(), 2);
        assert_eq!(join_series(&primary, &FilteredSeries::default()).len(), 2);
        assert!(join_series(&FilteredSeries::default(), &secondary).is_empty());
    }

    #[test]
    fn zero_is_kept_distinct_from_absent() {
        let primary = series(&[(2012, Some(1.0))]);
        let secondary = series(&[(2012, Some(0.0))]);
        assert_eq!(join_series(&primary, &secondary)[0].secondary, Some(0.0));
    }
}
