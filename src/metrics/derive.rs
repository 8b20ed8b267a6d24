//! Metric stage: joined records -> enriched records.
//!
//! Every derivation reads raw joined values; no metric is built from another
//! derived (or rounded) metric. Division by zero or by a missing value yields
//! `None`.

use crate::domain::{EnrichedRecord, JoinedRecord, MetricOptions, PeriodRecord, PeriodSeries};

/// `num / den`, or `None` if `den` is zero or the result is not finite.
pub fn safe_div(num: f64, den: f64) -> Option<f64> {
    if den == 0.0 {
        return None;
    }
    let q = num / den;
    q.is_finite().then_some(q)
}

/// Absolute change between adjacent values.
pub fn delta(prev: Option<f64>, cur: Option<f64>) -> Option<f64> {
    Some(cur? - prev?)
}

/// Percent change between adjacent values, `(cur / prev - 1) * 100`.
pub fn pct_change(prev: Option<f64>, cur: Option<f64>) -> Option<f64> {
    safe_div(cur?, prev?).map(|r| (r - 1.0) * 100.0)
}

/// Base-100 index of `cur` relative to `base`, `cur / base * 100`.
///
/// Dividing first keeps the base record at exactly 100.
pub fn index(base: Option<f64>, cur: Option<f64>) -> Option<f64> {
    safe_div(cur?, base?).map(|r| r * 100.0)
}

/// `part` as a percentage of `whole`.
pub fn share_pct(part: Option<f64>, whole: Option<f64>) -> Option<f64> {
    safe_div(part?, whole?).map(|r| r * 100.0)
}

/// `amount * scale / population`.
pub fn per_unit(amount: Option<f64>, population: Option<f64>, scale: f64) -> Option<f64> {
    safe_div(amount? * scale, population?)
}

/// Derive every metric for an ordered sequence of joined records.
///
/// Gaps are not bridged: `delta` and `pct_change` compare only adjacent
/// records, so a missing neighbour makes them `None`. If `base_index` is out
/// of range or the base value is missing, all base-relative fields are `None`.
pub fn derive_metrics(records: &[JoinedRecord], options: MetricOptions) -> Vec<EnrichedRecord> {
    let base = records.get(options.base_index);
    let base_primary = base.and_then(|r| r.primary);
    let base_secondary = base.and_then(|r| r.secondary);

    records
        .iter()
        .enumerate()
        .map(|(i, rec)| {
            let prev = i.checked_sub(1).and_then(|j| records[j].primary);
            // With no previous record both adjacent metrics are undefined.
            let (d, pc) = if i == 0 {
                (None, None)
            } else {
                (delta(prev, rec.primary), pct_change(prev, rec.primary))
            };

            EnrichedRecord {
                year: rec.year,
                primary: rec.primary,
                secondary: rec.secondary,
                delta: d,
                pct_change: pc,
                cumulative: delta(base_primary, rec.primary),
                cumulative_pct: pct_change(base_primary, rec.primary),
                index: index(base_primary, rec.primary),
                secondary_index: index(base_secondary, rec.secondary),
                share_pct: share_pct(rec.primary, rec.secondary),
                per_unit: per_unit(rec.primary, rec.secondary, options.per_unit_scale),
            }
        })
        .collect()
}

/// Mean of the present values, skipping missing ones.
pub fn mean_present(values: impl IntoIterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    safe_div(sum, n as f64)
}

/// Period-over-period change and share of the parent for an all-months series.
///
/// Adjacent means adjacent in the series: a missing observation breaks the
/// change on both sides of it, same as the annual path.
pub fn derive_period_metrics(primary: &PeriodSeries, secondary: &PeriodSeries) -> Vec<PeriodRecord> {
    let points = primary.points();
    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let prev = i.checked_sub(1).map(|j| points[j].value);
            let parent = secondary.value_at(p.date);
            PeriodRecord {
                date: p.date,
                population: p.value,
                change: prev.and_then(|prev| delta(prev, p.value)),
                growth_pct: prev.and_then(|prev| pct_change(prev, p.value)),
                parent_population: parent,
                share_pct: share_pct(p.value, parent),
            }
        })
        .collect()
}

/// First-to-last change of a value sequence as `(first, last, change, change_pct)`.
pub fn first_last_growth(values: &[Option<f64>]) -> (Option<f64>, Option<f64>, Option<f64>, Option<f64>) {
    let first = values.first().copied().flatten();
    let last = values.last().copied().flatten();
    (first, last, delta(first, last), pct_change(first, last))
}
