//! Shared domain types.
//!
//! Everything here is plain data: produced once per run, never mutated after
//! construction, and cheap to clone into reports or exports.
//!
//! Missing values are modelled as `Option<f64>` throughout. `None` means
//! "absent or underivable" and is always distinct from a real `0.0`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// One unvalidated row of the raw time-series table.
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation {
    pub entity: String,
    pub timestamp: NaiveDate,
    /// `None` when the source cell was empty or non-numeric.
    pub value: Option<f64>,
}

/// A single `(year, value)` entry of a filtered series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearValue {
    pub year: i32,
    pub value: Option<f64>,
}

/// Year-keyed series, unique per year and sorted ascending.
///
/// Construct through [`FilteredSeries::from_points`] (or the input adapter)
/// so the ordering invariant holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredSeries {
    points: Vec<YearValue>,
}

impl FilteredSeries {
    /// Build a series from arbitrary points, deduplicating by year under `policy`.
    pub fn from_points(points: impl IntoIterator<Item = YearValue>, policy: DuplicatePolicy) -> Self {
        Self {
            points: dedup_sorted(points.into_iter().collect(), |p| p.year, policy),
        }
    }

    pub fn points(&self) -> &[YearValue] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.points.iter().map(|p| p.year)
    }

    /// Value at `year`, flattened: absent year and missing value both give `None`.
    pub fn value_at(&self, year: i32) -> Option<f64> {
        self.points
            .binary_search_by_key(&year, |p| p.year)
            .ok()
            .and_then(|idx| self.points[idx].value)
    }
}

/// One observation of an all-months series, keyed by its reference date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodValue {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// Date-keyed series covering every reference period (e.g. each quarter).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodSeries {
    points: Vec<PeriodValue>,
}

impl PeriodSeries {
    pub fn from_points(points: impl IntoIterator<Item = PeriodValue>, policy: DuplicatePolicy) -> Self {
        Self {
            points: dedup_sorted(points.into_iter().collect(), |p| p.date, policy),
        }
    }

    pub fn points(&self) -> &[PeriodValue] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn value_at(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .and_then(|idx| self.points[idx].value)
    }
}

/// Sort by key and keep one item per key under `policy`.
///
/// The sort is stable, so "first" and "last" refer to input order.
fn dedup_sorted<T, K: Ord + Copy>(mut items: Vec<T>, key: impl Fn(&T) -> K, policy: DuplicatePolicy) -> Vec<T> {
    items.sort_by_key(|item| key(item));
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        let k = key(&item);
        if out.last().is_some_and(|last| key(last) == k) {
            if policy == DuplicatePolicy::Last {
                if let Some(last) = out.last_mut() {
                    *last = item;
                }
            }
            continue;
        }
        out.push(item);
    }
    out
}

/// Which row wins when a filter matches more than one row for the same key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum DuplicatePolicy {
    /// Keep the first matching row in input order.
    First,
    /// Keep the last matching row in input order (later revisions win).
    #[default]
    Last,
}

/// Output of the left join: one record per primary year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoinedRecord {
    pub year: i32,
    pub primary: Option<f64>,
    /// `None` when the secondary series lacks this year or its value is missing.
    pub secondary: Option<f64>,
}

/// A joined record plus every derived metric.
///
/// All derived fields hold full precision. Rounding happens only when the
/// record is exported or printed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub year: i32,
    pub primary: Option<f64>,
    pub secondary: Option<f64>,
    /// `primary[i] - primary[i-1]`.
    pub delta: Option<f64>,
    /// `(primary[i] / primary[i-1] - 1) * 100`.
    pub pct_change: Option<f64>,
    /// `primary[i] - primary[base]`.
    pub cumulative: Option<f64>,
    /// `(primary[i] - primary[base]) / primary[base] * 100`.
    pub cumulative_pct: Option<f64>,
    /// `primary[i] / primary[base] * 100`.
    pub index: Option<f64>,
    /// `secondary[i] / secondary[base] * 100`.
    pub secondary_index: Option<f64>,
    /// `primary[i] / secondary[i] * 100`.
    pub share_pct: Option<f64>,
    /// `primary[i] * scale / secondary[i]`.
    pub per_unit: Option<f64>,
}

/// Options for the metric stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricOptions {
    /// Position of the base record used by cumulative and index metrics.
    pub base_index: usize,
    /// Multiplier applied before dividing by the secondary value.
    pub per_unit_scale: f64,
}

impl Default for MetricOptions {
    fn default() -> Self {
        Self {
            base_index: 0,
            per_unit_scale: 1.0,
        }
    }
}

/// One budget year of education spending, amounts in millions of dollars.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpendingRow {
    pub fiscal_year: String,
    /// Calendar year the fiscal year starts in (joins against Q1 population).
    pub year: i32,
    pub k12_m: f64,
    pub post_sec_m: f64,
}

impl SpendingRow {
    pub fn total_m(&self) -> f64 {
        self.k12_m + self.post_sec_m
    }
}

/// Immutable spending dataset passed into the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SpendingTable {
    rows: Vec<SpendingRow>,
}

impl SpendingTable {
    /// Build a table, ordering rows by year. Duplicate years keep the last row.
    pub fn new(rows: Vec<SpendingRow>) -> Self {
        Self {
            rows: dedup_sorted(rows, |r| r.year, DuplicatePolicy::Last),
        }
    }

    /// Alberta budget headline figures for K-12 and post-secondary education.
    pub fn builtin() -> Self {
        let row = |fiscal_year: &str, year, k12_m, post_sec_m| SpendingRow {
            fiscal_year: fiscal_year.to_string(),
            year,
            k12_m,
            post_sec_m,
        };
        Self::new(vec![
            row("2012-13", 2012, 6179.0, 2856.0),
            row("2013-14", 2013, 6210.0, 2682.0),
            row("2023-24", 2023, 8836.0, 5604.0),
            row("2024-25", 2024, 9252.0, 6305.0),
            row("2025-26", 2025, 9883.0, 6635.0),
        ])
    }

    pub fn rows(&self) -> &[SpendingRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Project one spending category into a year-keyed series.
    pub fn series(&self, category: SpendingCategory) -> FilteredSeries {
        FilteredSeries::from_points(
            self.rows.iter().map(|r| YearValue {
                year: r.year,
                value: Some(category.amount(r)),
            }),
            DuplicatePolicy::Last,
        )
    }
}

/// Spending columns the pipeline derives metrics for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpendingCategory {
    K12,
    PostSecondary,
    Total,
}

impl SpendingCategory {
    pub const ALL: [SpendingCategory; 3] = [
        SpendingCategory::K12,
        SpendingCategory::PostSecondary,
        SpendingCategory::Total,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            SpendingCategory::K12 => "K-12 Spending",
            SpendingCategory::PostSecondary => "Post-Secondary Spending",
            SpendingCategory::Total => "Total Education Spending",
        }
    }

    pub fn amount(self, row: &SpendingRow) -> f64 {
        match self {
            SpendingCategory::K12 => row.k12_m,
            SpendingCategory::PostSecondary => row.post_sec_m,
            SpendingCategory::Total => row.total_m(),
        }
    }
}

/// Wide population-growth row (region vs. its parent aggregate).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthRecord {
    pub year: i32,
    pub population: Option<f64>,
    pub yoy_change: Option<f64>,
    pub yoy_growth_pct: Option<f64>,
    pub cumulative_growth: Option<f64>,
    pub cumulative_growth_pct: Option<f64>,
    pub parent_population: Option<f64>,
    pub share_pct: Option<f64>,
}

/// Wide population-vs-spending row, one per spending year.
#[derive(Debug, Clone, PartialEq)]
pub struct SpendingRecord {
    pub fiscal_year: String,
    pub year: i32,
    pub population: Option<f64>,
    pub k12_m: f64,
    pub post_sec_m: f64,
    pub total_m: f64,
    pub k12_per_capita: Option<f64>,
    pub post_sec_per_capita: Option<f64>,
    pub total_per_capita: Option<f64>,
    pub pop_index: Option<f64>,
    pub k12_index: Option<f64>,
    pub post_sec_index: Option<f64>,
    pub total_index: Option<f64>,
    /// K-12 share of total spending, in percent.
    pub k12_share_pct: Option<f64>,
    /// Post-secondary share of total spending, in percent.
    pub post_sec_share_pct: Option<f64>,
}

impl SpendingRecord {
    pub fn amount(&self, category: SpendingCategory) -> f64 {
        match category {
            SpendingCategory::K12 => self.k12_m,
            SpendingCategory::PostSecondary => self.post_sec_m,
            SpendingCategory::Total => self.total_m,
        }
    }
}

/// All-months population row: change from the previous period plus share of the parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodRecord {
    pub date: NaiveDate,
    pub population: Option<f64>,
    pub change: Option<f64>,
    pub growth_pct: Option<f64>,
    pub parent_population: Option<f64>,
    pub share_pct: Option<f64>,
}

/// First-to-last growth of one series.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthSummary {
    pub label: String,
    pub first: Option<f64>,
    pub last: Option<f64>,
    pub change: Option<f64>,
    pub change_pct: Option<f64>,
}

/// Settings shared by every filter invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterWindow {
    pub month: u32,
    pub year_start: i32,
    pub year_end: i32,
    pub on_duplicate: DuplicatePolicy,
}

/// Terminal chart dimensions (columns x rows).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotSize {
    pub width: usize,
    pub height: usize,
}

/// Run configuration for the population growth table.
#[derive(Debug, Clone)]
pub struct GrowthConfig {
    pub data_path: PathBuf,
    pub region: String,
    pub parent: String,
    pub window: FilterWindow,
    pub export: Option<PathBuf>,
    pub plot: Option<PlotSize>,
}

/// Run configuration for the population-vs-spending table.
#[derive(Debug, Clone)]
pub struct SpendingConfig {
    pub data_path: PathBuf,
    pub region: String,
    pub window: FilterWindow,
    /// Replaces the built-in spending table when set.
    pub spending_path: Option<PathBuf>,
    pub export: Option<PathBuf>,
    pub plot: Option<PlotSize>,
}

/// Run configuration for the all-months (quarterly) growth table.
#[derive(Debug, Clone)]
pub struct PeriodConfig {
    pub data_path: PathBuf,
    pub region: String,
    pub parent: String,
    /// Periods run from January of `year_start` through `month` of `year_end`.
    pub window: FilterWindow,
    pub export: Option<PathBuf>,
}

/// Run configuration for the generic two-entity derivation.
#[derive(Debug, Clone)]
pub struct DeriveConfig {
    pub data_path: PathBuf,
    pub primary: String,
    pub secondary: String,
    pub window: FilterWindow,
    pub options: MetricOptions,
    pub export: Option<PathBuf>,
}
