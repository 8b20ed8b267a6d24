//! Shared analysis pipelines used by the CLI subcommands.
//!
//! Each analysis is split in two:
//! - a pure `build_*` function over in-memory rows (easy to test)
//! - a `run_*` wrapper that loads inputs from disk and logs what happened
//!
//! Workflow: ingest -> filter -> join -> derive -> wide table.

use tracing::{info, warn};

use crate::domain::{
    DeriveConfig, EnrichedRecord, FilterWindow, GrowthConfig, GrowthRecord, GrowthSummary, MetricOptions,
    PeriodConfig, PeriodRecord, RawObservation, SpendingCategory, SpendingConfig, SpendingRecord, SpendingTable,
};
use crate::error::AppError;
use crate::io::ingest::{IngestedTable, load_observations};
use crate::io::spending::load_spending_table;
use crate::metrics::{derive_metrics, derive_period_metrics, first_last_growth, share_pct};
use crate::series::{filter_periods, filter_window, join_series, validate_window};

/// Spending amounts are in millions; per-capita values are in dollars.
pub const MILLIONS_TO_UNITS: f64 = 1_000_000.0;

/// Filter two entities, left-join secondary onto primary, derive metrics.
pub fn derive_pair(
    rows: &[RawObservation],
    primary: &str,
    secondary: &str,
    window: &FilterWindow,
    options: MetricOptions,
) -> Result<Vec<EnrichedRecord>, AppError> {
    validate_window(window)?;
    let p = filter_window(rows, primary, window);
    let s = filter_window(rows, secondary, window);
    if p.is_empty() {
        warn!(entity = primary, "no observations matched the primary series");
    }
    if s.is_empty() {
        warn!(entity = secondary, "no observations matched the secondary series");
    }
    Ok(derive_metrics(&join_series(&p, &s), options))
}

/// Region growth table: year-over-year and cumulative growth plus share of the parent.
pub fn build_growth_table(
    rows: &[RawObservation],
    region: &str,
    parent: &str,
    window: &FilterWindow,
) -> Result<Vec<GrowthRecord>, AppError> {
    let enriched = derive_pair(rows, region, parent, window, MetricOptions::default())?;
    Ok(enriched
        .iter()
        .map(|r| GrowthRecord {
            year: r.year,
            population: r.primary,
            yoy_change: r.delta,
            yoy_growth_pct: r.pct_change,
            cumulative_growth: r.cumulative,
            cumulative_growth_pct: r.cumulative_pct,
            parent_population: r.secondary,
            share_pct: r.share_pct,
        })
        .collect())
}

/// All-months growth table: every reference period of the region, with the
/// change from the previous period and the share of the parent.
pub fn build_period_table(
    rows: &[RawObservation],
    region: &str,
    parent: &str,
    window: &FilterWindow,
) -> Result<Vec<PeriodRecord>, AppError> {
    validate_window(window)?;
    let p = filter_periods(rows, region, window);
    let s = filter_periods(rows, parent, window);
    if p.is_empty() {
        warn!(entity = region, "no observations matched the region");
    }
    if s.is_empty() {
        warn!(entity = parent, "no observations matched the parent aggregate");
    }
    Ok(derive_period_metrics(&p, &s))
}

/// Population-vs-spending table: one row per spending year.
///
/// Each spending category is joined (left) against the region's population
/// and derived independently; rows line up because every category shares
/// the spending table's years.
pub fn build_spending_table(
    rows: &[RawObservation],
    spending: &SpendingTable,
    region: &str,
    window: &FilterWindow,
) -> Result<Vec<SpendingRecord>, AppError> {
    validate_window(window)?;
    if spending.is_empty() {
        warn!("spending table is empty");
    }
    let population = filter_window(rows, region, window);
    if population.is_empty() {
        warn!(entity = region, "no population observations matched; per-capita values will be missing");
    }

    let options = MetricOptions {
        base_index: 0,
        per_unit_scale: MILLIONS_TO_UNITS,
    };
    let [k12, post_sec, total] = SpendingCategory::ALL
        .map(|category| derive_metrics(&join_series(&spending.series(category), &population), options));

    let out = spending
        .rows()
        .iter()
        .zip(k12.iter().zip(post_sec.iter().zip(total.iter())))
        .map(|(row, (k, (p, t)))| SpendingRecord {
            fiscal_year: row.fiscal_year.clone(),
            year: row.year,
            population: k.secondary,
            k12_m: row.k12_m,
            post_sec_m: row.post_sec_m,
            total_m: row.total_m(),
            k12_per_capita: k.per_unit,
            post_sec_per_capita: p.per_unit,
            total_per_capita: t.per_unit,
            pop_index: k.secondary_index,
            k12_index: k.index,
            post_sec_index: p.index,
            total_index: t.index,
            k12_share_pct: share_pct(Some(row.k12_m), Some(row.total_m())),
            post_sec_share_pct: share_pct(Some(row.post_sec_m), Some(row.total_m())),
        })
        .collect();
    Ok(out)
}

/// First-to-last growth for population and every spending category.
pub fn growth_summary(records: &[SpendingRecord]) -> Vec<GrowthSummary> {
    let summarize = |label: &str, values: Vec<Option<f64>>| {
        let (first, last, change, change_pct) = first_last_growth(&values);
        GrowthSummary {
            label: label.to_string(),
            first,
            last,
            change,
            change_pct,
        }
    };

    let mut out = vec![summarize(
        "Population",
        records.iter().map(|r| r.population).collect(),
    )];
    for category in SpendingCategory::ALL {
        let values = records.iter().map(|r| Some(r.amount(category))).collect();
        out.push(summarize(category.display_name(), values));
    }
    out
}

fn load(path: &std::path::Path) -> Result<IngestedTable, AppError> {
    let table = load_observations(path)?;
    if !table.row_errors.is_empty() {
        warn!(skipped = table.row_errors.len(), "some input rows could not be read");
    }
    Ok(table)
}

/// Load the population table and build the growth table.
pub fn run_growth(config: &GrowthConfig) -> Result<Vec<GrowthRecord>, AppError> {
    let table = load(&config.data_path)?;
    let records = build_growth_table(&table.rows, &config.region, &config.parent, &config.window)?;
    info!(region = %config.region, parent = %config.parent, rows = records.len(), "built growth table");
    Ok(records)
}

/// Load the population table and build the all-months growth table.
pub fn run_periods(config: &PeriodConfig) -> Result<Vec<PeriodRecord>, AppError> {
    let table = load(&config.data_path)?;
    let records = build_period_table(&table.rows, &config.region, &config.parent, &config.window)?;
    info!(region = %config.region, parent = %config.parent, rows = records.len(), "built period table");
    Ok(records)
}

/// Load population + spending inputs and build the spending table.
pub fn run_spending(config: &SpendingConfig) -> Result<Vec<SpendingRecord>, AppError> {
    let table = load(&config.data_path)?;
    let spending = match &config.spending_path {
        Some(path) => load_spending_table(path)?,
        None => SpendingTable::builtin(),
    };
    let records = build_spending_table(&table.rows, &spending, &config.region, &config.window)?;
    info!(region = %config.region, rows = records.len(), "built spending table");
    Ok(records)
}

/// Load the population table and derive metrics for an arbitrary entity pair.
pub fn run_derive(config: &DeriveConfig) -> Result<Vec<EnrichedRecord>, AppError> {
    let table = load(&config.data_path)?;
    let records = derive_pair(
        &table.rows,
        &config.primary,
        &config.secondary,
        &config.window,
        config.options,
    )?;
    info!(primary = %config.primary, secondary = %config.secondary, rows = records.len(), "derived metrics");
    Ok(records)
}
