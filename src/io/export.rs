//! Export enriched tables to CSV (and read them back).
//!
//! This is the only place percentages, indices and per-capita values are
//! rounded. Missing values are written as empty fields.
//!
//! Rounded values are serialized with the shortest representation that
//! parses back to the same `f64`, so a re-import is bit-for-bit identical.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use chrono::NaiveDate;

use crate::domain::{EnrichedRecord, GrowthRecord, PeriodRecord, SpendingRecord};
use crate::error::AppError;

/// Decimal places for percentage-like outputs.
pub const EXPORT_DECIMALS: i32 = 2;

/// Round to [`EXPORT_DECIMALS`] places, ties to even (`numpy.around` semantics).
pub fn round_export(v: f64) -> f64 {
    let scale = 10f64.powi(EXPORT_DECIMALS);
    (v * scale).round_ties_even() / scale
}

fn round_opt(v: Option<f64>) -> Option<f64> {
    v.map(round_export)
}

/// Apply export rounding to the percentage/ratio fields of an enriched record.
pub fn round_enriched(r: &EnrichedRecord) -> EnrichedRecord {
    EnrichedRecord {
        pct_change: round_opt(r.pct_change),
        cumulative_pct: round_opt(r.cumulative_pct),
        index: round_opt(r.index),
        secondary_index: round_opt(r.secondary_index),
        share_pct: round_opt(r.share_pct),
        per_unit: round_opt(r.per_unit),
        ..*r
    }
}

const ENRICHED_HEADER: [&str; 11] = [
    "year",
    "primary",
    "secondary",
    "delta",
    "pct_change",
    "cumulative",
    "cumulative_pct",
    "index",
    "secondary_index",
    "share_pct",
    "per_unit",
];

#[derive(Debug, Serialize, Deserialize)]
struct GrowthCsvRow {
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "Population")]
    population: Option<f64>,
    #[serde(rename = "YoY_Change")]
    yoy_change: Option<f64>,
    #[serde(rename = "YoY_Growth_Pct")]
    yoy_growth_pct: Option<f64>,
    #[serde(rename = "Cumulative_Growth")]
    cumulative_growth: Option<f64>,
    #[serde(rename = "Cumulative_Growth_Pct")]
    cumulative_growth_pct: Option<f64>,
    #[serde(rename = "Parent_Population")]
    parent_population: Option<f64>,
    #[serde(rename = "Share_Pct")]
    share_pct: Option<f64>,
}

const GROWTH_HEADER: [&str; 8] = [
    "Year",
    "Population",
    "YoY_Change",
    "YoY_Growth_Pct",
    "Cumulative_Growth",
    "Cumulative_Growth_Pct",
    "Parent_Population",
    "Share_Pct",
];

impl From<&GrowthRecord> for GrowthCsvRow {
    fn from(r: &GrowthRecord) -> Self {
        Self {
            year: r.year,
            population: r.population,
            yoy_change: r.yoy_change,
            yoy_growth_pct: round_opt(r.yoy_growth_pct),
            cumulative_growth: r.cumulative_growth,
            cumulative_growth_pct: round_opt(r.cumulative_growth_pct),
            parent_population: r.parent_population,
            share_pct: round_opt(r.share_pct),
        }
    }
}

impl From<GrowthCsvRow> for GrowthRecord {
    fn from(r: GrowthCsvRow) -> Self {
        Self {
            year: r.year,
            population: r.population,
            yoy_change: r.yoy_change,
            yoy_growth_pct: r.yoy_growth_pct,
            cumulative_growth: r.cumulative_growth,
            cumulative_growth_pct: r.cumulative_growth_pct,
            parent_population: r.parent_population,
            share_pct: r.share_pct,
        }
    }
}

#[derive(Debug, Serialize)]
struct SpendingCsvRow<'a> {
    fiscal_year: &'a str,
    year: i32,
    population: Option<f64>,
    k12_m: f64,
    post_sec_m: f64,
    total_m: f64,
    k12_per_capita: Option<f64>,
    post_sec_per_capita: Option<f64>,
    total_per_capita: Option<f64>,
    pop_index: Option<f64>,
    k12_index: Option<f64>,
    post_sec_index: Option<f64>,
    total_index: Option<f64>,
    k12_share_pct: Option<f64>,
    post_sec_share_pct: Option<f64>,
}

const SPENDING_HEADER: [&str; 15] = [
    "Fiscal_Year",
    "Year",
    "Population",
    "K12_M",
    "PostSec_M",
    "Total_M",
    "K12_PerCapita",
    "PostSec_PerCapita",
    "Total_PerCapita",
    "Pop_Index",
    "K12_Index",
    "PostSec_Index",
    "Total_Index",
    "K12_Share_Pct",
    "PostSec_Share_Pct",
];

#[derive(Debug, Serialize)]
struct PeriodCsvRow {
    date: NaiveDate,
    population: Option<f64>,
    change: Option<f64>,
    growth_pct: Option<f64>,
    parent_population: Option<f64>,
    share_pct: Option<f64>,
}

const PERIOD_HEADER: [&str; 6] = [
    "Date",
    "Population",
    "Change",
    "Growth_Pct",
    "Parent_Population",
    "Share_Pct",
];

impl From<&PeriodRecord> for PeriodCsvRow {
    fn from(r: &PeriodRecord) -> Self {
        Self {
            date: r.date,
            population: r.population,
            change: r.change,
            growth_pct: round_opt(r.growth_pct),
            parent_population: r.parent_population,
            share_pct: round_opt(r.share_pct),
        }
    }
}

impl<'a> From<&'a SpendingRecord> for SpendingCsvRow<'a> {
    fn from(r: &'a SpendingRecord) -> Self {
        Self {
            fiscal_year: &r.fiscal_year,
            year: r.year,
            population: r.population,
            k12_m: r.k12_m,
            post_sec_m: r.post_sec_m,
            total_m: r.total_m,
            k12_per_capita: round_opt(r.k12_per_capita),
            post_sec_per_capita: round_opt(r.post_sec_per_capita),
            total_per_capita: round_opt(r.total_per_capita),
            pop_index: round_opt(r.pop_index),
            k12_index: round_opt(r.k12_index),
            post_sec_index: round_opt(r.post_sec_index),
            total_index: round_opt(r.total_index),
            k12_share_pct: round_opt(r.k12_share_pct),
            post_sec_share_pct: round_opt(r.post_sec_share_pct),
        }
    }
}

/// Write rows under an explicit header so empty tables still carry their schema.
fn write_rows<W, T, I>(output: W, header: &[&str], rows: I) -> Result<(), AppError>
where
    W: Write,
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(output);
    writer
        .write_record(header)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

fn create(path: &Path) -> Result<File, AppError> {
    File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))
}

fn open(path: &Path) -> Result<File, AppError> {
    File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))
}

pub fn write_enriched<W: Write>(output: W, records: &[EnrichedRecord]) -> Result<(), AppError> {
    write_rows(output, &ENRICHED_HEADER, records.iter().map(round_enriched))
}

/// Write enriched records to a CSV file.
pub fn write_enriched_csv(path: &Path, records: &[EnrichedRecord]) -> Result<(), AppError> {
    write_enriched(create(path)?, records)?;
    info!(path = %path.display(), rows = records.len(), "exported enriched records");
    Ok(())
}

pub fn read_enriched<R: Read>(input: R) -> Result<Vec<EnrichedRecord>, AppError> {
    let mut reader = csv::Reader::from_reader(input);
    reader
        .deserialize::<EnrichedRecord>()
        .enumerate()
        .map(|(idx, row)| {
            row.map_err(|e| AppError::new(2, format!("Invalid enriched CSV row at line {}: {e}", idx + 2)))
        })
        .collect()
}

/// Read an enriched-record CSV previously produced by [`write_enriched_csv`].
pub fn read_enriched_csv(path: &Path) -> Result<Vec<EnrichedRecord>, AppError> {
    read_enriched(open(path)?)
}

pub fn write_growth<W: Write>(output: W, records: &[GrowthRecord]) -> Result<(), AppError> {
    write_rows(output, &GROWTH_HEADER, records.iter().map(GrowthCsvRow::from))
}

/// Write the population growth table to a CSV file.
pub fn write_growth_csv(path: &Path, records: &[GrowthRecord]) -> Result<(), AppError> {
    write_growth(create(path)?, records)?;
    info!(path = %path.display(), rows = records.len(), "exported growth table");
    Ok(())
}

pub fn read_growth<R: Read>(input: R) -> Result<Vec<GrowthRecord>, AppError> {
    let mut reader = csv::Reader::from_reader(input);
    reader
        .deserialize::<GrowthCsvRow>()
        .enumerate()
        .map(|(idx, row)| {
            row.map(GrowthRecord::from)
                .map_err(|e| AppError::new(2, format!("Invalid growth CSV row at line {}: {e}", idx + 2)))
        })
        .collect()
}

pub fn read_growth_csv(path: &Path) -> Result<Vec<GrowthRecord>, AppError> {
    read_growth(open(path)?)
}

pub fn write_spending<W: Write>(output: W, records: &[SpendingRecord]) -> Result<(), AppError> {
    write_rows(output, &SPENDING_HEADER, records.iter().map(SpendingCsvRow::from))
}

/// Write the population-vs-spending table to a CSV file.
pub fn write_spending_csv(path: &Path, records: &[SpendingRecord]) -> Result<(), AppError> {
    write_spending(create(path)?, records)?;
    info!(path = %path.display(), rows = records.len(), "exported spending table");
    Ok(())
}

pub fn write_periods<W: Write>(output: W, records: &[PeriodRecord]) -> Result<(), AppError> {
    write_rows(output, &PERIOD_HEADER, records.iter().map(PeriodCsvRow::from))
}

/// Write the all-months growth table to a CSV file.
pub fn write_periods_csv(path: &Path, records: &[PeriodRecord]) -> Result<(), AppError> {
    write_periods(create(path)?, records)?;
    info!(path = %path.display(), rows = records.len(), "exported period table");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EnrichedRecord {
        EnrichedRecord {
            year: 2013,
            primary: Some(4_083_648.0),
            secondary: Some(35_082_954.0),
            delta: Some(101_257.0),
            pct_change: Some(2.5421_f64),
            cumulative: Some(101_257.0),
            cumulative_pct: Some(2.5421_f64),
            index: Some(102.542_f64),
            secondary_index: None,
            share_pct: Some(11.640_06),
            per_unit: None,
        }
    }

    #[test]
    fn rounding_breaks_ties_to_even() {
        // 0.125 and 0.375 are exact in binary, so these are true ties.
        assert_eq!(round_export(0.125), 0.12);
        assert_eq!(round_export(0.375), 0.38);
        assert_eq!(round_export(-0.125), -0.12);
        assert_eq!(round_export(2.734_4), 2.73);
    }

    #[test]
    fn period_export_writes_iso_dates_and_empty_gaps() {
        let rec = PeriodRecord {
            date: NaiveDate::from_ymd_opt(2012, 4, 1).unwrap(),
            population: Some(3_899_000.0),
            change: None,
            growth_pct: Some(0.618_0),
            parent_population: None,
            share_pct: None,
        };
        let mut buf = Vec::new();
        write_periods(&mut buf, &[rec]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), PERIOD_HEADER.join(","));
        let fields: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(fields[0], "2012-04-01");
        assert_eq!(fields[1].parse::<f64>().unwrap(), 3_899_000.0);
        assert_eq!(fields[2], "");
        assert_eq!(fields[3].parse::<f64>().unwrap(), 0.62);
        assert_eq!(&fields[4..], &["", ""]);
    }

    #[test]
    fn rounding_touches_only_ratio_fields() {
        let r = round_enriched(&sample());
        assert_eq!(r.pct_change, Some(2.54));
        assert_eq!(r.index, Some(102.54));
        assert_eq!(r.share_pct, Some(11.64));
        assert_eq!(r.delta, Some(101_257.0));
        assert_eq!(r.secondary_index, None);
    }

    #[test]
    fn missing_values_are_empty_fields() {
        let mut buf = Vec::new();
        write_enriched(&mut buf, &[sample()]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), ENRICHED_HEADER.join(","));
        let row = lines.next().unwrap();
        assert!(row.starts_with("2013,"));
        assert!(row.ends_with(",11.64,"));
    }

    #[test]
    fn empty_export_keeps_header() {
        let mut buf = Vec::new();
        write_growth(&mut buf, &[]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.trim_end(), GROWTH_HEADER.join(","));
        assert!(read_growth(text.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn spending_export_uses_wide_column_names() {
        let rec = SpendingRecord {
            fiscal_year: "2012-13".to_string(),
            year: 2012,
            population: None,
            k12_m: 6179.0,
            post_sec_m: 2856.0,
            total_m: 9035.0,
            k12_per_capita: None,
            post_sec_per_capita: None,
            total_per_capita: None,
            pop_index: None,
            k12_index: Some(100.0),
            post_sec_index: Some(100.0),
            total_index: Some(100.0),
            k12_share_pct: Some(68.389_595),
            post_sec_share_pct: Some(31.610_405),
        };
        let mut buf = Vec::new();
        write_spending(&mut buf, &[rec]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("Fiscal_Year,Year,Population,K12_M"));
        let fields: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(fields.len(), SPENDING_HEADER.len());
        assert_eq!(&fields[..3], &["2012-13", "2012", ""]);
        assert_eq!(fields[3].parse::<f64>().unwrap(), 6179.0);
        assert_eq!(fields[5].parse::<f64>().unwrap(), 9035.0);
        assert!(fields[6..10].iter().all(|f| f.is_empty()));
        assert_eq!(fields[12].parse::<f64>().unwrap(), 100.0);
        assert_eq!(fields[13].parse::<f64>().unwrap(), 68.39);
        assert_eq!(fields[14].parse::<f64>().unwrap(), 31.61);
    }
}
