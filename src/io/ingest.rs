//! CSV ingest for the population time-series table.
//!
//! Turns a Statistics Canada style export (`REF_DATE`, `GEO`, `VALUE`, plus
//! any number of ignored columns) into `RawObservation`s.
//!
//! - **Strict schema** for the three required columns (exit code 2)
//! - **Lenient values**: empty or non-numeric `VALUE` cells become `None`
//! - **Row-level validation**: rows with an unreadable date or empty `GEO`
//!   are skipped and reported
//! - **Empty table** is an error (exit code 3)

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::{info, warn};

use crate::domain::RawObservation;
use crate::error::AppError;

const COL_DATE: &str = "ref_date";
const COL_ENTITY: &str = "geo";
const COL_VALUE: &str = "value";

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: observations + bookkeeping about what was skipped.
#[derive(Debug, Clone)]
pub struct IngestedTable {
    pub rows: Vec<RawObservation>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    /// Rows kept with a missing value after numeric coercion.
    pub values_missing: usize,
}

/// Load observations from a CSV file on disk.
pub fn load_observations(path: &Path) -> Result<IngestedTable, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let table = read_observations(file)?;
    info!(
        path = %path.display(),
        rows_read = table.rows_read,
        rows_used = table.rows.len(),
        values_missing = table.values_missing,
        "loaded observations"
    );
    Ok(table)
}

/// Load observations from any CSV reader.
pub fn read_observations<R: Read>(input: R) -> Result<IngestedTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for col in [COL_DATE, COL_ENTITY, COL_VALUE] {
        if !header_map.contains_key(col) {
            return Err(AppError::new(
                2,
                format!("Missing required column: `{}`", col.to_ascii_uppercase()),
            ));
        }
    }

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;
    let mut values_missing = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &header_map) {
            Ok(obs) => {
                if obs.value.is_none() {
                    values_missing += 1;
                }
                rows.push(obs);
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    for e in row_errors.iter().take(5) {
        warn!(line = e.line, "skipped row: {}", e.message);
    }
    if row_errors.len() > 5 {
        warn!("skipped {} more rows", row_errors.len() - 5);
    }

    if rows.is_empty() {
        return Err(AppError::new(3, "No data to process: the input table has no usable rows."));
    }

    Ok(IngestedTable {
        rows,
        row_errors,
        rows_read,
        values_missing,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<RawObservation, String> {
    let entity = get_required(record, header_map, COL_ENTITY)?.to_string();
    let timestamp = parse_ref_date(get_required(record, header_map, COL_DATE)?)?;
    let value = parse_opt_f64(get_optional(record, header_map, COL_VALUE));
    Ok(RawObservation {
        entity,
        timestamp,
        value,
    })
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    get_optional(record, header_map, name)
        .ok_or_else(|| format!("Missing required value: `{}`", name.to_ascii_uppercase()))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a reference date. Monthly tables use `YYYY-MM`; full dates are also accepted.
pub fn parse_ref_date(s: &str) -> Result<NaiveDate, String> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d") {
        return Ok(d);
    }
    Err(format!("Invalid REF_DATE '{s}'. Expected YYYY-MM or YYYY-MM-DD."))
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let v = s?.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
