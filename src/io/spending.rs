//! Load an education-spending table from CSV.
//!
//! Expected columns: `fiscal_year,year,k12_m,post_sec_m` (amounts in $M).
//! Unlike the population table this is analyst-maintained input, so any
//! unparsable row fails the load.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::info;

use crate::domain::{SpendingRow, SpendingTable};
use crate::error::AppError;

pub fn load_spending_table(path: &Path) -> Result<SpendingTable, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open spending CSV '{}': {e}", path.display()),
        )
    })?;
    let table = read_spending_table(file)?;
    info!(path = %path.display(), rows = table.rows().len(), "loaded spending table");
    Ok(table)
}

pub fn read_spending_table<R: Read>(input: R) -> Result<SpendingTable, AppError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);

    let mut rows = Vec::new();
    for (idx, result) in reader.deserialize::<SpendingRow>().enumerate() {
        let row = result.map_err(|e| {
            AppError::new(2, format!("Invalid spending CSV row at line {}: {e}", idx + 2))
        })?;
        if !(row.k12_m.is_finite() && row.post_sec_m.is_finite()) {
            return Err(AppError::new(
                2,
                format!("Non-finite spending amount for {}.", row.fiscal_year),
            ));
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(AppError::new(3, "No data to process: the spending table is empty."));
    }
    Ok(SpendingTable::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_and_orders_rows() {
        let csv = "fiscal_year,year,k12_m,post_sec_m\n\
                   2024-25,2024,9252,6305\n\
                   2012-13,2012,6179,2856\n";
        let table = read_spending_table(csv.as_bytes()).unwrap();
        let years: Vec<i32> = table.rows().iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2012, 2024]);
        assert_eq!(table.rows()[0].total_m(), 9035.0);
    }

    #[test]
    fn bad_row_fails_the_load() {
        let csv = "fiscal_year,year,k12_m,post_sec_m\n2012-13,2012,abc,2856\n";
        assert_eq!(read_spending_table(csv.as_bytes()).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn empty_table_is_reported() {
        let csv = "fiscal_year,year,k12_m,post_sec_m\n";
        assert_eq!(read_spending_table(csv.as_bytes()).unwrap_err().exit_code(), 3);
    }

    #[test]
    fn builtin_table_matches_budget_figures() {
        let table = SpendingTable::builtin();
        assert_eq!(table.rows().len(), 5);
        let last = table.rows().last().unwrap();
        assert_eq!(last.fiscal_year, "2025-26");
        assert_eq!(last.total_m(), 16_518.0);
    }
}
