//! Formatted terminal output.
//!
//! Formatting lives here so the pipeline stays presentation-free. Values are
//! rounded only at this boundary (same precision as CSV exports).

use crate::domain::{EnrichedRecord, GrowthRecord, GrowthSummary, PeriodRecord, SpendingRecord};
use crate::metrics::mean_present;

const MISSING: &str = "-";

/// Format the region growth table.
pub fn format_growth_table(records: &[GrowthRecord], region: &str, parent: &str) -> String {
    let mut out = String::new();
    let span = year_span(records.iter().map(|r| r.year));
    out.push_str(&format!("=== {region} Year-over-Year Population Growth{span} ===\n"));
    out.push_str(&format!("Share is relative to {parent}.\n\n"));

    push_line(
        &mut out,
        format!(
            "{:<6} {:>12} {:>10} {:>8} {:>12} {:>8} {:>12} {:>7}",
            "year", "population", "yoy", "yoy%", "cumulative", "cum%", "parent", "share%"
        ),
    );
    push_rule(&mut out, &[6, 12, 10, 8, 12, 8, 12, 7]);

    for r in records {
        push_line(
            &mut out,
            format!(
                "{:<6} {:>12} {:>10} {:>8} {:>12} {:>8} {:>12} {:>7}",
                r.year,
                fmt_count(r.population),
                fmt_count(r.yoy_change),
                fmt_pct(r.yoy_growth_pct),
                fmt_count(r.cumulative_growth),
                fmt_pct(r.cumulative_growth_pct),
                fmt_count(r.parent_population),
                fmt_pct(r.share_pct),
            ),
        );
    }
    out
}

/// Format the population-vs-spending table.
pub fn format_spending_table(records: &[SpendingRecord], region: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {region}: Population vs. Education Spending (nominal) ===\n\n"));

    push_line(
        &mut out,
        format!(
            "{:<8} {:>12} {:>8} {:>8} {:>8} {:>9} {:>9} {:>9} {:>7} {:>7} {:>7} {:>7} {:>6} {:>6}",
            "fiscal", "population", "k12 $M", "ps $M", "tot $M", "k12 $/c", "ps $/c", "tot $/c", "pop ix",
            "k12 ix", "ps ix", "tot ix", "k12 %", "ps %"
        ),
    );
    push_rule(&mut out, &[8, 12, 8, 8, 8, 9, 9, 9, 7, 7, 7, 7, 6, 6]);

    for r in records {
        push_line(
            &mut out,
            format!(
                "{:<8} {:>12} {:>8.0} {:>8.0} {:>8.0} {:>9} {:>9} {:>9} {:>7} {:>7} {:>7} {:>7} {:>6} {:>6}",
                r.fiscal_year,
                fmt_count(r.population),
                r.k12_m,
                r.post_sec_m,
                r.total_m,
                fmt_pct(r.k12_per_capita),
                fmt_pct(r.post_sec_per_capita),
                fmt_pct(r.total_per_capita),
                fmt_pct(r.pop_index),
                fmt_pct(r.k12_index),
                fmt_pct(r.post_sec_index),
                fmt_pct(r.total_index),
                fmt_share(r.k12_share_pct),
                fmt_share(r.post_sec_share_pct),
            ),
        );
    }
    out
}

/// Format first-to-last growth: both ends, the absolute change and the percent.
pub fn format_growth_summary(summary: &[GrowthSummary], from: &str, to: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("Growth from {from} to {to}:\n"));
    for s in summary {
        let change = match s.change {
            Some(v) if v >= 0.0 => format!("+{}", fmt_count(Some(v))),
            other => fmt_count(other),
        };
        let pct = match s.change_pct {
            Some(v) => format!("{v:+.1}%"),
            None => MISSING.to_string(),
        };
        push_line(
            &mut out,
            format!(
                "  {:<26} {:>12} -> {:>12}  {:>11}  ({pct})",
                s.label,
                fmt_count(s.first),
                fmt_count(s.last),
                change
            ),
        );
    }
    out
}

/// Format the all-months growth table, with the mean period growth as a footer.
pub fn format_period_table(records: &[PeriodRecord], region: &str, parent: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {region} Population Growth by Period ===\n"));
    out.push_str(&format!("Share is relative to {parent}.\n\n"));

    push_line(
        &mut out,
        format!(
            "{:<10} {:>12} {:>10} {:>8} {:>12} {:>7}",
            "date", "population", "change", "chg%", "parent", "share%"
        ),
    );
    push_rule(&mut out, &[10, 12, 10, 8, 12, 7]);
    for r in records {
        push_line(
            &mut out,
            format!(
                "{:<10} {:>12} {:>10} {:>8} {:>12} {:>7}",
                r.date.format("%Y-%m-%d"),
                fmt_count(r.population),
                fmt_count(r.change),
                fmt_pct(r.growth_pct),
                fmt_count(r.parent_population),
                fmt_pct(r.share_pct),
            ),
        );
    }
    out.push_str(&format!(
        "\nAverage growth per period: {}%\n",
        fmt_pct(mean_present(records.iter().map(|r| r.growth_pct)))
    ));
    out
}

/// Format raw enriched records (generic two-series derivation).
pub fn format_enriched_table(records: &[EnrichedRecord], primary: &str, secondary: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {primary} vs. {secondary} ===\n\n"));
    push_line(
        &mut out,
        format!(
            "{:<6} {:>14} {:>14} {:>12} {:>8} {:>12} {:>8} {:>8} {:>8} {:>8} {:>12}",
            "year", "primary", "secondary", "delta", "chg%", "cumulative", "cum%", "index", "sec ix", "share%",
            "per unit"
        ),
    );
    push_rule(&mut out, &[6, 14, 14, 12, 8, 12, 8, 8, 8, 8, 12]);
    for r in records {
        push_line(
            &mut out,
            format!(
                "{:<6} {:>14} {:>14} {:>12} {:>8} {:>12} {:>8} {:>8} {:>8} {:>8} {:>12}",
                r.year,
                fmt_count(r.primary),
                fmt_count(r.secondary),
                fmt_count(r.delta),
                fmt_pct(r.pct_change),
                fmt_count(r.cumulative),
                fmt_pct(r.cumulative_pct),
                fmt_pct(r.index),
                fmt_pct(r.secondary_index),
                fmt_pct(r.share_pct),
                fmt_pct(r.per_unit),
            ),
        );
    }
    out
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn push_rule(out: &mut String, widths: &[usize]) {
    let parts: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(out, parts.join(" "));
}

fn year_span(years: impl Iterator<Item = i32>) -> String {
    let years: Vec<i32> = years.collect();
    match (years.first(), years.last()) {
        (Some(a), Some(b)) => format!(" ({a}-{b})"),
        _ => String::new(),
    }
}

/// Whole numbers with thousands separators.
fn fmt_count(v: Option<f64>) -> String {
    let Some(v) = v else { return MISSING.to_string() };
    let rounded = v.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn fmt_pct(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{:.2}", crate::io::export::round_export(v)),
        None => MISSING.to_string(),
    }
}

/// Composition shares, one decimal.
fn fmt_share(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.1}"),
        None => MISSING.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_are_grouped() {
        assert_eq!(fmt_count(Some(4_888_723.0)), "4,888,723");
        assert_eq!(fmt_count(Some(-12_345.4)), "-12,345");
        assert_eq!(fmt_count(Some(999.0)), "999");
        assert_eq!(fmt_count(None), "-");
    }

    #[test]
    fn growth_table_shows_missing_as_dash() {
        let records = vec![
            GrowthRecord {
                year: 2012,
                population: Some(3_875_051.0),
                yoy_change: None,
                yoy_growth_pct: None,
                cumulative_growth: Some(0.0),
                cumulative_growth_pct: Some(0.0),
                parent_population: Some(34_754_312.0),
                share_pct: Some(11.149_7),
            },
            GrowthRecord {
                year: 2013,
                population: Some(3_981_011.0),
                yoy_change: Some(105_960.0),
                yoy_growth_pct: Some(2.734_4),
                cumulative_growth: Some(105_960.0),
                cumulative_growth_pct: Some(2.734_4),
                parent_population: None,
                share_pct: None,
            },
        ];
        let txt = format_growth_table(&records, "Alberta", "Canada");
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines[0], "=== Alberta Year-over-Year Population Growth (2012-2013) ===");
        assert!(lines[5].starts_with("2012      3,875,051          -        -"));
        assert!(lines[5].ends_with("11.15"));
        assert!(lines[6].ends_with("-       -"));
        assert!(lines.iter().all(|l| !l.ends_with(' ')));
    }

    #[test]
    fn summary_uses_signed_percentages() {
        let summary = vec![GrowthSummary {
            label: "Population".to_string(),
            first: Some(100.0),
            last: Some(125.0),
            change: Some(25.0),
            change_pct: Some(25.0),
        }];
        let txt = format_growth_summary(&summary, "2012-13", "2025-26");
        assert!(txt.contains("(+25.0%)"));
    }

    #[test]
    fn summary_prints_absolute_change() {
        let summary = vec![
            GrowthSummary {
                label: "K-12 Spending".to_string(),
                first: Some(6179.0),
                last: Some(9883.0),
                change: Some(3704.0),
                change_pct: Some(59.944),
            },
            GrowthSummary {
                label: "Post-Secondary Spending".to_string(),
                first: Some(3000.0),
                last: Some(1500.0),
                change: Some(-1500.0),
                change_pct: Some(-50.0),
            },
            GrowthSummary {
                label: "Population".to_string(),
                first: None,
                last: Some(1.0),
                change: None,
                change_pct: None,
            },
        ];
        let txt = format_growth_summary(&summary, "2012-13", "2025-26");
        let lines: Vec<&str> = txt.lines().collect();
        assert!(lines[1].ends_with("6,179 ->        9,883       +3,704  (+59.9%)"));
        assert!(lines[2].ends_with("-1,500  (-50.0%)"));
        assert!(lines[3].ends_with("-  (-)"));
    }

    #[test]
    fn period_table_reports_average_growth() {
        let date = |m| chrono::NaiveDate::from_ymd_opt(2012, m, 1).unwrap();
        let records = vec![
            PeriodRecord {
                date: date(1),
                population: Some(400.0),
                change: None,
                growth_pct: None,
                parent_population: Some(4000.0),
                share_pct: Some(10.0),
            },
            PeriodRecord {
                date: date(4),
                population: Some(404.0),
                change: Some(4.0),
                growth_pct: Some(1.0),
                parent_population: None,
                share_pct: None,
            },
            PeriodRecord {
                date: date(7),
                population: Some(416.12),
                change: Some(12.12),
                growth_pct: Some(3.0),
                parent_population: None,
                share_pct: None,
            },
        ];
        let txt = format_period_table(&records, "Alberta", "Canada");
        assert!(txt.starts_with("=== Alberta Population Growth by Period ==="));
        assert!(txt.contains("\n2012-04-01          404          4     1.00"));
        assert!(txt.ends_with("Average growth per period: 2.00%\n"));
    }
}
