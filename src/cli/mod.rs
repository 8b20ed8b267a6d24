//! Command-line parsing.
//!
//! Argument parsing and command dispatch stay separate from the pipeline so
//! the derivation code never sees clap types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::DuplicatePolicy;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "abg", version, about = "Alberta population growth and education spending metrics")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Year-over-year population growth of a region, with its share of the parent aggregate.
    Growth(GrowthArgs),
    /// Period-over-period growth across every month in the table (quarterly data).
    Quarterly(QuarterlyArgs),
    /// Population vs. education spending: per-capita values and base-100 indices.
    Spending(SpendingArgs),
    /// First-to-last growth rates for population and each spending category.
    Summary(SummaryArgs),
    /// Derive metrics for any two entities of the population table.
    Derive(DeriveArgs),
}

/// Population table location.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// Population CSV (columns REF_DATE, GEO, VALUE).
    #[arg(long, env = "ABG_DATA", default_value = "17100009.csv")]
    pub data: PathBuf,
}

/// Filter window shared by every analysis.
#[derive(Debug, Args, Clone)]
pub struct WindowArgs {
    /// Calendar month of the annual snapshot (1 = Q1/January).
    #[arg(long, default_value_t = 1)]
    pub month: u32,

    /// First year (inclusive).
    #[arg(long, default_value_t = 2012)]
    pub start: i32,

    /// Last year (inclusive).
    #[arg(long, default_value_t = 2025)]
    pub end: i32,

    /// Which row wins when a year appears more than once.
    #[arg(long, value_enum, default_value_t = DuplicatePolicy::Last)]
    pub on_duplicate: DuplicatePolicy,
}

/// Terminal chart options.
#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// Render a base-100 index chart in the terminal.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[derive(Debug, Parser, Clone)]
pub struct GrowthArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub window: WindowArgs,

    /// Region whose growth is reported.
    #[arg(long, default_value = "Alberta")]
    pub region: String,

    /// Aggregate used for the share column.
    #[arg(long, default_value = "Canada")]
    pub parent: String,

    /// Export the table to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    #[command(flatten)]
    pub plot: PlotArgs,
}

#[derive(Debug, Parser, Clone)]
pub struct QuarterlyArgs {
    #[command(flatten)]
    pub data: DataArgs,

    // Here `--month` is the last snapshot of the end year; every earlier month is included.
    #[command(flatten)]
    pub window: WindowArgs,

    #[arg(long, default_value = "Alberta")]
    pub region: String,

    /// Aggregate used for the share column.
    #[arg(long, default_value = "Canada")]
    pub parent: String,

    /// Export the table to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct SpendingArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub window: WindowArgs,

    /// Region whose population is compared against spending.
    #[arg(long, default_value = "Alberta")]
    pub region: String,

    /// Spending CSV (fiscal_year,year,k12_m,post_sec_m). Defaults to the built-in budget figures.
    #[arg(long, value_name = "CSV")]
    pub spending: Option<PathBuf>,

    /// Export the table to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    #[command(flatten)]
    pub plot: PlotArgs,
}

#[derive(Debug, Parser, Clone)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub window: WindowArgs,

    #[arg(long, default_value = "Alberta")]
    pub region: String,

    /// Spending CSV (fiscal_year,year,k12_m,post_sec_m). Defaults to the built-in budget figures.
    #[arg(long, value_name = "CSV")]
    pub spending: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct DeriveArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub window: WindowArgs,

    /// Primary entity (drives the row set).
    #[arg(long)]
    pub primary: String,

    /// Secondary entity (left-joined on year).
    #[arg(long)]
    pub secondary: String,

    /// Position of the base record for index and cumulative metrics.
    #[arg(long, default_value_t = 0)]
    pub base_index: usize,

    /// Multiplier applied before dividing by the secondary value.
    #[arg(long, default_value_t = 1.0)]
    pub scale: f64,

    /// Export enriched records to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}
