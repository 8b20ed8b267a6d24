//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments
//! - runs the requested analysis
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, DeriveArgs, GrowthArgs, PlotArgs, QuarterlyArgs, SpendingArgs, SummaryArgs, WindowArgs};
use crate::domain::{
    DeriveConfig, FilterWindow, GrowthConfig, MetricOptions, PeriodConfig, PlotSize, SpendingConfig,
};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `abg` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = crate::cli::Cli::parse();
    match cli.command {
        Command::Growth(args) => handle_growth(args),
        Command::Quarterly(args) => handle_quarterly(args),
        Command::Spending(args) => handle_spending(args),
        Command::Summary(args) => handle_summary(args),
        Command::Derive(args) => handle_derive(args),
    }
}

/// Log to stderr so report output on stdout stays clean. `RUST_LOG` overrides the default.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_growth(args: GrowthArgs) -> Result<(), AppError> {
    let config = growth_config_from_args(&args);
    let records = pipeline::run_growth(&config)?;

    println!(
        "{}",
        crate::report::format_growth_table(&records, &config.region, &config.parent)
    );

    if let Some(size) = config.plot {
        let series = crate::plot::growth_index_series(&records);
        println!("{}", crate::plot::render_index_plot(&series, size.width, size.height));
    }
    if let Some(path) = &config.export {
        crate::io::export::write_growth_csv(path, &records)?;
        println!("Exported to {}", path.display());
    }
    Ok(())
}

fn handle_quarterly(args: QuarterlyArgs) -> Result<(), AppError> {
    let config = period_config_from_args(&args);
    let records = pipeline::run_periods(&config)?;

    println!(
        "{}",
        crate::report::format_period_table(&records, &config.region, &config.parent)
    );
    if let Some(path) = &config.export {
        crate::io::export::write_periods_csv(path, &records)?;
        println!("Exported to {}", path.display());
    }
    Ok(())
}

fn handle_spending(args: SpendingArgs) -> Result<(), AppError> {
    let config = spending_config_from_args(&args);
    let records = pipeline::run_spending(&config)?;

    println!("{}", crate::report::format_spending_table(&records, &config.region));

    if let Some(size) = config.plot {
        let series = crate::plot::spending_index_series(&records);
        println!("{}", crate::plot::render_index_plot(&series, size.width, size.height));
    }
    if let Some(path) = &config.export {
        crate::io::export::write_spending_csv(path, &records)?;
        println!("Exported to {}", path.display());
    }
    Ok(())
}

fn handle_summary(args: SummaryArgs) -> Result<(), AppError> {
    let config = SpendingConfig {
        data_path: args.data.data.clone(),
        region: args.region.clone(),
        window: window_from_args(&args.window),
        spending_path: args.spending.clone(),
        export: None,
        plot: None,
    };
    let records = pipeline::run_spending(&config)?;
    let summary = pipeline::growth_summary(&records);

    let from = records.first().map(|r| r.fiscal_year.as_str()).unwrap_or("-");
    let to = records.last().map(|r| r.fiscal_year.as_str()).unwrap_or("-");
    println!("{}", crate::report::format_growth_summary(&summary, from, to));
    Ok(())
}

fn handle_derive(args: DeriveArgs) -> Result<(), AppError> {
    let config = derive_config_from_args(&args);
    let records = pipeline::run_derive(&config)?;

    println!(
        "{}",
        crate::report::format_enriched_table(&records, &config.primary, &config.secondary)
    );
    if let Some(path) = &config.export {
        crate::io::export::write_enriched_csv(path, &records)?;
        println!("Exported to {}", path.display());
    }
    Ok(())
}

pub fn window_from_args(args: &WindowArgs) -> FilterWindow {
    FilterWindow {
        month: args.month,
        year_start: args.start,
        year_end: args.end,
        on_duplicate: args.on_duplicate,
    }
}

pub fn plot_from_args(args: &PlotArgs) -> Option<PlotSize> {
    args.plot.then_some(PlotSize {
        width: args.width,
        height: args.height,
    })
}

pub fn growth_config_from_args(args: &GrowthArgs) -> GrowthConfig {
    GrowthConfig {
        data_path: args.data.data.clone(),
        region: args.region.clone(),
        parent: args.parent.clone(),
        window: window_from_args(&args.window),
        export: args.export.clone(),
        plot: plot_from_args(&args.plot),
    }
}

pub fn period_config_from_args(args: &QuarterlyArgs) -> PeriodConfig {
    PeriodConfig {
        data_path: args.data.data.clone(),
        region: args.region.clone(),
        parent: args.parent.clone(),
        window: window_from_args(&args.window),
        export: args.export.clone(),
    }
}

pub fn spending_config_from_args(args: &SpendingArgs) -> SpendingConfig {
    SpendingConfig {
        data_path: args.data.data.clone(),
        region: args.region.clone(),
        window: window_from_args(&args.window),
        spending_path: args.spending.clone(),
        export: args.export.clone(),
        plot: plot_from_args(&args.plot),
    }
}

pub fn derive_config_from_args(args: &DeriveArgs) -> DeriveConfig {
    DeriveConfig {
        data_path: args.data.data.clone(),
        primary: args.primary.clone(),
        secondary: args.secondary.clone(),
        window: window_from_args(&args.window),
        options: MetricOptions {
            base_index: args.base_index,
            per_unit_scale: args.scale,
        },
        export: args.export.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::domain::DuplicatePolicy;

    #[test]
    fn growth_defaults_match_q1_2012_2025() {
        let cli = Cli::try_parse_from(["abg", "growth", "--data", "pop.csv"]).unwrap();
        let Command::Growth(args) = cli.command else {
            panic!("expected growth command");
        };
        let config = growth_config_from_args(&args);
        assert_eq!(config.region, "Alberta");
        assert_eq!(config.parent, "Canada");
        assert_eq!(config.window.month, 1);
        assert_eq!((config.window.year_start, config.window.year_end), (2012, 2025));
        assert_eq!(config.window.on_duplicate, DuplicatePolicy::Last);
        assert_eq!(config.plot, None);
    }

    #[test]
    fn quarterly_uses_the_same_window_flags() {
        let cli = Cli::try_parse_from(["abg", "quarterly", "--data", "pop.csv", "--end", "2024", "--month", "10"])
            .unwrap();
        let Command::Quarterly(args) = cli.command else {
            panic!("expected quarterly command");
        };
        let config = period_config_from_args(&args);
        assert_eq!(config.parent, "Canada");
        assert_eq!((config.window.year_end, config.window.month), (2024, 10));
        assert_eq!(config.export, None);
    }

    #[test]
    fn derive_args_map_to_metric_options() {
        let cli = Cli::try_parse_from([
            "abg",
            "derive",
            "--data",
            "pop.csv",
            "--primary",
            "Alberta",
            "--secondary",
            "Canada",
            "--base-index",
            "2",
            "--scale",
            "1000",
            "--on-duplicate",
            "first",
        ])
        .unwrap();
        let Command::Derive(args) = cli.command else {
            panic!("expected derive command");
        };
        let config = derive_config_from_args(&args);
        assert_eq!(config.options.base_index, 2);
        assert_eq!(config.options.per_unit_scale, 1000.0);
        assert_eq!(config.window.on_duplicate, DuplicatePolicy::First);
    }
}
