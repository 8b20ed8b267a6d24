//! ASCII plotting of base-100 index series for terminal output.
//!
//! Fixed-size character grid, deterministic output:
//! - each series gets a marker character drawn at its data points
//! - consecutive points of a series are joined with `.`
//! - a `=` rule marks the 100 baseline when it lies inside the y-range
//!
//! Missing values break the line; the next available point starts a new run.

use crate::domain::{GrowthRecord, SpendingRecord};
use crate::metrics::index;

/// One line on the chart.
#[derive(Debug, Clone)]
pub struct PlotSeries {
    pub label: String,
    pub marker: char,
    pub points: Vec<(i32, Option<f64>)>,
}

/// Index series of the spending table (population plus each spending category).
pub fn spending_index_series(records: &[SpendingRecord]) -> Vec<PlotSeries> {
    let series = |label: &str, marker, f: fn(&SpendingRecord) -> Option<f64>| PlotSeries {
        label: label.to_string(),
        marker,
        points: records.iter().map(|r| (r.year, f(r))).collect(),
    };
    vec![
        series("Population", 'P', |r| r.pop_index),
        series("K-12", 'K', |r| r.k12_index),
        series("Post-Secondary", 'S', |r| r.post_sec_index),
        series("Total", 'T', |r| r.total_index),
    ]
}

/// Base-100 population index of the growth table.
pub fn growth_index_series(records: &[GrowthRecord]) -> Vec<PlotSeries> {
    let base = records.first().and_then(|r| r.population);
    vec![PlotSeries {
        label: "Population".to_string(),
        marker: 'P',
        points: records.iter().map(|r| (r.year, index(base, r.population))).collect(),
    }]
}

/// Render index series onto a `width` x `height` grid.
pub fn render_index_plot(series: &[PlotSeries], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let Some((x_min, x_max)) = year_range(series) else {
        return "Plot: no data\n".to_string();
    };
    let (y_min, y_max) = value_range(series).unwrap_or((99.0, 101.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    if (y_min..=y_max).contains(&100.0) {
        let row = map_y(100.0, y_min, y_max, height);
        for cell in grid[row].iter_mut() {
            *cell = '=';
        }
    }

    // Lines first so markers overlay them.
    for s in series {
        let mut prev: Option<(usize, usize)> = None;
        for &(year, value) in &s.points {
            let Some(v) = value else {
                prev = None;
                continue;
            };
            let cell = (map_x(year, x_min, x_max, width), map_y(v, y_min, y_max, height));
            if let Some((x0, y0)) = prev {
                draw_line(&mut grid, x0, y0, cell.0, cell.1, '.');
            }
            prev = Some(cell);
        }
    }
    for s in series {
        for &(year, value) in &s.points {
            if let Some(v) = value {
                let x = map_x(year, x_min, x_max, width);
                let y = map_y(v, y_min, y_max, height);
                grid[y][x] = s.marker;
            }
        }
    }

    let mut out = String::new();
    out.push_str(&format!("Plot: year=[{x_min}, {x_max}] | index=[{y_min:.2}, {y_max:.2}]\n"));
    let legend: Vec<String> = series.iter().map(|s| format!("{}={}", s.marker, s.label)).collect();
    out.push_str(&format!("Legend: {}\n", legend.join(" ")));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    out
}

fn year_range(series: &[PlotSeries]) -> Option<(i32, i32)> {
    let years = series.iter().flat_map(|s| s.points.iter().map(|p| p.0));
    let min = years.clone().min()?;
    let max = years.max()?;
    Some((min, max))
}

fn value_range(series: &[PlotSeries]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for v in series.iter().flat_map(|s| s.points.iter().filter_map(|p| p.1)) {
        min_y = min_y.min(v);
        max_y = max_y.max(v);
    }
    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else if min_y.is_finite() {
        Some((min_y - 1.0, min_y + 1.0))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(year: i32, x_min: i32, x_max: i32, width: usize) -> usize {
    if x_max <= x_min {
        return 0;
    }
    let u = (year - x_min) as f64 / (x_max - x_min) as f64;
    (u.clamp(0.0, 1.0) * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // Row 0 is the top (max value).
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish). Only fills blank or baseline cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid.get_mut(y0 as usize).and_then(|row| row.get_mut(x0 as usize)) {
            if *cell == ' ' || *cell == '=' {
                *cell = ch;
            }
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
