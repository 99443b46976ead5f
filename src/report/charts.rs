//! Chart rendering
//!
//! Each analysis becomes one bitmap figure: a grid of facet panels with the
//! bucket on the X-axis, the estimate on a fixed 0-1 Y-axis, and a
//! confidence-interval whisker per point. Rendering only ever sees
//! [`ChartPoint`] tuples; it knows nothing about how they were estimated.

use std::collections::BTreeMap;
use std::path::Path;

use plotters::prelude::*;
use thiserror::Error;

use crate::pipeline::{parse_hex_color, AggregateCell, AnalysisKind, DisplayConfig, DisplayGroup};

/// Errors that can occur during chart generation
#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("Failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("Failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

type Result<T> = core::result::Result<T, ChartError>;

/// Renderer input: one estimate with its interval.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub x_key: String,
    /// Sort position of `x_key` on the axis
    pub x_order: i32,
    pub y: f64,
    pub lower: f64,
    pub upper: f64,
    /// Series (country) the point belongs to
    pub group: String,
    pub display_group: DisplayGroup,
    /// Panel the point is drawn in
    pub facet: String,
}

/// Map cells onto chart points. Trend analyses facet by measure; the
/// generational analysis facets by generation and measure.
pub fn to_chart_points(kind: AnalysisKind, cells: &[AggregateCell]) -> Vec<ChartPoint> {
    cells
        .iter()
        .map(|cell| {
            let facet = match (kind, cell.generation) {
                (AnalysisKind::Generational, Some(g)) => format!("{} · {}", cell.measure, g),
                _ => cell.measure.clone(),
            };
            let x_order = match cell.bucket {
                crate::pipeline::Bucket::Year(year) => year,
                crate::pipeline::Bucket::Age(bin) => bin.lower,
            };
            ChartPoint {
                x_key: cell.bucket.to_string(),
                x_order,
                y: cell.estimate,
                lower: cell.lower,
                upper: cell.upper,
                group: cell.country.clone(),
                display_group: cell.display_group,
                facet,
            }
        })
        .collect()
}

/// Order series: configured order first, then remaining countries alphabetically.
pub fn ordered_groups(points: &[ChartPoint], display: &DisplayConfig) -> Vec<String> {
    let mut present: Vec<String> = points.iter().map(|p| p.group.clone()).collect();
    present.sort();
    present.dedup();

    let mut ordered: Vec<String> = display
        .country_order
        .iter()
        .filter(|c| present.contains(c))
        .cloned()
        .collect();
    for group in present {
        if !ordered.contains(&group) {
            ordered.push(group);
        }
    }
    ordered
}

/// Series color: a country's own color when highlighted, otherwise its
/// display-group color.
pub fn group_color(group: &str, display_group: DisplayGroup, display: &DisplayConfig) -> RGBColor {
    let hex = match display_group {
        DisplayGroup::Highlighted => display
            .colors
            .get(group)
            .unwrap_or(&display.democracy_color),
        DisplayGroup::LiberalDemocracy | DisplayGroup::OtherDemocracy => &display.democracy_color,
        DisplayGroup::Other => &display.other_color,
    };
    let (r, g, b) = parse_hex_color(hex).unwrap_or((0, 0, 0));
    RGBColor(r, g, b)
}

/// Render a faceted chart to a PNG file.
pub fn render_chart(
    points: &[ChartPoint],
    title: &str,
    y_label: &str,
    display: &DisplayConfig,
    output_path: &Path,
) -> Result<()> {
    if points.is_empty() {
        return Err(ChartError::InvalidData("No points to draw".to_string()));
    }
    if let Some(p) = points
        .iter()
        .find(|p| !(0.0..=1.0).contains(&p.lower) || !(p.lower <= p.y && p.y <= p.upper) || p.upper > 1.0)
    {
        return Err(ChartError::InvalidData(format!(
            "Point {} / {} has inconsistent bounds ({}, {}, {})",
            p.group, p.x_key, p.lower, p.y, p.upper
        )));
    }

    let mut facets: Vec<String> = points.iter().map(|p| p.facet.clone()).collect();
    facets.sort();
    facets.dedup();

    let x_keys: Vec<String> = {
        let mut keyed: BTreeMap<(i32, String), ()> = BTreeMap::new();
        for p in points {
            keyed.insert((p.x_order, p.x_key.clone()), ());
        }
        keyed.into_keys().map(|(_, key)| key).collect()
    };
    let x_position = |key: &str| x_keys.iter().position(|k| k == key).unwrap_or(0) as f64;
    let groups = ordered_groups(points, display);

    let cols = facets.len().min(3);
    let rows = facets.len().div_ceil(cols);

    let root = BitMapBackend::new(output_path, (display.chart_width, display.chart_height))
        .into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| ChartError::DrawingArea(e.to_string()))?;
    let root = root
        .titled(title, ("sans-serif", 26))
        .map_err(|e| ChartError::DrawingArea(e.to_string()))?;
    let panels = root.split_evenly((rows, cols));

    let x_max = x_keys.len() as f64 - 0.5;
    let label_formatter = |x: &f64| {
        let i = x.round();
        if (x - i).abs() < 1e-6 && i >= 0.0 {
            x_keys.get(i as usize).cloned().unwrap_or_default()
        } else {
            String::new()
        }
    };

    for (panel, facet) in panels.iter().zip(facets.iter()) {
        let mut chart = ChartBuilder::on(panel)
            .caption(facet, ("sans-serif", 16))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(45)
            .build_cartesian_2d(-0.5f64..x_max, 0.0f64..1.0f64)
            .map_err(|e| ChartError::ChartConfig(e.to_string()))?;

        chart
            .configure_mesh()
            .x_labels(x_keys.len().max(2))
            .x_label_formatter(&label_formatter)
            .y_desc(y_label)
            .light_line_style(WHITE.mix(0.0))
            .draw()
            .map_err(|e| ChartError::ChartConfig(e.to_string()))?;

        for group in &groups {
            let mut series: Vec<&ChartPoint> = points
                .iter()
                .filter(|p| &p.facet == facet && &p.group == group)
                .collect();
            if series.is_empty() {
                continue;
            }
            series.sort_by_key(|p| p.x_order);

            let color = group_color(group, series[0].display_group, display);
            let width = if series[0].display_group == DisplayGroup::Highlighted {
                2
            } else {
                1
            };

            let coords: Vec<(f64, f64)> = series.iter().map(|p| (x_position(&p.x_key), p.y)).collect();
            let line = chart
                .draw_series(LineSeries::new(coords, color.stroke_width(width)))
                .map_err(|e| ChartError::Drawing(e.to_string()))?;
            if series[0].display_group == DisplayGroup::Highlighted {
                line.label(group.as_str()).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2))
                });
            }

            for p in &series {
                let x = x_position(&p.x_key);
                chart
                    .draw_series(std::iter::once(PathElement::new(
                        vec![(x, p.lower), (x, p.upper)],
                        color.mix(0.6),
                    )))
                    .map_err(|e| ChartError::Drawing(e.to_string()))?;
                chart
                    .draw_series(std::iter::once(Circle::new((x, p.y), 3, color.filled())))
                    .map_err(|e| ChartError::Drawing(e.to_string()))?;
            }
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK.mix(0.3))
            .position(SeriesLabelPosition::UpperRight)
            .draw()
            .map_err(|e| ChartError::Drawing(e.to_string()))?;
    }

    root.present()
        .map_err(|e| ChartError::Drawing(e.to_string()))?;
    Ok(())
}

/// Render the chart for one analysis to `<output_dir>/<slug>.png`.
pub fn render_analysis(
    kind: AnalysisKind,
    cells: &[AggregateCell],
    display: &DisplayConfig,
    output_dir: &Path,
) -> Result<std::path::PathBuf> {
    let path = output_dir.join(format!("{}.png", kind.slug()));
    let points = to_chart_points(kind, cells);
    let y_label = match kind {
        AnalysisKind::EmancipativeIndex => "Mean index (95% CI)",
        _ => "Weighted share (95% CI)",
    };
    render_chart(&points, kind.title(), y_label, display, &path)?;
    Ok(path)
}
