//! Aggregate-cell export: one CSV per analysis and a JSON run summary

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use polars::prelude::*;
use serde::Serialize;

use crate::pipeline::{
    AggregateCell, AnalysisConfig, AnalysisKind, AnalysisOutput, AnalysisResults, Diagnostics,
    RegimeGrouping,
};

/// Metadata about the run
#[derive(Serialize)]
pub struct RunMetadata {
    /// Timestamp of the run (ISO 8601 format)
    pub timestamp: String,
    /// Cohortscope version
    pub version: String,
    /// Respondent table path
    pub input_file: String,
    /// Democracy-index table path
    pub regime_file: String,
    /// Respondents loaded
    pub respondents: usize,
    /// Configuration the run used
    pub config: AnalysisConfig,
}

/// One analysis block of the JSON export
#[derive(Serialize)]
pub struct AnalysisExport<'a> {
    pub analysis: AnalysisKind,
    pub title: &'static str,
    pub regime_grouping: RegimeGrouping,
    pub undefined_cells: usize,
    pub zero_cells_dropped: usize,
    pub diagnostics: Diagnostics,
    pub cells: &'a [AggregateCell],
}

/// Complete JSON export
#[derive(Serialize)]
pub struct RunExport<'a> {
    pub metadata: RunMetadata,
    pub analyses: Vec<AnalysisExport<'a>>,
}

/// Parameters for the JSON export metadata
pub struct ExportParams<'a> {
    pub input_file: &'a Path,
    pub regime_file: &'a Path,
    pub respondents: usize,
    pub config: &'a AnalysisConfig,
}

/// Convert cells into a DataFrame with one row per cell.
pub fn cells_to_dataframe(cells: &[AggregateCell]) -> Result<DataFrame> {
    let country: Vec<&str> = cells.iter().map(|c| c.country.as_str()).collect();
    let bucket: Vec<String> = cells.iter().map(|c| c.bucket.to_string()).collect();
    let measure: Vec<&str> = cells.iter().map(|c| c.measure.as_str()).collect();
    let generation: Vec<Option<&str>> = cells
        .iter()
        .map(|c| c.generation.map(|g| g.label()))
        .collect();
    let estimate: Vec<f64> = cells.iter().map(|c| c.estimate).collect();
    let n: Vec<u64> = cells.iter().map(|c| c.n as u64).collect();
    let se: Vec<f64> = cells.iter().map(|c| c.se).collect();
    let lower: Vec<f64> = cells.iter().map(|c| c.lower).collect();
    let upper: Vec<f64> = cells.iter().map(|c| c.upper).collect();
    let regime: Vec<Option<&str>> = cells.iter().map(|c| c.regime.map(|r| r.label())).collect();
    let liberal_democracy: Vec<Option<bool>> = cells.iter().map(|c| c.liberal_democracy).collect();
    let regime_year: Vec<Option<i32>> = cells.iter().map(|c| c.regime_year).collect();
    let display_group: Vec<String> = cells.iter().map(|c| c.display_group.to_string()).collect();

    let df = DataFrame::new(vec![
        Column::new("country".into(), country),
        Column::new("bucket".into(), bucket),
        Column::new("measure".into(), measure),
        Column::new("generation".into(), generation),
        Column::new("estimate".into(), estimate),
        Column::new("n".into(), n),
        Column::new("se".into(), se),
        Column::new("lower".into(), lower),
        Column::new("upper".into(), upper),
        Column::new("regime".into(), regime),
        Column::new("liberal_democracy".into(), liberal_democracy),
        Column::new("regime_year".into(), regime_year),
        Column::new("display_group".into(), display_group),
    ])
    .context("Failed to build cell table")?;

    Ok(df)
}

/// Write one analysis' cells to `<output_dir>/<slug>.csv`.
pub fn write_cells_csv(output: &AnalysisOutput, output_dir: &Path) -> Result<PathBuf> {
    let path = output_dir.join(format!("{}.csv", output.kind.slug()));
    let mut df = cells_to_dataframe(&output.table.cells)?;

    let mut file = File::create(&path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    CsvWriter::new(&mut file)
        .finish(&mut df)
        .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;

    Ok(path)
}

/// Write the JSON summary with metadata, diagnostics and every cell.
pub fn export_run_summary(
    results: &AnalysisResults,
    output_path: &Path,
    params: &ExportParams,
) -> Result<()> {
    let export = RunExport {
        metadata: RunMetadata {
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            input_file: params.input_file.display().to_string(),
            regime_file: params.regime_file.display().to_string(),
            respondents: params.respondents,
            config: params.config.clone(),
        },
        analyses: results
            .outputs
            .iter()
            .map(|o| AnalysisExport {
                analysis: o.kind,
                title: o.kind.title(),
                regime_grouping: params.config.display.grouping.for_kind(o.kind),
                undefined_cells: o.table.undefined,
                zero_cells_dropped: o.table.zero,
                diagnostics: o.diagnostics,
                cells: &o.table.cells,
            })
            .collect(),
    };

    let json = serde_json::to_string_pretty(&export)
        .context("Failed to serialize run summary to JSON")?;

    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write run summary to {}", output_path.display()))?;

    Ok(())
}
