//! Command-line argument definitions using clap

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;

use crate::pipeline::{AnalysisConfig, CollapseMode};

/// Cohortscope - Weighted attitude shares by country, year, generation and age
#[derive(Parser, Debug)]
#[command(name = "cohortscope")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Respondent table (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Democracy-index table with one row per country-year (CSV or Parquet)
    #[arg(short, long)]
    pub regimes: PathBuf,

    /// JSON configuration file. Fields it omits keep their built-in defaults.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output directory for CSV tables, the JSON summary and charts.
    /// Defaults to '<input stem>_cohorts' next to the input file.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Skip chart rendering
    #[arg(long, default_value = "false")]
    pub no_charts: bool,

    /// Small-bin collapse for both age-binned analyses.
    /// Options: "single-pass" (one forward pass) or "fixed-point" (repeat until stable)
    #[arg(long)]
    pub collapse_mode: Option<CollapseMode>,

    /// Minimum valid answers per age bin before it is merged into its neighbour
    #[arg(long, value_parser = validate_min_bin_count)]
    pub min_bin_count: Option<usize>,

    /// Keep cells whose estimate is exactly zero
    #[arg(long, default_value = "false")]
    pub keep_zero_cells: bool,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for full table scan.
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

impl Cli {
    /// Output directory, derived from the input path when not given.
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| {
            let parent = self.input.parent().unwrap_or_else(|| Path::new("."));
            let stem = self
                .input
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("survey");
            parent.join(format!("{}_cohorts", stem))
        })
    }

    /// Load the configuration file (or defaults), apply flag overrides and validate.
    pub fn resolve_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_json_file(path)?,
            None => AnalysisConfig::default(),
        };

        if let Some(mode) = self.collapse_mode {
            config.generation.collapse = mode;
            config.index.collapse = mode;
        }
        if let Some(min) = self.min_bin_count {
            config.generation.min_bin_count = min;
            config.index.min_bin_count = min;
        }
        if self.keep_zero_cells {
            config.drop_zero_cells = false;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Validator for min_bin_count parameter
fn validate_min_bin_count(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid count", s))?;

    if value == 0 {
        Err("min_bin_count must be at least 1".to_string())
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_dir_sits_next_to_input() {
        let cli = Cli::parse_from(["cohortscope", "-i", "/data/wvs.csv", "-r", "/data/vdem.csv"]);
        assert_eq!(cli.output_dir(), PathBuf::from("/data/wvs_cohorts"));
    }

    #[test]
    fn test_overrides_apply_to_both_binned_analyses() {
        let cli = Cli::parse_from([
            "cohortscope",
            "-i",
            "wvs.csv",
            "-r",
            "vdem.csv",
            "--collapse-mode",
            "fixed-point",
            "--min-bin-count",
            "25",
            "--keep-zero-cells",
        ]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.generation.collapse, CollapseMode::FixedPoint);
        assert_eq!(config.index.collapse, CollapseMode::FixedPoint);
        assert_eq!(config.generation.min_bin_count, 25);
        assert_eq!(config.index.min_bin_count, 25);
        assert!(!config.drop_zero_cells);
    }

    #[test]
    fn test_zero_min_bin_count_rejected() {
        assert!(validate_min_bin_count("0").is_err());
        assert!(validate_min_bin_count("abc").is_err());
        assert_eq!(validate_min_bin_count("10"), Ok(10));
    }
}
