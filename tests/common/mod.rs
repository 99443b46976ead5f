//! Shared test utilities and fixture generators

#![allow(dead_code)]

use polars::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

/// Small respondent table using the default column names.
///
/// - ESP 2011 (wave 6): four respondents, weights 1, 2, 1, 1
/// - POL 2012 (wave 6): two respondents
/// - POL 1990 (wave 2): one respondent, outside the co-endorsement waves
/// - USA 2011 (wave 6): one respondent, no transition year configured
///
/// E117 supportive share for ESP 2011 is (1 + 2 + 1) / 5 = 0.8 over n = 4.
pub fn create_survey_dataframe() -> DataFrame {
    df! {
        "COUNTRY_ALPHA" => ["ESP", "ESP", "ESP", "ESP", "POL", "POL", "POL", "USA"],
        "S020" => [2011i64, 2011, 2011, 2011, 2012, 2012, 1990, 2011],
        "S002VS" => [6i64, 6, 6, 6, 6, 6, 2, 6],
        "X002" => [1950i64, 1960, 1985, 1990, 1955, 1970, 1940, 1960],
        "X003" => [61i64, 51, 26, 21, 57, 42, 50, 51],
        "S017" => [1.0f64, 2.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
        "E117" => [1i64, 2, 4, 1, 1, 3, 1, 1],
        "E114" => [1i64, 3, 4, -1, 2, 4, 1, 4],
        "E115" => [3i64, 2, 4, 1, 2, 4, 1, 4],
        "E116" => [4i64, 4, 4, 1, 3, 4, 1, 4],
        "E235" => [9i64, 10, 3, 8, 10, 5, 9, 10],
        "Y020" => [0.5f64, 0.6, 0.7, 0.4, 0.3, 0.45, 0.2, 0.8],
    }
    .unwrap()
}

/// Democracy-index rows. ESP's latest year has no code, so 2019 is used.
pub fn create_regime_dataframe() -> DataFrame {
    df! {
        "country_text_id" => ["ESP", "ESP", "POL", "POL", "USA"],
        "year" => [2019i64, 2020, 2019, 2020, 2020],
        "v2x_regime" => [Some(3i64), None, Some(3), Some(2), Some(3)],
    }
    .unwrap()
}

/// Synthetic respondents for one country with a given age distribution.
pub fn create_aged_dataframe(country: &str, ages: &[i64], index: &[f64], weights: &[f64]) -> DataFrame {
    let n = ages.len();
    let birth_years: Vec<i64> = ages.iter().map(|a| 2011 - a).collect();
    df! {
        "COUNTRY_ALPHA" => vec![country; n],
        "S020" => vec![2011i64; n],
        "S002VS" => vec![6i64; n],
        "X002" => birth_years,
        "X003" => ages.to_vec(),
        "S017" => weights.to_vec(),
        "E117" => vec![1i64; n],
        "E114" => vec![4i64; n],
        "E115" => vec![4i64; n],
        "E116" => vec![4i64; n],
        "E235" => vec![10i64; n],
        "Y020" => index.to_vec(),
    }
    .unwrap()
}

/// Write a DataFrame to a temp CSV file.
/// Returns (TempDir, PathBuf) - keep TempDir alive to prevent cleanup.
pub fn create_temp_csv(df: &mut DataFrame, name: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(format!("{}.csv", name));
    write_csv(df, &path);
    (temp_dir, path)
}

/// Write a DataFrame as CSV into an existing directory.
pub fn write_csv(df: &mut DataFrame, path: &std::path::Path) {
    let mut file = std::fs::File::create(path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();
}

/// Write a DataFrame to a temp Parquet file.
pub fn create_temp_parquet(df: &mut DataFrame, name: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(format!("{}.parquet", name));
    let mut file = std::fs::File::create(&path).unwrap();
    ParquetWriter::new(&mut file).finish(df).unwrap();
    (temp_dir, path)
}

/// Assert two floats agree to 1e-9.
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}
