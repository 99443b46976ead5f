//! Dataset loading for CSV and Parquet files, and conversion of the loaded
//! frames into typed respondent and regime records

use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;

use super::config::{ColumnMap, RegimeColumns};
use super::error::SchemaError;
use super::items::whole_code;
use super::regime::RegimeObservation;
use super::respondent::{Respondent, SurveyTable};
use super::weights::get_weights;
use crate::utils::print_warning;

/// Load a dataset from a file (CSV or Parquet based on extension).
///
/// `infer_schema_length` only applies to CSV; 0 means a full table scan.
pub fn load_dataset(path: &Path, infer_schema_length: usize) -> Result<DataFrame> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let schema_length = if infer_schema_length == 0 {
        None
    } else {
        Some(infer_schema_length)
    };

    let lf = match extension.as_str() {
        "csv" => LazyCsvReader::new(path)
            .with_infer_schema_length(schema_length)
            .finish()
            .with_context(|| format!("Failed to load CSV file: {}", path.display()))?,
        "parquet" => LazyFrame::scan_parquet(path, Default::default())
            .with_context(|| format!("Failed to load Parquet file: {}", path.display()))?,
        _ => return Err(SchemaError::UnsupportedFormat { extension }.into()),
    };

    lf.collect()
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Convert a respondent DataFrame into a `SurveyTable`.
///
/// Country, year, wave, weight and every response column are required; at
/// least one of age and birth year must be present. Rows without a country or
/// a usable year are skipped and counted.
pub fn build_survey_table(
    df: &DataFrame,
    columns: &ColumnMap,
    response_columns: &[String],
) -> Result<SurveyTable> {
    let countries = string_column(df, &columns.country, "respondent table")?;
    let years = numeric_column(df, &columns.year, "respondent table")?;
    let waves = numeric_column(df, &columns.wave, "respondent table")?;
    let weights = get_weights(df, &columns.weight)?;

    let ages = optional_numeric_column(df, &columns.age)?;
    let birth_years = optional_numeric_column(df, &columns.birth_year)?;
    if ages.is_none() && birth_years.is_none() {
        return Err(SchemaError::NoAgeSource {
            age: columns.age.clone(),
            birth_year: columns.birth_year.clone(),
        }
        .into());
    }

    let responses: Vec<Vec<Option<f64>>> = response_columns
        .iter()
        .map(|name| numeric_column(df, name, "respondent table"))
        .collect::<Result<_>>()?;

    let mut table = SurveyTable::new(response_columns.to_vec());
    table.respondents.reserve(df.height());

    for row in 0..df.height() {
        let country = countries[row].as_deref().map(str::trim).filter(|c| !c.is_empty());
        let year = years[row]
            .and_then(whole_code)
            .and_then(|y| i32::try_from(y).ok())
            .filter(|&y| y > 0);
        let (Some(country), Some(year)) = (country, year) else {
            table.skipped_rows += 1;
            continue;
        };

        let mut respondent = Respondent {
            country: country.to_string(),
            year,
            wave: waves[row]
                .and_then(whole_code)
                .and_then(|w| u32::try_from(w).ok())
                .filter(|&w| w > 0),
            birth_year: birth_years
                .as_ref()
                .and_then(|v| v[row])
                .and_then(whole_code)
                .and_then(|b| i32::try_from(b).ok())
                .filter(|&b| b > 0),
            age: ages
                .as_ref()
                .and_then(|v| v[row])
                .and_then(whole_code)
                .and_then(|a| i32::try_from(a).ok())
                .filter(|&a| a >= 0),
            weight: weights[row],
            responses: responses.iter().map(|col| col[row]).collect(),
        };
        respondent.derive_age_fields();
        table.respondents.push(respondent);
    }

    if table.skipped_rows > 0 {
        print_warning(&format!(
            "Skipped {} respondent row(s) without a country code or survey year",
            table.skipped_rows
        ));
    }

    Ok(table)
}

/// Convert a democracy-index DataFrame into regime observations.
pub fn build_regime_observations(
    df: &DataFrame,
    columns: &RegimeColumns,
) -> Result<Vec<RegimeObservation>> {
    let countries = string_column(df, &columns.country, "regime table")?;
    let years = numeric_column(df, &columns.year, "regime table")?;
    let codes = numeric_column(df, &columns.code, "regime table")?;

    let observations = countries
        .into_iter()
        .zip(years)
        .zip(codes)
        .filter_map(|((country, year), code)| {
            let country = country?.trim().to_string();
            let year = year
                .and_then(whole_code)
                .and_then(|y| i32::try_from(y).ok())?;
            Some(RegimeObservation {
                country,
                year,
                code,
            })
        })
        .collect();

    Ok(observations)
}

/// Load respondents straight from a file.
pub fn load_survey_table(
    path: &Path,
    infer_schema_length: usize,
    columns: &ColumnMap,
    response_columns: &[String],
) -> Result<SurveyTable> {
    let df = load_dataset(path, infer_schema_length)?;
    build_survey_table(&df, columns, response_columns)
        .with_context(|| format!("Invalid respondent table: {}", path.display()))
}

/// Load the democracy-index table straight from a file.
pub fn load_regime_observations(
    path: &Path,
    infer_schema_length: usize,
    columns: &RegimeColumns,
) -> Result<Vec<RegimeObservation>> {
    let df = load_dataset(path, infer_schema_length)?;
    build_regime_observations(&df, columns)
        .with_context(|| format!("Invalid regime table: {}", path.display()))
}

fn find_column<'a>(df: &'a DataFrame, name: &str, table: &'static str) -> Result<&'a Column> {
    df.column(name).map_err(|_| {
        SchemaError::MissingColumn {
            column: name.to_string(),
            table,
            available: df
                .get_column_names()
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
        .into()
    })
}

/// Read a numeric column as `f64`, keeping nulls as `None`.
fn numeric_column(df: &DataFrame, name: &str, table: &'static str) -> Result<Vec<Option<f64>>> {
    let column = find_column(df, name, table)?;
    column_to_f64_vec(column)
}

fn optional_numeric_column(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<f64>>>> {
    match df.column(name) {
        Ok(column) => Ok(Some(column_to_f64_vec(column)?)),
        Err(_) => Ok(None),
    }
}

/// True for numeric columns and for columns with no values at all. A CSV
/// column left entirely blank is inferred as `str`.
pub(crate) fn is_numeric_or_blank(column: &Column) -> bool {
    let dtype = column.dtype();
    dtype.is_primitive_numeric()
        || dtype == &DataType::Null
        || (dtype == &DataType::String && column.null_count() == column.len())
}

fn column_to_f64_vec(column: &Column) -> Result<Vec<Option<f64>>> {
    if !is_numeric_or_blank(column) {
        return Err(SchemaError::NonNumericColumn {
            column: column.name().to_string(),
            dtype: column.dtype().to_string(),
        }
        .into());
    }
    let cast = column.cast(&DataType::Float64)?;
    Ok(cast.f64()?.iter().collect())
}

/// Read a key column as strings whatever its stored type.
fn string_column(df: &DataFrame, name: &str, table: &'static str) -> Result<Vec<Option<String>>> {
    let column = find_column(df, name, table)?;

    let values: Vec<Option<String>> = match column.dtype() {
        DataType::String => column
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect(),
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
            let cast = column.cast(&DataType::Int64)?;
            cast.i64()?
                .into_iter()
                .map(|v| v.map(|n| n.to_string()))
                .collect()
        }
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
            let cast = column.cast(&DataType::UInt64)?;
            cast.u64()?
                .into_iter()
                .map(|v| v.map(|n| n.to_string()))
                .collect()
        }
        DataType::Float32 | DataType::Float64 => {
            let cast = column.cast(&DataType::Float64)?;
            cast.f64()?
                .into_iter()
                .map(|v| v.and_then(whole_code).map(|n| n.to_string()))
                .collect()
        }
        _ => {
            let cast = column.cast(&DataType::String)?;
            cast.str()?
                .into_iter()
                .map(|v| v.map(|s| s.to_string()))
                .collect()
        }
    };

    Ok(values)
}
