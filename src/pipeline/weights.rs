//! Sampling weight extraction and validation

use anyhow::{anyhow, bail, Result};
use polars::prelude::*;

use super::error::SchemaError;
use super::loader::is_numeric_or_blank;
use crate::utils::print_warning;

/// Extract sampling weights from a DataFrame column.
///
/// # Arguments
/// * `df` - The respondent DataFrame
/// * `weight_column` - Name of the weight column
///
/// # Returns
/// * `Ok(Vec<Option<f64>>)` - One entry per row
/// * `Err` - If the column doesn't exist, is non-numeric, or holds a weight
///   that is not a positive finite number
///
/// # Behavior
/// Null weights stay `None`: the respondent then drops out of every weighted
/// estimate instead of being given a made-up weight.
pub fn get_weights(df: &DataFrame, weight_column: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(weight_column)
        .map_err(|_| SchemaError::MissingColumn {
            column: weight_column.to_string(),
            table: "respondent table",
            available: df
                .get_column_names()
                .iter()
                .map(|s| s.to_string())
                .collect(),
        })?;

    if !is_numeric_or_blank(column) {
        return Err(SchemaError::NonNumericColumn {
            column: weight_column.to_string(),
            dtype: column.dtype().to_string(),
        }
        .into());
    }

    let float_col = column.cast(&DataType::Float64)?;
    let ca = float_col.f64().map_err(|_| {
        anyhow!(
            "Failed to access weight column '{}' as Float64",
            weight_column
        )
    })?;

    let mut weights = Vec::with_capacity(df.height());
    let mut null_count = 0usize;

    for opt_val in ca.iter() {
        match opt_val {
            Some(w) => {
                if w.is_nan() {
                    bail!(
                        "Weight column '{}' contains NaN value. All weights must be valid numbers.",
                        weight_column
                    );
                }
                if w.is_infinite() {
                    bail!(
                        "Weight column '{}' contains infinite value. All weights must be finite.",
                        weight_column
                    );
                }
                if w <= 0.0 {
                    bail!(
                        "Weight column '{}' contains non-positive value: {}. Sampling weights must be positive.",
                        weight_column,
                        w
                    );
                }
                weights.push(Some(w));
            }
            None => {
                null_count += 1;
                weights.push(None);
            }
        }
    }

    if null_count > 0 {
        print_warning(&format!(
            "Weight column '{}' contains {} null value(s); those respondents are left out of weighted estimates",
            weight_column, null_count
        ));
    }

    Ok(weights)
}
