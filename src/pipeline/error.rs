//! Error types for malformed inputs and inconsistent configuration.
//!
//! Both are fatal: a run either completes deterministically or stops with one
//! of these, wrapped in `anyhow` context by the caller.

use thiserror::Error;

/// Input tables that do not match the expected schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A configured column is absent from the loaded table.
    #[error("Column '{column}' not found in {table}. Available columns: {available:?}")]
    MissingColumn {
        column: String,
        table: &'static str,
        available: Vec<String>,
    },

    /// A column that must hold numbers has some other dtype.
    #[error("Column '{column}' must be numeric, found dtype {dtype}")]
    NonNumericColumn { column: String, dtype: String },

    /// Neither an age nor a birth-year column could be found.
    #[error("Respondent table needs an age column ('{age}') or a birth-year column ('{birth_year}'); neither is present")]
    NoAgeSource { age: String, birth_year: String },

    /// File extension the loader does not understand.
    #[error("Unsupported file format: '{extension}'. Supported formats: csv, parquet")]
    UnsupportedFormat { extension: String },

    /// Regime code outside the four-level ordinal scale.
    #[error("Invalid regime code {value} for country '{country}' in {year}; expected an integer in 0..=3")]
    InvalidRegimeCode {
        country: String,
        year: i32,
        value: f64,
    },
}

/// Configuration values that cannot produce a meaningful run.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Age binning for {analysis}: {reason}")]
    InvalidBinning { analysis: String, reason: String },

    #[error("{analysis}: minimum bin count must be at least 1")]
    ZeroBinThreshold { analysis: String },

    #[error("Item '{column}' has no supportive codes")]
    NoSupportiveCodes { column: String },

    #[error("Item '{column}': supportive code {code} is not among its valid codes")]
    SupportiveNotValid { column: String, code: i64 },

    #[error("Co-endorsement needs at least one alternative item")]
    NoAlternatives,

    #[error("Color '{value}' for '{country}' is not a #rrggbb hex string")]
    InvalidColor { country: String, value: String },
}
