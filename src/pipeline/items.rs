//! Attitude item codings and the ordinal-to-binary recode

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// How one ordinal survey item maps onto a "supportive" indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCoding {
    /// Column name in the respondent table
    pub column: String,
    /// Human-readable label used in output cells and charts
    pub label: String,
    /// Codes counted as supportive (recode to 1)
    pub supportive_codes: Vec<i64>,
    /// Every substantive code. Anything else (don't know, refused, not asked)
    /// recodes to missing.
    pub valid_codes: Vec<i64>,
}

impl ItemCoding {
    pub fn new(column: &str, label: &str, supportive_codes: &[i64], valid_codes: &[i64]) -> Self {
        Self {
            column: column.to_string(),
            label: label.to_string(),
            supportive_codes: supportive_codes.to_vec(),
            valid_codes: valid_codes.to_vec(),
        }
    }

    /// Four-point "very good .. very bad" rating where 1-2 are supportive.
    pub fn four_point(column: &str, label: &str) -> Self {
        Self::new(column, label, &[1, 2], &[1, 2, 3, 4])
    }

    /// Recode a raw response to `Some(true)` (supportive), `Some(false)`
    /// (substantive but not supportive) or `None` (missing / non-substantive).
    pub fn recode(&self, code: Option<f64>) -> Option<bool> {
        let code = whole_code(code?)?;
        if !self.valid_codes.contains(&code) {
            return None;
        }
        Some(self.supportive_codes.contains(&code))
    }

    /// Recode as a 0/1 value ready for weighted aggregation.
    pub fn indicator(&self, code: Option<f64>) -> Option<f64> {
        self.recode(code).map(|supportive| if supportive { 1.0 } else { 0.0 })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.supportive_codes.is_empty() {
            return Err(ConfigError::NoSupportiveCodes {
                column: self.column.clone(),
            });
        }
        if let Some(&code) = self
            .supportive_codes
            .iter()
            .find(|c| !self.valid_codes.contains(c))
        {
            return Err(ConfigError::SupportiveNotValid {
                column: self.column.clone(),
                code,
            });
        }
        Ok(())
    }
}

/// Interpret a numeric cell as an integer code; fractional or non-finite
/// values are not codes.
pub fn whole_code(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 {
        Some(value as i64)
    } else {
        None
    }
}
