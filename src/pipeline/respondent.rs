//! In-memory respondent table, the single source of truth for all analyses

use anyhow::{anyhow, Result};

/// One survey participant.
#[derive(Debug, Clone, PartialEq)]
pub struct Respondent {
    pub country: String,
    /// Fieldwork year
    pub year: i32,
    /// Survey wave index (1-based round of the survey programme)
    pub wave: Option<u32>,
    pub birth_year: Option<i32>,
    pub age: Option<i32>,
    /// Sampling weight; `None` makes the respondent missing for every
    /// weighted estimate.
    pub weight: Option<f64>,
    /// Raw response codes, aligned with `SurveyTable::columns`
    pub responses: Vec<Option<f64>>,
}

impl Respondent {
    /// Fill whichever of age / birth year is missing from the other and the
    /// fieldwork year.
    pub fn derive_age_fields(&mut self) {
        match (self.age, self.birth_year) {
            (None, Some(birth)) => self.age = Some(self.year - birth),
            (Some(age), None) => self.birth_year = Some(self.year - age),
            _ => {}
        }
    }
}

/// Loaded respondents plus the response columns they carry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurveyTable {
    pub columns: Vec<String>,
    pub respondents: Vec<Respondent>,
    /// Rows skipped at load time for lacking a country or year
    pub skipped_rows: usize,
}

impl SurveyTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.respondents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.respondents.is_empty()
    }

    /// Position of a response column, erroring if it was not loaded.
    pub fn column_index(&self, column: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| anyhow!("Response column '{}' was not loaded", column))
    }

    /// Distinct country codes in first-seen order.
    pub fn countries(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for r in &self.respondents {
            if !seen.contains(&r.country) {
                seen.push(r.country.clone());
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn respondent(age: Option<i32>, birth_year: Option<i32>) -> Respondent {
        Respondent {
            country: "ESP".to_string(),
            year: 2011,
            wave: Some(6),
            birth_year,
            age,
            weight: Some(1.0),
            responses: vec![],
        }
    }

    #[test]
    fn test_age_derived_from_birth_year() {
        let mut r = respondent(None, Some(1980));
        r.derive_age_fields();
        assert_eq!(r.age, Some(31));
    }

    #[test]
    fn test_birth_year_derived_from_age() {
        let mut r = respondent(Some(40), None);
        r.derive_age_fields();
        assert_eq!(r.birth_year, Some(1971));
    }

    #[test]
    fn test_observed_values_untouched() {
        let mut r = respondent(Some(30), Some(1980));
        r.derive_age_fields();
        assert_eq!((r.age, r.birth_year), (Some(30), Some(1980)));
    }

    #[test]
    fn test_column_index() {
        let table = SurveyTable::new(vec!["E117".to_string(), "Y020".to_string()]);
        assert_eq!(table.column_index("Y020").unwrap(), 1);
        assert!(table.column_index("E999").is_err());
    }
}
