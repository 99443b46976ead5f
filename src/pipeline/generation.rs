//! Generational classification by age at democratic transition

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Youngest age at transition that still counts as Transitional.
pub const TRANSITIONAL_MIN_AGE: i32 = 18;

/// Youngest age at transition counted as Authoritarian-formed.
pub const AUTHORITARIAN_MIN_AGE: i32 = 26;

/// Political generation, ordered oldest to youngest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Generation {
    /// Came of age under the prior regime (26 or older at transition)
    AuthoritarianFormed,
    /// Aged 18-25 at transition
    Transitional,
    /// Younger than 18 at transition, or born after it
    DemocraticFormed,
}

impl Generation {
    pub const ALL: [Generation; 3] = [
        Generation::AuthoritarianFormed,
        Generation::Transitional,
        Generation::DemocraticFormed,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Generation::AuthoritarianFormed => "Authoritarian-formed",
            Generation::Transitional => "Transitional",
            Generation::DemocraticFormed => "Democratic-formed",
        }
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify by age at transition. Negative ages (born after the transition)
/// are Democratic-formed.
pub fn classify(age_at_transition: i32) -> Generation {
    if age_at_transition >= AUTHORITARIAN_MIN_AGE {
        Generation::AuthoritarianFormed
    } else if age_at_transition >= TRANSITIONAL_MIN_AGE {
        Generation::Transitional
    } else {
        Generation::DemocraticFormed
    }
}

/// Age in the transition year.
pub fn age_at_transition(transition_year: i32, birth_year: i32) -> i32 {
    transition_year - birth_year
}

/// Classify a respondent, or `None` when the country has no known transition
/// year or the birth year is missing.
pub fn classify_respondent(
    country: &str,
    birth_year: Option<i32>,
    transition_years: &BTreeMap<String, i32>,
) -> Option<Generation> {
    let transition = *transition_years.get(country)?;
    Some(classify(age_at_transition(transition, birth_year?)))
}
