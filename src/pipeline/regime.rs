//! Regime classification join
//!
//! Each country gets the regime type recorded in the most recent year of the
//! democracy-index table. The snapshot is applied to every survey year alike;
//! it drives display grouping only, never estimation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::SchemaError;
use super::items::whole_code;

/// Four-level ordinal regime type (Regimes of the World coding).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegimeType {
    ClosedAutocracy,
    ElectoralAutocracy,
    ElectoralDemocracy,
    LiberalDemocracy,
}

impl RegimeType {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(RegimeType::ClosedAutocracy),
            1 => Some(RegimeType::ElectoralAutocracy),
            2 => Some(RegimeType::ElectoralDemocracy),
            3 => Some(RegimeType::LiberalDemocracy),
            _ => None,
        }
    }

    pub fn is_democracy(&self) -> bool {
        matches!(
            self,
            RegimeType::ElectoralDemocracy | RegimeType::LiberalDemocracy
        )
    }

    pub fn binary(&self) -> BinaryRegime {
        match self {
            RegimeType::LiberalDemocracy => BinaryRegime::LiberalDemocracy,
            _ => BinaryRegime::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RegimeType::ClosedAutocracy => "Closed autocracy",
            RegimeType::ElectoralAutocracy => "Electoral autocracy",
            RegimeType::ElectoralDemocracy => "Electoral democracy",
            RegimeType::LiberalDemocracy => "Liberal democracy",
        }
    }
}

impl fmt::Display for RegimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Liberal democracy versus everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BinaryRegime {
    LiberalDemocracy,
    Other,
}

/// How an analysis collapses the four regime levels for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegimeGrouping {
    /// Highlighted / other democracy (electoral or liberal) / other
    #[default]
    Display,
    /// Highlighted / liberal democracy / other
    Binary,
}

impl fmt::Display for RegimeGrouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegimeGrouping::Display => write!(f, "display"),
            RegimeGrouping::Binary => write!(f, "binary"),
        }
    }
}

/// Display bucket used to color and order countries in charts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayGroup {
    Highlighted,
    /// Liberal democracy under the binary grouping
    LiberalDemocracy,
    /// Electoral or liberal democracy under the display grouping
    OtherDemocracy,
    #[default]
    Other,
}

impl fmt::Display for DisplayGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayGroup::Highlighted => write!(f, "highlighted"),
            DisplayGroup::LiberalDemocracy => write!(f, "liberal democracy"),
            DisplayGroup::OtherDemocracy => write!(f, "other democracy"),
            DisplayGroup::Other => write!(f, "other"),
        }
    }
}

/// One row of the democracy-index table.
#[derive(Debug, Clone, PartialEq)]
pub struct RegimeObservation {
    pub country: String,
    pub year: i32,
    pub code: Option<f64>,
}

/// Latest regime per country.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegimeClassification {
    latest: BTreeMap<String, (i32, RegimeType)>,
}

impl RegimeClassification {
    /// Keep, for each country, the most recent year with a non-missing code.
    ///
    /// A present code that is not an integer in 0..=3 is a fatal input error.
    pub fn from_observations(observations: &[RegimeObservation]) -> Result<Self, SchemaError> {
        let mut latest: BTreeMap<String, (i32, RegimeType)> = BTreeMap::new();

        for obs in observations {
            let Some(value) = obs.code else { continue };
            let regime = whole_code(value)
                .and_then(RegimeType::from_code)
                .ok_or_else(|| SchemaError::InvalidRegimeCode {
                    country: obs.country.clone(),
                    year: obs.year,
                    value,
                })?;

            match latest.get(&obs.country) {
                Some(&(year, _)) if year >= obs.year => {}
                _ => {
                    latest.insert(obs.country.clone(), (obs.year, regime));
                }
            }
        }

        Ok(Self { latest })
    }

    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }

    pub fn regime(&self, country: &str) -> Option<RegimeType> {
        self.latest.get(country).map(|&(_, regime)| regime)
    }

    /// Year the classification was taken from.
    pub fn snapshot_year(&self, country: &str) -> Option<i32> {
        self.latest.get(country).map(|&(year, _)| year)
    }

    pub fn binary(&self, country: &str) -> Option<BinaryRegime> {
        self.regime(country).map(|r| r.binary())
    }

    /// Highlighted countries win regardless of regime; unknown countries fall
    /// into `Other`.
    pub fn display_group(
        &self,
        country: &str,
        highlighted: &[String],
        grouping: RegimeGrouping,
    ) -> DisplayGroup {
        if highlighted.iter().any(|h| h == country) {
            return DisplayGroup::Highlighted;
        }
        match (grouping, self.regime(country)) {
            (RegimeGrouping::Display, Some(r)) if r.is_democracy() => DisplayGroup::OtherDemocracy,
            (RegimeGrouping::Binary, Some(r)) if r.binary() == BinaryRegime::LiberalDemocracy => {
                DisplayGroup::LiberalDemocracy
            }
            _ => DisplayGroup::Other,
        }
    }
}
