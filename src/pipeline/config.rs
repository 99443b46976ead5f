//! Analysis configuration
//!
//! Everything the analyses treat as fixed knowledge (column names, item
//! codings, transition years, bin geometry, display colors and order) lives
//! here rather than in constants, so tests and alternative datasets can swap
//! it out. Loaded from JSON; any field left out takes its default.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::analysis::AnalysisKind;
use super::binning::{AgeBinning, CollapseMode};
use super::error::ConfigError;
use super::items::ItemCoding;
use super::regime::RegimeGrouping;

/// Observation count below which an age bin is folded into its predecessor.
pub const DEFAULT_MIN_BIN_COUNT: usize = 10;

/// First survey wave that fielded the regime-preference battery.
pub const DEFAULT_MIN_ENDORSEMENT_WAVE: u32 = 3;

/// Full configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub columns: ColumnMap,
    pub attitude_items: Vec<ItemCoding>,
    pub endorsement: EndorsementConfig,
    pub generation: GenerationConfig,
    pub index: IndexConfig,
    pub regime: RegimeColumns,
    pub display: DisplayConfig,
    /// Treat exactly-zero estimates as "no data" and drop them.
    pub drop_zero_cells: bool,
}

/// Respondent-table column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub country: String,
    pub year: String,
    pub wave: String,
    pub birth_year: String,
    pub age: String,
    pub weight: String,
}

/// Which alternative to democracy an item asks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlternativeKind {
    ExpertRule,
    ArmyRule,
    StrongLeader,
}

impl AlternativeKind {
    pub fn label(&self) -> &'static str {
        match self {
            AlternativeKind::ExpertRule => "Democracy + expert rule",
            AlternativeKind::ArmyRule => "Democracy + army rule",
            AlternativeKind::StrongLeader => "Democracy + strong leader",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternative {
    pub kind: AlternativeKind,
    pub item: ItemCoding,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndorsementConfig {
    pub democracy: ItemCoding,
    pub alternatives: Vec<Alternative>,
    /// Waves below this index did not field the items and are excluded.
    pub min_wave: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Democratic-transition year per country code
    pub transition_years: BTreeMap<String, i32>,
    /// Attitude item columns to analyze; empty means all attitude items.
    pub items: Vec<String>,
    pub binning: AgeBinning,
    pub min_bin_count: usize,
    pub collapse: CollapseMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub column: String,
    pub label: String,
    pub binning: AgeBinning,
    pub min_bin_count: usize,
    pub collapse: CollapseMode,
}

/// Democracy-index table column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeColumns {
    pub country: String,
    pub year: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Countries drawn in their own color; everything else is grouped by regime.
    pub highlighted: Vec<String>,
    /// Legend and facet order; countries not listed follow alphabetically.
    pub country_order: Vec<String>,
    /// `#rrggbb` per country code
    pub colors: BTreeMap<String, String>,
    pub democracy_color: String,
    pub other_color: String,
    pub chart_width: u32,
    pub chart_height: u32,
    pub grouping: RegimeGroupings,
}

/// Regime grouping per analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeGroupings {
    pub attitudes: RegimeGrouping,
    pub co_endorsement: RegimeGrouping,
    pub generational: RegimeGrouping,
    pub emancipative_index: RegimeGrouping,
}

impl Default for RegimeGroupings {
    fn default() -> Self {
        Self {
            attitudes: RegimeGrouping::Display,
            co_endorsement: RegimeGrouping::Display,
            generational: RegimeGrouping::Display,
            emancipative_index: RegimeGrouping::Binary,
        }
    }
}

impl RegimeGroupings {
    pub fn for_kind(&self, kind: AnalysisKind) -> RegimeGrouping {
        match kind {
            AnalysisKind::Attitudes => self.attitudes,
            AnalysisKind::CoEndorsement => self.co_endorsement,
            AnalysisKind::Generational => self.generational,
            AnalysisKind::EmancipativeIndex => self.emancipative_index,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            columns: ColumnMap::default(),
            attitude_items: vec![
                ItemCoding::four_point("E117", "Democratic political system"),
                ItemCoding::four_point("E114", "Strong leader"),
                ItemCoding::four_point("E115", "Experts make decisions"),
                ItemCoding::four_point("E116", "Army rule"),
                ItemCoding::new(
                    "E235",
                    "Democracy is very important",
                    &[8, 9, 10],
                    &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10],
                ),
            ],
            endorsement: EndorsementConfig::default(),
            generation: GenerationConfig::default(),
            index: IndexConfig::default(),
            regime: RegimeColumns::default(),
            display: DisplayConfig::default(),
            drop_zero_cells: true,
        }
    }
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            country: "COUNTRY_ALPHA".to_string(),
            year: "S020".to_string(),
            wave: "S002VS".to_string(),
            birth_year: "X002".to_string(),
            age: "X003".to_string(),
            weight: "S017".to_string(),
        }
    }
}

impl Default for EndorsementConfig {
    fn default() -> Self {
        Self {
            democracy: ItemCoding::four_point("E117", "Democratic political system"),
            alternatives: vec![
                Alternative {
                    kind: AlternativeKind::ExpertRule,
                    item: ItemCoding::four_point("E115", "Experts make decisions"),
                },
                Alternative {
                    kind: AlternativeKind::ArmyRule,
                    item: ItemCoding::four_point("E116", "Army rule"),
                },
                Alternative {
                    kind: AlternativeKind::StrongLeader,
                    item: ItemCoding::four_point("E114", "Strong leader"),
                },
            ],
            min_wave: DEFAULT_MIN_ENDORSEMENT_WAVE,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let transition_years = [
            ("ARG", 1983),
            ("BRA", 1985),
            ("CHL", 1990),
            ("CZE", 1990),
            ("ESP", 1977),
            ("GRC", 1974),
            ("HUN", 1990),
            ("IDN", 1999),
            ("KOR", 1988),
            ("MEX", 2000),
            ("PER", 1980),
            ("PHL", 1986),
            ("POL", 1989),
            ("PRT", 1976),
            ("TWN", 1996),
            ("URY", 1985),
            ("ZAF", 1994),
        ]
        .into_iter()
        .map(|(country, year)| (country.to_string(), year))
        .collect();

        Self {
            transition_years,
            items: vec!["E117".to_string(), "E114".to_string()],
            binning: AgeBinning {
                min_age: 18,
                max_age: 90,
                width: 5,
                open_from: 78,
            },
            min_bin_count: DEFAULT_MIN_BIN_COUNT,
            collapse: CollapseMode::SinglePass,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            column: "Y020".to_string(),
            label: "Emancipative values".to_string(),
            binning: AgeBinning {
                min_age: 18,
                max_age: 90,
                width: 10,
                open_from: 78,
            },
            min_bin_count: DEFAULT_MIN_BIN_COUNT,
            collapse: CollapseMode::SinglePass,
        }
    }
}

impl Default for RegimeColumns {
    fn default() -> Self {
        Self {
            country: "country_text_id".to_string(),
            year: "year".to_string(),
            code: "v2x_regime".to_string(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        let colors = [
            ("ESP", "#d62728"),
            ("PRT", "#2ca02c"),
            ("GRC", "#1f77b4"),
            ("POL", "#9467bd"),
            ("HUN", "#8c564b"),
            ("CHL", "#e377c2"),
            ("KOR", "#ff7f0e"),
        ]
        .into_iter()
        .map(|(c, hex)| (c.to_string(), hex.to_string()))
        .collect();

        Self {
            highlighted: ["ESP", "PRT", "GRC", "POL", "HUN", "CHL", "KOR"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            country_order: ["ESP", "PRT", "GRC", "POL", "HUN", "CHL", "KOR"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            colors,
            democracy_color: "#7f7f7f".to_string(),
            other_color: "#c7c7c7".to_string(),
            chart_width: 1600,
            chart_height: 1000,
            grouping: RegimeGroupings::default(),
        }
    }
}

impl AnalysisConfig {
    /// Read a JSON configuration file; absent fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: AnalysisConfig = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Reject settings that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for item in &self.attitude_items {
            item.validate()?;
        }
        self.endorsement.democracy.validate()?;
        if self.endorsement.alternatives.is_empty() {
            return Err(ConfigError::NoAlternatives);
        }
        for alt in &self.endorsement.alternatives {
            alt.item.validate()?;
        }

        self.generation.binning.validate("generational analysis")?;
        if self.generation.min_bin_count == 0 {
            return Err(ConfigError::ZeroBinThreshold {
                analysis: "generational analysis".to_string(),
            });
        }
        self.index.binning.validate("index analysis")?;
        if self.index.min_bin_count == 0 {
            return Err(ConfigError::ZeroBinThreshold {
                analysis: "index analysis".to_string(),
            });
        }

        for color in [&self.display.democracy_color, &self.display.other_color] {
            parse_hex_color(color).ok_or_else(|| ConfigError::InvalidColor {
                country: "(group)".to_string(),
                value: color.clone(),
            })?;
        }
        for (country, color) in &self.display.colors {
            parse_hex_color(color).ok_or_else(|| ConfigError::InvalidColor {
                country: country.clone(),
                value: color.clone(),
            })?;
        }
        Ok(())
    }

    /// Attitude items included in the generational analysis.
    pub fn generational_items(&self) -> Vec<ItemCoding> {
        if self.generation.items.is_empty() {
            return self.attitude_items.clone();
        }
        self.attitude_items
            .iter()
            .filter(|item| self.generation.items.contains(&item.column))
            .cloned()
            .collect()
    }

    /// Every response column the analyses read, in first-use order.
    pub fn response_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        let candidates = self
            .attitude_items
            .iter()
            .map(|i| &i.column)
            .chain(std::iter::once(&self.endorsement.democracy.column))
            .chain(self.endorsement.alternatives.iter().map(|a| &a.item.column))
            .chain(std::iter::once(&self.index.column));
        for column in candidates {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }
        columns
    }
}

/// Parse `#rrggbb` into its components.
pub fn parse_hex_color(value: &str) -> Option<(u8, u8, u8)> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_response_columns_deduplicated() {
        let cols = AnalysisConfig::default().response_columns();
        assert_eq!(cols, vec!["E117", "E114", "E115", "E116", "E235", "Y020"]);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "drop_zero_cells": false, "generation": { "min_bin_count": 25 } }"#;
        let config: AnalysisConfig = serde_json::from_str(json).unwrap();
        assert!(!config.drop_zero_cells);
        assert_eq!(config.generation.min_bin_count, 25);
        assert_eq!(config.generation.transition_years.get("ESP"), Some(&1977));
        assert_eq!(config.columns.weight, "S017");
    }

    #[test]
    fn test_collapse_mode_from_json() {
        let json = r#"{ "index": { "collapse": "fixed-point" } }"#;
        let config: AnalysisConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.index.collapse, CollapseMode::FixedPoint);
    }

    #[test]
    fn test_regime_grouping_from_json() {
        let json = r#"{ "display": { "grouping": { "attitudes": "binary" } } }"#;
        let config: AnalysisConfig = serde_json::from_str(json).unwrap();
        let grouping = config.display.grouping;
        assert_eq!(grouping.for_kind(AnalysisKind::Attitudes), RegimeGrouping::Binary);
        assert_eq!(grouping.for_kind(AnalysisKind::Generational), RegimeGrouping::Display);
        assert_eq!(
            grouping.for_kind(AnalysisKind::EmancipativeIndex),
            RegimeGrouping::Binary
        );
    }

    #[test]
    fn test_invalid_color_rejected() {
        let mut config = AnalysisConfig::default();
        config.display.colors.insert("ESP".to_string(), "red".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidColor { .. })
        ));
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let mut config = AnalysisConfig::default();
        config.index.min_bin_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_generational_items_filter() {
        let config = AnalysisConfig::default();
        let items = config.generational_items();
        let columns: Vec<&str> = items.iter().map(|i| i.column.as_str()).collect();
        assert_eq!(columns, vec!["E117", "E114"]);
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#1f77b4"), Some((0x1f, 0x77, 0xb4)));
        assert_eq!(parse_hex_color("1f77b4"), None);
        assert_eq!(parse_hex_color("#12345"), None);
    }
}
