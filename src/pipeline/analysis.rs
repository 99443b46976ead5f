//! Runs the four analyses over one immutable respondent snapshot

use std::fmt;

use anyhow::{Context, Result};
use serde::Serialize;

use super::attitudes::estimate_attitudes;
use super::cell::CellTable;
use super::cohorts::estimate_generational;
use super::config::AnalysisConfig;
use super::endorsement::estimate_co_endorsement;
use super::index::estimate_index;
use super::regime::RegimeClassification;
use super::respondent::SurveyTable;

/// The fixed set of analyses, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisKind {
    Attitudes,
    CoEndorsement,
    Generational,
    EmancipativeIndex,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 4] = [
        AnalysisKind::Attitudes,
        AnalysisKind::CoEndorsement,
        AnalysisKind::Generational,
        AnalysisKind::EmancipativeIndex,
    ];

    /// File stem for this analysis' outputs.
    pub fn slug(&self) -> &'static str {
        match self {
            AnalysisKind::Attitudes => "attitudes_by_year",
            AnalysisKind::CoEndorsement => "co_endorsement_by_year",
            AnalysisKind::Generational => "generations_by_age",
            AnalysisKind::EmancipativeIndex => "emancipative_values_by_age",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AnalysisKind::Attitudes => "Support for regime types by survey year",
            AnalysisKind::CoEndorsement => "Co-endorsement of democracy and alternatives",
            AnalysisKind::Generational => "Support by political generation and age",
            AnalysisKind::EmancipativeIndex => "Emancipative values by age",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Per-analysis accounting of excluded respondents and merged bins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    /// Respondents outside the wave range the analysis needs
    pub wave_filtered: usize,
    /// Respondents with no transition year or birth year
    pub unclassifiable: usize,
    /// Respondents without an age in the configured range
    pub out_of_age_range: usize,
    /// Age bins reassigned by the small-bin collapse, summed over strata
    pub merged_bins: usize,
    /// Largest |meta-aggregated mean - row-derived mean| over collapsed bins
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_aggregation_gap: Option<f64>,
}

impl Diagnostics {
    pub fn excluded(&self) -> usize {
        self.wave_filtered + self.unclassifiable + self.out_of_age_range
    }
}

/// Finalized cells of one analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutput {
    pub kind: AnalysisKind,
    pub table: CellTable,
    pub diagnostics: Diagnostics,
}

impl AnalysisOutput {
    pub fn new(kind: AnalysisKind, table: CellTable, diagnostics: Diagnostics) -> Self {
        Self {
            kind,
            table,
            diagnostics,
        }
    }
}

/// Outputs of a full run, in `AnalysisKind::ALL` order.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResults {
    pub outputs: Vec<AnalysisOutput>,
}

impl AnalysisResults {
    pub fn get(&self, kind: AnalysisKind) -> Option<&AnalysisOutput> {
        self.outputs.iter().find(|o| o.kind == kind)
    }

    pub fn total_cells(&self) -> usize {
        self.outputs.iter().map(|o| o.table.cells.len()).sum()
    }
}

/// Run all four analyses and attach regime display groups.
///
/// The analyses only read `table` and write disjoint outputs, so they run
/// concurrently; the result does not depend on scheduling.
pub fn run_analyses(
    table: &SurveyTable,
    regimes: &RegimeClassification,
    config: &AnalysisConfig,
) -> Result<AnalysisResults> {
    let drop_zero = config.drop_zero_cells;
    let generational_items = config.generational_items();

    let ((attitudes, endorsement), (generational, index)) = rayon::join(
        || {
            rayon::join(
                || estimate_attitudes(table, &config.attitude_items, drop_zero),
                || estimate_co_endorsement(table, &config.endorsement, drop_zero),
            )
        },
        || {
            rayon::join(
                || {
                    estimate_generational(
                        table,
                        &config.generation,
                        &generational_items,
                        drop_zero,
                    )
                },
                || estimate_index(table, &config.index, drop_zero),
            )
        },
    );

    let mut outputs = vec![
        attitudes.context("Attitude analysis failed")?,
        endorsement.context("Co-endorsement analysis failed")?,
        generational.context("Generational analysis failed")?,
        index.context("Index analysis failed")?,
    ];

    for output in &mut outputs {
        let grouping = config.display.grouping.for_kind(output.kind);
        output
            .table
            .annotate_regimes(regimes, &config.display.highlighted, grouping);
    }

    Ok(AnalysisResults { outputs })
}
