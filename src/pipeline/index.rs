//! Emancipative-values index averaged per country and age bin
//!
//! Unlike the generational analysis, collapsed bins are combined from their
//! per-bin summaries (`meta_aggregate`) instead of being re-derived from the
//! respondent rows. The two differ whenever merged bins carry different
//! average weights; the largest gap seen in a run is reported so the shortcut
//! stays visible.

use std::collections::BTreeMap;

use anyhow::Result;

use super::analysis::{AnalysisKind, AnalysisOutput, Diagnostics};
use super::binning::{collapse_bins, meta_aggregate, BinSummary};
use super::cell::{finalize_cells, Bucket, CellKey};
use super::config::IndexConfig;
use super::respondent::SurveyTable;
use super::stats::{Estimate, WeightedAccumulator};

/// One respondent's index value in its original age bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinnedValue {
    pub bin: usize,
    pub value: Option<f64>,
    pub weight: Option<f64>,
}

/// First stage: weighted mean and contributing count per original bin.
pub fn summarize_bins(rows: &[BinnedValue]) -> BTreeMap<usize, WeightedAccumulator> {
    let mut bins: BTreeMap<usize, WeightedAccumulator> = BTreeMap::new();
    for row in rows {
        bins.entry(row.bin).or_default().push(row.value, row.weight);
    }
    bins
}

/// Second stage: combine bin summaries under a collapse mapping.
///
/// Returns effective bin -> (mean, n). Bins without contributing observations
/// are ignored.
pub fn combine_collapsed(
    summaries: &BTreeMap<usize, WeightedAccumulator>,
    mapping: &BTreeMap<usize, usize>,
) -> BTreeMap<usize, (f64, usize)> {
    let mut parts: BTreeMap<usize, Vec<BinSummary>> = BTreeMap::new();
    for (bin, acc) in summaries {
        let Some(mean) = acc.mean() else { continue };
        let target = mapping.get(bin).copied().unwrap_or(*bin);
        parts.entry(target).or_default().push(BinSummary { mean, n: acc.n() });
    }
    parts
        .into_iter()
        .filter_map(|(bin, p)| meta_aggregate(&p).map(|combined| (bin, combined)))
        .collect()
}

/// Reference: weighted mean re-derived from the rows under the same mapping.
pub fn reaggregate_from_rows(
    rows: &[BinnedValue],
    mapping: &BTreeMap<usize, usize>,
) -> BTreeMap<usize, WeightedAccumulator> {
    let mut bins: BTreeMap<usize, WeightedAccumulator> = BTreeMap::new();
    for row in rows {
        let target = mapping.get(&row.bin).copied().unwrap_or(row.bin);
        bins.entry(target).or_default().push(row.value, row.weight);
    }
    bins
}

/// Index mean per (country, age bin) with adaptive bin collapsing.
///
/// Index values outside [0, 1] are treated as missing codes.
pub fn estimate_index(
    table: &SurveyTable,
    config: &IndexConfig,
    drop_zero: bool,
) -> Result<AnalysisOutput> {
    let idx = table.column_index(&config.column)?;
    let mut diagnostics = Diagnostics::default();

    let mut by_country: BTreeMap<&str, Vec<BinnedValue>> = BTreeMap::new();
    for r in &table.respondents {
        let Some(bin) = r.age.and_then(|age| config.binning.assign(age)) else {
            diagnostics.out_of_age_range += 1;
            continue;
        };
        by_country.entry(r.country.as_str()).or_default().push(BinnedValue {
            bin,
            value: r.responses[idx].filter(|v| (0.0..=1.0).contains(v)),
            weight: r.weight,
        });
    }

    let mut entries: Vec<(CellKey, Option<Estimate>)> = Vec::new();
    let mut max_gap: Option<f64> = None;

    for (country, rows) in &by_country {
        let summaries = summarize_bins(rows);
        let counts: BTreeMap<usize, usize> = summaries
            .iter()
            .filter(|(_, acc)| acc.n() > 0)
            .map(|(&bin, acc)| (bin, acc.n()))
            .collect();

        let mapping = collapse_bins(&counts, config.min_bin_count, config.collapse);
        diagnostics.merged_bins += mapping.iter().filter(|(from, to)| from != to).count();

        let combined = combine_collapsed(&summaries, &mapping);
        let reference = reaggregate_from_rows(rows, &mapping);
        for (bin, &(mean, _)) in &combined {
            if mapping.values().filter(|&target| target == bin).count() < 2 {
                continue;
            }
            if let Some(exact) = reference.get(bin).and_then(|acc| acc.mean()) {
                let gap = (mean - exact).abs();
                max_gap = Some(max_gap.map_or(gap, |g: f64| g.max(gap)));
            }
        }

        let key = |bin: usize| {
            CellKey::new(country, &config.label, None, Bucket::Age(config.binning.bin(bin)))
        };
        for (&bin, &(mean, n)) in &combined {
            entries.push((key(bin), Estimate::new(mean, n)));
        }
        for (&bin, acc) in &summaries {
            if acc.n() == 0 {
                entries.push((key(bin), None));
            }
        }
    }

    diagnostics.meta_aggregation_gap = max_gap;
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let cells = finalize_cells(entries, drop_zero);
    Ok(AnalysisOutput::new(
        AnalysisKind::EmancipativeIndex,
        cells,
        diagnostics,
    ))
}
