//! Binned attitude proportions per country, political generation and age bin

use std::collections::BTreeMap;

use anyhow::Result;

use super::analysis::{AnalysisKind, AnalysisOutput, Diagnostics};
use super::binning::collapse_bins;
use super::cell::{estimate_cells, Bucket, CellKey};
use super::config::GenerationConfig;
use super::generation::{classify_respondent, Generation};
use super::items::ItemCoding;
use super::respondent::{Respondent, SurveyTable};

/// A classified respondent with its original age bin.
struct Placed<'a> {
    respondent: &'a Respondent,
    generation: Generation,
    bin: usize,
}

/// Collapse stratum: country, generation and position of the item.
type StratumKey<'a> = (&'a str, Generation, usize);

/// Weighted supportive share per (country, generation, age bin, item).
///
/// Respondents without a transition year for their country, without a birth
/// year, or outside the configured age range are excluded here only.
///
/// Small bins are collapsed separately for every (country, generation, item)
/// stratum. A bin's count is the number of respondents with a valid answer
/// and a weight for that item, i.e. the `n` its cell would have. Every cell is
/// then re-derived from the respondent rows under that item's corrected bins,
/// so one item's bins can merge while another's stay apart.
pub fn estimate_generational(
    table: &SurveyTable,
    config: &GenerationConfig,
    items: &[ItemCoding],
    drop_zero: bool,
) -> Result<AnalysisOutput> {
    let indexed: Vec<(usize, &ItemCoding)> = items
        .iter()
        .map(|item| Ok((table.column_index(&item.column)?, item)))
        .collect::<Result<_>>()?;

    let mut diagnostics = Diagnostics::default();
    let mut placed: Vec<Placed> = Vec::new();

    for r in &table.respondents {
        let Some(generation) =
            classify_respondent(&r.country, r.birth_year, &config.transition_years)
        else {
            diagnostics.unclassifiable += 1;
            continue;
        };
        let Some(bin) = r.age.and_then(|age| config.binning.assign(age)) else {
            diagnostics.out_of_age_range += 1;
            continue;
        };
        placed.push(Placed {
            respondent: r,
            generation,
            bin,
        });
    }

    let mut strata: BTreeMap<StratumKey, BTreeMap<usize, usize>> = BTreeMap::new();
    for p in &placed {
        for (pos, &(idx, item)) in indexed.iter().enumerate() {
            let answered = item.recode(p.respondent.responses[idx]).is_some();
            if !answered || p.respondent.weight.is_none() {
                continue;
            }
            *strata
                .entry((p.respondent.country.as_str(), p.generation, pos))
                .or_default()
                .entry(p.bin)
                .or_insert(0) += 1;
        }
    }

    let mappings: BTreeMap<StratumKey, BTreeMap<usize, usize>> = strata
        .iter()
        .map(|(&key, counts)| {
            let mapping = collapse_bins(counts, config.min_bin_count, config.collapse);
            diagnostics.merged_bins += mapping.iter().filter(|(from, to)| from != to).count();
            (key, mapping)
        })
        .collect();

    let observations = placed.iter().flat_map(|p| {
        let mappings = &mappings;
        indexed.iter().enumerate().map(move |(pos, &(idx, item))| {
            let bin = mappings
                .get(&(p.respondent.country.as_str(), p.generation, pos))
                .and_then(|m| m.get(&p.bin))
                .copied()
                .unwrap_or(p.bin);
            let bucket = Bucket::Age(config.binning.bin(bin));
            (
                CellKey::new(&p.respondent.country, &item.label, Some(p.generation), bucket),
                item.indicator(p.respondent.responses[idx]),
                p.respondent.weight,
            )
        })
    });

    let cells = estimate_cells(observations, drop_zero);
    Ok(AnalysisOutput::new(
        AnalysisKind::Generational,
        cells,
        diagnostics,
    ))
}
