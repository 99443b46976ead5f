//! Co-endorsement ("guardianship") estimator
//!
//! A respondent co-endorses when they rate democracy favourably *and* rate a
//! non-democratic alternative favourably at the same time.

use anyhow::Result;

use super::analysis::{AnalysisKind, AnalysisOutput, Diagnostics};
use super::cell::{estimate_cells, Bucket, CellKey};
use super::config::EndorsementConfig;
use super::respondent::SurveyTable;

/// Joint indicator: missing if either side is missing, otherwise true only
/// when both are supportive.
pub fn co_endorsement(democracy: Option<bool>, alternative: Option<bool>) -> Option<bool> {
    let democracy = democracy?;
    let alternative = alternative?;
    Some(democracy && alternative)
}

/// Weighted co-endorsement share per (country, survey year, alternative).
///
/// Respondents from waves below `min_wave`, or with no wave recorded, are
/// left out of this analysis only.
pub fn estimate_co_endorsement(
    table: &SurveyTable,
    config: &EndorsementConfig,
    drop_zero: bool,
) -> Result<AnalysisOutput> {
    let democracy_idx = table.column_index(&config.democracy.column)?;
    let alternatives: Vec<(usize, &str, &_)> = config
        .alternatives
        .iter()
        .map(|alt| Ok((table.column_index(&alt.item.column)?, alt.kind.label(), &alt.item)))
        .collect::<Result<_>>()?;

    let mut diagnostics = Diagnostics::default();
    let eligible: Vec<_> = table
        .respondents
        .iter()
        .filter(|r| {
            let keep = r.wave.is_some_and(|w| w >= config.min_wave);
            if !keep {
                diagnostics.wave_filtered += 1;
            }
            keep
        })
        .collect();

    let observations = eligible.iter().flat_map(|r| {
        let democracy = config.democracy.recode(r.responses[democracy_idx]);
        alternatives.iter().map(move |&(idx, label, item)| {
            let joint = co_endorsement(democracy, item.recode(r.responses[idx]));
            (
                CellKey::new(&r.country, label, None, Bucket::Year(r.year)),
                joint.map(|j| if j { 1.0 } else { 0.0 }),
                r.weight,
            )
        })
    });

    let cells = estimate_cells(observations, drop_zero);
    Ok(AnalysisOutput::new(
        AnalysisKind::CoEndorsement,
        cells,
        diagnostics,
    ))
}
