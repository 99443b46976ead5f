//! Aggregate cells: grouping keys, grouped weighted aggregation and the
//! final output filter

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use super::binning::AgeBin;
use super::generation::Generation;
use super::regime::{
    BinaryRegime, DisplayGroup, RegimeClassification, RegimeGrouping, RegimeType,
};
use super::stats::{Estimate, WeightedAccumulator};

/// Time or age bucket of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bucket {
    Year(i32),
    Age(AgeBin),
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bucket::Year(year) => write!(f, "{}", year),
            Bucket::Age(bin) => write!(f, "{}", bin),
        }
    }
}

impl Serialize for Bucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Grouping key. Field order defines output order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellKey {
    pub country: String,
    pub measure: String,
    pub generation: Option<Generation>,
    pub bucket: Bucket,
}

impl CellKey {
    pub fn new(country: &str, measure: &str, generation: Option<Generation>, bucket: Bucket) -> Self {
        Self {
            country: country.to_string(),
            measure: measure.to_string(),
            generation,
            bucket,
        }
    }
}

/// One finalized output cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateCell {
    pub country: String,
    pub bucket: Bucket,
    pub measure: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<Generation>,
    pub estimate: f64,
    pub n: usize,
    pub se: f64,
    pub lower: f64,
    pub upper: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regime: Option<RegimeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liberal_democracy: Option<bool>,
    /// Year of the regime snapshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regime_year: Option<i32>,
    pub display_group: DisplayGroup,
}

impl AggregateCell {
    fn from_parts(key: CellKey, estimate: Estimate) -> Self {
        Self {
            country: key.country,
            bucket: key.bucket,
            measure: key.measure,
            generation: key.generation,
            estimate: estimate.estimate,
            n: estimate.n,
            se: estimate.se,
            lower: estimate.lower,
            upper: estimate.upper,
            regime: None,
            liberal_democracy: None,
            regime_year: None,
            display_group: DisplayGroup::default(),
        }
    }
}

/// Finalized cells plus what the output filter removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellTable {
    pub cells: Vec<AggregateCell>,
    /// Groups with no contributing observation (undefined estimate)
    pub undefined: usize,
    /// Groups whose estimate was exactly zero
    pub zero: usize,
}

impl CellTable {
    /// Attach each cell's regime snapshot and display group.
    pub fn annotate_regimes(
        &mut self,
        regimes: &RegimeClassification,
        highlighted: &[String],
        grouping: RegimeGrouping,
    ) {
        for cell in &mut self.cells {
            cell.regime = regimes.regime(&cell.country);
            cell.liberal_democracy = regimes
                .binary(&cell.country)
                .map(|b| b == BinaryRegime::LiberalDemocracy);
            cell.regime_year = regimes.snapshot_year(&cell.country);
            cell.display_group = regimes.display_group(&cell.country, highlighted, grouping);
        }
    }
}

/// Group (key, value, weight) observations into weighted accumulators.
pub fn aggregate_cells<I>(observations: I) -> BTreeMap<CellKey, WeightedAccumulator>
where
    I: IntoIterator<Item = (CellKey, Option<f64>, Option<f64>)>,
{
    let mut groups: BTreeMap<CellKey, WeightedAccumulator> = BTreeMap::new();
    for (key, value, weight) in observations {
        groups.entry(key).or_default().push(value, weight);
    }
    groups
}

/// Drop undefined estimates always, and exactly-zero estimates when
/// `drop_zero` is set. Zero cells are treated as "no data" for display,
/// which conflates them with genuine zero support.
pub fn finalize_cells<I>(entries: I, drop_zero: bool) -> CellTable
where
    I: IntoIterator<Item = (CellKey, Option<Estimate>)>,
{
    let mut table = CellTable::default();
    for (key, estimate) in entries {
        match estimate {
            None => table.undefined += 1,
            Some(e) if drop_zero && e.estimate == 0.0 => table.zero += 1,
            Some(e) => table.cells.push(AggregateCell::from_parts(key, e)),
        }
    }
    table
}

/// Aggregate then finalize in one step.
pub fn estimate_cells<I>(observations: I, drop_zero: bool) -> CellTable
where
    I: IntoIterator<Item = (CellKey, Option<f64>, Option<f64>)>,
{
    let groups = aggregate_cells(observations);
    finalize_cells(
        groups.into_iter().map(|(key, acc)| (key, acc.estimate())),
        drop_zero,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(country: &str, year: i32) -> CellKey {
        CellKey::new(country, "item", None, Bucket::Year(year))
    }

    #[test]
    fn test_zero_cell_dropped_tiny_cell_kept() {
        let entries = vec![
            (key("A", 2000), Estimate::new(0.0, 50)),
            (key("B", 2000), Estimate::new(0.0001, 50)),
        ];
        let table = finalize_cells(entries, true);
        assert_eq!(table.zero, 1);
        assert_eq!(table.cells.len(), 1);
        assert_eq!(table.cells[0].country, "B");
    }

    #[test]
    fn test_zero_cell_kept_when_filter_off() {
        let entries = vec![(key("A", 2000), Estimate::new(0.0, 50))];
        let table = finalize_cells(entries, false);
        assert_eq!(table.zero, 0);
        assert_eq!(table.cells.len(), 1);
    }

    #[test]
    fn test_undefined_cells_never_emitted() {
        let observations = vec![
            (key("A", 2000), None, Some(1.0)),
            (key("A", 2000), Some(1.0), None),
            (key("B", 2000), Some(1.0), Some(1.0)),
        ];
        let table = estimate_cells(observations, true);
        assert_eq!(table.undefined, 1);
        assert_eq!(table.cells.len(), 1);
        assert_eq!(table.cells[0].n, 1);
    }

    #[test]
    fn test_cells_sorted_by_key() {
        let observations = vec![
            (key("B", 2001), Some(1.0), Some(1.0)),
            (key("A", 2005), Some(1.0), Some(1.0)),
            (key("A", 1999), Some(1.0), Some(1.0)),
        ];
        let table = estimate_cells(observations, true);
        let order: Vec<String> = table
            .cells
            .iter()
            .map(|c| format!("{}:{}", c.country, c.bucket))
            .collect();
        assert_eq!(order, vec!["A:1999", "A:2005", "B:2001"]);
    }

    #[test]
    fn test_binary_grouping_labels_electoral_democracy_other() {
        use crate::pipeline::regime::RegimeObservation;

        let regimes = RegimeClassification::from_observations(&[
            RegimeObservation {
                country: "A".to_string(),
                year: 2018,
                code: Some(2.0),
            },
            RegimeObservation {
                country: "B".to_string(),
                year: 2019,
                code: Some(3.0),
            },
        ])
        .unwrap();
        let observations = vec![
            (key("A", 2000), Some(1.0), Some(1.0)),
            (key("B", 2000), Some(1.0), Some(1.0)),
        ];

        let mut binary = estimate_cells(observations.clone(), true);
        binary.annotate_regimes(&regimes, &[], RegimeGrouping::Binary);
        assert_eq!(binary.cells[0].display_group, DisplayGroup::Other);
        assert_eq!(binary.cells[0].liberal_democracy, Some(false));
        assert_eq!(binary.cells[0].regime_year, Some(2018));
        assert_eq!(binary.cells[1].display_group, DisplayGroup::LiberalDemocracy);
        assert_eq!(binary.cells[1].liberal_democracy, Some(true));

        let mut display = estimate_cells(observations, true);
        display.annotate_regimes(&regimes, &[], RegimeGrouping::Display);
        assert_eq!(display.cells[0].display_group, DisplayGroup::OtherDemocracy);
        assert_eq!(display.cells[0].liberal_democracy, Some(false));
    }

    #[test]
    fn test_bucket_serializes_as_label() {
        let json = serde_json::to_string(&Bucket::Age(AgeBin {
            lower: 78,
            upper: None,
        }))
        .unwrap();
        assert_eq!(json, "\"78+\"");
    }
}
