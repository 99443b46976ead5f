//! Binary-attitude proportions per country, survey year and item

use anyhow::Result;

use super::analysis::{AnalysisKind, AnalysisOutput, Diagnostics};
use super::cell::{estimate_cells, Bucket, CellKey};
use super::items::ItemCoding;
use super::respondent::SurveyTable;

/// Weighted share of supportive responses for each (country, year, item).
pub fn estimate_attitudes(
    table: &SurveyTable,
    items: &[ItemCoding],
    drop_zero: bool,
) -> Result<AnalysisOutput> {
    let indexed: Vec<(usize, &ItemCoding)> = items
        .iter()
        .map(|item| Ok((table.column_index(&item.column)?, item)))
        .collect::<Result<_>>()?;

    let observations = table.respondents.iter().flat_map(|r| {
        indexed.iter().map(move |&(idx, item)| {
            (
                CellKey::new(&r.country, &item.label, None, Bucket::Year(r.year)),
                item.indicator(r.responses[idx]),
                r.weight,
            )
        })
    });

    let cells = estimate_cells(observations, drop_zero);
    Ok(AnalysisOutput::new(
        AnalysisKind::Attitudes,
        cells,
        Diagnostics::default(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::respondent::Respondent;

    fn respondent(country: &str, year: i32, code: Option<f64>, weight: f64) -> Respondent {
        Respondent {
            country: country.to_string(),
            year,
            wave: Some(5),
            birth_year: Some(1970),
            age: Some(year - 1970),
            weight: Some(weight),
            responses: vec![code],
        }
    }

    fn table(rows: Vec<Respondent>) -> SurveyTable {
        SurveyTable {
            columns: vec!["E117".to_string()],
            respondents: rows,
            skipped_rows: 0,
        }
    }

    #[test]
    fn test_proportion_per_country_year() {
        let item = ItemCoding::four_point("E117", "Democracy");
        let t = table(vec![
            respondent("ESP", 2007, Some(1.0), 3.0),
            respondent("ESP", 2007, Some(4.0), 1.0),
            respondent("ESP", 2007, Some(-2.0), 10.0),
            respondent("ESP", 2011, Some(2.0), 1.0),
        ]);
        let out = estimate_attitudes(&t, &[item], true).unwrap();
        assert_eq!(out.table.cells.len(), 2);

        let c2007 = &out.table.cells[0];
        assert_eq!(c2007.bucket, Bucket::Year(2007));
        assert!((c2007.estimate - 0.75).abs() < 1e-12);
        assert_eq!(c2007.n, 2, "non-substantive answer does not count");

        let c2011 = &out.table.cells[1];
        assert_eq!(c2011.estimate, 1.0);
        assert_eq!(c2011.n, 1);
    }

    #[test]
    fn test_unknown_item_column_errors() {
        let item = ItemCoding::four_point("E999", "Missing");
        let t = table(vec![respondent("ESP", 2007, Some(1.0), 1.0)]);
        assert!(estimate_attitudes(&t, &[item], true).is_err());
    }

    #[test]
    fn test_all_opposed_cell_is_dropped() {
        let item = ItemCoding::four_point("E117", "Democracy");
        let t = table(vec![
            respondent("RUS", 2011, Some(3.0), 1.0),
            respondent("RUS", 2011, Some(4.0), 1.0),
        ]);
        let out = estimate_attitudes(&t, &[item], true).unwrap();
        assert!(out.table.cells.is_empty());
        assert_eq!(out.table.zero, 1);
    }
}
