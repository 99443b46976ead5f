//! Run summary table

use std::time::Duration;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::pipeline::{AnalysisResults, SurveyTable};

/// Headline numbers of a run, rendered at the end.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub respondents: usize,
    pub skipped_rows: usize,
    pub countries: usize,
    pub regime_countries: usize,
    pub rows: Vec<SummaryRow>,
    pub load_time: Duration,
    pub analysis_time: Duration,
    pub output_time: Duration,
}

/// One analysis line of the summary table.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub analysis: String,
    pub cells: usize,
    pub undefined: usize,
    pub zero: usize,
    pub excluded: usize,
    pub merged_bins: usize,
    pub meta_gap: Option<f64>,
}

impl RunSummary {
    pub fn new(table: &SurveyTable, regime_countries: usize) -> Self {
        Self {
            respondents: table.len(),
            skipped_rows: table.skipped_rows,
            countries: table.countries().len(),
            regime_countries,
            ..Default::default()
        }
    }

    pub fn add_results(&mut self, results: &AnalysisResults) {
        self.rows = results
            .outputs
            .iter()
            .map(|o| SummaryRow {
                analysis: o.kind.title().to_string(),
                cells: o.table.cells.len(),
                undefined: o.table.undefined,
                zero: o.table.zero,
                excluded: o.diagnostics.excluded(),
                merged_bins: o.diagnostics.merged_bins,
                meta_gap: o.diagnostics.meta_aggregation_gap,
            })
            .collect();
    }

    pub fn set_load_time(&mut self, elapsed: Duration) {
        self.load_time = elapsed;
    }

    pub fn set_analysis_time(&mut self, elapsed: Duration) {
        self.analysis_time = elapsed;
    }

    pub fn set_output_time(&mut self, elapsed: Duration) {
        self.output_time = elapsed;
    }

    pub fn total_time(&self) -> Duration {
        self.load_time + self.analysis_time + self.output_time
    }

    /// Build the per-analysis table.
    pub fn table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Analysis").add_attribute(Attribute::Bold),
            Cell::new("Cells").add_attribute(Attribute::Bold),
            Cell::new("No estimate").add_attribute(Attribute::Bold),
            Cell::new("Zero dropped").add_attribute(Attribute::Bold),
            Cell::new("Excluded").add_attribute(Attribute::Bold),
            Cell::new("Merged bins").add_attribute(Attribute::Bold),
        ]);

        for row in &self.rows {
            table.add_row(vec![
                Cell::new(&row.analysis),
                Cell::new(row.cells)
                    .fg(if row.cells == 0 { Color::Red } else { Color::Green })
                    .set_alignment(CellAlignment::Right),
                Cell::new(row.undefined).set_alignment(CellAlignment::Right),
                Cell::new(row.zero)
                    .fg(if row.zero > 0 { Color::Yellow } else { Color::White })
                    .set_alignment(CellAlignment::Right),
                Cell::new(row.excluded).set_alignment(CellAlignment::Right),
                Cell::new(row.merged_bins).set_alignment(CellAlignment::Right),
            ]);
        }

        table
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("RUN SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();
        println!(
            "      Respondents: {}  Countries: {}  With regime data: {}",
            style(self.respondents).yellow().bold(),
            style(self.countries).yellow().bold(),
            style(self.regime_countries).yellow().bold()
        );
        if self.skipped_rows > 0 {
            println!(
                "      Skipped rows: {}",
                style(self.skipped_rows).red().bold()
            );
        }
        println!();

        // Indent the table
        for line in self.table().to_string().lines() {
            println!("    {}", line);
        }

        for row in &self.rows {
            if let Some(gap) = row.meta_gap {
                println!();
                println!(
                    "      {} {}: two-stage bin merge differs from row-level means by up to {}",
                    style("Note").yellow(),
                    row.analysis,
                    style(format!("{:.4}", gap)).yellow().bold()
                );
            }
        }

        println!();
        println!(
            "      {}",
            style(format!(
                "Load {:.2}s · Analysis {:.2}s · Output {:.2}s · Total {:.2}s",
                self.load_time.as_secs_f64(),
                self.analysis_time.as_secs_f64(),
                self.output_time.as_secs_f64(),
                self.total_time().as_secs_f64()
            ))
            .dim()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lists_every_row() {
        let mut summary = RunSummary::default();
        summary.rows = vec![
            SummaryRow {
                analysis: "Support for regime types by survey year".to_string(),
                cells: 12,
                undefined: 1,
                zero: 2,
                excluded: 0,
                merged_bins: 0,
                meta_gap: None,
            },
            SummaryRow {
                analysis: "Emancipative values by age".to_string(),
                cells: 0,
                undefined: 0,
                zero: 0,
                excluded: 4,
                merged_bins: 3,
                meta_gap: Some(0.01),
            },
        ];
        let rendered = summary.table().to_string();
        assert!(rendered.contains("Support for regime types by survey year"));
        assert!(rendered.contains("Emancipative values by age"));
        assert!(rendered.contains("Merged bins"));
    }

    #[test]
    fn test_total_time() {
        let mut summary = RunSummary::default();
        summary.set_load_time(Duration::from_millis(100));
        summary.set_analysis_time(Duration::from_millis(200));
        summary.set_output_time(Duration::from_millis(300));
        assert_eq!(summary.total_time(), Duration::from_millis(600));
    }
}
