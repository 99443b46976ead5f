//! Cohortscope: Cohort Attitude Aggregation CLI Tool
//!
//! Loads a respondent table and a democracy-index table, runs the four
//! analyses and writes per-analysis CSV tables, a JSON summary and charts.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use cohortscope::cli::Cli;
use cohortscope::pipeline::{
    load_regime_observations, load_survey_table, run_analyses, AnalysisKind, RegimeClassification,
};
use cohortscope::report::{
    export_run_summary, render_analysis, write_cells_csv, ExportParams, RunSummary,
};
use cohortscope::utils::{
    create_spinner, finish_with_success, finish_with_warning, print_banner, print_completion,
    print_config, print_count, print_info, print_step_header, print_step_time, print_success,
    print_warning, ConfigCard,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    let output_dir = cli.output_dir();

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(&ConfigCard {
        input: &cli.input,
        regimes: &cli.regimes,
        output_dir: &output_dir,
        generation_collapse: config.generation.collapse.to_string(),
        index_collapse: config.index.collapse.to_string(),
        min_bin_count: config.generation.min_bin_count,
        drop_zero_cells: config.drop_zero_cells,
    });

    // Step 1: Load both tables
    print_step_header(1, "Load Data");
    let step_start = Instant::now();

    let spinner = create_spinner("Loading respondent table...");
    let table = load_survey_table(
        &cli.input,
        cli.infer_schema_length,
        &config.columns,
        &config.response_columns(),
    )?;
    finish_with_success(&spinner, "Respondent table loaded");
    print_count(
        "respondent(s)",
        table.len(),
        Some(&format!("({} countries)", table.countries().len())),
    );
    if table.is_empty() {
        anyhow::bail!("Respondent table has no usable rows");
    }

    let spinner = create_spinner("Loading regime table...");
    let observations =
        load_regime_observations(&cli.regimes, cli.infer_schema_length, &config.regime)?;
    let regimes = RegimeClassification::from_observations(&observations)
        .with_context(|| format!("Invalid regime table: {}", cli.regimes.display()))?;
    if regimes.is_empty() {
        finish_with_warning(&spinner, "No country has a regime code");
    } else {
        finish_with_success(&spinner, "Regime table loaded");
    }
    print_count("country regime classification(s)", regimes.len(), None);

    let missing_regimes: Vec<String> = table
        .countries()
        .into_iter()
        .filter(|c| regimes.regime(c).is_none())
        .collect();
    if !missing_regimes.is_empty() {
        print_warning(&format!(
            "No regime classification for: {}",
            missing_regimes.join(", ")
        ));
    }

    let mut summary = RunSummary::new(&table, regimes.len());
    let load_elapsed = step_start.elapsed();
    summary.set_load_time(load_elapsed);
    print_step_time(load_elapsed);

    // Step 2: Analyses
    print_step_header(2, "Aggregate Cells");
    let step_start = Instant::now();
    let spinner = create_spinner("Running analyses...");
    let results = run_analyses(&table, &regimes, &config)?;
    finish_with_success(&spinner, "Analyses complete");

    for output in &results.outputs {
        print_count(
            &format!("cell(s) · {}", output.kind.title()),
            output.table.cells.len(),
            None,
        );
        let excluded = output.diagnostics.excluded();
        if excluded > 0 {
            print_info(&format!(
                "{}: {} respondent(s) excluded",
                output.kind.title(),
                excluded
            ));
        }
        if let Some(gap) = output.diagnostics.meta_aggregation_gap {
            print_warning(&format!(
                "{}: merged-bin means differ from row-level means by up to {:.4}",
                output.kind.title(),
                gap
            ));
        }
    }

    summary.add_results(&results);
    let analysis_elapsed = step_start.elapsed();
    summary.set_analysis_time(analysis_elapsed);
    print_step_time(analysis_elapsed);

    // Step 3: Outputs
    print_step_header(3, "Write Outputs");
    let step_start = Instant::now();
    std::fs::create_dir_all(&output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            output_dir.display()
        )
    })?;

    for output in &results.outputs {
        let path = write_cells_csv(output, &output_dir)?;
        print_success(&format!("Saved {}", path.display()));
    }

    let summary_path = output_dir.join("summary.json");
    export_run_summary(
        &results,
        &summary_path,
        &ExportParams {
            input_file: &cli.input,
            regime_file: &cli.regimes,
            respondents: table.len(),
            config: &config,
        },
    )?;
    print_success(&format!("Saved {}", summary_path.display()));

    if cli.no_charts {
        print_info("Chart rendering skipped");
    } else {
        for kind in AnalysisKind::ALL {
            let Some(output) = results.get(kind) else {
                continue;
            };
            if output.table.cells.is_empty() {
                print_warning(&format!("{}: no cells to chart", kind.title()));
                continue;
            }
            // A chart failure leaves the tables intact
            match render_analysis(kind, &output.table.cells, &config.display, &output_dir) {
                Ok(path) => print_success(&format!("Saved {}", path.display())),
                Err(e) => print_warning(&format!("{}: {}", kind.title(), e)),
            }
        }
    }

    let output_elapsed = step_start.elapsed();
    summary.set_output_time(output_elapsed);
    print_step_time(output_elapsed);

    summary.display();
    println!(
        "\n    {} {} cells written to {}",
        style("✧").cyan(),
        style(results.total_cells()).yellow().bold(),
        style(output_dir.display()).cyan()
    );
    print_completion();

    Ok(())
}
