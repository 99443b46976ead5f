//! Tests for age binning, small-bin collapse and generation classification

use std::collections::BTreeMap;

use cohortscope::pipeline::*;

fn counts(values: &[usize]) -> BTreeMap<usize, usize> {
    values.iter().copied().enumerate().collect()
}

fn collapsed(values: &[usize], mode: CollapseMode) -> Vec<usize> {
    let c = counts(values);
    let mapping = collapse_bins(&c, 10, mode);
    effective_counts(&c, &mapping).into_values().collect()
}

#[test]
fn test_single_pass_does_not_chain() {
    assert_eq!(collapsed(&[15, 5, 4], CollapseMode::SinglePass), vec![20, 4]);
}

#[test]
fn test_single_pass_leaves_first_bin_alone() {
    assert_eq!(collapsed(&[3, 15, 2], CollapseMode::SinglePass), vec![3, 17]);
}

#[test]
fn test_fixed_point_cascades() {
    assert_eq!(collapsed(&[15, 5, 4], CollapseMode::FixedPoint), vec![24]);
    assert_eq!(collapsed(&[3, 15, 2], CollapseMode::FixedPoint), vec![3, 17]);
}

#[test]
fn test_collapse_is_a_no_op_when_bins_are_large() {
    for mode in [CollapseMode::SinglePass, CollapseMode::FixedPoint] {
        assert_eq!(collapsed(&[12, 30, 10], mode), vec![12, 30, 10]);
    }
}

#[test]
fn test_collapse_skips_empty_bins() {
    // Bin 1 is absent from the stratum; bin 2 merges into bin 0
    let c: BTreeMap<usize, usize> = [(0, 20), (2, 4)].into_iter().collect();
    let mapping = collapse_bins(&c, 10, CollapseMode::SinglePass);
    assert_eq!(mapping.get(&2), Some(&0));
}

#[test]
fn test_age_assignment() {
    let binning = AgeBinning {
        min_age: 18,
        max_age: 90,
        width: 5,
        open_from: 78,
    };
    assert_eq!(binning.assign(17), None);
    assert_eq!(binning.assign(18), Some(0));
    assert_eq!(binning.assign(22), Some(0));
    assert_eq!(binning.assign(23), Some(1));
    assert_eq!(binning.assign(78), Some(binning.bin_count() - 1));
    assert_eq!(binning.assign(90), Some(binning.bin_count() - 1));
    assert_eq!(binning.assign(91), None);

    let labels: Vec<String> = binning.bins().iter().map(|b| b.to_string()).collect();
    assert_eq!(labels.first().map(String::as_str), Some("18-22"));
    assert_eq!(labels.last().map(String::as_str), Some("78+"));
}

#[test]
fn test_meta_aggregate_weights_by_count() {
    let parts = [
        BinSummary { mean: 0.2, n: 15 },
        BinSummary { mean: 0.8, n: 5 },
    ];
    let (mean, n) = meta_aggregate(&parts).unwrap();
    assert!((mean - 0.35).abs() < 1e-12);
    assert_eq!(n, 20);
    assert_eq!(meta_aggregate(&[]), None);
}

#[test]
fn test_generation_thresholds() {
    assert_eq!(classify(17), Generation::DemocraticFormed);
    assert_eq!(classify(18), Generation::Transitional);
    assert_eq!(classify(25), Generation::Transitional);
    assert_eq!(classify(26), Generation::AuthoritarianFormed);
    assert_eq!(classify(60), Generation::AuthoritarianFormed);
}

#[test]
fn test_classify_respondent_needs_transition_and_birth_year() {
    let transitions: BTreeMap<String, i32> = [("ESP".to_string(), 1977)].into_iter().collect();

    assert_eq!(
        classify_respondent("ESP", Some(1952), &transitions),
        Some(Generation::Transitional)
    );
    assert_eq!(
        classify_respondent("ESP", Some(1951), &transitions),
        Some(Generation::AuthoritarianFormed)
    );
    assert_eq!(
        classify_respondent("ESP", Some(1960), &transitions),
        Some(Generation::DemocraticFormed)
    );
    assert_eq!(classify_respondent("ESP", None, &transitions), None);
    assert_eq!(classify_respondent("USA", Some(1960), &transitions), None);
}
