//! Tests for the weighted estimators and the co-endorsement truth table

mod common;

use cohortscope::pipeline::*;
use common::assert_close;
use rand::prelude::*;
use rand::SeedableRng;

#[test]
fn test_equal_weights_reduce_to_plain_share() {
    let values = [Some(1.0), Some(0.0), Some(1.0), Some(1.0)];
    let weights = [Some(1.0); 4];
    assert_close(weighted_proportion(&values, &weights).unwrap(), 0.75);
}

#[test]
fn test_missing_pairs_are_skipped() {
    let values = [Some(1.0), None, Some(0.0), Some(1.0)];
    let weights = [Some(2.0), Some(5.0), None, Some(2.0)];
    assert_close(weighted_proportion(&values, &weights).unwrap(), 1.0);

    let mut acc = WeightedAccumulator::new();
    for (v, w) in values.iter().zip(weights.iter()) {
        acc.push(*v, *w);
    }
    assert_eq!(acc.n(), 2);
    assert_close(acc.weight_sum(), 4.0);
}

#[test]
fn test_no_observations_means_no_estimate() {
    assert_eq!(weighted_proportion(&[None, None], &[Some(1.0), Some(1.0)]), None);
    assert_eq!(standard_error(0.5, 0), None);
    assert_eq!(WeightedAccumulator::new().estimate(), None);
}

#[test]
fn test_standard_error_and_interval() {
    let se = standard_error(0.5, 100).unwrap();
    assert_close(se, 0.05);
    let (lower, upper) = confidence_interval(0.5, se);
    assert_close(lower, 0.5 - 1.96 * 0.05);
    assert_close(upper, 0.5 + 1.96 * 0.05);
}

#[test]
fn test_interval_is_clipped() {
    let e = Estimate::new(0.95, 5).unwrap();
    assert_close(e.upper, 1.0);
    assert!(e.lower > 0.0);

    let e = Estimate::new(0.02, 3).unwrap();
    assert_close(e.lower, 0.0);

    let e = Estimate::new(1.0, 10).unwrap();
    assert_eq!(e.se, 0.0);
    assert_eq!((e.lower, e.upper), (1.0, 1.0));
}

#[test]
fn test_random_estimates_stay_in_unit_interval() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);

    for _ in 0..200 {
        let size = rng.gen_range(1..50);
        let values: Vec<Option<f64>> = (0..size)
            .map(|_| {
                if rng.gen_bool(0.1) {
                    None
                } else {
                    Some(if rng.gen_bool(0.4) { 1.0 } else { 0.0 })
                }
            })
            .collect();
        let weights: Vec<Option<f64>> = (0..size)
            .map(|_| Some(rng.gen_range(0.1..5.0)))
            .collect();

        let mut acc = WeightedAccumulator::new();
        for (v, w) in values.iter().zip(weights.iter()) {
            acc.push(*v, *w);
        }
        let Some(e) = acc.estimate() else {
            continue;
        };
        assert!(0.0 <= e.lower && e.lower <= e.estimate);
        assert!(e.estimate <= e.upper && e.upper <= 1.0);
        assert_eq!(e.n, values.iter().filter(|v| v.is_some()).count());
    }
}

#[test]
fn test_co_endorsement_truth_table() {
    let cases = [
        (Some(true), Some(true), Some(true)),
        (Some(true), Some(false), Some(false)),
        (Some(false), Some(true), Some(false)),
        (Some(false), Some(false), Some(false)),
        (None, Some(true), None),
        (None, Some(false), None),
        (Some(true), None, None),
        (Some(false), None, None),
        (None, None, None),
    ];
    for (democracy, alternative, expected) in cases {
        assert_eq!(
            co_endorsement(democracy, alternative),
            expected,
            "democracy={:?} alternative={:?}",
            democracy,
            alternative
        );
    }
}

#[test]
fn test_item_recoding() {
    let item = ItemCoding::four_point("E117", "Democratic political system");
    assert_eq!(item.recode(Some(1.0)), Some(true));
    assert_eq!(item.recode(Some(2.0)), Some(true));
    assert_eq!(item.recode(Some(3.0)), Some(false));
    assert_eq!(item.recode(Some(4.0)), Some(false));
    assert_eq!(item.recode(Some(-2.0)), None);
    assert_eq!(item.recode(Some(7.0)), None);
    assert_eq!(item.recode(None), None);
}
