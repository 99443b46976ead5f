//! Weighted statistics primitives shared by every analysis
//!
//! Every estimate in the pipeline is a weighted mean of a value in [0, 1]
//! (a recoded binary indicator or the emancipative-values index), with a
//! binomial-approximation standard error computed from the *unweighted*
//! count of contributing observations.

use serde::Serialize;

/// Two-sided 95% normal quantile
pub const Z_95: f64 = 1.96;

/// Slack allowed for floating point drift when a mean of [0, 1] values lands
/// just outside the unit interval.
const UNIT_TOLERANCE: f64 = 1e-9;

/// Running sums for a weighted mean over (value, weight) pairs.
///
/// A pair contributes only when both sides are present and finite; `n` counts
/// contributing pairs, never raw rows.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WeightedAccumulator {
    weighted_sum: f64,
    weight_sum: f64,
    n: usize,
}

impl WeightedAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one observation. Missing values or weights are ignored.
    pub fn push(&mut self, value: Option<f64>, weight: Option<f64>) {
        if let (Some(v), Some(w)) = (value, weight) {
            if v.is_finite() && w.is_finite() {
                self.weighted_sum += v * w;
                self.weight_sum += w;
                self.n += 1;
            }
        }
    }

    /// Number of non-missing contributing observations
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn weight_sum(&self) -> f64 {
        self.weight_sum
    }

    /// Weighted mean, or `None` when nothing contributed.
    pub fn mean(&self) -> Option<f64> {
        if self.n == 0 || self.weight_sum <= 0.0 {
            None
        } else {
            Some(self.weighted_sum / self.weight_sum)
        }
    }

    /// Full cell estimate (mean, SE, clipped interval).
    pub fn estimate(&self) -> Option<Estimate> {
        Estimate::new(self.mean()?, self.n)
    }
}

/// Point estimate with its sampling uncertainty.
///
/// Invariant: `0 <= lower <= estimate <= upper <= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Estimate {
    pub estimate: f64,
    pub n: usize,
    pub se: f64,
    pub lower: f64,
    pub upper: f64,
}

impl Estimate {
    /// Build an estimate from a proportion and its contributing count.
    ///
    /// Returns `None` when the standard error is undefined (`n == 0`) or the
    /// proportion is not a number in [0, 1].
    pub fn new(p: f64, n: usize) -> Option<Self> {
        if !p.is_finite() || p < -UNIT_TOLERANCE || p > 1.0 + UNIT_TOLERANCE {
            return None;
        }
        let p = p.clamp(0.0, 1.0);
        let se = standard_error(p, n)?;
        let (lower, upper) = confidence_interval(p, se);
        Some(Self {
            estimate: p,
            n,
            se,
            lower,
            upper,
        })
    }
}

/// Weighted proportion `sum(value * weight) / sum(weight)` over non-missing pairs.
///
/// `values` and `weights` are aligned by respondent. Returns `None` if no pair
/// has both sides present.
pub fn weighted_proportion(values: &[Option<f64>], weights: &[Option<f64>]) -> Option<f64> {
    let mut acc = WeightedAccumulator::new();
    for (&value, &weight) in values.iter().zip(weights.iter()) {
        acc.push(value, weight);
    }
    acc.mean()
}

/// Binomial standard error `sqrt(p(1-p)/n)`.
///
/// `n` is the count of contributing observations, not the weight sum. The
/// approximation is only exact under self-weighting designs.
pub fn standard_error(p: f64, n: usize) -> Option<f64> {
    if n == 0 || !p.is_finite() {
        return None;
    }
    let variance = (p * (1.0 - p)).max(0.0) / n as f64;
    Some(variance.sqrt())
}

/// 95% normal-approximation interval, clipped to [0, 1].
pub fn confidence_interval(p: f64, se: f64) -> (f64, f64) {
    let lower = (p - Z_95 * se).max(0.0);
    let upper = (p + Z_95 * se).min(1.0);
    (lower, upper)
}
