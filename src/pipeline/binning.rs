//! Age binning and adaptive small-bin collapsing
//!
//! Respondents are placed in fixed-width, half-open age bins with a final
//! open-ended "N+" bin. Within a stratum, bins that hold too few observations
//! are folded into the immediately preceding (younger) bin.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Geometry of the age bins.
///
/// Regular bins are `[min_age + k*width, min_age + (k+1)*width)` up to
/// `open_from`; the last bin is `[open_from, max_age]`. Ages outside
/// `[min_age, max_age]` get no bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBinning {
    pub min_age: i32,
    pub max_age: i32,
    pub width: i32,
    pub open_from: i32,
}

impl AgeBinning {
    pub fn validate(&self, analysis: &str) -> Result<(), ConfigError> {
        let fail = |reason: String| ConfigError::InvalidBinning {
            analysis: analysis.to_string(),
            reason,
        };
        if self.width <= 0 {
            return Err(fail(format!("width must be positive, got {}", self.width)));
        }
        if self.open_from <= self.min_age || self.open_from > self.max_age {
            return Err(fail(format!(
                "open bin start {} must lie in ({}, {}]",
                self.open_from, self.min_age, self.max_age
            )));
        }
        if (self.open_from - self.min_age) % self.width != 0 {
            return Err(fail(format!(
                "open bin start {} is not a whole number of {}-year steps from {}",
                self.open_from, self.width, self.min_age
            )));
        }
        Ok(())
    }

    /// Total number of bins including the open-ended one.
    pub fn bin_count(&self) -> usize {
        ((self.open_from - self.min_age) / self.width) as usize + 1
    }

    /// Index of the bin holding `age`, or `None` if out of range.
    pub fn assign(&self, age: i32) -> Option<usize> {
        if age < self.min_age || age > self.max_age {
            return None;
        }
        if age >= self.open_from {
            return Some(self.bin_count() - 1);
        }
        Some(((age - self.min_age) / self.width) as usize)
    }

    pub fn bin(&self, index: usize) -> AgeBin {
        let last = self.bin_count() - 1;
        if index >= last {
            AgeBin {
                lower: self.open_from,
                upper: None,
            }
        } else {
            let lower = self.min_age + index as i32 * self.width;
            AgeBin {
                lower,
                upper: Some(lower + self.width - 1),
            }
        }
    }

    pub fn bins(&self) -> Vec<AgeBin> {
        (0..self.bin_count()).map(|i| self.bin(i)).collect()
    }
}

/// One age bin, labelled by inclusive bounds ("18-22") or open ("78+").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AgeBin {
    pub lower: i32,
    pub upper: Option<i32>,
}

impl fmt::Display for AgeBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upper {
            Some(upper) => write!(f, "{}-{}", self.lower, upper),
            None => write!(f, "{}+", self.lower),
        }
    }
}

/// How far the small-bin collapse goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollapseMode {
    /// One forward pass over the original counts; a merge is never re-checked
    /// and reassignments are not chained.
    #[default]
    SinglePass,
    /// Repeat merges until every bin except the first meets the threshold.
    FixedPoint,
}

impl fmt::Display for CollapseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollapseMode::SinglePass => write!(f, "single-pass"),
            CollapseMode::FixedPoint => write!(f, "fixed-point"),
        }
    }
}

impl std::str::FromStr for CollapseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single-pass" | "single" => Ok(CollapseMode::SinglePass),
            "fixed-point" | "fixed" => Ok(CollapseMode::FixedPoint),
            _ => Err(format!(
                "Unknown collapse mode: '{}'. Use 'single-pass' or 'fixed-point'.",
                s
            )),
        }
    }
}

/// Decide where each bin's observations end up.
///
/// `counts` maps bin index to its observation count within one stratum; only
/// bins present in the stratum take part, so "preceding" means the next
/// younger bin that actually holds observations. Returns original bin index ->
/// effective bin index. The youngest bin never moves, even if under-powered.
pub fn collapse_bins(
    counts: &BTreeMap<usize, usize>,
    min_count: usize,
    mode: CollapseMode,
) -> BTreeMap<usize, usize> {
    match mode {
        CollapseMode::SinglePass => collapse_single_pass(counts, min_count),
        CollapseMode::FixedPoint => collapse_fixed_point(counts, min_count),
    }
}

fn collapse_single_pass(counts: &BTreeMap<usize, usize>, min_count: usize) -> BTreeMap<usize, usize> {
    let mut mapping = BTreeMap::new();
    let mut previous: Option<usize> = None;

    for (&bin, &count) in counts {
        let target = match previous {
            Some(prev) if count < min_count => prev,
            _ => bin,
        };
        mapping.insert(bin, target);
        previous = Some(bin);
    }

    mapping
}

fn collapse_fixed_point(counts: &BTreeMap<usize, usize>, min_count: usize) -> BTreeMap<usize, usize> {
    // (label, total count, member bins), ascending by age
    let mut groups: Vec<(usize, usize, Vec<usize>)> = counts
        .iter()
        .map(|(&bin, &count)| (bin, count, vec![bin]))
        .collect();

    while let Some(i) = (1..groups.len()).find(|&i| groups[i].1 < min_count) {
        let (_, count, members) = groups.remove(i);
        let receiver = &mut groups[i - 1];
        receiver.1 += count;
        receiver.2.extend(members);
    }

    groups
        .into_iter()
        .flat_map(|(label, _, members)| members.into_iter().map(move |m| (m, label)))
        .collect()
}

/// Observation counts per effective bin after applying a collapse mapping.
pub fn effective_counts(
    counts: &BTreeMap<usize, usize>,
    mapping: &BTreeMap<usize, usize>,
) -> BTreeMap<usize, usize> {
    let mut effective = BTreeMap::new();
    for (bin, &count) in counts {
        let target = mapping.get(bin).copied().unwrap_or(*bin);
        *effective.entry(target).or_insert(0) += count;
    }
    effective
}

/// Pre-aggregated summary of one bin: its weighted mean and contributing count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinSummary {
    pub mean: f64,
    pub n: usize,
}

/// Two-stage meta-aggregation of already-aggregated bins.
///
/// Combines per-bin weighted means by their *unweighted* counts:
/// `sum(mean_i * n_i) / sum(n_i)`. This is not the same as re-deriving the
/// weighted mean from the underlying rows whenever bins carry different
/// average weights. Returns `(mean, total n)`, or `None` for zero total count.
pub fn meta_aggregate(parts: &[BinSummary]) -> Option<(f64, usize)> {
    let n: usize = parts.iter().map(|p| p.n).sum();
    if n == 0 {
        return None;
    }
    let total: f64 = parts.iter().map(|p| p.mean * p.n as f64).sum();
    Some((total / n as f64, n))
}
