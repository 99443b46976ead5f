//! Cohortscope: cohort attitude aggregation library
//!
//! Weighted proportions with confidence intervals over cross-national survey
//! waves, grouped by survey year, political generation and age bin, and
//! joined with a per-country regime classification.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
