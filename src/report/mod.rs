//! Report module - charts, exports and the run summary

pub mod charts;
pub mod export;
pub mod summary;

pub use charts::*;
pub use export::*;
pub use summary::*;
